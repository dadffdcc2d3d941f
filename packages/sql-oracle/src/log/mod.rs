mod subscriber;
mod targets;

pub use subscriber::builder;
pub use targets::*;

use crate::config::{LogConfig, LogFormat};
use std::sync::Once;
use tracing_subscriber::{
    fmt::{
        format::{DefaultFields, Format},
        writer::BoxMakeWriter,
        SubscriberBuilder,
    },
    EnvFilter,
};

static INIT: Once = Once::new();

type Subscriber = Box<dyn tracing::Subscriber + Send + Sync>;

pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let subscriber = subscriber::builder(&config);
        let subscriber = set_format(&config, subscriber);

        tracing::subscriber::set_global_default(subscriber)
            .expect("Could not set the tracing subscriber");
    });
}

pub fn set_format(
    config: &LogConfig,
    builder: SubscriberBuilder<DefaultFields, Format, EnvFilter, BoxMakeWriter>,
) -> Subscriber {
    match &config.format {
        LogFormat::Pretty => Box::new(builder.pretty().finish()),
        LogFormat::Structured => Box::new(builder.json().finish()),
        LogFormat::Text => Box::new(builder.finish()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::test_helpers::MockMakeWriter;
    use tracing::dispatcher::set_default;
    use tracing::{debug, error, info, trace, warn};

    fn capture(config: &LogConfig) -> (MockMakeWriter, tracing::Dispatch) {
        let make_writer = MockMakeWriter::default();

        let subscriber =
            subscriber::builder(config).with_writer(BoxMakeWriter::new(make_writer.clone()));
        let subscriber = set_format(config, subscriber);

        (make_writer, subscriber.into())
    }

    #[test]
    fn test_log_levels() {
        let mut config = LogConfig::with_level(LogLevel::Warn);
        config.format = LogFormat::Text;

        let (make_writer, dispatch) = capture(&config);
        let _default = set_default(&dispatch);

        trace!("trace message");
        debug!("debug message");
        info!("info message");
        warn!("warn message");
        error!("error message");

        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("trace message"));
        assert!(!log_contents.contains("debug message"));
        assert!(!log_contents.contains("info message"));
        assert!(log_contents.contains("warn message"));
        assert!(log_contents.contains("error message"));
    }

    #[test]
    fn test_log_levels_with_targets() {
        let config = LogConfig {
            format: LogFormat::Text,
            output: LogConfig::default_log_output(),
            ansi_enabled: false,
            level: LogLevel::Info,
            development_level: LogLevel::Info,
            config_level: LogLevel::Error,
            parser_level: LogLevel::Info,
            alias_level: LogLevel::Trace,
            compare_level: LogLevel::Debug,
            execute_level: LogLevel::Warn,
        };

        let (make_writer, dispatch) = capture(&config);
        let _default = set_default(&dispatch);

        // compare at debug: debug is logged, trace is not
        trace!(target: COMPARE, "trace/compare");
        debug!(target: COMPARE, "debug/compare");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("trace/compare"));
        assert!(log_contents.contains("debug/compare"));

        // alias at trace
        trace!(target: ALIAS, "trace/alias");
        let log_contents = make_writer.get_string();
        assert!(log_contents.contains("trace/alias"));

        // execute at warn
        info!(target: EXECUTE, "info/execute");
        warn!(target: EXECUTE, "warn/execute");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("info/execute"));
        assert!(log_contents.contains("warn/execute"));

        // config at error
        warn!(target: CONFIG, "warn/config");
        error!(target: CONFIG, "error/config");
        let log_contents = make_writer.get_string();
        assert!(!log_contents.contains("warn/config"));
        assert!(log_contents.contains("error/config"));
    }

    #[test]
    fn test_log_format_structured() {
        let mut config = LogConfig::with_level(LogLevel::Info);
        config.format = LogFormat::Structured;

        let (make_writer, dispatch) = capture(&config);
        let _default = set_default(&dispatch);

        info!(msg = "message", value = 42);

        let log_contents = make_writer.get_string();

        assert!(log_contents.contains(r#"fields":{"msg":"message","value":42}"#));
    }

    #[test]
    fn every_target_has_a_level() {
        let config = LogConfig::with_level(LogLevel::Error);

        for target in log_targets() {
            assert_eq!(log_level_for(&config, target), LogLevel::Error);
        }
        assert_eq!(log_targets().len(), 6);
    }
}
