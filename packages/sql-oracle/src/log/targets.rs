use crate::config::LogLevel;

// Every log target is declared once, here
macro_rules! define_log_targets {
    ($(($const_name:ident, $field_name:ident, $target_str:expr)),* $(,)?) => {
        $(
            pub const $const_name: &str = $target_str;
        )*

        pub fn log_targets() -> Vec<&'static str> {
            vec![
                $(
                    $const_name,
                )*
            ]
        }

        pub fn log_level_for(config: &crate::config::LogConfig, target: &str) -> LogLevel {
            match target {
                $(
                    $const_name => config.$field_name,
                )*
                _ => config.level,
            }
        }

        // Fails to compile when LogConfig is missing a field for one of the targets
        pub const fn validate_log_config_fields() {
            use crate::config::LogConfig;

            let _config = LogConfig {
                ansi_enabled: true,
                format: crate::config::LogFormat::Pretty,
                output: crate::config::LogOutput::Stderr,
                level: LogLevel::Info,
                $(
                    $field_name: LogLevel::Info,
                )*
            };
        }

        // A new target (NEWTARGET, new_target_level, "new_target") also needs:
        // 1. a `new_target_level` field on LogConfig in config/log.rs, with the default log level
        // 2. a `new_target_level: level` assignment in LogConfig::with_level()
    };
}

define_log_targets!(
    (DEVELOPMENT, development_level, "development"),
    (CONFIG, config_level, "config"),
    (PARSER, parser_level, query_equiv::PARSER),
    (ALIAS, alias_level, query_equiv::ALIAS),
    (COMPARE, compare_level, query_equiv::COMPARE),
    (EXECUTE, execute_level, "execute"),
);

const _: () = validate_log_config_fields();
