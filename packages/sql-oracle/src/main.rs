use clap::Parser;
use sql_oracle::config::OracleConfig;
use sql_oracle::error::Error;
use sql_oracle::log::{CONFIG, EXECUTE};
use sql_oracle::{cli, log, Args};
use tracing::error;

fn main() {
    let args = Args::parse();

    let config = match OracleConfig::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration Error: {}", err);
            std::process::exit(exitcode::CONFIG);
        }
    };

    log::init(config.log.clone());

    let code = match cli::run(args, config) {
        Ok(code) => code,
        Err(Error::Config(err)) => {
            error!(target: CONFIG, msg = "Configuration error", error = err.to_string());
            exitcode::CONFIG
        }
        Err(Error::Parse(err)) => {
            error!(msg = "Could not parse SQL", error = err.to_string());
            exitcode::DATAERR
        }
        Err(err @ Error::SqlFile { .. }) => {
            error!(msg = "Could not read SQL", error = err.to_string());
            exitcode::NOINPUT
        }
        Err(Error::Execution(err)) => {
            error!(target: EXECUTE, msg = "Could not open database", error = err.to_string());
            exitcode::UNAVAILABLE
        }
        Err(err) => {
            error!(msg = "Unexpected error", error = err.to_string());
            exitcode::SOFTWARE
        }
    };

    std::process::exit(code);
}
