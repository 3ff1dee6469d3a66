//! CLI smoke entry point.
//!
//! Usage: `taskhub_cli [config.json]`. Opens the configured store (in-memory
//! by default), starts logging when configured, and prints the schema
//! version. Exits non-zero on any setup failure.

use log::error;
use std::process::ExitCode;
use taskhub_core::db::migrations::schema_version;
use taskhub_core::CoreConfig;

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_smoke module=cli status=error");
            eprintln!("taskhub_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: Option<String>) -> Result<(), String> {
    let config = match config_path {
        Some(path) => CoreConfig::load(&path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    let logging = config.init_logging().map_err(|err| err.to_string())?;
    let conn = config.open_database().map_err(|err| err.to_string())?;
    let version = schema_version(&conn).map_err(|err| err.to_string())?;

    println!("taskhub_core ping={}", taskhub_core::ping());
    println!("taskhub_core version={}", taskhub_core::core_version());
    println!("taskhub_core schema_version={version}");
    println!("taskhub_core logging={}", if logging { "on" } else { "off" });
    Ok(())
}
