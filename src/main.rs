// src/main.rs

pub mod config;
pub mod error;
pub mod logging;
pub mod message;
pub mod roster;
pub mod signal;

use std::env;
use std::process::ExitCode;

use tracing::{error, info};

use crate::config::Config;
use crate::error::{NotifierError, Result};
use crate::signal::{DispatchTarget, DryRun, MessageSink, SignalCli};

fn main() -> ExitCode {
    // .env is only for local runs; CI injects real secrets.
    if env::var("GITHUB_ACTIONS").as_deref() != Ok("true") {
        dotenv::dotenv().ok();
    }

    let _guard = match logging::init(&config::log_path()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("== New MRC4 notifier job run ==");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run() -> Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Err(e);
        }
    };

    if config.test_mode {
        info!("running in TEST MODE, no messages will be sent");
    }
    info!("roster path: {}", config.roster_path.display());
    if let Ok(cwd) = env::current_dir() {
        info!("working directory: {}", cwd.display());
    }

    let sink = make_sink(&config)?;

    match pipeline(&config, sink.as_ref()) {
        Ok(()) => Ok(()),
        Err(e @ NotifierError::SheetFormat(_)) => {
            error!("roster format error detected, sending admin alert");
            let alert = format!("MRC4 notifier skipped: {e}");
            let target = DispatchTarget::direct(config.alert_number.clone());
            if let Err(alert_err) = sink.deliver(&alert, &target) {
                error!("admin alert failed: {alert_err}");
            }
            Err(e)
        }
        Err(e) => {
            error!("unhandled failure: {e}");
            Err(e)
        }
    }
}

/// Load, compose, deliver. Either the complete message reaches the sink or
/// nothing does.
fn pipeline(config: &Config, sink: &dyn MessageSink) -> Result<()> {
    let table = roster::load_roster(&config.roster_path, &config.sheet_name)?;
    let body = message::compose(&table)?;
    let target = DispatchTarget::group(config.signal_number.clone(), config.group_id.clone());
    sink.deliver(&body, &target)
}

fn make_sink(config: &Config) -> Result<Box<dyn MessageSink>> {
    if config.test_mode {
        return Ok(Box::new(DryRun));
    }
    match &config.signal_cli_path {
        Some(binary) => Ok(Box::new(SignalCli::new(binary.clone()))),
        None => {
            let e = NotifierError::Config("environment variable SIGNAL_CLI_PATH not set".into());
            error!("{e}");
            Err(e)
        }
    }
}
