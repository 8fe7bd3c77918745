// src/config.rs

use std::env;
use std::path::PathBuf;

use crate::error::{NotifierError, Result};

const DEFAULT_SHEET: &str = "MRC4";
const DEFAULT_LOG_PATH: &str = "logs/notifier.log";

/// Runtime configuration, read from the environment once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub signal_number: String,
    pub group_id: String,
    pub alert_number: String,
    pub sheet_name: String,
    pub roster_path: PathBuf,
    pub test_mode: bool,
    pub signal_cli_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests never touch process env.
    fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let signal_number = required(&get, "SIGNAL_NUMBER")?;
        let group_id = required(&get, "GROUP_ID")?;
        let alert_number = get("ALERT_NUMBER").unwrap_or_else(|| signal_number.clone());
        let sheet_name = get("MRC4_SHEET").unwrap_or_else(|| DEFAULT_SHEET.to_string());
        let roster_path = PathBuf::from(required(&get, "MRC4_PATH")?);
        let test_mode = get("TEST_MODE")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        let signal_cli_path = get("SIGNAL_CLI_PATH").map(PathBuf::from);

        Ok(Self {
            signal_number,
            group_id,
            alert_number,
            sheet_name,
            roster_path,
            test_mode,
            signal_cli_path,
        })
    }
}

/// Log file destination; read before `Config` so logging can come up first.
pub fn log_path() -> PathBuf {
    env::var("LOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_PATH))
}

fn required<F>(get: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| NotifierError::Config(format!("environment variable {key} not set")))
}
