// src/signal.rs

use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, error, info};

use crate::error::{NotifierError, Result};

/// Where a message goes: a group broadcast, or a direct message when no
/// group id is set (admin alerts).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchTarget {
    pub sender: String,
    pub group: Option<String>,
}

impl DispatchTarget {
    pub fn group(sender: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            group: Some(group.into()),
        }
    }

    pub fn direct(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            group: None,
        }
    }
}

/// Delivery seam so the orchestrator and tests can swap the real subprocess
/// transport for a dry-run or recording sink.
pub trait MessageSink {
    fn deliver(&self, message: &str, target: &DispatchTarget) -> Result<()>;
}

/// `signal-cli` invocation shape: `-a <sender> send [-g <group>] -m <message>`.
pub fn build_args(target: &DispatchTarget, message: &str) -> Vec<String> {
    let mut args = vec!["-a".to_string(), target.sender.clone(), "send".to_string()];
    if let Some(group) = &target.group {
        args.push("-g".to_string());
        args.push(group.clone());
    }
    args.push("-m".to_string());
    args.push(message.to_string());
    args
}

/// Sends through the signal-cli binary: synchronous, captured output,
/// no timeout.
pub struct SignalCli {
    binary: PathBuf,
}

impl SignalCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl MessageSink for SignalCli {
    fn deliver(&self, message: &str, target: &DispatchTarget) -> Result<()> {
        let args = build_args(target, message);
        let output = Command::new(&self.binary).args(&args).output().map_err(|e| {
            error!("failed to spawn {}: {e}", self.binary.display());
            NotifierError::Dispatch(format!("failed to spawn {}: {e}", self.binary.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("failed to send Signal message");
            error!("stderr: {}", stderr.trim_end());
            return Err(NotifierError::Dispatch(format!(
                "signal-cli exited with {}",
                output.status
            )));
        }

        info!("Signal message sent");
        debug!("{}", String::from_utf8_lossy(&output.stdout).trim_end());
        Ok(())
    }
}

/// Test-mode sink: logs the would-be message and never spawns anything.
pub struct DryRun;

impl MessageSink for DryRun {
    fn deliver(&self, message: &str, target: &DispatchTarget) -> Result<()> {
        match &target.group {
            Some(group) => info!("test mode, skipping send to group {group}"),
            None => info!("test mode, skipping direct send to {}", target.sender),
        }
        info!("test message content:\n{message}");
        Ok(())
    }
}
