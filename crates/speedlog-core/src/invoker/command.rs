//! Build and run the `speedtest-cli` command line under a hard timeout.

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use crate::config::SpeedtestConfig;

/// How a single run of the tool ended, before any interpretation.
#[derive(Debug)]
pub enum CommandRun {
    /// The process exited (successfully or not) within the budget.
    Exited(Output),
    /// The hard timeout elapsed; the child has been killed.
    TimedOut,
    /// The process could not be started or waited on.
    Io(std::io::Error),
}

/// A ready-to-run `speedtest-cli` invocation.
#[derive(Debug, Clone)]
pub struct SpeedtestCommand {
    binary: String,
    args: Vec<String>,
    hard_timeout: Duration,
}

impl SpeedtestCommand {
    /// Translate the configured measurement knobs into command-line flags.
    pub fn from_config(cfg: &SpeedtestConfig) -> Self {
        let mut args = vec![
            "--json".to_string(),
            "--timeout".to_string(),
            cfg.timeout_secs.to_string(),
        ];
        if cfg.secure {
            args.push("--secure".to_string());
        }
        if cfg.single {
            args.push("--single".to_string());
        }
        for id in &cfg.servers {
            args.push("--server".to_string());
            args.push(id.to_string());
        }
        for id in &cfg.exclude_servers {
            args.push("--exclude".to_string());
            args.push(id.to_string());
        }
        Self {
            binary: cfg.binary.clone(),
            args,
            hard_timeout: cfg.hard_timeout(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn hard_timeout(&self) -> Duration {
        self.hard_timeout
    }

    /// Run the tool, capturing stdout/stderr. Dropping the returned future
    /// (timeout or cancellation) kills the child.
    pub async fn run(&self) -> CommandRun {
        let child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(c) => c,
            Err(e) => return CommandRun::Io(e),
        };
        match tokio::time::timeout(self.hard_timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => CommandRun::Exited(output),
            Ok(Err(e)) => CommandRun::Io(e),
            Err(_) => CommandRun::TimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        let cmd = SpeedtestCommand::from_config(&SpeedtestConfig::default());
        assert_eq!(cmd.binary(), "speedtest-cli");
        assert_eq!(
            cmd.args(),
            &["--json", "--timeout", "60", "--secure", "--single"]
        );
        assert_eq!(cmd.hard_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn servers_and_exclusions_are_propagated() {
        let cfg = SpeedtestConfig {
            secure: false,
            single: false,
            servers: vec![11, 22],
            exclude_servers: vec![33],
            timeout_secs: 30,
            ..SpeedtestConfig::default()
        };
        let cmd = SpeedtestCommand::from_config(&cfg);
        assert_eq!(
            cmd.args(),
            &[
                "--json", "--timeout", "30", "--server", "11", "--server", "22", "--exclude",
                "33"
            ]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_io_error() {
        let cfg = SpeedtestConfig {
            binary: "/nonexistent/speedtest-cli-for-tests".to_string(),
            ..SpeedtestConfig::default()
        };
        let run = SpeedtestCommand::from_config(&cfg).run().await;
        assert!(matches!(run, CommandRun::Io(_)));
    }
}
