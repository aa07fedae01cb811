//! Startup check: is the measurement tool installed and runnable?

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const INSTALL_HINT: &str =
    "Install it with: sudo apt install speedtest-cli\nOr: pip install speedtest-cli";

/// The only failure that stops the process before the first tick.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{binary} is not installed or not in PATH\n{}", INSTALL_HINT)]
    Missing { binary: String },
    #[error("{binary} is installed but not usable: {detail}\n{}", INSTALL_HINT)]
    Unusable { binary: String, detail: String },
}

/// Run `<binary> --version`; return the first line of its output on success.
pub async fn check_tool(binary: &str) -> Result<String, StartupError> {
    let child = Command::new(binary)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();
    let child = match child {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StartupError::Missing {
                binary: binary.to_string(),
            })
        }
        Err(e) => {
            return Err(StartupError::Unusable {
                binary: binary.to_string(),
                detail: e.to_string(),
            })
        }
    };

    let output = match tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(StartupError::Unusable {
                binary: binary.to_string(),
                detail: e.to_string(),
            })
        }
        Err(_) => {
            return Err(StartupError::Unusable {
                binary: binary.to_string(),
                detail: format!("--version did not answer within {}s", PROBE_TIMEOUT.as_secs()),
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(StartupError::Unusable {
            binary: binary.to_string(),
            detail: format!("--version exited with {}: {}", output.status, stderr),
        });
    }
    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    tracing::debug!(binary, version = %version, "measurement tool found");
    Ok(version)
}
