use super::{ChannelCapabilities, DeviceChannel};
use crate::{MobileError, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// stderr fragments adb prints when the transport, not the command, is the problem.
const UNREACHABLE_MARKERS: &[&str] = &[
    "no devices/emulators found",
    "device offline",
    "device unauthorized",
    "cannot connect",
    "connection reset",
    "error: closed",
];

/// Device channel backed by the `adb` command line tool.
pub struct AdbChannel {
    adb_path: PathBuf,
    serial: String,
    motion_events: bool,
}

impl AdbChannel {
    pub fn new(adb_path: impl Into<PathBuf>, serial: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial: serial.into(),
            motion_events: false,
        }
    }

    /// Enable `input motionevent` paths. Only Android 11+ builds of `input` accept them.
    pub fn with_motion_events(mut self, enabled: bool) -> Self {
        self.motion_events = enabled;
        self
    }

    /// Serials of every device adb reports in the `device` state.
    pub async fn list_devices(adb_path: &Path) -> Result<Vec<String>> {
        let output = Command::new(adb_path)
            .arg("devices")
            .output()
            .await
            .map_err(|e| MobileError::DeviceUnavailable(format!("Failed to run adb: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_device_list(&stdout))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        cmd.arg("-s").arg(&self.serial);
        cmd.kill_on_drop(true);
        cmd
    }

    fn check(&self, what: &str, output: Output) -> Result<Output> {
        if output.status.success() {
            return Ok(output);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_unreachable(&stderr) {
            return Err(MobileError::DeviceUnavailable(format!(
                "{}: {}",
                self.serial, stderr
            )));
        }

        Err(MobileError::Command(format!(
            "{} failed on {} (exit {:?}): {}",
            what,
            self.serial,
            output.status.code(),
            stderr
        )))
    }
}

#[async_trait]
impl DeviceChannel for AdbChannel {
    fn device_id(&self) -> &str {
        &self.serial
    }

    fn capabilities(&self) -> ChannelCapabilities {
        // The stock `input` tool only drives a single pointer.
        ChannelCapabilities {
            path_gestures: self.motion_events,
            multi_touch: false,
        }
    }

    async fn shell(&self, command: &str) -> Result<String> {
        tracing::debug!(device = %self.serial, command, "adb shell");

        let output = self
            .command()
            .arg("shell")
            .arg(command)
            .output()
            .await
            .map_err(|e| MobileError::DeviceUnavailable(format!("Failed to run adb: {}", e)))?;

        let output = self.check(command, output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn screenshot(&self, destination: &Path) -> Result<()> {
        let output = self
            .command()
            .args(["exec-out", "screencap", "-p"])
            .output()
            .await
            .map_err(|e| MobileError::DeviceUnavailable(format!("Failed to run adb: {}", e)))?;

        let output = self.check("screencap", output)?;
        if output.stdout.is_empty() {
            return Err(MobileError::Command("screencap returned no data".to_string()));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &output.stdout).await?;
        Ok(())
    }

    async fn input_events(&self) -> Result<BoxStream<'static, String>> {
        let mut child = self
            .command()
            .args(["shell", "getevent", "-l"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MobileError::DeviceUnavailable(format!("Failed to start getevent: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MobileError::Command("Failed to capture getevent stdout".to_string()))?;

        // The child rides along in the stream state so dropping the stream kills it.
        let lines = BufReader::new(stdout).lines();
        let events = stream::unfold((child, lines), |(child, mut lines)| async move {
            match lines.next_line().await {
                Ok(Some(line)) => Some((line, (child, lines))),
                _ => None,
            }
        });

        Ok(events.boxed())
    }
}

fn is_unreachable(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    UNREACHABLE_MARKERS.iter().any(|m| lowered.contains(m))
        || (lowered.contains("device '") && lowered.contains("not found"))
}

fn parse_device_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip_while(|line| !line.starts_with("List of devices"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}
