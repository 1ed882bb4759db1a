//! Decides when the UI has finished reacting to the last action, without fixed sleeps.

use crate::device::DeviceChannel;
use crate::observe::{CaptureOptions, ScreenSnapshot, SnapshotReader};
use crate::Result;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};

/// Slack added on top of the idle timeout so a misbehaving event stream cannot stall us.
pub const IDLE_HARD_LIMIT_SLACK: Duration = Duration::from_millis(100);

const TOUCH_EVENT_MARKERS: &[&str] = &["ABS_MT_", "BTN_TOUCH", "BTN_TOOL_FINGER", "ABS_X", "ABS_Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StabilityReport {
    pub stable: bool,
    /// Whether the settled layout differs from the pre-action baseline.
    pub changed: bool,
    pub polls: u32,
    pub elapsed_ms: u64,
}

pub struct StabilityMonitor {
    channel: Arc<dyn DeviceChannel>,
    reader: Arc<SnapshotReader>,
    idle_timeout: Duration,
    poll_interval: Duration,
    baseline: Mutex<Option<u64>>,
}

impl StabilityMonitor {
    pub fn new(
        channel: Arc<dyn DeviceChannel>,
        reader: Arc<SnapshotReader>,
        idle_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            channel,
            reader,
            idle_timeout,
            poll_interval,
            baseline: Mutex::new(None),
        }
    }

    /// Waits until no touch events arrive for the idle timeout. Returns `false` when the
    /// hard limit (`idle_timeout + 100ms`) expired first or the event stream was unusable.
    pub async fn wait_for_touch_idle(&self) -> Result<bool> {
        let mut events = match self.channel.input_events().await {
            Ok(events) => events,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(device = self.channel.device_id(), error = %e, "input events unavailable");
                return Ok(false);
            }
        };

        let started = Instant::now();
        let hard_deadline = started + self.idle_timeout + IDLE_HARD_LIMIT_SLACK;
        let mut idle_since = started;

        loop {
            let now = Instant::now();
            if now >= hard_deadline {
                tracing::debug!(device = self.channel.device_id(), "touch idle wait hit hard limit");
                return Ok(false);
            }

            let idle_deadline = idle_since + self.idle_timeout;
            if now >= idle_deadline {
                return Ok(true);
            }

            let window = idle_deadline.min(hard_deadline) - now;
            match timeout(window, events.next()).await {
                // Quiet for the rest of the window.
                Err(_) => {
                    if idle_deadline <= hard_deadline {
                        return Ok(true);
                    }
                }
                // Stream ended; nothing more can arrive.
                Ok(None) => return Ok(true),
                Ok(Some(line)) => {
                    if is_touch_event(&line) {
                        idle_since = Instant::now();
                    }
                }
            }
        }
    }

    /// Records the pre-action layout signature. Call once per action, before acting.
    pub async fn initialize_ui_stability_tracking(&self) -> Result<()> {
        let snapshot = self.reader.capture(CaptureOptions::cached()).await?;
        *self.baseline.lock().await = snapshot.structural_signature();
        Ok(())
    }

    /// Polls the layout until two consecutive signatures match or `max_wait` elapses.
    /// Never fails on timeout: some screens (video, spinners) never settle. Only an
    /// unreachable device is reported as an error.
    pub async fn wait_for_ui_stability(&self, max_wait: Duration) -> Result<StabilityReport> {
        let started = Instant::now();
        let deadline = started + max_wait;
        let baseline = *self.baseline.lock().await;
        // Settling takes two matching polls taken after the action.
        let mut previous = None;
        let mut polls = 0u32;

        let report = |stable: bool, last: Option<u64>, polls: u32| StabilityReport {
            stable,
            changed: last.is_some() && last != baseline,
            polls,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        loop {
            if Instant::now() >= deadline {
                tracing::debug!(
                    device = self.channel.device_id(),
                    polls,
                    "UI did not settle within {:?}",
                    max_wait
                );
                return Ok(report(false, previous, polls));
            }

            let snapshot = match timeout(deadline - Instant::now(), self.poll()).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) if e.is_fatal() => return Err(e),
                Ok(Err(e)) => {
                    tracing::debug!(device = self.channel.device_id(), error = %e, "stability poll failed");
                    polls += 1;
                    previous = None;
                    tokio::time::sleep(self.poll_interval.min(deadline.saturating_duration_since(Instant::now()))).await;
                    continue;
                }
                Err(_) => return Ok(report(false, previous, polls)),
            };
            polls += 1;

            let signature = snapshot.structural_signature();
            if signature.is_some() && signature == previous {
                *self.baseline.lock().await = signature;
                return Ok(report(true, signature, polls));
            }
            previous = signature;

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    async fn poll(&self) -> Result<Arc<ScreenSnapshot>> {
        self.reader.capture(CaptureOptions::fresh()).await
    }
}

fn is_touch_event(line: &str) -> bool {
    TOUCH_EVENT_MARKERS.iter().any(|marker| line.contains(marker))
}
