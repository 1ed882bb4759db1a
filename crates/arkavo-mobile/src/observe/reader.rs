use super::hierarchy::{derive_insets, parse_hierarchy, parse_screen_size};
use super::snapshot::{ScreenSize, ScreenSnapshot, SystemInsets};
use crate::device::{DeviceChannel, commands};
use crate::{MobileError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    pub include_tree: bool,
    pub include_screenshot: bool,
    pub use_cache: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            include_tree: true,
            include_screenshot: false,
            use_cache: false,
        }
    }
}

impl CaptureOptions {
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn cached() -> Self {
        Self {
            use_cache: true,
            ..Self::default()
        }
    }
}

struct CachedSnapshot {
    captured_at: Instant,
    snapshot: Arc<ScreenSnapshot>,
}

impl CachedSnapshot {
    fn satisfies(&self, options: &CaptureOptions, ttl: Duration) -> bool {
        self.captured_at.elapsed() < ttl
            && (!options.include_tree || self.snapshot.element_tree.is_some())
            && (!options.include_screenshot || self.snapshot.screenshot_path.is_some())
    }
}

/// Captures [`ScreenSnapshot`]s from one device.
///
/// Channel failures are surfaced as-is and never retried here: a dead channel would
/// only burn the caller's timeout budget.
pub struct SnapshotReader {
    channel: Arc<dyn DeviceChannel>,
    screenshot_dir: PathBuf,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl SnapshotReader {
    pub fn new(channel: Arc<dyn DeviceChannel>, screenshot_dir: PathBuf, cache_ttl: Duration) -> Self {
        Self {
            channel,
            screenshot_dir,
            cache_ttl,
            cache: Mutex::new(None),
        }
    }

    pub async fn capture(&self, options: CaptureOptions) -> Result<Arc<ScreenSnapshot>> {
        if options.use_cache {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref().filter(|c| c.satisfies(&options, self.cache_ttl)) {
                tracing::trace!(device = self.channel.device_id(), "snapshot served from cache");
                return Ok(cached.snapshot.clone());
            }
        }

        let snapshot = Arc::new(self.capture_fresh(&options).await?);
        *self.cache.lock().await = Some(CachedSnapshot {
            captured_at: Instant::now(),
            snapshot: snapshot.clone(),
        });
        Ok(snapshot)
    }

    /// Drops the cached snapshot. Called after anything that may have changed the screen.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn capture_fresh(&self, options: &CaptureOptions) -> Result<ScreenSnapshot> {
        let device_id = self.channel.device_id().to_string();
        let screen_size = self.screen_size().await?;

        let element_tree = if options.include_tree {
            let dump = self.channel.shell(commands::DUMP_HIERARCHY).await?;
            Some(parse_hierarchy(&dump)?)
        } else {
            None
        };

        let system_insets = element_tree
            .as_ref()
            .map(|tree| derive_insets(tree, screen_size))
            .unwrap_or_else(SystemInsets::default);

        let screenshot_path = if options.include_screenshot {
            let path = self
                .screenshot_dir
                .join(format!("{}-{}.png", sanitize(&device_id), uuid::Uuid::new_v4()));
            self.channel.screenshot(&path).await?;
            Some(path)
        } else {
            None
        };

        tracing::debug!(
            device = %device_id,
            width = screen_size.width,
            height = screen_size.height,
            tree = element_tree.is_some(),
            screenshot = screenshot_path.is_some(),
            "captured snapshot"
        );

        Ok(ScreenSnapshot {
            device_id,
            timestamp: chrono::Utc::now(),
            screen_size,
            system_insets,
            element_tree,
            screenshot_path,
        })
    }

    async fn screen_size(&self) -> Result<ScreenSize> {
        let raw = self.channel.shell(commands::SCREEN_SIZE).await?;
        parse_screen_size(&raw).ok_or_else(|| {
            MobileError::Command(format!("Unrecognized `wm size` output: {}", raw.trim()))
        })
    }
}

fn sanitize(device_id: &str) -> String {
    device_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
