//! Device-control channel: the transport primitive commands travel over.

pub mod adb;
pub mod commands;
pub mod properties;

use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;

pub use adb::AdbChannel;
pub use properties::DeviceProperties;

/// What a channel can express beyond straight two-point swipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelCapabilities {
    /// Multi-point finger paths (down / move / up with explicit timing).
    pub path_gestures: bool,
    /// Several pointers in one touch stream (`POINTER_DOWN` / `POINTER_UP`).
    pub multi_touch: bool,
}

/// Transport used to send primitive commands to one device and read its UI state.
///
/// Implementations must not be shared between devices; the engine relies on one
/// channel per device id for its ordering guarantees.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    fn device_id(&self) -> &str;

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities::default()
    }

    /// Run a shell command on the device and return its stdout.
    async fn shell(&self, command: &str) -> Result<String>;

    /// Write a PNG screenshot of the current screen to `destination` on the host.
    async fn screenshot(&self, destination: &Path) -> Result<()>;

    /// Raw input-event lines (`getevent -l` format) as they arrive.
    async fn input_events(&self) -> Result<BoxStream<'static, String>>;
}
