use super::{DeviceChannel, commands};
use crate::Result;
use serde::{Deserialize, Serialize};

/// `settings get secure navigation_mode` value for full gesture navigation.
const NAVIGATION_MODE_GESTURE: &str = "2";

/// OS facts the navigation resolver keys its decisions on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub os_version: String,
    pub os_major: u32,
    pub sdk_level: Option<u32>,
    pub navigation_mode: Option<String>,
}

impl DeviceProperties {
    pub async fn query(channel: &dyn DeviceChannel) -> Result<Self> {
        let os_version = channel.shell(commands::OS_VERSION).await?.trim().to_string();
        let sdk_level = channel.shell(commands::SDK_LEVEL).await?.trim().parse().ok();

        // Older builds have no such setting and print "null" or fail outright.
        let navigation_mode = match channel.shell(commands::NAVIGATION_MODE).await {
            Ok(value) => {
                let value = value.trim();
                (!value.is_empty() && value != "null").then(|| value.to_string())
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::debug!(device = channel.device_id(), error = %e, "navigation_mode unreadable");
                None
            }
        };

        Ok(Self {
            os_major: parse_major(&os_version),
            os_version,
            sdk_level,
            navigation_mode,
        })
    }

    pub fn gesture_navigation(&self) -> bool {
        self.os_major >= 10 && self.navigation_mode.as_deref() == Some(NAVIGATION_MODE_GESTURE)
    }
}

/// "8.1.0" -> 8, "14" -> 14, "UpsideDownCake" -> 0.
fn parse_major(version: &str) -> u32 {
    version
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|major| major.parse().ok())
        .unwrap_or(0)
}
