use thiserror::Error;

#[derive(Error, Debug)]
pub enum MobileError {
    /// The device-control channel itself could not be reached.
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Element not found: {description}{}", format_available(.available))]
    TargetNotFound {
        description: String,
        available: Vec<String>,
    },

    /// A primitive command (tap, swipe, keyevent, shell query) reached the device but failed.
    #[error("Device command failed: {0}")]
    Command(String),

    #[error("View hierarchy unavailable: {0}")]
    MissingViewHierarchy(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

impl MobileError {
    /// Stable machine-readable code used when an error is folded into an action result.
    pub fn code(&self) -> &'static str {
        match self {
            MobileError::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            MobileError::TargetNotFound { .. } => "ELEMENT_NOT_FOUND",
            MobileError::Command(_) => "COMMAND_FAILED",
            MobileError::MissingViewHierarchy(_) => "VIEW_HIERARCHY_UNAVAILABLE",
            MobileError::InvalidTarget(_) => "INVALID_TARGET",
            MobileError::Timeout(_) => "TIMEOUT",
            MobileError::Config(_) => "CONFIG_ERROR",
            MobileError::Io(_) => "IO_ERROR",
            MobileError::Json(_) => "PARSE_ERROR",
        }
    }

    /// Errors that mean the channel is gone. These are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MobileError::DeviceUnavailable(_))
    }

    pub fn not_found(description: impl Into<String>, available: Vec<String>) -> Self {
        MobileError::TargetNotFound {
            description: description.into(),
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, MobileError>;
