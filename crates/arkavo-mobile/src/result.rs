use crate::observe::ScreenSnapshot;
use crate::MobileError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
}

impl From<&MobileError> for ActionError {
    fn from(error: &MobileError) -> Self {
        let available = match error {
            MobileError::TargetNotFound { available, .. } => available.clone(),
            _ => Vec::new(),
        };
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            available,
        }
    }
}

/// Plain result record handed back to the dispatch layer.
///
/// `success` is always present and a successful result always carries an observation.
/// Everything else is operation specific and lives in `details`, flattened into the
/// top level when serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(flatten)]
    pub details: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<Arc<ScreenSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActionResult {
    pub fn success(observation: Arc<ScreenSnapshot>) -> Self {
        Self {
            success: true,
            details: Map::new(),
            observation: Some(observation),
            error: None,
        }
    }

    pub fn failure(error: &MobileError) -> Self {
        Self {
            success: false,
            details: Map::new(),
            observation: None,
            error: Some(error.into()),
        }
    }

    /// An outcome the caller should react to rather than an error, such as text that
    /// never became visible.
    pub fn unmet(code: &str, message: impl Into<String>, observation: Option<Arc<ScreenSnapshot>>) -> Self {
        Self {
            success: false,
            details: Map::new(),
            observation,
            error: Some(ActionError {
                code: code.to_string(),
                message: message.into(),
                available: Vec::new(),
            }),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": {"code": "PARSE_ERROR", "message": e.to_string()}
            })
        })
    }
}
