use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the events backend on non-2xx responses.
///
/// Every field is optional: proxies and the framework's default error page
/// do not always produce the same shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Most specific human-readable text the body carries.
    pub fn best_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.error.as_deref().filter(|m| !m.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what}: '{value}'")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(what: &'static str, value: impl Into<String>) -> Self {
        Self {
            what,
            value: value.into(),
        }
    }
}
