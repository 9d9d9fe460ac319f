use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

/// Fallback message when the backend reports failure without saying why.
const UNSPECIFIED_FAILURE: &str = "request reported failure";

/// Response wrapper used by every backend route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Unwrap the payload, turning `success: false` into an error.
    /// A successful envelope with no `data` yields `null`.
    pub fn into_result(self) -> Result<Value, FetchError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(FetchError::Unsuccessful(
                self.message.unwrap_or_else(|| UNSPECIFIED_FAILURE.to_string()),
            ))
        }
    }
}
