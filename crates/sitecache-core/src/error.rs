//! Failure types carried as data through the fetch and probe layers.

use thiserror::Error;

use crate::api::ApiError;

/// Error string used for any request that ran past its time budget.
pub const TIMEOUT_ERROR: &str = "timeout";

/// Why a single remote read did not produce a value.
///
/// Cloneable so one outcome can be handed to every caller awaiting a
/// coalesced fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,

    /// The transport failed (network, status code, decoding).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Unsuccessful(String),
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}
