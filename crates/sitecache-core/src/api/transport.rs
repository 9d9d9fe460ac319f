use async_trait::async_trait;

use crate::models::Envelope;

use super::ApiError;

/// A backend capable of serving read requests for a path.
///
/// Implementations own authentication and status-code handling. Callers
/// only see an [`Envelope`] or an [`ApiError`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET for `path` (relative to the backend base URL).
    async fn get(&self, path: &str) -> Result<Envelope, ApiError>;
}
