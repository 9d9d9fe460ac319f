//! Resilient multi-endpoint reads.
//!
//! `BatchFetcher::fetch_all` issues every request at once and always returns
//! one `BatchResult` per request, in submission order, whatever fails.
//! `fetch_primary_and_secondary` isolates one known-slow endpoint on its own
//! time budget (see `dual`).
//!
//! Retrying is left to callers.

pub mod batch;
pub mod dual;

use std::time::Duration;

use serde_json::Value;

use crate::api::Transport;
use crate::error::FetchError;

pub use batch::{BatchFetcher, BatchRequest, BatchResult};
pub use dual::{ChannelBudget, PRIMARY_TIMEOUT, SECONDARY_TIMEOUT};

/// One backend read, unwrapped from its envelope, optionally time-boxed.
pub(crate) async fn read(
    transport: &dyn Transport,
    path: &str,
    limit: Option<Duration>,
) -> Result<Value, FetchError> {
    let response = match limit {
        Some(limit) => tokio::time::timeout(limit, transport.get(path))
            .await
            .map_err(|_| FetchError::Timeout)?,
        None => transport.get(path).await,
    };
    response?.into_result()
}
