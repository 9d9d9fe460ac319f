//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::api::{ApiError, Transport};
use crate::models::Envelope;

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    /// `{success: true, data}`
    Ok(Value),
    /// Transport-level failure with this message.
    Fail(String),
    /// `{success: false, message}`
    Unsuccessful(String),
    Delayed(Duration, Box<Scripted>),
}

#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(self, path: &str, data: Value) -> Self {
        self.script(path, Scripted::Ok(data));
        self
    }

    pub(crate) fn fail(self, path: &str, message: &str) -> Self {
        self.script(path, Scripted::Fail(message.to_string()));
        self
    }

    pub(crate) fn unsuccessful(self, path: &str, message: &str) -> Self {
        self.script(path, Scripted::Unsuccessful(message.to_string()));
        self
    }

    pub(crate) fn delayed(self, path: &str, delay: Duration, data: Value) -> Self {
        self.script(path, Scripted::Delayed(delay, Box::new(Scripted::Ok(data))));
        self
    }

    /// Replace the behavior of `path`, also usable mid-test.
    pub(crate) fn script(&self, path: &str, behavior: Scripted) {
        self.routes.lock().insert(path.to_string(), behavior);
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    fn resolve(behavior: Scripted) -> futures::future::BoxFuture<'static, Result<Envelope, ApiError>> {
        Box::pin(async move {
            match behavior {
                Scripted::Ok(data) => Ok(Envelope::ok(data)),
                Scripted::Fail(message) => Err(ApiError::Rejected(message)),
                Scripted::Unsuccessful(message) => Ok(Envelope::failed(message)),
                Scripted::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    Self::resolve(*inner).await
                }
            }
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Envelope, ApiError> {
        *self.calls.lock().entry(path.to_string()).or_insert(0) += 1;
        let behavior = self.routes.lock().get(path).cloned();
        match behavior {
            Some(behavior) => Self::resolve(behavior).await,
            None => Err(ApiError::NotFound(path.to_string())),
        }
    }
}
