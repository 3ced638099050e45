//! In-process transport.
//!
//! Dispatches calls into a [`Dispatcher`] living in the same process. Each
//! call runs on its own thread and is abandoned after `call_timeout`; an
//! abandoned call may still complete, so its effect is unknown to the caller.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tether_api::{ApiCaller, Error, Result};

use crate::dispatcher::Dispatcher;

/// Default bound on a single call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`ApiCaller`] backed by an in-process [`Dispatcher`]
#[derive(Clone)]
pub struct InProcessConnection {
    dispatcher: Arc<Dispatcher>,
    call_timeout: Duration,
}

impl InProcessConnection {
    /// Connect to `dispatcher` with the default call timeout
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the call timeout
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// The call timeout
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }
}

impl ApiCaller for InProcessConnection {
    fn api_call(
        &self,
        facade: &str,
        version: u32,
        request: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let op = format!("{}.{}", facade, request);
        let (tx, rx) = mpsc::channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let (facade, request) = (facade.to_string(), request.to_string());
        thread::spawn(move || {
            let result = dispatcher.dispatch(&facade, version, &request, params);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.call_timeout) {
            Ok(result) => result.map_err(Error::Server),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(op = %op, timeout_ms = self.call_timeout.as_millis() as u64, "facade call timed out");
                Err(Error::Transport {
                    op,
                    reason: format!("timed out after {:?}", self.call_timeout),
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::Transport {
                op,
                reason: "connection closed before a response was received".to_string(),
            }),
        }
    }
}
