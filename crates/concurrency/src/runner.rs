//! Transaction runner for optimistic concurrency control
//!
//! Provides atomic multi-document commits:
//! 1. Validation of every op's precondition against the current documents
//! 2. Application of every op's mutation
//! 3. One revision bump for the whole transaction
//!
//! Both steps run inside a single [`DocumentStore::write`] call, so either all
//! ops apply or none do. No lock is held between calls: two writers racing on
//! the same document both read freely, and whichever commits second sees its
//! precondition fail with [`TetherError::TxnAborted`].
//!
//! ## Retrying
//!
//! [`TxnRunner::run_transaction`] never retries. [`TxnRunner::run`] takes a
//! builder that re-reads state and produces fresh ops for each attempt:
//!
//! ```text
//! runner.run(|attempt| {
//!     let current = load()?;          // re-read on every attempt
//!     if already_done(&current) {
//!         return Err(TetherError::NoOperations);
//!     }
//!     Ok(vec![op_guarded_by(&current)])
//! })?;
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::{TetherError, TetherResult};
use tether_storage::DocumentStore;

use crate::op::{Op, OpKind};
use crate::retry::RetryConfig;
use crate::validation::validate_op;

/// Hook run immediately before a transaction is submitted
pub type BeforeHook = Box<dyn FnOnce() + Send>;

/// Executes transactions against a shared [`DocumentStore`]
///
/// Cloning a runner is cheap; clones share the store and the hook queue.
#[derive(Clone)]
pub struct TxnRunner {
    store: DocumentStore,
    retry: RetryConfig,
    before_hooks: Arc<Mutex<VecDeque<BeforeHook>>>,
}

impl std::fmt::Debug for TxnRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxnRunner")
            .field("revision", &self.store.current_revision())
            .field("retry", &self.retry)
            .finish()
    }
}

impl TxnRunner {
    /// Create a runner with the default retry policy
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            retry: RetryConfig::default(),
            before_hooks: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Replace the retry policy used by [`TxnRunner::run`]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The retry policy
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Queue hooks to run before the next transactions, one per transaction
    ///
    /// Lets tests interleave a competing write between an entity's read and
    /// its commit.
    pub fn set_before_hooks(&self, hooks: Vec<BeforeHook>) {
        self.before_hooks.lock().extend(hooks);
    }

    fn run_before_hook(&self) {
        // Pop under the lock, run outside it: hooks submit transactions too.
        let hook = self.before_hooks.lock().pop_front();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Apply `ops` atomically
    ///
    /// Returns the committed revision. An empty op list commits nothing and
    /// returns the current revision.
    ///
    /// # Errors
    ///
    /// - `TxnAborted` if any precondition fails (nothing is written)
    /// - `NotFound` if an update or remove targets a missing document
    pub fn run_transaction(&self, ops: &[Op]) -> TetherResult<u64> {
        self.run_before_hook();
        if ops.is_empty() {
            return Ok(self.store.current_revision());
        }

        let revision = self.store.write(|view| {
            for (index, op) in ops.iter().enumerate() {
                let current = view.get(&op.key);
                if let Some(conflict) = validate_op(op, current.as_ref())? {
                    tracing::debug!(
                        op = index,
                        key = %conflict.key(),
                        base_revision = view.base_revision(),
                        "transaction precondition failed"
                    );
                    return Err(TetherError::TxnAborted);
                }

                match &op.kind {
                    OpKind::AssertOnly => {}
                    OpKind::Insert(doc) => view.put(op.key.clone(), doc.clone()),
                    OpKind::Update(update) => {
                        let mut doc = current.unwrap_or_default();
                        update.apply(&mut doc);
                        view.put(op.key.clone(), doc);
                    }
                    OpKind::Remove => view.remove(op.key.clone()),
                }
            }
            // Assert-only transactions stage nothing and leave the revision alone.
            if view.staged_len() == 0 {
                Ok(view.base_revision())
            } else {
                Ok(view.base_revision() + 1)
            }
        })?;

        tracing::debug!(revision, ops = ops.len(), "transaction committed");
        Ok(revision)
    }

    /// Build and run a transaction, retrying on precondition failure
    ///
    /// `build` receives the attempt number (0-based) and must re-read any
    /// state its ops depend on. Returning `Err(TetherError::NoOperations)`
    /// ends the run successfully without writing.
    ///
    /// # Errors
    ///
    /// - `ExcessiveContention` when every attempt was aborted
    /// - any error from `build` or from the store other than `TxnAborted`
    pub fn run<F>(&self, mut build: F) -> TetherResult<()>
    where
        F: FnMut(usize) -> TetherResult<Vec<Op>>,
    {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            let ops = match build(attempt) {
                Ok(ops) => ops,
                Err(TetherError::NoOperations) => return Ok(()),
                Err(e) => return Err(e),
            };

            match self.run_transaction(&ops) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_txn_aborted() => {
                    if attempt + 1 < attempts {
                        let delay = self.retry.calculate_delay(attempt);
                        tracing::warn!(
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            delay_ms = delay.as_millis() as u64,
                            "transaction aborted, retrying"
                        );
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(TetherError::ExcessiveContention { attempts })
    }
}
