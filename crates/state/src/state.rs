//! The environment-scoped state handle

use std::fmt;

use tether_concurrency::{BeforeHook, Op, RetryConfig, TxnRunner};
use tether_core::{TetherError, TetherResult};
use tether_storage::{DocKey, DocumentStore, StoredDoc};
use uuid::Uuid;

use crate::config::TetherConfig;

/// Entry point for reading and mutating one environment's resources
///
/// `State` is cheap to clone and safe to share between threads. Clones share
/// the store, the runner and its before-hooks.
#[derive(Clone)]
pub struct State {
    runner: TxnRunner,
    env_uuid: Uuid,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("env_uuid", &self.env_uuid)
            .field("runner", &self.runner)
            .finish()
    }
}

impl State {
    /// Bind a state handle to a store and environment
    pub fn new(store: DocumentStore, env_uuid: Uuid) -> Self {
        Self {
            runner: TxnRunner::new(store),
            env_uuid,
        }
    }

    /// Open a state handle configured from `tether.toml`
    ///
    /// # Errors
    ///
    /// Fails if the config has no environment UUID yet.
    pub fn open(store: DocumentStore, config: &TetherConfig) -> TetherResult<Self> {
        let env_uuid = config
            .environment_uuid()?
            .ok_or_else(|| TetherError::invalid_input("config has no environment UUID"))?;
        Ok(Self::new(store, env_uuid).with_retry(config.retry_config()))
    }

    /// Replace the transaction retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.runner = self.runner.with_retry(retry);
        self
    }

    /// Environment this handle is scoped to
    pub fn env_uuid(&self) -> Uuid {
        self.env_uuid
    }

    /// Underlying document store
    pub fn store(&self) -> &DocumentStore {
        self.runner.store()
    }

    /// Queue hooks to run before upcoming transactions, one per transaction
    pub fn set_before_hooks(&self, hooks: Vec<BeforeHook>) {
        self.runner.set_before_hooks(hooks);
    }

    /// Globally unique document id for a local id
    pub fn doc_id(&self, local_id: &str) -> String {
        format!("{}:{}", self.env_uuid, local_id)
    }

    /// Strip the environment prefix from a document id
    pub fn local_id<'a>(&self, doc_id: &'a str) -> Option<&'a str> {
        doc_id
            .strip_prefix(&self.env_uuid.to_string())
            .and_then(|rest| rest.strip_prefix(':'))
    }

    pub(crate) fn doc_key(&self, collection: &str, local_id: &str) -> DocKey {
        DocKey::new(collection, self.doc_id(local_id))
    }

    pub(crate) fn get_doc(&self, collection: &str, local_id: &str) -> Option<StoredDoc> {
        self.store().get(&self.doc_key(collection, local_id))
    }

    /// Documents of a collection belonging to this environment
    pub(crate) fn find_docs<F>(&self, collection: &str, filter: F) -> Vec<StoredDoc>
    where
        F: Fn(&StoredDoc) -> bool,
    {
        let prefix = format!("{}:", self.env_uuid);
        self.store()
            .find(collection, filter)
            .into_iter()
            .filter(|(id, _)| id.starts_with(&prefix))
            .map(|(_, doc)| doc)
            .collect()
    }

    /// Apply `ops` atomically, without retrying
    pub fn run_transaction(&self, ops: &[Op]) -> TetherResult<u64> {
        self.runner.run_transaction(ops)
    }

    /// Build and run a transaction, retrying on conflict
    pub fn run<F>(&self, build: F) -> TetherResult<()>
    where
        F: FnMut(usize) -> TetherResult<Vec<Op>>,
    {
        self.runner.run(build)
    }
}
