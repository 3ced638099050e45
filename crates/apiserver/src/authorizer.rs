//! Caller identity and access checks.

use std::fmt;
use std::sync::Arc;

use tether_core::Tag;

/// Decides whether the caller may act on one entity
pub type AuthorizerFn = Arc<dyn Fn(&Tag) -> bool + Send + Sync>;

/// Who is calling, and what they may touch
#[derive(Clone)]
pub struct Authorizer {
    tag: String,
    client: bool,
    can_access: AuthorizerFn,
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("tag", &self.tag)
            .field("client", &self.client)
            .finish()
    }
}

impl Authorizer {
    /// An operator client allowed to access every entity
    pub fn client(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            client: true,
            can_access: Arc::new(|_: &Tag| true),
        }
    }

    /// An in-cluster agent; agents may not call client facades
    pub fn agent(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            client: false,
            can_access: Arc::new(|_: &Tag| true),
        }
    }

    /// Restrict which entities the caller may access
    pub fn with_access(mut self, can_access: AuthorizerFn) -> Self {
        self.can_access = can_access;
        self
    }

    /// Tag of the authenticated entity
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// True if the caller is an operator client
    pub fn auth_client(&self) -> bool {
        self.client
    }

    /// True if the caller may act on `tag`
    pub fn can_access(&self, tag: &Tag) -> bool {
        (self.can_access)(tag)
    }
}
