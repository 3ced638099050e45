//! Transaction validation
//!
//! Every op is checked against the store as it stands at commit time, inside
//! the same write section that applies the ops. Rules:
//! - Update and remove ops require the document to exist (`NotFound` otherwise)
//! - Insert ops require the document to be absent (conflict otherwise)
//! - An op's [`Assert`] must hold (conflict otherwise)
//!
//! `NotFound` is reported as an error of its own; only conflicts turn into
//! the retryable `TxnAborted`.

use tether_core::{TetherError, TetherResult};
use tether_storage::{DocKey, Document};

use crate::op::{Assert, Op, OpKind};

/// Why a transaction could not commit
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictType {
    /// A precondition did not hold
    AssertionFailed {
        /// Document the assertion was checked against
        key: DocKey,
        /// The failed assertion
        assert: Assert,
    },
    /// An insert found the document already present
    DocumentExists {
        /// The existing document
        key: DocKey,
    },
}

impl ConflictType {
    /// Document the conflict was detected on
    pub fn key(&self) -> &DocKey {
        match self {
            ConflictType::AssertionFailed { key, .. } => key,
            ConflictType::DocumentExists { key } => key,
        }
    }
}

/// Validate one op against the document it targets
///
/// `current` is the document as visible to the transaction, `None` if absent.
/// Returns `Ok(None)` if the op may be applied.
pub fn validate_op(op: &Op, current: Option<&Document>) -> TetherResult<Option<ConflictType>> {
    match (&op.kind, current) {
        (OpKind::Update(_), None) | (OpKind::Remove, None) => {
            return Err(TetherError::not_found(format!("document {}", op.key)));
        }
        (OpKind::Insert(_), Some(_)) => {
            return Ok(Some(ConflictType::DocumentExists {
                key: op.key.clone(),
            }));
        }
        _ => {}
    }

    match &op.assert {
        Some(assert) if !assert.holds(current) => Ok(Some(ConflictType::AssertionFailed {
            key: op.key.clone(),
            assert: assert.clone(),
        })),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Update;
    use tether_storage::doc_from;

    #[test]
    fn test_update_missing_document_is_not_found() {
        let op = Op::update("c", "x", Update::set([("a", 1i64)]));
        let err = validate_op(&op, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_missing_document_is_not_found() {
        let err = validate_op(&Op::remove("c", "x"), None).unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_txn_aborted());
    }

    #[test]
    fn test_remove_existing_document_has_no_conflict() {
        let doc = doc_from([("state", "allocated")]);
        assert_eq!(validate_op(&Op::remove("c", "x"), Some(&doc)).unwrap(), None);
    }

    #[test]
    fn test_insert_existing_document_conflicts() {
        let doc = doc_from([("a", 1i64)]);
        let op = Op::insert("c", "x", doc.clone());
        let conflict = validate_op(&op, Some(&doc)).unwrap().unwrap();
        assert!(matches!(conflict, ConflictType::DocumentExists { .. }));
    }

    #[test]
    fn test_failed_assert_conflicts() {
        let doc = doc_from([("state", "allocated")]);
        let op = Op::update("c", "x", Update::set([("state", "unavailable")]))
            .with_assert(Assert::field_in("state", ["", "unavailable"]));
        let conflict = validate_op(&op, Some(&doc)).unwrap().unwrap();
        assert_eq!(conflict.key(), &DocKey::new("c", "x"));
    }
}
