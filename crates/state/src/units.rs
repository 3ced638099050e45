//! Units: numbered instances of a service

use std::fmt;

use serde::{Deserialize, Serialize};
use tether_core::{TetherError, TetherResult, UnitTag};

use crate::actions::Action;
use crate::docs::{from_document, UNITS_C};
use crate::state::State;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UnitDoc {
    #[serde(rename = "env-uuid")]
    pub(crate) env_uuid: String,
    pub(crate) name: String,
    pub(crate) service: String,
}

/// Handle to one unit document
#[derive(Debug, Clone)]
pub struct Unit {
    st: State,
    doc: UnitDoc,
}

impl Unit {
    pub(crate) fn from_doc(st: State, doc: UnitDoc) -> Self {
        Self { st, doc }
    }

    /// Unit name, e.g. `mysql/0`
    pub fn name(&self) -> &str {
        &self.doc.name
    }

    /// Name of the owning service
    pub fn service_name(&self) -> &str {
        &self.doc.service
    }

    /// Number within the service
    pub fn number(&self) -> u64 {
        self.doc
            .name
            .rsplit_once('/')
            .and_then(|(_, n)| n.parse().ok())
            .unwrap_or_default()
    }

    /// `unit-<service>-<n>`
    pub fn tag(&self) -> TetherResult<UnitTag> {
        UnitTag::new(&self.doc.name)
    }

    /// Actions queued for this unit, oldest first
    pub fn actions(&self) -> TetherResult<Vec<Action>> {
        self.st.actions_for(&self.tag()?)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc.name)
    }
}

impl State {
    /// Fetch a unit by name
    pub fn unit(&self, name: &str) -> TetherResult<Unit> {
        UnitTag::new(name)?;
        let stored = self
            .get_doc(UNITS_C, name)
            .ok_or_else(|| TetherError::not_found(format!("unit {:?}", name)))?;
        Ok(Unit::from_doc(self.clone(), from_document(&stored.fields)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_storage::DocumentStore;
    use uuid::Uuid;

    #[test]
    fn test_unit_lookup() {
        let st = State::new(DocumentStore::new(), Uuid::new_v4());
        let svc = st.add_service("wordpress").unwrap();
        svc.add_unit().unwrap();

        let unit = st.unit("wordpress/0").unwrap();
        assert_eq!(unit.service_name(), "wordpress");
        assert_eq!(unit.number(), 0);
        assert_eq!(unit.tag().unwrap().to_string(), "unit-wordpress-0");
        assert!(unit.actions().unwrap().is_empty());
    }

    #[test]
    fn test_unit_lookup_errors() {
        let st = State::new(DocumentStore::new(), Uuid::new_v4());
        assert!(matches!(
            st.unit("wordpress").unwrap_err(),
            TetherError::InvalidName { kind: "unit", .. }
        ));
        assert_eq!(
            st.unit("wordpress/7").unwrap_err().to_string(),
            "unit \"wordpress/7\" not found"
        );
    }
}
