//! Services and their metric credentials

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tether_concurrency::{Assert, Op, Update};
use tether_core::names::is_valid_service;
use tether_core::{ResultExt, ServiceTag, TetherError, TetherResult, Value};
use tether_storage::doc_from;

use crate::docs::{from_document, to_document, SEQUENCE_C, SERVICES_C, UNITS_C};
use crate::state::State;
use crate::units::{Unit, UnitDoc};

/// Whether an entity is in use or being torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Life {
    /// In use
    #[default]
    Alive,
    /// Being destroyed; no further changes accepted
    Dying,
}

impl Life {
    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            Life::Alive => "alive",
            Life::Dying => "dying",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ServiceDoc {
    #[serde(rename = "env-uuid")]
    env_uuid: String,
    name: String,
    /// Base64 of the raw credential bytes
    #[serde(rename = "metric-credentials", default, skip_serializing_if = "String::is_empty")]
    metric_credentials: String,
    #[serde(default)]
    life: Life,
}

/// Handle to one service document
#[derive(Debug, Clone)]
pub struct Service {
    st: State,
    doc: ServiceDoc,
}

impl Service {
    /// Service name, e.g. `mysql`
    pub fn name(&self) -> &str {
        &self.doc.name
    }

    /// `service-<name>`
    pub fn tag(&self) -> TetherResult<ServiceTag> {
        ServiceTag::new(&self.doc.name)
    }

    /// Life as of the last refresh
    pub fn life(&self) -> Life {
        self.doc.life
    }

    /// Credentials the service uses to submit metrics
    pub fn metric_credentials(&self) -> TetherResult<Vec<u8>> {
        BASE64.decode(&self.doc.metric_credentials).map_err(|e| TetherError::Serialization {
            reason: format!("metric credentials of service {}: {}", self.doc.name, e),
        })
    }

    /// Replace the service's metric credentials
    ///
    /// Fails with `NotValid` once the service is no longer alive.
    pub fn set_metric_credentials(&mut self, credentials: &[u8]) -> TetherResult<()> {
        let encoded = BASE64.encode(credentials);
        let st = self.st.clone();
        st.run(|attempt| {
            if attempt > 0 {
                self.refresh()?;
            }
            if self.doc.life != Life::Alive {
                return Err(TetherError::not_valid(format!(
                    "service {} is not alive",
                    self.doc.name
                )));
            }
            Ok(vec![Op::update(
                SERVICES_C,
                st.doc_id(&self.doc.name),
                Update::set([("metric-credentials", encoded.as_str())]),
            )
            .with_assert(Assert::field_eq("life", Life::Alive.as_str()))])
        })
        .annotate_with(|| "cannot update metric credentials")?;
        self.doc.metric_credentials = encoded;
        tracing::info!(service = %self.doc.name, "metric credentials updated");
        Ok(())
    }

    /// Mark the service as dying
    pub fn destroy(&mut self) -> TetherResult<()> {
        let ops = [Op::update(
            SERVICES_C,
            self.st.doc_id(&self.doc.name),
            Update::set([("life", Life::Dying.as_str())]),
        )];
        self.st
            .run_transaction(&ops)
            .annotate_with(|| format!("cannot destroy service {}", self))?;
        self.doc.life = Life::Dying;
        tracing::info!(service = %self.doc.name, "service destroyed");
        Ok(())
    }

    /// Add a new unit, numbered from the service's sequence
    pub fn add_unit(&self) -> TetherResult<Unit> {
        let seq_id = format!("service-{}", self.doc.name);
        let seq_key = self.st.doc_key(SEQUENCE_C, &seq_id);
        let mut unit_doc = None;

        self.st
            .run(|_| {
                let life = self
                    .st
                    .get_doc(SERVICES_C, &self.doc.name)
                    .ok_or_else(|| TetherError::not_found(format!("service {:?}", self.doc.name)))?
                    .field("life")
                    .clone();
                if life.as_str() != Some(Life::Alive.as_str()) {
                    return Err(TetherError::not_valid(format!(
                        "service {} is not alive",
                        self.doc.name
                    )));
                }

                let (number, seq_op) = match self.st.store().get(&seq_key) {
                    None => (
                        0,
                        Op::insert(
                            SEQUENCE_C,
                            seq_key.id.clone(),
                            doc_from([("name", Value::from(seq_id.as_str())), ("counter", Value::Int(1))]),
                        ),
                    ),
                    Some(seq) => {
                        let current = seq.field("counter").clone();
                        let number = current.as_int().ok_or_else(|| {
                            TetherError::internal(format!("sequence {} has no counter", seq_id))
                        })?;
                        let op = Op::update(
                            SEQUENCE_C,
                            seq_key.id.clone(),
                            Update::set([("counter", number + 1)]),
                        )
                        .with_assert(Assert::FieldEq("counter".to_string(), current));
                        (number, op)
                    }
                };

                let doc = UnitDoc {
                    env_uuid: self.st.env_uuid().to_string(),
                    name: format!("{}/{}", self.doc.name, number),
                    service: self.doc.name.clone(),
                };
                let ops = vec![
                    Op::assert(
                        SERVICES_C,
                        self.st.doc_id(&self.doc.name),
                        Assert::field_eq("life", Life::Alive.as_str()),
                    ),
                    seq_op,
                    Op::insert(UNITS_C, self.st.doc_id(&doc.name), to_document(&doc)?),
                ];
                unit_doc = Some(doc);
                Ok(ops)
            })
            .annotate_with(|| format!("cannot add unit to service {}", self))?;

        let doc = unit_doc.ok_or_else(|| TetherError::internal("unit was not built"))?;
        tracing::info!(unit = %doc.name, "added unit");
        Ok(Unit::from_doc(self.st.clone(), doc))
    }

    /// Units of this service, ordered by name
    pub fn all_units(&self) -> TetherResult<Vec<Unit>> {
        let mut units = self
            .st
            .find_docs(UNITS_C, |doc| doc.field("service").as_str() == Some(self.name()))
            .iter()
            .map(|stored| Ok(Unit::from_doc(self.st.clone(), from_document(&stored.fields)?)))
            .collect::<TetherResult<Vec<_>>>()?;
        units.sort_by_key(|u| u.number());
        Ok(units)
    }

    /// Reload the snapshot from the store
    pub fn refresh(&mut self) -> TetherResult<()> {
        let fresh = self.st.service(&self.doc.name)?;
        self.doc = fresh.doc;
        Ok(())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc.name)
    }
}

impl State {
    /// Create a service
    ///
    /// # Errors
    ///
    /// `InvalidName` for a malformed name, `AlreadyExists` for a duplicate.
    pub fn add_service(&self, name: &str) -> TetherResult<Service> {
        if !is_valid_service(name) {
            return Err(TetherError::InvalidName {
                kind: "service",
                name: name.to_string(),
            });
        }
        let doc = ServiceDoc {
            env_uuid: self.env_uuid().to_string(),
            name: name.to_string(),
            metric_credentials: String::new(),
            life: Life::Alive,
        };
        let ops = [Op::insert(SERVICES_C, self.doc_id(name), to_document(&doc)?)];
        self.run_transaction(&ops)
            .map_err(|e| {
                if e.is_txn_aborted() {
                    TetherError::already_exists(format!("service {}", name))
                } else {
                    e
                }
            })
            .annotate_with(|| format!("cannot add service {}", name))?;

        tracing::info!(service = name, "added service");
        Ok(Service {
            st: self.clone(),
            doc,
        })
    }

    /// Fetch a service by name
    pub fn service(&self, name: &str) -> TetherResult<Service> {
        let stored = self
            .get_doc(SERVICES_C, name)
            .ok_or_else(|| TetherError::not_found(format!("service {:?}", name)))?;
        Ok(Service {
            st: self.clone(),
            doc: from_document(&stored.fields)?,
        })
    }

    /// Every service, ordered by name
    pub fn all_services(&self) -> TetherResult<Vec<Service>> {
        self.find_docs(SERVICES_C, |_| true)
            .iter()
            .map(|stored| {
                Ok(Service {
                    st: self.clone(),
                    doc: from_document(&stored.fields)?,
                })
            })
            .collect()
    }
}
