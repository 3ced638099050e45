//! IP address lifecycle
//!
//! Addresses are created in the [`AddressState::Unknown`] state and then
//! become either allocated or unavailable, once:
//!
//! ```text
//!            ┌──────────► Allocated ──┐
//! Unknown ───┤                        ├── (self-transitions only)
//!            └──────────► Unavailable ┘
//! ```
//!
//! The allowed set is enforced as the store precondition
//! `state ∈ {Unknown, new}`, so two racing transitions to different targets
//! cannot both commit.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tether_concurrency::{Assert, Op, Update};
use tether_core::names::is_valid_machine;
use tether_core::{ResultExt, TetherError, TetherResult};

use crate::docs::{from_document, to_document, IPADDRESSES_C};
use crate::state::State;

/// Lifecycle state of an IP address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AddressState {
    /// Initial state; stored as the empty string
    #[default]
    Unknown,
    /// Successfully allocated by the provider and in use
    Allocated,
    /// Allocation with the provider failed; never use or retry this address
    Unavailable,
}

impl AddressState {
    /// Stored form
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressState::Unknown => "",
            AddressState::Allocated => "allocated",
            AddressState::Unavailable => "unavailable",
        }
    }

    /// Whether `set_state(next)` is permitted from this state
    pub fn can_transition_to(&self, next: AddressState) -> bool {
        *self == AddressState::Unknown || *self == next
    }
}

impl fmt::Display for AddressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AddressState {
    type Error = TetherError;

    fn try_from(s: String) -> TetherResult<Self> {
        match s.as_str() {
            "" => Ok(AddressState::Unknown),
            "allocated" => Ok(AddressState::Allocated),
            "unavailable" => Ok(AddressState::Unavailable),
            other => Err(TetherError::invalid_input(format!(
                "unknown address state {:?}",
                other
            ))),
        }
    }
}

impl From<AddressState> for String {
    fn from(state: AddressState) -> String {
        state.as_str().to_string()
    }
}

/// Kind of address value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Dotted-quad IPv4 address
    Ipv4,
    /// IPv6 address
    Ipv6,
    /// Anything that does not parse as an IP address
    Hostname,
}

impl AddressType {
    /// Classify a value
    pub fn derive(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => AddressType::Ipv4,
            Ok(IpAddr::V6(_)) => AddressType::Ipv6,
            Err(_) => AddressType::Hostname,
        }
    }
}

/// Network reachability of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    /// Not set
    #[default]
    #[serde(rename = "")]
    Unknown,
    /// Reachable from anywhere
    #[serde(rename = "public")]
    Public,
    /// Reachable within the cloud
    #[serde(rename = "local-cloud")]
    CloudLocal,
    /// Reachable only on the machine itself
    #[serde(rename = "local-machine")]
    MachineLocal,
    /// Link-local
    #[serde(rename = "link-local")]
    LinkLocal,
}

impl Scope {
    /// True for [`Scope::Unknown`]
    pub fn is_unknown(&self) -> bool {
        *self == Scope::Unknown
    }
}

/// An address value with its derived type and scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Address text, e.g. `10.0.0.1`
    pub value: String,
    /// Derived from `value`
    #[serde(rename = "type")]
    pub address_type: AddressType,
    /// Reachability
    #[serde(default, skip_serializing_if = "Scope::is_unknown")]
    pub scope: Scope,
}

impl Address {
    /// Build an address, deriving its type from the value
    pub fn new(value: impl Into<String>, scope: Scope) -> Self {
        let value = value.into();
        let address_type = AddressType::derive(&value);
        Self {
            value,
            address_type,
            scope,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IpAddressDoc {
    #[serde(rename = "env-uuid")]
    env_uuid: String,
    #[serde(rename = "subnetid", default, skip_serializing_if = "String::is_empty")]
    subnet_id: String,
    #[serde(rename = "machineid", default, skip_serializing_if = "String::is_empty")]
    machine_id: String,
    #[serde(rename = "interfaceid", default, skip_serializing_if = "String::is_empty")]
    interface_id: String,
    value: String,
    #[serde(rename = "type")]
    address_type: AddressType,
    #[serde(rename = "networkscope", default, skip_serializing_if = "Scope::is_unknown")]
    scope: Scope,
    #[serde(default)]
    state: AddressState,
}

/// Handle to one IP address document
///
/// The handle is a snapshot taken when it was fetched. Successful mutations
/// update it; concurrent changes by others are only seen after
/// [`IpAddress::refresh`].
#[derive(Debug, Clone)]
pub struct IpAddress {
    st: State,
    doc: IpAddressDoc,
}

impl IpAddress {
    /// Id of the associated subnet, `""` if none
    pub fn subnet_id(&self) -> &str {
        &self.doc.subnet_id
    }

    /// Id of the machine the address is allocated to, `""` if none
    pub fn machine_id(&self) -> &str {
        &self.doc.machine_id
    }

    /// Id of the interface the address is allocated to, `""` if none
    pub fn interface_id(&self) -> &str {
        &self.doc.interface_id
    }

    /// The address text
    pub fn value(&self) -> &str {
        &self.doc.value
    }

    /// The address as a value type
    pub fn address(&self) -> Address {
        Address {
            value: self.doc.value.clone(),
            address_type: self.doc.address_type,
            scope: self.doc.scope,
        }
    }

    /// IPv4, IPv6 or hostname
    pub fn address_type(&self) -> AddressType {
        self.doc.address_type
    }

    /// Reachability scope, [`Scope::Unknown`] if not set
    pub fn scope(&self) -> Scope {
        self.doc.scope
    }

    /// Lifecycle state
    pub fn state(&self) -> AddressState {
        self.doc.state
    }

    /// Remove the address
    ///
    /// Unconditional; removing an already removed address fails with
    /// `NotFound`.
    pub fn remove(&self) -> TetherResult<()> {
        let ops = [Op::remove(IPADDRESSES_C, self.st.doc_id(&self.doc.value))];
        self.st
            .run_transaction(&ops)
            .annotate_with(|| format!("cannot remove IP address {}", self))?;
        tracing::info!(address = %self, "removed IP address");
        Ok(())
    }

    /// Move the address to `new_state`
    ///
    /// Valid transitions are Unknown to Allocated or Unavailable, plus
    /// self-transitions. Anything else aborts the transaction.
    pub fn set_state(&mut self, new_state: AddressState) -> TetherResult<()> {
        let unknown_or_same = Assert::field_in(
            "state",
            [AddressState::Unknown.as_str(), new_state.as_str()],
        );
        let ops = [Op::update(
            IPADDRESSES_C,
            self.st.doc_id(&self.doc.value),
            Update::set([("state", new_state.as_str())]),
        )
        .with_assert(unknown_or_same)];

        self.st.run_transaction(&ops).annotate_with(|| {
            format!("cannot set IP address {} to state {:?}", self, new_state.as_str())
        })?;
        self.doc.state = new_state;
        tracing::info!(address = %self, state = %new_state, "IP address state changed");
        Ok(())
    }

    /// Associate the address with a machine interface
    ///
    /// Only permitted while the address is Unknown and not yet associated.
    /// Both ids are required; they are stored together or not at all.
    pub fn allocate_to(&mut self, machine_id: &str, interface_id: &str) -> TetherResult<()> {
        if !is_valid_machine(machine_id) {
            return Err(TetherError::InvalidName {
                kind: "machine",
                name: machine_id.to_string(),
            });
        }
        if interface_id.is_empty() {
            return Err(TetherError::invalid_input(format!(
                "cannot allocate IP address {} to machine {:?}: empty interface id",
                self, machine_id
            )));
        }
        let unallocated = Assert::All(vec![
            Assert::field_eq("state", AddressState::Unknown.as_str()),
            Assert::field_unset("machineid"),
        ]);
        let ops = [Op::update(
            IPADDRESSES_C,
            self.st.doc_id(&self.doc.value),
            Update::set([("machineid", machine_id), ("interfaceid", interface_id)]),
        )
        .with_assert(unallocated)];

        self.st.run_transaction(&ops).annotate_with(|| {
            format!(
                "cannot allocate IP address {} to machine {:?}, interface {:?}",
                self, machine_id, interface_id
            )
        })?;
        self.doc.machine_id = machine_id.to_string();
        self.doc.interface_id = interface_id.to_string();
        tracing::info!(address = %self, machine_id, interface_id, "IP address allocated");
        Ok(())
    }

    /// Reload the snapshot from the store
    pub fn refresh(&mut self) -> TetherResult<()> {
        let fresh = self.st.ip_address(&self.doc.value)?;
        self.doc = fresh.doc;
        Ok(())
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc.value)
    }
}

impl State {
    /// Create an IP address document in the Unknown state
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the address is already known.
    pub fn add_ip_address(&self, address: Address, subnet_id: &str) -> TetherResult<IpAddress> {
        let doc = IpAddressDoc {
            env_uuid: self.env_uuid().to_string(),
            subnet_id: subnet_id.to_string(),
            machine_id: String::new(),
            interface_id: String::new(),
            value: address.value,
            address_type: address.address_type,
            scope: address.scope,
            state: AddressState::Unknown,
        };
        let ops = [Op::insert(
            IPADDRESSES_C,
            self.doc_id(&doc.value),
            to_document(&doc)?,
        )];

        match self.run_transaction(&ops) {
            Ok(_) => {}
            Err(e) if e.is_txn_aborted() => {
                return Err(TetherError::already_exists(format!("IP address {}", doc.value))
                    .annotate(format!("cannot add IP address {}", doc.value)));
            }
            Err(e) => return Err(e.annotate(format!("cannot add IP address {}", doc.value))),
        }
        tracing::info!(address = %doc.value, subnet_id, "added IP address");
        Ok(IpAddress {
            st: self.clone(),
            doc,
        })
    }

    /// Fetch an IP address by value
    pub fn ip_address(&self, value: &str) -> TetherResult<IpAddress> {
        let stored = self
            .get_doc(IPADDRESSES_C, value)
            .ok_or_else(|| TetherError::not_found(format!("IP address {}", value)))?;
        Ok(IpAddress {
            st: self.clone(),
            doc: from_document(&stored.fields)?,
        })
    }

    /// Every IP address allocated to `machine_id`
    pub fn allocated_ip_addresses(&self, machine_id: &str) -> TetherResult<Vec<IpAddress>> {
        self.find_docs(IPADDRESSES_C, |doc| {
            doc.field("machineid").as_str() == Some(machine_id)
        })
        .iter()
        .map(|stored| {
            Ok(IpAddress {
                st: self.clone(),
                doc: from_document(&stored.fields)?,
            })
        })
        .collect()
    }
}
