//! Entity names and tags
//!
//! Entities have two textual forms:
//! - **Name**: the user-facing identifier, e.g. `mysql/3` for a unit
//! - **Tag**: the kind-prefixed form used on the wire, e.g. `unit-mysql-3`
//!
//! ## Validation
//!
//! - Service names are lowercase, hyphen separated, start with a letter, and
//!   every hyphenated segment contains at least one letter (`mysql`, `wp-2x`)
//! - Unit names are `<service>/<n>` with `n` a decimal without leading zeros
//! - Machine ids are `<n>` optionally followed by `/<container-type>/<n>` pairs
//! - Action names match `^[a-z](?:[a-z-]*[a-z])?$`
//!
//! Validation never allocates; constructors return
//! [`TetherError::InvalidName`] for rejected input.

use crate::error::{TetherError, TetherResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const UNIT_TAG_PREFIX: &str = "unit-";
const SERVICE_TAG_PREFIX: &str = "service-";
const MACHINE_TAG_PREFIX: &str = "machine-";
const ACTION_TAG_PREFIX: &str = "action-";

// ============================================================================
// Validation
// ============================================================================

/// Check a decimal with no leading zeros (`0`, `7`, `42`, not `07`)
fn is_valid_number(s: &str) -> bool {
    match s.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    }
}

/// Report whether `name` is a valid service name
pub fn is_valid_service(name: &str) -> bool {
    let mut segments = name.split('-');
    let first = match segments.next() {
        Some(first) => first,
        None => return false,
    };
    let first_ok = first
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && first
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !first_ok {
        return false;
    }
    segments.all(|seg| {
        !seg.is_empty()
            && seg
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && seg.chars().any(|c| c.is_ascii_lowercase())
    })
}

/// Report whether `name` is a valid unit name (`<service>/<n>`)
pub fn is_valid_unit(name: &str) -> bool {
    match name.split_once('/') {
        Some((service, number)) => is_valid_service(service) && is_valid_number(number),
        None => false,
    }
}

/// Report whether `id` is a valid machine id (`0`, `3/lxc/1`)
pub fn is_valid_machine(id: &str) -> bool {
    let mut parts = id.split('/');
    let host_ok = parts.next().is_some_and(is_valid_number);
    if !host_ok {
        return false;
    }
    let rest: Vec<&str> = parts.collect();
    if rest.len() % 2 != 0 {
        return false;
    }
    rest.chunks(2).all(|pair| {
        !pair[0].is_empty()
            && pair[0].chars().all(|c| c.is_ascii_lowercase())
            && is_valid_number(pair[1])
    })
}

/// Report whether `name` is a valid action name
///
/// Matches `^[a-z](?:[a-z-]*[a-z])?$` exactly: lowercase letters and hyphens,
/// starting and ending with a letter.
pub fn is_valid_action_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_lowercase()
                && last.is_ascii_lowercase()
                && bytes.iter().all(|b| b.is_ascii_lowercase() || *b == b'-')
        }
        _ => false,
    }
}

/// Extract the service name from a unit name
pub fn unit_service(unit: &str) -> TetherResult<&str> {
    if !is_valid_unit(unit) {
        return Err(invalid("unit", unit));
    }
    Ok(unit.split_once('/').map(|(svc, _)| svc).unwrap_or(unit))
}

fn invalid(kind: &'static str, name: &str) -> TetherError {
    TetherError::InvalidName {
        kind,
        name: name.to_string(),
    }
}

// ============================================================================
// Action names
// ============================================================================

/// A validated action name, e.g. `backup` or `snapshot-db`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionName(String);

impl ActionName {
    /// Create a new ActionName, validating the input
    pub fn new(name: impl Into<String>) -> TetherResult<Self> {
        let name = name.into();
        if !is_valid_action_name(&name) {
            return Err(TetherError::InvalidName { kind: "action", name });
        }
        Ok(ActionName(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ActionName {
    type Error = TetherError;

    fn try_from(s: String) -> TetherResult<Self> {
        ActionName::new(s)
    }
}

impl From<ActionName> for String {
    fn from(name: ActionName) -> Self {
        name.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Tag of a unit, e.g. `unit-mysql-3`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitTag(String);

impl UnitTag {
    /// Create a tag from a unit name such as `mysql/3`
    pub fn new(name: &str) -> TetherResult<Self> {
        if !is_valid_unit(name) {
            return Err(invalid("unit", name));
        }
        Ok(UnitTag(name.to_string()))
    }

    /// The unit name (`mysql/3`)
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", UNIT_TAG_PREFIX, self.0.replace('/', "-"))
    }
}

/// Tag of a service, e.g. `service-mysql`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceTag(String);

impl ServiceTag {
    /// Create a tag from a service name
    pub fn new(name: &str) -> TetherResult<Self> {
        if !is_valid_service(name) {
            return Err(invalid("service", name));
        }
        Ok(ServiceTag(name.to_string()))
    }

    /// The service name
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SERVICE_TAG_PREFIX, self.0)
    }
}

/// Tag of a machine, e.g. `machine-0` or `machine-3-lxc-1`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineTag(String);

impl MachineTag {
    /// Create a tag from a machine id
    pub fn new(id: &str) -> TetherResult<Self> {
        if !is_valid_machine(id) {
            return Err(invalid("machine", id));
        }
        Ok(MachineTag(id.to_string()))
    }

    /// The machine id
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MACHINE_TAG_PREFIX, self.0.replace('/', "-"))
    }
}

/// Tag of a queued action, e.g. `action-6ba7b810-9dad-11d1-80b4-00c04fd430c8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionTag(Uuid);

impl ActionTag {
    /// Create a tag from an action id
    pub fn new(id: Uuid) -> Self {
        ActionTag(id)
    }

    /// The action id
    pub fn id(&self) -> Uuid {
        self.0
    }

    /// Parse a tag string, which must be an action tag
    pub fn parse(s: &str) -> TetherResult<Self> {
        match Tag::parse(s)? {
            Tag::Action(tag) => Ok(tag),
            _ => Err(TetherError::invalid_input(format!(
                "{:?} is not a valid action tag",
                s
            ))),
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ACTION_TAG_PREFIX, self.0)
    }
}

/// Any entity tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Unit tag
    Unit(UnitTag),
    /// Service tag
    Service(ServiceTag),
    /// Machine tag
    Machine(MachineTag),
    /// Action tag
    Action(ActionTag),
}

impl Tag {
    /// Parse a tag string such as `unit-mysql-3`
    pub fn parse(s: &str) -> TetherResult<Self> {
        let bad = || TetherError::invalid_input(format!("{:?} is not a valid tag", s));

        if let Some(rest) = s.strip_prefix(UNIT_TAG_PREFIX) {
            let (service, number) = rest.rsplit_once('-').ok_or_else(bad)?;
            let name = format!("{}/{}", service, number);
            return UnitTag::new(&name).map(Tag::Unit).map_err(|_| bad());
        }
        if let Some(rest) = s.strip_prefix(SERVICE_TAG_PREFIX) {
            return ServiceTag::new(rest).map(Tag::Service).map_err(|_| bad());
        }
        if let Some(rest) = s.strip_prefix(MACHINE_TAG_PREFIX) {
            let id = rest.replace('-', "/");
            return MachineTag::new(&id).map(Tag::Machine).map_err(|_| bad());
        }
        if let Some(rest) = s.strip_prefix(ACTION_TAG_PREFIX) {
            let id = Uuid::parse_str(rest).map_err(|_| bad())?;
            return Ok(Tag::Action(ActionTag(id)));
        }
        Err(bad())
    }

    /// The kind of entity this tag refers to
    pub fn kind(&self) -> &'static str {
        match self {
            Tag::Unit(_) => "unit",
            Tag::Service(_) => "service",
            Tag::Machine(_) => "machine",
            Tag::Action(_) => "action",
        }
    }

    /// The unprefixed identifier
    pub fn id(&self) -> String {
        match self {
            Tag::Unit(t) => t.id().to_string(),
            Tag::Service(t) => t.id().to_string(),
            Tag::Machine(t) => t.id().to_string(),
            Tag::Action(t) => t.id().to_string(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Unit(t) => t.fmt(f),
            Tag::Service(t) => t.fmt(f),
            Tag::Machine(t) => t.fmt(f),
            Tag::Action(t) => t.fmt(f),
        }
    }
}

impl FromStr for Tag {
    type Err = TetherError;

    fn from_str(s: &str) -> TetherResult<Self> {
        Tag::parse(s)
    }
}
