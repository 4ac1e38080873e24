//! Role/access gate.
//!
//! Maps an authenticated role to its permitted operation set from a static
//! table. The role is an explicit parameter on every gated call; there is no
//! ambient session state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Role {role} is not permitted to perform {operation}")]
    Forbidden { role: Role, operation: Operation },

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// An authenticated identity class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    /// Submits samples
    Farmer,
    /// Enters somatic cell counts
    Admin1,
    /// Enters milk composition panels
    Admin2,
    /// Enters total bacterial counts
    Admin3,
    /// Full access including exports and certificates
    SuperAdmin,
}

impl Role {
    /// All roles.
    pub const ALL: [Role; 5] = [
        Role::Farmer,
        Role::Admin1,
        Role::Admin2,
        Role::Admin3,
        Role::SuperAdmin,
    ];

    /// Parse a role name, reporting the offending input on failure.
    pub fn parse(s: &str) -> AccessResult<Role> {
        s.parse()
            .map_err(|_| AccessError::UnknownRole(s.to_string()))
    }

    fn as_str(&self) -> &'static str {
        match self {
            Role::Farmer => "Farmer",
            Role::Admin1 => "Admin1",
            Role::Admin2 => "Admin2",
            Role::Admin3 => "Admin3",
            Role::SuperAdmin => "SuperAdmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Farmer" => Ok(Role::Farmer),
            "Admin1" => Ok(Role::Admin1),
            "Admin2" => Ok(Role::Admin2),
            "Admin3" => Ok(Role::Admin3),
            "SuperAdmin" => Ok(Role::SuperAdmin),
            _ => Err(()),
        }
    }
}

/// An operation a caller may be granted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Submit a new sample record
    Submit,
    /// Read records, views and summaries
    View,
    /// Enter a somatic cell count
    EnterScc,
    /// Enter a milk composition panel
    EnterMilkComposition,
    /// Enter a total bacterial count
    EnterTbc,
    /// Download or restore the flat snapshot
    Export,
    /// Generate certificates
    Certificate,
}

impl Operation {
    /// Stable wire name, matching the operation vocabulary of the original
    /// submission system.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Operation::Submit => "submit_data",
            Operation::View => "view_data",
            Operation::EnterScc => "add_scc",
            Operation::EnterMilkComposition => "add_milk_comp",
            Operation::EnterTbc => "add_tbc",
            Operation::Export => "download_data",
            Operation::Certificate => "generate_cert",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Operations permitted for a role.
pub fn permitted_operations(role: Role) -> &'static [Operation] {
    match role {
        Role::Farmer => &[Operation::Submit],
        Role::Admin1 => &[Operation::View, Operation::EnterScc],
        Role::Admin2 => &[Operation::View, Operation::EnterMilkComposition],
        Role::Admin3 => &[Operation::View, Operation::EnterTbc],
        Role::SuperAdmin => &[
            Operation::View,
            Operation::EnterScc,
            Operation::EnterMilkComposition,
            Operation::EnterTbc,
            Operation::Export,
            Operation::Certificate,
        ],
    }
}

/// Check that a role may perform an operation.
pub fn ensure_permitted(role: Role, operation: Operation) -> AccessResult<()> {
    if permitted_operations(role).contains(&operation) {
        Ok(())
    } else {
        Err(AccessError::Forbidden { role, operation })
    }
}
