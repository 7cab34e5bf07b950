//! Owner entity: the subject a credential authenticates.
//!
//! Owners live in the user directory; this crate only reads the fields the
//! token lifecycle needs and bumps the security version.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Dashboard role of an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "client" => Ok(Role::Client),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Account status of an owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerStatus {
    Active,
    Inactive,
}

impl OwnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerStatus::Active => "active",
            OwnerStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for OwnerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(OwnerStatus::Active),
            "inactive" => Ok(OwnerStatus::Inactive),
            other => Err(format!("Unknown owner status: {}", other)),
        }
    }
}

/// Owner record as seen by the token lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Unique identifier for the owner
    pub id: Uuid,

    /// Login email
    pub email: String,

    /// Dashboard role
    pub role: Role,

    /// Account status
    pub status: OwnerStatus,

    /// Bumped on password change or "sign out everywhere"
    pub security_version: i64,
}

impl Owner {
    /// Creates a new active owner at security version 0
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            role,
            status: OwnerStatus::Active,
            security_version: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OwnerStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_owner_defaults() {
        let owner = Owner::new("client@agency.test", Role::Client);
        assert!(owner.is_active());
        assert_eq!(owner.security_version, 0);
        assert_eq!(owner.role.to_string(), "client");
    }

    #[test]
    fn test_role_and_status_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!("inactive".parse::<OwnerStatus>().unwrap(), OwnerStatus::Inactive);
        assert_eq!(OwnerStatus::Active.as_str(), "active");
    }
}
