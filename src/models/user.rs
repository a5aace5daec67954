//! Caller identity models.
//!
//! Accounts and bearer tokens belong to the identity provider. This service
//! only reads them to resolve who is calling and in which role.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Security,
    Resident,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Security => "security",
            Role::Resident => "resident",
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
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "security" => Ok(Role::Security),
            "resident" => Ok(Role::Resident),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Represents the user a bearer token resolves to.
///
/// # Database Tables
///
/// Read from `user_tokens` joined to `users`:
/// - `user_tokens.token_hash`: SHA-256 hex digest of the bearer token
/// - `users.is_active` and `user_tokens.is_active` must both be true
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenOwner {
    pub id: Uuid,
    pub email: String,
    pub name: String,

    /// Stored as TEXT, parsed into [`Role`] by the auth middleware
    pub role: String,

    /// Only set for residents
    pub unit_number: Option<String>,
}
