//! Access code data models and API request/response types.
//!
//! This module defines:
//! - `AccessCode`: Domain entity for one issued gate credential
//! - `AccessCodeRow`: Raw `access_codes` row as read by sqlx
//! - `NewAccessCode`: Fully assembled record ready for insertion
//! - `GenerateCodeRequest`: Request body for generating codes
//! - `AccessCodeResponse`: Response body returned to clients

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Class of an access code.
///
/// - `single`: one named visitor
/// - `group`: many guests under one event registration link
/// - `event`: a single-visitor code spawned from a group code's link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeClass {
    Single,
    Group,
    Event,
}

impl CodeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeClass::Single => "single",
            CodeClass::Group => "group",
            CodeClass::Event => "event",
        }
    }
}

impl fmt::Display for CodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(CodeClass::Single),
            "group" => Ok(CodeClass::Group),
            "event" => Ok(CodeClass::Event),
            other => Err(format!("unknown code class '{other}'")),
        }
    }
}

/// Represents an `access_codes` row exactly as stored.
///
/// Enum-like columns are TEXT in the database; they are parsed into
/// [`AccessCode`] via `TryFrom`, which rejects values the service never writes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessCodeRow {
    pub id: Uuid,
    pub code: String,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub visitor_label: String,
    pub event_label: Option<String>,
    pub event_id: Option<Uuid>,
    pub code_class: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_multi_use: bool,
    pub allow_exit: bool,
    pub max_usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One issued credential.
///
/// # Lifecycle
///
/// Created by the code generator (resident flow) or by event registration.
/// Mutated only by the validation engine. Never deleted: a retired code has
/// `is_active = false` and stays that way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCode {
    pub id: Uuid,

    /// Six characters from the unambiguous code alphabet, globally unique
    pub code: String,

    /// Issuing resident
    pub resident_id: Uuid,

    /// Resident name at issue time, kept so logs survive later user edits
    pub resident_name: String,

    /// Visitor name for single/event codes, event name for group codes
    pub visitor_label: String,

    /// Event name for group codes and the guest codes derived from them
    pub event_label: Option<String>,

    /// Registration link identifier shared by a group code and its guest codes
    pub event_id: Option<Uuid>,

    pub code_class: CodeClass,

    /// Inclusive validity window, stored in UTC
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,

    pub is_multi_use: bool,
    pub allow_exit: bool,
    pub max_usage_limit: Option<i32>,

    /// Never decremented
    pub usage_count: i32,

    /// Only ever moves from true to false
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessCode {
    /// Group codes are multi-use regardless of the stored flag.
    pub fn multi_use(&self) -> bool {
        self.is_multi_use || self.code_class == CodeClass::Group
    }

    /// Whether `now` falls inside `[valid_from, valid_until]`.
    pub fn in_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_until
    }
}

impl TryFrom<AccessCodeRow> for AccessCode {
    type Error = AppError;

    fn try_from(row: AccessCodeRow) -> Result<Self, Self::Error> {
        let code_class = row
            .code_class
            .parse::<CodeClass>()
            .map_err(|e| AppError::CorruptRecord(format!("access code {}: {e}", row.id)))?;

        if row.usage_count < 0 {
            return Err(AppError::CorruptRecord(format!(
                "access code {}: negative usage count {}",
                row.id, row.usage_count
            )));
        }

        Ok(Self {
            id: row.id,
            code: row.code,
            resident_id: row.resident_id,
            resident_name: row.resident_name,
            visitor_label: row.visitor_label,
            event_label: row.event_label,
            event_id: row.event_id,
            code_class,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            is_multi_use: row.is_multi_use,
            allow_exit: row.allow_exit,
            max_usage_limit: row.max_usage_limit,
            usage_count: row.usage_count,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A fully assembled access code awaiting insertion.
///
/// `usage_count` and `is_active` are not part of this type: every new code
/// starts at 0 uses and active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessCode {
    pub code: String,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub visitor_label: String,
    pub event_label: Option<String>,
    pub event_id: Option<Uuid>,
    pub code_class: CodeClass,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_multi_use: bool,
    pub allow_exit: bool,
    pub max_usage_limit: Option<i32>,
}

/// Request body for generating a new access code.
///
/// # JSON Example
///
/// ```json
/// {
///   "codeClass": "single",
///   "visitorLabel": "Ada Obi",
///   "validFrom": "2025-03-01T08:00",
///   "validUntil": "2025-03-01T20:00",
///   "isMultiUse": false,
///   "allowExit": true
/// }
/// ```
///
/// # Validation
///
/// - `validFrom`, `validUntil`: Required. Strings without a zone are read as
///   estate local time.
/// - `codeClass`: Optional, defaults to `single`. `event` is rejected here.
/// - `visitorLabel`: Required for `single`
/// - `eventLabel`: Required for `group`
/// - `maxUsageLimit`: Optional, must be positive
///
/// Every field is optional at the serde level so that missing fields are
/// reported as 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCodeRequest {
    #[serde(default, alias = "codeType")]
    pub code_class: Option<String>,

    #[serde(default, alias = "visitorName")]
    pub visitor_label: Option<String>,

    #[serde(default, alias = "eventName")]
    pub event_label: Option<String>,

    #[serde(default)]
    pub valid_from: Option<String>,

    #[serde(default)]
    pub valid_until: Option<String>,

    #[serde(default)]
    pub is_multi_use: Option<bool>,

    #[serde(default)]
    pub allow_exit: Option<bool>,

    #[serde(default)]
    pub max_usage_limit: Option<i32>,
}

/// Response body for access code endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub resident_id: Uuid,
    pub resident_name: String,
    pub visitor_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    pub code_class: CodeClass,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_multi_use: bool,
    pub allow_exit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AccessCode> for AccessCodeResponse {
    fn from(code: AccessCode) -> Self {
        Self {
            id: code.id,
            code: code.code,
            resident_id: code.resident_id,
            resident_name: code.resident_name,
            visitor_label: code.visitor_label,
            event_label: code.event_label,
            event_id: code.event_id,
            code_class: code.code_class,
            valid_from: code.valid_from,
            valid_until: code.valid_until,
            is_multi_use: code.is_multi_use,
            allow_exit: code.allow_exit,
            max_usage_limit: code.max_usage_limit,
            usage_count: code.usage_count,
            is_active: code.is_active,
            created_at: code.created_at,
        }
    }
}
