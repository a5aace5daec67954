//! Access log models and the validation request/response types.
//!
//! This module defines:
//! - `Direction`: Entry or exit through the gate
//! - `AccessStatus`: Outcome recorded for a validation attempt
//! - `AccessLog`: Immutable audit record read back from the database
//! - `NewAccessLog`: Audit record about to be appended
//! - `ValidateCodeRequest` / `ValidationResponse`: The gate-facing contract

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Type of passage a validation attempt requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Entry,
    Exit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Entry => "entry",
            Direction::Exit => "exit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entry" => Ok(Direction::Entry),
            "exit" => Ok(Direction::Exit),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Outcome of one validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Success,
    Expired,
    Invalid,
    AlreadyUsed,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Success => "success",
            AccessStatus::Expired => "expired",
            AccessStatus::Invalid => "invalid",
            AccessStatus::AlreadyUsed => "already_used",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AccessStatus::Success),
            "expired" => Ok(AccessStatus::Expired),
            "invalid" => Ok(AccessStatus::Invalid),
            "already_used" => Ok(AccessStatus::AlreadyUsed),
            other => Err(format!("unknown access status '{other}'")),
        }
    }
}

/// Represents an `access_logs` row exactly as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessLogRow {
    pub id: Uuid,
    pub code_id: Option<Uuid>,
    pub code: String,
    pub visitor_name: String,
    pub resident_name: String,
    pub unit_number: Option<String>,
    pub direction: String,
    pub validated_by: String,
    pub status: String,
    pub usage_count: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

/// Immutable audit record of one validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLog {
    pub id: Uuid,

    /// Identity of the attempted code, when it resolved to a record
    pub code_id: Option<Uuid>,

    /// Code value as presented (normalised to upper case)
    pub code: String,

    /// "Unknown" when the code did not resolve
    pub visitor_name: String,
    pub resident_name: String,
    pub unit_number: Option<String>,
    pub direction: Direction,

    /// Email of the security officer who submitted the attempt
    pub validated_by: String,
    pub status: AccessStatus,

    /// Usage count after the attempt; `None` for unknown codes
    pub usage_count: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<AccessLogRow> for AccessLog {
    type Error = AppError;

    fn try_from(row: AccessLogRow) -> Result<Self, Self::Error> {
        let direction = row
            .direction
            .parse::<Direction>()
            .map_err(|e| AppError::CorruptRecord(format!("access log {}: {e}", row.id)))?;
        let status = row
            .status
            .parse::<AccessStatus>()
            .map_err(|e| AppError::CorruptRecord(format!("access log {}: {e}", row.id)))?;

        Ok(Self {
            id: row.id,
            code_id: row.code_id,
            code: row.code,
            visitor_name: row.visitor_name,
            resident_name: row.resident_name,
            unit_number: row.unit_number,
            direction,
            validated_by: row.validated_by,
            status,
            usage_count: row.usage_count,
            timestamp: row.timestamp,
        })
    }
}

/// An audit record about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessLog {
    pub code_id: Option<Uuid>,
    pub code: String,
    pub visitor_name: String,
    pub resident_name: String,
    pub unit_number: Option<String>,
    pub direction: Direction,
    pub validated_by: String,
    pub status: AccessStatus,
    pub usage_count: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

/// Response body for audit listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_id: Option<Uuid>,
    pub code: String,
    pub visitor_name: String,
    pub resident_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<String>,
    pub direction: Direction,
    pub validated_by: String,
    pub status: AccessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl From<AccessLog> for AccessLogResponse {
    fn from(log: AccessLog) -> Self {
        Self {
            id: log.id,
            code_id: log.code_id,
            code: log.code,
            visitor_name: log.visitor_name,
            resident_name: log.resident_name,
            unit_number: log.unit_number,
            direction: log.direction,
            validated_by: log.validated_by,
            status: log.status,
            usage_count: log.usage_count,
            timestamp: log.timestamp,
        }
    }
}

/// Request submitted by security at the gate.
///
/// # JSON Example
///
/// ```json
/// {
///   "code": "K7P2QX",
///   "direction": "entry"
/// }
/// ```
///
/// `type` is accepted as an alias of `direction`.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateCodeRequest {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default, alias = "type")]
    pub direction: Option<String>,
}

/// Result of a validation attempt.
///
/// Rejections are ordinary responses with `granted: false`; only
/// infrastructure faults become HTTP errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResponse {
    pub granted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ValidationDetail>,
}

/// Who the code belongs to and where it stands after the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetail {
    pub visitor_label: String,
    pub resident_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_multi_use: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}
