//! Event registration models.
//!
//! A group code doubles as an event: its `event_id` is the public
//! registration link, and each guest who registers receives their own
//! single-use code tagged with the same id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::access_code::AccessCode;

/// Request body for registering a guest against an event link.
///
/// # JSON Example
///
/// ```json
/// {
///   "guestName": "Chidi Okeke"
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterGuestRequest {
    #[serde(default)]
    pub guest_name: Option<String>,
}

/// Code issued to a registered guest.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCodeResponse {
    pub code: String,
    pub guest_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub allow_exit: bool,
}

impl From<AccessCode> for GuestCodeResponse {
    fn from(code: AccessCode) -> Self {
        Self {
            code: code.code,
            guest_name: code.visitor_label,
            event_name: code.event_label,
            event_id: code.event_id,
            valid_from: code.valid_from,
            valid_until: code.valid_until,
            allow_exit: code.allow_exit,
        }
    }
}

/// Public view of an event shown on its registration page.
///
/// `total_codes` counts every code sharing the event id (the group code
/// included); `total_used` sums their usage counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub resident_name: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub allow_exit: bool,
    pub total_codes: i64,
    pub total_used: i64,
}
