//! Storage port for access codes and the audit trail.
//!
//! The generator and the validation engine depend only on [`AccessStore`];
//! the process entry point decides which implementation backs it.

#![allow(async_fn_in_trait)]

pub mod postgres;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::access_code::{AccessCode, NewAccessCode};
use crate::models::access_log::{AccessLog, NewAccessLog};

pub use postgres::PgAccessStore;

/// An access code as seen inside the validation critical section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnapshot {
    pub code: AccessCode,

    /// Issuing resident's unit, resolved at validation time
    pub unit_number: Option<String>,
}

/// New values for the two mutable fields of an access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageChange {
    pub usage_count: i32,
    pub is_active: bool,
}

/// What a validation decision asks the store to write.
///
/// The audit entry is not optional: every validation call appends exactly one.
#[derive(Debug, Clone)]
pub struct Settlement<T> {
    pub change: Option<UsageChange>,
    pub log: NewAccessLog,
    pub value: T,
}

/// Repository for access codes and access logs.
pub trait AccessStore: Send + Sync {
    /// Whether any code, active or retired, already uses this value.
    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    /// Insert a new code with zero usage, active.
    ///
    /// Returns `AppError::CodeConflict` when the code value is taken.
    async fn insert_code(&self, new: NewAccessCode) -> Result<AccessCode, AppError>;

    /// The group code that owns `event_id`, active or not.
    async fn find_event_parent(&self, event_id: Uuid) -> Result<Option<AccessCode>, AppError>;

    /// Every code tagged with `event_id`, the group code included.
    async fn event_codes(&self, event_id: Uuid) -> Result<Vec<AccessCode>, AppError>;

    /// Retire the resident's active codes whose window ended before `now`.
    /// Returns how many were retired.
    async fn expire_resident_codes(
        &self,
        resident_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// The resident's codes, newest first.
    async fn resident_codes(&self, resident_id: Uuid) -> Result<Vec<AccessCode>, AppError>;

    /// Run one validation as a single atomic unit for `code`.
    ///
    /// The implementation must hold exclusive access to the code's record
    /// from the read handed to `decide` until the settlement is written, so
    /// that concurrent attempts on the same code are serialised. `decide`
    /// receives `None` when no record has this value.
    async fn settle_validation<F, T>(&self, code: &str, decide: F) -> Result<T, AppError>
    where
        F: FnOnce(Option<&CodeSnapshot>) -> Settlement<T> + Send,
        T: Send;

    /// Most recent audit entries, newest first.
    async fn recent_logs(&self, limit: i64) -> Result<Vec<AccessLog>, AppError>;
}
