//! Validation engine - the sole authority over gate decisions.
//!
//! This service handles:
//! - Deciding whether a presented code grants entry or exit
//! - Advancing usage counts and retiring exhausted codes
//! - Writing exactly one audit entry per attempt
//!
//! The decision itself is the pure function [`transition`]. The engine wraps
//! it in [`AccessStore::settle_validation`], which serialises attempts on the
//! same code so two scans never act on the same stale usage count.
//!
//! # Decision order
//!
//! 1. Lookup by code value (unknown ⇒ `invalid`)
//! 2. Retired code (window over ⇒ `expired`, otherwise ⇒ `already_used`)
//! 3. Window check (outside ⇒ `expired`; past the end also retires the code)
//! 4. Single-use guard, letting through the one paired exit
//! 5. Exit permission
//! 6. Usage increment and retirement rules

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::access_code::{AccessCode, CodeClass};
use crate::models::access_log::{
    AccessStatus, Direction, NewAccessLog, ValidationDetail, ValidationResponse,
};
use crate::store::{AccessStore, CodeSnapshot, Settlement, UsageChange};

/// Visitor and resident name logged for codes that do not resolve.
pub const UNKNOWN_PARTY: &str = "Unknown";

/// Why an attempt against an existing code was decided the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Granted,
    Expired,
    AlreadyUsed,
    ExitNotPermitted,
}

impl Verdict {
    /// Audit status recorded for this verdict.
    pub fn status(&self) -> AccessStatus {
        match self {
            Verdict::Granted => AccessStatus::Success,
            Verdict::Expired => AccessStatus::Expired,
            Verdict::AlreadyUsed => AccessStatus::AlreadyUsed,
            Verdict::ExitNotPermitted => AccessStatus::Invalid,
        }
    }
}

/// Result of applying one attempt to one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub verdict: Verdict,
    pub usage_count: i32,
    pub is_active: bool,
}

impl Transition {
    fn unchanged(code: &AccessCode, verdict: Verdict) -> Self {
        Self {
            verdict,
            usage_count: code.usage_count,
            is_active: code.is_active,
        }
    }

    /// State change to persist, if any field moved.
    pub fn change_from(&self, code: &AccessCode) -> Option<UsageChange> {
        (self.usage_count != code.usage_count || self.is_active != code.is_active).then_some(
            UsageChange {
                usage_count: self.usage_count,
                is_active: self.is_active,
            },
        )
    }
}

/// Whether an attempt in `direction` counts against the code's usage.
///
/// Entries always count. Exits count for single-visitor codes only; group
/// exits never consume the group's limit.
fn consumes_usage(class: CodeClass, direction: Direction) -> bool {
    match direction {
        Direction::Entry => true,
        Direction::Exit => class != CodeClass::Group,
    }
}

/// Whether a granted attempt leaves the code exhausted.
fn exhausted_after(code: &AccessCode, direction: Direction, usage_count: i32) -> bool {
    let limit_reached = code.max_usage_limit.is_some_and(|max| usage_count >= max);

    match code.code_class {
        CodeClass::Group => direction == Direction::Entry && limit_reached,
        // Event codes behave exactly like single-visitor codes
        CodeClass::Single | CodeClass::Event => match (code.is_multi_use, code.allow_exit) {
            // One-shot entry code
            (false, false) => direction == Direction::Entry,
            // One entry, then one exit
            (false, true) => direction == Direction::Exit,
            (true, _) => limit_reached,
        },
    }
}

/// Apply one attempt to `code` at `now`.
///
/// Pure: reads nothing but its arguments, so every row of the decision table
/// can be exercised without storage.
pub fn transition(code: &AccessCode, direction: Direction, now: DateTime<Utc>) -> Transition {
    if !code.is_active {
        let verdict = if now > code.valid_until {
            Verdict::Expired
        } else {
            Verdict::AlreadyUsed
        };
        return Transition::unchanged(code, verdict);
    }

    if !code.in_window(now) {
        // Lazy expiry: a code touched after its window is retired for good.
        // A code presented too early stays active.
        return Transition {
            verdict: Verdict::Expired,
            usage_count: code.usage_count,
            is_active: now <= code.valid_until,
        };
    }

    if !code.multi_use() && code.usage_count > 0 {
        let paired_exit =
            code.allow_exit && direction == Direction::Exit && code.usage_count == 1;
        if !paired_exit {
            return Transition::unchanged(code, Verdict::AlreadyUsed);
        }
    }

    if direction == Direction::Exit && !code.allow_exit {
        return Transition::unchanged(code, Verdict::ExitNotPermitted);
    }

    let usage_count = if consumes_usage(code.code_class, direction) {
        code.usage_count.saturating_add(1)
    } else {
        code.usage_count
    };

    Transition {
        verdict: Verdict::Granted,
        usage_count,
        is_active: !exhausted_after(code, direction, usage_count),
    }
}

/// Uppercase and trim a code as typed at the gate.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// A validation attempt submitted by security.
#[derive(Debug, Clone)]
pub struct ValidateInput {
    pub code: String,
    pub direction: Direction,

    /// Email of the validating officer
    pub validator: String,
}

/// Build the response and audit entry for an attempt.
fn settle(
    snapshot: Option<&CodeSnapshot>,
    code_value: &str,
    direction: Direction,
    validator: &str,
    now: DateTime<Utc>,
) -> Settlement<(ValidationResponse, AccessStatus)> {
    let Some(snapshot) = snapshot else {
        let log = NewAccessLog {
            code_id: None,
            code: code_value.to_string(),
            visitor_name: UNKNOWN_PARTY.to_string(),
            resident_name: UNKNOWN_PARTY.to_string(),
            unit_number: None,
            direction,
            validated_by: validator.to_string(),
            status: AccessStatus::Invalid,
            usage_count: None,
            timestamp: now,
        };
        let response = ValidationResponse {
            granted: false,
            message: "Invalid code".to_string(),
            detail: None,
        };
        return Settlement {
            change: None,
            log,
            value: (response, AccessStatus::Invalid),
        };
    };

    let code = &snapshot.code;
    let step = transition(code, direction, now);
    let status = step.verdict.status();

    let response = match step.verdict {
        Verdict::Granted => ValidationResponse {
            granted: true,
            message: match direction {
                Direction::Entry => "Entry granted".to_string(),
                Direction::Exit => "Exit granted".to_string(),
            },
            detail: Some(ValidationDetail {
                visitor_label: code.visitor_label.clone(),
                resident_name: code.resident_name.clone(),
                unit_number: snapshot.unit_number.clone(),
                is_multi_use: Some(code.multi_use()),
                usage_count: Some(step.usage_count),
                valid_from: None,
                valid_until: None,
            }),
        },
        Verdict::Expired => ValidationResponse {
            granted: false,
            message: "Code has expired".to_string(),
            detail: Some(ValidationDetail {
                visitor_label: code.visitor_label.clone(),
                resident_name: code.resident_name.clone(),
                unit_number: None,
                is_multi_use: None,
                usage_count: None,
                valid_from: Some(code.valid_from),
                valid_until: Some(code.valid_until),
            }),
        },
        Verdict::AlreadyUsed => ValidationResponse {
            granted: false,
            message: "Code has already been used".to_string(),
            detail: Some(ValidationDetail {
                visitor_label: code.visitor_label.clone(),
                resident_name: code.resident_name.clone(),
                unit_number: None,
                is_multi_use: None,
                usage_count: None,
                valid_from: None,
                valid_until: None,
            }),
        },
        Verdict::ExitNotPermitted => ValidationResponse {
            granted: false,
            message: "This code is only valid for entry".to_string(),
            detail: None,
        },
    };

    let log = NewAccessLog {
        code_id: Some(code.id),
        code: code.code.clone(),
        visitor_name: code.visitor_label.clone(),
        resident_name: code.resident_name.clone(),
        unit_number: snapshot.unit_number.clone(),
        direction,
        validated_by: validator.to_string(),
        status,
        usage_count: Some(step.usage_count),
        timestamp: now,
    };

    Settlement {
        change: step.change_from(code),
        log,
        value: (response, status),
    }
}

pub struct ValidationEngine<S>
where
    S: AccessStore,
{
    pub store: S,
}

impl<S> ValidationEngine<S>
where
    S: AccessStore,
{
    pub async fn execute(&self, input: ValidateInput) -> Result<ValidationResponse, AppError> {
        self.execute_at(input, Utc::now()).await
    }

    /// Validate as of `now`.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: Blank code
    /// - `Database` / `CorruptRecord`: Storage faults. Rejections are never errors.
    pub async fn execute_at(
        &self,
        input: ValidateInput,
        now: DateTime<Utc>,
    ) -> Result<ValidationResponse, AppError> {
        let code = normalize_code(&input.code);
        if code.is_empty() {
            return Err(AppError::InvalidRequest(
                "Code and direction are required".to_string(),
            ));
        }

        let direction = input.direction;
        let validator = input.validator;
        let code_value = code.clone();

        let (response, status) = self
            .store
            .settle_validation(&code, move |snapshot| {
                settle(snapshot, &code_value, direction, &validator, now)
            })
            .await?;

        if response.granted {
            tracing::info!(
                code = %code,
                direction = %direction,
                usage_count = ?response.detail.as_ref().and_then(|d| d.usage_count),
                "access granted"
            );
        } else {
            tracing::warn!(
                code = %code,
                direction = %direction,
                status = %status,
                reason = %response.message,
                "access rejected"
            );
        }

        Ok(response)
    }
}
