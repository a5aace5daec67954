//! Code generation and event registration.
//!
//! Both flows end in exactly one new access code. Uniqueness is enforced by
//! the store's constraint on `code`; a collision on insert is a signal to
//! resample, never a failure.

use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::access_code::{AccessCode, CodeClass, GenerateCodeRequest, NewAccessCode};
use crate::services::window::parse_window;
use crate::store::AccessStore;

/// Uppercase letters and digits without 0/O and 1/I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const CODE_LENGTH: usize = 6;

/// Sample one candidate code.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// The resident a new code is issued for.
#[derive(Debug, Clone)]
pub struct Issuer {
    pub resident_id: Uuid,
    pub resident_name: String,
}

/// Trimmed, non-empty text or `None`.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Generated code attempts are retried only on collision.
pub struct CodeGenerator<S>
where
    S: AccessStore,
{
    pub store: S,
    pub estate_offset: FixedOffset,
}

impl<S> CodeGenerator<S>
where
    S: AccessStore,
{
    /// Generate a code for `issuer` from a resident's request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: Missing window or label, unknown class, bad limit
    /// - `Database`: Storage faults
    pub async fn generate(
        &self,
        issuer: Issuer,
        request: GenerateCodeRequest,
    ) -> Result<AccessCode, AppError> {
        let new = self.assemble(issuer, request)?;
        let code = self.insert_unique(new).await?;

        tracing::info!(
            code = %code.code,
            code_class = %code.code_class,
            resident_id = %code.resident_id,
            "access code generated"
        );

        Ok(code)
    }

    /// Validate a request and build the record to insert, minus its code value.
    fn assemble(
        &self,
        issuer: Issuer,
        request: GenerateCodeRequest,
    ) -> Result<NewAccessCode, AppError> {
        let code_class = match non_blank(request.code_class) {
            None => CodeClass::Single,
            Some(raw) => match raw.to_ascii_lowercase().parse::<CodeClass>() {
                Ok(CodeClass::Event) => {
                    return Err(AppError::InvalidRequest(
                        "Event codes are issued through event registration".to_string(),
                    ));
                }
                Ok(class) => class,
                Err(_) => {
                    return Err(AppError::InvalidRequest(
                        "codeClass must be 'single' or 'group'".to_string(),
                    ));
                }
            },
        };

        let (valid_from, valid_until) = match (request.valid_from, request.valid_until) {
            (Some(from), Some(until)) => parse_window(&from, &until, self.estate_offset)?,
            _ => {
                return Err(AppError::InvalidRequest(
                    "validFrom and validUntil are required".to_string(),
                ));
            }
        };

        if request.max_usage_limit.is_some_and(|limit| limit < 1) {
            return Err(AppError::InvalidRequest(
                "maxUsageLimit must be at least 1".to_string(),
            ));
        }

        let new = match code_class {
            CodeClass::Group => {
                let event_label = non_blank(request.event_label).ok_or_else(|| {
                    AppError::InvalidRequest("Event name is required for group codes".to_string())
                })?;

                NewAccessCode {
                    code: String::new(),
                    resident_id: issuer.resident_id,
                    resident_name: issuer.resident_name,
                    visitor_label: event_label.clone(),
                    event_label: Some(event_label),
                    event_id: Some(Uuid::new_v4()),
                    code_class,
                    valid_from,
                    valid_until,
                    is_multi_use: true,
                    allow_exit: true,
                    max_usage_limit: request.max_usage_limit,
                }
            }
            _ => {
                let visitor_label = non_blank(request.visitor_label).ok_or_else(|| {
                    AppError::InvalidRequest("Visitor name is required".to_string())
                })?;
                let is_multi_use = request.is_multi_use.unwrap_or(false);

                NewAccessCode {
                    code: String::new(),
                    resident_id: issuer.resident_id,
                    resident_name: issuer.resident_name,
                    visitor_label,
                    event_label: None,
                    event_id: None,
                    code_class,
                    valid_from,
                    valid_until,
                    is_multi_use,
                    allow_exit: request.allow_exit.unwrap_or(false),
                    // A limit means nothing on a one-shot code
                    max_usage_limit: request.max_usage_limit.filter(|_| is_multi_use),
                }
            }
        };

        Ok(new)
    }

    /// Register a guest against an event link.
    pub async fn register_guest(
        &self,
        event_id: Uuid,
        guest_name: Option<String>,
    ) -> Result<AccessCode, AppError> {
        self.register_guest_at(event_id, guest_name, Utc::now()).await
    }

    /// Register a guest as of `now`.
    ///
    /// The guest code inherits the group code's window, exit permission,
    /// owner and event label, and is good for one visit.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: Blank guest name
    /// - `EventNotFound`: No group code for the id, or it is retired
    /// - `EventEnded`: The group code's window is over
    pub async fn register_guest_at(
        &self,
        event_id: Uuid,
        guest_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<AccessCode, AppError> {
        let guest_name = non_blank(guest_name)
            .ok_or_else(|| AppError::InvalidRequest("Guest name is required".to_string()))?;

        let parent = self
            .store
            .find_event_parent(event_id)
            .await?
            .filter(|parent| parent.is_active)
            .ok_or(AppError::EventNotFound)?;

        if now > parent.valid_until {
            return Err(AppError::EventEnded);
        }

        let new = NewAccessCode {
            code: String::new(),
            resident_id: parent.resident_id,
            resident_name: parent.resident_name,
            visitor_label: guest_name,
            event_label: parent.event_label,
            event_id: Some(event_id),
            code_class: CodeClass::Event,
            valid_from: parent.valid_from,
            valid_until: parent.valid_until,
            is_multi_use: false,
            allow_exit: parent.allow_exit,
            max_usage_limit: None,
        };

        let code = self.insert_unique(new).await?;

        tracing::info!(
            code = %code.code,
            event_id = %event_id,
            "guest registered for event"
        );

        Ok(code)
    }

    /// Sample codes until one is free, then insert.
    async fn insert_unique(&self, mut new: NewAccessCode) -> Result<AccessCode, AppError> {
        loop {
            let candidate = generate_code();
            if self.store.code_exists(&candidate).await? {
                tracing::warn!(code = %candidate, "generated code already taken, resampling");
                continue;
            }

            new.code = candidate;
            match self.store.insert_code(new.clone()).await {
                Ok(code) => return Ok(code),
                Err(AppError::CodeConflict) => {
                    // Lost a race with a concurrent generation
                    tracing::warn!(code = %new.code, "code taken on insert, resampling");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
