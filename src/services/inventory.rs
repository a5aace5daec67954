//! Read-side views over access codes.
//!
//! Expiry is lazy: listing a resident's codes first retires everything of
//! theirs whose window has closed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::access_code::AccessCode;
use crate::models::event::EventSummary;
use crate::store::AccessStore;

pub struct Inventory<S>
where
    S: AccessStore,
{
    pub store: S,
}

impl<S> Inventory<S>
where
    S: AccessStore,
{
    /// The resident's codes, newest first, after an expiry sweep.
    pub async fn resident_codes(
        &self,
        resident_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<AccessCode>, AppError> {
        let retired = self.store.expire_resident_codes(resident_id, now).await?;
        if retired > 0 {
            tracing::debug!(resident_id = %resident_id, retired, "expired stale access codes");
        }

        self.store.resident_codes(resident_id).await
    }

    /// Summary of an event link for its public registration page.
    ///
    /// # Errors
    ///
    /// - `EventNotFound`: No group code for the id, or it is retired
    /// - `EventEnded`: The group code's window is over
    pub async fn event_summary(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EventSummary, AppError> {
        let parent = self
            .store
            .find_event_parent(event_id)
            .await?
            .filter(|parent| parent.is_active)
            .ok_or(AppError::EventNotFound)?;

        if now > parent.valid_until {
            return Err(AppError::EventEnded);
        }

        let codes = self.store.event_codes(event_id).await?;
        let total_used = codes.iter().map(|c| i64::from(c.usage_count)).sum();

        Ok(EventSummary {
            event_id,
            event_name: parent.event_label,
            resident_name: parent.resident_name,
            valid_from: parent.valid_from,
            valid_until: parent.valid_until,
            allow_exit: parent.allow_exit,
            total_codes: codes.len() as i64,
            total_used,
        })
    }
}
