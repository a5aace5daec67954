use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, Utc};
use uuid::Uuid;

use estate_access_server::error::AppError;
use estate_access_server::models::access_code::{AccessCode, CodeClass, NewAccessCode};
use estate_access_server::models::access_log::{AccessLog, NewAccessLog};
use estate_access_server::services::code_generator::{CodeGenerator, Issuer};
use estate_access_server::services::validation::ValidationEngine;
use estate_access_server::store::{AccessStore, CodeSnapshot, Settlement};

// ── MockAccessStore ──────────────────────────────────────────────────────────

/// In-memory store. One mutex guards the code table, so a validation holds
/// it for the whole read-decide-write sequence like a row lock would.
#[derive(Clone, Default)]
pub struct MockAccessStore {
    pub codes: Arc<Mutex<Vec<AccessCode>>>,
    pub logs: Arc<Mutex<Vec<NewAccessLog>>>,

    /// Unit number per resident, joined in at validation time
    pub units: Arc<HashMap<Uuid, String>>,

    /// Inserts still to fail with `CodeConflict` before one succeeds
    pub forced_conflicts: Arc<Mutex<u32>>,

    /// Insert attempts seen, successful or not
    pub insert_attempts: Arc<Mutex<u32>>,
}

impl MockAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codes(codes: Vec<AccessCode>) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes)),
            ..Self::default()
        }
    }

    pub fn with_unit(mut self, resident_id: Uuid, unit: &str) -> Self {
        let mut units = (*self.units).clone();
        units.insert(resident_id, unit.to_string());
        self.units = Arc::new(units);
        self
    }

    pub fn failing_inserts(self, count: u32) -> Self {
        *self.forced_conflicts.lock().unwrap() = count;
        self
    }

    pub fn code(&self, value: &str) -> AccessCode {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.code == value)
            .cloned()
            .unwrap_or_else(|| panic!("no code {value} in store"))
    }

    pub fn logs(&self) -> Vec<NewAccessLog> {
        self.logs.lock().unwrap().clone()
    }
}

impl AccessStore for MockAccessStore {
    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        Ok(self.codes.lock().unwrap().iter().any(|c| c.code == code))
    }

    async fn insert_code(&self, new: NewAccessCode) -> Result<AccessCode, AppError> {
        *self.insert_attempts.lock().unwrap() += 1;

        {
            let mut forced = self.forced_conflicts.lock().unwrap();
            if *forced > 0 {
                *forced -= 1;
                return Err(AppError::CodeConflict);
            }
        }

        let mut codes = self.codes.lock().unwrap();
        if codes.iter().any(|c| c.code == new.code) {
            return Err(AppError::CodeConflict);
        }

        let now = Utc::now();
        let code = AccessCode {
            id: Uuid::new_v4(),
            code: new.code,
            resident_id: new.resident_id,
            resident_name: new.resident_name,
            visitor_label: new.visitor_label,
            event_label: new.event_label,
            event_id: new.event_id,
            code_class: new.code_class,
            valid_from: new.valid_from,
            valid_until: new.valid_until,
            is_multi_use: new.is_multi_use,
            allow_exit: new.allow_exit,
            max_usage_limit: new.max_usage_limit,
            usage_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        codes.push(code.clone());
        Ok(code)
    }

    async fn find_event_parent(&self, event_id: Uuid) -> Result<Option<AccessCode>, AppError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.event_id == Some(event_id) && c.code_class == CodeClass::Group)
            .cloned())
    }

    async fn event_codes(&self, event_id: Uuid) -> Result<Vec<AccessCode>, AppError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.event_id == Some(event_id))
            .cloned()
            .collect())
    }

    async fn expire_resident_codes(
        &self,
        resident_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut retired = 0;
        for code in self.codes.lock().unwrap().iter_mut() {
            if code.resident_id == resident_id && code.is_active && code.valid_until < now {
                code.is_active = false;
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn resident_codes(&self, resident_id: Uuid) -> Result<Vec<AccessCode>, AppError> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|c| c.resident_id == resident_id)
            .cloned()
            .collect())
    }

    async fn settle_validation<F, T>(&self, code: &str, decide: F) -> Result<T, AppError>
    where
        F: FnOnce(Option<&CodeSnapshot>) -> Settlement<T> + Send,
        T: Send,
    {
        let mut codes = self.codes.lock().unwrap();
        let index = codes.iter().position(|c| c.code == code);

        let snapshot = index.map(|i| CodeSnapshot {
            code: codes[i].clone(),
            unit_number: self.units.get(&codes[i].resident_id).cloned(),
        });

        let settlement = decide(snapshot.as_ref());

        if let (Some(change), Some(i)) = (settlement.change, index) {
            codes[i].usage_count = change.usage_count;
            codes[i].is_active = change.is_active;
            codes[i].updated_at = Utc::now();
        }
        self.logs.lock().unwrap().push(settlement.log);

        Ok(settlement.value)
    }

    async fn recent_logs(&self, _limit: i64) -> Result<Vec<AccessLog>, AppError> {
        Ok(vec![])
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// West Africa Time.
pub fn wat() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn test_issuer() -> Issuer {
    Issuer {
        resident_id: Uuid::new_v4(),
        resident_name: "Chinedu Eze".to_string(),
    }
}

/// An active, unused code valid for the next hour.
pub fn active_code(
    code: &str,
    class: CodeClass,
    is_multi_use: bool,
    allow_exit: bool,
    max_usage_limit: Option<i32>,
) -> AccessCode {
    let now = Utc::now();
    AccessCode {
        id: Uuid::new_v4(),
        code: code.to_string(),
        resident_id: Uuid::new_v4(),
        resident_name: "Chinedu Eze".to_string(),
        visitor_label: "Ada Obi".to_string(),
        event_label: None,
        event_id: None,
        code_class: class,
        valid_from: now - Duration::hours(1),
        valid_until: now + Duration::hours(1),
        is_multi_use,
        allow_exit,
        max_usage_limit,
        usage_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn engine(store: &MockAccessStore) -> ValidationEngine<MockAccessStore> {
    ValidationEngine {
        store: store.clone(),
    }
}

pub fn generator(store: &MockAccessStore) -> CodeGenerator<MockAccessStore> {
    CodeGenerator {
        store: store.clone(),
        estate_offset: wat(),
    }
}
