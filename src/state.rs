use chrono::FixedOffset;

use crate::db::DbPool;
use crate::store::PgAccessStore;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,

    /// Offset applied to window boundaries entered without a zone
    pub estate_offset: FixedOffset,

    /// Page size of the audit listing when no `limit` is given
    pub log_default_limit: i64,
}

impl AppState {
    pub fn store(&self) -> PgAccessStore {
        PgAccessStore::new(self.pool.clone())
    }
}
