//! Audit log listing.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{access_log::AccessLogResponse, user::Role},
    state::AppState,
    store::AccessStore,
};

/// Largest page the audit listing returns.
pub const MAX_LOG_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<i64>,
}

/// Resolve the requested page size.
pub fn page_size(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, MAX_LOG_LIMIT)
}

/// Newest-first audit entries.
///
/// # Endpoint
///
/// `GET /api/v1/logs?limit=50`
///
/// Admins and super admins only.
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<AccessLogResponse>>, AppError> {
    auth.require(&[Role::Admin, Role::SuperAdmin])?;

    let limit = page_size(query.limit, state.log_default_limit);
    let logs = state.store().recent_logs(limit).await?;

    Ok(Json(logs.into_iter().map(Into::into).collect()))
}
