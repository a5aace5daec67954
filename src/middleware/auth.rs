//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the token from the Authorization header
//! 2. Hash it and resolve the owning account
//! 3. Inject the caller's identity into the request
//!
//! Role checks happen in the handlers via [`AuthContext::require`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::db::hash_token;
use crate::error::AppError;
use crate::models::user::{Role, TokenOwner};
use crate::state::AppState;

/// Identity of the authenticated caller.
///
/// Inserted into the request's extension map; handlers read it with
/// `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub unit_number: Option<String>,
}

impl AuthContext {
    /// `Forbidden` unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Resolve `Authorization: Bearer <token>` to an [`AuthContext`].
///
/// # Returns
///
/// - `Ok(Response)` from the next handler when the token is known and active
/// - `Err(AppError::InvalidToken)` otherwise (401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::InvalidToken)?;

    let token_hash = hash_token(token);

    let owner = sqlx::query_as::<_, TokenOwner>(
        r#"
        SELECT u.id, u.email, u.name, u.role, u.unit_number
        FROM user_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1
          AND t.is_active = true
          AND u.is_active = true
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::InvalidToken)?;

    let role = owner.role.parse::<Role>().map_err(|e| {
        tracing::warn!(user_id = %owner.id, error = %e, "token owner has unknown role");
        AppError::InvalidToken
    })?;

    request.extensions_mut().insert(AuthContext {
        user_id: owner.id,
        email: owner.email,
        name: owner.name,
        role,
        unit_number: owner.unit_number,
    });

    Ok(next.run(request).await)
}
