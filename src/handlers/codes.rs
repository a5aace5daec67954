//! Access code HTTP handlers.
//!
//! This module implements the access-code API endpoints:
//! - POST /api/v1/codes - Generate a code (residents)
//! - GET /api/v1/codes - List the caller's codes (residents)
//! - POST /api/v1/codes/validate - Validate a code at the gate (security)

use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        access_code::{AccessCodeResponse, GenerateCodeRequest},
        access_log::{Direction, ValidateCodeRequest, ValidationResponse},
        user::Role,
    },
    services::{
        code_generator::{CodeGenerator, Issuer},
        inventory::Inventory,
        validation::{ValidateInput, ValidationEngine},
    },
    state::AppState,
};

/// Generate a new access code.
///
/// # Endpoint
///
/// `POST /api/v1/codes`
///
/// # Request Body
///
/// ```json
/// {
///   "codeClass": "group",
///   "eventLabel": "Ada's birthday",
///   "validFrom": "2025-03-01T16:00",
///   "validUntil": "2025-03-01T23:00",
///   "maxUsageLimit": 40
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The created code, `usageCount` 0
/// - **Error (400)**: Missing or malformed fields
/// - **Error (401/403)**: Missing token or not a resident
pub async fn create_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<GenerateCodeRequest>,
) -> Result<(StatusCode, Json<AccessCodeResponse>), AppError> {
    auth.require(&[Role::Resident])?;

    let generator = CodeGenerator {
        store: state.store(),
        estate_offset: state.estate_offset,
    };
    let issuer = Issuer {
        resident_id: auth.user_id,
        resident_name: auth.name,
    };

    let code = generator.generate(issuer, request).await?;

    Ok((StatusCode::CREATED, Json(code.into())))
}

/// List the caller's codes, newest first.
///
/// Codes whose window has closed are retired before listing.
pub async fn list_codes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<AccessCodeResponse>>, AppError> {
    auth.require(&[Role::Resident])?;

    let inventory = Inventory {
        store: state.store(),
    };
    let codes = inventory.resident_codes(auth.user_id, Utc::now()).await?;

    Ok(Json(codes.into_iter().map(Into::into).collect()))
}

/// Validate a code at the gate.
///
/// # Endpoint
///
/// `POST /api/v1/codes/validate`
///
/// # Response
///
/// Always 200 with `granted` true or false once the request is well formed.
/// Rejections carry a message and, where the code resolved, its details.
///
/// ```json
/// {
///   "granted": true,
///   "message": "Entry granted",
///   "detail": {
///     "visitorLabel": "Ada Obi",
///     "residentName": "Chinedu Eze",
///     "unitNumber": "B12",
///     "isMultiUse": false,
///     "usageCount": 1
///   }
/// }
/// ```
pub async fn validate_code(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<ValidateCodeRequest>,
) -> Result<Json<ValidationResponse>, AppError> {
    auth.require(&[Role::Security])?;

    let (Some(code), Some(direction)) = (request.code, request.direction) else {
        return Err(AppError::InvalidRequest(
            "Code and direction are required".to_string(),
        ));
    };
    let direction = direction
        .parse::<Direction>()
        .map_err(|_| AppError::InvalidRequest("direction must be 'entry' or 'exit'".to_string()))?;

    let engine = ValidationEngine {
        store: state.store(),
    };
    let response = engine
        .execute(ValidateInput {
            code,
            direction,
            validator: auth.email,
        })
        .await?;

    Ok(Json(response))
}
