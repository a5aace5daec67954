//! Public event registration handlers.
//!
//! - GET /api/v1/events/{event_id} - Event summary for the registration page
//! - POST /api/v1/events/{event_id}/register - Issue a guest code
//!
//! No authentication: the event id itself is the shared link.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::event::{EventSummary, GuestCodeResponse, RegisterGuestRequest},
    services::{code_generator::CodeGenerator, inventory::Inventory},
    state::AppState,
};

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventSummary>, AppError> {
    let inventory = Inventory {
        store: state.store(),
    };
    let summary = inventory.event_summary(event_id, Utc::now()).await?;

    Ok(Json(summary))
}

/// Register a guest and return their single-use code.
///
/// # Response
///
/// - **Success (201 Created)**: The guest's code and window
/// - **Error (400)**: Blank guest name
/// - **Error (404)**: Unknown or retired event
/// - **Error (410)**: Event window is over
pub async fn register_guest(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<RegisterGuestRequest>,
) -> Result<(StatusCode, Json<GuestCodeResponse>), AppError> {
    let generator = CodeGenerator {
        store: state.store(),
        estate_offset: state.estate_offset,
    };
    let code = generator.register_guest(event_id, request.guest_name).await?;

    Ok((StatusCode::CREATED, Json(code.into())))
}
