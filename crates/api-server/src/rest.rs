//! REST handlers for the segment form sessions and operational endpoints.
//!
//! This is the presentation boundary: a thin event layer that maps UI
//! actions (open, choose, add, change, remove, submit, cancel) onto the
//! form store and reads back snapshots for display.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use segment_composer::{FormStore, FormView, SubmitOutcome};
use segment_core::error::StudioError;
use segment_core::segment::TraitSchema;
use segment_delivery::{DeliveryClient, DeliveryRecord};

/// Maximum segment name length accepted at the boundary.
const MAX_NAME_LEN: usize = 256;

/// Maximum trait key length accepted at the boundary.
const MAX_KEY_LEN: usize = 64;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FormStore>,
    pub delivery: DeliveryClient,
    pub start_time: Instant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SetNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    pub key: String,
}

/// Outcome of a submit: accepted drafts carry the delivery id of the
/// dispatched POST, rejected ones carry the refreshed view with the
/// validation message set.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitResponse {
    Accepted { delivery_id: Uuid, form: FormView },
    Rejected { form: FormView },
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub deliveries: usize,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: StudioError) -> HandlerError {
    let (status, code) = match &err {
        StudioError::FormNotFound(_) => (StatusCode::NOT_FOUND, "form_not_found"),
        StudioError::UnknownTrait(_) => (StatusCode::CONFLICT, "unknown_trait"),
        StudioError::PositionOutOfRange { .. } => (StatusCode::CONFLICT, "position_out_of_range"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "invalid_request".to_string(),
            message: message.to_string(),
        }),
    )
}

fn validate_key(key: &str) -> Result<(), HandlerError> {
    if key.len() > MAX_KEY_LEN {
        return Err(bad_request("trait 'key' exceeds maximum length"));
    }
    Ok(())
}

// ─── Form sessions ─────────────────────────────────────────────────────────

/// POST /v1/forms — create a form session.
pub async fn create_form(State(state): State<AppState>) -> (StatusCode, Json<FormView>) {
    let view = state.store.create_form();
    metrics::counter!("api.forms.created").increment(1);
    (StatusCode::CREATED, Json(view))
}

/// GET /v1/forms/:id — current session snapshot.
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, HandlerError> {
    state.store.snapshot(id).map(Json).map_err(error_response)
}

/// DELETE /v1/forms/:id — drop a session.
pub async fn delete_form(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.store.remove_form(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// POST /v1/forms/:id/open — show the dialog.
pub async fn open_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, HandlerError> {
    state.store.open_form(id).map(Json).map_err(error_response)
}

/// POST /v1/forms/:id/cancel — hide the dialog, keep the draft.
pub async fn cancel_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, HandlerError> {
    state.store.cancel_form(id).map(Json).map_err(error_response)
}

/// PUT /v1/forms/:id/name — update the draft segment name.
pub async fn set_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetNameRequest>,
) -> Result<Json<FormView>, HandlerError> {
    if req.name.len() > MAX_NAME_LEN {
        return Err(bad_request("segment 'name' exceeds maximum length"));
    }
    state
        .store
        .set_name(id, &req.name)
        .map(Json)
        .map_err(error_response)
}

/// POST /v1/forms/:id/schemas — add the chosen trait to the selection.
pub async fn add_schema(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SchemaRequest>,
) -> Result<Json<FormView>, HandlerError> {
    validate_key(&req.key)?;
    state
        .store
        .add_schema(id, &req.key)
        .map(Json)
        .map_err(|e| {
            warn!(form_id = %id, key = %req.key, error = %e, "Add schema rejected");
            error_response(e)
        })
}

/// PUT /v1/forms/:id/schemas/:index — replace the selection at a position.
pub async fn change_schema(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<SchemaRequest>,
) -> Result<Json<FormView>, HandlerError> {
    validate_key(&req.key)?;
    state
        .store
        .change_schema_at(id, index, &req.key)
        .map(Json)
        .map_err(|e| {
            warn!(form_id = %id, index, key = %req.key, error = %e, "Change schema rejected");
            error_response(e)
        })
}

/// DELETE /v1/forms/:id/schemas/:index — remove the selection at a position.
pub async fn remove_schema(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<FormView>, HandlerError> {
    state
        .store
        .remove_schema_at(id, index)
        .map(Json)
        .map_err(error_response)
}

/// POST /v1/forms/:id/submit — validate, dispatch, reset.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitResponse>), HandlerError> {
    match state.store.submit_form(id).map_err(error_response)? {
        SubmitOutcome::Accepted { payload, form } => {
            let delivery_id = state
                .delivery
                .dispatch(&payload)
                .map_err(error_response)?;
            metrics::counter!("api.segments.submitted").increment(1);
            Ok((
                StatusCode::ACCEPTED,
                Json(SubmitResponse::Accepted { delivery_id, form }),
            ))
        }
        SubmitOutcome::Rejected { form } => {
            metrics::counter!("api.segments.rejected").increment(1);
            Ok((StatusCode::OK, Json(SubmitResponse::Rejected { form })))
        }
    }
}

// ─── Catalog and deliveries ────────────────────────────────────────────────

/// GET /v1/catalog — the full trait catalog, in display order.
pub async fn catalog(State(state): State<AppState>) -> Json<Vec<TraitSchema>> {
    Json(state.store.catalog().iter().cloned().collect())
}

/// GET /v1/deliveries — dispatch history, most recent first.
pub async fn list_deliveries(State(state): State<AppState>) -> Json<Vec<DeliveryRecord>> {
    Json(state.delivery.deliveries())
}

/// GET /health — liveness plus a few gauges.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.start_time.elapsed().as_secs(),
        deliveries: state.delivery.deliveries().len(),
    })
}
