//! REST endpoints for hospitals.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;

use shared::{CreateHospitalRequest, UpdateHospitalRequest};

use crate::io::rest::domain_error_response;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HospitalListQuery {
    pub city: Option<String>,
}

/// GET /api/hospitals
pub async fn list_hospitals(
    State(state): State<AppState>,
    Query(query): Query<HospitalListQuery>,
) -> impl IntoResponse {
    match state.hospital_service.get_all(query.city).await {
        Ok(hospitals) => (StatusCode::OK, Json(hospitals)).into_response(),
        Err(e) => domain_error_response("listing hospitals", e),
    }
}

/// POST /api/hospitals
pub async fn create_hospital(
    State(state): State<AppState>,
    Json(payload): Json<CreateHospitalRequest>,
) -> impl IntoResponse {
    match state.hospital_service.create(payload).await {
        Ok(hospital) => (StatusCode::CREATED, Json(hospital)).into_response(),
        Err(e) => domain_error_response("registering hospital", e),
    }
}

/// GET /api/hospitals/:id
pub async fn get_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.hospital_service.get_by_id(id).await {
        Ok(Some(hospital)) => (StatusCode::OK, Json(hospital)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Hospital not found").into_response(),
        Err(e) => domain_error_response("loading hospital", e),
    }
}

/// PUT /api/hospitals/:id
pub async fn update_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateHospitalRequest>,
) -> impl IntoResponse {
    match state.hospital_service.update(id, payload).await {
        Ok(hospital) => (StatusCode::OK, Json(hospital)).into_response(),
        Err(e) => domain_error_response("updating hospital", e),
    }
}

/// DELETE /api/hospitals/:id
pub async fn delete_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.hospital_service.delete(id).await {
        Ok(()) => (StatusCode::OK, "Hospital deleted successfully").into_response(),
        Err(e) => domain_error_response("deleting hospital", e),
    }
}
