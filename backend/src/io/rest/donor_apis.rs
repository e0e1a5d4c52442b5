//! REST endpoints for donors.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use shared::{BloodType, CreateDonorRequest, DonorFilters, MatchQuery, UpdateDonorRequest};

use crate::io::rest::domain_error_response;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DonorListQuery {
    pub blood_type: Option<BloodType>,
    pub city: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MatchDonorsQuery {
    pub blood_type: BloodType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GET /api/donors
pub async fn list_donors(
    State(state): State<AppState>,
    Query(query): Query<DonorListQuery>,
) -> impl IntoResponse {
    info!("GET /api/donors - query: {:?}", query);

    let filters = DonorFilters {
        blood_type: query.blood_type,
        city: query.city,
        available: query.available,
    };

    match state.donor_service.get_all(filters).await {
        Ok(donors) => (StatusCode::OK, Json(donors)).into_response(),
        Err(e) => domain_error_response("listing donors", e),
    }
}

/// GET /api/donors/stats
pub async fn donor_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.donor_service.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => domain_error_response("computing donor stats", e),
    }
}

/// GET /api/donors/match
pub async fn match_donors(
    State(state): State<AppState>,
    Query(query): Query<MatchDonorsQuery>,
) -> impl IntoResponse {
    let match_query = MatchQuery {
        blood_type: query.blood_type,
        latitude: query.latitude,
        longitude: query.longitude,
    };

    match state.matching_service.find_matches(&match_query).await {
        Ok(donors) => (StatusCode::OK, Json(donors)).into_response(),
        Err(e) => domain_error_response("matching donors", e),
    }
}

/// POST /api/donors
pub async fn create_donor(
    State(state): State<AppState>,
    Json(payload): Json<CreateDonorRequest>,
) -> impl IntoResponse {
    info!("POST /api/donors - name: {}", payload.name);

    match state.donor_service.create(payload).await {
        Ok(donor) => (StatusCode::CREATED, Json(donor)).into_response(),
        Err(e) => domain_error_response("registering donor", e),
    }
}

/// GET /api/donors/:id
pub async fn get_donor(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.donor_service.get_by_id(id).await {
        Ok(Some(donor)) => (StatusCode::OK, Json(donor)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Donor not found").into_response(),
        Err(e) => domain_error_response("loading donor", e),
    }
}

/// PUT /api/donors/:id
pub async fn update_donor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDonorRequest>,
) -> impl IntoResponse {
    match state.donor_service.update(id, payload).await {
        Ok(donor) => (StatusCode::OK, Json(donor)).into_response(),
        Err(e) => domain_error_response("updating donor", e),
    }
}

/// DELETE /api/donors/:id
pub async fn delete_donor(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.donor_service.delete(id).await {
        Ok(()) => (StatusCode::OK, "Donor deleted successfully").into_response(),
        Err(e) => domain_error_response("deleting donor", e),
    }
}
