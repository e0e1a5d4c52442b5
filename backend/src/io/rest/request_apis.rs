//! REST endpoints for blood requests.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use shared::{
    BloodType, CreateBloodRequestRequest, MatchQuery, RequestFilters, RequestStatus,
    UpdateBloodRequestRequest, Urgency,
};

use crate::io::rest::{domain_error_response, principal_from_headers};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<RequestStatus>,
    pub urgency: Option<Urgency>,
    pub blood_type: Option<BloodType>,
    pub hospital_id: Option<i64>,
}

/// Body for the fulfill endpoint; the donor reference is optional and is
/// overridden by the acting principal's own donor profile anyway.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FulfillBody {
    pub donor_id: Option<i64>,
}

/// GET /api/requests
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> impl IntoResponse {
    info!("GET /api/requests - query: {:?}", query);

    let filters = RequestFilters {
        status: query.status,
        urgency: query.urgency,
        blood_type: query.blood_type,
        hospital_id: query.hospital_id,
    };

    match state.request_service.get_all(filters).await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => domain_error_response("listing requests", e),
    }
}

/// GET /api/requests/stats
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.request_service.get_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => domain_error_response("computing request stats", e),
    }
}

/// GET /api/requests/pending
pub async fn get_pending(State(state): State<AppState>) -> impl IntoResponse {
    match state.request_service.get_pending().await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => domain_error_response("listing pending requests", e),
    }
}

/// GET /api/requests/critical
pub async fn get_critical(State(state): State<AppState>) -> impl IntoResponse {
    match state.request_service.get_critical().await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => domain_error_response("listing critical requests", e),
    }
}

/// GET /api/requests/my-history
pub async fn my_history(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(principal) = principal_from_headers(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    };

    match state.request_service.get_my_history(&principal).await {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(e) => domain_error_response("loading donor history", e),
    }
}

/// GET /api/requests/:id
pub async fn get_request(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.request_service.get_by_id(id).await {
        Ok(Some(request)) => (StatusCode::OK, Json(request)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Request not found").into_response(),
        Err(e) => domain_error_response("loading request", e),
    }
}

/// GET /api/requests/:id/matches
pub async fn get_request_matches(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let request = match state.request_service.get_by_id(id).await {
        Ok(Some(request)) => request,
        Ok(None) => return (StatusCode::NOT_FOUND, "Request not found").into_response(),
        Err(e) => return domain_error_response("loading request", e),
    };

    let query = MatchQuery {
        blood_type: request.blood_type,
        latitude: None,
        longitude: None,
    };
    match state.matching_service.find_matches(&query).await {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(e) => domain_error_response("matching donors", e),
    }
}

/// POST /api/requests
pub async fn create_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBloodRequestRequest>,
) -> impl IntoResponse {
    info!("POST /api/requests - blood_type: {:?}", payload.blood_type);

    let principal = principal_from_headers(&headers);
    match state
        .request_service
        .create(principal.as_ref(), payload)
        .await
    {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(e) => domain_error_response("creating request", e),
    }
}

/// PUT /api/requests/:id
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBloodRequestRequest>,
) -> impl IntoResponse {
    match state.request_service.update(id, payload).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => domain_error_response("updating request", e),
    }
}

/// PUT /api/requests/:id/fulfill
pub async fn fulfill_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Json<FulfillBody>>,
) -> impl IntoResponse {
    let principal = principal_from_headers(&headers);
    let donor_id = body.and_then(|Json(b)| b.donor_id);

    match state
        .request_service
        .fulfill(id, principal.as_ref(), donor_id)
        .await
    {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => domain_error_response("fulfilling request", e),
    }
}

/// PUT /api/requests/:id/cancel
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.request_service.cancel(id).await {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(e) => domain_error_response("cancelling request", e),
    }
}

/// DELETE /api/requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.request_service.delete(id).await {
        Ok(()) => (StatusCode::OK, "Request deleted successfully").into_response(),
        Err(e) => domain_error_response("deleting request", e),
    }
}
