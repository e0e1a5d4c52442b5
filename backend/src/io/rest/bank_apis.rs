//! REST endpoints for blood banks, batches, and inventory.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use shared::{
    AddBatchRequest, BankFilters, BloodType, CreateBloodBankRequest, UpdateBatchRequest,
    UpdateBloodBankRequest, UpdateInventoryRequest,
};

use crate::domain::DomainError;
use crate::io::rest::domain_error_response;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BankListQuery {
    pub city: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FindBanksQuery {
    pub blood_type: BloodType,
    pub min_units: Option<i64>,
}

/// GET /api/banks
pub async fn list_banks(
    State(state): State<AppState>,
    Query(query): Query<BankListQuery>,
) -> impl IntoResponse {
    let filters = BankFilters {
        city: query.city,
        search: query.search,
    };

    match state.bank_service.get_all(filters).await {
        Ok(banks) => (StatusCode::OK, Json(banks)).into_response(),
        Err(e) => domain_error_response("listing banks", e),
    }
}

/// POST /api/banks
pub async fn create_bank(
    State(state): State<AppState>,
    Json(payload): Json<CreateBloodBankRequest>,
) -> impl IntoResponse {
    info!("POST /api/banks - name: {}", payload.name);

    match state.bank_service.create(payload).await {
        Ok(bank) => (StatusCode::CREATED, Json(bank)).into_response(),
        Err(e) => domain_error_response("registering bank", e),
    }
}

/// GET /api/banks/inventory
pub async fn banks_with_inventory(State(state): State<AppState>) -> impl IntoResponse {
    match state.bank_service.get_all_with_inventory().await {
        Ok(banks) => (StatusCode::OK, Json(banks)).into_response(),
        Err(e) => domain_error_response("listing bank inventory", e),
    }
}

/// GET /api/banks/inventory/total
pub async fn total_inventory(State(state): State<AppState>) -> impl IntoResponse {
    match state.inventory_service.get_total_inventory().await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(e) => domain_error_response("summing inventory", e),
    }
}

/// GET /api/banks/find
pub async fn find_banks(
    State(state): State<AppState>,
    Query(query): Query<FindBanksQuery>,
) -> impl IntoResponse {
    match state
        .inventory_service
        .find_by_blood_type(query.blood_type, query.min_units)
        .await
    {
        Ok(banks) => (StatusCode::OK, Json(banks)).into_response(),
        Err(e) => domain_error_response("finding stocked banks", e),
    }
}

/// GET /api/banks/:id
pub async fn get_bank(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.bank_service.get_by_id(id).await {
        Ok(Some(bank)) => (StatusCode::OK, Json(bank)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Blood bank not found").into_response(),
        Err(e) => domain_error_response("loading bank", e),
    }
}

/// PUT /api/banks/:id
pub async fn update_bank(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBloodBankRequest>,
) -> impl IntoResponse {
    match state.bank_service.update(id, payload).await {
        Ok(bank) => (StatusCode::OK, Json(bank)).into_response(),
        Err(e) => domain_error_response("updating bank", e),
    }
}

/// DELETE /api/banks/:id
pub async fn delete_bank(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.bank_service.delete(id).await {
        Ok(()) => (StatusCode::OK, "Blood bank deleted successfully").into_response(),
        Err(e) => domain_error_response("deleting bank", e),
    }
}

/// PUT /api/banks/:id/inventory — manual aggregate correction, bypassing
/// the batch ledger.
pub async fn override_inventory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateInventoryRequest>,
) -> impl IntoResponse {
    let blood_type = match payload.blood_type.as_deref() {
        Some(code) => match code.parse::<BloodType>() {
            Ok(bt) => bt,
            Err(msg) => {
                return domain_error_response(
                    "overriding inventory",
                    DomainError::Validation(msg),
                )
            }
        },
        None => {
            return domain_error_response(
                "overriding inventory",
                DomainError::validation("Blood type is required"),
            )
        }
    };

    match state
        .inventory_service
        .override_inventory(id, blood_type, payload.units)
        .await
    {
        Ok(inventory) => (StatusCode::OK, Json(inventory)).into_response(),
        Err(e) => domain_error_response("overriding inventory", e),
    }
}

/// GET /api/banks/:id/batches
pub async fn list_batches(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.inventory_service.get_batches(id).await {
        Ok(batches) => (StatusCode::OK, Json(batches)).into_response(),
        Err(e) => domain_error_response("listing batches", e),
    }
}

/// POST /api/banks/:id/batches
pub async fn add_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AddBatchRequest>,
) -> impl IntoResponse {
    match state.inventory_service.add_batch(id, payload).await {
        Ok(batch) => (StatusCode::CREATED, Json(batch)).into_response(),
        Err(e) => domain_error_response("adding batch", e),
    }
}

/// PUT /api/banks/batches/:id
pub async fn update_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBatchRequest>,
) -> impl IntoResponse {
    match state.inventory_service.update_batch(id, payload).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => domain_error_response("updating batch", e),
    }
}

/// DELETE /api/banks/batches/:id
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.inventory_service.delete_batch(id).await {
        Ok(()) => (StatusCode::OK, "Batch removed").into_response(),
        Err(e) => domain_error_response("deleting batch", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialize_backend;
    use crate::storage::DbConnection;

    async fn setup_test_state() -> AppState {
        let db = DbConnection::init_test().await.unwrap();
        initialize_backend(db).unwrap()
    }

    async fn create_test_bank(state: &AppState) -> i64 {
        state
            .bank_service
            .create(CreateBloodBankRequest {
                name: "Handler Bank".to_string(),
                address: "9 Lake View".to_string(),
                city: "Chennai".to_string(),
                phone: "+91 44 4000 2000".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn add_batch_handler_returns_created() {
        let state = setup_test_state().await;
        let bank_id = create_test_bank(&state).await;

        let response = add_batch(
            State(state),
            Path(bank_id),
            Json(AddBatchRequest {
                blood_type: Some("A+".to_string()),
                units: 10,
                expiry_date: "2026-12-01".to_string(),
            }),
        )
        .await;
        assert_eq!(response.into_response().status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn update_missing_batch_is_not_found() {
        let state = setup_test_state().await;

        let response = update_batch(
            State(state),
            Path(404404),
            Json(UpdateBatchRequest::default()),
        )
        .await;
        assert_eq!(response.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_missing_batch_is_a_successful_noop() {
        let state = setup_test_state().await;

        let response = delete_batch(State(state), Path(404404)).await;
        assert_eq!(response.into_response().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn override_requires_a_blood_type() {
        let state = setup_test_state().await;
        let bank_id = create_test_bank(&state).await;

        let response = override_inventory(
            State(state),
            Path(bank_id),
            Json(UpdateInventoryRequest {
                blood_type: None,
                units: 5,
            }),
        )
        .await;
        assert_eq!(response.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
