//! # Lifeline Backend
//!
//! Coordination backend for blood donation: donors, hospitals and blood
//! banks register profiles, hospitals raise blood requests with urgency
//! levels, and the platform matches requests to donors and banks and
//! notifies them.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (lifecycle engine, ledger, directory, dispatcher)
//!     ↓
//! Storage Layer (sqlite repositories)
//! ```
//!
//! Collaborators outside this crate: authentication (hands over the acting
//! principal), real-time fan-out (consumes the event broadcast), and
//! notification delivery (consumes dispatch instructions).

pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::Method,
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::{
    BankService, DonorService, EventBroadcaster, HospitalService, InventoryService,
    LogNotificationSink, MatchingService, RequestService, StorageProfileResolver,
};
use crate::storage::sqlite::{
    BankRepository, DonorRepository, HospitalRepository, InventoryRepository, RequestRepository,
};
use crate::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub request_service: RequestService,
    pub donor_service: DonorService,
    pub hospital_service: HospitalService,
    pub bank_service: BankService,
    pub inventory_service: InventoryService,
    pub matching_service: MatchingService,
    pub events: EventBroadcaster,
}

/// Wire every service to the given database connection.
pub fn initialize_backend(db: DbConnection) -> Result<AppState> {
    info!("Setting up domain services");

    let donor_repo = Arc::new(DonorRepository::new(db.clone()));
    let hospital_repo = Arc::new(HospitalRepository::new(db.clone()));
    let bank_repo = Arc::new(BankRepository::new(db.clone()));
    let inventory_repo = Arc::new(InventoryRepository::new(db.clone()));
    let request_repo = Arc::new(RequestRepository::new(db));

    let events = EventBroadcaster::new();
    let donor_service = DonorService::new(donor_repo.clone());
    let hospital_service = HospitalService::new(hospital_repo.clone());
    let bank_service = BankService::new(bank_repo, inventory_repo.clone());
    let inventory_service = InventoryService::new(inventory_repo);
    let matching_service =
        MatchingService::new(donor_service.clone(), Arc::new(LogNotificationSink));
    let request_service = RequestService::new(
        request_repo,
        Arc::new(StorageProfileResolver::new(donor_repo, hospital_repo)),
        matching_service.clone(),
        events.clone(),
    );

    Ok(AppState {
        request_service,
        donor_service,
        hospital_service,
        bank_service,
        inventory_service,
        matching_service,
        events,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the dashboard to make requests
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    use io::rest::{bank_apis, donor_apis, hospital_apis, request_apis};

    let api_routes = Router::new()
        .route(
            "/requests",
            get(request_apis::list_requests).post(request_apis::create_request),
        )
        .route("/requests/stats", get(request_apis::get_stats))
        .route("/requests/pending", get(request_apis::get_pending))
        .route("/requests/critical", get(request_apis::get_critical))
        .route("/requests/my-history", get(request_apis::my_history))
        .route(
            "/requests/:id",
            get(request_apis::get_request)
                .put(request_apis::update_request)
                .delete(request_apis::delete_request),
        )
        .route("/requests/:id/matches", get(request_apis::get_request_matches))
        .route("/requests/:id/fulfill", put(request_apis::fulfill_request))
        .route("/requests/:id/cancel", put(request_apis::cancel_request))
        .route(
            "/donors",
            get(donor_apis::list_donors).post(donor_apis::create_donor),
        )
        .route("/donors/stats", get(donor_apis::donor_stats))
        .route("/donors/match", get(donor_apis::match_donors))
        .route(
            "/donors/:id",
            get(donor_apis::get_donor)
                .put(donor_apis::update_donor)
                .delete(donor_apis::delete_donor),
        )
        .route(
            "/banks",
            get(bank_apis::list_banks).post(bank_apis::create_bank),
        )
        .route("/banks/inventory", get(bank_apis::banks_with_inventory))
        .route("/banks/inventory/total", get(bank_apis::total_inventory))
        .route("/banks/find", get(bank_apis::find_banks))
        .route(
            "/banks/:id",
            get(bank_apis::get_bank)
                .put(bank_apis::update_bank)
                .delete(bank_apis::delete_bank),
        )
        .route("/banks/:id/inventory", put(bank_apis::override_inventory))
        .route(
            "/banks/:id/batches",
            get(bank_apis::list_batches).post(bank_apis::add_batch),
        )
        .route(
            "/banks/batches/:id",
            put(bank_apis::update_batch).delete(bank_apis::delete_batch),
        )
        .route(
            "/hospitals",
            get(hospital_apis::list_hospitals).post(hospital_apis::create_hospital),
        )
        .route(
            "/hospitals/:id",
            get(hospital_apis::get_hospital)
                .put(hospital_apis::update_hospital)
                .delete(hospital_apis::delete_hospital),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
