//! # Domain Layer
//!
//! Business rules for the blood-donation coordination platform: the request
//! lifecycle state machine, the batch-to-aggregate inventory ledger, the
//! donor directory, and the matching/alert dispatch for critical requests.
//! Services depend only on the storage traits, never on a concrete backend.

pub mod bank_service;
pub mod donor_service;
pub mod errors;
pub mod events;
pub mod hospital_service;
pub mod inventory_service;
pub mod matching_service;
pub mod models;
pub mod notifications;
pub mod principal;
pub mod request_service;

pub use bank_service::BankService;
pub use donor_service::DonorService;
pub use errors::{DomainError, DomainResult};
pub use events::EventBroadcaster;
pub use hospital_service::HospitalService;
pub use inventory_service::InventoryService;
pub use matching_service::MatchingService;
pub use notifications::{LogNotificationSink, NotificationSink};
pub use principal::{Principal, ProfileResolver, StorageProfileResolver};
pub use request_service::RequestService;
