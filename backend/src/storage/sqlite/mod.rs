//! Sqlite implementations of the storage traits.

pub mod bank_repository;
pub mod connection;
pub mod donor_repository;
pub mod hospital_repository;
pub mod inventory_repository;
pub mod request_repository;

pub use bank_repository::BankRepository;
pub use connection::DbConnection;
pub use donor_repository::DonorRepository;
pub use hospital_repository::HospitalRepository;
pub use inventory_repository::InventoryRepository;
pub use request_repository::RequestRepository;
