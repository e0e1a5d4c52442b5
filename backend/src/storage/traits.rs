//! Storage abstraction traits.
//!
//! The domain layer talks to these traits only, so a different relational
//! backend can be swapped in without touching the business rules. All
//! methods return `anyhow::Result`; services wrap failures into the opaque
//! storage variant of the domain error.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    Batch, BloodBank, BloodRequest, BloodType, Donor, DonorFilters, DonorStats, Hospital,
    InventoryEntry, RequestFilters, RequestStats, RequestStatus, StockedBank, TotalInventoryEntry,
};

use crate::domain::models::bank::{NewBatch, NewBloodBank};
use crate::domain::models::donor::NewDonor;
use crate::domain::models::hospital::NewHospital;
use crate::domain::models::request::NewBloodRequest;

/// Blood request persistence. Reads come back joined with the creating
/// hospital's display fields.
#[async_trait]
pub trait RequestStorage: Send + Sync {
    /// Insert a new request and return its id.
    async fn insert_request(&self, request: &NewBloodRequest) -> Result<i64>;

    /// Fetch one request joined with hospital name/city/phone.
    async fn get_request(&self, id: i64) -> Result<Option<BloodRequest>>;

    /// List requests under conjunctive optional filters, ordered by urgency
    /// rank (critical first) then creation time descending.
    async fn list_requests(&self, filters: &RequestFilters) -> Result<Vec<BloodRequest>>;

    /// Pending critical requests, oldest first.
    async fn list_critical_pending(&self) -> Result<Vec<BloodRequest>>;

    /// Fulfilled requests credited to a donor, most recently fulfilled first.
    async fn list_fulfilled_by_donor(&self, donor_id: i64) -> Result<Vec<BloodRequest>>;

    /// Write the full record back, guarded by a compare-and-swap on the
    /// stored status. Returns false when no row matched (missing id or a
    /// concurrent status change).
    async fn update_request_guarded(
        &self,
        record: &BloodRequest,
        expected_status: RequestStatus,
    ) -> Result<bool>;

    /// Hard-delete one request. Returns false when the id did not exist.
    async fn delete_request(&self, id: i64) -> Result<bool>;

    async fn request_stats(&self) -> Result<RequestStats>;
}

/// Donor persistence.
#[async_trait]
pub trait DonorStorage: Send + Sync {
    async fn insert_donor(&self, donor: &NewDonor) -> Result<i64>;
    async fn get_donor(&self, id: i64) -> Result<Option<Donor>>;
    async fn get_donor_by_user(&self, user_id: i64) -> Result<Option<Donor>>;

    /// List donors under optional filters, registration time descending.
    async fn list_donors(&self, filters: &DonorFilters) -> Result<Vec<Donor>>;

    /// Available donors of exactly the given type.
    async fn list_available_by_type(&self, blood_type: BloodType) -> Result<Vec<Donor>>;

    async fn update_donor(&self, donor: &Donor) -> Result<()>;
    async fn delete_donor(&self, id: i64) -> Result<bool>;
    async fn donor_stats(&self) -> Result<DonorStats>;
}

/// Hospital persistence.
#[async_trait]
pub trait HospitalStorage: Send + Sync {
    async fn insert_hospital(&self, hospital: &NewHospital) -> Result<i64>;
    async fn get_hospital(&self, id: i64) -> Result<Option<Hospital>>;
    async fn get_hospital_by_user(&self, user_id: i64) -> Result<Option<Hospital>>;
    async fn list_hospitals(&self, city: Option<&str>) -> Result<Vec<Hospital>>;
    async fn update_hospital(&self, hospital: &Hospital) -> Result<()>;
    async fn delete_hospital(&self, id: i64) -> Result<bool>;
}

/// Blood bank persistence.
#[async_trait]
pub trait BankStorage: Send + Sync {
    /// Insert a bank and seed a zero inventory row for every blood type,
    /// in one transaction.
    async fn insert_bank(&self, bank: &NewBloodBank) -> Result<i64>;

    async fn get_bank(&self, id: i64) -> Result<Option<BloodBank>>;
    async fn get_bank_by_user(&self, user_id: i64) -> Result<Option<BloodBank>>;

    /// Banks ordered by name, optionally filtered by city substring and a
    /// name/address search term.
    async fn list_banks(&self, city: Option<&str>, search: Option<&str>) -> Result<Vec<BloodBank>>;

    async fn update_bank(&self, bank: &BloodBank) -> Result<()>;

    /// Delete a bank together with its inventory rows and batches.
    async fn delete_bank(&self, id: i64) -> Result<bool>;
}

/// Batch ledger and derived inventory persistence.
///
/// Every batch mutation runs its inventory recompute inside the same
/// transaction, so the aggregate is never observable out of sync with the
/// ledger (short of the manual override below).
#[async_trait]
pub trait InventoryStorage: Send + Sync {
    async fn insert_batch(&self, batch: &NewBatch) -> Result<i64>;
    async fn get_batch(&self, id: i64) -> Result<Option<Batch>>;

    /// Write a batch row back and resync its (bank, type) aggregate.
    async fn update_batch(&self, batch: &Batch) -> Result<()>;

    /// Delete a batch and resync its aggregate. Returns false (not an
    /// error) when the id never existed.
    async fn delete_batch(&self, id: i64) -> Result<bool>;

    /// Batches for one bank, soonest expiry first.
    async fn list_batches(&self, bank_id: i64) -> Result<Vec<Batch>>;

    /// Aggregate inventory rows for one bank, ordered by blood type.
    async fn inventory_for_bank(&self, bank_id: i64) -> Result<Vec<InventoryEntry>>;

    /// Cross-bank totals grouped by blood type, ordered by blood type.
    async fn total_inventory(&self) -> Result<Vec<TotalInventoryEntry>>;

    /// Banks holding at least `min_units` of the type, best-stocked first.
    async fn find_banks_with_stock(
        &self,
        blood_type: BloodType,
        min_units: i64,
    ) -> Result<Vec<StockedBank>>;

    /// Recompute the aggregate for one (bank, type) pair from the live
    /// batch ledger, treating no batches as zero.
    async fn sync_inventory(&self, bank_id: i64, blood_type: BloodType) -> Result<()>;

    /// Manual-correction escape hatch: overwrite the aggregate directly,
    /// bypassing batch derivation.
    async fn set_inventory_level(
        &self,
        bank_id: i64,
        blood_type: BloodType,
        units: i64,
    ) -> Result<()>;
}
