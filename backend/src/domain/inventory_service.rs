//! Inventory ledger: batch bookkeeping and the derived per-type aggregate.
//!
//! The aggregate row is a materialized view over the batch ledger. Its one
//! authoritative writer is the recompute that follows every batch mutation;
//! `override_inventory` is the manual-correction escape hatch that bypasses
//! derivation and stays desynchronized until the next batch mutation for
//! the same (bank, type) pair recomputes over it.

use std::sync::Arc;

use shared::{
    now_rfc3339, AddBatchRequest, Batch, BloodType, InventoryEntry, StockedBank,
    TotalInventoryEntry, UpdateBatchRequest,
};
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::bank::{self, validate_units, NewBatch};
use crate::storage::InventoryStorage;

#[derive(Clone)]
pub struct InventoryService {
    inventory: Arc<dyn InventoryStorage>,
}

impl InventoryService {
    pub fn new(inventory: Arc<dyn InventoryStorage>) -> Self {
        Self { inventory }
    }

    /// Record a received batch. The (bank, type) aggregate is recomputed in
    /// the same transaction as the insert.
    pub async fn add_batch(&self, bank_id: i64, payload: AddBatchRequest) -> DomainResult<Batch> {
        let new_batch = NewBatch::from_payload(bank_id, payload, &now_rfc3339())?;
        let id = self.inventory.insert_batch(&new_batch).await?;
        info!(
            "bank {} received batch {} ({} x{})",
            bank_id, id, new_batch.blood_type, new_batch.units
        );

        self.inventory
            .get_batch(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Batch not found after insert"))
    }

    /// Partially update a batch, then recompute its aggregate. Missing
    /// batch ids are an error on this path.
    pub async fn update_batch(&self, id: i64, patch: UpdateBatchRequest) -> DomainResult<Batch> {
        let mut record = self
            .inventory
            .get_batch(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Batch {} not found", id)))?;

        bank::apply_batch_update(&mut record, &patch)?;
        self.inventory.update_batch(&record).await?;
        Ok(record)
    }

    /// Dispose of a batch. Deleting a batch that never existed is a no-op,
    /// not an error.
    pub async fn delete_batch(&self, id: i64) -> DomainResult<()> {
        if self.inventory.delete_batch(id).await? {
            info!("deleted batch {}", id);
        }
        Ok(())
    }

    /// Batches for one bank, soonest-to-expire first (first-expired-first-out
    /// consumption order).
    pub async fn get_batches(&self, bank_id: i64) -> DomainResult<Vec<Batch>> {
        Ok(self.inventory.list_batches(bank_id).await?)
    }

    pub async fn get_inventory(&self, bank_id: i64) -> DomainResult<Vec<InventoryEntry>> {
        Ok(self.inventory.inventory_for_bank(bank_id).await?)
    }

    /// Nationwide summary: units per blood type across all banks.
    pub async fn get_total_inventory(&self) -> DomainResult<Vec<TotalInventoryEntry>> {
        Ok(self.inventory.total_inventory().await?)
    }

    /// Banks holding at least `min_units` of the type, best-stocked first.
    pub async fn find_by_blood_type(
        &self,
        blood_type: BloodType,
        min_units: Option<i64>,
    ) -> DomainResult<Vec<StockedBank>> {
        Ok(self
            .inventory
            .find_banks_with_stock(blood_type, min_units.unwrap_or(1))
            .await?)
    }

    /// Recompute one (bank, type) aggregate from the live batch ledger.
    pub async fn sync_inventory(&self, bank_id: i64, blood_type: BloodType) -> DomainResult<()> {
        self.inventory.sync_inventory(bank_id, blood_type).await?;
        Ok(())
    }

    /// Manual aggregate overwrite. This bypasses batch-derived truth: the
    /// written value stands only until the next batch mutation for the same
    /// pair recomputes the aggregate, and the recompute always wins.
    pub async fn override_inventory(
        &self,
        bank_id: i64,
        blood_type: BloodType,
        units: i64,
    ) -> DomainResult<Vec<InventoryEntry>> {
        validate_units(units)?;
        warn!(
            "manual inventory override: bank {} {} set to {} units, bypassing batch ledger",
            bank_id, blood_type, units
        );
        self.inventory
            .set_inventory_level(bank_id, blood_type, units)
            .await?;
        Ok(self.inventory.inventory_for_bank(bank_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::CreateBloodBankRequest;

    use crate::domain::models::bank::NewBloodBank;
    use crate::storage::sqlite::{BankRepository, DbConnection, InventoryRepository};
    use crate::storage::BankStorage;

    struct Ctx {
        db: DbConnection,
        service: InventoryService,
        bank_id: i64,
    }

    async fn register_bank(db: &DbConnection, name: &str) -> i64 {
        let banks = BankRepository::new(db.clone());
        let new_bank = NewBloodBank::from_payload(
            CreateBloodBankRequest {
                name: name.to_string(),
                address: "1 Main Street".to_string(),
                city: "Mumbai".to_string(),
                phone: "+91 22 4000 1000".to_string(),
                ..Default::default()
            },
            &now_rfc3339(),
        )
        .unwrap();
        banks.insert_bank(&new_bank).await.unwrap()
    }

    async fn setup() -> Ctx {
        let db = DbConnection::init_test().await.unwrap();
        let bank_id = register_bank(&db, "Test Bank").await;

        Ctx {
            service: InventoryService::new(Arc::new(InventoryRepository::new(db.clone()))),
            db,
            bank_id,
        }
    }

    fn batch(blood_type: &str, units: i64, expiry: &str) -> AddBatchRequest {
        AddBatchRequest {
            blood_type: Some(blood_type.to_string()),
            units,
            expiry_date: expiry.to_string(),
        }
    }

    async fn aggregate_units(ctx: &Ctx, blood_type: BloodType) -> i64 {
        ctx.service
            .get_inventory(ctx.bank_id)
            .await
            .unwrap()
            .into_iter()
            .find(|e| e.blood_type == blood_type)
            .map(|e| e.units)
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn batches_accumulate_into_the_aggregate() {
        let ctx = setup().await;
        ctx.service
            .add_batch(ctx.bank_id, batch("A+", 10, "2026-01-01"))
            .await
            .unwrap();
        ctx.service
            .add_batch(ctx.bank_id, batch("A+", 5, "2026-02-01"))
            .await
            .unwrap();

        assert_eq!(aggregate_units(&ctx, BloodType::APositive).await, 15);

        // Soonest expiry first.
        let batches = ctx.service.get_batches(ctx.bank_id).await.unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].expiry_date, "2026-01-01");
        assert_eq!(batches[1].expiry_date, "2026-02-01");
    }

    #[tokio::test]
    async fn aggregate_follows_every_batch_mutation() {
        let ctx = setup().await;
        let first = ctx
            .service
            .add_batch(ctx.bank_id, batch("O-", 8, "2026-03-01"))
            .await
            .unwrap();
        let second = ctx
            .service
            .add_batch(ctx.bank_id, batch("O-", 4, "2026-04-01"))
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ONegative).await, 12);

        ctx.service
            .update_batch(
                first.id,
                UpdateBatchRequest {
                    units: Some(2),
                    expiry_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ONegative).await, 6);

        ctx.service.delete_batch(second.id).await.unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ONegative).await, 2);

        ctx.service.delete_batch(first.id).await.unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ONegative).await, 0);
    }

    #[tokio::test]
    async fn total_inventory_sums_across_banks() {
        let ctx = setup().await;
        let other_bank = register_bank(&ctx.db, "Second Bank").await;

        ctx.service
            .add_batch(ctx.bank_id, batch("B+", 7, "2026-05-01"))
            .await
            .unwrap();
        ctx.service
            .add_batch(other_bank, batch("B+", 5, "2026-05-15"))
            .await
            .unwrap();

        let totals = ctx.service.get_total_inventory().await.unwrap();
        let b_pos = totals
            .iter()
            .find(|t| t.blood_type == BloodType::BPositive)
            .unwrap();
        assert_eq!(b_pos.total_units, 12);
    }

    #[tokio::test]
    async fn deleting_missing_batch_is_a_noop() {
        let ctx = setup().await;
        ctx.service.delete_batch(424242).await.unwrap();
    }

    #[tokio::test]
    async fn updating_missing_batch_is_not_found() {
        let ctx = setup().await;
        let err = ctx
            .service
            .update_batch(424242, UpdateBatchRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn stocked_bank_lookup_orders_best_stocked_first() {
        let ctx = setup().await;
        let other_bank = register_bank(&ctx.db, "Second Bank").await;

        ctx.service
            .add_batch(ctx.bank_id, batch("AB+", 3, "2026-06-01"))
            .await
            .unwrap();
        ctx.service
            .add_batch(other_bank, batch("AB+", 9, "2026-06-01"))
            .await
            .unwrap();

        let stocked = ctx
            .service
            .find_by_blood_type(BloodType::AbPositive, None)
            .await
            .unwrap();
        assert_eq!(stocked.len(), 2);
        assert_eq!(stocked[0].bank.id, other_bank);
        assert_eq!(stocked[0].units, 9);
        assert_eq!(stocked[1].units, 3);

        // min_units filters out thinly stocked banks.
        let heavy = ctx
            .service
            .find_by_blood_type(BloodType::AbPositive, Some(5))
            .await
            .unwrap();
        assert_eq!(heavy.len(), 1);
        assert_eq!(heavy[0].bank.id, other_bank);
    }

    #[tokio::test]
    async fn manual_override_desynchronizes_until_next_batch_mutation() {
        let ctx = setup().await;
        let batch_row = ctx
            .service
            .add_batch(ctx.bank_id, batch("A-", 10, "2026-07-01"))
            .await
            .unwrap();

        // Override the aggregate away from batch-derived truth.
        ctx.service
            .override_inventory(ctx.bank_id, BloodType::ANegative, 99)
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ANegative).await, 99);

        // The next batch mutation recomputes from the ledger; the derived
        // value always wins over the manual correction.
        ctx.service
            .update_batch(
                batch_row.id,
                UpdateBatchRequest {
                    units: Some(6),
                    expiry_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::ANegative).await, 6);
    }

    #[tokio::test]
    async fn explicit_sync_restores_derived_truth() {
        let ctx = setup().await;
        ctx.service
            .add_batch(ctx.bank_id, batch("B-", 4, "2026-08-01"))
            .await
            .unwrap();

        ctx.service
            .override_inventory(ctx.bank_id, BloodType::BNegative, 50)
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::BNegative).await, 50);

        ctx.service
            .sync_inventory(ctx.bank_id, BloodType::BNegative)
            .await
            .unwrap();
        assert_eq!(aggregate_units(&ctx, BloodType::BNegative).await, 4);
    }

    #[tokio::test]
    async fn negative_units_rejected_everywhere() {
        let ctx = setup().await;
        let err = ctx
            .service
            .add_batch(ctx.bank_id, batch("A+", -1, "2026-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = ctx
            .service
            .override_inventory(ctx.bank_id, BloodType::APositive, -5)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
