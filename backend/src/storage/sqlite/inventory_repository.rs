//! Sqlite repository for the batch ledger and the derived inventory
//! aggregate.
//!
//! The aggregate row for a (bank, blood type) pair is a materialized view
//! over the batch ledger. Its only legitimate writer is the recompute that
//! runs inside the same transaction as every batch mutation; the manual
//! override is the documented exception.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use shared::{
    now_rfc3339, Batch, BloodType, InventoryEntry, StockedBank, TotalInventoryEntry,
};

use crate::domain::models::bank::NewBatch;
use crate::storage::sqlite::bank_repository::row_to_bank;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::InventoryStorage;

#[derive(Clone)]
pub struct InventoryRepository {
    db: DbConnection,
}

impl InventoryRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn row_to_batch(row: &SqliteRow) -> Result<Batch> {
    let blood_type: String = row.get("blood_type");

    Ok(Batch {
        id: row.get("id"),
        blood_bank_id: row.get("blood_bank_id"),
        blood_type: blood_type.parse::<BloodType>().map_err(|e| anyhow!(e))?,
        units: row.get("units"),
        expiry_date: row.get("expiry_date"),
        created_at: row.get("created_at"),
    })
}

/// Recompute SUM(units) over the live batches for one (bank, type) pair and
/// upsert the aggregate row, inside the caller's transaction. No batches
/// counts as zero.
async fn sync_inventory_in(
    conn: &mut SqliteConnection,
    bank_id: i64,
    blood_type: BloodType,
) -> Result<()> {
    let total: Option<i64> = sqlx::query_scalar(
        "SELECT SUM(units) FROM blood_batches WHERE blood_bank_id = ? AND blood_type = ?",
    )
    .bind(bank_id)
    .bind(blood_type.as_str())
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO blood_inventory (blood_bank_id, blood_type, units, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (blood_bank_id, blood_type)
        DO UPDATE SET units = excluded.units, updated_at = excluded.updated_at
        "#,
    )
    .bind(bank_id)
    .bind(blood_type.as_str())
    .bind(total.unwrap_or(0))
    .bind(now_rfc3339())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl InventoryStorage for InventoryRepository {
    async fn insert_batch(&self, batch: &NewBatch) -> Result<i64> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO blood_batches (blood_bank_id, blood_type, units, expiry_date, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(batch.blood_bank_id)
        .bind(batch.blood_type.as_str())
        .bind(batch.units)
        .bind(&batch.expiry_date)
        .bind(&batch.created_at)
        .execute(&mut *tx)
        .await?;

        sync_inventory_in(&mut tx, batch.blood_bank_id, batch.blood_type).await?;
        tx.commit().await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_batch(&self, id: i64) -> Result<Option<Batch>> {
        let row = sqlx::query("SELECT * FROM blood_batches WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_batch(&r)?)),
            None => Ok(None),
        }
    }

    async fn update_batch(&self, batch: &Batch) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query(
            r#"
            UPDATE blood_batches SET units = ?, expiry_date = ?
            WHERE id = ?
            "#,
        )
        .bind(batch.units)
        .bind(&batch.expiry_date)
        .bind(batch.id)
        .execute(&mut *tx)
        .await?;

        sync_inventory_in(&mut tx, batch.blood_bank_id, batch.blood_type).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn delete_batch(&self, id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query("SELECT * FROM blood_batches WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let batch = match row {
            Some(r) => row_to_batch(&r)?,
            None => return Ok(false),
        };

        sqlx::query("DELETE FROM blood_batches WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sync_inventory_in(&mut tx, batch.blood_bank_id, batch.blood_type).await?;
        tx.commit().await?;

        Ok(true)
    }

    async fn list_batches(&self, bank_id: i64) -> Result<Vec<Batch>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM blood_batches
            WHERE blood_bank_id = ?
            ORDER BY expiry_date ASC, id ASC
            "#,
        )
        .bind(bank_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_batch).collect()
    }

    async fn inventory_for_bank(&self, bank_id: i64) -> Result<Vec<InventoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT blood_type, units, updated_at
            FROM blood_inventory
            WHERE blood_bank_id = ?
            ORDER BY blood_type
            "#,
        )
        .bind(bank_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let code: String = row.get("blood_type");
                Ok(InventoryEntry {
                    blood_type: code.parse::<BloodType>().map_err(|e| anyhow!(e))?,
                    units: row.get("units"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }

    async fn total_inventory(&self) -> Result<Vec<TotalInventoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT blood_type, SUM(units) AS total_units
            FROM blood_inventory
            GROUP BY blood_type
            ORDER BY blood_type
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let code: String = row.get("blood_type");
                Ok(TotalInventoryEntry {
                    blood_type: code.parse::<BloodType>().map_err(|e| anyhow!(e))?,
                    total_units: row.get("total_units"),
                })
            })
            .collect()
    }

    async fn find_banks_with_stock(
        &self,
        blood_type: BloodType,
        min_units: i64,
    ) -> Result<Vec<StockedBank>> {
        let rows = sqlx::query(
            r#"
            SELECT bb.*, bi.units AS held_units
            FROM blood_banks bb
            JOIN blood_inventory bi ON bb.id = bi.blood_bank_id
            WHERE bi.blood_type = ? AND bi.units >= ?
            ORDER BY bi.units DESC, bb.id ASC
            "#,
        )
        .bind(blood_type.as_str())
        .bind(min_units)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| StockedBank {
                bank: row_to_bank(row),
                units: row.get("held_units"),
            })
            .collect())
    }

    async fn sync_inventory(&self, bank_id: i64, blood_type: BloodType) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        sync_inventory_in(&mut tx, bank_id, blood_type).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_inventory_level(
        &self,
        bank_id: i64,
        blood_type: BloodType,
        units: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blood_inventory (blood_bank_id, blood_type, units, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (blood_bank_id, blood_type)
            DO UPDATE SET units = excluded.units, updated_at = excluded.updated_at
            "#,
        )
        .bind(bank_id)
        .bind(blood_type.as_str())
        .bind(units)
        .bind(now_rfc3339())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
