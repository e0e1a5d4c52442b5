//! Sqlite repository for blood banks.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shared::{now_rfc3339, BloodBank, BloodType};

use crate::domain::models::bank::NewBloodBank;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::BankStorage;

#[derive(Clone)]
pub struct BankRepository {
    db: DbConnection,
}

impl BankRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn row_to_bank(row: &SqliteRow) -> BloodBank {
    BloodBank {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        address: row.get("address"),
        city: row.get("city"),
        phone: row.get("phone"),
        email: row.get("email"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        operating_hours: row.get("operating_hours"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl BankStorage for BankRepository {
    async fn insert_bank(&self, bank: &NewBloodBank) -> Result<i64> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO blood_banks (
                user_id, name, address, city, phone, email,
                latitude, longitude, operating_hours, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bank.user_id)
        .bind(&bank.name)
        .bind(&bank.address)
        .bind(&bank.city)
        .bind(&bank.phone)
        .bind(&bank.email)
        .bind(bank.latitude)
        .bind(bank.longitude)
        .bind(&bank.operating_hours)
        .bind(&bank.created_at)
        .execute(&mut *tx)
        .await?;

        let bank_id = result.last_insert_rowid();

        // Seed an empty aggregate row for every blood type so inventory
        // reads never have to special-case a brand-new bank.
        let now = now_rfc3339();
        for blood_type in BloodType::ALL {
            sqlx::query(
                r#"
                INSERT INTO blood_inventory (blood_bank_id, blood_type, units, updated_at)
                VALUES (?, ?, 0, ?)
                "#,
            )
            .bind(bank_id)
            .bind(blood_type.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(bank_id)
    }

    async fn get_bank(&self, id: i64) -> Result<Option<BloodBank>> {
        let row = sqlx::query("SELECT * FROM blood_banks WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_bank))
    }

    async fn get_bank_by_user(&self, user_id: i64) -> Result<Option<BloodBank>> {
        let row = sqlx::query("SELECT * FROM blood_banks WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_bank))
    }

    async fn list_banks(&self, city: Option<&str>, search: Option<&str>) -> Result<Vec<BloodBank>> {
        let mut sql = String::from("SELECT * FROM blood_banks WHERE 1=1");
        if city.is_some() {
            sql.push_str(" AND city LIKE ?");
        }
        if search.is_some() {
            sql.push_str(" AND (name LIKE ? OR address LIKE ?)");
        }
        sql.push_str(" ORDER BY name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(city) = city {
            query = query.bind(format!("%{}%", city));
        }
        if let Some(search) = search {
            let pattern = format!("%{}%", search);
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(row_to_bank).collect())
    }

    async fn update_bank(&self, bank: &BloodBank) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE blood_banks SET
                user_id = ?, name = ?, address = ?, city = ?, phone = ?,
                email = ?, latitude = ?, longitude = ?, operating_hours = ?
            WHERE id = ?
            "#,
        )
        .bind(bank.user_id)
        .bind(&bank.name)
        .bind(&bank.address)
        .bind(&bank.city)
        .bind(&bank.phone)
        .bind(&bank.email)
        .bind(bank.latitude)
        .bind(bank.longitude)
        .bind(&bank.operating_hours)
        .bind(bank.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_bank(&self, id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM blood_inventory WHERE blood_bank_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM blood_batches WHERE blood_bank_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM blood_banks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
