//! Sqlite repository for donors.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;

use shared::{BloodType, Donor, DonorFilters, DonorStats};

use crate::domain::models::donor::NewDonor;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::DonorStorage;

#[derive(Clone)]
pub struct DonorRepository {
    db: DbConnection,
}

impl DonorRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn row_to_donor(row: &SqliteRow) -> Result<Donor> {
    let blood_type: String = row.get("blood_type");

    Ok(Donor {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        blood_type: blood_type.parse::<BloodType>().map_err(|e| anyhow!(e))?,
        phone: row.get("phone"),
        email: row.get("email"),
        city: row.get("city"),
        address: row.get("address"),
        available: row.get("available"),
        last_donation: row.get("last_donation"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl DonorStorage for DonorRepository {
    async fn insert_donor(&self, donor: &NewDonor) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO donors (
                user_id, name, blood_type, phone, email, city, address,
                available, last_donation, latitude, longitude, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(donor.user_id)
        .bind(&donor.name)
        .bind(donor.blood_type.as_str())
        .bind(&donor.phone)
        .bind(&donor.email)
        .bind(&donor.city)
        .bind(&donor.address)
        .bind(donor.available)
        .bind(&donor.last_donation)
        .bind(donor.latitude)
        .bind(donor.longitude)
        .bind(&donor.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_donor(&self, id: i64) -> Result<Option<Donor>> {
        let row = sqlx::query("SELECT * FROM donors WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_donor(&r)?)),
            None => Ok(None),
        }
    }

    async fn get_donor_by_user(&self, user_id: i64) -> Result<Option<Donor>> {
        let row = sqlx::query("SELECT * FROM donors WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_donor(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_donors(&self, filters: &DonorFilters) -> Result<Vec<Donor>> {
        let mut sql = String::from("SELECT * FROM donors WHERE 1=1");

        if filters.blood_type.is_some() {
            sql.push_str(" AND blood_type = ?");
        }
        if filters.city.is_some() {
            sql.push_str(" AND city LIKE ?");
        }
        if filters.available.is_some() {
            sql.push_str(" AND available = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query = sqlx::query(&sql);
        if let Some(blood_type) = filters.blood_type {
            query = query.bind(blood_type.as_str());
        }
        if let Some(city) = &filters.city {
            query = query.bind(format!("%{}%", city));
        }
        if let Some(available) = filters.available {
            query = query.bind(available);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_donor).collect()
    }

    async fn list_available_by_type(&self, blood_type: BloodType) -> Result<Vec<Donor>> {
        let rows = sqlx::query("SELECT * FROM donors WHERE blood_type = ? AND available = 1")
            .bind(blood_type.as_str())
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_donor).collect()
    }

    async fn update_donor(&self, donor: &Donor) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE donors SET
                user_id = ?, name = ?, blood_type = ?, phone = ?, email = ?,
                city = ?, address = ?, available = ?, last_donation = ?,
                latitude = ?, longitude = ?
            WHERE id = ?
            "#,
        )
        .bind(donor.user_id)
        .bind(&donor.name)
        .bind(donor.blood_type.as_str())
        .bind(&donor.phone)
        .bind(&donor.email)
        .bind(&donor.city)
        .bind(&donor.address)
        .bind(donor.available)
        .bind(&donor.last_donation)
        .bind(donor.latitude)
        .bind(donor.longitude)
        .bind(donor.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_donor(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM donors WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn donor_stats(&self) -> Result<DonorStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donors")
            .fetch_one(self.db.pool())
            .await?;
        let available: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donors WHERE available = 1")
            .fetch_one(self.db.pool())
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT blood_type, COUNT(*) AS count
            FROM donors
            WHERE available = 1
            GROUP BY blood_type
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut by_type = HashMap::new();
        for row in &rows {
            let code: String = row.get("blood_type");
            let blood_type = code.parse::<BloodType>().map_err(|e| anyhow!(e))?;
            by_type.insert(blood_type, row.get::<i64, _>("count"));
        }

        Ok(DonorStats {
            total,
            available,
            by_type,
        })
    }
}
