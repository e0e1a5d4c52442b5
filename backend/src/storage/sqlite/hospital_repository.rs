//! Sqlite repository for hospitals.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use shared::Hospital;

use crate::domain::models::hospital::NewHospital;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::HospitalStorage;

#[derive(Clone)]
pub struct HospitalRepository {
    db: DbConnection,
}

impl HospitalRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn row_to_hospital(row: &SqliteRow) -> Hospital {
    Hospital {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        address: row.get("address"),
        city: row.get("city"),
        phone: row.get("phone"),
        email: row.get("email"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        emergency_contact: row.get("emergency_contact"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl HospitalStorage for HospitalRepository {
    async fn insert_hospital(&self, hospital: &NewHospital) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO hospitals (
                user_id, name, address, city, phone, email,
                latitude, longitude, emergency_contact, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(hospital.user_id)
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.city)
        .bind(&hospital.phone)
        .bind(&hospital.email)
        .bind(hospital.latitude)
        .bind(hospital.longitude)
        .bind(&hospital.emergency_contact)
        .bind(&hospital.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_hospital(&self, id: i64) -> Result<Option<Hospital>> {
        let row = sqlx::query("SELECT * FROM hospitals WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_hospital))
    }

    async fn get_hospital_by_user(&self, user_id: i64) -> Result<Option<Hospital>> {
        let row = sqlx::query("SELECT * FROM hospitals WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.as_ref().map(row_to_hospital))
    }

    async fn list_hospitals(&self, city: Option<&str>) -> Result<Vec<Hospital>> {
        let mut sql = String::from("SELECT * FROM hospitals WHERE 1=1");
        if city.is_some() {
            sql.push_str(" AND city LIKE ?");
        }
        sql.push_str(" ORDER BY name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(city) = city {
            query = query.bind(format!("%{}%", city));
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.iter().map(row_to_hospital).collect())
    }

    async fn update_hospital(&self, hospital: &Hospital) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE hospitals SET
                user_id = ?, name = ?, address = ?, city = ?, phone = ?,
                email = ?, latitude = ?, longitude = ?, emergency_contact = ?
            WHERE id = ?
            "#,
        )
        .bind(hospital.user_id)
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.city)
        .bind(&hospital.phone)
        .bind(&hospital.email)
        .bind(hospital.latitude)
        .bind(hospital.longitude)
        .bind(&hospital.emergency_contact)
        .bind(hospital.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_hospital(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM hospitals WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
