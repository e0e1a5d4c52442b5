//! Sqlite repository for blood requests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;

use shared::{BloodRequest, BloodType, RequestFilters, RequestStats, RequestStatus};

use crate::domain::models::request::NewBloodRequest;
use crate::storage::sqlite::connection::DbConnection;
use crate::storage::traits::RequestStorage;

/// Columns selected for every request read: the full request row joined
/// with the creating hospital's display fields.
const SELECT_JOINED: &str = r#"
    SELECT br.*, h.name AS hospital_name, h.city AS hospital_city, h.phone AS hospital_phone
    FROM blood_requests br
    LEFT JOIN hospitals h ON br.hospital_id = h.id
"#;

#[derive(Clone)]
pub struct RequestRepository {
    db: DbConnection,
}

impl RequestRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

fn row_to_request(row: &SqliteRow) -> Result<BloodRequest> {
    let blood_type: String = row.get("blood_type");
    let component_type: String = row.get("component_type");
    let urgency: String = row.get("urgency");
    let status: String = row.get("status");

    Ok(BloodRequest {
        id: row.get("id"),
        hospital_id: row.get("hospital_id"),
        patient_name: row.get("patient_name"),
        age: row.get("age"),
        gender: row.get("gender"),
        hemoglobin: row.get("hemoglobin"),
        platelets: row.get("platelets"),
        blood_type: blood_type.parse::<BloodType>().map_err(|e| anyhow!(e))?,
        units: row.get("units"),
        component_type: component_type.parse().map_err(|e: String| anyhow!(e))?,
        urgency: urgency.parse().map_err(|e: String| anyhow!(e))?,
        is_critical: row.get("is_critical"),
        diagnosis: row.get("diagnosis"),
        past_reaction: row.get("past_reaction"),
        allergies: row.get("allergies"),
        doctor_name: row.get("doctor_name"),
        status: status.parse().map_err(|e: String| anyhow!(e))?,
        donor_id: row.get("donor_id"),
        contact_phone: row.get("contact_phone"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        fulfilled_at: row.get("fulfilled_at"),
        hospital_name: row.get("hospital_name"),
        hospital_city: row.get("hospital_city"),
        hospital_phone: row.get("hospital_phone"),
    })
}

#[async_trait]
impl RequestStorage for RequestRepository {
    async fn insert_request(&self, request: &NewBloodRequest) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO blood_requests (
                hospital_id, patient_name, age, gender, hemoglobin, platelets,
                blood_type, units, component_type, urgency, is_critical,
                diagnosis, past_reaction, allergies, doctor_name,
                status, contact_phone, notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.hospital_id)
        .bind(&request.patient_name)
        .bind(request.age)
        .bind(&request.gender)
        .bind(request.hemoglobin)
        .bind(request.platelets)
        .bind(request.blood_type.as_str())
        .bind(request.units)
        .bind(request.component_type.as_str())
        .bind(request.urgency.as_str())
        .bind(request.is_critical)
        .bind(&request.diagnosis)
        .bind(&request.past_reaction)
        .bind(&request.allergies)
        .bind(&request.doctor_name)
        .bind(request.status.as_str())
        .bind(&request.contact_phone)
        .bind(&request.notes)
        .bind(&request.created_at)
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_request(&self, id: i64) -> Result<Option<BloodRequest>> {
        let sql = format!("{} WHERE br.id = ?", SELECT_JOINED);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_request(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_requests(&self, filters: &RequestFilters) -> Result<Vec<BloodRequest>> {
        let mut sql = format!("{} WHERE 1=1", SELECT_JOINED);

        if filters.status.is_some() {
            sql.push_str(" AND br.status = ?");
        }
        if filters.urgency.is_some() {
            sql.push_str(" AND br.urgency = ?");
        }
        if filters.blood_type.is_some() {
            sql.push_str(" AND br.blood_type = ?");
        }
        if filters.hospital_id.is_some() {
            sql.push_str(" AND br.hospital_id = ?");
        }

        // Urgency rank first (critical before urgent before normal), most
        // recent first within the same urgency. Holds for every filter
        // combination.
        sql.push_str(
            r#"
            ORDER BY
                CASE br.urgency
                    WHEN 'critical' THEN 1
                    WHEN 'urgent' THEN 2
                    ELSE 3
                END,
                br.created_at DESC,
                br.id DESC
            "#,
        );

        let mut query = sqlx::query(&sql);
        if let Some(status) = filters.status {
            query = query.bind(status.as_str());
        }
        if let Some(urgency) = filters.urgency {
            query = query.bind(urgency.as_str());
        }
        if let Some(blood_type) = filters.blood_type {
            query = query.bind(blood_type.as_str());
        }
        if let Some(hospital_id) = filters.hospital_id {
            query = query.bind(hospital_id);
        }

        let rows = query.fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn list_critical_pending(&self) -> Result<Vec<BloodRequest>> {
        // Oldest first: the longest-unresolved critical case is the most
        // urgent to resolve, the inverse of the default ordering.
        let sql = format!(
            r#"
            {}
            WHERE br.status = 'pending' AND br.urgency = 'critical'
            ORDER BY br.created_at ASC, br.id ASC
            "#,
            SELECT_JOINED
        );
        let rows = sqlx::query(&sql).fetch_all(self.db.pool()).await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn list_fulfilled_by_donor(&self, donor_id: i64) -> Result<Vec<BloodRequest>> {
        let sql = format!(
            r#"
            {}
            WHERE br.donor_id = ? AND br.status = 'fulfilled'
            ORDER BY br.fulfilled_at DESC, br.id DESC
            "#,
            SELECT_JOINED
        );
        let rows = sqlx::query(&sql)
            .bind(donor_id)
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_request).collect()
    }

    async fn update_request_guarded(
        &self,
        record: &BloodRequest,
        expected_status: RequestStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE blood_requests SET
                hospital_id = ?, patient_name = ?, age = ?, gender = ?,
                hemoglobin = ?, platelets = ?, blood_type = ?, units = ?,
                component_type = ?, urgency = ?, is_critical = ?,
                diagnosis = ?, past_reaction = ?, allergies = ?, doctor_name = ?,
                status = ?, donor_id = ?, contact_phone = ?, notes = ?,
                fulfilled_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(record.hospital_id)
        .bind(&record.patient_name)
        .bind(record.age)
        .bind(&record.gender)
        .bind(record.hemoglobin)
        .bind(record.platelets)
        .bind(record.blood_type.as_str())
        .bind(record.units)
        .bind(record.component_type.as_str())
        .bind(record.urgency.as_str())
        .bind(record.is_critical)
        .bind(&record.diagnosis)
        .bind(&record.past_reaction)
        .bind(&record.allergies)
        .bind(&record.doctor_name)
        .bind(record.status.as_str())
        .bind(record.donor_id)
        .bind(&record.contact_phone)
        .bind(&record.notes)
        .bind(&record.fulfilled_at)
        .bind(record.id)
        .bind(expected_status.as_str())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_request(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blood_requests WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn request_stats(&self) -> Result<RequestStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM blood_requests")
            .fetch_one(self.db.pool())
            .await?;
        let pending: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blood_requests WHERE status = 'pending'")
                .fetch_one(self.db.pool())
                .await?;
        let fulfilled: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM blood_requests WHERE status = 'fulfilled'")
                .fetch_one(self.db.pool())
                .await?;
        let critical: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM blood_requests WHERE status = 'pending' AND urgency = 'critical'",
        )
        .fetch_one(self.db.pool())
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT blood_type, COUNT(*) AS count
            FROM blood_requests
            WHERE status = 'pending'
            GROUP BY blood_type
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        let mut by_blood_type = HashMap::new();
        for row in &rows {
            let code: String = row.get("blood_type");
            let blood_type = code.parse::<BloodType>().map_err(|e| anyhow!(e))?;
            by_blood_type.insert(blood_type, row.get::<i64, _>("count"));
        }

        Ok(RequestStats {
            total,
            pending,
            fulfilled,
            critical,
            by_blood_type,
        })
    }
}
