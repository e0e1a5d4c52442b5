//! Hospital profile maintenance.

use std::sync::Arc;

use shared::{now_rfc3339, CreateHospitalRequest, Hospital, UpdateHospitalRequest};
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::hospital::{self, NewHospital};
use crate::storage::HospitalStorage;

#[derive(Clone)]
pub struct HospitalService {
    hospitals: Arc<dyn HospitalStorage>,
}

impl HospitalService {
    pub fn new(hospitals: Arc<dyn HospitalStorage>) -> Self {
        Self { hospitals }
    }

    pub async fn create(&self, payload: CreateHospitalRequest) -> DomainResult<Hospital> {
        let new_hospital = NewHospital::from_payload(payload, &now_rfc3339())?;
        let id = self.hospitals.insert_hospital(&new_hospital).await?;
        info!("registered hospital {} ({})", id, new_hospital.name);

        self.hospitals
            .get_hospital(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Hospital not found after insert"))
    }

    pub async fn get_by_id(&self, id: i64) -> DomainResult<Option<Hospital>> {
        Ok(self.hospitals.get_hospital(id).await?)
    }

    pub async fn get_by_user_id(&self, user_id: i64) -> DomainResult<Option<Hospital>> {
        Ok(self.hospitals.get_hospital_by_user(user_id).await?)
    }

    pub async fn get_all(&self, city: Option<String>) -> DomainResult<Vec<Hospital>> {
        Ok(self.hospitals.list_hospitals(city.as_deref()).await?)
    }

    pub async fn update(&self, id: i64, patch: UpdateHospitalRequest) -> DomainResult<Hospital> {
        let mut record = self
            .hospitals
            .get_hospital(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Hospital {} not found", id)))?;

        hospital::apply_update(&mut record, &patch);
        self.hospitals.update_hospital(&record).await?;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if !self.hospitals.delete_hospital(id).await? {
            return Err(DomainError::not_found(format!("Hospital {} not found", id)));
        }
        Ok(())
    }
}
