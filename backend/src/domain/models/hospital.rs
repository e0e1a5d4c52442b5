//! Hospital domain model.

use shared::{CreateHospitalRequest, Hospital, UpdateHospitalRequest};

use crate::domain::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewHospital {
    pub user_id: Option<i64>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub emergency_contact: Option<String>,
    pub created_at: String,
}

impl NewHospital {
    pub fn from_payload(payload: CreateHospitalRequest, now: &str) -> DomainResult<Self> {
        if payload.name.trim().is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        if payload.city.trim().is_empty() {
            return Err(DomainError::validation("City is required"));
        }

        Ok(Self {
            user_id: payload.user_id,
            name: payload.name,
            address: payload.address,
            city: payload.city,
            phone: payload.phone,
            email: payload.email,
            latitude: payload.latitude,
            longitude: payload.longitude,
            emergency_contact: payload.emergency_contact,
            created_at: now.to_string(),
        })
    }
}

pub fn apply_update(record: &mut Hospital, patch: &UpdateHospitalRequest) {
    if let Some(v) = &patch.name {
        record.name = v.clone();
    }
    if let Some(v) = &patch.address {
        record.address = v.clone();
    }
    if let Some(v) = &patch.city {
        record.city = v.clone();
    }
    if let Some(v) = &patch.phone {
        record.phone = v.clone();
    }
    if let Some(v) = &patch.email {
        record.email = Some(v.clone());
    }
    if let Some(v) = patch.latitude {
        record.latitude = Some(v);
    }
    if let Some(v) = patch.longitude {
        record.longitude = Some(v);
    }
    if let Some(v) = &patch.emergency_contact {
        record.emergency_contact = Some(v.clone());
    }
}
