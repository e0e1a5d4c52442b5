//! Donor domain model: creation defaulting and partial-update application.

use shared::{BloodType, CreateDonorRequest, Donor, UpdateDonorRequest};

use crate::domain::errors::{DomainError, DomainResult};

/// A validated donor registration ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDonor {
    pub user_id: Option<i64>,
    pub name: String,
    pub blood_type: BloodType,
    pub phone: String,
    pub email: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub available: bool,
    pub last_donation: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
}

impl NewDonor {
    pub fn from_payload(payload: CreateDonorRequest, now: &str) -> DomainResult<Self> {
        let blood_type = payload
            .blood_type
            .as_deref()
            .ok_or_else(|| DomainError::validation("Blood type is required"))?
            .parse::<BloodType>()
            .map_err(DomainError::Validation)?;

        if payload.name.trim().is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        if payload.phone.trim().is_empty() {
            return Err(DomainError::validation("Phone is required"));
        }
        if payload.city.trim().is_empty() {
            return Err(DomainError::validation("City is required"));
        }

        Ok(Self {
            user_id: payload.user_id,
            name: payload.name,
            blood_type,
            phone: payload.phone,
            email: payload.email,
            city: payload.city,
            address: payload.address,
            available: payload.available.unwrap_or(true),
            last_donation: payload.last_donation,
            latitude: payload.latitude,
            longitude: payload.longitude,
            created_at: now.to_string(),
        })
    }
}

/// Apply a partial update; fields absent from the payload keep their value.
pub fn apply_update(record: &mut Donor, patch: &UpdateDonorRequest) -> DomainResult<()> {
    if let Some(code) = patch.blood_type.as_deref() {
        record.blood_type = code.parse::<BloodType>().map_err(DomainError::Validation)?;
    }
    if let Some(v) = &patch.name {
        record.name = v.clone();
    }
    if let Some(v) = &patch.phone {
        record.phone = v.clone();
    }
    if let Some(v) = &patch.email {
        record.email = Some(v.clone());
    }
    if let Some(v) = &patch.city {
        record.city = v.clone();
    }
    if let Some(v) = &patch.address {
        record.address = Some(v.clone());
    }
    if let Some(v) = patch.available {
        record.available = v;
    }
    if let Some(v) = &patch.last_donation {
        record.last_donation = Some(v.clone());
    }
    if let Some(v) = patch.latitude {
        record.latitude = Some(v);
    }
    if let Some(v) = patch.longitude {
        record.longitude = Some(v);
    }
    Ok(())
}
