//! Blood bank and batch domain models.

use chrono::NaiveDate;
use shared::{
    AddBatchRequest, Batch, BloodBank, BloodType, CreateBloodBankRequest, UpdateBatchRequest,
    UpdateBloodBankRequest,
};

use crate::domain::errors::{DomainError, DomainResult};

/// A validated bank registration ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBloodBank {
    pub user_id: Option<i64>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operating_hours: Option<String>,
    pub created_at: String,
}

impl NewBloodBank {
    pub fn from_payload(payload: CreateBloodBankRequest, now: &str) -> DomainResult<Self> {
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
            operating_hours: payload.operating_hours,
            created_at: now.to_string(),
        })
    }
}

pub fn apply_bank_update(record: &mut BloodBank, patch: &UpdateBloodBankRequest) {
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
    if let Some(v) = &patch.operating_hours {
        record.operating_hours = Some(v.clone());
    }
}

/// A validated batch ready for insertion into the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBatch {
    pub blood_bank_id: i64,
    pub blood_type: BloodType,
    pub units: i64,
    pub expiry_date: String,
    pub created_at: String,
}

impl NewBatch {
    pub fn from_payload(bank_id: i64, payload: AddBatchRequest, now: &str) -> DomainResult<Self> {
        let blood_type = payload
            .blood_type
            .as_deref()
            .ok_or_else(|| DomainError::validation("Blood type is required"))?
            .parse::<BloodType>()
            .map_err(DomainError::Validation)?;

        Ok(Self {
            blood_bank_id: bank_id,
            blood_type,
            units: validate_units(payload.units)?,
            expiry_date: validate_expiry(&payload.expiry_date)?,
            created_at: now.to_string(),
        })
    }
}

/// Apply a partial update to a batch; absent fields keep their value.
pub fn apply_batch_update(record: &mut Batch, patch: &UpdateBatchRequest) -> DomainResult<()> {
    if let Some(units) = patch.units {
        record.units = validate_units(units)?;
    }
    if let Some(expiry) = &patch.expiry_date {
        record.expiry_date = validate_expiry(expiry)?;
    }
    Ok(())
}

pub fn validate_units(units: i64) -> DomainResult<i64> {
    if units < 0 {
        return Err(DomainError::validation("Units must be a non-negative integer"));
    }
    Ok(units)
}

fn validate_expiry(expiry: &str) -> DomainResult<String> {
    NaiveDate::parse_from_str(expiry, "%Y-%m-%d")
        .map_err(|_| DomainError::validation("Expiry date must be a YYYY-MM-DD calendar date"))?;
    Ok(expiry.to_string())
}
