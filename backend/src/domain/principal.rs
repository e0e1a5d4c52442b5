//! Acting principals and profile resolution.
//!
//! The auth collaborator hands over an opaque `{id, role}` pair which the
//! backend trusts verbatim. Operations that attribute work to a profile
//! (fulfillment by a donor, request creation by a hospital) resolve the
//! principal's owned profile through one capability interface instead of
//! re-deriving it ad hoc per operation.

use async_trait::async_trait;
use shared::Role;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::storage::{DonorStorage, HospitalStorage};

/// The authenticated caller of a lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

/// Resolves the profile a principal owns, if any. Role mismatches resolve
/// to `None` rather than an error: a hospital fulfilling a request simply
/// has no donor profile to attribute.
#[async_trait]
pub trait ProfileResolver: Send + Sync {
    async fn donor_profile(&self, principal: &Principal) -> DomainResult<Option<i64>>;
    async fn hospital_profile(&self, principal: &Principal) -> DomainResult<Option<i64>>;
}

/// `ProfileResolver` backed by the storage layer's user-id lookups.
pub struct StorageProfileResolver {
    donors: Arc<dyn DonorStorage>,
    hospitals: Arc<dyn HospitalStorage>,
}

impl StorageProfileResolver {
    pub fn new(donors: Arc<dyn DonorStorage>, hospitals: Arc<dyn HospitalStorage>) -> Self {
        Self { donors, hospitals }
    }
}

#[async_trait]
impl ProfileResolver for StorageProfileResolver {
    async fn donor_profile(&self, principal: &Principal) -> DomainResult<Option<i64>> {
        if principal.role != Role::Donor {
            return Ok(None);
        }
        let donor = self.donors.get_donor_by_user(principal.user_id).await?;
        Ok(donor.map(|d| d.id))
    }

    async fn hospital_profile(&self, principal: &Principal) -> DomainResult<Option<i64>> {
        if principal.role != Role::Hospital {
            return Ok(None);
        }
        let hospital = self.hospitals.get_hospital_by_user(principal.user_id).await?;
        Ok(hospital.map(|h| h.id))
    }
}
