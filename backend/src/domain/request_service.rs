//! Request lifecycle engine.
//!
//! Owns the blood request state machine (`pending` → `fulfilled` |
//! `cancelled`), the urgency-based retrieval orderings, statistics, and
//! the event emission tied to every successful transition. Status writes
//! are guarded by a compare-and-swap on the stored status, so two racing
//! fulfill calls cannot both win; the loser gets a conflict.

use std::sync::Arc;

use shared::{
    now_rfc3339, BloodRequest, CreateBloodRequestRequest, EventKind, RequestFilters, RequestStats,
    RequestStatus, UpdateBloodRequestRequest, Urgency,
};
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::events::EventBroadcaster;
use crate::domain::matching_service::MatchingService;
use crate::domain::models::request::{self, NewBloodRequest};
use crate::domain::principal::{Principal, ProfileResolver};
use crate::storage::RequestStorage;

#[derive(Clone)]
pub struct RequestService {
    requests: Arc<dyn RequestStorage>,
    profiles: Arc<dyn ProfileResolver>,
    matching: MatchingService,
    events: EventBroadcaster,
}

impl RequestService {
    pub fn new(
        requests: Arc<dyn RequestStorage>,
        profiles: Arc<dyn ProfileResolver>,
        matching: MatchingService,
        events: EventBroadcaster,
    ) -> Self {
        Self {
            requests,
            profiles,
            matching,
            events,
        }
    }

    /// Create a request. A hospital principal is attributed as the creator;
    /// anonymous emergency submissions pass no principal. Critical requests
    /// additionally fire a critical-alert event and the donor alert
    /// dispatch, neither of which can fail the creation.
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        payload: CreateBloodRequestRequest,
    ) -> DomainResult<BloodRequest> {
        let hospital_id = match principal {
            Some(p) => self.profiles.hospital_profile(p).await?,
            None => None,
        };

        let new_request = NewBloodRequest::from_payload(payload, hospital_id, &now_rfc3339())?;
        let id = self.requests.insert_request(&new_request).await?;

        let record = self
            .requests
            .get_request(id)
            .await?
            .ok_or_else(|| DomainError::Storage(anyhow::anyhow!("request {} missing after insert", id)))?;

        info!(
            "created blood request {} ({}, {})",
            record.id, record.blood_type, record.urgency
        );

        self.events.emit(EventKind::RequestCreated, &record);
        if record.urgency == Urgency::Critical {
            self.events.emit(EventKind::CriticalAlert, &record);
            if let Err(e) = self.matching.dispatch_critical(&record).await {
                warn!("critical alert dispatch failed for request {}: {}", record.id, e);
            }
        }

        Ok(record)
    }

    /// One request with its hospital display fields, or `None`.
    pub async fn get_by_id(&self, id: i64) -> DomainResult<Option<BloodRequest>> {
        Ok(self.requests.get_request(id).await?)
    }

    /// Requests under conjunctive optional filters. Always ordered by
    /// urgency rank (critical first) then creation time descending.
    pub async fn get_all(&self, filters: RequestFilters) -> DomainResult<Vec<BloodRequest>> {
        Ok(self.requests.list_requests(&filters).await?)
    }

    pub async fn get_pending(&self) -> DomainResult<Vec<BloodRequest>> {
        self.get_all(RequestFilters {
            status: Some(RequestStatus::Pending),
            ..Default::default()
        })
        .await
    }

    /// Pending critical requests, oldest first: the longest-unresolved case
    /// is the most urgent one to resolve.
    pub async fn get_critical(&self) -> DomainResult<Vec<BloodRequest>> {
        Ok(self.requests.list_critical_pending().await?)
    }

    /// Fulfillment history credited to one donor, most recent first.
    pub async fn get_history(&self, donor_id: i64) -> DomainResult<Vec<BloodRequest>> {
        Ok(self.requests.list_fulfilled_by_donor(donor_id).await?)
    }

    /// History for the acting principal's own donor profile.
    pub async fn get_my_history(&self, principal: &Principal) -> DomainResult<Vec<BloodRequest>> {
        let donor_id = self
            .profiles
            .donor_profile(principal)
            .await?
            .ok_or_else(|| DomainError::not_found("Donor profile not found"))?;
        self.get_history(donor_id).await
    }

    /// Partially update a request. Only fields present in the payload are
    /// applied; a `status` field drives the state machine, stamping
    /// `fulfilled_at` atomically with the transition to fulfilled. An empty
    /// payload is a fetch-and-return no-op.
    pub async fn update(
        &self,
        id: i64,
        patch: UpdateBloodRequestRequest,
    ) -> DomainResult<BloodRequest> {
        if patch.is_empty() {
            return self
                .requests
                .get_request(id)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("Request {} not found", id)));
        }

        let mut record = self
            .requests
            .get_request(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Request {} not found", id)))?;

        let applied = request::apply_update(&mut record, &patch, &now_rfc3339())?;

        let written = self
            .requests
            .update_request_guarded(&record, applied.previous_status)
            .await?;
        if !written {
            // The guard failed: either the row is gone or its status moved
            // under us.
            return match self.requests.get_request(id).await? {
                None => Err(DomainError::not_found(format!("Request {} not found", id))),
                Some(_) => Err(DomainError::conflict(format!(
                    "Request {} was modified concurrently",
                    id
                ))),
            };
        }

        let updated = self
            .requests
            .get_request(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Request {} not found", id)))?;

        if applied.fulfilled_now() {
            info!("request {} fulfilled", id);
            self.events.emit(EventKind::RequestFulfilled, &updated);
        }
        self.events.emit(EventKind::RequestUpdated, &updated);

        Ok(updated)
    }

    /// Mark a pending request fulfilled. When the acting principal is a
    /// donor, their own donor profile is credited; otherwise an explicit
    /// donor reference is accepted as-is.
    pub async fn fulfill(
        &self,
        id: i64,
        principal: Option<&Principal>,
        explicit_donor: Option<i64>,
    ) -> DomainResult<BloodRequest> {
        let mut donor_id = explicit_donor;
        if let Some(p) = principal {
            if let Some(own_profile) = self.profiles.donor_profile(p).await? {
                donor_id = Some(own_profile);
            }
        }

        self.update(
            id,
            UpdateBloodRequestRequest {
                status: Some(RequestStatus::Fulfilled),
                donor_id,
                ..Default::default()
            },
        )
        .await
    }

    /// Cancel a pending request. No field beyond the status changes.
    pub async fn cancel(&self, id: i64) -> DomainResult<BloodRequest> {
        self.update(
            id,
            UpdateBloodRequestRequest {
                status: Some(RequestStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
    }

    /// Hard, irreversible removal of one request row.
    pub async fn delete(&self, id: i64) -> DomainResult<()> {
        if !self.requests.delete_request(id).await? {
            return Err(DomainError::not_found(format!("Request {} not found", id)));
        }
        info!("deleted request {}", id);
        Ok(())
    }

    pub async fn get_stats(&self) -> DomainResult<RequestStats> {
        Ok(self.requests.request_stats().await?)
    }
}
