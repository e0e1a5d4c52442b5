//! Blood request domain model: creation defaulting and the explicit
//! state-machine transition applied by partial updates.

use shared::{
    BloodRequest, BloodType, ComponentType, CreateBloodRequestRequest, RequestStatus, Urgency,
    UpdateBloodRequestRequest,
};

use crate::domain::errors::{DomainError, DomainResult};

/// A validated, fully defaulted request ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBloodRequest {
    pub hospital_id: Option<i64>,
    pub patient_name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub hemoglobin: Option<f64>,
    pub platelets: Option<f64>,
    pub blood_type: BloodType,
    pub units: i64,
    pub component_type: ComponentType,
    pub urgency: Urgency,
    pub is_critical: bool,
    pub diagnosis: Option<String>,
    pub past_reaction: Option<String>,
    pub allergies: Option<String>,
    pub doctor_name: Option<String>,
    pub status: RequestStatus,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl NewBloodRequest {
    /// Validate a creation payload and apply the documented defaults.
    ///
    /// The blood type is the only required field; a missing or unrecognized
    /// code is a validation failure, reported before anything is written.
    pub fn from_payload(
        payload: CreateBloodRequestRequest,
        hospital_id: Option<i64>,
        now: &str,
    ) -> DomainResult<Self> {
        let blood_type = payload
            .blood_type
            .as_deref()
            .ok_or_else(|| DomainError::validation("Blood type is required"))?
            .parse::<BloodType>()
            .map_err(DomainError::Validation)?;

        Ok(Self {
            hospital_id,
            patient_name: payload.patient_name,
            age: payload.age,
            gender: payload.gender,
            hemoglobin: payload.hemoglobin,
            platelets: payload.platelets,
            blood_type,
            units: payload.units.unwrap_or(1),
            component_type: payload.component_type.unwrap_or_default(),
            urgency: payload.urgency.unwrap_or_default(),
            is_critical: payload.is_critical.unwrap_or(false),
            diagnosis: payload.diagnosis,
            past_reaction: payload.past_reaction,
            allergies: payload.allergies,
            doctor_name: payload.doctor_name,
            status: RequestStatus::Pending,
            contact_phone: payload.contact_phone,
            notes: payload.notes,
            created_at: now.to_string(),
        })
    }
}

/// Outcome of applying a partial update, used by the lifecycle engine to
/// decide which events to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub previous_status: RequestStatus,
    pub new_status: RequestStatus,
}

impl AppliedUpdate {
    pub fn fulfilled_now(&self) -> bool {
        self.new_status == RequestStatus::Fulfilled
            && self.previous_status != RequestStatus::Fulfilled
    }
}

/// Apply a partial update to a loaded record.
///
/// Fields absent from the payload keep their stored value. A `status` field
/// drives the state machine: illegal transitions (anything out of a
/// terminal state) are rejected before any field is touched, and the
/// transition to `fulfilled` stamps `fulfilled_at` with `now` as part of
/// the same application.
pub fn apply_update(
    record: &mut BloodRequest,
    patch: &UpdateBloodRequestRequest,
    now: &str,
) -> DomainResult<AppliedUpdate> {
    let previous_status = record.status;

    let parsed_blood_type = match patch.blood_type.as_deref() {
        Some(code) => Some(code.parse::<BloodType>().map_err(DomainError::Validation)?),
        None => None,
    };

    if let Some(next) = patch.status {
        if !previous_status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "request is {} and cannot transition to {}",
                previous_status, next
            )));
        }
    }

    if let Some(v) = patch.hospital_id {
        record.hospital_id = Some(v);
    }
    if let Some(v) = &patch.patient_name {
        record.patient_name = Some(v.clone());
    }
    if let Some(v) = patch.age {
        record.age = Some(v);
    }
    if let Some(v) = &patch.gender {
        record.gender = Some(v.clone());
    }
    if let Some(v) = patch.hemoglobin {
        record.hemoglobin = Some(v);
    }
    if let Some(v) = patch.platelets {
        record.platelets = Some(v);
    }
    if let Some(bt) = parsed_blood_type {
        record.blood_type = bt;
    }
    if let Some(v) = patch.units {
        record.units = v;
    }
    if let Some(v) = patch.component_type {
        record.component_type = v;
    }
    if let Some(v) = patch.urgency {
        record.urgency = v;
    }
    if let Some(v) = patch.is_critical {
        record.is_critical = v;
    }
    if let Some(v) = &patch.diagnosis {
        record.diagnosis = Some(v.clone());
    }
    if let Some(v) = &patch.past_reaction {
        record.past_reaction = Some(v.clone());
    }
    if let Some(v) = &patch.allergies {
        record.allergies = Some(v.clone());
    }
    if let Some(v) = &patch.doctor_name {
        record.doctor_name = Some(v.clone());
    }
    if let Some(v) = patch.donor_id {
        record.donor_id = Some(v);
    }
    if let Some(v) = &patch.contact_phone {
        record.contact_phone = Some(v.clone());
    }
    if let Some(v) = &patch.notes {
        record.notes = Some(v.clone());
    }
    if let Some(next) = patch.status {
        record.status = next;
        if next == RequestStatus::Fulfilled && previous_status != RequestStatus::Fulfilled {
            record.fulfilled_at = Some(now.to_string());
        }
    }

    Ok(AppliedUpdate {
        previous_status,
        new_status: record.status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_record() -> BloodRequest {
        BloodRequest {
            id: 42,
            hospital_id: Some(7),
            patient_name: Some("R. Mehta".to_string()),
            age: Some(31),
            gender: None,
            hemoglobin: Some(9.2),
            platelets: None,
            blood_type: BloodType::APositive,
            units: 2,
            component_type: ComponentType::PackedRbc,
            urgency: Urgency::Urgent,
            is_critical: false,
            diagnosis: None,
            past_reaction: None,
            allergies: None,
            doctor_name: None,
            status: RequestStatus::Pending,
            donor_id: None,
            contact_phone: Some("+91 98000 00000".to_string()),
            notes: None,
            created_at: "2026-03-01T08:00:00+00:00".to_string(),
            fulfilled_at: None,
            hospital_name: Some("City Hospital".to_string()),
            hospital_city: Some("Pune".to_string()),
            hospital_phone: None,
        }
    }

    #[test]
    fn create_payload_applies_defaults() {
        let new = NewBloodRequest::from_payload(
            CreateBloodRequestRequest {
                blood_type: Some("O-".to_string()),
                ..Default::default()
            },
            None,
            "2026-03-01T08:00:00+00:00",
        )
        .unwrap();

        assert_eq!(new.blood_type, BloodType::ONegative);
        assert_eq!(new.units, 1);
        assert_eq!(new.component_type, ComponentType::WholeBlood);
        assert_eq!(new.urgency, Urgency::Normal);
        assert_eq!(new.status, RequestStatus::Pending);
        assert!(!new.is_critical);
    }

    #[test]
    fn create_payload_requires_recognized_blood_type() {
        let missing = NewBloodRequest::from_payload(
            CreateBloodRequestRequest::default(),
            None,
            "2026-03-01T08:00:00+00:00",
        );
        assert!(matches!(
            missing,
            Err(DomainError::Validation(msg)) if msg == "Blood type is required"
        ));

        let bogus = NewBloodRequest::from_payload(
            CreateBloodRequestRequest {
                blood_type: Some("Q+".to_string()),
                ..Default::default()
            },
            None,
            "2026-03-01T08:00:00+00:00",
        );
        assert!(matches!(bogus, Err(DomainError::Validation(_))));
    }

    #[test]
    fn update_leaves_unnamed_fields_untouched() {
        let mut record = pending_record();
        let before = record.clone();
        let patch = UpdateBloodRequestRequest {
            notes: Some("crossmatch done".to_string()),
            ..Default::default()
        };

        apply_update(&mut record, &patch, "2026-03-02T08:00:00+00:00").unwrap();

        assert_eq!(record.notes.as_deref(), Some("crossmatch done"));
        assert_eq!(record.patient_name, before.patient_name);
        assert_eq!(record.units, before.units);
        assert_eq!(record.status, before.status);
        assert_eq!(record.fulfilled_at, None);
    }

    #[test]
    fn fulfillment_stamps_timestamp_in_same_application() {
        let mut record = pending_record();
        let patch = UpdateBloodRequestRequest {
            status: Some(RequestStatus::Fulfilled),
            donor_id: Some(9),
            ..Default::default()
        };

        let applied = apply_update(&mut record, &patch, "2026-03-02T10:30:00+00:00").unwrap();

        assert!(applied.fulfilled_now());
        assert_eq!(record.status, RequestStatus::Fulfilled);
        assert_eq!(record.donor_id, Some(9));
        assert_eq!(record.fulfilled_at.as_deref(), Some("2026-03-02T10:30:00+00:00"));
    }

    #[test]
    fn cancellation_leaves_fulfilled_at_null() {
        let mut record = pending_record();
        let patch = UpdateBloodRequestRequest {
            status: Some(RequestStatus::Cancelled),
            ..Default::default()
        };

        apply_update(&mut record, &patch, "2026-03-02T10:30:00+00:00").unwrap();

        assert_eq!(record.status, RequestStatus::Cancelled);
        assert_eq!(record.fulfilled_at, None);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut record = pending_record();
        record.status = RequestStatus::Fulfilled;
        record.fulfilled_at = Some("2026-03-02T10:30:00+00:00".to_string());

        let patch = UpdateBloodRequestRequest {
            status: Some(RequestStatus::Cancelled),
            ..Default::default()
        };
        let err = apply_update(&mut record, &patch, "2026-03-03T00:00:00+00:00").unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
        // The record must come through the rejected transition unscathed.
        assert_eq!(record.status, RequestStatus::Fulfilled);
        assert_eq!(record.fulfilled_at.as_deref(), Some("2026-03-02T10:30:00+00:00"));
    }

    #[test]
    fn invalid_blood_type_rejected_before_any_field_changes() {
        let mut record = pending_record();
        let before = record.clone();
        let patch = UpdateBloodRequestRequest {
            blood_type: Some("XX".to_string()),
            notes: Some("should not land".to_string()),
            ..Default::default()
        };

        let err = apply_update(&mut record, &patch, "2026-03-03T00:00:00+00:00").unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(record, before);
    }
}
