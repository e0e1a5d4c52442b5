use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The eight recognized ABO/Rh blood type combinations.
///
/// Matching is exact: the platform does not expand a request to
/// ABO/Rh-compatible substitutes (O- is never treated as a universal donor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    /// All recognized types, in the order inventory summaries report them.
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A+" => Ok(BloodType::APositive),
            "A-" => Ok(BloodType::ANegative),
            "B+" => Ok(BloodType::BPositive),
            "B-" => Ok(BloodType::BNegative),
            "AB+" => Ok(BloodType::AbPositive),
            "AB-" => Ok(BloodType::AbNegative),
            "O+" => Ok(BloodType::OPositive),
            "O-" => Ok(BloodType::ONegative),
            other => Err(format!("unrecognized blood type: {}", other)),
        }
    }
}

/// Urgency of a blood request, governing retrieval ordering priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Urgent,
    #[default]
    Normal,
}

impl Urgency {
    /// Ordering rank: critical requests sort before urgent, urgent before
    /// normal. Lower rank means higher priority.
    pub fn rank(&self) -> i64 {
        match self {
            Urgency::Critical => 1,
            Urgency::Urgent => 2,
            Urgency::Normal => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::Urgent => "urgent",
            Urgency::Normal => "normal",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Urgency::Critical),
            "urgent" => Ok(Urgency::Urgent),
            "normal" => Ok(Urgency::Normal),
            other => Err(format!("unrecognized urgency: {}", other)),
        }
    }
}

/// Blood component requested by a hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ComponentType {
    #[serde(rename = "Whole Blood")]
    #[default]
    WholeBlood,
    #[serde(rename = "Packed RBC")]
    PackedRbc,
    #[serde(rename = "Platelets")]
    Platelets,
    #[serde(rename = "Plasma")]
    Plasma,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::WholeBlood => "Whole Blood",
            ComponentType::PackedRbc => "Packed RBC",
            ComponentType::Platelets => "Platelets",
            ComponentType::Plasma => "Plasma",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Whole Blood" => Ok(ComponentType::WholeBlood),
            "Packed RBC" => Ok(ComponentType::PackedRbc),
            "Platelets" => Ok(ComponentType::Platelets),
            "Plasma" => Ok(ComponentType::Plasma),
            other => Err(format!("unrecognized component type: {}", other)),
        }
    }
}

/// Lifecycle state of a blood request.
///
/// `pending` is the only non-terminal state. A request leaves `pending`
/// exactly once, to `fulfilled` or to `cancelled`, and never transitions
/// again after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Fulfilled,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Fulfilled | RequestStatus::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Restating `pending` on a pending request is permitted (it has no side
    /// effect); restating or leaving a terminal state is not.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        match (self, next) {
            (RequestStatus::Pending, _) => true,
            (RequestStatus::Fulfilled, _) | (RequestStatus::Cancelled, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(format!("unrecognized request status: {}", other)),
        }
    }
}

/// Role of an authenticated principal, as handed over by the auth
/// collaborator. The backend performs only equality checks on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Donor,
    Hospital,
    BloodBank,
    Admin,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "hospital" => Ok(Role::Hospital),
            "blood_bank" => Ok(Role::BloodBank),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unrecognized role: {}", other)),
        }
    }
}

/// A blood request as returned by the API, including the display fields
/// joined from the creating hospital (when one exists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: i64,
    pub hospital_id: Option<i64>,
    pub patient_name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    /// Hemoglobin reading in g/dL, when supplied.
    pub hemoglobin: Option<f64>,
    /// Platelet count reading, when supplied.
    pub platelets: Option<f64>,
    pub blood_type: BloodType,
    pub units: i64,
    pub component_type: ComponentType,
    pub urgency: Urgency,
    /// Clinical immediate-attention flag, independent of `urgency`.
    pub is_critical: bool,
    pub diagnosis: Option<String>,
    pub past_reaction: Option<String>,
    pub allergies: Option<String>,
    pub doctor_name: Option<String>,
    pub status: RequestStatus,
    /// Donor credited with fulfilling the request; set only once fulfilled,
    /// and may stay empty when fulfillment did not identify a donor.
    pub donor_id: Option<i64>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp; non-null exactly when `status` is `fulfilled`.
    pub fulfilled_at: Option<String>,
    pub hospital_name: Option<String>,
    pub hospital_city: Option<String>,
    pub hospital_phone: Option<String>,
}

/// Payload for creating a blood request.
///
/// `blood_type` stays a raw string here so the lifecycle engine can report
/// a missing or unrecognized code as a validation failure instead of a
/// deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBloodRequestRequest {
    pub patient_name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub hemoglobin: Option<f64>,
    pub platelets: Option<f64>,
    pub blood_type: Option<String>,
    pub units: Option<i64>,
    pub component_type: Option<ComponentType>,
    pub urgency: Option<Urgency>,
    pub is_critical: Option<bool>,
    pub diagnosis: Option<String>,
    pub past_reaction: Option<String>,
    pub allergies: Option<String>,
    pub doctor_name: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

/// Partial update payload for a blood request. Only fields present in the
/// JSON body are applied; everything else keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateBloodRequestRequest {
    pub hospital_id: Option<i64>,
    pub patient_name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub hemoglobin: Option<f64>,
    pub platelets: Option<f64>,
    pub blood_type: Option<String>,
    pub units: Option<i64>,
    pub component_type: Option<ComponentType>,
    pub urgency: Option<Urgency>,
    pub is_critical: Option<bool>,
    pub diagnosis: Option<String>,
    pub past_reaction: Option<String>,
    pub allergies: Option<String>,
    pub doctor_name: Option<String>,
    pub status: Option<RequestStatus>,
    pub donor_id: Option<i64>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBloodRequestRequest {
    /// True when the payload names no field at all, making the update a
    /// fetch-and-return no-op.
    pub fn is_empty(&self) -> bool {
        self == &UpdateBloodRequestRequest::default()
    }
}

/// Conjunctive, optional filters for listing blood requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFilters {
    pub status: Option<RequestStatus>,
    pub urgency: Option<Urgency>,
    pub blood_type: Option<BloodType>,
    pub hospital_id: Option<i64>,
}

/// Aggregated request counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total: i64,
    pub pending: i64,
    pub fulfilled: i64,
    /// Pending requests with critical urgency.
    pub critical: i64,
    /// Pending request count per blood type; types with no pending request
    /// are absent and imply zero.
    pub by_blood_type: HashMap<BloodType, i64>,
}

/// A registered donor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub blood_type: BloodType,
    pub phone: String,
    pub email: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub available: bool,
    /// Calendar date of the last recorded donation (YYYY-MM-DD).
    pub last_donation: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateDonorRequest {
    pub user_id: Option<i64>,
    pub name: String,
    pub blood_type: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub available: Option<bool>,
    pub last_donation: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateDonorRequest {
    pub name: Option<String>,
    pub blood_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub available: Option<bool>,
    pub last_donation: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonorFilters {
    pub blood_type: Option<BloodType>,
    /// Substring match against the donor's city.
    pub city: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorStats {
    pub total: i64,
    pub available: i64,
    /// Available-donor count per blood type.
    pub by_type: HashMap<BloodType, i64>,
}

/// Donor match query: exact blood type, optionally proximity-ranked around
/// the supplied coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub blood_type: BloodType,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A hospital profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: i64,
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateHospitalRequest {
    pub user_id: Option<i64>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub emergency_contact: Option<String>,
}

/// A blood bank profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodBank {
    pub id: i64,
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBloodBankRequest {
    pub user_id: Option<i64>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operating_hours: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateBloodBankRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operating_hours: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankFilters {
    /// Substring match against the bank's city.
    pub city: Option<String>,
    /// Substring match against name or address.
    pub search: Option<String>,
}

/// A blood bank together with its per-type aggregate inventory rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodBankWithInventory {
    pub bank: BloodBank,
    pub inventory: Vec<InventoryEntry>,
}

/// One aggregate inventory row: the derived running total of batch units
/// for a (bank, blood type) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub blood_type: BloodType,
    pub units: i64,
    pub updated_at: String,
}

/// Cross-bank inventory total for one blood type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalInventoryEntry {
    pub blood_type: BloodType,
    pub total_units: i64,
}

/// A bank holding stock of a requested type, as returned by the
/// best-stocked-first lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockedBank {
    pub bank: BloodBank,
    pub units: i64,
}

/// A discrete lot of blood units with its own expiry, held by one bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub blood_bank_id: i64,
    pub blood_type: BloodType,
    pub units: i64,
    /// Calendar date (YYYY-MM-DD).
    pub expiry_date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddBatchRequest {
    pub blood_type: Option<String>,
    pub units: i64,
    pub expiry_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateBatchRequest {
    pub units: Option<i64>,
    pub expiry_date: Option<String>,
}

/// Manual inventory correction payload. Writing through this path bypasses
/// the batch ledger; the next batch mutation for the same (bank, type) pair
/// recomputes the aggregate and overwrites the correction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateInventoryRequest {
    pub blood_type: Option<String>,
    pub units: i64,
}

/// Delivery channel for one notification instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    /// In-app push, addressed by the donor's linked user id.
    Push,
    /// Text message, addressed by the donor's phone number.
    Message,
}

/// One delivery instruction handed to the notification collaborator, which
/// owns actual sending and any retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationInstruction {
    pub channel: NotificationChannel,
    pub destination: String,
    pub payload: String,
}

/// Named domain events broadcast on lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "request-created")]
    RequestCreated,
    #[serde(rename = "request-updated")]
    RequestUpdated,
    #[serde(rename = "request-fulfilled")]
    RequestFulfilled,
    #[serde(rename = "critical-alert")]
    CriticalAlert,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RequestCreated => "request-created",
            EventKind::RequestUpdated => "request-updated",
            EventKind::RequestFulfilled => "request-fulfilled",
            EventKind::CriticalAlert => "critical-alert",
        }
    }
}

/// A lifecycle event carrying the full updated request record, broadcast
/// fire-and-forget to external subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub request: BloodRequest,
}

/// Current UTC time as the RFC 3339 string stored in every timestamp column.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_type_round_trips_through_str() {
        for bt in BloodType::ALL {
            assert_eq!(bt.as_str().parse::<BloodType>().unwrap(), bt);
        }
        assert!("C+".parse::<BloodType>().is_err());
    }

    #[test]
    fn blood_type_serializes_as_code() {
        let json = serde_json::to_string(&BloodType::AbNegative).unwrap();
        assert_eq!(json, "\"AB-\"");
        let parsed: BloodType = serde_json::from_str("\"O-\"").unwrap();
        assert_eq!(parsed, BloodType::ONegative);
    }

    #[test]
    fn urgency_ranks_critical_first() {
        assert!(Urgency::Critical.rank() < Urgency::Urgent.rank());
        assert!(Urgency::Urgent.rank() < Urgency::Normal.rank());
    }

    #[test]
    fn status_transitions_only_leave_pending() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Fulfilled));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Cancelled));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Cancelled));
        assert!(!RequestStatus::Fulfilled.can_transition_to(RequestStatus::Fulfilled));
        assert!(!RequestStatus::Cancelled.can_transition_to(RequestStatus::Pending));
    }

    #[test]
    fn empty_update_payload_detected() {
        assert!(UpdateBloodRequestRequest::default().is_empty());
        let patch = UpdateBloodRequestRequest {
            notes: Some("call ward 3".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn event_kind_names_match_wire_format() {
        assert_eq!(
            serde_json::to_string(&EventKind::CriticalAlert).unwrap(),
            "\"critical-alert\""
        );
        assert_eq!(EventKind::RequestCreated.as_str(), "request-created");
    }
}
