//! Matching & alert dispatch for critical requests.
//!
//! When a critical request comes into existence the dispatcher finds the
//! eligible donors, notifies the top five, and reports the full candidate
//! count for operational visibility. It never retries and never waits for
//! a donor to respond; the request stays pending until someone marks it
//! fulfilled.

use std::sync::Arc;

use shared::{
    BloodRequest, Donor, MatchQuery, NotificationChannel, NotificationInstruction,
};
use tracing::info;

use crate::domain::donor_service::DonorService;
use crate::domain::errors::DomainResult;
use crate::domain::notifications::NotificationSink;

/// How many of the matched donors actually get notified.
const ALERT_FANOUT: usize = 5;

#[derive(Clone)]
pub struct MatchingService {
    donors: DonorService,
    sink: Arc<dyn NotificationSink>,
}

impl MatchingService {
    pub fn new(donors: DonorService, sink: Arc<dyn NotificationSink>) -> Self {
        Self { donors, sink }
    }

    /// Eligible donors for a request, proximity-ranked when coordinates
    /// are available.
    pub async fn find_matches(&self, query: &MatchQuery) -> DomainResult<Vec<Donor>> {
        self.donors.find_matches(query).await
    }

    /// Notify the best candidates for a critical request. Returns the
    /// produced instructions; delivery itself is the sink's problem.
    pub async fn dispatch_critical(
        &self,
        request: &BloodRequest,
    ) -> DomainResult<Vec<NotificationInstruction>> {
        let matches = self
            .donors
            .find_matches(&MatchQuery {
                blood_type: request.blood_type,
                latitude: None,
                longitude: None,
            })
            .await?;

        // The full candidate count is reported regardless of how many
        // donors are actually notified.
        info!(
            "found {} potential donors for critical request {}",
            matches.len(),
            request.id
        );

        let mut instructions = Vec::new();
        for donor in matches.iter().take(ALERT_FANOUT) {
            let payload = alert_payload(request);

            instructions.push(NotificationInstruction {
                channel: NotificationChannel::Message,
                destination: donor.phone.clone(),
                payload: payload.clone(),
            });
            if let Some(user_id) = donor.user_id {
                instructions.push(NotificationInstruction {
                    channel: NotificationChannel::Push,
                    destination: user_id.to_string(),
                    payload,
                });
            }
        }

        for instruction in &instructions {
            self.sink.deliver(instruction).await;
        }

        Ok(instructions)
    }
}

fn alert_payload(request: &BloodRequest) -> String {
    let hospital = request
        .hospital_name
        .clone()
        .or_else(|| request.hospital_id.map(|id| format!("hospital #{}", id)))
        .unwrap_or_else(|| "an unregistered facility".to_string());
    let patient = request.patient_name.as_deref().unwrap_or("unknown");
    let contact = request.contact_phone.as_deref().unwrap_or("n/a");

    format!(
        "CRITICAL BLOOD ALERT: {} needed at {} URGENTLY. Patient: {}. Contact: {}",
        request.blood_type, hospital, patient, contact
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shared::{BloodType, CreateDonorRequest};
    use std::sync::Mutex;

    use crate::domain::donor_service::DonorService;
    use crate::storage::sqlite::{DbConnection, DonorRepository};

    /// Sink that records every delivered instruction.
    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<NotificationInstruction>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, instruction: &NotificationInstruction) {
            self.delivered.lock().unwrap().push(instruction.clone());
        }
    }

    async fn setup() -> (MatchingService, Arc<RecordingSink>, DonorService) {
        let db = DbConnection::init_test().await.unwrap();
        let donors = DonorService::new(Arc::new(DonorRepository::new(db)));
        let sink = Arc::new(RecordingSink::default());
        let service = MatchingService::new(donors.clone(), sink.clone());
        (service, sink, donors)
    }

    fn critical_request(blood_type: BloodType) -> BloodRequest {
        BloodRequest {
            id: 11,
            hospital_id: Some(3),
            patient_name: Some("S. Rao".to_string()),
            age: None,
            gender: None,
            hemoglobin: None,
            platelets: None,
            blood_type,
            units: 2,
            component_type: shared::ComponentType::WholeBlood,
            urgency: shared::Urgency::Critical,
            is_critical: true,
            diagnosis: None,
            past_reaction: None,
            allergies: None,
            doctor_name: None,
            status: shared::RequestStatus::Pending,
            donor_id: None,
            contact_phone: Some("+91 90000 00000".to_string()),
            notes: None,
            created_at: shared::now_rfc3339(),
            fulfilled_at: None,
            hospital_name: Some("City Hospital".to_string()),
            hospital_city: Some("Pune".to_string()),
            hospital_phone: None,
        }
    }

    async fn register_donor(donors: &DonorService, name: &str, user_id: Option<i64>) {
        donors
            .create(CreateDonorRequest {
                user_id,
                name: name.to_string(),
                blood_type: Some("B-".to_string()),
                phone: format!("+91 555 {}", name.len()),
                city: "Pune".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dispatch_notifies_at_most_five_donors() {
        let (service, sink, donors) = setup().await;
        for i in 0..7 {
            register_donor(&donors, &format!("donor-{}", i), None).await;
        }

        let instructions = service
            .dispatch_critical(&critical_request(BloodType::BNegative))
            .await
            .unwrap();

        // One message instruction per notified donor, no push without a
        // linked user identity.
        assert_eq!(instructions.len(), 5);
        assert!(instructions
            .iter()
            .all(|i| i.channel == NotificationChannel::Message));
        assert_eq!(sink.delivered.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn linked_donors_get_push_and_message() {
        let (service, sink, donors) = setup().await;
        register_donor(&donors, "linked", Some(42)).await;

        let instructions = service
            .dispatch_critical(&critical_request(BloodType::BNegative))
            .await
            .unwrap();

        assert_eq!(instructions.len(), 2);
        let channels: Vec<NotificationChannel> =
            instructions.iter().map(|i| i.channel).collect();
        assert!(channels.contains(&NotificationChannel::Message));
        assert!(channels.contains(&NotificationChannel::Push));

        let push = instructions
            .iter()
            .find(|i| i.channel == NotificationChannel::Push)
            .unwrap();
        assert_eq!(push.destination, "42");
        assert_eq!(sink.delivered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn alert_payload_names_type_hospital_patient_and_contact() {
        let (service, _sink, donors) = setup().await;
        register_donor(&donors, "solo", None).await;

        let instructions = service
            .dispatch_critical(&critical_request(BloodType::BNegative))
            .await
            .unwrap();

        let payload = &instructions[0].payload;
        assert!(payload.contains("B-"));
        assert!(payload.contains("City Hospital"));
        assert!(payload.contains("S. Rao"));
        assert!(payload.contains("+91 90000 00000"));
    }

    #[tokio::test]
    async fn dispatch_with_no_matches_produces_no_instructions() {
        let (service, sink, _donors) = setup().await;

        let instructions = service
            .dispatch_critical(&critical_request(BloodType::AbPositive))
            .await
            .unwrap();

        assert!(instructions.is_empty());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }
}
