//! Domain event broadcasting.
//!
//! Every successful lifecycle transition produces one named event carrying
//! the full updated request record. Delivery is fire-and-forget over a
//! `tokio::sync::broadcast` channel: subscribers that lag or disappear are
//! the transport collaborator's problem, never the lifecycle engine's.

use shared::{BloodRequest, DomainEvent, EventKind};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

/// Fan-out point for lifecycle events. Cloning shares the channel.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Emit one event. A send error only means nobody is listening, which
    /// is fine for a fire-and-forget broadcast.
    pub fn emit(&self, kind: EventKind, request: &BloodRequest) {
        debug!("emitting {} for request {}", kind.as_str(), request.id);
        let _ = self.tx.send(DomainEvent {
            kind,
            request: request.clone(),
        });
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BloodType, ComponentType, RequestStatus, Urgency};

    fn sample_request() -> BloodRequest {
        BloodRequest {
            id: 1,
            hospital_id: None,
            patient_name: None,
            age: None,
            gender: None,
            hemoglobin: None,
            platelets: None,
            blood_type: BloodType::OPositive,
            units: 1,
            component_type: ComponentType::WholeBlood,
            urgency: Urgency::Normal,
            is_critical: false,
            diagnosis: None,
            past_reaction: None,
            allergies: None,
            doctor_name: None,
            status: RequestStatus::Pending,
            donor_id: None,
            contact_phone: None,
            notes: None,
            created_at: shared::now_rfc3339(),
            fulfilled_at: None,
            hospital_name: None,
            hospital_city: None,
            hospital_phone: None,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_events_in_order() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        let request = sample_request();
        broadcaster.emit(EventKind::RequestCreated, &request);
        broadcaster.emit(EventKind::CriticalAlert, &request);

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::RequestCreated);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::CriticalAlert);
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let broadcaster = EventBroadcaster::new();
        broadcaster.emit(EventKind::RequestUpdated, &sample_request());
    }
}
