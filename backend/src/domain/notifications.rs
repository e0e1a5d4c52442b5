//! Notification collaborator boundary.
//!
//! The matching dispatcher decides who to notify and with what payload; the
//! sink owns delivery and any retry policy. The default sink just logs,
//! which is the whole delivery story until a real SMS/push integration is
//! plugged in.

use async_trait::async_trait;
use shared::{NotificationChannel, NotificationInstruction};
use tracing::info;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, instruction: &NotificationInstruction);
}

/// Sink that writes every instruction to the log.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn deliver(&self, instruction: &NotificationInstruction) {
        match instruction.channel {
            NotificationChannel::Push => {
                info!("[push] to user {}: {}", instruction.destination, instruction.payload);
            }
            NotificationChannel::Message => {
                info!("[message] to {}: {}", instruction.destination, instruction.payload);
            }
        }
    }
}
