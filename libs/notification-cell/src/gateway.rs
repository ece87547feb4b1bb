use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::SmsReceipt;

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<SmsReceipt, NotificationError>;
}

/// Writes outgoing messages to the log instead of delivering them.
pub struct MockSmsGateway {
    sender: String,
}

impl MockSmsGateway {
    pub fn new(sender: impl Into<String>) -> Self {
        Self { sender: sender.into() }
    }
}

#[async_trait]
impl SmsGateway for MockSmsGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<SmsReceipt, NotificationError> {
        info!("[MOCK SMS] From: {} To: {}", self.sender, phone);
        info!("[MOCK SMS] Message: {}", message);

        Ok(SmsReceipt {
            message_id: format!("mock-{}", Uuid::new_v4().simple()),
            phone: phone.to_string(),
            status: "sent".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_gateway_always_succeeds() {
        let receipt = MockSmsGateway::new("DENTAL")
            .send("05551112233", "Merhaba")
            .await
            .unwrap();

        assert!(receipt.message_id.starts_with("mock-"));
        assert_eq!(receipt.phone, "05551112233");
        assert_eq!(receipt.status, "sent");
    }
}
