use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::error::NotificationError;
use crate::gateway::{MockSmsGateway, SmsGateway};
use crate::messages;
use crate::models::{AppointmentNotice, NotificationKind, SmsReceipt};

/// Sends appointment SMS through an injected gateway. Patients who have not
/// consented to SMS are skipped.
#[derive(Clone)]
pub struct NotificationService {
    gateway: Arc<dyn SmsGateway>,
}

impl NotificationService {
    pub fn new(gateway: Arc<dyn SmsGateway>) -> Self {
        Self { gateway }
    }

    /// Service backed by the logging gateway.
    pub fn mock(config: &AppConfig) -> Self {
        Self::new(Arc::new(MockSmsGateway::new(config.sms_sender.clone())))
    }

    /// Returns `Ok(None)` when the patient opted out.
    pub async fn notify(
        &self,
        kind: NotificationKind,
        notice: &AppointmentNotice,
    ) -> Result<Option<SmsReceipt>, NotificationError> {
        if !notice.sms_consent {
            debug!("Skipping {} SMS for appointment {}: no consent", kind, notice.appointment_id);
            return Ok(None);
        }

        let phone = notice.patient_phone.trim();
        if phone.is_empty() {
            return Err(NotificationError::MissingPhone);
        }

        let body = messages::render(kind, notice);
        let receipt = self.gateway.send(phone, &body).await?;

        info!("Sent {} SMS for appointment {} ({})", kind, notice.appointment_id, receipt.message_id);
        Ok(Some(receipt))
    }

    pub async fn send_reminder(&self, notice: &AppointmentNotice) -> Result<Option<SmsReceipt>, NotificationError> {
        self.notify(NotificationKind::Reminder, notice).await
    }

    /// Sends in the background. Failures are logged and never reach the caller.
    pub fn dispatch(&self, kind: NotificationKind, notice: AppointmentNotice) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.notify(kind, &notice).await {
                warn!("Failed to send {} SMS for appointment {}: {}", kind, notice.appointment_id, e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    fn notice(consent: bool) -> AppointmentNotice {
        AppointmentNotice {
            appointment_id: Uuid::new_v4(),
            patient_name: "Mehmet Demir".to_string(),
            patient_phone: "05551112233".to_string(),
            sms_consent: consent,
            dentist_name: "Ayşe Yılmaz".to_string(),
            start_time: FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 6, 10, 11, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_opted_out_patient_is_skipped() {
        let service = NotificationService::new(Arc::new(MockSmsGateway::new("DENTAL")));
        assert_eq!(service.send_reminder(&notice(false)).await, Ok(None));
    }

    #[tokio::test]
    async fn test_missing_phone_is_an_error() {
        let service = NotificationService::new(Arc::new(MockSmsGateway::new("DENTAL")));
        let mut without_phone = notice(true);
        without_phone.patient_phone = " ".to_string();

        assert_eq!(
            service.notify(NotificationKind::Confirmation, &without_phone).await,
            Err(NotificationError::MissingPhone)
        );
    }
}
