use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    Reminder,
    Cancellation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Confirmation => "confirmation",
            NotificationKind::Reminder => "reminder",
            NotificationKind::Cancellation => "cancellation",
        };
        f.write_str(label)
    }
}

/// What a patient message needs to know about an appointment. `start_time`
/// is already in the clinic's wall clock.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentNotice {
    pub appointment_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub sms_consent: bool,
    pub dentist_name: String,
    pub start_time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmsReceipt {
    pub message_id: String,
    pub phone: String,
    pub status: String,
}
