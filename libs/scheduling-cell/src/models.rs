// libs/scheduling-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::SchedulingError;

// ==============================================================================
// APPOINTMENT STATUS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

/// Statuses that hold a dentist's calendar. Everything else stays queryable
/// but never blocks a slot.
pub const ACTIVE_STATUSES: [AppointmentStatus; 2] = [
    AppointmentStatus::Scheduled,
    AppointmentStatus::Confirmed,
];

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn is_active(&self) -> bool {
        ACTIVE_STATUSES.contains(self)
    }

    /// Label shown to clinic staff.
    pub fn display_name(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Planlandı",
            AppointmentStatus::Confirmed => "Onaylandı",
            AppointmentStatus::Completed => "Tamamlandı",
            AppointmentStatus::Cancelled => "İptal Edildi",
            AppointmentStatus::NoShow => "Gelmedi",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ]
        .into_iter()
        .find(|status| status.as_str() == value)
        .ok_or_else(|| format!("unknown appointment status '{}'", value))
    }
}

// ==============================================================================
// READ MODELS
// ==============================================================================

/// One appointment as seen by the scheduling engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub dentist_name: String,
    pub patient_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub treatment_type: Option<String>,
}

/// A proposed appointment time for one dentist. `exclude_id` is set when an
/// existing appointment is being moved so it does not collide with itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentCandidate {
    pub dentist_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub exclude_id: Option<Uuid>,
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotBooking {
    pub appointment_id: Uuid,
    pub dentist_id: Uuid,
    pub dentist_name: String,
    pub patient_name: String,
    pub treatment_type: String,
}

/// A fixed-size window of the working day. Times are the clinic's wall clock
/// and serialize as `HH:MM`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Slot {
    #[serde(serialize_with = "serialize_clock")]
    pub start_time: DateTime<FixedOffset>,
    #[serde(serialize_with = "serialize_clock")]
    pub end_time: DateTime<FixedOffset>,
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<SlotBooking>,
}

impl Slot {
    pub fn start_clock(&self) -> String {
        self.start_time.format("%H:%M").to_string()
    }

    pub fn end_clock(&self) -> String {
        self.end_time.format("%H:%M").to_string()
    }
}

fn serialize_clock<S>(time: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.format("%H:%M").to_string())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AvailabilityReport {
    pub date: String,
    pub working_hours: WorkingHours,
    pub slot_duration_minutes: i64,
    pub total_slots: usize,
    pub available_count: usize,
    pub booked_count: usize,
    pub available_slots: Vec<Slot>,
    pub booked_slots: Vec<Slot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    /// Raw value; blank means every dentist.
    pub dentist_id: Option<String>,
}

// ==============================================================================
// CONFIGURATION
// ==============================================================================

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Shape of the bookable day.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingConfig {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub slot_duration: Duration,
    pub utc_offset: FixedOffset,
}

impl SchedulingConfig {
    pub fn new(
        work_start: NaiveTime,
        work_end: NaiveTime,
        slot_duration_minutes: i64,
        utc_offset_minutes: i32,
    ) -> Result<Self, SchedulingError> {
        if work_start >= work_end {
            return Err(SchedulingError::InvalidWorkingHours(format!(
                "work start {} must be before work end {}",
                work_start.format("%H:%M"),
                work_end.format("%H:%M")
            )));
        }

        if slot_duration_minutes <= 0 || slot_duration_minutes > MINUTES_PER_DAY {
            return Err(SchedulingError::InvalidWorkingHours(format!(
                "slot duration must be between 1 and {} minutes, got {}",
                MINUTES_PER_DAY,
                slot_duration_minutes
            )));
        }

        let utc_offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| SchedulingError::InvalidWorkingHours(format!(
                "UTC offset of {} minutes is out of range",
                utc_offset_minutes
            )))?;

        Ok(Self {
            work_start,
            work_end,
            slot_duration: Duration::minutes(slot_duration_minutes),
            utc_offset,
        })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, SchedulingError> {
        Self::new(
            config.work_start,
            config.work_end,
            config.slot_duration_minutes,
            config.clinic_utc_offset_minutes,
        )
    }

    pub fn slot_duration_minutes(&self) -> i64 {
        self.slot_duration.num_minutes()
    }

    pub fn working_hours(&self) -> WorkingHours {
        WorkingHours {
            start: self.work_start.format("%H:%M").to_string(),
            end: self.work_end.format("%H:%M").to_string(),
        }
    }
}
