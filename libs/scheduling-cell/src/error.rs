use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_models::error::AppError;

use crate::models::AppointmentRecord;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulingError {
    #[error("Invalid date '{0}'. Use the YYYY-MM-DD format.")]
    InvalidDate(String),

    #[error("Start time must be before end time ({start} >= {end})")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Another appointment already exists in this time range (appointment {})", existing.id)]
    SchedulingConflict { existing: Box<AppointmentRecord> },

    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Appointment store error: {0}")]
    Store(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::InvalidDate(_)
            | SchedulingError::InvalidRange { .. }
            | SchedulingError::SchedulingConflict { .. } => AppError::ValidationError(err.to_string()),
            SchedulingError::InvalidWorkingHours(_) => AppError::Internal(err.to_string()),
            SchedulingError::Store(msg) => AppError::Database(msg),
        }
    }
}
