// libs/appointment-cell/src/error.rs
use thiserror::Error;

use scheduling_cell::SchedulingError;
use shared_models::error::AppError;

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// The store's overlap constraint refused the write, but the competing
    /// row could not be read back.
    #[error("Another appointment already exists in this time range")]
    SlotTaken,

    #[error("Reminder could not be sent: {0}")]
    Notification(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Scheduling(e) => e.into(),
            AppointmentError::SlotTaken => AppError::ValidationError(err.to_string()),
            AppointmentError::Notification(_) => AppError::Internal(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
