// libs/scheduling-cell/src/services/overlap.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::{AppointmentCandidate, AppointmentRecord, ACTIVE_STATUSES};
use crate::store::AppointmentReader;

/// Half-open interval intersection. Touching intervals (one ends exactly
/// where the other starts) do not overlap.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

pub fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), SchedulingError> {
    if start >= end {
        return Err(SchedulingError::InvalidRange { start, end });
    }
    Ok(())
}

/// First appointment in `existing` that would block `candidate`.
pub fn find_conflict<'a>(
    candidate: &AppointmentCandidate,
    existing: &'a [AppointmentRecord],
) -> Option<&'a AppointmentRecord> {
    existing.iter().find(|appointment| {
        appointment.dentist_id == candidate.dentist_id
            && appointment.status.is_active()
            && Some(appointment.id) != candidate.exclude_id
            && intervals_overlap(
                appointment.start_time,
                appointment.end_time,
                candidate.start_time,
                candidate.end_time,
            )
    })
}

/// Range check followed by the conflict scan, over already-fetched rows.
pub fn validate_candidate(
    candidate: &AppointmentCandidate,
    existing: &[AppointmentRecord],
) -> Result<(), SchedulingError> {
    check_range(candidate.start_time, candidate.end_time)?;

    match find_conflict(candidate, existing) {
        Some(conflict) => Err(SchedulingError::SchedulingConflict {
            existing: Box::new(conflict.clone()),
        }),
        None => Ok(()),
    }
}

pub struct OverlapValidator {
    reader: Arc<dyn AppointmentReader>,
}

impl OverlapValidator {
    pub fn new(reader: Arc<dyn AppointmentReader>) -> Self {
        Self { reader }
    }

    /// Checks a proposed appointment against the dentist's active calendar.
    /// Invalid ranges are rejected before the store is queried.
    pub async fn validate(&self, candidate: &AppointmentCandidate) -> Result<(), SchedulingError> {
        check_range(candidate.start_time, candidate.end_time)?;

        debug!("Validating appointment for dentist {} from {} to {}",
               candidate.dentist_id, candidate.start_time, candidate.end_time);

        let existing = self.reader.find_conflicts(
            candidate.dentist_id,
            candidate.start_time,
            candidate.end_time,
            &ACTIVE_STATUSES,
            candidate.exclude_id,
        ).await?;

        let result = validate_candidate(candidate, &existing);
        if let Err(SchedulingError::SchedulingConflict { existing }) = &result {
            warn!("Conflict detected for dentist {} with appointment {}",
                  candidate.dentist_id, existing.id);
        }

        result
    }
}
