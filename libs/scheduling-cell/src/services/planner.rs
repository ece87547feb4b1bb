// libs/scheduling-cell/src/services/planner.rs
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{
    AppointmentRecord, AvailabilityReport, SchedulingConfig, Slot, SlotBooking, ACTIVE_STATUSES,
};
use crate::services::overlap::intervals_overlap;
use crate::store::AppointmentReader;

/// Shown in place of a missing treatment type.
pub const UNSPECIFIED_TREATMENT: &str = "Belirtilmemiş";

pub fn parse_date(input: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| SchedulingError::InvalidDate(input.to_string()))
}

fn local_instant(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, SchedulingError> {
    date.and_time(time)
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| SchedulingError::InvalidDate(date.to_string()))
}

/// Empty slots covering the working day of `date`. A slot starts at every
/// step before the end of the day, so the last one may run past it when the
/// duration does not divide the day evenly.
pub fn generate_slot_grid(date: NaiveDate, config: &SchedulingConfig) -> Result<Vec<Slot>, SchedulingError> {
    let day_start = local_instant(date, config.work_start, config.utc_offset)?;
    let day_end = local_instant(date, config.work_end, config.utc_offset)?;

    let mut slots = Vec::new();
    let mut cursor = day_start;
    while cursor < day_end {
        let slot_end = cursor + config.slot_duration;
        slots.push(Slot {
            start_time: cursor,
            end_time: slot_end,
            is_available: true,
            booking: None,
        });
        cursor = slot_end;
    }

    Ok(slots)
}

fn booking_for(appointment: &AppointmentRecord) -> SlotBooking {
    let treatment_type = appointment
        .treatment_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNSPECIFIED_TREATMENT)
        .to_string();

    SlotBooking {
        appointment_id: appointment.id,
        dentist_id: appointment.dentist_id,
        dentist_name: appointment.dentist_name.clone(),
        patient_name: appointment.patient_name.clone(),
        treatment_type,
    }
}

/// Classifies every grid slot of `date` against `appointments`. Each slot is
/// attributed to the first overlapping active appointment in input order.
pub fn plan_day(
    date: NaiveDate,
    dentist_id: Option<Uuid>,
    config: &SchedulingConfig,
    appointments: &[AppointmentRecord],
) -> Result<AvailabilityReport, SchedulingError> {
    let blocking: Vec<&AppointmentRecord> = appointments
        .iter()
        .filter(|a| a.status.is_active())
        .filter(|a| dentist_id.map_or(true, |id| a.dentist_id == id))
        .collect();

    let mut available_slots = Vec::new();
    let mut booked_slots = Vec::new();

    for mut slot in generate_slot_grid(date, config)? {
        let slot_start = slot.start_time.with_timezone(&Utc);
        let slot_end = slot.end_time.with_timezone(&Utc);

        let hit = blocking
            .iter()
            .find(|a| intervals_overlap(slot_start, slot_end, a.start_time, a.end_time));

        match hit {
            Some(appointment) => {
                slot.is_available = false;
                slot.booking = Some(booking_for(appointment));
                booked_slots.push(slot);
            }
            None => available_slots.push(slot),
        }
    }

    Ok(AvailabilityReport {
        date: date.format("%Y-%m-%d").to_string(),
        working_hours: config.working_hours(),
        slot_duration_minutes: config.slot_duration_minutes(),
        total_slots: available_slots.len() + booked_slots.len(),
        available_count: available_slots.len(),
        booked_count: booked_slots.len(),
        available_slots,
        booked_slots,
    })
}

pub struct AvailabilityPlanner {
    reader: Arc<dyn AppointmentReader>,
    config: SchedulingConfig,
}

impl AvailabilityPlanner {
    pub fn new(reader: Arc<dyn AppointmentReader>, config: SchedulingConfig) -> Self {
        Self { reader, config }
    }

    pub async fn plan(&self, date: &str, dentist_id: Option<Uuid>) -> Result<AvailabilityReport, SchedulingError> {
        let date = parse_date(date)?;
        debug!("Planning availability for {} (dentist {:?})", date, dentist_id);

        let appointments = self.reader
            .find_appointments(dentist_id, date, &ACTIVE_STATUSES)
            .await?;

        let report = plan_day(date, dentist_id, &self.config, &appointments)?;

        info!("Availability for {}: {} available, {} booked",
              report.date, report.available_count, report.booked_count);

        Ok(report)
    }
}
