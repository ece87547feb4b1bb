// libs/scheduling-cell/src/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::error::SchedulingError;
use crate::models::{AppointmentRecord, AppointmentStatus};

/// Columns the scheduling engine needs, with dentist and patient names pulled
/// through their foreign keys.
pub const APPOINTMENT_RECORD_SELECT: &str =
    "id,dentist_id,start_time,end_time,status,treatment_type,dentist:dentists(name),patient:patients(name)";

/// Read access to appointments. Implementations return rows in a stable order
/// (by start time for the store-backed reader).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentReader: Send + Sync {
    /// Appointments starting on `date` in the clinic's local calendar.
    async fn find_appointments(
        &self,
        dentist_id: Option<Uuid>,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<AppointmentRecord>, SchedulingError>;

    /// Appointments of `dentist_id` intersecting `[start_time, end_time)`.
    async fn find_conflicts(
        &self,
        dentist_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        statuses: &[AppointmentStatus],
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<AppointmentRecord>, SchedulingError>;
}

#[derive(Debug, Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    dentist_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: AppointmentStatus,
    treatment_type: Option<String>,
    dentist: Option<NameRef>,
    patient: Option<NameRef>,
}

impl From<AppointmentRow> for AppointmentRecord {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            dentist_id: row.dentist_id,
            dentist_name: row.dentist.map(|d| d.name).unwrap_or_default(),
            patient_name: row.patient.map(|p| p.name).unwrap_or_default(),
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            treatment_type: row.treatment_type,
        }
    }
}

/// `AppointmentReader` over the Supabase REST interface. The caller's token
/// is forwarded so row-level security scopes results to their clinic.
pub struct SupabaseAppointmentReader {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
    utc_offset: FixedOffset,
}

impl SupabaseAppointmentReader {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: &str, utc_offset: FixedOffset) -> Self {
        Self {
            supabase,
            auth_token: auth_token.to_string(),
            utc_offset,
        }
    }

    async fn fetch(&self, query_parts: Vec<String>) -> Result<Vec<AppointmentRecord>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?select={}&{}&order=start_time.asc",
            APPOINTMENT_RECORD_SELECT,
            query_parts.join("&")
        );

        let rows: Vec<AppointmentRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(&self.auth_token),
            None,
        ).await.map_err(|e| SchedulingError::Store(e.to_string()))?;

        Ok(rows.into_iter().map(AppointmentRecord::from).collect())
    }
}

/// Bounds of `date` in a clinic's wall clock, as `[start, next day start)`.
pub fn local_day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), SchedulingError> {
    let start = date
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .ok_or_else(|| SchedulingError::InvalidDate(date.to_string()))?;

    Ok((start, start + Duration::days(1)))
}

fn status_filter(statuses: &[AppointmentStatus]) -> Option<String> {
    if statuses.is_empty() {
        return None;
    }

    let list: Vec<&str> = statuses.iter().map(AppointmentStatus::as_str).collect();
    Some(format!("status=in.({})", list.join(",")))
}

/// Timestamp as a PostgREST filter value. The `+` of the offset must be escaped.
pub fn encode_time<Tz: chrono::TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    urlencoding::encode(&time.to_rfc3339()).into_owned()
}

#[async_trait]
impl AppointmentReader for SupabaseAppointmentReader {
    async fn find_appointments(
        &self,
        dentist_id: Option<Uuid>,
        date: NaiveDate,
        statuses: &[AppointmentStatus],
    ) -> Result<Vec<AppointmentRecord>, SchedulingError> {
        debug!("Fetching appointments on {} for dentist {:?}", date, dentist_id);

        let (day_start, next_day) = local_day_bounds(date, self.utc_offset)?;
        let mut query_parts = vec![
            format!("start_time=gte.{}", encode_time(&day_start)),
            format!("start_time=lt.{}", encode_time(&next_day)),
        ];

        if let Some(dentist_id) = dentist_id {
            query_parts.push(format!("dentist_id=eq.{}", dentist_id));
        }
        if let Some(filter) = status_filter(statuses) {
            query_parts.push(filter);
        }

        self.fetch(query_parts).await
    }

    async fn find_conflicts(
        &self,
        dentist_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        statuses: &[AppointmentStatus],
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<AppointmentRecord>, SchedulingError> {
        debug!("Fetching conflicts for dentist {} between {} and {}",
               dentist_id, start_time, end_time);

        let mut query_parts = vec![
            format!("dentist_id=eq.{}", dentist_id),
            format!("start_time=lt.{}", encode_time(&end_time)),
            format!("end_time=gt.{}", encode_time(&start_time)),
        ];

        if let Some(filter) = status_filter(statuses) {
            query_parts.push(filter);
        }
        if let Some(exclude_id) = exclude_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        self.fetch(query_parts).await
    }
}
