// libs/appointment-cell/src/services/stats.rs
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::debug;

use scheduling_cell::store::{encode_time, local_day_bounds};
use scheduling_cell::{SchedulingConfig, ACTIVE_STATUSES};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::AppointmentError;
use crate::models::{AppointmentStatus, DashboardStats};

pub struct DashboardStatsService {
    supabase: Arc<SupabaseClient>,
    utc_offset: FixedOffset,
}

impl DashboardStatsService {
    pub fn new(config: &AppConfig) -> Result<Self, AppointmentError> {
        Ok(Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            utc_offset: SchedulingConfig::from_app_config(config)?.utc_offset,
        })
    }

    /// Clinic-local calendar day right now.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    async fn count_rows(&self, path: &str, auth_token: &str) -> Result<usize, AppointmentError> {
        let total = self.supabase
            .count(path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(total as usize)
    }

    pub async fn stats_for(&self, day: NaiveDate, auth_token: &str) -> Result<DashboardStats, AppointmentError> {
        debug!("Computing dashboard stats for {}", day);

        let total_clinics = self.count_rows("/rest/v1/clinics?select=id", auth_token).await?;
        let total_dentists = self.count_rows("/rest/v1/dentists?select=id&is_active=eq.true", auth_token).await?;
        let total_patients = self.count_rows("/rest/v1/patients?select=id", auth_token).await?;

        let (day_start, next_day) = local_day_bounds(day, self.utc_offset)?;
        let today = format!(
            "/rest/v1/appointments?select=id&start_time=gte.{}&start_time=lt.{}",
            encode_time(&day_start),
            encode_time(&next_day)
        );
        let active = ACTIVE_STATUSES
            .iter()
            .map(AppointmentStatus::as_str)
            .collect::<Vec<_>>()
            .join(",");

        Ok(DashboardStats {
            total_clinics,
            total_dentists,
            total_patients,
            today_appointments: self.count_rows(&today, auth_token).await?,
            today_completed: self.count_rows(&format!("{}&status=eq.{}", today, AppointmentStatus::Completed), auth_token).await?,
            today_pending: self.count_rows(&format!("{}&status=in.({})", today, active), auth_token).await?,
            today_cancelled: self.count_rows(&format!("{}&status=eq.{}", today, AppointmentStatus::Cancelled), auth_token).await?,
        })
    }

    pub async fn dashboard_stats(&self, auth_token: &str) -> Result<DashboardStats, AppointmentError> {
        self.stats_for(self.today(), auth_token).await
    }
}
