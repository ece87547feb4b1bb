// libs/appointment-cell/src/services/appointment.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::{AppointmentNotice, NotificationKind, NotificationService, SmsReceipt};
use scheduling_cell::services::planner::parse_date;
use scheduling_cell::store::{encode_time, local_day_bounds};
use scheduling_cell::{
    AppointmentCandidate, OverlapValidator, SchedulingConfig, SchedulingError,
    SupabaseAppointmentReader,
};
use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::error::AppointmentError;
use crate::models::{
    AppointmentListQuery, AppointmentRow, AppointmentStatus, AppointmentView,
    CreateAppointmentRequest, UpdateAppointmentRequest, APPOINTMENT_VIEW_SELECT,
};

pub struct AppointmentService {
    supabase: Arc<SupabaseClient>,
    scheduling: SchedulingConfig,
    notifications: NotificationService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Result<Self, AppointmentError> {
        Self::with_notifications(config, NotificationService::mock(config))
    }

    pub fn with_notifications(
        config: &AppConfig,
        notifications: NotificationService,
    ) -> Result<Self, AppointmentError> {
        Ok(Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            scheduling: SchedulingConfig::from_app_config(config)?,
            notifications,
        })
    }

    fn validator(&self, auth_token: &str) -> OverlapValidator {
        let reader = SupabaseAppointmentReader::new(
            Arc::clone(&self.supabase),
            auth_token,
            self.scheduling.utc_offset,
        );
        OverlapValidator::new(Arc::new(reader))
    }

    pub async fn list_appointments(
        &self,
        query: AppointmentListQuery,
        auth_token: &str,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        debug!("Listing appointments with filters: {:?}", query);

        let mut query_parts = vec![format!("select={}", APPOINTMENT_VIEW_SELECT)];

        if let Some(dentist_id) = query.dentist {
            query_parts.push(format!("dentist_id=eq.{}", dentist_id));
        }
        if let Some(date) = query.date.as_deref().filter(|d| !d.is_empty()) {
            let (day_start, next_day) = local_day_bounds(parse_date(date)?, self.scheduling.utc_offset)?;
            query_parts.push(format!("start_time=gte.{}", encode_time(&day_start)));
            query_parts.push(format!("start_time=lt.{}", encode_time(&next_day)));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }

        let path = format!("/rest/v1/appointments?{}&order=start_time.asc", query_parts.join("&"));

        let rows: Vec<AppointmentRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(rows.iter().map(AppointmentView::from).collect())
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentView, AppointmentError> {
        self.fetch_row(appointment_id, auth_token)
            .await
            .map(|row| AppointmentView::from(&row))
    }

    async fn fetch_row(&self, appointment_id: Uuid, auth_token: &str) -> Result<AppointmentRow, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select={}",
            appointment_id, APPOINTMENT_VIEW_SELECT
        );
        let rows: Vec<AppointmentRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    /// Books an appointment after checking the dentist's calendar, then sends
    /// the patient a confirmation in the background.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, AppointmentError> {
        info!("Creating appointment for patient {} with dentist {} at {}",
              request.patient, request.dentist, request.start_time);

        let candidate = AppointmentCandidate {
            dentist_id: request.dentist,
            start_time: request.start_time,
            end_time: request.end_time,
            exclude_id: None,
        };
        let validator = self.validator(auth_token);
        validator.validate(&candidate).await?;

        let now = Utc::now().to_rfc3339();
        let appointment_data = json!({
            "dentist_id": request.dentist,
            "patient_id": request.patient,
            "start_time": request.start_time.to_rfc3339(),
            "end_time": request.end_time.to_rfc3339(),
            "status": request.status.unwrap_or_default(),
            "treatment_type": request.treatment_type.unwrap_or_default(),
            "treatment_cost": request.treatment_cost,
            "notes": request.notes.unwrap_or_default(),
            "created_at": now,
            "updated_at": now
        });

        let path = format!("/rest/v1/appointments?select={}", APPOINTMENT_VIEW_SELECT);
        let result: Result<Vec<AppointmentRow>, SupabaseError> = self.supabase.request_with_headers(
            Method::POST,
            &path,
            Some(auth_token),
            Some(appointment_data),
            Some(SupabaseClient::representation_headers()),
        ).await;
        let result = match result {
            Ok(rows) => rows,
            Err(e) => return Err(self.write_failure(e, &validator, &candidate).await),
        };

        let row = result.into_iter().next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))?;

        info!("Appointment {} created", row.appointment.id);
        self.notify(NotificationKind::Confirmation, &row);

        Ok(AppointmentView::from(&row))
    }

    /// Applies `changes` over the stored appointment, re-validating the
    /// merged time range against everything but itself.
    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        changes: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.fetch_row(appointment_id, auth_token).await?.appointment;

        let candidate = AppointmentCandidate {
            dentist_id: changes.dentist.unwrap_or(current.dentist),
            start_time: changes.start_time.unwrap_or(current.start_time),
            end_time: changes.end_time.unwrap_or(current.end_time),
            exclude_id: Some(appointment_id),
        };
        let validator = self.validator(auth_token);
        validator.validate(&candidate).await?;

        let mut update_data = Map::new();
        if let Some(dentist) = changes.dentist {
            update_data.insert("dentist_id".to_string(), json!(dentist));
        }
        if let Some(patient) = changes.patient {
            update_data.insert("patient_id".to_string(), json!(patient));
        }
        if let Some(start_time) = changes.start_time {
            update_data.insert("start_time".to_string(), json!(start_time.to_rfc3339()));
        }
        if let Some(end_time) = changes.end_time {
            update_data.insert("end_time".to_string(), json!(end_time.to_rfc3339()));
        }
        if let Some(status) = changes.status {
            update_data.insert("status".to_string(), json!(status));
        }
        if let Some(treatment_type) = changes.treatment_type {
            update_data.insert("treatment_type".to_string(), json!(treatment_type));
        }
        if let Some(treatment_cost) = changes.treatment_cost {
            update_data.insert("treatment_cost".to_string(), json!(treatment_cost));
        }
        if let Some(notes) = changes.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select={}",
            appointment_id, APPOINTMENT_VIEW_SELECT
        );
        let result: Result<Vec<AppointmentRow>, SupabaseError> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(update_data)),
            Some(SupabaseClient::representation_headers()),
        ).await;
        let result = match result {
            Ok(rows) => rows,
            Err(e) => return Err(self.write_failure(e, &validator, &candidate).await),
        };

        let row = result.into_iter().next().ok_or(AppointmentError::NotFound)?;
        let updated = &row.appointment;

        let cancelled = updated.status == AppointmentStatus::Cancelled
            && current.status != AppointmentStatus::Cancelled;
        let moved = updated.start_time != current.start_time || updated.end_time != current.end_time;

        if cancelled {
            self.notify(NotificationKind::Cancellation, &row);
        } else if moved && updated.status.is_active() {
            self.notify(NotificationKind::Confirmation, &row);
        }

        info!("Appointment {} updated", appointment_id);
        Ok(AppointmentView::from(&row))
    }

    pub async fn delete_appointment(&self, appointment_id: Uuid, auth_token: &str) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let deleted: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    /// Sends the reminder immediately. `None` means the patient opted out.
    pub async fn send_reminder(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<SmsReceipt>, AppointmentError> {
        let row = self.fetch_row(appointment_id, auth_token).await?;
        let notice = self.notice_for(&row);

        match self.notifications.send_reminder(&notice).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                warn!("Reminder for appointment {} failed: {}", appointment_id, e);
                Err(AppointmentError::Notification(e.to_string()))
            }
        }
    }

    /// Turns a store rejection of a write into the caller-facing error. An
    /// overlap constraint violation means another booking won the race; it
    /// is re-read so the conflict names the competing appointment.
    async fn write_failure(
        &self,
        error: SupabaseError,
        validator: &OverlapValidator,
        candidate: &AppointmentCandidate,
    ) -> AppointmentError {
        if !error.is_constraint_violation() {
            return AppointmentError::DatabaseError(error.to_string());
        }

        warn!("Store rejected overlapping appointment for dentist {}", candidate.dentist_id);
        match validator.validate(candidate).await {
            Err(conflict @ SchedulingError::SchedulingConflict { .. }) => conflict.into(),
            _ => AppointmentError::SlotTaken,
        }
    }

    fn notice_for(&self, row: &AppointmentRow) -> AppointmentNotice {
        let patient = row.patient.as_ref();
        AppointmentNotice {
            appointment_id: row.appointment.id,
            patient_name: patient.map(|p| p.name.clone()).unwrap_or_default(),
            patient_phone: patient.map(|p| p.phone.clone()).unwrap_or_default(),
            sms_consent: patient.map_or(false, |p| p.sms_consent),
            dentist_name: row.dentist.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
            start_time: row.appointment.start_time.with_timezone(&self.scheduling.utc_offset),
        }
    }

    fn notify(&self, kind: NotificationKind, row: &AppointmentRow) {
        self.notifications.dispatch(kind, self.notice_for(row));
    }
}
