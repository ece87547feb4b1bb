// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::query::optional_param;

pub use scheduling_cell::AppointmentStatus;

/// Columns of an appointment plus the dentist and patient details the views
/// and SMS messages need.
pub const APPOINTMENT_VIEW_SELECT: &str =
    "*,dentist:dentists(name),patient:patients(name,phone,sms_consent)";

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    #[serde(rename = "dentist_id")]
    pub dentist: Uuid,
    #[serde(rename = "patient_id")]
    pub patient: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub treatment_type: Option<String>,
    pub treatment_cost: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DentistSummary {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientContact {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_sms_consent")]
    pub sms_consent: bool,
}

fn default_sms_consent() -> bool {
    true
}

/// Store row selected with `APPOINTMENT_VIEW_SELECT`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub dentist: Option<DentistSummary>,
    pub patient: Option<PatientContact>,
}

/// Appointment as returned by the API.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentView {
    pub id: Uuid,
    pub dentist: Uuid,
    pub dentist_name: String,
    pub patient: Uuid,
    pub patient_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub status_display: String,
    pub treatment_type: String,
    pub treatment_cost: Option<f64>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&AppointmentRow> for AppointmentView {
    fn from(row: &AppointmentRow) -> Self {
        let a = &row.appointment;
        Self {
            id: a.id,
            dentist: a.dentist,
            dentist_name: row.dentist.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
            patient: a.patient,
            patient_name: row.patient.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
            start_time: a.start_time,
            end_time: a.end_time,
            status: a.status,
            status_display: a.status.display_name().to_string(),
            treatment_type: a.treatment_type.clone().unwrap_or_default(),
            treatment_cost: a.treatment_cost,
            notes: a.notes.clone(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub dentist: Uuid,
    pub patient: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: Option<AppointmentStatus>,
    pub treatment_type: Option<String>,
    pub treatment_cost: Option<f64>,
    pub notes: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub dentist: Option<Uuid>,
    pub patient: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub treatment_type: Option<String>,
    pub treatment_cost: Option<f64>,
    pub notes: Option<String>,
}

impl From<CreateAppointmentRequest> for UpdateAppointmentRequest {
    fn from(request: CreateAppointmentRequest) -> Self {
        Self {
            dentist: Some(request.dentist),
            patient: Some(request.patient),
            start_time: Some(request.start_time),
            end_time: Some(request.end_time),
            status: request.status,
            treatment_type: request.treatment_type,
            treatment_cost: request.treatment_cost,
            notes: request.notes,
        }
    }
}

/// Query string of `GET /appointments` as sent; blank values mean no filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListParams {
    pub dentist: Option<String>,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl AppointmentListParams {
    pub fn into_query(self) -> Result<AppointmentListQuery, AppError> {
        Ok(AppointmentListQuery {
            dentist: optional_param("dentist", self.dentist.as_deref())?,
            date: self.date.filter(|d| !d.trim().is_empty()),
            status: optional_param("status", self.status.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentListQuery {
    pub dentist: Option<Uuid>,
    /// Clinic-local day, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// DASHBOARD
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_clinics: usize,
    pub total_dentists: usize,
    pub total_patients: usize,
    pub today_appointments: usize,
    pub today_completed: usize,
    pub today_pending: usize,
    pub today_cancelled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row_json() -> serde_json::Value {
        json!({
            "id": "6f1c1d52-8a4e-4a53-9e63-0d3c2f1b7a10",
            "dentist_id": "b0d4c8a2-1f3e-4c5a-9b7d-2e6f8a1c3d5e",
            "patient_id": "c3e5a7b9-2d4f-4a6c-8e0a-1b3d5f7a9c2e",
            "start_time": "2024-06-10T11:00:00+00:00",
            "end_time": "2024-06-10T11:30:00+00:00",
            "status": "confirmed",
            "treatment_type": null,
            "treatment_cost": 750.5,
            "notes": "",
            "created_at": "2024-06-01T08:00:00+00:00",
            "updated_at": "2024-06-01T08:00:00+00:00",
            "dentist": { "name": "Ayşe Yılmaz" },
            "patient": { "name": "Mehmet Demir", "phone": "05551112233", "sms_consent": false }
        })
    }

    #[test]
    fn test_row_with_embedded_resources_builds_view() {
        let row: AppointmentRow = serde_json::from_value(row_json()).unwrap();
        let view = AppointmentView::from(&row);

        assert_eq!(view.dentist_name, "Ayşe Yılmaz");
        assert_eq!(view.patient_name, "Mehmet Demir");
        assert_eq!(view.status_display, "Onaylandı");
        assert_eq!(view.treatment_type, "");
        assert_eq!(view.treatment_cost, Some(750.5));
        assert!(!row.patient.unwrap().sms_consent);
    }

    #[test]
    fn test_view_uses_short_foreign_key_names() {
        let row: AppointmentRow = serde_json::from_value(row_json()).unwrap();
        let body = serde_json::to_value(AppointmentView::from(&row)).unwrap();

        assert_eq!(body["dentist"], "b0d4c8a2-1f3e-4c5a-9b7d-2e6f8a1c3d5e");
        assert_eq!(body["patient"], "c3e5a7b9-2d4f-4a6c-8e0a-1b3d5f7a9c2e");
        assert_eq!(body["status"], "confirmed");
    }

    #[test]
    fn test_blank_list_params_are_ignored() {
        let params: AppointmentListParams =
            serde_json::from_value(json!({ "dentist": "", "date": " ", "status": "" })).unwrap();
        let query = params.into_query().unwrap();

        assert_eq!(query.dentist, None);
        assert_eq!(query.date, None);
        assert_eq!(query.status, None);
    }

    #[test]
    fn test_unknown_status_filter_is_bad_request() {
        let params = AppointmentListParams { status: Some("pending".to_string()), ..Default::default() };

        assert!(matches!(params.into_query(), Err(AppError::BadRequest(_))));
    }
}
