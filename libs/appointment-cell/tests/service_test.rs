// libs/appointment-cell/tests/service_test.rs
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};

use appointment_cell::models::{
    AppointmentListQuery, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use appointment_cell::services::{AppointmentService, DashboardStatsService};
use appointment_cell::AppointmentError;
use notification_cell::{NotificationError, NotificationService, SmsGateway, SmsReceipt};
use scheduling_cell::SchedulingError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

const TOKEN: &str = "user-token";

struct FailingGateway;

#[async_trait]
impl SmsGateway for FailingGateway {
    async fn send(&self, _phone: &str, _message: &str) -> Result<SmsReceipt, NotificationError> {
        Err(NotificationError::Gateway("operator unavailable".to_string()))
    }
}

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl SmsGateway for RecordingGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<SmsReceipt, NotificationError> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(SmsReceipt {
            message_id: "rec-42".to_string(),
            phone: phone.to_string(),
            status: "sent".to_string(),
        })
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, hour, minute, 0).unwrap()
}

fn service_for(server: &MockServer) -> AppointmentService {
    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    AppointmentService::new(&config).unwrap()
}

fn create_request(dentist: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        dentist,
        patient: Uuid::new_v4(),
        start_time: start,
        end_time: end,
        status: None,
        treatment_type: Some("Dolgu".to_string()),
        treatment_cost: Some(1500.0),
        notes: None,
    }
}

fn row(id: Uuid, dentist: Uuid, start: &str, end: &str, status: &str) -> serde_json::Value {
    MockSupabaseResponses::appointment_row(id, dentist, Uuid::new_v4(), start, end, status)
}

#[tokio::test]
async fn test_create_persists_when_calendar_is_free() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();
    let created_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("dentist_id", format!("eq.{}", dentist)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            row(created_id, dentist, "2024-06-10T10:00:00+00:00", "2024-06-10T10:30:00+00:00", "scheduled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let view = service_for(&server)
        .create_appointment(create_request(dentist, at(10, 0), at(10, 30)), TOKEN)
        .await
        .unwrap();

    assert_eq!(view.id, created_id);
    assert_eq!(view.status, AppointmentStatus::Scheduled);
    assert_eq!(view.status_display, "Planlandı");
    assert_eq!(view.dentist_name, "Ayşe Yılmaz");
}

#[tokio::test]
async fn test_create_rejects_overlap_without_writing() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();
    let existing_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(existing_id, dentist, "2024-06-10T10:15:00+00:00", "2024-06-10T10:45:00+00:00", "confirmed")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_appointment(create_request(dentist, at(10, 0), at(10, 30)), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        AppointmentError::Scheduling(SchedulingError::SchedulingConflict { ref existing }) if existing.id == existing_id
    );
}

#[tokio::test]
async fn test_create_rejects_empty_range_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_appointment(create_request(Uuid::new_v4(), at(10, 0), at(10, 0)), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::Scheduling(SchedulingError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_store_exclusion_violation_reports_competing_booking() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();
    let winner_id = Uuid::new_v4();

    // First check sees a free calendar; the re-read after the rejected write
    // sees the booking that got there first.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(winner_id, dentist, "2024-06-10T10:00:00+00:00", "2024-06-10T10:30:00+00:00", "scheduled")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("conflicting key value violates exclusion constraint", "23P01"),
        ))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_appointment(create_request(dentist, at(10, 0), at(10, 30)), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        AppointmentError::Scheduling(SchedulingError::SchedulingConflict { ref existing }) if existing.id == winner_id
    );
}

#[tokio::test]
async fn test_store_exclusion_violation_without_visible_winner_is_slot_taken() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            MockSupabaseResponses::error_response("conflicting key value violates exclusion constraint", "23P01"),
        ))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .create_appointment(create_request(Uuid::new_v4(), at(10, 0), at(10, 30)), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::SlotTaken);
}

#[tokio::test]
async fn test_failing_sms_gateway_does_not_fail_create() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            row(Uuid::new_v4(), dentist, "2024-06-10T13:00:00+00:00", "2024-06-10T13:30:00+00:00", "scheduled")
        ])))
        .mount(&server)
        .await;

    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    let notifications = NotificationService::new(Arc::new(FailingGateway));
    let service = AppointmentService::with_notifications(&config, notifications).unwrap();

    let result = service
        .create_appointment(create_request(dentist, at(13, 0), at(13, 30)), TOKEN)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_excludes_itself_from_conflict_check() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();
    let stored = row(appointment_id, dentist, "2024-06-10T14:00:00+00:00", "2024-06-10T14:30:00+00:00", "scheduled");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored.clone()])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("neq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut confirmed = stored.clone();
    confirmed["status"] = json!("confirmed");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([confirmed])))
        .expect(1)
        .mount(&server)
        .await;

    let changes = UpdateAppointmentRequest {
        status: Some(AppointmentStatus::Confirmed),
        ..Default::default()
    };
    let view = service_for(&server)
        .update_appointment(appointment_id, changes, TOKEN)
        .await
        .unwrap();

    assert_eq!(view.status, AppointmentStatus::Confirmed);
    assert_eq!(view.start_time, at(14, 0));
}

async fn mount_update(server: &MockServer, appointment_id: Uuid, stored: &serde_json::Value, updated: &serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("neq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(server)
        .await;
}

fn recording_service(server: &MockServer) -> (AppointmentService, Arc<RecordingGateway>) {
    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    let gateway = Arc::new(RecordingGateway::default());
    let service = AppointmentService::with_notifications(
        &config,
        NotificationService::new(gateway.clone()),
    ).unwrap();

    (service, gateway)
}

/// Lets background SMS tasks spawned on this runtime run to completion.
async fn drain_dispatched() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_cancelling_sends_cancellation_sms() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let stored = row(appointment_id, Uuid::new_v4(), "2024-06-10T14:00:00+00:00", "2024-06-10T14:30:00+00:00", "confirmed");
    let mut cancelled = stored.clone();
    cancelled["status"] = json!("cancelled");
    mount_update(&server, appointment_id, &stored, &cancelled).await;

    let (service, gateway) = recording_service(&server);
    let changes = UpdateAppointmentRequest {
        status: Some(AppointmentStatus::Cancelled),
        ..Default::default()
    };
    service.update_appointment(appointment_id, changes, TOKEN).await.unwrap();
    drain_dispatched().await;

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("10.06.2024 14:00 tarihli randevunuz iptal edilmiştir"));
}

#[tokio::test]
async fn test_moving_active_appointment_sends_fresh_confirmation() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let dentist = Uuid::new_v4();
    let stored = row(appointment_id, dentist, "2024-06-10T14:00:00+00:00", "2024-06-10T14:30:00+00:00", "scheduled");
    let moved = row(appointment_id, dentist, "2024-06-10T15:00:00+00:00", "2024-06-10T15:30:00+00:00", "scheduled");
    mount_update(&server, appointment_id, &stored, &moved).await;

    let (service, gateway) = recording_service(&server);
    let changes = UpdateAppointmentRequest {
        start_time: Some(at(15, 0)),
        end_time: Some(at(15, 30)),
        ..Default::default()
    };
    service.update_appointment(appointment_id, changes, TOKEN).await.unwrap();
    drain_dispatched().await;

    let sent = gateway.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("randevunuz oluşturulmuştur. Tarih: 10.06.2024 15:00"));
}

#[tokio::test]
async fn test_status_change_without_move_sends_nothing() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let stored = row(appointment_id, Uuid::new_v4(), "2024-06-10T14:00:00+00:00", "2024-06-10T14:30:00+00:00", "scheduled");
    let mut completed = stored.clone();
    completed["status"] = json!("completed");
    mount_update(&server, appointment_id, &stored, &completed).await;

    let (service, gateway) = recording_service(&server);
    let changes = UpdateAppointmentRequest {
        status: Some(AppointmentStatus::Completed),
        ..Default::default()
    };
    service.update_appointment(appointment_id, changes, TOKEN).await.unwrap();
    drain_dispatched().await;

    assert!(gateway.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_of_missing_appointment_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .update_appointment(Uuid::new_v4(), UpdateAppointmentRequest::default(), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::NotFound);
}

#[tokio::test]
async fn test_list_filters_by_local_day_and_status() {
    let server = MockServer::start().await;
    let dentist = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("dentist_id", format!("eq.{}", dentist)))
        .and(query_param("start_time", "gte.2024-06-10T00:00:00+00:00"))
        .and(query_param("start_time", "lt.2024-06-11T00:00:00+00:00"))
        .and(query_param("status", "eq.cancelled"))
        .and(query_param("order", "start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(Uuid::new_v4(), dentist, "2024-06-10T09:00:00+00:00", "2024-06-10T09:30:00+00:00", "cancelled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = AppointmentListQuery {
        dentist: Some(dentist),
        date: Some("2024-06-10".to_string()),
        status: Some(AppointmentStatus::Cancelled),
    };
    let views = service_for(&server).list_appointments(query, TOKEN).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].status_display, "İptal Edildi");
}

#[tokio::test]
async fn test_list_rejects_malformed_date() {
    let server = MockServer::start().await;

    let query = AppointmentListQuery {
        date: Some("June 10".to_string()),
        ..Default::default()
    };
    let err = service_for(&server).list_appointments(query, TOKEN).await.unwrap_err();

    assert_matches!(err, AppointmentError::Scheduling(SchedulingError::InvalidDate(_)));
}

#[tokio::test]
async fn test_delete_of_missing_appointment_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .delete_appointment(Uuid::new_v4(), TOKEN)
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::NotFound);
}

#[tokio::test]
async fn test_reminder_is_sent_in_clinic_time() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row(appointment_id, Uuid::new_v4(), "2024-06-10T08:00:00+00:00", "2024-06-10T08:30:00+00:00", "confirmed")
        ])))
        .mount(&server)
        .await;

    let mut config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    config.clinic_utc_offset_minutes = 180;

    let gateway = Arc::new(RecordingGateway::default());
    let service = AppointmentService::with_notifications(
        &config,
        NotificationService::new(gateway.clone()),
    ).unwrap();

    let receipt = service.send_reminder(appointment_id, TOKEN).await.unwrap();

    assert_eq!(receipt.unwrap().message_id, "rec-42");
    let sent = gateway.sent.lock().unwrap();
    assert!(sent[0].contains("10.06.2024 tarihinde saat 11:00'de Dr. Ayşe Yılmaz"));
}

async fn mount_count(server: &MockServer, table: &str, status: Option<&str>, total: u64) {
    let mock = Mock::given(method("HEAD"))
        .and(path(format!("/rest/v1/{}", table)))
        .and(header("Prefer", "count=exact"));
    let mock = match status {
        Some(status) => mock.and(query_param("status", status)),
        None => mock.and(query_param_is_missing("status")),
    };

    mock.respond_with(ResponseTemplate::new(200).insert_header("Content-Range", format!("0-0/{}", total)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_dashboard_counts_today_by_status() {
    let server = MockServer::start().await;

    mount_count(&server, "clinics", None, 1).await;
    mount_count(&server, "dentists", None, 2).await;
    mount_count(&server, "patients", None, 1500).await;
    mount_count(&server, "appointments", None, 5).await;
    mount_count(&server, "appointments", Some("eq.completed"), 1).await;
    mount_count(&server, "appointments", Some("in.(scheduled,confirmed)"), 2).await;
    mount_count(&server, "appointments", Some("eq.cancelled"), 1).await;

    let config = TestConfig::with_supabase_url(server.uri()).to_app_config();
    let stats = DashboardStatsService::new(&config)
        .unwrap()
        .stats_for(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), TOKEN)
        .await
        .unwrap();

    assert_eq!(stats.total_clinics, 1);
    assert_eq!(stats.total_dentists, 2);
    assert_eq!(stats.total_patients, 1500);
    assert_eq!(stats.today_appointments, 5);
    assert_eq!(stats.today_completed, 1);
    assert_eq!(stats.today_pending, 2);
    assert_eq!(stats.today_cancelled, 1);
}
