// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentListParams, AppointmentView, CreateAppointmentRequest, DashboardStats,
    UpdateAppointmentRequest,
};
use crate::services::{AppointmentService, DashboardStatsService};

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<AppointmentListParams>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let query = params.into_query()?;
    let service = AppointmentService::new(&state)?;
    let appointments = service.list_appointments(query, auth.token()).await?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentView>), AppError> {
    debug!("User {} booking appointment for patient {}", user.id, request.patient);

    let service = AppointmentService::new(&state)?;
    let appointment = service.create_appointment(request, auth.token()).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<AppointmentView>, AppError> {
    let service = AppointmentService::new(&state)?;
    let appointment = service.get_appointment(appointment_id, auth.token()).await?;

    Ok(Json(appointment))
}

/// PATCH: only the supplied fields change.
#[axum::debug_handler]
pub async fn patch_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentView>, AppError> {
    debug!("User {} updating appointment {}", user.id, appointment_id);

    let service = AppointmentService::new(&state)?;
    let appointment = service.update_appointment(appointment_id, request, auth.token()).await?;

    Ok(Json(appointment))
}

/// PUT: the full booking is replaced.
#[axum::debug_handler]
pub async fn replace_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<AppointmentView>, AppError> {
    debug!("User {} replacing appointment {}", user.id, appointment_id);

    let service = AppointmentService::new(&state)?;
    let appointment = service.update_appointment(appointment_id, request.into(), auth.token()).await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<StatusCode, AppError> {
    let service = AppointmentService::new(&state)?;
    service.delete_appointment(appointment_id, auth.token()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn send_reminder(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&state)?;
    let receipt = service.send_reminder(appointment_id, auth.token()).await?;

    Ok(Json(match receipt {
        Some(receipt) => json!({
            "sent": true,
            "message_id": receipt.message_id,
            "phone": receipt.phone
        }),
        None => json!({
            "sent": false,
            "reason": "Patient has not consented to SMS"
        }),
    }))
}

#[axum::debug_handler]
pub async fn dashboard_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<DashboardStats>, AppError> {
    let service = DashboardStatsService::new(&state)?;
    let stats = service.dashboard_stats(auth.token()).await?;

    Ok(Json(stats))
}
