use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{Patient, CreatePatientRequest, UpdatePatientRequest, PatientListParams, PatientError};
use crate::services::PatientService;

fn to_app_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<PatientError>() {
        Some(PatientError::NotFound) => AppError::NotFound(PatientError::NotFound.to_string()),
        Some(PatientError::ValidationError(msg)) => AppError::ValidationError(msg.clone()),
        Some(PatientError::DatabaseError(msg)) => AppError::Database(msg.clone()),
        None => AppError::Database(err.to_string()),
    }
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<PatientListParams>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let query = params.into_query()?;
    let service = PatientService::new(&config);

    let patients = service.list_patients(query, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(patients))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    debug!("User {} registering patient", user.id);

    let service = PatientService::new(&config);

    let patient = service.create_patient(request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.get_patient(patient_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Patient>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.update_patient(patient_id, request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(patient))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    debug!("User {} deleting patient {}", user.id, patient_id);

    let service = PatientService::new(&config);

    service.delete_patient(patient_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}
