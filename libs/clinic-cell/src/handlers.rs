use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    Clinic, CreateClinicRequest, UpdateClinicRequest,
    Dentist, CreateDentistRequest, UpdateDentistRequest, DentistListParams, ClinicError,
};
use crate::services::{ClinicService, DentistService};

fn to_app_error(err: anyhow::Error) -> AppError {
    match err.downcast_ref::<ClinicError>() {
        Some(ClinicError::ClinicNotFound) => AppError::NotFound(ClinicError::ClinicNotFound.to_string()),
        Some(ClinicError::DentistNotFound) => AppError::NotFound(ClinicError::DentistNotFound.to_string()),
        Some(ClinicError::ValidationError(msg)) => AppError::ValidationError(msg.clone()),
        Some(ClinicError::DatabaseError(msg)) => AppError::Database(msg.clone()),
        None => AppError::Database(err.to_string()),
    }
}

// Clinics

#[axum::debug_handler]
pub async fn list_clinics(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Clinic>>, AppError> {
    let clinics = ClinicService::new(&config)
        .list_clinics(auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(clinics))
}

#[axum::debug_handler]
pub async fn create_clinic(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateClinicRequest>,
) -> Result<(StatusCode, Json<Clinic>), AppError> {
    let clinic = ClinicService::new(&config)
        .create_clinic(request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(clinic)))
}

#[axum::debug_handler]
pub async fn get_clinic(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Clinic>, AppError> {
    let clinic = ClinicService::new(&config)
        .get_clinic(clinic_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(clinic))
}

#[axum::debug_handler]
pub async fn update_clinic(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<UpdateClinicRequest>,
) -> Result<Json<Clinic>, AppError> {
    let clinic = ClinicService::new(&config)
        .update_clinic(clinic_id, request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(clinic))
}

#[axum::debug_handler]
pub async fn delete_clinic(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(clinic_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClinicService::new(&config)
        .delete_clinic(clinic_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// Dentists

#[axum::debug_handler]
pub async fn list_dentists(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(params): Query<DentistListParams>,
) -> Result<Json<Vec<Dentist>>, AppError> {
    let dentists = DentistService::new(&config)
        .list_dentists(params.into_query()?, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(dentists))
}

#[axum::debug_handler]
pub async fn create_dentist(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateDentistRequest>,
) -> Result<(StatusCode, Json<Dentist>), AppError> {
    let dentist = DentistService::new(&config)
        .create_dentist(request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(dentist)))
}

#[axum::debug_handler]
pub async fn get_dentist(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(dentist_id): Path<Uuid>,
) -> Result<Json<Dentist>, AppError> {
    let dentist = DentistService::new(&config)
        .get_dentist(dentist_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(dentist))
}

#[axum::debug_handler]
pub async fn update_dentist(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(dentist_id): Path<Uuid>,
    Json(request): Json<UpdateDentistRequest>,
) -> Result<Json<Dentist>, AppError> {
    let dentist = DentistService::new(&config)
        .update_dentist(dentist_id, request, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(Json(dentist))
}

#[axum::debug_handler]
pub async fn delete_dentist(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(dentist_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    DentistService::new(&config)
        .delete_dentist(dentist_id, auth.token())
        .await
        .map_err(to_app_error)?;

    Ok(StatusCode::NO_CONTENT)
}
