// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::query::optional_param;

use crate::models::{AvailabilityQuery, AvailabilityReport, SchedulingConfig};
use crate::services::planner::AvailabilityPlanner;
use crate::store::SupabaseAppointmentReader;

/// Free and booked slots of one working day, optionally for a single dentist.
#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityReport>, AppError> {
    let date = query.date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("date parameter is required (YYYY-MM-DD format)".to_string()))?;

    let dentist_id = optional_param::<Uuid>("dentist_id", query.dentist_id.as_deref())?;

    debug!("User {} checking availability for {}", user.id, date);

    let config = SchedulingConfig::from_app_config(&state)?;
    let reader = SupabaseAppointmentReader::new(
        Arc::new(SupabaseClient::new(&state)),
        auth.token(),
        config.utc_offset,
    );

    let planner = AvailabilityPlanner::new(Arc::new(reader), config);
    let report = planner.plan(&date, dentist_id).await?;

    Ok(Json(report))
}
