use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, dashboard_routes};
use clinic_cell::{clinic_routes, dentist_routes};
use patient_cell::patient_routes;
use scheduling_cell::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental Clinic API is running!" }))
        .merge(scheduling_routes(state.clone()))
        .merge(dashboard_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/clinics", clinic_routes(state.clone()))
        .nest("/dentists", dentist_routes(state.clone()))
        .nest("/patients", patient_routes(state))
}
