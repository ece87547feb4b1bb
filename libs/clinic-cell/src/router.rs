use std::sync::Arc;
use axum::{middleware, routing::get, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn clinic_routes(config: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_clinics).post(create_clinic))
        .route("/{id}", get(get_clinic).put(update_clinic).delete(delete_clinic))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(config)
}

pub fn dentist_routes(config: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_dentists).post(create_dentist))
        .route("/{id}", get(get_dentist).put(update_dentist).delete(delete_dentist))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(config)
}
