// Route exports
pub mod analytics;
pub mod pricing;
pub mod recommendations;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::core::{ModelError, ModelRegistry};
use crate::models::{ErrorResponse, HealthResponse, ModelHealth};
use crate::services::{BusinessAnalytics, MarketDb};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<MarketDb>,
    pub registry: Arc<ModelRegistry>,
    pub analytics: Arc<BusinessAnalytics>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(recommendations::configure)
            .configure(pricing::configure)
            .configure(analytics::configure),
    );
}

/// Convert a component failure into its structured JSON payload
pub(crate) fn failure_response(error: &ModelError) -> HttpResponse {
    let status_code = error.status_code();
    let body = ErrorResponse {
        error: match error {
            ModelError::DataUnavailable(_) => "data_unavailable",
            ModelError::ModelUnavailable => "model_unavailable",
            ModelError::EntityNotFound(..) => "not_found",
            ModelError::LoadFailure(_) => "load_failure",
            ModelError::TrainingFailure(_) => "training_failure",
            ModelError::Prediction(_) => "prediction_failure",
            ModelError::Source(_) => "data_source_error",
        }
        .to_string(),
        message: error.to_string(),
        status_code,
    };

    HttpResponse::build(
        actix_web::http::StatusCode::from_u16(status_code)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
    )
    .json(body)
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = state.db.health_check().await.unwrap_or(false);
    let (price_prediction, interaction) = state.registry.artifact_presence();

    let status = if database { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: ModelHealth {
            price_prediction,
            interaction,
        },
        database,
        timestamp: chrono::Utc::now(),
    })
}
