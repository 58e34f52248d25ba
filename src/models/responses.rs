use serde::{Deserialize, Serialize};

use crate::models::domain::{PriceEvaluation, PriceRange};

/// Response for the price prediction endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePredictionResponse {
    pub success: bool,
    pub predicted_price: f64,
    pub price_range: PriceRange,
    pub confidence: f64,
}

/// Response for the proposal evaluation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalEvaluationResponse {
    pub success: bool,
    pub evaluation: PriceEvaluation,
    pub message: String,
    pub predicted_price: f64,
    pub deviation_percent: f64,
    pub price_range: PriceRange,
}

/// Response wrapping an ordered recommendation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse<T> {
    pub success: bool,
    pub recommendations: Vec<T>,
}

/// Response for the training endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    pub success: bool,
    pub model: String,
    pub message: String,
}

/// Per-artifact presence reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHealth {
    pub price_prediction: bool,
    pub interaction: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: ModelHealth,
    pub database: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
