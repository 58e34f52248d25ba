use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::TrainOutcome;
use crate::models::{
    ErrorResponse, EvaluateProposalRequest, PricePredictionResponse, ProjectFields,
    ProposalEvaluationResponse, TrainRequest, TrainResponse,
};
use crate::routes::{failure_response, AppState};

/// Configure price prediction and training routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/predict/price", web::post().to(predict_price))
        .route("/evaluate/proposal", web::post().to(evaluate_proposal))
        .route("/train/price", web::post().to(train_price))
        .route("/train/interaction", web::post().to(train_interaction));
}

/// Predict a market price for project details
///
/// POST /api/v1/predict/price
///
/// Request body: project fields (description, category, budget, ...);
/// everything is optional and absent fields take documented defaults.
async fn predict_price(
    state: web::Data<AppState>,
    req: web::Json<ProjectFields>,
) -> impl Responder {
    match state.registry.predict_price(&req).await {
        Ok(prediction) => HttpResponse::Ok().json(PricePredictionResponse {
            success: true,
            predicted_price: prediction.predicted_price,
            price_range: prediction.price_range,
            confidence: prediction.confidence,
        }),
        Err(e) => {
            tracing::warn!("Price prediction failed: {}", e);
            failure_response(&e)
        }
    }
}

/// Evaluate a proposal price against the predicted market band
///
/// POST /api/v1/evaluate/proposal
///
/// Request body:
/// ```json
/// { "project_id": 42, "price": 450.0 }
/// ```
async fn evaluate_proposal(
    state: web::Data<AppState>,
    req: web::Json<EvaluateProposalRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    match state.registry.evaluate_proposal(req.project_id, req.price).await {
        Ok(assessment) => HttpResponse::Ok().json(ProposalEvaluationResponse {
            success: true,
            evaluation: assessment.evaluation,
            message: assessment.evaluation.message().to_string(),
            predicted_price: assessment.predicted_price,
            deviation_percent: assessment.deviation_percent,
            price_range: assessment.price_range,
        }),
        Err(e) => {
            tracing::warn!(
                "Proposal evaluation failed for project {}: {}",
                req.project_id,
                e
            );
            failure_response(&e)
        }
    }
}

/// Load-or-train the price model
///
/// POST /api/v1/train/price with body `{ "force": true }` to retrain even
/// when an artifact already exists.
async fn train_price(state: web::Data<AppState>, req: web::Json<TrainRequest>) -> impl Responder {
    match state.registry.train_price(req.force).await {
        Ok(TrainOutcome::Loaded) => HttpResponse::Ok().json(TrainResponse {
            success: true,
            model: "price_prediction".to_string(),
            message: "Loaded existing model artifact".to_string(),
        }),
        Ok(TrainOutcome::Trained(report)) => HttpResponse::Ok().json(TrainResponse {
            success: true,
            model: "price_prediction".to_string(),
            message: format!(
                "Trained on {} rows (MAE {:.2}, R2 {:.3})",
                report.rows, report.mae, report.r2
            ),
        }),
        Err(e) => {
            tracing::error!("Price model training failed: {}", e);
            failure_response(&e)
        }
    }
}

/// Load-or-train the interaction model
///
/// POST /api/v1/train/interaction
async fn train_interaction(
    state: web::Data<AppState>,
    req: web::Json<TrainRequest>,
) -> impl Responder {
    match state.registry.train_interaction(req.force).await {
        Ok(TrainOutcome::Loaded) => HttpResponse::Ok().json(TrainResponse {
            success: true,
            model: "interaction".to_string(),
            message: "Loaded existing model artifact".to_string(),
        }),
        Ok(TrainOutcome::Trained(report)) => HttpResponse::Ok().json(TrainResponse {
            success: true,
            model: "interaction".to_string(),
            message: format!(
                "Trained on {} pairs over {} epochs (val loss {:.4})",
                report.pairs, report.epochs_run, report.best_val_loss
            ),
        }),
        Err(e) => {
            tracing::error!("Interaction model training failed: {}", e);
            failure_response(&e)
        }
    }
}
