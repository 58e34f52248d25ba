use actix_web::{web, HttpResponse, Responder};

use crate::models::MarketQuery;
use crate::routes::{failure_response, AppState};
use crate::services::TrendPeriod;

/// Configure business analytics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/analytics/market", web::get().to(market_trends))
        .route("/analytics/buyer/{buyer_id}", web::get().to(buyer_analytics))
        .route(
            "/analytics/seller/{seller_id}",
            web::get().to(seller_analytics),
        )
        .route(
            "/analytics/project/{project_id}",
            web::get().to(project_outlook),
        );
}

/// Market trends over a trailing window
///
/// GET /api/v1/analytics/market?period=week|month|year
async fn market_trends(
    state: web::Data<AppState>,
    query: web::Query<MarketQuery>,
) -> impl Responder {
    let period = TrendPeriod::parse(query.period.as_deref());

    match state.analytics.market_trends(period).await {
        Ok(trends) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "time_period": trends.time_period,
            "metrics": trends.metrics,
            "time_series": trends.time_series,
        })),
        Err(e) => {
            tracing::warn!("Market analytics failed: {}", e);
            failure_response(&e)
        }
    }
}

/// Spending summary for a buyer
///
/// GET /api/v1/analytics/buyer/{buyer_id}
async fn buyer_analytics(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let buyer_id = path.into_inner();

    match state.analytics.buyer_analytics(buyer_id).await {
        Ok(report) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "buyer_id": report.buyer_id,
            "metrics": report.metrics,
            "timeline": report.timeline,
        })),
        Err(e) => {
            tracing::warn!("Buyer analytics failed for {}: {}", buyer_id, e);
            failure_response(&e)
        }
    }
}

/// Earnings summary for a seller
///
/// GET /api/v1/analytics/seller/{seller_id}
async fn seller_analytics(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let seller_id = path.into_inner();

    match state.analytics.seller_analytics(seller_id).await {
        Ok(report) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "seller_id": report.seller_id,
            "metrics": report.metrics,
            "earnings_timeline": report.earnings_timeline,
        })),
        Err(e) => {
            tracing::warn!("Seller analytics failed for {}: {}", seller_id, e);
            failure_response(&e)
        }
    }
}

/// Heuristic completion outlook for a project
///
/// GET /api/v1/analytics/project/{project_id}
async fn project_outlook(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let project_id = path.into_inner();

    match state.analytics.completion_outlook(project_id).await {
        Ok(outlook) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "project_id": outlook.project_id,
            "predicted_completion_days": outlook.predicted_completion_days,
            "success_probability": outlook.success_probability,
            "confidence": outlook.confidence,
        })),
        Err(e) => {
            tracing::warn!("Completion outlook failed for {}: {}", project_id, e);
            failure_response(&e)
        }
    }
}
