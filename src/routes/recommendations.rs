use actix_web::{web, HttpResponse, Responder};

use crate::core::recommender;
use crate::core::ModelError;
use crate::models::{RecommendQuery, RecommendationsResponse};
use crate::routes::{failure_response, AppState};

/// Configure recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/recommend/projects/{seller_id}",
        web::get().to(recommend_projects),
    )
    .route(
        "/recommend/sellers/{project_id}",
        web::get().to(recommend_sellers),
    );
}

/// Project recommendations for a seller
///
/// GET /api/v1/recommend/projects/{seller_id}?limit=5
async fn recommend_projects(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<RecommendQuery>,
) -> impl Responder {
    let seller_id = path.into_inner();
    let limit = query.limit.min(100);

    tracing::info!("Recommending projects for seller {}, limit {}", seller_id, limit);

    let open_projects = match state.db.get_open_projects().await {
        Ok(projects) => projects,
        Err(e) => {
            tracing::error!("Failed to fetch open projects: {}", e);
            return failure_response(&ModelError::Source(e));
        }
    };

    let history = match state.db.get_seller_history(seller_id).await {
        Ok(history) => history,
        Err(e) => {
            tracing::error!("Failed to fetch history for seller {}: {}", seller_id, e);
            return failure_response(&ModelError::Source(e));
        }
    };

    let recommendations =
        recommender::recommend_projects_for_seller(&open_projects, &history, limit);

    tracing::debug!(
        "Returning {} project recommendations for seller {}",
        recommendations.len(),
        seller_id
    );

    HttpResponse::Ok().json(RecommendationsResponse {
        success: true,
        recommendations,
    })
}

/// Seller recommendations for a project
///
/// GET /api/v1/recommend/sellers/{project_id}?limit=5
async fn recommend_sellers(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<RecommendQuery>,
) -> impl Responder {
    let project_id = path.into_inner();
    let limit = query.limit.min(100);

    tracing::info!("Recommending sellers for project {}, limit {}", project_id, limit);

    let project = match state.db.get_project(project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => {
            return failure_response(&ModelError::EntityNotFound("project", project_id));
        }
        Err(e) => {
            tracing::error!("Failed to fetch project {}: {}", project_id, e);
            return failure_response(&ModelError::Source(e));
        }
    };

    let (sellers, proposals, projects) = match tokio::try_join!(
        state.db.get_sellers(),
        state.db.get_proposals(),
        state.db.get_projects(),
    ) {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("Failed to fetch recommendation inputs: {}", e);
            return failure_response(&ModelError::Source(e));
        }
    };

    let recommendations = recommender::recommend_sellers_for_project(
        &project,
        &sellers,
        &proposals,
        &projects,
        limit,
    );

    tracing::debug!(
        "Returning {} seller recommendations for project {}",
        recommendations.len(),
        project_id
    );

    HttpResponse::Ok().json(RecommendationsResponse {
        success: true,
        recommendations,
    })
}
