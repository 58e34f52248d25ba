use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to evaluate a proposal price against the predicted market band
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EvaluateProposalRequest {
    pub project_id: i64,
    #[validate(range(min = 0.0))]
    pub price: f64,
}

/// Request to (re)train a model artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub force: bool,
}

/// Query parameters for the recommendation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

/// Query parameters for the market analytics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketQuery {
    pub period: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_query_default_limit() {
        let query: RecommendQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 5);
    }

    #[test]
    fn test_train_request_defaults_to_unforced() {
        let req: TrainRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.force);
    }

    #[test]
    fn test_negative_price_fails_validation() {
        let req = EvaluateProposalRequest {
            project_id: 1,
            price: -5.0,
        };
        assert!(req.validate().is_err());
    }
}
