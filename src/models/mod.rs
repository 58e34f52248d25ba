// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BuyerProjectRow, CompletedProjectRow, FeatureVector, PaymentRow, PriceEvaluation, PriceRange,
    ProjectFields, ProjectRow, ProjectStatus, ProposalRow, ProposalStatus, ScoredProject,
    ScoredSeller, SellerHistoryRow, UserRole, UserRow,
};
pub use requests::{EvaluateProposalRequest, MarketQuery, RecommendQuery, TrainRequest};
pub use responses::{
    ErrorResponse, HealthResponse, ModelHealth, PricePredictionResponse,
    ProposalEvaluationResponse, RecommendationsResponse, TrainResponse,
};
