// Core algorithm exports
pub mod artifact;
pub mod error;
pub mod features;
pub mod forest;
pub mod interaction;
pub mod price;
pub mod recommender;
pub mod registry;
pub mod text;

pub use error::ModelError;
pub use features::{complexity_from_text, extract_features};
pub use interaction::{InteractionModel, InteractionParams, InteractionReport};
pub use price::{classify_price, price_band, PricePipeline, PricePrediction, TrainingReport};
pub use recommender::{recommend_projects_for_seller, recommend_sellers_for_project};
pub use registry::{ModelRegistry, ProposalAssessment, RegistrySettings, TrainOutcome};
