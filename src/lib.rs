//! Craftwork ML - price estimation and matching service for the Craftwork
//! freelance marketplace
//!
//! This library provides the platform's machine-learning core: a price
//! prediction pipeline over completed transactions, a TF-IDF based
//! recommendation engine for matching projects and sellers, and the business
//! analytics reports backing the marketplace dashboards.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    extract_features, recommend_projects_for_seller, recommend_sellers_for_project, ModelError,
    ModelRegistry, PricePipeline,
};
pub use models::{FeatureVector, ProjectFields, ScoredProject, ScoredSeller};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let features = extract_features(&ProjectFields::default());
        assert_eq!(features.duration, 30.0);
    }
}
