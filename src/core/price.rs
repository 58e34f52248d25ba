use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::core::error::ModelError;
use crate::core::features::extract_features;
use crate::core::forest::{
    mean_absolute_error, r2_score, RandomForestRegressor, TabularEncoder,
};
use crate::models::{
    CompletedProjectRow, FeatureVector, PriceEvaluation, PriceRange, ProjectFields,
};

/// Minimum number of completed-project rows required to fit the regressor
pub const MIN_TRAINING_ROWS: usize = 10;

/// Fixed seed for the train/test split and the forest bootstrap
pub const TRAIN_SEED: u64 = 42;

const TEST_FRACTION: f64 = 0.2;

/// Half-width of the symmetric price band around the point estimate
const BAND_FRACTION: f64 = 0.15;

/// Placeholder confidence attached to every prediction
pub const PLACEHOLDER_CONFIDENCE: f64 = 0.8;

const NUMERIC_FEATURES: &[&str] = &["complexity", "duration", "budget", "initial_price"];
const CATEGORICAL_FEATURES: &[&str] = &["category", "required_skills"];

/// Metrics from a completed training run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub mae: f64,
    pub r2: f64,
}

/// Point estimate plus band, the payload of `predict_price`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    pub predicted_price: f64,
    pub price_range: PriceRange,
    pub confidence: f64,
}

/// Fitted price regression pipeline: column encoding + random forest.
///
/// Never mutated in place; retraining builds a replacement wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePipeline {
    features: Vec<String>,
    encoder: TabularEncoder,
    forest: RandomForestRegressor,
}

/// Symmetric ±15% band around an estimate, floored at zero
pub fn price_band(estimate: f64) -> PriceRange {
    PriceRange {
        min: (estimate * (1.0 - BAND_FRACTION)).max(0.0),
        max: estimate * (1.0 + BAND_FRACTION),
    }
}

/// Classify a candidate price against the predicted band and compute the
/// signed percentage deviation from the estimate.
///
/// Deviation is undefined for a zero estimate and reported as 0.0.
pub fn classify_price(price: f64, estimate: f64) -> (PriceEvaluation, f64, PriceRange) {
    let range = price_band(estimate);
    let evaluation = if price < range.min {
        PriceEvaluation::BelowMarket
    } else if price > range.max {
        PriceEvaluation::AboveMarket
    } else {
        PriceEvaluation::Fair
    };
    let deviation = if estimate != 0.0 {
        (price - estimate) / estimate * 100.0
    } else {
        0.0
    };
    (evaluation, deviation, range)
}

fn numeric_value(feature: &str, features: &FeatureVector) -> Option<f64> {
    match feature {
        "complexity" => Some(features.complexity as f64),
        "duration" => Some(features.duration),
        "budget" => features.budget,
        "initial_price" => features.initial_price,
        _ => None,
    }
}

fn categorical_value(feature: &str, features: &FeatureVector) -> String {
    match feature {
        "category" => features.category.clone(),
        _ => features.required_skills.clone(),
    }
}

fn training_record(row: &CompletedProjectRow) -> ProjectFields {
    ProjectFields {
        description: Some(row.description.clone()),
        delivery_time: Some(row.delivery_time as f64),
        budget: Some(row.budget),
        initial_price: Some(row.proposal_price),
        ..Default::default()
    }
}

impl PricePipeline {
    /// Fit the pipeline on completed-project rows.
    ///
    /// The regression target is the realized payment amount, falling back to
    /// the proposal price when no payment is mapped. Rows are split 80/20
    /// with a fixed seed; the report carries held-out MAE and R².
    pub fn fit(
        rows: &[CompletedProjectRow],
        configured_features: &[String],
        n_estimators: usize,
    ) -> Result<(Self, TrainingReport), ModelError> {
        if rows.len() < MIN_TRAINING_ROWS {
            return Err(ModelError::DataUnavailable(format!(
                "{} completed projects available, {} required",
                rows.len(),
                MIN_TRAINING_ROWS
            )));
        }

        let numeric_names: Vec<String> = NUMERIC_FEATURES
            .iter()
            .filter(|name| configured_features.iter().any(|f| f == *name))
            .map(|name| name.to_string())
            .collect();
        let categorical_names: Vec<String> = CATEGORICAL_FEATURES
            .iter()
            .filter(|name| configured_features.iter().any(|f| f == *name))
            .map(|name| name.to_string())
            .collect();

        let features: Vec<String> = numeric_names
            .iter()
            .chain(categorical_names.iter())
            .cloned()
            .collect();
        if features.is_empty() {
            return Err(ModelError::TrainingFailure(
                "no configured features".to_string(),
            ));
        }

        let vectors: Vec<FeatureVector> = rows
            .iter()
            .map(|row| extract_features(&training_record(row)))
            .collect();
        let targets: Vec<f64> = rows
            .iter()
            .map(|row| row.payment_amount.unwrap_or(row.proposal_price))
            .collect();

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(TRAIN_SEED));
        let n_test = ((rows.len() as f64) * TEST_FRACTION).ceil() as usize;
        let n_test = n_test.min(rows.len() - 1);
        let (test_idx, train_idx) = order.split_at(n_test);

        let collect_columns = |indices: &[usize]| {
            let numeric: Vec<Vec<Option<f64>>> = indices
                .iter()
                .map(|&i| {
                    numeric_names
                        .iter()
                        .map(|name| numeric_value(name, &vectors[i]))
                        .collect()
                })
                .collect();
            let categorical: Vec<Vec<String>> = indices
                .iter()
                .map(|&i| {
                    categorical_names
                        .iter()
                        .map(|name| categorical_value(name, &vectors[i]))
                        .collect()
                })
                .collect();
            (numeric, categorical)
        };

        let (train_numeric, train_categorical) = collect_columns(train_idx);
        let encoder = TabularEncoder::fit(&train_numeric, &train_categorical);

        let x_train = encoder.transform(&train_numeric, &train_categorical);
        let y_train = Array1::from_iter(train_idx.iter().map(|&i| targets[i]));
        let forest = RandomForestRegressor::fit(&x_train, &y_train, n_estimators, TRAIN_SEED);

        let (test_numeric, test_categorical) = collect_columns(test_idx);
        let x_test: Array2<f64> = encoder.transform(&test_numeric, &test_categorical);
        let y_test = Array1::from_iter(test_idx.iter().map(|&i| targets[i]));
        let predictions = forest.predict(&x_test);

        let report = TrainingReport {
            rows: rows.len(),
            mae: mean_absolute_error(&y_test, &predictions),
            r2: r2_score(&y_test, &predictions),
        };

        Ok((
            Self {
                features,
                encoder,
                forest,
            },
            report,
        ))
    }

    /// Run a raw record through feature extraction and the fitted forest
    pub fn predict(&self, record: &ProjectFields) -> PricePrediction {
        let features = extract_features(record);
        let estimate = self.predict_features(&features);
        PricePrediction {
            predicted_price: estimate,
            price_range: price_band(estimate),
            confidence: PLACEHOLDER_CONFIDENCE,
        }
    }

    /// Predict from an already-extracted feature vector
    pub fn predict_features(&self, features: &FeatureVector) -> f64 {
        let numeric: Vec<Option<f64>> = self
            .features
            .iter()
            .filter(|name| NUMERIC_FEATURES.contains(&name.as_str()))
            .map(|name| numeric_value(name, features))
            .collect();
        let categorical: Vec<String> = self
            .features
            .iter()
            .filter(|name| CATEGORICAL_FEATURES.contains(&name.as_str()))
            .map(|name| categorical_value(name, features))
            .collect();

        let encoded = Array1::from(self.encoder.transform_row(&numeric, &categorical));
        self.forest.predict_row(encoded.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn completed_row(id: i64, words: usize, delivery: i32, amount: f64) -> CompletedProjectRow {
        CompletedProjectRow {
            project_id: id,
            title: format!("Project {}", id),
            description: vec!["work"; words].join(" "),
            budget: amount * 1.1,
            buyer_id: 1,
            project_created_at: Utc::now(),
            proposal_id: id * 10,
            proposal_price: amount * 0.95,
            delivery_time: delivery,
            seller_id: id % 4 + 1,
            payment_id: id * 100,
            payment_amount: Some(amount),
            payment_status: "completed".to_string(),
            payment_date: Utc::now(),
        }
    }

    fn default_features() -> Vec<String> {
        [
            "category",
            "complexity",
            "duration",
            "required_skills",
            "budget",
            "initial_price",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_band_properties() {
        let range = price_band(500.0);
        assert_eq!(range.min, 425.0);
        assert_eq!(range.max, 575.0);

        for estimate in [0.0, 1.0, 99.5, 10_000.0] {
            let range = price_band(estimate);
            assert!(range.min >= 0.0);
            assert!(range.min <= estimate);
            assert!(estimate <= range.max);
            assert!((range.max - estimate * 1.15).abs() < 1e-9);
        }
    }

    #[test]
    fn test_classification_boundaries() {
        let (at_estimate, deviation, _) = classify_price(500.0, 500.0);
        assert_eq!(at_estimate, PriceEvaluation::Fair);
        assert_eq!(deviation, 0.0);

        let (above, _, _) = classify_price(575.01, 500.0);
        assert_eq!(above, PriceEvaluation::AboveMarket);

        let (below, _, _) = classify_price(424.99, 500.0);
        assert_eq!(below, PriceEvaluation::BelowMarket);

        let (at_max, _, _) = classify_price(575.0, 500.0);
        assert_eq!(at_max, PriceEvaluation::Fair);
    }

    #[test]
    fn test_zero_estimate_deviation_guarded() {
        let (_, deviation, range) = classify_price(100.0, 0.0);
        assert_eq!(deviation, 0.0);
        assert_eq!(range.min, 0.0);
        assert_eq!(range.max, 0.0);
    }

    #[test]
    fn test_fit_rejects_small_datasets() {
        let rows: Vec<CompletedProjectRow> =
            (0..9).map(|i| completed_row(i, 30, 14, 400.0)).collect();
        let result = PricePipeline::fit(&rows, &default_features(), 10);
        assert!(matches!(result, Err(ModelError::DataUnavailable(_))));
    }

    #[test]
    fn test_fit_and_predict_plausible_range() {
        let rows: Vec<CompletedProjectRow> = (0..30)
            .map(|i| {
                let amount = if i % 2 == 0 { 200.0 } else { 1000.0 };
                let words = if i % 2 == 0 { 20 } else { 300 };
                completed_row(i, words, if i % 2 == 0 { 7 } else { 60 }, amount)
            })
            .collect();

        let (pipeline, report) = PricePipeline::fit(&rows, &default_features(), 20).unwrap();
        assert_eq!(report.rows, 30);
        assert!(report.mae.is_finite());

        let record = ProjectFields {
            description: Some(vec!["work"; 300].join(" ")),
            delivery_time: Some(60.0),
            budget: Some(1100.0),
            initial_price: Some(950.0),
            ..Default::default()
        };
        let prediction = pipeline.predict(&record);
        assert!(prediction.predicted_price > 200.0);
        assert!(prediction.predicted_price.is_finite());
        assert_eq!(prediction.confidence, PLACEHOLDER_CONFIDENCE);
    }

    #[test]
    fn test_fit_deterministic() {
        let rows: Vec<CompletedProjectRow> = (0..20)
            .map(|i| completed_row(i, 10 + (i as usize) * 25, 7 + i as i32, 100.0 + i as f64 * 50.0))
            .collect();

        let (a, _) = PricePipeline::fit(&rows, &default_features(), 15).unwrap();
        let (b, _) = PricePipeline::fit(&rows, &default_features(), 15).unwrap();

        let record = ProjectFields {
            description: Some(vec!["work"; 120].join(" ")),
            budget: Some(600.0),
            ..Default::default()
        };
        assert_eq!(a.predict(&record).predicted_price, b.predict(&record).predicted_price);
    }
}
