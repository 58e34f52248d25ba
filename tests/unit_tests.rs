// Unit tests for Craftwork ML

use craftwork_ml::core::features::{complexity_from_text, extract_features};
use craftwork_ml::core::price::{classify_price, price_band};
use craftwork_ml::core::recommender::{recommend_projects_for_seller, FALLBACK_SCORE};
use craftwork_ml::core::text;
use craftwork_ml::models::{PriceEvaluation, ProjectFields, ProjectRow, ProjectStatus};
use chrono::{Duration, Utc};

fn text_of(words: usize) -> String {
    vec!["word"; words].join(" ")
}

#[test]
fn test_complexity_exact_breakpoints() {
    assert_eq!(complexity_from_text(&text_of(49)), 1);
    assert_eq!(complexity_from_text(&text_of(50)), 2);
    assert_eq!(complexity_from_text(&text_of(199)), 2);
    assert_eq!(complexity_from_text(&text_of(200)), 3);
}

#[test]
fn test_feature_defaults() {
    let features = extract_features(&ProjectFields::default());
    assert_eq!(features.complexity, 2);
    assert_eq!(features.duration, 30.0);
    assert_eq!(features.category, "other");
    assert_eq!(features.required_skills, "general");
}

#[test]
fn test_end_to_end_feature_example() {
    // 10-word design project with a 500 budget.
    let record = ProjectFields {
        description: Some("Need a clean simple logo for my small bakery business".to_string()),
        category: Some("design".to_string()),
        required_skills: Some("logo".to_string()),
        budget: Some(500.0),
        ..Default::default()
    };

    let features = extract_features(&record);
    assert_eq!(features.complexity, 1);
    assert_eq!(features.duration, 30.0);
    assert_eq!(features.category, "design");
    assert_eq!(features.required_skills, "logo");
    assert_eq!(features.budget, Some(500.0));

    // A regressor answering 500 for these features implies the band [425, 575].
    let band = price_band(500.0);
    assert_eq!(band.min, 425.0);
    assert_eq!(band.max, 575.0);
}

#[test]
fn test_band_invariants_across_estimates() {
    for estimate in [0.0, 0.01, 1.0, 250.0, 1e6] {
        let band = price_band(estimate);
        assert!(0.0 <= band.min);
        assert!(band.min <= estimate);
        assert!(estimate <= band.max);
        assert!((band.max - estimate * 1.15).abs() < 1e-6);
    }
}

#[test]
fn test_classification_around_band_edges() {
    let estimate = 500.0;
    let band = price_band(estimate);

    let (fair, deviation, _) = classify_price(estimate, estimate);
    assert_eq!(fair, PriceEvaluation::Fair);
    assert_eq!(deviation, 0.0);

    let (above, _, _) = classify_price(band.max + 0.01, estimate);
    assert_eq!(above, PriceEvaluation::AboveMarket);

    let (below, deviation, _) = classify_price(band.min - 0.01, estimate);
    assert_eq!(below, PriceEvaluation::BelowMarket);
    assert!(deviation < 0.0);
}

#[test]
fn test_cosine_similarity_range() {
    let corpus = vec![
        "build rust backend service".to_string(),
        "design mobile app interface".to_string(),
        "build backend service in rust with postgres".to_string(),
    ];
    let matrix = text::fit_transform(&corpus, 1);

    let related = text::cosine_similarity(matrix.row(0), matrix.row(2));
    let unrelated = text::cosine_similarity(matrix.row(0), matrix.row(1));
    assert!(related > unrelated);
    assert!((0.0..=1.0 + 1e-9).contains(&related));
    assert!((0.0..=1.0 + 1e-9).contains(&unrelated));
}

fn open_project(id: i64, age_days: i64) -> ProjectRow {
    ProjectRow {
        id,
        title: format!("Project {}", id),
        description: "general work".to_string(),
        budget: 250.0,
        status: ProjectStatus::Open,
        buyer_id: 1,
        created_at: Utc::now() - Duration::days(age_days),
        buyer_name: "Buyer".to_string(),
        buyer_email: "buyer@example.com".to_string(),
    }
}

#[test]
fn test_cold_seller_gets_most_recent_projects() {
    let projects = vec![
        open_project(1, 30),
        open_project(2, 2),
        open_project(3, 10),
        open_project(4, 1),
    ];

    let recommendations = recommend_projects_for_seller(&projects, &[], 3);

    let ids: Vec<i64> = recommendations.iter().map(|r| r.project_id).collect();
    assert_eq!(ids, vec![4, 2, 3]);
    assert!(recommendations.iter().all(|r| r.score == FALLBACK_SCORE));
}
