use crate::models::{FeatureVector, ProjectFields};

/// Word-count breakpoints separating simple / moderate / complex descriptions
const MODERATE_WORDS: usize = 50;
const COMPLEX_WORDS: usize = 200;

/// Default duration in days when neither delivery_time nor duration is present
pub const DEFAULT_DURATION_DAYS: f64 = 30.0;

/// Default complexity when neither text nor an explicit value is present
pub const DEFAULT_COMPLEXITY: u8 = 2;

pub const DEFAULT_CATEGORY: &str = "other";
pub const DEFAULT_SKILLS: &str = "general";

/// Derive a complexity bucket (1..=3) from free text.
///
/// Monotonic non-decreasing in word count: < 50 words is simple,
/// < 200 is moderate, everything longer is complex.
pub fn complexity_from_text(text: &str) -> u8 {
    let words = text.split_whitespace().count();
    if words < MODERATE_WORDS {
        1
    } else if words < COMPLEX_WORDS {
        2
    } else {
        3
    }
}

/// Map a raw record to the fixed feature schema.
///
/// Pure function of its input. An explicit `complexity` field overrides the
/// text-derived value; `delivery_time` is preferred over `duration`; absent
/// categoricals fall back to "other"/"general". The optional numerics
/// (budget, initial_price) are passed through as-is so the model layer can
/// train on ragged feature presence.
pub fn extract_features(record: &ProjectFields) -> FeatureVector {
    let complexity = match (record.complexity, record.description.as_deref()) {
        (Some(value), _) => value.clamp(1, 3),
        (None, Some(text)) => complexity_from_text(text),
        (None, None) => DEFAULT_COMPLEXITY,
    };

    let duration = record
        .delivery_time
        .or(record.duration)
        .unwrap_or(DEFAULT_DURATION_DAYS);

    FeatureVector {
        complexity,
        duration,
        category: record
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        required_skills: record
            .required_skills
            .clone()
            .unwrap_or_else(|| DEFAULT_SKILLS.to_string()),
        budget: record.budget,
        initial_price: record.initial_price,
    }
}
