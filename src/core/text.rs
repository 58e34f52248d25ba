use ndarray::Array1;
use std::collections::{BTreeMap, HashMap};

/// English stopwords filtered out before weighting
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours",
];

/// TF-IDF representation of a document corpus.
///
/// Vocabulary and weighting are fit on exactly the corpus passed to
/// [`fit_transform`]; the representation is request-scoped and never cached,
/// so scores are only comparable within a single call.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    vocabulary: HashMap<String, usize>,
    rows: Vec<Array1<f64>>,
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2 && !STOPWORDS.contains(token))
        .map(|token| token.to_string())
        .collect()
}

/// Build a TF-IDF matrix over `documents`, one L2-normalized row per document.
///
/// Terms appearing in fewer than `min_df` documents are dropped from the
/// vocabulary. Smoothed inverse document frequency:
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`.
pub fn fit_transform(documents: &[String], min_df: usize) -> TfidfMatrix {
    let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

    // Document frequency per term; BTreeMap keeps vocabulary order deterministic.
    let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &tokenized {
        let mut seen: Vec<&str> = Vec::new();
        for token in tokens {
            if !seen.contains(&token.as_str()) {
                seen.push(token);
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }
    }

    let vocabulary: HashMap<String, usize> = document_frequency
        .iter()
        .filter(|(_, &df)| df >= min_df.max(1))
        .enumerate()
        .map(|(index, (&term, _))| (term.to_string(), index))
        .collect();

    let n_docs = documents.len() as f64;
    let mut idf = Array1::<f64>::zeros(vocabulary.len());
    for (term, &df) in &document_frequency {
        if let Some(&index) = vocabulary.get(*term) {
            idf[index] = ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0;
        }
    }

    let rows = tokenized
        .iter()
        .map(|tokens| {
            let mut row = Array1::<f64>::zeros(vocabulary.len());
            for token in tokens {
                if let Some(&index) = vocabulary.get(token.as_str()) {
                    row[index] += 1.0;
                }
            }
            row *= &idf;
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row /= norm;
            }
            row
        })
        .collect();

    TfidfMatrix { vocabulary, rows }
}

impl TfidfMatrix {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn row(&self, index: usize) -> &Array1<f64> {
        &self.rows[index]
    }

    /// Mean vector over a contiguous range of rows (a multi-document profile)
    pub fn mean_of(&self, range: std::ops::Range<usize>) -> Array1<f64> {
        let len = range.len().max(1) as f64;
        let mut mean = Array1::<f64>::zeros(self.vocabulary.len());
        for index in range {
            mean += &self.rows[index];
        }
        mean / len
    }

    /// Cosine similarity between `query` and each row in `range`, in order
    pub fn similarities(&self, query: &Array1<f64>, range: std::ops::Range<usize>) -> Vec<f64> {
        range
            .map(|index| cosine_similarity(query, &self.rows[index]))
            .collect()
    }
}

/// Normalized dot-product similarity; 0.0 when either vector is all-zero
pub fn cosine_similarity(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(b) / (norm_a * norm_b)
}
