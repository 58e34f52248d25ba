use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Column preprocessor: standardization for numeric columns combined with
/// one-hot encoding for categorical columns.
///
/// Fitted statistics are captured at training time so inference sees the
/// exact same feature space. Missing numerics are imputed with the training
/// mean; category values unseen during training encode to an all-zero block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularEncoder {
    numeric_means: Vec<f64>,
    numeric_stds: Vec<f64>,
    categories: Vec<Vec<String>>,
}

impl TabularEncoder {
    /// Fit means/stds and category vocabularies from training rows.
    ///
    /// `numeric[i][c]` is the c-th numeric column of row i (None = absent),
    /// `categorical[i][c]` the c-th categorical column of row i.
    pub fn fit(numeric: &[Vec<Option<f64>>], categorical: &[Vec<String>]) -> Self {
        let n_numeric = numeric.first().map_or(0, |row| row.len());
        let mut numeric_means = vec![0.0; n_numeric];
        let mut numeric_stds = vec![1.0; n_numeric];

        for column in 0..n_numeric {
            let present: Vec<f64> = numeric.iter().filter_map(|row| row[column]).collect();
            if present.is_empty() {
                continue;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / present.len() as f64;
            numeric_means[column] = mean;
            let std = variance.sqrt();
            numeric_stds[column] = if std > 0.0 { std } else { 1.0 };
        }

        let n_categorical = categorical.first().map_or(0, |row| row.len());
        let mut categories = Vec::with_capacity(n_categorical);
        for column in 0..n_categorical {
            let mut values: Vec<String> = categorical
                .iter()
                .map(|row| row[column].clone())
                .collect();
            values.sort();
            values.dedup();
            categories.push(values);
        }

        Self {
            numeric_means,
            numeric_stds,
            categories,
        }
    }

    /// Width of the encoded feature space
    pub fn width(&self) -> usize {
        self.numeric_means.len() + self.categories.iter().map(|c| c.len()).sum::<usize>()
    }

    /// Encode a single row into the fitted feature space
    pub fn transform_row(&self, numeric: &[Option<f64>], categorical: &[String]) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.width());

        for (column, value) in numeric.iter().enumerate() {
            let raw = value.unwrap_or(self.numeric_means[column]);
            encoded.push((raw - self.numeric_means[column]) / self.numeric_stds[column]);
        }

        for (column, value) in categorical.iter().enumerate() {
            let vocabulary = &self.categories[column];
            let hit = vocabulary.iter().position(|known| known == value);
            for index in 0..vocabulary.len() {
                encoded.push(if hit == Some(index) { 1.0 } else { 0.0 });
            }
        }

        encoded
    }

    /// Encode a batch of rows into a design matrix
    pub fn transform(&self, numeric: &[Vec<Option<f64>>], categorical: &[Vec<String>]) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((numeric.len(), self.width()));
        for (i, (num_row, cat_row)) in numeric.iter().zip(categorical).enumerate() {
            let encoded = self.transform_row(num_row, cat_row);
            for (j, value) in encoded.into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        matrix
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single CART regression tree, grown to unbounded depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    root: Node,
}

const MIN_SAMPLES_SPLIT: usize = 2;

impl RegressionTree {
    fn fit(x: &Array2<f64>, y: &Array1<f64>, indices: Vec<usize>) -> Self {
        Self {
            root: grow(x, y, indices),
        }
    }

    pub fn predict(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

/// Best split of `indices` by sum-of-squared-error reduction.
/// Returns (feature, threshold, left indices, right indices).
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
    let n = indices.len() as f64;
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n;

    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..x.ncols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for position in 0..order.len() - 1 {
            let value = y[order[position]];
            left_sum += value;
            left_sq += value * value;

            let here = x[[order[position], feature]];
            let next = x[[order[position + 1], feature]];
            if here == next {
                continue;
            }

            let left_n = (position + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;

            let sse = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);
            let gain = parent_sse - sse;

            if gain > 1e-12 && best.map_or(true, |(_, _, best_gain)| gain > best_gain) {
                best = Some((feature, (here + next) / 2.0, gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| {
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, feature]] <= threshold);
        (feature, threshold, left, right)
    })
}

fn grow(x: &Array2<f64>, y: &Array1<f64>, indices: Vec<usize>) -> Node {
    if indices.len() < MIN_SAMPLES_SPLIT {
        return Node::Leaf {
            value: mean_of(y, &indices),
        };
    }

    match best_split(x, y, &indices) {
        Some((feature, threshold, left, right)) if !left.is_empty() && !right.is_empty() => {
            Node::Split {
                feature,
                threshold,
                left: Box::new(grow(x, y, left)),
                right: Box::new(grow(x, y, right)),
            }
        }
        _ => Node::Leaf {
            value: mean_of(y, &indices),
        },
    }
}

/// Bootstrap-aggregated ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fit `n_estimators` trees, each on a bootstrap sample drawn from a
    /// seeded generator so training is reproducible.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, n_estimators: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = x.nrows();

        let trees = (0..n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, sample)
            })
            .collect();

        Self { trees }
    }

    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        Array1::from_iter(x.rows().into_iter().map(|row| self.predict_row(row)))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Mean absolute error between targets and predictions
pub fn mean_absolute_error(truth: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / truth.len() as f64
}

/// Coefficient of determination; 0.0 for a constant target
pub fn r2_score(truth: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let mean = truth.sum() / truth.len() as f64;
    let total: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    if total == 0.0 {
        return 0.0;
    }
    let residual: f64 = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    1.0 - residual / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_data() -> (Array2<f64>, Array1<f64>) {
        // Target is a step function of the first column.
        let x = array![
            [1.0, 0.0],
            [2.0, 1.0],
            [3.0, 0.0],
            [10.0, 1.0],
            [11.0, 0.0],
            [12.0, 1.0],
        ];
        let y = array![100.0, 100.0, 100.0, 500.0, 500.0, 500.0];
        (x, y)
    }

    #[test]
    fn test_tree_learns_step_function() {
        let (x, y) = toy_data();
        let tree = RegressionTree::fit(&x, &y, (0..x.nrows()).collect());

        assert!((tree.predict(array![2.0, 0.0].view()) - 100.0).abs() < 1e-9);
        assert!((tree.predict(array![11.0, 1.0].view()) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_predicts_within_target_range() {
        let (x, y) = toy_data();
        let forest = RandomForestRegressor::fit(&x, &y, 25, 42);

        let low = forest.predict_row(array![1.5, 0.0].view());
        let high = forest.predict_row(array![11.5, 0.0].view());
        assert!((100.0..=500.0).contains(&low));
        assert!((100.0..=500.0).contains(&high));
        assert!(high > low);
    }

    #[test]
    fn test_forest_deterministic_for_fixed_seed() {
        let (x, y) = toy_data();
        let a = RandomForestRegressor::fit(&x, &y, 10, 42);
        let b = RandomForestRegressor::fit(&x, &y, 10, 42);

        let row = array![5.0, 1.0];
        assert_eq!(a.predict_row(row.view()), b.predict_row(row.view()));
    }

    #[test]
    fn test_constant_target_yields_constant_prediction() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![7.0, 7.0, 7.0, 7.0];
        let forest = RandomForestRegressor::fit(&x, &y, 5, 1);
        assert!((forest.predict_row(array![2.5].view()) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_encoder_standardizes_and_one_hots() {
        let numeric = vec![
            vec![Some(1.0), Some(10.0)],
            vec![Some(3.0), None],
            vec![Some(5.0), Some(20.0)],
        ];
        let categorical = vec![
            vec!["design".to_string()],
            vec!["writing".to_string()],
            vec!["design".to_string()],
        ];

        let encoder = TabularEncoder::fit(&numeric, &categorical);
        assert_eq!(encoder.width(), 4);

        let row = encoder.transform_row(&[Some(3.0), None], &["design".to_string()]);
        // Column 0 mean is 3.0 -> standardized to 0; missing column 1 imputes to 0.
        assert!(row[0].abs() < 1e-9);
        assert!(row[1].abs() < 1e-9);
        assert_eq!(&row[2..], &[1.0, 0.0]);
    }

    #[test]
    fn test_encoder_ignores_unknown_category() {
        let numeric = vec![vec![Some(1.0)], vec![Some(2.0)]];
        let categorical = vec![vec!["design".to_string()], vec!["writing".to_string()]];
        let encoder = TabularEncoder::fit(&numeric, &categorical);

        let row = encoder.transform_row(&[Some(1.5)], &["plumbing".to_string()]);
        assert_eq!(&row[1..], &[0.0, 0.0]);
    }

    #[test]
    fn test_metrics() {
        let truth = array![1.0, 2.0, 3.0];
        let predicted = array![1.0, 2.0, 3.0];
        assert_eq!(mean_absolute_error(&truth, &predicted), 0.0);
        assert_eq!(r2_score(&truth, &predicted), 1.0);

        let off = array![2.0, 3.0, 4.0];
        assert_eq!(mean_absolute_error(&truth, &off), 1.0);
        assert!(r2_score(&truth, &off) < 1.0);
    }
}
