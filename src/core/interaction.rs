use std::collections::HashMap;
use std::path::Path;

use ndarray::{concatenate, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::artifact::save_artifact;
use crate::core::error::ModelError;
use crate::models::{ProjectRow, ProposalRow};

const INIT_SEED: u64 = 42;
const VALIDATION_FRACTION: f64 = 0.2;

/// Hyperparameters for interaction model training
#[derive(Debug, Clone, Copy)]
pub struct InteractionParams {
    pub embedding_size: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    pub patience: usize,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            embedding_size: 128,
            learning_rate: 0.001,
            batch_size: 32,
            epochs: 10,
            patience: 3,
        }
    }
}

/// Metrics from a completed interaction training run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InteractionReport {
    pub pairs: usize,
    pub n_projects: usize,
    pub n_sellers: usize,
    pub epochs_run: usize,
    pub best_val_loss: f64,
}

/// Learned latent-factor scorer over (project, seller) pairs.
///
/// Trained on proposal submissions as positive-only implicit signal: every
/// observed pair carries label 1 and no negatives are sampled, so this is
/// link prediction with positives only. Index 0 of both embedding tables is
/// reserved for unseen entities. The artifact is trained and persisted but
/// the online recommendation queries score with text similarity instead;
/// this scorer is an alternative strategy kept available for callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionModel {
    project_index: HashMap<i64, usize>,
    seller_index: HashMap<i64, usize>,
    project_embeddings: Array2<f64>,
    seller_embeddings: Array2<f64>,
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
    w3: Array1<f64>,
    b3: f64,
}

const HIDDEN_1: usize = 128;
const HIDDEN_2: usize = 64;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn relu(v: &Array1<f64>) -> Array1<f64> {
    v.mapv(|x| x.max(0.0))
}

fn uniform_matrix(rng: &mut StdRng, rows: usize, cols: usize, scale: f64) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-scale..scale))
}

struct Forward {
    input: Array1<f64>,
    z1: Array1<f64>,
    h1: Array1<f64>,
    z2: Array1<f64>,
    h2: Array1<f64>,
    probability: f64,
}

impl InteractionModel {
    fn new(n_projects: usize, n_sellers: usize, params: &InteractionParams) -> Self {
        let mut rng = StdRng::seed_from_u64(INIT_SEED);
        let d = params.embedding_size;
        // +1 row on each table: index 0 is the padding slot for unseen ids.
        Self {
            project_index: HashMap::new(),
            seller_index: HashMap::new(),
            project_embeddings: uniform_matrix(&mut rng, n_projects + 1, d, 0.05),
            seller_embeddings: uniform_matrix(&mut rng, n_sellers + 1, d, 0.05),
            w1: uniform_matrix(&mut rng, 2 * d, HIDDEN_1, (2.0 / (2 * d) as f64).sqrt()),
            b1: Array1::zeros(HIDDEN_1),
            w2: uniform_matrix(&mut rng, HIDDEN_1, HIDDEN_2, (2.0 / HIDDEN_1 as f64).sqrt()),
            b2: Array1::zeros(HIDDEN_2),
            w3: Array1::from_shape_fn(HIDDEN_2, |_| rng.gen_range(-0.05..0.05)),
            b3: 0.0,
        }
    }

    fn forward(&self, project_slot: usize, seller_slot: usize) -> Forward {
        let p = self.project_embeddings.row(project_slot).to_owned();
        let s = self.seller_embeddings.row(seller_slot).to_owned();
        let input = concatenate![Axis(0), p, s];

        let z1 = input.dot(&self.w1) + &self.b1;
        let h1 = relu(&z1);
        let z2 = h1.dot(&self.w2) + &self.b2;
        let h2 = relu(&z2);
        let probability = sigmoid(h2.dot(&self.w3) + self.b3);

        Forward {
            input,
            z1,
            h1,
            z2,
            h2,
            probability,
        }
    }

    /// One SGD step on a single (project, seller, label) sample
    fn backward(&mut self, project_slot: usize, seller_slot: usize, label: f64, lr: f64) {
        let pass = self.forward(project_slot, seller_slot);
        let d = self.project_embeddings.ncols();

        // Binary cross-entropy through the sigmoid: dL/dz3 = p - y.
        let dz3 = pass.probability - label;

        let dw3 = &pass.h2 * dz3;
        let dh2 = &self.w3 * dz3;
        let dz2 = &dh2 * &pass.z2.mapv(|z| if z > 0.0 { 1.0 } else { 0.0 });

        let dw2 = outer(&pass.h1, &dz2);
        let dh1 = self.w2.dot(&dz2);
        let dz1 = &dh1 * &pass.z1.mapv(|z| if z > 0.0 { 1.0 } else { 0.0 });

        let dw1 = outer(&pass.input, &dz1);
        let dinput = self.w1.dot(&dz1);

        self.w3 -= &(dw3 * lr);
        self.b3 -= dz3 * lr;
        self.w2 -= &(dw2 * lr);
        self.b2 -= &(dz2 * lr);
        self.w1 -= &(dw1 * lr);
        self.b1 -= &(dz1 * lr);

        let d_project = dinput.slice(ndarray::s![..d]).to_owned() * lr;
        let d_seller = dinput.slice(ndarray::s![d..]).to_owned() * lr;
        let mut project_row = self.project_embeddings.row_mut(project_slot);
        project_row -= &d_project;
        let mut seller_row = self.seller_embeddings.row_mut(seller_slot);
        seller_row -= &d_seller;
    }

    fn loss(&self, pairs: &[(usize, usize)], label: f64) -> f64 {
        if pairs.is_empty() {
            return 0.0;
        }
        let eps = 1e-12;
        let total: f64 = pairs
            .iter()
            .map(|&(p, s)| {
                let prob = self.forward(p, s).probability.clamp(eps, 1.0 - eps);
                -(label * prob.ln() + (1.0 - label) * (1.0 - prob).ln())
            })
            .sum();
        total / pairs.len() as f64
    }

    /// Fit on (project, seller) pairs drawn from submitted proposals.
    ///
    /// Early-stops when validation loss has not improved for
    /// `params.patience` epochs; the best state seen is checkpointed to
    /// `checkpoint` on each improvement and is the state returned.
    pub fn fit(
        projects: &[ProjectRow],
        proposals: &[ProposalRow],
        params: &InteractionParams,
        checkpoint: Option<&Path>,
    ) -> Result<(Self, InteractionReport), ModelError> {
        let known_projects: std::collections::HashSet<i64> =
            projects.iter().map(|p| p.id).collect();
        let interactions: Vec<(i64, i64)> = proposals
            .iter()
            .filter(|proposal| known_projects.contains(&proposal.project_id))
            .map(|proposal| (proposal.project_id, proposal.seller_id))
            .collect();

        if interactions.is_empty() {
            return Err(ModelError::DataUnavailable(
                "no project/seller interactions".to_string(),
            ));
        }

        let mut project_index: HashMap<i64, usize> = HashMap::new();
        let mut seller_index: HashMap<i64, usize> = HashMap::new();
        for &(project_id, seller_id) in &interactions {
            let next = project_index.len() + 1;
            project_index.entry(project_id).or_insert(next);
            let next = seller_index.len() + 1;
            seller_index.entry(seller_id).or_insert(next);
        }

        let slots: Vec<(usize, usize)> = interactions
            .iter()
            .map(|(p, s)| (project_index[p], seller_index[s]))
            .collect();

        let mut order: Vec<usize> = (0..slots.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(INIT_SEED));
        let n_val = (((slots.len() as f64) * VALIDATION_FRACTION).ceil() as usize)
            .min(slots.len().saturating_sub(1));
        let (val_idx, train_idx) = order.split_at(n_val);
        let train: Vec<(usize, usize)> = train_idx.iter().map(|&i| slots[i]).collect();
        let validation: Vec<(usize, usize)> = val_idx.iter().map(|&i| slots[i]).collect();

        let mut model = Self::new(project_index.len(), seller_index.len(), params);
        model.project_index = project_index;
        model.seller_index = seller_index;

        // Implicit positives: every observed interaction carries label 1.
        let label = 1.0;
        let mut best = model.clone();
        let mut best_val_loss = f64::INFINITY;
        let mut stale_epochs = 0;
        let mut epochs_run = 0;
        let mut rng = StdRng::seed_from_u64(INIT_SEED ^ 1);

        for epoch in 0..params.epochs {
            epochs_run = epoch + 1;

            let mut epoch_order: Vec<usize> = (0..train.len()).collect();
            epoch_order.shuffle(&mut rng);
            for batch in epoch_order.chunks(params.batch_size.max(1)) {
                for &i in batch {
                    let (project_slot, seller_slot) = train[i];
                    model.backward(project_slot, seller_slot, label, params.learning_rate);
                }
            }

            let val_loss = model.loss(&validation, label);
            tracing::debug!("interaction epoch {}: val_loss={:.6}", epochs_run, val_loss);

            if val_loss < best_val_loss {
                best_val_loss = val_loss;
                best = model.clone();
                stale_epochs = 0;
                if let Some(path) = checkpoint {
                    save_artifact(path, &best)?;
                }
            } else {
                stale_epochs += 1;
                if stale_epochs >= params.patience {
                    tracing::info!("interaction training early-stopped at epoch {}", epochs_run);
                    break;
                }
            }
        }

        let report = InteractionReport {
            pairs: slots.len(),
            n_projects: best.project_index.len(),
            n_sellers: best.seller_index.len(),
            epochs_run,
            best_val_loss,
        };

        Ok((best, report))
    }

    /// Interaction probability for a (project, seller) pair.
    ///
    /// Unseen ids fall back to the padding embedding at index 0.
    pub fn score(&self, project_id: i64, seller_id: i64) -> f64 {
        let project_slot = self.project_index.get(&project_id).copied().unwrap_or(0);
        let seller_slot = self.seller_index.get(&seller_id).copied().unwrap_or(0);
        self.forward(project_slot, seller_slot).probability
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let a_col = a.view().insert_axis(Axis(1));
    let b_row = b.view().insert_axis(Axis(0));
    a_col.dot(&b_row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectStatus, ProposalStatus};
    use chrono::Utc;

    fn project(id: i64) -> ProjectRow {
        ProjectRow {
            id,
            title: format!("Project {}", id),
            description: "Some work".to_string(),
            budget: 100.0,
            status: ProjectStatus::Open,
            buyer_id: 1,
            created_at: Utc::now(),
            buyer_name: "Buyer".to_string(),
            buyer_email: "buyer@example.com".to_string(),
        }
    }

    fn proposal(id: i64, project_id: i64, seller_id: i64) -> ProposalRow {
        ProposalRow {
            id,
            service_details: "I can do this".to_string(),
            price: 90.0,
            delivery_time: 7,
            status: ProposalStatus::Pending,
            project_id,
            seller_id,
            created_at: Utc::now(),
            seller_name: format!("Seller {}", seller_id),
            seller_email: "seller@example.com".to_string(),
        }
    }

    fn tiny_params() -> InteractionParams {
        InteractionParams {
            embedding_size: 8,
            learning_rate: 0.05,
            batch_size: 4,
            epochs: 5,
            patience: 3,
        }
    }

    fn training_data() -> (Vec<ProjectRow>, Vec<ProposalRow>) {
        let projects: Vec<ProjectRow> = (1..=6).map(project).collect();
        let proposals: Vec<ProposalRow> = (0..12)
            .map(|i| proposal(i, (i % 6) + 1, (i % 3) + 1))
            .collect();
        (projects, proposals)
    }

    #[test]
    fn test_fit_requires_interactions() {
        let projects = vec![project(1)];
        let result = InteractionModel::fit(&projects, &[], &tiny_params(), None);
        assert!(matches!(result, Err(ModelError::DataUnavailable(_))));
    }

    #[test]
    fn test_scores_are_probabilities() {
        let (projects, proposals) = training_data();
        let (model, report) =
            InteractionModel::fit(&projects, &proposals, &tiny_params(), None).unwrap();

        assert_eq!(report.pairs, 12);
        for project_id in 1..=6 {
            for seller_id in 1..=3 {
                let score = model.score(project_id, seller_id);
                assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
            }
        }
    }

    #[test]
    fn test_unseen_ids_use_padding_slot() {
        let (projects, proposals) = training_data();
        let (model, _) =
            InteractionModel::fit(&projects, &proposals, &tiny_params(), None).unwrap();

        // Both fully-unseen pairs resolve to the same padding embeddings.
        assert_eq!(model.score(999, 999), model.score(888, 888));
    }

    #[test]
    fn test_positive_only_training_raises_scores() {
        let (projects, proposals) = training_data();
        let params = tiny_params();

        let fresh = InteractionModel::new(6, 3, &params);
        let (trained, _) = InteractionModel::fit(&projects, &proposals, &params, None).unwrap();

        // All labels are 1, so training should push observed pairs upward.
        let before = fresh.forward(1, 1).probability;
        let after = trained.score(1, 1);
        assert!(after > before);
    }

    #[test]
    fn test_checkpoint_written_on_improvement() {
        let (projects, proposals) = training_data();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interaction.bin");

        InteractionModel::fit(&projects, &proposals, &tiny_params(), Some(path.as_path())).unwrap();
        assert!(path.exists());
    }
}
