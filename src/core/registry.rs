use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use crate::core::artifact::{load_artifact, save_artifact};
use crate::core::error::ModelError;
use crate::core::interaction::{InteractionModel, InteractionParams, InteractionReport};
use crate::core::price::{classify_price, PricePipeline, PricePrediction, TrainingReport};
use crate::models::{PriceEvaluation, PriceRange, ProjectFields};
use crate::services::postgres::MarketDb;

const PRICE_ARTIFACT: &str = "price_model.bin";
const INTERACTION_ARTIFACT: &str = "interaction_model.bin";

/// Registry-level settings resolved from configuration
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    pub models_dir: PathBuf,
    pub price_features: Vec<String>,
    pub price_estimators: usize,
    pub interaction: InteractionParams,
    pub training_timeout: Duration,
}

/// Outcome of a load-or-train request
#[derive(Debug, Clone, Copy)]
pub enum TrainOutcome<R> {
    /// An existing artifact was loaded; no training ran
    Loaded,
    /// A new artifact was fitted and persisted
    Trained(R),
}

/// Result of evaluating a proposal price against the predicted band
#[derive(Debug, Clone)]
pub struct ProposalAssessment {
    pub evaluation: PriceEvaluation,
    pub predicted_price: f64,
    pub deviation_percent: f64,
    pub price_range: PriceRange,
}

/// A guarded slot holding one fitted model.
///
/// `gate` serializes the load-or-train transition so concurrent cold-start
/// callers produce a single run; the cache itself stays readable throughout,
/// so callers arriving mid-training can still see a previously fitted model.
struct ModelSlot<T> {
    cached: RwLock<Option<Arc<T>>>,
    gate: Mutex<()>,
}

impl<T> ModelSlot<T> {
    fn new() -> Self {
        Self {
            cached: RwLock::new(None),
            gate: Mutex::new(()),
        }
    }

    async fn get(&self) -> Option<Arc<T>> {
        self.cached.read().await.clone()
    }

    async fn set(&self, value: Arc<T>) {
        *self.cached.write().await = Some(value);
    }

    /// Return the cached model, or run `init` exactly once across all
    /// concurrent callers and cache its result. A failed `init` leaves the
    /// slot empty and is reported to every caller that triggered it.
    async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<T>, ModelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ModelError>>,
    {
        if let Some(model) = self.get().await {
            return Ok(model);
        }

        let _gate = self.gate.lock().await;
        // A concurrent caller may have filled the slot while we waited.
        if let Some(model) = self.get().await {
            return Ok(model);
        }

        let model = Arc::new(init().await?);
        self.set(model.clone()).await;
        Ok(model)
    }
}

/// Owns one guarded slot per model kind and the load-or-train transitions.
///
/// Replaces ad hoc lazily-initialized process-wide model state: all access
/// goes through `get_or_init`/`train_*`, which single-flight cold starts and
/// never leave a slot partially updated: a failed train or load keeps the
/// previous model (if any) serving.
pub struct ModelRegistry {
    db: Arc<MarketDb>,
    settings: RegistrySettings,
    price: ModelSlot<PricePipeline>,
    interaction: ModelSlot<InteractionModel>,
}

impl ModelRegistry {
    pub fn new(db: Arc<MarketDb>, settings: RegistrySettings) -> Self {
        Self {
            db,
            settings,
            price: ModelSlot::new(),
            interaction: ModelSlot::new(),
        }
    }

    pub fn price_artifact_path(&self) -> PathBuf {
        self.settings.models_dir.join(PRICE_ARTIFACT)
    }

    pub fn interaction_artifact_path(&self) -> PathBuf {
        self.settings.models_dir.join(INTERACTION_ARTIFACT)
    }

    /// Which artifacts are currently present on disk
    pub fn artifact_presence(&self) -> (bool, bool) {
        (
            self.price_artifact_path().exists(),
            self.interaction_artifact_path().exists(),
        )
    }

    fn load_slot_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
        if !path.exists() {
            return Err(ModelError::ModelUnavailable);
        }
        load_artifact(path)
    }

    /// The fitted price pipeline: cached, or loaded from disk.
    ///
    /// Fails with `ModelUnavailable` when nothing has been trained yet and
    /// `LoadFailure` when an artifact exists but cannot be read; inference
    /// never triggers training on its own.
    pub async fn price(&self) -> Result<Arc<PricePipeline>, ModelError> {
        let path = self.price_artifact_path();
        self.price
            .get_or_init(|| async move { Self::load_slot_artifact(&path) })
            .await
    }

    /// The fitted interaction model: cached, or loaded from disk.
    ///
    /// Kept available as an alternative (project, seller) scoring strategy;
    /// the online recommendation queries do not consult it.
    pub async fn interaction(&self) -> Result<Arc<InteractionModel>, ModelError> {
        let path = self.interaction_artifact_path();
        self.interaction
            .get_or_init(|| async move { Self::load_slot_artifact(&path) })
            .await
    }

    /// Predict a market price for a raw project record
    pub async fn predict_price(
        &self,
        record: &ProjectFields,
    ) -> Result<PricePrediction, ModelError> {
        let pipeline = self.price().await?;
        Ok(pipeline.predict(record))
    }

    /// Classify a proposed price for a stored project
    pub async fn evaluate_proposal(
        &self,
        project_id: i64,
        price: f64,
    ) -> Result<ProposalAssessment, ModelError> {
        let project = self
            .db
            .get_project(project_id)
            .await?
            .ok_or(ModelError::EntityNotFound("project", project_id))?;

        let pipeline = self.price().await?;
        let prediction = pipeline.predict(&ProjectFields::from(&project));
        let (evaluation, deviation_percent, price_range) =
            classify_price(price, prediction.predicted_price);

        Ok(ProposalAssessment {
            evaluation,
            predicted_price: prediction.predicted_price,
            deviation_percent,
            price_range,
        })
    }

    async fn run_with_timeout<T, F>(&self, what: &'static str, fit: F) -> Result<T, ModelError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, ModelError> + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(fit);
        match tokio::time::timeout(self.settings.training_timeout, handle).await {
            Err(_) => Err(ModelError::TrainingFailure(format!(
                "{} training exceeded {:?}",
                what, self.settings.training_timeout
            ))),
            Ok(Err(join)) => Err(ModelError::TrainingFailure(format!(
                "{} training task failed: {}",
                what, join
            ))),
            Ok(Ok(result)) => result,
        }
    }

    /// Load-or-train the price model.
    ///
    /// With `force` false and an artifact on disk, the artifact is loaded and
    /// no training runs (a failed load falls through to retraining). The
    /// whole transition is serialized per model kind; a failure leaves any
    /// previously cached pipeline untouched.
    pub async fn train_price(
        &self,
        force: bool,
    ) -> Result<TrainOutcome<TrainingReport>, ModelError> {
        let _gate = self.price.gate.lock().await;
        let path = self.price_artifact_path();

        if !force && path.exists() {
            match load_artifact::<PricePipeline>(&path) {
                Ok(pipeline) => {
                    tracing::info!("Loaded existing price model artifact");
                    self.price.set(Arc::new(pipeline)).await;
                    return Ok(TrainOutcome::Loaded);
                }
                Err(e) => {
                    tracing::warn!("Failed to load existing price model, retraining: {}", e);
                }
            }
        }

        let rows = self.db.get_completed_projects().await?;
        let features = self.settings.price_features.clone();
        let estimators = self.settings.price_estimators;

        let (pipeline, report) = self
            .run_with_timeout("price", move || {
                PricePipeline::fit(&rows, &features, estimators)
            })
            .await?;

        save_artifact(&path, &pipeline)?;
        self.price.set(Arc::new(pipeline)).await;
        tracing::info!(
            "Price model trained on {} rows (MAE {:.2}, R2 {:.3})",
            report.rows,
            report.mae,
            report.r2
        );

        Ok(TrainOutcome::Trained(report))
    }

    /// Load-or-train the interaction model.
    ///
    /// Training checkpoints the best validation state directly to the
    /// artifact path, so an interrupted run can still leave the last
    /// improvement behind.
    pub async fn train_interaction(
        &self,
        force: bool,
    ) -> Result<TrainOutcome<InteractionReport>, ModelError> {
        let _gate = self.interaction.gate.lock().await;
        let path = self.interaction_artifact_path();

        if !force && path.exists() {
            match load_artifact::<InteractionModel>(&path) {
                Ok(model) => {
                    tracing::info!("Loaded existing interaction model artifact");
                    self.interaction.set(Arc::new(model)).await;
                    return Ok(TrainOutcome::Loaded);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load existing interaction model, retraining: {}",
                        e
                    );
                }
            }
        }

        let projects = self.db.get_projects().await?;
        let proposals = self.db.get_proposals().await?;
        let params = self.settings.interaction;
        let checkpoint = path.clone();

        let (model, report) = self
            .run_with_timeout("interaction", move || {
                InteractionModel::fit(&projects, &proposals, &params, Some(checkpoint.as_path()))
            })
            .await?;

        save_artifact(&path, &model)?;
        self.interaction.set(Arc::new(model)).await;
        tracing::info!(
            "Interaction model trained on {} pairs ({} projects, {} sellers)",
            report.pairs,
            report.n_projects,
            report.n_sellers
        );

        Ok(TrainOutcome::Trained(report))
    }

    /// Warm both model slots at startup; failures are logged and tolerated
    pub async fn warm_up(&self) {
        if let Err(e) = self.train_price(false).await {
            tracing::warn!("Price model warm-up skipped: {}", e);
        }
        if let Err(e) = self.train_interaction(false).await {
            tracing::warn!("Interaction model warm-up skipped: {}", e);
        }
    }
}
