use thiserror::Error;

/// Failures surfaced at the model component boundary.
///
/// None of these are fatal to the process: callers convert them into a
/// structured failure payload and prior in-memory model state is left
/// untouched.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Not enough data: {0}")]
    DataUnavailable(String),

    #[error("Model not trained")]
    ModelUnavailable,

    #[error("{0} not found: {1}")]
    EntityNotFound(&'static str, i64),

    #[error("Failed to load model artifact: {0}")]
    LoadFailure(String),

    #[error("Model training failed: {0}")]
    TrainingFailure(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Data source error: {0}")]
    Source(#[from] crate::services::postgres::DbError),
}

impl ModelError {
    /// HTTP status the request layer maps this failure to
    pub fn status_code(&self) -> u16 {
        match self {
            ModelError::EntityNotFound(..) => 404,
            ModelError::DataUnavailable(_) | ModelError::ModelUnavailable => 503,
            ModelError::LoadFailure(_)
            | ModelError::TrainingFailure(_)
            | ModelError::Prediction(_)
            | ModelError::Source(_) => 500,
        }
    }
}
