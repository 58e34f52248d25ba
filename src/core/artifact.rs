use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::ModelError;

/// Serialize a fitted model to `path`, replacing any previous artifact.
///
/// Writes to a sibling temp file first and renames into place so a crashed
/// write never leaves a torn artifact behind.
pub fn save_artifact<T: Serialize>(path: &Path, model: &T) -> Result<(), ModelError> {
    let bytes = bincode::serialize(model)
        .map_err(|e| ModelError::TrainingFailure(format!("artifact encode: {}", e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| ModelError::TrainingFailure(format!("artifact dir: {}", e)))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| ModelError::TrainingFailure(format!("artifact write: {}", e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| ModelError::TrainingFailure(format!("artifact rename: {}", e)))?;

    Ok(())
}

/// Load a previously persisted model artifact
pub fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes =
        fs::read(path).map_err(|e| ModelError::LoadFailure(format!("{}: {}", path.display(), e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| ModelError::LoadFailure(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dummy {
        weights: Vec<f64>,
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = Dummy {
            weights: vec![1.0, 2.5, -3.0],
        };
        save_artifact(&path, &model).unwrap();
        let loaded: Dummy = load_artifact(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_missing_artifact_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<Dummy, _> = load_artifact(&dir.path().join("absent.bin"));
        assert!(matches!(result, Err(ModelError::LoadFailure(_))));
    }

    #[test]
    fn test_corrupt_artifact_is_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"not a model").unwrap();

        let result: Result<Dummy, _> = load_artifact(&path);
        assert!(matches!(result, Err(ModelError::LoadFailure(_))));
    }
}
