//! Forecast model artifact persistence.
//!
//! The artifact is a JSON document whose `payload` field holds the model as
//! an embedded JSON string, with a SHA-256 checksum over exactly those
//! bytes. Writes hold `<artifact>.lock` (create-new) and land through a temp
//! file and rename, so readers never observe a partial artifact.

use chrono::{DateTime, Utc};
use rota_common::{Error, Result};
use rota_math::{RandomForestRegressor, StandardScaler};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::logging::{event_names, Stage};
use crate::math_error;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Fitted model plus the normalisation it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub feature_names: Vec<String>,
    pub target_column: String,
    pub scaler: StandardScaler,
    pub forest: RandomForestRegressor,
}

impl TrainedModel {
    /// Forest mean for one raw feature row, clamped to [0, 1].
    pub fn predict_probability(&self, raw: &[f64]) -> Result<f64> {
        let scaled = self.scaler.transform_row(raw).map_err(math_error)?;
        let value = self.forest.predict_row(&scaled).map_err(math_error)?;
        Ok(value.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Artifact {
    format_version: u32,
    trained_at: DateTime<Utc>,
    accuracy: f64,
    checksum: String,
    payload: String,
}

/// Artifact metadata returned alongside the model on load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub trained_at: DateTime<Utc>,
    pub accuracy: f64,
    pub checksum: String,
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and verify the artifact.
    pub fn load(&self) -> Result<(TrainedModel, ArtifactInfo)> {
        let content = fs::read_to_string(&self.path)?;
        let artifact: Artifact = serde_json::from_str(&content)
            .map_err(|e| Error::ArtifactCorrupted(format!("unreadable artifact: {}", e)))?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::ArtifactCorrupted(format!(
                "unsupported format version {}",
                artifact.format_version
            )));
        }
        let actual = checksum(artifact.payload.as_bytes());
        if actual != artifact.checksum {
            return Err(Error::ArtifactCorrupted(format!(
                "checksum mismatch: recorded {}, computed {}",
                artifact.checksum, actual
            )));
        }
        let model: TrainedModel = serde_json::from_str(&artifact.payload)
            .map_err(|e| Error::ArtifactCorrupted(format!("invalid model payload: {}", e)))?;

        Ok((
            model,
            ArtifactInfo {
                path: self.path.clone(),
                trained_at: artifact.trained_at,
                accuracy: artifact.accuracy,
                checksum: artifact.checksum,
            },
        ))
    }

    /// Load the artifact, or `None` when it is missing or fails verification.
    pub fn load_or_fallback(&self) -> Option<(TrainedModel, ArtifactInfo)> {
        match self.load() {
            Ok((model, info)) => {
                info!(
                    event = event_names::MODEL_LOADED,
                    stage = %Stage::Init,
                    path = %self.path.display(),
                    trained_at = %info.trained_at,
                    "forecast model loaded"
                );
                Some((model, info))
            }
            Err(err) => {
                warn!(
                    event = event_names::MODEL_FALLBACK_USED,
                    stage = %Stage::Init,
                    path = %self.path.display(),
                    error = %err,
                    "forecast model unavailable; starting untrained"
                );
                None
            }
        }
    }

    /// Atomically overwrite the artifact. Fails with `ArtifactLocked` when
    /// another writer holds the lock.
    pub fn save(&self, model: &TrainedModel, accuracy: f64) -> Result<ArtifactInfo> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let _guard = LockGuard::acquire(&self.lock_path)?;

        let payload = serde_json::to_string(model)?;
        let info = ArtifactInfo {
            path: self.path.clone(),
            trained_at: Utc::now(),
            accuracy,
            checksum: checksum(payload.as_bytes()),
        };
        let artifact = Artifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: info.trained_at,
            accuracy,
            checksum: info.checksum.clone(),
            payload,
        };

        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&artifact)?;
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        info!(
            event = event_names::MODEL_SAVED,
            stage = %Stage::Train,
            path = %self.path.display(),
            checksum = %info.checksum,
            "forecast model saved"
        );
        Ok(info)
    }
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

struct LockGuard {
    lock_path: PathBuf,
}

impl LockGuard {
    fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create_new(true).write(true).open(path);
        match file {
            Ok(mut handle) => {
                let _ = writeln!(handle, "{}", std::process::id());
                Ok(Self {
                    lock_path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::ArtifactLocked {
                    path: path.display().to_string(),
                })
            }
            Err(err) => Err(Error::Io(err)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}
