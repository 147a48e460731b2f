use std::path::PathBuf;
use thiserror::Error;

/// An Error enum capturing the errors produced by the matching core.
#[derive(Error, Debug)]
pub enum MatchError {
    /// The feature file is missing required fields or has an invalid shape.
    #[error("Corrupt feature file {path}: {reason}")]
    CorruptFeatureFile { path: PathBuf, reason: String },
    /// Descriptors cannot be compared, or a descriptor is badly encoded.
    #[error("Descriptor shape mismatch: {0}")]
    DescriptorShapeMismatch(String),
    /// A configuration value is out of range.
    #[error("Invalid matcher config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Some other error has occurred.
    #[error("Err: {0}")]
    Other(String),
}

impl MatchError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorruptFeatureFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<String> for MatchError {
    fn from(mes: String) -> Self {
        Self::Other(mes)
    }
}

impl From<&str> for MatchError {
    fn from(mes: &str) -> Self {
        Self::Other(mes.to_owned())
    }
}
