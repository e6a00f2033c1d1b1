use serde::{Deserialize, Serialize};

/// Per-asset failure. Never fatal for a batch: the asset is excluded and the
/// failure is collected alongside the successes.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("insufficient history: {bars} bars, {required} required")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("market data retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InsufficientHistory,
    RetrievalFailure,
}

impl AssetError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AssetError::InsufficientHistory { .. } => FailureKind::InsufficientHistory,
            AssetError::Retrieval(_) => FailureKind::RetrievalFailure,
        }
    }
}
