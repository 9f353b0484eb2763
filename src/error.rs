use thiserror::Error;

/// フレーム検証エラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("expected {expected} landmarks, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),
    #[error("unknown analysis type: {0:?}")]
    UnknownAnalysisType(String),
}
