pub mod analysis;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pose;

pub use analysis::{AnalysisType, Analyzer, FrameAnalysis};
pub use config::Config;
pub use error::{AnalysisError, FrameError};
pub use pose::{Landmark, LandmarkFrame, LandmarkIndex};
