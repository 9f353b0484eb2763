#[cfg(test)]
pub(crate) mod fixtures;
pub mod landmark;

pub use landmark::{Landmark, LandmarkFrame, LandmarkIndex, Side};
