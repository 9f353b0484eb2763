use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::ActivityConfig;
use crate::error::AnalysisError;
use crate::geometry::{abs_diff_component, midpoint, Axis};
use crate::pose::{Landmark, LandmarkFrame, LandmarkIndex, Side};

/// 大まかな身体状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityState {
    Standing,
    Sitting,
    #[serde(rename = "Lying Down")]
    LyingDown,
    /// 必要なランドマークがない呼び出し側向け。分類器自体は返さない
    Unknown,
}

impl ActivityState {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityState::Standing => "Standing",
            ActivityState::Sitting => "Sitting",
            ActivityState::LyingDown => "Lying Down",
            ActivityState::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ActivityClassifier {
    config: ActivityConfig,
}

impl ActivityClassifier {
    pub fn new(config: ActivityConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, landmarks: &[Landmark]) -> Result<ActivityState, AnalysisError> {
        let frame = LandmarkFrame::from_slice(landmarks)?;
        Ok(self.classify_frame(&frame))
    }

    /// 体幹が横向きなら臥位、縦向きなら太ももの向きで座位/立位を分ける
    pub fn classify_frame(&self, frame: &LandmarkFrame) -> ActivityState {
        let mid_shoulder = midpoint(
            &frame.position(LandmarkIndex::LeftShoulder),
            &frame.position(LandmarkIndex::RightShoulder),
        );
        let mid_hip = midpoint(
            &frame.position(LandmarkIndex::LeftHip),
            &frame.position(LandmarkIndex::RightHip),
        );

        let vertical_dist = abs_diff_component(&mid_shoulder, &mid_hip, Axis::Y);
        let horizontal_dist = abs_diff_component(&mid_shoulder, &mid_hip, Axis::X);

        let state = if vertical_dist < horizontal_dist {
            ActivityState::LyingDown
        } else if self.thigh_is_horizontal(frame, Side::Left)
            && self.thigh_is_horizontal(frame, Side::Right)
        {
            ActivityState::Sitting
        } else {
            ActivityState::Standing
        };

        debug!(vertical_dist, horizontal_dist, state = %state, "activity classified");
        state
    }

    fn thigh_is_horizontal(&self, frame: &LandmarkFrame, side: Side) -> bool {
        let thigh = frame.position(side.knee()) - frame.position(side.hip());
        thigh.y.abs() < self.config.thigh_horizontal_max
    }
}

impl Default for ActivityClassifier {
    fn default() -> Self {
        Self::new(ActivityConfig::default())
    }
}
