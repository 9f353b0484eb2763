//! Webカメラ前のデスクワーク姿勢チェック
//!
//! ランドマーク座標は未校正なので、いずれも距離ではなく相対的なプロキシ値。

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ErgonomicsConfig;
use crate::error::AnalysisError;
use crate::geometry::distance_xy;
use crate::pose::{Landmark, LandmarkFrame, LandmarkIndex};

pub const TOO_CLOSE_TO_SCREEN: &str = "TOO CLOSE TO SCREEN";
pub const FORWARD_HEAD_POSTURE: &str = "FORWARD HEAD POSTURE";
pub const RELAX_SHOULDERS: &str = "RELAX SHOULDERS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErgonomicsReport {
    pub is_correct: bool,
    pub feedback: Vec<String>,
    pub metrics: BTreeMap<String, f32>,
}

pub struct ErgonomicsAnalyzer {
    config: ErgonomicsConfig,
}

impl ErgonomicsAnalyzer {
    pub fn new(config: ErgonomicsConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, landmarks: &[Landmark]) -> Result<ErgonomicsReport, AnalysisError> {
        let frame = LandmarkFrame::from_slice(landmarks)?;
        Ok(self.analyze_frame(&frame))
    }

    pub fn analyze_frame(&self, frame: &LandmarkFrame) -> ErgonomicsReport {
        let mut feedback = Vec::new();

        // 両目間距離が大きいほどカメラ（画面）に近い
        let ipd = distance_xy(
            &frame.position(LandmarkIndex::LeftEye),
            &frame.position(LandmarkIndex::RightEye),
        );
        if ipd > self.config.ipd_max {
            feedback.push(TOO_CLOSE_TO_SCREEN.to_string());
        }

        let ear = frame.get(LandmarkIndex::LeftEar);
        let shoulder = frame.get(LandmarkIndex::LeftShoulder);

        // 正なら耳が肩よりカメラ側にある
        let forward_head_dist = shoulder.z - ear.z;
        if forward_head_dist > self.config.forward_head_max {
            feedback.push(FORWARD_HEAD_POSTURE.to_string());
        }

        // 肩をすくめると耳との縦距離が縮む
        let ear_shoulder_dist_y = shoulder.y - ear.y;
        if ear_shoulder_dist_y < self.config.ear_shoulder_min {
            feedback.push(RELAX_SHOULDERS.to_string());
        }

        let metrics = BTreeMap::from([
            ("screen_distance_proxy".to_string(), ipd),
            ("head_forward_depth".to_string(), forward_head_dist),
            ("shoulder_elevation".to_string(), ear_shoulder_dist_y),
        ]);

        debug!(ipd, forward_head_dist, ear_shoulder_dist_y, "ergonomics analyzed");

        ErgonomicsReport {
            is_correct: feedback.is_empty(),
            feedback,
            metrics,
        }
    }
}

impl Default for ErgonomicsAnalyzer {
    fn default() -> Self {
        Self::new(ErgonomicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::fixtures::frame_with;
    use crate::pose::LandmarkIndex::*;
    use approx::assert_relative_eq;

    /// 画面から適度に離れ、耳と肩が縦に揃った状態
    fn desk_frame(eye_half_width: f32, ear_z: f32, ear_y: f32) -> LandmarkFrame {
        frame_with(&[
            (LeftEye, 0.5 - eye_half_width, 0.3, 0.0),
            (RightEye, 0.5 + eye_half_width, 0.3, 0.0),
            (LeftEar, 0.4, ear_y, ear_z),
            (LeftShoulder, 0.35, 0.6, 0.0),
        ])
    }

    #[test]
    fn test_good_desk_posture() {
        let report = ErgonomicsAnalyzer::default().analyze_frame(&desk_frame(0.04, 0.0, 0.32));
        assert!(report.is_correct);
        assert!(report.feedback.is_empty());
        assert_relative_eq!(report.metrics["screen_distance_proxy"], 0.08, epsilon = 1e-5);
        assert_relative_eq!(report.metrics["shoulder_elevation"], 0.28, epsilon = 1e-5);
    }

    #[test]
    fn test_too_close_to_screen() {
        let report = ErgonomicsAnalyzer::default().analyze_frame(&desk_frame(0.1, 0.0, 0.32));
        assert!(!report.is_correct);
        assert_eq!(report.feedback, vec![TOO_CLOSE_TO_SCREEN.to_string()]);
    }

    #[test]
    fn test_forward_head() {
        let report = ErgonomicsAnalyzer::default().analyze_frame(&desk_frame(0.04, -0.2, 0.32));
        assert!(!report.is_correct);
        assert_eq!(report.feedback, vec![FORWARD_HEAD_POSTURE.to_string()]);
        assert_relative_eq!(report.metrics["head_forward_depth"], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_shrugged_shoulders() {
        let report = ErgonomicsAnalyzer::default().analyze_frame(&desk_frame(0.04, 0.0, 0.5));
        assert!(!report.is_correct);
        assert_eq!(report.feedback, vec![RELAX_SHOULDERS.to_string()]);
    }

    #[test]
    fn test_all_triggers_in_order() {
        let report = ErgonomicsAnalyzer::default().analyze_frame(&desk_frame(0.1, -0.2, 0.5));
        assert_eq!(
            report.feedback,
            vec![
                TOO_CLOSE_TO_SCREEN.to_string(),
                FORWARD_HEAD_POSTURE.to_string(),
                RELAX_SHOULDERS.to_string(),
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let analyzer = ErgonomicsAnalyzer::default();
        let frame = desk_frame(0.1, -0.2, 0.5);
        assert_eq!(analyzer.analyze_frame(&frame), analyzer.analyze_frame(&frame));
    }

    #[test]
    fn test_invalid_frame() {
        let analyzer = ErgonomicsAnalyzer::default();
        for len in [32, 34] {
            assert!(matches!(
                analyzer.analyze(&vec![Landmark::default(); len]),
                Err(AnalysisError::InvalidFrame(_))
            ));
        }
    }
}
