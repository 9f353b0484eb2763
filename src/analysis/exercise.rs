use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::ExerciseConfig;
use crate::error::AnalysisError;
use crate::geometry::{abs_diff_component, angle_at, Axis};
use crate::pose::{Landmark, LandmarkFrame, Side};

pub const GO_LOWER: &str = "GO LOWER";
pub const DEPTH_GOOD: &str = "DEPTH GOOD";
pub const KNEES_OUT: &str = "KNEES OUT";
pub const STRAIGHTEN_BACK: &str = "STRAIGHTEN BACK";
pub const GO_DOWN: &str = "GO DOWN";
pub const HIP_TOO_HIGH_LOW: &str = "HIP TOO HIGH/LOW";
pub const GOOD_ALIGNMENT: &str = "GOOD ALIGNMENT";

/// 腕立て伏せとプランクは左半身を代表として使う（スクワットは両脚を見る）
const REPRESENTATIVE_SIDE: Side = Side::Left;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exercise {
    Squat,
    Pushup,
    Plank,
}

impl Exercise {
    pub fn as_str(self) -> &'static str {
        match self {
            Exercise::Squat => "squat",
            Exercise::Pushup => "pushup",
            Exercise::Plank => "plank",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exercise {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squat" => Ok(Exercise::Squat),
            "pushup" => Ok(Exercise::Pushup),
            "plank" => Ok(Exercise::Plank),
            other => Err(AnalysisError::UnknownAnalysisType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseFormReport {
    pub exercise: Exercise,
    pub is_correct: bool,
    pub feedback: Vec<String>,
    pub metrics: BTreeMap<String, f32>,
}

impl ExerciseFormReport {
    fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            is_correct: true,
            feedback: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    fn say(&mut self, cue: &str) {
        self.feedback.push(cue.to_string());
    }

    /// 修正が必要なキュー（is_correct を落とす）
    fn fault(&mut self, cue: &str) {
        self.is_correct = false;
        self.say(cue);
    }

    fn metric(&mut self, name: &str, value: f32) {
        self.metrics.insert(name.to_string(), value);
    }
}

pub struct ExerciseAnalyzer {
    config: ExerciseConfig,
}

impl ExerciseAnalyzer {
    pub fn new(config: ExerciseConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        exercise: Exercise,
        landmarks: &[Landmark],
    ) -> Result<ExerciseFormReport, AnalysisError> {
        let frame = LandmarkFrame::from_slice(landmarks)?;
        Ok(self.analyze_frame(exercise, &frame))
    }

    pub fn analyze_frame(&self, exercise: Exercise, frame: &LandmarkFrame) -> ExerciseFormReport {
        let report = match exercise {
            Exercise::Squat => self.squat(frame),
            Exercise::Pushup => self.pushup(frame),
            Exercise::Plank => self.plank(frame),
        };
        debug!(
            exercise = %exercise,
            is_correct = report.is_correct,
            feedback = ?report.feedback,
            "exercise form analyzed"
        );
        report
    }

    /// 深さ（腰と膝の高さ）とニーイン（膝幅 vs 足首幅）
    pub fn squat(&self, frame: &LandmarkFrame) -> ExerciseFormReport {
        let mut report = ExerciseFormReport::new(Exercise::Squat);

        let left_hip = frame.position(Side::Left.hip());
        let right_hip = frame.position(Side::Right.hip());
        let left_knee = frame.position(Side::Left.knee());
        let right_knee = frame.position(Side::Right.knee());

        // yは下向きが正: 正なら腰が膝と同じかそれより下
        let depth_score = (left_hip.y + right_hip.y) / 2.0 - (left_knee.y + right_knee.y) / 2.0;
        if depth_score < self.config.squat_depth_min {
            report.fault(GO_LOWER);
        } else {
            report.say(DEPTH_GOOD);
        }

        let knee_width = abs_diff_component(&left_knee, &right_knee, Axis::X);
        let ankle_width = abs_diff_component(
            &frame.position(Side::Left.ankle()),
            &frame.position(Side::Right.ankle()),
            Axis::X,
        );
        if knee_width < ankle_width * self.config.knee_valgus_ratio {
            report.fault(KNEES_OUT);
        }

        report.metric("depth_score", depth_score);
        report.metric("knee_width_ratio", knee_width / (ankle_width + 1e-6));
        report
    }

    /// 体幹ライン（肩-腰-足首）と肘の深さは独立に評価する
    pub fn pushup(&self, frame: &LandmarkFrame) -> ExerciseFormReport {
        let mut report = ExerciseFormReport::new(Exercise::Pushup);
        let side = REPRESENTATIVE_SIDE;

        let shoulder = frame.position(side.shoulder());
        let hip_angle = angle_at(
            &frame.position(side.hip()),
            &shoulder,
            &frame.position(side.ankle()),
        );
        if hip_angle < self.config.pushup_hip_angle_min {
            report.fault(STRAIGHTEN_BACK);
        }

        let elbow_angle = angle_at(
            &frame.position(side.elbow()),
            &shoulder,
            &frame.position(side.wrist()),
        );
        // 深さは情報のみ。is_correct には影響しない
        if elbow_angle < self.config.pushup_elbow_depth {
            report.say(DEPTH_GOOD);
        } else if elbow_angle > self.config.pushup_elbow_extended {
            report.say(GO_DOWN);
        }

        report.metric("hip_angle", hip_angle);
        report.metric("elbow_angle", elbow_angle);
        report
    }

    pub fn plank(&self, frame: &LandmarkFrame) -> ExerciseFormReport {
        let mut report = ExerciseFormReport::new(Exercise::Plank);
        let side = REPRESENTATIVE_SIDE;

        let angle = angle_at(
            &frame.position(side.hip()),
            &frame.position(side.shoulder()),
            &frame.position(side.ankle()),
        );
        if angle < self.config.plank_body_angle_min {
            report.fault(HIP_TOO_HIGH_LOW);
        } else {
            report.say(GOOD_ALIGNMENT);
        }

        report.metric("body_alignment_angle", angle);
        report
    }
}

impl Default for ExerciseAnalyzer {
    fn default() -> Self {
        Self::new(ExerciseConfig::default())
    }
}
