use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::config::SeverityWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// スコアからの減点
    pub fn weight(self, weights: &SeverityWeights) -> f32 {
        match self {
            Severity::Low => weights.low,
            Severity::Medium => weights.medium,
            Severity::High => weights.high,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 検出される姿勢の問題（検出順に並ぶ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    ForwardHeadPosture,
    RoundedShoulders,
    ShoulderAsymmetry,
    HipAsymmetry,
    PotentialScoliosis,
    LateralSpineLean,
}

impl IssueKind {
    pub fn name(self) -> &'static str {
        match self {
            IssueKind::ForwardHeadPosture => "Forward Head Posture",
            IssueKind::RoundedShoulders => "Rounded Shoulders",
            IssueKind::ShoulderAsymmetry => "Shoulder Asymmetry",
            IssueKind::HipAsymmetry => "Hip Asymmetry",
            IssueKind::PotentialScoliosis => "Potential Scoliosis/Asymmetry",
            IssueKind::LateralSpineLean => "Lateral Spine Lean",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            IssueKind::ForwardHeadPosture => {
                "Your head is tilted forward, which can cause neck strain"
            }
            IssueKind::RoundedShoulders => "Your shoulders are rounded forward",
            IssueKind::ShoulderAsymmetry => "Your shoulders are not level",
            IssueKind::HipAsymmetry => "Your hips are not level",
            IssueKind::PotentialScoliosis => {
                "Significant asymmetry detected between shoulder and hip axis (Cobb Angle Proxy)."
            }
            IssueKind::LateralSpineLean => "Your spine is leaning to one side",
        }
    }

    pub fn affected_joints(self) -> &'static [&'static str] {
        match self {
            IssueKind::ForwardHeadPosture => &["neck", "upper_back"],
            IssueKind::RoundedShoulders => &["shoulders", "upper_back"],
            IssueKind::ShoulderAsymmetry => &["shoulders"],
            IssueKind::HipAsymmetry => &["hips", "lower_back"],
            IssueKind::PotentialScoliosis | IssueKind::LateralSpineLean => &["spine", "core"],
        }
    }

    /// 改善アドバイス。Cobb角プロキシには定型文がない
    pub fn recommendation(self) -> Option<&'static str> {
        match self {
            IssueKind::ForwardHeadPosture => {
                Some("Practice chin tucks and neck stretches to improve head alignment.")
            }
            IssueKind::RoundedShoulders => {
                Some("Perform shoulder blade squeezes and chest stretches.")
            }
            IssueKind::ShoulderAsymmetry => {
                Some("Focus on unilateral exercises to balance shoulder strength.")
            }
            IssueKind::HipAsymmetry => {
                Some("Work on hip mobility and core strengthening exercises.")
            }
            IssueKind::LateralSpineLean => Some("Strengthen your core and practice side planks."),
            IssueKind::PotentialScoliosis => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: Severity) -> Self {
        Self { kind, severity }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    pub fn affected_joints(&self) -> &'static [&'static str] {
        self.kind.affected_joints()
    }
}

impl Serialize for Issue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Issue", 4)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("description", self.description())?;
        state.serialize_field("affected_joints", self.affected_joints())?;
        state.end()
    }
}
