use nalgebra::Vector3;
use serde::Serialize;
use tracing::debug;

use super::issue::{Issue, IssueKind, Severity};
use crate::config::{PostureConfig, SeverityWeights};
use crate::error::AnalysisError;
use crate::geometry::{abs_diff_component, angle_at, angle_between_2d, midpoint, vector_xy, Axis};
use crate::pose::{Landmark, LandmarkFrame, LandmarkIndex, Side};

const NO_ISSUES_RECOMMENDATION: &str = "Your posture looks great! Keep maintaining good alignment.";

/// 関節角度・臨床可動域・Cobb角プロキシ（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointAngles {
    /// 鼻を頂点とした左肩と鉛直参照点のなす角
    pub neck_forward: f32,
    pub left_shoulder: f32,
    pub right_shoulder: f32,
    pub left_hip: f32,
    pub right_hip: f32,
    pub left_knee: f32,
    pub right_knee: f32,
    pub rom_shoulder_flexion_left: f32,
    pub rom_shoulder_flexion_right: f32,
    pub rom_knee_flexion_left: f32,
    pub rom_knee_flexion_right: f32,
    pub rom_hip_flexion_left: f32,
    pub rom_hip_flexion_right: f32,
    /// 肩ラインと腰ラインのなす角（前額面）
    pub cobb_angle_proxy: f32,
}

/// 正規化座標での傾き・ずれ
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alignment {
    pub shoulder_tilt: f32,
    pub hip_tilt: f32,
    pub spine_lean: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Symmetry {
    pub shoulder_symmetry: f32,
    pub hip_symmetry: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureReport {
    #[serde(rename = "posture_score")]
    pub score: f32,
    pub angles: JointAngles,
    #[serde(rename = "deviations")]
    pub alignment: Alignment,
    pub symmetry: Symmetry,
    /// 検出順（優先度順ではない）
    #[serde(rename = "issues_detected")]
    pub issues: Vec<Issue>,
    pub severity: Severity,
    pub recommendations: String,
    /// 参照帯から外れた可動域メトリクス名（参考情報）
    pub rom_out_of_range: Vec<&'static str>,
}

pub struct PostureAnalyzer {
    config: PostureConfig,
}

impl PostureAnalyzer {
    pub fn new(config: PostureConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, landmarks: &[Landmark]) -> Result<PostureReport, AnalysisError> {
        let frame = LandmarkFrame::from_slice(landmarks)?;
        Ok(self.analyze_frame(&frame))
    }

    pub fn analyze_frame(&self, frame: &LandmarkFrame) -> PostureReport {
        let angles = compute_angles(frame);
        let alignment = compute_alignment(frame);
        let symmetry = compute_symmetry(frame);

        let issues = self.detect_issues(&angles, &alignment, &symmetry);
        let score = posture_score(&issues, &self.config.weights);
        let severity = self.overall_severity(score);
        let recommendations = recommendations_for(&issues);
        let rom_out_of_range = self.rom_out_of_range(&angles);

        debug!(
            score,
            neck_forward = angles.neck_forward,
            cobb_angle_proxy = angles.cobb_angle_proxy,
            spine_lean = alignment.spine_lean,
            issues = issues.len(),
            "posture analyzed"
        );

        PostureReport {
            score,
            angles,
            alignment,
            symmetry,
            issues,
            severity,
            recommendations,
            rom_out_of_range,
        }
    }

    fn detect_issues(
        &self,
        angles: &JointAngles,
        alignment: &Alignment,
        symmetry: &Symmetry,
    ) -> Vec<Issue> {
        let cfg = &self.config;
        let mut issues = Vec::new();

        if angles.neck_forward < cfg.neck_forward_min {
            let severity = if angles.neck_forward <= cfg.neck_forward_high {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::new(IssueKind::ForwardHeadPosture, severity));
        }

        if angles.left_shoulder < cfg.shoulder_angle_min
            || angles.right_shoulder < cfg.shoulder_angle_min
        {
            issues.push(Issue::new(IssueKind::RoundedShoulders, Severity::Medium));
        }

        if symmetry.shoulder_symmetry > cfg.shoulder_symmetry_max {
            issues.push(Issue::new(IssueKind::ShoulderAsymmetry, Severity::Low));
        }

        if symmetry.hip_symmetry > cfg.hip_symmetry_max {
            issues.push(Issue::new(IssueKind::HipAsymmetry, Severity::Low));
        }

        if angles.cobb_angle_proxy > cfg.cobb_angle_max {
            let severity = if angles.cobb_angle_proxy > cfg.cobb_angle_high {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::new(IssueKind::PotentialScoliosis, severity));
        }

        if alignment.spine_lean > cfg.spine_lean_max {
            issues.push(Issue::new(IssueKind::LateralSpineLean, Severity::Medium));
        }

        for issue in &issues {
            debug!(name = issue.name(), severity = %issue.severity, "posture issue");
        }
        issues
    }

    fn overall_severity(&self, score: f32) -> Severity {
        if score >= self.config.score_low_min {
            Severity::Low
        } else if score >= self.config.score_medium_min {
            Severity::Medium
        } else {
            Severity::High
        }
    }

    /// 可動域は参照帯と比較するだけで、問題判定やスコアには使わない
    fn rom_out_of_range(&self, angles: &JointAngles) -> Vec<&'static str> {
        let rom = &self.config.rom;
        [
            ("rom_shoulder_flexion_left", angles.rom_shoulder_flexion_left, rom.shoulder_flexion),
            ("rom_shoulder_flexion_right", angles.rom_shoulder_flexion_right, rom.shoulder_flexion),
            ("rom_knee_flexion_left", angles.rom_knee_flexion_left, rom.knee_flexion),
            ("rom_knee_flexion_right", angles.rom_knee_flexion_right, rom.knee_flexion),
            ("rom_hip_flexion_left", angles.rom_hip_flexion_left, rom.hip_flexion),
            ("rom_hip_flexion_right", angles.rom_hip_flexion_right, rom.hip_flexion),
        ]
        .into_iter()
        .filter(|(_, degrees, band)| !band.contains(*degrees))
        .map(|(name, _, _)| name)
        .collect()
    }
}

impl Default for PostureAnalyzer {
    fn default() -> Self {
        Self::new(PostureConfig::default())
    }
}

/// 100 から severity ごとの重みを引き、[0, 100] に収める
pub fn posture_score(issues: &[Issue], weights: &SeverityWeights) -> f32 {
    let deduction: f32 = issues.iter().map(|issue| issue.severity.weight(weights)).sum();
    (100.0 - deduction).clamp(0.0, 100.0)
}

fn recommendations_for(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return NO_ISSUES_RECOMMENDATION.to_string();
    }
    let mut seen: Vec<IssueKind> = Vec::with_capacity(issues.len());
    let mut sentences = Vec::new();
    for issue in issues {
        if seen.contains(&issue.kind) {
            continue;
        }
        seen.push(issue.kind);
        if let Some(sentence) = issue.kind.recommendation() {
            sentences.push(sentence);
        }
    }
    sentences.join(" ")
}

fn compute_angles(frame: &LandmarkFrame) -> JointAngles {
    let nose = frame.position(LandmarkIndex::Nose);
    // 鼻の真下（x, z は鼻と同じ）で y=0 の点を鉛直参照にする
    let vertical_ref = Vector3::new(nose.x, 0.0, nose.z);
    let neck_forward = angle_at(&nose, &frame.position(LandmarkIndex::LeftShoulder), &vertical_ref);

    let left = side_angles(frame, Side::Left);
    let right = side_angles(frame, Side::Right);

    JointAngles {
        neck_forward,
        left_shoulder: left.shoulder,
        right_shoulder: right.shoulder,
        left_hip: left.hip,
        right_hip: right.hip,
        left_knee: left.knee,
        right_knee: right.knee,
        rom_shoulder_flexion_left: left.shoulder_flexion,
        rom_shoulder_flexion_right: right.shoulder_flexion,
        rom_knee_flexion_left: 180.0 - left.knee,
        rom_knee_flexion_right: 180.0 - right.knee,
        rom_hip_flexion_left: 180.0 - left.hip,
        rom_hip_flexion_right: 180.0 - right.hip,
        cobb_angle_proxy: cobb_angle_proxy(frame),
    }
}

struct SideAngles {
    shoulder: f32,
    hip: f32,
    knee: f32,
    shoulder_flexion: f32,
}

fn side_angles(frame: &LandmarkFrame, side: Side) -> SideAngles {
    let shoulder = frame.position(side.shoulder());
    let elbow = frame.position(side.elbow());
    let hip = frame.position(side.hip());
    let knee = frame.position(side.knee());
    let ankle = frame.position(side.ankle());

    SideAngles {
        shoulder: angle_at(&shoulder, &elbow, &hip),
        hip: angle_at(&hip, &knee, &shoulder),
        knee: angle_at(&knee, &ankle, &hip),
        shoulder_flexion: angle_at(&shoulder, &hip, &elbow),
    }
}

fn cobb_angle_proxy(frame: &LandmarkFrame) -> f32 {
    let shoulders = vector_xy(
        &frame.position(LandmarkIndex::LeftShoulder),
        &frame.position(LandmarkIndex::RightShoulder),
    );
    let hips = vector_xy(
        &frame.position(LandmarkIndex::LeftHip),
        &frame.position(LandmarkIndex::RightHip),
    );
    angle_between_2d(&shoulders, &hips)
}

fn compute_alignment(frame: &LandmarkFrame) -> Alignment {
    let ls = frame.position(LandmarkIndex::LeftShoulder);
    let rs = frame.position(LandmarkIndex::RightShoulder);
    let lh = frame.position(LandmarkIndex::LeftHip);
    let rh = frame.position(LandmarkIndex::RightHip);

    Alignment {
        shoulder_tilt: abs_diff_component(&ls, &rs, Axis::Y),
        hip_tilt: abs_diff_component(&lh, &rh, Axis::Y),
        spine_lean: abs_diff_component(&midpoint(&ls, &rs), &midpoint(&lh, &rh), Axis::X),
    }
}

fn compute_symmetry(frame: &LandmarkFrame) -> Symmetry {
    Symmetry {
        shoulder_symmetry: abs_diff_component(
            &frame.position(LandmarkIndex::LeftShoulder),
            &frame.position(LandmarkIndex::RightShoulder),
            Axis::Y,
        ),
        hip_symmetry: abs_diff_component(
            &frame.position(LandmarkIndex::LeftHip),
            &frame.position(LandmarkIndex::RightHip),
            Axis::Y,
        ),
    }
}
