pub mod activity;
pub mod ergonomics;
pub mod exercise;
pub mod issue;
pub mod posture;

pub use activity::{ActivityClassifier, ActivityState};
pub use ergonomics::{ErgonomicsAnalyzer, ErgonomicsReport};
pub use exercise::{Exercise, ExerciseAnalyzer, ExerciseFormReport};
pub use issue::{Issue, IssueKind, Severity};
pub use posture::{posture_score, Alignment, JointAngles, PostureAnalyzer, PostureReport, Symmetry};

use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::pose::{Landmark, LandmarkFrame};

/// 呼び出し側が指定する解析種別トークン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Squat,
    Pushup,
    Plank,
    Ergonomics,
}

impl AnalysisType {
    /// 空トークンは「フォーム解析なし」
    pub fn from_token(token: &str) -> Result<Option<Self>, AnalysisError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        token.parse().map(Some)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Squat => "squat",
            AnalysisType::Pushup => "pushup",
            AnalysisType::Plank => "plank",
            AnalysisType::Ergonomics => "ergonomics",
        }
    }

    pub fn exercise(self) -> Option<Exercise> {
        match self {
            AnalysisType::Squat => Some(Exercise::Squat),
            AnalysisType::Pushup => Some(Exercise::Pushup),
            AnalysisType::Plank => Some(Exercise::Plank),
            AnalysisType::Ergonomics => None,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ergonomics" => Ok(AnalysisType::Ergonomics),
            other => other.parse::<Exercise>().map(|exercise| match exercise {
                Exercise::Squat => AnalysisType::Squat,
                Exercise::Pushup => AnalysisType::Pushup,
                Exercise::Plank => AnalysisType::Plank,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormAnalysis {
    Exercise(ExerciseFormReport),
    Ergonomics(ErgonomicsReport),
}

/// エルゴノミクス結果にも既存レスポンスと同じ `"exercise": "ergonomics"` を付ける
#[derive(Serialize)]
struct TaggedErgonomics<'a> {
    exercise: &'static str,
    #[serde(flatten)]
    report: &'a ErgonomicsReport,
}

impl Serialize for FormAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FormAnalysis::Exercise(report) => report.serialize(serializer),
            FormAnalysis::Ergonomics(report) => TaggedErgonomics {
                exercise: AnalysisType::Ergonomics.as_str(),
                report,
            }
            .serialize(serializer),
        }
    }
}

/// 1フレームの検出結果。活動状態は常に含む
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAnalysis {
    pub activity: ActivityState,
    pub exercise_analysis: Option<FormAnalysis>,
}

/// 4つのアナライザを1つの設定からまとめて構築したもの
pub struct Analyzer {
    posture: PostureAnalyzer,
    exercise: ExerciseAnalyzer,
    ergonomics: ErgonomicsAnalyzer,
    activity: ActivityClassifier,
}

impl Analyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            posture: PostureAnalyzer::new(config.posture.clone()),
            exercise: ExerciseAnalyzer::new(config.exercise.clone()),
            ergonomics: ErgonomicsAnalyzer::new(config.ergonomics.clone()),
            activity: ActivityClassifier::new(config.activity.clone()),
        }
    }

    pub fn posture(&self, landmarks: &[Landmark]) -> Result<PostureReport, AnalysisError> {
        self.posture.analyze(landmarks)
    }

    pub fn detect(
        &self,
        landmarks: &[Landmark],
        analysis_type: Option<AnalysisType>,
    ) -> Result<FrameAnalysis, AnalysisError> {
        let frame = LandmarkFrame::from_slice(landmarks)?;
        Ok(self.detect_frame(&frame, analysis_type))
    }

    pub fn detect_frame(
        &self,
        frame: &LandmarkFrame,
        analysis_type: Option<AnalysisType>,
    ) -> FrameAnalysis {
        let exercise_analysis = analysis_type.map(|kind| match kind.exercise() {
            Some(exercise) => FormAnalysis::Exercise(self.exercise.analyze_frame(exercise, frame)),
            None => FormAnalysis::Ergonomics(self.ergonomics.analyze_frame(frame)),
        });
        FrameAnalysis {
            activity: self.activity.classify_frame(frame),
            exercise_analysis,
        }
    }

    /// フレームごとに独立して並列評価する。結果は入力順
    pub fn posture_batch(&self, frames: &[Vec<Landmark>]) -> Vec<Result<PostureReport, AnalysisError>> {
        frames.par_iter().map(|landmarks| self.posture(landmarks)).collect()
    }

    pub fn detect_batch(
        &self,
        frames: &[Vec<Landmark>],
        analysis_type: Option<AnalysisType>,
    ) -> Vec<Result<FrameAnalysis, AnalysisError>> {
        frames
            .par_iter()
            .map(|landmarks| self.detect(landmarks, analysis_type))
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::fixtures::standing_landmarks;
    use crate::pose::LandmarkIndex;

    #[test]
    fn test_analysis_type_tokens() {
        assert_eq!(AnalysisType::from_token("squat"), Ok(Some(AnalysisType::Squat)));
        assert_eq!(AnalysisType::from_token("pushup"), Ok(Some(AnalysisType::Pushup)));
        assert_eq!(AnalysisType::from_token("plank"), Ok(Some(AnalysisType::Plank)));
        assert_eq!(AnalysisType::from_token("ergonomics"), Ok(Some(AnalysisType::Ergonomics)));
        assert_eq!(AnalysisType::from_token(""), Ok(None));
        assert_eq!(
            AnalysisType::from_token("yoga"),
            Err(AnalysisError::UnknownAnalysisType("yoga".to_string()))
        );
    }

    #[test]
    fn test_detect_without_form_analysis() {
        let result = Analyzer::default().detect(&standing_landmarks(), None).unwrap();
        assert_eq!(result.activity, ActivityState::Standing);
        assert!(result.exercise_analysis.is_none());
    }

    #[test]
    fn test_detect_dispatches_exercise() {
        let result = Analyzer::default()
            .detect(&standing_landmarks(), Some(AnalysisType::Squat))
            .unwrap();
        match result.exercise_analysis {
            Some(FormAnalysis::Exercise(report)) => {
                assert_eq!(report.exercise, Exercise::Squat);
                // 立位では腰が膝より十分高い
                assert!(report.feedback.contains(&exercise::GO_LOWER.to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_detect_dispatches_ergonomics() {
        let result = Analyzer::default()
            .detect(&standing_landmarks(), Some(AnalysisType::Ergonomics))
            .unwrap();
        assert!(matches!(result.exercise_analysis, Some(FormAnalysis::Ergonomics(_))));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["activity"], "Standing");
        assert_eq!(json["exercise_analysis"]["exercise"], "ergonomics");
        assert!(json["exercise_analysis"]["metrics"]["screen_distance_proxy"].is_number());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_errors() {
        let good = standing_landmarks();
        let mut leaning = standing_landmarks();
        leaning[LandmarkIndex::Nose as usize].y = -0.8;
        let short = vec![Landmark::default(); 32];

        let frames = vec![good.clone(), short, leaning, good];
        let results = Analyzer::default().posture_batch(&frames);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().score, 100.0);
        assert!(matches!(results[1], Err(AnalysisError::InvalidFrame(_))));
        assert_eq!(results[2].as_ref().unwrap().score, 75.0);
        assert_eq!(results[3], results[0]);
    }

    #[test]
    fn test_detect_batch_matches_sequential() {
        let analyzer = Analyzer::default();
        let frames = vec![standing_landmarks(); 8];
        let batch = analyzer.detect_batch(&frames, Some(AnalysisType::Plank));
        for (landmarks, result) in frames.iter().zip(&batch) {
            assert_eq!(result, &analyzer.detect(landmarks, Some(AnalysisType::Plank)));
        }
    }

    #[test]
    fn test_invalid_frame_for_every_analysis() {
        let analyzer = Analyzer::default();
        for len in [32, 34] {
            let landmarks = vec![Landmark::default(); len];
            assert!(analyzer.posture(&landmarks).is_err());
            for kind in [
                None,
                Some(AnalysisType::Squat),
                Some(AnalysisType::Pushup),
                Some(AnalysisType::Plank),
                Some(AnalysisType::Ergonomics),
            ] {
                assert!(matches!(
                    analyzer.detect(&landmarks, kind),
                    Err(AnalysisError::InvalidFrame(_))
                ));
            }
        }
    }
}
