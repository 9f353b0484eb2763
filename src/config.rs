use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub posture: PostureConfig,
    #[serde(default)]
    pub exercise: ExerciseConfig,
    #[serde(default)]
    pub ergonomics: ErgonomicsConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
}

/// 姿勢解析の閾値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureConfig {
    /// 頭部前方位の判定角（度）。これ未満で検出
    #[serde(default = "default_neck_forward_min")]
    pub neck_forward_min: f32,
    /// これ以下なら high
    #[serde(default = "default_neck_forward_high")]
    pub neck_forward_high: f32,
    /// 肘-肩-腰の角度（度）。左右どちらかがこれ未満で巻き肩
    #[serde(default = "default_shoulder_angle_min")]
    pub shoulder_angle_min: f32,
    /// 肩の高さ差（正規化座標）
    #[serde(default = "default_symmetry_max")]
    pub shoulder_symmetry_max: f32,
    /// 腰の高さ差（正規化座標）
    #[serde(default = "default_symmetry_max")]
    pub hip_symmetry_max: f32,
    /// Cobb角プロキシ（度）。これを超えると medium
    #[serde(default = "default_cobb_angle_max")]
    pub cobb_angle_max: f32,
    /// これを超えると high
    #[serde(default = "default_cobb_angle_high")]
    pub cobb_angle_high: f32,
    /// 肩中点と腰中点の横ずれ（正規化座標）
    #[serde(default = "default_spine_lean_max")]
    pub spine_lean_max: f32,
    /// スコアがこれ以上なら全体 severity = low
    #[serde(default = "default_score_low_min")]
    pub score_low_min: f32,
    /// スコアがこれ以上なら medium、未満なら high
    #[serde(default = "default_score_medium_min")]
    pub score_medium_min: f32,
    #[serde(default)]
    pub weights: SeverityWeights,
    #[serde(default)]
    pub rom: RomNorms,
}

fn default_neck_forward_min() -> f32 { 70.0 }
fn default_neck_forward_high() -> f32 { 60.0 }
fn default_shoulder_angle_min() -> f32 { 160.0 }
fn default_symmetry_max() -> f32 { 0.05 }
fn default_cobb_angle_max() -> f32 { 5.0 }
fn default_cobb_angle_high() -> f32 { 10.0 }
fn default_spine_lean_max() -> f32 { 0.1 }
fn default_score_low_min() -> f32 { 80.0 }
fn default_score_medium_min() -> f32 { 60.0 }

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            neck_forward_min: default_neck_forward_min(),
            neck_forward_high: default_neck_forward_high(),
            shoulder_angle_min: default_shoulder_angle_min(),
            shoulder_symmetry_max: default_symmetry_max(),
            hip_symmetry_max: default_symmetry_max(),
            cobb_angle_max: default_cobb_angle_max(),
            cobb_angle_high: default_cobb_angle_high(),
            spine_lean_max: default_spine_lean_max(),
            score_low_min: default_score_low_min(),
            score_medium_min: default_score_medium_min(),
            weights: SeverityWeights::default(),
            rom: RomNorms::default(),
        }
    }
}

/// severity ごとのスコア減点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityWeights {
    #[serde(default = "default_weight_low")]
    pub low: f32,
    #[serde(default = "default_weight_medium")]
    pub medium: f32,
    #[serde(default = "default_weight_high")]
    pub high: f32,
}

fn default_weight_low() -> f32 { 5.0 }
fn default_weight_medium() -> f32 { 15.0 }
fn default_weight_high() -> f32 { 25.0 }

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: default_weight_low(),
            medium: default_weight_medium(),
            high: default_weight_high(),
        }
    }
}

/// 可動域の参照帯（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RomBand {
    pub min: f32,
    pub max: f32,
}

impl RomBand {
    pub fn contains(&self, degrees: f32) -> bool {
        (self.min..=self.max).contains(&degrees)
    }
}

/// AAOS の臨床基準値
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RomNorms {
    #[serde(default = "default_rom_shoulder_flexion")]
    pub shoulder_flexion: RomBand,
    #[serde(default = "default_rom_knee_flexion")]
    pub knee_flexion: RomBand,
    #[serde(default = "default_rom_hip_flexion")]
    pub hip_flexion: RomBand,
}

fn default_rom_shoulder_flexion() -> RomBand { RomBand { min: 160.0, max: 180.0 } }
fn default_rom_knee_flexion() -> RomBand { RomBand { min: 130.0, max: 150.0 } }
fn default_rom_hip_flexion() -> RomBand { RomBand { min: 110.0, max: 130.0 } }

impl Default for RomNorms {
    fn default() -> Self {
        Self {
            shoulder_flexion: default_rom_shoulder_flexion(),
            knee_flexion: default_rom_knee_flexion(),
            hip_flexion: default_rom_hip_flexion(),
        }
    }
}

/// エクササイズフォームの閾値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    /// avg(hip.y) - avg(knee.y) がこれ未満なら浅すぎ
    #[serde(default = "default_squat_depth_min")]
    pub squat_depth_min: f32,
    /// 膝幅 / 足首幅 がこれ未満ならニーイン
    #[serde(default = "default_knee_valgus_ratio")]
    pub knee_valgus_ratio: f32,
    /// 肩-腰-足首の角度（度）
    #[serde(default = "default_body_line_min")]
    pub pushup_hip_angle_min: f32,
    /// 肘角度がこれ未満で十分な深さ
    #[serde(default = "default_pushup_elbow_depth")]
    pub pushup_elbow_depth: f32,
    /// 肘角度がこれを超えると伸びきり
    #[serde(default = "default_pushup_elbow_extended")]
    pub pushup_elbow_extended: f32,
    #[serde(default = "default_body_line_min")]
    pub plank_body_angle_min: f32,
}

fn default_squat_depth_min() -> f32 { -0.1 }
fn default_knee_valgus_ratio() -> f32 { 0.8 }
fn default_body_line_min() -> f32 { 160.0 }
fn default_pushup_elbow_depth() -> f32 { 90.0 }
fn default_pushup_elbow_extended() -> f32 { 160.0 }

impl Default for ExerciseConfig {
    fn default() -> Self {
        Self {
            squat_depth_min: default_squat_depth_min(),
            knee_valgus_ratio: default_knee_valgus_ratio(),
            pushup_hip_angle_min: default_body_line_min(),
            pushup_elbow_depth: default_pushup_elbow_depth(),
            pushup_elbow_extended: default_pushup_elbow_extended(),
            plank_body_angle_min: default_body_line_min(),
        }
    }
}

/// Webカメラ前のデスクワーク向け閾値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErgonomicsConfig {
    /// 両目間距離（正規化座標）。大きいほど画面に近い
    #[serde(default = "default_ipd_max")]
    pub ipd_max: f32,
    /// 肩z - 耳z
    #[serde(default = "default_forward_head_max")]
    pub forward_head_max: f32,
    /// 肩y - 耳y。これ未満は肩のすくみ
    #[serde(default = "default_ear_shoulder_min")]
    pub ear_shoulder_min: f32,
}

fn default_ipd_max() -> f32 { 0.15 }
fn default_forward_head_max() -> f32 { 0.1 }
fn default_ear_shoulder_min() -> f32 { 0.15 }

impl Default for ErgonomicsConfig {
    fn default() -> Self {
        Self {
            ipd_max: default_ipd_max(),
            forward_head_max: default_forward_head_max(),
            ear_shoulder_min: default_ear_shoulder_min(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// 太もも（腰→膝）の縦成分がこれ未満なら水平とみなす
    #[serde(default = "default_thigh_horizontal_max")]
    pub thigh_horizontal_max: f32,
}

fn default_thigh_horizontal_max() -> f32 { 0.15 }

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            thigh_horizontal_max: default_thigh_horizontal_max(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// ファイルがなければデフォルト、壊れていれば警告してデフォルト
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using default thresholds", e);
                Self::default()
            }
        }
    }
}
