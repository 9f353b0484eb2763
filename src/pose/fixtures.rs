//! テスト用ランドマークフレーム

use super::{Landmark, LandmarkFrame, LandmarkIndex};

/// 理想的な立位姿勢（y下向き、肩 y=-0.4、腰 y=0.0、肘は頭上）
pub fn standing_landmarks() -> Vec<Landmark> {
    use LandmarkIndex::*;
    let mut landmarks = vec![Landmark::default(); LandmarkIndex::COUNT];
    let mut set = |idx: LandmarkIndex, x: f32, y: f32| {
        landmarks[idx as usize] = Landmark::new(x, y, 0.0);
    };
    set(Nose, 0.0, -0.45);
    set(LeftShoulder, -0.2, -0.4);
    set(RightShoulder, 0.2, -0.4);
    set(LeftElbow, -0.2, -0.9);
    set(RightElbow, 0.2, -0.9);
    set(LeftHip, -0.15, 0.0);
    set(RightHip, 0.15, 0.0);
    set(LeftKnee, -0.15, 0.4);
    set(RightKnee, 0.15, 0.4);
    set(LeftAnkle, -0.15, 0.8);
    set(RightAnkle, 0.15, 0.8);
    landmarks
}

pub fn standing_frame() -> LandmarkFrame {
    frame(&standing_landmarks())
}

pub fn frame(landmarks: &[Landmark]) -> LandmarkFrame {
    LandmarkFrame::from_slice(landmarks).unwrap()
}

/// 指定ランドマークだけを置き換えたフレーム（他は原点）
pub fn frame_with(points: &[(LandmarkIndex, f32, f32, f32)]) -> LandmarkFrame {
    let mut landmarks = vec![Landmark::default(); LandmarkIndex::COUNT];
    for &(idx, x, y, z) in points {
        landmarks[idx as usize] = Landmark::new(x, y, z);
    }
    frame(&landmarks)
}
