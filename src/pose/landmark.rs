use serde::{Deserialize, Serialize};

/// BlazePose 33 ランドマークのうちスクワット判定に使う関節
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum LandmarkIndex {
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

impl LandmarkIndex {
    /// 1フレームあたりのランドマーク数 (BlazePose)
    pub const COUNT: usize = 33;

    /// 判定に必要な関節すべて
    pub const REQUIRED: [LandmarkIndex; 8] = [
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for LandmarkIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), *self as usize)
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 奥行き (腰中点基準、判定には使わない)
    #[serde(default)]
    pub z: f32,
    /// 可視度 (0.0〜1.0)
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 { 1.0 }

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視度が閾値以上か
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 2D座標 (x, y)
    pub fn point(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_within_frame() {
        let mut seen = std::collections::HashSet::new();
        for idx in LandmarkIndex::REQUIRED {
            assert!((idx as usize) < LandmarkIndex::COUNT);
            assert!(seen.insert(idx), "{} listed twice", idx);
        }
        assert_eq!(LandmarkIndex::LeftShoulder as usize, 11);
        assert_eq!(LandmarkIndex::RightAnkle as usize, 28);
    }

    #[test]
    fn test_landmark_is_visible() {
        let lm = Landmark::new(0.5, 0.5, 0.0, 0.7);
        assert!(lm.is_visible(0.5));
        assert!(!lm.is_visible(0.8));
    }

    #[test]
    fn test_landmark_deserialize_defaults() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.25,"y":0.75}"#).unwrap();
        assert_eq!(lm.point(), (0.25, 0.75));
        assert_eq!(lm.z, 0.0);
        assert_eq!(lm.visibility, 1.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(LandmarkIndex::LeftKnee.to_string(), "left_knee(25)");
    }
}
