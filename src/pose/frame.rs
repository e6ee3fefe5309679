use crate::error::FrameError;
use crate::pose::{Landmark, LandmarkIndex};

/// 片脚ぶんの関節座標
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub shoulder: Landmark,
    pub hip: Landmark,
    pub knee: Landmark,
    pub ankle: Landmark,
}

/// フレームから取り出したスクワット判定用の関節
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquatFrame {
    pub left: Leg,
    pub right: Leg,
}

impl SquatFrame {
    /// ランドマーク列から必要な関節を取り出す
    ///
    /// 欠落や非有限値は `FrameError` として返す。
    pub fn extract(landmarks: &[Landmark]) -> Result<Self, FrameError> {
        for idx in LandmarkIndex::REQUIRED {
            let lm = landmarks
                .get(idx as usize)
                .ok_or(FrameError::MissingJoint(idx, landmarks.len()))?;
            if !lm.is_finite() {
                return Err(FrameError::NonFiniteCoordinate(idx));
            }
        }

        // 以降は検査済みの添字のみ
        let at = |idx: LandmarkIndex| landmarks[idx as usize];
        Ok(Self {
            left: Leg {
                shoulder: at(LandmarkIndex::LeftShoulder),
                hip: at(LandmarkIndex::LeftHip),
                knee: at(LandmarkIndex::LeftKnee),
                ankle: at(LandmarkIndex::LeftAnkle),
            },
            right: Leg {
                shoulder: at(LandmarkIndex::RightShoulder),
                hip: at(LandmarkIndex::RightHip),
                knee: at(LandmarkIndex::RightKnee),
                ankle: at(LandmarkIndex::RightAnkle),
            },
        })
    }

    /// 判定に使う8関節
    pub fn joints(&self) -> impl Iterator<Item = Landmark> {
        [self.left, self.right]
            .into_iter()
            .flat_map(|leg| [leg.shoulder, leg.hip, leg.knee, leg.ankle])
    }
}
