use crate::config::SquatConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub in_bottom_position: bool,
    /// 角度が解剖学的にありえない範囲 (ノイズ・遮蔽)
    pub out_of_range: bool,
}

/// 平滑化済み角度とフォーム判定から「ボトム姿勢か」を決める
pub struct ThresholdClassifier {
    knee_threshold: f32,
    hip_threshold: f32,
    min_angle: f32,
    max_angle: f32,
}

impl ThresholdClassifier {
    pub fn new(knee_threshold: f32, hip_threshold: f32, min_angle: f32, max_angle: f32) -> Self {
        Self {
            knee_threshold,
            hip_threshold,
            min_angle,
            max_angle,
        }
    }

    pub fn from_config(config: &SquatConfig) -> Self {
        Self::new(
            config.knee_threshold,
            config.hip_threshold,
            config.min_angle,
            config.max_angle,
        )
    }

    pub fn classify(&self, knee: f32, hip: f32, form_valid: bool) -> Classification {
        let range = self.min_angle..=self.max_angle;
        if !range.contains(&knee) || !range.contains(&hip) {
            return Classification {
                in_bottom_position: false,
                out_of_range: true,
            };
        }
        Classification {
            in_bottom_position: knee < self.knee_threshold && hip < self.hip_threshold && form_valid,
            out_of_range: false,
        }
    }
}
