use serde::Serialize;

use crate::config::SquatConfig;
use crate::pose::{Leg, SquatFrame};

/// フォーム不良の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormIssue {
    KneeMisaligned,
    HipsUneven,
    LowVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormCheck {
    pub valid: bool,
    pub reason: Option<FormIssue>,
}

impl FormCheck {
    fn ok() -> Self {
        Self { valid: true, reason: None }
    }

    fn fail(reason: FormIssue) -> Self {
        Self { valid: false, reason: Some(reason) }
    }
}

/// 生の座標 (平滑化前) によるフォーム検査
pub struct FormValidator {
    knee_align_threshold: f32,
    hip_level_threshold: f32,
    min_visibility: f32,
}

impl FormValidator {
    pub fn new(knee_align_threshold: f32, hip_level_threshold: f32) -> Self {
        Self {
            knee_align_threshold,
            hip_level_threshold,
            min_visibility: 0.0,
        }
    }

    pub fn from_config(config: &SquatConfig) -> Self {
        Self::new(config.knee_align_threshold, config.hip_level_threshold)
            .with_min_visibility(config.min_visibility)
    }

    pub fn with_min_visibility(mut self, min_visibility: f32) -> Self {
        self.min_visibility = min_visibility;
        self
    }

    pub fn validate(&self, frame: &SquatFrame) -> FormCheck {
        if self.min_visibility > 0.0 && !frame.joints().all(|lm| lm.is_visible(self.min_visibility)) {
            return FormCheck::fail(FormIssue::LowVisibility);
        }
        if !self.knee_aligned(&frame.left) || !self.knee_aligned(&frame.right) {
            return FormCheck::fail(FormIssue::KneeMisaligned);
        }
        if (frame.left.hip.y - frame.right.hip.y).abs() >= self.hip_level_threshold {
            return FormCheck::fail(FormIssue::HipsUneven);
        }
        FormCheck::ok()
    }

    fn knee_aligned(&self, leg: &Leg) -> bool {
        (leg.knee.x - leg.ankle.x).abs() < self.knee_align_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    fn make_leg(x: f32, hip_y: f32, knee_x: f32) -> Leg {
        Leg {
            shoulder: Landmark::new(x, 0.2, 0.0, 0.9),
            hip: Landmark::new(x, hip_y, 0.0, 0.9),
            knee: Landmark::new(knee_x, 0.7, 0.0, 0.9),
            ankle: Landmark::new(x, 0.9, 0.0, 0.9),
        }
    }

    fn make_frame(left_knee_x: f32, left_hip_y: f32) -> SquatFrame {
        SquatFrame {
            left: make_leg(0.4, left_hip_y, left_knee_x),
            right: make_leg(0.6, 0.5, 0.6),
        }
    }

    #[test]
    fn test_good_form() {
        let v = FormValidator::new(0.2, 0.15);
        let check = v.validate(&make_frame(0.45, 0.52));
        assert!(check.valid);
        assert_eq!(check.reason, None);
    }

    #[test]
    fn test_knee_misaligned() {
        let v = FormValidator::new(0.2, 0.15);
        let check = v.validate(&make_frame(0.65, 0.5));
        assert!(!check.valid);
        assert_eq!(check.reason, Some(FormIssue::KneeMisaligned));
    }

    #[test]
    fn test_hips_uneven() {
        let v = FormValidator::new(0.2, 0.15);
        let check = v.validate(&make_frame(0.4, 0.7));
        assert_eq!(check.reason, Some(FormIssue::HipsUneven));
    }

    #[test]
    fn test_low_visibility() {
        let v = FormValidator::new(0.2, 0.15).with_min_visibility(0.95);
        let check = v.validate(&make_frame(0.4, 0.5));
        assert_eq!(check.reason, Some(FormIssue::LowVisibility));

        // 0なら無効
        let v = FormValidator::new(0.2, 0.15);
        assert!(v.validate(&make_frame(0.4, 0.5)).valid);
    }

    #[test]
    fn test_visibility_threshold_inclusive() {
        let v = FormValidator::new(0.2, 0.15).with_min_visibility(0.9);
        let mut frame = make_frame(0.4, 0.5);
        assert!(v.validate(&frame).valid);

        // 1関節でも下回ればフォーム不良
        frame.right.ankle.visibility = 0.5;
        assert_eq!(v.validate(&frame).reason, Some(FormIssue::LowVisibility));
    }
}
