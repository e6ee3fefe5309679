use serde::Serialize;
use std::time::Instant;

use crate::config::SquatConfig;
use crate::error::FrameError;
use crate::pose::{Landmark, Leg, SquatFrame};
use crate::squat::angle::joint_angle;
use crate::squat::classify::ThresholdClassifier;
use crate::squat::form::{FormIssue, FormValidator};
use crate::squat::smooth::Smoother;
use crate::squat::state::{RepStateMachine, Stage};

/// フレームごとの関節角度 (度)
///
/// `knee` / `hip` は左右平均を平滑化した値、左右別の値は平滑化前。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointAngles {
    pub knee: f32,
    pub hip: f32,
    pub left_knee: f32,
    pub right_knee: f32,
    pub left_hip: f32,
    pub right_hip: f32,
}

/// 前回のレップ以降の膝角度の深さ
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DepthStats {
    pub min_knee: Option<f32>,
    pub max_knee: Option<f32>,
    /// 直近にカウントしたレップの最深膝角度
    pub last_rep_min_knee: Option<f32>,
}

impl DepthStats {
    fn record(&mut self, knee: f32) {
        self.min_knee = Some(self.min_knee.map_or(knee, |m| m.min(knee)));
        self.max_knee = Some(self.max_knee.map_or(knee, |m| m.max(knee)));
    }

    fn close_rep(&mut self) {
        self.last_rep_min_knee = self.min_knee;
        self.min_knee = None;
        self.max_knee = None;
    }
}

/// そのフレームがどう扱われたか
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    /// 正常に判定された
    Tracked,
    /// 人物が検出されなかった (状態は変化しない)
    NoDetection,
    /// 角度が有効範囲外。非ボトムとして扱う
    SensorNoise,
    /// フォーム不良。非ボトムとして扱う
    FormInvalid(FormIssue),
    /// 入力不正。状態は変化しない
    Fault(FrameError),
}

impl FrameStatus {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Tracked => "tracked",
            Self::NoDetection => "no_detection",
            Self::SensorNoise => "sensor_noise",
            Self::FormInvalid(_) => "form_invalid",
            Self::Fault(_) => "fault",
        }
    }
}

/// `process_frame` の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub counter: u32,
    pub stage: Stage,
    pub angles: Option<JointAngles>,
    pub status: FrameStatus,
    /// このフレームでカウントが増えたか
    pub rep_counted: bool,
    pub depth: DepthStats,
}

/// セッション状態のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub counter: u32,
    pub stage: Stage,
    pub consecutive_frames: u32,
    pub last_rep_timestamp: Option<Instant>,
    pub knee_history: Vec<f32>,
    pub hip_history: Vec<f32>,
}

/// 1人分のスクワット計数セッション
///
/// 角度計算 → 平滑化 → フォーム検査/閾値判定 → ステートマシン を
/// 1フレームずつ順に処理する。状態を持つのでフレームは直列に渡すこと。
pub struct SquatSession {
    validator: FormValidator,
    classifier: ThresholdClassifier,
    machine: RepStateMachine,
    knee: Smoother,
    hip: Smoother,
    depth: DepthStats,
}

impl SquatSession {
    pub fn new(config: &SquatConfig) -> Self {
        Self {
            validator: FormValidator::from_config(config),
            classifier: ThresholdClassifier::from_config(config),
            machine: RepStateMachine::from_config(config),
            knee: Smoother::from_config(config),
            hip: Smoother::from_config(config),
            depth: DepthStats::default(),
        }
    }

    /// 現在時刻でフレームを処理
    pub fn process_frame(&mut self, landmarks: Option<&[Landmark]>) -> Metrics {
        self.process_frame_at(landmarks, Instant::now())
    }

    /// 指定時刻でフレームを処理
    ///
    /// 失敗しない。検出なし・入力不正のフレームは状態を変えず、
    /// 直前のカウントと段階をそのまま返す。
    pub fn process_frame_at(&mut self, landmarks: Option<&[Landmark]>, now: Instant) -> Metrics {
        let Some(landmarks) = landmarks else {
            return self.metrics(None, FrameStatus::NoDetection, false);
        };

        let frame = match SquatFrame::extract(landmarks) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame skipped: {}", e);
                return self.metrics(None, FrameStatus::Fault(e), false);
            }
        };

        let (left_knee, left_hip) = leg_angles(&frame.left);
        let (right_knee, right_hip) = leg_angles(&frame.right);
        let knee = self.knee.smooth((left_knee + right_knee) / 2.0);
        let hip = self.hip.smooth((left_hip + right_hip) / 2.0);

        let form = self.validator.validate(&frame);
        let class = self.classifier.classify(knee, hip, form.valid);
        let rep_counted = self.machine.step(class.in_bottom_position, now);

        let status = if class.out_of_range {
            FrameStatus::SensorNoise
        } else {
            self.depth.record(knee);
            match form.reason {
                Some(issue) => FrameStatus::FormInvalid(issue),
                None => FrameStatus::Tracked,
            }
        };

        if rep_counted {
            self.depth.close_rep();
            log::info!(
                "rep {} counted (knee {:.1}, hip {:.1}, deepest knee {:.1})",
                self.machine.counter(),
                knee,
                hip,
                self.depth.last_rep_min_knee.unwrap_or(knee)
            );
        }

        log::debug!(
            "knee={:.1} hip={:.1} status={} stage={} streak={}",
            knee,
            hip,
            status.code(),
            self.machine.stage(),
            self.machine.consecutive_frames()
        );

        let angles = JointAngles {
            knee,
            hip,
            left_knee,
            right_knee,
            left_hip,
            right_hip,
        };
        self.metrics(Some(angles), status, rep_counted)
    }

    /// 初期状態に戻し、平滑化履歴も消す
    pub fn reset(&mut self) {
        self.machine.reset();
        self.knee.reset();
        self.hip.reset();
        self.depth = DepthStats::default();
        log::info!("session reset");
    }

    pub fn counter(&self) -> u32 {
        self.machine.counter()
    }

    pub fn stage(&self) -> Stage {
        self.machine.stage()
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            counter: self.machine.counter(),
            stage: self.machine.stage(),
            consecutive_frames: self.machine.consecutive_frames(),
            last_rep_timestamp: self.machine.last_rep(),
            knee_history: self.knee.values().collect(),
            hip_history: self.hip.values().collect(),
        }
    }

    fn metrics(&self, angles: Option<JointAngles>, status: FrameStatus, rep_counted: bool) -> Metrics {
        Metrics {
            counter: self.machine.counter(),
            stage: self.machine.stage(),
            angles,
            status,
            rep_counted,
            depth: self.depth,
        }
    }
}

impl Default for SquatSession {
    fn default() -> Self {
        Self::new(&SquatConfig::default())
    }
}

/// (膝角度, 股関節角度)
fn leg_angles(leg: &Leg) -> (f32, f32) {
    let knee = joint_angle(leg.hip.point(), leg.knee.point(), leg.ankle.point());
    let hip = joint_angle(leg.shoulder.point(), leg.hip.point(), leg.knee.point());
    (knee, hip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkIndex;

    /// 膝角度・股関節角度から左右対称なフレームを作る
    ///
    /// 腰は膝の真上。くるぶしのX方向のずれは最大0.05で整列閾値に収まる。
    fn make_frame(knee: f32, hip: f32) -> Vec<Landmark> {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0, 0.9); LandmarkIndex::COUNT];
        for (sign, hip_idx, knee_idx, ankle_idx, shoulder_idx) in [
            (-1.0, LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle, LandmarkIndex::LeftShoulder),
            (1.0, LandmarkIndex::RightHip, LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle, LandmarkIndex::RightShoulder),
        ] {
            let base_x = 0.5 + sign * 0.1;
            let len = 0.1;
            // 腰→膝は真下
            let hip_pt = (base_x, 0.4);
            let knee_pt = (base_x, 0.4 + len);
            // 膝の角度: 膝→腰 (上向き) から knee 度回転した方向にくるぶし
            let k = knee.to_radians();
            let ankle_pt = (knee_pt.0 + len * 0.5 * k.sin(), knee_pt.1 - len * 0.5 * k.cos());
            // 股関節の角度: 腰→膝 (下向き) から hip 度回転した方向に肩
            let h = hip.to_radians();
            let shoulder_pt = (hip_pt.0 + len * h.sin(), hip_pt.1 + len * h.cos());

            landmarks[hip_idx as usize] = Landmark::new(hip_pt.0, hip_pt.1, 0.0, 0.9);
            landmarks[knee_idx as usize] = Landmark::new(knee_pt.0, knee_pt.1, 0.0, 0.9);
            landmarks[ankle_idx as usize] = Landmark::new(ankle_pt.0, ankle_pt.1, 0.0, 0.9);
            landmarks[shoulder_idx as usize] = Landmark::new(shoulder_pt.0, shoulder_pt.1, 0.0, 0.9);
        }
        landmarks
    }

    #[test]
    fn test_make_frame_angles() {
        let frame = SquatFrame::extract(&make_frame(90.0, 100.0)).unwrap();
        let (knee, hip) = leg_angles(&frame.left);
        assert!((knee - 90.0).abs() < 0.01, "knee {}", knee);
        assert!((hip - 100.0).abs() < 0.01, "hip {}", hip);
        let (knee, hip) = leg_angles(&frame.right);
        assert!((knee - 90.0).abs() < 0.01);
        assert!((hip - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_no_detection_passthrough() {
        let mut session = SquatSession::default();
        let metrics = session.process_frame(None);
        assert_eq!(metrics.counter, 0);
        assert_eq!(metrics.stage, Stage::Up);
        assert_eq!(metrics.angles, None);
        assert_eq!(metrics.status, FrameStatus::NoDetection);
        assert!(session.state().knee_history.is_empty());
    }

    #[test]
    fn test_fault_leaves_state_untouched() {
        let mut session = SquatSession::default();
        let t0 = Instant::now();
        session.process_frame_at(Some(&make_frame(90.0, 100.0)), t0);
        let before = session.state();

        let truncated = vec![Landmark::default(); 20];
        let metrics = session.process_frame_at(Some(&truncated), t0);
        assert!(matches!(metrics.status, FrameStatus::Fault(FrameError::MissingJoint(..))));
        assert_eq!(metrics.angles, None);
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_tracked_frame_reports_angles() {
        let mut session = SquatSession::default();
        let metrics = session.process_frame(Some(&make_frame(160.0, 160.0)));
        let angles = metrics.angles.unwrap();
        assert!((angles.knee - 160.0).abs() < 0.01);
        assert!((angles.left_hip - 160.0).abs() < 0.01);
        assert_eq!(metrics.status, FrameStatus::Tracked);
        assert_eq!(session.state().knee_history.len(), 1);
    }

    #[test]
    fn test_out_of_range_is_sensor_noise() {
        let mut session = SquatSession::default();
        let metrics = session.process_frame(Some(&make_frame(20.0, 100.0)));
        assert_eq!(metrics.status, FrameStatus::SensorNoise);
        assert_eq!(session.state().consecutive_frames, 0);
        // 範囲外でも平滑化バッファには入る
        assert_eq!(session.state().knee_history.len(), 1);
    }

    #[test]
    fn test_depth_archived_on_rep() {
        let mut session = SquatSession::default();
        let mut t = Instant::now();
        let mut last = None;
        for knee in [100.0, 90.0, 85.0] {
            t += std::time::Duration::from_millis(33);
            last = Some(session.process_frame_at(Some(&make_frame(knee, 100.0)), t));
        }
        let metrics = last.unwrap();
        assert!(metrics.rep_counted);
        assert_eq!(metrics.depth.min_knee, None);
        let deepest = metrics.depth.last_rep_min_knee.unwrap();
        // 平滑化後の最小 (100, 95, 91.67)
        assert!((deepest - 91.666).abs() < 0.01, "deepest {}", deepest);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = SquatSession::default();
        let mut t = Instant::now();
        for _ in 0..4 {
            t += std::time::Duration::from_millis(33);
            session.process_frame_at(Some(&make_frame(90.0, 100.0)), t);
        }
        assert_eq!(session.counter(), 1);

        session.reset();
        let state = session.state();
        assert_eq!(state.counter, 0);
        assert_eq!(state.stage, Stage::Up);
        assert_eq!(state.consecutive_frames, 0);
        assert_eq!(state.last_rep_timestamp, None);
        assert!(state.knee_history.is_empty());
        assert!(state.hip_history.is_empty());
    }
}
