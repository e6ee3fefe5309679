use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::{DecayPolicy, SquatConfig};

/// スクワットの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    /// 立位 (初期状態)
    Up,
    /// ボトム姿勢確定
    Down,
}

impl Default for Stage {
    fn default() -> Self {
        Self::Up
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => f.write_str("UP"),
            Self::Down => f.write_str("DOWN"),
        }
    }
}

/// ヒステリシス + クールダウン付きのレップ計数ステートマシン
///
/// - UP→DOWN: ボトム姿勢が `required_frames` 続き、前回のレップから
///   `cooldown` を超えて経過していればカウントする
/// - DOWN→UP: 非ボトムフレームで連続カウントが 0 まで減衰したとき
#[derive(Debug, Clone)]
pub struct RepStateMachine {
    required_frames: u32,
    cooldown: Duration,
    decay: DecayPolicy,
    counter: u32,
    stage: Stage,
    consecutive_frames: u32,
    last_rep: Option<Instant>,
}

impl RepStateMachine {
    pub fn new(required_frames: u32, cooldown: Duration, decay: DecayPolicy) -> Self {
        Self {
            required_frames,
            cooldown,
            decay,
            counter: 0,
            stage: Stage::Up,
            consecutive_frames: 0,
            last_rep: None,
        }
    }

    pub fn from_config(config: &SquatConfig) -> Self {
        Self::new(config.required_frames, config.cooldown(), config.decay)
    }

    /// 1フレーム進める。このフレームでレップが数えられたら true
    pub fn step(&mut self, in_bottom_position: bool, now: Instant) -> bool {
        if in_bottom_position {
            self.consecutive_frames = self.consecutive_frames.saturating_add(1);
            if self.stage == Stage::Up
                && self.consecutive_frames >= self.required_frames
                && self.cooldown_elapsed(now)
            {
                self.stage = Stage::Down;
                self.counter += 1;
                self.last_rep = Some(now);
                return true;
            }
        } else {
            self.consecutive_frames = match self.decay {
                DecayPolicy::GradualDecrement => self.consecutive_frames.saturating_sub(1),
                DecayPolicy::ResetToZero => 0,
            };
            if self.consecutive_frames == 0 {
                self.stage = Stage::Up;
            }
        }
        false
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_rep {
            Some(last) => now.saturating_duration_since(last) > self.cooldown,
            None => true,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn consecutive_frames(&self) -> u32 {
        self.consecutive_frames
    }

    pub fn last_rep(&self) -> Option<Instant> {
        self.last_rep
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.stage = Stage::Up;
        self.consecutive_frames = 0;
        self.last_rep = None;
    }
}
