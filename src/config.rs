use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub squat: SquatConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// 非ボトムフレームでの連続フレーム数の減らし方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayPolicy {
    /// 1フレームごとに1ずつ減らす (一瞬の検出ちらつきを許容)
    GradualDecrement,
    /// 即座に0へ戻す
    ResetToZero,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self::ResetToZero
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SquatConfig {
    /// 膝角度の閾値 (度)。これ未満でボトム候補
    #[serde(default = "default_knee_threshold")]
    pub knee_threshold: f32,
    /// 股関節角度の閾値 (度)
    #[serde(default = "default_hip_threshold")]
    pub hip_threshold: f32,
    /// 有効角度範囲の下限 (度)
    #[serde(default = "default_min_angle")]
    pub min_angle: f32,
    /// 有効角度範囲の上限 (度)
    #[serde(default = "default_max_angle")]
    pub max_angle: f32,
    /// 膝とくるぶしのX方向ずれの許容量 (正規化座標)
    #[serde(default = "default_knee_align_threshold")]
    pub knee_align_threshold: f32,
    /// 左右の腰のY方向ずれの許容量 (正規化座標)
    #[serde(default = "default_hip_level_threshold")]
    pub hip_level_threshold: f32,
    /// 関節の最低可視度。0で無効
    #[serde(default)]
    pub min_visibility: f32,
    /// 移動平均の窓幅
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// DOWN確定に必要な連続フレーム数
    #[serde(default = "default_required_frames")]
    pub required_frames: u32,
    /// レップ間の最小間隔 (ミリ秒)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default)]
    pub decay: DecayPolicy,
}

fn default_knee_threshold() -> f32 { 130.0 }
fn default_hip_threshold() -> f32 { 140.0 }
fn default_min_angle() -> f32 { 50.0 }
fn default_max_angle() -> f32 { 170.0 }
fn default_knee_align_threshold() -> f32 { 0.2 }
fn default_hip_level_threshold() -> f32 { 0.15 }
fn default_smoothing_window() -> usize { 3 }
fn default_required_frames() -> u32 { 3 }
fn default_cooldown_ms() -> u64 { 500 }

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            knee_threshold: default_knee_threshold(),
            hip_threshold: default_hip_threshold(),
            min_angle: default_min_angle(),
            max_angle: default_max_angle(),
            knee_align_threshold: default_knee_align_threshold(),
            hip_level_threshold: default_hip_level_threshold(),
            min_visibility: 0.0,
            smoothing_window: default_smoothing_window(),
            required_frames: default_required_frames(),
            cooldown_ms: default_cooldown_ms(),
            decay: DecayPolicy::default(),
        }
    }
}

impl SquatConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// 矛盾した設定を弾く
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("knee_threshold", self.knee_threshold),
            ("hip_threshold", self.hip_threshold),
            ("min_angle", self.min_angle),
            ("max_angle", self.max_angle),
            ("knee_align_threshold", self.knee_align_threshold),
            ("hip_level_threshold", self.hip_level_threshold),
            ("min_visibility", self.min_visibility),
        ] {
            if !value.is_finite() {
                bail!("{} must be a finite number, got {}", name, value);
            }
        }
        if self.min_angle >= self.max_angle {
            bail!(
                "min_angle ({}) must be below max_angle ({})",
                self.min_angle,
                self.max_angle
            );
        }
        if self.smoothing_window == 0 {
            bail!("smoothing_window must be at least 1");
        }
        if self.required_frames == 0 {
            bail!("required_frames must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            bail!("min_visibility ({}) must be within 0..=1", self.min_visibility);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// env_logger のデフォルトフィルタ (RUST_LOG が優先)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
        config.squat.validate()?;
        Ok(config)
    }

    /// 読めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("config {} not used ({:#}), falling back to defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
