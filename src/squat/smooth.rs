use std::collections::VecDeque;

use crate::config::SquatConfig;

/// 直近 `window` サンプルの単純移動平均
///
/// 角度の種類 (膝・股関節) ごとに1つずつ持つ。バッファを共有すると
/// 平均が別の信号で汚れる。
#[derive(Debug, Clone)]
pub struct Smoother {
    window: usize,
    history: VecDeque<f32>,
}

impl Smoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            history: VecDeque::with_capacity(window),
        }
    }

    pub fn from_config(config: &SquatConfig) -> Self {
        Self::new(config.smoothing_window)
    }

    /// サンプルを追加し、窓内の平均を返す
    pub fn smooth(&mut self, value: f32) -> f32 {
        self.history.push_back(value);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    /// 古い順のサンプル
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
