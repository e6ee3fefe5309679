//! JSON boundary for frame streams.
//!
//! One record per line (JSON Lines). A frame record carries the landmarks from the
//! pose estimator, or `null` when nobody was detected:
//!
//! ```json
//! {"t_ms": 1200, "landmarks": [{"x": 0.5, "y": 0.4, "z": 0.0, "visibility": 0.9}, ...]}
//! {"t_ms": 1233, "landmarks": null}
//! {"reset": true}
//! ```
//!
//! Self-contained apart from the core result types it renders.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::ProtocolError;
use crate::pose::Landmark;
use crate::squat::{DepthStats, FrameStatus, JointAngles, Metrics, Stage};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    /// Capture time in milliseconds from stream start
    #[serde(default)]
    pub t_ms: Option<u64>,
    #[serde(default)]
    pub landmarks: Option<Vec<Landmark>>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Frame(FrameRecord),
    Reset,
}

/// Parse one input line.
pub fn parse_record(line: &str) -> Result<Command, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    let value: serde_json::Value = serde_json::from_str(line)?;
    if value.get("reset").and_then(serde_json::Value::as_bool) == Some(true) {
        return Ok(Command::Reset);
    }
    Ok(Command::Frame(serde_json::from_value(value)?))
}

/// Longest stream offset a record may carry (one week).
pub const MAX_STREAM_OFFSET: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Maps record timestamps onto `Instant`s for replay.
///
/// `t_ms` is an offset from `start`. Records without one advance by one frame
/// interval from the previous record; the first such record sits at `start`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    interval: Duration,
    last: Option<Duration>,
}

impl FrameClock {
    pub fn new(start: Instant, fps: f64) -> Self {
        Self {
            start,
            interval: Duration::from_secs_f64(1.0 / fps.max(1.0)),
            last: None,
        }
    }

    /// `None` when the offset exceeds [`MAX_STREAM_OFFSET`] or cannot be
    /// represented as an `Instant`. The clock is left untouched in that case.
    pub fn timestamp(&mut self, t_ms: Option<u64>) -> Option<Instant> {
        let offset = match (t_ms, self.last) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, Some(last)) => last.checked_add(self.interval)?,
            (None, None) => Duration::ZERO,
        };
        if offset > MAX_STREAM_OFFSET {
            return None;
        }
        let at = self.start.checked_add(offset)?;
        self.last = Some(offset);
        Some(at)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    pub counter: u32,
    pub stage: Stage,
    pub angles: Option<JointAngles>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub rep_counted: bool,
    pub depth: DepthStats,
}

impl From<&Metrics> for MetricsResponse {
    fn from(m: &Metrics) -> Self {
        let reason = match m.status {
            FrameStatus::FormInvalid(issue) => serde_json::to_value(issue)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string)),
            FrameStatus::Fault(e) => Some(e.to_string()),
            _ => None,
        };
        Self {
            counter: m.counter,
            stage: m.stage,
            angles: m.angles,
            status: m.status.code(),
            reason,
            rep_counted: m.rep_counted,
            depth: m.depth,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
}

impl ResetResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
