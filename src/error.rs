use thiserror::Error;

use crate::pose::LandmarkIndex;

/// Malformed landmark input. Caught at the session boundary; never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FrameError {
    #[error("landmark {0} missing from frame of {1} points")]
    MissingJoint(LandmarkIndex, usize),
    #[error("landmark {0} has a non-finite coordinate")]
    NonFiniteCoordinate(LandmarkIndex),
}

/// Errors decoding a JSON Lines frame record.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid frame record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty record")]
    Empty,
}
