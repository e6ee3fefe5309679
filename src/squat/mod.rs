pub mod angle;
pub mod classify;
pub mod form;
pub mod session;
pub mod shared;
pub mod smooth;
pub mod state;

pub use angle::joint_angle;
pub use classify::{Classification, ThresholdClassifier};
pub use form::{FormCheck, FormIssue, FormValidator};
pub use session::{DepthStats, FrameStatus, JointAngles, Metrics, SessionState, SquatSession};
pub use shared::{SessionRegistry, SharedSession};
pub use smooth::Smoother;
pub use state::{RepStateMachine, Stage};
