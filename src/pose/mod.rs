pub mod frame;
pub mod landmark;

pub use frame::{Leg, SquatFrame};
pub use landmark::{Landmark, LandmarkIndex};
