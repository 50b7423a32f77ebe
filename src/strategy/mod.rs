//! Upload pacing strategy module
//!
//! Lets an initial burst of uploads through and drains the rest at a fixed rate.

mod pacing;

pub use pacing::PacingPolicy;
