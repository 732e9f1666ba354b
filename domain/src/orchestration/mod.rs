//! Coordinator cycle domain

pub mod cycle;

pub use cycle::{Cycle, CyclePhase};
