//! Progress display for coordinator cycles

mod reporter;

pub use reporter::{CycleProgressReporter, SimpleProgress};
