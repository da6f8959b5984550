#![forbid(unsafe_code)]

pub mod access;
pub mod model;
pub mod progress;
pub mod time;

pub use access::{AccessError, ensure_owner};
pub use progress::ProgressSnapshot;
pub use time::Clock;
