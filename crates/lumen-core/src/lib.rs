//! Lumen Core
//!
//! Shared building blocks for the Lumen engine crates: hash collections,
//! logging setup, profiling hooks and math re-exports.

pub mod alloc;
pub mod logging;
pub mod math;
pub mod profiling;
