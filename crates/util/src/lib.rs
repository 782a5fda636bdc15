//! Shared utilities for flacseek binaries

mod env;
pub use env::*;

pub mod logging;
