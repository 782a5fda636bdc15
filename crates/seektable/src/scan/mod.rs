//! Incremental scanners for the two halves of a flac stream

pub mod frames;
pub mod metadata;
