//! Build seek tables for flac streams in one forward pass,
//! without holding on to the stream.
//!
//! Feed a stream to a [`SeekTableAccumulator`] (or wrap a writer in a
//! [`SeekTablePassThrough`]) in chunks of any size, then take the
//! [`SeekTableResult`] once the stream ends.

mod accumulator;
mod config;
mod errors;
mod passthrough;
mod table;

pub mod cursor;
pub mod flac;
pub mod scan;

pub use accumulator::{ScanPhase, SeekTableAccumulator};
pub use config::{SeekDensity, SeekTableConfig};
pub use errors::{FormatError, StateError};
pub use passthrough::SeekTablePassThrough;
pub use table::{ScanReport, SeekPoint, SeekTableResult, SEEKPOINT_LEN};
