//! Errors we can encounter while building a seek table

use thiserror::Error;

/// A problem with the bytes we were given.
///
/// These never interrupt a stream. They're recorded in the
/// [`crate::ScanReport`] and scanning continues where it can.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
	/// The stream doesn't start with `fLaC`.
	/// We stop parsing this stream.
	#[error("flac signature is missing or malformed")]
	BadMagic,

	/// The first metablock isn't streaminfo, or streaminfo appears twice.
	/// We stop parsing this stream.
	#[error("streaminfo is missing or duplicated")]
	MissingStreamInfo,

	/// The streaminfo block has the wrong length.
	/// We stop parsing this stream.
	#[error("malformed streaminfo block")]
	MalformedStreamInfo,

	/// We searched too long without finding a valid frame header.
	/// We keep searching.
	#[error("lost frame sync")]
	FrameSyncLost,

	/// The stream ended inside the metadata section
	#[error("stream ended before metadata was complete")]
	TruncatedMetadata,
}

impl FormatError {
	/// If true, we can't make sense of the rest of the stream after this error.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			Self::BadMagic | Self::MissingStreamInfo | Self::MalformedStreamInfo
		)
	}
}

/// A lifecycle method was called at the wrong time.
/// These are programming errors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
	/// Tried to initialize an accumulator that is already in use
	#[error("accumulator is already initialized")]
	AlreadyInitialized,

	/// Tried to use an accumulator that hasn't been initialized
	#[error("accumulator is not initialized")]
	NotInitialized,

	/// Tried to finish or push data to a finished accumulator
	#[error("accumulator is already finished")]
	AlreadyFinished,
}
