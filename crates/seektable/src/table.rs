//! Seek tables and scan statistics

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::{
	errors::FormatError,
	flac::metablock::{FlacMetablockHeader, FlacMetablockType},
};

/// The number of bytes one seek point takes in a SEEKTABLE block
pub const SEEKPOINT_LEN: usize = 18;

/// One entry in a seek table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekPoint {
	/// The number of the first sample in the target frame
	pub sample_number: u64,

	/// The offset of the target frame's header,
	/// relative to the first byte of the first frame
	pub byte_offset: u64,

	/// The number of samples in the target frame
	pub frame_samples: u32,
}

/// The seek table of one stream.
///
/// Seek points are in stream order, and strictly
/// increase in both `sample_number` and `byte_offset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeekTableResult {
	/// Seek points, in stream order
	pub seekpoints: Vec<SeekPoint>,

	/// The absolute offset of the first audio frame.
	/// Zero if we never found the end of metadata.
	pub audio_offset: u64,
}

impl SeekTableResult {
	/// Write this table as a flac SEEKTABLE metadata block, including its header.
	pub fn encode_seektable(&self, is_last: bool, target: &mut impl Write) -> std::io::Result<()> {
		let length = u32::try_from(self.seekpoints.len() * SEEKPOINT_LEN)
			.ok()
			.filter(|x| *x < 1 << 24)
			.ok_or_else(|| {
				std::io::Error::new(
					std::io::ErrorKind::InvalidInput,
					"seek table is too large for a metadata block",
				)
			})?;

		FlacMetablockHeader {
			block_type: FlacMetablockType::Seektable,
			length,
			is_last,
		}
		.encode(target)?;

		for p in &self.seekpoints {
			target.write_all(&p.sample_number.to_be_bytes())?;
			target.write_all(&p.byte_offset.to_be_bytes())?;
			target.write_all(&u16::try_from(p.frame_samples).unwrap_or(u16::MAX).to_be_bytes())?;
		}

		return Ok(());
	}
}

/// What happened while we scanned a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
	/// The number of frame headers we accepted
	/// (seek points or not)
	pub frames_accepted: u64,

	/// The number of sync codes that didn't lead to a valid frame header
	pub headers_rejected: u64,

	/// Every format error we ran into, in order
	pub errors: Vec<FormatError>,
}

impl ScanReport {
	/// If true, we stopped parsing the stream early
	pub fn is_fatal(&self) -> bool {
		self.errors.iter().any(|x| x.is_fatal())
	}
}
