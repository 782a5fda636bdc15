//! Walk the metadata block chain in front of the audio frames.

use tracing::{debug, trace};

use crate::{
	cursor::ByteCursor,
	errors::FormatError,
	flac::{
		metablock::{FlacMetablockHeader, FlacMetablockType, METABLOCK_HEADER_LEN},
		streaminfo::{FlacStreaminfo, STREAMINFO_LEN},
		MAGIC,
	},
};

/// Where we are in the metadata section
#[derive(Debug, Clone, Copy)]
enum MetadataStep {
	/// Waiting for `fLaC`
	Magic,

	/// Waiting for a metablock header
	BlockHeader,

	/// Waiting for a full streaminfo payload
	Streaminfo { header: FlacMetablockHeader },

	/// Discarding a block we don't read.
	/// `remaining` is the number of payload bytes left to skip.
	Skip {
		header: FlacMetablockHeader,
		remaining: u64,
	},
}

/// What [`MetadataBlockScanner::scan`] got done
#[derive(Debug)]
pub enum MetadataProgress {
	/// We consumed everything we could and need more data
	NeedMore,

	/// We consumed the last metadata block
	Complete {
		streaminfo: FlacStreaminfo,

		/// The absolute offset of the first byte after metadata
		audio_offset: u64,
	},
}

/// Reads a flac metadata block chain from a [`ByteCursor`],
/// pausing wherever the input runs out.
///
/// Only streaminfo is decoded. Every other block,
/// known or not, is skipped without being buffered.
#[derive(Debug)]
pub struct MetadataBlockScanner {
	step: MetadataStep,
	streaminfo: Option<FlacStreaminfo>,
	blocks_seen: u32,
	last_block_seen: bool,
}

impl MetadataBlockScanner {
	/// Make a new scanner that expects the stream marker first
	pub fn new() -> Self {
		Self {
			step: MetadataStep::Magic,
			streaminfo: None,
			blocks_seen: 0,
			last_block_seen: false,
		}
	}

	/// If true, we are still waiting for the `fLaC` marker
	pub fn awaiting_marker(&self) -> bool {
		matches!(self.step, MetadataStep::Magic)
	}

	/// If true, we have seen the header of the last metadata block
	pub fn last_block_seen(&self) -> bool {
		self.last_block_seen
	}

	/// The streaminfo block, if we've read it
	pub fn streaminfo(&self) -> Option<&FlacStreaminfo> {
		self.streaminfo.as_ref()
	}

	/// Consume as much metadata from `cursor` as we can.
	///
	/// Errors returned here are fatal: the caller should
	/// stop parsing this stream.
	pub fn scan(&mut self, cursor: &mut ByteCursor<'_>) -> Result<MetadataProgress, FormatError> {
		loop {
			match self.step {
				MetadataStep::Magic => {
					let Some(data) = cursor.try_take(MAGIC.len()) else {
						return Ok(MetadataProgress::NeedMore);
					};

					if data != MAGIC {
						return Err(FormatError::BadMagic);
					}

					self.step = MetadataStep::BlockHeader;
				}

				MetadataStep::BlockHeader => {
					let Some(data) = cursor.try_take(METABLOCK_HEADER_LEN) else {
						return Ok(MetadataProgress::NeedMore);
					};

					let mut raw = [0u8; METABLOCK_HEADER_LEN];
					raw.copy_from_slice(data);
					let header = FlacMetablockHeader::decode(raw);
					let is_first = self.blocks_seen == 0;
					self.blocks_seen += 1;
					self.last_block_seen = header.is_last;

					trace!(
						message = "Found metablock",
						block_type = ?header.block_type,
						length = header.length,
						is_last = header.is_last,
						offset = cursor.position() - METABLOCK_HEADER_LEN as u64
					);

					match header.block_type {
						FlacMetablockType::Streaminfo => {
							if !is_first {
								return Err(FormatError::MissingStreamInfo);
							}

							if header.length != STREAMINFO_LEN {
								return Err(FormatError::MalformedStreamInfo);
							}

							self.step = MetadataStep::Streaminfo { header };
						}

						_ => {
							if is_first {
								return Err(FormatError::MissingStreamInfo);
							}

							self.step = MetadataStep::Skip {
								header,
								remaining: u64::from(header.length),
							};
						}
					}
				}

				MetadataStep::Streaminfo { header } => {
					let Some(data) = cursor.try_take(STREAMINFO_LEN as usize) else {
						return Ok(MetadataProgress::NeedMore);
					};

					let streaminfo =
						FlacStreaminfo::decode(data).ok_or(FormatError::MalformedStreamInfo)?;

					debug!(
						message = "Read streaminfo",
						sample_rate = streaminfo.sample_rate,
						channels = streaminfo.channels,
						block_size = ?(streaminfo.min_block_size, streaminfo.max_block_size),
						frame_size = ?(streaminfo.min_frame_size, streaminfo.max_frame_size),
						total_samples = streaminfo.total_samples
					);

					self.streaminfo = Some(streaminfo);
					if let Some(done) = self.end_block(header, cursor) {
						return Ok(done);
					}
				}

				MetadataStep::Skip { header, remaining } => {
					let skipped = cursor.skip(remaining);
					if skipped < remaining {
						self.step = MetadataStep::Skip {
							header,
							remaining: remaining - skipped,
						};
						return Ok(MetadataProgress::NeedMore);
					}

					if let Some(done) = self.end_block(header, cursor) {
						return Ok(done);
					}
				}
			}
		}
	}

	/// Called once a block's payload has been fully consumed.
	/// Returns `Some` if that was the last block.
	fn end_block(
		&mut self,
		header: FlacMetablockHeader,
		cursor: &ByteCursor<'_>,
	) -> Option<MetadataProgress> {
		if !header.is_last {
			self.step = MetadataStep::BlockHeader;
			return None;
		}

		// The first block is always streaminfo, so this is set.
		let streaminfo = self.streaminfo.clone()?;

		debug!(
			message = "Reached end of metadata",
			blocks = self.blocks_seen,
			audio_offset = cursor.position()
		);

		return Some(MetadataProgress::Complete {
			streaminfo,
			audio_offset: cursor.position(),
		});
	}
}
