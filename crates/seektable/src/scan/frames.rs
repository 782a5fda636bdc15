//! Find audio frames and turn them into seek points.
//!
//! Frames don't store their length, so we find them by searching for
//! sync codes. A sync code is only accepted as a frame when the header
//! behind it decodes, passes its crc, and agrees with the stream so far.
//!
//! Audio data can hold crc-valid headers by accident. A header that
//! doesn't continue the last frame's numbering is held back until the
//! next header continues *its* numbering. Otherwise it is dropped.

use tracing::{debug, trace, warn};

use crate::{
	config::{SeekDensity, SeekTableConfig},
	cursor::ByteCursor,
	errors::FormatError,
	flac::{
		frameheader::{BlockingStrategy, FrameHeader, FrameHeaderError, MAX_FRAME_HEADER_LEN},
		streaminfo::FlacStreaminfo,
	},
	table::{ScanReport, SeekPoint},
};

/// The first byte of every frame sync code
const SYNC_BYTE: u8 = 0b1111_1111;

/// The smallest possible frame, not counting subframes:
/// a 6-byte header and a 2-byte crc.
const MIN_FRAME_OVERHEAD: u64 = 8;

/// A frame header we've found in the stream
#[derive(Debug, Clone, Copy)]
struct FoundFrame {
	/// The absolute offset of this frame's first byte
	offset: u64,
	sample_number: u64,
	block_size: u32,
	variable: bool,
}

impl FoundFrame {
	/// The sample number of the frame that should follow this one
	fn next_sample(&self) -> u64 {
		self.sample_number.saturating_add(u64::from(self.block_size))
	}
}

/// Scans audio frames after the end of metadata
#[derive(Debug)]
pub struct FrameScanner {
	streaminfo: FlacStreaminfo,
	density: SeekDensity,

	/// The absolute offset of the first frame
	audio_offset: u64,

	/// How far we may search past `sync_ref` before reporting lost sync
	sync_span: u64,

	/// The number of bytes we're certain contain no frame header
	skip: u64,

	/// The start of the last accepted frame, or the place we
	/// last reported lost sync.
	sync_ref: u64,

	/// True if accepted frames are variable-blocksize.
	/// `None` until we accept a frame.
	variable: Option<bool>,

	/// The last frame we accepted
	anchor: Option<FoundFrame>,

	/// A header that doesn't follow `anchor`.
	/// It's accepted if the next header follows it, and dropped otherwise.
	held: Option<FoundFrame>,

	/// Accepted frames so far
	frames: u64,

	/// With [`SeekDensity::EverySamples`], the next sample number that gets a point
	next_sample_target: u64,
}

impl FrameScanner {
	/// Make a scanner for a stream whose first frame starts at `audio_offset`
	pub fn new(config: &SeekTableConfig, streaminfo: FlacStreaminfo, audio_offset: u64) -> Self {
		let sync_span = config
			.max_sync_span
			.max(u64::from(streaminfo.max_frame_size));

		Self {
			streaminfo,
			density: config.density,
			audio_offset,
			sync_span,
			skip: 0,
			sync_ref: audio_offset,
			variable: None,
			anchor: None,
			held: None,
			frames: 0,
			next_sample_target: 0,
		}
	}

	/// Consume as many bytes of `cursor` as we can, pushing seek points to `seekpoints`.
	///
	/// Bytes are held back only when they could be the start of a frame
	/// header we can't fully see yet.
	pub fn scan(
		&mut self,
		cursor: &mut ByteCursor<'_>,
		seekpoints: &mut Vec<SeekPoint>,
		report: &mut ScanReport,
	) {
		loop {
			if self.skip != 0 {
				self.skip -= cursor.skip(self.skip);
				if self.skip != 0 {
					return;
				}
			}

			self.check_sync_span(cursor.position(), report);

			let window = cursor.window();
			if window.is_empty() {
				return;
			}

			// Never search past the point where we'd report lost sync,
			// so that we report it at the same offsets however the input is split.
			let limit = self
				.sync_ref
				.saturating_add(self.sync_span)
				.saturating_add(1)
				- cursor.position();
			let limit = usize::try_from(limit).unwrap_or(usize::MAX);

			match window.iter().position(|x| *x == SYNC_BYTE) {
				None => {
					let n = window.len().min(limit);
					cursor.advance(n);
					continue;
				}
				Some(0) => {}
				Some(i) => {
					cursor.advance(i.min(limit));
					continue;
				}
			}

			let frame_start = cursor.position();
			let (header, header_len) = match FrameHeader::decode(cursor.peek_up_to(MAX_FRAME_HEADER_LEN)) {
				Ok(x) => x,

				// The header might continue in the next chunk
				Err(FrameHeaderError::Incomplete(_)) => return,

				Err(FrameHeaderError::BadSync) => {
					cursor.advance(1);
					continue;
				}

				Err(error) => {
					trace!(
						message = "Rejected frame header",
						offset = frame_start,
						%error
					);
					report.headers_rejected += 1;
					cursor.advance(1);
					continue;
				}
			};

			let Some(sample_number) = self.sample_number(&header) else {
				trace!(
					message = "Rejected implausible frame header",
					offset = frame_start,
					?header
				);
				report.headers_rejected += 1;
				cursor.advance(1);
				continue;
			};

			let found = FoundFrame {
				offset: frame_start,
				sample_number,
				block_size: header.block_size,
				variable: matches!(header.blocking, BlockingStrategy::Variable(_)),
			};

			match self.anchor {
				None => {}

				Some(anchor) if sample_number == anchor.next_sample() => {
					// Whatever we held back was a false sync
					if let Some(held) = self.held.take() {
						Self::drop_held(held, report);
					}
				}

				Some(anchor) => match self.held.take() {
					Some(held)
						if held.sample_number > anchor.sample_number
							&& sample_number == held.next_sample() =>
					{
						debug!(
							message = "Frame numbering jumped",
							offset = held.offset,
							from = anchor.sample_number,
							to = held.sample_number
						);
						self.commit(held, seekpoints, report);
					}

					held => {
						if let Some(held) = held {
							Self::drop_held(held, report);
						}

						trace!(
							message = "Holding back discontinuous frame header",
							offset = frame_start,
							sample_number,
							expected = anchor.next_sample()
						);
						self.held = Some(found);

						// This may be a false sync, so a real header could start inside it
						cursor.advance(1);
						continue;
					}
				},
			}

			self.commit(found, seekpoints, report);
			cursor.advance(header_len);
			self.skip = u64::from(self.streaminfo.min_frame_size)
				.saturating_sub(u64::try_from(header_len).unwrap_or(u64::MAX));
		}
	}

	/// Called once the stream ends.
	/// Accepts a held header if it could follow the last frame we accepted.
	pub fn finish(&mut self, seekpoints: &mut Vec<SeekPoint>, report: &mut ScanReport) {
		let Some(held) = self.held.take() else {
			return;
		};

		match self.anchor {
			Some(anchor) if self.could_follow(&anchor, &held) => {
				debug!(
					message = "Accepted last frame after a gap",
					offset = held.offset,
					sample_number = held.sample_number
				);
				self.commit(held, seekpoints, report);
			}
			_ => Self::drop_held(held, report),
		}
	}

	/// Report lost sync if we've gone too far without a frame
	fn check_sync_span(&mut self, position: u64, report: &mut ScanReport) {
		if position - self.sync_ref <= self.sync_span {
			return;
		}

		warn!(
			message = "Lost frame sync",
			last_frame = self.sync_ref,
			offset = position,
			span = self.sync_span
		);
		report.errors.push(FormatError::FrameSyncLost);
		self.sync_ref = position;
	}

	/// Check a crc-valid frame header against streaminfo and the blocking strategy.
	/// Returns the frame's first sample number if this header is believable.
	fn sample_number(&self, header: &FrameHeader) -> Option<u64> {
		let variable = matches!(header.blocking, BlockingStrategy::Variable(_));
		if self.variable.is_some_and(|x| x != variable) {
			return None;
		}

		if header.channels != self.streaminfo.channels {
			return None;
		}

		if header
			.sample_rate
			.is_some_and(|x| self.streaminfo.sample_rate != 0 && x != self.streaminfo.sample_rate)
		{
			return None;
		}

		if header
			.bits_per_sample
			.is_some_and(|x| x != self.streaminfo.bits_per_sample)
		{
			return None;
		}

		return match header.blocking {
			BlockingStrategy::Variable(x) => Some(x),
			BlockingStrategy::Fixed(n) => {
				// Every frame but the last has the nominal block size,
				// so the last frame's own size is no good here.
				let nominal = if self.streaminfo.is_fixed_blocksize()
					&& self.streaminfo.max_block_size != 0
				{
					self.streaminfo.max_block_size
				} else {
					self.anchor.map_or(header.block_size, |x| x.block_size)
				};
				u64::from(n).checked_mul(u64::from(nominal))
			}
		};
	}

	/// If true, the bytes between `anchor` and `frame` are enough to hold
	/// every frame missing between the two.
	fn could_follow(&self, anchor: &FoundFrame, frame: &FoundFrame) -> bool {
		if frame.sample_number <= anchor.sample_number {
			return false;
		}

		let missing_frames = frame
			.sample_number
			.saturating_sub(anchor.next_sample())
			.div_ceil(u64::from(anchor.block_size.max(1)));

		let min_frame_len = u64::from(self.streaminfo.min_frame_size)
			.max(MIN_FRAME_OVERHEAD + u64::from(self.streaminfo.channels));

		let needed = missing_frames.saturating_add(1).saturating_mul(min_frame_len);
		return frame.offset - anchor.offset >= needed;
	}

	fn drop_held(held: FoundFrame, report: &mut ScanReport) {
		trace!(
			message = "Dropped discontinuous frame header",
			offset = held.offset,
			sample_number = held.sample_number
		);
		report.headers_rejected += 1;
	}

	/// Accept a frame
	fn commit(&mut self, frame: FoundFrame, seekpoints: &mut Vec<SeekPoint>, report: &mut ScanReport) {
		trace!(
			message = "Found frame",
			offset = frame.offset,
			sample_number = frame.sample_number,
			block_size = frame.block_size
		);

		if self.wants_point(frame.sample_number) {
			seekpoints.push(SeekPoint {
				sample_number: frame.sample_number,
				byte_offset: frame.offset - self.audio_offset,
				frame_samples: frame.block_size,
			});
		}

		report.frames_accepted += 1;
		self.frames += 1;
		self.sync_ref = frame.offset;
		self.variable = Some(frame.variable);
		self.anchor = Some(frame);
	}

	/// Decide if the frame we're accepting gets a seek point.
	/// Must be called once per accepted frame, before `self.frames` is incremented.
	fn wants_point(&mut self, sample_number: u64) -> bool {
		match self.density {
			SeekDensity::EveryFrame | SeekDensity::EverySamples(0) => true,

			SeekDensity::EveryNthFrame(k) => self.frames % k.max(1) == 0,

			SeekDensity::EverySamples(n) => {
				if sample_number < self.next_sample_target {
					return false;
				}

				self.next_sample_target = sample_number
					.div_euclid(n)
					.saturating_add(1)
					.saturating_mul(n);
				true
			}
		}
	}
}
