//! The per-stream seek table state machine

use tracing::{debug, warn};

use crate::{
	config::SeekTableConfig,
	cursor::PendingBuffer,
	errors::{FormatError, StateError},
	flac::streaminfo::FlacStreaminfo,
	scan::{
		frames::FrameScanner,
		metadata::{MetadataBlockScanner, MetadataProgress},
	},
	table::{ScanReport, SeekTableResult},
};

/// How far along a stream we are.
/// Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
	/// We haven't seen `fLaC` yet
	AwaitingStreamMarker,

	/// We are reading metadata blocks
	InMetadata {
		/// If true, the block we're reading is the last one
		last_block_seen: bool,
	},

	/// We are looking for audio frames
	InAudioFrames,

	/// We hit a fatal format error and ignore the rest of the stream
	Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
	/// Fresh, or cleared
	Idle,
	Active,
	Finished,
}

#[derive(Debug)]
enum ScanState {
	Metadata(MetadataBlockScanner),
	AudioFrames(FrameScanner),
	Stopped,
}

/// Builds the seek table of one flac stream from chunks of that stream.
///
/// Chunks may be split anywhere. The result doesn't depend on how
/// the stream was split, and we never hold more than one partial
/// header's worth of input.
///
/// Problems with the stream itself never surface as errors here:
/// they're recorded in [`SeekTableAccumulator::report`], and the
/// table is as complete as the stream allows. Only lifecycle misuse
/// (see [`StateError`]) is returned to the caller.
#[derive(Debug)]
pub struct SeekTableAccumulator {
	config: SeekTableConfig,
	lifecycle: Lifecycle,

	pending: PendingBuffer,
	state: ScanState,
	streaminfo: Option<FlacStreaminfo>,

	result: SeekTableResult,
	report: ScanReport,
}

impl Default for SeekTableAccumulator {
	fn default() -> Self {
		Self::new(SeekTableConfig::default())
	}
}

impl SeekTableAccumulator {
	/// Make a new accumulator.
	/// [`SeekTableAccumulator::init`] must be called before any data is pushed.
	pub fn new(config: SeekTableConfig) -> Self {
		Self {
			config,
			lifecycle: Lifecycle::Idle,
			pending: PendingBuffer::new(),
			state: ScanState::Metadata(MetadataBlockScanner::new()),
			streaminfo: None,
			result: SeekTableResult::default(),
			report: ScanReport::default(),
		}
	}

	/// Prepare to read a new stream
	pub fn init(&mut self) -> Result<(), StateError> {
		if self.lifecycle != Lifecycle::Idle {
			return Err(StateError::AlreadyInitialized);
		}

		self.reset();
		self.lifecycle = Lifecycle::Active;
		debug!(message = "Initialized seek table accumulator", config = ?self.config);
		return Ok(());
	}

	/// Scan the next chunk of this stream.
	///
	/// Everything in `chunk` that can be parsed is parsed before we return.
	/// Format errors are recorded, never returned.
	pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<(), StateError> {
		match self.lifecycle {
			Lifecycle::Idle => return Err(StateError::NotInitialized),
			Lifecycle::Finished => return Err(StateError::AlreadyFinished),
			Lifecycle::Active => {}
		}

		let mut cursor = self.pending.feed(chunk);

		loop {
			match &mut self.state {
				ScanState::Metadata(scanner) => match scanner.scan(&mut cursor) {
					Ok(MetadataProgress::NeedMore) => break,

					Ok(MetadataProgress::Complete {
						streaminfo,
						audio_offset,
					}) => {
						debug!(message = "Scanning audio frames", audio_offset);
						self.result.audio_offset = audio_offset;
						self.streaminfo = Some(streaminfo.clone());
						self.state = ScanState::AudioFrames(FrameScanner::new(
							&self.config,
							streaminfo,
							audio_offset,
						));
					}

					Err(error) => {
						warn!(
							message = "Stopped scanning stream",
							offset = cursor.position(),
							%error
						);
						self.streaminfo = scanner.streaminfo().cloned();
						self.report.errors.push(error);
						self.state = ScanState::Stopped;
					}
				},

				ScanState::AudioFrames(scanner) => {
					scanner.scan(
						&mut cursor,
						&mut self.result.seekpoints,
						&mut self.report,
					);
					break;
				}

				ScanState::Stopped => {
					// Nothing we skip here is ever buffered
					cursor.skip_all();
					break;
				}
			}
		}

		return Ok(());
	}

	/// Finish this stream.
	/// After this, the table is frozen and no more data may be pushed.
	pub fn finalize(&mut self) -> Result<(), StateError> {
		match self.lifecycle {
			Lifecycle::Idle => return Err(StateError::NotInitialized),
			Lifecycle::Finished => return Err(StateError::AlreadyFinished),
			Lifecycle::Active => {}
		}

		match &mut self.state {
			ScanState::AudioFrames(scanner) => {
				scanner.finish(&mut self.result.seekpoints, &mut self.report);
			}

			ScanState::Metadata(_) => {
				warn!(
					message = "Stream ended inside metadata",
					offset = self.pending.position()
				);
				self.report.errors.push(FormatError::TruncatedMetadata);
			}

			ScanState::Stopped => {}
		}

		// Whatever is left is a partial header that will never be completed
		self.pending.clear();
		self.lifecycle = Lifecycle::Finished;

		debug!(
			message = "Finished seek table",
			seekpoints = self.result.seekpoints.len(),
			audio_offset = self.result.audio_offset,
			frames_accepted = self.report.frames_accepted,
			headers_rejected = self.report.headers_rejected,
			errors = ?self.report.errors
		);

		return Ok(());
	}

	/// An alias of [`SeekTableAccumulator::finalize`]
	pub fn end(&mut self) -> Result<(), StateError> {
		self.finalize()
	}

	/// Get the seek table.
	/// Before [`SeekTableAccumulator::finalize`], this is the table so far.
	pub fn get_table(&self) -> SeekTableResult {
		self.result.clone()
	}

	/// Get the seek table
	#[deprecated(note = "use `get_table`")]
	pub fn get_data(&self) -> SeekTableResult {
		self.get_table()
	}

	/// What we noticed while scanning this stream
	pub fn report(&self) -> &ScanReport {
		&self.report
	}

	/// How far along this stream we are
	pub fn phase(&self) -> ScanPhase {
		match &self.state {
			ScanState::Metadata(x) if x.awaiting_marker() => ScanPhase::AwaitingStreamMarker,
			ScanState::Metadata(x) => ScanPhase::InMetadata {
				last_block_seen: x.last_block_seen(),
			},
			ScanState::AudioFrames(_) => ScanPhase::InAudioFrames,
			ScanState::Stopped => ScanPhase::Stopped,
		}
	}

	/// This stream's streaminfo block, once we've read it
	pub fn streaminfo(&self) -> Option<&FlacStreaminfo> {
		match &self.state {
			ScanState::Metadata(x) => x.streaminfo(),
			_ => self.streaminfo.as_ref(),
		}
	}

	/// Forget this stream.
	/// After this, [`SeekTableAccumulator::init`] may be called again.
	pub fn clear(&mut self) {
		self.reset();
		self.lifecycle = Lifecycle::Idle;
	}

	fn reset(&mut self) {
		self.pending.clear();
		self.state = ScanState::Metadata(MetadataBlockScanner::new());
		self.streaminfo = None;
		self.result = SeekTableResult::default();
		self.report = ScanReport::default();
	}
}
