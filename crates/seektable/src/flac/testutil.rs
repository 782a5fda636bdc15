//! Synthetic flac streams for tests.
//!
//! By default, frame payloads never contain `0xFF`, so the only sync
//! codes in a stream are the ones we put there. Noisy payloads are
//! seeded random bytes full of sync-like pairs.

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{
	frameheader::{BlockingStrategy, FrameHeader},
	metablock::{FlacMetablockHeader, FlacMetablockType},
	streaminfo::{FlacStreaminfo, STREAMINFO_LEN},
	MAGIC,
};
use crate::table::SeekPoint;

enum Piece {
	Frame { header: FrameHeader, payload: Vec<u8> },
	Garbage(Vec<u8>),
}

/// A stream made by [`FlacStreamBuilder`]
pub struct TestStream {
	pub data: Vec<u8>,

	/// The absolute offset of the first frame
	pub audio_offset: u64,

	/// The absolute offset of each frame
	pub frame_offsets: Vec<u64>,

	/// The seek points this stream should produce with one point per frame
	pub seekpoints: Vec<SeekPoint>,
}

pub struct FlacStreamBuilder {
	streaminfo: FlacStreaminfo,
	blocks: Vec<(FlacMetablockType, u32)>,
	pieces: Vec<Piece>,
	next_frame: u32,
	next_sample: u64,
	noise: Option<StdRng>,
}

impl FlacStreamBuilder {
	/// A 44.1kHz, 16-bit stereo stream with 4096-sample blocks
	pub fn new() -> Self {
		Self {
			streaminfo: FlacStreaminfo {
				min_block_size: 4096,
				max_block_size: 4096,
				min_frame_size: 0,
				max_frame_size: 0,
				sample_rate: 44_100,
				channels: 2,
				bits_per_sample: 16,
				total_samples: 0,
				md5_signature: [0; 16],
			},
			blocks: Vec::new(),
			pieces: Vec::new(),
			next_frame: 0,
			next_sample: 0,
			noise: None,
		}
	}

	/// Fill frames added after this with seeded random bytes.
	/// Every 64th byte starts a `0xFF 0xF8` pair.
	pub fn noisy_payloads(mut self, seed: u64) -> Self {
		self.noise = Some(StdRng::seed_from_u64(seed));
		self
	}

	fn payload(&mut self, len: usize) -> Vec<u8> {
		match &mut self.noise {
			None => (0..len).map(|i| (i % 251) as u8).collect(),
			Some(rng) => {
				let mut payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
				for i in (0..len.saturating_sub(1)).step_by(64) {
					payload[i] = 0xFF;
					payload[i + 1] = 0xF8;
				}
				payload
			}
		}
	}

	pub fn streaminfo(mut self, f: impl FnOnce(&mut FlacStreaminfo)) -> Self {
		f(&mut self.streaminfo);
		self
	}

	pub fn raw_block(mut self, block_type: FlacMetablockType, length: u32) -> Self {
		self.blocks.push((block_type, length));
		self
	}

	pub fn padding(self, length: u32) -> Self {
		self.raw_block(FlacMetablockType::Padding, length)
	}

	pub fn vorbis_comment(self, length: u32) -> Self {
		self.raw_block(FlacMetablockType::VorbisComment, length)
	}

	pub fn application(self, length: u32) -> Self {
		self.raw_block(FlacMetablockType::Application, length)
	}

	/// Add a frame with an arbitrary header
	pub fn frame(mut self, header: FrameHeader, payload_len: usize) -> Self {
		let payload = self.payload(payload_len);
		self.pieces.push(Piece::Frame { header, payload });
		self
	}

	/// Write a frame header into the last frame's payload, `at` bytes in.
	/// If `valid_crc` is false, the header's crc is wrong.
	pub fn plant_header(mut self, at: usize, header: FrameHeader, valid_crc: bool) -> Self {
		let mut fake = Vec::new();
		header.encode(&mut fake).unwrap();
		if !valid_crc {
			*fake.last_mut().unwrap() ^= 0b0101_0101;
		}

		let Some(Piece::Frame { payload, .. }) = self.pieces.last_mut() else {
			panic!("no frame to plant a header in");
		};
		payload[at..at + fake.len()].copy_from_slice(&fake);
		self
	}

	/// Add `count` numbered frames of a fixed-blocksize stream.
	/// Payload lengths start at `payload_len` and vary a little.
	pub fn fixed_frames(mut self, count: usize, payload_len: usize) -> Self {
		for i in 0..count {
			let header = FrameHeader {
				blocking: BlockingStrategy::Fixed(self.next_frame),
				block_size: self.streaminfo.max_block_size,
				sample_rate: Some(self.streaminfo.sample_rate),
				channels: self.streaminfo.channels,
				bits_per_sample: Some(self.streaminfo.bits_per_sample),
			};
			self.next_frame += 1;
			self = self.frame(header, payload_len + (i * 13) % 50);
		}
		self
	}

	/// Add one frame of a variable-blocksize stream for each block size
	pub fn variable_frames(mut self, block_sizes: &[u32], payload_len: usize) -> Self {
		for (i, block_size) in block_sizes.iter().enumerate() {
			let header = FrameHeader {
				blocking: BlockingStrategy::Variable(self.next_sample),
				block_size: *block_size,
				sample_rate: None,
				channels: self.streaminfo.channels,
				bits_per_sample: None,
			};
			self.next_sample += u64::from(*block_size);
			self = self.frame(header, payload_len + (i * 7) % 30);
		}
		self
	}

	/// Add bytes that contain no sync code after the last frame
	pub fn garbage(mut self, len: usize) -> Self {
		self.pieces
			.push(Piece::Garbage((0..len).map(|i| (i % 200) as u8 + 3).collect()));
		self
	}

	pub fn build(self) -> TestStream {
		let mut data = MAGIC.to_vec();

		FlacMetablockHeader {
			block_type: FlacMetablockType::Streaminfo,
			length: STREAMINFO_LEN,
			is_last: self.blocks.is_empty(),
		}
		.encode(&mut data)
		.unwrap();
		self.streaminfo.encode(&mut data).unwrap();

		for (i, (block_type, length)) in self.blocks.iter().enumerate() {
			FlacMetablockHeader {
				block_type: *block_type,
				length: *length,
				is_last: i == self.blocks.len() - 1,
			}
			.encode(&mut data)
			.unwrap();
			data.extend(std::iter::repeat(0u8).take(*length as usize));
		}

		let audio_offset = data.len() as u64;
		let mut frame_offsets = Vec::new();
		let mut seekpoints = Vec::new();

		for piece in self.pieces {
			match piece {
				Piece::Garbage(x) => data.extend(x),
				Piece::Frame { header, payload } => {
					let offset = data.len() as u64;
					frame_offsets.push(offset);
					seekpoints.push(SeekPoint {
						sample_number: match header.blocking {
							BlockingStrategy::Fixed(n) => {
								u64::from(n) * u64::from(self.streaminfo.max_block_size)
							}
							BlockingStrategy::Variable(s) => s,
						},
						byte_offset: offset - audio_offset,
						frame_samples: header.block_size,
					});

					header.encode(&mut data).unwrap();
					data.extend(payload);
				}
			}
		}

		TestStream {
			data,
			audio_offset,
			frame_offsets,
			seekpoints,
		}
	}
}

/// Streams shared by stream-level tests, by name
pub fn named_stream(name: &str) -> TestStream {
	match name {
		// Metadata ends at byte 136, followed by seven frames
		"seven_frames" => FlacStreamBuilder::new()
			.vorbis_comment(90)
			.fixed_frames(7, 1000)
			.build(),

		"streaminfo_only" => FlacStreamBuilder::new().fixed_frames(3, 40).build(),

		"many_blocks" => FlacStreamBuilder::new()
			.vorbis_comment(400)
			.raw_block(FlacMetablockType::Seektable, 18 * 20)
			.application(30)
			.raw_block(FlacMetablockType::Picture, 3000)
			.raw_block(FlacMetablockType::Unknown(99), 5)
			.padding(8192)
			.fixed_frames(40, 500)
			.build(),

		"variable_blocks" => FlacStreamBuilder::new()
			.streaminfo(|s| {
				s.min_block_size = 16;
				s.max_block_size = 8192;
			})
			.padding(100)
			.variable_frames(&[4096, 16, 8192, 1152, 577, 4096, 4096, 300, 2000], 250)
			.build(),

		"min_frame_size" => FlacStreamBuilder::new()
			.streaminfo(|s| s.min_frame_size = 206)
			.vorbis_comment(10)
			.fixed_frames(25, 200)
			.build(),

		"many_frames" => FlacStreamBuilder::new()
			.streaminfo(|s| {
				s.min_block_size = 1152;
				s.max_block_size = 1152;
			})
			.padding(20)
			.fixed_frames(300, 60)
			.build(),

		"noisy_frames" => FlacStreamBuilder::new()
			.vorbis_comment(30)
			.noisy_payloads(0x5EEC)
			.fixed_frames(40, 700)
			.build(),

		_ => panic!("no test stream named {name}"),
	}
}
