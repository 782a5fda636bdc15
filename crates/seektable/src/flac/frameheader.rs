//! FLAC audio frame headers.
//!
//! Frame length isn't stored anywhere, so these headers are the only
//! structure we can find in audio data. A header is:
//!
//! ```notrust
//! <14> sync code 0b11111111_111110
//! <1>  reserved, must be 0
//! <1>  blocking strategy (0 = fixed, 1 = variable)
//! <4>  block size code
//! <4>  sample rate code
//! <4>  channel assignment
//! <3>  sample size code
//! <1>  reserved, must be 0
//! <8-56> "UTF-8" coded frame number (fixed) or sample number (variable)
//! <0/8/16> block size, if the block size code asks for it
//! <0/8/16> sample rate, if the sample rate code asks for it
//! <8>  CRC-8 of everything above
//! ```

use std::io::Write;
use thiserror::Error;

/// The longest a frame header can be, in bytes
pub const MAX_FRAME_HEADER_LEN: usize = 16;

/// The shortest a frame header can be, in bytes
pub const MIN_FRAME_HEADER_LEN: usize = 6;

/// If true, `a` and `b` start a frame header:
/// a 14-bit sync code followed by a zero reserved bit.
pub fn is_frame_sync(a: u8, b: u8) -> bool {
	a == 0b1111_1111 && b & 0b1111_1110 == 0b1111_1000
}

const CRC8_TABLE: [u8; 256] = {
	// polynomial = x^8 + x^2 + x^1 + x^0
	let mut table = [0u8; 256];
	let mut i = 0;
	while i < 256 {
		let mut crc = i as u8;
		let mut bit = 0;
		while bit < 8 {
			crc = if crc & 0x80 != 0 {
				(crc << 1) ^ 0x07
			} else {
				crc << 1
			};
			bit += 1;
		}
		table[i] = crc;
		i += 1;
	}
	table
};

/// The CRC-8 used by flac frame headers (polynomial 0x07, initialized with 0)
pub fn crc8(data: &[u8]) -> u8 {
	data.iter().fold(0u8, |crc, b| CRC8_TABLE[usize::from(crc ^ b)])
}

/// An error we can encounter while decoding a frame header
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameHeaderError {
	/// We need at least this many bytes to decode this header
	#[error("need {0} bytes to decode frame header")]
	Incomplete(usize),

	/// This isn't a frame sync code
	#[error("bad frame sync bytes")]
	BadSync,

	/// A reserved bit or a reserved code is set
	#[error("reserved field in use")]
	Reserved,

	/// The frame or sample number is malformed
	#[error("malformed coded number")]
	BadNumber,

	/// The header checksum doesn't match
	#[error("bad header crc (expected {expected:#04x}, got {got:#04x})")]
	BadCrc { expected: u8, got: u8 },
}

/// The position of a frame in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingStrategy {
	/// Fixed-blocksize stream; this is the frame number
	Fixed(u32),

	/// Variable-blocksize stream; this is the number of the frame's first sample
	Variable(u64),
}

/// A decoded flac frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
	/// Where this frame is in the stream
	pub blocking: BlockingStrategy,

	/// The number of inter-channel samples in this frame
	pub block_size: u32,

	/// This frame's sample rate.
	/// `None` means "same as streaminfo".
	pub sample_rate: Option<u32>,

	/// The number of channels in this frame
	pub channels: u8,

	/// Bits per sample.
	/// `None` means "same as streaminfo".
	pub bits_per_sample: Option<u8>,
}

fn need(data: &[u8], n: usize) -> Result<(), FrameHeaderError> {
	if data.len() < n {
		return Err(FrameHeaderError::Incomplete(n));
	}
	return Ok(());
}

/// Decode a "UTF-8" coded number from the front of `data`.
/// Returns the number and the number of bytes it used.
fn decode_coded_number(data: &[u8], offset: usize) -> Result<(u64, usize), FrameHeaderError> {
	need(data, offset + 1)?;
	let first = data[offset];

	let (len, mut value) = match first.leading_ones() {
		0 => (1, u64::from(first)),
		2 => (2, u64::from(first & 0b0001_1111)),
		3 => (3, u64::from(first & 0b0000_1111)),
		4 => (4, u64::from(first & 0b0000_0111)),
		5 => (5, u64::from(first & 0b0000_0011)),
		6 => (6, u64::from(first & 0b0000_0001)),
		7 => (7, 0),
		_ => return Err(FrameHeaderError::BadNumber),
	};

	need(data, offset + len)?;
	for b in &data[offset + 1..offset + len] {
		if b & 0b1100_0000 != 0b1000_0000 {
			return Err(FrameHeaderError::BadNumber);
		}
		value = (value << 6) | u64::from(b & 0b0011_1111);
	}

	return Ok((value, len));
}

/// Encode `value` as a "UTF-8" coded number (at most 36 bits)
fn encode_coded_number(value: u64, target: &mut Vec<u8>) {
	if value < 0x80 {
		target.push(value as u8);
		return;
	}

	// Number of continuation bytes
	let extra: u32 = match value {
		0..=0x7FF => 1,
		0x800..=0xFFFF => 2,
		0x1_0000..=0x1F_FFFF => 3,
		0x20_0000..=0x3FF_FFFF => 4,
		0x400_0000..=0x7FFF_FFFF => 5,
		_ => 6,
	};

	let lead_mask = !(0xFFu8 >> (extra + 1));
	let first_bits = value >> (6 * extra);
	target.push(lead_mask | first_bits as u8);

	for i in (0..extra).rev() {
		target.push(0b1000_0000 | ((value >> (6 * i)) & 0b0011_1111) as u8);
	}
}

impl FrameHeader {
	/// Try to decode a frame header at the start of `data`.
	/// Returns the header and its length in bytes (including the crc).
	///
	/// Cheap checks run first, so garbage is usually rejected
	/// before we ask for more than a few bytes.
	pub fn decode(data: &[u8]) -> Result<(Self, usize), FrameHeaderError> {
		need(data, 2)?;
		if !is_frame_sync(data[0], data[1]) {
			return Err(FrameHeaderError::BadSync);
		}
		let variable = data[1] & 0b0000_0001 == 1;

		need(data, 4)?;
		let block_size_code = data[2] >> 4;
		let sample_rate_code = data[2] & 0b0000_1111;
		let channel_code = data[3] >> 4;
		let sample_size_code = (data[3] & 0b0000_1110) >> 1;

		if block_size_code == 0
			|| sample_rate_code == 0b1111
			|| channel_code > 0b1010
			|| sample_size_code == 0b011
			|| data[3] & 0b0000_0001 != 0
		{
			return Err(FrameHeaderError::Reserved);
		}

		let (number, number_len) = decode_coded_number(data, 4)?;
		let blocking = if variable {
			BlockingStrategy::Variable(number)
		} else {
			// Frame numbers are 31 bits
			BlockingStrategy::Fixed(
				u32::try_from(number)
					.ok()
					.filter(|x| *x < 1 << 31)
					.ok_or(FrameHeaderError::BadNumber)?,
			)
		};

		let mut pos = 4 + number_len;

		let block_size = match block_size_code {
			0b0001 => 192,
			0b0010..=0b0101 => 576 << (block_size_code - 2),
			0b0110 => {
				need(data, pos + 1)?;
				pos += 1;
				u32::from(data[pos - 1]) + 1
			}
			0b0111 => {
				need(data, pos + 2)?;
				pos += 2;
				u32::from(u16::from_be_bytes([data[pos - 2], data[pos - 1]])) + 1
			}
			_ => 256 << (block_size_code - 8),
		};

		let sample_rate = match sample_rate_code {
			0b0000 => None,
			0b0001 => Some(88_200),
			0b0010 => Some(176_400),
			0b0011 => Some(192_000),
			0b0100 => Some(8_000),
			0b0101 => Some(16_000),
			0b0110 => Some(22_050),
			0b0111 => Some(24_000),
			0b1000 => Some(32_000),
			0b1001 => Some(44_100),
			0b1010 => Some(48_000),
			0b1011 => Some(96_000),
			0b1100 => {
				need(data, pos + 1)?;
				pos += 1;
				Some(u32::from(data[pos - 1]) * 1000)
			}
			0b1101 => {
				need(data, pos + 2)?;
				pos += 2;
				Some(u32::from(u16::from_be_bytes([data[pos - 2], data[pos - 1]])))
			}
			_ => {
				need(data, pos + 2)?;
				pos += 2;
				Some(u32::from(u16::from_be_bytes([data[pos - 2], data[pos - 1]])) * 10)
			}
		};

		let channels = match channel_code {
			// Independent channels
			0b0000..=0b0111 => channel_code + 1,
			// left/side, right/side, mid/side
			_ => 2,
		};

		let bits_per_sample = match sample_size_code {
			0b000 => None,
			0b001 => Some(8),
			0b010 => Some(12),
			0b100 => Some(16),
			0b101 => Some(20),
			0b110 => Some(24),
			_ => Some(32),
		};

		need(data, pos + 1)?;
		let expected = crc8(&data[..pos]);
		let got = data[pos];
		if expected != got {
			return Err(FrameHeaderError::BadCrc { expected, got });
		}

		return Ok((
			Self {
				blocking,
				block_size,
				sample_rate,
				channels,
				bits_per_sample,
			},
			pos + 1,
		));
	}

	/// Encode this header, including its crc.
	///
	/// Block sizes and sample rates that have no short code are
	/// stored explicitly at the end of the header.
	/// Multi-channel frames are always written as independent channels.
	pub fn encode(&self, target: &mut impl Write) -> std::io::Result<()> {
		let mut out = Vec::with_capacity(MAX_FRAME_HEADER_LEN);

		let variable = matches!(self.blocking, BlockingStrategy::Variable(_));
		out.push(0b1111_1111);
		out.push(0b1111_1000 | u8::from(variable));

		let (block_size_code, block_size_extra): (u8, Vec<u8>) = match self.block_size {
			192 => (0b0001, vec![]),
			576 => (0b0010, vec![]),
			1152 => (0b0011, vec![]),
			2304 => (0b0100, vec![]),
			4608 => (0b0101, vec![]),
			256 => (0b1000, vec![]),
			512 => (0b1001, vec![]),
			1024 => (0b1010, vec![]),
			2048 => (0b1011, vec![]),
			4096 => (0b1100, vec![]),
			8192 => (0b1101, vec![]),
			16384 => (0b1110, vec![]),
			32768 => (0b1111, vec![]),
			x @ 1..=256 => (0b0110, vec![(x - 1) as u8]),
			x => (0b0111, ((x.saturating_sub(1)) as u16).to_be_bytes().to_vec()),
		};

		let (sample_rate_code, sample_rate_extra): (u8, Vec<u8>) = match self.sample_rate {
			None => (0b0000, vec![]),
			Some(88_200) => (0b0001, vec![]),
			Some(176_400) => (0b0010, vec![]),
			Some(192_000) => (0b0011, vec![]),
			Some(8_000) => (0b0100, vec![]),
			Some(16_000) => (0b0101, vec![]),
			Some(22_050) => (0b0110, vec![]),
			Some(24_000) => (0b0111, vec![]),
			Some(32_000) => (0b1000, vec![]),
			Some(44_100) => (0b1001, vec![]),
			Some(48_000) => (0b1010, vec![]),
			Some(96_000) => (0b1011, vec![]),
			Some(x) if x <= 0xFFFF => (0b1101, (x as u16).to_be_bytes().to_vec()),
			Some(x) => (0b1110, (x.div_euclid(10) as u16).to_be_bytes().to_vec()),
		};

		let sample_size_code = match self.bits_per_sample {
			None => 0b000,
			Some(8) => 0b001,
			Some(12) => 0b010,
			Some(16) => 0b100,
			Some(20) => 0b101,
			Some(24) => 0b110,
			Some(_) => 0b111,
		};

		out.push((block_size_code << 4) | sample_rate_code);
		out.push(((self.channels.saturating_sub(1) & 0b0111) << 4) | (sample_size_code << 1));

		match self.blocking {
			BlockingStrategy::Fixed(x) => encode_coded_number(u64::from(x), &mut out),
			BlockingStrategy::Variable(x) => encode_coded_number(x, &mut out),
		}

		out.extend(block_size_extra);
		out.extend(sample_rate_extra);
		out.push(crc8(&out));

		target.write_all(&out)?;
		return Ok(());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn crc8_known_values() {
		assert_eq!(crc8(&[]), 0);
		// CRC-8/SMBUS check value
		assert_eq!(crc8(b"123456789"), 0xF4);
	}

	#[test]
	fn decode_real_header() {
		// First frame header of a 44.1kHz, 16-bit stereo file
		// (4096-sample blocks, frame 0)
		let data = [0xFF, 0xF8, 0xC9, 0x18, 0x00, 0xC2];
		let (h, len) = FrameHeader::decode(&data).unwrap();
		assert_eq!(len, 6);
		assert_eq!(h.blocking, BlockingStrategy::Fixed(0));
		assert_eq!(h.block_size, 4096);
		assert_eq!(h.sample_rate, Some(44_100));
		assert_eq!(h.channels, 2);
		assert_eq!(h.bits_per_sample, Some(16));
	}

	#[test]
	fn incomplete_headers_ask_for_more() {
		let mut data = Vec::new();
		FrameHeader {
			blocking: BlockingStrategy::Variable(0x1_2345_6789),
			block_size: 1000,
			sample_rate: Some(12_345),
			channels: 6,
			bits_per_sample: Some(24),
		}
		.encode(&mut data)
		.unwrap();

		for i in 0..data.len() {
			assert!(
				matches!(
					FrameHeader::decode(&data[..i]),
					Err(FrameHeaderError::Incomplete(n)) if n > i
				),
				"prefix of length {i} wasn't incomplete"
			);
		}

		let (h, len) = FrameHeader::decode(&data).unwrap();
		assert_eq!(len, data.len());
		assert_eq!(h.blocking, BlockingStrategy::Variable(0x1_2345_6789));
		assert_eq!(h.block_size, 1000);
		assert_eq!(h.sample_rate, Some(12_345));
		assert_eq!(h.channels, 6);
	}

	#[test]
	fn coded_numbers() {
		for value in [
			0u64,
			0x7F,
			0x80,
			0x7FF,
			0x800,
			0xFFFF,
			0x1_0000,
			0x1F_FFFF,
			0x3FF_FFFF,
			0x7FFF_FFFF,
			0xF_FFFF_FFFF,
		] {
			let mut out = Vec::new();
			encode_coded_number(value, &mut out);
			assert_eq!(decode_coded_number(&out, 0), Ok((value, out.len())));
		}

		// Continuation byte in lead position
		assert_eq!(
			decode_coded_number(&[0b1000_0000], 0),
			Err(FrameHeaderError::BadNumber)
		);

		// Lead byte in continuation position
		assert_eq!(
			decode_coded_number(&[0b1100_0000, 0b1100_0000], 0),
			Err(FrameHeaderError::BadNumber)
		);
	}

	#[test]
	fn rejects_bad_headers() {
		// Not a sync code
		assert_eq!(
			FrameHeader::decode(&[0xFF, 0xF0, 0xC9, 0x18, 0x00, 0x00]),
			Err(FrameHeaderError::BadSync)
		);

		// Reserved bit after sync code
		assert_eq!(
			FrameHeader::decode(&[0xFF, 0xFA, 0xC9, 0x18, 0x00, 0x00]),
			Err(FrameHeaderError::BadSync)
		);

		// Invalid sample rate code
		assert_eq!(
			FrameHeader::decode(&[0xFF, 0xF8, 0xCF, 0x18, 0x00, 0x00]),
			Err(FrameHeaderError::Reserved)
		);

		// Reserved channel assignment
		assert_eq!(
			FrameHeader::decode(&[0xFF, 0xF8, 0xC9, 0xB8, 0x00, 0x00]),
			Err(FrameHeaderError::Reserved)
		);

		// Flipped bit fails crc
		let mut data = [0xFF, 0xF8, 0xC9, 0x18, 0x00, 0xC2];
		data[2] ^= 0b0001_0000;
		assert!(matches!(
			FrameHeader::decode(&data),
			Err(FrameHeaderError::BadCrc { .. })
		));
	}
}
