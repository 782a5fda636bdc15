//! FLAC metablock headers

use std::io::Write;

/// The length of a metablock header, in bytes
pub const METABLOCK_HEADER_LEN: usize = 4;

/// A type of flac metadata block
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FlacMetablockType {
	Streaminfo,
	Padding,
	Application,
	Seektable,
	VorbisComment,
	Cuesheet,
	Picture,

	/// A reserved or invalid block type.
	/// We never interpret these, but we must still skip them.
	Unknown(u8),
}

impl FlacMetablockType {
	/// Decode a block type from the low seven bits of `id`
	pub fn from_id(id: u8) -> Self {
		return match id & 0b0111_1111 {
			0 => FlacMetablockType::Streaminfo,
			1 => FlacMetablockType::Padding,
			2 => FlacMetablockType::Application,
			3 => FlacMetablockType::Seektable,
			4 => FlacMetablockType::VorbisComment,
			5 => FlacMetablockType::Cuesheet,
			6 => FlacMetablockType::Picture,
			x => FlacMetablockType::Unknown(x),
		};
	}

	/// The seven-bit id of this block type
	pub fn to_id(&self) -> u8 {
		match self {
			FlacMetablockType::Streaminfo => 0,
			FlacMetablockType::Padding => 1,
			FlacMetablockType::Application => 2,
			FlacMetablockType::Seektable => 3,
			FlacMetablockType::VorbisComment => 4,
			FlacMetablockType::Cuesheet => 5,
			FlacMetablockType::Picture => 6,
			FlacMetablockType::Unknown(x) => x & 0b0111_1111,
		}
	}
}

/// The header of a flac metadata block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlacMetablockHeader {
	/// The type of block this is
	pub block_type: FlacMetablockType,

	/// The length of this block, in bytes
	/// (not including this header)
	pub length: u32,

	/// If true, this is the last metadata block
	pub is_last: bool,
}

impl FlacMetablockHeader {
	/// Decode a metablock header
	pub fn decode(header: [u8; METABLOCK_HEADER_LEN]) -> Self {
		// Last-metadata-block flag:
		// '1' if this block is the last metadata block before the audio blocks,
		// '0' otherwise.
		return Self {
			block_type: FlacMetablockType::from_id(header[0]),
			length: u32::from_be_bytes([0, header[1], header[2], header[3]]),
			is_last: header[0] & 0b1000_0000 == 0b1000_0000,
		};
	}

	/// Encode this header.
	/// Lengths longer than 24 bits are truncated.
	pub fn encode(&self, target: &mut impl Write) -> std::io::Result<()> {
		let mut block_type = self.block_type.to_id();

		if self.is_last {
			block_type |= 0b1000_0000;
		};

		let x = self.length.to_be_bytes();
		target.write_all(&[block_type, x[1], x[2], x[3]])?;

		return Ok(());
	}
}
