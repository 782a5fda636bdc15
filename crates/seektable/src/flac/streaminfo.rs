use std::io::Write;

/// The length of a streaminfo block's payload, in bytes.
/// Every valid stream uses exactly this length.
pub const STREAMINFO_LEN: u32 = 34;

/// A streaminfo block in a flac file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacStreaminfo {
	/// The minimum block size (in samples) used in the stream.
	pub min_block_size: u32,

	/// The maximum block size (in samples) used in the stream.
	/// (Minimum blocksize == maximum blocksize) implies a fixed-blocksize stream.
	pub max_block_size: u32,

	/// The minimum frame size (in bytes) used in the stream.
	/// May be 0 to imply the value is not known.
	pub min_frame_size: u32,

	/// The maximum frame size (in bytes) used in the stream.
	/// May be 0 to imply the value is not known.
	pub max_frame_size: u32,

	/// Sample rate in Hz.
	pub sample_rate: u32,

	/// Number of channels, 1 to 8.
	pub channels: u8,

	/// Bits per sample, 4 to 32.
	pub bits_per_sample: u8,

	/// Total inter-channel samples in the stream.
	/// Zero means the number of total samples is unknown.
	pub total_samples: u64,

	/// MD5 signature of the unencoded audio data
	pub md5_signature: [u8; 16],
}

impl FlacStreaminfo {
	/// Decode a streaminfo payload (without its metablock header).
	/// Returns `None` if `data` isn't exactly [`STREAMINFO_LEN`] bytes long.
	pub fn decode(data: &[u8]) -> Option<Self> {
		if data.len() != STREAMINFO_LEN as usize {
			return None;
		}

		let min_block_size = u32::from(u16::from_be_bytes([data[0], data[1]]));
		let max_block_size = u32::from(u16::from_be_bytes([data[2], data[3]]));
		let min_frame_size = u32::from_be_bytes([0, data[4], data[5], data[6]]);
		let max_frame_size = u32::from_be_bytes([0, data[7], data[8], data[9]]);

		let block = &data[10..18];

		// 20 bits: sample rate in hz
		let sample_rate = u32::from_be_bytes([0, block[0], block[1], block[2]]) >> 4;

		// 3 bits: number of channels - 1.
		let channels = ((block[2] & 0b0000_1110) >> 1) + 1;

		// 5 bits: bits per sample - 1.
		let bits_per_sample = ((block[2] & 0b0000_0001) << 4) + ((block[3] & 0b1111_0000) >> 4) + 1;

		// 36 bits: total "cross-channel" samples in the stream.
		// (one second of 44.1Khz audio will have 44100 samples regardless of the number of channels)
		let total_samples = u64::from_be_bytes([
			0,
			0,
			0,
			block[3] & 0b0000_1111,
			block[4],
			block[5],
			block[6],
			block[7],
		]);

		let mut md5_signature = [0u8; 16];
		md5_signature.copy_from_slice(&data[18..34]);

		return Some(Self {
			min_block_size,
			max_block_size,
			min_frame_size,
			max_frame_size,
			sample_rate,
			channels,
			bits_per_sample,
			total_samples,
			md5_signature,
		});
	}

	/// Encode this block's payload (without a metablock header).
	/// Out-of-range fields are truncated to their bit width.
	pub fn encode(&self, target: &mut impl Write) -> std::io::Result<()> {
		let min_bs = self.min_block_size.to_be_bytes();
		let max_bs = self.max_block_size.to_be_bytes();
		let min_fs = self.min_frame_size.to_be_bytes();
		let max_fs = self.max_frame_size.to_be_bytes();
		target.write_all(&[min_bs[2], min_bs[3], max_bs[2], max_bs[3]])?;
		target.write_all(&min_fs[1..])?;
		target.write_all(&max_fs[1..])?;

		let sr = (self.sample_rate & 0x000F_FFFF) << 4;
		let sr = sr.to_be_bytes();
		let ch = (self.channels.saturating_sub(1) & 0b111) << 1;
		let bps = self.bits_per_sample.saturating_sub(1) & 0b1_1111;
		let ts = (self.total_samples & 0x0F_FFFF_FFFF).to_be_bytes();

		target.write_all(&[
			sr[1],
			sr[2],
			sr[3] | ch | (bps >> 4),
			((bps & 0b1111) << 4) | ts[3],
			ts[4],
			ts[5],
			ts[6],
			ts[7],
		])?;

		target.write_all(&self.md5_signature)?;
		return Ok(());
	}

	/// If true, every frame in this stream (except perhaps the last) has the same block size.
	pub fn is_fixed_blocksize(&self) -> bool {
		self.min_block_size == self.max_block_size
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> FlacStreaminfo {
		FlacStreaminfo {
			min_block_size: 4096,
			max_block_size: 4096,
			min_frame_size: 14,
			max_frame_size: 13_001,
			sample_rate: 44_100,
			channels: 2,
			bits_per_sample: 16,
			total_samples: 0x3_2345_6789,
			md5_signature: [7; 16],
		}
	}

	#[test]
	fn decode_known_bytes() {
		// STREAMINFO from a 44.1kHz, 16-bit stereo file
		let data = [
			0x10, 0x00, 0x10, 0x00, // block sizes
			0x00, 0x00, 0x0e, 0x00, 0x32, 0xc9, // frame sizes
			0x0a, 0xc4, 0x42, 0xf0, 0x00, 0x01, 0x5f, 0x90, // rate, channels, bps, samples
			0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
		];

		let s = FlacStreaminfo::decode(&data).unwrap();
		assert_eq!(s.min_block_size, 4096);
		assert_eq!(s.max_block_size, 4096);
		assert_eq!(s.min_frame_size, 14);
		assert_eq!(s.max_frame_size, 13_001);
		assert_eq!(s.sample_rate, 44_100);
		assert_eq!(s.channels, 2);
		assert_eq!(s.bits_per_sample, 16);
		assert_eq!(s.total_samples, 90_000);
		assert!(s.is_fixed_blocksize());
	}

	#[test]
	fn encode_matches_decode() {
		let s = sample();
		let mut out = Vec::new();
		s.encode(&mut out).unwrap();
		assert_eq!(out.len(), STREAMINFO_LEN as usize);
		assert_eq!(FlacStreaminfo::decode(&out), Some(s));
	}

	#[test]
	fn wrong_length() {
		assert_eq!(FlacStreaminfo::decode(&[0u8; 33]), None);
		assert_eq!(FlacStreaminfo::decode(&[0u8; 35]), None);
	}
}
