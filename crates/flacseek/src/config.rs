use flacseek_util::logging::LoggingPreset;
use serde::Deserialize;

/// Note that the field of this struct are not capitalized.
/// Envy is case-insensitive, and expects Rust fields to be snake_case.
#[derive(Debug, Deserialize, Clone)]
pub struct FlacseekConfig {
	/// The logging level to run with
	#[serde(default)]
	pub flacseek_loglevel: LoggingPreset,

	/// The number of bytes we read from the input at a time
	#[serde(default = "FlacseekConfig::default_chunk_size")]
	pub flacseek_chunk_size: usize,

	/// How many bytes we may search for a frame header
	/// before reporting that we lost sync
	#[serde(default = "FlacseekConfig::default_max_sync_span")]
	pub flacseek_max_sync_span: u64,
}

impl FlacseekConfig {
	fn default_chunk_size() -> usize {
		65_536
	}

	fn default_max_sync_span() -> u64 {
		1 << 20
	}
}
