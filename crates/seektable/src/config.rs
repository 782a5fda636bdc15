use serde::Deserialize;

/// Which frames get a seek point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekDensity {
	/// One seek point per frame
	#[default]
	EveryFrame,

	/// One seek point every `n` frames, starting with the first.
	/// Zero is treated as one.
	EveryNthFrame(u64),

	/// One seek point for the first frame at or past
	/// every multiple of this many samples.
	/// Zero is treated as [`SeekDensity::EveryFrame`].
	EverySamples(u64),
}

/// Seek table builder configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeekTableConfig {
	/// Which frames get seek points
	#[serde(default)]
	pub density: SeekDensity,

	/// If we go this many bytes past the start of the last frame
	/// without finding another, we report lost sync and start counting again.
	///
	/// If streaminfo knows the maximum frame size and it is larger,
	/// we use that instead.
	#[serde(default = "SeekTableConfig::default_max_sync_span")]
	pub max_sync_span: u64,
}

impl SeekTableConfig {
	fn default_max_sync_span() -> u64 {
		1 << 20
	}
}

impl Default for SeekTableConfig {
	fn default() -> Self {
		Self {
			density: SeekDensity::default(),
			max_sync_span: Self::default_max_sync_span(),
		}
	}
}
