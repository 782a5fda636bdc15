use serde::Deserialize;
use std::fmt::Display;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
	Trace,
	Debug,
	#[default]
	Info,
	Warn,
	Error,
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trace => write!(f, "trace"),
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warn => write!(f, "warn"),
			Self::Error => write!(f, "error"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LoggingPreset {
	#[default]
	Default,
	Verbose,
	Develop,
	Trace,
}

impl LoggingPreset {
	pub fn get_config(&self) -> LoggingConfig {
		match self {
			Self::Default => LoggingConfig {
				other: LogLevel::Warn,
				seektable: LogLevel::Warn,
				frames: LogLevel::Warn,
				cli: LogLevel::Info,
			},

			Self::Verbose => LoggingConfig {
				other: LogLevel::Warn,
				seektable: LogLevel::Debug,
				frames: LogLevel::Info,
				cli: LogLevel::Debug,
			},

			Self::Develop => LoggingConfig {
				other: LogLevel::Debug,
				seektable: LogLevel::Trace,
				frames: LogLevel::Debug,
				cli: LogLevel::Trace,
			},

			Self::Trace => LoggingConfig {
				other: LogLevel::Trace,
				seektable: LogLevel::Trace,
				frames: LogLevel::Trace,
				cli: LogLevel::Trace,
			},
		}
	}
}

pub struct LoggingConfig {
	other: LogLevel,

	seektable: LogLevel,

	// Logs every frame and rejected header, this is loud.
	frames: LogLevel,

	cli: LogLevel,
}

impl LoggingConfig {
	/// The filter directives for this config, as accepted by [`EnvFilter`]
	pub fn directives(&self) -> String {
		[
			format!("flacseek_seektable::scan::frames={}", self.frames),
			format!("flacseek_seektable={}", self.seektable),
			format!("flacseek={}", self.cli),
			self.other.to_string(),
		]
		.join(",")
	}
}

impl From<LoggingConfig> for EnvFilter {
	fn from(value: LoggingConfig) -> Self {
		EnvFilter::new(value.directives())
	}
}
