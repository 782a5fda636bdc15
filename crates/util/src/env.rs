use serde::de::DeserializeOwned;
use std::{io::ErrorKind, path::PathBuf};
use thiserror::Error;

/// Why we couldn't load configuration
#[derive(Debug, Error)]
pub enum EnvLoadError {
	/// `.env` exists but couldn't be read or parsed
	#[error("could not read .env: {0}")]
	DotEnv(#[from] dotenvy::Error),

	/// A variable is missing or has a bad value
	#[error("invalid configuration: {0}")]
	Config(#[from] envy::Error),
}

/// Configuration, and where it came from
pub enum LoadedEnv<T> {
	/// Loaded from `.env` and environment variables
	FoundFile { config: T, path: PathBuf },

	/// There is no `.env`, only environment variables were read
	OnlyVars(T),
}

impl<T> LoadedEnv<T> {
	pub fn get_config(&self) -> &T {
		match self {
			Self::FoundFile { config, .. } => config,
			Self::OnlyVars(config) => config,
		}
	}
}

/// Load `T` from environment variables,
/// after adding the variables in `.env` if there is one.
pub fn load_env<T: DeserializeOwned>() -> Result<LoadedEnv<T>, EnvLoadError> {
	let path = match dotenvy::dotenv() {
		Ok(path) => Some(path),
		Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => None,
		Err(err) => return Err(err.into()),
	};

	let config = envy::from_env::<T>()?;

	return Ok(match path {
		Some(path) => LoadedEnv::FoundFile { config, path },
		None => LoadedEnv::OnlyVars(config),
	});
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;

	use super::*;

	#[derive(Debug, Deserialize)]
	struct Config {
		#[expect(dead_code)]
		flacseek_chunk_size: usize,
	}

	#[test]
	fn missing_value_names_the_variable() {
		let err: EnvLoadError = envy::from_iter::<_, Config>(Vec::<(String, String)>::new())
			.unwrap_err()
			.into();

		assert!(matches!(err, EnvLoadError::Config(_)));
		assert!(err.to_string().contains("flacseek_chunk_size"));
	}

	#[test]
	fn bad_value_is_a_config_error() {
		let vars = vec![(
			"FLACSEEK_CHUNK_SIZE".to_owned(),
			"lots".to_owned(),
		)];
		let err: EnvLoadError = envy::from_iter::<_, Config>(vars).unwrap_err().into();
		assert!(matches!(err, EnvLoadError::Config(_)));
	}
}
