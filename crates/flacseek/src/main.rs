use anyhow::{Context, Result};
use clap::Parser;
use config::FlacseekConfig;
use flacseek_seektable::{SeekDensity, SeekTableConfig, SeekTablePassThrough};
use flacseek_util::{load_env, LoadedEnv};
use std::{
	fs::File,
	io::{BufWriter, ErrorKind, Read, Write},
	path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

mod config;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
	/// The flac file to read, or `-` for stdin
	input: PathBuf,

	/// Copy the input here
	#[arg(long, short)]
	output: Option<PathBuf>,

	/// Write the seek table here as json, instead of to stdout
	#[arg(long)]
	table: Option<PathBuf>,

	/// Write the seek table here as a flac SEEKTABLE metadata block
	#[arg(long)]
	block: Option<PathBuf>,

	/// Make a seek point every this many frames
	#[arg(long, conflicts_with = "every_samples")]
	every_frames: Option<u64>,

	/// Make a seek point every this many samples
	#[arg(long)]
	every_samples: Option<u64>,
}

impl Args {
	fn density(&self) -> SeekDensity {
		match (self.every_frames, self.every_samples) {
			(Some(k), _) => SeekDensity::EveryNthFrame(k),
			(None, Some(n)) => SeekDensity::EverySamples(n),
			(None, None) => SeekDensity::EveryFrame,
		}
	}
}

fn create(path: &Path) -> Result<BufWriter<File>> {
	let file = File::create(path).with_context(|| format!("could not create {path:?}"))?;
	return Ok(BufWriter::new(file));
}

fn main() -> Result<()> {
	let args = Args::parse();

	let config_res = match load_env::<FlacseekConfig>() {
		Ok(x) => x,

		#[expect(clippy::print_stderr)]
		Err(err) => {
			eprintln!("Error while loading .env: {err}");
			std::process::exit(1);
		}
	};

	let config = config_res.get_config().clone();

	// Stdout may carry the table, so logs go to stderr
	tracing_subscriber::fmt()
		.with_env_filter(config.flacseek_loglevel.get_config())
		.with_writer(std::io::stderr)
		.without_time()
		.with_ansi(true)
		.init();

	// Do this now, logging wasn't available earlier
	match config_res {
		LoadedEnv::FoundFile { config, path } => {
			debug!(message = "Loaded config from .env", ?path, ?config);
		}
		LoadedEnv::OnlyVars(config) => {
			debug!(
				message = "No `.env` found, loaded config from environment",
				?config
			);
		}
	};

	let mut input: Box<dyn Read> = if args.input.as_os_str() == "-" {
		Box::new(std::io::stdin().lock())
	} else {
		Box::new(
			File::open(&args.input).with_context(|| format!("could not open {:?}", args.input))?,
		)
	};

	let output: Box<dyn Write> = match &args.output {
		Some(path) => Box::new(create(path)?),
		None => Box::new(std::io::sink()),
	};

	let mut stage = SeekTablePassThrough::new(
		output,
		SeekTableConfig {
			density: args.density(),
			max_sync_span: config.flacseek_max_sync_span,
		},
	);

	let mut buf = vec![0u8; config.flacseek_chunk_size.max(1)];
	loop {
		let n = match input.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => n,
			Err(err) if err.kind() == ErrorKind::Interrupted => continue,
			Err(err) => return Err(err).context("could not read input"),
		};

		stage.on_data(&buf[..n]).context("could not write output")?;
	}

	let report = stage.report().clone();
	let (_, table) = stage.on_end().context("could not write output")?;

	for error in &report.errors {
		warn!(message = "Problem in input stream", %error);
	}

	info!(
		message = "Built seek table",
		seekpoints = table.seekpoints.len(),
		audio_offset = table.audio_offset,
		frames = report.frames_accepted,
		rejected_headers = report.headers_rejected
	);

	if let Some(path) = &args.block {
		let mut f = create(path)?;
		table
			.encode_seektable(true, &mut f)
			.context("could not write seektable block")?;
		f.flush()?;
	}

	match &args.table {
		Some(path) => {
			let mut f = create(path)?;
			serde_json::to_writer_pretty(&mut f, &table)?;
			f.flush()?;
		}
		None => {
			let mut stdout = std::io::stdout().lock();
			serde_json::to_writer_pretty(&mut stdout, &table)?;
			writeln!(stdout)?;
		}
	}

	if report.is_fatal() {
		anyhow::bail!("input is not a valid flac stream");
	}

	return Ok(());
}
