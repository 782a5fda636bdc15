//! Build a seek table while forwarding a stream unchanged

use std::io::Write;
use tracing::warn;

use crate::{
	accumulator::SeekTableAccumulator,
	config::SeekTableConfig,
	table::{ScanReport, SeekTableResult},
};

/// A stream stage that copies every byte it gets to `downstream`,
/// building a seek table on the side.
///
/// Bytes are always written before they are scanned, and nothing
/// the scanner finds changes what is written.
pub struct SeekTablePassThrough<W: Write> {
	downstream: W,
	accumulator: SeekTableAccumulator,
}

impl<W: Write> SeekTablePassThrough<W> {
	/// Start a new stream that is forwarded to `downstream`
	pub fn new(downstream: W, config: SeekTableConfig) -> Self {
		let mut accumulator = SeekTableAccumulator::new(config);
		if let Err(error) = accumulator.init() {
			warn!(message = "Could not initialize seek table", %error);
		}

		Self {
			downstream,
			accumulator,
		}
	}

	/// Forward a chunk of the stream
	pub fn on_data(&mut self, chunk: &[u8]) -> std::io::Result<()> {
		self.downstream.write_all(chunk)?;
		self.scan(chunk);
		return Ok(());
	}

	/// Finish this stream.
	/// Returns the downstream writer and the finished seek table.
	pub fn on_end(mut self) -> std::io::Result<(W, SeekTableResult)> {
		self.downstream.flush()?;

		if let Err(error) = self.accumulator.finalize() {
			warn!(message = "Could not finalize seek table", %error);
		}

		let table = self.accumulator.get_table();
		self.accumulator.clear();
		return Ok((self.downstream, table));
	}

	/// What we've noticed in this stream so far
	pub fn report(&self) -> &ScanReport {
		self.accumulator.report()
	}

	fn scan(&mut self, data: &[u8]) {
		// Table-building problems never reach the byte stream
		if let Err(error) = self.accumulator.process_chunk(data) {
			warn!(message = "Could not scan chunk", %error);
		}
	}
}

impl<W: Write> Write for SeekTablePassThrough<W> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		let n = self.downstream.write(buf)?;
		self.scan(&buf[..n]);
		return Ok(n);
	}

	fn flush(&mut self) -> std::io::Result<()> {
		self.downstream.flush()
	}
}
