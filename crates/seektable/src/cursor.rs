//! A read cursor over "leftover bytes + newest chunk".
//!
//! Input arrives in chunks that have nothing to do with FLAC structure.
//! [`PendingBuffer`] keeps only the bytes of an element we couldn't finish
//! parsing; [`ByteCursor`] presents those bytes and a fresh chunk as one
//! logical stream. Bytes are copied into the pending buffer only when an
//! element straddles the two, or when the cursor is dropped with unread
//! bytes left in the chunk.

/// Unconsumed bytes carried between chunks.
///
/// This never holds a fully-parsed element: it grows only while a partial
/// element waits for more data, and is emptied as soon as that element is read.
#[derive(Debug, Default)]
pub struct PendingBuffer {
	// Buffered bytes. Everything before `head` has already been consumed.
	tail: Vec<u8>,
	head: usize,

	// Absolute stream offset of the first unconsumed byte
	position: u64,
}

impl PendingBuffer {
	/// Make a new, empty [`PendingBuffer`]
	pub fn new() -> Self {
		Self::default()
	}

	/// Start reading `chunk`, logically appended to any bytes we're holding.
	/// Whatever isn't consumed when the returned cursor is dropped
	/// is kept here for the next chunk.
	pub fn feed<'a>(&'a mut self, chunk: &'a [u8]) -> ByteCursor<'a> {
		ByteCursor {
			pending: self,
			chunk,
		}
	}

	/// The number of bytes we're holding
	pub fn len(&self) -> usize {
		self.tail.len() - self.head
	}

	/// If true, we aren't holding any bytes
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The absolute stream offset of the first byte we haven't consumed
	pub fn position(&self) -> u64 {
		self.position
	}

	/// Forget all buffered bytes and reset the stream position
	pub fn clear(&mut self) {
		self.tail = Vec::new();
		self.head = 0;
		self.position = 0;
	}
}

/// A cursor over a [`PendingBuffer`] followed by one input chunk.
///
/// Reads come from the pending bytes first, then from the chunk.
/// Dropping the cursor stashes the unread remainder of the chunk.
pub struct ByteCursor<'a> {
	pending: &'a mut PendingBuffer,
	chunk: &'a [u8],
}

impl ByteCursor<'_> {
	/// The absolute stream offset of the next byte this cursor will return
	pub fn position(&self) -> u64 {
		self.pending.position
	}

	/// The number of bytes we can read before running out
	pub fn available(&self) -> usize {
		self.pending.len() + self.chunk.len()
	}

	/// The longest contiguous run of bytes at the front of this cursor.
	/// This may be shorter than [`ByteCursor::available`].
	pub fn window(&self) -> &[u8] {
		if self.pending.is_empty() {
			self.chunk
		} else {
			&self.pending.tail[self.pending.head..]
		}
	}

	/// Make sure the first `n` bytes are contiguous, moving at most
	/// `n` bytes from the chunk into the pending buffer.
	/// Returns false if fewer than `n` bytes are available.
	fn make_contiguous(&mut self, n: usize) -> bool {
		if self.pending.is_empty() {
			self.pending.tail.clear();
			self.pending.head = 0;
			return self.chunk.len() >= n;
		}

		let have = self.pending.len();
		if have >= n {
			return true;
		}

		// Don't let consumed bytes pile up at the front of the buffer
		if self.pending.head != 0 {
			self.pending.tail.drain(..self.pending.head);
			self.pending.head = 0;
		}

		let k = (n - have).min(self.chunk.len());
		self.pending.tail.extend_from_slice(&self.chunk[..k]);
		self.chunk = &self.chunk[k..];

		return self.pending.len() >= n;
	}

	/// Look at the next `n` bytes without consuming them.
	/// Returns `None` if fewer than `n` bytes are available.
	pub fn peek(&mut self, n: usize) -> Option<&[u8]> {
		if !self.make_contiguous(n) {
			return None;
		}
		return Some(&self.window()[..n]);
	}

	/// Look at up to `n` bytes without consuming them.
	/// The result is shorter than `n` only if we ran out of data.
	pub fn peek_up_to(&mut self, n: usize) -> &[u8] {
		self.make_contiguous(n);
		let w = self.window();
		return &w[..w.len().min(n)];
	}

	/// Consume and return the next `n` bytes.
	/// If fewer than `n` bytes are available, nothing is consumed.
	pub fn try_take(&mut self, n: usize) -> Option<&[u8]> {
		if !self.make_contiguous(n) {
			return None;
		}

		if self.pending.is_empty() {
			let chunk = self.chunk;
			self.advance(n);
			return Some(&chunk[..n]);
		}

		let start = self.pending.head;
		self.advance(n);
		return Some(&self.pending.tail[start..start + n]);
	}

	/// Consume up to `n` bytes without copying them anywhere.
	/// Returns the number of bytes skipped.
	pub fn skip(&mut self, n: u64) -> u64 {
		let k = usize::try_from(n)
			.unwrap_or(usize::MAX)
			.min(self.available());
		self.advance(k);
		return u64::try_from(k).unwrap_or(u64::MAX);
	}

	/// Consume everything this cursor can see
	pub fn skip_all(&mut self) -> u64 {
		let n = self.available();
		self.advance(n);
		return u64::try_from(n).unwrap_or(u64::MAX);
	}

	/// Consume `n` bytes. `n` must not exceed [`ByteCursor::available`].
	pub fn advance(&mut self, n: usize) {
		assert!(n <= self.available(), "advanced past end of cursor");

		let from_pending = self.pending.len().min(n);
		self.pending.head += from_pending;
		self.chunk = &self.chunk[n - from_pending..];
		self.pending.position += u64::try_from(n).unwrap_or(u64::MAX);
	}
}

impl Drop for ByteCursor<'_> {
	fn drop(&mut self) {
		if self.pending.head != 0 {
			self.pending.tail.drain(..self.pending.head);
			self.pending.head = 0;
		}
		self.pending.tail.extend_from_slice(self.chunk);
	}
}
