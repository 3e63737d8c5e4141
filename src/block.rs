
// IEEE-488.2 definite-length binary block framing.  Screenshot and waveform
// queries answer with `#<n><len><payload>` embedded in an otherwise
// line-oriented ASCII exchange: `#`, one digit giving the width of the length
// field, that many ASCII digits giving the payload length, then exactly that
// many raw bytes, then a terminator that is not part of the payload.
//
// The declared length is authoritative.  The reader never returns more or
// fewer payload bytes, and it leaves the session drained so the next command
// starts from a clean stream.

use log::{debug, warn};

use crate::error::{Result, ScopeError};
use crate::session::Session;

const BLOCK_MARKER:u8 = b'#';

// Leftovers from a prior exchange are drained before commanding.  A transfer
// that desynchronized badly enough to leave more than this behind needs a
// device clear, not a bigger drain.
const STALE_DRAIN_MAX:usize = 512;

// Cap on the fallback read when the reply turns out not to be a block at all
const FALLBACK_READ_MAX:usize = 4096;

// At most the `\r\n` pair is drained after the payload.  Draining further
// could consume the start of an unrelated subsequent reply.
const MAX_TRAILING_BYTES:usize = 2;

// Restores the session's terminator-recognition flag on every exit path,
// including early returns and propagated errors.
struct TermGuard<'a, S:Session + ?Sized> {
	session: &'a mut S,
	prev: bool,
}

impl<'a, S:Session + ?Sized> TermGuard<'a, S> {
	fn new(session:&'a mut S) -> Self {
		let prev:bool = session.term_enabled();
		session.set_term_enabled(false);
		Self{ session, prev }
	}
}

impl<'a, S:Session + ?Sized> std::ops::Deref for TermGuard<'a, S> {
	type Target = S;
	fn deref(&self) -> &S { self.session }
}

impl<'a, S:Session + ?Sized> std::ops::DerefMut for TermGuard<'a, S> {
	fn deref_mut(&mut self) -> &mut S { self.session }
}

impl<'a, S:Session + ?Sized> Drop for TermGuard<'a, S> {
	fn drop(&mut self) { self.session.set_term_enabled(self.prev); }
}

fn one_byte<S:Session + ?Sized>(session:&mut S, what:&'static str) -> Result<u8> {
	let bytes:Vec<u8> = session.read_exact(1)?;
	match bytes.first() {
		Some(b) => Ok(*b),
		None    => Err(ScopeError::Timeout(what)),
	}
}

// Accumulates exactly n bytes across however many partial reads the transport
// needs.  A read that makes no progress at all means the instrument stopped
// sending mid-transfer.
fn read_fully<S:Session + ?Sized>(session:&mut S, n:usize, what:&'static str) -> Result<Vec<u8>> {
	let mut buf:Vec<u8> = Vec::with_capacity(n);

	while buf.len() < n {
		let chunk:Vec<u8> = session.read_exact(n - buf.len())?;
		if chunk.is_empty() {
			return Err(ScopeError::Timeout(what));
		}
		buf.extend_from_slice(&chunk);
	}

	Ok(buf)
}

// Issues one query expected to answer with a definite-length binary block and
// returns exactly the declared payload.
//
// If the first reply byte is not `#` the instrument did not send a block
// (older firmware answers some data queries with a plain string); the bytes
// it did send are returned opaquely rather than treated as a hard error.
pub fn read_block<S:Session + ?Sized>(session:&mut S, command:&str) -> Result<Vec<u8>> {

	let stale:Vec<u8> = session.read_available(STALE_DRAIN_MAX)?;
	if !stale.is_empty() {
		debug!("discarded {} stale byte(s) before {:?}", stale.len(), command);
	}

	let payload:Vec<u8> = {
		let mut sess = TermGuard::new(&mut *session);

		sess.write_line(command)?;

		let first:u8 = one_byte(&mut *sess, "waiting for the block marker")?;
		if first != BLOCK_MARKER {
			warn!("reply to {:?} is not a binary block, returning it verbatim", command);
			let mut fallback:Vec<u8> = vec![first];
			fallback.extend(sess.read_available(FALLBACK_READ_MAX)?);
			return Ok(fallback);
		}

		let digit_count_byte:u8 = one_byte(&mut *sess, "reading the block digit count")?;
		if !digit_count_byte.is_ascii_digit() {
			return Err(ScopeError::Framing(format!("digit count byte {:#04x} is not an ASCII digit", digit_count_byte)));
		}

		let digit_count:usize = (digit_count_byte - b'0') as usize;
		if digit_count == 0 {
			return Err(ScopeError::Framing("indefinite-length block (#0) is not supported".to_string()));
		}

		let length_field:Vec<u8> = read_fully(&mut *sess, digit_count, "reading the block length field")?;
		if let Some(b) = length_field.iter().find(|b| !b.is_ascii_digit()) {
			return Err(ScopeError::Framing(format!("length field byte {:#04x} is not an ASCII digit", b)));
		}

		let length:usize = std::str::from_utf8(&length_field)
			.ok().and_then(|s| s.parse::<usize>().ok())
			.ok_or_else(|| ScopeError::Framing(format!("length field {:?} does not fit a usize", length_field)))?;

		debug!("reading {} payload byte(s) for {:?}", length, command);
		read_fully(&mut *sess, length, "reading the block payload")?
	};
	// TermGuard dropped above: terminator recognition is back to its prior
	// state before the trailing drain

	let tail:Vec<u8> = session.read_available(MAX_TRAILING_BYTES)?;
	for b in &tail {
		if *b != b'\n' && *b != b'\r' {
			warn!("discarded stray byte {:#04x} after block reply to {:?}", b, command);
		}
	}

	Ok(payload)
}
