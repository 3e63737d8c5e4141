
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::str;
use std::time::{Duration, Instant};

use crate::error::{Result, ScopeError};

// How long a best-effort drain waits for bytes that may not exist
const DRAIN_POLL:Duration = Duration::from_millis(25);

// A byte-oriented, half-duplex instrument session.  All exchanges are strictly
// request/response; exclusive access for the duration of an exchange is
// enforced by the &mut receiver.
//
// read_exact returns fewer bytes than requested only when the timeout expires
// first, and an empty result means nothing arrived at all.  read_available
// never waits longer than a short poll and is meant for draining leftovers.
//
// The terminator-recognition flag exists for transports where line handling
// happens below this interface (USBTMC termchar detection and the like);
// binary block reads disable it so a 0x0A payload byte can't truncate the
// transfer, and restore it afterwards.
pub trait Session {

	fn write_line(&mut self, cmd:&str) -> Result<()>;

	fn read_exact(&mut self, n:usize) -> Result<Vec<u8>>;

	fn read_available(&mut self, max:usize) -> Result<Vec<u8>>;

	fn read_line(&mut self) -> Result<String>;

	fn term_enabled(&self) -> bool;

	fn set_term_enabled(&mut self, enabled:bool);

	fn query(&mut self, cmd:&str) -> Result<String> {
		self.write_line(cmd)?;
		self.read_line()
	}

}

// SCPI-over-TCP session (port 5025 raw socket on most bench instruments)
pub struct TcpSession {
	stream: TcpStream,
	timeout: Duration,
	term_enabled: bool,
}

fn is_timeout(e:&io::Error) -> bool {
	e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
}

impl TcpSession {

	pub fn connect(addr:&str, timeout:Duration) -> Result<Self> {
		let resolved:Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
		let first:&SocketAddr = resolved.first()
			.ok_or_else(|| ScopeError::Parse(format!("address {:?} did not resolve", addr)))?;

		let stream = TcpStream::connect_timeout(first, timeout)?;
		stream.set_read_timeout(Some(timeout))?;
		stream.set_nodelay(true)?;

		Ok(Self{ stream, timeout, term_enabled: true })
	}

	pub fn timeout(&self) -> Duration { self.timeout }

}

impl Session for TcpSession {

	fn write_line(&mut self, cmd:&str) -> Result<()> {
		self.stream.write_all(cmd.as_bytes())?;
		self.stream.write_all(b"\n")?;
		self.stream.flush()?;
		Ok(())
	}

	fn read_exact(&mut self, n:usize) -> Result<Vec<u8>> {
		let mut buf:Vec<u8> = vec![0u8; n];
		let mut got:usize = 0;

		while got < n {
			match self.stream.read(&mut buf[got..]) {
				Ok(0)  => break,
				Ok(k)  => got += k,
				Err(ref e) if is_timeout(e) => break,
				Err(e) => return Err(e.into()),
			}
		}

		buf.truncate(got);
		Ok(buf)
	}

	fn read_available(&mut self, max:usize) -> Result<Vec<u8>> {
		let mut buf:Vec<u8> = vec![0u8; max];

		self.stream.set_read_timeout(Some(DRAIN_POLL))?;
		let res = self.stream.read(&mut buf);
		self.stream.set_read_timeout(Some(self.timeout))?;

		match res {
			Ok(k)  => { buf.truncate(k); Ok(buf) },
			Err(ref e) if is_timeout(e) => Ok(vec![]),
			Err(e) => Err(e.into()),
		}
	}

	fn read_line(&mut self) -> Result<String> {
		let mut line:Vec<u8> = vec![];
		let deadline:Instant = Instant::now() + self.timeout;

		loop {
			let b:Vec<u8> = Session::read_exact(self, 1)?;
			match b.first() {
				Some(&b'\n') => break,
				Some(&x)     => line.push(x),
				None         => return Err(ScopeError::Timeout("reading a reply line")),
			}
			if Instant::now() > deadline {
				return Err(ScopeError::Timeout("reading a reply line"));
			}
		}

		if line.last() == Some(&b'\r') { line.pop(); }

		str::from_utf8(&line)
			.map(|s| s.to_owned())
			.map_err(|_| ScopeError::Parse("reply line is not UTF-8".to_string()))
	}

	fn term_enabled(&self) -> bool { self.term_enabled }

	fn set_term_enabled(&mut self, enabled:bool) { self.term_enabled = enabled; }

}

// In-memory session double for driver tests.  Scripted replies are released
// into the readable stream one per query written, mirroring a real instrument
// that only answers commands ending in `?`.  The chunk size caps how many
// bytes a single read returns, which simulates a transport fragmenting a
// transfer.
pub struct LoopbackSession {
	pending: VecDeque<u8>,
	scripted: VecDeque<Vec<u8>>,
	pub written: Vec<String>,
	chunk: usize,
	term_enabled: bool,
}

impl LoopbackSession {

	pub fn new() -> Self {
		Self{
			pending: VecDeque::new(),
			scripted: VecDeque::new(),
			written: vec![],
			chunk: std::usize::MAX,
			term_enabled: true,
		}
	}

	pub fn with_chunk(chunk:usize) -> Self {
		Self{ chunk, ..Self::new() }
	}

	// Queues the reply to the next query
	pub fn push_reply(&mut self, bytes:&[u8]) {
		self.scripted.push_back(bytes.to_vec());
	}

	// Makes bytes readable immediately, as leftovers from a prior exchange
	// would be
	pub fn push_pending(&mut self, bytes:&[u8]) {
		self.pending.extend(bytes.iter().copied());
	}

	pub fn pending(&self) -> usize { self.pending.len() }

	fn take(&mut self, n:usize) -> Vec<u8> {
		let take:usize = n.min(self.chunk).min(self.pending.len());
		self.pending.drain(..take).collect()
	}

}

impl Session for LoopbackSession {

	fn write_line(&mut self, cmd:&str) -> Result<()> {
		self.written.push(cmd.to_string());
		if cmd.contains('?') {
			if let Some(reply) = self.scripted.pop_front() {
				self.pending.extend(reply);
			}
		}
		Ok(())
	}

	fn read_exact(&mut self, n:usize) -> Result<Vec<u8>> {
		Ok(self.take(n))
	}

	fn read_available(&mut self, max:usize) -> Result<Vec<u8>> {
		Ok(self.take(max))
	}

	fn read_line(&mut self) -> Result<String> {
		match self.pending.iter().position(|b| *b == b'\n') {
			Some(pos) => {
				let mut line:Vec<u8> = self.pending.drain(..=pos).collect();
				line.pop();
				if line.last() == Some(&b'\r') { line.pop(); }
				String::from_utf8(line).map_err(|_| ScopeError::Parse("reply line is not UTF-8".to_string()))
			},
			None => Err(ScopeError::Timeout("reading a reply line")),
		}
	}

	fn term_enabled(&self) -> bool { self.term_enabled }

	fn set_term_enabled(&mut self, enabled:bool) { self.term_enabled = enabled; }

}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn loopback_serves_pending_bytes_in_chunks() {
		let mut sess = LoopbackSession::with_chunk(3);
		sess.push_pending(b"abcdefgh");

		assert_eq!(sess.read_exact(8).unwrap(), b"abc");
		assert_eq!(sess.read_exact(8).unwrap(), b"def");
		assert_eq!(sess.read_exact(8).unwrap(), b"gh");
		assert_eq!(sess.read_exact(8).unwrap(), b"");
	}

	#[test]
	fn loopback_releases_one_scripted_reply_per_query() {
		let mut sess = LoopbackSession::new();
		sess.push_reply(b"first\n");
		sess.push_reply(b"second\n");

		// set-commands never release a reply
		sess.write_line(":TIM:MODE MAIN").unwrap();
		assert_eq!(sess.pending(), 0);

		assert_eq!(sess.query(":TIM:SCAL?").unwrap(), "first");
		assert_eq!(sess.query(":TIM:POS?").unwrap(), "second");
	}

	#[test]
	fn loopback_query_records_command_and_strips_terminator() {
		let mut sess = LoopbackSession::new();
		sess.push_reply(b"KEYSIGHT TECHNOLOGIES,DSOX1204G,CN0001,02.11\r\n");

		let idn:String = sess.query("*IDN?").unwrap();
		assert_eq!(idn, "KEYSIGHT TECHNOLOGIES,DSOX1204G,CN0001,02.11");
		assert_eq!(sess.written, vec!["*IDN?".to_string()]);
		assert_eq!(sess.pending(), 0);
	}

	#[test]
	fn loopback_read_line_without_terminator_is_a_timeout() {
		let mut sess = LoopbackSession::new();
		sess.push_pending(b"partial reply");

		match sess.read_line() {
			Err(ScopeError::Timeout(_)) => {},
			other => panic!("expected timeout, got {:?}", other.map(|_| ())),
		}
	}

}
