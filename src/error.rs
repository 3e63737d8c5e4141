
use std::io;

use thiserror::Error;

// The three protocol-level variants are deliberately distinct: a timed-out
// query can be retried as-is, but after a framing error the byte stream is no
// longer aligned and the caller should clear the device before trying again.
#[derive(Debug, Error)]
pub enum ScopeError {

	#[error("malformed block header: {0}")]
	Framing(String),

	#[error("timed out while {0}")]
	Timeout(&'static str),

	#[error("unexpected response shape: {0}")]
	Shape(String),

	#[error("unable to parse instrument reply: {0}")]
	Parse(String),

	#[error("channel {0} out of range, this scope has channels 1 through 4")]
	Channel(u8),

	#[error("value {value} out of range for {what} (allowed {min} to {max})")]
	Range { what:&'static str, value:f64, min:f64, max:f64 },

	#[error("device error: {0}")]
	Device(String),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Csv(#[from] csv::Error),

}

pub type Result<T> = std::result::Result<T, ScopeError>;
