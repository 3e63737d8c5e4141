
// Framing for IEEE-488.2 definite-length binary blocks, the one stateful part of the protocol
pub mod block;

// Connection settings, including the ordered list of endpoints to try
pub mod config;

// Byte-oriented instrument sessions: the Session trait plus TCP and loopback implementations
pub mod session;

// Conversion of raw sample codes into physical time/voltage values using the instrument's preamble
pub mod waveform;

// Parsing and formatting of operator-entered values like "10ms" or "500mV"
pub mod units;

// Module for devices controlled through these sessions
pub mod devices;

// Shared error type for sessions, framing, and decoding
pub mod error;

pub use error::{Result, ScopeError};
