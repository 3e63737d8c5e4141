
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

use crate::error::{Result, ScopeError};
use crate::session::TcpSession;

fn default_timeout_ms() -> u64 { 10_000 }

// Connection settings for a scope session.  Endpoints are an ordered list of
// candidates tried in sequence until one accepts, so preferring one interface
// over another is a configuration concern rather than a hard-coded constant.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
	pub endpoints: Vec<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

impl SessionConfig {

	pub fn single(addr:&str) -> Self {
		Self{ endpoints: vec![addr.to_string()], timeout_ms: default_timeout_ms() }
	}

	pub fn from_json(text:&str) -> Result<Self> {
		serde_json::from_str(text).map_err(|e| ScopeError::Parse(format!("bad session config: {}", e)))
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	pub fn connect(&self) -> Result<TcpSession> {
		let mut last_err:Option<ScopeError> = None;

		for endpoint in &self.endpoints {
			match TcpSession::connect(endpoint, self.timeout()) {
				Ok(session) => {
					debug!("connected to {}", endpoint);
					return Ok(session);
				},
				Err(e) => {
					warn!("endpoint {} failed: {}", endpoint, e);
					last_err = Some(e);
				},
			}
		}

		Err(last_err.unwrap_or_else(|| ScopeError::Device("no endpoints configured".to_string())))
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn json_config_round_trips() {
		let cfg = SessionConfig::from_json(r#"{"endpoints": ["10.0.0.7:5025", "10.0.0.8:5025"], "timeout_ms": 2500}"#).unwrap();

		assert_eq!(cfg.endpoints.len(), 2);
		assert_eq!(cfg.endpoints[0], "10.0.0.7:5025");
		assert_eq!(cfg.timeout(), Duration::from_millis(2500));
	}

	#[test]
	fn timeout_defaults_when_omitted() {
		let cfg = SessionConfig::from_json(r#"{"endpoints": ["10.0.0.7:5025"]}"#).unwrap();

		assert_eq!(cfg.timeout(), Duration::from_millis(10_000));
	}

	#[test]
	fn empty_endpoint_list_is_an_error() {
		match (SessionConfig{ endpoints: vec![], timeout_ms: 100 }).connect() {
			Err(ScopeError::Device(_)) => {},
			other => panic!("expected a device error, got {:?}", other.map(|_| ())),
		}
	}

}
