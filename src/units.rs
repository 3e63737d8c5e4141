
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, ScopeError};

lazy_static! {
	static ref TIME_RE: Regex = Regex::new("^([+-]?\\d+(?:\\.\\d+)?)(fs|ps|ns|us|ms|s)$").unwrap();
	static ref VOLT_RE: Regex = Regex::new("^([+-]?\\d+(?:\\.\\d+)?)(v|mv|uv)$").unwrap();
}

// Accepts either a bare number of seconds or a suffixed value like "10ms"
pub fn parse_time_s(txt:&str) -> Result<f64> {
	let s:String = txt.trim().to_lowercase().replace(' ', "").replace('µ', "u");

	if let Ok(x) = s.parse::<f64>() {
		return Ok(x);
	}

	let caps = TIME_RE.captures(&s).ok_or_else(|| ScopeError::Parse(format!("invalid time: {:?}", txt)))?;
	let val:f64 = caps.get(1).unwrap().as_str().parse::<f64>().unwrap();
	let scale:f64 = match caps.get(2).unwrap().as_str() {
		"s"  => 1.0,
		"ms" => 1e-3,
		"us" => 1e-6,
		"ns" => 1e-9,
		"ps" => 1e-12,
		"fs" => 1e-15,
		_    => unreachable!(),
	};

	Ok(val * scale)
}

// Accepts either a bare number of volts or a suffixed value like "500mV"
pub fn parse_volt_v(txt:&str) -> Result<f64> {
	let s:String = txt.trim().to_lowercase().replace(' ', "").replace('µ', "u");

	if let Ok(x) = s.parse::<f64>() {
		return Ok(x);
	}

	let caps = VOLT_RE.captures(&s).ok_or_else(|| ScopeError::Parse(format!("invalid voltage: {:?}", txt)))?;
	let val:f64 = caps.get(1).unwrap().as_str().parse::<f64>().unwrap();
	let scale:f64 = match caps.get(2).unwrap().as_str() {
		"v"  => 1.0,
		"mv" => 1e-3,
		"uv" => 1e-6,
		_    => unreachable!(),
	};

	Ok(val * scale)
}

pub fn fmt_s(x:f64) -> String {
	if x >= 1.0 {
		return format!("{} s", x);
	}
	for (unit, scale) in &[("ms", 1e-3), ("us", 1e-6), ("ns", 1e-9)] {
		if x >= *scale {
			return format!("{} {}", x / scale, unit);
		}
	}
	format!("{} s", x)
}

pub fn fmt_v(x:f64) -> String {
	for (unit, scale) in &[("V", 1.0), ("mV", 1e-3), ("uV", 1e-6)] {
		if x.abs() >= *scale {
			return format!("{} {}", x / scale, unit);
		}
	}
	format!("{} V", x)
}

pub fn fmt_hz(x:f64) -> String {
	for (unit, scale) in &[("Hz", 1.0), ("kHz", 1e3), ("MHz", 1e6), ("GHz", 1e9)] {
		if x.abs() < scale * 1000.0 || *unit == "GHz" {
			return format!("{} {}", x / scale, unit);
		}
	}
	format!("{} Hz", x)
}

pub fn fmt_pct(x:f64) -> String {
	format!("{} %", x)
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn parses_suffixed_times() {
		assert_eq!(parse_time_s("10ms").unwrap(), 0.01);
		assert_eq!(parse_time_s("1.5us").unwrap(), 1.5e-6);
		assert_eq!(parse_time_s("-2ms").unwrap(), -0.002);
		assert_eq!(parse_time_s("100ns").unwrap(), 1e-7);
		assert_eq!(parse_time_s(" 3 s ").unwrap(), 3.0);
	}

	#[test]
	fn parses_bare_seconds() {
		assert_eq!(parse_time_s("0.25").unwrap(), 0.25);
		assert_eq!(parse_time_s("1e-3").unwrap(), 0.001);
	}

	#[test]
	fn rejects_garbage_time() {
		assert!(parse_time_s("ten ms").is_err());
		assert!(parse_time_s("10 parsecs").is_err());
	}

	#[test]
	fn parses_suffixed_voltages() {
		assert_eq!(parse_volt_v("500mV").unwrap(), 0.5);
		assert_eq!(parse_volt_v("2V").unwrap(), 2.0);
		assert!(parse_volt_v("µV").is_err());
		assert_eq!(parse_volt_v("250uV").unwrap(), 2.5e-4);
	}

	#[test]
	fn formats_round_trip_readably() {
		assert_eq!(fmt_s(0.01), "10 ms");
		assert_eq!(fmt_s(2.0), "2 s");
		assert_eq!(fmt_v(0.5), "500 mV");
		assert_eq!(fmt_v(1.0), "1 V");
		assert_eq!(fmt_hz(1.5e6), "1.5 MHz");
		assert_eq!(fmt_pct(42.0), "42 %");
	}

}
