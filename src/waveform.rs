
use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use serde::{Serialize, Deserialize};

use crate::error::{Result, ScopeError};

// Scaling coefficients reported by :WAV:PRE?.  Queried fresh before every
// transfer and immutable for its duration.  The reply carries at least ten
// comma-separated fields; only the format/type tokens, the point count, and
// the six scaling coefficients matter here, anything after field ten is
// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
	pub format: String,
	pub acq_type: String,
	pub points: usize,
	pub x_increment: f64,
	pub x_origin: f64,
	pub x_reference: f64,
	pub y_increment: f64,
	pub y_origin: f64,
	pub y_reference: f64,
}

impl Preamble {

	pub fn parse(reply:&str) -> Result<Self> {
		let fields:Vec<&str> = reply.trim().split(',').map(|f| f.trim()).collect();

		if fields.len() < 10 {
			return Err(ScopeError::Shape(format!("preamble has {} field(s), expected at least 10", fields.len())));
		}

		let num = |idx:usize| -> Result<f64> {
			fields[idx].parse::<f64>()
				.map_err(|_| ScopeError::Parse(format!("preamble field {} ({:?}) is not numeric", idx, fields[idx])))
		};

		Ok(Self{
			format:      fields[0].to_string(),
			acq_type:    fields[1].to_string(),
			points:      num(2)? as usize,
			x_increment: num(4)?,
			x_origin:    num(5)?,
			x_reference: num(6)?,
			y_increment: num(7)?,
			y_origin:    num(8)?,
			y_reference: num(9)?,
		})
	}

}

// One decoded transfer: parallel time/voltage vectors of equal length, plus
// the preamble they were scaled with
#[derive(Debug, Clone, Serialize)]
pub struct DecodedWaveform {
	pub source: String,
	pub preamble: Preamble,
	pub time_s: Vec<f64>,
	pub voltage_v: Vec<f64>,
}

pub fn time_vector(len:usize, pre:&Preamble) -> Vec<f64> {
	(0..len).map(|i| (i as f64 - pre.x_reference) * pre.x_increment + pre.x_origin).collect()
}

// Converts raw BYTE-format sample codes to physical units:
//
//   voltage_v[i] = (raw[i] - y_reference) * y_increment + y_origin
//   time_s[i]    = (i - x_reference) * x_increment + x_origin
//
// Pure elementwise transform: no I/O, deterministic, and the outputs always
// match the input length (an empty transfer decodes to two empty vectors).
pub fn decode(raw:&[u8], pre:&Preamble) -> (Vec<f64>, Vec<f64>) {
	let time_s:Vec<f64> = time_vector(raw.len(), pre);
	let voltage_v:Vec<f64> = raw.iter()
		.map(|code| (*code as f64 - pre.y_reference) * pre.y_increment + pre.y_origin)
		.collect();

	(time_s, voltage_v)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WordOrder { Lsbf, Msbf }

impl WordOrder {

	// :WAV:BYT? answers LSBF or MSBF
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"LSBF" => Ok(WordOrder::Lsbf),
			"MSBF" => Ok(WordOrder::Msbf),
			other  => Err(ScopeError::Parse(format!("unrecognized byte order {:?}", other))),
		}
	}

}

// WORD-format variant of decode: two bytes per sample in the order reported
// by :WAV:BYT?
pub fn decode_words(raw:&[u8], pre:&Preamble, order:WordOrder) -> Result<(Vec<f64>, Vec<f64>)> {
	if raw.len() % 2 != 0 {
		return Err(ScopeError::Shape(format!("WORD payload length {} is odd", raw.len())));
	}

	let count:usize = raw.len() / 2;
	let mut rdr = Cursor::new(raw);
	let mut voltage_v:Vec<f64> = Vec::with_capacity(count);

	for _ in 0..count {
		let code:u16 = match order {
			WordOrder::Lsbf => rdr.read_u16::<LittleEndian>()?,
			WordOrder::Msbf => rdr.read_u16::<BigEndian>()?,
		};
		voltage_v.push((code as f64 - pre.y_reference) * pre.y_increment + pre.y_origin);
	}

	Ok((time_vector(count, pre), voltage_v))
}

// Best-effort test for whether ASCII-transferred values still need the
// preamble scaling applied.  Some firmware sends already-physical volts over
// the ASCII path, some sends bare sample codes; codes look like integers, so
// scaling is applied only when most of the first hundred values sit within
// 1e-6 of an integer AND the preamble scaling is non-trivial.
//
// This is inference, not protocol: a genuine waveform of near-integer volt
// readings would be misclassified as raw codes.  Kept as-is for
// compatibility with observed instrument behavior.
pub fn need_scale(values:&[f64], pre:&Preamble) -> bool {
	if values.is_empty() {
		return false;
	}

	let ints_like:usize = values.iter().take(100).filter(|v| (**v - v.round()).abs() < 1e-6).count();
	let nontrivial_scaling:bool = (pre.y_increment - 1.0).abs() > 1e-9
		|| pre.y_origin.abs() > 1e-12
		|| pre.y_reference.abs() > 1e-9;

	ints_like > 80 && nontrivial_scaling
}

// The same scaling formula as decode, for values that arrived as ASCII text
pub fn scale_values(values:&[f64], pre:&Preamble) -> Vec<f64> {
	values.iter().map(|v| (v - pre.y_reference) * pre.y_increment + pre.y_origin).collect()
}

#[cfg(test)]
mod tests {

	use super::*;

	fn byte_preamble() -> Preamble {
		Preamble::parse("BYTE,0,1000,1,1e-6,0,0,0.04,0,128").unwrap()
	}

	#[test]
	fn parses_a_ten_field_preamble() {
		let pre = byte_preamble();

		assert_eq!(pre.format, "BYTE");
		assert_eq!(pre.points, 1000);
		assert_eq!(pre.x_increment, 1e-6);
		assert_eq!(pre.x_reference, 0.0);
		assert_eq!(pre.y_increment, 0.04);
		assert_eq!(pre.y_origin, 0.0);
		assert_eq!(pre.y_reference, 128.0);
	}

	#[test]
	fn fields_past_the_tenth_are_ignored() {
		let pre = Preamble::parse("+4,+0,+62500,+1,+8.0E-09,-2.5E-04,+0,+8.0E-03,+2.56E+00,+128,+1,+2").unwrap();

		assert_eq!(pre.points, 62500);
		assert_eq!(pre.y_reference, 128.0);
	}

	#[test]
	fn short_preamble_is_a_shape_error() {
		match Preamble::parse("BYTE,0,1000,1,1e-6,0,0") {
			Err(ScopeError::Shape(_)) => {},
			other => panic!("expected shape error, got {:?}", other),
		}
	}

	#[test]
	fn non_numeric_scaling_field_is_a_parse_error() {
		match Preamble::parse("BYTE,0,1000,1,abc,0,0,0.04,0,128") {
			Err(ScopeError::Parse(_)) => {},
			other => panic!("expected parse error, got {:?}", other),
		}
	}

	#[test]
	fn decode_applies_the_scaling_formulas() {
		let pre = byte_preamble();
		let (time_s, voltage_v) = decode(&[128, 0, 255], &pre);

		// the code equal to y_reference lands exactly on y_origin
		assert_eq!(voltage_v[0], 0.0);
		assert_eq!(voltage_v[1], (0.0 - 128.0) * 0.04);
		assert!((voltage_v[1] + 5.12).abs() < 1e-12);
		assert!((voltage_v[2] - (255.0 - 128.0) * 0.04).abs() < 1e-12);

		assert_eq!(time_s[0], 0.0);
		assert!((time_s[2] - 2e-6).abs() < 1e-18);
	}

	#[test]
	fn decode_honors_nonzero_references() {
		let pre = Preamble::parse("BYTE,0,4,1,2e-3,-1e-2,5,0.5,1.5,100").unwrap();
		let (time_s, voltage_v) = decode(&[100], &pre);

		assert!((time_s[0] - ((0.0 - 5.0) * 2e-3 + -1e-2)).abs() < 1e-15);
		assert!((voltage_v[0] - 1.5).abs() < 1e-15);
	}

	#[test]
	fn decode_of_empty_input_is_empty_output() {
		let pre = byte_preamble();
		let (time_s, voltage_v) = decode(&[], &pre);

		assert!(time_s.is_empty());
		assert!(voltage_v.is_empty());
	}

	#[test]
	fn decode_is_deterministic() {
		let pre = byte_preamble();
		let raw:Vec<u8> = (0..=255u16).map(|i| i as u8).collect();

		let first = decode(&raw, &pre);
		let second = decode(&raw, &pre);
		assert_eq!(first, second);
	}

	#[test]
	fn decode_words_respects_byte_order() {
		let pre = Preamble::parse("WORD,0,2,1,1e-6,0,0,1,0,0").unwrap();
		let raw:&[u8] = &[0x01, 0x02, 0x03, 0x04];

		let (_, lsbf) = decode_words(raw, &pre, WordOrder::Lsbf).unwrap();
		let (_, msbf) = decode_words(raw, &pre, WordOrder::Msbf).unwrap();

		assert_eq!(lsbf, vec![0x0201 as f64, 0x0403 as f64]);
		assert_eq!(msbf, vec![0x0102 as f64, 0x0304 as f64]);
	}

	#[test]
	fn odd_word_payload_is_a_shape_error() {
		let pre = byte_preamble();
		match decode_words(&[1, 2, 3], &pre, WordOrder::Lsbf) {
			Err(ScopeError::Shape(_)) => {},
			other => panic!("expected shape error, got {:?}", other),
		}
	}

	#[test]
	fn integer_codes_with_real_scaling_need_scale() {
		let pre = byte_preamble();
		let values:Vec<f64> = (0..100).map(|i| (i % 256) as f64).collect();

		assert!(need_scale(&values, &pre));
	}

	#[test]
	fn physical_values_do_not_need_scale() {
		let pre = byte_preamble();
		let values:Vec<f64> = (0..100).map(|i| (i as f64) * 0.0401 + 0.003).collect();

		assert!(!need_scale(&values, &pre));
	}

	#[test]
	fn trivial_scaling_never_needs_scale() {
		let pre = Preamble::parse("ASC,0,100,1,1e-6,0,0,1,0,0").unwrap();
		let values:Vec<f64> = (0..100).map(|i| i as f64).collect();

		assert!(!need_scale(&values, &pre));
	}

	#[test]
	fn too_few_integer_looking_values_do_not_need_scale() {
		let pre = byte_preamble();
		// only 50 values can never clear the >80 bar
		let values:Vec<f64> = (0..50).map(|i| i as f64).collect();

		assert!(!need_scale(&values, &pre));
		assert!(!need_scale(&[], &pre));
	}

	#[test]
	fn scale_values_matches_the_decode_formula() {
		let pre = byte_preamble();
		let scaled:Vec<f64> = scale_values(&[128.0, 0.0], &pre);

		assert_eq!(scaled[0], 0.0);
		assert!((scaled[1] + 5.12).abs() < 1e-12);
	}

}
