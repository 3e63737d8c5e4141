
extern crate dsoxctl;

use dsoxctl::devices::dsox1000::DSOX1000;
use dsoxctl::session::LoopbackSession;

const IDN:&[u8] = b"KEYSIGHT TECHNOLOGIES,DSOX1204G,CN00012345,02.12.2021060700\n";
const PREAMBLE:&[u8] = b"BYTE,0,1000,1,1e-6,0,0,0.04,0,128\n";

fn block_reply(payload:&[u8]) -> Vec<u8> {
	let len:String = payload.len().to_string();
	let mut reply:Vec<u8> = vec![b'#'];
	reply.push(b'0' + len.len() as u8);
	reply.extend_from_slice(len.as_bytes());
	reply.extend_from_slice(payload);
	reply.push(b'\n');
	reply
}

#[test]
fn binary_waveform_transfer_end_to_end() {
	let mut sess = LoopbackSession::new();
	sess.push_reply(IDN);
	let mut scope = DSOX1000::new(sess).unwrap();

	let raw:Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
	scope.session_mut().push_reply(PREAMBLE);
	scope.session_mut().push_reply(&block_reply(&raw));

	let wf = scope.read_waveform(1).unwrap();

	assert_eq!(wf.source, "CHAN1");
	assert_eq!(wf.time_s.len(), 1000);
	assert_eq!(wf.voltage_v.len(), 1000);
	assert_eq!(wf.preamble.points, 1000);

	// raw code equal to y_reference decodes to y_origin
	assert_eq!(wf.voltage_v[128], 0.0);
	assert!((wf.voltage_v[0] + 5.12).abs() < 1e-12);
	assert!((wf.time_s[10] - 1e-5).abs() < 1e-15);

	// the session is fully drained and back in its normal read mode
	assert_eq!(scope.session_mut().pending(), 0);
	assert!(dsoxctl::session::Session::term_enabled(scope.session_mut()));

	let written:&Vec<String> = &scope.session_mut().written;
	assert_eq!(written[0], "*IDN?");
	assert_eq!(written[1], ":WAV:SOUR CHAN1");
	assert_eq!(written[2], ":WAV:FORM BYTE");
	assert_eq!(written[3], ":WAV:PRE?");
	assert_eq!(written[4], ":WAV:DATA?");
}

#[test]
fn fragmented_waveform_transfer_matches_whole_delivery() {
	let raw:Vec<u8> = (0..500u32).map(|i| (255 - (i % 256)) as u8).collect();

	let mut voltages:Vec<Vec<f64>> = vec![];
	for chunk in &[7usize, std::usize::MAX] {
		let mut sess = LoopbackSession::with_chunk(*chunk);
		sess.push_reply(IDN);
		let mut scope = DSOX1000::new(sess).unwrap();

		scope.session_mut().push_reply(PREAMBLE);
		scope.session_mut().push_reply(&block_reply(&raw));

		voltages.push(scope.read_waveform(1).unwrap().voltage_v);
	}

	assert_eq!(voltages[0].len(), 500);
	assert_eq!(voltages[0], voltages[1]);
}

#[test]
fn screenshot_payload_with_embedded_newlines_survives() {
	let mut sess = LoopbackSession::new();
	sess.push_reply(IDN);
	let mut scope = DSOX1000::new(sess).unwrap();

	// a realistic PNG prefix, full of bytes that look like terminators
	let mut png:Vec<u8> = b"\x89PNG\r\n\x1a\n".to_vec();
	png.extend_from_slice(&[0x00, 0x0A, 0x0D, 0x0A, 0xFF, 0x42]);
	scope.session_mut().push_reply(&block_reply(&png));

	let got:Vec<u8> = scope.screenshot_png().unwrap();
	assert_eq!(got, png);
	assert_eq!(scope.session_mut().pending(), 0);
}

#[test]
fn ascii_transfer_applies_scaling_to_integer_codes() {
	let mut sess = LoopbackSession::new();
	sess.push_reply(IDN);
	let mut scope = DSOX1000::new(sess).unwrap();

	let text:String = (0..100u32).map(|i| (i % 256).to_string()).collect::<Vec<String>>().join(",");
	scope.session_mut().push_reply(PREAMBLE);
	scope.session_mut().push_reply(&block_reply(text.as_bytes()));

	let wf = scope.read_waveform_ascii(1).unwrap();

	assert_eq!(wf.voltage_v.len(), 100);
	// integer codes with non-trivial preamble scaling get rescaled
	assert!((wf.voltage_v[0] + 5.12).abs() < 1e-12);
	assert_eq!(wf.voltage_v[28], (28.0 - 128.0) * 0.04);
}

#[test]
fn ascii_transfer_leaves_physical_values_alone() {
	let mut sess = LoopbackSession::new();
	sess.push_reply(IDN);
	let mut scope = DSOX1000::new(sess).unwrap();

	let text:String = (0..100u32).map(|i| format!("{}", 0.0125 * (i as f64) + 0.0003)).collect::<Vec<String>>().join(",");
	scope.session_mut().push_reply(PREAMBLE);
	scope.session_mut().push_reply(&block_reply(text.as_bytes()));

	let wf = scope.read_waveform_ascii(1).unwrap();

	assert_eq!(wf.voltage_v.len(), 100);
	assert!((wf.voltage_v[0] - 0.0003).abs() < 1e-12);
	assert!((wf.voltage_v[99] - (0.0125 * 99.0 + 0.0003)).abs() < 1e-12);
}

#[test]
fn back_to_back_transfers_stay_in_sync() {
	let mut sess = LoopbackSession::new();
	sess.push_reply(IDN);
	let mut scope = DSOX1000::new(sess).unwrap();

	for fill in &[0x10u8, 0x20u8] {
		let raw:Vec<u8> = vec![*fill; 256];
		scope.session_mut().push_reply(PREAMBLE);
		scope.session_mut().push_reply(&block_reply(&raw));
	}

	let first = scope.read_waveform(1).unwrap();
	let second = scope.read_waveform(2).unwrap();

	assert_eq!(first.voltage_v[0], (0x10 as f64 - 128.0) * 0.04);
	assert_eq!(second.voltage_v[0], (0x20 as f64 - 128.0) * 0.04);
	assert_eq!(second.source, "CHAN2");
	assert_eq!(scope.session_mut().pending(), 0);
}
