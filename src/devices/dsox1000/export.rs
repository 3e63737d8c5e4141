
use std::path::Path;

use log::{debug, warn};

use crate::block::read_block;
use crate::error::{Result, ScopeError};
use crate::session::Session;
use crate::waveform::{self, DecodedWaveform, Preamble, WordOrder};

use super::{chan_ok, DSOX1000, CHANNEL_COUNT};

impl<S:Session> DSOX1000<S> {

	// Grabs the front panel image as PNG bytes.  The payload is opaque here;
	// writing it to disk is the caller's business.
	pub fn screenshot_png(&mut self) -> Result<Vec<u8>> {
		let payload:Vec<u8> = read_block(self.session_mut(), ":DISP:DATA? PNG")?;
		debug!("screenshot payload of {} byte(s)", payload.len());
		Ok(payload)
	}

	fn select_source(&mut self, chan_num:u8) -> Result<()> {
		chan_ok(chan_num)?;
		self.write(&format!(":WAV:SOUR CHAN{}", chan_num))
	}

	fn query_preamble(&mut self) -> Result<Preamble> {
		let reply:String = self.query(":WAV:PRE?")?;
		Preamble::parse(&reply)
	}

	// One full binary transfer: select the source, ask for BYTE format, grab
	// a fresh preamble, then pull the sample block and scale it
	pub fn read_waveform(&mut self, chan_num:u8) -> Result<DecodedWaveform> {
		self.select_source(chan_num)?;
		self.write(":WAV:FORM BYTE")?;

		let pre:Preamble = self.query_preamble()?;
		let raw:Vec<u8> = read_block(self.session_mut(), ":WAV:DATA?")?;
		let (time_s, voltage_v) = waveform::decode(&raw, &pre);

		Ok(DecodedWaveform{ source: format!("CHAN{}", chan_num), preamble: pre, time_s, voltage_v })
	}

	// WORD-format variant, two bytes per sample in the order the scope
	// reports via :WAV:BYT?
	pub fn read_waveform_words(&mut self, chan_num:u8) -> Result<DecodedWaveform> {
		self.select_source(chan_num)?;
		self.write(":WAV:FORM WORD")?;

		let order:WordOrder = WordOrder::from_reply(&self.query(":WAV:BYT?")?)?;
		let pre:Preamble = self.query_preamble()?;
		let raw:Vec<u8> = read_block(self.session_mut(), ":WAV:DATA?")?;
		let (time_s, voltage_v) = waveform::decode_words(&raw, &pre, order)?;

		Ok(DecodedWaveform{ source: format!("CHAN{}", chan_num), preamble: pre, time_s, voltage_v })
	}

	// Legacy ASCII transfer: comma-separated decimal values, which may be
	// either bare sample codes or already-physical volts depending on the
	// firmware.  need_scale makes that call.
	pub fn read_waveform_ascii(&mut self, chan_num:u8) -> Result<DecodedWaveform> {
		self.select_source(chan_num)?;
		self.write(":WAV:FORM ASC")?;

		let pre:Preamble = self.query_preamble()?;
		let raw:Vec<u8> = read_block(self.session_mut(), ":WAV:DATA?")?;
		let text = String::from_utf8_lossy(&raw);

		let mut values:Vec<f64> = vec![];
		for piece in text.trim().split(',') {
			let piece:&str = piece.trim();
			if piece.is_empty() {
				continue;
			}
			match piece.parse::<f64>() {
				Ok(v)  => values.push(v),
				Err(_) => break,
			}
		}

		if waveform::need_scale(&values, &pre) {
			values = waveform::scale_values(&values, &pre);
		}

		let time_s:Vec<f64> = waveform::time_vector(values.len(), &pre);
		Ok(DecodedWaveform{ source: format!("CHAN{}", chan_num), preamble: pre, time_s, voltage_v: values })
	}

	// Reads every channel it can and writes one CSV with per-channel metadata
	// rows, a header, then time plus one voltage column per channel.  Columns
	// shorter than the time vector are left blank.  Returns the sources that
	// were actually captured.
	pub fn export_all_channels_csv<P:AsRef<Path>>(&mut self, path:P) -> Result<Vec<String>> {
		let mut captures:Vec<DecodedWaveform> = vec![];

		for n in 1..=CHANNEL_COUNT {
			match self.read_waveform(n) {
				Ok(wf) => captures.push(wf),
				Err(e) => warn!("skipping CHAN{}: {}", n, e),
			}
		}

		if captures.is_empty() {
			return Err(ScopeError::Device("no channel data could be read".to_string()));
		}

		// The time column comes from the longest capture
		let rows:usize = captures.iter().map(|w| w.time_s.len()).max().unwrap();
		let time_s:&Vec<f64> = &captures.iter().find(|w| w.time_s.len() == rows).unwrap().time_s;

		let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;

		let ok_names:Vec<String> = captures.iter().map(|w| w.source.clone()).collect();
		wtr.write_record(&["# channels_ok".to_string(), ok_names.join(",")])?;

		for wf in &captures {
			wtr.write_record(&[format!("# {}_points", wf.source), wf.preamble.points.to_string()])?;
			wtr.write_record(&[format!("# {}_xincr_s", wf.source), format!("{}", wf.preamble.x_increment)])?;
			wtr.write_record(&[format!("# {}_xorig_s", wf.source), format!("{}", wf.preamble.x_origin)])?;
			wtr.write_record(&[format!("# {}_yincr_V", wf.source), format!("{}", wf.preamble.y_increment)])?;
			wtr.write_record(&[format!("# {}_yorig_V", wf.source), format!("{}", wf.preamble.y_origin)])?;
		}

		let mut header:Vec<String> = vec!["time_s".to_string()];
		for n in 1..=CHANNEL_COUNT {
			header.push(format!("CHAN{}_V", n));
		}
		wtr.write_record(&header)?;

		for i in 0..rows {
			let mut row:Vec<String> = Vec::with_capacity(1 + CHANNEL_COUNT as usize);
			row.push(format!("{}", time_s[i]));

			for n in 1..=CHANNEL_COUNT {
				let name:String = format!("CHAN{}", n);
				let cell:String = match captures.iter().find(|w| w.source == name) {
					Some(wf) if i < wf.voltage_v.len() => format!("{}", wf.voltage_v[i]),
					_ => String::new(),
				};
				row.push(cell);
			}

			wtr.write_record(&row)?;
		}

		wtr.flush()?;
		Ok(ok_names)
	}

}
