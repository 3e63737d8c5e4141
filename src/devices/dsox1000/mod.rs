
use lazy_static::lazy_static;
use regex::{Captures, Match, Regex};
use serde::{Serialize, Deserialize};

use crate::error::{Result, ScopeError};
use crate::session::Session;

lazy_static! {
	static ref IDN_RE: Regex = Regex::new("([^,]+),([^,]+),([^,]+),([^,\\s]+)").unwrap();
}

pub mod export;
pub mod measurement;

pub use measurement::{Measurement, UnitKind, ALL_MEASUREMENTS};

pub const CHANNEL_COUNT:u8 = 4;

pub struct DSOX1000<S:Session> {
	session: S,
	pub state: Option<State>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct State {
	pub manufacturer: String,
	pub model: String,
	pub serial_num: String,
	pub fw_version: String,
	pub timebase: TimebaseState,
	pub trigger: TriggerState,
	// One record per analog channel, indexed by channel number minus one
	pub channels: [ChannelState; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
	pub display: bool,
	pub coupling: Coupling,
	pub bw_limit: bool,
	pub invert: bool,
	pub probe: f64,
	pub scale_v: f64,
	pub offset_v: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimebaseState {
	pub mode: TimebaseMode,
	pub scale_s: f64,
	pub position_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerState {
	pub source: TriggerSource,
	pub slope: Slope,
	// None when the source is LINE, which has no coupling or level
	pub coupling: Option<TriggerCoupling>,
	pub level_v: Option<f64>,
	pub sweep: Sweep,
	pub holdoff_s: f64,
}

// Requested edge-trigger setup, applied with apply_trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTrigger {
	pub source: TriggerSource,
	pub level_v: f64,
	pub slope: Slope,
	pub coupling: TriggerCoupling,
	pub sweep: Sweep,
	pub holdoff_s: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coupling { Ac, Dc }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slope { Positive, Negative }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sweep { Auto, Normal }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerSource { Channel(u8), External, Line }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerCoupling { Dc, Ac, LfReject, HfReject }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimebaseMode { Main, Window }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimebaseReference { Left, Center, Right }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasWindow { Auto, Main, Zoom }

impl Coupling {
	pub fn as_scpi(&self) -> &'static str {
		match self { Coupling::Ac => "AC", Coupling::Dc => "DC" }
	}
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"AC"  => Ok(Coupling::Ac),
			"DC"  => Ok(Coupling::Dc),
			other => Err(ScopeError::Parse(format!("unrecognized coupling {:?}", other))),
		}
	}
}

impl Slope {
	pub fn as_scpi(&self) -> &'static str {
		match self { Slope::Positive => "POS", Slope::Negative => "NEG" }
	}
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"POS"  => Ok(Slope::Positive),
			"NEG"  => Ok(Slope::Negative),
			other  => Err(ScopeError::Parse(format!("unrecognized slope {:?}", other))),
		}
	}
}

impl Sweep {
	pub fn as_scpi(&self) -> &'static str {
		match self { Sweep::Auto => "AUTO", Sweep::Normal => "NORM" }
	}
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"AUTO" => Ok(Sweep::Auto),
			"NORM" => Ok(Sweep::Normal),
			other  => Err(ScopeError::Parse(format!("unrecognized sweep {:?}", other))),
		}
	}
}

impl TriggerSource {
	pub fn as_scpi(&self) -> String {
		match self {
			TriggerSource::Channel(n) => format!("CHAN{}", n),
			TriggerSource::External   => "EXT".to_string(),
			TriggerSource::Line       => "LINE".to_string(),
		}
	}
	pub fn from_reply(reply:&str) -> Result<Self> {
		let r:&str = reply.trim();
		if let Some(rest) = r.strip_prefix("CHAN") {
			let n:u8 = rest.parse().map_err(|_| ScopeError::Parse(format!("unrecognized trigger source {:?}", r)))?;
			chan_ok(n)?;
			return Ok(TriggerSource::Channel(n));
		}
		match r {
			"EXT"  => Ok(TriggerSource::External),
			"LINE" => Ok(TriggerSource::Line),
			other  => Err(ScopeError::Parse(format!("unrecognized trigger source {:?}", other))),
		}
	}
}

impl TriggerCoupling {
	pub fn as_scpi(&self) -> &'static str {
		match self {
			TriggerCoupling::Dc       => "DC",
			TriggerCoupling::Ac       => "AC",
			TriggerCoupling::LfReject => "LFReject",
			TriggerCoupling::HfReject => "HFReject",
		}
	}
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"DC"   => Ok(TriggerCoupling::Dc),
			"AC"   => Ok(TriggerCoupling::Ac),
			"LFR"  | "LFReject" => Ok(TriggerCoupling::LfReject),
			"HFR"  | "HFReject" => Ok(TriggerCoupling::HfReject),
			other  => Err(ScopeError::Parse(format!("unrecognized trigger coupling {:?}", other))),
		}
	}
}

impl TimebaseMode {
	pub fn from_reply(reply:&str) -> Result<Self> {
		match reply.trim() {
			"MAIN" => Ok(TimebaseMode::Main),
			"WIND" => Ok(TimebaseMode::Window),
			other  => Err(ScopeError::Parse(format!("unrecognized timebase mode {:?}", other))),
		}
	}
}

impl TimebaseReference {
	pub fn as_scpi(&self) -> &'static str {
		match self {
			TimebaseReference::Left   => "LEFT",
			TimebaseReference::Center => "CENTer",
			TimebaseReference::Right  => "RIGHt",
		}
	}
}

impl MeasWindow {
	pub fn as_scpi(&self) -> &'static str {
		match self {
			MeasWindow::Auto => "AUTO",
			MeasWindow::Main => "MAIN",
			MeasWindow::Zoom => "ZOOM",
		}
	}
}

fn match_str(opt_match:Option<Match>, err:&str) -> Result<String> {
	match opt_match {
		Some(m) => Ok(m.as_str().to_owned()),
		None    => Err(ScopeError::Parse(err.to_string())),
	}
}

pub(crate) fn chan_ok(n:u8) -> Result<()> {
	if n < 1 || n > CHANNEL_COUNT { Err(ScopeError::Channel(n)) }
	else { Ok(()) }
}

fn bool_from_reply(reply:&str) -> Result<bool> {
	match reply.trim() {
		"1" | "ON"  => Ok(true),
		"0" | "OFF" => Ok(false),
		other => Err(ScopeError::Parse(format!("expected a boolean reply, got {:?}", other))),
	}
}

fn on_off(b:bool) -> &'static str {
	if b { "ON" } else { "OFF" }
}

impl<S:Session> DSOX1000<S> {

	pub fn new(session:S) -> Result<Self> {
		let mut dev = Self{ session, state: None };

		let idn:String = dev.query("*IDN?")?;
		let upper:String = idn.to_uppercase();
		if !upper.contains("KEYSIGHT") && !upper.contains("AGILENT") {
			return Err(ScopeError::Device(format!("connected instrument does not identify as a Keysight scope: {}", idn.trim())));
		}

		Ok(dev)
	}

	// Escape hatches for commands without a dedicated method
	pub fn write(&mut self, cmd:&str) -> Result<()> { self.session.write_line(cmd) }

	pub fn query(&mut self, cmd:&str) -> Result<String> { self.session.query(cmd) }

	pub fn query_f64(&mut self, cmd:&str) -> Result<f64> {
		let reply:String = self.query(cmd)?;
		reply.trim().parse::<f64>()
			.map_err(|_| ScopeError::Parse(format!("reply {:?} to {:?} is not numeric", reply, cmd)))
	}

	pub fn session_mut(&mut self) -> &mut S { &mut self.session }

	pub fn get_full_state(&mut self) -> Result<State> {
		let idn:String = self.query("*IDN?")?;
		let caps:Captures = IDN_RE.captures(&idn)
			.ok_or_else(|| ScopeError::Parse(format!("unparseable *IDN? reply: {:?}", idn)))?;
		let manufacturer:String = match_str(caps.get(1), "no match for manufacturer")?;
		let model:String        = match_str(caps.get(2), "no match for model")?;
		let serial_num:String   = match_str(caps.get(3), "no match for serial_num")?;
		let fw_version:String   = match_str(caps.get(4), "no match for fw_version")?;

		let timebase:TimebaseState = self.read_timebase()?;
		let trigger:TriggerState   = self.read_trigger()?;

		let channels:[ChannelState; 4] = [
			self.read_channel(1)?,
			self.read_channel(2)?,
			self.read_channel(3)?,
			self.read_channel(4)?,
		];

		let state = State{ manufacturer, model, serial_num, fw_version, timebase, trigger, channels };
		Ok(state)
	}

	// --- Timebase ---

	pub fn read_timebase(&mut self) -> Result<TimebaseState> {
		let mode = TimebaseMode::from_reply(&self.query(":TIM:MODE?")?)?;
		let scale_s:f64 = self.query_f64(":TIM:SCAL?")?;
		let position_s:f64 = self.query_f64(":TIM:POS?")?;
		Ok(TimebaseState{ mode, scale_s, position_s })
	}

	// Returns the scale and position the scope actually settled on, which may
	// be coerced to the nearest supported setting
	pub fn set_main_timebase(&mut self, scale_s:f64, reference:TimebaseReference, position_s:Option<f64>) -> Result<(f64, f64)> {
		self.write(":TIM:MODE MAIN")?;
		self.write(&format!(":TIM:SCAL {}", scale_s))?;
		self.write(&format!(":TIM:REF {}", reference.as_scpi()))?;
		if let Some(pos) = position_s {
			self.write(&format!(":TIM:POS {}", pos))?;
		}

		let got_scale:f64 = self.query_f64(":TIM:SCAL?")?;
		let got_pos:f64   = self.query_f64(":TIM:POS?")?;
		Ok((got_scale, got_pos))
	}

	// The zoom window must stay at or below half the MAIN scale.  With
	// auto_main the MAIN scale is widened to make room; otherwise a too-large
	// zoom is an error.  Returns (zoom scale, MAIN scale) as settled.
	pub fn set_zoom_timebase(&mut self, scale_s:f64, position_s:Option<f64>, auto_main:bool) -> Result<(f64, f64)> {
		let mut main_scale:f64 = self.query_f64(":TIM:SCAL?")?;

		if main_scale < 2.0 * scale_s {
			if auto_main {
				self.write(&format!(":TIM:SCAL {}", 2.0 * scale_s))?;
				main_scale = 2.0 * scale_s;
			} else {
				return Err(ScopeError::Range{ what: "zoom timebase scale", value: scale_s, min: 0.0, max: main_scale / 2.0 });
			}
		}

		self.write(":TIM:MODE WIND")?;
		self.write(&format!(":TIM:WIND:SCAL {}", scale_s))?;
		if let Some(pos) = position_s {
			self.write(&format!(":TIM:WIND:POS {}", pos))?;
		}

		let got_zoom:f64 = self.query_f64(":TIM:WIND:SCAL?")?;
		Ok((got_zoom, main_scale))
	}

	// --- Acquisition one-liners ---

	pub fn run(&mut self) -> Result<()> { self.write(":RUN") }

	pub fn stop(&mut self) -> Result<()> { self.write(":STOP") }

	pub fn single(&mut self) -> Result<()> { self.write(":SINGle") }

	pub fn autoscale(&mut self) -> Result<()> { self.write(":AUToscale") }

	pub fn default_setup(&mut self) -> Result<()> { self.write("*RST") }

	// Best-effort recovery after a desynchronized exchange, e.g. an aborted
	// block transfer: flush whatever is still in flight, then clear the
	// status registers
	pub fn device_clear(&mut self) -> Result<()> {
		for _ in 0..8 {
			if self.session.read_available(4096)?.is_empty() {
				break;
			}
		}
		self.write("*CLS")
	}

	// --- Vertical ---

	pub fn read_channel(&mut self, chan_num:u8) -> Result<ChannelState> {
		chan_ok(chan_num)?;
		let ch:String = format!(":CHAN{}", chan_num);

		let display:bool  = bool_from_reply(&self.query(&format!("{}:DISP?", ch))?)?;
		let coupling      = Coupling::from_reply(&self.query(&format!("{}:COUP?", ch))?)?;
		let bw_limit:bool = bool_from_reply(&self.query(&format!("{}:BWL?", ch))?)?;
		let invert:bool   = bool_from_reply(&self.query(&format!("{}:INV?", ch))?)?;
		let scale_v:f64   = self.query_f64(&format!("{}:SCAL?", ch))?;
		let offset_v:f64  = self.query_f64(&format!("{}:OFFS?", ch))?;
		let probe:f64     = self.query_f64(&format!("{}:PROB?", ch))?;

		Ok(ChannelState{ display, coupling, bw_limit, invert, probe, scale_v, offset_v })
	}

	// Applies every vertical setting for one channel, then reads the channel
	// back so the caller sees what the scope actually accepted
	pub fn apply_channel(&mut self, chan_num:u8, cfg:&ChannelState) -> Result<ChannelState> {
		chan_ok(chan_num)?;
		let ch:String = format!(":CHAN{}", chan_num);

		self.write(&format!("{}:DISP {}", ch, on_off(cfg.display)))?;
		self.write(&format!("{}:COUP {}", ch, cfg.coupling.as_scpi()))?;
		self.write(&format!("{}:BWL {}", ch, on_off(cfg.bw_limit)))?;
		self.write(&format!("{}:INV {}", ch, on_off(cfg.invert)))?;
		self.write(&format!("{}:PROB {}", ch, cfg.probe))?;
		self.write(&format!("{}:SCAL {}", ch, cfg.scale_v))?;
		self.write(&format!("{}:OFFS {}", ch, cfg.offset_v))?;

		self.read_channel(chan_num)
	}

	// --- Trigger ---

	pub fn read_trigger(&mut self) -> Result<TriggerState> {
		let source = TriggerSource::from_reply(&self.query(":TRIG:EDGE:SOUR?")?)?;
		let slope  = Slope::from_reply(&self.query(":TRIG:EDGE:SLOP?")?)?;

		let (coupling, level_v) = if source == TriggerSource::Line {
			(None, None)
		} else {
			let coup = TriggerCoupling::from_reply(&self.query(":TRIG:EDGE:COUP?")?)?;
			// Per-source query form first; older firmware only honors the
			// global form
			let lev:f64 = match self.query_f64(&format!(":TRIG:LEV? {}", source.as_scpi())) {
				Ok(v)  => v,
				Err(_) => self.query_f64(":TRIG:LEV?")?,
			};
			(Some(coup), Some(lev))
		};

		let sweep = Sweep::from_reply(&self.query(":TRIG:SWEEP?")?)?;
		let holdoff_s:f64 = self.query_f64(":TRIG:HOLD?")?;

		Ok(TriggerState{ source, slope, coupling, level_v, sweep, holdoff_s })
	}

	pub fn apply_trigger(&mut self, trig:&EdgeTrigger) -> Result<TriggerState> {
		self.write(":TRIG:MODE EDGE")?;
		self.write(&format!(":TRIG:EDGE:SOUR {}", trig.source.as_scpi()))?;
		self.write(&format!(":TRIG:EDGE:SLOP {}", trig.slope.as_scpi()))?;

		// LINE triggering has neither coupling nor level
		if trig.source != TriggerSource::Line {
			self.write(&format!(":TRIG:EDGE:COUP {}", trig.coupling.as_scpi()))?;
			self.write(&format!(":TRIG:LEV {},{}", trig.source.as_scpi(), trig.level_v))?;
		}

		self.write(&format!(":TRIG:SWEEP {}", trig.sweep.as_scpi()))?;

		if let Some(hold) = trig.holdoff_s {
			// zero or negative holdoff means "leave unchanged"
			if hold > 0.0 {
				self.write(&format!(":TRIG:HOLD {}", hold))?;
			}
		}

		self.read_trigger()
	}

	// --- Measurements ---

	pub fn set_measurement_window(&mut self, window:MeasWindow) -> Result<()> {
		self.write(&format!(":MEAS:WIND {}", window.as_scpi()))
	}

	pub fn install_measurement(&mut self, meas:Measurement, source:Option<u8>) -> Result<()> {
		match source {
			Some(n) => {
				chan_ok(n)?;
				self.write(&format!(":MEAS:{} CHAN{}", meas.scpi_leaf(), n))
			},
			None => self.write(&format!(":MEAS:{}", meas.scpi_leaf())),
		}
	}

	pub fn read_measurement(&mut self, meas:Measurement, source:Option<u8>) -> Result<f64> {
		match source {
			Some(n) => {
				chan_ok(n)?;
				self.query_f64(&format!(":MEAS:{}? CHAN{}", meas.scpi_leaf(), n))
			},
			None => self.query_f64(&format!(":MEAS:{}?", meas.scpi_leaf())),
		}
	}

	// Clears every installed measurement from the scope display
	pub fn clear_measurements(&mut self) -> Result<()> {
		self.write(":MEAS:CLEar")
	}

}
