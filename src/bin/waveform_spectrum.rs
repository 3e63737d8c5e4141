
extern crate dsoxctl;
extern crate env_logger;
extern crate rustfft;

use std::env;

use rustfft::FFTplanner;
use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use dsoxctl::config::SessionConfig;
use dsoxctl::devices::dsox1000::DSOX1000;
use dsoxctl::units::fmt_hz;

// Captures one channel and reports the strongest spectral component, which is
// a quick sanity check that the scope sees the signal you think it does
pub fn main() -> dsoxctl::Result<()> {

	env_logger::init();

	let addr:String = env::args().nth(1).unwrap_or_else(|| "192.168.2.10:5025".to_string());
	let chan_num:u8 = env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(1);

	let session = SessionConfig::single(&addr).connect()?;
	let mut scope = DSOX1000::new(session)?;

	let wf = scope.read_waveform(chan_num)?;
	let n:usize = wf.voltage_v.len();
	if n == 0 {
		println!("CHAN{}: empty capture, nothing to analyze", chan_num);
		return Ok(());
	}

	let mut time_domain:Vec<Complex<f64>> = wf.voltage_v.iter().map(|v| Complex{ re: *v, im: 0.0 }).collect();
	let mut freq_domain:Vec<Complex<f64>> = vec![Complex::zero(); n];

	let mut planner = FFTplanner::new(false);
	let fft = planner.plan_fft(n);
	fft.process(&mut time_domain, &mut freq_domain);

	let sample_rate_sps:f64 = 1.0 / wf.preamble.x_increment;

	// Find the strongest non-DC component; bins past the midpoint mirror the
	// negative frequencies
	let mut best_freq:f64 = 0.0;
	let mut best_amp:f64 = 0.0;
	for (idx, fft_response) in freq_domain.iter().enumerate().skip(1) {
		if best_amp < fft_response.norm_sqr() {
			best_amp = fft_response.norm_sqr();
			best_freq = if idx < n / 2 {
				(idx as f64 * sample_rate_sps) / (n as f64)
			} else {
				((n - idx) as f64 * sample_rate_sps) / (n as f64)
			};
		}
	}

	println!("CHAN{}: {} points at {}, strongest component {}", chan_num, n, fmt_hz(sample_rate_sps), fmt_hz(best_freq));

	Ok(())
}
