
extern crate dsoxctl;
extern crate env_logger;
extern crate serde_json;

use std::env;

use dsoxctl::config::SessionConfig;
use dsoxctl::devices::dsox1000::DSOX1000;

pub fn main() -> dsoxctl::Result<()> {

	env_logger::init();

	let addr:String = env::args().nth(1).unwrap_or_else(|| "192.168.2.10:5025".to_string());
	let csv_path:String = env::args().nth(2).unwrap_or_else(|| "./capture.csv".to_string());

	let session = SessionConfig::single(&addr).connect()?;
	let mut scope = DSOX1000::new(session)?;

	let state = scope.get_full_state()?;
	println!("{}", serde_json::to_string_pretty(&state).unwrap());

	let captured:Vec<String> = scope.export_all_channels_csv(&csv_path)?;
	println!("Saved {} channel(s) to {}: {}", captured.len(), csv_path, captured.join(", "));

	Ok(())
}
