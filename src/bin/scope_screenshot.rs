
extern crate dsoxctl;
extern crate env_logger;

use std::env;
use std::fs;

use dsoxctl::config::SessionConfig;
use dsoxctl::devices::dsox1000::DSOX1000;

pub fn main() -> dsoxctl::Result<()> {

	env_logger::init();

	let addr:String = env::args().nth(1).unwrap_or_else(|| "192.168.2.10:5025".to_string());
	let png_path:String = env::args().nth(2).unwrap_or_else(|| "./screenshot.png".to_string());

	let session = SessionConfig::single(&addr).connect()?;
	let mut scope = DSOX1000::new(session)?;

	let png:Vec<u8> = scope.screenshot_png()?;
	fs::write(&png_path, &png)?;

	println!("Saved {} bytes to {}", png.len(), png_path);

	Ok(())
}
