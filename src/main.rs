//! Console entry point: inspect the first attached scanner and print its
//! report. Always exits 0; failures are a single line on stderr so scripted
//! callers can treat the output as best-effort.

use scanprobe::{backend, inspect, Error};

fn main() {
    env_logger::init();
    log::info!("starting scanner inspection");

    let result = backend::default_manager().and_then(|manager| inspect(manager.as_ref()));
    match result {
        Ok(report) => print!("{}", report),
        Err(Error::NoScannerDetected) => eprintln!("No scanner detected."),
        Err(e) => eprintln!("Failed to get scanner info: {}", e),
    }

    log::info!("scanner inspection completed");
}
