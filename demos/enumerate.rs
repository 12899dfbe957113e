//! Inspect every scanner the acquisition service knows about, not just the
//! first. Run with SCANPROBE_BACKEND=sim on machines without a driver stack.

use scanprobe::service::DeviceManager;

fn main() {
    env_logger::init();

    let manager = match scanprobe::backend::default_manager() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match manager.devices() {
        Ok(entries) => {
            println!("Found {} device(s)", entries.len());
            for (i, entry) in entries.iter().enumerate() {
                println!();
                println!("[{}]", i);
                match scanprobe::inspect_entry(entry.as_ref()) {
                    Ok(report) => print!("{}", report),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
