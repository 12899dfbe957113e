//! Acquiring a device-manager handle.
//!
//! The platform service is WIA, available on Windows only. Setting
//! `SCANPROBE_BACKEND=sim` substitutes the scripted service so the full
//! output path can be exercised anywhere.

pub mod sim;
#[cfg(windows)]
pub mod wia;

use crate::service::DeviceManager;
use crate::Result;

/// Environment override for the service backend. Supported values: `wia`
/// (the platform service, the default) and `sim` (the scripted service).
pub const BACKEND_ENV: &str = "SCANPROBE_BACKEND";

/// Handle to the image acquisition service, honoring [`BACKEND_ENV`].
///
/// A failed acquisition is logged here as well as returned; `inspect` logs
/// only the failures of its own pass.
pub fn default_manager() -> Result<Box<dyn DeviceManager>> {
    let backend = read_env_string(BACKEND_ENV, "wia");
    let result: Result<Box<dyn DeviceManager>> = match backend.as_str() {
        "sim" => {
            log::info!("backend: sim");
            Ok(Box::new(sim::Manager::demo()))
        }
        "wia" => platform_manager(),
        other => {
            log::warn!(
                "unknown {}='{}', using the platform service (supported: wia|sim)",
                BACKEND_ENV,
                other
            );
            platform_manager()
        }
    };
    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result
}

#[cfg(windows)]
fn platform_manager() -> Result<Box<dyn DeviceManager>> {
    Ok(Box::new(wia::Manager::connect()?))
}

#[cfg(not(windows))]
fn platform_manager() -> Result<Box<dyn DeviceManager>> {
    Err(crate::Error::ServiceUnavailable(format!(
        "WIA only exists on Windows; set {}=sim for the scripted service",
        BACKEND_ENV
    )))
}

fn read_env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
