//! # scanprobe - Scanner detection and capability reporting
//!
//! Queries the platform image acquisition service (WIA on Windows) and
//! reports everything it knows about the attached scanner:
//! - Registry details (name, manufacturer, port, driver version)
//! - Per-item capabilities with their legal-value constraints
//! - A scripted service backend for tests and driverless machines
//!
//! ## Quick Start
//! ```no_run
//! use scanprobe::{backend, inspect};
//!
//! let manager = backend::default_manager().unwrap();
//! match inspect(manager.as_ref()) {
//!     Ok(report) => print!("{}", report),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod error;
pub mod types;
pub mod service;
pub mod backend;
pub mod inspect;
pub mod report;

pub use error::Error;
pub use types::*;
pub use inspect::{inspect, inspect_entry, NOT_AVAILABLE};
pub use report::{DeviceRecord, FeatureRecord, InspectionReport};

/// Result type alias for scanprobe operations.
pub type Result<T> = std::result::Result<T, Error>;
