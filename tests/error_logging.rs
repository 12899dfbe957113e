//! Logging side effects of the failure paths.
//!
//! Tests verify:
//! - A zero-device pass logs exactly one error record
//! - A failed service acquisition is logged, not just returned

use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use scanprobe::backend::sim::Manager;
use scanprobe::{inspect, Error};

/// Keeps every emitted record so the tests can count them.
struct RecordingLogger {
    records: Mutex<Vec<(Level, String, String)>>,
}

impl Log for RecordingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }
    }

    fn flush(&self) {}
}

/// Install the shared recorder; the process-wide logger can only be set once,
/// so repeat calls reuse the first installation.
fn recorder() -> &'static RecordingLogger {
    static LOGGER: OnceLock<RecordingLogger> = OnceLock::new();
    let logger = LOGGER.get_or_init(|| RecordingLogger {
        records: Mutex::new(Vec::new()),
    });
    let _ = log::set_logger(logger);
    log::set_max_level(LevelFilter::Trace);
    logger
}

/// Error-level messages emitted from the given module.
fn errors_from(logger: &RecordingLogger, target: &str) -> Vec<String> {
    logger
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, from, _)| *level == Level::Error && from.starts_with(target))
        .map(|(_, _, message)| message.clone())
        .collect()
}

#[test]
fn test_zero_devices_logs_exactly_one_error() {
    let logger = recorder();

    match inspect(&Manager::new(vec![])) {
        Err(Error::NoScannerDetected) => {}
        other => panic!("expected NoScannerDetected, got {other:?}"),
    }

    let errors = errors_from(logger, "scanprobe::inspect");
    assert_eq!(errors.len(), 1, "got {errors:?}");
    assert_eq!(errors[0], "no scanner detected");
}

#[cfg(not(windows))]
#[test]
fn test_acquisition_failure_is_logged() {
    use scanprobe::backend;

    let logger = recorder();
    std::env::set_var(backend::BACKEND_ENV, "wia");

    match backend::default_manager() {
        Err(Error::ServiceUnavailable(_)) => {}
        Ok(_) => panic!("expected the platform service to be unavailable"),
        Err(other) => panic!("expected ServiceUnavailable, got {other:?}"),
    }

    let errors = errors_from(logger, "scanprobe::backend");
    assert_eq!(errors.len(), 1, "got {errors:?}");
    assert!(
        errors[0].contains("image acquisition service unavailable"),
        "got {:?}",
        errors[0]
    );
}
