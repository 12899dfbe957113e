/// Errors raised while talking to the image acquisition service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("image acquisition service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("no scanner detected")]
    NoScannerDetected,

    #[error("device enumeration failed: {0}")]
    Enumeration(String),

    #[error("failed to connect to scanner: {0}")]
    Connect(String),

    #[error("{0}")]
    PropertyRead(String),
}
