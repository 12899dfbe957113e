//! Assembled inspection report and its console rendering.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{FeatureEntry, Value};

/// Registry properties of a device, keyed by property name.
pub type DeviceRecord = BTreeMap<String, Value>;

/// Item properties with constraint metadata, keyed by property name.
pub type FeatureRecord = BTreeMap<String, FeatureEntry>;

/// Everything one inspection pass learned about a scanner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InspectionReport {
    pub scanner_details: DeviceRecord,
    pub supported_features: FeatureRecord,
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section(f, "Scanner Details")?;
        for (name, value) in &self.scanner_details {
            writeln!(f, "  {}: {}", name, value)?;
        }
        writeln!(f)?;
        section(f, "Supported Features")?;
        for (name, entry) in &self.supported_features {
            writeln!(f, "  {}: {}", name, entry)?;
        }
        Ok(())
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(title.len()))
}
