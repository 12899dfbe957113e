//! The inspection pass: connect to a scanner and copy out everything the
//! acquisition service knows about it.

use crate::report::{DeviceRecord, FeatureRecord, InspectionReport};
use crate::service::{DeviceEntry, DeviceManager, Property};
use crate::types::{Constraint, FeatureDescriptor, FeatureEntry, SubType, Value};
use crate::{Error, Result};

/// Sentinel recorded when a registry property exists but its value cannot be
/// read.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Inspect the first scanner known to the device manager.
///
/// Device selection is deliberately dumb: whatever the service enumerates
/// first gets inspected, no matter how many devices are attached. Callers
/// that want to pick a device themselves enumerate entries and hand one to
/// [`inspect_entry`].
pub fn inspect(manager: &dyn DeviceManager) -> Result<InspectionReport> {
    let result = first_entry(manager).and_then(|entry| inspect_entry(entry.as_ref()));
    match &result {
        Ok(report) => log::info!(
            "scanner information retrieved ({} details, {} features)",
            report.scanner_details.len(),
            report.supported_features.len()
        ),
        Err(Error::NoScannerDetected) => log::error!("no scanner detected"),
        Err(e) => log::error!("failed to get scanner info: {e}"),
    }
    result
}

/// Inspect one specific device entry.
pub fn inspect_entry(entry: &dyn DeviceEntry) -> Result<InspectionReport> {
    let device = entry.connect()?;

    let scanner_details = collect_details(&entry.properties()?);

    let mut supported_features = FeatureRecord::new();
    for item in device.items()? {
        log::debug!("walking item {}", item.name());
        collect_features(&item.properties()?, &mut supported_features);
    }

    Ok(InspectionReport {
        scanner_details,
        supported_features,
    })
}

fn first_entry(manager: &dyn DeviceManager) -> Result<Box<dyn DeviceEntry>> {
    let mut entries = manager.devices()?;
    if entries.is_empty() {
        return Err(Error::NoScannerDetected);
    }
    Ok(entries.remove(0))
}

/// Fold registry properties into the details record. A value read the driver
/// rejects is contained to its own key: the entry becomes the
/// [`NOT_AVAILABLE`] sentinel and the fold continues.
fn collect_details(props: &[Box<dyn Property>]) -> DeviceRecord {
    props.iter().fold(DeviceRecord::new(), |mut record, prop| {
        let value = prop.value().unwrap_or_else(|e| {
            log::warn!("property {} unavailable: {e}", prop.name());
            Value::Text(NOT_AVAILABLE.to_string())
        });
        record.insert(prop.name().to_string(), value);
        record
    })
}

/// Fold item properties into the features record, one descriptor per key. A
/// failed read degrades that key to its error text and the walk continues.
fn collect_features(props: &[Box<dyn Property>], record: &mut FeatureRecord) {
    for prop in props {
        let entry = match describe(prop.as_ref()) {
            Ok(desc) => FeatureEntry::Feature(desc),
            Err(e) => {
                log::warn!("feature {} unreadable: {e}", prop.name());
                FeatureEntry::Unreadable(format!("Error reading: {e}"))
            }
        };
        record.insert(prop.name().to_string(), entry);
    }
}

/// Build the structured descriptor for one item property. Constraint
/// metadata follows the driver's sub-type tag: range bounds for `Range`, the
/// legal values for `List`, nothing for anything else.
fn describe(prop: &dyn Property) -> Result<FeatureDescriptor> {
    let value = prop.value()?;
    let sub_type = prop.sub_type()?;
    let constraint = match sub_type {
        SubType::Range => Constraint::Range(prop.range()?),
        SubType::List => Constraint::List(prop.list()?),
        _ => Constraint::None,
    };
    Ok(FeatureDescriptor {
        id: prop.id(),
        value,
        data_type: prop.data_type(),
        sub_type,
        constraint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sim::{Device, Item, Manager, Prop};
    use crate::types::ValueRange;

    fn flatbed(props: Vec<Prop>) -> Device {
        Device::new(
            vec![Prop::plain("Name", 7, "HP Scanner")],
            vec![Item::new("Flatbed", props)],
        )
    }

    #[test]
    fn test_no_scanner_detected() {
        let manager = Manager::new(vec![]);
        match inspect(&manager) {
            Err(Error::NoScannerDetected) => {}
            other => panic!("expected NoScannerDetected, got {other:?}"),
        }
    }

    #[test]
    fn test_first_device_wins() {
        let first = Device::new(vec![Prop::plain("Name", 7, "HP Scanner")], vec![]);
        let second = Device::new(vec![Prop::plain("Name", 7, "Epson Scanner")], vec![]);
        let manager = Manager::new(vec![first, second]);

        let report = inspect(&manager).unwrap();
        assert_eq!(
            report.scanner_details.get("Name"),
            Some(&Value::Text("HP Scanner".into()))
        );
    }

    #[test]
    fn test_connect_failure_is_top_level() {
        let manager = Manager::new(vec![Device::refusing_connect("driver busy")]);
        match inspect(&manager) {
            Err(Error::Connect(reason)) => assert_eq!(reason, "driver busy"),
            other => panic!("expected Connect error, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_detail_becomes_sentinel() {
        let device = Device::new(
            vec![
                Prop::plain("Name", 7, "HP Scanner"),
                Prop::failing("Firmware", 15, "access denied"),
            ],
            vec![],
        );
        let report = inspect(&Manager::new(vec![device])).unwrap();

        assert_eq!(
            report.scanner_details.get("Firmware"),
            Some(&Value::Text(NOT_AVAILABLE.into()))
        );
        // The failure stays contained to its own key.
        assert_eq!(
            report.scanner_details.get("Name"),
            Some(&Value::Text("HP Scanner".into()))
        );
    }

    #[test]
    fn test_unreadable_feature_becomes_error_text() {
        let device = flatbed(vec![
            Prop::failing("Lamp Warmup Time", 6161, "device busy"),
            Prop::plain("Bits Per Pixel", 4104, 24),
        ]);
        let report = inspect(&Manager::new(vec![device])).unwrap();

        match report.supported_features.get("Lamp Warmup Time") {
            Some(FeatureEntry::Unreadable(text)) => {
                assert!(text.contains("Error reading:"), "got {text:?}");
                assert!(text.contains("device busy"), "got {text:?}");
            }
            other => panic!("expected unreadable entry, got {other:?}"),
        }
        // Enumeration continued past the failure.
        assert!(matches!(
            report.supported_features.get("Bits Per Pixel"),
            Some(FeatureEntry::Feature(_))
        ));
    }

    #[test]
    fn test_range_feature_carries_bounds() {
        let range = ValueRange {
            min: 100,
            max: 1200,
            step: 100,
        };
        let device = flatbed(vec![Prop::ranged("Resolution", 6147, 300, range)]);
        let report = inspect(&Manager::new(vec![device])).unwrap();

        match report.supported_features.get("Resolution") {
            Some(FeatureEntry::Feature(desc)) => {
                assert_eq!(desc.id, 6147);
                assert_eq!(desc.value, Value::Int(300));
                assert_eq!(desc.sub_type, SubType::Range);
                assert_eq!(desc.constraint, Constraint::Range(range));
            }
            other => panic!("expected feature, got {other:?}"),
        }
    }

    #[test]
    fn test_list_feature_carries_values() {
        let device = flatbed(vec![Prop::listed(
            "Data Type",
            4103,
            3,
            vec![Value::Int(0), Value::Int(1), Value::Int(3)],
        )]);
        let report = inspect(&Manager::new(vec![device])).unwrap();

        match report.supported_features.get("Data Type") {
            Some(FeatureEntry::Feature(desc)) => {
                assert_eq!(desc.sub_type, SubType::List);
                assert_eq!(
                    desc.constraint,
                    Constraint::List(vec![Value::Int(0), Value::Int(1), Value::Int(3)])
                );
            }
            other => panic!("expected feature, got {other:?}"),
        }
    }

    #[test]
    fn test_other_sub_types_carry_no_constraint() {
        let device = flatbed(vec![
            Prop::plain("Item Name", 4098, "Flatbed"),
            Prop::plain("Access Rights", 4102, 1).with_sub_type(SubType::Flag),
            Prop::plain("Vendor Extension", 38914, 0).with_sub_type(SubType::Unknown(9)),
        ]);
        let report = inspect(&Manager::new(vec![device])).unwrap();

        for name in ["Item Name", "Access Rights", "Vendor Extension"] {
            match report.supported_features.get(name) {
                Some(FeatureEntry::Feature(desc)) => {
                    assert_eq!(desc.constraint, Constraint::None, "{name}")
                }
                other => panic!("expected feature for {name}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_items_flatten_into_one_record() {
        let device = Device::new(
            vec![],
            vec![
                Item::new("Flatbed", vec![Prop::plain("Bits Per Pixel", 4104, 24)]),
                Item::new("Feeder", vec![Prop::plain("Pages", 3096, 1)]),
            ],
        );
        let report = inspect(&Manager::new(vec![device])).unwrap();

        assert_eq!(report.supported_features.len(), 2);
        assert!(report.supported_features.contains_key("Bits Per Pixel"));
        assert!(report.supported_features.contains_key("Pages"));
    }
}
