//! The image acquisition service boundary.
//!
//! The platform service is reached only through these object-safe traits, so
//! a scripted double can stand in for the real driver stack (see
//! [`crate::backend::sim`]).

use crate::types::{SubType, Value, ValueRange};
use crate::Result;

/// Handle to the platform device-manager service.
pub trait DeviceManager {
    /// Device entries currently registered with the service, in service
    /// enumeration order.
    fn devices(&self) -> Result<Vec<Box<dyn DeviceEntry>>>;
}

/// One registry entry of the device manager.
pub trait DeviceEntry {
    /// Registry properties readable without connecting to the driver.
    fn properties(&self) -> Result<Vec<Box<dyn Property>>>;

    /// Establish a session with the device driver.
    fn connect(&self) -> Result<Box<dyn Device>>;
}

/// A device with an established driver session.
pub trait Device {
    /// Functional sub-items of the device (flatbed, feeder, ...).
    fn items(&self) -> Result<Vec<Box<dyn DeviceItem>>>;
}

/// One functional sub-item of a connected device.
pub trait DeviceItem {
    fn name(&self) -> &str;

    /// Properties exposed by this item.
    fn properties(&self) -> Result<Vec<Box<dyn Property>>>;
}

/// A named property slot of a device entry or item.
///
/// `name`, `id` and `data_type` come with the enumeration itself; the
/// remaining getters are driver round-trips and can fail independently.
pub trait Property {
    /// Property name as registered by the driver.
    fn name(&self) -> &str;

    /// Numeric property tag.
    fn id(&self) -> u32;

    /// Variant type tag of the stored value.
    fn data_type(&self) -> u32;

    /// Constraint form of the legal values.
    fn sub_type(&self) -> Result<SubType>;

    /// Current value.
    fn value(&self) -> Result<Value>;

    /// Range bounds; defined when `sub_type` reports `Range`.
    fn range(&self) -> Result<ValueRange>;

    /// Legal values; defined when `sub_type` reports `List`.
    fn list(&self) -> Result<Vec<Value>>;
}
