//! Scripted in-memory acquisition service.
//!
//! Drives the [`crate::service`] traits from fixed data, standing in for the
//! real driver stack in tests and behind `SCANPROBE_BACKEND=sim` at the
//! console. Scripted read failures let tests exercise the containment paths
//! without a misbehaving driver on hand.

use crate::service;
use crate::types::{SubType, Value, ValueRange};
use crate::{Error, Result};

/// Scripted device manager holding a fixed device list.
#[derive(Debug, Clone, Default)]
pub struct Manager {
    devices: Vec<Device>,
}

impl Manager {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// Canned flatbed scanner used when the sim backend is selected at the
    /// console. Property names and tags mirror what WIA drivers register.
    pub fn demo() -> Self {
        let resolutions: Vec<Value> = [75i64, 100, 150, 200, 300, 400, 600, 1200]
            .into_iter()
            .map(Value::Int)
            .collect();
        let percent = ValueRange {
            min: -1000,
            max: 1000,
            step: 1,
        };
        let bed_width = ValueRange {
            min: 1,
            max: 2550,
            step: 1,
        };
        let bed_height = ValueRange {
            min: 1,
            max: 3300,
            step: 1,
        };

        Self::new(vec![Device::new(
            vec![
                Prop::plain(
                    "Unique Device ID",
                    2,
                    "{6BDD1FC6-810F-11D0-BEC7-08002BE2092F}\\0000",
                ),
                Prop::plain("Manufacturer", 3, "Hewlett-Packard"),
                Prop::plain("Description", 4, "HP Flatbed Scanner"),
                Prop::plain("Type", 5, 65537),
                Prop::plain("Port", 6, "\\\\.\\Usbscan0"),
                Prop::plain("Name", 7, "HP Scanner"),
                Prop::plain("Server", 8, "local"),
                Prop::plain("WIA Version", 14, "2.0.0.0"),
                Prop::plain("Driver Version", 15, "1.0.0.0"),
            ],
            vec![Item::new(
                "Flatbed",
                vec![
                    Prop::plain("Item Name", 4098, "Flatbed"),
                    Prop::plain("Full Item Name", 4099, "0000\\Root\\Flatbed"),
                    Prop::plain("Access Rights", 4102, 1).with_sub_type(SubType::Flag),
                    Prop::listed(
                        "Data Type",
                        4103,
                        3,
                        vec![Value::Int(0), Value::Int(1), Value::Int(3)],
                    ),
                    Prop::listed(
                        "Bits Per Pixel",
                        4104,
                        24,
                        vec![Value::Int(1), Value::Int(8), Value::Int(24)],
                    ),
                    Prop::plain("Current Intent", 6146, 0).with_sub_type(SubType::Flag),
                    Prop::listed("Horizontal Resolution", 6147, 300, resolutions.clone()),
                    Prop::listed("Vertical Resolution", 6148, 300, resolutions),
                    Prop::ranged("Horizontal Extent", 6151, 2550, bed_width),
                    Prop::ranged("Vertical Extent", 6152, 3300, bed_height),
                    Prop::ranged("Brightness", 6154, 0, percent),
                    Prop::ranged("Contrast", 6155, 0, percent),
                ],
            )],
        )])
    }
}

impl service::DeviceManager for Manager {
    fn devices(&self) -> Result<Vec<Box<dyn service::DeviceEntry>>> {
        Ok(self
            .devices
            .iter()
            .map(|d| Box::new(d.clone()) as Box<dyn service::DeviceEntry>)
            .collect())
    }
}

/// One scripted device: registry properties plus connectable items.
#[derive(Debug, Clone, Default)]
pub struct Device {
    info: Vec<Prop>,
    items: Vec<Item>,
    refuse_connect: Option<String>,
}

impl Device {
    pub fn new(info: Vec<Prop>, items: Vec<Item>) -> Self {
        Self {
            info,
            items,
            refuse_connect: None,
        }
    }

    /// Device whose connect always fails with the given driver message.
    pub fn refusing_connect(reason: &str) -> Self {
        Self {
            refuse_connect: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

impl service::DeviceEntry for Device {
    fn properties(&self) -> Result<Vec<Box<dyn service::Property>>> {
        Ok(boxed(&self.info))
    }

    fn connect(&self) -> Result<Box<dyn service::Device>> {
        match &self.refuse_connect {
            Some(reason) => Err(Error::Connect(reason.clone())),
            None => Ok(Box::new(self.clone())),
        }
    }
}

impl service::Device for Device {
    fn items(&self) -> Result<Vec<Box<dyn service::DeviceItem>>> {
        Ok(self
            .items
            .iter()
            .map(|i| Box::new(i.clone()) as Box<dyn service::DeviceItem>)
            .collect())
    }
}

/// One scripted item.
#[derive(Debug, Clone, Default)]
pub struct Item {
    name: String,
    props: Vec<Prop>,
}

impl Item {
    pub fn new(name: &str, props: Vec<Prop>) -> Self {
        Self {
            name: name.to_string(),
            props,
        }
    }
}

impl service::DeviceItem for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> Result<Vec<Box<dyn service::Property>>> {
        Ok(boxed(&self.props))
    }
}

fn boxed(props: &[Prop]) -> Vec<Box<dyn service::Property>> {
    props
        .iter()
        .map(|p| Box::new(p.clone()) as Box<dyn service::Property>)
        .collect()
}

/// One scripted property.
#[derive(Debug, Clone)]
pub struct Prop {
    name: String,
    id: u32,
    data_type: u32,
    sub_type: SubType,
    value: std::result::Result<Value, String>,
    range: Option<ValueRange>,
    values: Option<Vec<Value>>,
}

impl Prop {
    /// Property with no constraint metadata.
    pub fn plain(name: &str, id: u32, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.to_string(),
            id,
            data_type: variant_tag(&value),
            sub_type: SubType::Unspecified,
            value: Ok(value),
            range: None,
            values: None,
        }
    }

    /// Property whose legal values form a range.
    pub fn ranged(name: &str, id: u32, value: i64, range: ValueRange) -> Self {
        Self {
            sub_type: SubType::Range,
            range: Some(range),
            ..Self::plain(name, id, value)
        }
    }

    /// Property whose legal values are enumerated.
    pub fn listed(name: &str, id: u32, value: impl Into<Value>, values: Vec<Value>) -> Self {
        Self {
            sub_type: SubType::List,
            values: Some(values),
            ..Self::plain(name, id, value)
        }
    }

    /// Property whose reads fail with the given driver message.
    pub fn failing(name: &str, id: u32, message: &str) -> Self {
        Self {
            name: name.to_string(),
            id,
            data_type: 0,
            sub_type: SubType::Unspecified,
            value: Err(message.to_string()),
            range: None,
            values: None,
        }
    }

    /// Override the sub-type tag.
    pub fn with_sub_type(mut self, sub_type: SubType) -> Self {
        self.sub_type = sub_type;
        self
    }
}

/// VARIANT-style type tag for a scripted value, as a real driver would report.
fn variant_tag(value: &Value) -> u32 {
    match value {
        Value::Int(_) => 3, // VT_I4
        Value::Float(_) => 5, // VT_R8
        Value::Text(_) => 8, // VT_BSTR
        Value::Bool(_) => 11, // VT_BOOL
    }
}

impl service::Property for Prop {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn data_type(&self) -> u32 {
        self.data_type
    }

    fn sub_type(&self) -> Result<SubType> {
        Ok(self.sub_type)
    }

    fn value(&self) -> Result<Value> {
        self.value.clone().map_err(Error::PropertyRead)
    }

    fn range(&self) -> Result<ValueRange> {
        self.range
            .ok_or_else(|| Error::PropertyRead(format!("{}: no range metadata", self.name)))
    }

    fn list(&self) -> Result<Vec<Value>> {
        self.values
            .clone()
            .ok_or_else(|| Error::PropertyRead(format!("{}: no list metadata", self.name)))
    }
}
