//! Windows Image Acquisition backend.
//!
//! Talks to the local WIA service over COM and drives the [`crate::service`]
//! traits from live driver data. Device registry entries and item properties
//! both surface through `IWiaPropertyStorage`, so one property walk covers
//! both sides of the report.

use log::{debug, warn};

use windows::core::{Interface, BSTR, PROPVARIANT};
use windows::Win32::Devices::ImageAcquisition::{
    IEnumWIA_DEV_INFO, IEnumWiaItem, IWiaDevMgr, IWiaItem, IWiaPropertyStorage, WiaDevMgr,
};
use windows::Win32::System::Com::StructuredStorage::{
    PROPSPEC, PROPSPEC_0, PRSPEC_PROPID, STATPROPSTG,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_LOCAL_SERVER,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::System::Variant::{
    VARENUM, VT_BOOL, VT_BSTR, VT_I1, VT_I2, VT_I4, VT_I8, VT_INT, VT_LPSTR, VT_LPWSTR, VT_R4,
    VT_R8, VT_UI1, VT_UI2, VT_UI4, VT_UI8, VT_UINT,
};
use windows::Win32::UI::Shell::PropertiesSystem::{
    PropVariantGetElementCount, PropVariantGetInt64Elem, PropVariantGetStringElem,
    PropVariantToBoolean, PropVariantToDouble, PropVariantToInt64, PropVariantToStringAlloc,
};

use crate::service;
use crate::types::{SubType, Value, ValueRange};
use crate::{Error, Result};

// Tags and attribute words from wiadef.h.
const WIA_DEVINFO_ENUM_LOCAL: i32 = 0x10;

const WIA_DIP_DEV_ID: u32 = 2;
const WIA_IPA_ITEM_NAME: u32 = 4098;

// Element layout of the attribute vector for ranged properties.
const WIA_RANGE_MIN: u32 = 0;
const WIA_RANGE_MAX: u32 = 2;
const WIA_RANGE_STEP: u32 = 3;

// Element layout of the attribute vector for list properties. Legal values
// start after the count and nominal slots.
const WIA_LIST_COUNT: u32 = 0;
const WIA_LIST_VALUES: u32 = 2;

bitflags::bitflags! {
    /// Per-property attribute word reported alongside the constraint vector.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    struct PropAttr: u32 {
        const READ      = 0x0001;
        const WRITE     = 0x0002;
        const SYNC      = 0x0004;
        const NONE      = 0x0008;
        const RANGE     = 0x0010;
        const LIST      = 0x0020;
        const FLAG      = 0x0040;
        const CACHEABLE = 0x10000;
    }
}

impl PropAttr {
    fn sub_type(self) -> SubType {
        if self.contains(PropAttr::RANGE) {
            SubType::Range
        } else if self.contains(PropAttr::LIST) {
            SubType::List
        } else if self.contains(PropAttr::FLAG) {
            SubType::Flag
        } else {
            SubType::Unspecified
        }
    }
}

/// RAII guard pairing `CoInitializeEx` with `CoUninitialize`.
struct ComGuard;

impl ComGuard {
    fn new() -> Result<Self> {
        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(|e| {
                    Error::ServiceUnavailable(format!("failed to initialize COM: {}", e))
                })?;
        }
        Ok(Self)
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

/// Live WIA device manager.
pub struct Manager {
    // Interfaces must release before the guard uninitializes COM, so the
    // field order here is load-bearing.
    devmgr: IWiaDevMgr,
    _com: ComGuard,
}

impl Manager {
    /// Initialize COM and attach to the local WIA service.
    pub fn connect() -> Result<Self> {
        let com = ComGuard::new()?;
        let devmgr: IWiaDevMgr = unsafe {
            CoCreateInstance(&WiaDevMgr, None, CLSCTX_LOCAL_SERVER)
                .map_err(|e| Error::ServiceUnavailable(format!("{}", e)))?
        };
        debug!("attached to the local image acquisition service");
        Ok(Self { devmgr, _com: com })
    }
}

impl service::DeviceManager for Manager {
    fn devices(&self) -> Result<Vec<Box<dyn service::DeviceEntry>>> {
        unsafe {
            let enumerator: IEnumWIA_DEV_INFO = self
                .devmgr
                .EnumDeviceInfo(WIA_DEVINFO_ENUM_LOCAL)
                .map_err(|e| Error::Enumeration(format!("{}", e)))?;

            let mut entries: Vec<Box<dyn service::DeviceEntry>> = Vec::new();
            loop {
                let mut slot: [Option<IWiaPropertyStorage>; 1] = [None];
                let mut fetched = 0u32;
                let hr = enumerator.Next(&mut slot, &mut fetched);
                if fetched == 0 {
                    break;
                }
                if let Some(storage) = slot[0].take() {
                    entries.push(Box::new(Entry {
                        devmgr: self.devmgr.clone(),
                        storage,
                    }));
                }
                if hr.is_err() {
                    break;
                }
            }

            debug!("enumerated {} registered imaging devices", entries.len());
            Ok(entries)
        }
    }
}

/// One registered device, not yet connected.
struct Entry {
    devmgr: IWiaDevMgr,
    storage: IWiaPropertyStorage,
}

impl service::DeviceEntry for Entry {
    fn properties(&self) -> Result<Vec<Box<dyn service::Property>>> {
        unsafe { walk_properties(&self.storage) }
    }

    fn connect(&self) -> Result<Box<dyn service::Device>> {
        unsafe {
            let id = match read_property(&self.storage, WIA_DIP_DEV_ID, VT_BSTR)
                .map_err(|e| Error::Connect(e.to_string()))?
            {
                Value::Text(id) => id,
                other => {
                    return Err(Error::Connect(format!("device id came back as {}", other)))
                }
            };

            let id = BSTR::from(id.as_str());
            let root: IWiaItem = self
                .devmgr
                .CreateDevice(&id)
                .map_err(|e| Error::Connect(format!("{}", e)))?;
            Ok(Box::new(Device { root }))
        }
    }
}

/// A connected device, rooted at its WIA item tree.
struct Device {
    root: IWiaItem,
}

impl service::Device for Device {
    fn items(&self) -> Result<Vec<Box<dyn service::DeviceItem>>> {
        unsafe {
            let enumerator: IEnumWiaItem = self
                .root
                .EnumChildItems()
                .map_err(|e| Error::Enumeration(format!("child items: {}", e)))?;

            let mut items: Vec<Box<dyn service::DeviceItem>> = Vec::new();
            loop {
                let mut slot: [Option<IWiaItem>; 1] = [None];
                let mut fetched = 0u32;
                let hr = enumerator.Next(&mut slot, &mut fetched);
                if fetched == 0 {
                    break;
                }
                if let Some(item) = slot[0].take() {
                    match item.cast::<IWiaPropertyStorage>() {
                        Ok(storage) => {
                            let name = match read_property(&storage, WIA_IPA_ITEM_NAME, VT_BSTR) {
                                Ok(Value::Text(name)) => name,
                                _ => format!("Item {}", items.len() + 1),
                            };
                            items.push(Box::new(Item { storage, name }));
                        }
                        Err(e) => warn!("skipping item without a property storage: {}", e),
                    }
                }
                if hr.is_err() {
                    break;
                }
            }
            Ok(items)
        }
    }
}

struct Item {
    storage: IWiaPropertyStorage,
    name: String,
}

impl service::DeviceItem for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> Result<Vec<Box<dyn service::Property>>> {
        unsafe { walk_properties(&self.storage) }
    }
}

/// One property of a storage, resolved lazily on access.
struct Prop {
    storage: IWiaPropertyStorage,
    name: String,
    propid: u32,
    vt: VARENUM,
}

impl service::Property for Prop {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.propid
    }

    fn data_type(&self) -> u32 {
        u32::from(self.vt.0)
    }

    fn sub_type(&self) -> Result<SubType> {
        let (flags, _) = unsafe { read_attributes(&self.storage, self.propid)? };
        Ok(flags.sub_type())
    }

    fn value(&self) -> Result<Value> {
        unsafe { read_property(&self.storage, self.propid, self.vt) }
    }

    fn range(&self) -> Result<ValueRange> {
        unsafe {
            let (flags, attr) = read_attributes(&self.storage, self.propid)?;
            if !flags.contains(PropAttr::RANGE) {
                return Err(Error::PropertyRead(format!(
                    "{}: no range metadata",
                    self.name
                )));
            }
            decode_range(&attr)
        }
    }

    fn list(&self) -> Result<Vec<Value>> {
        unsafe {
            let (flags, attr) = read_attributes(&self.storage, self.propid)?;
            if !flags.contains(PropAttr::LIST) {
                return Err(Error::PropertyRead(format!(
                    "{}: no list metadata",
                    self.name
                )));
            }
            decode_list(self.vt, &attr)
        }
    }
}

/// Enumerate a storage into lazily-read property handles.
unsafe fn walk_properties(
    storage: &IWiaPropertyStorage,
) -> Result<Vec<Box<dyn service::Property>>> {
    let enumerator = storage
        .Enum()
        .map_err(|e| Error::PropertyRead(format!("property enumeration: {}", e)))?;

    let mut props: Vec<Box<dyn service::Property>> = Vec::new();
    loop {
        let mut slot = [STATPROPSTG::default()];
        let mut fetched = 0u32;
        let hr = enumerator.Next(&mut slot, &mut fetched);
        if fetched == 0 {
            break;
        }

        let stat = &slot[0];
        let name = if stat.lpwstrName.is_null() {
            format!("Property {}", stat.propid)
        } else {
            let text = stat.lpwstrName.to_string().unwrap_or_default();
            CoTaskMemFree(Some(stat.lpwstrName.0 as *const _));
            text
        };

        props.push(Box::new(Prop {
            storage: storage.clone(),
            name,
            propid: stat.propid,
            vt: stat.vt,
        }));

        if hr.is_err() {
            break;
        }
    }
    Ok(props)
}

fn propspec(propid: u32) -> PROPSPEC {
    PROPSPEC {
        ulKind: PRSPEC_PROPID,
        Anonymous: PROPSPEC_0 { propid },
    }
}

unsafe fn read_property(
    storage: &IWiaPropertyStorage,
    propid: u32,
    vt: VARENUM,
) -> Result<Value> {
    let mut value = PROPVARIANT::default();
    storage
        .ReadMultiple(&[propspec(propid)], &mut value)
        .map_err(|e| Error::PropertyRead(format!("{}", e)))?;
    decode_value(vt, &value)
}

unsafe fn read_attributes(
    storage: &IWiaPropertyStorage,
    propid: u32,
) -> Result<(PropAttr, PROPVARIANT)> {
    let mut flags = 0u32;
    let mut attr = PROPVARIANT::default();
    storage
        .GetPropertyAttributes(&[propspec(propid)], &mut flags, &mut attr)
        .map_err(|e| Error::PropertyRead(format!("attributes: {}", e)))?;
    Ok((PropAttr::from_bits_retain(flags), attr))
}

fn is_text(vt: VARENUM) -> bool {
    matches!(vt, VT_BSTR | VT_LPWSTR | VT_LPSTR)
}

unsafe fn decode_value(vt: VARENUM, value: &PROPVARIANT) -> Result<Value> {
    match vt {
        VT_BOOL => {
            let flag = PropVariantToBoolean(value)
                .map_err(|e| Error::PropertyRead(format!("{}", e)))?;
            Ok(Value::Bool(flag.as_bool()))
        }
        VT_I1 | VT_I2 | VT_I4 | VT_I8 | VT_INT | VT_UI1 | VT_UI2 | VT_UI4 | VT_UI8 | VT_UINT => {
            let n = PropVariantToInt64(value).map_err(|e| Error::PropertyRead(format!("{}", e)))?;
            Ok(Value::Int(n))
        }
        VT_R4 | VT_R8 => {
            let x = PropVariantToDouble(value).map_err(|e| Error::PropertyRead(format!("{}", e)))?;
            Ok(Value::Float(x))
        }
        _ => decode_text(value),
    }
}

/// Render any remaining variant kind through the shell string conversion.
unsafe fn decode_text(value: &PROPVARIANT) -> Result<Value> {
    let pwstr = PropVariantToStringAlloc(value)
        .map_err(|e| Error::PropertyRead(format!("unsupported value: {}", e)))?;
    let text = pwstr.to_string().unwrap_or_default();
    CoTaskMemFree(Some(pwstr.0 as *const _));
    Ok(Value::Text(text))
}

unsafe fn decode_range(attr: &PROPVARIANT) -> Result<ValueRange> {
    let count = PropVariantGetElementCount(attr);
    if count <= WIA_RANGE_STEP {
        return Err(Error::PropertyRead(format!(
            "range vector holds {} elements",
            count
        )));
    }

    let min = PropVariantGetInt64Elem(attr, WIA_RANGE_MIN)
        .map_err(|e| Error::PropertyRead(format!("range minimum: {}", e)))?;
    let max = PropVariantGetInt64Elem(attr, WIA_RANGE_MAX)
        .map_err(|e| Error::PropertyRead(format!("range maximum: {}", e)))?;
    let step = PropVariantGetInt64Elem(attr, WIA_RANGE_STEP)
        .map_err(|e| Error::PropertyRead(format!("range step: {}", e)))?;
    Ok(ValueRange { min, max, step })
}

unsafe fn decode_list(vt: VARENUM, attr: &PROPVARIANT) -> Result<Vec<Value>> {
    let stored = PropVariantGetElementCount(attr);
    if stored <= WIA_LIST_VALUES {
        return Ok(Vec::new());
    }
    let available = stored - WIA_LIST_VALUES;

    // Drivers declare how many of the trailing elements are legal values.
    let declared = match PropVariantGetInt64Elem(attr, WIA_LIST_COUNT) {
        Ok(n) if n >= 0 => n as u32,
        _ => available,
    };
    let count = declared.min(available);

    let mut values = Vec::with_capacity(count as usize);
    for i in 0..count {
        let elem = WIA_LIST_VALUES + i;
        if is_text(vt) {
            let pwstr = PropVariantGetStringElem(attr, elem)
                .map_err(|e| Error::PropertyRead(format!("list element {}: {}", i, e)))?;
            let text = pwstr.to_string().unwrap_or_default();
            CoTaskMemFree(Some(pwstr.0 as *const _));
            values.push(Value::Text(text));
        } else {
            let n = PropVariantGetInt64Elem(attr, elem)
                .map_err(|e| Error::PropertyRead(format!("list element {}: {}", i, e)))?;
            values.push(Value::Int(n));
        }
    }
    Ok(values)
}
