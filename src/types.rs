use std::fmt;

/// Scalar property value as reported by the acquisition service.
///
/// Drivers hand back heterogeneous scalars; anything the backend cannot map
/// onto one of these shapes is carried as `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Constraint form of a property's legal values.
///
/// Tag numbering follows the service wire values; tags this crate does not
/// know are preserved as `Unknown` rather than rejected.
#[rustfmt::skip]
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubType {
    Unspecified = 0,
    Range       = 1,
    List        = 2,
    Flag        = 3,

    Unknown(u32),
}

impl From<u32> for SubType {
    fn from(repr: u32) -> Self {
        match repr {
            0 => Self::Unspecified,
            1 => Self::Range,
            2 => Self::List,
            3 => Self::Flag,
            repr => Self::Unknown(repr),
        }
    }
}

impl From<SubType> for u32 {
    fn from(t: SubType) -> Self {
        match t {
            SubType::Unspecified => 0,
            SubType::Range => 1,
            SubType::List => 2,
            SubType::Flag => 3,
            SubType::Unknown(t) => t,
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Inclusive numeric range with a positive step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

/// Legal-value metadata attached to a feature according to its sub-type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    None,
    Range(ValueRange),
    List(Vec<Value>),
}

/// Structured description of one item property.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    /// Property tag assigned by the driver.
    pub id: u32,
    /// Current value.
    pub value: Value,
    /// Variant type tag of the stored value.
    pub data_type: u32,
    /// Constraint form announced by the driver.
    pub sub_type: SubType,
    /// Range bounds or legal values, populated per the sub-type.
    pub constraint: Constraint,
}

impl fmt::Display for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID {}, Value {}, Type {}, SubType {}",
            self.id, self.value, self.data_type, self.sub_type
        )?;
        match &self.constraint {
            Constraint::None => Ok(()),
            Constraint::Range(r) => {
                write!(f, ", Min {}, Max {}, Step {}", r.min, r.max, r.step)
            }
            Constraint::List(values) => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, ", Values [{}]", rendered.join(", "))
            }
        }
    }
}

/// One entry of the supported-features mapping.
///
/// A failed read degrades the entry to the error text instead of dropping the
/// key, so one bad property never hides the rest of the enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureEntry {
    Feature(FeatureDescriptor),
    Unreadable(String),
}

impl fmt::Display for FeatureEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureEntry::Feature(desc) => desc.fmt(f),
            FeatureEntry::Unreadable(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_type_round_trip() {
        for repr in [0u32, 1, 2, 3, 42] {
            assert_eq!(u32::from(SubType::from(repr)), repr);
        }
        assert_eq!(SubType::from(1), SubType::Range);
        assert_eq!(SubType::from(2), SubType::List);
        assert_eq!(SubType::from(42), SubType::Unknown(42));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(300).to_string(), "300");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Text("HP Scanner".into()).to_string(), "HP Scanner");
    }

    #[test]
    fn test_descriptor_display_range() {
        let desc = FeatureDescriptor {
            id: 6147,
            value: Value::Int(300),
            data_type: 3,
            sub_type: SubType::Range,
            constraint: Constraint::Range(ValueRange {
                min: 100,
                max: 1200,
                step: 100,
            }),
        };
        assert_eq!(
            desc.to_string(),
            "ID 6147, Value 300, Type 3, SubType Range, Min 100, Max 1200, Step 100"
        );
    }

    #[test]
    fn test_descriptor_display_list() {
        let desc = FeatureDescriptor {
            id: 4106,
            value: Value::Int(1),
            data_type: 3,
            sub_type: SubType::List,
            constraint: Constraint::List(vec![Value::Int(1), Value::Int(2), Value::Int(4)]),
        };
        assert_eq!(
            desc.to_string(),
            "ID 4106, Value 1, Type 3, SubType List, Values [1, 2, 4]"
        );
    }

    #[test]
    fn test_descriptor_display_plain() {
        let desc = FeatureDescriptor {
            id: 4104,
            value: Value::Text("flatbed".into()),
            data_type: 8,
            sub_type: SubType::Unspecified,
            constraint: Constraint::None,
        };
        let line = desc.to_string();
        assert_eq!(line, "ID 4104, Value flatbed, Type 8, SubType Unspecified");
        assert!(!line.contains("Min"));
        assert!(!line.contains("Values"));
    }
}
