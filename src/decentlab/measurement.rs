use indexmap::IndexMap;
use serde::Serialize;

pub const DEVICE_ID: &str = "Device ID";
pub const PROTOCOL_VERSION: &str = "Protocol version";

/// A decoded field: either a bare number or a value with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(i64),
    Quantity {
        value: f64,
        unit: Option<&'static str>,
    },
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Scalar(v) => *v as f64,
            FieldValue::Quantity { value, .. } => *value,
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::Quantity { unit, .. } => *unit,
        }
    }
}

/// Decoded form of one packet payload, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Measurement {
    fields: IndexMap<String, FieldValue>,
}

impl Measurement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn device_id(&self) -> Option<i64> {
        match self.fields.get(DEVICE_ID) {
            Some(FieldValue::Scalar(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a Measurement {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = indexmap::map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
