use serde_json::Value;

use crate::decentlab::FieldValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text form used when the cell serves as a join key.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(v) => Some(v.to_string()),
            Cell::Int(v) => Some(v.to_string()),
            Cell::Float(v) if v.is_nan() => None,
            Cell::Float(v) => Some(v.to_string()),
            Cell::Text(v) => Some(v.clone()),
        }
    }

    /// CSV rendering. Missing values, `NaN` included, are written empty.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Float(v) if v.is_nan() => String::new(),
            other => other.as_key().unwrap_or_default(),
        }
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(v) => Cell::Bool(*v),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Cell::Int(v),
                None => n.as_f64().map_or(Cell::Null, Cell::Float),
            },
            Value::String(s) => Cell::Text(s.clone()),
            nested => Cell::Text(nested.to_string()),
        }
    }
}

impl From<&FieldValue> for Cell {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Scalar(v) => Cell::Int(*v),
            FieldValue::Quantity { value, .. } => Cell::Float(*value),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(Cell::from(&json!(21670)), Cell::Int(21670));
        assert_eq!(Cell::from(&json!(3.095)), Cell::Float(3.095));
        assert_eq!(Cell::from(&json!("DEC0054A6")), Cell::Text("DEC0054A6".into()));
        assert_eq!(Cell::from(&json!(null)), Cell::Null);
        assert_eq!(Cell::from(&json!([1, 2])), Cell::Text("[1,2]".into()));
    }

    #[test]
    fn test_to_field() {
        assert_eq!(Cell::Float(f64::NAN).to_field(), "");
        assert_eq!(Cell::Null.to_field(), "");
        assert_eq!(Cell::Float(3.095).to_field(), "3.095");
        assert_eq!(Cell::Int(-4).to_field(), "-4");
        assert_eq!(Cell::Bool(true).to_field(), "true");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Cell::from(None::<i64>), Cell::Null);
        assert_eq!(Cell::from(Some("x")), Cell::Text("x".into()));
    }
}
