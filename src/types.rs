use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical value kinds understood by the IDE's result-set serializer,
/// each tagged with a single-character wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Integer,
    Boolean,
    Number,
    Text,
    Date,
    Time,
    DateTime,
    Binary,
    RowId,
}

impl WireType {
    /// The one-character tag used on the JSON transport.
    pub fn code(&self) -> char {
        match self {
            WireType::Integer => 'I',
            WireType::Boolean => '1',
            WireType::Number => 'N',
            WireType::Text => 'S',
            WireType::Date => 'D',
            WireType::Time => 'T',
            WireType::DateTime => 'd',
            WireType::Binary => 'b',
            WireType::RowId => 'R',
        }
    }

    /// Unknown codes are treated as plain strings rather than rejected,
    /// so a newer peer can introduce codes without breaking fetches.
    pub fn from_code(code: &str) -> WireType {
        match code {
            "I" => WireType::Integer,
            "1" => WireType::Boolean,
            "N" => WireType::Number,
            "S" => WireType::Text,
            "D" => WireType::Date,
            "T" => WireType::Time,
            "d" => WireType::DateTime,
            "b" | "B" => WireType::Binary,
            "R" => WireType::RowId,
            _ => WireType::Text,
        }
    }
}

/// A native value crossing the driver boundary, either as a statement
/// parameter or as a decoded result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Bytes(Vec<u8>),
}

impl Value {
    /// Classify this value for the wire. Booleans are classified before
    /// the numeric kinds, and a datetime before its date component, so
    /// the most specific kind always wins.
    pub fn infer_wire_type(&self) -> WireType {
        match self {
            Value::Bool(_) => WireType::Boolean,
            Value::Int(_) => WireType::Integer,
            Value::Number(_) => WireType::Number,
            Value::DateTime(_) => WireType::DateTime,
            Value::Date(_) => WireType::Date,
            Value::Time(_) => WireType::Time,
            Value::Bytes(_) => WireType::Binary,
            Value::Null | Value::Text(_) => WireType::Text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
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

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
