use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::DriverError;
use crate::models::{ColumnDescriptor, Row};
use crate::types::{Value, WireType};

/// One statement placeholder on the wire: a string rendering of the
/// value plus its single-character type code. A null parameter carries a
/// JSON null value, never the text "null".
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Parameter {
    pub value: Option<String>,
    #[serde(rename = "type")]
    pub type_code: String,
}

/// Render a native value into its wire parameter form.
pub fn encode_param(value: &Value) -> Parameter {
    let type_code = value.infer_wire_type().code().to_string();
    let rendered = match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Text(s) => Some(s.clone()),
        // The peer's formats: ISO date, ISO time, and "date space time",
        // fractional seconds only when present.
        Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
        Value::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Bytes(b) => Some(bytes_to_latin1(b)),
    };
    Parameter {
        value: rendered,
        type_code,
    }
}

pub fn encode_params(values: &[Value]) -> Vec<Parameter> {
    values.iter().map(encode_param).collect()
}

/// Decode one result cell guided by its column kind.
///
/// Malformed cells never abort the fetch: any value that fails to parse
/// as the declared kind comes back as the raw text instead.
pub fn decode_cell(cell: &Json, kind: WireType) -> Value {
    let text = match cell {
        Json::Null => return Value::Null,
        Json::String(s) => s.as_str(),
        // The peer serializes every non-null cell as a string; anything
        // else is kept as its JSON rendering.
        other => return Value::Text(other.to_string()),
    };
    match kind {
        WireType::Integer => text
            .parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(text.to_string())),
        WireType::Boolean => text
            .parse::<i64>()
            .map(|n| Value::Bool(n == 1))
            .unwrap_or_else(|_| Value::Text(text.to_string())),
        WireType::Number => decode_number(text),
        WireType::Date => parse_date_loose(text)
            .map(Value::Date)
            .unwrap_or_else(|| Value::Text(text.to_string())),
        WireType::Time => parse_time_loose(text)
            .map(Value::Time)
            .unwrap_or_else(|| Value::Text(text.to_string())),
        WireType::DateTime => parse_datetime_loose(text)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(text.to_string())),
        WireType::Binary => latin1_to_bytes(text)
            .map(Value::Bytes)
            .unwrap_or_else(|| Value::Text(text.to_string())),
        WireType::Text | WireType::RowId => Value::Text(text.to_string()),
    }
}

/// Decode one wire row against the active description. A length mismatch
/// means the peer and this driver disagree about the result shape.
pub fn decode_row(cells: &[Json], desc: &[ColumnDescriptor]) -> Result<Row, DriverError> {
    if cells.len() != desc.len() {
        return Err(DriverError::Protocol(format!(
            "row has {} values but description has {} columns",
            cells.len(),
            desc.len()
        )));
    }
    Ok(cells
        .iter()
        .zip(desc)
        .map(|(cell, col)| decode_cell(cell, col.kind))
        .collect())
}

/// Decode a fetch response body (an array of arrays) into typed rows.
pub fn decode_rows(body: &Json, desc: &[ColumnDescriptor]) -> Result<Vec<Row>, DriverError> {
    let rows = body
        .as_array()
        .ok_or_else(|| DriverError::Protocol("fetch response is not an array".to_string()))?;
    rows.iter()
        .map(|row| {
            let cells = row.as_array().ok_or_else(|| {
                DriverError::Protocol("fetched row is not an array".to_string())
            })?;
            decode_row(cells, desc)
        })
        .collect()
}

// NUMBER cells hold integers or reals; the marker characters match what
// the peer's own parser looks for before choosing a float parse.
fn decode_number(text: &str) -> Value {
    let looks_real = text.contains(&['.', ',', 'e', 'E', 'f'][..]);
    if looks_real {
        text.parse::<f64>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::Text(text.to_string()))
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(text.to_string()))
    }
}

fn parse_datetime_loose(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    // A bare date is a valid datetime at midnight.
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_date_loose(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime_loose(text).map(|dt| dt.date()))
}

fn parse_time_loose(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    for fmt in ["%H:%M:%S%.f", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(text, fmt) {
            return Some(t);
        }
    }
    parse_datetime_loose(text).map(|dt| dt.time())
}

// Binary cells travel as latin-1 text: one byte per codepoint.
fn bytes_to_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn latin1_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}
