use serde::Deserialize;

use crate::types::{Value, WireType};

/// One result column as reported by the describe endpoint.
#[derive(Debug, Deserialize)]
pub struct WireColumn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub r#type: String,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
}

/// Parsed column metadata: `(name, kind, precision, scale)`.
///
/// Valid only between an execute and the next execute/nextset/close on
/// the owning cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: WireType,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
}

impl From<WireColumn> for ColumnDescriptor {
    fn from(col: WireColumn) -> Self {
        ColumnDescriptor {
            name: col.name,
            kind: WireType::from_code(&col.r#type),
            precision: col.precision,
            scale: col.scale,
        }
    }
}

/// An ordered sequence of typed values, one per result column.
pub type Row = Vec<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_column_parses() {
        let col: WireColumn =
            serde_json::from_str(r#"{"name": "m", "type": "S", "precision": 10, "scale": 0}"#)
                .unwrap();
        let desc = ColumnDescriptor::from(col);
        assert_eq!(desc.name, "m");
        assert_eq!(desc.kind, WireType::Text);
        assert_eq!(desc.precision, Some(10));
        assert_eq!(desc.scale, Some(0));
    }

    #[test]
    fn test_wire_column_tolerates_missing_fields() {
        let col: WireColumn = serde_json::from_str(r#"{"name": "n"}"#).unwrap();
        let desc = ColumnDescriptor::from(col);
        assert_eq!(desc.kind, WireType::Text);
        assert!(desc.precision.is_none());
    }
}
