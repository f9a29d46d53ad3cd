//! Conversion between records and persisted text rows.
//!
//! The store persists each record as a flat `path -> text` mapping. Types are
//! not stored; they come back through the schema when the row is loaded.

use std::collections::HashMap;

use crate::record::Record;
use crate::schema::Schema;

/// A persisted row: flattened path to canonical text.
pub type RawRow = HashMap<String, String>;

/// Render every non-null field as text. Null fields are omitted.
#[must_use]
pub fn row_to_raw_map(record: &Record) -> RawRow {
    record
        .iter()
        .filter(|(_, cell)| !cell.is_null())
        .map(|(path, cell)| (path.to_owned(), cell.as_string()))
        .collect()
}

/// Load a persisted row, typing its text cells through `schema`.
#[must_use]
pub fn raw_map_to_row(row: RawRow, schema: Schema) -> Record {
    Record::from_flat(row).with_schema(schema)
}

#[cfg(test)]
mod tests {
    use pathstore_model::{TypeTag, Value};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_render_row_as_text() {
        let record = Record::from_value(&Value::from(json!({
            "name": "Ann",
            "age": 30,
            "score": 2.5,
            "active": false,
            "tags": ["x", "y"],
            "manager": null
        })))
        .unwrap();
        let row = row_to_raw_map(&record);
        assert_eq!(row.len(), 5);
        assert_eq!(row["age"], "30");
        assert_eq!(row["score"], "2.5");
        assert_eq!(row["active"], "false");
        assert_eq!(row["tags"], r#"["x","y"]"#);
        assert!(!row.contains_key("manager"));
    }

    #[test]
    fn test_should_type_loaded_row_through_schema() {
        let row = RawRow::from([
            ("age".to_owned(), "30".to_owned()),
            ("score".to_owned(), "2.5".to_owned()),
            ("nick".to_owned(), "7".to_owned()),
        ]);
        let schema = Schema::new().with("age", "int").with("score", "float");
        let record = raw_map_to_row(row, schema);
        assert_eq!(record.get("age"), Some(&Value::Int(30)));
        assert_eq!(record.get("score"), Some(&Value::Float(2.5)));
        assert_eq!(record.get("nick"), Some(&Value::from("7")));
        assert_eq!(record.get_type("nick"), Some(TypeTag::String));
    }

    #[test]
    fn test_should_roundtrip_through_text() {
        let schema = Schema::new().with("age", "int").with("active", "bool");
        let record = Record::from_value(&Value::from(json!({"age": 41, "active": true, "city": "Oslo"})))
            .unwrap()
            .with_schema(schema.clone());
        let loaded = raw_map_to_row(row_to_raw_map(&record), schema);
        assert_eq!(loaded.to_map(), record.to_map());
    }
}
