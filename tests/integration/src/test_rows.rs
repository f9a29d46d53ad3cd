//! Persisted text rows.

#[cfg(test)]
mod tests {
    use pathstore_core::{RawRow, Schema, raw_map_to_row, row_to_raw_map};
    use pathstore_model::{Condition, Operator, Query, TypeTag, Value};
    use serde_json::json;

    use crate::{lit, prop, record};

    fn schema() -> Schema {
        Schema::new()
            .with("age", "int")
            .with("score", "float")
            .with("verified", "bool")
    }

    #[test]
    fn test_should_persist_and_reload_record() {
        let original = record(json!({
            "name": "Ann",
            "age": 34,
            "score": 8.25,
            "verified": true,
            "tags": ["a", "b"],
            "manager": null,
            "address": {"city": "Oslo"}
        }))
        .with_schema(schema());

        let row = row_to_raw_map(&original);
        assert!(!row.contains_key("manager"));
        assert_eq!(row["address.city"], "Oslo");

        let loaded = raw_map_to_row(row, schema());
        assert_eq!(loaded.get("age"), Some(&Value::Int(34)));
        assert_eq!(loaded.get("score"), Some(&Value::Float(8.25)));
        assert_eq!(loaded.get("verified"), Some(&Value::Bool(true)));
        assert_eq!(loaded.get_type("tags"), Some(TypeTag::Array));
        assert!(loaded.get("manager").is_none());

        let query = Query::and(vec![
            Condition::compare(prop("age"), Operator::Gt, lit(30)),
            Condition::compare(prop("verified"), Operator::Eq, lit(true)),
            Condition::contains(prop("tags"), lit("b")),
            Condition::is_null(prop("manager")),
        ]);
        assert!(original.matches(&query).unwrap());
        assert!(loaded.matches(&query).unwrap());
    }

    #[test]
    fn test_should_leave_untyped_text_uncoerced() {
        let row = RawRow::from([("count".to_owned(), "12".to_owned())]);
        let loaded = raw_map_to_row(row, Schema::new());
        assert_eq!(loaded.get("count"), Some(&Value::from("12")));
        assert!(loaded.is_string("count"));

        // Ordering still compares numerically when both sides parse.
        let cond = Condition::compare(prop("count"), Operator::Gt, lit(9));
        assert!(loaded.matches_condition(&cond).unwrap());
    }

    #[test]
    fn test_should_fall_back_to_text_for_bad_typed_cell() {
        let row = RawRow::from([("age".to_owned(), "unknown".to_owned())]);
        let loaded = raw_map_to_row(row, schema());
        assert_eq!(loaded.get("age"), Some(&Value::from("unknown")));
        assert!(loaded.cell("age").unwrap().as_int64().is_err());
        assert!(loaded.is_int("age"));
    }
}
