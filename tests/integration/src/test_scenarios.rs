//! Query scenarios over records built from nested JSON.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pathstore_core::{EvalError, Variables};
    use pathstore_model::{ArithmeticOp, Condition, Operator, Query, Term, Value};
    use serde_json::json;

    use crate::{lit, prop, record};

    #[test]
    fn test_should_match_nested_path_and_numeric_comparison() {
        let record = record(json!({
            "name": "John Doe",
            "age": 30,
            "location": {"city": "New York"}
        }));
        let query = Query::and(vec![
            Condition::compare(prop("location.city"), Operator::Eq, lit("New York")),
            Condition::compare(prop("age"), Operator::Ge, lit(25)),
        ]);
        assert!(record.matches(&query).unwrap());

        let query = Query::and(vec![
            Condition::compare(prop("location.city"), Operator::Eq, lit("New York")),
            Condition::compare(prop("age"), Operator::Ge, lit(31)),
        ]);
        assert!(!record.matches(&query).unwrap());
    }

    #[test]
    fn test_should_store_array_as_text_and_test_membership() {
        let record = record(json!({"tags": ["a", "b", "c"]}));
        assert_eq!(record.get("tags"), Some(&Value::from(r#"["a","b","c"]"#)));

        let in_memory = Value::from(vec!["a", "b", "c"]);
        let contains = Condition::contains(Term::literal(in_memory), lit("b"));
        assert!(record.matches_condition(&contains).unwrap());

        let contains = Condition::contains(prop("tags"), lit("b"));
        assert!(record.matches_condition(&contains).unwrap());

        let any_of = Condition::any_of(prop("tags"), vec![lit("q"), lit("c")]);
        assert!(record.matches_condition(&any_of).unwrap());
    }

    #[test]
    fn test_should_compare_against_bound_variable() {
        let variables = Arc::new(Variables::from([("maxAge".to_owned(), Value::Int(40))]));
        let record = record(json!({"age": 30})).with_variables(variables);

        let query = Query::single(Condition::compare(
            prop("age"),
            Operator::Lt,
            Term::variable("$maxAge"),
        ));
        assert!(record.matches(&query).unwrap());

        let unbound = Query::single(Condition::compare(
            prop("age"),
            Operator::Lt,
            Term::variable("$minAge"),
        ));
        let err = record.matches(&unbound).unwrap_err();
        assert!(matches!(err, EvalError::UnresolvedVariable { ref name } if name == "minAge"));
        assert_eq!(err.to_string(), "unresolved variable: minAge");
    }

    #[test]
    fn test_should_evaluate_parser_shaped_json_query() {
        let query: Query = serde_json::from_value(json!({
            "is_or": true,
            "conditions": [
                {
                    "op": "LIKE",
                    "left": {"kind": "function", "name": "lower", "args": [{"kind": "property", "path": "name"}]},
                    "pattern": "jane%"
                }
            ],
            "sub_queries": [
                {
                    "conditions": [
                        {
                            "op": "BETWEEN",
                            "left": {
                                "kind": "arithmetic",
                                "op": "*",
                                "left": {"kind": "property", "path": "score"},
                                "right": {"kind": "literal", "value": 10}
                            },
                            "start": {"kind": "literal", "value": 70},
                            "end": {"kind": "literal", "value": 80}
                        },
                        {
                            "op": "IS NOT NULL",
                            "left": {"kind": "property", "path": "email"},
                            "negate": true
                        }
                    ]
                }
            ]
        }))
        .unwrap();

        let record = record(json!({"name": "John Doe", "score": 7.5}));
        assert!(record.matches(&query).unwrap());

        let record = crate::record(json!({"name": "John Doe", "score": 7.5, "email": "j@x.io"}));
        assert!(!record.matches(&query).unwrap());

        let record = crate::record(json!({"name": "Jane Roe", "score": "oops"}));
        assert!(record.matches(&query).unwrap());
    }

    #[test]
    fn test_should_negate_whole_conditions() {
        let record = record(json!({"status": "active", "age": 30}));
        let conditions = [
            Condition::is_in(prop("status"), vec![lit("active"), lit("pending")]),
            Condition::compare(prop("age"), Operator::Gt, lit(100)),
            Condition::is_null(prop("deleted_at")),
        ];
        for condition in conditions {
            let plain = record.matches(&Query::single(condition.clone())).unwrap();
            let negated = record.matches(&Query::single(condition.negated())).unwrap();
            assert_eq!(plain, !negated);
        }
    }

    #[test]
    fn test_should_fail_on_zero_divisor_inside_query() {
        let record = record(json!({"total": 10, "count": 0}));
        let avg = Term::arithmetic(prop("total"), ArithmeticOp::Div, prop("count"));
        let query = Query::single(Condition::compare(avg, Operator::Gt, lit(1)));
        assert!(matches!(record.matches(&query), Err(EvalError::DivisionByZero)));

        let guarded = Query::and(vec![
            Condition::compare(prop("count"), Operator::Gt, lit(0)),
            query.conditions[0].clone(),
        ]);
        assert!(!record.matches(&guarded).unwrap());
    }
}
