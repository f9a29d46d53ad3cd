//! A scan loop: one reused record, shared functions and variables.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pathstore_core::{
        EvalError, FunctionRegistry, LikeMode, Record, RecordConfig, Schema, Variables,
    };
    use pathstore_model::{Condition, Operator, Query, Term, Value};
    use serde_json::json;

    use crate::{lit, prop};

    fn nodes() -> Vec<serde_json::Value> {
        vec![
            json!({"id": 1, "name": "Ann", "age": "34", "location": {"city": "Oslo"}}),
            json!({"id": 2, "name": "Bob", "age": "17", "location": {"city": "Bergen"}}),
            json!({"id": 3, "name": "Cid", "age": "52", "location": {"city": "Oslo"}}),
            json!({"id": 4, "name": "Dee", "age": null}),
        ]
    }

    fn initials() -> impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static {
        |args: &[Value]| {
            let [Value::String(name)] = args else {
                return Err(EvalError::function_failed(
                    "initial",
                    anyhow::anyhow!("expected one string argument"),
                ));
            };
            Ok(Value::from(name.chars().take(1).collect::<String>()))
        }
    }

    fn scan(record: &mut Record, query: &Query) -> anyhow::Result<Vec<i64>> {
        let mut hits = Vec::new();
        for node in nodes() {
            record.set_data(&Value::from(node))?;
            if record.matches(query)? {
                hits.push(record.cell("id").map_or(Ok(0), |c| c.as_int64())?);
            }
        }
        Ok(hits)
    }

    #[test]
    fn test_should_scan_with_reused_record() -> anyhow::Result<()> {
        crate::init_tracing();
        let functions = Arc::new(FunctionRegistry::new().with("initial", initials()));
        let variables = Arc::new(Variables::from([("minAge".to_owned(), Value::Int(18))]));
        let mut record = Record::new()
            .with_schema(Schema::new().with("age", "int"))
            .with_functions(Arc::clone(&functions))
            .with_variables(Arc::clone(&variables));

        let adults_in_oslo = Query::and(vec![
            Condition::compare(prop("age"), Operator::Ge, Term::variable("$minAge")),
            Condition::compare(prop("location.city"), Operator::Eq, lit("Oslo")),
        ]);
        assert_eq!(scan(&mut record, &adults_in_oslo)?, vec![1, 3]);

        let by_initial = Query::or(vec![
            Condition::is_in(
                Term::function("initial", vec![prop("name")]),
                vec![lit("B"), lit("D")],
            ),
        ]);
        assert_eq!(scan(&mut record, &by_initial)?, vec![2, 4]);

        let missing_age = Query::single(Condition::is_null(prop("age")));
        assert_eq!(scan(&mut record, &missing_age)?, vec![4]);
        Ok(())
    }

    #[test]
    fn test_should_share_context_between_records() {
        let functions = Arc::new(FunctionRegistry::new().with("initial", initials()));
        let a = crate::record(json!({"name": "Ann"})).with_functions(Arc::clone(&functions));
        let mut b = crate::record(json!({"name": "Bob"})).with_functions(Arc::clone(&functions));
        assert_eq!(Arc::strong_count(&functions), 3);

        b.register_function("shout", |args: &[Value]| -> Result<Value, EvalError> {
            Ok(Value::from(format!("{}!", args.first().cloned().unwrap_or_default())))
        });
        assert!(b.functions().contains("shout"));
        assert!(!a.functions().contains("shout"));
        assert_eq!(Arc::strong_count(&functions), 2);

        let cond = Condition::compare(
            Term::function("shout", vec![prop("name")]),
            Operator::Eq,
            lit("Bob!"),
        );
        assert!(b.matches_condition(&cond).unwrap());
        assert!(matches!(
            a.matches_condition(&cond),
            Err(EvalError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_should_apply_like_mode_from_config() {
        let pattern = Condition::like(prop("name"), "%oh%");
        let record = crate::record(json!({"name": "John"}));
        assert!(record.matches_condition(&pattern).unwrap());

        let exact = Condition::like(prop("name"), "oh");
        assert!(!record.matches_condition(&exact).unwrap());

        let legacy = record.with_config(
            RecordConfig::builder()
                .like_mode(LikeMode::Substring)
                .build(),
        );
        assert!(legacy.matches_condition(&exact).unwrap());
    }
}
