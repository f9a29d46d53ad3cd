//! Records built from and exported to typed structs.

#[cfg(test)]
mod tests {
    use pathstore_core::{Record, Schema};
    use pathstore_model::{Condition, Operator, Query, Value};
    use serde::{Deserialize, Serialize};

    use crate::{lit, prop};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Address {
        city: String,
        #[serde(rename = "postCode")]
        post_code: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Account {
        user_name: String,
        #[serde(skip)]
        password: String,
        age: u32,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        roles: Vec<String>,
        manager: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        nickname: Option<String>,
        address: Option<Address>,
    }

    fn account() -> Account {
        Account {
            user_name: "ann".to_owned(),
            password: "hunter2".to_owned(),
            age: 34,
            roles: vec!["admin".to_owned(), "ops".to_owned()],
            manager: None,
            nickname: None,
            address: Some(Address {
                city: "Oslo".to_owned(),
                post_code: "0150".to_owned(),
            }),
        }
    }

    #[test]
    fn test_should_flatten_struct_without_skipped_fields() {
        let record = Record::from_serialize(&account()).unwrap();
        assert!(!record.contains("password"));
        assert!(record.contains("manager"));
        assert!(!record.contains("nickname"));
        assert_eq!(record.get("userName"), Some(&Value::from("ann")));
        assert_eq!(record.get("address.postCode"), Some(&Value::from("0150")));
        assert_eq!(record.get("roles"), Some(&Value::from(r#"["admin","ops"]"#)));
    }

    #[test]
    fn test_should_query_struct_record() {
        let record = Record::from_serialize(&account()).unwrap();
        let query = Query::and(vec![
            Condition::any_of(prop("roles"), vec![lit("admin")]),
            Condition::is_null(prop("manager")),
            Condition::like(prop("address.city"), "O%"),
        ]);
        assert!(record.matches(&query).unwrap());
    }

    #[test]
    fn test_should_roundtrip_struct_through_record() {
        let record = Record::from_serialize(&account()).unwrap();
        let restored: Account = record.to_struct().unwrap();
        assert_eq!(
            restored,
            Account {
                password: String::new(),
                ..account()
            }
        );
    }

    #[test]
    fn test_should_keep_text_fields_textual_under_schema() {
        // A post code that looks numeric stays a string unless declared otherwise.
        let record = Record::from_serialize(&account())
            .unwrap()
            .with_schema(Schema::new().with("address.postCode", "string"));
        let restored: Account = record.to_struct().unwrap();
        assert_eq!(restored.address.unwrap().post_code, "0150");

        let cond = Condition::compare(prop("address.postCode"), Operator::Eq, lit(150));
        assert!(record.matches_condition(&cond).unwrap());
    }
}
