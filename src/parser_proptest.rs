//! Property-based tests for the specification parser.
//!
//! These tests use proptest to generate random specification documents and
//! verify that parsing invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::parser::parse_design_token;
    use proptest::prelude::*;
    use serde_json::{json, Map, Value};

    fn node_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9]{0,6}"
    }

    fn color_token() -> impl Strategy<Value = Value> {
        "[0-9a-f]{6}".prop_map(|hex| json!({"$value": format!("#{hex}"), "$type": "color"}))
    }

    /// Two-level documents: named groups of named color tokens.
    fn document_strategy() -> impl Strategy<Value = Value> {
        let group = prop::collection::btree_map(node_name(), color_token(), 1..5)
            .prop_map(|tokens| Value::Object(tokens.into_iter().collect::<Map<_, _>>()));
        prop::collection::btree_map(node_name(), group, 1..4)
            .prop_map(|groups| Value::Object(groups.into_iter().collect::<Map<_, _>>()))
    }

    proptest! {
        /// Property: parsing is idempotent, the same document always produces
        /// entries with identical keys, raw values and types.
        #[test]
        fn parse_is_idempotent(document in document_strategy()) {
            let first = parse_design_token(&document, None).unwrap();
            let second = parse_design_token(&document, None).unwrap();
            prop_assert_eq!(first.len(), second.len());
            for (name, variable) in &first {
                let other = &second[name];
                prop_assert_eq!(variable.key(None), other.key(None));
                prop_assert_eq!(
                    variable.css_raw_value(&first).unwrap(),
                    other.css_raw_value(&second).unwrap()
                );
                prop_assert_eq!(
                    variable.resolved_type(&first, true).unwrap(),
                    other.resolved_type(&second, true).unwrap()
                );
            }
        }

        /// Property: every typed token renders a raw value without error.
        #[test]
        fn raw_value_always_renders(document in document_strategy()) {
            let set = parse_design_token(&document, None).unwrap();
            for variable in set.values() {
                prop_assert!(variable.css_raw_value(&set).is_ok());
            }
        }

        /// Property: reference names are the dotted ancestor path plus the
        /// token's own name.
        #[test]
        fn reference_names_follow_ancestors(document in document_strategy()) {
            let set = parse_design_token(&document, None).unwrap();
            for (name, variable) in &set {
                let mut segments: Vec<&str> =
                    variable.ancestors.iter().map(String::as_str).collect();
                let own = name.rsplit('.').next().unwrap();
                segments.push(own);
                prop_assert_eq!(name.clone(), segments.join("."));
            }
        }
    }
}
