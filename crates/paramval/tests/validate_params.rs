//! Integration tests: end-to-end validation through the public API.
//!
//! Covers one case per built-in rule, the field-skipping policy, failure
//! aggregation, structural recursion, and custom rule registration.

use paramval::{Engine, Error, Failure, FieldKey, RuleRegistry, RuleSet, ValidationError};
use serde_json::{json, Value};

fn validate(registry: &RuleRegistry, data: Value, rules: Value) -> Result<(), ValidationError> {
    let rules = RuleSet::from_value(&rules).expect("rule set should compile");
    match Engine::new(registry).validate(&data, &rules) {
        Ok(()) => Ok(()),
        Err(Error::Invalid(report)) => Err(report),
        Err(other) => panic!("Expected Invalid, got: {other}"),
    }
}

fn first_failure(data: Value, rules: Value) -> Failure {
    let registry = RuleRegistry::new();
    let report = validate(&registry, data, rules).unwrap_err();
    report.into_failures().remove(0)
}

#[test]
fn test_required() {
    let failure = first_failure(json!({}), json!({"x": {"required": true}}));
    assert_eq!(failure.key, FieldKey::parse("x"));
    assert_eq!(failure.message, "x is required");
}

#[test]
fn test_required_no_error() {
    let registry = RuleRegistry::new();
    validate(&registry, json!({"x": 1}), json!({"x": {"required": true}})).unwrap();
}

#[test]
fn test_each_builtin_rule_reports_its_field() {
    let cases = [
        (json!({"x": 1}), json!({"x": {"absent": true}})),
        (json!({"x": ""}), json!({"x": {"not_blank": true}})),
        (json!({"x": 1}), json!({"x": {"not_included_in": [1]}})),
        (json!({"x": 1}), json!({"x": {"included_in": [2]}})),
        (json!({"x": "x"}), json!({"x": {"format": "y"}})),
        (json!({"x": "x"}), json!({"x": {"is_integer": true}})),
        (json!({"x": "x"}), json!({"x": {"is_float": true}})),
        (json!({"x": []}), json!({"x": {"min_length": 2}})),
        (json!({"x": [1, 2, 3]}), json!({"x": {"max_length": 2}})),
        (json!({"x": [1, 2, 3, 4]}), json!({"x": {"length_range": [1, 3]}})),
        (json!({"x": [1, 2]}), json!({"x": {"length_equals": 1}})),
        (json!({"x": 1}), json!({"x": {"equals": 2}})),
        (json!({"x": 1}), json!({"x": {"min": 2}})),
        (json!({"x": 4}), json!({"x": {"max": 2}})),
        (json!({"x": 1}), json!({"x": {"in_range": [2, 4]}})),
        (json!({"x": {}}), json!({"x": {"is_array": true}})),
        (json!({"x": []}), json!({"x": {"is_hash": true}})),
        (json!({"x": "{"}), json!({"x": {"is_json": true}})),
        (json!({"x": 1.5}), json!({"x": {"is_a": ["integer", "string"]}})),
    ];
    for (data, rules) in cases {
        let expected_rule = rules["x"]
            .as_object()
            .and_then(|m| m.keys().next().cloned())
            .unwrap();
        let failure = first_failure(data, rules);
        assert_eq!(failure.key.as_str(), "x");
        assert_eq!(failure.rule, expected_rule);
    }
}

#[test]
fn test_max_reports_single_failure_named_max() {
    let registry = RuleRegistry::new();
    validate(&registry, json!({"x": 1}), json!({"x": {"max": 2}})).unwrap();
    let report = validate(&registry, json!({"x": 4}), json!({"x": {"max": 2}})).unwrap_err();
    assert_eq!(report.len(), 1);
    assert_eq!(report.failures()[0].rule, "max");
}

#[test]
fn test_in_range_failure_keeps_value() {
    let failure = first_failure(json!({"x": 1}), json!({"x": {"in_range": [2, 4]}}));
    assert_eq!(failure.value, json!(1));
}

#[test]
fn test_equality_rules_ignore_number_representation() {
    let registry = RuleRegistry::new();
    validate(
        &registry,
        json!({"x": 1.0, "y": 2.0, "z": [1.0, {"n": 3}]}),
        json!({
            "x": {"equals": 1},
            "y": {"included_in": [1, 2]},
            "z": {"equals": [1, {"n": 3.0}]},
        }),
    )
    .unwrap();
    let report = validate(
        &registry,
        json!({"y": 2.0}),
        json!({"y": {"not_included_in": [2]}}),
    )
    .unwrap_err();
    assert_eq!(report.message(), "y must not be included in 2");
}

#[test]
fn test_message_override() {
    let failure = first_failure(
        json!({"x": 1}),
        json!({"x": {"equals": 2, "message": "x is required"}}),
    );
    assert_eq!(failure.message, "x is required");
}

#[test]
fn test_two_failing_rules_on_one_field_in_declaration_order() {
    let registry = RuleRegistry::new();
    let report = validate(
        &registry,
        json!({"x": "abcd"}),
        json!({"x": {"max_length": 2, "is_integer": true}}),
    )
    .unwrap_err();
    let rules: Vec<&str> = report.failures().iter().map(|f| f.rule.as_str()).collect();
    assert_eq!(rules, ["max_length", "is_integer"]);
    assert_eq!(
        report.to_string(),
        "x must have at most 2 elements\nx should be an integer"
    );
}

#[test]
fn test_failures_across_fields_are_all_reported() {
    let registry = RuleRegistry::new();
    let report = validate(
        &registry,
        json!({"amount": -5, "currency": "XYZ"}),
        json!({
            "amount": {"required": true, "min": 0},
            "currency": {"included_in": ["USD", "EUR"]},
            "note": {"required": true},
        }),
    )
    .unwrap_err();
    let keys: Vec<&str> = report.failures().iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, ["amount", "currency", "note"]);
    assert_eq!(
        report.message(),
        "amount must be at least 0\ncurrency must be one of USD, EUR\nnote is required"
    );
}

#[test]
fn test_array_of_hashes_message() {
    let registry = RuleRegistry::new();
    let report = validate(
        &registry,
        json!([{"x": 1}, {"x": "hi"}]),
        json!({"root": {"array_of_hashes": {"x": {"is_integer": true}}}}),
    )
    .unwrap_err();
    assert_eq!(report.message(), "x should be an integer");
    assert_eq!(report.failures()[0].elements[0].index, 1);
}

#[test]
fn test_array_of_hashes_success() {
    let registry = RuleRegistry::new();
    validate(
        &registry,
        json!([{"x": 1}, {"x": 1}]),
        json!({"root": {"array_of_hashes": {"x": {"is_integer": true}}}}),
    )
    .unwrap();
}

#[test]
fn test_array_of_hashes_with_integer_keyed_elements() {
    // Elements built with integer keys normalise to the same field name.
    let registry = RuleRegistry::new();
    let mut first = std::collections::BTreeMap::new();
    first.insert(1u8, 10);
    let second = json!({"1": 11});
    let data = json!([paramval::to_data(&first).unwrap(), second]);
    validate(
        &registry,
        data,
        json!({"root": {"array_of_hashes": {"1": {"is_integer": true}}}}),
    )
    .unwrap();
}

#[test]
fn test_add_validator() {
    let mut registry = RuleRegistry::new();
    registry
        .register_validator("dollars", |val, _, _| {
            val.as_str().is_some_and(|s| {
                let (whole, cents) = s.split_once('.').unwrap_or((s, "00"));
                !whole.is_empty()
                    && whole.bytes().all(|b| b.is_ascii_digit())
                    && cents.len() == 2
                    && cents.bytes().all(|b| b.is_ascii_digit())
            })
        })
        .unwrap();
    validate(&registry, json!({"x": "12.50"}), json!({"x": {"dollars": true}})).unwrap();
    let report =
        validate(&registry, json!({"x": "hi"}), json!({"x": {"dollars": true}})).unwrap_err();
    assert_eq!(report.failures()[0].rule, "dollars");
}

#[test]
fn test_set_message() {
    let mut registry = RuleRegistry::new();
    registry
        .register_validator("dollars", |val, _, _| {
            val.as_str().is_some_and(|s| s.parse::<f64>().is_ok())
        })
        .unwrap();
    registry
        .register_message("dollars", |ctx| format!("{} must be a dollar amount", ctx.key))
        .unwrap();
    let report =
        validate(&registry, json!({"x": "hi"}), json!({"x": {"dollars": true}})).unwrap_err();
    assert_eq!(report.message(), "x must be a dollar amount");
}

#[test]
fn test_report_serializes_to_json() {
    let registry = RuleRegistry::new();
    let report = validate(&registry, json!({"x": 4}), json!({"x": {"max": 2}})).unwrap_err();
    assert_eq!(
        report.to_json(),
        json!({
            "message": "x must be at most 2",
            "failures": [
                {"key": "x", "value": 4, "rule": "max", "message": "x must be at most 2"}
            ]
        })
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    const OPTIONAL_RULE_COUNT: usize = 6;

    /// Rules that never inspect a missing field unless `required` is set.
    fn optional_rule(i: usize) -> (&'static str, Value) {
        match i {
            0 => ("min", json!(0)),
            1 => ("max_length", json!(3)),
            2 => ("is_integer", json!(true)),
            3 => ("format", json!("^a")),
            4 => ("included_in", json!([1, 2])),
            _ => ("absent", json!(true)),
        }
    }

    fn optional_rule_set() -> impl Strategy<Value = Value> {
        let key = "[a-z]{1,6}".prop_filter("root is reserved", |k| k != "root");
        prop::collection::btree_map(
            key,
            prop::collection::vec(0..OPTIONAL_RULE_COUNT, 1..4),
            0..6,
        )
        .prop_map(|fields| {
            let map: serde_json::Map<String, Value> = fields
                .into_iter()
                .map(|(key, rules)| {
                    let spec: serde_json::Map<String, Value> = rules
                        .into_iter()
                        .map(|i| {
                            let (name, arg) = optional_rule(i);
                            (name.to_string(), arg)
                        })
                        .collect();
                    (key, Value::Object(spec))
                })
                .collect();
            Value::Object(map)
        })
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z0-9]{0,8}".prop_map(Value::String),
        ]
    }

    proptest! {
        /// Without `required`, a rule set is vacuously satisfied by data
        /// that supplies none of its keys.
        #[test]
        fn absent_fields_always_valid(rules in optional_rule_set()) {
            let registry = RuleRegistry::new();
            let rules = RuleSet::from_value(&rules).unwrap();
            let ok = Engine::new(&registry).validate(&json!({}), &rules).is_ok();
            prop_assert!(ok);
        }

        /// `required` and `absent` are exact complements.
        #[test]
        fn required_and_absent_complement(value in prop::option::of(scalar())) {
            let registry = RuleRegistry::new();
            let data = match &value {
                Some(v) => json!({"x": v}),
                None => json!({}),
            };
            let required = validate(&registry, data.clone(), json!({"x": {"required": true}}));
            let absent = validate(
                &registry,
                data,
                json!({"x": {"required": true, "absent": true}}),
            );
            // With both declared exactly one of them fails.
            prop_assert_eq!(absent.unwrap_err().len(), 1);
            prop_assert_eq!(required.is_ok(), value.is_some());
        }

        /// Length rules count elements uniformly across strings, arrays,
        /// and maps.
        #[test]
        fn length_counts_elements(n in 0usize..8) {
            let registry = RuleRegistry::new();
            let text = "a".repeat(n);
            let list: Vec<u8> = vec![0; n];
            let map: serde_json::Map<String, Value> =
                (0..n).map(|i| (i.to_string(), json!(i))).collect();
            for value in [json!(text), json!(list), Value::Object(map)] {
                let ok = validate(
                    &registry,
                    json!({"x": value}),
                    json!({"x": {"length_equals": n}}),
                ).is_ok();
                prop_assert!(ok);
            }
        }

        /// `equals` compares structure, not identity.
        #[test]
        fn equals_is_structural(items in prop::collection::vec(any::<i32>(), 0..5)) {
            let registry = RuleRegistry::new();
            let expected = json!({"items": items.clone()});
            let actual = json!({"items": items});
            let ok = validate(
                &registry,
                json!({"x": actual}),
                json!({"x": {"equals": expected}}),
            ).is_ok();
            prop_assert!(ok);
        }
    }
}
