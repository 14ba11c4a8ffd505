#![allow(dead_code)]

use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for JSON leaves that survive a serialize/parse cycle unchanged
pub fn json_leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-10_000i64..10_000).prop_map(Value::from),
        "[a-zA-Z0-9 _\\-\"\\\\]{0,12}".prop_map(Value::String),
    ]
}

/// Strategy for nested JSON answer payloads
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,6}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Strategy for answer-shaped payloads (top level is always an object)
pub fn answer_payload_strategy() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z_]{1,8}", json_value_strategy(), 1..6)
        .prop_map(|entries| entries.into_iter().collect())
}

/// Strategy for termination reasons other than the two with special handling
pub fn ordinary_termination_reason_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("voluntary_departure".to_string()),
        Just("contract_end".to_string()),
        Just("relocation".to_string()),
        "[a-z_]{0,16}".prop_filter("special reasons handled elsewhere", |reason| {
            reason != "policy_violation" && reason != "performance_issue"
        }),
    ]
}

/// Strategy for calendar dates in a range the rehire rules care about
pub fn date_strategy() -> impl Strategy<Value = chrono::NaiveDate> {
    (2015i32..2035, 1u32..=12, 1u32..=28).prop_map(|(year, month, day)| {
        chrono::NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    })
}
