//! Property tests for placeholder substitution and compilation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use common::model::case_record::CaseRecord;
use common::model::template::{DocumentTemplate, FieldSpec, FieldType, TemplateCategory};
use proptest::prelude::*;
use requiem_engine::documents::compile::{apply_defaults, compile_at};
use requiem_engine::placeholder::{extract_keys, substitute, unresolved};

const KEYS: [&str; 8] = [
    "FULL_NAME",
    "BIRTH_DATE",
    "DEATH_PLACE",
    "CASE_NUMBER",
    "PARISH",
    "DESTINATION",
    "SERVICE_TIME",
    "CURRENT_DATE",
];

/// Either literal prose or a `{{KEY}}` token.
fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ,.]{0,12}",
        prop::sample::select(KEYS.to_vec()).prop_map(|k| format!("{{{{{}}}}}", k)),
    ]
}

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..12).prop_map(|parts| parts.concat())
}

fn values() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map(
        prop::sample::select(KEYS.to_vec()).prop_map(str::to_string),
        "[a-z]{1,10}",
        0..4,
    )
}

#[test]
fn prop_substitute_leaves_exactly_the_missing_keys() {
    proptest!(|(text in text(), values in values())| {
        let result = substitute(&text, &values);

        let left: BTreeSet<String> = unresolved(&result).into_iter().collect();
        let expected: BTreeSet<String> = extract_keys(&text)
            .into_iter()
            .filter(|k| !values.contains_key(k))
            .collect();
        prop_assert_eq!(left, expected);
    });
}

#[test]
fn prop_substitute_without_values_is_identity() {
    proptest!(|(text in text())| {
        prop_assert_eq!(substitute(&text, &BTreeMap::new()), text);
    });
}

#[test]
fn prop_values_that_look_like_tokens_are_inserted_literally() {
    proptest!(|(key in prop::sample::select(KEYS.to_vec()), inner in "[A-Z]{1,8}")| {
        let value = format!("{{{{{}}}}}", inner);
        let values: BTreeMap<String, String> = [(key.to_string(), value.clone())].into_iter().collect();

        let result = substitute(&format!("<{{{{{}}}}}>", key), &values);

        prop_assert_eq!(result, format!("<{}>", value));
    });
}

/// Declared fields over a subset of the keys, each with a default value.
fn declared_fields() -> impl Strategy<Value = Vec<FieldSpec>> {
    prop::sample::subsequence(KEYS.to_vec(), 0..KEYS.len()).prop_map(|keys| {
        keys.into_iter()
            .map(|k| FieldSpec::new(k.to_lowercase(), k, FieldType::Text).with_default("preset"))
            .collect()
    })
}

#[test]
fn prop_compile_leaves_unmapped_keys_unresolved() {
    let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let record = CaseRecord::new("c-1")
        .with_full_name("Maria Rossi")
        .with_case_number("2024/017");
    let fillable: BTreeSet<&str> = ["FULL_NAME", "CASE_NUMBER", "CURRENT_DATE"].into_iter().collect();

    proptest!(|(content in text(), fields in declared_fields())| {
        let template = DocumentTemplate::new("Generated", TemplateCategory::Other, content.clone())
            .with_fields(fields);
        let document = compile_at(&template, &record, today);

        let left: BTreeSet<String> = unresolved(&document.final_content).into_iter().collect();
        let expected: BTreeSet<String> = extract_keys(&content)
            .into_iter()
            .filter(|k| !fillable.contains(k.as_str()))
            .collect();
        prop_assert_eq!(&left, &expected);
        prop_assert_eq!(document.completed, expected.is_empty());
    });
}

#[test]
fn prop_defaults_resolve_only_declared_keys() {
    let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let record = CaseRecord::new("c-1").with_full_name("Maria Rossi");

    proptest!(|(content in text(), fields in declared_fields())| {
        let declared: BTreeSet<String> = fields.iter().map(|f| f.key.clone()).collect();
        let template = DocumentTemplate::new("Generated", TemplateCategory::Other, content)
            .with_fields(fields);
        let mut document = compile_at(&template, &record, today);
        let before: BTreeSet<String> = unresolved(&document.final_content).into_iter().collect();

        apply_defaults(&mut document);

        let after: BTreeSet<String> = unresolved(&document.final_content).into_iter().collect();
        let expected: BTreeSet<String> = before.difference(&declared).cloned().collect();
        prop_assert_eq!(after, expected);
    });
}
