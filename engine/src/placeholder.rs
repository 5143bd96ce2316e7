//! `{{KEY}}` placeholder handling.
//!
//! This is the only module that knows the token pattern. Keys are upper snake
//! case (`[A-Z_]+`) and case-sensitive; anything else between braces, such as
//! `{{name}}` or `{{ NAME }}`, is ordinary text.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("token pattern is valid"));

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_]+$").expect("key pattern is valid"));

/// Keys of every well-formed token in `text`, deduplicated, in order of first
/// appearance.
pub fn extract_keys(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let key = &caps[1];
            seen.insert(key.to_string()).then(|| key.to_string())
        })
        .collect()
}

/// Same keys as [`extract_keys`], sorted for display.
pub fn sorted_keys(text: &str) -> Vec<String> {
    let mut keys = extract_keys(text);
    keys.sort();
    keys
}

/// Replaces every `{{KEY}}` whose key is in `values`. Tokens for absent keys
/// stay as they are. Values are inserted verbatim and never rescanned, so a
/// value that itself looks like a token is not substituted again.
pub fn substitute(text: &str, values: &BTreeMap<String, String>) -> String {
    if values.is_empty() {
        return text.to_string();
    }
    let replaced: Cow<'_, str> = TOKEN_RE.replace_all(text, |caps: &Captures<'_>| {
        match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });
    replaced.into_owned()
}

/// Keys still present as tokens. A document is complete when this is empty.
pub fn unresolved(text: &str) -> Vec<String> {
    extract_keys(text)
}

pub fn is_complete(text: &str) -> bool {
    !TOKEN_RE.is_match(text)
}

pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Renders the token for `key`, e.g. `NAME` -> `{{NAME}}`.
pub fn token(key: &str) -> String {
    format!("{{{{{}}}}}", key)
}
