use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde_json::Value;

/// Normalized (method, params) key used for caching and request dedup.
///
/// Parameters are sorted by key before rendering, so two calls with the same
/// values in a different insertion order produce the same identity string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    pub fn new(method: &str, params: &BTreeMap<String, String>) -> Self {
        if params.is_empty() {
            return Self(method.to_owned());
        }

        Self(format!("{method}?{}", render_query(params)))
    }

    pub fn from_pairs<K, V>(method: &str, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = pairs
            .iter()
            .map(|(key, value)| (key.as_ref().to_owned(), value.as_ref().to_owned()))
            .collect::<BTreeMap<_, _>>();
        Self::new(method, &params)
    }

    /// Identity of a POST call: the canonically-serialized body stands in
    /// for query parameters. `serde_json` keeps object keys sorted, so the
    /// rendering is insertion-order independent.
    pub fn from_body(method: &str, body: &Value) -> Self {
        Self(format!("{method}#{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_key(self) -> String {
        self.0
    }
}

/// Stable, URL-encoded query rendering shared by identity keys and real
/// request URLs, so the cache key and the wire request always agree.
pub(crate) fn render_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

impl Display for RequestIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
