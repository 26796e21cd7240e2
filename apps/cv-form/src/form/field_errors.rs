#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::form::path::FieldPath;

/// Per-field validation messages, keyed by the dotted field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.0.insert(path.to_string(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Drops the entry for exactly this path.
    pub fn clear_field(&mut self, path: &FieldPath) -> Option<String> {
        self.0.remove(&path.to_string())
    }

    /// Drops every entry whose key contains `needle`. Returns how many went.
    pub fn clear_containing(&mut self, needle: &str) -> usize {
        let before = self.0.len();
        self.0.retain(|key, _| !key.contains(needle));
        before - self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}
