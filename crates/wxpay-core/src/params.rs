use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Flat key/value parameter set exchanged with the provider.
///
/// Keys iterate in ascending byte order, which is both the stable order of
/// the XML encoding and the canonical order the signature is computed over.
/// Values are always scalars rendered as text; numbers go in through
/// [`ToString`] and travel as numeric-looking strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or overwrite a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> Option<String> {
        self.0.insert(key.into(), value.to_string())
    }

    /// Insert a field only if the caller has not already supplied it.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.entry(key.into()).or_insert_with(|| value.to_string());
    }

    /// Insert a field when the value is present.
    pub fn insert_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(v) = value {
            self.insert(key, v);
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every field of `other` that is not already present.
    pub fn merge_absent(&mut self, other: &ParameterSet) {
        for (k, v) in other.iter() {
            self.insert_if_absent(k, v);
        }
    }

    /// Return a copy without the given keys.
    pub fn without(&self, keys: &[&str]) -> ParameterSet {
        self.0
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Check that every listed field is present and non-empty.
    pub fn require(&self, fields: &[&str]) -> Result<(), MissingFields> {
        let missing: Vec<String> = fields
            .iter()
            .filter(|f| self.get(f).map_or(true, str::is_empty))
            .map(|f| f.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields(missing))
        }
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Fields a request needs but does not carry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .0.join(", "))]
pub struct MissingFields(pub Vec<String>);
