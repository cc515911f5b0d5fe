//! WMS request parameters with merge semantics.

use std::collections::BTreeMap;
use std::fmt;

/// WMS `GetMap` request parameters.
///
/// A flat key/value map with merge semantics: merging reports whether any
/// value actually changed, which is what decides whether a layer reload is
/// warranted. Keys are case-sensitive and stored as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WmsParams {
    values: BTreeMap<String, String>,
}

impl WmsParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard `GetMap` defaults for a named layer.
    pub fn get_map_defaults(layer_name: &str) -> Self {
        let mut params = Self::new();
        params.set("service", "WMS");
        params.set("version", "1.3.0");
        params.set("request", "GetMap");
        params.set("layers", layer_name);
        params.set("format", "image/png");
        params.set("transparent", "true");
        params
    }

    /// Look up a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set one parameter. Returns `true` iff the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.values.get(&key) {
            Some(existing) if *existing == value => false,
            _ => {
                self.values.insert(key, value);
                true
            }
        }
    }

    /// Merge a set of new parameters. Returns `true` iff any value changed.
    pub fn merge_new_params<K, V>(&mut self, new_params: impl IntoIterator<Item = (K, V)>) -> bool
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut changed = false;
        for (key, value) in new_params {
            changed |= self.set(key, value);
        }
        changed
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the parameter set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for WmsParams {
    /// Query-string rendering, `key=value` pairs joined with `&`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                write!(f, "&")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}
