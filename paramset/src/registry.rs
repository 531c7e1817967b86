//! Ordered field registry.
//!
//! A [`Registry`] maps field names to [`Value`]s and remembers insertion
//! order, which is what dependency sorting and rendering operate on.
//! A handful of reserved names are not fields at all: assigning to them
//! toggles per-registry behavior flags instead.

use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;
use crate::value::Value;

/// Names that configure the registry rather than define fields.
pub const RESERVED: [&str; 3] = ["_protect", "_evaluate", "_returnerror"];

#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    fields: IndexMap<String, Value>,
    /// Protect `$name` occurrences in text before substitution.
    pub protect: bool,
    /// Evaluate field expressions during resolution.
    pub evaluate: bool,
    /// Replace failed references with an explicit sentinel instead of
    /// keeping the raw placeholder text.
    pub return_error_sentinel: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            fields: IndexMap::new(),
            protect: false,
            evaluate: true,
            return_error_sentinel: true,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Number of fields. Reserved names never count.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when `name` is a defined field. Reserved names are not fields.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a field, or toggle a flag when `name` is reserved.
    ///
    /// Assigning an empty sequence deletes the field if it exists; this is
    /// the scripted way to drop a definition mid-stream.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match name.as_str() {
            "_protect" => self.protect = truthy(&value),
            "_evaluate" => self.evaluate = truthy(&value),
            "_returnerror" => self.return_error_sentinel = truthy(&value),
            _ => {
                if matches!(&value, Value::Seq(items) if items.is_empty()) {
                    self.fields.shift_remove(&name);
                } else {
                    self.fields.insert(name, value);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<&Value, Error> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }

    pub fn get_opt(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Remove a field, preserving the order of the rest.
    pub fn remove(&mut self, name: &str) -> Result<Value, Error> {
        if RESERVED.contains(&name) {
            return Err(Error::Protected(name.to_owned()));
        }
        self.fields
            .shift_remove(name)
            .ok_or_else(|| Error::UnknownField(name.to_owned()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field at position `index` in definition order.
    pub fn nth(&self, index: usize) -> Result<(&str, &Value), Error> {
        self.fields
            .get_index(index)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or(Error::IndexOutOfRange { index, len: self.fields.len() })
    }

    /// New registry holding the fields at the given positions, in the
    /// order given.
    pub fn select(&self, indices: &[usize]) -> Result<Registry, Error> {
        let mut out = self.empty_like();
        for &i in indices {
            let (k, v) = self.nth(i)?;
            out.fields.insert(k.to_owned(), v.clone());
        }
        Ok(out)
    }

    /// New registry holding the contiguous positional range `start..stop`,
    /// clamped to the field count.
    pub fn slice(&self, start: usize, stop: usize) -> Registry {
        let mut out = self.empty_like();
        let stop = stop.min(self.fields.len());
        for i in start..stop {
            if let Some((k, v)) = self.fields.get_index(i) {
                out.fields.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// Merge: fields of `self` first, then `other`'s. On a name collision
    /// `other` wins but the field keeps its original position.
    pub fn union(&self, other: &Registry) -> Registry {
        let mut out = self.clone();
        for (k, v) in other.fields.iter() {
            out.fields.insert(k.clone(), v.clone());
        }
        out
    }

    /// Merge and re-sort by dependency in one step, for assembling a
    /// registry from several sources whose definitions interleave.
    pub fn union_sorted(
        &self,
        other: &Registry,
    ) -> Result<(Registry, Vec<crate::error::Diagnostic>), Error> {
        crate::sort::sort_definitions(&self.union(other), crate::sort::ResolveMode::Lenient)
    }

    /// Registry of undefined fields, one per `${name}` referenced in `text`.
    pub fn scan(text: &str) -> Registry {
        Registry::from_keys(crate::sort::references(text))
    }

    /// Fields of `self` whose names do not appear in `other`.
    pub fn difference(&self, other: &Registry) -> Registry {
        let mut out = self.empty_like();
        for (k, v) in self.fields.iter() {
            if !other.fields.contains_key(k) {
                out.fields.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// Bulk-assign through [`Registry::set`], so reserved names and
    /// empty-sequence deletions apply.
    pub fn update<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in entries {
            self.set(k, v);
        }
    }

    /// Add any of `defaults` that are not yet defined, keeping existing
    /// values. Returns the names that were filled in.
    pub fn check<I, K, V>(&mut self, defaults: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut added = Vec::new();
        for (k, v) in defaults {
            let k = k.into();
            if !self.fields.contains_key(&k) && !RESERVED.contains(&k.as_str()) {
                self.set(k.clone(), v);
                added.push(k);
            }
        }
        added
    }

    /// Pair up parallel key and value lists.
    ///
    /// Surplus values get generated names `key0`, `key1`, ... from their
    /// position; surplus keys all take the last value (or stay undefined
    /// when there are no values at all).
    pub fn from_keys_values<K, V>(keys: Vec<K>, values: Vec<V>) -> Registry
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut out = Registry::new();
        let nkeys = keys.len();
        let mut values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let last = values.last().cloned();
        // Pad short value lists by repeating the last value.
        while values.len() < nkeys {
            match &last {
                Some(v) => values.push(v.clone()),
                None => values.push(Value::Undefined),
            }
        }
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        for i in nkeys..values.len() {
            keys.push(format!("key{i}"));
        }
        for (k, v) in keys.into_iter().zip(values) {
            out.set(k, v);
        }
        out
    }

    /// Define every key as [`Value::Undefined`].
    pub fn from_keys<K: Into<String>>(keys: Vec<K>) -> Registry {
        let mut out = Registry::new();
        for k in keys {
            out.set(k, Value::Undefined);
        }
        out
    }

    /// Resolve every definition; see [`crate::template::resolve`].
    pub fn resolve(
        &self,
        mode: crate::sort::ResolveMode,
    ) -> Result<(Registry, Vec<crate::error::Diagnostic>), Error> {
        crate::template::resolve(self, mode)
    }

    /// Substitute resolved values into text; see [`crate::template::render`].
    pub fn render(&self, text: &str) -> Result<String, Error> {
        crate::template::render(self, text)
    }

    pub(crate) fn empty_like(&self) -> Registry {
        Registry {
            fields: IndexMap::new(),
            protect: self.protect,
            evaluate: self.evaluate,
            return_error_sentinel: self.return_error_sentinel,
        }
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Int(n) => *n != 0,
        Value::Float(x) => *x != 0.0,
        Value::Text(s) => !s.is_empty() && s != "false" && s != "False",
        Value::Seq(items) => !items.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Undefined => false,
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Registry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Registry::new();
        out.update(iter);
        out
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "parameter set with {} fields", self.fields.len())?;
        for (k, v) in self.fields.iter() {
            writeln!(f, "  {k}: {}", v.brief())?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Registry {
        Registry::from_iter([
            ("a", Value::Int(1)),
            ("b", Value::Int(2)),
            ("c", Value::Int(3)),
        ])
    }

    #[test]
    fn preserves_insertion_order() {
        let r = sample();
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut r = sample();
        r.set("b", Value::Int(20));
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(r.get("b").unwrap(), &Value::Int(20));
    }

    #[test]
    fn empty_seq_deletes() {
        let mut r = sample();
        r.set("b", Value::Seq(vec![]));
        assert!(!r.contains("b"));
        assert_eq!(r.len(), 2);
        // Deleting a missing field is a no-op.
        r.set("zzz", Value::Seq(vec![]));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn reserved_names_toggle_flags() {
        let mut r = Registry::new();
        assert!(r.evaluate);
        r.set("_evaluate", Value::Int(0));
        assert!(!r.evaluate);
        assert!(!r.contains("_evaluate"));
        assert_eq!(r.len(), 0);

        r.set("_protect", Value::Int(1));
        assert!(r.protect);
        r.set("_returnerror", Value::Int(0));
        assert!(!r.return_error_sentinel);
    }

    #[test]
    fn remove_reserved_is_protected() {
        let mut r = sample();
        assert_eq!(
            r.remove("_protect"),
            Err(Error::Protected("_protect".into()))
        );
        assert_eq!(r.remove("nope"), Err(Error::UnknownField("nope".into())));
        assert_eq!(r.remove("b"), Ok(Value::Int(2)));
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn positional_access() {
        let r = sample();
        assert_eq!(r.nth(1).unwrap(), ("b", &Value::Int(2)));
        assert_eq!(
            r.nth(5),
            Err(Error::IndexOutOfRange { index: 5, len: 3 })
        );
        let picked = r.select(&[2, 0]).unwrap();
        let keys: Vec<_> = picked.keys().collect();
        assert_eq!(keys, ["c", "a"]);
        let sliced = r.slice(1, 99);
        let keys: Vec<_> = sliced.keys().collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn union_and_difference() {
        let r = sample();
        let other = Registry::from_iter([("b", Value::Int(99)), ("d", Value::Int(4))]);
        let merged = r.union(&other);
        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
        assert_eq!(merged.get("b").unwrap(), &Value::Int(99));

        let diff = r.difference(&other);
        let keys: Vec<_> = diff.keys().collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn check_fills_missing_only() {
        let mut r = sample();
        let added = r.check([("b", Value::Int(99)), ("d", Value::Int(4))]);
        assert_eq!(added, ["d"]);
        assert_eq!(r.get("b").unwrap(), &Value::Int(2));
        assert_eq!(r.get("d").unwrap(), &Value::Int(4));
    }

    #[test]
    fn from_keys_values_pads_both_ways() {
        // Surplus values get generated names from their position.
        let r = Registry::from_keys_values(vec!["a"], vec![1i64, 2, 3]);
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "key1", "key2"]);
        assert_eq!(r.get("key2").unwrap(), &Value::Int(3));

        // Surplus keys repeat the last value.
        let r = Registry::from_keys_values(vec!["a", "b", "c"], vec![7i64]);
        assert_eq!(r.get("b").unwrap(), &Value::Int(7));
        assert_eq!(r.get("c").unwrap(), &Value::Int(7));

        // No values at all leaves keys undefined.
        let r = Registry::from_keys_values::<_, Value>(vec!["a"], vec![]);
        assert_eq!(r.get("a").unwrap(), &Value::Undefined);
    }

    #[test]
    fn scan_builds_placeholder_registry() {
        let r = Registry::scan("${a} + ${b} * ${a}");
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(r.get("a").unwrap(), &Value::Undefined);
    }

    #[test]
    fn union_sorted_reorders() {
        let base = Registry::from_iter([("c", Value::Text("${a} + 1".into()))]);
        let more = Registry::from_iter([("a", Value::Int(1))]);
        let (merged, diags) = base.union_sorted(&more).unwrap();
        let keys: Vec<_> = merged.keys().collect();
        assert_eq!(keys, ["a", "c"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn display_summary() {
        let s = sample().to_string();
        assert!(s.starts_with("parameter set with 3 fields"));
        assert!(s.contains("  a: 1"));
    }
}
