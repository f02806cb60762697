//! Ordered header multimap.
//!
//! `http::HeaderMap` groups values by name when iterated, which loses the
//! relative order of interleaved headers. `HeaderSet` keeps every occurrence
//! in arrival order so that appended headers land exactly where they were
//! added.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// An ordered list of header occurrences with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeaderSet {
    /// Create an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every occurrence in a `HeaderMap`.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let entries = map
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { entries }
    }

    /// Append an occurrence. Existing values for the same name are kept.
    pub fn add(&mut self, name: HeaderName, value: HeaderValue) {
        self.entries.push((name, value));
    }

    /// Remove every occurrence of `name`.
    pub fn remove(&mut self, name: &HeaderName) {
        self.entries.retain(|(existing, _)| existing != name);
    }

    /// All values recorded for `name`, in insertion order.
    ///
    /// `HeaderName` is always lowercase, so lookups are case-insensitive.
    pub fn get_all<'a>(&'a self, name: &HeaderName) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        let name = name.clone();
        self.entries
            .iter()
            .filter(move |(existing, _)| *existing == name)
            .map(|(_, value)| value)
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.get_all(name).next()
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    /// Build a `HeaderMap`, appending occurrences in order.
    pub fn into_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in self.entries {
            map.append(name, value);
        }
        map
    }
}

impl IntoIterator for HeaderSet {
    type Item = (HeaderName, HeaderValue);
    type IntoIter = std::vec::IntoIter<(HeaderName, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
