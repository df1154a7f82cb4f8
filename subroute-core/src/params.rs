//! Captured wildcard values.

use std::{fmt, ops::Deref, sync::Arc};

/// Name of the parameter carrying the matched route's pattern, appended
/// when matched-route-path recording was enabled for that route.
pub const MATCHED_ROUTE_PATH_PARAM: &str = "$matchedRoutePath";

/// A single captured parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    key: Arc<str>,
    value: String,
}

impl Param {
    /// Create a parameter.
    pub fn new(key: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The wildcard name, e.g. `p1`, `name` or `>`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The captured subject fragment.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered parameters captured by a match.
///
/// The first wildcard of the pattern is the first entry, so reading by index
/// is safe. Internally the buffer keeps its slots after [`clear`](Params::clear)
/// and overwrites them in place on the next [`push`](Params::push), which is
/// what makes pooled buffers allocation-free once warm. Only the first
/// `len()` slots are ever visible.
#[derive(Clone, Default)]
pub struct Params {
    slots: Vec<Param>,
    len: usize,
}

impl Params {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` parameters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Append a parameter, reusing a stale slot when one is available.
    pub fn push(&mut self, key: &Arc<str>, value: &str) {
        if let Some(slot) = self.slots.get_mut(self.len) {
            if !Arc::ptr_eq(&slot.key, key) {
                slot.key = Arc::clone(key);
            }
            slot.value.clear();
            slot.value.push_str(value);
        } else {
            self.slots.push(Param {
                key: Arc::clone(key),
                value: value.to_owned(),
            });
        }
        self.len += 1;
    }

    /// Reset the logical length to zero. Slots are kept for reuse.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Shorten the logical length to `len`.
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Number of parameters that fit without growing the buffer.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// The visible parameters.
    pub fn as_slice(&self) -> &[Param] {
        &self.slots[..self.len]
    }

    /// Returns the value of the first parameter named `name`, or `""`.
    pub fn by_name(&self, name: &str) -> &str {
        self.iter()
            .find(|p| p.key() == name)
            .map_or("", Param::value)
    }

    /// The pattern of the matched route, or `""` when matched-route-path
    /// recording was not enabled when that route was registered.
    pub fn matched_route_path(&self) -> &str {
        self.by_name(MATCHED_ROUTE_PATH_PARAM)
    }
}

impl Deref for Params {
    type Target = [Param];

    fn deref(&self) -> &[Param] {
        self.as_slice()
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Params {}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<Arc<str>>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let slots: Vec<Param> = iter.into_iter().map(|(k, v)| Param::new(k, v)).collect();
        let len = slots.len();
        Self { slots, len }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}
