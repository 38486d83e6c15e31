use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

/// A concurrent, reference-keyed cache of fully-resolved results.
///
/// Distinguishes "key absent" (never resolved) from "key present with
/// value `None`" (resolved, but to nothing — negative caching). Writes
/// happen as a single bulk upsert once a top-level `resolve` has fully
/// completed: readers may observe a partial batch as entries trickle in
/// across separate `resolve` calls, but never a half-constructed value
/// from a single one.
pub(crate) struct Cache<T> {
    entries: RwLock<HashMap<T, Option<String>>>,
}

impl<T> Cache<T>
where
    T: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get(&self, reference: &T) -> Option<Option<String>> {
        self.entries.read().get(reference).cloned()
    }

    pub(crate) fn merge(&self, batch: impl IntoIterator<Item = (T, Option<String>)>) {
        let mut entries = self.entries.write();
        for (reference, value) in batch {
            entries.insert(reference, value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
