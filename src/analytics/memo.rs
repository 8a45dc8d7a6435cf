use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// Caches one computed value together with a fingerprint of the inputs it was computed from.
///
/// A changed input always produces a recompute. An unchanged input returns the cached value
/// without calling the closure.
///
/// ```
/// use finboard::analytics::Memo;
///
/// let mut memo = Memo::new();
/// let mut calls = 0;
/// let input = vec![1, 2, 3];
/// assert_eq!(*memo.get_or_compute(&input, || { calls += 1; input.iter().sum::<i32>() }), 6);
/// assert_eq!(*memo.get_or_compute(&input, || { calls += 1; 0 }), 6);
/// assert_eq!(calls, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Memo<T> {
    cached: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { cached: None }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a value is cached for exactly this input.
    pub fn is_current<K: Hash + ?Sized>(&self, key: &K) -> bool {
        let fingerprint = fingerprint(key);
        matches!(&self.cached, Some((cached, _)) if *cached == fingerprint)
    }

    pub fn get_or_compute<K, F>(&mut self, key: &K, compute: F) -> &T
    where
        K: Hash + ?Sized,
        F: FnOnce() -> T,
    {
        let fingerprint = fingerprint(key);
        let stale = !matches!(&self.cached, Some((cached, _)) if *cached == fingerprint);
        if stale {
            trace!("Input fingerprint changed to {fingerprint:x}, recomputing");
        }
        let (_, value) = match self.cached.take() {
            Some(entry) if !stale => self.cached.insert(entry),
            _ => self.cached.insert((fingerprint, compute())),
        };
        value
    }
}

fn fingerprint<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
