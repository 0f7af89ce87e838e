// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted pending-request table.

use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;

/// Keyed table of pending completion handlers with per-key reference counts.
///
/// A key may be pushed more than once before its first completion arrives
/// (repeated hover queries produce the same request id). Instead of growing
/// duplicate entries, the table counts outstanding pushes and hands the
/// value back once per pop, removing the entry when the count reaches zero.
///
/// Equality of values is whatever `V: PartialEq` says; handler types in this
/// crate compare by identity, so "same value" means "same handler instance".
///
/// The table is not internally synchronized. When completions can arrive on
/// a different thread than dispatch calls, the owner must serialize every
/// push and pop behind one lock.
#[derive(Debug)]
pub struct CountedRegistry<K, V> {
    entries: HashMap<K, (u32, V)>,
}

impl<K, V> Default for CountedRegistry<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> CountedRegistry<K, V>
where
    K: Eq + Hash + Debug + Copy,
    V: PartialEq + Clone,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Records one pending request under `key`.
    ///
    /// - No entry: inserts `(1, value)`.
    /// - Entry holding an equal value: increments the count.
    /// - Entry holding a *different* value: key collision. Logs a warning
    ///   and resets the entry to `(1, value)` — the newest value wins and
    ///   the displaced one will never be delivered.
    ///
    /// Never fails; a collision degrades correctness, not availability.
    pub fn push(&mut self, key: K, value: V) {
        let count = match self.entries.get(&key) {
            Some((count, existing)) if *existing == value => *count,
            Some(_) => {
                log::warn!(
                    "pending-request registry: key {key:?} already holds a different \
                     handler; overwriting (the displaced handler will not be invoked)"
                );
                0
            }
            None => 0,
        };
        self.entries.insert(key, (count + 1, value));
    }

    /// Releases one pending request under `key`, returning its handler.
    ///
    /// Returns [`None`] if nothing is pending — an expected outcome for
    /// orphan completions. While the count is above one, the entry stays in
    /// place for future pops.
    pub fn pop(&mut self, key: K) -> Option<V> {
        let pending = self.entries.get(&key).map(|(count, _)| *count)?;
        if pending > 1 {
            let (count, value) = self.entries.get_mut(&key)?;
            *count -= 1;
            Some(value.clone())
        } else {
            self.entries.remove(&key).map(|(_, value)| value)
        }
    }

    /// Number of distinct keys with at least one pending request.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending count for `key`, or zero when absent.
    #[must_use]
    pub fn pending_count(&self, key: K) -> u32 {
        self.entries.get(&key).map_or(0, |(count, _)| *count)
    }
}
