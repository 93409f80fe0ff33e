//! Ordered pre/post snapshot tables keyed by stable entity ids.

use std::collections::HashMap;
use std::hash::Hash;

/// Which set of snapshots to write back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Restore pre-images (state before the action).
    Undo,
    /// Restore post-images (state after the action finished).
    Redo,
}

impl Direction {
    pub fn from_redo(redo: bool) -> Self {
        if redo { Self::Redo } else { Self::Undo }
    }
}

/// Snapshots of one category, captured by one action.
///
/// Holds at most one pre-image and at most one post-image per key. Entries
/// keep registration order so restores replay in the order entities were
/// first touched.
#[derive(Debug, Clone)]
pub struct ChangeTable<K, S> {
    pre: Vec<(K, S)>,
    post: Vec<(K, S)>,
    index: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash, S> ChangeTable<K, S> {
    pub fn new() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Stores a pre-image for `key` unless one is already present.
    ///
    /// `capture` only runs for a new key. Returns `true` if a pre-image was
    /// stored, `false` if the key was already registered or `capture`
    /// returned `None`.
    pub fn register(&mut self, key: K, capture: impl FnOnce() -> Option<S>) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let Some(snapshot) = capture() else {
            return false;
        };
        self.index.insert(key, self.pre.len());
        self.pre.push((key, snapshot));
        true
    }

    pub fn contains(&self, key: K) -> bool {
        self.index.contains_key(&key)
    }

    pub fn pre(&self, key: K) -> Option<&S> {
        self.index.get(&key).map(|&i| &self.pre[i].1)
    }

    pub fn post(&self, key: K) -> Option<&S> {
        self.post.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    /// Captures a post-image for every registered key, in registration order.
    ///
    /// Keys whose capture returns `None` get no post-image. Returns those keys.
    pub fn capture_post(&mut self, mut capture: impl FnMut(K) -> Option<S>) -> Vec<K> {
        self.post.clear();
        let mut missing = Vec::new();
        for &(key, _) in &self.pre {
            match capture(key) {
                Some(snapshot) => self.post.push((key, snapshot)),
                None => missing.push(key),
            }
        }
        missing
    }

    /// Snapshots to restore for `direction`, in registration order.
    pub fn entries(&self, direction: Direction) -> impl Iterator<Item = (K, &S)> {
        let side = match direction {
            Direction::Undo => &self.pre,
            Direction::Redo => &self.post,
        };
        side.iter().map(|(k, s)| (*k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.pre.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.pre.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty()
    }

    /// Exchanges the snapshots stored under `a` and `b`.
    ///
    /// Either key may be unregistered, in which case the other one's
    /// snapshots simply move over.
    pub fn swap_keys(&mut self, a: K, b: K) {
        if a == b {
            return;
        }
        let at_a = self.index.remove(&a);
        let at_b = self.index.remove(&b);
        if let Some(i) = at_a {
            self.pre[i].0 = b;
            self.index.insert(b, i);
        }
        if let Some(i) = at_b {
            self.pre[i].0 = a;
            self.index.insert(a, i);
        }
        for entry in &mut self.post {
            if entry.0 == a {
                entry.0 = b;
            } else if entry.0 == b {
                entry.0 = a;
            }
        }
    }

    /// Folds a later table for the same category into this one.
    ///
    /// Keys already present keep their older pre-image and take the later
    /// post-image. New keys are appended with both of the later images.
    pub fn absorb(&mut self, later: Self) {
        let Self { pre, post, .. } = later;
        let mut later_post: HashMap<K, S> = post.into_iter().collect();
        for (key, snapshot) in pre {
            if !self.index.contains_key(&key) {
                self.index.insert(key, self.pre.len());
                self.pre.push((key, snapshot));
            }
        }
        // Rebuild post in pre order so both sides stay aligned.
        let mut old_post: HashMap<K, S> = std::mem::take(&mut self.post).into_iter().collect();
        for &(key, _) in &self.pre {
            if let Some(snapshot) = later_post.remove(&key).or_else(|| old_post.remove(&key)) {
                self.post.push((key, snapshot));
            }
        }
    }
}

impl<K: Copy + Eq + Hash, S> Default for ChangeTable<K, S> {
    fn default() -> Self {
        Self::new()
    }
}
