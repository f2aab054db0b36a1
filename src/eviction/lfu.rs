//! LFU Handler Module
//!
//! Least Frequently Used tracking with frequency buckets.
//!
//! Every tracked key lives in exactly one bucket, the bucket for its current
//! frequency. Buckets form a list sorted by ascending frequency and are also
//! indexed by frequency, so moving a key up one frequency touches only its
//! source bucket and the bucket directly after it. Inside a bucket keys keep
//! arrival order, which makes ties between equal frequencies deterministic:
//! the earliest arrival is evicted first.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{EvictionHandler, SlotArena, SlotId};

#[derive(Debug)]
struct Node {
    key: String,
    freq: u64,
    bucket: SlotId,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug)]
struct Bucket {
    freq: u64,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

#[derive(Debug, Default)]
struct LfuState {
    nodes: SlotArena<Node>,
    buckets: SlotArena<Bucket>,
    keys: HashMap<String, SlotId>,
    by_freq: HashMap<u64, SlotId>,
    first_bucket: Option<SlotId>,
    min_freq: Option<u64>,
}

impl LfuState {
    /// Creates an empty bucket for `freq` right after `after`, or at the
    /// head of the bucket list when `after` is `None`.
    fn insert_bucket(&mut self, freq: u64, after: Option<SlotId>) -> SlotId {
        let next = match after {
            Some(a) => self.buckets.get(a).and_then(|b| b.next),
            None => self.first_bucket,
        };
        let id = self.buckets.insert(Bucket {
            freq,
            head: None,
            tail: None,
            prev: after,
            next,
        });
        match after.and_then(|a| self.buckets.get_mut(a)) {
            Some(a) => a.next = Some(id),
            None => self.first_bucket = Some(id),
        }
        if let Some(n) = next.and_then(|n| self.buckets.get_mut(n)) {
            n.prev = Some(id);
        }
        self.by_freq.insert(freq, id);
        id
    }

    fn remove_bucket(&mut self, id: SlotId) {
        let Some(bucket) = self.buckets.remove(id) else {
            return;
        };
        match bucket.prev.and_then(|p| self.buckets.get_mut(p)) {
            Some(p) => p.next = bucket.next,
            None => self.first_bucket = bucket.next,
        }
        if let Some(n) = bucket.next.and_then(|n| self.buckets.get_mut(n)) {
            n.prev = bucket.prev;
        }
        self.by_freq.remove(&bucket.freq);
    }

    /// Appends a node at the tail (newest end) of `bucket`.
    fn push_node(&mut self, node_id: SlotId, bucket_id: SlotId) {
        let old_tail = self.buckets.get(bucket_id).and_then(|b| b.tail);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.bucket = bucket_id;
            node.prev = old_tail;
            node.next = None;
        }
        if let Some(t) = old_tail.and_then(|t| self.nodes.get_mut(t)) {
            t.next = Some(node_id);
        }
        if let Some(bucket) = self.buckets.get_mut(bucket_id) {
            if bucket.head.is_none() {
                bucket.head = Some(node_id);
            }
            bucket.tail = Some(node_id);
        }
    }

    /// Detaches a node from its bucket. Returns true if the bucket is now empty.
    fn unlink_node(&mut self, node_id: SlotId) -> bool {
        let Some((bucket_id, prev, next)) = self
            .nodes
            .get(node_id)
            .map(|n| (n.bucket, n.prev, n.next))
        else {
            return false;
        };
        if let Some(p) = prev.and_then(|p| self.nodes.get_mut(p)) {
            p.next = next;
        }
        if let Some(n) = next.and_then(|n| self.nodes.get_mut(n)) {
            n.prev = prev;
        }
        match self.buckets.get_mut(bucket_id) {
            Some(bucket) => {
                if bucket.head == Some(node_id) {
                    bucket.head = next;
                }
                if bucket.tail == Some(node_id) {
                    bucket.tail = prev;
                }
                bucket.head.is_none()
            }
            None => false,
        }
    }

    fn insert(&mut self, key: &str) {
        if self.keys.contains_key(key) {
            return;
        }
        let bucket_id = match self.by_freq.get(&1) {
            Some(&id) => id,
            None => self.insert_bucket(1, None),
        };
        let node_id = self.nodes.insert(Node {
            key: key.to_string(),
            freq: 1,
            bucket: bucket_id,
            prev: None,
            next: None,
        });
        self.push_node(node_id, bucket_id);
        self.keys.insert(key.to_string(), node_id);
        self.min_freq = Some(1);
    }

    fn access(&mut self, key: &str) {
        let Some(&node_id) = self.keys.get(key) else {
            return;
        };
        let Some((old_freq, old_bucket)) = self.nodes.get(node_id).map(|n| (n.freq, n.bucket))
        else {
            return;
        };
        let new_freq = old_freq + 1;

        let dest = match self.by_freq.get(&new_freq) {
            Some(&id) => id,
            None => self.insert_bucket(new_freq, Some(old_bucket)),
        };

        let source_emptied = self.unlink_node(node_id);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.freq = new_freq;
        }
        self.push_node(node_id, dest);

        if source_emptied {
            self.remove_bucket(old_bucket);
            if self.min_freq == Some(old_freq) {
                self.min_freq = Some(new_freq);
            }
        }
    }

    fn evict(&mut self, key: &str) {
        let Some(node_id) = self.keys.remove(key) else {
            return;
        };
        let bucket_id = self.nodes.get(node_id).map(|n| n.bucket);
        let emptied = self.unlink_node(node_id);
        let removed = self.nodes.remove(node_id);

        if emptied {
            if let Some(bucket_id) = bucket_id {
                self.remove_bucket(bucket_id);
            }
        }
        if removed.map(|n| n.freq) == self.min_freq {
            self.min_freq = self
                .first_bucket
                .and_then(|b| self.buckets.get(b))
                .map(|b| b.freq);
        }
    }

    fn candidate(&self) -> Option<String> {
        let bucket_id = self.by_freq.get(&self.min_freq?)?;
        let head = self.buckets.get(*bucket_id)?.head?;
        self.nodes.get(head).map(|n| n.key.clone())
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.buckets.clear();
        self.keys.clear();
        self.by_freq.clear();
        self.first_bucket = None;
        self.min_freq = None;
    }
}

// == LFU Handler ==
/// Least-frequently-used eviction tracking with O(1) operations.
///
/// Only `on_insert` starts tracking a key; `on_access` on an unknown key is
/// ignored.
#[derive(Debug, Default)]
pub struct LfuHandler {
    state: RwLock<LfuState>,
}

impl LfuHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current access frequency of a tracked key.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        let state = self.state.read();
        let id = state.keys.get(key)?;
        state.nodes.get(*id).map(|n| n.freq)
    }

    /// Smallest frequency with a non-empty bucket.
    pub fn min_frequency(&self) -> Option<u64> {
        self.state.read().min_freq
    }
}

impl EvictionHandler for LfuHandler {
    fn on_insert(&self, key: &str) {
        self.state.write().insert(key);
    }

    fn on_access(&self, key: &str) {
        self.state.write().access(key);
    }

    fn on_evict(&self, key: &str) {
        self.state.write().evict(key);
    }

    fn select_eviction_candidate(&self) -> Option<String> {
        self.state.read().candidate()
    }

    fn reset(&self) {
        self.state.write().clear();
    }

    fn len(&self) -> usize {
        self.state.read().keys.len()
    }
}
