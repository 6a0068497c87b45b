//! LRU Cache Module
//!
//! Implements a byte-bounded Least Recently Used store with O(1) access.

use std::collections::HashMap;
use std::fmt;

// == Weighted ==
/// Values stored in an [`LruCache`] report how many bytes they occupy.
pub trait Weighted {
    fn weight(&self) -> usize;
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with every entry removed by eviction.
pub type OnEvicted<V> = Box<dyn FnMut(&str, &V) + Send>;

#[derive(Debug)]
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Byte-bounded LRU store. Not safe for concurrent use on its own.
///
/// Entries live in a slab of nodes linked into a doubly linked list where:
/// - Front (head) = Most recently used
/// - Back (tail) = Least recently used
///
/// The size of an entry is `key.len() + value.weight()`. A `max_bytes` of
/// zero disables eviction.
pub struct LruCache<V> {
    /// Maximum resident bytes, 0 = unbounded
    max_bytes: usize,
    /// Bytes currently tracked
    nbytes: usize,
    /// Node slab, vacant slots are `None`
    nodes: Vec<Option<Node<V>>>,
    /// Vacant slab slots available for reuse
    free: Vec<usize>,
    /// Key to slab slot
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V: Weighted> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `max_bytes` bytes.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted: None,
        }
    }

    /// Creates an empty cache that reports every evicted entry to `on_evicted`.
    ///
    /// The callback runs while the cache is being mutated and must not call
    /// back into it.
    pub fn with_on_evicted(max_bytes: usize, on_evicted: OnEvicted<V>) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(on_evicted);
        cache
    }

    // == Get ==
    /// Looks up a key and marks it as most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        Some(&self.node(idx).value)
    }

    // == Add ==
    /// Inserts or replaces a value, then evicts from the back until the
    /// cache fits in `max_bytes` again.
    pub fn add(&mut self, key: String, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            self.move_to_front(idx);
            let node = self.node_mut(idx);
            let old = std::mem::replace(&mut node.value, value);
            let new_weight = node.value.weight();
            self.nbytes = self.nbytes - old.weight() + new_weight;
        } else {
            let weight = key.len() + value.weight();
            let idx = self.alloc(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, idx);
            self.push_front(idx);
            self.nbytes += weight;
        }

        while self.max_bytes != 0 && self.nbytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    // == Remove Oldest ==
    /// Removes the least recently used entry and hands it to the eviction
    /// callback. Returns None if the cache is empty.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        self.detach(idx);
        let node = self.nodes[idx].take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        self.nbytes -= node.key.len() + node.value.weight();

        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }

        Some((node.key, node.value))
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without touching it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.tail.map(|idx| self.node(idx).key.as_str())
    }

    /// Checks for a key without updating recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.index.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.node(idx);
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the bytes currently tracked.
    pub fn bytes(&self) -> usize {
        self.nbytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    // == List Plumbing ==
    fn node(&self, idx: usize) -> &Node<V> {
        match self.nodes[idx].as_ref() {
            Some(node) => node,
            None => unreachable!("lru slot {idx} is vacant"),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        match self.nodes[idx].as_mut() {
            Some(node) => node,
            None => unreachable!("lru slot {idx} is vacant"),
        }
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(idx);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.detach(idx);
            self.push_front(idx);
        }
    }
}

impl<V> fmt::Debug for LruCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("max_bytes", &self.max_bytes)
            .field("nbytes", &self.nbytes)
            .field("len", &self.index.len())
            .finish()
    }
}
