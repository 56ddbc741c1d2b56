//! Keyed node identity.
//!
//! A key keeps its id for the lifetime of the allocator: there is no eviction, and removing the
//! node from the tree does not release the id. Growth is one entry per distinct key.

use crate::error::HostError;
use dom::NodeId;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct IdentityAllocator {
    next: Option<NodeId>,
    entries: HashMap<String, NodeId>,
}

impl IdentityAllocator {
    /// `base` is the first id handed out; it is raised to 1 if zero.
    pub fn new(base: u32) -> Self {
        Self {
            next: Some(NodeId(base.max(1))),
            entries: HashMap::new(),
        }
    }

    /// Id for `key`, assigning the next counter value on first sight.
    pub fn allocate(&mut self, key: &str) -> Result<NodeId, HostError> {
        if let Some(id) = self.entries.get(key) {
            return Ok(*id);
        }
        let id = self.next.ok_or(HostError::IdentityExhausted)?;
        self.next = id.0.checked_add(1).map(NodeId);
        self.entries.insert(key.to_string(), id);
        log::trace!(target: "verso.identity", "key {key:?} -> node {id}");
        Ok(id)
    }

    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_id_in_any_order() {
        let mut ids = IdentityAllocator::new(100);
        let a = ids.allocate("item-A").unwrap();
        let b = ids.allocate("item-B").unwrap();
        let c = ids.allocate("item-C").unwrap();
        assert_eq!((a, b, c), (NodeId(100), NodeId(101), NodeId(102)));
        assert_eq!(ids.allocate("item-C").unwrap(), c);
        assert_eq!(ids.allocate("item-A").unwrap(), a);
        assert_eq!(ids.allocate("item-B").unwrap(), b);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.get("item-B"), Some(b));
        assert_eq!(ids.get("item-D"), None);
    }

    #[test]
    fn zero_base_starts_at_one() {
        let mut ids = IdentityAllocator::new(0);
        assert_eq!(ids.allocate("k").unwrap(), NodeId(1));
    }

    #[test]
    fn exhaustion_only_affects_new_keys() {
        let mut ids = IdentityAllocator::new(u32::MAX);
        let last = ids.allocate("last").unwrap();
        assert_eq!(last, NodeId(u32::MAX));
        assert_eq!(ids.allocate("one-more"), Err(HostError::IdentityExhausted));
        assert_eq!(ids.allocate("last").unwrap(), last);
    }
}
