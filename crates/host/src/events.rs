//! Listener registry for the adapter layer.
//!
//! Keyed by `(node, event type)`; handlers for one key run in registration order. Nothing here
//! participates in tick transactions.

use crate::error::HostError;
use dom::NodeId;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey {
    pub node: NodeId,
    pub event_type: String,
}

impl ListenerKey {
    pub fn new(node: NodeId, event_type: &str) -> Self {
        Self {
            node,
            event_type: event_type.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomEvent {
    pub node: NodeId,
    pub event_type: String,
    pub detail: serde_json::Value,
}

/// Handler invoked with mutable access to the owner `H`, so an event can drive a new tick.
pub type Listener<H> = Box<dyn FnMut(&mut H, &DomEvent) -> Result<(), HostError>>;

pub struct ListenerRegistry<H> {
    listeners: HashMap<ListenerKey, Vec<Listener<H>>>,
}

impl<H> ListenerRegistry<H> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    pub fn add(
        &mut self,
        key: ListenerKey,
        listener: impl FnMut(&mut H, &DomEvent) -> Result<(), HostError> + 'static,
    ) {
        self.listeners
            .entry(key)
            .or_default()
            .push(Box::new(listener));
    }

    /// Detach the handlers for `key` so they can run while the owner is borrowed mutably.
    pub(crate) fn take(&mut self, key: &ListenerKey) -> Vec<Listener<H>> {
        self.listeners.remove(key).unwrap_or_default()
    }

    /// Put dispatched handlers back ahead of any registered while they ran.
    pub(crate) fn restore(&mut self, key: ListenerKey, mut handlers: Vec<Listener<H>>) {
        if let Some(added) = self.listeners.remove(&key) {
            handlers.extend(added);
        }
        if !handlers.is_empty() {
            self.listeners.insert(key, handlers);
        }
    }

    pub fn count(&self, key: &ListenerKey) -> usize {
        self.listeners.get(key).map_or(0, Vec::len)
    }

    /// Drop every handler registered on `node`. Returns how many were removed.
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let mut removed = 0;
        self.listeners.retain(|key, handlers| {
            if key.node == node {
                removed += handlers.len();
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<H> Default for ListenerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ListenerRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.listeners.keys().collect();
        keys.sort();
        f.debug_map()
            .entries(keys.into_iter().map(|key| (key, self.count(key))))
            .finish()
    }
}
