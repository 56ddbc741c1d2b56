//! Node table and parent/child structure behind a mutation-scope guard.
//!
//! Nodes live in a table keyed by [`NodeId`]; parent links are ids into that table. Every
//! mutator takes the [`MutationScope`] handed out by [`TreeModel::run_mutating`] and fails with
//! [`DomError::MutationOutsideScope`] once that scope has ended.

use crate::error::DomError;
use crate::types::{Node, NodeId};
use std::collections::BTreeMap;

/// Permission to mutate a [`TreeModel`], valid only inside the `run_mutating` call that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationScope {
    epoch: u64,
}

#[derive(Clone, Debug, Default)]
pub struct TreeModel {
    nodes: BTreeMap<NodeId, Node>,
    active_scope: Option<u64>,
    scope_epoch: u64,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` inside a mutation scope.
    ///
    /// Reentrant: a nested call reuses the scope that is already active and leaves it active on
    /// return. The outermost call closes the scope, after which its handle is rejected.
    pub fn run_mutating<R>(&mut self, f: impl FnOnce(&mut TreeModel, MutationScope) -> R) -> R {
        if let Some(epoch) = self.active_scope {
            return f(self, MutationScope { epoch });
        }
        self.scope_epoch += 1;
        let epoch = self.scope_epoch;
        self.active_scope = Some(epoch);
        let out = f(self, MutationScope { epoch });
        self.active_scope = None;
        out
    }

    pub fn in_mutation_scope(&self) -> bool {
        self.active_scope.is_some()
    }

    fn check_scope(&self, scope: MutationScope) -> Result<(), DomError> {
        if self.active_scope == Some(scope.epoch) {
            Ok(())
        } else {
            Err(DomError::MutationOutsideScope)
        }
    }

    /// Create the node if absent. An existing node is returned untouched, tag included.
    pub fn ensure_node(
        &mut self,
        scope: MutationScope,
        id: NodeId,
        tag: &str,
    ) -> Result<&Node, DomError> {
        self.check_scope(scope)?;
        if !id.is_valid() {
            return Err(DomError::InvalidNodeId);
        }
        Ok(&*self.nodes.entry(id).or_insert_with(|| Node::new(id, tag)))
    }

    pub fn set_text(
        &mut self,
        scope: MutationScope,
        id: NodeId,
        value: &str,
    ) -> Result<(), DomError> {
        self.check_scope(scope)?;
        let node = self.node_mut(id)?;
        node.text.clear();
        node.text.push_str(value);
        Ok(())
    }

    pub fn set_attr(
        &mut self,
        scope: MutationScope,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.check_scope(scope)?;
        let node = self.node_mut(id)?;
        node.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Append `child` to `parent`, detaching it from its current parent first.
    ///
    /// A node therefore never appears in two children lists. Appending a node beneath itself or
    /// beneath one of its descendants is rejected before anything changes.
    pub fn append_child(
        &mut self,
        scope: MutationScope,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), DomError> {
        self.check_scope(scope)?;
        self.node(parent).ok_or(DomError::UnknownNode(parent))?;
        let previous = self.node(child).ok_or(DomError::UnknownNode(child))?.parent;
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        if let Some(previous) = previous {
            self.detach_from(previous, child);
        }
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove a node and every descendant. Absent ids are a no-op.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_node(&mut self, scope: MutationScope, id: NodeId) -> Result<usize, DomError> {
        self.check_scope(scope)?;
        let Some(node) = self.nodes.get_mut(&id) else {
            return Ok(0);
        };
        if let Some(parent) = node.parent.take() {
            self.detach_from(parent, id);
        }

        // Pre-order walk, removed in reverse so every descendant goes before its ancestor.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        for removed in order.iter().rev() {
            self.nodes.remove(removed);
        }
        Ok(order.len())
    }

    fn detach_from(&mut self, parent: NodeId, child: NodeId) {
        if let Some(parent) = self.nodes.get_mut(&parent) {
            if let Some(pos) = parent.children.iter().position(|id| *id == child) {
                parent.children.remove(pos);
            }
        }
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent);
        }
        false
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::UnknownNode(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes without a parent, ascending by id.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.parent.is_none())
    }

    /// Insert a fully formed node, bypassing the scope guard. Used when rebuilding from a
    /// snapshot, where structure is validated as a whole afterwards.
    pub(crate) fn insert_restored(&mut self, node: Node) -> Result<(), DomError> {
        if !node.id.is_valid() {
            return Err(DomError::InvalidNodeId);
        }
        let id = node.id;
        if self.nodes.insert(id, node).is_some() {
            return Err(DomError::InvalidSnapshot(format!("duplicate node {id}")));
        }
        Ok(())
    }
}
