//! Canonical snapshot of a [`TreeModel`].
//!
//! Format: a compact JSON array, one object per node, ascending by id:
//! `{"id":..,"tag":..,"text":..,"attrs":[[name,value],..],"children":[..],"parent":id|null}`.
//! Attributes are ordered by name compared as UTF-16 code units, children keep append order. Equal trees always produce
//! byte-identical snapshots, which is what the fingerprint is computed over.

use crate::error::DomError;
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::tree::TreeModel;
use crate::types::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Structured form of one snapshot entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub tag: String,
    pub text: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot {
    json: String,
}

impl Snapshot {
    pub fn as_str(&self) -> &str {
        &self.json
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.json
    }

    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self.as_bytes())
    }

    pub fn nodes(&self) -> Result<Vec<SnapshotNode>, DomError> {
        serde_json::from_str(&self.json).map_err(|err| DomError::InvalidSnapshot(err.to_string()))
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.json)
    }
}

/// Borrowed view of a node, field for field the same shape as [`SnapshotNode`].
#[derive(Serialize)]
struct SnapshotEntry<'a> {
    id: NodeId,
    tag: &'a str,
    text: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
    children: &'a [NodeId],
    parent: Option<NodeId>,
}

impl<'a> From<&'a Node> for SnapshotEntry<'a> {
    fn from(node: &'a Node) -> Self {
        let mut attrs: Vec<_> = node
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        attrs.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));
        Self {
            id: node.id,
            tag: &node.tag,
            text: &node.text,
            attrs,
            children: &node.children,
            parent: node.parent,
        }
    }
}

/// Produce the canonical snapshot of `tree`.
pub fn serialize(tree: &TreeModel) -> Result<Snapshot, DomError> {
    let entries: Vec<SnapshotEntry<'_>> = tree.iter().map(SnapshotEntry::from).collect();
    let json = serde_json::to_string(&entries)
        .map_err(|err| DomError::SnapshotEncoding(err.to_string()))?;
    Ok(Snapshot { json })
}

impl TreeModel {
    /// Rebuild a model from canonical snapshot text.
    ///
    /// Parent and children links must agree with each other and every node must sit below a
    /// parentless root; anything else is rejected as `InvalidSnapshot`.
    pub fn from_snapshot(snapshot: &str) -> Result<TreeModel, DomError> {
        let entries: Vec<SnapshotNode> = serde_json::from_str(snapshot)
            .map_err(|err| DomError::InvalidSnapshot(err.to_string()))?;
        let mut tree = TreeModel::new();
        for entry in &entries {
            let mut attributes = BTreeMap::new();
            for (name, value) in &entry.attrs {
                if attributes.insert(name.clone(), value.clone()).is_some() {
                    return Err(DomError::InvalidSnapshot(format!(
                        "node {} repeats attribute `{name}`",
                        entry.id
                    )));
                }
            }
            tree.insert_restored(Node {
                id: entry.id,
                tag: entry.tag.clone(),
                text: entry.text.clone(),
                attributes,
                children: entry.children.clone(),
                parent: entry.parent,
            })?;
        }
        validate_links(&tree)?;
        Ok(tree)
    }
}

fn validate_links(tree: &TreeModel) -> Result<(), DomError> {
    let mut claimed = HashSet::new();
    for node in tree.iter() {
        for child in node.children() {
            let owner = tree.node(*child).and_then(Node::parent);
            if owner != Some(node.id()) {
                return Err(DomError::InvalidSnapshot(format!(
                    "node {} lists child {child} whose parent is {owner:?}",
                    node.id()
                )));
            }
            if !claimed.insert(*child) {
                return Err(DomError::InvalidSnapshot(format!(
                    "child {child} listed twice"
                )));
            }
        }
    }
    for node in tree.iter() {
        if node.parent().is_some() && !claimed.contains(&node.id()) {
            return Err(DomError::InvalidSnapshot(format!(
                "node {} names a parent that does not list it",
                node.id()
            )));
        }
    }
    // Links agree, so a walk down from the roots reaches every node unless some form a cycle.
    let mut reached = 0;
    let mut stack: Vec<NodeId> = tree.roots().map(Node::id).collect();
    while let Some(id) = stack.pop() {
        reached += 1;
        if let Some(node) = tree.node(id) {
            stack.extend(node.children().iter().copied());
        }
    }
    if reached != tree.len() {
        return Err(DomError::InvalidSnapshot(format!(
            "{} nodes are not reachable from a root",
            tree.len() - reached
        )));
    }
    Ok(())
}
