//! Patch protocol applied by the tick host.
//!
//! Invariants:
//! - Ops are applied strictly in sequence order.
//! - Node references must point to live nodes at the time they are used, except the id in
//!   `EnsureNode`.
//! - Child ordering is append order; appliers never sort children.
//! - `rollback` and `fallback` batches carry no ops.
//! - Node id 0 is never valid in a patch stream.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One mutation in a patch batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PatchOp {
    /// Create the node if absent. An existing node keeps its original tag.
    EnsureNode {
        #[serde(rename = "nodeId")]
        id: NodeId,
        tag: String,
    },
    SetText {
        #[serde(rename = "nodeId")]
        id: NodeId,
        value: String,
    },
    SetAttr {
        #[serde(rename = "nodeId")]
        id: NodeId,
        name: String,
        value: String,
    },
    /// Append `child` to the end of `parent`'s children, detaching it from any previous parent.
    AppendChild {
        #[serde(rename = "parentId")]
        parent: NodeId,
        #[serde(rename = "childId")]
        child: NodeId,
    },
    /// Remove a node and its entire subtree. Absent ids are a no-op.
    Remove {
        #[serde(rename = "nodeId")]
        id: NodeId,
    },
}

impl PatchOp {
    /// Wire names of every op kind.
    pub const KINDS: [&'static str; 5] =
        ["EnsureNode", "SetText", "SetAttr", "AppendChild", "Remove"];

    pub fn kind(&self) -> &'static str {
        match self {
            PatchOp::EnsureNode { .. } => "EnsureNode",
            PatchOp::SetText { .. } => "SetText",
            PatchOp::SetAttr { .. } => "SetAttr",
            PatchOp::AppendChild { .. } => "AppendChild",
            PatchOp::Remove { .. } => "Remove",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaKind {
    #[default]
    Commit,
    Rollback,
    Fallback,
}

impl MetaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetaKind::Commit => "commit",
            MetaKind::Rollback => "rollback",
            MetaKind::Fallback => "fallback",
        }
    }

    /// Rollback and fallback outcomes never mutate the tree.
    pub fn is_mutating(self) -> bool {
        matches!(self, MetaKind::Commit)
    }
}

impl fmt::Display for MetaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The ordered ops (or none) submitted for one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchBatch {
    #[serde(default)]
    pub meta_kind: MetaKind,
    pub ops: Vec<PatchOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PatchBatch {
    pub fn commit(ops: Vec<PatchOp>) -> Self {
        Self {
            meta_kind: MetaKind::Commit,
            ops,
            reason: None,
        }
    }

    pub fn rollback(reason: impl Into<String>) -> Self {
        Self {
            meta_kind: MetaKind::Rollback,
            ops: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            meta_kind: MetaKind::Fallback,
            ops: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_serialize_with_wire_field_names() {
        let op = PatchOp::AppendChild {
            parent: NodeId(1),
            child: NodeId(2),
        };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"kind":"AppendChild","parentId":1,"childId":2}"#);
    }

    #[test]
    fn batch_without_reason_omits_the_field() {
        let batch = PatchBatch::commit(vec![PatchOp::Remove { id: NodeId(4) }]);
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(
            json,
            r#"{"metaKind":"commit","ops":[{"kind":"Remove","nodeId":4}]}"#
        );
    }

    #[test]
    fn kind_names_cover_every_variant() {
        let ops = [
            PatchOp::EnsureNode {
                id: NodeId(1),
                tag: "div".into(),
            },
            PatchOp::SetText {
                id: NodeId(1),
                value: String::new(),
            },
            PatchOp::SetAttr {
                id: NodeId(1),
                name: "a".into(),
                value: "b".into(),
            },
            PatchOp::AppendChild {
                parent: NodeId(1),
                child: NodeId(2),
            },
            PatchOp::Remove { id: NodeId(1) },
        ];
        let kinds: Vec<_> = ops.iter().map(PatchOp::kind).collect();
        assert_eq!(kinds, PatchOp::KINDS);
        assert!(!MetaKind::Rollback.is_mutating());
        assert!(MetaKind::Commit.is_mutating());
    }
}
