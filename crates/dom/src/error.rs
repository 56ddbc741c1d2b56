use crate::types::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("invalid patch batch: {0}")]
    InvalidBatch(String),
    #[error("unknown patch op kind `{0}`")]
    UnknownOpKind(String),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node id 0 is reserved")]
    InvalidNodeId,
    #[error("mutation outside an active mutation scope")]
    MutationOutsideScope,
    #[error("appending {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("snapshot encoding failed: {0}")]
    SnapshotEncoding(String),
}
