//! Mirrored DOM-shaped tree, the patch ops that mutate it, and its canonical snapshot.

pub mod apply;
pub mod dom_snapshot;
pub mod wire;

mod dom_patch;
mod error;
mod fingerprint;
mod tree;
mod types;

pub use crate::apply::{apply_batch, apply_ops};
pub use crate::dom_patch::{MetaKind, PatchBatch, PatchOp};
pub use crate::dom_snapshot::{Snapshot, SnapshotNode, serialize};
pub use crate::error::DomError;
pub use crate::fingerprint::{Fingerprint, fingerprint};
pub use crate::tree::{MutationScope, TreeModel};
pub use crate::types::{Node, NodeId};
