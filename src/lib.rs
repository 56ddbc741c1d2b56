//! Deterministic, transactional mirror of a DOM-shaped tree.
//!
//! External computations drive the tree one tick at a time through [`host::TickHost`] or the
//! [`host::DropInHost`] adapter; every commit yields a canonical [`dom::Snapshot`] and a
//! [`dom::Fingerprint`] that two executions can compare to prove they converged.

pub use core_types::TickId;
pub use dom;
pub use host;

pub use dom::{Fingerprint, MetaKind, NodeId, PatchBatch, PatchOp, Snapshot, TreeModel};
pub use host::{CommitResult, DropInHost, HostConfig, HostError, TickHost, TickToken};
