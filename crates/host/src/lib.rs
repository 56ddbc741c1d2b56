//! Transactional patch host: one-shot tick tokens, keyed identity, diagnostics, and the drop-in
//! adapter surface used by external renderers.

pub mod adapter;
pub mod events;
pub mod replay;

mod config;
mod diagnostics;
mod error;
mod identity;
mod tick;

pub use crate::adapter::DropInHost;
pub use crate::config::HostConfig;
pub use crate::diagnostics::{BatchDescriptor, DiagnosticRecord, DiagnosticsLog};
pub use crate::error::{HostError, TickProtocol, TokenViolation};
pub use crate::events::{DomEvent, ListenerKey};
pub use crate::identity::IdentityAllocator;
pub use crate::tick::{CommitResult, TickEnvelope, TickHost, TickState, TickToken};
pub use core_types::TickId;
