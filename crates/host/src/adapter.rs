//! Drop-in adapter driven by external renderers.
//!
//! Writes are token-checked and staged as patch ops; the tree only changes when the tick
//! commits. Rollback and fallback discard whatever was staged.

use crate::config::HostConfig;
use crate::diagnostics::{BatchDescriptor, DiagnosticsLog};
use crate::error::HostError;
use crate::events::{DomEvent, ListenerKey, ListenerRegistry};
use crate::tick::{CommitResult, TickHost, TickToken};
use dom::{NodeId, PatchBatch, PatchOp, Snapshot};

const LAYOUT_READ_REASON: &str = "layout-read";

#[derive(Debug, Default)]
pub struct DropInHost {
    host: TickHost,
    pending: Vec<PatchOp>,
    layout_read: bool,
    listeners: ListenerRegistry<DropInHost>,
}

impl DropInHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HostConfig) -> Result<Self, HostError> {
        Ok(Self {
            host: TickHost::with_config(config)?,
            ..Self::default()
        })
    }

    pub fn begin_tick(&mut self) -> Result<TickToken, HostError> {
        let token = self.host.begin_tick()?;
        self.pending.clear();
        self.layout_read = false;
        Ok(token)
    }

    fn stage(&mut self, token: &TickToken, op: PatchOp) -> Result<(), HostError> {
        self.host.check_token(token)?;
        self.pending.push(op);
        Ok(())
    }

    pub fn ensure_node(&mut self, token: &TickToken, id: NodeId, tag: &str) -> Result<(), HostError> {
        self.stage(
            token,
            PatchOp::EnsureNode {
                id,
                tag: tag.to_string(),
            },
        )
    }

    /// Stage an `EnsureNode` under the stable id of `key`.
    pub fn ensure_node_with_key(
        &mut self,
        token: &TickToken,
        key: &str,
        tag: &str,
    ) -> Result<NodeId, HostError> {
        self.host.check_token(token)?;
        let id = self.host.allocate_key(key)?;
        self.ensure_node(token, id, tag)?;
        Ok(id)
    }

    pub fn set_text(&mut self, token: &TickToken, id: NodeId, value: &str) -> Result<(), HostError> {
        self.stage(
            token,
            PatchOp::SetText {
                id,
                value: value.to_string(),
            },
        )
    }

    pub fn set_attr(
        &mut self,
        token: &TickToken,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), HostError> {
        self.stage(
            token,
            PatchOp::SetAttr {
                id,
                name: name.to_string(),
                value: value.to_string(),
            },
        )
    }

    pub fn append_child(
        &mut self,
        token: &TickToken,
        parent: NodeId,
        child: NodeId,
    ) -> Result<(), HostError> {
        self.stage(token, PatchOp::AppendChild { parent, child })
    }

    pub fn remove_node(&mut self, token: &TickToken, id: NodeId) -> Result<(), HostError> {
        self.stage(token, PatchOp::Remove { id })
    }

    /// Record a forced layout read during the tick.
    ///
    /// With `rollback_on_layout_read`, the next `commit` submits a rollback instead of the
    /// staged ops.
    pub fn layout_read(&mut self, token: &TickToken) -> Result<(), HostError> {
        self.host.check_token(token)?;
        if self.host.config().rollback_on_layout_read {
            log::debug!(
                target: "verso.tick",
                "layout read during {}, commit will roll back",
                token.tick_id()
            );
            self.layout_read = true;
        }
        Ok(())
    }

    /// Submit the staged ops as this tick's batch.
    ///
    /// Staged ops are cleared only once the host accepts the batch; a failed commit keeps them,
    /// so a retry fails the same way and the caller still has to fall back.
    pub fn commit(&mut self, token: &TickToken) -> Result<CommitResult, HostError> {
        self.host.check_token(token)?;
        let batch = if self.layout_read {
            PatchBatch::rollback(LAYOUT_READ_REASON)
        } else {
            PatchBatch::commit(self.pending.clone())
        };
        let result = self.host.commit(token, batch)?;
        self.pending.clear();
        Ok(result)
    }

    pub fn rollback(&mut self, token: &TickToken, reason: &str) -> Result<Snapshot, HostError> {
        self.host.check_token(token)?;
        self.pending.clear();
        self.host.rollback(token, reason)
    }

    pub fn fallback(&mut self, token: &TickToken, reason: &str) -> Result<Snapshot, HostError> {
        self.host.check_token(token)?;
        self.pending.clear();
        self.host.fallback(token, reason)
    }

    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: impl FnMut(&mut DropInHost, &DomEvent) -> Result<(), HostError> + 'static,
    ) {
        self.listeners.add(ListenerKey::new(node, event_type), handler);
    }

    /// Run the handlers for `(node, event_type)` in registration order.
    ///
    /// Stops at the first handler error. Returns the number of handlers invoked.
    pub fn dispatch_event(
        &mut self,
        node: NodeId,
        event_type: &str,
        detail: serde_json::Value,
    ) -> Result<usize, HostError> {
        let key = ListenerKey::new(node, event_type);
        let mut handlers = self.listeners.take(&key);
        let event = DomEvent {
            node,
            event_type: event_type.to_string(),
            detail,
        };
        log::trace!(
            target: "verso.events",
            "dispatch {event_type} on {node} to {} handlers",
            handlers.len()
        );
        let mut invoked = 0;
        let mut outcome = Ok(());
        for handler in handlers.iter_mut() {
            invoked += 1;
            if let Err(err) = handler(self, &event) {
                outcome = Err(err);
                break;
            }
        }
        self.listeners.restore(key, handlers);
        outcome.map(|()| invoked)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(&ListenerKey::new(node, event_type))
    }

    pub fn remove_event_listeners(&mut self, node: NodeId) -> usize {
        self.listeners.remove_node(node)
    }

    pub fn pending_ops(&self) -> &[PatchOp] {
        &self.pending
    }

    pub fn snapshot(&self) -> Result<Snapshot, HostError> {
        self.host.snapshot()
    }

    pub fn diagnostics(&self) -> &DiagnosticsLog {
        self.host.diagnostics()
    }

    pub fn last_batch(&self) -> Option<&BatchDescriptor> {
        self.host.last_batch()
    }

    pub fn host(&self) -> &TickHost {
        &self.host
    }
}
