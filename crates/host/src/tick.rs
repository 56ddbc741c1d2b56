//! Transactional tick lifecycle.
//!
//! `Idle -> Active` on `begin_tick`, back to `Idle` on the one commit, rollback or fallback the
//! tick allows. Tokens are checked before state: a token from an earlier tick is `WrongTick`,
//! the token of the tick that just completed is `AlreadyConsumed`.
//!
//! A failed submission leaves the tick `Active` and its token unconsumed so the caller can still
//! fall back. Ops applied before a failing op stay applied.

use crate::config::HostConfig;
use crate::diagnostics::{BatchDescriptor, DiagnosticRecord, DiagnosticsLog};
use crate::error::{HostError, TickProtocol, TokenViolation};
use crate::identity::IdentityAllocator;
use core_types::TickId;
use dom::{
    Fingerprint, MetaKind, NodeId, PatchBatch, Snapshot, TreeModel, apply_batch, serialize,
};
use serde::{Deserialize, Serialize};

/// One-shot capability for the tick that issued it.
///
/// A token is the tick ordinal and nothing more. It deserializes so that [`TickEnvelope`] can
/// carry it across a transport, which means a caller can forge the token of the active tick.
/// What the host enforces is that a token only works for its own tick, and only until that tick
/// completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickToken {
    tick_id: TickId,
}

impl TickToken {
    pub fn tick_id(&self) -> TickId {
        self.tick_id
    }
}

/// Transport form of a submission, where the token may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEnvelope {
    #[serde(default)]
    pub token: Option<TickToken>,
    pub batch: PatchBatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickState {
    Idle,
    Active,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitResult {
    pub tick_id: TickId,
    pub meta_kind: MetaKind,
    pub snapshot: Snapshot,
    pub fingerprint: Fingerprint,
}

#[derive(Debug)]
pub struct TickHost {
    config: HostConfig,
    tree: TreeModel,
    identity: IdentityAllocator,
    state: TickState,
    tick: TickId,
    consumed: bool,
    diagnostics: DiagnosticsLog,
    last_batch: Option<BatchDescriptor>,
}

impl TickHost {
    pub fn new() -> Self {
        Self::from_parts(HostConfig::default(), TreeModel::new())
    }

    pub fn with_config(config: HostConfig) -> Result<Self, HostError> {
        config.validate()?;
        Ok(Self::from_parts(config, TreeModel::new()))
    }

    /// Host over an existing tree, e.g. one restored from a snapshot for replay.
    pub fn with_tree(config: HostConfig, tree: TreeModel) -> Result<Self, HostError> {
        config.validate()?;
        Ok(Self::from_parts(config, tree))
    }

    fn from_parts(config: HostConfig, tree: TreeModel) -> Self {
        Self {
            identity: IdentityAllocator::new(config.keyed_id_base),
            config,
            tree,
            state: TickState::Idle,
            tick: TickId::INITIAL,
            consumed: false,
            diagnostics: DiagnosticsLog::default(),
            last_batch: None,
        }
    }

    pub fn begin_tick(&mut self) -> Result<TickToken, HostError> {
        if self.state == TickState::Active {
            return Err(TickProtocol::TickAlreadyActive(self.tick).into());
        }
        self.tick = self.tick.next();
        self.consumed = false;
        self.state = TickState::Active;
        log::debug!(target: "verso.tick", "begin {}", self.tick);
        Ok(TickToken { tick_id: self.tick })
    }

    /// Ok only for the unconsumed token of the active tick.
    pub fn check_token(&self, token: &TickToken) -> Result<(), HostError> {
        if token.tick_id != self.tick {
            return Err(TokenViolation::WrongTick {
                expected: self.tick,
                got: token.tick_id,
            }
            .into());
        }
        if self.consumed {
            return Err(TokenViolation::AlreadyConsumed(token.tick_id).into());
        }
        if self.state != TickState::Active {
            return Err(TickProtocol::NoActiveTick.into());
        }
        Ok(())
    }

    /// Complete the active tick with `batch`.
    ///
    /// Commit batches are applied under a mutation scope; rollback and fallback batches must be
    /// empty and leave the tree untouched. Either way the result carries the current snapshot.
    pub fn commit(
        &mut self,
        token: &TickToken,
        batch: PatchBatch,
    ) -> Result<CommitResult, HostError> {
        self.complete(Some(token), batch)
    }

    pub fn submit(&mut self, envelope: TickEnvelope) -> Result<CommitResult, HostError> {
        self.complete(envelope.token.as_ref(), envelope.batch)
    }

    pub fn rollback(&mut self, token: &TickToken, reason: &str) -> Result<Snapshot, HostError> {
        self.commit(token, PatchBatch::rollback(reason))
            .map(|result| result.snapshot)
    }

    pub fn fallback(&mut self, token: &TickToken, reason: &str) -> Result<Snapshot, HostError> {
        self.commit(token, PatchBatch::fallback(reason))
            .map(|result| result.snapshot)
    }

    fn complete(
        &mut self,
        token: Option<&TickToken>,
        batch: PatchBatch,
    ) -> Result<CommitResult, HostError> {
        let token = token.ok_or(HostError::TokenViolation(TokenViolation::Missing))?;
        self.check_token(token)?;

        if batch.meta_kind.is_mutating() {
            if let Err(err) = apply_batch(&mut self.tree, &batch) {
                log::warn!(target: "verso.tick", "commit of {} failed: {err}", self.tick);
                return Err(err.into());
            }
        } else if !batch.ops.is_empty() {
            return Err(HostError::RollbackOpsNotEmpty {
                meta_kind: batch.meta_kind,
                count: batch.ops.len(),
            });
        }

        let snapshot = serialize(&self.tree)?;
        let fingerprint = snapshot.fingerprint();
        let meta_kind = batch.meta_kind;
        self.consumed = true;
        self.state = TickState::Idle;
        self.diagnostics.push(DiagnosticRecord {
            tick_id: self.tick,
            meta_kind,
            reason: batch.reason.clone(),
            fingerprint: meta_kind.is_mutating().then_some(fingerprint),
        });
        match meta_kind {
            MetaKind::Commit => log::debug!(
                target: "verso.tick",
                "commit {}: {} ops, fingerprint {fingerprint}",
                self.tick,
                batch.ops.len()
            ),
            _ => log::debug!(
                target: "verso.tick",
                "{meta_kind} {}: {}",
                self.tick,
                batch.reason.as_deref().unwrap_or("no reason")
            ),
        }
        self.last_batch = Some(BatchDescriptor::new(self.tick, batch));

        Ok(CommitResult {
            tick_id: self.tick,
            meta_kind,
            snapshot,
            fingerprint,
        })
    }

    /// Stable id for `key`, regardless of tick state.
    pub fn allocate_key(&mut self, key: &str) -> Result<NodeId, HostError> {
        self.identity.allocate(key)
    }

    pub fn identity(&self) -> &IdentityAllocator {
        &self.identity
    }

    pub fn snapshot(&self) -> Result<Snapshot, HostError> {
        Ok(serialize(&self.tree)?)
    }

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn state(&self) -> TickState {
        self.state
    }

    pub fn current_tick(&self) -> TickId {
        self.tick
    }

    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    pub fn last_batch(&self) -> Option<&BatchDescriptor> {
        self.last_batch.as_ref()
    }
}

impl Default for TickHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{DomError, PatchOp};

    fn ensure(id: u32, tag: &str) -> PatchOp {
        PatchOp::EnsureNode {
            id: NodeId(id),
            tag: tag.into(),
        }
    }

    #[test]
    fn begin_twice_is_a_protocol_violation() {
        let mut host = TickHost::new();
        let token = host.begin_tick().unwrap();
        assert_eq!(
            host.begin_tick(),
            Err(HostError::TickProtocolViolation(
                TickProtocol::TickAlreadyActive(token.tick_id())
            ))
        );
    }

    #[test]
    fn token_is_single_use() {
        let mut host = TickHost::new();
        let token = host.begin_tick().unwrap();
        host.commit(&token, PatchBatch::commit(vec![ensure(1, "div")]))
            .unwrap();
        assert_eq!(
            host.commit(&token, PatchBatch::default()),
            Err(HostError::TokenViolation(TokenViolation::AlreadyConsumed(
                token.tick_id()
            )))
        );
        assert_eq!(host.diagnostics().len(), 1);
    }

    #[test]
    fn old_token_fails_in_next_tick() {
        let mut host = TickHost::new();
        let first = host.begin_tick().unwrap();
        host.commit(&first, PatchBatch::default()).unwrap();
        let second = host.begin_tick().unwrap();
        assert_eq!(
            host.check_token(&first),
            Err(HostError::TokenViolation(TokenViolation::WrongTick {
                expected: second.tick_id(),
                got: first.tick_id(),
            }))
        );
        assert!(host.check_token(&second).is_ok());
    }

    #[test]
    fn missing_token_and_idle_host_are_refused() {
        let mut host = TickHost::new();
        let envelope = TickEnvelope {
            token: None,
            batch: PatchBatch::default(),
        };
        assert_eq!(
            host.submit(envelope),
            Err(HostError::TokenViolation(TokenViolation::Missing))
        );
        let forged: TickToken = serde_json::from_str(r#"{"tickId":0}"#).unwrap();
        assert_eq!(
            host.submit(TickEnvelope {
                token: Some(forged),
                batch: PatchBatch::default(),
            }),
            Err(HostError::TickProtocolViolation(TickProtocol::NoActiveTick))
        );
    }

    #[test]
    fn rollback_with_ops_is_rejected_and_tick_stays_open() {
        let mut host = TickHost::new();
        let token = host.begin_tick().unwrap();
        let mut batch = PatchBatch::rollback("discard");
        batch.ops.push(ensure(9, "p"));
        assert_eq!(
            host.commit(&token, batch),
            Err(HostError::RollbackOpsNotEmpty {
                meta_kind: MetaKind::Rollback,
                count: 1
            })
        );
        assert_eq!(host.state(), TickState::Active);
        host.rollback(&token, "discard").unwrap();
        assert_eq!(host.state(), TickState::Idle);
    }

    #[test]
    fn failed_commit_keeps_partial_ops_and_allows_fallback() {
        let mut host = TickHost::new();
        let token = host.begin_tick().unwrap();
        let batch = PatchBatch::commit(vec![
            ensure(1, "div"),
            PatchOp::SetText {
                id: NodeId(2),
                value: "nope".into(),
            },
        ]);
        assert_eq!(
            host.commit(&token, batch),
            Err(HostError::Dom(DomError::UnknownNode(NodeId(2))))
        );
        assert!(host.diagnostics().is_empty());
        assert!(host.tree().contains(NodeId(1)));

        let snapshot = host.fallback(&token, "commit failed").unwrap();
        assert_eq!(snapshot, host.snapshot().unwrap());
        let record = host.diagnostics().last().unwrap();
        assert_eq!(record.meta_kind, MetaKind::Fallback);
        assert_eq!(record.reason.as_deref(), Some("commit failed"));
        assert_eq!(record.fingerprint, None);
        assert!(!host.tree().in_mutation_scope());
    }

    #[test]
    fn last_batch_describes_completed_submission() {
        let mut host = TickHost::new();
        assert!(host.last_batch().is_none());
        let token = host.begin_tick().unwrap();
        host.commit(&token, PatchBatch::commit(vec![ensure(1, "div")]))
            .unwrap();
        let last = host.last_batch().unwrap();
        assert_eq!(last.tick_id, token.tick_id());
        assert_eq!(last.meta_kind, MetaKind::Commit);
        assert_eq!(last.ops, vec![ensure(1, "div")]);
        assert_eq!(
            serde_json::to_string(last).unwrap(),
            r#"{"tickId":1,"metaKind":"commit","ops":[{"kind":"EnsureNode","nodeId":1,"tag":"div"}]}"#
        );
    }

    #[test]
    fn keyed_ids_start_at_configured_base() {
        let config = HostConfig {
            keyed_id_base: 50,
            ..HostConfig::default()
        };
        let mut host = TickHost::with_config(config).unwrap();
        assert_eq!(host.allocate_key("a").unwrap(), NodeId(50));
        assert_eq!(host.allocate_key("b").unwrap(), NodeId(51));
        assert_eq!(host.identity().get("a"), Some(NodeId(50)));
    }

    #[test]
    fn transported_tokens_only_work_for_their_own_live_tick() {
        let mut host = TickHost::new();
        let first = host.begin_tick().unwrap();
        host.commit(&first, PatchBatch::default()).unwrap();
        let second = host.begin_tick().unwrap();

        let stale: TickToken = serde_json::from_str(r#"{"tickId":1}"#).unwrap();
        assert_eq!(stale, first);
        assert!(matches!(
            host.check_token(&stale),
            Err(HostError::TokenViolation(TokenViolation::WrongTick { .. }))
        ));

        let current: TickToken = serde_json::from_str(r#"{"tickId":2}"#).unwrap();
        assert_eq!(current, second);
        host.submit(TickEnvelope {
            token: Some(current),
            batch: PatchBatch::default(),
        })
        .unwrap();
        assert_eq!(
            host.check_token(&current),
            Err(HostError::TokenViolation(TokenViolation::AlreadyConsumed(
                current.tick_id()
            )))
        );
    }
}
