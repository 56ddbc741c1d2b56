//! Replay of recorded batches against a snapshot, for verifying that two executions converged.

use crate::config::HostConfig;
use crate::diagnostics::BatchDescriptor;
use crate::error::HostError;
use crate::tick::{CommitResult, TickHost};
use dom::{Fingerprint, PatchBatch, Snapshot, TreeModel};

/// Apply `batch` to the tree described by `initial` inside a fresh tick.
pub fn replay_batch(initial: &str, batch: &PatchBatch) -> Result<CommitResult, HostError> {
    let tree = TreeModel::from_snapshot(initial)?;
    let mut host = TickHost::with_tree(HostConfig::default(), tree)?;
    let token = host.begin_tick()?;
    host.commit(&token, batch.clone())
}

/// Replay `batches` in order, one tick each, starting from `initial`.
///
/// Returns the fingerprint after every tick.
pub fn replay_sequence(
    initial: &str,
    batches: &[BatchDescriptor],
) -> Result<(Snapshot, Vec<Fingerprint>), HostError> {
    let tree = TreeModel::from_snapshot(initial)?;
    let mut host = TickHost::with_tree(HostConfig::default(), tree)?;
    let mut fingerprints = Vec::with_capacity(batches.len());
    for descriptor in batches {
        let token = host.begin_tick()?;
        let result = host.commit(&token, descriptor.to_batch())?;
        fingerprints.push(result.fingerprint);
    }
    Ok((host.snapshot()?, fingerprints))
}

/// Whether replaying `batch` on `initial` lands on `expected`.
pub fn verify(initial: &str, batch: &PatchBatch, expected: Fingerprint) -> Result<bool, HostError> {
    let result = replay_batch(initial, batch)?;
    if result.fingerprint != expected {
        log::warn!(
            target: "verso.tick",
            "replay diverged: expected {expected}, got {}",
            result.fingerprint
        );
        return Ok(false);
    }
    Ok(true)
}
