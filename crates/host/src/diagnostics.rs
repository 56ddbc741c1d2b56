use core_types::TickId;
use dom::{Fingerprint, MetaKind, PatchBatch, PatchOp};
use serde::Serialize;

/// One completed tick outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    pub tick_id: TickId,
    pub meta_kind: MetaKind,
    pub reason: Option<String>,
    /// Set for commits; rollback and fallback records carry none.
    pub fingerprint: Option<Fingerprint>,
}

/// The batch submitted by the most recent completed tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDescriptor {
    pub tick_id: TickId,
    pub meta_kind: MetaKind,
    pub ops: Vec<PatchOp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BatchDescriptor {
    pub(crate) fn new(tick_id: TickId, batch: PatchBatch) -> Self {
        Self {
            tick_id,
            meta_kind: batch.meta_kind,
            ops: batch.ops,
            reason: batch.reason,
        }
    }

    /// The batch as it can be resubmitted or replayed.
    pub fn to_batch(&self) -> PatchBatch {
        PatchBatch {
            meta_kind: self.meta_kind,
            ops: self.ops.clone(),
            reason: self.reason.clone(),
        }
    }
}

/// Append-only trail of tick outcomes.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticsLog {
    records: Vec<DiagnosticRecord>,
}

impl DiagnosticsLog {
    pub(crate) fn push(&mut self, record: DiagnosticRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&DiagnosticRecord> {
        self.records.last()
    }

    pub fn count(&self, meta_kind: MetaKind) -> usize {
        self.records
            .iter()
            .filter(|record| record.meta_kind == meta_kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
