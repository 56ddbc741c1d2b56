//! Decoding of externally supplied patch batches.
//!
//! Accepted shape: `{"metaKind"?: "commit"|"rollback"|"fallback", "ops": [..], "reason"?: ..}`
//! with ops tagged by `kind`. A missing `metaKind` means `commit`.

use crate::dom_patch::{MetaKind, PatchBatch, PatchOp};
use crate::error::DomError;
use serde_json::{Map, Value};

pub fn decode_batch(input: &str) -> Result<PatchBatch, DomError> {
    let value: Value =
        serde_json::from_str(input).map_err(|err| DomError::InvalidBatch(err.to_string()))?;
    batch_from_value(value)
}

pub fn batch_from_value(value: Value) -> Result<PatchBatch, DomError> {
    let Value::Object(mut fields) = value else {
        return Err(DomError::InvalidBatch("batch must be an object".into()));
    };
    let meta_kind = match fields.remove("metaKind") {
        None | Some(Value::Null) => MetaKind::Commit,
        Some(raw) => serde_json::from_value(raw)
            .map_err(|err| DomError::InvalidBatch(format!("metaKind: {err}")))?,
    };
    let Some(Value::Array(raw_ops)) = fields.remove("ops") else {
        return Err(DomError::InvalidBatch("ops must be an array".into()));
    };
    let reason = match fields.remove("reason") {
        None | Some(Value::Null) => None,
        Some(Value::String(reason)) => Some(reason),
        Some(_) => return Err(DomError::InvalidBatch("reason must be a string".into())),
    };
    let ops = raw_ops
        .into_iter()
        .enumerate()
        .map(|(index, raw)| decode_op(index, raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatchBatch {
        meta_kind,
        ops,
        reason,
    })
}

fn decode_op(index: usize, raw: Value) -> Result<PatchOp, DomError> {
    let kind = op_kind(index, &raw)?;
    if !PatchOp::KINDS.iter().any(|known| *known == kind) {
        return Err(DomError::UnknownOpKind(kind.to_string()));
    }
    serde_json::from_value(raw).map_err(|err| DomError::InvalidBatch(format!("op #{index}: {err}")))
}

fn op_kind(index: usize, raw: &Value) -> Result<&str, DomError> {
    let fields: &Map<String, Value> = raw
        .as_object()
        .ok_or_else(|| DomError::InvalidBatch(format!("op #{index} must be an object")))?;
    fields
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| DomError::InvalidBatch(format!("op #{index} has no string kind")))
}
