use crate::dom_patch::{PatchBatch, PatchOp};
use crate::error::DomError;
use crate::tree::{MutationScope, TreeModel};

/// Apply `ops` in order inside an already active scope.
///
/// Fail-fast, not atomic: the first failing op stops application and every op before it stays
/// applied. Returns the number of ops applied.
pub fn apply_ops(
    tree: &mut TreeModel,
    scope: MutationScope,
    ops: &[PatchOp],
) -> Result<usize, DomError> {
    for (index, op) in ops.iter().enumerate() {
        log::trace!(target: "verso.apply", "op #{index}: {op:?}");
        if let Err(err) = apply_one(tree, scope, op) {
            log::warn!(
                target: "verso.apply",
                "op #{index} ({}) failed after {index} applied: {err}",
                op.kind()
            );
            return Err(err);
        }
    }
    Ok(ops.len())
}

fn apply_one(tree: &mut TreeModel, scope: MutationScope, op: &PatchOp) -> Result<(), DomError> {
    match op {
        PatchOp::EnsureNode { id, tag } => {
            tree.ensure_node(scope, *id, tag)?;
        }
        PatchOp::SetText { id, value } => tree.set_text(scope, *id, value)?,
        PatchOp::SetAttr { id, name, value } => tree.set_attr(scope, *id, name, value)?,
        PatchOp::AppendChild { parent, child } => tree.append_child(scope, *parent, *child)?,
        PatchOp::Remove { id } => {
            tree.remove_node(scope, *id)?;
        }
    }
    Ok(())
}

/// Enter a mutation scope and apply every op of `batch`, whatever its meta kind.
pub fn apply_batch(tree: &mut TreeModel, batch: &PatchBatch) -> Result<usize, DomError> {
    tree.run_mutating(|tree, scope| apply_ops(tree, scope, &batch.ops))
}
