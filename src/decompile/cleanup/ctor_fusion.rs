//! Fuse `tmp = <alloc T>; ...; tmp.<init>(args)` into `tmp = new T(args)`,
//! then forward the new object into the variable it is copied to.

use rustc_hash::FxHashMap;

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::{VarId, VarTable};
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::visit::{count_uses, reads_var, stmt_blocks_mut, stmt_mentions_var, VarUse};

use super::{assignment, assignment_value_mut};

pub fn run(body: &mut Block, _vars: &mut VarTable) -> bool {
    let mut changed = fuse(body);
    let uses = count_uses(body);
    changed |= forward_copies(body, &uses);
    changed
}

fn allocation_target(stmt: &Stmt) -> Option<(VarId, &str)> {
    match assignment(stmt)? {
        (var, Expr::Alloc(class)) => Some((var, class)),
        _ => None,
    }
}

/// Index of the constructor call for `tmp` after `from`, if no statement in
/// between touches `tmp`.
fn find_constructor(block: &[Stmt], from: usize, tmp: VarId, class: &str) -> Option<usize> {
    for (idx, stmt) in block.iter().enumerate().skip(from + 1) {
        if let Stmt::Expr(Expr::ConstructorCall {
            receiver,
            method,
            args,
        }) = stmt
        {
            if **receiver == Expr::Var(tmp) {
                let clean_args = !args.iter().any(|arg| reads_var(arg, tmp));
                return (clean_args && method.owner == class).then_some(idx);
            }
        }
        if stmt_mentions_var(stmt, tmp) {
            return None;
        }
    }
    None
}

fn fuse(block: &mut Block) -> bool {
    let mut changed = false;
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= fuse(inner);
        }
    }

    let mut idx = 0;
    while idx < block.len() {
        let found = allocation_target(&block[idx])
            .and_then(|(tmp, class)| find_constructor(block, idx, tmp, class));
        let Some(ctor_idx) = found else {
            idx += 1;
            continue;
        };
        let ctor = std::mem::replace(&mut block[ctor_idx], Stmt::Block(Vec::new()));
        let Stmt::Expr(Expr::ConstructorCall { method, args, .. }) = ctor else {
            block[ctor_idx] = ctor;
            idx += 1;
            continue;
        };
        let mut alloc = block.remove(idx);
        if let Some(value) = assignment_value_mut(&mut alloc) {
            *value = Expr::New { method, args };
        }
        block[ctor_idx - 1] = alloc;
        changed = true;
    }
    changed
}

/// `tmp = new T(..); x = tmp;` with no other use of `tmp` becomes
/// `x = new T(..);`.
fn forward_copies(block: &mut Block, uses: &FxHashMap<VarId, VarUse>) -> bool {
    let mut changed = false;
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= forward_copies(inner, uses);
        }
    }

    let mut idx = 0;
    while idx + 1 < block.len() {
        let forwardable = match (assignment(&block[idx]), assignment(&block[idx + 1])) {
            (Some((tmp, Expr::New { .. })), Some((target, Expr::Var(source)))) => {
                let used = uses.get(&tmp).copied().unwrap_or_default();
                *source == tmp && target != tmp && used.reads == 1 && used.writes == 1
            }
            _ => false,
        };
        if forwardable {
            let mut fused = block.remove(idx);
            let value = assignment_value_mut(&mut fused).map(|v| std::mem::replace(v, Expr::null()));
            if let (Some(value), Some(slot)) = (value, assignment_value_mut(&mut block[idx])) {
                *slot = value;
                changed = true;
            }
        }
        idx += 1;
    }
    changed
}
