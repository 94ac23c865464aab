//! Single-use inlining of values that can move freely.

use rustc_hash::FxHashMap;

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::{VarId, VarTable};
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::visit::{
    assigned_vars, count_uses, reads_var, replace_var_reads, stmt_blocks_mut, stmt_exprs, stmt_exprs_mut,
    VarUse,
};

use super::assignment;

pub fn run(body: &mut Block, _vars: &mut VarTable) -> bool {
    let uses = count_uses(body);
    inline_in(body, &uses)
}

/// Literals, variable reads, `this`/`super` and casts of those. Anything
/// larger stays in its local.
fn is_movable(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) | Expr::Var(_) | Expr::This | Expr::Super | Expr::OuterThis(_) => true,
        Expr::Cast { operand, .. } | Expr::Paren(operand) => is_movable(operand),
        _ => false,
    }
}

fn inline_in(block: &mut Block, uses: &FxHashMap<VarId, VarUse>) -> bool {
    let mut changed = false;
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= inline_in(inner, uses);
        }
    }

    let mut idx = 0;
    while idx + 1 < block.len() {
        let candidate = match assignment(&block[idx]) {
            Some((var, value)) => {
                let used = uses.get(&var).copied().unwrap_or_default();
                let next = &block[idx + 1];
                let eligible = used.reads == 1
                    && used.writes == 1
                    && is_movable(value)
                    && !reads_var(value, var)
                    && !matches!(next, Stmt::While { .. })
                    && !assigned_vars(std::slice::from_ref(next))
                        .into_iter()
                        .any(|v| reads_var(value, v))
                    && stmt_exprs(next).into_iter().any(|e| reads_var(e, var));
                eligible.then(|| (var, value.clone()))
            }
            None => None,
        };
        match candidate {
            Some((var, value)) => {
                for expr in stmt_exprs_mut(&mut block[idx + 1]) {
                    replace_var_reads(expr, &mut |v| (v == var).then(|| value.clone()));
                }
                block.remove(idx);
                changed = true;
            }
            None => idx += 1,
        }
    }
    changed
}
