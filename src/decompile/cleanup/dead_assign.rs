//! Remove assignments to variables that are never read.
//!
//! A side-effect free right-hand side goes away with the assignment; any
//! other right-hand side stays behind as an expression statement.

use rustc_hash::FxHashSet;

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::{VarId, VarTable};
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::visit::{count_uses, stmt_blocks_mut};

use super::assignment;

pub fn run(body: &mut Block, _vars: &mut VarTable) -> bool {
    let dead: FxHashSet<VarId> = count_uses(body)
        .into_iter()
        .filter(|(_, uses)| uses.reads == 0)
        .map(|(var, _)| var)
        .collect();
    if dead.is_empty() {
        return false;
    }
    sweep(body, &dead)
}

fn sweep(block: &mut Block, dead: &FxHashSet<VarId>) -> bool {
    let mut changed = false;
    let old = std::mem::take(block);
    for stmt in old {
        if let Stmt::Declare { var, init: None } = &stmt {
            if dead.contains(var) {
                changed = true;
                continue;
            }
        }
        let keep_value = match assignment(&stmt) {
            Some((var, value)) if dead.contains(&var) => Some(!value.is_pure()),
            _ => None,
        };
        match keep_value {
            None => block.push(stmt),
            Some(keep) => {
                changed = true;
                if keep {
                    let value = match stmt {
                        Stmt::Expr(Expr::Assign { value, .. }) => Some(*value),
                        Stmt::Declare { init, .. } => init,
                        _ => None,
                    };
                    block.extend(value.map(Stmt::Expr));
                }
            }
        }
    }
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= sweep(inner, dead);
        }
    }
    changed
}
