//! Structural tidying of `if` statements and of loops left running once.

use std::mem;

use crate::decompile::descriptor::JvmType;
use crate::decompile::expr::{negate, BinOp, Expr};
use crate::decompile::java_ast::VarTable;
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::structuring::unwrap_single_pass_loops;
use crate::decompile::visit::stmt_blocks_mut;

pub fn run(body: &mut Block, vars: &mut VarTable) -> bool {
    simplify_block(body, vars)
}

fn is_single_if(block: &[Stmt]) -> bool {
    matches!(block, [Stmt::If { .. }])
}

/// The part of a condition worth keeping as a statement once its value is
/// no longer needed, if it is a valid Java expression statement.
fn discarded(cond: Expr) -> Option<Expr> {
    match cond {
        Expr::Paren(inner) | Expr::Unary { operand: inner, .. } => discarded(*inner),
        Expr::Compare { left, right, .. } if right.is_pure() => discarded(*left),
        Expr::Compare { left, right, .. } if left.is_pure() => discarded(*right),
        effect @ (Expr::Call { .. } | Expr::Assign { .. } | Expr::New { .. }) => Some(effect),
        _ => None,
    }
}

fn simplify_block(block: &mut Block, vars: &VarTable) -> bool {
    let mut changed = false;
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= simplify_block(inner, vars);
        }
    }

    let mut idx = 0;
    while idx < block.len() {
        let Stmt::If {
            cond,
            then_block,
            else_block,
        } = &mut block[idx]
        else {
            idx += 1;
            continue;
        };

        // if (true) / if (false)
        if cond.is_true() || cond.is_false() {
            let taken = if cond.is_true() {
                mem::take(then_block)
            } else {
                mem::take(else_block)
            };
            let width = taken.len();
            block.splice(idx..idx + 1, taken);
            changed = true;
            idx += width;
            continue;
        }

        // if (c) {} else {}
        if then_block.is_empty() && else_block.is_empty() {
            if cond.is_pure() {
                block.remove(idx);
                changed = true;
                continue;
            }
            if let Some(effect) = discarded(cond.clone()) {
                block[idx] = Stmt::Expr(effect);
                changed = true;
            }
            idx += 1;
            continue;
        }

        // if (c) {} else { X }  =>  if (!c) { X }
        if then_block.is_empty() {
            *cond = negate(mem::replace(cond, Expr::null()), vars);
            mem::swap(then_block, else_block);
            changed = true;
        }

        // if (a) { if (b) { X } }  =>  if (a && b) { X }
        if else_block.is_empty() {
            if let [Stmt::If {
                else_block: inner_else,
                ..
            }] = then_block.as_slice()
            {
                if inner_else.is_empty() {
                    if let Some(Stmt::If {
                        cond: inner_cond,
                        then_block: inner_then,
                        ..
                    }) = then_block.pop()
                    {
                        let outer = mem::replace(cond, Expr::null());
                        *cond = Expr::Binary {
                            op: BinOp::CondAnd,
                            left: Box::new(outer),
                            right: Box::new(inner_cond),
                            ty: JvmType::Boolean,
                        };
                        *then_block = inner_then;
                        changed = true;
                        continue;
                    }
                }
            }
        }

        // if (c) { if .. } else { X }  =>  if (!c) { X } else { if .. }
        if is_single_if(then_block) && !else_block.is_empty() && !is_single_if(else_block) {
            *cond = negate(mem::replace(cond, Expr::null()), vars);
            mem::swap(then_block, else_block);
            changed = true;
        }
        idx += 1;
    }
    changed |= unwrap_single_pass_loops(block);
    changed
}
