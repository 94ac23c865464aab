//! Declaration placement.
//!
//! All declarations are lifted out first. Each local is then declared in
//! the innermost block holding all of its uses, right before the first
//! statement that mentions it, and merged into that statement when it is a
//! plain assignment.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::{VarId, VarTable};
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::visit::{count_expr_uses, for_each_expr, mentions_var, reads_var, stmt_blocks_mut, stmt_mentions_var};

pub fn run(body: &mut Block, vars: &mut VarTable) -> bool {
    let before = body.clone();
    hoist(body);
    for var in locals_in_order(body, vars) {
        place(body, var);
    }
    *body != before
}

fn hoist(block: &mut Block) {
    let old = std::mem::take(block);
    for stmt in old {
        match stmt {
            Stmt::Declare { init: None, .. } => {}
            Stmt::Declare {
                var,
                init: Some(init),
            } => block.push(Stmt::Expr(Expr::assign(Expr::Var(var), init))),
            other => block.push(other),
        }
    }
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            hoist(inner);
        }
    }
}

/// Non-parameter variables in order of first mention.
fn locals_in_order(block: &[Stmt], vars: &VarTable) -> Vec<VarId> {
    let mut seen = FxHashSet::default();
    let mut order = Vec::new();
    for_each_expr(block, &mut |expr| {
        if let Expr::Var(var) = expr {
            if !vars.get(*var).parameter && seen.insert(*var) {
                order.push(*var);
            }
        }
    });
    order
}

fn expr_mentions(expr: &Expr, var: VarId) -> bool {
    let mut uses = FxHashMap::default();
    count_expr_uses(expr, &mut uses);
    uses.get(&var).map_or(false, |u| u.total() > 0)
}

fn place(block: &mut Block, var: VarId) {
    let mentions: Vec<usize> = block
        .iter()
        .enumerate()
        .filter(|(_, stmt)| stmt_mentions_var(stmt, var))
        .map(|(idx, _)| idx)
        .collect();
    let Some(&first) = mentions.first() else {
        return;
    };
    if mentions.len() == 1 {
        if let Some(inner) = sink_target(&mut block[first], var) {
            place(inner, var);
            return;
        }
    }
    if let Stmt::Expr(Expr::Assign { target, value }) = &block[first] {
        if **target == Expr::Var(var) && !reads_var(value, var) {
            let init = (**value).clone();
            block[first] = Stmt::Declare {
                var,
                init: Some(init),
            };
            return;
        }
    }
    block.insert(first, Stmt::Declare { var, init: None });
}

/// The nested block of `stmt` that holds every use of `var`, if the
/// declaration can move there.
fn sink_target(stmt: &mut Stmt, var: VarId) -> Option<&mut Block> {
    match stmt {
        Stmt::If {
            cond,
            then_block,
            else_block,
        } => {
            if expr_mentions(cond, var) {
                return None;
            }
            match (mentions_var(then_block, var), mentions_var(else_block, var)) {
                (true, false) => Some(then_block),
                (false, true) => Some(else_block),
                _ => None,
            }
        }
        Stmt::While { cond, body, .. } => {
            if expr_mentions(cond, var) {
                return None;
            }
            // Only when no value flows around the back edge.
            let dead_on_entry = matches!(
                body.iter().find(|s| stmt_mentions_var(s, var)),
                Some(Stmt::Expr(Expr::Assign { target, value }))
                    if **target == Expr::Var(var) && !reads_var(value, var)
            );
            if dead_on_entry {
                Some(body)
            } else {
                None
            }
        }
        Stmt::Block(inner) => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompile::cleanup::test_support::*;
    use crate::decompile::descriptor::JvmType;
    use crate::decompile::expr::CompareOp;

    #[test]
    fn test_declarations_sink_into_branches() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let x = local(&mut vars, "var1", JvmType::Int);
        let y = local(&mut vars, "var2", JvmType::Int);
        let cond = Expr::compare(CompareOp::Eq, Expr::Var(p), Expr::int(0));
        let mut body = vec![
            set(x, Expr::int(1)),
            Stmt::if_then(cond.clone(), vec![set(y, Expr::int(2)), Stmt::Return(Some(Expr::Var(y)))]),
            Stmt::Return(Some(Expr::Var(x))),
        ];
        assert!(run(&mut body, &mut vars));
        assert_eq!(
            body,
            vec![
                Stmt::Declare {
                    var: x,
                    init: Some(Expr::int(1))
                },
                Stmt::if_then(
                    cond,
                    vec![
                        Stmt::Declare {
                            var: y,
                            init: Some(Expr::int(2))
                        },
                        Stmt::Return(Some(Expr::Var(y)))
                    ]
                ),
                Stmt::Return(Some(Expr::Var(x))),
            ]
        );
        assert!(!run(&mut body, &mut vars));
    }

    #[test]
    fn test_merge_variable_declared_before_branch() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let x = local(&mut vars, "var1", JvmType::Int);
        let cond = Expr::compare(CompareOp::Eq, Expr::Var(p), Expr::int(0));
        let branch = Stmt::If {
            cond,
            then_block: vec![set(x, Expr::int(1))],
            else_block: vec![set(x, Expr::int(2))],
        };
        let mut body = vec![branch.clone(), Stmt::Return(Some(Expr::Var(x)))];
        assert!(run(&mut body, &mut vars));
        assert_eq!(
            body,
            vec![
                Stmt::Declare { var: x, init: None },
                branch,
                Stmt::Return(Some(Expr::Var(x)))
            ]
        );
    }

    #[test]
    fn test_loop_carried_variable_stays_outside() {
        let mut vars = VarTable::new();
        let i = local(&mut vars, "var1", JvmType::Int);
        let t = local(&mut vars, "var2", JvmType::Int);
        let cond = Expr::compare(CompareOp::Lt, Expr::Var(i), Expr::int(10));
        let bump = set(
            i,
            Expr::Binary {
                op: crate::decompile::expr::BinOp::Add,
                left: Box::new(Expr::Var(t)),
                right: Box::new(Expr::int(1)),
                ty: JvmType::Int,
            },
        );
        let mut body = vec![
            set(i, Expr::int(0)),
            Stmt::While {
                label: None,
                cond: cond.clone(),
                body: vec![set(t, Expr::Var(i)), bump.clone()],
            },
            Stmt::Return(None),
        ];
        assert!(run(&mut body, &mut vars));
        assert_eq!(
            body[0],
            Stmt::Declare {
                var: i,
                init: Some(Expr::int(0))
            }
        );
        match &body[1] {
            Stmt::While { body, .. } => assert_eq!(
                body[0],
                Stmt::Declare {
                    var: t,
                    init: Some(Expr::Var(i))
                }
            ),
            other => panic!("unexpected {:?}", other),
        }
    }
}
