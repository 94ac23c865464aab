//! Copy propagation.
//!
//! Walks the body in execution order keeping a map from variable to the
//! variable it was last copied from. Reads are rewritten to the root of
//! their alias. At an `if` only aliases that survive both arms are kept;
//! a loop first forgets every variable its body assigns.

use rustc_hash::FxHashMap;

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::{VarId, VarTable};
use crate::decompile::structured_types::{block_can_complete_normally, Block, Stmt};
use crate::decompile::visit::{assigned_vars, replace_var_reads, stmt_exprs_mut};

use super::assignment;

type Aliases = FxHashMap<VarId, VarId>;

pub fn run(body: &mut Block, _vars: &mut VarTable) -> bool {
    let mut aliases = Aliases::default();
    propagate(body, &mut aliases)
}

fn kill(aliases: &mut Aliases, var: VarId) {
    aliases.remove(&var);
    aliases.retain(|_, root| *root != var);
}

fn rewrite(expr: &mut Expr, aliases: &Aliases) -> bool {
    replace_var_reads(expr, &mut |var| aliases.get(&var).map(|root| Expr::Var(*root)))
}

fn intersect(mut left: Aliases, right: &Aliases) -> Aliases {
    left.retain(|var, root| right.get(var) == Some(root));
    left
}

fn propagate(block: &mut Block, aliases: &mut Aliases) -> bool {
    let mut changed = false;
    for stmt in block.iter_mut() {
        match stmt {
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                changed |= rewrite(cond, aliases);
                let mut then_state = aliases.clone();
                let mut else_state = aliases.clone();
                changed |= propagate(then_block, &mut then_state);
                changed |= propagate(else_block, &mut else_state);
                *aliases = match (
                    block_can_complete_normally(then_block),
                    block_can_complete_normally(else_block),
                ) {
                    (true, true) => intersect(then_state, &else_state),
                    (true, false) => then_state,
                    (false, true) => else_state,
                    (false, false) => Aliases::default(),
                };
            }
            Stmt::While { cond, body, .. } => {
                for var in assigned_vars(body) {
                    kill(aliases, var);
                }
                changed |= rewrite(cond, aliases);
                let mut inner = aliases.clone();
                changed |= propagate(body, &mut inner);
            }
            Stmt::Block(inner) => changed |= propagate(inner, aliases),
            other => {
                for expr in stmt_exprs_mut(other) {
                    changed |= rewrite(expr, aliases);
                }
                if let Stmt::Declare { var, .. } = other {
                    kill(aliases, *var);
                }
                for var in assigned_vars(std::slice::from_ref(other)) {
                    kill(aliases, var);
                }
                if let Some((target, Expr::Var(source))) = assignment(other) {
                    if target != *source {
                        aliases.insert(target, *source);
                    }
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompile::cleanup::test_support::*;
    use crate::decompile::descriptor::JvmType;
    use crate::decompile::expr::CompareOp;

    #[test]
    fn test_straight_line_copies() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let a = local(&mut vars, "var1", JvmType::Int);
        let mut body = vec![set(a, Expr::Var(p)), Stmt::Return(Some(Expr::Var(a)))];
        assert!(run(&mut body, &mut vars));
        assert_eq!(body[1], Stmt::Return(Some(Expr::Var(p))));
    }

    #[test]
    fn test_branches_keep_only_common_aliases() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let q = param(&mut vars, "param1", JvmType::Int);
        let a = local(&mut vars, "var2", JvmType::Int);
        let b = local(&mut vars, "var3", JvmType::Int);
        let cond = Expr::compare(CompareOp::Eq, Expr::Var(p), Expr::int(0));
        let mut body = vec![
            set(b, Expr::Var(q)),
            Stmt::If {
                cond: cond.clone(),
                then_block: vec![set(a, Expr::Var(p))],
                else_block: vec![set(a, Expr::Var(q))],
            },
            Stmt::Return(Some(Expr::Binary {
                op: crate::decompile::expr::BinOp::Add,
                left: Box::new(Expr::Var(a)),
                right: Box::new(Expr::Var(b)),
                ty: JvmType::Int,
            })),
        ];
        assert!(run(&mut body, &mut vars));
        match &body[2] {
            Stmt::Return(Some(Expr::Binary { left, right, .. })) => {
                assert_eq!(**left, Expr::Var(a));
                assert_eq!(**right, Expr::Var(q));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_loop_forgets_reassigned_variables() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let a = local(&mut vars, "var1", JvmType::Int);
        let cond = Expr::compare(CompareOp::Gt, Expr::Var(a), Expr::int(0));
        let mut body = vec![
            set(a, Expr::Var(p)),
            Stmt::While {
                label: None,
                cond: cond.clone(),
                body: vec![set(a, Expr::int(0))],
            },
            Stmt::Return(Some(Expr::Var(a))),
        ];
        assert!(!run(&mut body, &mut vars));
        assert!(matches!(&body[1], Stmt::While { cond: c, .. } if *c == cond));
        assert_eq!(body[2], Stmt::Return(Some(Expr::Var(a))));
    }
}
