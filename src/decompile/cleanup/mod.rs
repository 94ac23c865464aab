//! Rewrites that turn the structurer's output into readable Java.
//!
//! Each pass reports whether it changed the tree. [`run_pipeline`] repeats
//! the whole sequence until a round changes nothing.

mod alias;
mod ctor_fusion;
mod dead_assign;
mod inline;
mod scope;
mod self_assign;
mod simplify;

use tracing::{debug, trace, warn};

use super::expr::Expr;
use super::java_ast::{VarId, VarTable};
use super::structured_types::{Block, Stmt};

/// One cleanup pass.
pub struct Pass {
    pub name: &'static str,
    pub run: fn(&mut Block, &mut VarTable) -> bool,
}

/// The passes in the order they run.
pub const PASSES: [Pass; 7] = [
    Pass {
        name: "self-assignment",
        run: self_assign::run,
    },
    Pass {
        name: "constructor-fusion",
        run: ctor_fusion::run,
    },
    Pass {
        name: "alias-propagation",
        run: alias::run,
    },
    Pass {
        name: "dead-assignment",
        run: dead_assign::run,
    },
    Pass {
        name: "scope-narrowing",
        run: scope::run,
    },
    Pass {
        name: "single-use-inlining",
        run: inline::run,
    },
    Pass {
        name: "structural-simplification",
        run: simplify::run,
    },
];

/// Run all passes until none changes the tree, at most `max_rounds` times.
/// Returns the number of rounds run.
pub fn run_pipeline(body: &mut Block, vars: &mut VarTable, max_rounds: usize) -> usize {
    for round in 1..=max_rounds {
        let mut changed = false;
        for pass in PASSES.iter() {
            if (pass.run)(body, vars) {
                trace!(pass = pass.name, round, "pass changed the tree");
                changed = true;
            }
        }
        if !changed {
            debug!(rounds = round, "cleanup converged");
            return round;
        }
    }
    warn!(max_rounds, "cleanup did not converge");
    max_rounds
}

/// `x = e` as a statement, or the declaration `T x = e`.
pub(crate) fn assignment(stmt: &Stmt) -> Option<(VarId, &Expr)> {
    match stmt {
        Stmt::Expr(Expr::Assign { target, value }) => match &**target {
            Expr::Var(var) => Some((*var, &**value)),
            _ => None,
        },
        Stmt::Declare {
            var,
            init: Some(init),
        } => Some((*var, init)),
        _ => None,
    }
}

/// The right-hand side of an [`assignment`].
pub(crate) fn assignment_value_mut(stmt: &mut Stmt) -> Option<&mut Expr> {
    match stmt {
        Stmt::Expr(Expr::Assign { target, value }) if matches!(**target, Expr::Var(_)) => Some(&mut **value),
        Stmt::Declare {
            init: Some(init), ..
        } => Some(init),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::decompile::descriptor::JvmType;
    use crate::decompile::expr::Expr;
    use crate::decompile::java_ast::{VarId, VarTable, VariableDecl};
    use crate::decompile::structured_types::Stmt;

    pub fn local(vars: &mut VarTable, name: &str, ty: JvmType) -> VarId {
        vars.add(VariableDecl {
            ty,
            name: name.into(),
            synthetic: false,
            parameter: false,
            is_final: false,
            slot: None,
        })
    }

    pub fn param(vars: &mut VarTable, name: &str, ty: JvmType) -> VarId {
        vars.add(VariableDecl {
            ty,
            name: name.into(),
            synthetic: false,
            parameter: true,
            is_final: false,
            slot: None,
        })
    }

    pub fn set(var: VarId, value: Expr) -> Stmt {
        Stmt::Expr(Expr::assign(Expr::Var(var), value))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::decompile::descriptor::JvmType;

    #[test]
    fn test_pipeline_converges_and_is_idempotent() {
        let mut vars = VarTable::new();
        let p = param(&mut vars, "param0", JvmType::Int);
        let a = local(&mut vars, "var1", JvmType::Int);
        let b = local(&mut vars, "var2", JvmType::Int);
        let mut body = vec![
            set(a, Expr::Var(p)),
            set(b, Expr::Var(a)),
            set(b, Expr::Var(b)),
            Stmt::Return(Some(Expr::Var(b))),
        ];
        let rounds = run_pipeline(&mut body, &mut vars, 10);
        assert!(rounds > 1);
        assert_eq!(body, vec![Stmt::Return(Some(Expr::Var(p)))]);

        let snapshot = body.clone();
        assert_eq!(run_pipeline(&mut body, &mut vars, 10), 1);
        assert_eq!(body, snapshot);
    }
}
