//! Drop `x = x` and expression statements that do nothing.

use crate::decompile::expr::Expr;
use crate::decompile::java_ast::VarTable;
use crate::decompile::structured_types::{Block, Stmt};
use crate::decompile::visit::stmt_blocks_mut;

pub fn run(body: &mut Block, _vars: &mut VarTable) -> bool {
    remove_noops(body)
}

fn is_noop(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(Expr::Assign { target, value }) => {
            matches!((&**target, &**value), (Expr::Var(a), Expr::Var(b)) if a == b)
        }
        Stmt::Expr(expr) => expr.is_pure(),
        _ => false,
    }
}

fn remove_noops(block: &mut Block) -> bool {
    let before = block.len();
    block.retain(|stmt| !is_noop(stmt));
    let mut changed = block.len() != before;
    for stmt in block.iter_mut() {
        for inner in stmt_blocks_mut(stmt) {
            changed |= remove_noops(inner);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompile::cleanup::test_support::*;
    use crate::decompile::descriptor::JvmType;

    #[test]
    fn test_removes_self_assignment_and_bare_reads() {
        let mut vars = VarTable::new();
        let x = local(&mut vars, "var1", JvmType::Int);
        let mut body = vec![
            set(x, Expr::Var(x)),
            Stmt::if_then(Expr::boolean(true), vec![Stmt::Expr(Expr::Var(x))]),
            set(x, Expr::int(3)),
        ];
        assert!(run(&mut body, &mut vars));
        assert_eq!(
            body,
            vec![Stmt::if_then(Expr::boolean(true), vec![]), set(x, Expr::int(3))]
        );
        assert!(!run(&mut body, &mut vars));
    }
}
