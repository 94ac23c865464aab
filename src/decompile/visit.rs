//! Generic traversal over statements and expressions, plus the reference
//! counting and substitution helpers the rewriting passes share.

use rustc_hash::{FxHashMap, FxHashSet};

use super::expr::Expr;
use super::java_ast::{LabelId, VarId};
use super::structured_types::{Block, Stmt};

/// Direct subexpressions of `expr`, left to right.
pub fn children(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::Literal(_)
        | Expr::Var(_)
        | Expr::This
        | Expr::Super
        | Expr::OuterThis(_)
        | Expr::StaticField(_)
        | Expr::Alloc(_) => Vec::new(),
        Expr::Field { object, .. } => vec![&**object],
        Expr::ArrayElement { array, index, .. } => vec![&**array, &**index],
        Expr::ArrayLength(inner) | Expr::Paren(inner) => vec![&**inner],
        Expr::Unary { operand, .. } | Expr::Cast { operand, .. } | Expr::InstanceOf { operand, .. } => {
            vec![&**operand]
        }
        Expr::Binary { left, right, .. }
        | Expr::Compare { left, right, .. }
        | Expr::Compare3 { left, right, .. } => vec![&**left, &**right],
        Expr::Call { receiver, args, .. } => receiver.iter().map(|r| &**r).chain(args.iter()).collect(),
        Expr::ConstructorCall { receiver, args, .. } => std::iter::once(&**receiver).chain(args.iter()).collect(),
        Expr::New { args, .. } => args.iter().collect(),
        Expr::NewArray { dims, .. } => dims.iter().collect(),
        Expr::Assign { target, value } => vec![&**target, &**value],
    }
}

/// Mutable counterpart of [`children`].
pub fn children_mut(expr: &mut Expr) -> Vec<&mut Expr> {
    match expr {
        Expr::Literal(_)
        | Expr::Var(_)
        | Expr::This
        | Expr::Super
        | Expr::OuterThis(_)
        | Expr::StaticField(_)
        | Expr::Alloc(_) => Vec::new(),
        Expr::Field { object, .. } => vec![&mut **object],
        Expr::ArrayElement { array, index, .. } => vec![&mut **array, &mut **index],
        Expr::ArrayLength(inner) | Expr::Paren(inner) => vec![&mut **inner],
        Expr::Unary { operand, .. } | Expr::Cast { operand, .. } | Expr::InstanceOf { operand, .. } => {
            vec![&mut **operand]
        }
        Expr::Binary { left, right, .. }
        | Expr::Compare { left, right, .. }
        | Expr::Compare3 { left, right, .. } => vec![&mut **left, &mut **right],
        Expr::Call { receiver, args, .. } => receiver
            .iter_mut()
            .map(|r| &mut **r)
            .chain(args.iter_mut())
            .collect(),
        Expr::ConstructorCall { receiver, args, .. } => std::iter::once(&mut **receiver)
            .chain(args.iter_mut())
            .collect(),
        Expr::New { args, .. } => args.iter_mut().collect(),
        Expr::NewArray { dims, .. } => dims.iter_mut().collect(),
        Expr::Assign { target, value } => vec![&mut **target, &mut **value],
    }
}

/// Visit `expr` and all its subexpressions, parents first.
pub fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    for child in children(expr) {
        walk_expr(child, f);
    }
}

/// Visit `expr` and all its subexpressions, children first, so `f` may
/// replace the node it is given.
pub fn walk_expr_mut(expr: &mut Expr, f: &mut impl FnMut(&mut Expr)) {
    for child in children_mut(expr) {
        walk_expr_mut(child, f);
    }
    f(expr);
}

/// Expressions held directly by `stmt`, excluding nested blocks.
pub fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match stmt {
        Stmt::Expr(e) | Stmt::Throw(e) => vec![e],
        Stmt::Declare { init, .. } => init.iter().collect(),
        Stmt::If { cond, .. } | Stmt::While { cond, .. } => vec![cond],
        Stmt::Return(value) => value.iter().collect(),
        Stmt::Goto { cond, .. } => cond.iter().collect(),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Block(_) | Stmt::Label(_) => Vec::new(),
    }
}

pub fn stmt_exprs_mut(stmt: &mut Stmt) -> Vec<&mut Expr> {
    match stmt {
        Stmt::Expr(e) | Stmt::Throw(e) => vec![e],
        Stmt::Declare { init, .. } => init.iter_mut().collect(),
        Stmt::If { cond, .. } | Stmt::While { cond, .. } => vec![cond],
        Stmt::Return(value) => value.iter_mut().collect(),
        Stmt::Goto { cond, .. } => cond.iter_mut().collect(),
        Stmt::Break(_) | Stmt::Continue(_) | Stmt::Block(_) | Stmt::Label(_) => Vec::new(),
    }
}

/// Blocks nested directly in `stmt`.
pub fn stmt_blocks(stmt: &Stmt) -> Vec<&Block> {
    match stmt {
        Stmt::If {
            then_block,
            else_block,
            ..
        } => vec![then_block, else_block],
        Stmt::While { body, .. } => vec![body],
        Stmt::Block(block) => vec![block],
        _ => Vec::new(),
    }
}

pub fn stmt_blocks_mut(stmt: &mut Stmt) -> Vec<&mut Block> {
    match stmt {
        Stmt::If {
            then_block,
            else_block,
            ..
        } => vec![then_block, else_block],
        Stmt::While { body, .. } => vec![body],
        Stmt::Block(block) => vec![block],
        _ => Vec::new(),
    }
}

/// Visit every statement in `block`, including nested ones, parents first.
pub fn for_each_stmt<'a>(block: &'a [Stmt], f: &mut impl FnMut(&'a Stmt)) {
    for stmt in block {
        f(stmt);
        for inner in stmt_blocks(stmt) {
            for_each_stmt(inner, f);
        }
    }
}

/// Visit every expression node anywhere in `block`.
pub fn for_each_expr<'a>(block: &'a [Stmt], f: &mut impl FnMut(&'a Expr)) {
    for_each_stmt(block, &mut |stmt| {
        for expr in stmt_exprs(stmt) {
            walk_expr(expr, f);
        }
    });
}

/// Apply `f` to every root expression anywhere in `block`.
pub fn for_each_root_expr_mut(block: &mut [Stmt], f: &mut impl FnMut(&mut Expr)) {
    for stmt in block.iter_mut() {
        for expr in stmt_exprs_mut(stmt) {
            f(expr);
        }
        for inner in stmt_blocks_mut(stmt) {
            for_each_root_expr_mut(inner, f);
        }
    }
}

/// How a variable is used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VarUse {
    pub reads: usize,
    /// Plain assignments `x = ...`, declarations with initializer included.
    pub writes: usize,
    pub declarations: usize,
}

impl VarUse {
    pub fn total(&self) -> usize {
        self.reads + self.writes + self.declarations
    }
}

/// Count reads, writes and declarations of every variable in `expr`.
pub fn count_expr_uses(expr: &Expr, uses: &mut FxHashMap<VarId, VarUse>) {
    match expr {
        Expr::Var(id) => uses.entry(*id).or_default().reads += 1,
        Expr::Assign { target, value } => {
            match &**target {
                Expr::Var(id) => uses.entry(*id).or_default().writes += 1,
                other => {
                    for child in children(other) {
                        count_expr_uses(child, uses);
                    }
                }
            }
            count_expr_uses(value, uses);
        }
        other => {
            for child in children(other) {
                count_expr_uses(child, uses);
            }
        }
    }
}

/// Count the uses of every variable in `block`.
pub fn count_uses(block: &[Stmt]) -> FxHashMap<VarId, VarUse> {
    let mut uses: FxHashMap<VarId, VarUse> = FxHashMap::default();
    for_each_stmt(block, &mut |stmt| {
        if let Stmt::Declare { var, init } = stmt {
            let entry = uses.entry(*var).or_default();
            entry.declarations += 1;
            if init.is_some() {
                entry.writes += 1;
            }
        }
        for expr in stmt_exprs(stmt) {
            count_expr_uses(expr, &mut uses);
        }
    });
    uses
}

/// Whether `expr` reads `var` (plain assignment targets are not reads).
pub fn reads_var(expr: &Expr, var: VarId) -> bool {
    let mut uses = FxHashMap::default();
    count_expr_uses(expr, &mut uses);
    uses.get(&var).map_or(false, |u| u.reads > 0)
}

/// Whether `var` is mentioned at all in `block`.
pub fn mentions_var(block: &[Stmt], var: VarId) -> bool {
    count_uses(block).get(&var).map_or(false, |u| u.total() > 0)
}

/// Same as [`mentions_var`] for a single statement.
pub fn stmt_mentions_var(stmt: &Stmt, var: VarId) -> bool {
    mentions_var(std::slice::from_ref(stmt), var)
}

/// Variables assigned or declared with an initializer anywhere in `block`.
pub fn assigned_vars(block: &[Stmt]) -> FxHashSet<VarId> {
    count_uses(block)
        .into_iter()
        .filter(|(_, u)| u.writes > 0)
        .map(|(v, _)| v)
        .collect()
}

/// Replace reads of variables for which `f` returns a substitute. Returns
/// whether anything changed.
pub fn replace_var_reads(expr: &mut Expr, f: &mut impl FnMut(VarId) -> Option<Expr>) -> bool {
    match expr {
        Expr::Var(id) => match f(*id) {
            Some(replacement) => {
                *expr = replacement;
                true
            }
            None => false,
        },
        Expr::Assign { target, value } => {
            let mut changed = false;
            if !matches!(**target, Expr::Var(_)) {
                for child in children_mut(target) {
                    changed |= replace_var_reads(child, f);
                }
            }
            changed |= replace_var_reads(value, f);
            changed
        }
        other => {
            let mut changed = false;
            for child in children_mut(other) {
                changed |= replace_var_reads(child, f);
            }
            changed
        }
    }
}

/// Number of break/continue statements naming each label.
pub fn label_uses(block: &[Stmt]) -> FxHashMap<LabelId, usize> {
    let mut uses = FxHashMap::default();
    for_each_stmt(block, &mut |stmt| match stmt {
        Stmt::Break(Some(label)) | Stmt::Continue(Some(label)) | Stmt::Goto { label, .. } => {
            *uses.entry(*label).or_insert(0) += 1;
        }
        _ => {}
    });
    uses
}

/// Whether any `continue` in `block` names `label`.
pub fn continues_to(block: &[Stmt], label: LabelId) -> bool {
    let mut found = false;
    for_each_stmt(block, &mut |stmt| {
        if *stmt == Stmt::Continue(Some(label)) {
            found = true;
        }
    });
    found
}
