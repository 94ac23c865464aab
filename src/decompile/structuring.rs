//! Goto elimination.
//!
//! Every label gets up to two scopes over the flat statement list: a
//! forward scope that forward gotos can break out of, and a loop scope that
//! backward gotos can continue. Once the scopes nest, each one becomes a
//! labeled `while (true)` and the gotos become break/continue. A rewrite
//! loop then removes the scaffolding again.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::error::{DecompileError, Result};
use super::expr::{negate, Expr};
use super::java_ast::{LabelId, LabelTable, VarTable};
use super::structured_types::{
    block_can_complete_normally, breaks_out_of, continues_loop, Block, Stmt,
};
use super::visit::{continues_to, label_uses, stmt_blocks_mut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum ScopeKind {
    Forward,
    Loop,
}

#[derive(Clone, Copy, Debug)]
struct Scope {
    kind: ScopeKind,
    target: LabelId,
    /// First statement inside the scope.
    start: usize,
    /// One past the last statement inside the scope.
    end: usize,
}

impl Scope {
    /// `self` starts first and ends inside `other`.
    fn crosses(&self, other: &Scope) -> bool {
        self.start < other.start && other.start < self.end && self.end < other.end
    }
}

/// Turn a flat block of labels and gotos into structured statements.
///
/// Loops entered by a jump to their condition are rotated first. Fails
/// with [`DecompileError::IrreducibleControlFlow`] when a forward jump
/// lands inside a loop that starts after the jump.
pub fn structure(mut flat: Block, labels: &mut LabelTable, vars: &VarTable) -> Result<Block> {
    rotate_entered_loops(&mut flat, labels, vars);

    let positions = label_positions(&flat);

    let scopes = collect_scopes(&flat, &positions, labels)?;
    let scope_count = scopes.len();

    let mut forward_labels = FxHashMap::default();
    for scope in &scopes {
        if scope.kind == ScopeKind::Forward {
            forward_labels.insert(scope.target, labels.fresh());
        }
    }

    let mut builder = Builder {
        flat,
        scopes,
        next: 0,
        positions,
        forward_labels,
    };
    let len = builder.flat.len();
    let mut block = builder.build(0, len)?;

    let mut simplifier = Simplifier { vars, changed: true };
    let mut rounds = 0;
    while simplifier.changed {
        simplifier.changed = false;
        simplifier.simplify_block(&mut block);
        rounds += 1;
    }

    strip_innermost_labels(&mut block, None);
    let used = label_uses(&block);
    drop_unused_labels(&mut block, &used);

    debug!(scopes = scope_count, rounds, "structured control flow");
    Ok(block)
}

fn label_positions(flat: &[Stmt]) -> FxHashMap<LabelId, usize> {
    flat.iter()
        .enumerate()
        .filter_map(|(idx, stmt)| match stmt {
            Stmt::Label(label) => Some((*label, idx)),
            _ => None,
        })
        .collect()
}

/// Find `goto C; B: body; C: test; if (c) goto B` where nothing outside
/// the loop jumps into it except through `C`. Returns the positions of the
/// entry goto, of label `C` and of the back jump.
fn find_entered_loop(flat: &[Stmt]) -> Option<(usize, usize, usize)> {
    let positions = label_positions(flat);
    for g in 0..flat.len().saturating_sub(1) {
        let Stmt::Goto { label: entry, cond: None } = &flat[g] else {
            continue;
        };
        let Stmt::Label(head) = &flat[g + 1] else {
            continue;
        };
        let Some(&c) = positions.get(entry) else {
            continue;
        };
        let Some(e) = flat
            .iter()
            .rposition(|stmt| matches!(stmt, Stmt::Goto { label, .. } if label == head))
        else {
            continue;
        };
        if c <= g + 1 || e < c {
            continue;
        }
        let entered_elsewhere = flat.iter().enumerate().any(|(idx, stmt)| match stmt {
            Stmt::Goto { label, .. } if idx < g || idx > e => {
                label != entry && positions.get(label).map_or(false, |&p| p > g && p <= e)
            }
            _ => false,
        });
        if !entered_elsewhere {
            return Some((g, c, e));
        }
    }
    None
}

/// Rewrite loops entered by a jump to their test into top-tested form:
///
/// ```text
/// goto C; B: body; C: test; if (c) goto B
///   =>
/// C: test; if (!c) goto X; B: body; goto C; X:
/// ```
fn rotate_entered_loops(flat: &mut Block, labels: &mut LabelTable, vars: &VarTable) {
    let mut budget = flat.len();
    while budget > 0 {
        budget -= 1;
        let Some((g, c, e)) = find_entered_loop(flat) else {
            return;
        };
        let (Stmt::Goto { label: entry, .. }, Stmt::Label(head), Stmt::Goto { cond, .. }) =
            (&flat[g], &flat[g + 1], &flat[e])
        else {
            return;
        };
        let (entry, head, cond) = (*entry, *head, cond.clone());
        let exit = labels.fresh();

        let mut rotated: Block = Vec::with_capacity(e - g + 3);
        rotated.extend_from_slice(&flat[c..e]);
        if let Some(cond) = cond {
            rotated.push(Stmt::Goto {
                label: exit,
                cond: Some(negate(cond, vars)),
            });
        }
        rotated.push(Stmt::Label(head));
        rotated.extend_from_slice(&flat[g + 2..c]);
        rotated.push(Stmt::Goto { label: entry, cond: None });
        rotated.push(Stmt::Label(exit));
        flat.splice(g..=e, rotated);
        trace!(entry = labels.name(entry), "rotated loop entered at its test");
    }
}

fn collect_scopes(
    flat: &[Stmt],
    positions: &FxHashMap<LabelId, usize>,
    labels: &LabelTable,
) -> Result<Vec<Scope>> {
    let mut first_forward: FxHashMap<LabelId, usize> = FxHashMap::default();
    let mut last_backward: FxHashMap<LabelId, usize> = FxHashMap::default();
    for (idx, stmt) in flat.iter().enumerate() {
        if let Stmt::Goto { label, .. } = stmt {
            let pos = *positions
                .get(label)
                .ok_or_else(|| DecompileError::IrreducibleControlFlow {
                    label: labels.name(*label).to_string(),
                })?;
            if pos > idx {
                first_forward.entry(*label).or_insert(idx);
            } else {
                last_backward.insert(*label, idx);
            }
        }
    }

    let mut scopes: Vec<Scope> = Vec::new();
    for (target, start) in first_forward {
        scopes.push(Scope {
            kind: ScopeKind::Forward,
            target,
            start,
            end: positions[&target],
        });
    }
    for (target, last) in last_backward {
        scopes.push(Scope {
            kind: ScopeKind::Loop,
            target,
            start: positions[&target],
            end: last + 1,
        });
    }

    // Widen crossing scopes until everything nests.
    loop {
        let mut changed = false;
        for a in 0..scopes.len() {
            for b in 0..scopes.len() {
                let (first, second) = (scopes[a], scopes[b]);
                if !first.crosses(&second) {
                    continue;
                }
                if second.kind == ScopeKind::Forward {
                    scopes[b].start = first.start;
                } else if first.kind == ScopeKind::Loop {
                    scopes[a].end = second.end;
                } else {
                    return Err(DecompileError::IrreducibleControlFlow {
                        label: labels.name(first.target).to_string(),
                    });
                }
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Outer scopes first; a forward scope encloses a loop over the same range.
    scopes.sort_by(|x, y| {
        x.start
            .cmp(&y.start)
            .then(y.end.cmp(&x.end))
            .then(x.kind.cmp(&y.kind))
            .then(x.target.cmp(&y.target))
    });
    Ok(scopes)
}

struct Builder {
    flat: Block,
    scopes: Vec<Scope>,
    next: usize,
    positions: FxHashMap<LabelId, usize>,
    forward_labels: FxHashMap<LabelId, LabelId>,
}

impl Builder {
    fn build(&mut self, lo: usize, hi: usize) -> Result<Block> {
        let mut out = Vec::new();
        let mut idx = lo;
        while idx < hi {
            let nested = self
                .scopes
                .get(self.next)
                .copied()
                .filter(|scope| scope.start == idx && scope.end <= hi);
            if let Some(scope) = nested {
                self.next += 1;
                let mut body = self.build(scope.start, scope.end)?;
                let label = match scope.kind {
                    ScopeKind::Forward => self.forward_labels[&scope.target],
                    ScopeKind::Loop => scope.target,
                };
                body.push(Stmt::Break(Some(label)));
                out.push(Stmt::infinite_loop(Some(label), body));
                idx = scope.end;
                continue;
            }
            match &self.flat[idx] {
                Stmt::Label(_) => {}
                Stmt::Goto { label, cond } => {
                    let jump = if self.positions[label] > idx {
                        Stmt::Break(Some(self.forward_labels[label]))
                    } else {
                        Stmt::Continue(Some(*label))
                    };
                    match cond {
                        Some(cond) => out.push(Stmt::if_then(cond.clone(), vec![jump])),
                        None => out.push(jump),
                    }
                }
                other => out.push(other.clone()),
            }
            idx += 1;
        }
        Ok(out)
    }
}

/// Rewrite the body of a loop that runs at most once so that no statement
/// breaks out of it; code after a conditional break moves into the arm of
/// its `if` that falls through. `label` is the loop's label, if any.
/// Returns `None` when a break sits somewhere this cannot handle, such as a
/// nested loop, or when the following code would have to be duplicated.
fn lift_breaks(block: Block, label: Option<LabelId>) -> Option<Block> {
    let mut out = Vec::new();
    let mut iter = block.into_iter();
    while let Some(stmt) = iter.next() {
        match stmt {
            Stmt::Break(target) if target.is_none() || target == label => return Some(out),
            Stmt::If {
                cond,
                mut then_block,
                mut else_block,
            } if breaks_out_of(&then_block, label) || breaks_out_of(&else_block, label) => {
                let rest: Block = iter.collect();
                match (
                    block_can_complete_normally(&then_block),
                    block_can_complete_normally(&else_block),
                ) {
                    (true, true) if !rest.is_empty() => return None,
                    (true, true) | (false, false) => {}
                    (true, false) => then_block.extend(rest),
                    (false, true) => else_block.extend(rest),
                }
                out.push(Stmt::If {
                    cond,
                    then_block: lift_breaks(then_block, label)?,
                    else_block: lift_breaks(else_block, label)?,
                });
                return Some(out);
            }
            other => {
                if breaks_out_of(std::slice::from_ref(&other), label) {
                    return None;
                }
                out.push(other);
            }
        }
    }
    Some(out)
}

/// Replace `while (true)` loops that are never continued and never reach
/// the end of their body by their body. Only `block` itself is scanned,
/// not nested blocks.
pub(crate) fn unwrap_single_pass_loops(block: &mut Block) -> bool {
    let mut changed = false;
    let mut idx = 0;
    while idx < block.len() {
        let candidate = match &block[idx] {
            Stmt::While { label, cond, body }
                if cond.is_true()
                    && !continues_loop(body, *label)
                    && !block_can_complete_normally(body) =>
            {
                Some((*label, body.clone()))
            }
            _ => None,
        };
        if let Some((label, body)) = candidate {
            if let Some(lifted) = lift_breaks(body, label) {
                let width = lifted.len();
                block.splice(idx..idx + 1, lifted);
                trace!("unwrapped single-pass loop");
                changed = true;
                idx += width;
                continue;
            }
        }
        idx += 1;
    }
    changed
}

/// Drop a `continue label` in tail position of a loop body.
fn strip_tail_continue(block: &mut Block, label: LabelId) -> bool {
    match block.last_mut() {
        Some(Stmt::Continue(Some(l))) if *l == label => {
            block.pop();
            true
        }
        Some(Stmt::If {
            then_block,
            else_block,
            ..
        }) => {
            let then_changed = strip_tail_continue(then_block, label);
            let else_changed = strip_tail_continue(else_block, label);
            then_changed || else_changed
        }
        _ => false,
    }
}

struct Simplifier<'a> {
    vars: &'a VarTable,
    changed: bool,
}

impl<'a> Simplifier<'a> {
    fn simplify_block(&mut self, block: &mut Block) {
        for stmt in block.iter_mut() {
            for inner in stmt_blocks_mut(stmt) {
                self.simplify_block(inner);
            }
        }
        for stmt in block.iter_mut() {
            if let Stmt::While { label, cond, body } = stmt {
                if let Some(label) = *label {
                    self.simplify_loop(label, cond, body);
                }
            }
        }
        if unwrap_single_pass_loops(block) {
            self.changed = true;
        }
        self.truncate_dead_code(block);
        self.strip_duplicate_jumps(block);
        self.simplify_ifs(block);
    }

    fn simplify_loop(&mut self, label: LabelId, cond: &mut Expr, body: &mut Block) {
        if strip_tail_continue(body, label) {
            trace!("dropped tail continue");
            self.changed = true;
        }

        // if (c) { X; continue L; } break L;  =>  if (!c) break L; X
        let n = body.len();
        if n >= 2 && body[n - 1] == Stmt::Break(Some(label)) {
            let rewritable = matches!(
                &body[n - 2],
                Stmt::If { then_block, else_block, .. }
                    if else_block.is_empty() && then_block.last() == Some(&Stmt::Continue(Some(label)))
            );
            if rewritable {
                body.pop();
                if let Some(Stmt::If {
                    cond: inner,
                    mut then_block,
                    ..
                }) = body.pop()
                {
                    then_block.pop();
                    body.push(Stmt::if_then(negate(inner, self.vars), vec![Stmt::Break(Some(label))]));
                    body.extend(then_block);
                    trace!("rewrote loop tail");
                    self.changed = true;
                }
            }
        }

        // while (true) { if (c) break L; ... }  =>  while (!c) { ... }
        // Single-pass loops are left for unwrapping.
        let iterates = continues_to(body, label) || block_can_complete_normally(body);
        if cond.is_true() && iterates {
            let head_break = matches!(
                body.first(),
                Some(Stmt::If { then_block, else_block, .. })
                    if else_block.is_empty() && then_block.len() == 1 && then_block[0] == Stmt::Break(Some(label))
            );
            if head_break {
                if let Stmt::If { cond: exit, .. } = body.remove(0) {
                    *cond = negate(exit, self.vars);
                    trace!("extracted loop condition");
                    self.changed = true;
                }
            }
        }
    }

    fn truncate_dead_code(&mut self, block: &mut Block) {
        if let Some(pos) = block.iter().position(|stmt| !stmt.can_complete_normally()) {
            if pos + 1 < block.len() {
                block.truncate(pos + 1);
                self.changed = true;
            }
        }
    }

    /// `if (c) { ...; J } J`  =>  `if (c) { ... } J` for a jump `J`.
    fn strip_duplicate_jumps(&mut self, block: &mut Block) {
        for idx in 1..block.len() {
            if !block[idx].is_jump() {
                continue;
            }
            let jump = block[idx].clone();
            if let Stmt::If {
                then_block,
                else_block,
                ..
            } = &mut block[idx - 1]
            {
                if then_block.last() == Some(&jump) {
                    then_block.pop();
                    self.changed = true;
                }
                if else_block.last() == Some(&jump) {
                    else_block.pop();
                    self.changed = true;
                }
            }
        }
    }

    fn simplify_ifs(&mut self, block: &mut Block) {
        let mut idx = 0;
        while idx < block.len() {
            if let Stmt::If {
                cond,
                then_block,
                else_block,
            } = &mut block[idx]
            {
                if cond.is_true() {
                    let body = std::mem::take(then_block);
                    let width = body.len();
                    block.splice(idx..idx + 1, body);
                    self.changed = true;
                    idx += width;
                    continue;
                }
                if then_block.is_empty() && !else_block.is_empty() {
                    let flipped = negate(std::mem::replace(cond, Expr::null()), self.vars);
                    *cond = flipped;
                    std::mem::swap(then_block, else_block);
                    self.changed = true;
                }
            }
            idx += 1;
        }
    }
}

/// Unlabel break/continue statements that target their innermost loop.
fn strip_innermost_labels(block: &mut Block, innermost: Option<LabelId>) {
    for stmt in block.iter_mut() {
        match stmt {
            Stmt::Break(label) | Stmt::Continue(label) => {
                if label.is_some() && *label == innermost {
                    *label = None;
                }
            }
            Stmt::While { label, body, .. } => {
                let label = *label;
                strip_innermost_labels(body, label);
            }
            other => {
                for inner in stmt_blocks_mut(other) {
                    strip_innermost_labels(inner, innermost);
                }
            }
        }
    }
}

fn drop_unused_labels(block: &mut Block, used: &FxHashMap<LabelId, usize>) {
    for stmt in block.iter_mut() {
        if let Stmt::While { label, .. } = stmt {
            if label.map_or(false, |l| !used.contains_key(&l)) {
                *label = None;
            }
        }
        for inner in stmt_blocks_mut(stmt) {
            drop_unused_labels(inner, used);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompile::descriptor::JvmType;
    use crate::decompile::expr::{BinOp, CompareOp};
    use crate::decompile::java_ast::{VarId, VariableDecl};
    use crate::decompile::visit::for_each_stmt;

    fn int_var(vars: &mut VarTable, name: &str) -> VarId {
        vars.add(VariableDecl {
            ty: JvmType::Int,
            name: name.into(),
            synthetic: false,
            parameter: false,
            is_final: false,
            slot: None,
        })
    }

    fn set(var: VarId, value: i32) -> Stmt {
        Stmt::Expr(Expr::assign(Expr::Var(var), Expr::int(value)))
    }

    fn no_jumps_left(block: &[Stmt]) -> bool {
        let mut clean = true;
        for_each_stmt(block, &mut |stmt| {
            if matches!(stmt, Stmt::Goto { .. } | Stmt::Label(_)) {
                clean = false;
            }
        });
        clean
    }

    #[test]
    fn test_forward_skip_becomes_if() {
        let mut vars = VarTable::new();
        let x = int_var(&mut vars, "x");
        let mut labels = LabelTable::new();
        let skip = labels.fresh();
        let cond = Expr::compare(CompareOp::Eq, Expr::Var(x), Expr::int(0));
        let flat = vec![
            Stmt::Goto {
                label: skip,
                cond: Some(cond.clone()),
            },
            set(x, 1),
            Stmt::Label(skip),
            Stmt::Return(Some(Expr::Var(x))),
        ];
        let block = structure(flat, &mut labels, &vars).unwrap();
        assert_eq!(
            block,
            vec![
                Stmt::if_then(Expr::compare(CompareOp::Ne, Expr::Var(x), Expr::int(0)), vec![set(x, 1)]),
                Stmt::Return(Some(Expr::Var(x))),
            ]
        );
    }

    #[test]
    fn test_top_tested_loop_becomes_while() {
        let mut vars = VarTable::new();
        let n = int_var(&mut vars, "n");
        let mut labels = LabelTable::new();
        let head = labels.fresh();
        let exit = labels.fresh();
        let decrement = Stmt::Expr(Expr::assign(
            Expr::Var(n),
            Expr::Binary {
                op: BinOp::Sub,
                left: Box::new(Expr::Var(n)),
                right: Box::new(Expr::int(1)),
                ty: JvmType::Int,
            },
        ));
        let flat = vec![
            Stmt::Label(head),
            Stmt::Goto {
                label: exit,
                cond: Some(Expr::compare(CompareOp::Le, Expr::Var(n), Expr::int(0))),
            },
            decrement.clone(),
            Stmt::Goto { label: head, cond: None },
            Stmt::Label(exit),
            Stmt::Return(Some(Expr::Var(n))),
        ];
        let block = structure(flat, &mut labels, &vars).unwrap();
        assert_eq!(
            block,
            vec![
                Stmt::While {
                    label: None,
                    cond: Expr::compare(CompareOp::Gt, Expr::Var(n), Expr::int(0)),
                    body: vec![decrement],
                },
                Stmt::Return(Some(Expr::Var(n))),
            ]
        );
    }

    #[test]
    fn test_diamond_becomes_if_else() {
        let mut vars = VarTable::new();
        let c = int_var(&mut vars, "c");
        let x = int_var(&mut vars, "x");
        let mut labels = LabelTable::new();
        let other = labels.fresh();
        let join = labels.fresh();
        let flat = vec![
            Stmt::Goto {
                label: other,
                cond: Some(Expr::compare(CompareOp::Eq, Expr::Var(c), Expr::int(0))),
            },
            set(x, 1),
            Stmt::Goto { label: join, cond: None },
            Stmt::Label(other),
            set(x, 2),
            Stmt::Label(join),
            Stmt::Return(Some(Expr::Var(x))),
        ];
        let block = structure(flat, &mut labels, &vars).unwrap();
        assert_eq!(
            block,
            vec![
                Stmt::If {
                    cond: Expr::compare(CompareOp::Ne, Expr::Var(c), Expr::int(0)),
                    then_block: vec![set(x, 1)],
                    else_block: vec![set(x, 2)],
                },
                Stmt::Return(Some(Expr::Var(x))),
            ]
        );
    }

    #[test]
    fn test_jump_into_loop_is_irreducible() {
        let mut vars = VarTable::new();
        let x = int_var(&mut vars, "x");
        let mut labels = LabelTable::new();
        let body = labels.fresh();
        let middle = labels.fresh();
        let flat = vec![
            Stmt::Goto {
                label: middle,
                cond: Some(Expr::compare(CompareOp::Eq, Expr::Var(x), Expr::int(0))),
            },
            Stmt::Label(body),
            set(x, 1),
            Stmt::Label(middle),
            set(x, 2),
            Stmt::Goto {
                label: body,
                cond: Some(Expr::compare(CompareOp::Lt, Expr::Var(x), Expr::int(5))),
            },
            Stmt::Return(None),
        ];
        let err = structure(flat, &mut labels, &vars).unwrap_err();
        assert!(matches!(err, DecompileError::IrreducibleControlFlow { .. }));
    }

    #[test]
    fn test_nested_loops_keep_needed_labels() {
        let mut vars = VarTable::new();
        let x = int_var(&mut vars, "x");
        let mut labels = LabelTable::new();
        let outer = labels.fresh();
        let inner = labels.fresh();
        let flat = vec![
            Stmt::Label(outer),
            Stmt::Label(inner),
            set(x, 1),
            Stmt::Goto {
                label: outer,
                cond: Some(Expr::compare(CompareOp::Eq, Expr::Var(x), Expr::int(0))),
            },
            Stmt::Goto {
                label: inner,
                cond: Some(Expr::compare(CompareOp::Eq, Expr::Var(x), Expr::int(1))),
            },
            Stmt::Return(None),
        ];
        let block = structure(flat, &mut labels, &vars).unwrap();
        assert!(no_jumps_left(&block));
        assert!(matches!(block.first(), Some(Stmt::While { label: Some(_), .. })));
        assert_eq!(block.len(), 2);
        assert_eq!(block[1], Stmt::Return(None));
    }

    #[test]
    fn test_loop_entered_at_its_test_becomes_while() {
        let mut vars = VarTable::new();
        let n = int_var(&mut vars, "n");
        let mut labels = LabelTable::new();
        let body = labels.fresh();
        let test = labels.fresh();
        let decrement = Stmt::Expr(Expr::assign(
            Expr::Var(n),
            Expr::Binary {
                op: BinOp::Sub,
                left: Box::new(Expr::Var(n)),
                right: Box::new(Expr::int(1)),
                ty: JvmType::Int,
            },
        ));
        let flat = vec![
            Stmt::Goto { label: test, cond: None },
            Stmt::Label(body),
            decrement.clone(),
            Stmt::Label(test),
            Stmt::Goto {
                label: body,
                cond: Some(Expr::compare(CompareOp::Gt, Expr::Var(n), Expr::int(0))),
            },
            Stmt::Return(Some(Expr::Var(n))),
        ];
        let block = structure(flat, &mut labels, &vars).unwrap();
        assert_eq!(
            block,
            vec![
                Stmt::While {
                    label: None,
                    cond: Expr::compare(CompareOp::Gt, Expr::Var(n), Expr::int(0)),
                    body: vec![decrement],
                },
                Stmt::Return(Some(Expr::Var(n))),
            ]
        );
    }

    #[test]
    fn test_else_if_chain_leaves_single_pass_loop() {
        let mut vars = VarTable::new();
        let c = int_var(&mut vars, "c");
        let x = int_var(&mut vars, "x");
        let is = |v| Expr::compare(CompareOp::Eq, Expr::Var(c), Expr::int(v));
        let mut block = vec![
            Stmt::infinite_loop(
                None,
                vec![
                    Stmt::If {
                        cond: is(1),
                        then_block: vec![set(x, 1), Stmt::Break(None)],
                        else_block: vec![Stmt::if_then(is(2), vec![set(x, 2), Stmt::Break(None)])],
                    },
                    set(x, 0),
                    Stmt::Break(None),
                ],
            ),
            Stmt::Return(Some(Expr::Var(x))),
        ];
        assert!(unwrap_single_pass_loops(&mut block));
        assert_eq!(
            block,
            vec![
                Stmt::If {
                    cond: is(1),
                    then_block: vec![set(x, 1)],
                    else_block: vec![Stmt::If {
                        cond: is(2),
                        then_block: vec![set(x, 2)],
                        else_block: vec![set(x, 0)],
                    }],
                },
                Stmt::Return(Some(Expr::Var(x))),
            ]
        );
    }

    #[test]
    fn test_looping_body_is_not_unwrapped() {
        let mut vars = VarTable::new();
        let x = int_var(&mut vars, "x");
        let mut block = vec![Stmt::infinite_loop(
            None,
            vec![
                Stmt::if_then(
                    Expr::compare(CompareOp::Lt, Expr::Var(x), Expr::int(5)),
                    vec![Stmt::Continue(None)],
                ),
                Stmt::Break(None),
            ],
        )];
        assert!(!unwrap_single_pass_loops(&mut block));
    }

    #[test]
    fn test_straight_line_is_untouched() {
        let mut vars = VarTable::new();
        let x = int_var(&mut vars, "x");
        let flat = vec![set(x, 1), Stmt::Return(Some(Expr::Var(x)))];
        let block = structure(flat.clone(), &mut LabelTable::new(), &vars).unwrap();
        assert_eq!(block, flat);
    }
}
