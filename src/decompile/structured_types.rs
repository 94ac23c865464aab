use super::expr::Expr;
use super::java_ast::{LabelId, VarId};

/// An ordered statement list owning its children.
pub type Block = Vec<Stmt>;

/// Statement node.
///
/// The interpreter produces `Label` and `Goto`; the structurer removes them
/// again, so a finished method body only contains the structured forms.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Declare {
        var: VarId,
        init: Option<Expr>,
    },
    /// `if`, with an empty `else_block` when there is no else.
    If {
        cond: Expr,
        then_block: Block,
        else_block: Block,
    },
    While {
        label: Option<LabelId>,
        cond: Expr,
        body: Block,
    },
    Break(Option<LabelId>),
    Continue(Option<LabelId>),
    Return(Option<Expr>),
    Throw(Expr),
    Block(Block),
    Label(LabelId),
    /// Jump to a label, conditional when `cond` is set.
    Goto {
        label: LabelId,
        cond: Option<Expr>,
    },
}

impl Stmt {
    pub fn if_then(cond: Expr, then_block: Block) -> Stmt {
        Stmt::If {
            cond,
            then_block,
            else_block: Vec::new(),
        }
    }

    pub fn infinite_loop(label: Option<LabelId>, body: Block) -> Stmt {
        Stmt::While {
            label,
            cond: Expr::boolean(true),
            body,
        }
    }

    /// Return, throw, break, continue and unconditional goto.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Stmt::Return(_)
                | Stmt::Throw(_)
                | Stmt::Break(_)
                | Stmt::Continue(_)
                | Stmt::Goto { cond: None, .. }
        )
    }

    /// Conservative answer to "can execution continue after this statement".
    pub fn can_complete_normally(&self) -> bool {
        match self {
            Stmt::Return(_)
            | Stmt::Throw(_)
            | Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Goto { cond: None, .. } => false,
            Stmt::If {
                then_block,
                else_block,
                ..
            } => {
                else_block.is_empty()
                    || block_can_complete_normally(then_block)
                    || block_can_complete_normally(else_block)
            }
            Stmt::While { label, cond, body } => !cond.is_true() || breaks_out_of(body, *label),
            Stmt::Block(block) => block_can_complete_normally(block),
            Stmt::Expr(_) | Stmt::Declare { .. } | Stmt::Label(_) | Stmt::Goto { .. } => true,
        }
    }
}

pub fn block_can_complete_normally(block: &[Stmt]) -> bool {
    block.iter().all(Stmt::can_complete_normally)
}

/// Whether `body` of the loop labeled `label` contains a break that leaves
/// that loop: an unlabeled break outside nested loops, or a break naming the
/// label.
pub fn breaks_out_of(body: &[Stmt], label: Option<LabelId>) -> bool {
    targets_loop(body, label, false, &|stmt| match stmt {
        Stmt::Break(target) => Some(*target),
        _ => None,
    })
}

/// Like [`breaks_out_of`], for `continue` statements.
pub fn continues_loop(body: &[Stmt], label: Option<LabelId>) -> bool {
    targets_loop(body, label, false, &|stmt| match stmt {
        Stmt::Continue(target) => Some(*target),
        _ => None,
    })
}

fn targets_loop(
    block: &[Stmt],
    label: Option<LabelId>,
    nested: bool,
    jump: &dyn Fn(&Stmt) -> Option<Option<LabelId>>,
) -> bool {
    block.iter().any(|stmt| {
        if let Some(target) = jump(stmt) {
            return match target {
                None => !nested,
                Some(l) => Some(l) == label,
            };
        }
        match stmt {
            Stmt::If {
                then_block,
                else_block,
                ..
            } => targets_loop(then_block, label, nested, jump) || targets_loop(else_block, label, nested, jump),
            Stmt::While { body, .. } => targets_loop(body, label, true, jump),
            Stmt::Block(inner) => targets_loop(inner, label, nested, jump),
            _ => false,
        }
    })
}
