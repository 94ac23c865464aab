use std::sync::Arc;

pub use crate::code_attribute::{CmpKind, CompareOp, InvokeKind};

use super::descriptor::JvmType;
use super::java_ast::{VarId, VarTable};
use super::resolve::{FieldDescription, MethodDescription};

/// Constant values.
#[derive(Clone, Debug)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
    /// `T.class`
    Class(JvmType),
    Null,
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Long(a), Literal::Long(b)) => a == b,
            // Bitwise, so NaN literals compare equal to themselves.
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Double(a), Literal::Double(b)) => a.to_bits() == b.to_bits(),
            (Literal::Boolean(a), Literal::Boolean(b)) => a == b,
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Class(a), Literal::Class(b)) => a == b,
            (Literal::Null, Literal::Null) => true,
            _ => false,
        }
    }
}

impl Literal {
    pub fn ty(&self) -> JvmType {
        match self {
            Literal::Int(_) => JvmType::Int,
            Literal::Long(_) => JvmType::Long,
            Literal::Float(_) => JvmType::Float,
            Literal::Double(_) => JvmType::Double,
            Literal::Boolean(_) => JvmType::Boolean,
            Literal::String(_) => JvmType::string(),
            Literal::Class(_) => JvmType::class(super::descriptor::CLASS_CLASS),
            Literal::Null => JvmType::Null,
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    Ushr,
    And,
    Or,
    Xor,
    /// `&&`
    CondAnd,
    /// `||`
    CondOr,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Ushr => ">>>",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::CondAnd => "&&",
            BinOp::CondOr => "||",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    /// Logical not on a boolean operand.
    Not,
}

/// Expression tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Var(VarId),
    This,
    /// Receiver of `super.m(..)` / `super.f`, and of `super(..)` calls.
    Super,
    /// `Outer.this`, by internal name of the outer class.
    OuterThis(String),

    Field {
        object: Box<Expr>,
        field: Arc<FieldDescription>,
    },
    StaticField(Arc<FieldDescription>),
    ArrayElement {
        array: Box<Expr>,
        index: Box<Expr>,
        ty: JvmType,
    },
    ArrayLength(Box<Expr>),

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: JvmType,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: JvmType,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Result of lcmp/fcmpl/fcmpg/dcmpl/dcmpg: -1, 0, or 1
    Compare3 {
        kind: CmpKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cast {
        ty: JvmType,
        operand: Box<Expr>,
    },
    InstanceOf {
        operand: Box<Expr>,
        ty: JvmType,
    },

    /// A method call; `receiver` is `None` for static calls and `Super` for
    /// `super.m(..)`.
    Call {
        kind: InvokeKind,
        receiver: Option<Box<Expr>>,
        method: Arc<MethodDescription>,
        args: Vec<Expr>,
    },
    /// Uninitialized object from `new`, before its constructor runs.
    Alloc(String),
    /// `<init>` invoked on a receiver. `This`/`Super` receivers render as
    /// `this(..)`/`super(..)`.
    ConstructorCall {
        receiver: Box<Expr>,
        method: Arc<MethodDescription>,
        args: Vec<Expr>,
    },
    /// Allocation fused with its constructor call.
    New {
        method: Arc<MethodDescription>,
        args: Vec<Expr>,
    },
    /// `new T[d0][d1]...`; `ty` is the full array type, which may have more
    /// dimensions than `dims`.
    NewArray {
        ty: JvmType,
        dims: Vec<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Paren(Box<Expr>),
}

impl Expr {
    pub fn int(value: i32) -> Expr {
        Expr::Literal(Literal::Int(value))
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
            ty: JvmType::Boolean,
        }
    }

    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Expr::Var(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Boolean(true)))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Boolean(false)))
    }

    /// The static type of the expression. `this` and `super` have no type
    /// without the enclosing class and come back as `Unknown`.
    pub fn ty(&self, vars: &VarTable) -> JvmType {
        match self {
            Expr::Literal(lit) => lit.ty(),
            Expr::Var(id) => vars.ty(*id).clone(),
            Expr::This | Expr::Super => JvmType::Unknown,
            Expr::OuterThis(name) => JvmType::class(name.clone()),
            Expr::Field { field, .. } | Expr::StaticField(field) => field.ty.clone(),
            Expr::ArrayElement { ty, .. } => ty.clone(),
            Expr::ArrayLength(_) => JvmType::Int,
            Expr::Unary { ty, .. } | Expr::Binary { ty, .. } => ty.clone(),
            Expr::Compare { .. } | Expr::InstanceOf { .. } => JvmType::Boolean,
            Expr::Compare3 { .. } => JvmType::Int,
            Expr::Cast { ty, .. } => ty.clone(),
            Expr::Call { method, .. } => method.ret.clone(),
            Expr::Alloc(class) => JvmType::class(class.clone()),
            Expr::ConstructorCall { .. } => JvmType::Void,
            Expr::New { method, .. } => JvmType::class(method.owner.clone()),
            Expr::NewArray { ty, .. } => ty.clone(),
            Expr::Assign { target, .. } => target.ty(vars),
            Expr::Paren(inner) => inner.ty(vars),
        }
    }

    /// Values that can be duplicated or reordered freely: literals, `this`
    /// and plain variable reads.
    pub fn is_simple_value(&self) -> bool {
        matches!(
            self,
            Expr::Literal(_) | Expr::Var(_) | Expr::This | Expr::Super | Expr::OuterThis(_)
        )
    }

    /// True when evaluating the expression can neither throw nor have any
    /// effect besides producing its value.
    pub fn is_pure(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Var(_) | Expr::This | Expr::Super | Expr::OuterThis(_) => true,
            Expr::Paren(inner) => inner.is_pure(),
            Expr::Cast { ty, operand } => ty.is_primitive() && operand.is_pure(),
            Expr::Unary { operand, .. } => operand.is_pure(),
            Expr::Binary { op, left, right, ty } => {
                let may_trap = matches!(op, BinOp::Div | BinOp::Rem)
                    && matches!(ty, JvmType::Int | JvmType::Long);
                !may_trap && left.is_pure() && right.is_pure()
            }
            Expr::Compare { left, right, .. } | Expr::Compare3 { left, right, .. } => {
                left.is_pure() && right.is_pure()
            }
            Expr::InstanceOf { operand, .. } => operand.is_pure(),
            _ => false,
        }
    }

    /// Calls, allocations and assignments anywhere in the tree.
    pub fn has_side_effects(&self) -> bool {
        match self {
            Expr::Call { .. } | Expr::New { .. } | Expr::ConstructorCall { .. } | Expr::Assign { .. } => true,
            other => super::visit::children(other).into_iter().any(Expr::has_side_effects),
        }
    }

    /// Wrap for use as the operand of a unary operator or a cast.
    pub fn boxed(self) -> Box<Expr> {
        Box::new(self)
    }
}

/// Turn an int literal into a boolean literal when the value is consumed as
/// a boolean (store, return, argument).
pub fn coerce_to(expr: Expr, ty: &JvmType) -> Expr {
    match (expr, ty) {
        (Expr::Literal(Literal::Int(0)), JvmType::Boolean) => Expr::boolean(false),
        (Expr::Literal(Literal::Int(1)), JvmType::Boolean) => Expr::boolean(true),
        (expr, _) => expr,
    }
}

/// Logical negation of a condition.
///
/// Comparison operators are only flipped for non-floating operands; for
/// `float`/`double` the flipped comparison would differ on NaN, so the
/// condition is wrapped in `!` instead.
pub fn negate(expr: Expr, vars: &VarTable) -> Expr {
    match expr {
        Expr::Compare { op, left, right } => {
            let floating = left.ty(vars).is_floating() || right.ty(vars).is_floating();
            if floating {
                Expr::not(Expr::Compare { op, left, right })
            } else {
                Expr::Compare {
                    op: op.negate(),
                    left,
                    right,
                }
            }
        }
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
            ..
        } => *operand,
        Expr::Literal(Literal::Boolean(b)) => Expr::boolean(!b),
        Expr::Binary {
            op: op @ (BinOp::CondAnd | BinOp::CondOr),
            left,
            right,
            ty,
        } => Expr::Binary {
            op: if op == BinOp::CondAnd {
                BinOp::CondOr
            } else {
                BinOp::CondAnd
            },
            left: Box::new(negate(*left, vars)),
            right: Box::new(negate(*right, vars)),
            ty,
        },
        Expr::Paren(inner) => negate(*inner, vars),
        other => Expr::not(other),
    }
}
