/// Bytecode address of an instruction. Branch targets use the same space.
pub type Address = u32;

/// The kind of a local variable slot as encoded by the load/store opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocalKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

/// Element kind of the typed array load/store opcodes (`iaload`, `bastore`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
    /// `baload`/`bastore`, shared by byte and boolean arrays.
    Byte,
    Char,
    Short,
}

/// Operand kind of the arithmetic opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumKind {
    Int,
    Long,
    Float,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
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
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl CompareOp {
    /// Returns the negated comparison.
    pub fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Le => CompareOp::Gt,
        }
    }

    /// Java source token for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
        }
    }

    /// Evaluate the comparison on an ordering result.
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Ge => ordering != Less,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Le => ordering != Greater,
        }
    }
}

/// Compare instruction kinds (for lcmp, fcmpl, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpKind {
    LCmp,
    FCmpL,
    FCmpG,
    DCmpL,
    DCmpG,
}

impl CmpKind {
    /// The value pushed when either operand is NaN; `None` for `lcmp`.
    pub fn nan_result(&self) -> Option<i32> {
        match self {
            CmpKind::LCmp => None,
            CmpKind::FCmpL | CmpKind::DCmpL => Some(-1),
            CmpKind::FCmpG | CmpKind::DCmpG => Some(1),
        }
    }
}

/// Primitive conversion opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversion {
    I2l,
    I2f,
    I2d,
    L2i,
    L2f,
    L2d,
    F2i,
    F2l,
    F2d,
    D2i,
    D2l,
    D2f,
    I2b,
    I2c,
    I2s,
}

/// Method invocation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

/// A resolved field or method reference: owner class (internal name),
/// member name and descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// A loadable constant (`ldc`, `ldc_w`, `ldc2_w`).
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    /// Internal class name or array descriptor.
    Class(String),
}

/// A single JVM instruction with resolved operands. Branch targets are
/// absolute addresses.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    Nop,
    AconstNull,
    Iconst(i32),
    Lconst(i64),
    Fconst(f32),
    Dconst(f64),
    Ldc(Constant),

    Load(LocalKind, u16),
    Store(LocalKind, u16),
    Iinc { index: u16, value: i16 },

    ArrayLoad(ArrayKind),
    ArrayStore(ArrayKind),
    ArrayLength,
    /// `newarray` with the JVM primitive type code.
    Newarray(u8),
    /// `anewarray` with the element class name or array descriptor.
    Anewarray(String),
    Multianewarray { array_type: String, dimensions: u8 },

    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,

    Arith(ArithOp, NumKind),
    Neg(NumKind),
    Convert(Conversion),
    Compare(CmpKind),

    /// `ifeq`, `ifne`, ...: compare the top of the stack with zero.
    If(CompareOp, Address),
    IfICmp(CompareOp, Address),
    /// Only `Eq` and `Ne` are meaningful.
    IfACmp(CompareOp, Address),
    IfNull(Address),
    IfNonNull(Address),
    Goto(Address),
    Tableswitch {
        default: Address,
        low: i32,
        targets: Vec<Address>,
    },
    Lookupswitch {
        default: Address,
        pairs: Vec<(i32, Address)>,
    },

    GetField(MemberRef),
    PutField(MemberRef),
    GetStatic(MemberRef),
    PutStatic(MemberRef),
    Invoke(InvokeKind, MemberRef),
    InvokeDynamic { name: String, descriptor: String },
    New(String),
    CheckCast(String),
    InstanceOf(String),

    /// `return` when `None`, otherwise `ireturn`/`lreturn`/...
    Return(Option<LocalKind>),
    Athrow,

    MonitorEnter,
    MonitorExit,
    Jsr(Address),
    Ret(u16),
}

impl Instruction {
    /// All addresses this instruction may transfer control to, excluding
    /// fall-through.
    pub fn branch_targets(&self) -> Vec<Address> {
        match self {
            Instruction::If(_, t)
            | Instruction::IfICmp(_, t)
            | Instruction::IfACmp(_, t)
            | Instruction::IfNull(t)
            | Instruction::IfNonNull(t)
            | Instruction::Goto(t)
            | Instruction::Jsr(t) => vec![*t],
            Instruction::Tableswitch { default, targets, .. } => {
                let mut all = targets.clone();
                all.push(*default);
                all
            }
            Instruction::Lookupswitch { default, pairs } => {
                let mut all: Vec<Address> = pairs.iter().map(|(_, t)| *t).collect();
                all.push(*default);
                all
            }
            _ => Vec::new(),
        }
    }

    /// True when execution never continues with the next instruction.
    pub fn ends_flow(&self) -> bool {
        matches!(
            self,
            Instruction::Goto(_)
                | Instruction::Tableswitch { .. }
                | Instruction::Lookupswitch { .. }
                | Instruction::Return(_)
                | Instruction::Athrow
                | Instruction::Ret(_)
        )
    }

    /// JVM mnemonic-like name used in diagnostics.
    pub fn mnemonic(&self) -> String {
        match self {
            Instruction::InvokeDynamic { .. } => "invokedynamic".into(),
            Instruction::MonitorEnter => "monitorenter".into(),
            Instruction::MonitorExit => "monitorexit".into(),
            Instruction::Jsr(_) => "jsr".into(),
            Instruction::Ret(_) => "ret".into(),
            other => format!("{:?}", other).to_lowercase(),
        }
    }
}

/// An instruction paired with its bytecode address.
#[derive(Clone, Debug, PartialEq)]
pub struct AddressedInstruction {
    pub address: Address,
    pub instruction: Instruction,
}

/// The code of one method body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Code {
    pub max_locals: u16,
    pub instructions: Vec<AddressedInstruction>,
}

impl Code {
    pub fn new(max_locals: u16, instructions: Vec<AddressedInstruction>) -> Self {
        Self {
            max_locals,
            instructions,
        }
    }

    /// Build code whose instructions sit at addresses 0, 1, 2, ...; branch
    /// targets are then instruction indices.
    pub fn sequential(max_locals: u16, instructions: Vec<Instruction>) -> Self {
        let instructions = instructions
            .into_iter()
            .enumerate()
            .map(|(i, instruction)| AddressedInstruction {
                address: i as Address,
                instruction,
            })
            .collect();
        Self {
            max_locals,
            instructions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
