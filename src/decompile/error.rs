use thiserror::Error;

use crate::code_attribute::{Address, LocalKind};

/// Why a method (or class) could not be decompiled.
///
/// Every variant is the same failure kind, "decompilation not possible",
/// with a different reason. Errors are never recovered inside a method; the
/// class driver records them per method and moves on.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecompileError {
    #[error("decompilation not possible: stack mismatch at address {address}: {detail}")]
    StackMismatch { address: Address, detail: String },

    #[error("decompilation not possible: stack underflow at address {address}")]
    StackUnderflow { address: Address },

    #[error("decompilation not possible: {depth} value(s) left on the stack at exit (address {address})")]
    StackNotEmptyAtExit { address: Address, depth: usize },

    #[error("decompilation not possible: local {slot} ({kind:?}) read before any store at address {address}")]
    LocalReadBeforeStore {
        address: Address,
        slot: u16,
        kind: LocalKind,
    },

    #[error("decompilation not possible: unsupported opcode {opcode} at address {address}")]
    UnsupportedOpcode { address: Address, opcode: String },

    #[error("decompilation not possible: jump from {address} to unknown address {target}")]
    UnknownJumpTarget { address: Address, target: Address },

    #[error("decompilation not possible: execution falls off the end of the code")]
    FellOffEnd,

    #[error("decompilation not possible: irreducible control flow at {label}")]
    IrreducibleControlFlow { label: String },

    #[error("decompilation not possible: unexpected inner class shape in {class}: {reason}")]
    BadInnerClassShape { class: String, reason: String },

    #[error("decompilation not possible: {symbol} not found")]
    UnresolvedRequiredSymbol { symbol: String },
}

pub type Result<T> = std::result::Result<T, DecompileError>;
