//! Tokenized method code: instructions with resolved operands and absolute
//! branch targets, as produced by an external class-file reader.

mod types;

pub use self::types::*;
