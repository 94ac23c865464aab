//! A decompiler core for [Java class files](https://docs.oracle.com/javase/specs/jvms/se10/html/jvms-4.html):
//! tokenized method bytecode in, structured Java syntax trees out.
//!
//! ```rust
//! use classfile_decompiler::code_attribute::{Code, Instruction, LocalKind};
//! use classfile_decompiler::decompile::{DecompileOptions, Decompiler, NoClasses};
//! use classfile_decompiler::types::{ClassDefinition, MethodAccessFlags, MethodDefinition};
//!
//! let mut class = ClassDefinition::new("demo/Adder", Some("java/lang/Object"));
//! let code = Code::sequential(0, vec![
//!     Instruction::Iconst(1),
//!     Instruction::Iconst(2),
//!     Instruction::Arith(classfile_decompiler::code_attribute::ArithOp::Add,
//!                        classfile_decompiler::code_attribute::NumKind::Int),
//!     Instruction::Return(Some(LocalKind::Int)),
//! ]);
//! class.methods.push(MethodDefinition::new(
//!     "three", "()I", MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC, Some(code)));
//!
//! let decompiler = Decompiler::new(DecompileOptions::default(), NoClasses);
//! let method = decompiler.decompile_method(&class, "three", "()I").unwrap();
//! assert!(method.body.is_some());
//! ```

#[macro_use]
extern crate bitflags;

pub mod code_attribute;
pub mod decompile;
pub mod types;

pub use types::*;
