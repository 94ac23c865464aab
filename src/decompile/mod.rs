//! Bytecode to Java syntax trees.
//!
//! A method body goes through three stages: the stack interpreter
//! ([`stack_sim`]) turns instructions into a flat list of statements, labels
//! and gotos; the structurer ([`structuring`]) replaces every goto with
//! labeled loops, `break` and `continue`; the cleanup passes ([`cleanup`])
//! rewrite the result until it stops changing. [`Decompiler`] runs the
//! stages for whole classes.

pub mod cfg;
pub mod class_decompiler;
pub mod cleanup;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod inner_class;
pub mod java_ast;
pub mod renderer;
pub mod resolve;
pub mod skeleton;
pub mod stack_sim;
pub mod structured_types;
pub mod structuring;
pub mod visit;

pub use self::class_decompiler::{DecompileOptions, Decompiler};
pub use self::error::{DecompileError, Result};
pub use self::renderer::{JavaRenderer, RenderConfig};
pub use self::resolve::{ClassCache, ClassInfo, ClassProvider, ClassSet, NoClasses};
