//! Quill: the execution core of a dynamically typed, class-based scripting
//! language.
//!
//! The crate consumes an AST produced by an external parser and evaluates
//! it: values are objects, function sets, or classes; inheritance is
//! flattened at declaration time; calls resolve among typed overloads; and
//! control flow travels as data while faults unwind as errors.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod span;

pub use error::RuntimeError;
pub use interpreter::{Interpreter, InterpretOptions};
pub use span::Span;
