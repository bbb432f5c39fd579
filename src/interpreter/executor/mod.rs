//! Statement execution and expression evaluation.
//!
//! Control flow travels as data: `break`, `continue`, and `return` are
//! ordinary [`Signal`] variants threaded up through enclosing constructs.
//! Faults are the error side of the `Result` and unwind until a `try`
//! intercepts them.

mod access;
mod calls;
mod declarations;
mod expressions;
mod operators;
mod statements;

use crate::error::RuntimeError;
use crate::interpreter::value::Value;

pub(crate) type RuntimeResult<T> = Result<T, RuntimeError>;

/// The non-fault outcome of executing a statement.
#[derive(Debug)]
pub(crate) enum Signal {
    Normal(Value),
    Break,
    Continue,
    Return(Value),
}
