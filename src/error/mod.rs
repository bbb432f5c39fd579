//! Runtime error taxonomy.
//!
//! Bind-time faults, user faults (`Fault`, carrying the thrown language
//! object), and host faults all travel through the same `Result` channel so
//! `catch` clauses treat them uniformly. Fatal conditions are in the same
//! enum but are never catchable.

use crate::interpreter::value::Value;
use crate::span::Span;
use thiserror::Error;

/// Runtime errors raised during evaluation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Unbound name '{0}' at {1}")]
    UnboundName(String, Span),

    #[error("No matching overload for {name}({given}); candidates: {candidates} at {span}")]
    NoMatchingOverload {
        name: String,
        given: String,
        candidates: String,
        span: Span,
    },

    #[error("Cannot reassign constant '{0}' at {1}")]
    ConstReassignment(String, Span),

    #[error("Member '{name}' is {access} at {span}")]
    AccessViolation {
        name: String,
        access: String,
        span: Span,
    },

    #[error("Cannot inherit from '{0}': its constructor is native at {1}")]
    UnsupportedInheritance(String, Span),

    #[error("Type error: {message} at {span}")]
    TypeError { message: String, span: Span },

    #[error("Division by zero at {0}")]
    DivisionByZero(Span),

    #[error("Cannot call {0} at {1}")]
    NotCallable(String, Span),

    #[error("{0} is not iterable at {1}")]
    NotIterable(String, Span),

    /// A user fault raised with `throw`, or a host fault wrapped into the
    /// fault channel. Carries the language object a catch clause binds.
    #[error("{message} at {span}")]
    Fault {
        value: Value,
        message: String,
        span: Span,
    },

    #[error("Call depth limit exceeded at {0}")]
    StackOverflow(Span),

    #[error("Internal invariant violated: {message} at {span}")]
    Internal { message: String, span: Span },

    #[error("{message} at {span}")]
    General { message: String, span: Span },
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self::General {
            message: message.into(),
            span,
        }
    }

    pub fn unbound_name(name: impl Into<String>, span: Span) -> Self {
        Self::UnboundName(name.into(), span)
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::TypeError {
            message: message.into(),
            span,
        }
    }

    pub fn const_reassignment(name: impl Into<String>, span: Span) -> Self {
        Self::ConstReassignment(name.into(), span)
    }

    pub fn not_callable(what: impl Into<String>, span: Span) -> Self {
        Self::NotCallable(what.into(), span)
    }

    pub fn not_iterable(what: impl Into<String>, span: Span) -> Self {
        Self::NotIterable(what.into(), span)
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::Internal {
            message: message.into(),
            span,
        }
    }

    /// Fatal errors unwind past every catch clause.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::StackOverflow(_) | Self::Internal { .. }
        )
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnboundName(_, span) => *span,
            Self::NoMatchingOverload { span, .. } => *span,
            Self::ConstReassignment(_, span) => *span,
            Self::AccessViolation { span, .. } => *span,
            Self::UnsupportedInheritance(_, span) => *span,
            Self::TypeError { span, .. } => *span,
            Self::DivisionByZero(span) => *span,
            Self::NotCallable(_, span) => *span,
            Self::NotIterable(_, span) => *span,
            Self::Fault { span, .. } => *span,
            Self::StackOverflow(span) => *span,
            Self::Internal { span, .. } => *span,
            Self::General { span, .. } => *span,
        }
    }
}
