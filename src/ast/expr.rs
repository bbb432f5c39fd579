//! Expression AST nodes.
//!
//! The evaluator consumes these records from an external parser; every node
//! is a tagged kind plus a source span.

use crate::ast::stmt::{ParamDecl, Stmt};
use crate::span::Span;

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// An argument at a call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    /// `name: value`
    Named { name: String, value: Expr },
    /// `*expr`, expanded through the iteration protocol.
    Splat(Expr),
}

/// An element of a list literal.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Item(Expr),
    /// `*expr`, expanded in place.
    Splat(Expr),
}

/// An entry of a map literal.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEntry {
    Pair(Expr, Expr),
    /// `*expr`, expanded pairwise through the iteration protocol.
    Splat(Expr),
}

/// Part of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Literal(String),
    Expression(Expr),
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal: 42
    Int(i64),
    /// Float literal: 3.14
    Float(f64),
    /// Decimal literal, kept textual until evaluation: 1.50m
    Decimal(String),
    /// String literal: "hello"
    Str(String),
    /// Interpolated string: "hi {name}"
    Interpolated(Vec<StringPart>),
    /// Boolean literal
    Bool(bool),
    /// Null literal
    Null,

    /// Name reference: foo
    Name(String),

    /// Binary operation: a + b
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },

    /// Unary operation: -x, !x
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },

    /// Short-circuit and: a && b
    And { left: Box<Expr>, right: Box<Expr> },

    /// Short-circuit or: a || b
    Or { left: Box<Expr>, right: Box<Expr> },

    /// Null coalescing: a ?? b
    Coalesce { left: Box<Expr>, right: Box<Expr> },

    /// Ternary: cond ? a : b
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Member access: obj.field, or obj?.field when `safe`
    Member {
        object: Box<Expr>,
        name: String,
        safe: bool,
    },

    /// Index access: a[i]
    Index { object: Box<Expr>, index: Box<Expr> },

    /// Call: callee(args). A callee evaluating to a Class constructs.
    Call {
        callee: Box<Expr>,
        arguments: Vec<Argument>,
    },

    /// List literal: [1, 2, *rest]
    List(Vec<ListItem>),

    /// Map literal: { k: v, *other }
    Map(Vec<MapEntry>),

    /// Lambda literal, capturing the current scope by reference.
    Lambda {
        params: Vec<ParamDecl>,
        body: Vec<Stmt>,
    },

    /// Single-target assignment expression: x = v, obj.f = v, a[i] = v
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// The receiver of the nearest enclosing object-owned scope.
    This,

    /// The flattened super class of the receiver's class.
    Super,

    /// Fault-to-value adapter: catch(expr) yields (value, fault).
    CatchExpr(Box<Expr>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Subtract => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::Modulo => write!(f, "%"),
            BinaryOp::Equal => write!(f, "=="),
            BinaryOp::NotEqual => write!(f, "!="),
            BinaryOp::Less => write!(f, "<"),
            BinaryOp::LessEqual => write!(f, "<="),
            BinaryOp::Greater => write!(f, ">"),
            BinaryOp::GreaterEqual => write!(f, ">="),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}
