//! Statement and declaration AST nodes.

use crate::ast::expr::Expr;
use crate::span::Span;

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression statement.
    Expression(Expr),

    /// Variable declaration, possibly destructuring: `a, b = expr`.
    Var(VarDecl),

    /// Multi-target destructuring assignment: `a, b.f = expr`.
    /// Single-target assignment is the Assign expression.
    Assign { targets: Vec<Expr>, value: Expr },

    /// Block: { statements }
    Block(Vec<Stmt>),

    /// If statement.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// While loop.
    While { condition: Expr, body: Box<Stmt> },

    /// For loop over the iteration protocol; several names destructure
    /// each element.
    For {
        names: Vec<String>,
        iterable: Expr,
        body: Box<Stmt>,
    },

    /// Switch over per-class equality; first matching case wins.
    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },

    /// Return, Break, Continue: carried as control signals, not faults.
    Return(Option<Expr>),
    Break,
    Continue,

    /// Raise a user fault.
    Throw(Expr),

    /// try / typed catches / finally.
    Try {
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },

    /// Function declaration; a repeated name merges into the existing
    /// FunctionSet in the same scope.
    Function(FunctionDecl),

    /// Class declaration.
    Class(ClassDecl),

    /// Enum declaration; lowers to a static class of constant ints.
    Enum(EnumDecl),
}

/// Accessibility of a declared member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AccessLevel {
    #[default]
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessLevel::Public => write!(f, "public"),
            AccessLevel::Protected => write!(f, "protected"),
            AccessLevel::Private => write!(f, "private"),
        }
    }
}

/// Variable declaration. More than one target destructures the initializer
/// through the iteration protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub targets: Vec<String>,
    /// Accepted class names; empty means any.
    pub types: Vec<String>,
    pub initializer: Option<Expr>,
    pub is_constant: bool,
    pub span: Span,
}

/// One parameter of an overload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    /// Accepted class names; empty means any.
    pub types: Vec<String>,
    pub default: Option<Expr>,
    pub is_variadic: bool,
    pub span: Span,
}

impl ParamDecl {
    pub fn untyped(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            default: None,
            is_variadic: false,
            span,
        }
    }
}

/// Function declaration: one overload of a named FunctionSet.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
    pub is_static: bool,
    pub access: AccessLevel,
    pub span: Span,
}

/// Class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub supers: Vec<String>,
    pub members: Vec<ClassMember>,
    pub is_static: bool,
    pub access: AccessLevel,
    pub span: Span,
}

/// A member inside a class body.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Field(FieldDecl),
    Method(FunctionDecl),
    Constructor(ConstructorDecl),
    Property(PropertyDecl),
}

/// Instance or static field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    /// Accepted class names; empty means any.
    pub types: Vec<String>,
    pub initializer: Option<Expr>,
    pub is_constant: bool,
    pub is_static: bool,
    pub access: AccessLevel,
    pub span: Span,
}

/// Constructor declaration: one overload of the class's constructor set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
    pub access: AccessLevel,
    pub span: Span,
}

/// Get/set accessor member. A getter-only property is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub name: String,
    pub getter: Option<Vec<Stmt>>,
    /// Setter parameter name and body.
    pub setter: Option<(String, Vec<Stmt>)>,
    pub is_static: bool,
    pub access: AccessLevel,
    pub span: Span,
}

/// Enum declaration. Variants without explicit values auto-number from the
/// previous variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<(String, Option<Expr>)>,
    pub access: AccessLevel,
    pub span: Span,
}

/// One case of a switch statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub labels: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// One catch clause of a try statement. An empty type list catches every
/// non-fatal fault.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub types: Vec<String>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A complete program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}
