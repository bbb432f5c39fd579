//! Abstract syntax tree consumed by the evaluator.

pub mod expr;
pub mod stmt;

pub use expr::{Argument, BinaryOp, Expr, ExprKind, ListItem, MapEntry, StringPart, UnaryOp};
pub use stmt::{
    AccessLevel, CatchClause, ClassDecl, ClassMember, ConstructorDecl, EnumDecl, FieldDecl,
    FunctionDecl, ParamDecl, Program, PropertyDecl, Stmt, StmtKind, SwitchCase, VarDecl,
};
