//! AST construction helpers shared by the integration tests. The evaluator
//! consumes parser output, so tests assemble the same records by hand.

#![allow(dead_code)]

use quill::ast::*;
use quill::span::Span;
use quill::{Interpreter, RuntimeError};

pub fn sp() -> Span {
    Span::default()
}

pub fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind, sp())
}

pub fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, sp())
}

// Literals and names.

pub fn int(n: i64) -> Expr {
    expr(ExprKind::Int(n))
}

pub fn float(n: f64) -> Expr {
    expr(ExprKind::Float(n))
}

pub fn str_(s: &str) -> Expr {
    expr(ExprKind::Str(s.to_string()))
}

pub fn boolean(b: bool) -> Expr {
    expr(ExprKind::Bool(b))
}

pub fn null() -> Expr {
    expr(ExprKind::Null)
}

pub fn name(n: &str) -> Expr {
    expr(ExprKind::Name(n.to_string()))
}

pub fn this() -> Expr {
    expr(ExprKind::This)
}

pub fn super_() -> Expr {
    expr(ExprKind::Super)
}

pub fn list(items: Vec<Expr>) -> Expr {
    expr(ExprKind::List(items.into_iter().map(ListItem::Item).collect()))
}

pub fn map(entries: Vec<(Expr, Expr)>) -> Expr {
    expr(ExprKind::Map(
        entries
            .into_iter()
            .map(|(k, v)| MapEntry::Pair(k, v))
            .collect(),
    ))
}

// Compound expressions.

pub fn bin(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    expr(ExprKind::Binary {
        left: Box::new(left),
        operator: op,
        right: Box::new(right),
    })
}

pub fn add(left: Expr, right: Expr) -> Expr {
    bin(left, BinaryOp::Add, right)
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    bin(left, BinaryOp::Equal, right)
}

pub fn neg(operand: Expr) -> Expr {
    expr(ExprKind::Unary {
        operator: UnaryOp::Negate,
        operand: Box::new(operand),
    })
}

pub fn member(object: Expr, field: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        name: field.to_string(),
        safe: false,
    })
}

pub fn safe_member(object: Expr, field: &str) -> Expr {
    expr(ExprKind::Member {
        object: Box::new(object),
        name: field.to_string(),
        safe: true,
    })
}

pub fn index(object: Expr, idx: Expr) -> Expr {
    expr(ExprKind::Index {
        object: Box::new(object),
        index: Box::new(idx),
    })
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        arguments: args.into_iter().map(Argument::Positional).collect(),
    })
}

pub fn call_args(callee: Expr, arguments: Vec<Argument>) -> Expr {
    expr(ExprKind::Call {
        callee: Box::new(callee),
        arguments,
    })
}

pub fn named_arg(n: &str, value: Expr) -> Argument {
    Argument::Named {
        name: n.to_string(),
        value,
    }
}

pub fn call_name(f: &str, args: Vec<Expr>) -> Expr {
    call(name(f), args)
}

pub fn method(object: Expr, m: &str, args: Vec<Expr>) -> Expr {
    call(member(object, m), args)
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    expr(ExprKind::Assign {
        target: Box::new(target),
        value: Box::new(value),
    })
}

pub fn lambda(params: Vec<ParamDecl>, body: Vec<Stmt>) -> Expr {
    expr(ExprKind::Lambda { params, body })
}

pub fn catch_expr(inner: Expr) -> Expr {
    expr(ExprKind::CatchExpr(Box::new(inner)))
}

pub fn ternary(condition: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
    expr(ExprKind::Ternary {
        condition: Box::new(condition),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
    })
}

pub fn coalesce(left: Expr, right: Expr) -> Expr {
    expr(ExprKind::Coalesce {
        left: Box::new(left),
        right: Box::new(right),
    })
}

// Statements.

pub fn expr_stmt(e: Expr) -> Stmt {
    stmt(StmtKind::Expression(e))
}

pub fn var(n: &str, init: Expr) -> Stmt {
    stmt(StmtKind::Var(VarDecl {
        targets: vec![n.to_string()],
        types: Vec::new(),
        initializer: Some(init),
        is_constant: false,
        span: sp(),
    }))
}

pub fn constant(n: &str, init: Expr) -> Stmt {
    stmt(StmtKind::Var(VarDecl {
        targets: vec![n.to_string()],
        types: Vec::new(),
        initializer: Some(init),
        is_constant: true,
        span: sp(),
    }))
}

pub fn var_multi(names: &[&str], init: Expr) -> Stmt {
    stmt(StmtKind::Var(VarDecl {
        targets: names.iter().map(|s| s.to_string()).collect(),
        types: Vec::new(),
        initializer: Some(init),
        is_constant: false,
        span: sp(),
    }))
}

pub fn ret(value: Expr) -> Stmt {
    stmt(StmtKind::Return(Some(value)))
}

pub fn throw(value: Expr) -> Stmt {
    stmt(StmtKind::Throw(value))
}

pub fn block(body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Block(body))
}

pub fn if_stmt(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
    stmt(StmtKind::If {
        condition,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
    })
}

pub fn while_stmt(condition: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::While {
        condition,
        body: Box::new(body),
    })
}

pub fn for_stmt(names: &[&str], iterable: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::For {
        names: names.iter().map(|s| s.to_string()).collect(),
        iterable,
        body: Box::new(body),
    })
}

pub fn try_stmt(
    body: Vec<Stmt>,
    catches: Vec<CatchClause>,
    finally: Option<Vec<Stmt>>,
) -> Stmt {
    stmt(StmtKind::Try {
        body,
        catches,
        finally,
    })
}

pub fn switch_stmt(subject: Expr, cases: Vec<SwitchCase>, default: Option<Vec<Stmt>>) -> Stmt {
    stmt(StmtKind::Switch {
        subject,
        cases,
        default,
    })
}

pub fn case(labels: Vec<Expr>, body: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        labels,
        body,
        span: sp(),
    }
}

pub fn brk() -> Stmt {
    stmt(StmtKind::Break)
}

pub fn cont() -> Stmt {
    stmt(StmtKind::Continue)
}

pub fn catch_clause(types: &[&str], bind: Option<&str>, body: Vec<Stmt>) -> CatchClause {
    CatchClause {
        types: types.iter().map(|s| s.to_string()).collect(),
        name: bind.map(|s| s.to_string()),
        body,
        span: sp(),
    }
}

// Declarations.

pub fn param(n: &str) -> ParamDecl {
    ParamDecl::untyped(n, sp())
}

pub fn param_typed(n: &str, ty: &str) -> ParamDecl {
    ParamDecl {
        name: n.to_string(),
        types: vec![ty.to_string()],
        default: None,
        is_variadic: false,
        span: sp(),
    }
}

pub fn param_default(n: &str, default: Expr) -> ParamDecl {
    ParamDecl {
        name: n.to_string(),
        types: Vec::new(),
        default: Some(default),
        is_variadic: false,
        span: sp(),
    }
}

pub fn param_variadic(n: &str) -> ParamDecl {
    ParamDecl {
        name: n.to_string(),
        types: Vec::new(),
        default: None,
        is_variadic: true,
        span: sp(),
    }
}

pub fn func(n: &str, params: Vec<ParamDecl>, body: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Function(FunctionDecl {
        name: n.to_string(),
        params,
        body,
        is_static: false,
        access: AccessLevel::Public,
        span: sp(),
    }))
}

pub fn method_decl(n: &str, params: Vec<ParamDecl>, body: Vec<Stmt>) -> ClassMember {
    method_decl_access(n, params, body, AccessLevel::Public)
}

pub fn method_decl_access(
    n: &str,
    params: Vec<ParamDecl>,
    body: Vec<Stmt>,
    access: AccessLevel,
) -> ClassMember {
    ClassMember::Method(FunctionDecl {
        name: n.to_string(),
        params,
        body,
        is_static: false,
        access,
        span: sp(),
    })
}

pub fn ctor_decl(params: Vec<ParamDecl>, body: Vec<Stmt>) -> ClassMember {
    ClassMember::Constructor(ConstructorDecl {
        params,
        body,
        access: AccessLevel::Public,
        span: sp(),
    })
}

pub fn field_decl(n: &str, init: Option<Expr>) -> ClassMember {
    field_decl_access(n, init, AccessLevel::Public)
}

pub fn field_decl_access(n: &str, init: Option<Expr>, access: AccessLevel) -> ClassMember {
    ClassMember::Field(FieldDecl {
        name: n.to_string(),
        types: Vec::new(),
        initializer: init,
        is_constant: false,
        is_static: false,
        access,
        span: sp(),
    })
}

pub fn class_decl(n: &str, supers: &[&str], members: Vec<ClassMember>) -> Stmt {
    stmt(StmtKind::Class(ClassDecl {
        name: n.to_string(),
        supers: supers.iter().map(|s| s.to_string()).collect(),
        members,
        is_static: false,
        access: AccessLevel::Public,
        span: sp(),
    }))
}

pub fn enum_decl(n: &str, variants: &[(&str, Option<i64>)]) -> Stmt {
    stmt(StmtKind::Enum(EnumDecl {
        name: n.to_string(),
        variants: variants
            .iter()
            .map(|(v, explicit)| (v.to_string(), explicit.map(int)))
            .collect(),
        access: AccessLevel::Public,
        span: sp(),
    }))
}

// Running.

pub fn run(statements: Vec<Stmt>) -> Result<quill::interpreter::value::Value, RuntimeError> {
    let mut interp = Interpreter::new();
    interp.interpret(&Program::new(statements))
}

pub fn run_ok(statements: Vec<Stmt>) -> quill::interpreter::value::Value {
    run(statements).expect("program must not fault")
}

pub fn run_err(statements: Vec<Stmt>) -> RuntimeError {
    run(statements).expect_err("program must fault")
}
