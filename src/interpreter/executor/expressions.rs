//! Expression evaluation.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::iter::iterate;
use crate::interpreter::scope::{lookup, Binding};
use crate::interpreter::value::{
    functions_value, FunctionSet, HashKey, Overload, OverloadBody, Value,
};
use crate::interpreter::Interpreter;

use super::RuntimeResult;

impl Interpreter {
    /// Evaluate an expression to a value.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(self.builtins.int(*n)),
            ExprKind::Float(n) => Ok(self.builtins.float(*n)),
            ExprKind::Decimal(text) => {
                let parsed = text.parse().map_err(|_| {
                    RuntimeError::type_error(
                        format!("invalid decimal literal '{}'", text),
                        expr.span,
                    )
                })?;
                Ok(self.builtins.decimal(parsed))
            }
            ExprKind::Str(s) => Ok(self.builtins.str_value(s.clone())),
            ExprKind::Bool(b) => Ok(self.builtins.bool_value(*b)),
            ExprKind::Null => Ok(self.builtins.null()),

            ExprKind::Interpolated(parts) => self.evaluate_interpolated(parts, expr.span),

            ExprKind::Name(name) => self.evaluate_name(name, expr.span),

            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, *operator, right, expr.span),

            ExprKind::Unary { operator, operand } => {
                self.evaluate_unary(*operator, operand, expr.span)
            }

            ExprKind::And { left, right } => {
                let left = self.evaluate(left)?;
                if left.is_truthy() {
                    self.evaluate(right)
                } else {
                    Ok(left)
                }
            }

            ExprKind::Or { left, right } => {
                let left = self.evaluate(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Coalesce { left, right } => {
                let left = self.evaluate(left)?;
                if left.is_null() {
                    self.evaluate(right)
                } else {
                    Ok(left)
                }
            }

            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            ExprKind::Member { object, name, safe } => {
                self.evaluate_member(object, name, *safe, expr.span)
            }

            ExprKind::Index { object, index } => self.evaluate_index(object, index, expr.span),

            ExprKind::Call { callee, arguments } => {
                self.evaluate_call(callee, arguments, expr.span)
            }

            ExprKind::List(items) => self.evaluate_list(items),

            ExprKind::Map(entries) => self.evaluate_map(entries),

            ExprKind::Lambda { params, body } => self.evaluate_lambda(params, body, expr.span),

            ExprKind::Assign { target, value } => {
                let value = self.evaluate(value)?;
                self.assign_to(target, value.clone())?;
                Ok(value)
            }

            ExprKind::This => self.evaluate_this(expr.span),
            ExprKind::Super => self.evaluate_super(expr.span),

            ExprKind::CatchExpr(inner) => self.evaluate_catch_expr(inner),
        }
    }

    fn evaluate_name(&mut self, name: &str, span: crate::span::Span) -> RuntimeResult<Value> {
        let hit = lookup(&self.scope, name)
            .ok_or_else(|| RuntimeError::unbound_name(name, span))?;
        match hit.slot.binding {
            Binding::Stored(value) => Ok(value),
            Binding::Accessor { getter, .. } => {
                let getter = getter.ok_or_else(|| {
                    RuntimeError::type_error(format!("'{}' is write-only", name), span)
                })?;
                let receiver = self.receiver_of(&hit.holder);
                self.call_overload(&getter, name, receiver, Vec::new(), span)
            }
        }
    }

    fn evaluate_interpolated(
        &mut self,
        parts: &[StringPart],
        span: crate::span::Span,
    ) -> RuntimeResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                StringPart::Literal(text) => out.push_str(text),
                StringPart::Expression(expr) => {
                    let value = self.evaluate(expr)?;
                    out.push_str(&self.display_value(&value, span)?);
                }
            }
        }
        Ok(self.builtins.str_value(out))
    }

    fn evaluate_list(&mut self, items: &[ListItem]) -> RuntimeResult<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item {
                ListItem::Item(expr) => values.push(self.evaluate(expr)?),
                ListItem::Splat(expr) => {
                    let source = self.evaluate(expr)?;
                    values.extend(iterate(self, &source, expr.span)?);
                }
            }
        }
        Ok(self.builtins.list(values))
    }

    fn evaluate_map(&mut self, entries: &[MapEntry]) -> RuntimeResult<Value> {
        let mut map: IndexMap<HashKey, Value, ahash::RandomState> = IndexMap::default();
        for entry in entries {
            match entry {
                MapEntry::Pair(key, value) => {
                    let key_value = self.evaluate(key)?;
                    let hash_key = HashKey::from_value(&key_value).ok_or_else(|| {
                        RuntimeError::type_error(
                            format!("{} cannot be a Dict key", key_value.type_name()),
                            key.span,
                        )
                    })?;
                    let value = self.evaluate(value)?;
                    map.insert(hash_key, value);
                }
                MapEntry::Splat(expr) => {
                    let source = self.evaluate(expr)?;
                    for pair in iterate(self, &source, expr.span)? {
                        let parts = iterate(self, &pair, expr.span)?;
                        if parts.len() != 2 {
                            return Err(RuntimeError::type_error(
                                "map splat elements must be [key, value] pairs",
                                expr.span,
                            ));
                        }
                        let hash_key = HashKey::from_value(&parts[0]).ok_or_else(|| {
                            RuntimeError::type_error(
                                format!("{} cannot be a Dict key", parts[0].type_name()),
                                expr.span,
                            )
                        })?;
                        map.insert(hash_key, parts[1].clone());
                    }
                }
            }
        }
        Ok(self.builtins.dict(map))
    }

    /// A lambda is an anonymous single-overload function set closing over
    /// the current scope by reference.
    fn evaluate_lambda(
        &mut self,
        params: &[ParamDecl],
        body: &[Stmt],
        span: crate::span::Span,
    ) -> RuntimeResult<Value> {
        let params = self.resolve_params(params)?;
        let overload = Rc::new(Overload {
            params,
            body: OverloadBody::Ast(Rc::new(body.to_vec())),
            closure: Some(self.scope.clone()),
            is_static: false,
            access: AccessLevel::Public,
            span,
        });
        Ok(functions_value(FunctionSet::single("lambda", overload)))
    }

    /// catch(expr): evaluate, trapping non-fatal faults into a value. The
    /// result is always a two-element list of (value, fault), one of which
    /// is null.
    fn evaluate_catch_expr(&mut self, inner: &Expr) -> RuntimeResult<Value> {
        match self.evaluate(inner) {
            Ok(value) => {
                let null = self.builtins.null();
                Ok(self.builtins.list(vec![value, null]))
            }
            Err(err) if !err.is_fatal() => {
                let fault = self.fault_value(err);
                let null = self.builtins.null();
                Ok(self.builtins.list(vec![null, fault]))
            }
            Err(err) => Err(err),
        }
    }
}
