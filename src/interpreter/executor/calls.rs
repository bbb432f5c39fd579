//! Calls, construction, and parameter plumbing.

use std::rc::Rc;

use crate::ast::{Argument, Expr, ExprKind, ParamDecl};
use crate::error::RuntimeError;
use crate::interpreter::class::{is_type_or_sub_of, ClassRef};
use crate::interpreter::iter::iterate;
use crate::interpreter::overloads::{describe_args, resolve, Bound, CallArg};
use crate::interpreter::scope::{lookup, lookup_member, nearest_this, Binding, Scope, ScopeOwner};
use crate::interpreter::value::{
    FunctionSet, Object, Overload, OverloadBody, Parameter, Payload, Value,
};
use crate::interpreter::Interpreter;
use crate::span::Span;

use super::{RuntimeResult, Signal};

impl Interpreter {
    pub(crate) fn evaluate_call(
        &mut self,
        callee: &Expr,
        arguments: &[Argument],
        span: Span,
    ) -> RuntimeResult<Value> {
        // `super(...)` chains to the flattened super's constructor with the
        // current receiver.
        if matches!(callee.kind, ExprKind::Super) {
            return self.call_super_ctor(arguments, span);
        }

        let callee = self.evaluate(callee)?;
        let args = self.expand_arguments(arguments)?;
        match callee {
            Value::Functions(set) => {
                let set = set.borrow().clone();
                self.call_function_set(&set, args, span)
            }
            Value::Class(class) => self.instantiate(&class, args, span),
            other => Err(RuntimeError::not_callable(other.type_name(), span)),
        }
    }

    /// Evaluate call-site arguments. A splat of a dict with string keys
    /// expands to named arguments; any other splat expands positionally
    /// through the iteration protocol.
    pub(crate) fn expand_arguments(
        &mut self,
        arguments: &[Argument],
    ) -> RuntimeResult<Vec<CallArg>> {
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Argument::Positional(expr) => {
                    args.push(CallArg::Positional(self.evaluate(expr)?));
                }
                Argument::Named { name, value } => {
                    args.push(CallArg::Named(name.clone(), self.evaluate(value)?));
                }
                Argument::Splat(expr) => {
                    let source = self.evaluate(expr)?;
                    if let Some(Payload::Dict(map)) = source.payload() {
                        for (key, value) in map.borrow().iter() {
                            match key {
                                crate::interpreter::value::HashKey::Str(name) => {
                                    args.push(CallArg::Named(name.clone(), value.clone()));
                                }
                                other => {
                                    return Err(RuntimeError::type_error(
                                        format!("splat key '{}' is not a name", other),
                                        expr.span,
                                    ));
                                }
                            }
                        }
                    } else {
                        for value in iterate(self, &source, expr.span)? {
                            args.push(CallArg::Positional(value));
                        }
                    }
                }
            }
        }
        Ok(args)
    }

    /// Resolve and invoke an overload of a function set.
    pub(crate) fn call_function_set(
        &mut self,
        set: &FunctionSet,
        args: Vec<CallArg>,
        span: Span,
    ) -> RuntimeResult<Value> {
        let call = resolve(self, set, &args, span)?;
        let overload = call.overload.clone();

        let mut values = Vec::with_capacity(overload.params.len());
        for (param, bound) in overload.params.iter().zip(call.bindings) {
            let value = match bound {
                Bound::Value(value) => value,
                Bound::Variadic(rest) => self.builtins.list(rest),
                Bound::Default => self.evaluate_default(param, &overload, span)?,
            };
            values.push(value);
        }

        self.call_overload(&overload, &set.name, set.receiver.clone(), values, span)
    }

    /// Defaults evaluate in the overload's declaration scope, not at the
    /// call site.
    fn evaluate_default(
        &mut self,
        param: &Parameter,
        overload: &Overload,
        span: Span,
    ) -> RuntimeResult<Value> {
        let Some(default) = &param.default else {
            return Ok(self.builtins.null());
        };
        let scope = overload
            .closure
            .clone()
            .unwrap_or_else(|| self.globals.clone());
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.evaluate(default);
        self.scope = saved;
        result.map_err(|err| match err {
            fatal if fatal.is_fatal() => fatal,
            other => RuntimeError::new(
                format!("default for '{}' failed: {}", param.name, other),
                span,
            ),
        })
    }

    /// Invoke one overload with values already matched to its parameters.
    pub(crate) fn call_overload(
        &mut self,
        overload: &Rc<Overload>,
        name: &str,
        receiver: Option<Value>,
        mut values: Vec<Value>,
        span: Span,
    ) -> RuntimeResult<Value> {
        // Direct invocations may omit trailing defaulted parameters.
        while values.len() < overload.params.len() {
            let param = &overload.params[values.len()];
            let value = if param.is_variadic {
                self.builtins.list(Vec::new())
            } else {
                self.evaluate_default(param, overload, span)?
            };
            values.push(value);
        }

        match &overload.body {
            OverloadBody::Native(native) => {
                let native = native.clone();
                native(self, receiver, values).map_err(|message| self.host_fault(message, span))
            }
            OverloadBody::Ast(body) => {
                let body = body.clone();
                self.run_interpreted(overload, name, receiver, values, &body, span)
            }
        }
    }

    fn run_interpreted(
        &mut self,
        overload: &Rc<Overload>,
        name: &str,
        receiver: Option<Value>,
        values: Vec<Value>,
        body: &[crate::ast::Stmt],
        span: Span,
    ) -> RuntimeResult<Value> {
        self.enter_call(span)?;
        self.push_method_owner(declaring_class(overload));

        let parent = match &receiver {
            Some(Value::Object(obj)) => obj.borrow().scope.clone(),
            Some(Value::Class(class)) => class.members.clone(),
            _ => overload
                .closure
                .clone()
                .unwrap_or_else(|| self.globals.clone()),
        };
        let call_scope = Scope::shared(Some(parent), ScopeOwner::Function(name.to_string()));
        for (param, value) in overload.params.iter().zip(values) {
            call_scope
                .borrow_mut()
                .define_value(param.name.clone(), value);
        }

        let saved = std::mem::replace(&mut self.scope, call_scope);
        let mut result = Ok(self.builtins.null());
        for stmt in body {
            match self.execute(stmt) {
                Ok(Signal::Normal(_)) => {}
                Ok(Signal::Return(value)) => {
                    result = Ok(value);
                    break;
                }
                Ok(_) => {
                    result = Err(RuntimeError::internal(
                        "loop signal escaped a function body",
                        stmt.span,
                    ));
                    break;
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.scope = saved;
        self.pop_method_owner();
        self.exit_call();
        result
    }

    /// Construct an instance of a class.
    pub(crate) fn instantiate(
        &mut self,
        class: &ClassRef,
        args: Vec<CallArg>,
        span: Span,
    ) -> RuntimeResult<Value> {
        if class.is_static {
            return Err(RuntimeError::type_error(
                format!("cannot instantiate static class {}", class.name),
                span,
            ));
        }

        // Native constructors produce the value themselves.
        if class.has_native_ctor() {
            let ctor = class.ctor_set();
            let ctor = ctor.borrow().clone();
            return self.call_function_set(&ctor, args, span);
        }

        let obj = Object::allocate(class.clone(), None);
        let instance = Value::Object(obj.clone());

        // Stamp fields before the constructor body runs, so it sees them.
        let templates = class.field_templates.borrow().clone();
        for template in templates {
            let value = match &template.initializer {
                Some(init) => {
                    let scope = Scope::shared(Some(obj.borrow().scope.clone()), ScopeOwner::None);
                    let saved = std::mem::replace(&mut self.scope, scope);
                    let value = self.evaluate(init);
                    self.scope = saved;
                    value?
                }
                None => self.builtins.null(),
            };
            let mut slot = crate::interpreter::scope::Slot::stored(template.name, value);
            slot.declared_types = template.declared_types;
            slot.is_constant = template.is_constant;
            slot.access = template.access;
            obj.borrow().scope.borrow_mut().define(slot);
        }

        let ctor = class.ctor.borrow().clone();
        match ctor {
            Some(ctor) => {
                let bound = ctor.borrow().bind(instance.clone());
                self.call_function_set(&bound, args, span)?;
            }
            None if args.is_empty() => {}
            None => {
                return Err(RuntimeError::NoMatchingOverload {
                    name: class.name.clone(),
                    given: describe_args(&args),
                    candidates: format!("{}()", class.name),
                    span,
                });
            }
        }
        Ok(instance)
    }

    fn call_super_ctor(&mut self, arguments: &[Argument], span: Span) -> RuntimeResult<Value> {
        let this = nearest_this(&self.scope)
            .ok_or_else(|| RuntimeError::new("'super' outside of a constructor", span))?;
        let flattened = self.super_class_of(&this, span)?;
        let args = self.expand_arguments(arguments)?;
        let ctor = flattened.ctor.borrow().clone();
        match ctor {
            Some(ctor) => {
                let bound = ctor.borrow().bind(this);
                self.call_function_set(&bound, args, span)
            }
            None if args.is_empty() => Ok(self.builtins.null()),
            None => Err(RuntimeError::NoMatchingOverload {
                name: format!("{}.super", self.class_of(&this).name),
                given: describe_args(&args),
                candidates: "()".to_string(),
                span,
            }),
        }
    }

    /// Call a named method on a receiver with positional arguments. Returns
    /// `None` when the receiver has no such callable member.
    pub(crate) fn invoke_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: Vec<Value>,
        span: Span,
    ) -> RuntimeResult<Option<Value>> {
        let Some(obj) = receiver.as_object() else {
            return Ok(None);
        };
        let scope = obj.borrow().scope.clone();
        let Some(hit) = lookup_member(&scope, name) else {
            return Ok(None);
        };
        let Binding::Stored(Value::Functions(set)) = hit.slot.binding else {
            return Ok(None);
        };
        let bound = set.borrow().bind(receiver.clone());
        let args = args.into_iter().map(CallArg::Positional).collect();
        self.call_function_set(&bound, args, span).map(Some)
    }

    /// Resolve declared type names against the current scope.
    pub(crate) fn resolve_type_names(
        &mut self,
        names: &[String],
        span: Span,
    ) -> RuntimeResult<Vec<ClassRef>> {
        let mut classes = Vec::with_capacity(names.len());
        for name in names {
            let hit = lookup(&self.scope, name)
                .ok_or_else(|| RuntimeError::unbound_name(name, span))?;
            match hit.slot.binding {
                Binding::Stored(Value::Class(class)) => classes.push(class),
                _ => {
                    return Err(RuntimeError::type_error(
                        format!("'{}' is not a type", name),
                        span,
                    ));
                }
            }
        }
        Ok(classes)
    }

    pub(crate) fn resolve_params(
        &mut self,
        params: &[ParamDecl],
    ) -> RuntimeResult<Vec<Parameter>> {
        params
            .iter()
            .map(|decl| {
                let accepted = self.resolve_type_names(&decl.types, decl.span)?;
                Ok(Parameter {
                    name: decl.name.clone(),
                    accepted,
                    default: decl.default.clone(),
                    is_variadic: decl.is_variadic,
                })
            })
            .collect()
    }

    /// Declared-type check for slot writes. Null is always admissible.
    pub(crate) fn check_declared_types(
        &self,
        name: &str,
        declared: &[ClassRef],
        value: &Value,
        span: Span,
    ) -> RuntimeResult<()> {
        if declared.is_empty() || value.is_null() {
            return Ok(());
        }
        let class = self.class_of(value);
        if declared
            .iter()
            .any(|accepted| is_type_or_sub_of(&class, accepted))
        {
            return Ok(());
        }
        let expected = declared
            .iter()
            .map(|c| c.name.clone())
            .collect::<Vec<_>>()
            .join("|");
        Err(RuntimeError::type_error(
            format!(
                "cannot assign {} to '{}' declared as {}",
                value.type_name(),
                name,
                expected
            ),
            span,
        ))
    }
}

/// The class whose body declared an overload, recovered from its closure's
/// owner tag. Copied members keep the original closure, so an inherited
/// overload still reports its declaration site.
fn declaring_class(overload: &Overload) -> Option<ClassRef> {
    let closure = overload.closure.as_ref()?;
    let owner = match closure.borrow().owner() {
        ScopeOwner::Class(class) => class.upgrade(),
        _ => None,
    };
    owner
}
