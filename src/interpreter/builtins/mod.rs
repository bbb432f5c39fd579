//! Built-in classes and global functions.
//!
//! `bootstrap` creates the built-in class graph, registers native
//! constructors and methods, and defines the global names (`int`, `str`,
//! `List`, `print`, ...) in the root scope.

mod collections;
mod json;
mod numbers;
mod strings;

use std::rc::Rc;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::ast::{AccessLevel, Expr, ExprKind, Stmt, StmtKind};
use crate::interpreter::class::{Class, ClassRef, Primitive};
use crate::interpreter::scope::{Binding, ScopeRef, Slot};
use crate::interpreter::value::{
    functions_value, FieldTemplate, FunctionSet, HashKey, IterState, NativeFn, Object, Overload,
    OverloadBody, Parameter, Payload, Value,
};
use crate::span::Span;

/// The built-in class graph, plus the interned null object.
pub struct Builtins {
    pub object_class: ClassRef,
    pub null_class: ClassRef,
    pub type_class: ClassRef,
    pub function_class: ClassRef,
    pub str_class: ClassRef,
    pub int_class: ClassRef,
    pub float_class: ClassRef,
    pub decimal_class: ClassRef,
    pub bool_class: ClassRef,
    pub range_class: ClassRef,
    pub list_class: ClassRef,
    pub dict_class: ClassRef,
    pub iterator_class: ClassRef,
    pub exception_class: ClassRef,
    pub script_class: ClassRef,
    pub json_class: ClassRef,
    null: Value,
}

impl Builtins {
    /// Build the class graph and seed the root scope.
    pub fn bootstrap(globals: &ScopeRef) -> Builtins {
        let object_class = Class::builtin("object", Primitive::Object, None);
        let null_class = Class::builtin("null", Primitive::Null, None);
        let null = Value::Object(Object::allocate(null_class.clone(), None));

        let builtins = Builtins {
            object_class,
            null_class,
            type_class: Class::builtin("Type", Primitive::Type, None),
            function_class: Class::builtin("Function", Primitive::Function, None),
            str_class: Class::builtin("str", Primitive::Str, None),
            int_class: Class::builtin("int", Primitive::Int, None),
            float_class: Class::builtin("float", Primitive::Float, None),
            decimal_class: Class::builtin("decimal", Primitive::Decimal, None),
            bool_class: Class::builtin("bool", Primitive::Bool, None),
            range_class: Class::builtin("range", Primitive::Range, None),
            list_class: Class::builtin("List", Primitive::List, None),
            dict_class: Class::builtin("Dict", Primitive::Dict, None),
            iterator_class: Class::builtin("Iterator", Primitive::Iterator, None),
            exception_class: Class::builtin("Exception", Primitive::Exception, None),
            script_class: Class::create(
                "Script",
                Primitive::Script,
                None,
                true,
                AccessLevel::Public,
            ),
            json_class: Class::create("Json", Primitive::Json, None, true, AccessLevel::Public),
            null,
        };

        strings::register(&builtins);
        numbers::register(&builtins);
        collections::register(&builtins);
        json::register(&builtins);
        builtins.register_exception();

        let classes = [
            &builtins.object_class,
            &builtins.type_class,
            &builtins.function_class,
            &builtins.str_class,
            &builtins.int_class,
            &builtins.float_class,
            &builtins.decimal_class,
            &builtins.bool_class,
            &builtins.range_class,
            &builtins.list_class,
            &builtins.dict_class,
            &builtins.iterator_class,
            &builtins.exception_class,
            &builtins.script_class,
            &builtins.json_class,
        ];
        let mut globals = globals.borrow_mut();
        for class in classes {
            globals.define(Slot::constant(
                class.name.clone(),
                Value::Class(class.clone()),
            ));
        }

        globals.define(Slot::stored(
            "print",
            native_function("print", vec![Parameter::variadic("values")], {
                Rc::new(|interp, _recv, args| {
                    let text = join_displayed(interp, &args[0])?;
                    print!("{}", text);
                    Ok(interp.builtins.null())
                })
            }),
        ));
        globals.define(Slot::stored(
            "println",
            native_function("println", vec![Parameter::variadic("values")], {
                Rc::new(|interp, _recv, args| {
                    let text = join_displayed(interp, &args[0])?;
                    println!("{}", text);
                    Ok(interp.builtins.null())
                })
            }),
        ));
        globals.define(Slot::stored(
            "input",
            native_function(
                "input",
                vec![Parameter::any("prompt").with_default(str_literal(""))],
                Rc::new(|interp, _recv, args| {
                    use std::io::Write;
                    let prompt = interp
                        .display_value(&args[0], Span::default())
                        .map_err(|e| e.to_string())?;
                    if !prompt.is_empty() {
                        print!("{}", prompt);
                        std::io::stdout().flush().map_err(|e| e.to_string())?;
                    }
                    let mut line = String::new();
                    std::io::stdin()
                        .read_line(&mut line)
                        .map_err(|e| e.to_string())?;
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    Ok(interp.builtins.str_value(line))
                }),
            ),
        ));
        drop(globals);

        builtins
    }

    /// The Exception class keeps an interpreted constructor so scripts can
    /// subclass it.
    fn register_exception(&self) {
        let span = Span::default();
        let str_empty = str_literal("");
        let null_literal = Expr::new(ExprKind::Null, span);

        self.exception_class
            .field_templates
            .borrow_mut()
            .extend([
                FieldTemplate {
                    name: "message".to_string(),
                    declared_types: Vec::new(),
                    initializer: Some(str_empty.clone()),
                    is_constant: false,
                    access: AccessLevel::Public,
                },
                FieldTemplate {
                    name: "cause".to_string(),
                    declared_types: Vec::new(),
                    initializer: Some(null_literal.clone()),
                    is_constant: false,
                    access: AccessLevel::Public,
                },
            ]);

        let assign_field = |field: &str, param: &str| {
            Stmt::new(
                StmtKind::Expression(Expr::new(
                    ExprKind::Assign {
                        target: Box::new(Expr::new(
                            ExprKind::Member {
                                object: Box::new(Expr::new(ExprKind::This, span)),
                                name: field.to_string(),
                                safe: false,
                            },
                            span,
                        )),
                        value: Box::new(Expr::new(ExprKind::Name(param.to_string()), span)),
                    },
                    span,
                )),
                span,
            )
        };

        let ctor = Rc::new(Overload {
            params: vec![
                Parameter::any("message").with_default(str_empty),
                Parameter::any("cause").with_default(null_literal),
            ],
            body: OverloadBody::Ast(Rc::new(vec![
                assign_field("message", "message"),
                assign_field("cause", "cause"),
            ])),
            closure: None,
            is_static: false,
            access: AccessLevel::Public,
            span,
        });
        self.exception_class
            .ctor_set()
            .borrow_mut()
            .merge_overload(ctor, true);

        add_method(
            &self.exception_class,
            "ToStr",
            Vec::new(),
            Rc::new(|interp, recv, _args| {
                let recv = recv.ok_or("ToStr needs a receiver")?;
                let class_name = recv.type_name();
                let message = interp
                    .get_member(&recv, "message", Span::default())
                    .ok()
                    .and_then(|m| m.as_str())
                    .unwrap_or_default();
                if message.is_empty() {
                    Ok(interp.builtins.str_value(class_name))
                } else {
                    Ok(interp
                        .builtins
                        .str_value(format!("{}: {}", class_name, message)))
                }
            }),
        );
    }

    // Value constructors used throughout the evaluator.

    pub fn null(&self) -> Value {
        self.null.clone()
    }

    pub fn int(&self, n: i64) -> Value {
        Value::Object(Object::allocate(self.int_class.clone(), Some(Payload::Int(n))))
    }

    pub fn float(&self, n: f64) -> Value {
        Value::Object(Object::allocate(
            self.float_class.clone(),
            Some(Payload::Float(n)),
        ))
    }

    pub fn decimal(&self, d: Decimal) -> Value {
        Value::Object(Object::allocate(
            self.decimal_class.clone(),
            Some(Payload::Decimal(d)),
        ))
    }

    pub fn bool_value(&self, b: bool) -> Value {
        Value::Object(Object::allocate(
            self.bool_class.clone(),
            Some(Payload::Bool(b)),
        ))
    }

    pub fn str_value(&self, s: impl Into<String>) -> Value {
        Value::Object(Object::allocate(
            self.str_class.clone(),
            Some(Payload::Str(s.into())),
        ))
    }

    pub fn range(&self, start: i64, end: i64) -> Value {
        Value::Object(Object::allocate(
            self.range_class.clone(),
            Some(Payload::Range { start, end }),
        ))
    }

    pub fn list(&self, items: Vec<Value>) -> Value {
        Value::Object(Object::allocate(
            self.list_class.clone(),
            Some(Payload::List(Rc::new(std::cell::RefCell::new(items)))),
        ))
    }

    pub fn dict(&self, map: IndexMap<HashKey, Value, ahash::RandomState>) -> Value {
        Value::Object(Object::allocate(
            self.dict_class.clone(),
            Some(Payload::Dict(Rc::new(std::cell::RefCell::new(map)))),
        ))
    }

    pub fn dict_empty(&self) -> Value {
        self.dict(IndexMap::default())
    }

    /// Insert into a dict value; panics in spirit only, returns silently on
    /// non-dicts. Test helper and native plumbing.
    pub fn dict_insert(&self, dict: &Value, key: &Value, value: Value) {
        if let Some(Payload::Dict(map)) = dict.payload() {
            if let Some(key) = HashKey::from_value(key) {
                map.borrow_mut().insert(key, value);
            }
        }
    }

    pub fn iterator(&self, items: Vec<Value>) -> Value {
        Value::Object(Object::allocate(
            self.iterator_class.clone(),
            Some(Payload::Iter(Rc::new(std::cell::RefCell::new(IterState {
                items,
                index: 0,
            })))),
        ))
    }

    /// The value form of a dict key.
    pub fn key_value(&self, key: &HashKey) -> Value {
        match key {
            HashKey::Int(n) => self.int(*n),
            HashKey::Decimal(d) => self.decimal(*d),
            HashKey::Str(s) => self.str_value(s.clone()),
            HashKey::Bool(b) => self.bool_value(*b),
            HashKey::Null => self.null(),
        }
    }

    /// A fresh Exception instance with its fields set directly.
    pub fn exception(&self, message: impl Into<String>, cause: Value) -> Value {
        let obj = Object::allocate(self.exception_class.clone(), None);
        {
            let obj = obj.borrow();
            let mut scope = obj.scope.borrow_mut();
            scope.define(Slot::stored("message", self.str_value(message.into())));
            scope.define(Slot::stored("cause", cause));
        }
        Value::Object(obj)
    }
}

/// Wrap a native closure as a single-overload function-set value.
pub(crate) fn native_function(name: &str, params: Vec<Parameter>, f: NativeFn) -> Value {
    functions_value(FunctionSet::single(name, Overload::native(params, f)))
}

/// Register a native method on a class, merging with existing overloads.
pub(crate) fn add_method(class: &ClassRef, name: &str, params: Vec<Parameter>, f: NativeFn) {
    add_method_overload(class, name, Overload::native(params, f));
}

pub(crate) fn add_static_method(
    class: &ClassRef,
    name: &str,
    params: Vec<Parameter>,
    f: NativeFn,
) {
    let overload = Rc::new(Overload {
        params,
        body: OverloadBody::Native(f),
        closure: None,
        is_static: true,
        access: AccessLevel::Public,
        span: Span::default(),
    });
    add_method_overload(class, name, overload);
}

fn add_method_overload(class: &ClassRef, name: &str, overload: Rc<Overload>) {
    let is_static = overload.is_static;
    let existing = class.members.borrow().get_local(name);
    match existing {
        Some(Slot {
            binding: Binding::Stored(Value::Functions(set)),
            ..
        }) => {
            set.borrow_mut().merge_overload(overload, true);
        }
        _ => {
            let set = FunctionSet::single(name, overload);
            class.members.borrow_mut().define(
                Slot::stored(name, functions_value(set)).with_static(is_static),
            );
        }
    }
}

/// Register a native constructor, which makes the class uninheritable.
pub(crate) fn add_ctor(class: &ClassRef, params: Vec<Parameter>, f: NativeFn) {
    class
        .ctor_set()
        .borrow_mut()
        .merge_overload(Overload::native(params, f), true);
}

pub(crate) fn str_literal(s: &str) -> Expr {
    Expr::new(ExprKind::Str(s.to_string()), Span::default())
}

/// Space-join the displayed elements of a variadic argument list.
fn join_displayed(
    interp: &mut crate::interpreter::Interpreter,
    list: &Value,
) -> Result<String, String> {
    let Some(Payload::List(items)) = list.payload() else {
        return Err("expected argument list".to_string());
    };
    let items = items.borrow().clone();
    let mut parts = Vec::with_capacity(items.len());
    for item in &items {
        parts.push(
            interp
                .display_value(item, Span::default())
                .map_err(|e| e.to_string())?,
        );
    }
    Ok(parts.join(" "))
}
