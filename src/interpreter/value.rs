//! Runtime values.
//!
//! Every expression produces a [`Value`]: an object, a function set, or a
//! class. There is no raw representation — primitives are objects of a
//! built-in class whose payload holds the native datum.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::ast::{AccessLevel, Expr, Stmt};
use crate::interpreter::class::{ClassRef, Primitive};
use crate::interpreter::scope::{Scope, ScopeOwner, ScopeRef};
use crate::interpreter::Interpreter;
use crate::span::Span;

pub type ObjectRef = Rc<RefCell<Object>>;
pub type FunctionsRef = Rc<RefCell<FunctionSet>>;

/// A runtime value: always exactly one of object, function set, or class.
#[derive(Debug, Clone)]
pub enum Value {
    Object(ObjectRef),
    Functions(FunctionsRef),
    Class(ClassRef),
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::Object(obj) => obj.borrow().class.name.clone(),
            Value::Functions(_) => "Function".to_string(),
            Value::Class(_) => "Type".to_string(),
        }
    }

    /// The null value is the one object of the null class.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Object(obj) => obj.borrow().class.primitive == Primitive::Null,
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Copy of the object's payload, if it carries one.
    pub fn payload(&self) -> Option<Payload> {
        match self {
            Value::Object(obj) => obj.borrow().payload.clone(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.payload() {
            Some(Payload::Int(n)) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<String> {
        match self.payload() {
            Some(Payload::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.payload() {
            Some(Payload::Bool(b)) => Some(b),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Object(obj) => {
                let obj = obj.borrow();
                if obj.class.primitive == Primitive::Null {
                    return false;
                }
                match &obj.payload {
                    Some(Payload::Bool(b)) => *b,
                    Some(Payload::Int(0)) => false,
                    Some(Payload::Str(s)) => !s.is_empty(),
                    Some(Payload::List(items)) => !items.borrow().is_empty(),
                    Some(Payload::Dict(map)) => !map.borrow().is_empty(),
                    _ => true,
                }
            }
            Value::Functions(_) | Value::Class(_) => true,
        }
    }

    /// Rust-side identity: payload equality for primitives, pointer identity
    /// otherwise. Language equality goes through the per-class operator
    /// table instead.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                match (&a.borrow().payload, &b.borrow().payload) {
                    (Some(pa), Some(pb)) => pa.same_as(pb),
                    _ => self.is_null() && other.is_null(),
                }
            }
            (Value::Functions(a), Value::Functions(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(obj) => {
                let obj = obj.borrow();
                if obj.class.primitive == Primitive::Null {
                    return write!(f, "null");
                }
                match &obj.payload {
                    Some(payload) => write!(f, "{}", payload),
                    None => write!(f, "<{} instance>", obj.class.name),
                }
            }
            Value::Functions(set) => write!(f, "<fn {}>", set.borrow().name),
            Value::Class(class) => write!(f, "<class {}>", class.name),
        }
    }
}

/// An instance of a class: its own scope chained to the class member scope,
/// and an optional opaque payload for built-in representations.
pub struct Object {
    pub class: ClassRef,
    pub scope: ScopeRef,
    pub payload: Option<Payload>,
}

impl Object {
    /// Allocate an instance whose scope chains to the class member scope.
    pub fn allocate(class: ClassRef, payload: Option<Payload>) -> ObjectRef {
        let scope = Rc::new(RefCell::new(Scope::with_parent(
            Some(class.members.clone()),
            ScopeOwner::None,
        )));
        let obj = Rc::new(RefCell::new(Object {
            class,
            scope: scope.clone(),
            payload,
        }));
        scope.borrow_mut().set_owner(ScopeOwner::Object(Rc::downgrade(&obj)));
        obj
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance", self.class.name)?;
        if let Some(payload) = &self.payload {
            write!(f, " {}", payload)?;
        }
        write!(f, ">")
    }
}

/// Cursor over a materialized native sequence, the payload of the built-in
/// Iterator class.
#[derive(Debug)]
pub struct IterState {
    pub items: Vec<Value>,
    pub index: usize,
}

/// Native payload of a built-in object.
#[derive(Debug, Clone)]
pub enum Payload {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    Str(String),
    /// Half-open integer range.
    Range { start: i64, end: i64 },
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<IndexMap<HashKey, Value, ahash::RandomState>>>),
    Iter(Rc<RefCell<IterState>>),
}

impl Payload {
    fn same_as(&self, other: &Payload) -> bool {
        match (self, other) {
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Decimal(a), Payload::Decimal(b)) => a == b,
            (Payload::Int(a), Payload::Float(b)) | (Payload::Float(b), Payload::Int(a)) => {
                *a as f64 == *b
            }
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (
                Payload::Range { start: a, end: b },
                Payload::Range { start: c, end: d },
            ) => a == c && b == d,
            (Payload::List(a), Payload::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_as(y))
            }
            (Payload::Dict(a), Payload::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).map_or(false, |w| v.same_as(w)))
            }
            (Payload::Iter(a), Payload::Iter(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Int(n) => write!(f, "{}", n),
            Payload::Float(n) => write!(f, "{}", n),
            Payload::Decimal(d) => write!(f, "{}", d),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::Str(s) => write!(f, "{}", s),
            Payload::Range { start, end } => write!(f, "{}..{}", start, end),
            Payload::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Payload::Dict(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Payload::Iter(state) => {
                let state = state.borrow();
                write!(f, "<iterator at {}/{}>", state.index, state.items.len())
            }
        }
    }
}

/// A hashable key for Dict payloads. Floats are excluded because NaN breaks
/// the map invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashKey {
    Int(i64),
    Decimal(Decimal),
    Str(String),
    Bool(bool),
    Null,
}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            HashKey::Int(n) => n.hash(state),
            HashKey::Decimal(d) => d.hash(state),
            HashKey::Str(s) => s.hash(state),
            HashKey::Bool(b) => b.hash(state),
            HashKey::Null => {}
        }
    }
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<HashKey> {
        if value.is_null() {
            return Some(HashKey::Null);
        }
        match value.payload() {
            Some(Payload::Int(n)) => Some(HashKey::Int(n)),
            Some(Payload::Decimal(d)) => Some(HashKey::Decimal(d)),
            Some(Payload::Str(s)) => Some(HashKey::Str(s)),
            Some(Payload::Bool(b)) => Some(HashKey::Bool(b)),
            _ => None,
        }
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Int(n) => write!(f, "{}", n),
            HashKey::Decimal(d) => write!(f, "{}", d),
            HashKey::Str(s) => write!(f, "{}", s),
            HashKey::Bool(b) => write!(f, "{}", b),
            HashKey::Null => write!(f, "null"),
        }
    }
}

/// A native overload body: receives the evaluator, the bound receiver, and
/// the argument values in parameter order.
pub type NativeFn =
    Rc<dyn Fn(&mut Interpreter, Option<Value>, Vec<Value>) -> Result<Value, String>>;

/// The body of one overload.
#[derive(Clone)]
pub enum OverloadBody {
    Ast(Rc<Vec<Stmt>>),
    Native(NativeFn),
}

impl fmt::Debug for OverloadBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadBody::Ast(_) => write!(f, "<interpreted>"),
            OverloadBody::Native(_) => write!(f, "<native>"),
        }
    }
}

/// One parameter of an overload. An empty accepted set means any type.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub accepted: Vec<ClassRef>,
    pub default: Option<Expr>,
    pub is_variadic: bool,
}

impl Parameter {
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accepted: Vec::new(),
            default: None,
            is_variadic: false,
        }
    }

    pub fn typed(name: impl Into<String>, class: &ClassRef) -> Self {
        Self {
            name: name.into(),
            accepted: vec![class.clone()],
            default: None,
            is_variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accepted: Vec::new(),
            default: None,
            is_variadic: true,
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_any(&self) -> bool {
        self.accepted.is_empty()
    }

    /// True when the accepted class names match exactly (order-insensitive).
    pub fn same_signature(&self, other: &Parameter) -> bool {
        if self.is_variadic != other.is_variadic {
            return false;
        }
        if self.accepted.len() != other.accepted.len() {
            return false;
        }
        self.accepted.iter().all(|a| {
            other.accepted.iter().any(|b| Rc::ptr_eq(a, b) || a.name == b.name)
        })
    }

    fn describe(&self) -> String {
        let types = if self.is_any() {
            "any".to_string()
        } else {
            self.accepted
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
                .join("|")
        };
        let prefix = if self.is_variadic { "*" } else { "" };
        format!("{}{}: {}", prefix, self.name, types)
    }
}

/// One callable signature of a function set.
#[derive(Debug, Clone)]
pub struct Overload {
    pub params: Vec<Parameter>,
    pub body: OverloadBody,
    pub closure: Option<ScopeRef>,
    pub is_static: bool,
    pub access: AccessLevel,
    pub span: Span,
}

impl Overload {
    pub fn native(params: Vec<Parameter>, f: NativeFn) -> Rc<Self> {
        Rc::new(Self {
            params,
            body: OverloadBody::Native(f),
            closure: None,
            is_static: false,
            access: AccessLevel::Public,
            span: Span::default(),
        })
    }

    pub fn is_native(&self) -> bool {
        matches!(self.body, OverloadBody::Native(_))
    }

    /// True when both parameter lists carry the same type signature.
    pub fn same_signature(&self, other: &Overload) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|(a, b)| a.same_signature(b))
    }

    pub fn describe(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.describe())
            .collect::<Vec<_>>()
            .join(", ");
        format!("({})", params)
    }
}

/// A named, possibly-overloaded callable. Member access on an object yields
/// a copy bound to its receiver.
#[derive(Debug, Clone)]
pub struct FunctionSet {
    pub name: String,
    pub overloads: Vec<Rc<Overload>>,
    pub receiver: Option<Value>,
}

impl FunctionSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
            receiver: None,
        }
    }

    pub fn single(name: impl Into<String>, overload: Rc<Overload>) -> Self {
        Self {
            name: name.into(),
            overloads: vec![overload],
            receiver: None,
        }
    }

    /// A copy of this set with the given receiver bound.
    pub fn bind(&self, receiver: Value) -> FunctionSet {
        FunctionSet {
            name: self.name.clone(),
            overloads: self.overloads.clone(),
            receiver: Some(receiver),
        }
    }

    /// Merge an overload into the set. An overload whose parameter-type
    /// signature exactly matches an existing one replaces it only when
    /// `replace` is set; otherwise the existing one wins.
    pub fn merge_overload(&mut self, overload: Rc<Overload>, replace: bool) {
        if let Some(pos) = self
            .overloads
            .iter()
            .position(|o| o.same_signature(&overload))
        {
            if replace {
                self.overloads[pos] = overload;
            }
        } else {
            self.overloads.push(overload);
        }
    }

    /// Merge every overload of another set.
    pub fn merge_from(&mut self, other: &FunctionSet, replace: bool) {
        for overload in &other.overloads {
            self.merge_overload(overload.clone(), replace);
        }
    }

    pub fn has_native(&self) -> bool {
        self.overloads.iter().any(|o| o.is_native())
    }

    /// All signatures, for the no-matching-overload diagnostic.
    pub fn signatures(&self) -> String {
        self.overloads
            .iter()
            .map(|o| format!("{}{}", self.name, o.describe()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Shortcut for wrapping a function set as a value.
pub fn functions_value(set: FunctionSet) -> Value {
    Value::Functions(Rc::new(RefCell::new(set)))
}

/// The uninitialized-field template a class stamps onto each new instance.
#[derive(Debug, Clone)]
pub struct FieldTemplate {
    pub name: String,
    pub declared_types: Vec<ClassRef>,
    pub initializer: Option<Expr>,
    pub is_constant: bool,
    pub access: AccessLevel,
}
