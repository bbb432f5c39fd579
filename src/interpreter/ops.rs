//! Per-class operator dispatch.
//!
//! Binary and unary operators route through the left operand's class: each
//! primitive tag selects a static operator table, and user classes forward
//! to conventionally named methods (Add, Equals, Compare, ...) so scripts
//! can overload operators.

use std::cmp::Ordering;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::RuntimeError;
use crate::interpreter::class::Primitive;
use crate::interpreter::value::{HashKey, Payload, Value};
use crate::interpreter::Interpreter;
use crate::span::Span;

type OpResult = Result<Value, RuntimeError>;

/// Operator table dispatched by a value's class.
pub trait ClassOps {
    fn add(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(cannot("add", lhs, rhs, span))
    }

    fn subtract(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(cannot("subtract", lhs, rhs, span))
    }

    fn multiply(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(cannot("multiply", lhs, rhs, span))
    }

    fn divide(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(cannot("divide", lhs, rhs, span))
    }

    fn modulo(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(cannot("modulo", lhs, rhs, span))
    }

    /// Default equality is payload/identity equality.
    fn equals(
        &self,
        interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<bool, RuntimeError> {
        let _ = (interp, span);
        Ok(lhs.same_as(rhs))
    }

    fn compare(
        &self,
        interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<Ordering, RuntimeError> {
        let _ = interp;
        Err(cannot("compare", lhs, rhs, span))
    }

    fn negate(&self, interp: &mut Interpreter, value: &Value, span: Span) -> OpResult {
        let _ = interp;
        Err(RuntimeError::type_error(
            format!("cannot negate {}", value.type_name()),
            span,
        ))
    }

    fn index_get(
        &self,
        interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        span: Span,
    ) -> OpResult {
        let _ = (interp, index);
        Err(RuntimeError::type_error(
            format!("{} does not support indexing", object.type_name()),
            span,
        ))
    }

    fn index_set(
        &self,
        interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        value: &Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let _ = (interp, index, value);
        Err(RuntimeError::type_error(
            format!("{} does not support index assignment", object.type_name()),
            span,
        ))
    }
}

fn cannot(op: &str, lhs: &Value, rhs: &Value, span: Span) -> RuntimeError {
    RuntimeError::type_error(
        format!("cannot {} {} and {}", op, lhs.type_name(), rhs.type_name()),
        span,
    )
}

/// The table for a primitive tag.
pub fn ops_for(primitive: Primitive) -> &'static dyn ClassOps {
    match primitive {
        Primitive::Int | Primitive::Float | Primitive::Decimal => &NUMBER_OPS,
        Primitive::Str => &STR_OPS,
        Primitive::List => &LIST_OPS,
        Primitive::Dict => &DICT_OPS,
        Primitive::User => &USER_OPS,
        _ => &IDENTITY_OPS,
    }
}

/// Plain objects, bool, range, classes, function sets: identity/payload
/// equality only.
struct IdentityOps;
static IDENTITY_OPS: IdentityOps = IdentityOps;
impl ClassOps for IdentityOps {}

/// A numeric operand, promoted across int/float/decimal.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
}

fn as_num(value: &Value) -> Option<Num> {
    match value.payload() {
        Some(Payload::Int(n)) => Some(Num::Int(n)),
        Some(Payload::Float(n)) => Some(Num::Float(n)),
        Some(Payload::Decimal(d)) => Some(Num::Decimal(d)),
        _ => None,
    }
}

struct NumberOps;
static NUMBER_OPS: NumberOps = NumberOps;

impl NumberOps {
    fn arith(
        &self,
        interp: &mut Interpreter,
        op: &str,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> OpResult {
        let (a, b) = match (as_num(lhs), as_num(rhs)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(cannot(op, lhs, rhs, span)),
        };
        match (a, b) {
            (Num::Int(a), Num::Int(b)) => self.int_arith(interp, op, a, b, span),
            // A float on either side demotes the whole operation to float.
            (Num::Float(_), _) | (_, Num::Float(_)) => {
                self.float_arith(interp, op, num_to_f64(a), num_to_f64(b), span)
            }
            _ => self.decimal_arith(interp, op, num_to_decimal(a), num_to_decimal(b), span),
        }
    }

    fn int_arith(
        &self,
        interp: &mut Interpreter,
        op: &str,
        a: i64,
        b: i64,
        span: Span,
    ) -> OpResult {
        let checked = match op {
            "add" => a.checked_add(b),
            "subtract" => a.checked_sub(b),
            "multiply" => a.checked_mul(b),
            "divide" => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                a.checked_div(b)
            }
            "modulo" => {
                if b == 0 {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                a.checked_rem(b)
            }
            _ => None,
        };
        match checked {
            Some(n) => Ok(interp.builtins.int(n)),
            None => Err(interp.host_fault(format!("integer overflow in {}", op), span)),
        }
    }

    fn float_arith(
        &self,
        interp: &mut Interpreter,
        op: &str,
        a: f64,
        b: f64,
        span: Span,
    ) -> OpResult {
        let n = match op {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                a / b
            }
            "modulo" => a % b,
            _ => return Err(RuntimeError::internal("unknown arithmetic op", span)),
        };
        Ok(interp.builtins.float(n))
    }

    fn decimal_arith(
        &self,
        interp: &mut Interpreter,
        op: &str,
        a: Decimal,
        b: Decimal,
        span: Span,
    ) -> OpResult {
        let n = match op {
            "add" => a.checked_add(b),
            "subtract" => a.checked_sub(b),
            "multiply" => a.checked_mul(b),
            "divide" => {
                if b.is_zero() {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                a.checked_div(b)
            }
            "modulo" => {
                if b.is_zero() {
                    return Err(RuntimeError::DivisionByZero(span));
                }
                a.checked_rem(b)
            }
            _ => None,
        };
        match n {
            Some(n) => Ok(interp.builtins.decimal(n)),
            None => Err(interp.host_fault(format!("decimal overflow in {}", op), span)),
        }
    }
}

fn num_to_f64(n: Num) -> f64 {
    match n {
        Num::Int(n) => n as f64,
        Num::Float(n) => n,
        Num::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
    }
}

fn num_to_decimal(n: Num) -> Decimal {
    match n {
        Num::Int(n) => Decimal::from(n),
        Num::Decimal(d) => d,
        Num::Float(f) => Decimal::from_f64(f).unwrap_or_default(),
    }
}

impl ClassOps for NumberOps {
    fn add(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.arith(interp, "add", lhs, rhs, span)
    }

    fn subtract(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.arith(interp, "subtract", lhs, rhs, span)
    }

    fn multiply(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.arith(interp, "multiply", lhs, rhs, span)
    }

    fn divide(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.arith(interp, "divide", lhs, rhs, span)
    }

    fn modulo(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.arith(interp, "modulo", lhs, rhs, span)
    }

    fn compare(
        &self,
        interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<Ordering, RuntimeError> {
        let _ = interp;
        let (a, b) = match (as_num(lhs), as_num(rhs)) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(cannot("compare", lhs, rhs, span)),
        };
        match (a, b) {
            (Num::Int(a), Num::Int(b)) => Ok(a.cmp(&b)),
            (Num::Decimal(a), Num::Decimal(b)) => Ok(a.cmp(&b)),
            (Num::Decimal(a), Num::Int(b)) => Ok(a.cmp(&Decimal::from(b))),
            (Num::Int(a), Num::Decimal(b)) => Ok(Decimal::from(a).cmp(&b)),
            (a, b) => num_to_f64(a)
                .partial_cmp(&num_to_f64(b))
                .ok_or_else(|| cannot("compare", lhs, rhs, span)),
        }
    }

    fn negate(&self, interp: &mut Interpreter, value: &Value, span: Span) -> OpResult {
        match as_num(value) {
            Some(Num::Int(n)) => match n.checked_neg() {
                Some(n) => Ok(interp.builtins.int(n)),
                None => Err(interp.host_fault("integer overflow in negate", span)),
            },
            Some(Num::Float(n)) => Ok(interp.builtins.float(-n)),
            Some(Num::Decimal(d)) => Ok(interp.builtins.decimal(-d)),
            None => Err(RuntimeError::type_error(
                format!("cannot negate {}", value.type_name()),
                span,
            )),
        }
    }
}

struct StrOps;
static STR_OPS: StrOps = StrOps;

impl ClassOps for StrOps {
    /// String concatenation stringifies the right operand.
    fn add(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        let a = lhs.as_str().ok_or_else(|| cannot("add", lhs, rhs, span))?;
        let b = interp.display_value(rhs, span)?;
        Ok(interp.builtins.str_value(format!("{}{}", a, b)))
    }

    fn multiply(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        match (lhs.as_str(), rhs.as_int()) {
            (Some(s), Some(n)) if n >= 0 => {
                Ok(interp.builtins.str_value(s.repeat(n as usize)))
            }
            _ => Err(cannot("multiply", lhs, rhs, span)),
        }
    }

    fn compare(
        &self,
        _interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<Ordering, RuntimeError> {
        match (lhs.as_str(), rhs.as_str()) {
            (Some(a), Some(b)) => Ok(a.cmp(&b)),
            _ => Err(cannot("compare", lhs, rhs, span)),
        }
    }

    fn index_get(
        &self,
        interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        span: Span,
    ) -> OpResult {
        let s = object
            .as_str()
            .ok_or_else(|| RuntimeError::type_error("expected str receiver", span))?;
        let i = expect_index(index, span)?;
        let ch = s.chars().nth(i).ok_or_else(|| {
            RuntimeError::type_error(format!("index {} out of bounds", i), span)
        })?;
        Ok(interp.builtins.str_value(ch.to_string()))
    }
}

struct ListOps;
static LIST_OPS: ListOps = ListOps;

impl ClassOps for ListOps {
    fn add(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        match (lhs.payload(), rhs.payload()) {
            (Some(Payload::List(a)), Some(Payload::List(b))) => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(interp.builtins.list(items))
            }
            _ => Err(cannot("add", lhs, rhs, span)),
        }
    }

    fn index_get(
        &self,
        _interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        span: Span,
    ) -> OpResult {
        match object.payload() {
            Some(Payload::List(items)) => {
                let items = items.borrow();
                let i = expect_index(index, span)?;
                items.get(i).cloned().ok_or_else(|| {
                    RuntimeError::type_error(
                        format!("index {} out of bounds (length {})", i, items.len()),
                        span,
                    )
                })
            }
            _ => Err(RuntimeError::type_error("expected List receiver", span)),
        }
    }

    fn index_set(
        &self,
        _interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        value: &Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        match object.payload() {
            Some(Payload::List(items)) => {
                let mut items = items.borrow_mut();
                let len = items.len();
                let i = expect_index(index, span)?;
                match items.get_mut(i) {
                    Some(slot) => {
                        *slot = value.clone();
                        Ok(())
                    }
                    None => Err(RuntimeError::type_error(
                        format!("index {} out of bounds (length {})", i, len),
                        span,
                    )),
                }
            }
            _ => Err(RuntimeError::type_error("expected List receiver", span)),
        }
    }
}

struct DictOps;
static DICT_OPS: DictOps = DictOps;

impl ClassOps for DictOps {
    fn index_get(
        &self,
        interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        span: Span,
    ) -> OpResult {
        match object.payload() {
            Some(Payload::Dict(map)) => {
                let key = HashKey::from_value(index).ok_or_else(|| {
                    RuntimeError::type_error(
                        format!("{} cannot be a Dict key", index.type_name()),
                        span,
                    )
                })?;
                Ok(map
                    .borrow()
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| interp.builtins.null()))
            }
            _ => Err(RuntimeError::type_error("expected Dict receiver", span)),
        }
    }

    fn index_set(
        &self,
        _interp: &mut Interpreter,
        object: &Value,
        index: &Value,
        value: &Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        match object.payload() {
            Some(Payload::Dict(map)) => {
                let key = HashKey::from_value(index).ok_or_else(|| {
                    RuntimeError::type_error(
                        format!("{} cannot be a Dict key", index.type_name()),
                        span,
                    )
                })?;
                map.borrow_mut().insert(key, value.clone());
                Ok(())
            }
            _ => Err(RuntimeError::type_error("expected Dict receiver", span)),
        }
    }
}

/// User classes: forward to conventionally named methods so operator
/// behavior is overloadable per class.
struct UserOps;
static USER_OPS: UserOps = UserOps;

impl UserOps {
    fn dispatch(
        &self,
        interp: &mut Interpreter,
        method: &str,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> OpResult {
        match interp.invoke_method(lhs, method, vec![rhs.clone()], span)? {
            Some(result) => Ok(result),
            None => Err(RuntimeError::type_error(
                format!(
                    "{} defines no '{}' method for operator use",
                    lhs.type_name(),
                    method
                ),
                span,
            )),
        }
    }
}

impl ClassOps for UserOps {
    fn add(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.dispatch(interp, "Add", lhs, rhs, span)
    }

    fn subtract(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.dispatch(interp, "Subtract", lhs, rhs, span)
    }

    fn multiply(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.dispatch(interp, "Multiply", lhs, rhs, span)
    }

    fn divide(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.dispatch(interp, "Divide", lhs, rhs, span)
    }

    fn modulo(&self, interp: &mut Interpreter, lhs: &Value, rhs: &Value, span: Span) -> OpResult {
        self.dispatch(interp, "Modulo", lhs, rhs, span)
    }

    fn equals(
        &self,
        interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<bool, RuntimeError> {
        match interp.invoke_method(lhs, "Equals", vec![rhs.clone()], span)? {
            Some(result) => Ok(result.is_truthy()),
            None => Ok(lhs.same_as(rhs)),
        }
    }

    fn compare(
        &self,
        interp: &mut Interpreter,
        lhs: &Value,
        rhs: &Value,
        span: Span,
    ) -> Result<Ordering, RuntimeError> {
        match interp.invoke_method(lhs, "Compare", vec![rhs.clone()], span)? {
            Some(result) => match result.as_int() {
                Some(n) => Ok(n.cmp(&0)),
                None => Err(RuntimeError::type_error(
                    "Compare must return an int",
                    span,
                )),
            },
            None => Err(cannot("compare", lhs, rhs, span)),
        }
    }

    fn negate(&self, interp: &mut Interpreter, value: &Value, span: Span) -> OpResult {
        match interp.invoke_method(value, "Negate", Vec::new(), span)? {
            Some(result) => Ok(result),
            None => Err(RuntimeError::type_error(
                format!("cannot negate {}", value.type_name()),
                span,
            )),
        }
    }
}

fn expect_index(index: &Value, span: Span) -> Result<usize, RuntimeError> {
    match index.as_int() {
        Some(n) if n >= 0 => Ok(n as usize),
        Some(n) => Err(RuntimeError::type_error(
            format!("negative index {}", n),
            span,
        )),
        None => Err(RuntimeError::type_error(
            format!("index must be an int, got {}", index.type_name()),
            span,
        )),
    }
}
