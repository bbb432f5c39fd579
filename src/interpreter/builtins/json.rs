//! Json static class: parse and stringify.

use std::rc::Rc;

use rust_decimal::prelude::ToPrimitive;

use crate::interpreter::value::{HashKey, Parameter, Payload, Value};
use crate::interpreter::Interpreter;

use super::{add_static_method, Builtins};

pub(crate) fn register(b: &Builtins) {
    let class = &b.json_class;

    add_static_method(
        class,
        "parse",
        vec![Parameter::typed("text", &b.str_class)],
        Rc::new(|interp, _recv, args| {
            let text = args[0].as_str().ok_or("Json.parse expects a str")?;
            let json = serde_json::from_str::<serde_json::Value>(&text)
                .map_err(|e| format!("invalid JSON: {}", e))?;
            Ok(json_to_value(interp, &json))
        }),
    );

    add_static_method(
        class,
        "stringify",
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| {
            let json = value_to_json(&args[0])?;
            let text = serde_json::to_string(&json).map_err(|e| e.to_string())?;
            Ok(interp.builtins.str_value(text))
        }),
    );
}

fn json_to_value(interp: &Interpreter, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => interp.builtins.null(),
        serde_json::Value::Bool(b) => interp.builtins.bool_value(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                interp.builtins.int(i)
            } else {
                interp.builtins.float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => interp.builtins.str_value(s.clone()),
        serde_json::Value::Array(items) => {
            let items = items.iter().map(|item| json_to_value(interp, item)).collect();
            interp.builtins.list(items)
        }
        serde_json::Value::Object(map) => {
            let mut dict: indexmap::IndexMap<HashKey, Value, ahash::RandomState> =
                indexmap::IndexMap::default();
            for (key, value) in map {
                dict.insert(HashKey::Str(key.clone()), json_to_value(interp, value));
            }
            interp.builtins.dict(dict)
        }
    }
}

fn value_to_json(value: &Value) -> Result<serde_json::Value, String> {
    if value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    match value.payload() {
        Some(Payload::Int(n)) => Ok(serde_json::Value::from(n)),
        Some(Payload::Float(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| "non-finite float is not valid JSON".to_string()),
        Some(Payload::Decimal(d)) => {
            let n = d.to_f64().ok_or("decimal out of JSON number range")?;
            serde_json::Number::from_f64(n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| "non-finite number is not valid JSON".to_string())
        }
        Some(Payload::Bool(b)) => Ok(serde_json::Value::Bool(b)),
        Some(Payload::Str(s)) => Ok(serde_json::Value::String(s)),
        Some(Payload::Range { start, end }) => {
            let items = (start..end).map(serde_json::Value::from).collect();
            Ok(serde_json::Value::Array(items))
        }
        Some(Payload::List(items)) => {
            let items = items.borrow().clone();
            let mut out = Vec::with_capacity(items.len());
            for item in &items {
                out.push(value_to_json(item)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Some(Payload::Dict(map)) => {
            let mut out = serde_json::Map::new();
            for (key, val) in map.borrow().iter() {
                out.insert(key.to_string(), value_to_json(val)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        Some(Payload::Iter(_)) => Err("iterators are not JSON serializable".to_string()),
        None => Err(format!("{} is not JSON serializable", value.type_name())),
    }
}
