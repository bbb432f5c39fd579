//! Numeric, bool, and range classes.

use std::rc::Rc;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::interpreter::value::{Parameter, Payload};

use super::{add_ctor, add_method, Builtins};

pub(crate) fn register(b: &Builtins) {
    add_ctor(
        &b.int_class,
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| {
            let n = match args[0].payload() {
                Some(Payload::Int(n)) => n,
                Some(Payload::Float(f)) => f.trunc() as i64,
                Some(Payload::Decimal(d)) => d
                    .trunc()
                    .to_i64()
                    .ok_or("decimal out of int range")?,
                Some(Payload::Bool(b)) => i64::from(b),
                Some(Payload::Str(s)) => s
                    .trim()
                    .parse()
                    .map_err(|_| format!("cannot parse '{}' as int", s))?,
                _ => return Err(format!("cannot convert {} to int", args[0].type_name())),
            };
            Ok(interp.builtins.int(n))
        }),
    );

    add_method(&b.int_class, "abs", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let n = recv
                .as_ref()
                .and_then(|v| v.as_int())
                .ok_or("expected int receiver")?;
            Ok(interp.builtins.int(n.saturating_abs()))
        })
    });

    add_ctor(
        &b.float_class,
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| {
            let n = match args[0].payload() {
                Some(Payload::Int(n)) => n as f64,
                Some(Payload::Float(f)) => f,
                Some(Payload::Decimal(d)) => d.to_f64().ok_or("decimal out of float range")?,
                Some(Payload::Str(s)) => s
                    .trim()
                    .parse()
                    .map_err(|_| format!("cannot parse '{}' as float", s))?,
                _ => return Err(format!("cannot convert {} to float", args[0].type_name())),
            };
            Ok(interp.builtins.float(n))
        }),
    );

    add_method(&b.float_class, "abs", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let n = match recv.as_ref().and_then(|v| v.payload()) {
                Some(Payload::Float(n)) => n,
                _ => return Err("expected float receiver".to_string()),
            };
            Ok(interp.builtins.float(n.abs()))
        })
    });

    add_ctor(
        &b.decimal_class,
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| {
            let d = match args[0].payload() {
                Some(Payload::Int(n)) => Decimal::from(n),
                Some(Payload::Float(f)) => {
                    Decimal::from_f64(f).ok_or("float not representable as decimal")?
                }
                Some(Payload::Decimal(d)) => d,
                Some(Payload::Str(s)) => Decimal::from_str(s.trim())
                    .map_err(|_| format!("cannot parse '{}' as decimal", s))?,
                _ => {
                    return Err(format!(
                        "cannot convert {} to decimal",
                        args[0].type_name()
                    ))
                }
            };
            Ok(interp.builtins.decimal(d))
        }),
    );

    add_ctor(
        &b.bool_class,
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| Ok(interp.builtins.bool_value(args[0].is_truthy()))),
    );

    // range(end) and range(start, end), both half-open.
    add_ctor(
        &b.range_class,
        vec![Parameter::typed("end", &b.int_class)],
        Rc::new(|interp, _recv, args| {
            let end = args[0].as_int().ok_or("range bound must be an int")?;
            Ok(interp.builtins.range(0, end))
        }),
    );
    add_ctor(
        &b.range_class,
        vec![
            Parameter::typed("start", &b.int_class),
            Parameter::typed("end", &b.int_class),
        ],
        Rc::new(|interp, _recv, args| {
            let start = args[0].as_int().ok_or("range bound must be an int")?;
            let end = args[1].as_int().ok_or("range bound must be an int")?;
            Ok(interp.builtins.range(start, end))
        }),
    );

    add_method(&b.range_class, "length", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let (start, end) = match recv.as_ref().and_then(|v| v.payload()) {
                Some(Payload::Range { start, end }) => (start, end),
                _ => return Err("expected range receiver".to_string()),
            };
            Ok(interp.builtins.int((end - start).max(0)))
        })
    });
}
