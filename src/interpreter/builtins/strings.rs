//! Native constructor and methods of the str class.

use std::rc::Rc;

use crate::interpreter::value::{Parameter, Value};
use crate::span::Span;

use super::{add_ctor, add_method, Builtins};

fn recv_str(recv: &Option<Value>) -> Result<String, String> {
    recv.as_ref()
        .and_then(|v| v.as_str())
        .ok_or_else(|| "expected str receiver".to_string())
}

fn arg_str(args: &[Value], i: usize) -> Result<String, String> {
    args.get(i)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("argument {} must be a str", i + 1))
}

pub(crate) fn register(b: &Builtins) {
    let class = &b.str_class;

    add_ctor(
        class,
        vec![Parameter::any("value")],
        Rc::new(|interp, _recv, args| {
            let text = interp
                .display_value(&args[0], Span::default())
                .map_err(|e| e.to_string())?;
            Ok(interp.builtins.str_value(text))
        }),
    );

    add_method(class, "length", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let s = recv_str(&recv)?;
            Ok(interp.builtins.int(s.chars().count() as i64))
        })
    });

    add_method(class, "upper", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let s = recv_str(&recv)?;
            Ok(interp.builtins.str_value(s.to_uppercase()))
        })
    });

    add_method(class, "lower", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let s = recv_str(&recv)?;
            Ok(interp.builtins.str_value(s.to_lowercase()))
        })
    });

    add_method(class, "trim", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let s = recv_str(&recv)?;
            Ok(interp.builtins.str_value(s.trim().to_string()))
        })
    });

    add_method(class, "contains", vec![Parameter::any("needle")], {
        Rc::new(|interp, recv, args| {
            let s = recv_str(&recv)?;
            let needle = arg_str(&args, 0)?;
            Ok(interp.builtins.bool_value(s.contains(&needle)))
        })
    });

    add_method(class, "starts_with", vec![Parameter::any("prefix")], {
        Rc::new(|interp, recv, args| {
            let s = recv_str(&recv)?;
            let prefix = arg_str(&args, 0)?;
            Ok(interp.builtins.bool_value(s.starts_with(&prefix)))
        })
    });

    add_method(class, "ends_with", vec![Parameter::any("suffix")], {
        Rc::new(|interp, recv, args| {
            let s = recv_str(&recv)?;
            let suffix = arg_str(&args, 0)?;
            Ok(interp.builtins.bool_value(s.ends_with(&suffix)))
        })
    });

    add_method(class, "split", vec![Parameter::any("separator")], {
        Rc::new(|interp, recv, args| {
            let s = recv_str(&recv)?;
            let sep = arg_str(&args, 0)?;
            let parts = if sep.is_empty() {
                s.chars()
                    .map(|c| interp.builtins.str_value(c.to_string()))
                    .collect()
            } else {
                s.split(&sep)
                    .map(|part| interp.builtins.str_value(part.to_string()))
                    .collect()
            };
            Ok(interp.builtins.list(parts))
        })
    });

    add_method(
        class,
        "replace",
        vec![Parameter::any("from"), Parameter::any("to")],
        Rc::new(|interp, recv, args| {
            let s = recv_str(&recv)?;
            let from = arg_str(&args, 0)?;
            let to = arg_str(&args, 1)?;
            Ok(interp.builtins.str_value(s.replace(&from, &to)))
        }),
    );
}
