//! List, Dict, and Iterator classes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::interpreter::iter::iterate;
use crate::interpreter::value::{HashKey, Parameter, Payload, Value};
use crate::span::Span;

use super::{add_ctor, add_method, Builtins};

fn recv_list(recv: &Option<Value>) -> Result<Rc<RefCell<Vec<Value>>>, String> {
    match recv.as_ref().and_then(|v| v.payload()) {
        Some(Payload::List(items)) => Ok(items),
        _ => Err("expected List receiver".to_string()),
    }
}

fn recv_dict(
    recv: &Option<Value>,
) -> Result<Rc<RefCell<indexmap::IndexMap<HashKey, Value, ahash::RandomState>>>, String> {
    match recv.as_ref().and_then(|v| v.payload()) {
        Some(Payload::Dict(map)) => Ok(map),
        _ => Err("expected Dict receiver".to_string()),
    }
}

pub(crate) fn register(b: &Builtins) {
    register_list(b);
    register_dict(b);
    register_iterator(b);
}

fn register_list(b: &Builtins) {
    let class = &b.list_class;

    // List(1, 2, 3): the variadic parameter already arrives as a list.
    add_ctor(
        class,
        vec![Parameter::variadic("items")],
        Rc::new(|_interp, _recv, mut args| Ok(args.remove(0))),
    );

    add_method(class, "length", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let items = recv_list(&recv)?;
            let len = items.borrow().len() as i64;
            Ok(interp.builtins.int(len))
        })
    });

    add_method(class, "push", vec![Parameter::any("value")], {
        Rc::new(|_interp, recv, mut args| {
            let items = recv_list(&recv)?;
            items.borrow_mut().push(args.remove(0));
            recv.ok_or_else(|| "missing receiver".to_string())
        })
    });

    add_method(class, "pop", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let items = recv_list(&recv)?;
            let popped = items.borrow_mut().pop();
            Ok(popped.unwrap_or_else(|| interp.builtins.null()))
        })
    });

    add_method(class, "contains", vec![Parameter::any("value")], {
        Rc::new(|interp, recv, args| {
            let items = recv_list(&recv)?;
            let found = items.borrow().iter().any(|item| item.same_as(&args[0]));
            Ok(interp.builtins.bool_value(found))
        })
    });

    add_method(class, "join", vec![Parameter::any("separator")], {
        Rc::new(|interp, recv, args| {
            let items = recv_list(&recv)?;
            let sep = args[0].as_str().ok_or("separator must be a str")?;
            let items = items.borrow().clone();
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(
                    interp
                        .display_value(item, Span::default())
                        .map_err(|e| e.to_string())?,
                );
            }
            Ok(interp.builtins.str_value(parts.join(&sep)))
        })
    });

    add_method(class, "reverse", Vec::new(), {
        Rc::new(|_interp, recv, _args| {
            let items = recv_list(&recv)?;
            items.borrow_mut().reverse();
            recv.ok_or_else(|| "missing receiver".to_string())
        })
    });

    add_method(class, "remove_at", vec![Parameter::any("index")], {
        Rc::new(|_interp, recv, args| {
            let items = recv_list(&recv)?;
            let index = args[0].as_int().ok_or("index must be an int")?;
            let len = items.borrow().len();
            if index < 0 || index as usize >= len {
                return Err(format!("index {} out of bounds (length {})", index, len));
            }
            let removed = items.borrow_mut().remove(index as usize);
            Ok(removed)
        })
    });
}

fn register_dict(b: &Builtins) {
    let class = &b.dict_class;

    add_ctor(
        class,
        Vec::new(),
        Rc::new(|interp, _recv, _args| Ok(interp.builtins.dict_empty())),
    );

    add_method(class, "length", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let map = recv_dict(&recv)?;
            let len = map.borrow().len() as i64;
            Ok(interp.builtins.int(len))
        })
    });

    add_method(class, "keys", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let map = recv_dict(&recv)?;
            let keys = map
                .borrow()
                .keys()
                .map(|k| interp.builtins.key_value(k))
                .collect();
            Ok(interp.builtins.list(keys))
        })
    });

    add_method(class, "values", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let map = recv_dict(&recv)?;
            let values = map.borrow().values().cloned().collect();
            Ok(interp.builtins.list(values))
        })
    });

    add_method(class, "contains", vec![Parameter::any("key")], {
        Rc::new(|interp, recv, args| {
            let map = recv_dict(&recv)?;
            let key = HashKey::from_value(&args[0])
                .ok_or_else(|| format!("{} cannot be a Dict key", args[0].type_name()))?;
            let found = map.borrow().contains_key(&key);
            Ok(interp.builtins.bool_value(found))
        })
    });

    add_method(class, "remove", vec![Parameter::any("key")], {
        Rc::new(|interp, recv, args| {
            let map = recv_dict(&recv)?;
            let key = HashKey::from_value(&args[0])
                .ok_or_else(|| format!("{} cannot be a Dict key", args[0].type_name()))?;
            let removed = map.borrow_mut().shift_remove(&key);
            Ok(removed.unwrap_or_else(|| interp.builtins.null()))
        })
    });
}

fn register_iterator(b: &Builtins) {
    let class = &b.iterator_class;

    add_ctor(
        class,
        vec![Parameter::any("source")],
        Rc::new(|interp, _recv, args| {
            let items = iterate(interp, &args[0], Span::default()).map_err(|e| e.to_string())?;
            Ok(interp.builtins.iterator(items))
        }),
    );

    add_method(class, "has_next", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let state = match recv.as_ref().and_then(|v| v.payload()) {
                Some(Payload::Iter(state)) => state,
                _ => return Err("expected Iterator receiver".to_string()),
            };
            let state = state.borrow();
            Ok(interp.builtins.bool_value(state.index < state.items.len()))
        })
    });

    add_method(class, "next", Vec::new(), {
        Rc::new(|interp, recv, _args| {
            let state = match recv.as_ref().and_then(|v| v.payload()) {
                Some(Payload::Iter(state)) => state,
                _ => return Err("expected Iterator receiver".to_string()),
            };
            let mut state = state.borrow_mut();
            if state.index >= state.items.len() {
                return Ok(interp.builtins.null());
            }
            let item = state.items[state.index].clone();
            state.index += 1;
            Ok(item)
        })
    });
}
