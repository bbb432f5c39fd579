//! The iteration protocol.
//!
//! `for` loops, destructuring, splats, and the Iterator constructor all
//! funnel through [`iterate`], which materializes any iterable value into a
//! vector of elements.

use crate::error::RuntimeError;
use crate::interpreter::value::{Payload, Value};
use crate::interpreter::Interpreter;
use crate::span::Span;

/// Materialize an iterable value.
///
/// Lists yield their elements, dicts yield `[key, value]` pairs, ranges
/// yield ints, strings yield one-character strings, and iterators drain
/// their remaining elements. User objects participate by exposing an
/// `iterable` method whose result is iterated in turn.
pub fn iterate(
    interp: &mut Interpreter,
    value: &Value,
    span: Span,
) -> Result<Vec<Value>, RuntimeError> {
    match value.payload() {
        Some(Payload::List(items)) => Ok(items.borrow().clone()),
        Some(Payload::Dict(map)) => {
            let pairs = map
                .borrow()
                .iter()
                .map(|(key, val)| {
                    let key = interp.builtins.key_value(key);
                    interp.builtins.list(vec![key, val.clone()])
                })
                .collect();
            Ok(pairs)
        }
        Some(Payload::Range { start, end }) => {
            Ok((start..end).map(|n| interp.builtins.int(n)).collect())
        }
        Some(Payload::Str(s)) => Ok(s
            .chars()
            .map(|c| interp.builtins.str_value(c.to_string()))
            .collect()),
        Some(Payload::Iter(state)) => {
            let mut state = state.borrow_mut();
            let rest = state.items[state.index..].to_vec();
            state.index = state.items.len();
            Ok(rest)
        }
        _ => iterate_user(interp, value, span),
    }
}

/// A user object iterates through its `iterable` method.
fn iterate_user(
    interp: &mut Interpreter,
    value: &Value,
    span: Span,
) -> Result<Vec<Value>, RuntimeError> {
    if value.as_object().is_some() {
        if let Some(result) = interp.invoke_method(value, "iterable", Vec::new(), span)? {
            if result.same_as(value) {
                return Err(RuntimeError::not_iterable(value.type_name(), span));
            }
            return iterate(interp, &result, span);
        }
    }
    Err(RuntimeError::not_iterable(value.type_name(), span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    #[test]
    fn range_yields_half_open_sequence() {
        let mut interp = Interpreter::new();
        let range = interp.builtins.range(10, 20);
        let items = iterate(&mut interp, &range, Span::default()).unwrap();
        let ints: Vec<i64> = items.iter().filter_map(|v| v.as_int()).collect();
        assert_eq!(ints, (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn dict_yields_key_value_pairs() {
        let mut interp = Interpreter::new();
        let dict = interp.builtins.dict_empty();
        let key = interp.builtins.str_value("a");
        let val = interp.builtins.int(1);
        interp.builtins.dict_insert(&dict, &key, val);

        let items = iterate(&mut interp, &dict, Span::default()).unwrap();
        assert_eq!(items.len(), 1);
        let pair = iterate(&mut interp, &items[0], Span::default()).unwrap();
        assert_eq!(pair[0].as_str().as_deref(), Some("a"));
        assert_eq!(pair[1].as_int(), Some(1));
    }

    #[test]
    fn iterator_drains_once() {
        let mut interp = Interpreter::new();
        let one = interp.builtins.int(1);
        let two = interp.builtins.int(2);
        let iter = interp.builtins.iterator(vec![one, two]);

        let first = iterate(&mut interp, &iter, Span::default()).unwrap();
        assert_eq!(first.len(), 2);
        let second = iterate(&mut interp, &iter, Span::default()).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn ints_are_not_iterable() {
        let mut interp = Interpreter::new();
        let n = interp.builtins.int(3);
        let err = iterate(&mut interp, &n, Span::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::NotIterable(..)));
    }
}
