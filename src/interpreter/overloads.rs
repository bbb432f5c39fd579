//! Overload resolution.
//!
//! A call site matches argument values against every overload of a function
//! set. Among the overloads that can bind, the one with the fewest untyped
//! parameters wins; ties go to the earliest declared.

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::interpreter::class::is_type_or_sub_of;
use crate::interpreter::value::{FunctionSet, Overload, Parameter, Value};
use crate::interpreter::Interpreter;
use crate::span::Span;

/// One call-site argument after splat expansion.
#[derive(Debug, Clone)]
pub enum CallArg {
    Positional(Value),
    Named(String, Value),
}

/// How a parameter got its value. Defaults are left unevaluated here; the
/// caller evaluates them in the overload's declaration scope.
#[derive(Debug, Clone)]
pub enum Bound {
    Value(Value),
    Variadic(Vec<Value>),
    Default,
}

/// A selected overload with its per-parameter bindings.
#[derive(Debug)]
pub struct BoundCall {
    pub overload: Rc<Overload>,
    pub bindings: Vec<Bound>,
}

/// Pick the overload for a call, or fail with a diagnostic enumerating
/// every candidate signature.
pub fn resolve(
    interp: &Interpreter,
    set: &FunctionSet,
    args: &[CallArg],
    span: Span,
) -> Result<BoundCall, RuntimeError> {
    let mut best: Option<(usize, BoundCall)> = None;

    for overload in &set.overloads {
        let Some(bindings) = try_bind(interp, overload, args) else {
            continue;
        };
        let untyped = overload.params.iter().filter(|p| p.is_any()).count();
        let better = match &best {
            Some((best_untyped, _)) => untyped < *best_untyped,
            None => true,
        };
        if better {
            best = Some((
                untyped,
                BoundCall {
                    overload: overload.clone(),
                    bindings,
                },
            ));
        }
    }

    match best {
        Some((_, call)) => Ok(call),
        None => Err(RuntimeError::NoMatchingOverload {
            name: set.name.clone(),
            given: describe_args(args),
            candidates: set.signatures(),
            span,
        }),
    }
}

/// Attempt to bind arguments to one overload. Named arguments claim their
/// parameters first, positionals fill the rest in order, a trailing variadic
/// parameter absorbs the overflow, and unclaimed parameters fall back to
/// their defaults.
fn try_bind(interp: &Interpreter, overload: &Overload, args: &[CallArg]) -> Option<Vec<Bound>> {
    let params = &overload.params;
    let mut bound: Vec<Option<Bound>> = vec![None; params.len()];

    for arg in args {
        if let CallArg::Named(name, value) = arg {
            let pos = params.iter().position(|p| p.name == *name)?;
            if bound[pos].is_some() || params[pos].is_variadic {
                return None;
            }
            if !accepts(interp, &params[pos], value) {
                return None;
            }
            bound[pos] = Some(Bound::Value(value.clone()));
        }
    }

    let mut positionals = args.iter().filter_map(|a| match a {
        CallArg::Positional(value) => Some(value),
        CallArg::Named(..) => None,
    });

    for (pos, param) in params.iter().enumerate() {
        if bound[pos].is_some() {
            continue;
        }
        if param.is_variadic {
            let mut rest = Vec::new();
            for value in positionals.by_ref() {
                if !accepts(interp, param, value) {
                    return None;
                }
                rest.push(value.clone());
            }
            bound[pos] = Some(Bound::Variadic(rest));
            continue;
        }
        match positionals.next() {
            Some(value) => {
                if !accepts(interp, param, value) {
                    return None;
                }
                bound[pos] = Some(Bound::Value(value.clone()));
            }
            None => {
                if param.default.is_none() {
                    return None;
                }
                bound[pos] = Some(Bound::Default);
            }
        }
    }

    // Leftover positionals mean this overload cannot take the call.
    if positionals.next().is_some() {
        return None;
    }

    Some(bound.into_iter().map(|b| b.unwrap_or(Bound::Default)).collect())
}

/// Null satisfies every declared type; otherwise the value's class must be
/// the declared class or a subtype of it.
fn accepts(interp: &Interpreter, param: &Parameter, value: &Value) -> bool {
    if param.is_any() || value.is_null() {
        return true;
    }
    let class = interp.class_of(value);
    param
        .accepted
        .iter()
        .any(|accepted| is_type_or_sub_of(&class, accepted))
}

pub(crate) fn describe_args(args: &[CallArg]) -> String {
    args.iter()
        .map(|arg| match arg {
            CallArg::Positional(value) => value.type_name(),
            CallArg::Named(name, value) => format!("{}: {}", name, value.type_name()),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::{FunctionSet, Overload, Parameter};
    use std::rc::Rc;

    fn stub(params: Vec<Parameter>) -> Rc<Overload> {
        Overload::native(params, Rc::new(|_, _, _| unreachable!()))
    }

    #[test]
    fn typed_overload_beats_untyped_for_matching_argument() {
        let interp = Interpreter::new();
        let untyped = stub(vec![Parameter::any("x")]);
        let typed = stub(vec![Parameter::typed("x", &interp.builtins.int_class)]);

        let mut set = FunctionSet::new("f");
        set.merge_overload(untyped.clone(), true);
        set.merge_overload(typed.clone(), true);

        let n = interp.builtins.int(3);
        let call = resolve(
            &interp,
            &set,
            &[CallArg::Positional(n)],
            Span::default(),
        )
        .unwrap();
        assert!(Rc::ptr_eq(&call.overload, &typed));

        let s = interp.builtins.str_value("hi");
        let call = resolve(
            &interp,
            &set,
            &[CallArg::Positional(s)],
            Span::default(),
        )
        .unwrap();
        assert!(Rc::ptr_eq(&call.overload, &untyped));
    }

    #[test]
    fn tie_goes_to_first_declared() {
        let interp = Interpreter::new();
        let first = stub(vec![Parameter::any("x")]);
        let second = stub(vec![Parameter::any("y")]);

        let mut set = FunctionSet::new("f");
        set.overloads.push(first.clone());
        set.overloads.push(second);

        let n = interp.builtins.int(1);
        let call = resolve(&interp, &set, &[CallArg::Positional(n)], Span::default()).unwrap();
        assert!(Rc::ptr_eq(&call.overload, &first));
    }

    #[test]
    fn named_arguments_claim_their_parameters() {
        let interp = Interpreter::new();
        let overload = stub(vec![Parameter::any("a"), Parameter::any("b")]);
        let set = FunctionSet::single("f", overload);

        let one = interp.builtins.int(1);
        let two = interp.builtins.int(2);
        let call = resolve(
            &interp,
            &set,
            &[
                CallArg::Named("b".into(), two),
                CallArg::Positional(one),
            ],
            Span::default(),
        )
        .unwrap();

        match (&call.bindings[0], &call.bindings[1]) {
            (Bound::Value(a), Bound::Value(b)) => {
                assert_eq!(a.as_int(), Some(1));
                assert_eq!(b.as_int(), Some(2));
            }
            _ => panic!("both parameters must bind directly"),
        }
    }

    #[test]
    fn variadic_collects_trailing_positionals() {
        let interp = Interpreter::new();
        let overload = stub(vec![Parameter::any("first"), Parameter::variadic("rest")]);
        let set = FunctionSet::single("f", overload);

        let args: Vec<CallArg> = (1..=3)
            .map(|n| CallArg::Positional(interp.builtins.int(n)))
            .collect();
        let call = resolve(&interp, &set, &args, Span::default()).unwrap();
        match &call.bindings[1] {
            Bound::Variadic(rest) => assert_eq!(rest.len(), 2),
            _ => panic!("variadic parameter must collect the overflow"),
        }
    }

    #[test]
    fn null_matches_declared_types() {
        let interp = Interpreter::new();
        let typed = stub(vec![Parameter::typed("x", &interp.builtins.str_class)]);
        let set = FunctionSet::single("f", typed);

        let null = interp.builtins.null();
        assert!(resolve(&interp, &set, &[CallArg::Positional(null)], Span::default()).is_ok());
    }

    #[test]
    fn no_match_enumerates_candidates() {
        let interp = Interpreter::new();
        let typed = stub(vec![Parameter::typed("x", &interp.builtins.int_class)]);
        let set = FunctionSet::single("f", typed);

        let s = interp.builtins.str_value("nope");
        let err = resolve(&interp, &set, &[CallArg::Positional(s)], Span::default()).unwrap_err();
        match err {
            RuntimeError::NoMatchingOverload { candidates, given, .. } => {
                assert!(candidates.contains("f(x: int)"));
                assert_eq!(given, "str");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_argument_uses_default() {
        use crate::ast::{Expr, ExprKind};
        let interp = Interpreter::new();
        let param = Parameter::any("x").with_default(Expr {
            kind: ExprKind::Int(7),
            span: Span::default(),
        });
        let set = FunctionSet::single("f", stub(vec![param]));

        let call = resolve(&interp, &set, &[], Span::default()).unwrap();
        assert!(matches!(call.bindings[0], Bound::Default));
    }
}
