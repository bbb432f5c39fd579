//! Loops, switch, and the fault machinery: throw, try/catch/finally, the
//! catch expression, and destructuring.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use quill::ast::BinaryOp;
use quill::RuntimeError;

#[test]
fn if_picks_the_matching_branch() {
    let value = run_ok(vec![
        var("x", int(3)),
        var("out", str_("")),
        if_stmt(
            bin(name("x"), BinaryOp::Greater, int(2)),
            expr_stmt(assign(name("out"), str_("big"))),
            Some(expr_stmt(assign(name("out"), str_("small")))),
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("big"));
}

#[test]
fn while_respects_break_and_continue() {
    // Sum odd numbers below 10, stopping at 7.
    let value = run_ok(vec![
        var("i", int(0)),
        var("sum", int(0)),
        while_stmt(
            bin(name("i"), BinaryOp::Less, int(10)),
            block(vec![
                expr_stmt(assign(name("i"), add(name("i"), int(1)))),
                if_stmt(
                    eq(bin(name("i"), BinaryOp::Modulo, int(2)), int(0)),
                    cont(),
                    None,
                ),
                if_stmt(bin(name("i"), BinaryOp::Greater, int(7)), brk(), None),
                expr_stmt(assign(name("sum"), add(name("sum"), name("i")))),
            ]),
        ),
        expr_stmt(name("sum")),
    ]);
    // 1 + 3 + 5 + 7
    assert_eq!(value.as_int(), Some(16));
}

#[test]
fn for_walks_a_range_half_open() {
    let value = run_ok(vec![
        var("sum", int(0)),
        for_stmt(
            &["i"],
            call_name("range", vec![int(10), int(20)]),
            expr_stmt(assign(name("sum"), add(name("sum"), name("i")))),
        ),
        expr_stmt(name("sum")),
    ]);
    // 10 + 11 + ... + 19
    assert_eq!(value.as_int(), Some(145));
}

#[test]
fn for_walks_dict_entries_as_pairs() {
    let value = run_ok(vec![
        var("keys", str_("")),
        var("total", int(0)),
        for_stmt(
            &["k", "v"],
            map(vec![(str_("a"), int(1)), (str_("b"), int(2))]),
            block(vec![
                expr_stmt(assign(name("keys"), add(name("keys"), name("k")))),
                expr_stmt(assign(name("total"), add(name("total"), name("v")))),
            ]),
        ),
        expr_stmt(ternary(eq(name("keys"), str_("ab")), name("total"), int(-1))),
    ]);
    assert_eq!(value.as_int(), Some(3));
}

#[test]
fn for_consumes_a_user_iterable() {
    // A user object iterates through whatever its `iterable` method returns.
    let value = run_ok(vec![
        class_decl(
            "Countdown",
            &[],
            vec![
                field_decl("n", Some(int(3))),
                method_decl("iterable", vec![], vec![ret(call_name(
                    "range",
                    vec![int(0), member(this(), "n")],
                ))]),
            ],
        ),
        var("sum", int(0)),
        for_stmt(
            &["x"],
            call_name("Countdown", vec![]),
            expr_stmt(assign(name("sum"), add(name("sum"), name("x")))),
        ),
        expr_stmt(name("sum")),
    ]);
    // 0 + 1 + 2
    assert_eq!(value.as_int(), Some(3));
}

#[test]
fn switch_runs_first_matching_case_without_fallthrough() {
    let value = run_ok(vec![
        var("out", str_("")),
        switch_stmt(
            int(2),
            vec![
                case(vec![int(1)], vec![expr_stmt(assign(name("out"), str_("one")))]),
                case(vec![int(2), int(3)], vec![
                    expr_stmt(assign(name("out"), str_("few"))),
                    brk(),
                    expr_stmt(assign(name("out"), str_("unreached"))),
                ]),
            ],
            Some(vec![expr_stmt(assign(name("out"), str_("many")))]),
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("few"));
}

#[test]
fn switch_falls_back_to_default() {
    let value = run_ok(vec![
        var("out", str_("")),
        switch_stmt(
            int(9),
            vec![case(vec![int(1)], vec![expr_stmt(assign(
                name("out"),
                str_("one"),
            ))])],
            Some(vec![expr_stmt(assign(name("out"), str_("many")))]),
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("many"));
}

#[test]
fn thrown_exception_is_caught_and_bound() {
    let value = run_ok(vec![
        var("out", null()),
        try_stmt(
            vec![throw(call_name("Exception", vec![str_("boom")]))],
            vec![catch_clause(&[], Some("e"), vec![expr_stmt(assign(
                name("out"),
                member(name("e"), "message"),
            ))])],
            None,
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("boom"));
}

#[test]
fn typed_catch_matches_subclasses() {
    let value = run_ok(vec![
        class_decl(
            "ParseError",
            &["Exception"],
            vec![ctor_decl(vec![param("m")], vec![expr_stmt(call(
                super_(),
                vec![name("m")],
            ))])],
        ),
        var("out", null()),
        try_stmt(
            vec![throw(call_name("ParseError", vec![str_("bad input")]))],
            vec![catch_clause(&["Exception"], Some("e"), vec![expr_stmt(
                assign(name("out"), member(name("e"), "message")),
            )])],
            None,
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("bad input"));
}

#[test]
fn typed_catch_skips_unrelated_faults() {
    let err = run_err(vec![
        class_decl("IoError", &["Exception"], vec![]),
        try_stmt(
            vec![throw(call_name("Exception", vec![str_("boom")]))],
            vec![catch_clause(&["IoError"], Some("e"), vec![ret(str_(
                "caught",
            ))])],
            None,
        ),
    ]);
    assert!(matches!(err, RuntimeError::Fault { .. }));
}

#[test]
fn finally_runs_on_the_fault_path() {
    let value = run_ok(vec![
        var("log", str_("")),
        try_stmt(
            vec![throw(call_name("Exception", vec![str_("boom")]))],
            vec![catch_clause(&[], None, vec![expr_stmt(assign(
                name("log"),
                add(name("log"), str_("catch ")),
            ))])],
            Some(vec![expr_stmt(assign(
                name("log"),
                add(name("log"), str_("finally")),
            ))]),
        ),
        expr_stmt(name("log")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("catch finally"));
}

#[test]
fn finally_return_overrides_a_pending_fault() {
    let value = run_ok(vec![
        func(
            "f",
            vec![],
            vec![try_stmt(
                vec![throw(call_name("Exception", vec![str_("boom")]))],
                vec![],
                Some(vec![ret(int(42))]),
            )],
        ),
        expr_stmt(call_name("f", vec![])),
    ]);
    assert_eq!(value.as_int(), Some(42));
}

#[test]
fn finally_cannot_swallow_a_fatal_error() {
    let err = run_err(vec![
        func("spin", vec![], vec![expr_stmt(call_name("spin", vec![]))]),
        func(
            "f",
            vec![],
            vec![try_stmt(
                vec![expr_stmt(call_name("spin", vec![]))],
                vec![],
                Some(vec![ret(int(42))]),
            )],
        ),
        expr_stmt(call_name("f", vec![])),
    ]);
    assert!(matches!(err, RuntimeError::StackOverflow(_)));
}

#[test]
fn catch_expression_yields_value_and_null() {
    let value = run_ok(vec![
        var("pair", catch_expr(int(5))),
        expr_stmt(ternary(
            eq(index(name("pair"), int(1)), null()),
            index(name("pair"), int(0)),
            int(-1),
        )),
    ]);
    assert_eq!(value.as_int(), Some(5));
}

#[test]
fn catch_expression_captures_the_fault() {
    let value = run_ok(vec![
        func("fail", vec![], vec![throw(call_name(
            "Exception",
            vec![str_("nope")],
        ))]),
        var("pair", catch_expr(call_name("fail", vec![]))),
        expr_stmt(member(index(name("pair"), int(1)), "message")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("nope"));
}

#[test]
fn destructuring_spreads_across_targets() {
    let value = run_ok(vec![
        var_multi(&["a", "b", "c"], list(vec![int(1), int(2), int(3)])),
        expr_stmt(add(add(name("a"), name("b")), name("c"))),
    ]);
    assert_eq!(value.as_int(), Some(6));
}

#[test]
fn destructuring_mismatch_lands_an_exception_in_the_last_target() {
    let value = run_ok(vec![
        var_multi(&["a", "b"], list(vec![int(1), int(2), int(3)])),
        expr_stmt(ternary(
            eq(name("a"), null()),
            member(name("b"), "message"),
            str_("a was set"),
        )),
    ]);
    let message = value.as_str();
    let message = message.as_deref().unwrap_or("");
    assert!(message.contains('2') && message.contains('3'), "got: {message}");
}

#[test]
fn division_by_zero_is_a_catchable_fault() {
    let value = run_ok(vec![
        var("out", str_("")),
        try_stmt(
            vec![expr_stmt(bin(int(1), BinaryOp::Divide, int(0)))],
            vec![catch_clause(&[], None, vec![expr_stmt(assign(
                name("out"),
                str_("caught"),
            ))])],
            None,
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("caught"));
}

#[test]
fn integer_overflow_is_a_catchable_fault() {
    let value = run_ok(vec![
        var("big", int(i64::MAX)),
        var("out", str_("")),
        try_stmt(
            vec![expr_stmt(add(name("big"), int(1)))],
            vec![catch_clause(&[], None, vec![expr_stmt(assign(
                name("out"),
                str_("caught"),
            ))])],
            None,
        ),
        expr_stmt(name("out")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("caught"));
}

#[test]
fn constants_reject_reassignment() {
    let err = run_err(vec![
        constant("k", int(1)),
        expr_stmt(assign(name("k"), int(2))),
    ]);
    assert!(matches!(err, RuntimeError::ConstReassignment(_, _)));
}
