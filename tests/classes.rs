//! Class declaration, flattened inheritance, `super`, properties, and
//! member access control.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use quill::ast::{AccessLevel, BinaryOp, ClassMember, PropertyDecl};
use quill::RuntimeError;

#[test]
fn methods_see_fields_through_this() {
    let value = run_ok(vec![
        class_decl(
            "Counter",
            &[],
            vec![
                field_decl("n", Some(int(0))),
                method_decl("bump", vec![], vec![
                    expr_stmt(assign(member(this(), "n"), add(member(this(), "n"), int(1)))),
                    ret(member(this(), "n")),
                ]),
            ],
        ),
        var("c", call_name("Counter", vec![])),
        expr_stmt(method(name("c"), "bump", vec![])),
        expr_stmt(method(name("c"), "bump", vec![])),
    ]);
    assert_eq!(value.as_int(), Some(2));
}

#[test]
fn constructor_receives_arguments() {
    let value = run_ok(vec![
        class_decl(
            "Point",
            &[],
            vec![
                field_decl("x", Some(int(0))),
                field_decl("y", Some(int(0))),
                ctor_decl(vec![param("x"), param("y")], vec![
                    expr_stmt(assign(member(this(), "x"), name("x"))),
                    expr_stmt(assign(member(this(), "y"), name("y"))),
                ]),
            ],
        ),
        var("p", call_name("Point", vec![int(3), int(4)])),
        expr_stmt(add(member(name("p"), "x"), member(name("p"), "y"))),
    ]);
    assert_eq!(value.as_int(), Some(7));
}

#[test]
fn subclass_method_calls_super_method() {
    let value = run_ok(vec![
        class_decl(
            "Animal",
            &[],
            vec![method_decl("Speak", vec![], vec![ret(str_("..."))])],
        ),
        class_decl(
            "Dog",
            &["Animal"],
            vec![method_decl("Speak", vec![], vec![ret(add(
                method(super_(), "Speak", vec![]),
                str_("Woof"),
            ))])],
        ),
        expr_stmt(method(call_name("Dog", vec![]), "Speak", vec![])),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("...Woof"));
}

#[test]
fn super_call_chains_the_parent_constructor() {
    let value = run_ok(vec![
        class_decl(
            "Base",
            &[],
            vec![
                field_decl("tag", Some(str_(""))),
                ctor_decl(vec![param("tag")], vec![expr_stmt(assign(
                    member(this(), "tag"),
                    name("tag"),
                ))]),
            ],
        ),
        class_decl(
            "Derived",
            &["Base"],
            vec![ctor_decl(vec![], vec![expr_stmt(call(
                super_(),
                vec![str_("derived")],
            ))])],
        ),
        expr_stmt(member(call_name("Derived", vec![]), "tag")),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("derived"));
}

#[test]
fn last_declared_super_wins_on_collision() {
    let value = run_ok(vec![
        class_decl(
            "A",
            &[],
            vec![method_decl("who", vec![], vec![ret(str_("A"))])],
        ),
        class_decl(
            "B",
            &[],
            vec![method_decl("who", vec![], vec![ret(str_("B"))])],
        ),
        class_decl("C", &["A", "B"], vec![]),
        expr_stmt(method(call_name("C", vec![]), "who", vec![])),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("B"));
}

#[test]
fn grandchild_inherits_the_parent_override() {
    // An override must beat the member it overrides, even two levels down.
    let value = run_ok(vec![
        class_decl(
            "A",
            &[],
            vec![method_decl("who", vec![], vec![ret(str_("A"))])],
        ),
        class_decl(
            "B",
            &["A"],
            vec![method_decl("who", vec![], vec![ret(str_("B"))])],
        ),
        class_decl("C", &["B"], vec![]),
        expr_stmt(method(call_name("C", vec![]), "who", vec![])),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("B"));
}

#[test]
fn grandchild_constructor_chains_through_the_parent() {
    let value = run_ok(vec![
        class_decl(
            "A",
            &[],
            vec![
                field_decl("tag", Some(str_(""))),
                ctor_decl(vec![param("m")], vec![expr_stmt(assign(
                    member(this(), "tag"),
                    name("m"),
                ))]),
            ],
        ),
        class_decl(
            "B",
            &["A"],
            vec![ctor_decl(vec![param("m")], vec![expr_stmt(call(
                super_(),
                vec![add(name("m"), str_("-via-B"))],
            ))])],
        ),
        class_decl(
            "C",
            &["B"],
            vec![ctor_decl(vec![param("m")], vec![expr_stmt(call(
                super_(),
                vec![name("m")],
            ))])],
        ),
        expr_stmt(member(call_name("C", vec![str_("c")]), "tag")),
    ]);
    // B's constructor runs in between, not A's directly.
    assert_eq!(value.as_str().as_deref(), Some("c-via-B"));
}

#[test]
fn own_members_shadow_inherited_ones() {
    let value = run_ok(vec![
        class_decl(
            "A",
            &[],
            vec![method_decl("who", vec![], vec![ret(str_("A"))])],
        ),
        class_decl(
            "C",
            &["A"],
            vec![method_decl("who", vec![], vec![ret(str_("C"))])],
        ),
        expr_stmt(method(call_name("C", vec![]), "who", vec![])),
    ]);
    assert_eq!(value.as_str().as_deref(), Some("C"));
}

#[test]
fn field_templates_flow_down_to_subclasses() {
    let value = run_ok(vec![
        class_decl("Base", &[], vec![field_decl("limit", Some(int(10)))]),
        class_decl("Child", &["Base"], vec![]),
        expr_stmt(member(call_name("Child", vec![]), "limit")),
    ]);
    assert_eq!(value.as_int(), Some(10));
}

#[test]
fn inheriting_from_a_native_constructor_is_rejected() {
    let err = run_err(vec![class_decl("MyInt", &["int"], vec![])]);
    assert!(matches!(err, RuntimeError::UnsupportedInheritance { .. }));
}

#[test]
fn instances_do_not_share_field_state() {
    let value = run_ok(vec![
        class_decl("Box", &[], vec![field_decl("v", Some(int(0)))]),
        var("a", call_name("Box", vec![])),
        var("b", call_name("Box", vec![])),
        expr_stmt(assign(member(name("a"), "v"), int(5))),
        expr_stmt(member(name("b"), "v")),
    ]);
    assert_eq!(value.as_int(), Some(0));
}

#[test]
fn properties_run_getter_and_setter_bodies() {
    let value = run_ok(vec![
        class_decl(
            "Thermo",
            &[],
            vec![
                field_decl("celsius", Some(int(0))),
                ClassMember::Property(PropertyDecl {
                    name: "fahrenheit".to_string(),
                    getter: Some(vec![ret(add(
                        bin(member(this(), "celsius"), BinaryOp::Multiply, int(9)),
                        int(32),
                    ))]),
                    setter: Some(("value".to_string(), vec![expr_stmt(assign(
                        member(this(), "celsius"),
                        bin(name("value"), BinaryOp::Subtract, int(32)),
                    ))])),
                    is_static: false,
                    access: AccessLevel::Public,
                    span: sp(),
                }),
            ],
        ),
        var("t", call_name("Thermo", vec![])),
        expr_stmt(assign(member(name("t"), "fahrenheit"), int(33))),
        expr_stmt(add(
            member(name("t"), "celsius"),
            member(name("t"), "fahrenheit"),
        )),
    ]);
    // celsius = 1, fahrenheit = 41
    assert_eq!(value.as_int(), Some(42));
}

#[test]
fn private_fields_are_hidden_from_outside() {
    let err = run_err(vec![
        class_decl(
            "Vault",
            &[],
            vec![field_decl_access("code", Some(int(1234)), AccessLevel::Private)],
        ),
        var("v", call_name("Vault", vec![])),
        expr_stmt(member(name("v"), "code")),
    ]);
    assert!(matches!(err, RuntimeError::AccessViolation { .. }));
}

#[test]
fn private_fields_are_visible_inside_methods() {
    let value = run_ok(vec![
        class_decl(
            "Vault",
            &[],
            vec![
                field_decl_access("code", Some(int(1234)), AccessLevel::Private),
                method_decl("reveal", vec![], vec![ret(member(this(), "code"))]),
            ],
        ),
        expr_stmt(method(call_name("Vault", vec![]), "reveal", vec![])),
    ]);
    assert_eq!(value.as_int(), Some(1234));
}

#[test]
fn protected_members_are_reachable_from_subclasses() {
    let value = run_ok(vec![
        class_decl(
            "Base",
            &[],
            vec![method_decl_access(
                "hidden",
                vec![],
                vec![ret(int(9))],
                AccessLevel::Protected,
            )],
        ),
        class_decl(
            "Child",
            &["Base"],
            vec![method_decl("expose", vec![], vec![ret(method(
                this(),
                "hidden",
                vec![],
            ))])],
        ),
        expr_stmt(method(call_name("Child", vec![]), "expose", vec![])),
    ]);
    assert_eq!(value.as_int(), Some(9));
}

#[test]
fn protected_members_are_hidden_from_outside() {
    let err = run_err(vec![
        class_decl(
            "Base",
            &[],
            vec![method_decl_access(
                "hidden",
                vec![],
                vec![ret(int(9))],
                AccessLevel::Protected,
            )],
        ),
        expr_stmt(method(call_name("Base", vec![]), "hidden", vec![])),
    ]);
    assert!(matches!(err, RuntimeError::AccessViolation { .. }));
}

#[test]
fn enum_variants_number_themselves() {
    let value = run_ok(vec![
        enum_decl("Color", &[("Red", None), ("Green", None), ("Blue", Some(10))]),
        expr_stmt(add(
            add(member(name("Color"), "Red"), member(name("Color"), "Green")),
            member(name("Color"), "Blue"),
        )),
    ]);
    // 0 + 1 + 10
    assert_eq!(value.as_int(), Some(11));
}

#[test]
fn static_classes_cannot_be_instantiated() {
    let err = run_err(vec![
        enum_decl("Color", &[("Red", None)]),
        expr_stmt(call_name("Color", vec![])),
    ]);
    assert!(matches!(err, RuntimeError::TypeError { .. }));
}
