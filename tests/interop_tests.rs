//! End-to-end tests: forms are compiled and executed on the reference VM.

mod common;

use common::{call, demo_session, dot, int64, new_point, point};
use hostinterop::{CompilationError, CompilerOptions, Error, Form, RuntimeError, Value};

fn calc(member: Form) -> Form {
    dot(Form::symbol("Calc"), [member])
}

// =============================================================================
// Static members
// =============================================================================

#[test]
fn reads_static_field() {
    let mut session = demo_session();
    let pi = session
        .eval(&dot(Form::symbol("Math"), [Form::symbol("PI")]))
        .unwrap();
    assert_eq!(pi, Value::F64(std::f64::consts::PI));

    let shorthand = session.eval(&Form::symbol("Math/E")).unwrap();
    assert_eq!(shorthand, Value::F64(std::f64::consts::E));
}

#[test]
fn static_call_selects_overload() {
    let mut session = demo_session();
    let mut picked = |arg: Form| session.eval(&calc(call("Pick", [arg]))).unwrap();
    assert_eq!(picked(Form::int(1)), Value::string("long"));
    assert_eq!(picked(Form::float(1.0)), Value::string("double"));
    assert_eq!(picked(Form::string("s")), Value::string("object"));
    assert_eq!(picked(Form::nil()), Value::string("object"));
}

#[test]
fn math_abs_resolves_by_argument_type() {
    let mut session = demo_session();
    let long = session
        .eval(&dot(Form::symbol("Math"), [call("Abs", [Form::int(-5)])]))
        .unwrap();
    assert_eq!(long, Value::I64(5));
    let float = session
        .eval(&Form::list([Form::symbol("Math/Abs"), Form::float(-2.5)]))
        .unwrap();
    assert_eq!(float, Value::F64(2.5));
}

// =============================================================================
// Checked and unchecked narrowing
// =============================================================================

#[test]
fn checked_narrowing_raises_on_overflow() {
    let mut session = demo_session();
    let form = calc(call("Narrow", [Form::int(2_147_483_648)]));
    let err = session.eval(&form).unwrap_err();
    assert!(
        matches!(err, Error::Runtime(RuntimeError::Overflow { .. })),
        "{err}"
    );
}

#[test]
fn unchecked_narrowing_truncates() {
    let mut session = demo_session();
    session.set_options(CompilerOptions::new().with_unchecked_math(true));
    let form = calc(call("Narrow", [Form::int(2_147_483_648)]));
    let min = Value::I64(i64::from(i32::MIN));
    assert_eq!(session.eval(&form).unwrap(), min);
}

#[test]
fn in_range_narrowing_succeeds_in_both_modes() {
    for unchecked in [false, true] {
        let mut session = demo_session();
        let options = CompilerOptions::new().with_unchecked_math(unchecked);
        session.set_options(options);
        let form = calc(call("Narrow", [Form::int(2_147_483_647)]));
        assert_eq!(session.eval(&form).unwrap(), Value::I64(2_147_483_647));
    }
}

#[test]
fn void_argument_passes_parameter_default() {
    let mut session = demo_session();
    let tick = || calc(call("Tick", []));

    let int = session.eval(&calc(call("Narrow", [tick()]))).unwrap();
    assert_eq!(int, Value::I64(0));

    let reference = session.eval(&calc(call("Echo", [tick()]))).unwrap();
    assert_eq!(reference, Value::Nil);
}

// =============================================================================
// Instance members
// =============================================================================

#[test]
fn typed_instance_members() {
    let mut session = demo_session();
    session.define_local("p", Some(point()), new_point(-3, "a"));

    let x = session
        .eval(&dot(Form::symbol("p"), [Form::keyword("X")]))
        .unwrap();
    assert_eq!(x, Value::I64(-3));
    let norm = session
        .eval(&dot(Form::symbol("p"), [Form::symbol("Norm")]))
        .unwrap();
    assert_eq!(norm, Value::F64(3.0));
    let sum = session
        .eval(&dot(Form::symbol("p"), [call("Add", [Form::int(10)])]))
        .unwrap();
    assert_eq!(sum, Value::I64(7));
}

#[test]
fn void_instance_call_mutates_and_returns_nil() {
    let mut session = demo_session();
    session.define_local("p", Some(point()), new_point(4, "a"));
    let scale = Form::list([Form::symbol(".Scale"), Form::symbol("p"), Form::int(3)]);
    let result = session.eval(&scale).unwrap();
    assert_eq!(result, Value::Nil);
    let x = session
        .eval(&dot(Form::symbol("p"), [Form::symbol("X")]))
        .unwrap();
    assert_eq!(x, Value::I64(12));
}

#[test]
fn untyped_instance_members_resolve_at_run_time() {
    let mut session = demo_session();
    session.define_local("x", None, new_point(5, "five"));

    let label = session
        .eval(&dot(Form::symbol("x"), [Form::symbol("Label")]))
        .unwrap();
    assert_eq!(label, Value::string("five"));
    let described = session
        .eval(&dot(Form::symbol("x"), [call("Describe", [])]))
        .unwrap();
    assert_eq!(described, Value::string("five"));
    let sum = session
        .eval(&dot(Form::symbol("x"), [call("Add", [Form::int(1)])]))
        .unwrap();
    assert_eq!(sum, Value::I32(6));
}

#[test]
fn untyped_nil_target_is_null_reference() {
    let mut session = demo_session();
    session.define_local("x", None, Value::Nil);
    let err = session
        .eval(&dot(Form::symbol("x"), [Form::symbol("Label")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime(RuntimeError::NullReference { .. })
    ));
}

#[test]
fn unknown_runtime_member_is_runtime_error() {
    let mut session = demo_session();
    session.define_local("x", None, new_point(1, "one"));
    let err = session
        .eval(&dot(Form::symbol("x"), [call("Frobnicate", [Form::int(1)])]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Runtime(RuntimeError::MissingMember { .. })
    ));
}

// =============================================================================
// By-ref arguments and assignment
// =============================================================================

#[test]
fn by_ref_argument_is_written_back() {
    let mut session = demo_session();
    session.define_local("n", Some(int64()), Value::I64(41));
    let form = calc(call("Inc", [call("by-ref", [Form::symbol("n")])]));
    assert_eq!(session.eval(&form).unwrap(), Value::Nil);
    assert_eq!(session.local("n"), Some(&Value::I64(42)));
}

#[test]
fn assigns_static_field() {
    let mut session = demo_session();
    let set = call("set!", [calc(Form::symbol("Counter")), Form::int(5)]);
    assert_eq!(session.eval(&set).unwrap(), Value::I64(5));
    assert_eq!(
        session.eval(&calc(Form::symbol("Counter"))).unwrap(),
        Value::I64(5)
    );
}

#[test]
fn assigns_properties_statically_and_dynamically() {
    let mut session = demo_session();
    session.define_local("p", Some(point()), new_point(0, "old"));
    session.define_local("q", None, new_point(0, "old"));

    for name in ["p", "q"] {
        let target = dot(Form::symbol(name), [Form::symbol("Label")]);
        let set = call("set!", [target.clone(), Form::string("new")]);
        assert_eq!(session.eval(&set).unwrap(), Value::string("new"));
        assert_eq!(
            session.eval(&target).unwrap(),
            Value::string("new"),
            "local {name}"
        );
    }
}

#[test]
fn read_only_property_cannot_be_assigned() {
    let mut session = demo_session();
    session.define_local("p", Some(point()), new_point(0, "a"));
    let norm = dot(Form::symbol("p"), [Form::symbol("Norm")]);
    let set = call("set!", [norm, Form::float(1.0)]);
    assert!(matches!(
        session.eval(&set),
        Err(Error::Compilation(CompilationError::MalformedForm { .. }))
    ));
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn literals_evaluate() {
    let mut session = demo_session();
    let mut eval = |form: Form| session.eval(&form).unwrap();
    assert_eq!(eval(Form::int(42)), Value::I64(42));
    assert_eq!(eval(call("quote", [Form::int(42)])), Value::I64(42));
    assert_eq!(eval(Form::string("hi")), Value::string("hi"));
    assert_eq!(eval(Form::nil()), Value::Nil);
    assert_eq!(eval(Form::bool(true)), Value::Bool(true));
    assert_eq!(
        eval(call("quote", [Form::vector([])])),
        Value::Vector(std::sync::Arc::from([]))
    );
    assert_eq!(
        eval(call("quote", [Form::symbol("sym")])),
        Value::Symbol(hostinterop_core::Symbol::new("sym"))
    );
}

#[test]
fn generic_call_passes_type_arguments() {
    let mut session = demo_session();
    let type_args = call("type-args", [Form::symbol("String")]);
    let form = calc(call("Identity", [type_args, Form::string("a")]));
    assert_eq!(session.eval(&form).unwrap(), Value::string("a"));
}

#[test]
fn string_members() {
    let mut session = demo_session();
    session.define_local("s", Some(common::string()), Value::string("hello"));
    let len = session
        .eval(&dot(Form::symbol("s"), [Form::symbol("Length")]))
        .unwrap();
    assert_eq!(len, Value::I64(5));
    let upper = session
        .eval(&dot(Form::symbol("s"), [Form::symbol("ToUpper")]))
        .unwrap();
    assert_eq!(upper, Value::string("HELLO"));
    let tail = session
        .eval(&dot(Form::symbol("s"), [call("Substring", [Form::int(3)])]))
        .unwrap();
    assert_eq!(tail, Value::string("lo"));
}
