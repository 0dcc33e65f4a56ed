//! Analysis and code generation tests.
//!
//! These drive the compiler directly: forms are analysed against the demo
//! registry and the resulting nodes and bytecode are inspected without
//! running anything.

mod common;

use std::sync::Mutex;

use common::{call, demo_session, dot, double, int32, int64, string};
use hostinterop::compiler::expr::{Expr, InstanceMethodCall, parse_quoted};
use hostinterop::compiler::{BytecodeEmitter, LocalScope, Position, analyze};
use hostinterop::{
    CompilationContext, CompilationError, ConstantPool, Form, HostType, OpCode, ParserContext,
    Session, Span, Value,
};
use hostinterop_core::{ConstantRegistry, PrimitiveKind};

fn with_ctx<R>(session: &Session, f: impl FnOnce(&mut CompilationContext<'_>) -> R) -> R {
    let ns = demo_namespace();
    let mut ctx = CompilationContext::new(session.registry(), &ns, session.pool());
    f(&mut ctx)
}

fn demo_namespace() -> hostinterop::Namespace {
    let mut ns = hostinterop::Namespace::new("user");
    for name in ["System.Math", "System.String", "Demo.Calc", "Demo.Point"] {
        ns.import(HostType::class(name));
    }
    ns
}

fn parse(ctx: &CompilationContext<'_>, form: &Form) -> Result<Expr, CompilationError> {
    analyze(ctx, ParserContext::expression(), form)
}

fn codegen(ctx: &CompilationContext<'_>, expr: &Expr) -> Vec<u8> {
    let mut em = BytecodeEmitter::new();
    expr.emit(ctx, &mut em, Position::Expression).unwrap();
    em.finish().code().to_vec()
}

// =============================================================================
// Zero-arity static members
// =============================================================================

#[test]
fn static_members_take_their_declared_type() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let calc = |member: &str| dot(Form::symbol("Calc"), [Form::symbol(member)]);
        let cases = [
            (dot(Form::symbol("Math"), [Form::symbol("PI")]), double()),
            (calc("Counter"), int32()),
            (calc("Origin"), HostType::class("Demo.Point")),
            (
                dot(Form::symbol("System.Int64"), [Form::keyword("MaxValue")]),
                int64(),
            ),
        ];
        for (form, expected) in cases {
            let expr = parse(ctx, &form).unwrap();
            assert_eq!(expr.static_type(), Some(expected), "{form:?}");
        }
    });
}

#[test]
fn static_zero_arity_prefers_fields() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let field = parse(ctx, &dot(Form::symbol("Math"), [Form::symbol("PI")])).unwrap();
        assert!(matches!(field, Expr::StaticField(_)));
        let method = parse(ctx, &dot(Form::symbol("Calc"), [Form::symbol("Origin")])).unwrap();
        assert!(matches!(method, Expr::StaticMethod(_)));
    });
}

#[test]
fn instance_members_on_typed_local() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        ctx.locals_mut()
            .declare("p", Some(HostType::class("Demo.Point")), Span::default())
            .unwrap();
        let norm = parse(ctx, &dot(Form::symbol("p"), [Form::symbol("Norm")])).unwrap();
        assert!(matches!(norm, Expr::InstanceProperty(_)));
        assert_eq!(norm.static_type(), Some(double()));

        let x = parse(ctx, &dot(Form::symbol("p"), [Form::symbol("X")])).unwrap();
        assert_eq!(x.static_type(), Some(int32()));
        assert_eq!(x.unboxed_type(), Some(PrimitiveKind::Int32));
    });
}

// =============================================================================
// Overload resolution
// =============================================================================

#[test]
fn exact_primitive_overload_beats_boxing() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let form = dot(Form::symbol("Calc"), [call("Pick", [Form::int(1)])]);
        let Expr::StaticMethod(m) = parse(ctx, &form).unwrap() else {
            panic!("expected a static call");
        };
        assert_eq!(m.method.params[0].param_type, int64());

        let form = dot(Form::symbol("Calc"), [call("Pick", [Form::float(1.5)])]);
        let Expr::StaticMethod(m) = parse(ctx, &form).unwrap() else {
            panic!("expected a static call");
        };
        assert_eq!(m.method.params[0].param_type, double());
    });
}

#[test]
fn reference_argument_picks_object_overload() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let form = dot(Form::symbol("Calc"), [call("Pick", [Form::string("s")])]);
        let Expr::StaticMethod(m) = parse(ctx, &form).unwrap() else {
            panic!("expected a static call");
        };
        assert_eq!(m.method.params[0].param_type, HostType::Object);
    });
}

#[test]
fn equally_good_overloads_are_ambiguous() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let span = Span::new(3, 1, 20);
        let form = dot(Form::symbol("Calc"), [call("Amb", [Form::int(1)])]).with_span(span);
        let err = parse(ctx, &form).unwrap_err();
        assert!(
            matches!(err, CompilationError::AmbiguousOverload { .. }),
            "{err}"
        );
        assert_eq!(err.span(), span);
    });
}

#[test]
fn missing_and_inapplicable_methods() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let missing = dot(Form::symbol("Calc"), [call("Nope", [Form::int(1)])]);
        assert!(matches!(
            parse(ctx, &missing),
            Err(CompilationError::MissingMember { .. })
        ));
        let wrong = dot(Form::symbol("Calc"), [call("Narrow", [Form::string("x")])]);
        assert!(matches!(
            parse(ctx, &wrong),
            Err(CompilationError::NoMatchingOverload { .. })
        ));
    });
}

// =============================================================================
// Coercion and boxing
// =============================================================================

#[test]
fn narrowing_helper_follows_math_mode() {
    let session = demo_session();
    let narrow = call("Narrow", [Form::int(2_147_483_648)]);
    let form = dot(Form::symbol("Calc"), [narrow]);

    let checked = session.compile(&form).unwrap();
    checked.assert_contains_opcodes(&[OpCode::I64ToI32Checked]);

    let mut unchecked_session = demo_session();
    let options = hostinterop::CompilerOptions::new().with_unchecked_math(true);
    unchecked_session.set_options(options);
    let unchecked = unchecked_session.compile(&form).unwrap();
    unchecked.assert_contains_opcodes(&[OpCode::I64ToI32]);
    assert!(!unchecked.opcodes().contains(&OpCode::I64ToI32Checked));
}

#[test]
fn primitive_results_are_boxed_in_expression_position() {
    let session = demo_session();
    let form = dot(Form::symbol("Calc"), [call("Narrow", [Form::int(3)])]);
    let chunk = session.compile(&form).unwrap();
    chunk.assert_opcodes(&[
        OpCode::PushI64,
        OpCode::I64ToI32Checked,
        OpCode::CallStatic,
        OpCode::I32ToI64,
        OpCode::Box,
        OpCode::Return,
    ]);
}

#[test]
fn void_call_in_expression_position_yields_nil() {
    let mut session = demo_session();
    session.define_local("n", Some(int64()), Value::I64(0));
    let form = dot(
        Form::symbol("Calc"),
        [call("Inc", [call("by-ref", [Form::symbol("n")])])],
    );
    let chunk = session.compile(&form).unwrap();
    chunk.assert_opcodes(&[
        OpCode::GetLocal,
        OpCode::CallStatic,
        OpCode::WriteBack,
        OpCode::PushNil,
        OpCode::Return,
    ]);
}

#[test]
fn void_argument_runs_for_effect_then_supplies_default() {
    let session = demo_session();
    let tick = || dot(Form::symbol("Calc"), [call("Tick", [])]);

    let narrow = dot(Form::symbol("Calc"), [call("Narrow", [tick()])]);
    let chunk = session.compile(&narrow).unwrap();
    chunk.assert_opcodes(&[
        OpCode::CallStatic,
        OpCode::PushDefault,
        OpCode::CallStatic,
        OpCode::I32ToI64,
        OpCode::Box,
        OpCode::Return,
    ]);

    let echo = dot(Form::symbol("Calc"), [call("Echo", [tick()])]);
    let chunk = session.compile(&echo).unwrap();
    chunk.assert_opcodes(&[
        OpCode::CallStatic,
        OpCode::PushDefault,
        OpCode::CallStatic,
        OpCode::Return,
    ]);
}

#[test]
fn generic_type_arguments_precede_arguments() {
    let session = demo_session();
    let type_args = call("type-args", [Form::symbol("String")]);
    let form = dot(
        Form::symbol("Calc"),
        [call("Identity", [type_args, Form::string("a")])],
    );
    let chunk = session.compile(&form).unwrap();
    chunk.assert_opcodes(&[
        OpCode::PushType,
        OpCode::PushString,
        OpCode::CallStatic,
        OpCode::Return,
    ]);
}

#[test]
fn unknown_type_argument_is_fatal() {
    let session = demo_session();
    let type_args = call("type-args", [Form::symbol("Nope")]);
    let form = dot(
        Form::symbol("Calc"),
        [call("Identity", [type_args, Form::nil()])],
    );
    assert!(matches!(
        session.compile(&form),
        Err(CompilationError::UnresolvedTypeName { .. })
    ));
}

// =============================================================================
// Zero-arity equivalence
// =============================================================================

#[test]
fn listed_and_bare_zero_arity_calls_generate_the_same_code() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        ctx.locals_mut()
            .declare("p", Some(HostType::class("Demo.Point")), Span::default())
            .unwrap();
        ctx.locals_mut().declare("x", None, Span::default()).unwrap();
        for target in ["p", "x"] {
            let member = if target == "p" { "Describe" } else { "foo" };
            let bare = parse(ctx, &dot(Form::symbol(target), [Form::symbol(member)])).unwrap();
            let listed = parse(ctx, &dot(Form::symbol(target), [call(member, [])])).unwrap();
            assert_eq!(
                codegen(ctx, &bare),
                codegen(ctx, &listed),
                "target {target}"
            );
        }
    });
}

#[test]
fn untyped_target_defers_to_runtime() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        ctx.locals_mut().declare("x", None, Span::default()).unwrap();
        let expr = parse(ctx, &dot(Form::symbol("x"), [call("Add", [Form::int(1)])])).unwrap();
        assert!(matches!(
            expr,
            Expr::InstanceMethod(InstanceMethodCall { method: None, .. })
        ));
        assert!(!expr.has_static_type());
        let mut em = BytecodeEmitter::new();
        expr.emit(ctx, &mut em, Position::Expression).unwrap();
        let chunk = em.finish();
        chunk.assert_opcodes(&[
            OpCode::GetLocal,
            OpCode::LoadConstant,
            OpCode::CallDynamic,
        ]);
    });
}

#[test]
fn tag_types_a_deferred_call() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        ctx.locals_mut().declare("x", None, Span::default()).unwrap();
        let form = dot(Form::symbol("x"), [Form::symbol("Describe")]).with_tag("String");
        let expr = parse(ctx, &form).unwrap();
        assert_eq!(expr.static_type(), Some(string()));
    });
}

// =============================================================================
// Literals and the constant pool
// =============================================================================

/// Records every id the pool hands out.
struct RecordingPool {
    pool: ConstantPool,
    issued: Mutex<Vec<u32>>,
}

impl ConstantRegistry for RecordingPool {
    fn register(&self, value: Value) -> u32 {
        let id = self.pool.register(value);
        self.issued.lock().unwrap().push(id);
        id
    }
}

#[test]
fn quoted_number_loads_its_registered_id() {
    let session = demo_session();
    let ns = demo_namespace();
    let pool = RecordingPool {
        pool: ConstantPool::new(),
        issued: Mutex::new(Vec::new()),
    };
    // Occupy slot 0 so the id is not trivially zero.
    pool.register(Value::string("filler"));
    let ctx = CompilationContext::new(session.registry(), &ns, &pool);

    let expr = parse_quoted(&ctx, &Form::int(42)).unwrap();
    let issued = pool.issued.lock().unwrap().clone();
    assert_eq!(issued.len(), 2);
    let id = issued[1];
    assert_eq!(pool.pool.get(id), Some(Value::I64(42)));

    let mut em = BytecodeEmitter::new();
    expr.emit(&ctx, &mut em, Position::Expression).unwrap();
    let chunk = em.finish();
    chunk.assert_opcodes(&[OpCode::LoadConstant]);
    assert_eq!(chunk.read_u32(1), Some(id));
}

#[test]
fn quoted_empty_collections_are_not_constants() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        for form in [Form::vector([]), Form::map([]), Form::list([])] {
            let quoted = call("quote", [form]);
            assert!(matches!(
                parse(ctx, &quoted).unwrap(),
                Expr::EmptyCollection(_)
            ));
        }
        let quoted = call("quote", [Form::vector([Form::int(1)])]);
        assert!(matches!(parse(ctx, &quoted).unwrap(), Expr::Constant(_)));
    });
}

#[test]
fn quoted_nil_and_booleans_are_literals() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let quote = |form: Form| parse(ctx, &call("quote", [form])).unwrap();
        assert_eq!(quote(Form::nil()), Expr::Nil);
        assert_eq!(quote(Form::bool(true)), Expr::True);
        assert_eq!(quote(Form::bool(false)), Expr::False);
    });
}

// =============================================================================
// Type names and context
// =============================================================================

#[test]
fn unknown_dotted_type_is_unresolved_type_name() {
    let session = demo_session();
    with_ctx(&session, |ctx| {
        let form = dot(Form::symbol("UnknownNs.Type"), [Form::symbol("foo")]);
        let err = parse(ctx, &form).unwrap_err();
        assert!(
            matches!(err, CompilationError::UnresolvedTypeName { .. }),
            "{err}"
        );
    });
}

#[test]
fn set_assign_is_identity_preserving() {
    let once = ParserContext::expression().set_assign(true);
    let twice = once.set_assign(true);
    assert!(once.same_instance(&twice));
    assert!(twice.is_assign_target());
    assert!(!once.same_instance(&once.set_assign(false)));
}

#[test]
fn locals_shadow_and_restore() {
    let mut scope = LocalScope::new();
    let outer = scope.declare("a", Some(int32()), Span::default()).unwrap();
    scope.push_scope();
    let inner = scope.declare("a", None, Span::default()).unwrap();
    assert_ne!(outer.slot, inner.slot);
    assert_eq!(scope.get("a").map(|b| b.slot), Some(inner.slot));
    scope.pop_scope();
    assert_eq!(scope.get("a").map(|b| b.slot), Some(outer.slot));
}
