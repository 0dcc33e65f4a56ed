//! Shared host types for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use hostinterop::registry::arg;
use hostinterop::{Form, HostType, Session, TypeFlags, Value};
use hostinterop_core::{ClassRef, HostObject, ParamDef, PrimitiveKind, RuntimeError};

pub fn int32() -> HostType {
    HostType::Primitive(PrimitiveKind::Int32)
}

pub fn int64() -> HostType {
    HostType::Primitive(PrimitiveKind::Int64)
}

pub fn int16() -> HostType {
    HostType::Primitive(PrimitiveKind::Int16)
}

pub fn double() -> HostType {
    HostType::Primitive(PrimitiveKind::Float64)
}

pub fn string() -> HostType {
    HostType::class("System.String")
}

pub fn point() -> HostType {
    HostType::class("Demo.Point")
}

pub fn new_point(x: i32, label: &str) -> Value {
    Value::Object(HostObject::new(
        ClassRef::new("Demo.Point"),
        [
            ("X".to_string(), Value::I32(x)),
            ("Label".to_string(), Value::string(label)),
        ],
    ))
}

fn object_of(args: &[Value]) -> Result<&Arc<HostObject>, RuntimeError> {
    match args.first() {
        Some(Value::Object(obj)) => Ok(obj),
        Some(other) => Err(RuntimeError::InvalidCast {
            from: other.type_name(),
            to: "Demo.Point".to_string(),
        }),
        None => Err(RuntimeError::StackUnderflow),
    }
}

/// A session with `Demo.Calc` and `Demo.Point` registered and imported.
pub fn demo_session() -> Session {
    let mut session = Session::new();
    register_demo(&mut session);
    session.namespace_mut().import(HostType::class("Demo.Calc"));
    session.namespace_mut().import(point());
    session
}

fn register_demo(session: &mut Session) {
    let registry = session.registry_mut();

    registry
        .register_type("Demo.Calc", TypeFlags::PUBLIC | TypeFlags::ABSTRACT, None)
        .unwrap()
        .static_field("Counter", int32(), Value::I32(0))
        .static_method(
            "Narrow",
            vec![ParamDef::new("v", int32())],
            int32(),
            |args: &mut [Value]| Ok(args[0].clone()),
        )
        .static_method(
            "Pick",
            vec![ParamDef::new("v", int64())],
            string(),
            |_: &mut [Value]| Ok(Value::string("long")),
        )
        .static_method(
            "Pick",
            vec![ParamDef::new("v", HostType::Object)],
            string(),
            |_: &mut [Value]| Ok(Value::string("object")),
        )
        .static_method(
            "Pick",
            vec![ParamDef::new("v", double())],
            string(),
            |_: &mut [Value]| Ok(Value::string("double")),
        )
        .static_method(
            "Amb",
            vec![ParamDef::new("v", int32())],
            HostType::Void,
            |_: &mut [Value]| Ok(Value::Nil),
        )
        .static_method(
            "Amb",
            vec![ParamDef::new("v", int16())],
            HostType::Void,
            |_: &mut [Value]| Ok(Value::Nil),
        )
        .static_method(
            "Inc",
            vec![ParamDef::by_ref("v", int64())],
            HostType::Void,
            |args: &mut [Value]| {
                let v: i64 = arg(args, 0)?;
                args[0] = Value::I64(v + 1);
                Ok(Value::Nil)
            },
        )
        .static_method(
            "Origin",
            vec![],
            point(),
            |_: &mut [Value]| Ok(new_point(0, "origin")),
        )
        .static_method("Tick", vec![], HostType::Void, |_: &mut [Value]| {
            Ok(Value::Nil)
        })
        .static_method(
            "Echo",
            vec![ParamDef::new("s", string())],
            string(),
            |args: &mut [Value]| Ok(args[0].clone()),
        )
        .generic_static_method(
            "Identity",
            1,
            vec![ParamDef::new("v", HostType::Object)],
            HostType::Object,
            |args: &mut [Value]| Ok(args[1].clone()),
        );

    registry
        .register_type("Demo.Point", TypeFlags::PUBLIC, None)
        .unwrap()
        .field("X", int32())
        .property("Norm", double(), |args: &mut [Value]| {
            let x = match object_of(args)?.get("X") {
                Value::I32(x) => x,
                _ => 0,
            };
            Ok(Value::F64(f64::from(x).abs()))
        })
        .writable_property(
            "Label",
            string(),
            |args: &mut [Value]| Ok(object_of(args)?.get("Label")),
            |args: &mut [Value]| {
                let value = args[1].clone();
                object_of(args)?.set("Label", value);
                Ok(Value::Nil)
            },
        )
        .method(
            "Scale",
            vec![ParamDef::new("k", int32())],
            HostType::Void,
            |args: &mut [Value]| {
                let k: i32 = arg(args, 1)?;
                let obj = object_of(args)?;
                if let Value::I32(x) = obj.get("X") {
                    obj.set("X", Value::I32(x * k));
                }
                Ok(Value::Nil)
            },
        )
        .method(
            "Add",
            vec![ParamDef::new("k", int32())],
            int32(),
            |args: &mut [Value]| {
                let k: i32 = arg(args, 1)?;
                match object_of(args)?.get("X") {
                    Value::I32(x) => Ok(Value::I32(x + k)),
                    other => Err(RuntimeError::InvalidCast {
                        from: other.type_name(),
                        to: "System.Int32".to_string(),
                    }),
                }
            },
        )
        .method("Describe", vec![], string(), |args: &mut [Value]| {
            Ok(object_of(args)?.get("Label"))
        });
}

/// `(. target rest...)`
pub fn dot(target: Form, rest: impl IntoIterator<Item = Form>) -> Form {
    Form::list([Form::symbol("."), target].into_iter().chain(rest))
}

/// `(head args...)`
pub fn call(head: &str, args: impl IntoIterator<Item = Form>) -> Form {
    Form::list(std::iter::once(Form::symbol(head)).chain(args))
}
