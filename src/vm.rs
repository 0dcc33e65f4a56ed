//! Reference stack machine for generated interop bytecode.
//!
//! Executes one [`BytecodeChunk`] against a [`HostRegistry`] and a frame of
//! local slots. There is no control flow: execution runs straight through
//! to `RETURN`.

use std::sync::Arc;

use hostinterop_compiler::bytecode::{BytecodeChunk, ConstantPool, EmptyKind, OpCode};
use hostinterop_compiler::emit::DEFAULT_REFERENCE;
use hostinterop_core::{
    CastMode, HostType, MemberOracle, PrimitiveKind, RuntimeError, TypeHash, Value, boolean_cast,
    cast_primitive,
};
use hostinterop_registry::HostRegistry;
use log::trace;

/// Executes bytecode chunks.
pub struct Vm<'a> {
    registry: &'a HostRegistry,
    pool: &'a ConstantPool,
    stack: Vec<Value>,
    /// Argument frame of the most recent call, after the callee ran.
    last_args: Vec<Value>,
}

impl<'a> Vm<'a> {
    pub fn new(registry: &'a HostRegistry, pool: &'a ConstantPool) -> Self {
        Self {
            registry,
            pool,
            stack: Vec::with_capacity(16),
            last_args: Vec::new(),
        }
    }

    /// Run `chunk` to completion and return its result.
    ///
    /// `locals` is indexed by slot; by-ref calls write back into it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(
        &mut self,
        chunk: &BytecodeChunk,
        locals: &mut [Value],
    ) -> Result<Value, RuntimeError> {
        self.stack.clear();
        self.last_args.clear();
        let mut ip = 0;

        while ip < chunk.len() {
            let op = chunk
                .read_op(ip)
                .ok_or_else(|| invalid(ip, "unknown opcode"))?;
            let operands = ip + 1;
            trace!("{:04} {}", ip, op.name());

            match op {
                // Constants and literals
                OpCode::LoadConstant => {
                    let id = chunk.read_u32(operands).ok_or_else(|| truncated(ip))?;
                    let value = self
                        .pool
                        .get(id)
                        .ok_or_else(|| invalid(ip, "constant id out of range"))?;
                    self.stack.push(value);
                }
                OpCode::PushNil => self.stack.push(Value::Nil),
                OpCode::PushTrue => self.stack.push(Value::Bool(true)),
                OpCode::PushFalse => self.stack.push(Value::Bool(false)),
                OpCode::PushI64 => {
                    let bits = chunk.read_u64(operands).ok_or_else(|| truncated(ip))?;
                    self.stack.push(Value::I64(bits as i64));
                }
                OpCode::PushF64 => {
                    let bits = chunk.read_u64(operands).ok_or_else(|| truncated(ip))?;
                    self.stack.push(Value::F64(f64::from_bits(bits)));
                }
                OpCode::PushString => {
                    let text = self.string_operand(chunk, ip)?;
                    self.stack.push(Value::Str(text));
                }
                OpCode::PushEmpty => {
                    let kind = chunk
                        .read_byte(operands)
                        .and_then(EmptyKind::from_u8)
                        .ok_or_else(|| invalid(ip, "bad collection kind"))?;
                    self.stack.push(empty_collection(kind));
                }
                OpCode::PushType => {
                    let ty = self.type_operand(chunk, ip)?;
                    self.stack.push(Value::Type(ty));
                }
                OpCode::PushDefault => {
                    let code = chunk.read_byte(operands).ok_or_else(|| truncated(ip))?;
                    let value = if code == DEFAULT_REFERENCE {
                        Value::Nil
                    } else {
                        let kind = PrimitiveKind::from_code(code)
                            .ok_or_else(|| invalid(ip, "bad primitive code"))?;
                        default_value(kind)?
                    };
                    self.stack.push(value);
                }

                // Stack and locals
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::GetLocal => {
                    let slot = chunk.read_u16(operands).ok_or_else(|| truncated(ip))?;
                    let value = locals
                        .get(usize::from(slot))
                        .cloned()
                        .ok_or_else(|| invalid(ip, "local slot out of range"))?;
                    self.stack.push(value);
                }
                OpCode::WriteBack => {
                    let index = chunk.read_byte(operands).ok_or_else(|| truncated(ip))?;
                    let slot = chunk.read_u16(operands + 1).ok_or_else(|| truncated(ip))?;
                    let value = self
                        .last_args
                        .get(usize::from(index))
                        .cloned()
                        .ok_or_else(|| invalid(ip, "write-back argument out of range"))?;
                    let local = locals
                        .get_mut(usize::from(slot))
                        .ok_or_else(|| invalid(ip, "local slot out of range"))?;
                    *local = value;
                }

                // Fields and properties
                OpCode::GetStaticField | OpCode::GetStaticProperty => {
                    let hash = self.member_operand(chunk, ip)?;
                    let value = self.registry.read_member(hash, &Value::Nil)?;
                    self.stack.push(value);
                }
                OpCode::SetStaticField | OpCode::SetStaticProperty => {
                    let hash = self.member_operand(chunk, ip)?;
                    let value = self.pop()?;
                    self.registry.write_member(hash, &Value::Nil, value.clone())?;
                    self.stack.push(value);
                }
                OpCode::GetField | OpCode::GetProperty => {
                    let hash = self.member_operand(chunk, ip)?;
                    let target = self.pop()?;
                    let value = self.registry.read_member(hash, &target)?;
                    self.stack.push(value);
                }
                OpCode::SetField | OpCode::SetProperty => {
                    let hash = self.member_operand(chunk, ip)?;
                    let value = self.pop()?;
                    let target = self.pop()?;
                    self.registry.write_member(hash, &target, value.clone())?;
                    self.stack.push(value);
                }
                OpCode::GetFieldDynamic => {
                    let name = self.string_operand(chunk, ip)?;
                    let target = self.pop()?;
                    let value = self.registry.get_dynamic(&target, &name)?;
                    self.stack.push(value);
                }
                OpCode::SetFieldDynamic => {
                    let name = self.string_operand(chunk, ip)?;
                    let value = self.pop()?;
                    let target = self.pop()?;
                    self.registry.set_dynamic(&target, &name, value.clone())?;
                    self.stack.push(value);
                }

                // Calls
                OpCode::CallStatic => {
                    let hash = self.member_operand(chunk, ip)?;
                    let argc = chunk.read_byte(operands + 8).ok_or_else(|| truncated(ip))?;
                    let mut frame = self.pop_frame(usize::from(argc))?;
                    let result = self.registry.invoke(hash, &mut frame)?;
                    let push = self.returns_value(hash);
                    self.finish_call(frame, result, push);
                }
                OpCode::CallInstance => {
                    let hash = self.member_operand(chunk, ip)?;
                    let argc = chunk.read_byte(operands + 8).ok_or_else(|| truncated(ip))?;
                    let mut frame = self.pop_frame(usize::from(argc) + 1)?;
                    if matches!(frame.first(), Some(Value::Nil)) {
                        let member = self
                            .registry
                            .member(hash)
                            .map_or_else(|| hash.to_string(), |(d, _)| d.name().to_string());
                        return Err(RuntimeError::NullReference { member });
                    }
                    let result = self.registry.invoke(hash, &mut frame)?;
                    let push = self.returns_value(hash);
                    self.finish_call(frame, result, push);
                }
                OpCode::CallDynamic => {
                    let name = self.string_operand(chunk, ip)?;
                    let argc = chunk.read_byte(operands + 2).ok_or_else(|| truncated(ip))?;
                    let mut frame = self.pop_frame(usize::from(argc) + 1)?;
                    let result = self.registry.invoke_dynamic(&name, &mut frame)?;
                    self.finish_call(frame, result, true);
                }

                // Conversions
                OpCode::I32ToI64 => self.cast_top(PrimitiveKind::Int64, CastMode::Unchecked)?,
                OpCode::F32ToF64 => self.cast_top(PrimitiveKind::Float64, CastMode::Unchecked)?,
                OpCode::I64ToI32 => self.cast_top(PrimitiveKind::Int32, CastMode::Unchecked)?,
                OpCode::I64ToI32Checked => self.cast_top(PrimitiveKind::Int32, CastMode::Checked)?,
                OpCode::F64ToF32 => self.cast_top(PrimitiveKind::Float32, CastMode::Unchecked)?,
                OpCode::CastBool => {
                    let value = self.pop()?;
                    self.stack.push(Value::Bool(boolean_cast(&value)));
                }
                OpCode::CastChecked | OpCode::CastUnchecked => {
                    let kind = chunk
                        .read_byte(operands)
                        .and_then(PrimitiveKind::from_code)
                        .ok_or_else(|| invalid(ip, "bad primitive code"))?;
                    let mode = if op == OpCode::CastChecked {
                        CastMode::Checked
                    } else {
                        CastMode::Unchecked
                    };
                    self.cast_top(kind, mode)?;
                }
                OpCode::ConvertTo => {
                    let ty = self.type_operand(chunk, ip)?;
                    let value = self.pop()?;
                    let converted = self.convert(value, &ty)?;
                    self.stack.push(converted);
                }
                // Values are uniformly represented; boxing is a no-op here.
                OpCode::Box => {}

                OpCode::Return => return self.pop(),
            }

            ip = operands + op.operand_size();
        }

        Ok(self.stack.pop().unwrap_or(Value::Nil))
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_frame(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack.split_off(start))
    }

    /// Dynamic calls always produce a value; resolved void calls push nothing.
    fn finish_call(&mut self, frame: Vec<Value>, result: Value, push: bool) {
        self.last_args = frame;
        if push {
            self.stack.push(result);
        }
    }

    fn returns_value(&self, hash: TypeHash) -> bool {
        self.registry
            .member(hash)
            .is_some_and(|(descriptor, _)| !descriptor.value_type().is_void())
    }

    fn cast_top(&mut self, kind: PrimitiveKind, mode: CastMode) -> Result<(), RuntimeError> {
        let value = self.pop()?;
        self.stack.push(cast_primitive(&value, kind, mode)?);
        Ok(())
    }

    fn convert(&self, value: Value, ty: &HostType) -> Result<Value, RuntimeError> {
        if let Some(kind) = ty.as_primitive() {
            return cast_primitive(&value, kind, CastMode::Checked);
        }
        match value.runtime_type() {
            None => Ok(value),
            Some(actual) if self.registry.is_assignable(&actual, ty) => Ok(value),
            Some(_) => Err(RuntimeError::InvalidCast {
                from: value.type_name(),
                to: ty.name(),
            }),
        }
    }

    fn member_operand(&self, chunk: &BytecodeChunk, ip: usize) -> Result<TypeHash, RuntimeError> {
        chunk
            .read_u64(ip + 1)
            .map(TypeHash)
            .ok_or_else(|| truncated(ip))
    }

    fn string_operand(&self, chunk: &BytecodeChunk, ip: usize) -> Result<Arc<str>, RuntimeError> {
        let idx = chunk.read_u16(ip + 1).ok_or_else(|| truncated(ip))?;
        chunk
            .string(idx)
            .cloned()
            .ok_or_else(|| invalid(ip, "string index out of range"))
    }

    fn type_operand(&self, chunk: &BytecodeChunk, ip: usize) -> Result<HostType, RuntimeError> {
        let idx = chunk.read_u16(ip + 1).ok_or_else(|| truncated(ip))?;
        chunk
            .host_type(idx)
            .cloned()
            .ok_or_else(|| invalid(ip, "type index out of range"))
    }
}

fn empty_collection(kind: EmptyKind) -> Value {
    match kind {
        EmptyKind::List => Value::List(Arc::from([])),
        EmptyKind::Vector => Value::Vector(Arc::from([])),
        EmptyKind::Map => Value::Map(Arc::from([])),
        EmptyKind::Set => Value::Set(Arc::from([])),
    }
}

fn default_value(kind: PrimitiveKind) -> Result<Value, RuntimeError> {
    match kind {
        PrimitiveKind::Bool => Ok(Value::Bool(false)),
        PrimitiveKind::Char => Ok(Value::Char('\0')),
        _ => cast_primitive(&Value::I64(0), kind, CastMode::Unchecked),
    }
}

fn invalid(offset: usize, message: &str) -> RuntimeError {
    RuntimeError::InvalidBytecode {
        offset,
        message: message.to_string(),
    }
}

fn truncated(offset: usize) -> RuntimeError {
    invalid(offset, "truncated operand")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostinterop_compiler::BytecodeEmitter;
    use hostinterop_core::ConstantRegistry;

    fn run(em: BytecodeEmitter, locals: &mut [Value]) -> Result<Value, RuntimeError> {
        let registry = HostRegistry::with_builtins();
        let pool = ConstantPool::new();
        let chunk = em.finish();
        Vm::new(&registry, &pool).run(&chunk, locals)
    }

    #[test]
    fn defaults() {
        let mut em = BytecodeEmitter::new();
        em.push_default(&HostType::Primitive(PrimitiveKind::Int32));
        em.emit(OpCode::Return);
        assert_eq!(run(em, &mut []), Ok(Value::I32(0)));

        let mut em = BytecodeEmitter::new();
        em.push_default(&HostType::Primitive(PrimitiveKind::Bool));
        assert_eq!(run(em, &mut []), Ok(Value::Bool(false)));

        let mut em = BytecodeEmitter::new();
        em.push_default(&HostType::class("System.String"));
        assert_eq!(run(em, &mut []), Ok(Value::Nil));
    }

    #[test]
    fn checked_narrowing_overflows() {
        let mut em = BytecodeEmitter::new();
        em.push_i64(i64::from(i32::MAX) + 1);
        em.emit(OpCode::I64ToI32Checked);
        assert!(matches!(
            run(em, &mut []),
            Err(RuntimeError::Overflow { .. })
        ));

        let mut em = BytecodeEmitter::new();
        em.push_i64(i64::from(i32::MAX) + 1);
        em.emit(OpCode::I64ToI32);
        assert_eq!(run(em, &mut []), Ok(Value::I32(i32::MIN)));
    }

    #[test]
    fn constants_and_locals() {
        let registry = HostRegistry::with_builtins();
        let pool = ConstantPool::new();
        let id = pool.register(Value::Keyword(hostinterop_core::Symbol::new("k")));
        let mut em = BytecodeEmitter::new();
        em.load_constant(id);
        em.discard();
        em.get_local(1);
        em.emit(OpCode::Return);
        let chunk = em.finish();
        let mut locals = [Value::Nil, Value::I64(7)];
        assert_eq!(
            Vm::new(&registry, &pool).run(&chunk, &mut locals),
            Ok(Value::I64(7))
        );
    }

    #[test]
    fn convert_rejects_unrelated_reference() {
        let mut em = BytecodeEmitter::new();
        em.push_string("s").unwrap();
        em.convert(&HostType::class("System.Type")).unwrap();
        assert!(matches!(
            run(em, &mut []),
            Err(RuntimeError::InvalidCast { .. })
        ));

        let mut em = BytecodeEmitter::new();
        em.push_nil();
        em.convert(&HostType::class("System.Type")).unwrap();
        assert_eq!(run(em, &mut []), Ok(Value::Nil));
    }

    #[test]
    fn dynamic_field_on_nil_is_null_reference() {
        let mut em = BytecodeEmitter::new();
        em.push_nil();
        em.dynamic_field_access("Length").unwrap();
        assert!(matches!(
            run(em, &mut []),
            Err(RuntimeError::NullReference { .. })
        ));
    }

    #[test]
    fn void_call_pushes_nothing() {
        use hostinterop_core::{MemberDescriptor, MemberQuery};
        use hostinterop_registry::TypeFlags;

        let mut registry = HostRegistry::with_builtins();
        registry
            .register_type("Demo.Sink", TypeFlags::PUBLIC, None)
            .unwrap()
            .static_method("Drop", vec![], HostType::Void, |_: &mut [Value]| {
                Ok(Value::Nil)
            });
        let owner = HostType::class("Demo.Sink");
        let found = registry.lookup(&MemberQuery {
            owner: &owner,
            name: "Drop",
            is_static: true,
            arity: 0,
            arg_hints: &[],
        });
        let Some(MemberDescriptor::Method(method)) = found.first() else {
            panic!("Drop not registered: {found:?}");
        };

        let mut em = BytecodeEmitter::new();
        em.push_i64(1);
        em.invoke(method, 0);
        em.emit(OpCode::Return);
        let chunk = em.finish();
        let pool = ConstantPool::new();
        let mut vm = Vm::new(&registry, &pool);
        assert_eq!(vm.run(&chunk, &mut []), Ok(Value::I64(1)));
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn empty_stack_underflows() {
        let mut em = BytecodeEmitter::new();
        em.discard();
        assert_eq!(run(em, &mut []), Err(RuntimeError::StackUnderflow));
    }
}
