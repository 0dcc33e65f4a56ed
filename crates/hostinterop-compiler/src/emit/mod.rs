//! Bytecode emitter for the interop compiler.
//!
//! The [`BytecodeEmitter`] wraps a [`BytecodeChunk`] with the operations the
//! expression nodes need: constant and literal loads, field and property
//! access, invocation, primitive casts, boxing and discarding.
//!
//! # Example
//!
//! ```ignore
//! use hostinterop_compiler::emit::BytecodeEmitter;
//!
//! let mut emitter = BytecodeEmitter::new();
//! emitter.set_line(1);
//! emitter.push_i64(42);
//! emitter.box_value();
//! emitter.emit(OpCode::Return);
//!
//! let chunk = emitter.finish();
//! ```

use hostinterop_core::{CompilationError, FieldDef, HostType, MethodDef, PropertyDef};

use crate::bytecode::{BytecodeChunk, EmptyKind, OpCode};
use crate::conversion::CastHelper;

/// Operand of `PushDefault` for reference types.
pub const DEFAULT_REFERENCE: u8 = 0xFF;

/// Emits bytecode instructions for one top-level form.
#[derive(Debug, Default)]
pub struct BytecodeEmitter {
    /// The bytecode chunk being built
    chunk: BytecodeChunk,

    /// Current source line for debug info
    current_line: u32,
}

impl BytecodeEmitter {
    /// Create a new bytecode emitter.
    pub fn new() -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            current_line: 1,
        }
    }

    /// Set current source line for debug info.
    ///
    /// Unknown lines (0) keep the current line.
    pub fn set_line(&mut self, line: u32) {
        if line != 0 {
            self.current_line = line;
        }
    }

    /// Get current source line.
    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.current_line);
    }

    /// Emit opcode with 8-bit operand.
    pub fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_byte(byte, self.current_line);
    }

    /// Emit opcode with 16-bit operand.
    pub fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_u16(value, self.current_line);
    }

    /// Emit opcode with 32-bit operand.
    pub fn emit_u32(&mut self, op: OpCode, value: u32) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_u32(value, self.current_line);
    }

    /// Emit opcode with 64-bit operand.
    pub fn emit_u64(&mut self, op: OpCode, value: u64) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_u64(value, self.current_line);
    }

    // ==========================================================================
    // Constants and Literals
    // ==========================================================================

    /// Load a constant-pool slot.
    pub fn load_constant(&mut self, pool_id: u32) {
        self.emit_u32(OpCode::LoadConstant, pool_id);
    }

    pub fn push_nil(&mut self) {
        self.emit(OpCode::PushNil);
    }

    pub fn push_bool(&mut self, value: bool) {
        self.emit(if value { OpCode::PushTrue } else { OpCode::PushFalse });
    }

    /// Push an unboxed int64 immediate.
    pub fn push_i64(&mut self, value: i64) {
        self.emit_u64(OpCode::PushI64, value as u64);
    }

    /// Push an unboxed float64 immediate.
    pub fn push_f64(&mut self, value: f64) {
        self.emit_u64(OpCode::PushF64, value.to_bits());
    }

    pub fn push_string(&mut self, text: &str) -> Result<(), CompilationError> {
        let idx = self.chunk.add_string(text)?;
        self.emit_u16(OpCode::PushString, idx);
        Ok(())
    }

    pub fn push_empty(&mut self, kind: EmptyKind) {
        self.emit_byte(OpCode::PushEmpty, kind as u8);
    }

    /// Push a type handle (generic type argument).
    pub fn push_type(&mut self, ty: &HostType) -> Result<(), CompilationError> {
        let idx = self.chunk.add_type(ty)?;
        self.emit_u16(OpCode::PushType, idx);
        Ok(())
    }

    /// Push the default value of `ty`: zero for primitives, nil otherwise.
    pub fn push_default(&mut self, ty: &HostType) {
        let code = match ty.as_primitive() {
            Some(kind) => kind.code(),
            None => DEFAULT_REFERENCE,
        };
        self.emit_byte(OpCode::PushDefault, code);
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    pub fn get_local(&mut self, slot: u16) {
        self.emit_u16(OpCode::GetLocal, slot);
    }

    /// Copy argument `arg_index` of the last call back into `slot`.
    pub fn write_back(&mut self, arg_index: u8, slot: u16) {
        self.chunk.write_op(OpCode::WriteBack, self.current_line);
        self.chunk.write_byte(arg_index, self.current_line);
        self.chunk.write_u16(slot, self.current_line);
    }

    // ==========================================================================
    // Members
    // ==========================================================================

    /// Read a field. Instance fields expect the target on the stack.
    pub fn field_access(&mut self, field: &FieldDef) {
        let op = if field.is_static {
            OpCode::GetStaticField
        } else {
            OpCode::GetField
        };
        self.emit_u64(op, field.hash.as_u64());
    }

    /// Store into a field. Expects `[target?, value]`; leaves the value.
    pub fn field_assign(&mut self, field: &FieldDef) {
        let op = if field.is_static {
            OpCode::SetStaticField
        } else {
            OpCode::SetField
        };
        self.emit_u64(op, field.hash.as_u64());
    }

    pub fn property_access(&mut self, property: &PropertyDef) {
        let op = if property.is_static {
            OpCode::GetStaticProperty
        } else {
            OpCode::GetProperty
        };
        self.emit_u64(op, property.hash.as_u64());
    }

    pub fn property_assign(&mut self, property: &PropertyDef) {
        let op = if property.is_static {
            OpCode::SetStaticProperty
        } else {
            OpCode::SetProperty
        };
        self.emit_u64(op, property.hash.as_u64());
    }

    /// Read a field or property found on the target's runtime type.
    pub fn dynamic_field_access(&mut self, name: &str) -> Result<(), CompilationError> {
        let idx = self.chunk.add_string(name)?;
        self.emit_u16(OpCode::GetFieldDynamic, idx);
        Ok(())
    }

    pub fn dynamic_field_assign(&mut self, name: &str) -> Result<(), CompilationError> {
        let idx = self.chunk.add_string(name)?;
        self.emit_u16(OpCode::SetFieldDynamic, idx);
        Ok(())
    }

    /// Call a resolved method. `argc` counts pushed arguments, type
    /// arguments included, receiver excluded.
    pub fn invoke(&mut self, method: &MethodDef, argc: u8) {
        let op = if method.is_static {
            OpCode::CallStatic
        } else {
            OpCode::CallInstance
        };
        self.emit_u64(op, method.hash.as_u64());
        self.chunk.write_byte(argc, self.current_line);
    }

    /// Call a method looked up by name on the receiver's runtime type.
    pub fn invoke_dynamic(&mut self, name: &str, argc: u8) -> Result<(), CompilationError> {
        let idx = self.chunk.add_string(name)?;
        self.emit_u16(OpCode::CallDynamic, idx);
        self.chunk.write_byte(argc, self.current_line);
        Ok(())
    }

    // ==========================================================================
    // Conversions
    // ==========================================================================

    /// Apply a primitive cast helper to the boxed value on the stack.
    pub fn cast(&mut self, helper: CastHelper) {
        match helper {
            CastHelper::Boolean => self.emit(OpCode::CastBool),
            CastHelper::Checked(kind) => self.emit_byte(OpCode::CastChecked, kind.code()),
            CastHelper::Unchecked(kind) => self.emit_byte(OpCode::CastUnchecked, kind.code()),
        }
    }

    /// General conversion of the value on the stack to `ty`.
    pub fn convert(&mut self, ty: &HostType) -> Result<(), CompilationError> {
        let idx = self.chunk.add_type(ty)?;
        self.emit_u16(OpCode::ConvertTo, idx);
        Ok(())
    }

    pub fn box_value(&mut self) {
        self.emit(OpCode::Box);
    }

    /// Discard the top of stack.
    pub fn discard(&mut self) {
        self.emit(OpCode::Pop);
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Borrow the chunk built so far.
    pub fn chunk(&self) -> &BytecodeChunk {
        &self.chunk
    }

    /// Finish emission and return the bytecode chunk.
    pub fn finish(self) -> BytecodeChunk {
        self.chunk
    }
}
