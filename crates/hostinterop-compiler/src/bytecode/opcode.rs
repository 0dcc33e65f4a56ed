//! Bytecode operation codes.
//!
//! Each opcode is a single byte, with operands following inline
//! (big-endian). Member operands are 64-bit member hashes; name operands
//! index the chunk's string table; type operands index its type table.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is a stack machine: operations pop their inputs and push their
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants and Literals
    // =========================================================================
    /// Push a constant-pool value.
    /// Operand: u32 pool id
    LoadConstant = 0,
    PushNil,
    PushTrue,
    PushFalse,
    /// Push an unboxed int64.
    /// Operand: u64 value bits
    PushI64,
    /// Push an unboxed float64.
    /// Operand: u64 value bits
    PushF64,
    /// Push a string literal.
    /// Operand: u16 string index
    PushString,
    /// Push an empty persistent collection.
    /// Operand: u8 `EmptyKind`
    PushEmpty,
    /// Push a type handle (generic type arguments).
    /// Operand: u16 type index
    PushType,
    /// Push the default value of a type.
    /// Operand: u8 primitive code, or 0xFF for reference types (nil)
    PushDefault,

    // =========================================================================
    // Stack and Locals
    // =========================================================================
    /// Discard the top of stack.
    Pop,
    /// Push a local.
    /// Operand: u16 slot
    GetLocal,
    /// Copy an argument of the most recent call back into a local.
    /// Operands: u8 argument index, u16 slot
    WriteBack,

    // =========================================================================
    // Fields and Properties
    // =========================================================================
    /// Operand: u64 member hash
    GetStaticField,
    /// Pop value, store, push value.
    /// Operand: u64 member hash
    SetStaticField,
    /// Pop target, push field.
    /// Operand: u64 member hash
    GetField,
    /// Pop value and target, store, push value.
    /// Operand: u64 member hash
    SetField,
    /// Operand: u64 member hash
    GetStaticProperty,
    /// Operand: u64 member hash
    SetStaticProperty,
    /// Operand: u64 member hash
    GetProperty,
    /// Operand: u64 member hash
    SetProperty,
    /// Runtime-resolved field/property read.
    /// Operand: u16 name index
    GetFieldDynamic,
    /// Runtime-resolved field/property write.
    /// Operand: u16 name index
    SetFieldDynamic,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Pop arguments, call, push result.
    /// Operands: u64 member hash, u8 argument count
    CallStatic,
    /// Pop arguments and receiver, call, push result.
    /// Operands: u64 member hash, u8 argument count (excluding receiver)
    CallInstance,
    /// Runtime member lookup and call on the receiver's actual type.
    /// Operands: u16 name index, u8 argument count (excluding receiver)
    CallDynamic,

    // =========================================================================
    // Conversions
    // =========================================================================
    I32ToI64,
    F32ToF64,
    /// Truncating int64 -> int32.
    I64ToI32,
    /// Range-checked int64 -> int32.
    I64ToI32Checked,
    F64ToF32,
    /// Truthiness cast to bool.
    CastBool,
    /// Range-checked primitive cast of a boxed value.
    /// Operand: u8 primitive code
    CastChecked,
    /// Truncating primitive cast of a boxed value.
    /// Operand: u8 primitive code
    CastUnchecked,
    /// General reference conversion; fails at run time if the value is not
    /// assignable.
    /// Operand: u16 type index
    ConvertTo,
    /// Box a primitive into its object representation.
    Box,

    // =========================================================================
    // Control
    // =========================================================================
    /// Return the top of stack.
    Return,
}

impl OpCode {
    /// Decode an opcode byte.
    #[inline]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::try_from(byte).ok()
    }

    /// Total size in bytes of this opcode's inline operands.
    pub const fn operand_size(self) -> usize {
        match self {
            OpCode::LoadConstant => 4,
            OpCode::PushI64 | OpCode::PushF64 => 8,
            OpCode::PushString | OpCode::PushType | OpCode::GetLocal => 2,
            OpCode::PushEmpty | OpCode::PushDefault => 1,
            OpCode::WriteBack => 3,
            OpCode::GetStaticField
            | OpCode::SetStaticField
            | OpCode::GetField
            | OpCode::SetField
            | OpCode::GetStaticProperty
            | OpCode::SetStaticProperty
            | OpCode::GetProperty
            | OpCode::SetProperty => 8,
            OpCode::GetFieldDynamic | OpCode::SetFieldDynamic => 2,
            OpCode::CallStatic | OpCode::CallInstance => 9,
            OpCode::CallDynamic => 3,
            OpCode::CastChecked | OpCode::CastUnchecked => 1,
            OpCode::ConvertTo => 2,
            OpCode::PushNil
            | OpCode::PushTrue
            | OpCode::PushFalse
            | OpCode::Pop
            | OpCode::I32ToI64
            | OpCode::F32ToF64
            | OpCode::I64ToI32
            | OpCode::I64ToI32Checked
            | OpCode::F64ToF32
            | OpCode::CastBool
            | OpCode::Box
            | OpCode::Return => 0,
        }
    }

    /// Mnemonic for disassembly and test diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::LoadConstant => "LOAD_CONSTANT",
            OpCode::PushNil => "PUSH_NIL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::PushI64 => "PUSH_I64",
            OpCode::PushF64 => "PUSH_F64",
            OpCode::PushString => "PUSH_STRING",
            OpCode::PushEmpty => "PUSH_EMPTY",
            OpCode::PushType => "PUSH_TYPE",
            OpCode::PushDefault => "PUSH_DEFAULT",
            OpCode::Pop => "POP",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::WriteBack => "WRITE_BACK",
            OpCode::GetStaticField => "GET_STATIC_FIELD",
            OpCode::SetStaticField => "SET_STATIC_FIELD",
            OpCode::GetField => "GET_FIELD",
            OpCode::SetField => "SET_FIELD",
            OpCode::GetStaticProperty => "GET_STATIC_PROPERTY",
            OpCode::SetStaticProperty => "SET_STATIC_PROPERTY",
            OpCode::GetProperty => "GET_PROPERTY",
            OpCode::SetProperty => "SET_PROPERTY",
            OpCode::GetFieldDynamic => "GET_FIELD_DYNAMIC",
            OpCode::SetFieldDynamic => "SET_FIELD_DYNAMIC",
            OpCode::CallStatic => "CALL_STATIC",
            OpCode::CallInstance => "CALL_INSTANCE",
            OpCode::CallDynamic => "CALL_DYNAMIC",
            OpCode::I32ToI64 => "I32_TO_I64",
            OpCode::F32ToF64 => "F32_TO_F64",
            OpCode::I64ToI32 => "I64_TO_I32",
            OpCode::I64ToI32Checked => "I64_TO_I32_CHECKED",
            OpCode::F64ToF32 => "F64_TO_F32",
            OpCode::CastBool => "CAST_BOOL",
            OpCode::CastChecked => "CAST_CHECKED",
            OpCode::CastUnchecked => "CAST_UNCHECKED",
            OpCode::ConvertTo => "CONVERT_TO",
            OpCode::Box => "BOX",
            OpCode::Return => "RETURN",
        }
    }
}
