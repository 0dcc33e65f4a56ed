//! Bytecode chunk for compiled top-level forms.
//!
//! A `BytecodeChunk` holds the emitted code, a per-byte line table, and two
//! side tables referenced by operands: interned strings (literals and
//! runtime-resolved member names) and host types (type arguments and
//! conversion targets).

use std::sync::Arc;

use hostinterop_core::{CompilationError, HostType, TypeHash};
use rustc_hash::FxHashMap;

use super::OpCode;

/// Operand of `PushEmpty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EmptyKind {
    List = 0,
    Vector = 1,
    Map = 2,
    Set = 3,
}

impl EmptyKind {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => EmptyKind::List,
            1 => EmptyKind::Vector,
            2 => EmptyKind::Map,
            3 => EmptyKind::Set,
            _ => return None,
        })
    }
}

/// A chunk of compiled bytecode.
///
/// Literal values live in the process-wide `ConstantPool`, not here.
#[derive(Debug, Clone, Default)]
pub struct BytecodeChunk {
    /// The bytecode instructions.
    code: Vec<u8>,
    /// Line numbers (parallel to code).
    lines: Vec<u32>,
    strings: Vec<Arc<str>>,
    /// Deduplication index keyed by identifier hash.
    string_index: FxHashMap<TypeHash, u16>,
    types: Vec<HostType>,
    type_index: FxHashMap<HostType, u16>,
}

impl BytecodeChunk {
    /// Create a new empty bytecode chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.code.push(op.into());
        self.lines.push(line);
    }

    /// Write a byte operand.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        self.write_bytes(&value.to_be_bytes(), line);
    }

    /// Write a 32-bit operand (big-endian).
    pub fn write_u32(&mut self, value: u32, line: u32) {
        self.write_bytes(&value.to_be_bytes(), line);
    }

    /// Write a 64-bit operand (big-endian).
    pub fn write_u64(&mut self, value: u64, line: u32) {
        self.write_bytes(&value.to_be_bytes(), line);
    }

    fn write_bytes(&mut self, bytes: &[u8], line: u32) {
        self.code.extend_from_slice(bytes);
        self.lines.extend(std::iter::repeat_n(line, bytes.len()));
    }

    /// Intern a string, returning its table index.
    pub fn add_string(&mut self, text: &str) -> Result<u16, CompilationError> {
        let key = TypeHash::from_ident(text);
        if let Some(&idx) = self.string_index.get(&key) {
            return Ok(idx);
        }
        let idx = u16::try_from(self.strings.len())
            .map_err(|_| CompilationError::Internal {
                message: "string table overflow".to_string(),
            })?;
        self.strings.push(Arc::from(text));
        self.string_index.insert(key, idx);
        Ok(idx)
    }

    /// Intern a host type, returning its table index.
    pub fn add_type(&mut self, ty: &HostType) -> Result<u16, CompilationError> {
        if let Some(&idx) = self.type_index.get(ty) {
            return Ok(idx);
        }
        let idx = u16::try_from(self.types.len())
            .map_err(|_| CompilationError::Internal {
                message: "type table overflow".to_string(),
            })?;
        self.types.push(ty.clone());
        self.type_index.insert(ty.clone(), idx);
        Ok(idx)
    }

    /// String at a table index.
    pub fn string(&self, idx: u16) -> Option<&Arc<str>> {
        self.strings.get(usize::from(idx))
    }

    /// Host type at a table index.
    pub fn host_type(&self, idx: u16) -> Option<&HostType> {
        self.types.get(usize::from(idx))
    }

    /// Get the bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Get the line numbers.
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// Get the line number for a given offset.
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a byte at the given offset.
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        self.read_array(offset).map(u16::from_be_bytes)
    }

    /// Read a u32 at the given offset (big-endian).
    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        self.read_array(offset).map(u32::from_be_bytes)
    }

    /// Read a u64 at the given offset (big-endian).
    pub fn read_u64(&self, offset: usize) -> Option<u64> {
        self.read_array(offset).map(u64::from_be_bytes)
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.code
            .get(offset..offset.checked_add(N)?)?
            .try_into()
            .ok()
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Extract all opcodes from the chunk, skipping operands.
    ///
    /// This is useful for testing bytecode sequences without worrying about
    /// specific operand values or instruction offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;

        while offset < self.code.len() {
            if let Some(op) = self.read_op(offset) {
                ops.push(op);
                offset += 1 + op.operand_size();
            } else {
                // Invalid opcode, skip one byte
                offset += 1;
            }
        }

        ops
    }

    /// Check if this chunk contains exactly the given opcode sequence.
    ///
    /// This ignores operand values, only checking the opcodes themselves.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check if this chunk contains the given opcodes (in order, but not necessarily contiguous).
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}
