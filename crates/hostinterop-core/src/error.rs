//! Error types for every phase of host interop.
//!
//! ```text
//! Error (top-level wrapper)
//! ├── RegistrationError - building the reflected type registry
//! ├── CompilationError  - analysing interop forms and generating code
//! └── RuntimeError      - executing generated code
//! ```
//!
//! [`LookupError`] is the oracle's internal failure type. Type-tag
//! resolution converts it into "unresolved" rather than propagating it.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lookup Errors
// ============================================================================

/// A failure inside the oracle's qualified-name lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    /// The name is not a well-formed type name.
    #[error("malformed type name '{name}'")]
    MalformedName { name: String },

    /// The loader backing the oracle failed.
    #[error("type loader failed for '{name}': {reason}")]
    LoaderFailed { name: String, reason: String },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised while populating a type registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistrationError {
    /// A type with this name is already registered.
    #[error("type '{name}' is already registered")]
    DuplicateType { name: String },

    /// A member was added to a type that does not exist.
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    /// The name cannot be used as a type name.
    #[error("invalid type name '{name}'")]
    InvalidTypeName { name: String },
}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Fatal analysis errors. Each aborts the form that raised it only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    /// The form's arity or shape is wrong, or `by-ref` was misused.
    #[error("at {span}: malformed member expression: {message}")]
    MalformedForm { message: String, span: Span },

    /// No field, property or zero-argument method of that name exists on a
    /// statically known type.
    #[error("at {span}: no member '{member}' found on type '{type_name}'")]
    MissingMember {
        type_name: String,
        member: String,
        span: Span,
    },

    /// Several overloads are equally good for the supplied arguments.
    #[error("at {span}: ambiguous call to '{name}': candidates {candidates}")]
    AmbiguousOverload {
        name: String,
        candidates: String,
        span: Span,
    },

    /// Overloads exist but none accepts the supplied argument types.
    #[error("at {span}: no overload of '{name}' accepts ({args})")]
    NoMatchingOverload {
        name: String,
        args: String,
        span: Span,
    },

    /// A type tag or type argument does not name a type.
    #[error("at {span}: unable to resolve type name '{name}'")]
    UnresolvedTypeName { name: String, span: Span },

    /// A symbol is neither a local binding nor a type.
    #[error("at {span}: unable to resolve symbol '{name}' in this context")]
    UnresolvedSymbol { name: String, span: Span },

    /// The form is outside the subset this analyser handles.
    #[error("at {span}: unsupported form: {message}")]
    Unsupported { message: String, span: Span },

    /// An internal invariant was violated.
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    /// Get the span of the form that caused this error.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::MalformedForm { span, .. } => *span,
            CompilationError::MissingMember { span, .. } => *span,
            CompilationError::AmbiguousOverload { span, .. } => *span,
            CompilationError::NoMatchingOverload { span, .. } => *span,
            CompilationError::UnresolvedTypeName { span, .. } => *span,
            CompilationError::UnresolvedSymbol { span, .. } => *span,
            CompilationError::Unsupported { span, .. } => *span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised while executing generated code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A checked numeric cast was out of range.
    #[error("value {value} out of range for {target}")]
    Overflow { value: String, target: String },

    /// A value could not be converted to the requested type.
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: String },

    /// A member was accessed on nil.
    #[error("null reference while accessing '{member}'")]
    NullReference { member: String },

    /// Runtime member lookup found nothing.
    #[error("no member '{member}' with {arity} argument(s) on {type_name}")]
    MissingMember {
        type_name: String,
        member: String,
        arity: usize,
    },

    /// The operand stack was empty.
    #[error("stack underflow")]
    StackUnderflow,

    /// The bytecode could not be decoded.
    #[error("invalid bytecode at offset {offset}: {message}")]
    InvalidBytecode { offset: usize, message: String },

    /// A native member body failed.
    #[error("{message}")]
    Native { message: String },

    /// Shared runtime state was poisoned by a panic in another thread.
    #[error("{what} is poisoned")]
    Poisoned { what: String },
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Any host interop error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
