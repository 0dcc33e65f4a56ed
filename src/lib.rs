//! Host interop for a Lisp-family compiler.
//!
//! Resolves `(. target member ...)` forms against a registry of host types,
//! picks overloads at compile time where argument types are known, and
//! generates stack bytecode that a small reference VM executes.
//!
//! ## Crates
//!
//! - `hostinterop-core`: types, forms, values and errors shared by every phase
//! - [`registry`]: the host type registry and namespaces
//! - [`compiler`]: analysis, overload resolution and code generation
//! - [`vm`]: the reference bytecode interpreter
//!
//! ## Example
//!
//! ```ignore
//! let mut session = Session::new();
//! let value = session.eval(&Form::list([
//!     Form::symbol("."),
//!     Form::symbol("Math"),
//!     Form::symbol("PI"),
//! ]))?;
//! ```

pub mod vm;

pub use hostinterop_compiler as compiler;
pub use hostinterop_registry as registry;

pub use hostinterop_compiler::{
    BytecodeChunk, CompilationContext, CompilerOptions, ConstantPool, OpCode, ParserContext,
};
pub use hostinterop_core::{CompilationError, Error, Form, HostType, RuntimeError, Span, Value};
pub use hostinterop_registry::{HostRegistry, Namespace, TypeFlags};
pub use vm::Vm;

use log::debug;

struct SessionLocal {
    name: String,
    local_type: Option<HostType>,
    value: Value,
}

/// A compile-and-run environment: a registry, the active namespace, the
/// constant pool and a set of top-level locals.
pub struct Session {
    registry: HostRegistry,
    namespace: Namespace,
    pool: ConstantPool,
    options: CompilerOptions,
    locals: Vec<SessionLocal>,
}

impl Session {
    /// A session over the built-in host library with `System.Math`,
    /// `System.String` and `System.Object` imported.
    pub fn new() -> Self {
        let mut namespace = Namespace::new("user");
        for name in ["System.Math", "System.String", "System.Object"] {
            namespace.import(HostType::class(name));
        }
        Self::with_registry(HostRegistry::with_builtins(), namespace)
    }

    pub fn with_registry(registry: HostRegistry, namespace: Namespace) -> Self {
        Self {
            registry,
            namespace,
            pool: ConstantPool::new(),
            options: CompilerOptions::default(),
            locals: Vec::new(),
        }
    }

    pub fn registry(&self) -> &HostRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HostRegistry {
        &mut self.registry
    }

    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut self.namespace
    }

    pub fn pool(&self) -> &ConstantPool {
        &self.pool
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    pub fn set_options(&mut self, options: CompilerOptions) {
        self.options = options;
    }

    /// Bind a top-level local. Redefining a name keeps its slot.
    pub fn define_local(&mut self, name: &str, local_type: Option<HostType>, value: Value) {
        match self.locals.iter_mut().find(|l| l.name == name) {
            Some(local) => {
                local.local_type = local_type;
                local.value = value;
            }
            None => self.locals.push(SessionLocal {
                name: name.to_string(),
                local_type,
                value,
            }),
        }
    }

    /// Current value of a local.
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .find(|l| l.name == name)
            .map(|l| &l.value)
    }

    /// Analyse and generate code for one form.
    pub fn compile(&self, form: &Form) -> Result<BytecodeChunk, CompilationError> {
        let mut ctx = CompilationContext::new(&self.registry, &self.namespace, &self.pool)
            .with_options(self.options);
        for local in &self.locals {
            let local_type = local.local_type.clone();
            ctx.locals_mut()
                .declare(local.name.as_str(), local_type, Span::default())?;
        }
        hostinterop_compiler::compile_form(&ctx, form)
    }

    /// Compile and run one form.
    pub fn eval(&mut self, form: &Form) -> Result<Value, Error> {
        let chunk = self.compile(form)?;
        debug!("compiled form to {} bytes", chunk.len());
        let mut frame: Vec<Value> = self.locals.iter().map(|l| l.value.clone()).collect();
        let result = Vm::new(&self.registry, &self.pool).run(&chunk, &mut frame);
        for (local, value) in self.locals.iter_mut().zip(frame) {
            local.value = value;
        }
        Ok(result?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
