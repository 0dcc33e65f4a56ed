//! Source forms as produced by the reader.
//!
//! The interop compiler does not read text; it receives already-read nested
//! [`Form`]s carrying a source [`Span`] and an optional type tag.

use std::sync::Arc;

use crate::{HostType, Span, Symbol, Value};

/// The shape of a form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Symbol(Symbol),
    Keyword(Symbol),
    List(Vec<Form>),
    Vector(Vec<Form>),
    Map(Vec<(Form, Form)>),
    Set(Vec<Form>),
    /// An already-resolved host type embedded in the form (from macros).
    Type(HostType),
}

/// A source form with location and type-tag metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
    /// The form's `^Tag` metadata, if any.
    pub tag: Option<Symbol>,
}

impl Form {
    /// Wrap a form kind with no location or tag.
    pub fn new(kind: FormKind) -> Self {
        Self {
            kind,
            span: Span::default(),
            tag: None,
        }
    }

    pub fn nil() -> Self {
        Self::new(FormKind::Nil)
    }

    pub fn bool(v: bool) -> Self {
        Self::new(FormKind::Bool(v))
    }

    pub fn int(v: i64) -> Self {
        Self::new(FormKind::Int(v))
    }

    pub fn float(v: f64) -> Self {
        Self::new(FormKind::Float(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self::new(FormKind::Str(v.into()))
    }

    /// A symbol form; `ns/name` text becomes a qualified symbol.
    pub fn symbol(text: &str) -> Self {
        Self::new(FormKind::Symbol(Symbol::parse(text)))
    }

    pub fn keyword(text: &str) -> Self {
        Self::new(FormKind::Keyword(Symbol::parse(text)))
    }

    pub fn list(items: impl IntoIterator<Item = Form>) -> Self {
        Self::new(FormKind::List(items.into_iter().collect()))
    }

    pub fn vector(items: impl IntoIterator<Item = Form>) -> Self {
        Self::new(FormKind::Vector(items.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (Form, Form)>) -> Self {
        Self::new(FormKind::Map(entries.into_iter().collect()))
    }

    pub fn host_type(ty: HostType) -> Self {
        Self::new(FormKind::Type(ty))
    }

    /// Attach a source location.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Attach a `^Tag` type annotation.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(Symbol::parse(tag));
        self
    }

    /// The symbol, if this form is a symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            FormKind::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    /// The elements, if this form is a list.
    pub fn as_list(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is a list whose head is the unqualified symbol `name`.
    pub fn is_call_to(&self, name: &str) -> bool {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Form::as_symbol)
            .is_some_and(|sym| !sym.is_qualified() && sym.name() == name)
    }

    /// Convert to the literal value this form denotes when quoted.
    pub fn to_value(&self) -> Value {
        match &self.kind {
            FormKind::Nil => Value::Nil,
            FormKind::Bool(v) => Value::Bool(*v),
            FormKind::Int(v) => Value::I64(*v),
            FormKind::Float(v) => Value::F64(*v),
            FormKind::Char(v) => Value::Char(*v),
            FormKind::Str(s) => Value::string(s.as_str()),
            FormKind::Symbol(sym) => Value::Symbol(sym.clone()),
            FormKind::Keyword(sym) => Value::Keyword(sym.clone()),
            FormKind::List(items) => Value::List(quote_all(items)),
            FormKind::Vector(items) => Value::Vector(quote_all(items)),
            FormKind::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_value(), v.to_value()))
                    .collect::<Arc<[_]>>(),
            ),
            FormKind::Set(items) => Value::Set(quote_all(items)),
            FormKind::Type(ty) => Value::Type(ty.clone()),
        }
    }
}

fn quote_all(items: &[Form]) -> Arc<[Value]> {
    items.iter().map(Form::to_value).collect()
}
