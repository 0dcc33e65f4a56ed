//! Argument conversion system.
//!
//! Determines whether an argument can be passed to a parameter, and at what
//! cost, for overload ranking; and emits the coercion code once a method
//! has been selected.
//!
//! ## Conversion tiers
//!
//! 1. Exact (identical static types)
//! 2. Widening (int32 to int64, float32 to float64, subclass to base)
//! 3. Boxed (anything to `System.Object`)
//! 4. Converting (other numeric conversions, untyped arguments cast at run time)

mod coerce;
mod primitive;

pub use coerce::{box_return, gen_arg, gen_coerced};
pub use primitive::{CastHelper, cast_helper, direct_conversion, is_convertible, is_widening};

use hostinterop_core::{HostType, MemberOracle, ParamDef};

/// A type conversion with its cost for overload resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// The kind of conversion being performed.
    pub kind: ConversionKind,
    /// The cost of this conversion (lower is better).
    pub cost: u32,
}

/// The kind of conversion being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    /// No conversion needed.
    Identity,
    /// Lossless primitive widening or reference upcast.
    Widening,
    /// Boxing into `System.Object`.
    Boxing,
    /// Runtime cast or conversion.
    Converting,
}

impl Conversion {
    pub const COST_EXACT: u32 = 0;
    pub const COST_WIDENING: u32 = 1;
    pub const COST_BOXING: u32 = 2;
    pub const COST_CONVERTING: u32 = 3;

    pub const fn identity() -> Self {
        Self {
            kind: ConversionKind::Identity,
            cost: Self::COST_EXACT,
        }
    }

    pub const fn widening() -> Self {
        Self {
            kind: ConversionKind::Widening,
            cost: Self::COST_WIDENING,
        }
    }

    pub const fn boxing() -> Self {
        Self {
            kind: ConversionKind::Boxing,
            cost: Self::COST_BOXING,
        }
    }

    pub const fn converting() -> Self {
        Self {
            kind: ConversionKind::Converting,
            cost: Self::COST_CONVERTING,
        }
    }

    /// Whether this is an exact match.
    pub fn is_exact(&self) -> bool {
        self.kind == ConversionKind::Identity
    }
}

/// What overload ranking knows about one call-site argument.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgInfo {
    /// Statically known type, `None` when unknown.
    pub hint: Option<HostType>,
    /// Passed with `(by-ref local)`.
    pub by_ref: bool,
}

impl ArgInfo {
    pub fn new(hint: Option<HostType>) -> Self {
        Self {
            hint,
            by_ref: false,
        }
    }

    pub fn by_ref(hint: Option<HostType>) -> Self {
        Self {
            hint,
            by_ref: true,
        }
    }
}

/// Find the conversion of an argument into a parameter, if any.
///
/// By-reference arguments only match by-reference parameters and vice
/// versa. Bool only matches bool. A reference-typed argument never matches
/// a primitive parameter.
pub fn find_conversion(
    oracle: &dyn MemberOracle,
    arg: &ArgInfo,
    param: &ParamDef,
) -> Option<Conversion> {
    if arg.by_ref != param.by_ref {
        return None;
    }
    let target = &param.param_type;

    let Some(hint) = &arg.hint else {
        // Untyped: boxes trivially into Object, casts into anything else.
        return Some(match target {
            HostType::Object => Conversion::boxing(),
            _ => Conversion::converting(),
        });
    };

    if hint == target {
        return Some(Conversion::identity());
    }

    match (hint, target) {
        // Void sources substitute the parameter's default.
        (HostType::Void, _) => Some(Conversion::converting()),
        (_, HostType::Void) => Some(Conversion::converting()),
        (HostType::Primitive(from), HostType::Primitive(to)) => {
            if is_widening(*from, *to) {
                Some(Conversion::widening())
            } else if is_convertible(*from, *to) {
                Some(Conversion::converting())
            } else {
                None
            }
        }
        (HostType::Primitive(_), HostType::Object) => Some(Conversion::boxing()),
        (HostType::Primitive(_), _) => None,
        // A statically untyped object is cast at run time.
        (HostType::Object, _) => Some(Conversion::converting()),
        (_, HostType::Object) => Some(Conversion::boxing()),
        (_, HostType::Primitive(_)) => None,
        (from, to) if oracle.is_assignable(from, to) => Some(Conversion::widening()),
        _ => None,
    }
}
