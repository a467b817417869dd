//! The [`Value`] type: the dynamically-typed union every stage operator consumes and produces.

use crate::immutable_string::ImmutableString;
use crate::reflect::HostIntrospect;
use std::fmt;
use std::sync::Arc;

/// An instant in time, produced by parsing a recognised date/time literal (see
/// [`crate::token::try_parse_time`]). Two instants compare by their UTC timestamp regardless of
/// the offset they were originally written with.
pub type Instant = chrono::DateTime<chrono::FixedOffset>;

/// A pre-compiled regular expression, produced by the planner from a `=~`/`!~` string literal,
/// or compiled on the fly when the right-hand side is not a literal.
pub type Pattern = Arc<regex::Regex>;

/// The dynamically-typed value every [`Stage`][crate::ast::Stage] operator works with.
///
/// Cloning a [`Value`] never deep-copies a string, array, pattern or host value — all of those
/// variants are reference-counted — which matters because a single compiled expression may
/// evaluate the same literal or variable lookup millions of times.
#[derive(Clone, Debug)]
pub enum Value {
    /// `true` / `false`.
    Bool(bool),
    /// Every number in this language is a 64-bit float; integer-kinded host values are widened
    /// to this on the way in (see the `From<i64>` etc. impls below).
    Num(f64),
    /// A string literal or the result of string concatenation.
    Str(ImmutableString),
    /// A parsed date/time literal.
    Time(Instant),
    /// A compiled regular expression, the right-hand side of a planned `=~`/`!~` comparison.
    Regex(Pattern),
    /// An array, currently producible only as the right-hand side of `in` via a parenthesised,
    /// comma-separated literal list, or returned from a host function/method.
    Array(Arc<Vec<Value>>),
    /// An opaque host value whose fields/methods are reached through [`HostIntrospect`].
    Host(Arc<dyn HostIntrospect>),
}

impl Value {
    /// A short, human-readable name for this value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Num(_) => "number",
            Self::Str(_) => "string",
            Self::Time(_) => "time",
            Self::Regex(_) => "pattern",
            Self::Array(_) => "array",
            Self::Host(_) => "object",
        }
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Num(_))
    }
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::Str(_))
    }
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
    /// True for a [`Value::Str`] or an already-compiled [`Value::Regex`] — the two right-hand
    /// shapes the regex comparators accept.
    #[must_use]
    pub const fn is_string_or_pattern(&self) -> bool {
        matches!(self, Self::Str(_) | Self::Regex(_))
    }

    /// Extract the bool, assuming the caller already type-checked.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
    /// Extract the 64-bit float, assuming the caller already type-checked.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }
    /// Extract the string slice, assuming the caller already type-checked.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
    /// Extract the array slice, assuming the caller already type-checked.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// Truncate a numeric value to a signed 64-bit integer, per the spec's rule that `%`, `**`,
    /// shifts and bitwise operators operate on truncated operands before widening the result
    /// back to float.
    #[must_use]
    pub fn as_truncated_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Self::Regex(p) => write!(f, "/{}/", p.as_str()),
            Self::Array(a) => {
                f.write_str("(")?;
                for (i, v) in a.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Self::Host(h) => write!(f, "{h:?}"),
        }
    }
}

/// Value-level equality, used by `==`, `!=` and the right-hand-side scan of `in`.
///
/// Numbers compare by value; two values of different runtime kinds are always unequal rather
/// than a type error, matching typical dynamically-typed-language `==` semantics.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Num(a), Self::Num(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a.as_str() == b.as_str(),
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                #[inline(always)]
                fn from(v: $t) -> Self {
                    Self::Num(v as f64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    #[inline(always)]
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
impl From<&str> for Value {
    #[inline(always)]
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}
impl From<String> for Value {
    #[inline(always)]
    fn from(v: String) -> Self {
        Self::Str(v.into())
    }
}
impl From<ImmutableString> for Value {
    #[inline(always)]
    fn from(v: ImmutableString) -> Self {
        Self::Str(v)
    }
}
impl From<Instant> for Value {
    #[inline(always)]
    fn from(v: Instant) -> Self {
        Self::Time(v)
    }
}
impl From<Vec<Value>> for Value {
    #[inline(always)]
    fn from(v: Vec<Value>) -> Self {
        Self::Array(Arc::new(v))
    }
}
