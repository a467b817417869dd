//! Module containing error definitions produced by the lexer, parser, planner and evaluator.

use std::error::Error;
use std::fmt;

/// A location (line number + character position) in the source expression.
///
/// # Limitations
///
/// Both line number and character position have 16-bit resolution, meaning they go up to a
/// maximum of 65,535 lines and 65,535 characters per line. Advancing beyond that has no effect.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Copy)]
pub struct Position {
    line: u16,
    pos: u16,
}

impl Position {
    /// A [`Position`] representing no position.
    pub const NONE: Self = Self { line: 0, pos: 0 };
    /// A [`Position`] representing the first position.
    pub const START: Self = Self { line: 1, pos: 0 };

    /// Create a new [`Position`]. `line` must not be zero.
    #[inline]
    #[must_use]
    pub fn new(line: u16, pos: u16) -> Self {
        assert!(line != 0, "line cannot be zero");
        Self { line, pos }
    }
    /// Is this [`Position::NONE`]?
    #[inline(always)]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.line == 0
    }
    /// The 1-based line number, or [`None`] if this is [`Position::NONE`].
    #[inline]
    #[must_use]
    pub const fn line(self) -> Option<usize> {
        if self.is_none() {
            None
        } else {
            Some(self.line as usize)
        }
    }
    /// The 1-based character position, or [`None`] at beginning-of-line.
    #[inline]
    #[must_use]
    pub const fn position(self) -> Option<usize> {
        if self.pos == 0 {
            None
        } else {
            Some(self.pos as usize)
        }
    }
    #[inline]
    pub(crate) fn advance(&mut self) {
        if !self.is_none() {
            self.pos = self.pos.saturating_add(1);
        }
    }
    #[inline]
    pub(crate) fn new_line(&mut self) {
        if !self.is_none() {
            self.line = self.line.saturating_add(1);
            self.pos = 0;
        }
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "line {}, position {}", self.line, self.pos)
        }
    }
}

/// Compilation and evaluation error.
///
/// The substrings embedded in the `Display` output of the `TypeError`, `NameError`,
/// `AccessError`, `ArityError` and `CoercionError` variants are part of the public contract:
/// callers may match on them.
#[derive(Debug)]
#[non_exhaustive]
pub enum EvalAltResult {
    /// Invalid token, unclosed bracket/string, or a hanging accessor. Wrapped value is a
    /// human-readable description.
    LexError(String, Position),
    /// Unbalanced parentheses, unexpected token, or missing operand.
    ParseError(String, Position),
    /// A regex literal failed to compile during planning.
    PlanError(String, Position),
    /// Operand(s) of an operator failed its type-check. Wrapped value is the rendered message,
    /// which contains one of the four contractual templates from the type table.
    TypeError(String, Position),
    /// Reference to a variable, or a field/method name, that does not exist. Wrapped value is
    /// the rendered message.
    NameError(String, Position),
    /// Attempted to reflectively access a private/unexported host member. Wrapped value is the
    /// rendered message.
    AccessError(String, Position),
    /// Too few or too many arguments passed to a function or method call.
    ArityError(String, Position),
    /// A method argument could not be coerced to the parameter's type.
    CoercionError(String, Position),
    /// Passthrough of an error returned by a host function or method.
    HostError(Box<dyn Error + Send + Sync>, Position),
}

impl fmt::Display for EvalAltResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexError(s, _) => write!(f, "{s}"),
            Self::ParseError(s, _) => write!(f, "{s}"),
            Self::PlanError(s, _) => write!(f, "{s}"),
            Self::TypeError(s, _) => write!(f, "{s}"),
            Self::NameError(s, _) => write!(f, "{s}"),
            Self::AccessError(s, _) => write!(f, "{s}"),
            Self::ArityError(s, _) => write!(f, "{s}"),
            Self::CoercionError(s, _) => write!(f, "{s}"),
            Self::HostError(err, _) => write!(f, "{err}"),
        }?;

        if !self.position().is_none() {
            write!(f, " ({})", self.position())?;
        }

        Ok(())
    }
}

impl Error for EvalAltResult {}

impl EvalAltResult {
    /// The [`Position`] at which this error occurred, if known.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::LexError(_, pos)
            | Self::ParseError(_, pos)
            | Self::PlanError(_, pos)
            | Self::TypeError(_, pos)
            | Self::NameError(_, pos)
            | Self::AccessError(_, pos)
            | Self::ArityError(_, pos)
            | Self::CoercionError(_, pos)
            | Self::HostError(_, pos) => *pos,
        }
    }
    /// Build a [`TypeError`][Self::TypeError] from one of the contractual templates and the
    /// class name(s) that violated it.
    #[must_use]
    pub(crate) fn type_error(detail: &str, template: &str, pos: Position) -> Self {
        Self::TypeError(format!("{detail} {template}"), pos)
    }
}

impl From<EvalAltResult> for Box<EvalAltResult> {
    #[inline(always)]
    fn from(err: EvalAltResult) -> Self {
        Box::new(err)
    }
}
