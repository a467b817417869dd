//! Main module defining the lexer: the UTF-8-safe, one-token-lookahead tokenizer.
//!
//! Grounded on `original_source/parsing.go`/`lexerStream.go` (the `govaluate` implementation
//! this language was distilled from) for the classification rules, state machine and date/time
//! formats, rewritten in the teacher's idiom: an explicit `InputStream` cursor (rhai's
//! `token.rs` keeps an analogous `Peekable<Chars>` + `Position` pair), a `Token`/`TokenKind` pair
//! instead of `interface{}`, and `Result`-based error propagation instead of `(T, error, bool)`.

use crate::ast::OperatorSymbol;
use crate::dynamic::Instant;
use crate::error::{EvalAltResult, Position};
use crate::fn_native::FunctionHandle;
use crate::immutable_string::ImmutableString;
use crate::StaticVec;
use std::borrow::Cow;
use std::collections::HashMap;

/// The kind of a single lexed token (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Numeric,
    StringLit,
    Boolean,
    Time,
    Pattern,
    Variable,
    Accessor,
    Function,
    Separator,
    Clause,
    ClauseClose,
    Prefix,
    Modifier,
    Logicalop,
    Comparator,
    Ternary,
    Unknown,
}

/// The value carried by a token: a number, string, boolean, instant, variable name, identifier
/// list (accessor path), function handle, or the symbol text itself (spec.md §3).
#[derive(Debug, Clone)]
pub enum TokenValue {
    Num(f64),
    Str(ImmutableString),
    Bool(bool),
    Time(Instant),
    Name(ImmutableString),
    Path(StaticVec<ImmutableString>),
    Func(FunctionHandle),
    Symbol(OperatorSymbol, ImmutableString),
}

/// A single lexed token together with its source position.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub pos: Position,
}

impl Token {
    /// Render this token's raw text back out, for diagnostics and the `tokens()` tooling API.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.value {
            TokenValue::Num(n) => n.to_string(),
            TokenValue::Str(s) => s.to_string(),
            TokenValue::Bool(b) => b.to_string(),
            TokenValue::Time(t) => t.to_rfc3339(),
            TokenValue::Name(s) => s.to_string(),
            TokenValue::Path(p) => p
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join("."),
            TokenValue::Func(f) => f.name().to_string(),
            TokenValue::Symbol(_, s) => s.to_string(),
        }
    }
}

/// A rune-indexed cursor over the source string that advances a rune-index and a byte-index in
/// lock-step, so token text can be sliced directly out of the source (zero-copy) whenever no
/// escape sequence forced a copy (spec.md §4.1).
pub(crate) struct InputStream<'a> {
    source: &'a str,
    chars: Vec<char>,
    /// `offsets[i]` is the byte offset of `chars[i]`; `offsets[chars.len()]` is `source.len()`.
    offsets: Vec<usize>,
    rune_pos: usize,
    pos: Position,
}

impl<'a> InputStream<'a> {
    fn new(source: &'a str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len() + 1);
        for (i, c) in source.char_indices() {
            chars.push(c);
            offsets.push(i);
        }
        offsets.push(source.len());
        Self {
            source,
            chars,
            offsets,
            rune_pos: 0,
            pos: Position::START,
        }
    }

    #[inline]
    fn can_read(&self) -> bool {
        self.rune_pos < self.chars.len()
    }

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.rune_pos).copied()
    }

    fn read_char(&mut self) -> Option<char> {
        let c = self.chars.get(self.rune_pos).copied()?;
        self.rune_pos += 1;
        if c == '\n' {
            self.pos.new_line();
        } else {
            self.pos.advance();
        }
        Some(c)
    }

    /// Rewind by `amount` runes.
    ///
    /// The upstream lexer this crate is grounded on (`original_source/lexerStream.go`) has two
    /// call sites that disagree on what a negative `amount` means: one treats it as "advance
    /// forward", the other mirrors it into a second rewind-backward. Per this crate's design
    /// decision (see `DESIGN.md`), a negative amount always means "advance forward" and only
    /// that path — the one exercised after reading a bracketed/quoted literal — is load-bearing.
    fn rewind(&mut self, amount: isize) {
        if amount < 0 {
            let fwd = (-amount) as usize;
            self.rune_pos = (self.rune_pos + fwd).min(self.chars.len());
        } else {
            self.rune_pos = self.rune_pos.saturating_sub(amount as usize);
        }
    }

    #[inline]
    fn byte_pos(&self) -> usize {
        self.offsets[self.rune_pos]
    }

    /// Zero-copy slice of the source from `start_rune` (inclusive) to the current position.
    fn slice_from(&self, start_rune: usize) -> &'a str {
        &self.source[self.offsets[start_rune]..self.byte_pos()]
    }
}

/// States the lexer's tiny finite-state machine can be in, named after the kind of token that
/// was last emitted. Each state constrains which kinds may legally follow it (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexerState {
    /// Start-of-expression / just after `(` or a separator / just after a prefix or binary
    /// operator: a primary expression or a prefix operator is expected next.
    Operand,
    /// Just emitted a value-producing token (literal, variable, accessor, function call,
    /// closing paren): a binary operator, ternary operator, separator, or `)` is expected next.
    Value,
}

impl LexerState {
    /// Can a token of `kind` legally follow this state?
    fn can_follow(self, kind: TokenKind) -> bool {
        match self {
            Self::Operand => !matches!(
                kind,
                TokenKind::Modifier
                    | TokenKind::Logicalop
                    | TokenKind::Comparator
                    | TokenKind::Ternary
                    | TokenKind::ClauseClose
                    | TokenKind::Separator
            ),
            Self::Value => !matches!(
                kind,
                TokenKind::Numeric
                    | TokenKind::StringLit
                    | TokenKind::Boolean
                    | TokenKind::Time
                    | TokenKind::Variable
                    | TokenKind::Accessor
                    | TokenKind::Function
                    | TokenKind::Clause
                    | TokenKind::Prefix
            ),
        }
    }

    /// Can the lexer classify a bare `-`/`!`/`~` run as `PREFIX` while in this state?
    fn allows_prefix(self) -> bool {
        matches!(self, Self::Operand)
    }

    fn after(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Modifier
            | TokenKind::Logicalop
            | TokenKind::Comparator
            | TokenKind::Ternary
            | TokenKind::Separator
            | TokenKind::Clause
            | TokenKind::Prefix => Self::Operand,
            _ => Self::Value,
        }
    }
}

fn prefix_symbol(s: &str) -> Option<OperatorSymbol> {
    Some(match s {
        "-" => OperatorSymbol::Negate,
        "!" => OperatorSymbol::Invert,
        "~" => OperatorSymbol::BitwiseNot,
        _ => return None,
    })
}

fn modifier_symbol(s: &str) -> Option<OperatorSymbol> {
    Some(match s {
        "+" => OperatorSymbol::Plus,
        "-" => OperatorSymbol::Minus,
        "*" => OperatorSymbol::Multiply,
        "/" => OperatorSymbol::Divide,
        "%" => OperatorSymbol::Modulus,
        "**" => OperatorSymbol::Exponent,
        "&" => OperatorSymbol::BitwiseAnd,
        "|" => OperatorSymbol::BitwiseOr,
        "^" => OperatorSymbol::BitwiseXor,
        "<<" => OperatorSymbol::BitwiseLshift,
        ">>" => OperatorSymbol::BitwiseRshift,
        _ => return None,
    })
}

fn logical_symbol(s: &str) -> Option<OperatorSymbol> {
    Some(match s {
        "&&" => OperatorSymbol::And,
        "||" => OperatorSymbol::Or,
        _ => return None,
    })
}

fn comparator_symbol(s: &str) -> Option<OperatorSymbol> {
    Some(match s {
        "==" => OperatorSymbol::Eq,
        "!=" => OperatorSymbol::Neq,
        ">" => OperatorSymbol::Gt,
        "<" => OperatorSymbol::Lt,
        ">=" => OperatorSymbol::Gte,
        "<=" => OperatorSymbol::Lte,
        "=~" => OperatorSymbol::Req,
        "!~" => OperatorSymbol::Nreq,
        "in" => OperatorSymbol::In,
        _ => return None,
    })
}

fn ternary_symbol(s: &str) -> Option<OperatorSymbol> {
    Some(match s {
        "?" => OperatorSymbol::TernaryTrue,
        ":" => OperatorSymbol::TernaryFalse,
        "??" => OperatorSymbol::Coalesce,
        _ => return None,
    })
}

fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}
fn is_numeric_start(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}
fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
/// Characters a bare symbol run stops at: anything alphanumeric, a quote, or one of the
/// single-character tokens that are classified outside the symbol path.
fn is_symbol_char(c: char) -> bool {
    !c.is_alphanumeric()
        && !c.is_whitespace()
        && c != '('
        && c != ')'
        && c != '['
        && c != ']'
        && c != ','
        && !is_quote(c)
}

/// Tokenize `source`, resolving `FUNCTION` tokens against `functions`.
///
/// Returns the token list or the first lex/balance error encountered (spec.md §4.1, §7).
pub(crate) fn tokenize(
    source: &str,
    functions: &HashMap<String, FunctionHandle, ahash::RandomState>,
) -> Result<Vec<Token>, EvalAltResult> {
    let mut stream = InputStream::new(source);
    let mut state = LexerState::Operand;
    let mut tokens = Vec::with_capacity(8);

    while stream.can_read() {
        let Some(token) = read_token(&mut stream, state, functions)? else {
            break;
        };
        if !state.can_follow(token.kind) {
            return Err(EvalAltResult::LexError(
                format!("Unexpected '{}'", token.text()),
                token.pos,
            ));
        }
        state = LexerState::after(token.kind);
        tokens.push(token);
    }

    check_balance(&tokens)?;

    Ok(tokens)
}

fn skip_whitespace(stream: &mut InputStream<'_>) {
    while let Some(c) = stream.peek() {
        if c.is_whitespace() {
            stream.read_char();
        } else {
            break;
        }
    }
}

fn read_token(
    stream: &mut InputStream<'_>,
    state: LexerState,
    functions: &HashMap<String, FunctionHandle, ahash::RandomState>,
) -> Result<Option<Token>, EvalAltResult> {
    skip_whitespace(stream);

    let Some(c) = stream.peek() else {
        return Ok(None);
    };
    let pos = stream.pos;

    // numeric constant: digit or '.', with a 0x... hex special case
    if is_numeric_start(c) {
        return Ok(Some(read_numeric(stream, pos)?));
    }

    if c == ',' {
        stream.read_char();
        return Ok(Some(Token {
            kind: TokenKind::Separator,
            value: TokenValue::Symbol(OperatorSymbol::Separate, ",".into()),
            pos,
        }));
    }

    // bracketed variable: `[anything but ]]`
    if c == '[' {
        stream.read_char();
        let start = stream.rune_pos;
        let mut closed = false;
        while let Some(c) = stream.peek() {
            if c == ']' {
                closed = true;
                break;
            }
            stream.read_char();
        }
        if !closed {
            return Err(EvalAltResult::LexError(
                "Unclosed parameter bracket".into(),
                pos,
            ));
        }
        let name = stream.slice_from(start).to_string();
        stream.read_char(); // consume ']'
        return Ok(Some(Token {
            kind: TokenKind::Variable,
            value: TokenValue::Name(name.into()),
            pos,
        }));
    }

    if c == '(' {
        stream.read_char();
        return Ok(Some(Token {
            kind: TokenKind::Clause,
            value: TokenValue::Symbol(OperatorSymbol::Noop, "(".into()),
            pos,
        }));
    }
    if c == ')' {
        stream.read_char();
        return Ok(Some(Token {
            kind: TokenKind::ClauseClose,
            value: TokenValue::Symbol(OperatorSymbol::Noop, ")".into()),
            pos,
        }));
    }

    // identifier: letter/underscore start
    if is_identifier_start(c) {
        return Ok(Some(read_identifier(stream, pos, functions)?));
    }

    // quoted string / time literal
    if is_quote(c) {
        return Ok(Some(read_string(stream, pos)?));
    }

    // everything else is a run of symbol characters
    read_symbol(stream, pos, state)
}

fn read_numeric(stream: &mut InputStream<'_>, pos: Position) -> Result<Token, EvalAltResult> {
    let start = stream.rune_pos;

    if stream.peek() == Some('0') {
        stream.read_char();
        if stream.peek() == Some('x') {
            stream.read_char();
            let hex_start = stream.rune_pos;
            while stream.peek().map(is_hex_digit).unwrap_or(false) {
                stream.read_char();
            }
            let hex_text = stream.slice_from(hex_start);
            if hex_text.is_empty() {
                return Err(EvalAltResult::LexError(
                    "Invalid hexadecimal literal".into(),
                    pos,
                ));
            }
            let n = u64::from_str_radix(hex_text, 16).map_err(|_| {
                EvalAltResult::LexError(
                    format!("Unable to parse hex value '{hex_text}' to u64"),
                    pos,
                )
            })?;
            return Ok(Token {
                kind: TokenKind::Numeric,
                value: TokenValue::Num(n as f64),
                pos,
            });
        }
        // not hex: rewind the one extra character we peeked past '0'
        stream.rewind(1);
    }

    while stream.peek().map(is_numeric_start).unwrap_or(false) {
        stream.read_char();
    }
    let text = stream.slice_from(start);
    let n: f64 = text
        .parse()
        .map_err(|_| EvalAltResult::LexError(format!("Unable to parse numeric value '{text}'"), pos))?;

    Ok(Token {
        kind: TokenKind::Numeric,
        value: TokenValue::Num(n),
        pos,
    })
}

/// Read a quoted or escaped run of characters until an unescaped occurrence of a character
/// satisfying `stop`. `\` always escapes the following character verbatim. Returns the text read
/// (not including the terminator) and whether the text required copying (i.e. contained an
/// escape), mirroring the "reuse the source string when possible" strategy of the lexer this is
/// grounded on.
fn read_escaped(stream: &mut InputStream<'_>, stop: impl Fn(char) -> bool) -> (Cow<'_, str>, bool) {
    let start = stream.rune_pos;
    let mut owned: Option<String> = None;
    let mut closed = false;

    while let Some(c) = stream.peek() {
        if c == '\\' {
            let copy = owned.get_or_insert_with(|| stream.slice_from(start).to_string());
            stream.read_char(); // consume backslash
            if let Some(escaped) = stream.read_char() {
                copy.push(escaped);
            }
            continue;
        }
        if stop(c) {
            closed = true;
            break;
        }
        if let Some(copy) = owned.as_mut() {
            copy.push(c);
        }
        stream.read_char();
    }

    let _ = closed;
    match owned {
        Some(s) => (Cow::Owned(s), true),
        None => (Cow::Borrowed(stream.slice_from(start)), false),
    }
}

fn read_string(stream: &mut InputStream<'_>, pos: Position) -> Result<Token, EvalAltResult> {
    let quote = stream.read_char().expect("caller peeked a quote");
    let start_rune = stream.rune_pos;
    let (text, _escaped) = read_escaped(stream, |c| c == quote);

    if stream.peek() != Some(quote) {
        let _ = start_rune;
        return Err(EvalAltResult::LexError("Unclosed string literal".into(), pos));
    }
    stream.read_char(); // consume closing quote

    let text = text.into_owned();
    if let Some(instant) = try_parse_time(&text) {
        return Ok(Token {
            kind: TokenKind::Time,
            value: TokenValue::Time(instant),
            pos,
        });
    }

    Ok(Token {
        kind: TokenKind::StringLit,
        value: TokenValue::Str(text.into()),
        pos,
    })
}

fn read_identifier(
    stream: &mut InputStream<'_>,
    pos: Position,
    functions: &HashMap<String, FunctionHandle, ahash::RandomState>,
) -> Result<Token, EvalAltResult> {
    let start = stream.rune_pos;
    while stream.peek().map(is_identifier_char).unwrap_or(false) {
        stream.read_char();
    }
    let text = stream.slice_from(start);

    if text.ends_with('.') {
        return Err(EvalAltResult::LexError(
            format!("Hanging accessor on token '{text}'"),
            pos,
        ));
    }

    match text {
        "true" => {
            return Ok(Token {
                kind: TokenKind::Boolean,
                value: TokenValue::Bool(true),
                pos,
            })
        }
        "false" => {
            return Ok(Token {
                kind: TokenKind::Boolean,
                value: TokenValue::Bool(false),
                pos,
            })
        }
        "in" | "IN" => {
            return Ok(Token {
                kind: TokenKind::Comparator,
                value: TokenValue::Symbol(OperatorSymbol::In, "in".into()),
                pos,
            })
        }
        _ => {}
    }

    if let Some(func) = functions.get(text) {
        return Ok(Token {
            kind: TokenKind::Function,
            value: TokenValue::Func(func.clone()),
            pos,
        });
    }

    if let Some(dot) = text.find('.') {
        if dot > 0 {
            let path: StaticVec<ImmutableString> = text.split('.').map(ImmutableString::from).collect();
            return Ok(Token {
                kind: TokenKind::Accessor,
                value: TokenValue::Path(path),
                pos,
            });
        }
    }

    Ok(Token {
        kind: TokenKind::Variable,
        value: TokenValue::Name(text.into()),
        pos,
    })
}

fn read_symbol(
    stream: &mut InputStream<'_>,
    pos: Position,
    state: LexerState,
) -> Result<Option<Token>, EvalAltResult> {
    let start = stream.rune_pos;
    while stream.peek().map(is_symbol_char).unwrap_or(false) {
        stream.read_char();
    }
    let text = stream.slice_from(start);
    if text.is_empty() {
        let bad = stream.read_char().unwrap();
        return Err(EvalAltResult::LexError(format!("Invalid token: '{bad}'"), pos));
    }

    if state.allows_prefix() {
        if let Some(sym) = prefix_symbol(text) {
            return Ok(Some(Token {
                kind: TokenKind::Prefix,
                value: TokenValue::Symbol(sym, text.into()),
                pos,
            }));
        }
    }
    if let Some(sym) = modifier_symbol(text) {
        return Ok(Some(Token {
            kind: TokenKind::Modifier,
            value: TokenValue::Symbol(sym, text.into()),
            pos,
        }));
    }
    if let Some(sym) = logical_symbol(text) {
        return Ok(Some(Token {
            kind: TokenKind::Logicalop,
            value: TokenValue::Symbol(sym, text.into()),
            pos,
        }));
    }
    if let Some(sym) = comparator_symbol(text) {
        return Ok(Some(Token {
            kind: TokenKind::Comparator,
            value: TokenValue::Symbol(sym, text.into()),
            pos,
        }));
    }
    if let Some(sym) = ternary_symbol(text) {
        return Ok(Some(Token {
            kind: TokenKind::Ternary,
            value: TokenValue::Symbol(sym, text.into()),
            pos,
        }));
    }

    Err(EvalAltResult::LexError(format!("Invalid token: '{text}'"), pos))
}

/// A single linear pass verifying CLAUSE/CLAUSE_CLOSE balance (spec.md §4.1).
fn check_balance(tokens: &[Token]) -> Result<(), EvalAltResult> {
    let mut depth: i64 = 0;
    for token in tokens {
        match token.kind {
            TokenKind::Clause => depth += 1,
            TokenKind::ClauseClose => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(EvalAltResult::ParseError(
                "Unbalanced parenthesis".into(),
                token.pos,
            ));
        }
    }
    if depth != 0 {
        return Err(EvalAltResult::ParseError(
            "Unbalanced parenthesis".into(),
            tokens.last().map_or(Position::NONE, |t| t.pos),
        ));
    }
    Ok(())
}

/// Date/time formats accepted by a quoted string literal (spec.md §6), tried in order.
const TIME_FORMATS: &[&str] = &[
    "%a %b %e %H:%M:%S %Y",        // ANSIC
    "%a %b %e %H:%M:%S %Z %Y",     // Unix date
    "%A %b %e %H:%M:%S %z %Y",     // Ruby date
    "%Y-%m-%dT%H:%M:%S%.f%:z",     // RFC3339 / RFC3339-nanosecond, explicit offset
    "%Y-%m-%dT%H:%M:%S%.fZ",       // RFC3339 / RFC3339-nanosecond, literal Z
    "%Y-%m-%d %H:%M:%S%:z",        // date + time + seconds + offset
    "%Y-%m-%d %H:%M:%S",           // date + time + seconds
    "%Y-%m-%d %H:%M",              // date + time (minutes)
    "%Y-%m-%d",                    // date only
    "%Y-%m-%dT%HZ%z",              // ISO8601 with hour
    "%Y-%m-%dT%H:%MZ%z",           // ISO8601 with minutes
    "%Y-%m-%dT%H:%M:%SZ%z",        // ISO8601 with seconds
    "%Y-%m-%dT%H:%M:%S%.fZ%z",     // ISO8601 with nanoseconds
];

/// Attempt to parse `candidate` as one of the accepted date/time literal formats.
///
/// Mirrors `original_source/parsing.go`'s `tryParseTime`: a quick pre-filter (must contain `:`
/// or `-`, since every accepted format has one of those) avoids running the full format list
/// against every plain string literal.
pub(crate) fn try_parse_time(candidate: &str) -> Option<Instant> {
    if !candidate.contains(':') && !candidate.contains('-') {
        return None;
    }

    for fmt in TIME_FORMATS {
        if let Ok(dt) = chrono::DateTime::parse_from_str(candidate, fmt) {
            return Some(dt);
        }
    }

    // Formats with no explicit offset parse as naive; assume UTC, matching the "Z" in their name.
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%I:%M%p",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(candidate, fmt) {
            return Some(chrono::DateTime::<chrono::FixedOffset>::from_utc(
                ndt,
                chrono::FixedOffset::east_opt(0).unwrap(),
            ));
        }
        if let Ok(nd) = chrono::NaiveDate::parse_from_str(candidate, fmt) {
            let ndt = nd.and_hms_opt(0, 0, 0).unwrap();
            return Some(chrono::DateTime::<chrono::FixedOffset>::from_utc(
                ndt,
                chrono::FixedOffset::east_opt(0).unwrap(),
            ));
        }
        if let Ok(nt) = chrono::NaiveTime::parse_from_str(candidate, fmt) {
            let ndt = chrono::NaiveDate::from_ymd_opt(1, 1, 1).unwrap().and_time(nt);
            return Some(chrono::DateTime::<chrono::FixedOffset>::from_utc(
                ndt,
                chrono::FixedOffset::east_opt(0).unwrap(),
            ));
        }
    }

    None
}
