//! logos-based selector tokenizer.
//!
//! The grammar is one alternation of seven token forms. Each form starts with
//! a distinct character class, so logos' longest-match rule never has to
//! arbitrate between them:
//!
//! | Form | Token |
//! |---|---|
//! | `ui-card` | [`Token::Tag`] |
//! | `#main` | [`Token::Id`] |
//! | `.card` | [`Token::Class`] |
//! | `[role="group"]`, `[hidden]`, `[lang\|=en]` | [`Token::Attribute`] |
//! | newline run + tab run | [`Token::Nest`] (depth = tab count) |
//! | whitespace run (no newline) | [`Token::Child`] |
//! | `"text"`, `'text'` | [`Token::Text`] |
//!
//! Scanning stops silently at the first character no form accepts; the
//! unreadable remainder is dropped.

use logos::Logos;

/// Selector token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(subpattern dq = r#""([^"\\]|\\.)*""#)]
#[logos(subpattern sq = r#"'([^'\\]|\\.)*'"#)]
#[logos(subpattern attr_name = r"[a-zA-Z_:][a-zA-Z0-9_:.-]*")]
pub enum Token {
    /// Bare identifier: element tag name.
    #[regex(r"[a-zA-Z][a-zA-Z0-9_-]*", |lex| lex.slice().to_owned())]
    Tag(String),

    /// `#name`
    #[regex(r"#[a-zA-Z0-9_-]+", |lex| lex.slice()[1..].to_owned())]
    Id(String),

    /// `.name`
    #[regex(r"\.[a-zA-Z0-9_-]+", |lex| lex.slice()[1..].to_owned())]
    Class(String),

    /// `[name]` or `[name op value]`.
    #[regex(
        r#"\[(?&attr_name)([*$|~^]?=((?&dq)|(?&sq)|[^\]"']*))?\]"#,
        |lex| AttributeToken::from_source(lex.slice())
    )]
    Attribute(AttributeToken),

    /// Newline run followed by a tab run; carries the tab count.
    #[regex(r"\n+\t*", |lex| lex.slice().bytes().filter(|&b| b == b'\t').count())]
    Nest(usize),

    /// Whitespace run not starting with a newline.
    #[regex(r"[ \t\r\f]+")]
    Child,

    /// Quoted literal, unescaped.
    #[regex(r#"(?&dq)|(?&sq)"#, |lex| unquote(lex.slice()))]
    Text(String),
}

/// Attribute comparison operator.
///
/// Only the presence of an operator is recorded; construction always sets the
/// attribute to the literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOperator {
    /// `=`
    Equals,
    /// `*=`
    Contains,
    /// `$=`
    EndsWith,
    /// `|=`
    DashMatch,
    /// `~=`
    Includes,
    /// `^=`
    StartsWith,
}

impl AttributeOperator {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            '*' => Some(Self::Contains),
            '$' => Some(Self::EndsWith),
            '|' => Some(Self::DashMatch),
            '~' => Some(Self::Includes),
            '^' => Some(Self::StartsWith),
            _ => None,
        }
    }
}

/// Payload of a [`Token::Attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeToken {
    pub name: String,
    /// `None` for the bare `[name]` form.
    pub operator: Option<AttributeOperator>,
    /// Unquoted, unescaped value; empty for `[name]`.
    pub value: String,
}

impl AttributeToken {
    /// Split a matched `[...]` slice into its parts.
    fn from_source(source: &str) -> Self {
        let inner = &source[1..source.len() - 1];
        let Some(split) = inner.find(['*', '$', '|', '~', '^', '=']) else {
            return Self {
                name: inner.to_owned(),
                operator: None,
                value: String::new(),
            };
        };
        let name = inner[..split].to_owned();
        let rest = &inner[split..];
        let (operator, raw) = match rest.chars().next().and_then(AttributeOperator::from_prefix) {
            Some(op) => (op, &rest[2..]),
            None => (AttributeOperator::Equals, &rest[1..]),
        };
        let value = if raw.starts_with(['"', '\'']) {
            unquote(raw)
        } else {
            raw.to_owned()
        };
        Self {
            name,
            operator: Some(operator),
            value,
        }
    }
}

/// Strip the surrounding quotes and resolve backslash escapes (`\x` → `x`).
fn unquote(quoted: &str) -> String {
    let body = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Tokenize a selector, stopping at the first unreadable character.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                let offset = lexer.span().start;
                tracing::debug!(offset, rest = &input[offset..], "selector truncated");
                break;
            }
        }
    }
    tokens
}
