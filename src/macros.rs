//! Utility macros shared by the regex-driven lexers.
//!
//! - `MK_TOKEN!` - Creates a Token instance
//! - `MK_DEFAULT_HANDLER!` - Creates a handler for fixed punctuation tokens
//!
//! Both expand against whatever `Token` and `Lexer` types are in scope at
//! the call site, so the type-tag lexer and the tree reader can share them.

/// Creates a Token instance.
///
/// # Arguments
///
/// * `$kind` - The TokenKind
/// * `$value` - The token's string value
/// * `$offset` - The byte offset of the token in the lexed text
#[macro_export]
macro_rules! MK_TOKEN {
    ($kind:expr, $value:expr, $offset:expr) => {
        Token {
            kind: $kind,
            value: $value,
            offset: $offset,
        }
    };
}

/// Creates a lexer handler for a fixed punctuation token.
///
/// Generates a handler that pushes a token with the given kind and
/// advances the lexer by the literal's length.
///
/// # Example
///
/// ```ignore
/// RegexPattern {
///     regex: Regex::new("^=>").unwrap(),
///     handler: MK_DEFAULT_HANDLER!(TokenKind::HashRocket, "=>"),
/// }
/// ```
#[macro_export]
macro_rules! MK_DEFAULT_HANDLER {
    ($kind:expr, $value:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| {
            let offset = lexer.pos;
            lexer.push(MK_TOKEN!($kind, String::from($value), offset));
            lexer.advance_n($value.len());
        }
    };
}
