//! Identifier handling helpers shared by the grammar and the synthesizer.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(quote_with("t", '"', '"'), "\"t\"");
//! assert_eq!(quote_with("a]b", '[', ']'), "[a]]b]");
//! assert_eq!(normalize_identifier("`orders`"), "orders");
//! ```

use sqlparser::tokenizer::{Token, Word};

use crate::dialect::Dialect;

/// Wraps `name` in the given delimiters, doubling any embedded `close`.
pub fn quote_with(name: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for ch in name.chars() {
        if ch == close {
            quoted.push(close);
        }
        quoted.push(ch);
    }
    quoted.push(close);
    quoted
}

/// Strips one level of `[]`, `""` or backtick delimiters from an identifier.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
/// assert_eq!(normalize_identifier("\"MyColumn\""), "MyColumn");
/// assert_eq!(normalize_identifier("dbo"), "dbo");
/// ```
pub fn normalize_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    let stripped = match (trimmed.chars().next(), trimmed.chars().last()) {
        (Some('['), Some(']')) | (Some('"'), Some('"')) | (Some('`'), Some('`'))
            if trimmed.len() >= 2 =>
        {
            &trimmed[1..trimmed.len() - 1]
        }
        _ => trimmed,
    };
    stripped.to_string()
}

/// The name a Word denotes in `dialect`.
///
/// Quoted identifiers are taken literally; unquoted ones are folded to the
/// case the engine stores them in.
pub fn identifier_name(word: &Word, dialect: Dialect) -> String {
    if word.quote_style.is_some() {
        word.value.clone()
    } else {
        dialect.capabilities().identifier_case.fold(&word.value)
    }
}

/// Returns the identifier a token can stand for, if any.
///
/// MySQL tokenizes `"name"` as a string literal; it is still accepted as an
/// identifier there because `ANSI_QUOTES` mode treats it as one.
pub fn token_identifier(token: &Token, dialect: Dialect) -> Option<String> {
    match token {
        Token::Word(w) => Some(identifier_name(w, dialect)),
        Token::DoubleQuotedString(s) if dialect.is_mysql_family() => Some(s.clone()),
        _ => None,
    }
}

/// Whether `word` is the unquoted keyword `keyword` (case-insensitive).
#[inline]
pub fn is_bare_word(word: &Word, keyword: &str) -> bool {
    word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
}
