//! Script splitting
//!
//! A script is tokenized once up front (which is where unterminated quoting
//! is detected), then statements are cut lazily at terminators: `;`, plus the
//! dialect's line-level batch separator (`GO` for SQL Server, `/` for Oracle).
//! Terminators inside strings, quoted identifiers and comments are never seen
//! because they are part of a single token.

use std::ops::Range;

use sqlparser::tokenizer::Token;

use super::identifier_utils::is_bare_word;
use super::lexer::{lex, LineMap, Position, SourceToken};
use crate::dialect::{BatchSeparator, Dialect};
use crate::error::TransformError;

/// One statement of a script.
#[derive(Debug, Clone)]
pub struct Statement<'a> {
    /// 1-based ordinal among the statements of the script
    pub ordinal: usize,
    /// Statement text, from its first to its last significant character
    pub text: &'a str,
    /// Byte range of `text` within the script
    pub range: Range<usize>,
    /// Position of the first significant character
    pub start: Position,
    /// Position of the last significant character (inclusive)
    pub end: Position,
    tokens: &'a [SourceToken],
}

impl<'a> Statement<'a> {
    /// Tokens of the statement, trimmed of surrounding trivia.
    pub fn tokens(&self) -> &'a [SourceToken] {
        self.tokens
    }
}

/// A tokenized script, ready to be iterated statement by statement.
#[derive(Debug)]
pub struct SplitScript<'a> {
    source: &'a str,
    dialect: Dialect,
    tokens: Vec<SourceToken>,
    lines: LineMap,
}

/// Split `script` into statements using the lexical rules of `dialect`.
///
/// Fails with [`TransformError::MalformedScript`] if the script contains an
/// unterminated string, quoted identifier or comment.
pub fn split(script: &str, dialect: Dialect) -> Result<SplitScript<'_>, TransformError> {
    let tokens = lex(script, dialect)?;
    Ok(SplitScript {
        source: script,
        dialect,
        tokens,
        lines: LineMap::new(script),
    })
}

impl<'a> SplitScript<'a> {
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// A fresh iterator over the statements; can be called any number of times.
    pub fn iter(&self) -> Statements<'_> {
        Statements {
            script: self,
            pos: 0,
            ordinal: 0,
        }
    }

    /// Number of tokens making up the terminator at `idx`, if there is one.
    fn terminator_len(&self, idx: usize) -> Option<usize> {
        let token = &self.tokens[idx];
        if matches!(token.token, Token::SemiColon) {
            return Some(1);
        }

        let is_separator = match (self.dialect.capabilities().batch_separator, &token.token) {
            (Some(BatchSeparator::Go), Token::Word(w)) => is_bare_word(w, "GO"),
            (Some(BatchSeparator::Slash), Token::Div) => true,
            _ => false,
        };
        if !is_separator || !self.starts_line(idx) {
            return None;
        }

        // GO must be on its own line; `GO;` is accepted as well
        let mut end = idx + 1;
        while self.tokens.get(end).is_some_and(SourceToken::is_inline_space) {
            end += 1;
        }
        match self.tokens.get(end) {
            None => Some(end - idx),
            Some(t) if t.ends_line() => Some(end - idx),
            Some(t) if matches!(t.token, Token::SemiColon) => Some(end + 1 - idx),
            _ => None,
        }
    }

    fn starts_line(&self, idx: usize) -> bool {
        self.tokens[..idx]
            .iter()
            .rev()
            .find(|t| !t.is_inline_space())
            .map_or(true, SourceToken::ends_line)
    }
}

impl<'s, 'a> IntoIterator for &'s SplitScript<'a> {
    type Item = Statement<'s>;
    type IntoIter = Statements<'s>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the statements of a [`SplitScript`].
pub struct Statements<'s> {
    script: &'s SplitScript<'s>,
    pos: usize,
    ordinal: usize,
}

impl<'s> Iterator for Statements<'s> {
    type Item = Statement<'s>;

    fn next(&mut self) -> Option<Self::Item> {
        let script = self.script;
        let tokens = &script.tokens;

        while self.pos < tokens.len() {
            let begin = self.pos;
            let mut end = begin;
            let mut terminator = 0;
            while end < tokens.len() {
                if let Some(len) = script.terminator_len(end) {
                    terminator = len;
                    break;
                }
                end += 1;
            }
            self.pos = end + terminator;

            let body = &tokens[begin..end];
            let Some(first) = body.iter().position(|t| !t.is_trivia()) else {
                continue;
            };
            let last = body.iter().rposition(|t| !t.is_trivia()).unwrap_or(first);
            let body = &body[first..=last];

            let range = body[0].range.start..body[body.len() - 1].range.end;
            self.ordinal += 1;
            return Some(Statement {
                ordinal: self.ordinal,
                text: &script.source[range.clone()],
                start: script.lines.position(script.source, range.start),
                end: script.lines.last_char_position(script.source, &range),
                range,
                tokens: body,
            });
        }

        None
    }
}
