//! Source-mapped tokenizing
//!
//! sqlparser reports token locations as 1-based line/column pairs. Everything
//! downstream needs byte offsets (to copy clause text verbatim) and 0-based
//! columns (for reported spans), so each token is paired with its byte range
//! here, once, while walking the source in step with the tokenizer.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use sqlparser::tokenizer::{Location, Token, Tokenizer, Whitespace};

use crate::dialect::Dialect;
use crate::error::TransformError;

/// A location in the original script.
///
/// `line` is 1-based, `column` is the 0-based count of characters from the
/// start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token together with the bytes it covers in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceToken {
    pub token: Token,
    pub range: Range<usize>,
}

impl SourceToken {
    /// Whitespace and comments.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self.token, Token::Whitespace(_))
    }

    /// True for tokens whose text ends a line (newlines, `--` comments).
    #[inline]
    pub fn ends_line(&self) -> bool {
        match &self.token {
            Token::Whitespace(Whitespace::Newline) => true,
            Token::Whitespace(Whitespace::SingleLineComment { comment, .. }) => {
                comment.ends_with('\n')
            }
            _ => false,
        }
    }

    /// Spaces and tabs only; newlines and comments are excluded.
    #[inline]
    pub fn is_inline_space(&self) -> bool {
        matches!(
            self.token,
            Token::Whitespace(Whitespace::Space) | Token::Whitespace(Whitespace::Tab)
        )
    }
}

/// Tokenize `source` with the lexical rules of `dialect`.
///
/// Unterminated strings, quoted identifiers and block comments are reported
/// as [`TransformError::MalformedScript`].
pub fn lex(source: &str, dialect: Dialect) -> Result<Vec<SourceToken>, TransformError> {
    let tokens = Tokenizer::new(dialect.tokenizer_dialect(), source)
        .tokenize_with_location()
        .map_err(|e| TransformError::MalformedScript {
            line: e.location.line as usize,
            column: (e.location.column as usize).saturating_sub(1),
            message: e.message,
        })?;

    let mut cursor = LocationCursor::new(source);
    let mut located = Vec::with_capacity(tokens.len());
    for token in tokens {
        let start = cursor.seek(token.span.start);
        let end = cursor.seek(token.span.end);
        located.push(SourceToken {
            token: token.token,
            range: start..end,
        });
    }

    Ok(located)
}

/// Walks the source forward, converting tokenizer locations to byte offsets.
///
/// Counts lines and columns exactly like the tokenizer does: a `\n` starts a
/// new line at column 1, every other character advances the column by one.
struct LocationCursor<'a> {
    source: &'a str,
    offset: usize,
    line: u64,
    column: u64,
}

impl<'a> LocationCursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn seek(&mut self, target: Location) -> usize {
        let target = (target.line as u64, target.column as u64);
        while (self.line, self.column) < target {
            let Some(ch) = self.source[self.offset..].chars().next() else {
                break;
            };
            self.offset += ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset
    }
}

/// Byte offset to [`Position`] lookup for one source text.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Position of the character starting at `offset`.
    pub fn position(&self, source: &str, offset: usize) -> Position {
        let line_index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[line_index];
        Position {
            line: line_index + 1,
            column: source[line_start..offset].chars().count(),
        }
    }

    /// Position of the last character of the non-empty `range`.
    pub fn last_char_position(&self, source: &str, range: &Range<usize>) -> Position {
        let last_len = source[range.clone()]
            .chars()
            .next_back()
            .map_or(0, char::len_utf8);
        self.position(source, range.end - last_len)
    }
}
