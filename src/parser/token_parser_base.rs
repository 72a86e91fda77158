//! Base token parser providing common helper methods for DML parsing.
//!
//! `TokenParser` walks a slice of [`SourceToken`]s belonging to one statement.
//! Whitespace and comments are trivia: every `check_*`/`expect_*` helper looks
//! at the current token only, so callers skip trivia explicitly, the same way
//! they would skip whitespace in hand-written SQL grammars.
//!
//! ## Usage
//!
//! ```ignore
//! let mut parser = TokenParser::new(&tokens, source, dialect);
//! parser.skip_trivia();
//! if parser.expect_keyword(Keyword::DELETE).is_none() {
//!     return Ok(Analysis::NotApplicable);
//! }
//! ```

use std::ops::Range;

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use super::identifier_utils::{is_bare_word, token_identifier};
use super::lexer::SourceToken;
use crate::dialect::Dialect;

/// Cursor over the tokens of a single statement.
pub struct TokenParser<'a> {
    tokens: &'a [SourceToken],
    source: &'a str,
    dialect: Dialect,
    pos: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(tokens: &'a [SourceToken], source: &'a str, dialect: Dialect) -> Self {
        Self {
            tokens,
            source,
            dialect,
            pos: 0,
        }
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move past the last token.
    #[inline]
    pub fn skip_to_end(&mut self) {
        self.pos = self.tokens.len();
    }

    /// Get the underlying tokens slice.
    #[inline]
    pub fn tokens(&self) -> &'a [SourceToken] {
        self.tokens
    }

    #[inline]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    // ========================================================================
    // Token access
    // ========================================================================

    #[inline]
    pub fn current_token(&self) -> Option<&'a SourceToken> {
        self.tokens.get(self.pos)
    }

    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Skip whitespace and comment tokens.
    pub fn skip_trivia(&mut self) {
        while let Some(token) = self.current_token() {
            if !token.is_trivia() {
                break;
            }
            self.advance();
        }
    }

    /// Advance past the current token and any trivia that follows it.
    pub fn bump(&mut self) {
        self.advance();
        self.skip_trivia();
    }

    // ========================================================================
    // Token type checks
    // ========================================================================

    /// Check if current token is a specific (unquoted) keyword.
    #[inline]
    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(
            self.current_token().map(|t| &t.token),
            Some(Token::Word(w)) if w.keyword == keyword && w.quote_style.is_none()
        )
    }

    /// Check if current token is an unquoted word matching case-insensitively.
    ///
    /// Used for dialect words sqlparser doesn't carry as keywords
    /// (e.g. `QUICK`, `OUTPUT`, `GO`).
    #[inline]
    pub fn check_word_ci(&self, word: &str) -> bool {
        matches!(
            self.current_token().map(|t| &t.token),
            Some(Token::Word(w)) if is_bare_word(w, word)
        )
    }

    /// Check if current token is any of the given unquoted words.
    pub fn check_any_word_ci(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.check_word_ci(w))
    }

    /// Check if current token matches a specific token type (by discriminant).
    #[inline]
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token().is_some_and(|token| {
            std::mem::discriminant(&token.token) == std::mem::discriminant(expected)
        })
    }

    // ========================================================================
    // Expect methods (check and advance past trailing trivia)
    // ========================================================================

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Option<()> {
        if self.check_keyword(keyword) {
            self.bump();
            Some(())
        } else {
            None
        }
    }

    pub fn expect_token(&mut self, expected: &Token) -> Option<()> {
        if self.check_token(expected) {
            self.bump();
            Some(())
        } else {
            None
        }
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Parse one identifier, returning its name and source range.
    ///
    /// Quoted identifiers lose their delimiters; unquoted ones are case-folded
    /// per dialect.
    pub fn parse_identifier(&mut self) -> Option<(String, Range<usize>)> {
        let token = self.current_token()?;
        let name = token_identifier(&token.token, self.dialect)?;
        self.advance();
        Some((name, token.range.clone()))
    }

    // ========================================================================
    // Source text
    // ========================================================================

    /// Byte offset where the current token starts (source length at end).
    pub fn offset(&self) -> usize {
        self.current_token()
            .map_or_else(|| self.end_offset(), |t| t.range.start)
    }

    /// End offset of the last non-trivia token before the cursor.
    pub fn last_significant_end(&self) -> usize {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !t.is_trivia())
            .map_or_else(|| self.offset(), |t| t.range.end)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.range.end)
    }

    pub fn text(&self, range: Range<usize>) -> &'a str {
        &self.source[range]
    }

    // ========================================================================
    // Utility methods
    // ========================================================================

    /// Skip a parenthesized expression, handling nested parentheses.
    ///
    /// Position should be at the opening parenthesis. After this call,
    /// position will be after the closing parenthesis.
    pub fn skip_parenthesized(&mut self) {
        if !self.check_token(&Token::LParen) {
            return;
        }

        let mut depth = 0;
        while !self.is_at_end() {
            if self.check_token(&Token::LParen) {
                depth += 1;
            } else if self.check_token(&Token::RParen) {
                depth -= 1;
                if depth == 0 {
                    self.advance();
                    return;
                }
            }
            self.advance();
        }
    }

    /// Advance until `stop` holds for a token outside any parentheses.
    ///
    /// The stopping token is not consumed. Returns `true` if a stop token was
    /// found, `false` if the end was reached.
    pub fn skip_until_top_level<F>(&mut self, stop: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        while !self.is_at_end() {
            if self.check_token(&Token::LParen) {
                self.skip_parenthesized();
                continue;
            }
            if !self.current_token().is_some_and(SourceToken::is_trivia) && stop(self) {
                return true;
            }
            self.advance();
        }
        false
    }
}
