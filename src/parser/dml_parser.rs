//! DELETE/UPDATE recognition
//!
//! Recognizes the backup-eligible DML shapes and extracts a [`DmlDescriptor`]:
//!
//! ```text
//! DELETE FROM t [USING t2, ...] [WHERE cond] [ORDER BY ... LIMIT ...]
//! UPDATE t SET ... [FROM t2, ...] [WHERE cond] [ORDER BY ... LIMIT ...]
//! ```
//!
//! Clause text (auxiliary tables, filter, ORDER BY/LIMIT tail) is sliced from
//! the source verbatim; predicates are never re-rendered.

use std::ops::Range;

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use super::identifier_utils::is_bare_word;
use super::lexer::{lex, LineMap, SourceToken};
use super::token_parser_base::TokenParser;
use crate::dialect::Dialect;
use crate::error::{StatementFailure, TransformError};

/// Words that end a table reference instead of naming its alias.
const ALIAS_TERMINATORS: &[&str] = &[
    "WHERE",
    "USING",
    "SET",
    "FROM",
    "ORDER",
    "LIMIT",
    "RETURNING",
    "OUTPUT",
    "JOIN",
    "INNER",
    "LEFT",
    "RIGHT",
    "FULL",
    "CROSS",
    "NATURAL",
    "OUTER",
    "STRAIGHT_JOIN",
    "ON",
    "WITH",
    "PARTITION",
];

/// Words that start a join inside an auxiliary clause.
const JOIN_WORDS: &[&str] = &[
    "JOIN",
    "INNER",
    "LEFT",
    "RIGHT",
    "FULL",
    "CROSS",
    "NATURAL",
    "OUTER",
    "STRAIGHT_JOIN",
];

const CTE_DML_MESSAGE: &str = "DELETE/UPDATE inside a WITH clause is not supported";

/// MySQL-family modifiers allowed between DELETE/UPDATE and the table.
const MYSQL_MODIFIERS: &[&str] = &["LOW_PRIORITY", "QUICK", "IGNORE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlKind {
    Delete,
    Update,
}

/// A table named by a DML statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema qualifier, empty when unqualified
    pub schema: String,
    pub name: String,
    pub alias: Option<String>,
    /// Source text starting at the table name, alias included
    pub unqualified_text: String,
}

impl TableRef {
    /// The name rows of this table are addressed by (alias if present).
    pub fn binding_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Normalized description of a backup-eligible statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmlDescriptor {
    pub kind: DmlKind,
    pub table: TableRef,
    /// Tables joined in through `USING` (DELETE) or `FROM` (UPDATE)
    pub auxiliaries: Vec<TableRef>,
    /// Verbatim text of the `USING`/`FROM` clause body, empty if absent
    pub auxiliary_clause: String,
    /// Verbatim WHERE predicate, empty if absent
    pub filter: String,
    /// Verbatim `ORDER BY ...`/`LIMIT ...` tail, empty if absent
    pub tail: String,
}

/// Outcome of analyzing one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    Dml(DmlDescriptor),
    /// Not a DELETE/UPDATE; nothing to back up
    NotApplicable,
}

/// Why a DELETE/UPDATE could not be turned into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported(pub String);

impl Unsupported {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

type ParseResult<T> = Result<T, Unsupported>;

/// Analyze a single statement's text.
///
/// The text is treated as a one-statement script: parse failures are
/// reported as statement #1 spanning the whole trimmed text.
pub fn analyze(statement_text: &str, dialect: Dialect) -> Result<Analysis, TransformError> {
    let tokens = lex(statement_text, dialect)?;
    analyze_tokens(&tokens, statement_text, dialect).map_err(|Unsupported(message)| {
        let first = tokens.iter().position(|t| !t.is_trivia()).unwrap_or(0);
        let last = tokens.iter().rposition(|t| !t.is_trivia()).unwrap_or(first);
        let range = tokens
            .get(first)
            .zip(tokens.get(last))
            .map_or(0..statement_text.len(), |(f, l)| f.range.start..l.range.end);
        let lines = LineMap::new(statement_text);
        TransformError::ParseFailure(StatementFailure {
            ordinal: 1,
            start: lines.position(statement_text, range.start),
            end: lines.last_char_position(statement_text, &range),
            message,
        })
    })
}

/// Analyze the tokens of one statement; `source` is the text the token
/// ranges index into.
pub fn analyze_tokens(
    tokens: &[SourceToken],
    source: &str,
    dialect: Dialect,
) -> Result<Analysis, Unsupported> {
    let mut parser = DmlParser {
        base: TokenParser::new(tokens, source, dialect),
    };
    parser.parse()
}

struct DmlParser<'a> {
    base: TokenParser<'a>,
}

impl<'a> DmlParser<'a> {
    fn parse(&mut self) -> ParseResult<Analysis> {
        self.base.skip_trivia();
        if self.base.check_keyword(Keyword::DELETE) {
            self.parse_delete().map(Analysis::Dml)
        } else if self.base.check_keyword(Keyword::UPDATE) {
            if self.is_update_statistics() {
                return Ok(Analysis::NotApplicable);
            }
            self.parse_update().map(Analysis::Dml)
        } else if self.base.check_keyword(Keyword::WITH) {
            self.check_cte_wrapped_dml().map(|()| Analysis::NotApplicable)
        } else {
            Ok(Analysis::NotApplicable)
        }
    }

    // ========================================================================
    // Statement shapes
    // ========================================================================

    fn parse_delete(&mut self) -> ParseResult<DmlDescriptor> {
        self.base.bump();
        self.skip_modifiers()?;

        if self.base.expect_keyword(Keyword::FROM).is_none() {
            if self.has_top_level_keyword(Keyword::FROM) {
                return Err(Unsupported::new("multi-table DELETE is not supported"));
            }
            if !self.base.dialect().capabilities().delete_without_from {
                return Err(Unsupported::new("expected FROM after DELETE"));
            }
        }

        let table = self.parse_table_ref()?;
        if self.base.check_token(&Token::Comma) || self.base.check_keyword(Keyword::FROM) {
            return Err(Unsupported::new("multi-table DELETE is not supported"));
        }
        self.skip_output_clause();

        let (auxiliaries, auxiliary_clause) = if self.base.expect_keyword(Keyword::USING).is_some()
        {
            self.parse_auxiliary_clause()?
        } else {
            (Vec::new(), String::new())
        };

        let (filter, tail) = self.parse_filter_and_tail()?;
        Ok(DmlDescriptor {
            kind: DmlKind::Delete,
            table,
            auxiliaries,
            auxiliary_clause,
            filter,
            tail,
        })
    }

    fn parse_update(&mut self) -> ParseResult<DmlDescriptor> {
        self.base.bump();
        self.skip_modifiers()?;

        let table = self.parse_table_ref()?;
        if self.base.check_token(&Token::Comma) || self.base.check_any_word_ci(JOIN_WORDS) {
            return Err(Unsupported::new("multi-table UPDATE is not supported"));
        }

        if self.base.expect_keyword(Keyword::SET).is_none() {
            return Err(Unsupported::new("expected SET after the UPDATE target"));
        }
        // The assignments play no part in which rows are touched
        let set_start = self.base.offset();
        self.base.skip_until_top_level(|p| {
            p.check_keyword(Keyword::FROM)
                || p.check_keyword(Keyword::WHERE)
                || is_clause_end(p)
        });
        if self.base.last_significant_end() <= set_start {
            return Err(Unsupported::new("SET clause has no assignments"));
        }
        self.skip_output_clause();

        let (auxiliaries, auxiliary_clause) = if self.base.expect_keyword(Keyword::FROM).is_some()
        {
            self.parse_auxiliary_clause()?
        } else {
            (Vec::new(), String::new())
        };

        let (filter, tail) = self.parse_filter_and_tail()?;
        Ok(DmlDescriptor {
            kind: DmlKind::Update,
            table,
            auxiliaries,
            auxiliary_clause,
            filter,
            tail,
        })
    }

    /// `WITH ...` is only a problem when the CTE list feeds a DELETE/UPDATE,
    /// or one of the CTEs is itself a DELETE/UPDATE.
    fn check_cte_wrapped_dml(&mut self) -> ParseResult<()> {
        self.base.bump();
        self.base.expect_keyword(Keyword::RECURSIVE);

        loop {
            // name [(columns)] AS [[NOT] MATERIALIZED] (body)
            if self.base.parse_identifier().is_none() {
                return Ok(());
            }
            self.base.skip_trivia();
            if self.base.check_token(&Token::LParen) {
                self.base.skip_parenthesized();
                self.base.skip_trivia();
            }
            if self.base.expect_keyword(Keyword::AS).is_none() {
                return Ok(());
            }
            self.base.expect_keyword(Keyword::NOT);
            self.base.expect_keyword(Keyword::MATERIALIZED);
            if !self.base.check_token(&Token::LParen) {
                return Ok(());
            }
            if self.cte_body_is_dml() {
                return Err(Unsupported::new(CTE_DML_MESSAGE));
            }
            self.base.skip_parenthesized();
            self.base.skip_trivia();
            if self.base.expect_token(&Token::Comma).is_none() {
                break;
            }
        }

        if self.base.check_keyword(Keyword::DELETE) || self.base.check_keyword(Keyword::UPDATE) {
            return Err(Unsupported::new(CTE_DML_MESSAGE));
        }
        Ok(())
    }

    /// Cursor is at the `(` opening a CTE body.
    fn cte_body_is_dml(&self) -> bool {
        let first = self.base.tokens()[self.base.pos() + 1..]
            .iter()
            .find(|t| !t.is_trivia());
        matches!(
            first.map(|t| &t.token),
            Some(Token::Word(w))
                if w.quote_style.is_none() && matches!(w.keyword, Keyword::DELETE | Keyword::UPDATE)
        )
    }

    /// SQL Server `UPDATE STATISTICS ...` is maintenance, not DML.
    fn is_update_statistics(&self) -> bool {
        if self.base.dialect() != Dialect::MsSql {
            return false;
        }
        let next = self.remaining_significant().nth(1);
        matches!(
            next.map(|t| &t.token),
            Some(Token::Word(w)) if is_bare_word(w, "STATISTICS")
        )
    }

    // ========================================================================
    // Clauses
    // ========================================================================

    fn skip_modifiers(&mut self) -> ParseResult<()> {
        if self.base.check_word_ci("TOP") {
            return Err(Unsupported::new("TOP is not supported"));
        }
        if self.base.dialect().is_mysql_family() {
            while self.base.check_any_word_ci(MYSQL_MODIFIERS) {
                self.base.bump();
            }
        }
        Ok(())
    }

    /// `[ONLY] [db.][schema.]name [*] [[AS] alias]`
    fn parse_table_ref(&mut self) -> ParseResult<TableRef> {
        if self.base.dialect() == Dialect::Postgres {
            self.base.expect_keyword(Keyword::ONLY);
        }
        if self.base.check_token(&Token::LParen) {
            return Err(Unsupported::new("derived tables are not supported"));
        }

        let mut parts: Vec<(String, Range<usize>)> = Vec::with_capacity(2);
        loop {
            let part = self
                .base
                .parse_identifier()
                .ok_or_else(|| Unsupported::new("expected a table name"))?;
            parts.push(part);
            self.base.skip_trivia();
            if self.base.expect_token(&Token::Period).is_none() {
                break;
            }
            if parts.len() == 3 {
                return Err(Unsupported::new("table name has too many qualifiers"));
            }
        }

        let (name, name_range) = parts.pop().unwrap_or_default();
        let schema = parts.pop().map(|(schema, _)| schema).unwrap_or_default();

        // Postgres `t *` means t and its descendants
        if self.base.dialect() == Dialect::Postgres {
            self.base.expect_token(&Token::Mul);
        }

        let alias = self.parse_alias()?;
        let end = self.base.last_significant_end();
        Ok(TableRef {
            schema,
            name,
            alias,
            unqualified_text: self.base.text(name_range.start..end).to_string(),
        })
    }

    fn parse_alias(&mut self) -> ParseResult<Option<String>> {
        if self.base.expect_keyword(Keyword::AS).is_some() {
            let (alias, _) = self
                .base
                .parse_identifier()
                .ok_or_else(|| Unsupported::new("expected an alias after AS"))?;
            self.base.skip_trivia();
            return Ok(Some(alias));
        }
        if self.base.check_any_word_ci(ALIAS_TERMINATORS) {
            return Ok(None);
        }
        match self.base.parse_identifier() {
            Some((alias, _)) => {
                self.base.skip_trivia();
                Ok(Some(alias))
            }
            None => Ok(None),
        }
    }

    /// Table list of `USING`/`FROM`, joins included.
    fn parse_auxiliary_clause(&mut self) -> ParseResult<(Vec<TableRef>, String)> {
        let start = self.base.offset();
        let mut tables = Vec::new();
        let mut after_join = false;

        loop {
            tables.push(self.parse_table_ref()?);

            if after_join
                && (self.base.check_keyword(Keyword::ON) || self.base.check_keyword(Keyword::USING))
            {
                self.base.bump();
                self.base.skip_until_top_level(|p| {
                    p.check_token(&Token::Comma)
                        || p.check_any_word_ci(JOIN_WORDS)
                        || p.check_keyword(Keyword::WHERE)
                        || is_clause_end(p)
                });
            }

            if self.base.expect_token(&Token::Comma).is_some() {
                after_join = false;
                continue;
            }
            if self.base.check_any_word_ci(JOIN_WORDS) {
                // INNER/LEFT OUTER/CROSS/... up to and including JOIN
                while self.base.check_any_word_ci(JOIN_WORDS) {
                    let is_join = self.base.check_any_word_ci(&["JOIN", "STRAIGHT_JOIN"]);
                    self.base.bump();
                    if is_join {
                        break;
                    }
                }
                after_join = true;
                continue;
            }
            break;
        }

        if !self.base.is_at_end()
            && !self.base.check_keyword(Keyword::WHERE)
            && !is_clause_end(&self.base)
        {
            return Err(Unsupported::new(format!(
                "unexpected `{}` in table list",
                self.current_text()
            )));
        }

        let end = self.base.last_significant_end();
        Ok((tables, self.base.text(start..end).to_string()))
    }

    /// `[WHERE cond] [ORDER BY ...] [LIMIT ...] [RETURNING ...]`
    fn parse_filter_and_tail(&mut self) -> ParseResult<(String, String)> {
        let mut filter = String::new();
        if self.base.expect_keyword(Keyword::WHERE).is_some() {
            if self.base.check_keyword(Keyword::CURRENT) {
                return Err(Unsupported::new("WHERE CURRENT OF is not supported"));
            }
            let start = self.base.offset();
            self.base.skip_until_top_level(is_clause_end);
            let end = self.base.last_significant_end();
            if end <= start {
                return Err(Unsupported::new("WHERE clause has no condition"));
            }
            filter = self.base.text(start..end).to_string();
        }

        let mut tail = String::new();
        if is_tail_start(&self.base) {
            let start = self.base.offset();
            self.base.skip_until_top_level(is_returning);
            tail = self.base.text(start..self.base.last_significant_end()).to_string();
        }

        if is_returning(&self.base) {
            // RETURNING/OUTPUT shape the result set, not the affected rows
            self.base.skip_to_end();
        }

        self.base.skip_trivia();
        if !self.base.is_at_end() {
            return Err(Unsupported::new(format!(
                "unexpected `{}` after the filter",
                self.current_text()
            )));
        }
        Ok((filter, tail))
    }

    /// SQL Server `OUTPUT ...` sits before WHERE/FROM; it never narrows rows.
    fn skip_output_clause(&mut self) {
        if self.base.check_word_ci("OUTPUT") {
            self.base.advance();
            self.base.skip_until_top_level(|p| {
                p.check_keyword(Keyword::FROM)
                    || p.check_keyword(Keyword::WHERE)
                    || p.check_keyword(Keyword::USING)
            });
        }
    }

    // ========================================================================
    // Lookahead helpers
    // ========================================================================

    fn has_top_level_keyword(&self, keyword: Keyword) -> bool {
        let mut depth = 0usize;
        for token in self.remaining_significant() {
            match &token.token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Word(w) if depth == 0 && w.quote_style.is_none() && w.keyword == keyword => {
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    fn remaining_significant(&self) -> impl Iterator<Item = &'a SourceToken> {
        self.base.tokens()[self.base.pos()..]
            .iter()
            .filter(|t| !t.is_trivia())
    }

    fn current_text(&self) -> &'a str {
        self.base
            .current_token()
            .map_or("", |t| self.base.text(t.range.clone()))
    }
}

fn is_returning(p: &TokenParser<'_>) -> bool {
    p.check_keyword(Keyword::RETURNING) || p.check_word_ci("OUTPUT")
}

fn is_tail_start(p: &TokenParser<'_>) -> bool {
    p.check_keyword(Keyword::ORDER) || p.check_keyword(Keyword::LIMIT)
}

fn is_clause_end(p: &TokenParser<'_>) -> bool {
    is_returning(p) || is_tail_start(p)
}
