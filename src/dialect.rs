//! Supported SQL dialects and their capability table
//!
//! Every dialect-dependent decision in the crate (tokenizer rules, identifier
//! quoting, how a backup table is created, which extra batch separators end a
//! statement) is looked up here instead of being branched on at the call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    Dialect as SqlDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
};

use crate::error::TransformError;
use crate::parser::quote_with;

static POSTGRES_TOKENIZER: PostgreSqlDialect = PostgreSqlDialect {};
static MYSQL_TOKENIZER: MySqlDialect = MySqlDialect {};
static MSSQL_TOKENIZER: MsSqlDialect = MsSqlDialect {};
static GENERIC_TOKENIZER: GenericDialect = GenericDialect {};

/// The closed set of engines a script can be written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    TiDb,
    MsSql,
    Oracle,
}

/// How identifiers are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"name"`
    DoubleQuote,
    /// `` `name` ``
    Backtick,
    /// `[name]`
    Bracket,
}

impl QuoteStyle {
    pub fn delimiters(self) -> (char, char) {
        match self {
            QuoteStyle::DoubleQuote => ('"', '"'),
            QuoteStyle::Backtick => ('`', '`'),
            QuoteStyle::Bracket => ('[', ']'),
        }
    }
}

/// Statement shape used to materialize a backup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupForm {
    /// `CREATE TABLE <target> AS SELECT ...`
    CreateTableAs,
    /// `SELECT ... INTO <target> FROM ...`
    SelectInto,
}

/// A line-level separator that ends a statement in addition to `;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSeparator {
    /// `GO` alone on a line (SQL Server tooling)
    Go,
    /// `/` alone on a line (SQL*Plus)
    Slash,
}

/// Case the engine folds unquoted identifiers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    Lower,
    Upper,
    Preserve,
}

impl IdentifierCase {
    pub fn fold(self, ident: &str) -> String {
        match self {
            IdentifierCase::Lower => ident.to_ascii_lowercase(),
            IdentifierCase::Upper => ident.to_ascii_uppercase(),
            IdentifierCase::Preserve => ident.to_string(),
        }
    }
}

/// Capability row of one dialect.
#[derive(Debug)]
pub struct DialectCapabilities {
    pub name: &'static str,
    pub quote: QuoteStyle,
    pub backup_form: BackupForm,
    pub batch_separator: Option<BatchSeparator>,
    /// Whether `DELETE t WHERE ...` (without FROM) is valid
    pub delete_without_from: bool,
    pub identifier_case: IdentifierCase,
    /// Schema the backup table lands in when the backup destination is a database
    pub backup_table_schema: Option<&'static str>,
}

static POSTGRES: DialectCapabilities = DialectCapabilities {
    name: "postgres",
    quote: QuoteStyle::DoubleQuote,
    backup_form: BackupForm::CreateTableAs,
    batch_separator: None,
    delete_without_from: false,
    identifier_case: IdentifierCase::Lower,
    backup_table_schema: None,
};

static MYSQL: DialectCapabilities = DialectCapabilities {
    name: "mysql",
    quote: QuoteStyle::Backtick,
    backup_form: BackupForm::CreateTableAs,
    batch_separator: None,
    delete_without_from: false,
    identifier_case: IdentifierCase::Preserve,
    backup_table_schema: None,
};

static TIDB: DialectCapabilities = DialectCapabilities {
    name: "tidb",
    quote: QuoteStyle::Backtick,
    backup_form: BackupForm::CreateTableAs,
    batch_separator: None,
    delete_without_from: false,
    identifier_case: IdentifierCase::Preserve,
    backup_table_schema: None,
};

static MSSQL: DialectCapabilities = DialectCapabilities {
    name: "mssql",
    quote: QuoteStyle::Bracket,
    backup_form: BackupForm::SelectInto,
    batch_separator: Some(BatchSeparator::Go),
    delete_without_from: true,
    identifier_case: IdentifierCase::Preserve,
    backup_table_schema: Some("dbo"),
};

static ORACLE: DialectCapabilities = DialectCapabilities {
    name: "oracle",
    quote: QuoteStyle::DoubleQuote,
    backup_form: BackupForm::CreateTableAs,
    batch_separator: Some(BatchSeparator::Slash),
    delete_without_from: true,
    identifier_case: IdentifierCase::Upper,
    backup_table_schema: None,
};

impl Dialect {
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::TiDb,
        Dialect::MsSql,
        Dialect::Oracle,
    ];

    pub fn capabilities(self) -> &'static DialectCapabilities {
        match self {
            Dialect::Postgres => &POSTGRES,
            Dialect::MySql => &MYSQL,
            Dialect::TiDb => &TIDB,
            Dialect::MsSql => &MSSQL,
            Dialect::Oracle => &ORACLE,
        }
    }

    /// The sqlparser dialect whose lexical rules (quotes, comments, escapes)
    /// match this engine.
    pub fn tokenizer_dialect(self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &POSTGRES_TOKENIZER,
            Dialect::MySql | Dialect::TiDb => &MYSQL_TOKENIZER,
            Dialect::MsSql => &MSSQL_TOKENIZER,
            Dialect::Oracle => &GENERIC_TOKENIZER,
        }
    }

    pub fn is_mysql_family(self) -> bool {
        matches!(self, Dialect::MySql | Dialect::TiDb)
    }

    /// Quote an identifier, doubling any embedded closing delimiter.
    pub fn quote_identifier(self, name: &str) -> String {
        let (open, close) = self.capabilities().quote.delimiters();
        quote_with(name, open, close)
    }

    /// Render the statement that tags a backup table with a comment.
    ///
    /// The statement is only rendered here; running it is up to the caller
    /// that owns the backup connection.
    pub fn table_comment_statement(self, backup_schema: &str, table: &str, comment: &str) -> String {
        let literal = format!("'{}'", comment.replace('\'', "''"));
        match self {
            Dialect::Postgres | Dialect::Oracle => format!(
                "COMMENT ON TABLE {}.{} IS {}",
                self.quote_identifier(backup_schema),
                self.quote_identifier(table),
                literal
            ),
            Dialect::MySql | Dialect::TiDb => format!(
                "ALTER TABLE {}.{} COMMENT = {}",
                self.quote_identifier(backup_schema),
                self.quote_identifier(table),
                literal
            ),
            Dialect::MsSql => format!(
                "EXEC sp_addextendedproperty 'MS_Description', {}, 'SCHEMA', '{}', 'TABLE', '{}'",
                literal,
                MSSQL.backup_table_schema.unwrap_or("dbo"),
                table.replace('\'', "''")
            ),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capabilities().name)
    }
}

impl FromStr for Dialect {
    type Err = TransformError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "tidb" => Ok(Dialect::TiDb),
            "mssql" | "sqlserver" | "tsql" => Ok(Dialect::MsSql),
            "oracle" => Ok(Dialect::Oracle),
            _ => Err(TransformError::UnknownDialect {
                tag: tag.to_string(),
            }),
        }
    }
}
