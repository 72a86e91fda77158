//! Backup table naming and identifier quoting

use crate::dialect::{BackupForm, Dialect};

/// Prefix shared by every backup table name.
pub const BACKUP_TABLE_PREFIX: &str = "rollback";

/// Per-script naming state.
///
/// Issues backup indices in script order and renders identifiers for the
/// active dialect. A fresh context is created for every script, so indices
/// restart at 0 each time.
#[derive(Debug, Clone)]
pub struct NamingContext {
    dialect: Dialect,
    backup_schema: String,
    next: usize,
}

impl NamingContext {
    pub fn new(dialect: Dialect, backup_schema: impl Into<String>) -> Self {
        Self {
            dialect,
            backup_schema: backup_schema.into(),
            next: 0,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns 0, then 1, 2, ... on successive calls.
    pub fn next_index(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Number of indices issued so far.
    pub fn issued(&self) -> usize {
        self.next
    }

    /// `rollback_<index>_<source_table>`
    pub fn target_table_name(&self, index: usize, source_table: &str) -> String {
        format!("{BACKUP_TABLE_PREFIX}_{index}_{source_table}")
    }

    pub fn quote_identifier(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    pub fn quoted_backup_schema(&self) -> String {
        self.quote_identifier(&self.backup_schema)
    }

    /// Fully qualified, quoted name of a backup table.
    ///
    /// For `SELECT ... INTO` dialects the backup schema names a database and
    /// the table lands in that database's default schema.
    pub fn qualified_target(&self, target_table: &str) -> String {
        let caps = self.dialect.capabilities();
        match (caps.backup_form, caps.backup_table_schema) {
            (BackupForm::SelectInto, Some(schema)) => format!(
                "{}.{}.{}",
                self.quoted_backup_schema(),
                self.quote_identifier(schema),
                self.quote_identifier(target_table)
            ),
            _ => format!(
                "{}.{}",
                self.quoted_backup_schema(),
                self.quote_identifier(target_table)
            ),
        }
    }
}
