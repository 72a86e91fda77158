//! Backup statement synthesis

use serde::{Deserialize, Serialize};

use super::naming::NamingContext;
use crate::dialect::BackupForm;
use crate::parser::{DmlDescriptor, Position};

/// One backup statement, produced for one DELETE/UPDATE of the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    /// Statement that materializes the affected rows into the backup table
    pub statement: String,
    /// Schema qualifier of the source table, empty when unqualified
    pub source_schema: String,
    pub source_table_name: String,
    /// `rollback_<index>_<source_table_name>`
    pub target_table_name: String,
    /// Span of the originating statement in the original script
    pub start_position: Position,
    pub end_position: Position,
}

/// Build the backup statement for `descriptor`, consuming the next index of
/// `naming`.
///
/// Only the primary table's rows are selected; auxiliary tables are joined in
/// to evaluate the filter. The FROM list, filter and ORDER BY/LIMIT tail are
/// reused verbatim from the source statement.
pub fn synthesize(
    descriptor: &DmlDescriptor,
    start: Position,
    end: Position,
    naming: &mut NamingContext,
) -> TransformResult {
    let table = &descriptor.table;
    let index = naming.next_index();
    let target_table_name = naming.target_table_name(index, &table.name);
    let target = naming.qualified_target(&target_table_name);
    let projection = format!("{}.*", naming.quote_identifier(table.binding_name()));

    let mut from_list = table.unqualified_text.clone();
    if !descriptor.auxiliary_clause.is_empty() {
        from_list.push_str(", ");
        from_list.push_str(&descriptor.auxiliary_clause);
    }

    let mut statement = match naming.dialect().capabilities().backup_form {
        BackupForm::CreateTableAs => {
            format!("CREATE TABLE {target} AS SELECT {projection} FROM {from_list}")
        }
        BackupForm::SelectInto => format!("SELECT {projection} INTO {target} FROM {from_list}"),
    };
    if !descriptor.filter.is_empty() {
        statement.push_str(" WHERE ");
        statement.push_str(&descriptor.filter);
    }
    if !descriptor.tail.is_empty() {
        statement.push(' ');
        statement.push_str(&descriptor.tail);
    }
    statement.push(';');

    TransformResult {
        statement,
        source_schema: table.schema.clone(),
        source_table_name: table.name.clone(),
        target_table_name,
        start_position: start,
        end_position: end,
    }
}
