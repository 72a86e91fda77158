//! Script-level transformation pipeline
//!
//! Statements are analyzed independently (in parallel for large scripts);
//! backup indices are then assigned and statements synthesized in a single
//! pass over the script in source order.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::naming::NamingContext;
use super::synthesizer::{synthesize, TransformResult};
use crate::error::{StatementFailure, TransformError};
use crate::parser::{analyze_tokens, split, Analysis, SplitScript, Statement, Unsupported};
use crate::TransformOptions;

/// Minimum number of statements to benefit from parallel analysis.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 64;

/// Everything produced for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformOutput {
    /// Backup statements, in script order
    pub results: Vec<TransformResult>,
    /// DELETE/UPDATE statements that could not be backed up, in script order
    pub failures: Vec<StatementFailure>,
}

/// Transform every DELETE/UPDATE of `script` into a backup statement.
///
/// Fails only if the script itself cannot be split; statements that cannot
/// be backed up are reported in [`TransformOutput::failures`] and do not stop
/// the rest of the script.
pub fn transform_script(
    script: &str,
    options: &TransformOptions,
) -> Result<TransformOutput, TransformError> {
    let split_script = split(script, options.dialect)?;
    let statements: Vec<Statement<'_>> = split_script.iter().collect();
    debug!(
        dialect = %options.dialect,
        statements = statements.len(),
        "split script"
    );

    let mut naming = NamingContext::new(options.dialect, options.backup_schema.clone());
    let mut output = TransformOutput::default();

    if statements.len() >= PARALLEL_THRESHOLD {
        let analyses: Vec<Result<Analysis, Unsupported>> = statements
            .par_iter()
            .map(|statement| {
                analyze_tokens(statement.tokens(), split_script.source(), options.dialect)
            })
            .collect();

        for (statement, analysis) in statements.iter().zip(analyses) {
            if let Some(backup) = resolve(statement, analysis, &mut naming) {
                output.push(backup);
            }
        }
    } else {
        for backup in backup_statements(&split_script, &mut naming) {
            output.push(backup);
        }
    }

    Ok(output)
}

/// Lazily back up the statements of an already split script.
///
/// Statements that are not DELETE/UPDATE are skipped without consuming an
/// index. Dropping the iterator early leaves every result already yielded
/// valid.
pub fn backup_statements<'s>(
    script: &'s SplitScript<'_>,
    naming: &'s mut NamingContext,
) -> impl Iterator<Item = Result<TransformResult, StatementFailure>> + 's {
    let source: &'s str = script.source();
    let dialect = script.dialect();
    script.iter().filter_map(move |statement| {
        let analysis = analyze_tokens(statement.tokens(), source, dialect);
        resolve(&statement, analysis, naming)
    })
}

fn resolve(
    statement: &Statement<'_>,
    analysis: Result<Analysis, Unsupported>,
    naming: &mut NamingContext,
) -> Option<Result<TransformResult, StatementFailure>> {
    match analysis {
        Ok(Analysis::Dml(descriptor)) => {
            let result = synthesize(&descriptor, statement.start, statement.end, naming);
            debug!(
                ordinal = statement.ordinal,
                source = %result.source_table_name,
                target = %result.target_table_name,
                "backup statement synthesized"
            );
            Some(Ok(result))
        }
        Ok(Analysis::NotApplicable) => {
            debug!(ordinal = statement.ordinal, "not a DELETE/UPDATE, skipped");
            None
        }
        Err(Unsupported(message)) => {
            let failure = StatementFailure {
                ordinal: statement.ordinal,
                start: statement.start,
                end: statement.end,
                message,
            };
            warn!("{failure}");
            Some(Err(failure))
        }
    }
}

impl TransformOutput {
    fn push(&mut self, backup: Result<TransformResult, StatementFailure>) {
        match backup {
            Ok(result) => self.results.push(result),
            Err(failure) => self.failures.push(failure),
        }
    }
}
