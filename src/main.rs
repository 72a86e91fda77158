use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dml_backup::dialect::{BackupForm, BatchSeparator};
use dml_backup::script_loader::collect_script_paths;
use dml_backup::{transform_files, Dialect, FileTransform, TransformOptions, DEFAULT_BACKUP_SCHEMA};

#[derive(Parser)]
#[command(name = "dml-backup")]
#[command(author, version, about = "Derive backup statements for the DELETE/UPDATE statements of SQL scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a backup statement for every DELETE/UPDATE of the given scripts
    Transform {
        /// SQL dialect of the scripts (postgres, mysql, tidb, mssql, oracle)
        #[arg(short, long)]
        dialect: Dialect,

        /// Schema (database for mssql) the backup tables are created in
        #[arg(short, long, default_value = DEFAULT_BACKUP_SCHEMA)]
        backup_schema: String,

        /// Also print the statement tagging each backup table with this comment
        #[arg(long)]
        table_comment: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Script files, or directories searched for *.sql files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the supported dialects
    Dialects,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            dialect,
            backup_schema,
            table_comment,
            json,
            verbose,
            paths,
        } => {
            init_tracing(verbose);

            let options = TransformOptions::new(dialect).with_backup_schema(&backup_schema);
            let scripts = collect_script_paths(&paths)?;
            let transforms = transform_files(&scripts, &options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&transforms)?);
            } else {
                print_report(&transforms, &options, table_comment.as_deref());
            }

            for transform in &transforms {
                for failure in &transform.output.failures {
                    eprintln!("{}: {}", transform.path.display(), failure);
                }
            }

            let results: usize = transforms.iter().map(|t| t.output.results.len()).sum();
            let failures: usize = transforms.iter().map(|t| t.output.failures.len()).sum();
            if results == 0 && failures > 0 {
                bail!("no statement could be backed up ({failures} failed)");
            }
        }
        Commands::Dialects => {
            for dialect in Dialect::ALL {
                let caps = dialect.capabilities();
                let form = match caps.backup_form {
                    BackupForm::CreateTableAs => "CREATE TABLE ... AS SELECT",
                    BackupForm::SelectInto => "SELECT ... INTO",
                };
                let separator = match caps.batch_separator {
                    Some(BatchSeparator::Go) => "; GO",
                    Some(BatchSeparator::Slash) => "; /",
                    None => ";",
                };
                println!(
                    "{:<9} {:<6} {:<27} {}",
                    caps.name,
                    dialect.quote_identifier("x"),
                    form,
                    separator
                );
            }
        }
    }

    Ok(())
}

/// `--verbose` raises the default level to debug; `RUST_LOG` overrides both.
fn init_tracing(verbose: bool) {
    let default = if verbose { "dml_backup=debug" } else { "dml_backup=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(transforms: &[FileTransform], options: &TransformOptions, table_comment: Option<&str>) {
    for transform in transforms {
        println!("-- {}", transform.path.display());
        for result in &transform.output.results {
            let source = if result.source_schema.is_empty() {
                result.source_table_name.clone()
            } else {
                format!("{}.{}", result.source_schema, result.source_table_name)
            };
            println!(
                "-- {} -> {} ({}-{})",
                source, result.target_table_name, result.start_position, result.end_position
            );
            println!("{}", result.statement);
            if let Some(comment) = table_comment {
                println!(
                    "{};",
                    options.dialect.table_comment_statement(
                        &options.backup_schema,
                        &result.target_table_name,
                        comment
                    )
                );
            }
        }
    }
}
