//! Backup statement generation

mod naming;
mod synthesizer;
mod transform;

pub use naming::{NamingContext, BACKUP_TABLE_PREFIX};
pub use synthesizer::{synthesize, TransformResult};
pub use transform::{backup_statements, transform_script, TransformOutput};
