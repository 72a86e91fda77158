//! SQL script parsing

mod dml_parser;
mod identifier_utils;
mod lexer;
mod script_splitter;
mod token_parser_base;

pub use dml_parser::{
    analyze, analyze_tokens, Analysis, DmlDescriptor, DmlKind, TableRef, Unsupported,
};
pub use identifier_utils::{normalize_identifier, quote_with};
pub use lexer::{lex, LineMap, Position, SourceToken};
pub use script_splitter::{split, SplitScript, Statement, Statements};
