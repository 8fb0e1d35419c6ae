//! INI parser for the shared `~/.aws/credentials` and `~/.aws/config` files
//!. Grammar: comments (`#`/`;`), `[section]` headers, `key = value`
//! pairs with optional single/double quoting and trailing comments.

mod parser;
mod path;

pub use parser::{IniFile, Section};
pub use path::expand_tilde;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("invalid syntax at line {line}: {reason}")]
    InvalidSyntax { line: usize, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
