//! Error types for gccxml-dump.

/// Errors raised while loading input or writing a dump.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed AST document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid AST: {0}")]
    InvalidAst(String),

    #[error("AST {what} {owner} refers to missing {target} {index}")]
    DanglingReference {
        what: &'static str,
        owner: u32,
        target: &'static str,
        index: u32,
    },
}

pub type Result<T> = std::result::Result<T, DumpError>;
