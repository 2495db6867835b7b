//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::tree::NodeKind;

/// What went wrong on a line the parser rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("invalid indent (no parent)")]
    IndentWithoutParent,

    #[error("invalid indent: {found} spaces is not a multiple of {unit}")]
    IndentNotMultiple { unit: usize, found: usize },

    #[error("key can't be empty")]
    EmptyKey,

    #[error("unclosed string")]
    UnclosedString,

    #[error("list item without a parent key")]
    OrphanListItem,

    #[error("nested entry under a node that already holds a value")]
    NestedUnderValue,
}

/// Domain errors: parse, merge and list-format failures.
/// All of them abort the current operation.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("syntax error: {kind} (l: {line}, c: {column})")]
    Syntax {
        kind: SyntaxErrorKind,
        line: usize,
        column: usize,
    },

    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "[strict mode] different node type found: {base_key} ({base_kind}) / {override_key} ({override_kind})"
    )]
    TypeConflict {
        base_key: String,
        base_kind: NodeKind,
        override_key: String,
        override_kind: NodeKind,
    },

    #[error("malformed list item `{item}`, delimiter `{delimiter}` not found")]
    MalformedListItem { item: String, delimiter: String },

    #[error("invalid delimiter map: {0}")]
    InvalidDelimiterSpec(String),

    #[error("internal tree operation failed: {0}")]
    Internal(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Line number of a syntax error, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            DomainError::Syntax { line, .. } | DomainError::Read { line, .. } => Some(*line),
            _ => None,
        }
    }
}
