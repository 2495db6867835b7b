//! Domain layer: document tree, parser, writer and merge logic
//!
//! This layer is independent of external concerns (no files, no CLI, no config loading).

pub mod error;
pub mod list_merge;
pub mod merger;
pub mod parser;
pub mod traverse;
pub mod tree;
pub mod tree_display;
pub mod writer;

pub use error::{DomainError, DomainResult, SyntaxErrorKind};
pub use list_merge::{parse_delimiter_map, DelimiterMap, ListStrategy, MappedList};
pub use merger::{merge, MergeCursor, MergeOptions, Merger, DEFAULT_DELETION_TOKEN};
pub use parser::{parse_str, Parser};
pub use tree::{NodeKind, YamlNode, YamlTree};
pub use tree_display::TreeNodeConvert;
pub use writer::{YamlWriter, OUTPUT_INDENT};
