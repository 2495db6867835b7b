//! ymlmerge: merge indentation-based YAML-subset documents.
//!
//! Documents are parsed into an arena tree of named nodes (mappings,
//! scalars and lists) and folded left to right: later documents override
//! earlier ones. A configurable deletion token removes keys, and lists
//! are merged either as plain sets or as `key<delim>value` entries.
//!
//! Layers:
//! - `domain`: tree model, parser, merger, list merge strategies, writer
//! - `application`: file-level services and errors
//! - `infrastructure`: filesystem abstraction and service wiring
//! - `cli`: argument parsing and command handlers

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
