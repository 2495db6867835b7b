//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Merge indentation-based YAML documents: base first, overrides after
#[derive(Parser, Debug)]
#[command(name = "ymlmerge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory holding .ymlmerge.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge documents into one
    Merge(MergeArgs),

    /// Parse documents and report syntax errors
    Check {
        /// Files to check
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },

    /// Show the parsed structure of a document
    Tree {
        /// Document to show
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input documents; the first one is the base
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output file, must not exist (default: stdout)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Only check that the merge passes, write nothing
    #[arg(short, long)]
    pub check: bool,

    /// Value that deletes a key, e.g. nil
    #[arg(long = "del-tk")]
    pub deletion_token: Option<String>,

    /// Delimiter per list: "name1:delim1,name2:delim2[,...]"
    #[arg(long)]
    pub dpl: Option<String>,

    /// Let the override win on node type conflicts
    #[arg(long, conflicts_with = "strict")]
    pub no_strict: bool,

    /// Fail on node type conflicts
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print effective settings as TOML
    Show,
    /// Print config file locations
    Path,
}
