//! Merge service
//!
//! Reads input documents, merges them and writes the result.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{self, parse_str, MergeOptions, YamlTree, YamlWriter};
use crate::infrastructure::traits::FileSystem;

/// Outcome of checking one input file.
#[derive(Debug)]
pub struct CheckReport {
    pub path: PathBuf,
    /// Number of nodes parsed, or why parsing failed
    pub result: ApplicationResult<usize>,
}

/// Service for parsing, merging and writing documents.
pub struct MergeService {
    fs: Arc<dyn FileSystem>,
}

impl MergeService {
    /// Create a new merge service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse one input file.
    #[instrument(level = "debug", skip(self))]
    pub fn parse_file(&self, path: &Path) -> ApplicationResult<YamlTree> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read input", path)?;
        parse_str(&content).map_err(|source| ApplicationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse all input files in parallel; trees keep the input order.
    ///
    /// With several bad inputs the error of the first one in input order
    /// is reported.
    pub fn parse_files(&self, paths: &[PathBuf]) -> ApplicationResult<Vec<YamlTree>> {
        let results: Vec<ApplicationResult<YamlTree>> =
            paths.par_iter().map(|path| self.parse_file(path)).collect();
        results.into_iter().collect()
    }

    /// Parse and merge `paths`, the first file being the base.
    #[instrument(level = "debug", skip(self, options))]
    pub fn merge_files(
        &self,
        paths: &[PathBuf],
        options: &MergeOptions,
    ) -> ApplicationResult<YamlTree> {
        let trees = self.parse_files(paths)?;
        debug!(
            "merge_files: {} documents, strict={}, deletion token={:?}",
            trees.len(),
            options.strict,
            options.deletion_token
        );
        let merged = domain::merge(&trees, options)?;
        info!("merged {} documents", trees.len());
        Ok(merged)
    }

    /// Fails if `output` exists; merged output never replaces a file.
    pub fn ensure_output_available(&self, output: &Path) -> ApplicationResult<()> {
        if self.fs.exists(output) {
            return Err(ApplicationError::OutputExists(output.to_path_buf()));
        }
        Ok(())
    }

    /// Write `tree` to a new file at `output`.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn write_output(&self, tree: &YamlTree, output: &Path, indent: usize) -> ApplicationResult<()> {
        self.ensure_output_available(output)?;
        let rendered = YamlWriter::new(indent).render(tree);
        match self.fs.write(output, &rendered) {
            // Created after the check above
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(ApplicationError::OutputExists(output.to_path_buf()))
            }
            result => result.with_path_context("write output", output),
        }
    }

    /// Parse every file independently and report each result.
    pub fn check_files(&self, paths: &[PathBuf]) -> Vec<CheckReport> {
        paths
            .par_iter()
            .map(|path| CheckReport {
                path: path.clone(),
                result: self.parse_file(path).map(|tree| tree.len() - 1),
            })
            .collect()
    }
}
