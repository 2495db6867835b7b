//! Line-oriented parser for the indentation-based YAML subset.
//!
//! Supported: `key: value` scalars, nested mappings (`key:` followed by
//! deeper-indented lines) and single-level lists of scalars (`- item`).
//! Comments start at `#` when it follows a space outside a quoted string.
//! The indentation unit is the first non-zero indent in the document.

use std::io::BufRead;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult, SyntaxErrorKind};
use crate::domain::traverse;
use crate::domain::tree::{
    NodeKind, YamlTree, TK_COMMENT, TK_POST_KEY, TK_PRE_LIST_VALUE, TK_STRING_DELIMS,
};

/// Parses a whole document held in memory.
pub fn parse_str(input: &str) -> DomainResult<YamlTree> {
    Parser::new(input.as_bytes()).parse()
}

/// Parser state: the tree under construction plus a cursor on the current line.
pub struct Parser<R> {
    reader: R,
    /// Current line without its line ending
    line: Vec<char>,
    /// Read position on the current line
    cursor: usize,
    /// 1-based number of the current line
    line_no: usize,
    /// Spaces per indentation level, 0 until the first indented line
    indent_setting: usize,
    /// Indentation level of the last key line
    prev_indent: usize,
    tree: YamlTree,
    /// Last node created
    current: Index,
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R) -> Self {
        let tree = YamlTree::new();
        let current = tree.root();
        Self {
            reader,
            line: Vec::new(),
            cursor: 0,
            line_no: 0,
            indent_setting: 0,
            prev_indent: 0,
            tree,
            current,
        }
    }

    /// Reads the stream to the end and returns the document tree.
    #[instrument(level = "debug", skip(self))]
    pub fn parse(mut self) -> DomainResult<YamlTree> {
        let mut buf = String::new();
        loop {
            self.line_no += 1;
            buf.clear();
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|source| DomainError::Read {
                    line: self.line_no,
                    source,
                })?;
            if read == 0 {
                break;
            }
            self.load_line(&buf);
            if self.line.iter().all(|c| c.is_whitespace()) {
                continue;
            }
            self.parse_line()?;
        }
        debug!(
            "parsed {} lines into {} nodes (indent unit {})",
            self.line_no - 1,
            self.tree.len() - 1,
            self.indent_setting
        );
        Ok(self.tree)
    }

    fn load_line(&mut self, raw: &str) {
        let raw = raw.strip_suffix('\n').unwrap_or(raw);
        // Windows line endings
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        self.line = raw.chars().collect();
        self.cursor = 0;
    }

    fn parse_line(&mut self) -> DomainResult<()> {
        let raw_indent = self.consume_spaces();

        if self.peek() == Some(TK_COMMENT) {
            trace!("line {}: comment", self.line_no);
            return Ok(());
        }

        let indent = self.determine_indent(raw_indent)?;

        if self.at(TK_PRE_LIST_VALUE) {
            if indent < self.prev_indent {
                return Err(self.syntax_error(SyntaxErrorKind::OrphanListItem));
            }
            return self.parse_list_item();
        }

        // From here on the line can only be a new key
        let indent_shift = indent as isize - self.prev_indent as isize;
        if indent_shift > 1 || (indent_shift == 1 && self.current == self.tree.root()) {
            return Err(self.syntax_error(SyntaxErrorKind::IndentWithoutParent));
        }

        let parent = if indent_shift <= 0 && self.current != self.tree.root() {
            let levels = (1 - indent_shift) as usize;
            traverse::up_x(&self.tree, self.current, levels)
                .ok_or_else(|| self.syntax_error(SyntaxErrorKind::IndentWithoutParent))?
        } else {
            self.current
        };

        if self.tree.get(parent).map(|n| n.kind) != Some(NodeKind::Mapping) {
            return Err(self.syntax_error(SyntaxErrorKind::NestedUnderValue));
        }

        self.current = self.tree.new_child(parent, String::new());
        self.parse_key()?;

        if self.peek() == Some(TK_POST_KEY) {
            self.cursor += 1;
            self.consume_spaces();
            self.parse_scalar()?;
        }

        self.prev_indent = indent;
        Ok(())
    }

    fn parse_key(&mut self) -> DomainResult<()> {
        let key = self.parse_value(Some(TK_POST_KEY))?;
        let key = key.trim_end();
        if key.is_empty() {
            return Err(self.syntax_error(SyntaxErrorKind::EmptyKey));
        }
        trace!("line {}: key {:?}", self.line_no, key);
        if let Some(node) = self.tree.get_mut(self.current) {
            node.name = key.to_string();
        }
        Ok(())
    }

    /// An empty value leaves the node a mapping; its children follow on
    /// the next lines.
    fn parse_scalar(&mut self) -> DomainResult<()> {
        let value = self.parse_value(None)?;
        let value = value.trim_end();
        if value.is_empty() {
            return Ok(());
        }
        if let Some(node) = self.tree.get_mut(self.current) {
            node.kind = NodeKind::Scalar;
            node.values.push(value.to_string());
        }
        Ok(())
    }

    fn parse_list_item(&mut self) -> DomainResult<()> {
        let kind = self.tree.get(self.current).map(|n| n.kind);
        if self.current == self.tree.root() {
            return Err(self.syntax_error(SyntaxErrorKind::OrphanListItem));
        }
        if kind == Some(NodeKind::Scalar) {
            return Err(self.syntax_error(SyntaxErrorKind::NestedUnderValue));
        }

        self.cursor += TK_PRE_LIST_VALUE.chars().count();
        let value = self.parse_value(None)?;
        let value = value.trim_end().to_string();
        trace!("line {}: list item {:?}", self.line_no, value);

        if let Some(node) = self.tree.get_mut(self.current) {
            node.kind = NodeKind::List;
            node.values.push(value);
        }
        Ok(())
    }

    /// Reads up to `stop` (outside strings), a comment, or the end of line.
    ///
    /// Quote characters are kept in the returned text.
    fn parse_value(&mut self, stop: Option<char>) -> DomainResult<String> {
        let mut value = String::new();
        let mut string_delim: Option<char> = None;

        while let Some(c) = self.peek() {
            if string_delim.is_none() {
                if Some(c) == stop {
                    break;
                }
                if c == TK_COMMENT && self.previous() == Some(' ') {
                    self.cursor = self.line.len();
                    break;
                }
            }

            if TK_STRING_DELIMS.contains(&c) {
                match string_delim {
                    Some(d) if d == c => string_delim = None,
                    None => string_delim = Some(c),
                    Some(_) => {}
                }
            }

            value.push(c);
            self.cursor += 1;
        }

        if string_delim.is_some() {
            return Err(self.syntax_error(SyntaxErrorKind::UnclosedString));
        }
        Ok(value)
    }

    fn determine_indent(&mut self, raw_indent: usize) -> DomainResult<usize> {
        if raw_indent == 0 {
            return Ok(0);
        }
        if self.indent_setting == 0 {
            debug!("indent unit set to {} by line {}", raw_indent, self.line_no);
            self.indent_setting = raw_indent;
        }
        if raw_indent % self.indent_setting != 0 {
            return Err(self.syntax_error(SyntaxErrorKind::IndentNotMultiple {
                unit: self.indent_setting,
                found: raw_indent,
            }));
        }
        Ok(raw_indent / self.indent_setting)
    }

    fn consume_spaces(&mut self) -> usize {
        let start = self.cursor;
        while self.peek() == Some(' ') {
            self.cursor += 1;
        }
        self.cursor - start
    }

    fn peek(&self) -> Option<char> {
        self.line.get(self.cursor).copied()
    }

    fn previous(&self) -> Option<char> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.line.get(i).copied())
    }

    /// True if the rest of the line starts with `token`.
    fn at(&self, token: &str) -> bool {
        let rest = self.line.get(self.cursor..).unwrap_or(&[]);
        let mut chars = token.chars();
        let matched = rest.iter().zip(chars.by_ref()).all(|(a, b)| *a == b);
        matched && rest.len() >= token.chars().count()
    }

    fn syntax_error(&self, kind: SyntaxErrorKind) -> DomainError {
        DomainError::Syntax {
            kind,
            line: self.line_no,
            column: self.cursor,
        }
    }
}
