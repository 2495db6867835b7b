//! Serializes a tree back into the text format.

use std::fmt;
use std::io::{self, Write};

use crate::domain::tree::{NodeKind, YamlNode, YamlTree, TK_POST_KEY, TK_PRE_LIST_VALUE};

/// Spaces per indentation level in written output.
pub const OUTPUT_INDENT: usize = 2;

/// Writes the root's children at depth 0; the root itself is virtual.
#[derive(Debug, Clone, Copy)]
pub struct YamlWriter {
    indent: usize,
}

impl Default for YamlWriter {
    fn default() -> Self {
        Self::new(OUTPUT_INDENT)
    }
}

impl YamlWriter {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    pub fn write<W: Write>(&self, tree: &YamlTree, out: &mut W) -> io::Result<()> {
        out.write_all(self.render(tree).as_bytes())
    }

    pub fn render(&self, tree: &YamlTree) -> String {
        let mut data = String::new();
        for (_, depth, node) in tree.iter() {
            self.render_node(node, depth, &mut data);
        }
        data
    }

    fn render_node(&self, node: &YamlNode, depth: usize, data: &mut String) {
        data.push_str(&" ".repeat(self.indent * depth));
        data.push_str(&node.name);
        data.push(TK_POST_KEY);

        match node.kind {
            NodeKind::Scalar => {
                if let Some(value) = node.values.first() {
                    data.push(' ');
                    data.push_str(value);
                }
            }
            NodeKind::List => {
                let pad = " ".repeat(self.indent * (depth + 1));
                for value in &node.values {
                    data.push('\n');
                    data.push_str(&pad);
                    data.push_str(TK_PRE_LIST_VALUE);
                    data.push_str(value);
                }
            }
            NodeKind::Mapping => {}
        }
        data.push('\n');
    }
}

impl fmt::Display for YamlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&YamlWriter::default().render(self))
    }
}
