use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Name of the virtual root node every tree starts with.
pub const ROOT_NAME: &str = "root";

/// Key/value separator.
pub const TK_POST_KEY: char = ':';
/// Prefix of a list item line.
pub const TK_PRE_LIST_VALUE: &str = "- ";
/// Comment marker, only a comment when preceded by a space.
pub const TK_COMMENT: char = '#';
/// Scalar string delimiters (paired, non-nesting, no escapes).
pub const TK_STRING_DELIMS: [char; 2] = ['"', '\''];

/// Which fields of a node are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Has children, no values
    Mapping,
    /// Exactly one value, no children
    Scalar,
    /// Zero or more values, no children
    List,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Scalar => "scalar",
            NodeKind::List => "list",
        };
        f.write_str(name)
    }
}

/// Node in the arena-based document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlNode {
    /// Key of this node
    pub name: String,
    pub kind: NodeKind,
    /// One value for scalars, the items for lists
    pub values: Vec<String>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in document order
    pub children: Vec<Index>,
}

impl YamlNode {
    fn new(name: String, parent: Option<Index>) -> Self {
        Self {
            name,
            kind: NodeKind::Mapping,
            values: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// The single value of a scalar node.
    pub fn scalar(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Scalar => self.values.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Arena-based document tree.
///
/// Nodes are addressed by generational indices, so a removed node's index
/// never aliases a node created later. The root is a virtual `Mapping`
/// named [`ROOT_NAME`] and cannot be removed.
#[derive(Debug)]
pub struct YamlTree {
    arena: Arena<YamlNode>,
    root: Index,
}

impl Default for YamlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(YamlNode::new(ROOT_NAME.to_string(), None));
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&YamlNode> {
        self.arena.get(idx)
    }

    pub fn get_mut(&mut self, idx: Index) -> Option<&mut YamlNode> {
        self.arena.get_mut(idx)
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.arena.contains(idx)
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.arena[self.root].children.is_empty()
    }

    /// Creates an empty `Mapping` node appended to `parent`'s children.
    #[instrument(level = "trace", skip(self, name))]
    pub fn new_child(&mut self, parent: Index, name: impl Into<String>) -> Index {
        let node_idx = self.arena.insert(YamlNode::new(name.into(), Some(parent)));
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        node_idx
    }

    /// Detaches `idx` from its parent and frees its whole subtree.
    ///
    /// Remaining siblings keep their order. Returns false for the root or
    /// an index that is no longer in the tree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, idx: Index) -> bool {
        if idx == self.root {
            return false;
        }
        let Some(parent) = self.arena.get(idx).and_then(|n| n.parent) else {
            return false;
        };
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.retain(|&c| c != idx);
        }
        self.free_subtree(idx);
        true
    }

    fn free_subtree(&mut self, idx: Index) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Deep copies `src` of `source` as a new last child of `dest_parent`.
    ///
    /// The copy gets fresh indices; children keep their order.
    pub fn copy_from(&mut self, source: &YamlTree, src: Index, dest_parent: Index) -> Option<Index> {
        let node = source.get(src)?;
        let copy = self.new_child(dest_parent, node.name.clone());
        if let Some(target) = self.arena.get_mut(copy) {
            target.kind = node.kind;
            target.values = node.values.clone();
        }
        for &child in &node.children {
            self.copy_from(source, child, copy);
        }
        Some(copy)
    }

    /// Replaces `dest` in place with a deep copy of `src` of `source`.
    ///
    /// `dest` keeps its index and position among its siblings; its old
    /// children are freed.
    #[instrument(level = "trace", skip(self, source))]
    pub fn overwrite(&mut self, dest: Index, source: &YamlTree, src: Index) -> bool {
        let Some(node) = source.get(src) else {
            return false;
        };
        let old_children = match self.arena.get_mut(dest) {
            Some(target) => {
                target.name = node.name.clone();
                target.kind = node.kind;
                target.values = node.values.clone();
                std::mem::take(&mut target.children)
            }
            None => return false,
        };
        for child in old_children {
            self.free_subtree(child);
        }
        for &child in &node.children {
            self.copy_from(source, child, dest);
        }
        true
    }

    /// Independent copy with freshly allocated nodes.
    pub fn deep_copy(&self) -> YamlTree {
        let mut copy = YamlTree::new();
        let root = copy.root();
        for &child in &self.arena[self.root].children {
            copy.copy_from(self, child, root);
        }
        copy
    }

    /// Dotted key path of a node, e.g. `server.tls.port`.
    pub fn path_of(&self, idx: Index) -> String {
        let mut names = Vec::new();
        let mut current = Some(idx);
        while let Some(node_idx) = current {
            if node_idx == self.root {
                break;
            }
            match self.get(node_idx) {
                Some(node) => {
                    names.push(node.name.as_str());
                    current = node.parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join(".")
    }

    /// Pre-order walk below the root, yielding `(index, depth, node)` with
    /// depth 0 for the root's children.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Number of levels below the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root) - 1
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    fn subtree_eq(&self, a: Index, other: &YamlTree, b: Index) -> bool {
        match (self.get(a), other.get(b)) {
            (Some(x), Some(y)) => {
                x.name == y.name
                    && x.kind == y.kind
                    && x.values == y.values
                    && x.children.len() == y.children.len()
                    && x
                        .children
                        .iter()
                        .zip(&y.children)
                        .all(|(&ca, &cb)| self.subtree_eq(ca, other, cb))
            }
            (None, None) => true,
            _ => false,
        }
    }
}

impl Clone for YamlTree {
    fn clone(&self) -> Self {
        self.deep_copy()
    }
}

/// Structural equality: name, kind, values and children, ignoring indices.
impl PartialEq for YamlTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl Eq for YamlTree {}

pub struct TreeIterator<'a> {
    tree: &'a YamlTree,
    stack: Vec<(Index, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a YamlTree) -> Self {
        let stack = tree.arena[tree.root]
            .children
            .iter()
            .rev()
            .map(|&child| (child, 0))
            .collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, usize, &'a YamlNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current_idx, depth, node));
            }
        }
        None
    }
}
