use generational_arena::Index;
use itertools::Itertools;
use termtree::Tree;

use crate::domain::tree::{NodeKind, YamlNode, YamlTree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &YamlNode) -> String {
    match node.kind {
        NodeKind::Mapping => node.name.clone(),
        NodeKind::Scalar => format!("{}: {}", node.name, node.values.join("")),
        NodeKind::List => format!("{}: [{}]", node.name, node.values.iter().join(", ")),
    }
}

impl TreeNodeConvert for YamlTree {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &YamlTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = tree.get(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = tree.get(child_idx) {
                        let mut child_tree = Tree::new(label(child));
                        build_tree(tree, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        let mut root = Tree::new(crate::domain::tree::ROOT_NAME.to_string());
        build_tree(self, self.root(), &mut root);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse_str;

    #[test]
    fn given_document_then_tree_shows_kinds() {
        let tree = parse_str("a:\n  b: 1\n  l:\n    - x\n    - y\n").unwrap();
        let rendered = tree.to_tree_string().to_string();
        assert!(rendered.starts_with("root\n"));
        assert!(rendered.contains("a\n"));
        assert!(rendered.contains("b: 1"));
        assert!(rendered.contains("l: [x, y]"));
    }
}
