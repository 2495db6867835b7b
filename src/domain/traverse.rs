//! Stateless navigation over a [`YamlTree`].

use generational_arena::Index;

use crate::domain::tree::YamlTree;

/// Parent of `node`, none for the root.
pub fn up(tree: &YamlTree, node: Index) -> Option<Index> {
    tree.get(node)?.parent
}

/// Ancestor `x` levels above `node`; `x == 0` returns `node` itself.
pub fn up_x(tree: &YamlTree, node: Index, x: usize) -> Option<Index> {
    let mut current = node;
    for _ in 0..x {
        current = up(tree, current)?;
    }
    Some(current)
}

/// First child of `node`.
pub fn down(tree: &YamlTree, node: Index) -> Option<Index> {
    tree.get(node)?.children.first().copied()
}

/// Sibling right after `node`, none for the last child or the root.
pub fn next_sibling(tree: &YamlTree, node: Index) -> Option<Index> {
    let parent = tree.get(up(tree, node)?)?;
    let pos = parent.children.iter().position(|&c| c == node)?;
    parent.children.get(pos + 1).copied()
}

/// Pre-order successor of `node` that is not one of its descendants.
///
/// Tries the next sibling, then the next sibling of each ancestor in turn.
/// Returns the successor with the number of ancestor hops it took
/// (the rewind depth), or none once the root is reached.
pub fn next(tree: &YamlTree, node: Index) -> Option<(Index, usize)> {
    let mut current = node;
    let mut rewind_depth = 0;
    loop {
        if let Some(sibling) = next_sibling(tree, current) {
            return Some((sibling, rewind_depth));
        }
        current = up(tree, current)?;
        rewind_depth += 1;
    }
}

/// First child of `parent` called `name`.
pub fn find_child(tree: &YamlTree, parent: Index, name: &str) -> Option<Index> {
    tree.get(parent)?
        .children
        .iter()
        .copied()
        .find(|&c| tree.get(c).is_some_and(|n| n.name == name))
}

/// First sibling of `node` called `name` (which may be `node` itself).
pub fn find_sibling(tree: &YamlTree, node: Index, name: &str) -> Option<Index> {
    find_child(tree, up(tree, node)?, name)
}

/// Node reached by following `path` from the root, first match per level.
pub fn find_path(tree: &YamlTree, path: &[&str]) -> Option<Index> {
    path.iter()
        .try_fold(tree.root(), |current, name| find_child(tree, current, name))
}
