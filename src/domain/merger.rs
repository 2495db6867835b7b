//! Folds override documents into a base document.
//!
//! The merge walks the override tree in pre-order while a second cursor
//! tracks the matching parent in the result tree. Both cursors always sit
//! at the same depth: whenever the override cursor climbs `n` levels to
//! find its next node, the result cursor climbs `n` levels too.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::list_merge::{self, DelimiterMap, ListStrategy, MappedList};
use crate::domain::traverse;
use crate::domain::tree::{NodeKind, YamlNode, YamlTree};

/// Default value that deletes a key when used as an override.
pub const DEFAULT_DELETION_TOKEN: &str = "nil";

/// Conflict-resolution settings for a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Scalar value that deletes the matching key; empty disables deletion
    pub deletion_token: String,
    /// List name -> item delimiter for key/value list merging
    pub delimiters: DelimiterMap,
    /// Reject same-named nodes of different kinds
    pub strict: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            deletion_token: DEFAULT_DELETION_TOKEN.to_string(),
            delimiters: DelimiterMap::new(),
            strict: true,
        }
    }
}

/// Merges `trees` in order: the first is the base, each following tree
/// overrides the accumulated result. Any error aborts the whole merge.
pub fn merge(trees: &[YamlTree], options: &MergeOptions) -> DomainResult<YamlTree> {
    let Some((base, overlays)) = trees.split_first() else {
        return Ok(YamlTree::new());
    };
    Merger::new(base, options.clone()).merge(overlays)
}

/// Pair of positions kept in lock-step: the override node being merged and
/// the result node whose children it is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCursor {
    pub result_parent: Index,
    pub overlay_node: Index,
}

impl MergeCursor {
    /// Cursor on the first node of `overlay` against the result root.
    pub fn start(result: &YamlTree, overlay: &YamlTree) -> Option<Self> {
        traverse::down(overlay, overlay.root()).map(|overlay_node| Self {
            result_parent: result.root(),
            overlay_node,
        })
    }

    /// Moves into the children of the current override node, matched
    /// against the children of `result_child`.
    pub fn descend(self, overlay: &YamlTree, result_child: Index) -> Option<Self> {
        traverse::down(overlay, self.overlay_node).map(|overlay_node| Self {
            result_parent: result_child,
            overlay_node,
        })
    }

    /// Moves to the pre-order successor outside the current subtree,
    /// rewinding the result cursor by the same number of levels.
    pub fn advance(self, result: &YamlTree, overlay: &YamlTree) -> DomainResult<Option<Self>> {
        let Some((overlay_node, rewind_depth)) = traverse::next(overlay, self.overlay_node) else {
            return Ok(None);
        };
        let result_parent = traverse::up_x(result, self.result_parent, rewind_depth)
            .ok_or_else(|| {
                DomainError::Internal(format!(
                    "result cursor cannot rewind {} levels from `{}`",
                    rewind_depth,
                    result.path_of(self.result_parent)
                ))
            })?;
        Ok(Some(Self {
            result_parent,
            overlay_node,
        }))
    }
}

/// What to do after merging one node.
enum Step {
    /// Continue with the override node's children under this result node
    Descend(Index),
    /// Continue with the next node outside the override node's subtree
    Advance,
}

/// Accumulates merges into a private copy of the base tree.
pub struct Merger {
    result: YamlTree,
    options: MergeOptions,
    /// Base side of already merged lists, keyed by result node
    mapped_lists: HashMap<Index, MappedList>,
}

impl Merger {
    pub fn new(base: &YamlTree, options: MergeOptions) -> Self {
        Self {
            result: base.deep_copy(),
            options,
            mapped_lists: HashMap::new(),
        }
    }

    /// Folds `overlays` in order and returns the result.
    ///
    /// Consumes the merger, so a failed fold leaves no tree behind.
    pub fn merge(mut self, overlays: &[YamlTree]) -> DomainResult<YamlTree> {
        for overlay in overlays {
            self.merge_tree(overlay)?;
        }
        Ok(self.result)
    }

    /// Folds one override tree into the result.
    #[instrument(level = "debug", skip_all)]
    fn merge_tree(&mut self, overlay: &YamlTree) -> DomainResult<()> {
        let mut cursor = MergeCursor::start(&self.result, overlay);
        let mut visited = 0usize;

        while let Some(current) = cursor {
            visited += 1;
            let step = self.merge_node(current.result_parent, overlay, current.overlay_node)?;
            cursor = match step {
                Step::Descend(result_child) => match current.descend(overlay, result_child) {
                    Some(next) => Some(next),
                    None => current.advance(&self.result, overlay)?,
                },
                Step::Advance => current.advance(&self.result, overlay)?,
            };
        }

        debug!(
            "merged {} override nodes, result has {} nodes",
            visited,
            self.result.len() - 1
        );
        Ok(())
    }

    fn merge_node(
        &mut self,
        result_parent: Index,
        overlay: &YamlTree,
        overlay_idx: Index,
    ) -> DomainResult<Step> {
        let over = overlay.get(overlay_idx).ok_or_else(|| {
            DomainError::Internal("override cursor points to a removed node".to_string())
        })?;

        let Some(result_child) = traverse::find_child(&self.result, result_parent, &over.name)
        else {
            trace!("add `{}`", over.name);
            self.result.copy_from(overlay, overlay_idx, result_parent);
            return Ok(Step::Advance);
        };

        if self.is_deletion(over) {
            trace!("delete `{}`", self.result.path_of(result_child));
            self.result.remove(result_child);
            let result = &self.result;
            self.mapped_lists.retain(|&idx, _| result.contains(idx));
            return Ok(Step::Advance);
        }

        let base_kind = self
            .result
            .get(result_child)
            .map(|n| n.kind)
            .ok_or_else(|| DomainError::Internal("matched node vanished".to_string()))?;

        if base_kind != over.kind {
            return self.merge_different_kind(result_child, base_kind, overlay, overlay_idx);
        }

        match over.kind {
            NodeKind::Scalar => {
                if let Some(node) = self.result.get_mut(result_child) {
                    node.values = over.values.clone();
                }
                Ok(Step::Advance)
            }
            NodeKind::List => {
                self.merge_list(result_child, over)?;
                Ok(Step::Advance)
            }
            NodeKind::Mapping => Ok(Step::Descend(result_child)),
        }
    }

    fn is_deletion(&self, over: &YamlNode) -> bool {
        !self.options.deletion_token.is_empty()
            && over.scalar() == Some(self.options.deletion_token.as_str())
    }

    fn merge_different_kind(
        &mut self,
        result_child: Index,
        base_kind: NodeKind,
        overlay: &YamlTree,
        overlay_idx: Index,
    ) -> DomainResult<Step> {
        if self.options.strict {
            return Err(DomainError::TypeConflict {
                base_key: self.result.path_of(result_child),
                base_kind,
                override_key: overlay.path_of(overlay_idx),
                override_kind: overlay
                    .get(overlay_idx)
                    .map(|n| n.kind)
                    .unwrap_or(NodeKind::Mapping),
            });
        }

        debug!(
            "`{}`: {} replaced by override",
            self.result.path_of(result_child),
            base_kind
        );
        if base_kind == NodeKind::List {
            self.mapped_lists.remove(&result_child);
        }
        self.result.overwrite(result_child, overlay, overlay_idx);
        let result = &self.result;
        self.mapped_lists.retain(|&idx, _| result.contains(idx));
        Ok(Step::Advance)
    }

    fn merge_list(&mut self, result_child: Index, over: &YamlNode) -> DomainResult<()> {
        let strategy = ListStrategy::for_list(&self.options.delimiters, &over.name);
        let cached = self.mapped_lists.remove(&result_child);

        let merged = {
            let base = self
                .result
                .get(result_child)
                .map(|n| n.values.as_slice())
                .unwrap_or(&[]);
            list_merge::merge_lists(
                base,
                cached,
                &over.values,
                strategy,
                &self.options.deletion_token,
            )?
        };

        if let Some(node) = self.result.get_mut(result_child) {
            node.values = strategy.render(&merged);
        }
        self.mapped_lists.insert(result_child, merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse_str;
    use crate::domain::traverse::find_path;

    fn parse(input: &str) -> YamlTree {
        parse_str(input).expect("valid document")
    }

    #[test]
    fn given_cursor_on_deep_node_when_advancing_then_result_cursor_rewinds_equally() {
        let overlay = parse("a:\n  b:\n    c: 1\nd: 2\n");
        let result = overlay.deep_copy();

        let c = find_path(&overlay, &["a", "b", "c"]).unwrap();
        let result_b = find_path(&result, &["a", "b"]).unwrap();
        let cursor = MergeCursor {
            result_parent: result_b,
            overlay_node: c,
        };

        let next = cursor.advance(&result, &overlay).unwrap().unwrap();
        assert_eq!(next.overlay_node, find_path(&overlay, &["d"]).unwrap());
        assert_eq!(next.result_parent, result.root());

        assert_eq!(next.advance(&result, &overlay).unwrap(), None);
    }

    #[test]
    fn given_cache_when_list_node_deleted_then_entry_is_dropped() {
        let base = parse("a:\n  - x\n");
        let mut merger = Merger::new(&base, MergeOptions::default());
        merger.merge_tree(&parse("a:\n  - y\n")).unwrap();
        assert_eq!(merger.mapped_lists.len(), 1);

        merger.merge_tree(&parse("a: nil\n")).unwrap();
        assert!(merger.mapped_lists.is_empty());
        assert!(merger.result.is_empty());
    }

    #[test]
    fn given_override_mapping_without_children_then_continues_with_sibling() {
        let base = parse("a:\n  x: 1\nb: 1\n");
        let merged = merge(&[base, parse("a:\nb: 2\n")], &MergeOptions::default()).unwrap();
        assert_eq!(merged.to_string(), "a:\n  x: 1\nb: 2\n");
    }

    #[test]
    fn given_no_trees_then_result_is_empty() {
        let merged = merge(&[], &MergeOptions::default()).unwrap();
        assert!(merged.is_empty());
    }
}
