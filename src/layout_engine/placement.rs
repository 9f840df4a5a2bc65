//! Structural edits that keep workspace trees minimal: inserting windows,
//! removing them and collapsing the layouts they leave behind.

use tracing::trace;

use super::LayoutMode;
use super::tiling::{ChangeSet, relayout, update_rect};
use crate::common::geometry::Rect;
use crate::model::container::{Container, ContainerKind, ContainerTree};
use crate::model::tree::{NodeId, TreeError};
use crate::model::workspace::Workspace;

/// Attaches `window` to the tiling part of `workspace` and returns the layout
/// that received it.
///
/// An empty workspace gets a new layout in `mode`. Otherwise the window joins
/// `focused` (the most recently focused tiling window) in its layout, at the
/// end.
pub fn place_tiling(
    tree: &mut ContainerTree,
    workspace: &Workspace,
    focused: Option<NodeId>,
    window: NodeId,
    mode: LayoutMode,
    changes: &mut ChangeSet,
) -> Result<NodeId, TreeError> {
    if let Some(parent) = tree.parent(window) {
        return Err(TreeError::AlreadyAttached { parent, child: window });
    }

    if workspace.tiling(tree).is_none() {
        let layout = tree.insert(Container::layout(mode));
        tree.add(layout, window)?;
        tree.add(workspace.root(), layout)?;
        let rect = workspace.rect(tree);
        update_rect(tree, layout, rect, changes);
        trace!(?layout, ?window, "created tiling layout");
        return Ok(layout);
    }

    let focused = focused.unwrap_or_else(|| {
        panic!("workspace {} has a tiling layout but no focused tiling window", workspace.id)
    });
    let parent = tree
        .parent(focused)
        .unwrap_or_else(|| panic!("focused window {focused:?} is not attached"));
    debug_assert_ne!(parent, workspace.floating(), "focused window must be tiled");
    tree.add(parent, window)?;
    relayout(tree, parent, changes);
    Ok(parent)
}

/// Attaches `window` to the floating layout of `workspace` with its own
/// rectangle.
pub fn place_floating(
    tree: &mut ContainerTree,
    workspace: &Workspace,
    window: NodeId,
    rect: Rect,
    changes: &mut ChangeSet,
) -> Result<(), TreeError> {
    tree.add(workspace.floating(), window)?;
    update_rect(tree, window, rect, changes);
    Ok(())
}

/// Detaches `node` from its parent and collapses the layouts that became
/// empty or redundant, recomputing geometry where the structure changed.
/// The node itself is left detached, not destroyed.
pub fn purge(tree: &mut ContainerTree, node: NodeId, changes: &mut ChangeSet) -> Result<(), TreeError> {
    let parent = tree.parent(node).ok_or(TreeError::Detached(node))?;
    tree.remove(parent, node)?;
    collapse(tree, parent, changes)
}

/// A layout is removable unless it is the floating layout of a workspace.
fn is_collapsible(tree: &ContainerTree, node: NodeId) -> bool {
    match tree[node].data.layout_mode() {
        Some(LayoutMode::Floating) => false,
        Some(_) => tree.parent(node).is_some(),
        None => false,
    }
}

fn collapse(tree: &mut ContainerTree, mut parent: NodeId, changes: &mut ChangeSet) -> Result<(), TreeError> {
    loop {
        if !is_collapsible(tree, parent) {
            relayout(tree, parent, changes);
            return Ok(());
        }
        let grandparent = tree.parent(parent).ok_or(TreeError::Detached(parent))?;
        let children = tree.children(parent).to_vec();
        match *children.as_slice() {
            [] => {
                tree.remove(grandparent, parent)?;
                tree.destroy(parent)?;
                trace!(layout = ?parent, "removed empty layout");
                parent = grandparent;
            }
            [only] if !tree.is_leaf(only) => {
                let position = tree.remove(grandparent, parent)?;
                tree.transfer_to(only, grandparent, Some(position))?;
                tree.destroy(parent)?;
                trace!(layout = ?parent, replacement = ?only, "collapsed redundant layout");
                relayout(tree, grandparent, changes);
                return Ok(());
            }
            _ => {
                relayout(tree, parent, changes);
                return Ok(());
            }
        }
    }
}

/// Wraps `node` in a new layout in `mode`, in place. When `node` is already
/// the only child of its layout, that layout switches to `mode` instead.
/// Returns the layout now holding `node`.
pub fn split(
    tree: &mut ContainerTree,
    node: NodeId,
    mode: LayoutMode,
    changes: &mut ChangeSet,
) -> Result<NodeId, TreeError> {
    let parent = tree.parent(node).ok_or(TreeError::Detached(node))?;
    if tree.children(parent).len() == 1
        && let Some(layout) = tree[parent].data.as_layout_mut()
    {
        layout.mode = mode;
        relayout(tree, parent, changes);
        return Ok(parent);
    }

    let position = tree.remove(parent, node)?;
    let layout = tree.insert(Container { rect: tree[node].data.rect, ..Container::layout(mode) });
    tree.add(layout, node)?;
    tree.insert_before(parent, position, layout)?;
    relayout(tree, parent, changes);
    Ok(layout)
}

/// Checks the structural invariants of the tree rooted at a workspace and
/// describes every violation found.
pub fn check_structure(tree: &ContainerTree, workspace: &Workspace) -> Vec<String> {
    let mut issues = Vec::new();
    let root = workspace.root();
    let children = tree.children(root);
    if children.first() != Some(&workspace.floating()) {
        issues.push(format!("workspace {}: floating layout is not the first child", workspace.id));
    }
    if children.len() > 2 {
        issues.push(format!("workspace {}: root has {} children", workspace.id, children.len()));
    }
    for node in tree.traverse_preorder(root) {
        for &child in tree.children(node) {
            if tree.parent(child) != Some(node) {
                issues.push(format!("{child:?}: parent link does not point at {node:?}"));
            }
        }
        match &tree[node].data.kind {
            ContainerKind::Window(wid) if !tree.is_leaf(node) => {
                issues.push(format!("window {wid} at {node:?} has children"));
            }
            ContainerKind::Workspace(_) if node != root => {
                issues.push(format!("nested workspace root at {node:?}"));
            }
            ContainerKind::Layout(layout) if node != workspace.floating() => {
                match *tree.children(node) {
                    [] => issues.push(format!("empty {} layout at {node:?}", layout.mode)),
                    [only] if !tree.is_leaf(only) => {
                        issues.push(format!("{} layout at {node:?} only wraps a layout", layout.mode))
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    issues
}
