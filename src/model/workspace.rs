use std::fmt;

use serde::{Deserialize, Serialize};

use super::container::{Container, ContainerTree};
use super::tree::NodeId;
use super::window_list::WindowList;
use crate::common::geometry::Rect;
use crate::layout_engine::LayoutMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub u32);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A workspace owns one container tree. Its root always holds a floating
/// layout first, and at most one tiling layout after it.
#[derive(Debug)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    root: NodeId,
    floating: NodeId,
    pub(crate) window_list: WindowList,
}

impl Workspace {
    pub(crate) fn create(id: WorkspaceId, name: String, tree: &mut ContainerTree) -> Workspace {
        let root = tree.insert(Container::workspace(id));
        let floating = tree.insert(Container::layout(LayoutMode::Floating));
        tree.add(root, floating).expect("fresh floating layout must attach to a fresh root");
        Workspace {
            id,
            name,
            root,
            floating,
            window_list: WindowList::default(),
        }
    }

    pub fn root(&self) -> NodeId { self.root }

    /// The permanent floating layout.
    pub fn floating(&self) -> NodeId { self.floating }

    /// The tiling layout, if any window is tiled on this workspace.
    pub fn tiling(&self, tree: &ContainerTree) -> Option<NodeId> {
        tree.children(self.root).iter().copied().find(|&c| c != self.floating)
    }

    pub fn rect(&self, tree: &ContainerTree) -> Rect { tree[self.root].data.rect }

    /// Windows in most-recently-focused-last order.
    pub fn window_list(&self) -> &WindowList { &self.window_list }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::container::ContainerKind;

    #[test]
    fn create_builds_root_and_floating_layout() {
        let mut tree = ContainerTree::new();
        let ws = Workspace::create(WorkspaceId(3), "3".into(), &mut tree);
        assert_eq!(tree.children(ws.root()), &[ws.floating()]);
        assert_eq!(tree[ws.root()].data.kind, ContainerKind::Workspace(WorkspaceId(3)));
        assert_eq!(tree[ws.floating()].data.layout_mode(), Some(LayoutMode::Floating));
        assert_eq!(ws.tiling(&tree), None);
        assert!(ws.window_list().is_empty());
    }

    #[test]
    fn tiling_is_the_non_floating_child() {
        let mut tree = ContainerTree::new();
        let ws = Workspace::create(WorkspaceId(1), "1".into(), &mut tree);
        let layout = tree.insert(Container::layout(LayoutMode::Vertical));
        tree.add(ws.root(), layout).unwrap();
        assert_eq!(ws.tiling(&tree), Some(layout));
    }
}
