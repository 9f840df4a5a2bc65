use super::Direction;
use super::tiling::{ChangeSet, relayout};
use crate::model::container::ContainerTree;
use crate::model::tree::{NodeId, TreeError};

/// The window reached by moving from `from` in `direction`, or `None` at
/// the edge of the workspace.
///
/// Walks up until a layout responding to the direction's axis has a sibling
/// on that side, then descends into that sibling through first children.
pub fn find_in_direction(tree: &ContainerTree, from: NodeId, direction: Direction) -> Option<NodeId> {
    let mut child = from;
    while let Some(parent) = tree.parent(child) {
        let mode = tree[parent].data.layout_mode()?;
        if mode.responds_to(direction) {
            let next = if direction.offset() < 0 {
                tree.prev_sibling(child)
            } else {
                tree.next_sibling(child)
            };
            if let Some(next) = next {
                return Some(descend(tree, next));
            }
        }
        child = parent;
    }
    None
}

/// First leaf below `node`.
pub fn descend(tree: &ContainerTree, mut node: NodeId) -> NodeId {
    while let Some(first) = tree.first_child(node) {
        node = first;
    }
    node
}

/// Swaps `node` with its neighbour in `direction` when its own layout
/// responds to that axis. Returns whether anything moved.
pub fn move_in_direction(
    tree: &mut ContainerTree,
    node: NodeId,
    direction: Direction,
    changes: &mut ChangeSet,
) -> Result<bool, TreeError> {
    let parent = tree.parent(node).ok_or(TreeError::Detached(node))?;
    let Some(mode) = tree[parent].data.layout_mode() else { return Ok(false) };
    let len = tree.children(parent).len();
    if !mode.responds_to(direction) {
        return Ok(false);
    }
    let position = tree.position(node).ok_or(TreeError::Detached(node))?;
    if direction.step(position, len).is_none() {
        return Ok(false);
    }
    tree.shift(parent, position, direction.offset())?;
    relayout(tree, parent, changes);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::geometry::Rect;
    use crate::layout_engine::LayoutMode;
    use crate::layout_engine::tiling::update_rect;
    use crate::model::container::Container;
    use crate::model::window::WindowId;
    use crate::model::workspace::WorkspaceId;

    /// ```text
    /// workspace
    /// └── H
    ///     ├── a
    ///     ├── V
    ///     │   ├── b
    ///     │   └── c
    ///     └── d
    /// ```
    struct Fixture {
        tree: ContainerTree,
        h: NodeId,
        v: NodeId,
        a: NodeId,
        b: NodeId,
        c: NodeId,
        d: NodeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut tree = ContainerTree::new();
            let root = tree.insert(Container::workspace(WorkspaceId(1)));
            let h = tree.insert(Container::layout(LayoutMode::Horizontal));
            let v = tree.insert(Container::layout(LayoutMode::Vertical));
            let [a, b, c, d] = [1, 2, 3, 4].map(|id| tree.insert(Container::window(WindowId(id))));
            tree.add(root, h).unwrap();
            for n in [a, v, d] {
                tree.add(h, n).unwrap();
            }
            tree.add(v, b).unwrap();
            tree.add(v, c).unwrap();
            update_rect(&mut tree, root, Rect::new(0, 0, 900, 600), &mut ChangeSet::new());
            Fixture { tree, h, v, a, b, c, d }
        }
    }

    #[test]
    fn horizontal_moves() {
        let f = Fixture::new();
        assert_eq!(find_in_direction(&f.tree, f.a, Direction::Right), Some(f.b));
        assert_eq!(find_in_direction(&f.tree, f.c, Direction::Right), Some(f.d));
        assert_eq!(find_in_direction(&f.tree, f.c, Direction::Left), Some(f.a));
        assert_eq!(find_in_direction(&f.tree, f.d, Direction::Left), Some(f.b));
    }

    #[test]
    fn vertical_moves() {
        let f = Fixture::new();
        assert_eq!(find_in_direction(&f.tree, f.b, Direction::Down), Some(f.c));
        assert_eq!(find_in_direction(&f.tree, f.c, Direction::Up), Some(f.b));
        assert_eq!(find_in_direction(&f.tree, f.a, Direction::Down), None);
    }

    #[test]
    fn edges_do_not_wrap() {
        let f = Fixture::new();
        assert_eq!(find_in_direction(&f.tree, f.a, Direction::Left), None);
        assert_eq!(find_in_direction(&f.tree, f.d, Direction::Right), None);
        assert_eq!(find_in_direction(&f.tree, f.b, Direction::Up), None);
    }

    #[test]
    fn tabbed_layouts_respond_horizontally() {
        let mut f = Fixture::new();
        f.tree[f.v].data.as_layout_mut().unwrap().mode = LayoutMode::Tabbed;
        assert_eq!(find_in_direction(&f.tree, f.b, Direction::Right), Some(f.c));
        assert_eq!(find_in_direction(&f.tree, f.c, Direction::Right), Some(f.d));
        assert_eq!(find_in_direction(&f.tree, f.b, Direction::Down), None);
    }

    #[test]
    fn move_swaps_with_neighbour() {
        let mut f = Fixture::new();
        let mut changes = ChangeSet::new();
        assert_eq!(move_in_direction(&mut f.tree, f.a, Direction::Right, &mut changes), Ok(true));
        assert_eq!(f.tree.children(f.h), &[f.v, f.a, f.d]);
        assert_eq!(f.tree[f.a].data.rect.x, 300);
        assert!(changes.contains(f.a) && changes.contains(f.b));

        assert_eq!(move_in_direction(&mut f.tree, f.c, Direction::Up, &mut changes), Ok(true));
        assert_eq!(f.tree.children(f.v), &[f.c, f.b]);
    }

    #[test]
    fn move_stays_inside_its_layout() {
        let mut f = Fixture::new();
        let mut changes = ChangeSet::new();
        assert_eq!(move_in_direction(&mut f.tree, f.b, Direction::Right, &mut changes), Ok(false));
        assert_eq!(move_in_direction(&mut f.tree, f.d, Direction::Right, &mut changes), Ok(false));
        assert_eq!(move_in_direction(&mut f.tree, f.d, Direction::Left, &mut changes), Ok(true));
        assert_eq!(f.tree.children(f.h), &[f.a, f.d, f.v]);
        assert!(changes.contains(f.d) && changes.contains(f.c));
    }
}
