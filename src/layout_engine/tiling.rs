use super::LayoutMode;
use crate::common::collections::HashSet;
use crate::common::geometry::Rect;
use crate::model::container::{ContainerKind, ContainerTree};
use crate::model::tree::NodeId;

/// Containers whose rectangle changed, in the order they changed.
#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
    order: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl ChangeSet {
    pub fn new() -> Self { Self::default() }

    pub fn record(&mut self, node: NodeId) {
        if self.seen.insert(node) {
            self.order.push(node);
        }
    }

    pub fn contains(&self, node: NodeId) -> bool { self.seen.contains(&node) }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ { self.order.iter().copied() }

    pub fn into_vec(self) -> Vec<NodeId> { self.order }
}

/// Equal share of `length` among `count` children. Rounding is per child,
/// so the shares may not add up to `length` exactly.
fn share(length: i32, count: usize) -> i32 {
    (f64::from(length) * (1.0 / count as f64)).round() as i32
}

/// Rectangles a layout in `mode` hands to `count` children, or `None` when
/// the children keep their own geometry.
pub fn child_rects(mode: LayoutMode, rect: Rect, count: usize) -> Option<Vec<Rect>> {
    if count == 0 {
        return Some(Vec::new());
    }
    match mode {
        LayoutMode::Horizontal => {
            let width = share(rect.width, count);
            Some(
                (0..count as i32)
                    .map(|i| Rect { x: rect.x + i * width, width, ..rect })
                    .collect(),
            )
        }
        LayoutMode::Vertical => {
            let height = share(rect.height, count);
            Some(
                (0..count as i32)
                    .map(|i| Rect { y: rect.y + i * height, height, ..rect })
                    .collect(),
            )
        }
        LayoutMode::Tabbed => Some(vec![rect; count]),
        LayoutMode::Floating => None,
    }
}

/// Assigns `rect` to `node` and recomputes the geometry of its subtree,
/// recording every container whose rectangle actually changed.
pub fn update_rect(tree: &mut ContainerTree, node: NodeId, rect: Rect, changes: &mut ChangeSet) {
    let container = &mut tree[node].data;
    if container.rect != rect {
        container.rect = rect;
        changes.record(node);
    }

    let children = tree.children(node).to_vec();
    let rects = match &tree[node].data.kind {
        ContainerKind::Window(_) => return,
        ContainerKind::Layout(layout) => child_rects(layout.mode, rect, children.len()),
        ContainerKind::Workspace(_) => Some(vec![rect; children.len()]),
    };
    match rects {
        Some(rects) => {
            for (child, rect) in children.into_iter().zip(rects) {
                update_rect(tree, child, rect, changes);
            }
        }
        None => {
            for child in children {
                let own = tree[child].data.rect;
                update_rect(tree, child, own, changes);
            }
        }
    }
}

/// Recomputes the subtree of `node` from the rectangle it already has.
pub fn relayout(tree: &mut ContainerTree, node: NodeId, changes: &mut ChangeSet) {
    let rect = tree[node].data.rect;
    update_rect(tree, node, rect, changes);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::container::Container;
    use crate::model::window::WindowId;
    use crate::model::workspace::WorkspaceId;

    const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

    #[test]
    fn horizontal_split() {
        assert_eq!(
            child_rects(LayoutMode::Horizontal, SCREEN, 2).unwrap(),
            [Rect::new(0, 0, 960, 1080), Rect::new(960, 0, 960, 1080)]
        );
    }

    #[test]
    fn vertical_split_with_offset() {
        let rect = Rect::new(100, 50, 800, 600);
        assert_eq!(
            child_rects(LayoutMode::Vertical, rect, 3).unwrap(),
            [
                Rect::new(100, 50, 800, 200),
                Rect::new(100, 250, 800, 200),
                Rect::new(100, 450, 800, 200),
            ]
        );
    }

    #[test]
    fn rounding_is_not_corrected() {
        let rects = child_rects(LayoutMode::Horizontal, Rect::new(0, 0, 100, 10), 3).unwrap();
        assert_eq!(rects.iter().map(|r| r.width).collect::<Vec<_>>(), [33, 33, 33]);
        assert_eq!(rects[2].x, 66);

        let rects = child_rects(LayoutMode::Horizontal, Rect::new(0, 0, 101, 10), 2).unwrap();
        assert_eq!(rects.iter().map(|r| r.width).collect::<Vec<_>>(), [51, 51]);
        assert_eq!(rects[1].x + rects[1].width, 102);
    }

    #[test]
    fn tabbed_and_floating() {
        assert_eq!(child_rects(LayoutMode::Tabbed, SCREEN, 3).unwrap(), [SCREEN; 3]);
        assert_eq!(child_rects(LayoutMode::Floating, SCREEN, 3), None);
        assert_eq!(child_rects(LayoutMode::Vertical, SCREEN, 0), Some(vec![]));
    }

    #[test]
    fn update_rect_recurses_and_records_changes() {
        let mut tree = ContainerTree::new();
        let root = tree.insert(Container::workspace(WorkspaceId(1)));
        let floating = tree.insert(Container::layout(LayoutMode::Floating));
        let tiling = tree.insert(Container::layout(LayoutMode::Horizontal));
        let nested = tree.insert(Container::layout(LayoutMode::Vertical));
        let a = tree.insert(Container::window(WindowId(1)));
        let b = tree.insert(Container::window(WindowId(2)));
        let c = tree.insert(Container::window(WindowId(3)));
        let f = tree.insert(Container {
            rect: Rect::new(10, 10, 100, 100),
            ..Container::window(WindowId(4))
        });
        tree.add(root, floating).unwrap();
        tree.add(root, tiling).unwrap();
        tree.add(floating, f).unwrap();
        tree.add(tiling, a).unwrap();
        tree.add(tiling, nested).unwrap();
        tree.add(nested, b).unwrap();
        tree.add(nested, c).unwrap();

        let mut changes = ChangeSet::new();
        update_rect(&mut tree, root, SCREEN, &mut changes);

        assert_eq!(tree[floating].data.rect, SCREEN);
        assert_eq!(tree[f].data.rect, Rect::new(10, 10, 100, 100));
        assert_eq!(tree[a].data.rect, Rect::new(0, 0, 960, 1080));
        assert_eq!(tree[nested].data.rect, Rect::new(960, 0, 960, 1080));
        assert_eq!(tree[b].data.rect, Rect::new(960, 0, 960, 540));
        assert_eq!(tree[c].data.rect, Rect::new(960, 540, 960, 540));
        assert!(!changes.contains(f));
        assert_eq!(changes.len(), 7);

        let mut again = ChangeSet::new();
        update_rect(&mut tree, root, SCREEN, &mut again);
        assert!(again.is_empty());
    }

    #[test]
    fn change_set_deduplicates() {
        let mut tree = ContainerTree::new();
        let n = tree.insert(Container::window(WindowId(1)));
        let mut changes = ChangeSet::new();
        changes.record(n);
        changes.record(n);
        assert_eq!(changes.into_vec(), [n]);
    }
}
