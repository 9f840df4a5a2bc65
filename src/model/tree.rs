use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;

slotmap::new_key_type! {
    /// Represents a node somewhere in the tree.
    pub struct NodeId;
}

/// N-ary tree with ordered children.
///
/// Multiple trees can be contained within one arena. This also makes it easy
/// to move branches between trees: a node with no parent is simply the root
/// of its own tree until it is attached somewhere.
#[derive(Serialize, Deserialize, Debug)]
pub struct Tree<T> {
    map: SlotMap<NodeId, Node<T>>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Node<T> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub data: T,
}

impl<T> Node<T> {
    pub fn parent(&self) -> Option<NodeId> { self.parent }

    pub fn children(&self) -> &[NodeId] { &self.children }

    pub fn is_leaf(&self) -> bool { self.children.is_empty() }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0:?} does not exist")]
    Missing(NodeId),
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("node {child:?} is already attached to {parent:?}")]
    AlreadyAttached { parent: NodeId, child: NodeId },
    #[error("node {0:?} is still attached and cannot be destroyed")]
    StillAttached(NodeId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("position {position} is out of range for {len} children")]
    OutOfRange { position: isize, len: usize },
}

impl<T> Default for Tree<T> {
    fn default() -> Self { Tree { map: SlotMap::default() } }
}

impl<T> Tree<T> {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    pub fn get(&self, id: NodeId) -> Option<&Node<T>> { self.map.get(id) }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> { self.map.get_mut(id) }

    /// Creates a detached node holding `data`.
    pub fn insert(&mut self, data: T) -> NodeId {
        self.map.insert(Node { parent: None, children: Vec::new(), data })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> { self.map.get(id)?.parent }

    /// Children of `id` in order. Empty for missing nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.map.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> { self.children(id).first().copied() }

    pub fn is_leaf(&self, id: NodeId) -> bool { self.children(id).is_empty() }

    /// Index of `id` among its siblings.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        self.children(parent).get(pos.checked_sub(1)?).copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    /// Iterates from `id` up to the root of its tree, `id` included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.contains(id).then_some(id);
        std::iter::from_fn(move || {
            let node = next?;
            next = self.parent(node);
            Some(node)
        })
    }

    pub fn root(&self, id: NodeId) -> Option<NodeId> { self.ancestors(id).last() }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Visits the subtree rooted at `id` depth first, parents before children.
    pub fn traverse_preorder(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = if self.contains(id) { vec![id] } else { vec![] };
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.children(node).iter().rev().copied());
            Some(node)
        })
    }

    pub fn add(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        self.insert_before(parent, len, child)
    }

    /// Attaches the detached node `child` so that it ends up at `position`
    /// among the children of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        position: usize,
        child: NodeId,
    ) -> Result<(), TreeError> {
        self.check_attachable(parent, child)?;
        let len = self.map[parent].children.len();
        if position > len {
            return Err(TreeError::OutOfRange { position: position as isize, len });
        }
        self.map[parent].children.insert(position, child);
        self.map[child].parent = Some(parent);
        Ok(())
    }

    /// Detaches `child` from `parent` and returns the position it held.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.require(parent)?;
        self.require(child)?;
        let position = self.map[parent]
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        self.map[parent].children.remove(position);
        self.map[child].parent = None;
        Ok(position)
    }

    /// Moves the child at `position` by `offset` places among its siblings and
    /// returns its new position.
    pub fn shift(
        &mut self,
        parent: NodeId,
        position: usize,
        offset: isize,
    ) -> Result<usize, TreeError> {
        self.require(parent)?;
        let children = &mut self.map[parent].children;
        let len = children.len();
        if position >= len {
            return Err(TreeError::OutOfRange { position: position as isize, len });
        }
        let target = position as isize + offset;
        if target < 0 || target >= len as isize {
            return Err(TreeError::OutOfRange { position: target, len });
        }
        let child = children.remove(position);
        children.insert(target as usize, child);
        Ok(target as usize)
    }

    /// Moves `child` (attached or not) under `new_parent`, at `position` or at
    /// the end. Nothing changes when an error is returned.
    pub fn transfer_to(
        &mut self,
        child: NodeId,
        new_parent: NodeId,
        position: Option<usize>,
    ) -> Result<(), TreeError> {
        self.require(child)?;
        self.require(new_parent)?;
        if self.is_ancestor(child, new_parent) {
            return Err(TreeError::Cycle { parent: new_parent, child });
        }
        let old_parent = self.map[child].parent;
        let mut len = self.map[new_parent].children.len();
        if old_parent == Some(new_parent) {
            len -= 1;
        }
        let position = position.unwrap_or(len);
        if position > len {
            return Err(TreeError::OutOfRange { position: position as isize, len });
        }
        if let Some(old_parent) = old_parent {
            self.remove(old_parent, child)?;
        }
        self.insert_before(new_parent, position, child)
    }

    /// Frees a detached node and everything below it, returning its data.
    pub fn destroy(&mut self, id: NodeId) -> Result<T, TreeError> {
        let node = self.map.get(id).ok_or(TreeError::Missing(id))?;
        if node.parent.is_some() {
            return Err(TreeError::StillAttached(id));
        }
        let node = self.map.remove(id).ok_or(TreeError::Missing(id))?;
        let mut stack = node.children;
        while let Some(next) = stack.pop() {
            if let Some(removed) = self.map.remove(next) {
                stack.extend(removed.children);
            }
        }
        Ok(node.data)
    }

    fn require(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) { Ok(()) } else { Err(TreeError::Missing(id)) }
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.require(parent)?;
        self.require(child)?;
        if let Some(current) = self.map[child].parent {
            return Err(TreeError::AlreadyAttached { parent: current, child });
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        Ok(())
    }
}

impl<T> Index<NodeId> for Tree<T> {
    type Output = Node<T>;

    #[track_caller]
    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl<T> IndexMut<NodeId> for Tree<T> {
    #[track_caller]
    fn index_mut(&mut self, index: NodeId) -> &mut Self::Output { &mut self.map[index] }
}
