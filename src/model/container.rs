use serde::{Deserialize, Serialize};
use strum::EnumDiscriminants;

use super::tree::Tree;
use super::window::WindowId;
use super::workspace::WorkspaceId;
use crate::common::geometry::Rect;
use crate::layout_engine::LayoutMode;

pub type ContainerTree = Tree<Container>;

/// Opaque handle to decoration state an adapter attaches to a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameHandle(pub u64);

/// A node of a workspace tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub rect: Rect,
    pub kind: ContainerKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, EnumDiscriminants)]
#[strum_discriminants(name(ContainerType), derive(Hash))]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Leaf holding a client window.
    Window(WindowId),
    /// Interior node arranging its children.
    Layout(LayoutContainer),
    /// Root of a workspace tree.
    Workspace(WorkspaceId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutContainer {
    pub mode: LayoutMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameHandle>,
}

impl Container {
    pub fn window(id: WindowId) -> Self {
        Container { rect: Rect::default(), kind: ContainerKind::Window(id) }
    }

    pub fn layout(mode: LayoutMode) -> Self {
        Container {
            rect: Rect::default(),
            kind: ContainerKind::Layout(LayoutContainer { mode, frame: None }),
        }
    }

    pub fn workspace(id: WorkspaceId) -> Self {
        Container { rect: Rect::default(), kind: ContainerKind::Workspace(id) }
    }

    pub fn container_type(&self) -> ContainerType { (&self.kind).into() }

    pub fn window_id(&self) -> Option<WindowId> {
        match self.kind {
            ContainerKind::Window(id) => Some(id),
            _ => None,
        }
    }

    pub fn layout_mode(&self) -> Option<LayoutMode> {
        match &self.kind {
            ContainerKind::Layout(layout) => Some(layout.mode),
            _ => None,
        }
    }

    pub fn as_layout_mut(&mut self) -> Option<&mut LayoutContainer> {
        match &mut self.kind {
            ContainerKind::Layout(layout) => Some(layout),
            _ => None,
        }
    }
}
