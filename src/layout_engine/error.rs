use thiserror::Error;

use crate::model::registry::RegistryError;
use crate::model::tree::{NodeId, TreeError};
use crate::model::window::WindowId;
use crate::model::workspace::WorkspaceId;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("workspace {0} has no tiling layout")]
    NoTilingLayout(WorkspaceId),
    #[error("the floating layout of workspace {0} cannot change mode")]
    PermanentFloating(WorkspaceId),
    #[error("tiling layouts cannot switch to floating mode")]
    FloatingMode,
    #[error("node {0:?} is not a layout")]
    NotALayout(NodeId),
    #[error("window {0} is floating")]
    FloatingWindow(WindowId),
    #[error("could not render tree")]
    Render(#[from] std::fmt::Error),
}
