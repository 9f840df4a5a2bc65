use std::fmt;

use serde::{Deserialize, Serialize};

use super::tree::NodeId;
use super::workspace::WorkspaceId;
use crate::common::geometry::Rect;

/// Protocol-assigned window identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

/// What the adapter knows about a window when it first maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSpec {
    pub name: String,
    pub role: String,
    pub class: String,
    pub floating: bool,
    /// Requested geometry, honored for floating windows.
    pub rect: Option<Rect>,
}

/// A managed client window.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub id: WindowId,
    pub name: String,
    pub role: String,
    pub class: String,
    pub(crate) workspace: WorkspaceId,
    pub(crate) node: NodeId,
    pub(crate) focused: bool,
    pub(crate) floating: bool,
}

impl Window {
    pub(crate) fn new(id: WindowId, spec: WindowSpec, workspace: WorkspaceId, node: NodeId) -> Self {
        Window {
            id,
            name: spec.name,
            role: spec.role,
            class: spec.class,
            workspace,
            node,
            focused: false,
            floating: spec.floating,
        }
    }

    pub fn workspace(&self) -> WorkspaceId { self.workspace }

    /// The tree node holding this window.
    pub fn node(&self) -> NodeId { self.node }

    pub fn is_focused(&self) -> bool { self.focused }

    pub fn is_floating(&self) -> bool { self.floating }
}
