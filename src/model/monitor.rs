use std::fmt;

use serde::{Deserialize, Serialize};

use super::registry::{Registry, RegistryError};
use super::workspace::WorkspaceId;
use crate::common::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(pub u32);

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A physical output and the workspaces assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub id: MonitorId,
    pub name: String,
    pub rect: Rect,
    pub primary: bool,
    workspaces: Vec<WorkspaceId>,
    active: Option<WorkspaceId>,
}

impl Monitor {
    pub fn new(id: MonitorId, name: String, rect: Rect, primary: bool) -> Self {
        Monitor {
            id,
            name,
            rect,
            primary,
            workspaces: Vec::new(),
            active: None,
        }
    }

    /// Assigned workspaces, in assignment order.
    pub fn workspaces(&self) -> &[WorkspaceId] { &self.workspaces }

    /// The workspace currently shown on this monitor.
    pub fn active_workspace(&self) -> Option<WorkspaceId> { self.active }

    pub fn has_workspace(&self, workspace: WorkspaceId) -> bool {
        self.workspaces.contains(&workspace)
    }

    pub(crate) fn attach(&mut self, workspace: WorkspaceId) {
        if !self.has_workspace(workspace) {
            self.workspaces.push(workspace);
        }
        self.active.get_or_insert(workspace);
    }

    pub(crate) fn detach(&mut self, workspace: WorkspaceId) {
        self.workspaces.retain(|&w| w != workspace);
        if self.active == Some(workspace) {
            self.active = self.workspaces.first().copied();
        }
    }

    #[track_caller]
    pub(crate) fn set_active(&mut self, workspace: WorkspaceId) {
        debug_assert!(self.has_workspace(workspace), "{workspace} is not on monitor {}", self.id);
        self.active = Some(workspace);
    }
}

pub fn monitor_of(monitors: &Registry<MonitorId, Monitor>, workspace: WorkspaceId) -> Option<MonitorId> {
    monitors.iter().find(|(_, m)| m.has_workspace(workspace)).map(|(id, _)| id)
}

/// Moves `workspace` onto `target`, detaching it from its previous monitor.
/// Returns the previous monitor.
pub fn assign_workspace(
    monitors: &mut Registry<MonitorId, Monitor>,
    workspace: WorkspaceId,
    target: MonitorId,
) -> Result<Option<MonitorId>, RegistryError> {
    monitors.at(target)?;
    let previous = monitor_of(monitors, workspace);
    if previous == Some(target) {
        return Ok(previous);
    }
    if let Some(previous) = previous {
        monitors.at_mut(previous)?.detach(workspace);
    }
    monitors.at_mut(target)?.attach(workspace);
    Ok(previous)
}

/// Monitor that inherits workspaces when `leaving` goes away: the primary
/// one if it remains, otherwise the first managed.
pub fn fallback_monitor(
    monitors: &Registry<MonitorId, Monitor>,
    leaving: MonitorId,
) -> Option<MonitorId> {
    let mut remaining = monitors.iter().filter(|(id, _)| *id != leaving);
    let first = remaining.next()?;
    if first.1.primary {
        return Some(first.0);
    }
    remaining.find(|(_, m)| m.primary).map(|(id, _)| id).or(Some(first.0))
}
