use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use super::error::LayoutError;
use super::tiling::{ChangeSet, relayout, update_rect};
use super::{Direction, LayoutMode, navigation, placement};
use crate::common::config::Config;
use crate::common::geometry::Rect;
use crate::model::container::{Container, ContainerKind, ContainerTree, FrameHandle};
use crate::model::monitor::{self, Monitor, MonitorId};
use crate::model::registry::{Registry, RegistryEvent};
use crate::model::tree::{NodeId, TreeError};
use crate::model::window::{Window, WindowId, WindowSpec};
use crate::model::window_list::FocusObserver;
use crate::model::workspace::{Workspace, WorkspaceId};

/// Callbacks through which an adapter mirrors focus and geometry into the
/// display protocol.
pub trait WindowHooks {
    fn on_focus(&mut self, _window: WindowId) {}
    fn on_unfocus(&mut self, _window: WindowId) {}
    fn on_rect_changed(&mut self, _window: WindowId, _rect: Rect) {}
}

impl WindowHooks for () {}

/// Which layout a [`LayoutCommand::ChangeLayout`] applies to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutTarget {
    /// The layout holding the focused window, or the tiling layout of the
    /// focused workspace when nothing is focused.
    #[default]
    Focused,
    Workspace(WorkspaceId),
    Container(NodeId),
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    MoveFocus(Direction),
    MoveWindow(Direction),
    FocusWindow(WindowId),
    ChangeLayout {
        #[serde(default)]
        target: LayoutTarget,
        mode: LayoutMode,
    },
    Split(Option<LayoutMode>),
    ToggleFloating,
    SwitchWorkspace(WorkspaceId),
    MoveWindowToWorkspace {
        #[serde(default)]
        window: Option<WindowId>,
        workspace: WorkspaceId,
    },
    AssignWorkspace {
        workspace: WorkspaceId,
        monitor: MonitorId,
    },
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEvent {
    WindowSpawned {
        window: WindowId,
        #[serde(default)]
        workspace: Option<WorkspaceId>,
        #[serde(default)]
        spec: WindowSpec,
    },
    WindowDestroyed(WindowId),
    MonitorAdded {
        monitor: MonitorId,
        #[serde(default)]
        name: String,
        rect: Rect,
        #[serde(default)]
        primary: bool,
    },
    MonitorRemoved(MonitorId),
    MonitorResized {
        monitor: MonitorId,
        rect: Rect,
    },
}

#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    /// Containers whose rectangle changed.
    pub changed: Vec<NodeId>,
    pub focus_window: Option<WindowId>,
    pub workspace_changed_to: Option<WorkspaceId>,
}

/// Keeps `Window::focused` in step with a window list and forwards the
/// transition to the hooks when the workspace is on screen.
struct FocusSync<'a> {
    windows: &'a mut Registry<WindowId, Window>,
    hooks: Option<&'a mut Box<dyn WindowHooks>>,
}

impl FocusObserver for FocusSync<'_> {
    fn focused(&mut self, window: WindowId) {
        if let Some(w) = self.windows.lookup_mut(window) {
            w.focused = true;
        }
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_focus(window);
        }
    }

    fn unfocused(&mut self, window: WindowId) {
        if let Some(w) = self.windows.lookup_mut(window) {
            w.focused = false;
        }
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_unfocus(window);
        }
    }
}

/// Owns every workspace tree together with the window, workspace and
/// monitor registries, and applies events and commands to them.
///
/// A workspace is created the first time anything refers to it. The default
/// workspace from the configuration exists from the start and is focused.
pub struct LayoutEngine {
    tree: ContainerTree,
    windows: Registry<WindowId, Window>,
    workspaces: Registry<WorkspaceId, Workspace>,
    monitors: Registry<MonitorId, Monitor>,
    focused_workspace: WorkspaceId,
    config: Config,
    hooks: Box<dyn WindowHooks>,
}

impl LayoutEngine {
    pub fn new(config: Config) -> Self {
        let default = config.workspaces.default_workspace;
        let mut engine = LayoutEngine {
            tree: ContainerTree::new(),
            windows: Registry::new("window"),
            workspaces: Registry::new("workspace"),
            monitors: Registry::new("monitor"),
            focused_workspace: default,
            config,
            hooks: Box::new(()),
        };
        engine
            .create_workspace(default)
            .expect("an empty registry accepts the default workspace");
        engine
    }

    pub fn set_hooks(&mut self, hooks: impl WindowHooks + 'static) { self.hooks = Box::new(hooks); }

    pub fn subscribe_windows(
        &mut self,
        observer: impl FnMut(RegistryEvent<WindowId>, &Registry<WindowId, Window>) + 'static,
    ) {
        self.windows.subscribe(observer);
    }

    pub fn subscribe_workspaces(
        &mut self,
        observer: impl FnMut(RegistryEvent<WorkspaceId>, &Registry<WorkspaceId, Workspace>) + 'static,
    ) {
        self.workspaces.subscribe(observer);
    }

    pub fn subscribe_monitors(
        &mut self,
        observer: impl FnMut(RegistryEvent<MonitorId>, &Registry<MonitorId, Monitor>) + 'static,
    ) {
        self.monitors.subscribe(observer);
    }

    pub fn config(&self) -> &Config { &self.config }

    pub fn tree(&self) -> &ContainerTree { &self.tree }

    pub fn windows(&self) -> &Registry<WindowId, Window> { &self.windows }

    pub fn workspaces(&self) -> &Registry<WorkspaceId, Workspace> { &self.workspaces }

    pub fn monitors(&self) -> &Registry<MonitorId, Monitor> { &self.monitors }

    pub fn container(&self, node: NodeId) -> Option<&Container> { Some(&self.tree.get(node)?.data) }

    pub fn focused_workspace(&self) -> WorkspaceId { self.focused_workspace }

    /// The focused window of the focused workspace.
    pub fn focused_window(&self) -> Option<WindowId> {
        self.workspaces.lookup(self.focused_workspace)?.window_list.focused()
    }

    pub fn window_rect(&self, window: WindowId) -> Option<Rect> {
        let node = self.windows.lookup(window)?.node;
        Some(self.tree[node].data.rect)
    }

    pub fn monitor_of(&self, workspace: WorkspaceId) -> Option<MonitorId> {
        monitor::monitor_of(&self.monitors, workspace)
    }

    pub fn workspaces_of(&self, monitor: MonitorId) -> Result<&[WorkspaceId], LayoutError> {
        Ok(self.monitors.at(monitor)?.workspaces())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn handle_event(&mut self, event: LayoutEvent) -> Result<EventResponse, LayoutError> {
        match event {
            LayoutEvent::WindowSpawned { window, workspace, spec } => {
                self.spawn(window, workspace, spec)
            }
            LayoutEvent::WindowDestroyed(window) => self.destroy(window),
            LayoutEvent::MonitorAdded { monitor, name, rect, primary } => {
                self.add_monitor(monitor, name, rect, primary)
            }
            LayoutEvent::MonitorRemoved(monitor) => self.remove_monitor(monitor),
            LayoutEvent::MonitorResized { monitor, rect } => self.resize_monitor(monitor, rect),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn handle_command(&mut self, command: LayoutCommand) -> Result<EventResponse, LayoutError> {
        match command {
            LayoutCommand::MoveFocus(direction) => self.move_focus(direction),
            LayoutCommand::MoveWindow(direction) => self.move_window(direction),
            LayoutCommand::FocusWindow(window) => self.focus_window(window),
            LayoutCommand::ChangeLayout { target, mode } => self.change_layout(target, mode),
            LayoutCommand::Split(mode) => self.split(mode),
            LayoutCommand::ToggleFloating => self.toggle_floating(),
            LayoutCommand::SwitchWorkspace(workspace) => self.switch_workspace(workspace),
            LayoutCommand::MoveWindowToWorkspace { window, workspace } => {
                self.move_window_to_workspace(window, workspace)
            }
            LayoutCommand::AssignWorkspace { workspace, monitor } => {
                self.assign_workspace(workspace, monitor)
            }
        }
    }

    /// Starts managing `window` on `workspace` (the focused one by default)
    /// and focuses it there.
    #[instrument(level = "debug", skip(self, spec), fields(floating = spec.floating))]
    pub fn spawn(
        &mut self,
        window: WindowId,
        workspace: Option<WorkspaceId>,
        spec: WindowSpec,
    ) -> Result<EventResponse, LayoutError> {
        self.windows.check_vacant(window)?;
        let ws_id = workspace.unwrap_or(self.focused_workspace);
        let mut changes = ChangeSet::new();
        self.ensure_workspace(ws_id, &mut changes)?;

        let node = self.tree.insert(Container::window(window));
        let ws = self.workspaces.at(ws_id)?;
        let placed = if spec.floating {
            let rect = spec.rect.unwrap_or_else(|| {
                ws.rect(&self.tree).centered(self.config.layout.floating_size)
            });
            placement::place_floating(&mut self.tree, ws, node, rect, &mut changes)
        } else {
            let focused = last_tiling_window(ws, &self.windows);
            let mode = self.config.layout.default_mode;
            placement::place_tiling(&mut self.tree, ws, focused, node, mode, &mut changes)
                .map(|_| ())
        };
        if let Err(e) = placed {
            self.discard(node);
            return Err(e.into());
        }

        self.windows.manage(window, Window::new(window, spec, ws_id, node))?;
        self.workspaces.at_mut(ws_id)?.window_list.add(window);
        self.focus_in_workspace(ws_id, window)?;
        info!(%window, workspace = %ws_id, "window spawned");
        Ok(self.respond(changes))
    }

    /// Stops managing `window`. When it had focus, the next most recently
    /// focused window of its workspace takes over.
    #[instrument(level = "debug", skip(self))]
    pub fn destroy(&mut self, window: WindowId) -> Result<EventResponse, LayoutError> {
        let (ws_id, node) = {
            let w = self.windows.at(window)?;
            (w.workspace, w.node)
        };
        let was_focused = self.unlist(ws_id, window)?;
        let mut changes = ChangeSet::new();
        placement::purge(&mut self.tree, node, &mut changes)?;
        self.tree.destroy(node)?;
        self.windows.unmanage(window)?;
        if was_focused {
            self.refocus(ws_id)?;
        }
        info!(%window, workspace = %ws_id, "window destroyed");
        Ok(self.respond(changes))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn move_focus(&mut self, direction: Direction) -> Result<EventResponse, LayoutError> {
        let ws = self.focused_workspace;
        let Some(current) = self.focused_window() else {
            return Ok(self.respond(ChangeSet::new()));
        };
        let from = self.windows.at(current)?.node;
        match navigation::find_in_direction(&self.tree, from, direction) {
            Some(target) => {
                let window = self.tree[target]
                    .data
                    .window_id()
                    .unwrap_or_else(|| panic!("directional search ended on {target:?}, not a window"));
                self.focus_in_workspace(ws, window)?;
            }
            None => trace!(%current, "no window in that direction"),
        }
        Ok(self.respond(ChangeSet::new()))
    }

    /// Swaps the focused tiling window with its neighbour in `direction`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_window(&mut self, direction: Direction) -> Result<EventResponse, LayoutError> {
        let Some(window) = self.focused_window() else {
            return Ok(self.respond(ChangeSet::new()));
        };
        let w = self.windows.at(window)?;
        let mut changes = ChangeSet::new();
        if w.floating {
            trace!(%window, "floating windows are not moved between siblings");
        } else {
            let node = w.node;
            navigation::move_in_direction(&mut self.tree, node, direction, &mut changes)?;
        }
        Ok(self.respond(changes))
    }

    /// Focuses `window`, switching to its workspace first if needed.
    #[instrument(level = "debug", skip(self))]
    pub fn focus_window(&mut self, window: WindowId) -> Result<EventResponse, LayoutError> {
        let ws = self.windows.at(window)?.workspace;
        let mut response = if ws != self.focused_workspace {
            self.switch_workspace(ws)?
        } else {
            EventResponse::default()
        };
        self.focus_in_workspace(ws, window)?;
        response.focus_window = self.focused_window();
        Ok(response)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn change_layout(
        &mut self,
        target: LayoutTarget,
        mode: LayoutMode,
    ) -> Result<EventResponse, LayoutError> {
        if !mode.is_tiling() {
            return Err(LayoutError::FloatingMode);
        }
        let layout = self.resolve_layout(target)?;
        if let Some(container) = self.tree[layout].data.as_layout_mut() {
            container.mode = mode;
        }
        let mut changes = ChangeSet::new();
        relayout(&mut self.tree, layout, &mut changes);
        debug!(?layout, %mode, "changed layout");
        Ok(self.respond(changes))
    }

    /// Wraps the focused tiling window in a new layout, in `mode` or the
    /// configured split mode.
    #[instrument(level = "debug", skip(self))]
    pub fn split(&mut self, mode: Option<LayoutMode>) -> Result<EventResponse, LayoutError> {
        let mode = mode.unwrap_or(self.config.layout.split_mode);
        if !mode.is_tiling() {
            return Err(LayoutError::FloatingMode);
        }
        let Some(window) = self.focused_window() else {
            return Ok(self.respond(ChangeSet::new()));
        };
        let w = self.windows.at(window)?;
        if w.floating {
            return Err(LayoutError::FloatingWindow(window));
        }
        let node = w.node;
        let mut changes = ChangeSet::new();
        placement::split(&mut self.tree, node, mode, &mut changes)?;
        Ok(self.respond(changes))
    }

    /// Associates a decoration frame with `layout`, or clears it.
    pub fn set_frame(&mut self, layout: NodeId, frame: Option<FrameHandle>) -> Result<(), LayoutError> {
        let container = self
            .tree
            .get_mut(layout)
            .and_then(|node| node.data.as_layout_mut())
            .ok_or(LayoutError::NotALayout(layout))?;
        container.frame = frame;
        trace!(?layout, ?frame, "set frame");
        Ok(())
    }

    /// Moves the focused window between the tiling and floating parts of its
    /// workspace. Focus stays on it.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle_floating(&mut self) -> Result<EventResponse, LayoutError> {
        let Some(window) = self.focused_window() else {
            return Ok(self.respond(ChangeSet::new()));
        };
        let ws_id = self.focused_workspace;
        let (node, floating) = {
            let w = self.windows.at(window)?;
            (w.node, w.floating)
        };
        let mut changes = ChangeSet::new();
        placement::purge(&mut self.tree, node, &mut changes)?;
        let ws = self.workspaces.at(ws_id)?;
        if floating {
            let focused = last_tiling_window(ws, &self.windows);
            let mode = self.config.layout.default_mode;
            placement::place_tiling(&mut self.tree, ws, focused, node, mode, &mut changes)?;
        } else {
            let rect = self.tree[node].data.rect;
            placement::place_floating(&mut self.tree, ws, node, rect, &mut changes)?;
        }
        self.windows.at_mut(window)?.floating = !floating;
        debug!(%window, floating = !floating, "toggled floating");
        Ok(self.respond(changes))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn switch_workspace(&mut self, workspace: WorkspaceId) -> Result<EventResponse, LayoutError> {
        if workspace == self.focused_workspace {
            return Ok(self.respond(ChangeSet::new()));
        }
        let mut changes = ChangeSet::new();
        self.ensure_workspace(workspace, &mut changes)?;
        let previous = std::mem::replace(&mut self.focused_workspace, workspace);

        let hidden = self.workspaces.at(previous)?.window_list.focused();
        if let Some(window) = hidden {
            self.hooks.on_unfocus(window);
        }
        if let Some(monitor) = self.monitor_of(workspace) {
            self.monitors.at_mut(monitor)?.set_active(workspace);
        }
        let shown = self.workspaces.at(workspace)?.window_list.focused();
        match shown {
            Some(window) => self.hooks.on_focus(window),
            None => self.refocus(workspace)?,
        }

        info!(from = %previous, to = %workspace, "switched workspace");
        let mut response = self.respond(changes);
        response.workspace_changed_to = Some(workspace);
        Ok(response)
    }

    /// Moves `window` (the focused window by default) to another workspace,
    /// where it becomes the focused window.
    #[instrument(level = "debug", skip(self))]
    pub fn move_window_to_workspace(
        &mut self,
        window: Option<WindowId>,
        workspace: WorkspaceId,
    ) -> Result<EventResponse, LayoutError> {
        let Some(window) = window.or_else(|| self.focused_window()) else {
            return Ok(self.respond(ChangeSet::new()));
        };
        let (source, node, floating) = {
            let w = self.windows.at(window)?;
            (w.workspace, w.node, w.floating)
        };
        if source == workspace {
            return Ok(self.respond(ChangeSet::new()));
        }
        let mut changes = ChangeSet::new();
        self.ensure_workspace(workspace, &mut changes)?;

        let was_focused = self.unlist(source, window)?;
        placement::purge(&mut self.tree, node, &mut changes)?;
        if was_focused {
            self.refocus(source)?;
        }

        let target = self.workspaces.at(workspace)?;
        if floating {
            let rect = self.tree[node].data.rect;
            placement::place_floating(&mut self.tree, target, node, rect, &mut changes)?;
        } else {
            let focused = last_tiling_window(target, &self.windows);
            let mode = self.config.layout.default_mode;
            placement::place_tiling(&mut self.tree, target, focused, node, mode, &mut changes)?;
        }
        self.windows.at_mut(window)?.workspace = workspace;
        self.workspaces.at_mut(workspace)?.window_list.add(window);
        self.focus_in_workspace(workspace, window)?;
        debug!(%window, from = %source, to = %workspace, "moved window");
        Ok(self.respond(changes))
    }

    /// Starts managing a monitor. The first monitor adopts every workspace;
    /// later ones get an unassigned workspace, or a new one.
    #[instrument(level = "debug", skip(self))]
    pub fn add_monitor(
        &mut self,
        id: MonitorId,
        name: String,
        rect: Rect,
        primary: bool,
    ) -> Result<EventResponse, LayoutError> {
        self.monitors.check_vacant(id)?;
        let primary = primary || self.monitors.is_empty();
        if primary {
            for monitor in self.monitors.values_mut() {
                monitor.primary = false;
            }
        }
        self.monitors.manage(id, Monitor::new(id, name, rect, primary))?;

        let mut changes = ChangeSet::new();
        let unassigned: Vec<WorkspaceId> =
            self.workspaces.ids().filter(|&ws| self.monitor_of(ws).is_none()).collect();
        if self.monitors.len() == 1 {
            for ws in unassigned {
                self.attach_workspace(ws, id, &mut changes)?;
            }
            self.monitors.at_mut(id)?.set_active(self.focused_workspace);
        } else {
            let ws = match unassigned.first() {
                Some(&ws) => ws,
                None => {
                    let ws = self.next_free_workspace();
                    self.create_workspace(ws)?;
                    ws
                }
            };
            self.attach_workspace(ws, id, &mut changes)?;
        }
        info!(monitor = %id, %rect, primary, "monitor added");
        Ok(self.respond(changes))
    }

    /// Stops managing a monitor after handing its workspaces to the primary
    /// monitor, or to the first remaining one.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_monitor(&mut self, id: MonitorId) -> Result<EventResponse, LayoutError> {
        let (moved, was_primary) = {
            let monitor = self.monitors.at(id)?;
            (monitor.workspaces().to_vec(), monitor.primary)
        };
        let fallback = monitor::fallback_monitor(&self.monitors, id);
        let mut changes = ChangeSet::new();
        match fallback {
            Some(fallback) => {
                for &ws in &moved {
                    self.attach_workspace(ws, fallback, &mut changes)?;
                }
                if moved.contains(&self.focused_workspace) {
                    self.monitors.at_mut(fallback)?.set_active(self.focused_workspace);
                }
                if was_primary {
                    self.monitors.at_mut(fallback)?.primary = true;
                }
            }
            None => {
                let monitor = self.monitors.at_mut(id)?;
                for &ws in &moved {
                    monitor.detach(ws);
                }
            }
        }
        self.monitors.unmanage(id)?;
        info!(monitor = %id, ?fallback, "monitor removed");
        Ok(self.respond(changes))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn resize_monitor(&mut self, id: MonitorId, rect: Rect) -> Result<EventResponse, LayoutError> {
        let monitor = self.monitors.at_mut(id)?;
        monitor.rect = rect;
        let assigned = monitor.workspaces().to_vec();
        let mut changes = ChangeSet::new();
        for ws in assigned {
            let root = self.workspaces.at(ws)?.root();
            update_rect(&mut self.tree, root, rect, &mut changes);
        }
        Ok(self.respond(changes))
    }

    /// Moves `workspace` onto `monitor`, creating the workspace if needed.
    #[instrument(level = "debug", skip(self))]
    pub fn assign_workspace(
        &mut self,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Result<EventResponse, LayoutError> {
        self.monitors.at(monitor)?;
        if !self.workspaces.contains(workspace) {
            self.create_workspace(workspace)?;
        }
        let mut changes = ChangeSet::new();
        self.attach_workspace(workspace, monitor, &mut changes)?;
        if workspace == self.focused_workspace {
            self.monitors.at_mut(monitor)?.set_active(workspace);
        }
        Ok(self.respond(changes))
    }

    /// Renders the tree of `workspace`, marking its focused window.
    pub fn draw_tree(&self, workspace: WorkspaceId) -> Result<String, LayoutError> {
        let ws = self.workspaces.at(workspace)?;
        let focused = ws
            .window_list
            .focused()
            .and_then(|w| self.windows.lookup(w))
            .map(|w| w.node);
        let tree = self.ascii_tree(ws.root(), focused);
        let mut out = String::new();
        ascii_tree::write_tree(&mut out, &tree)?;
        Ok(out)
    }

    /// Describes every broken invariant across all workspaces.
    pub fn consistency_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        for (id, ws) in self.workspaces.iter() {
            issues.extend(placement::check_structure(&self.tree, ws));
            let list = ws.window_list();
            if let Some(focused) = list.focused()
                && list.current() != Some(focused)
            {
                issues.push(format!("workspace {id}: focused window {focused} is not last"));
            }
            for window in list.iter() {
                match self.windows.lookup(window) {
                    None => issues.push(format!("workspace {id}: unmanaged window {window} listed")),
                    Some(w) => {
                        if w.workspace != id {
                            issues.push(format!("window {window} listed on {id} but belongs to {}", w.workspace));
                        }
                        if w.focused != (list.focused() == Some(window)) {
                            issues.push(format!("window {window}: focus flag out of sync"));
                        }
                        if self.tree.root(w.node) != Some(ws.root()) {
                            issues.push(format!("window {window} is not in the tree of workspace {id}"));
                        }
                    }
                }
            }
            let in_tree = self
                .tree
                .traverse_preorder(ws.root())
                .filter(|&n| self.tree[n].data.window_id().is_some())
                .count();
            if in_tree != list.len() {
                issues.push(format!(
                    "workspace {id}: {in_tree} windows in the tree, {} in the list",
                    list.len()
                ));
            }
        }
        issues
    }

    fn ascii_tree(&self, node: NodeId, focused: Option<NodeId>) -> ascii_tree::Tree {
        let container = &self.tree[node].data;
        let desc = match &container.kind {
            ContainerKind::Window(wid) => {
                let marker = if focused == Some(node) { "☒" } else { "☐" };
                let name = self.windows.lookup(*wid).map(|w| w.name.as_str()).unwrap_or_default();
                format!("{marker} window {wid} {name:?} {}", container.rect)
            }
            ContainerKind::Layout(layout) => format!("{} {}", layout.mode, container.rect),
            ContainerKind::Workspace(id) => format!("workspace {id} {}", container.rect),
        };
        let children: Vec<_> =
            self.tree.children(node).iter().map(|&c| self.ascii_tree(c, focused)).collect();
        if children.is_empty() {
            ascii_tree::Tree::Leaf(vec![desc])
        } else {
            ascii_tree::Tree::Node(desc, children)
        }
    }

    fn resolve_layout(&self, target: LayoutTarget) -> Result<NodeId, LayoutError> {
        let node = match target {
            LayoutTarget::Focused => match self.focused_window() {
                Some(window) => self.windows.at(window)?.node,
                None => return self.tiling_of(self.focused_workspace),
            },
            LayoutTarget::Workspace(ws) => return self.tiling_of(ws),
            LayoutTarget::Container(node) => node,
        };
        let container = &self.tree.get(node).ok_or(TreeError::Missing(node))?.data;
        let layout = match container.kind {
            ContainerKind::Window(_) => self.tree.parent(node).ok_or(TreeError::Detached(node))?,
            ContainerKind::Layout(_) => node,
            ContainerKind::Workspace(ws) => return self.tiling_of(ws),
        };
        if let Some(ws) = self.floating_owner(layout) {
            return Err(LayoutError::PermanentFloating(ws));
        }
        Ok(layout)
    }

    fn tiling_of(&self, workspace: WorkspaceId) -> Result<NodeId, LayoutError> {
        self.workspaces
            .at(workspace)?
            .tiling(&self.tree)
            .ok_or(LayoutError::NoTilingLayout(workspace))
    }

    /// The workspace whose permanent floating layout `node` is.
    fn floating_owner(&self, node: NodeId) -> Option<WorkspaceId> {
        let root = self.tree.root(node)?;
        match self.tree[root].data.kind {
            ContainerKind::Workspace(ws)
                if self.workspaces.lookup(ws).is_some_and(|w| w.floating() == node) =>
            {
                Some(ws)
            }
            _ => None,
        }
    }

    fn create_workspace(&mut self, id: WorkspaceId) -> Result<(), LayoutError> {
        self.workspaces.check_vacant(id)?;
        let name = self.config.workspaces.name_for(id);
        let workspace = Workspace::create(id, name, &mut self.tree);
        self.workspaces.manage(id, workspace)?;
        debug!(workspace = %id, "created workspace");
        Ok(())
    }

    /// Creates `id` on first reference and puts it on the current monitor.
    fn ensure_workspace(&mut self, id: WorkspaceId, changes: &mut ChangeSet) -> Result<(), LayoutError> {
        if self.workspaces.contains(id) {
            return Ok(());
        }
        self.create_workspace(id)?;
        if let Some(monitor) = self.current_monitor() {
            self.attach_workspace(id, monitor, changes)?;
        }
        Ok(())
    }

    fn attach_workspace(
        &mut self,
        workspace: WorkspaceId,
        monitor: MonitorId,
        changes: &mut ChangeSet,
    ) -> Result<(), LayoutError> {
        monitor::assign_workspace(&mut self.monitors, workspace, monitor)?;
        let rect = self.monitors.at(monitor)?.rect;
        let root = self.workspaces.at(workspace)?.root();
        update_rect(&mut self.tree, root, rect, changes);
        Ok(())
    }

    /// Monitor of the focused workspace, else the primary, else any.
    fn current_monitor(&self) -> Option<MonitorId> {
        self.monitor_of(self.focused_workspace)
            .or_else(|| self.monitors.iter().find(|(_, m)| m.primary).map(|(id, _)| id))
            .or_else(|| self.monitors.ids().next())
    }

    fn next_free_workspace(&self) -> WorkspaceId {
        (1..=u32::MAX)
            .map(WorkspaceId)
            .find(|&ws| !self.workspaces.contains(ws))
            .expect("workspace ids exhausted")
    }

    fn focus_in_workspace(&mut self, ws: WorkspaceId, window: WindowId) -> Result<(), LayoutError> {
        let visible = self.focused_workspace == ws;
        let list = &mut self.workspaces.at_mut(ws)?.window_list;
        let position = list
            .position(window)
            .unwrap_or_else(|| panic!("window {window} missing from the list of workspace {ws}"));
        let mut sync = FocusSync {
            windows: &mut self.windows,
            hooks: visible.then_some(&mut self.hooks),
        };
        list.focus(position, &mut sync);
        Ok(())
    }

    /// Takes `window` out of the list of `ws`. Returns whether it was focused.
    fn unlist(&mut self, ws: WorkspaceId, window: WindowId) -> Result<bool, LayoutError> {
        let visible = self.focused_workspace == ws;
        let list = &mut self.workspaces.at_mut(ws)?.window_list;
        let position = list
            .position(window)
            .unwrap_or_else(|| panic!("window {window} missing from the list of workspace {ws}"));
        let was_focused = list.focused() == Some(window);
        let mut sync = FocusSync {
            windows: &mut self.windows,
            hooks: visible.then_some(&mut self.hooks),
        };
        list.remove(position, &mut sync);
        Ok(was_focused)
    }

    /// Focuses the most recent remaining window of `ws`, if any.
    fn refocus(&mut self, ws: WorkspaceId) -> Result<(), LayoutError> {
        let next = self.workspaces.at(ws)?.window_list.current();
        if let Some(next) = next {
            self.focus_in_workspace(ws, next)?;
        }
        Ok(())
    }

    /// Frees `node` after a failed placement, together with any detached
    /// layout built around it.
    fn discard(&mut self, node: NodeId) {
        let top = self.tree.root(node).unwrap_or(node);
        let freed = if matches!(self.tree[top].data.kind, ContainerKind::Workspace(_)) {
            let mut changes = ChangeSet::new();
            placement::purge(&mut self.tree, node, &mut changes).and_then(|()| self.tree.destroy(node))
        } else {
            self.tree.destroy(top)
        };
        debug_assert!(freed.is_ok(), "could not free {node:?}: {freed:?}");
    }

    fn respond(&mut self, changes: ChangeSet) -> EventResponse {
        let mut changed = Vec::with_capacity(changes.len());
        for node in changes.into_vec() {
            let Some(container) = self.tree.get(node) else { continue };
            if let Some(window) = container.data.window_id() {
                self.hooks.on_rect_changed(window, container.data.rect);
            }
            changed.push(node);
        }
        EventResponse {
            changed,
            focus_window: self.focused_window(),
            workspace_changed_to: None,
        }
    }
}

/// Node of the most recently focused tiling window of `ws`.
fn last_tiling_window(ws: &Workspace, windows: &Registry<WindowId, Window>) -> Option<NodeId> {
    ws.window_list()
        .iter()
        .rev()
        .filter_map(|w| windows.lookup(w))
        .find(|w| !w.floating)
        .map(|w| w.node)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const WS: WorkspaceId = WorkspaceId(1);

    fn engine_with_tree_len() -> (LayoutEngine, usize) {
        let engine = LayoutEngine::new(Config::default());
        let len = engine.tree.len();
        (engine, len)
    }

    #[test]
    fn discard_frees_a_detached_layout_around_the_window() {
        let (mut e, before) = engine_with_tree_len();
        let layout = e.tree.insert(Container::layout(LayoutMode::Horizontal));
        let node = e.tree.insert(Container::window(WindowId(1)));
        e.tree.add(layout, node).unwrap();
        e.discard(node);
        assert_eq!(e.tree.len(), before);
        assert!(!e.tree.contains(layout));
    }

    #[test]
    fn discard_detaches_from_the_floating_layout() {
        let (mut e, before) = engine_with_tree_len();
        let floating = e.workspaces.at(WS).unwrap().floating();
        let node = e.tree.insert(Container::window(WindowId(1)));
        e.tree.add(floating, node).unwrap();
        e.discard(node);
        assert_eq!(e.tree.len(), before);
        assert!(e.tree.children(floating).is_empty());
    }

    #[test]
    fn discard_collapses_a_fresh_tiling_layout() {
        let (mut e, before) = engine_with_tree_len();
        let node = e.tree.insert(Container::window(WindowId(1)));
        let ws = e.workspaces.at(WS).unwrap();
        let mut changes = ChangeSet::new();
        placement::place_tiling(&mut e.tree, ws, None, node, LayoutMode::Horizontal, &mut changes)
            .unwrap();
        e.discard(node);
        assert_eq!(e.tree.len(), before);
        assert_eq!(e.workspaces.at(WS).unwrap().tiling(&e.tree), None);
        assert!(e.consistency_issues().is_empty());
    }
}
