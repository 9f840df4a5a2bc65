pub mod container;
pub mod monitor;
pub mod registry;
pub mod tree;
pub mod window;
pub mod window_list;
pub mod workspace;

pub use container::{Container, ContainerKind, ContainerTree, ContainerType, FrameHandle, LayoutContainer};
pub use monitor::{Monitor, MonitorId};
pub use registry::{Registry, RegistryError, RegistryEvent};
pub use tree::{NodeId, Tree, TreeError};
pub use window::{Window, WindowId, WindowSpec};
pub use window_list::{FocusObserver, WindowList};
pub use workspace::{Workspace, WorkspaceId};
