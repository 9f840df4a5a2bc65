pub mod engine;
pub mod error;
pub(crate) mod graph;
pub mod navigation;
pub mod placement;
pub mod tiling;

pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent, LayoutTarget, WindowHooks};
pub use error::LayoutError;
pub use graph::{Direction, LayoutMode, Orientation};
pub use tiling::ChangeSet;
