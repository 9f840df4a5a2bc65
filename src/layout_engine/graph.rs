use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Sibling offset this direction moves by.
    pub fn offset(self) -> isize {
        match self {
            Direction::Left | Direction::Up => -1,
            Direction::Right | Direction::Down => 1,
        }
    }

    /// The sibling index one step away from `i`, if it exists.
    pub fn step(self, i: usize, len: usize) -> Option<usize> {
        let next = i.checked_add_signed(self.offset())?;
        (next < len).then_some(next)
    }
}

/// Arrangement a layout container applies to its children.
#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayoutMode {
    /// Side by side, equal widths.
    #[default]
    Horizontal,
    /// Stacked top to bottom, equal heights.
    Vertical,
    /// All children share the full rectangle.
    Tabbed,
    /// Children keep their own rectangles.
    Floating,
}

impl LayoutMode {
    /// Axis along which directional commands move between children, if any.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            LayoutMode::Horizontal | LayoutMode::Tabbed => Some(Orientation::Horizontal),
            LayoutMode::Vertical => Some(Orientation::Vertical),
            LayoutMode::Floating => None,
        }
    }

    pub fn responds_to(self, direction: Direction) -> bool {
        self.orientation() == Some(direction.orientation())
    }

    pub fn is_tiling(self) -> bool { self != LayoutMode::Floating }
}
