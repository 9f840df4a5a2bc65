use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer screen rectangle in root-window coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    /// A rectangle scaled by `fraction` on both axes and centered in `self`.
    pub fn centered(&self, fraction: f64) -> Rect {
        let width = (f64::from(self.width) * fraction).round() as i32;
        let height = (f64::from(self.height) * fraction).round() as i32;
        Rect {
            x: self.x + (self.width - width) / 2,
            y: self.y + (self.height - height) / 2,
            width,
            height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}
