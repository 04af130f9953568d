use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::error::RenderError;

/// Stable identifier of an entity, as issued by the game-state store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A grid cell coordinate. Zero-indexed, x grows right, y grows down.
///
/// Serializes as a `[x, y]` pair, the shape the store uses for positions.
/// Overlay maps key cells by the string form `"x,y"` (see [`FromStr`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: `max(|dx|, |dy|)`.
    pub fn chebyshev(self, other: GridPos) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }

    /// Pixel position of this cell's center for the given on-screen tile size.
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            self.x as f32 * tile_size + tile_size / 2.0,
            self.y as f32 * tile_size + tile_size / 2.0,
        )
    }

    /// Pixel position of this cell's top-left corner.
    pub fn origin(self, tile_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * tile_size, self.y as f32 * tile_size)
    }

    /// Cell containing a layer-local pixel coordinate. Not bounds-checked.
    pub fn from_local(local: Vec2, tile_size: f32) -> Self {
        Self {
            x: (local.x / tile_size).floor() as i32,
            y: (local.y / tile_size).floor() as i32,
        }
    }
}

impl From<[i32; 2]> for GridPos {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<GridPos> for [i32; 2] {
    fn from(p: GridPos) -> Self {
        [p.x, p.y]
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for GridPos {
    type Err = RenderError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let bad = || RenderError::InvalidCellKey(key.to_owned());
        let (x, y) = key.split_once(',').ok_or_else(bad)?;
        let x = x.trim().parse().map_err(|_| bad())?;
        let y = y.trim().parse().map_err(|_| bad())?;
        Ok(Self { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_key_round_trip() {
        let p: GridPos = "3,12".parse().unwrap();
        assert_eq!(p, GridPos::new(3, 12));
        assert_eq!(p.to_string(), "3,12");
    }

    #[test]
    fn malformed_cell_keys_are_rejected() {
        assert!("3".parse::<GridPos>().is_err());
        assert!("a,b".parse::<GridPos>().is_err());
        assert!("".parse::<GridPos>().is_err());
    }

    #[test]
    fn chebyshev_takes_the_larger_axis() {
        let a = GridPos::new(2, 2);
        assert_eq!(a.chebyshev(GridPos::new(5, 3)), 3);
        assert_eq!(a.chebyshev(GridPos::new(1, 0)), 2);
        assert_eq!(a.chebyshev(a), 0);
    }

    #[test]
    fn center_anchors_to_middle_of_tile() {
        assert_eq!(GridPos::new(3, 2).center(40.0), Vec2::new(140.0, 100.0));
    }

    #[test]
    fn local_pixels_floor_to_cells() {
        assert_eq!(GridPos::from_local(Vec2::new(85.0, 122.0), 40.0), GridPos::new(2, 3));
        assert_eq!(GridPos::from_local(Vec2::new(-1.0, 0.0), 40.0), GridPos::new(-1, 0));
    }

    #[test]
    fn positions_deserialize_from_pairs() {
        let p: GridPos = serde_json::from_str("[4, 7]").unwrap();
        assert_eq!(p, GridPos::new(4, 7));
    }
}
