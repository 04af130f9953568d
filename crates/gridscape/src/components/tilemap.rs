//! Tile grid and sparse per-cell terrain overlays.
//!
//! The grid stores opaque tile codes in row-major order: index = y * width + x.
//! Codes are resolved to atlas slices by the scene builder (directly, or via
//! autotiling for eligible codes).

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::GridPos;
use crate::core::error::RenderError;

/// Rectangular grid of tile codes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u32>>", into = "Vec<Vec<u32>>")]
pub struct TileGrid {
    width: u32,
    height: u32,
    codes: Vec<u32>,
}

impl TileGrid {
    /// Create a grid filled with a single code.
    pub fn filled(width: u32, height: u32, code: u32) -> Self {
        Self {
            width,
            height,
            codes: vec![code; (width * height) as usize],
        }
    }

    /// Build from rows. Every row must have the length of the first.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, RenderError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut codes = Vec::with_capacity(width * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != width {
                return Err(RenderError::InvalidGrid {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
            codes.extend(cells);
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
            codes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether a cell lies inside the grid.
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Code at a cell, `None` outside the grid.
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if !self.contains(GridPos::new(x, y)) {
            return None;
        }
        Some(self.codes[(y as u32 * self.width + x as u32) as usize])
    }

    /// Set a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: GridPos, code: u32) {
        if self.contains(pos) {
            self.codes[(pos.y as u32 * self.width + pos.x as u32) as usize] = code;
        }
    }

    /// Iterate cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPos, u32)> + '_ {
        let width = self.width.max(1);
        self.codes.iter().enumerate().map(move |(i, &code)| {
            let i = i as u32;
            (GridPos::new((i % width) as i32, (i / width) as i32), code)
        })
    }

    /// Pixel size of the whole grid at the given on-screen tile size.
    pub fn pixel_size(&self, tile_size: f32) -> Vec2 {
        Vec2::new(self.width as f32 * tile_size, self.height as f32 * tile_size)
    }
}

impl TryFrom<Vec<Vec<u32>>> for TileGrid {
    type Error = RenderError;

    fn try_from(rows: Vec<Vec<u32>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<TileGrid> for Vec<Vec<u32>> {
    fn from(grid: TileGrid) -> Self {
        if grid.width == 0 {
            return Vec::new();
        }
        grid.codes
            .chunks(grid.width as usize)
            .map(<[u32]>::to_vec)
            .collect()
    }
}

/// Hazard category painted on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Fire,
    Acid,
    Ice,
    Poison,
    Water,
    /// Bushes, rubble and other difficult terrain.
    Difficult,
    #[serde(other)]
    Unknown,
}

/// Sparse per-cell terrain features, keyed by cell.
///
/// On the wire each map is keyed by `"x,y"` strings.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "RawOverlay")]
pub struct TerrainOverlayMap {
    pub elevation: HashMap<GridPos, i32>,
    pub hazards: HashMap<GridPos, HazardKind>,
    pub items: HashMap<GridPos, String>,
}

impl TerrainOverlayMap {
    pub fn is_empty(&self) -> bool {
        self.elevation.is_empty() && self.hazards.is_empty() && self.items.is_empty()
    }
}

#[derive(Deserialize)]
struct RawOverlay {
    #[serde(default)]
    elevation: HashMap<String, i32>,
    #[serde(default, alias = "terrain")]
    hazards: HashMap<String, HazardKind>,
    #[serde(default)]
    items: HashMap<String, String>,
}

impl TryFrom<RawOverlay> for TerrainOverlayMap {
    type Error = RenderError;

    fn try_from(raw: RawOverlay) -> Result<Self, Self::Error> {
        Ok(Self {
            elevation: rekey(raw.elevation)?,
            hazards: rekey(raw.hazards)?,
            items: rekey(raw.items)?,
        })
    }
}

fn rekey<V>(map: HashMap<String, V>) -> Result<HashMap<GridPos, V>, RenderError> {
    map.into_iter()
        .map(|(key, value)| Ok((key.parse()?, value)))
        .collect()
}
