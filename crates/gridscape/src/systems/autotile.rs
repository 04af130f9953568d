//! 4-neighbor autotiling for connected terrain (water, mountains, forest).
//!
//! Bit weights:
//! ```text
//!        N=1
//!   W=2   .   E=4
//!        S=8
//! ```
//! A neighbor sets its bit only when it is inside the grid and holds exactly
//! the target code. Diagonals are never considered.
//!
//! The 16 variants of a connected terrain sit contiguously in the sheet,
//! starting at the base code, so the final index is `base + mask`.

use crate::components::tilemap::TileGrid;

pub const NORTH: u8 = 1;
pub const WEST: u8 = 2;
pub const EAST: u8 = 4;
pub const SOUTH: u8 = 8;

/// Neighbor mask in `[0, 15]` for the cell at `(x, y)`.
pub fn bitmask(grid: &TileGrid, x: i32, y: i32, target: u32) -> u8 {
    let matches = |dx: i32, dy: i32| grid.get(x + dx, y + dy) == Some(target);

    let mut mask = 0;
    if matches(0, -1) {
        mask |= NORTH;
    }
    if matches(-1, 0) {
        mask |= WEST;
    }
    if matches(1, 0) {
        mask |= EAST;
    }
    if matches(0, 1) {
        mask |= SOUTH;
    }
    mask
}

/// Sheet index for a base code at `(x, y)`, joined to its like neighbors.
pub fn resolve_tile_id(grid: &TileGrid, x: i32, y: i32, base: u32) -> u32 {
    base + bitmask(grid, x, y, base) as u32
}

/// Autotile eligibility plus resolution for one grid.
///
/// Codes outside the eligible set pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct Autotiler {
    eligible: Vec<u32>,
}

impl Autotiler {
    pub fn new(eligible: impl IntoIterator<Item = u32>) -> Self {
        let mut eligible: Vec<u32> = eligible.into_iter().collect();
        eligible.sort_unstable();
        eligible.dedup();
        Self { eligible }
    }

    pub fn is_eligible(&self, code: u32) -> bool {
        self.eligible.binary_search(&code).is_ok()
    }

    pub fn eligible(&self) -> &[u32] {
        &self.eligible
    }

    /// Sheet index to draw for the cell at `(x, y)` holding `code`.
    pub fn sheet_index(&self, grid: &TileGrid, x: i32, y: i32, code: u32) -> u32 {
        if self.is_eligible(code) {
            resolve_tile_id(grid, x, y, code)
        } else {
            code
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::GridPos;

    const WATER: u32 = 194;

    fn grid(rows: &[&[u32]]) -> TileGrid {
        TileGrid::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn surrounded_water_uses_last_variant() {
        let g = grid(&[
            &[0, WATER, 0],
            &[WATER, WATER, WATER],
            &[0, WATER, 0],
        ]);
        assert_eq!(bitmask(&g, 1, 1, WATER), 15);
        assert_eq!(resolve_tile_id(&g, 1, 1, WATER), 209);
    }

    #[test]
    fn isolated_tile_has_empty_mask() {
        let g = grid(&[&[0, 0, 0], &[0, WATER, 0], &[0, 0, 0]]);
        assert_eq!(bitmask(&g, 1, 1, WATER), 0);
        assert_eq!(resolve_tile_id(&g, 1, 1, WATER), WATER);
    }

    #[test]
    fn diagonals_are_ignored() {
        let g = grid(&[
            &[WATER, 0, WATER],
            &[0, WATER, 0],
            &[WATER, 0, WATER],
        ]);
        assert_eq!(bitmask(&g, 1, 1, WATER), 0);
    }

    #[test]
    fn edges_only_count_real_neighbors() {
        let g = TileGrid::filled(3, 3, WATER);
        assert_eq!(bitmask(&g, 0, 0, WATER), EAST | SOUTH);
        assert_eq!(bitmask(&g, 2, 2, WATER), NORTH | WEST);
        assert_eq!(bitmask(&g, 1, 0, WATER), WEST | EAST | SOUTH);

        let single = TileGrid::filled(1, 1, WATER);
        assert_eq!(bitmask(&single, 0, 0, WATER), 0);
    }

    #[test]
    fn mask_stays_in_range_for_every_cell() {
        let g = grid(&[
            &[WATER, WATER, 3, WATER],
            &[3, WATER, WATER, WATER],
            &[WATER, 3, WATER, 3],
        ]);
        for (pos, _) in g.iter() {
            assert!(bitmask(&g, pos.x, pos.y, WATER) <= 15);
        }
    }

    #[test]
    fn flipping_a_neighbor_flips_exactly_its_bit() {
        let base = TileGrid::filled(3, 3, 0);
        let neighbors = [
            (GridPos::new(1, 0), NORTH),
            (GridPos::new(0, 1), WEST),
            (GridPos::new(2, 1), EAST),
            (GridPos::new(1, 2), SOUTH),
        ];
        for (cell, bit) in neighbors {
            let mut g = base.clone();
            let before = bitmask(&g, 1, 1, WATER);
            g.set(cell, WATER);
            let after = bitmask(&g, 1, 1, WATER);
            assert_eq!(before ^ after, bit, "neighbor {cell} should toggle bit {bit}");

            g.set(cell, 0);
            assert_eq!(bitmask(&g, 1, 1, WATER), before);
        }
    }

    #[test]
    fn ineligible_codes_pass_through() {
        let tiler = Autotiler::new([WATER, 226]);
        let g = grid(&[&[WATER, WATER], &[5, 5]]);
        assert_eq!(tiler.sheet_index(&g, 0, 1, 5), 5);
        assert_eq!(tiler.sheet_index(&g, 0, 0, WATER), WATER + EAST as u32);
        assert!(tiler.is_eligible(226));
        assert!(!tiler.is_eligible(5));
    }
}
