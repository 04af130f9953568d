//! Pointer routing: canvas coordinates to grid cells.
//!
//! Only the background layer is hit-testable. Presses outside the grid are
//! ignored and so is dragging over cells outside it; hover outside the grid
//! reports `None`.

use glam::Vec2;

use crate::api::types::GridPos;
use crate::core::scene::WorldTransform;
use crate::input::queue::InputEvent;

/// Receiver of cell interactions, implemented by the game-logic side.
pub trait CellHandler {
    fn on_cell_click(&mut self, cell: GridPos);
    fn on_cell_hover(&mut self, cell: Option<GridPos>);
    fn on_cell_drag(&mut self, cell: GridPos);
}

/// A recorded cell interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellReport {
    Click(GridPos),
    Hover(Option<GridPos>),
    Drag(GridPos),
}

impl CellReport {
    /// Deliver this interaction to `handler`.
    pub fn send(self, handler: &mut dyn CellHandler) {
        match self {
            CellReport::Click(cell) => handler.on_cell_click(cell),
            CellReport::Hover(cell) => handler.on_cell_hover(cell),
            CellReport::Drag(cell) => handler.on_cell_drag(cell),
        }
    }
}

/// Collects interactions in order; handy for hosts that poll.
impl CellHandler for Vec<CellReport> {
    fn on_cell_click(&mut self, cell: GridPos) {
        self.push(CellReport::Click(cell));
    }

    fn on_cell_hover(&mut self, cell: Option<GridPos>) {
        self.push(CellReport::Hover(cell));
    }

    fn on_cell_drag(&mut self, cell: GridPos) {
        self.push(CellReport::Drag(cell));
    }
}

/// Hit-test region of the background layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitArea {
    /// Background layer to canvas transform.
    pub transform: WorldTransform,
    pub tile_size: f32,
    pub width: u32,
    pub height: u32,
}

impl HitArea {
    /// Cell under a canvas point, or `None` outside the grid.
    pub fn cell_at(&self, canvas: Vec2) -> Option<GridPos> {
        let local = self.transform.inverse_apply(canvas);
        let cell = GridPos::from_local(local, self.tile_size);
        let inside = cell.x >= 0
            && cell.y >= 0
            && (cell.x as u32) < self.width
            && (cell.y as u32) < self.height;
        inside.then_some(cell)
    }
}

/// Turns raw pointer events into cell callbacks, tracking drag state.
#[derive(Debug, Default)]
pub struct PointerRouter {
    dragging: bool,
}

impl PointerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Dispatch one event. With no hit area (nothing built yet) only drag
    /// release is processed.
    pub fn handle(&mut self, event: InputEvent, area: Option<&HitArea>, handler: &mut dyn CellHandler) {
        match event {
            InputEvent::PointerUp { .. } | InputEvent::PointerUpOutside { .. } => {
                self.dragging = false;
            }
            InputEvent::PointerLeave => {
                if area.is_some() {
                    handler.on_cell_hover(None);
                }
            }
            InputEvent::PointerDown { x, y } => {
                let Some(cell) = area.and_then(|a| a.cell_at(Vec2::new(x, y))) else {
                    return;
                };
                self.dragging = true;
                handler.on_cell_click(cell);
            }
            InputEvent::PointerMove { x, y } => {
                let Some(area) = area else { return };
                let cell = area.cell_at(Vec2::new(x, y));
                handler.on_cell_hover(cell);
                if let (true, Some(cell)) = (self.dragging, cell) {
                    handler.on_cell_drag(cell);
                }
            }
        }
    }

    /// Forget drag state, e.g. after teardown.
    pub fn reset(&mut self) {
        self.dragging = false;
    }
}
