//! Browser bridge for the grid view.
//!
//! One [`ViewRunner`] lives in a `thread_local!`; JS drives it through the
//! free functions below. Every call made before `view_init` is logged and
//! ignored.

pub mod runner;

pub use runner::{HostContainer, HostFrame, HostRenderer, ViewRunner};

use std::cell::RefCell;

use gridscape::{CellHandler, CellReport, GridPos, InputEvent, RenderError};
use js_sys::Function;
use wasm_bindgen::prelude::*;

/// Forwards cell interactions to the JS callbacks registered with
/// `view_on_click` / `view_on_hover` / `view_on_drag`.
#[derive(Clone, Default)]
struct JsCellHandler {
    click: Option<Function>,
    hover: Option<Function>,
    drag: Option<Function>,
}

fn call_cell(callback: &Option<Function>, cell: Option<GridPos>) {
    let Some(f) = callback else { return };
    let (x, y) = match cell {
        Some(c) => (JsValue::from(c.x), JsValue::from(c.y)),
        None => (JsValue::NULL, JsValue::NULL),
    };
    if let Err(err) = f.call2(&JsValue::NULL, &x, &y) {
        log::error!("cell callback threw: {err:?}");
    }
}

impl CellHandler for JsCellHandler {
    fn on_cell_click(&mut self, cell: GridPos) {
        call_cell(&self.click, Some(cell));
    }

    fn on_cell_hover(&mut self, cell: Option<GridPos>) {
        call_cell(&self.hover, cell);
    }

    fn on_cell_drag(&mut self, cell: GridPos) {
        call_cell(&self.drag, Some(cell));
    }
}

thread_local! {
    static RUNNER: RefCell<Option<ViewRunner>> = const { RefCell::new(None) };
    static HANDLER: RefCell<JsCellHandler> = RefCell::new(JsCellHandler::default());
}

fn with_runner<R>(f: impl FnOnce(&mut ViewRunner) -> R) -> Option<R> {
    RUNNER.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(runner) => Some(f(runner)),
            None => {
                log::warn!("grid view not initialized; call view_init() first");
                None
            }
        }
    })
}

fn to_js(err: RenderError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn not_initialized() -> JsValue {
    JsValue::from_str("grid view not initialized")
}

fn flatten<T>(result: Option<Result<T, RenderError>>) -> Result<T, JsValue> {
    result.ok_or_else(not_initialized)?.map_err(to_js)
}

#[wasm_bindgen]
pub fn view_init(config_json: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = ViewRunner::from_json(config_json).map_err(to_js)?;
    RUNNER.with(|cell| {
        if let Some(mut old) = cell.borrow_mut().replace(runner) {
            old.unmount();
        }
    });
    log::info!("grid view: initialized");
    Ok(())
}

#[wasm_bindgen]
pub fn view_set_manifest(json: &str) -> Result<(), JsValue> {
    flatten(with_runner(|r| r.set_manifest(json)))
}

// ---- Lifecycle ----

/// Returns the init token to pass back with each completion.
#[wasm_bindgen]
pub fn view_mount(width: f32, height: f32, pixel_ratio: f32) -> f64 {
    with_runner(|r| r.mount(width, height, pixel_ratio) as f64).unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn view_atlas_path() -> Option<String> {
    with_runner(|r| r.atlas_path().map(str::to_owned)).flatten()
}

#[wasm_bindgen]
pub fn view_surface_ready(token: f64) -> Result<(), JsValue> {
    flatten(with_runner(|r| r.surface_ready(token as u64)))
}

#[wasm_bindgen]
pub fn view_surface_failed(token: f64, message: &str) -> Result<(), JsValue> {
    flatten(with_runner(|r| r.surface_failed(token as u64, message)))
}

#[wasm_bindgen]
pub fn view_atlas_loaded(token: f64, texture: u32, width: u32, height: u32) -> Result<(), JsValue> {
    flatten(with_runner(|r| r.atlas_loaded(token as u64, texture, width, height)))
}

#[wasm_bindgen]
pub fn view_atlas_failed(token: f64, message: &str) -> Result<(), JsValue> {
    flatten(with_runner(|r| r.atlas_failed(token as u64, message)))
}

#[wasm_bindgen]
pub fn view_unmount() {
    with_runner(|r| r.unmount());
}

#[wasm_bindgen]
pub fn view_canvas_attached() -> bool {
    with_runner(|r| r.canvas_attached()).unwrap_or(false)
}

/// Textures the view no longer uses. JS frees them.
#[wasm_bindgen]
pub fn view_take_released_textures() -> Vec<u32> {
    with_runner(|r| r.take_released_textures()).unwrap_or_default()
}

// ---- State and effects ----

/// Returns false while the view is not ready yet.
#[wasm_bindgen]
pub fn view_build(map_json: &str, entities_json: &str, targeting_json: &str) -> Result<bool, JsValue> {
    flatten(with_runner(|r| r.build(map_json, entities_json, targeting_json)))
}

#[wasm_bindgen]
pub fn view_play(events_json: &str) -> Result<u32, JsValue> {
    flatten(with_runner(|r| r.play(events_json))).map(|n| n as u32)
}

// ---- Callbacks ----

#[wasm_bindgen]
pub fn view_on_click(callback: Option<Function>) {
    HANDLER.with(|h| h.borrow_mut().click = callback);
}

#[wasm_bindgen]
pub fn view_on_hover(callback: Option<Function>) {
    HANDLER.with(|h| h.borrow_mut().hover = callback);
}

#[wasm_bindgen]
pub fn view_on_drag(callback: Option<Function>) {
    HANDLER.with(|h| h.borrow_mut().drag = callback);
}

// ---- Input ----

#[wasm_bindgen]
pub fn view_pointer_down(x: f32, y: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerDown { x, y }));
}

#[wasm_bindgen]
pub fn view_pointer_up(x: f32, y: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerUp { x, y }));
}

#[wasm_bindgen]
pub fn view_pointer_up_outside(x: f32, y: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerUpOutside { x, y }));
}

#[wasm_bindgen]
pub fn view_pointer_move(x: f32, y: f32) {
    with_runner(|r| r.push_input(InputEvent::PointerMove { x, y }));
}

#[wasm_bindgen]
pub fn view_pointer_leave() {
    with_runner(|r| r.push_input(InputEvent::PointerLeave));
}

// ---- Frame loop ----

/// Run one frame, then deliver the cell reports it produced. Neither
/// `RUNNER` nor `HANDLER` is borrowed while `handler` runs, so callbacks may
/// call any `view_*` function.
fn run_frame(dt: f32, handler: &mut dyn CellHandler) -> u32 {
    let mut reports: Vec<CellReport> = Vec::new();
    let steps = with_runner(|r| r.frame(dt, &mut reports)).unwrap_or(0);
    for report in reports {
        report.send(handler);
    }
    steps
}

/// Call once per animation frame with the elapsed seconds.
#[wasm_bindgen]
pub fn view_frame(dt: f32) -> u32 {
    let mut handler = HANDLER.with(|h| h.borrow().clone());
    run_frame(dt, &mut handler)
}

#[wasm_bindgen]
pub fn view_resize(width: f32, height: f32) {
    with_runner(|r| r.resize(width, height));
}

#[wasm_bindgen]
pub fn view_update_light(x: f32, y: f32, radius: f32) {
    with_runner(|r| r.update_light(x, y, radius));
}

// ---- Frame data accessors ----

#[wasm_bindgen]
pub fn get_sprites_ptr() -> *const f32 {
    with_runner(|r| r.sprites_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_sprite_count() -> u32 {
    with_runner(|r| r.sprite_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_vector_vertices_ptr() -> *const f32 {
    with_runner(|r| r.vertices_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_vector_vertex_count() -> u32 {
    with_runner(|r| r.vertex_count()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_draw_order_ptr() -> *const u32 {
    with_runner(|r| r.order_ptr()).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_draw_order_len() -> u32 {
    with_runner(|r| r.order_len()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_texts_json() -> String {
    with_runner(|r| r.texts_json()).unwrap_or_else(|| "[]".to_owned())
}

#[wasm_bindgen]
pub fn get_projection() -> Vec<f32> {
    with_runner(|r| r.projection()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn get_clear_color() -> Vec<f32> {
    with_runner(|r| r.clear_color()).unwrap_or_default()
}

/// Light uniform floats; empty when lighting is off.
#[wasm_bindgen]
pub fn get_light_uniform() -> Vec<f32> {
    with_runner(|r| r.light()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn get_atlas_texture() -> Option<u32> {
    with_runner(|r| r.atlas_texture()).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscape::LifecycleState;

    const MAP: &str = r#"{"grid": [[0, 0, 0], [0, 0, 0], [0, 0, 0]]}"#;

    fn install_ready_runner() {
        let mut runner = ViewRunner::from_json("{}").unwrap();
        let token = runner.mount(800.0, 600.0, 1.0);
        runner.surface_ready(token).unwrap();
        runner.atlas_loaded(token, 1, 512, 512).unwrap();
        RUNNER.with(|cell| *cell.borrow_mut() = Some(runner));
    }

    /// Rebuilds the view from inside its click callback, like a store that
    /// moves a token on click.
    #[derive(Default)]
    struct RebuildOnClick {
        clicks: Vec<GridPos>,
        rebuilt: Vec<Option<bool>>,
    }

    impl CellHandler for RebuildOnClick {
        fn on_cell_click(&mut self, cell: GridPos) {
            self.clicks.push(cell);
            self.rebuilt.push(with_runner(|r| r.build(MAP, "[]", "").unwrap_or(false)));
        }

        fn on_cell_hover(&mut self, _cell: Option<GridPos>) {
            with_runner(|r| r.state());
        }

        fn on_cell_drag(&mut self, _cell: GridPos) {}
    }

    #[test]
    fn callbacks_may_call_back_into_the_view() {
        install_ready_runner();
        with_runner(|r| {
            r.build(MAP, "[]", "").unwrap();
            // 120x120 grid centered in 800x600 starts at (340, 240).
            r.push_input(InputEvent::PointerMove { x: 350.0, y: 250.0 });
            r.push_input(InputEvent::PointerDown { x: 350.0, y: 250.0 });
        });

        let mut handler = RebuildOnClick::default();
        run_frame(0.02, &mut handler);

        assert_eq!(handler.clicks, vec![GridPos::new(0, 0)]);
        assert_eq!(handler.rebuilt, vec![Some(true)]);
        assert_eq!(with_runner(|r| r.state()), Some(LifecycleState::Ready));
    }

    #[test]
    fn calls_before_init_are_ignored() {
        RUNNER.with(|cell| *cell.borrow_mut() = None);
        let mut handler = RebuildOnClick::default();
        assert_eq!(run_frame(0.02, &mut handler), 0);
        assert!(with_runner(|r| r.state()).is_none());
        assert!(handler.clicks.is_empty());
    }
}
