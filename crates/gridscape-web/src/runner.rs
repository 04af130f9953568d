use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gridscape::{
    AtlasImage, AtlasManifest, CellHandler, Container, DrawOp, DrawTiming, FixedTimestep,
    FrameData, GridView, InitRequest, InitToken, InputEvent, InputQueue, LifecycleState,
    RenderError, RenderTier, Renderer, SpriteInstance, TextureId, VectorVertex, ViewConfig,
};

/// The page element hosting the canvas. JS performs the actual DOM insert
/// when it sees [`ViewRunner::canvas_attached`] flip, and frees the textures
/// queued in [`HostFrame::released`].
#[derive(Debug)]
pub struct HostContainer {
    width: f32,
    height: f32,
    pixel_ratio: f32,
    attached: Rc<Cell<bool>>,
    frame: Rc<RefCell<HostFrame>>,
}

impl Container for HostContainer {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn attach_canvas(&mut self) {
        self.attached.set(true);
    }

    fn detach_canvas(&mut self) {
        self.attached.set(false);
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.frame.borrow_mut().released.push(texture.0);
    }
}

/// Flat copies of the last drawn frame, laid out for zero-copy reads from JS.
#[derive(Debug, Default)]
pub struct HostFrame {
    /// 8 floats per sprite.
    pub sprites: Vec<f32>,
    /// 6 floats per vertex, triangle list.
    pub vertices: Vec<f32>,
    /// Triples of (list, start, end); list 0 = sprites, 1 = shapes, 2 = texts.
    pub order: Vec<u32>,
    pub texts_json: String,
    pub clear_color: [f32; 4],
    /// Column-major projection matrix.
    pub projection: [f32; 16],
    /// Light uniform floats, empty when lighting is off.
    pub light: Vec<f32>,
    pub texture: Option<u32>,
    pub surface: (u32, u32),
    /// Textures JS should free, drained by [`ViewRunner::take_released_textures`].
    pub released: Vec<u32>,
    pub destroyed: bool,
    pub frames: u32,
}

impl HostFrame {
    fn copy_from(&mut self, frame: &FrameData<'_>) {
        self.sprites.clear();
        self.sprites.extend_from_slice(bytemuck::cast_slice::<SpriteInstance, f32>(frame.sprites));
        self.vertices.clear();
        self.vertices.extend_from_slice(bytemuck::cast_slice::<VectorVertex, f32>(frame.vertices));
        self.order.clear();
        self.order.extend(frame.order.iter().flat_map(|op| match *op {
            DrawOp::Sprites { start, end } => [0, start, end],
            DrawOp::Shapes { start, end } => [1, start, end],
            DrawOp::Texts { start, end } => [2, start, end],
        }));
        let texts: Vec<_> = frame
            .texts
            .iter()
            .map(|t| {
                serde_json::json!({
                    "text": t.content,
                    "x": t.pos.x,
                    "y": t.pos.y,
                    "anchorX": t.anchor.x,
                    "anchorY": t.anchor.y,
                    "fontSize": t.font_size,
                    "color": t.color,
                })
            })
            .collect();
        self.texts_json = serde_json::Value::Array(texts).to_string();
        self.clear_color = frame.clear_color;
        self.projection = bytemuck::cast(frame.camera.projection);
        self.light.clear();
        if let Some(light) = frame.light {
            self.light.extend_from_slice(bytemuck::cast_slice(&[light]));
        }
        self.texture = frame.atlas.map(|t| t.0);
        self.frames += 1;
    }
}

/// Renderer backend that hands frames to the JS draw loop through [`HostFrame`].
#[derive(Debug)]
pub struct HostRenderer {
    frame: Rc<RefCell<HostFrame>>,
}

impl Renderer for HostRenderer {
    fn backend(&self) -> &'static str {
        "webgl2"
    }

    fn tier(&self) -> RenderTier {
        RenderTier::Sdr
    }

    fn draw(&mut self, frame: &FrameData<'_>) -> DrawTiming {
        self.frame.borrow_mut().copy_from(frame);
        DrawTiming::default()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.frame.borrow_mut().surface = (width, height);
    }

    fn destroy(&mut self) {
        let mut frame = self.frame.borrow_mut();
        frame.destroyed = true;
        frame.sprites.clear();
        frame.vertices.clear();
        frame.order.clear();
        frame.texts_json.clear();
    }
}

/// Drives one [`GridView`] from the browser's callbacks.
///
/// wasm-bindgen cannot export this directly with JS callbacks inside, so the
/// bridge keeps one in a `thread_local!` and forwards free functions to it.
pub struct ViewRunner {
    view: GridView,
    input: InputQueue,
    timestep: FixedTimestep,
    attached: Rc<Cell<bool>>,
    frame: Rc<RefCell<HostFrame>>,
    pending: Option<InitRequest>,
}

impl ViewRunner {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            view: GridView::new(config),
            input: InputQueue::new(),
            timestep: FixedTimestep::default(),
            attached: Rc::new(Cell::new(false)),
            frame: Rc::new(RefCell::new(HostFrame::default())),
            pending: None,
        }
    }

    pub fn from_json(config: &str) -> Result<Self, RenderError> {
        Ok(Self::new(ViewConfig::from_json(config)?))
    }

    pub fn set_manifest(&mut self, json: &str) -> Result<(), RenderError> {
        let manifest = AtlasManifest::from_json(json)?;
        self.view.set_manifest(&manifest);
        Ok(())
    }

    /// Begin mounting into a `width` x `height` (CSS px) element. Returns the
    /// init token JS must pass back with each completion.
    pub fn mount(&mut self, width: f32, height: f32, pixel_ratio: f32) -> u64 {
        // Tear the previous mount down while its renderer still reports into
        // the old frame, then carry over textures JS has not freed yet.
        self.view.teardown();
        let released = std::mem::take(&mut self.frame.borrow_mut().released);
        self.attached = Rc::new(Cell::new(false));
        self.frame = Rc::new(RefCell::new(HostFrame {
            released,
            ..HostFrame::default()
        }));
        self.timestep = FixedTimestep::default();
        self.input.drain();

        let request = self.view.init(Box::new(HostContainer {
            width,
            height,
            pixel_ratio: if pixel_ratio > 0.0 { pixel_ratio } else { 1.0 },
            attached: self.attached.clone(),
            frame: self.frame.clone(),
        }));
        let token = request.token.raw();
        self.pending = Some(request);
        token
    }

    /// Path of the atlas image the pending mount wants loaded.
    pub fn atlas_path(&self) -> Option<&str> {
        self.pending.as_ref().map(|r| r.atlas_path.as_str())
    }

    /// Surface size (device px) the pending mount asked for.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.pending.as_ref().map(|r| (r.width, r.height))
    }

    pub fn surface_ready(&mut self, token: u64) -> Result<(), RenderError> {
        let renderer = HostRenderer {
            frame: self.frame.clone(),
        };
        self.view
            .complete_surface(InitToken::from_raw(token), Ok(Box::new(renderer)))
    }

    pub fn surface_failed(&mut self, token: u64, message: &str) -> Result<(), RenderError> {
        self.view.complete_surface(
            InitToken::from_raw(token),
            Err(RenderError::SurfaceCreation(message.to_owned())),
        )
    }

    pub fn atlas_loaded(&mut self, token: u64, texture: u32, width: u32, height: u32) -> Result<(), RenderError> {
        let image = AtlasImage {
            texture: TextureId(texture),
            width,
            height,
        };
        let result = self.view.complete_atlas(InitToken::from_raw(token), Ok(image));
        if result.is_err() {
            // Stale load: the texture was never adopted, so JS still owns it.
            self.frame.borrow_mut().released.push(texture);
        }
        result
    }

    pub fn atlas_failed(&mut self, token: u64, message: &str) -> Result<(), RenderError> {
        self.view.complete_atlas(
            InitToken::from_raw(token),
            Err(RenderError::AtlasUnavailable(message.to_owned())),
        )
    }

    /// Rebuild from the store's JSON. Returns false while not ready.
    pub fn build(&mut self, map: &str, entities: &str, targeting: &str) -> Result<bool, RenderError> {
        Ok(self.view.build_json(map, entities, targeting)?.is_some())
    }

    pub fn play(&mut self, events: &str) -> Result<usize, RenderError> {
        self.view.play_json(events)
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// One animation frame: route queued input, advance effects by the
    /// whole ticks elapsed in `dt` seconds, then draw.
    ///
    /// `handler` runs while the runner is borrowed; hosts whose callbacks may
    /// call back into the runner should record into a `Vec<CellReport>` and
    /// replay it afterwards.
    pub fn frame(&mut self, dt: f32, handler: &mut dyn CellHandler) -> u32 {
        self.view.drain_input(&mut self.input, handler);
        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.view.tick(1.0);
        }
        self.view.render();
        steps
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.resize(width, height);
    }

    pub fn update_light(&mut self, x: f32, y: f32, radius: f32) {
        self.view.update_light(x, y, radius);
    }

    pub fn unmount(&mut self) {
        self.view.teardown();
        self.pending = None;
        self.input.drain();
    }

    pub fn view(&self) -> &GridView {
        &self.view
    }

    pub fn state(&self) -> LifecycleState {
        self.view.state()
    }

    pub fn canvas_attached(&self) -> bool {
        self.attached.get()
    }

    pub fn take_released_textures(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.frame.borrow_mut().released)
    }

    // ---- Pointer accessors for zero-copy reads ----

    pub fn sprites_ptr(&self) -> *const f32 {
        self.frame.borrow().sprites.as_ptr()
    }

    pub fn sprite_count(&self) -> u32 {
        (self.frame.borrow().sprites.len() / SpriteInstance::FLOATS) as u32
    }

    pub fn vertices_ptr(&self) -> *const f32 {
        self.frame.borrow().vertices.as_ptr()
    }

    pub fn vertex_count(&self) -> u32 {
        (self.frame.borrow().vertices.len() / VectorVertex::FLOATS) as u32
    }

    pub fn order_ptr(&self) -> *const u32 {
        self.frame.borrow().order.as_ptr()
    }

    pub fn order_len(&self) -> u32 {
        self.frame.borrow().order.len() as u32
    }

    pub fn texts_json(&self) -> String {
        self.frame.borrow().texts_json.clone()
    }

    pub fn projection(&self) -> Vec<f32> {
        self.frame.borrow().projection.to_vec()
    }

    pub fn clear_color(&self) -> Vec<f32> {
        self.frame.borrow().clear_color.to_vec()
    }

    pub fn light(&self) -> Vec<f32> {
        self.frame.borrow().light.clone()
    }

    pub fn atlas_texture(&self) -> Option<u32> {
        self.frame.borrow().texture
    }

    pub fn frames_drawn(&self) -> u32 {
        self.frame.borrow().frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscape::{CellReport, GridPos};

    const MAP: &str = r#"{"grid": [[0, 0, 0, 0, 0], [0, 0, 0, 0, 0], [0, 0, 0, 0, 0], [0, 0, 0, 0, 0], [0, 0, 0, 0, 0]]}"#;

    fn ready() -> ViewRunner {
        let mut runner = ViewRunner::from_json("{}").unwrap();
        let token = runner.mount(800.0, 600.0, 1.0);
        assert_eq!(runner.atlas_path(), Some("tileset.png"));
        assert_eq!(runner.surface_size(), Some((800, 600)));
        runner.surface_ready(token).unwrap();
        runner.atlas_loaded(token, 3, 512, 512).unwrap();
        assert_eq!(runner.state(), LifecycleState::Ready);
        runner
    }

    #[test]
    fn mount_attaches_canvas_when_ready() {
        let runner = ready();
        assert!(runner.canvas_attached());
    }

    #[test]
    fn frame_routes_input_ticks_and_draws() {
        let mut runner = ready();
        assert!(runner.build(MAP, r#"[{"id": "a", "pos": [1, 1], "name": "Ash", "decorations": [{"kind": "label"}]}]"#, "").unwrap());
        runner
            .play(r#"[{"type": "floating_text", "pos": [2, 2], "text": "-4"}]"#)
            .unwrap();

        // 200x200 grid centered in 800x600 starts at (300, 200).
        runner.push_input(InputEvent::PointerDown { x: 385.0, y: 322.0 });
        let mut reports: Vec<CellReport> = Vec::new();
        let steps = runner.frame(0.035, &mut reports);

        assert_eq!(steps, 2);
        assert_eq!(reports, vec![CellReport::Click(GridPos::new(2, 3))]);
        assert_eq!(runner.frames_drawn(), 1);
        assert!(runner.order_len() > 0);
        assert_eq!(runner.order_len() % 3, 0);
        assert!(runner.texts_json().contains("Ash"));
        assert!(runner.texts_json().contains("-4"));
        assert_eq!(runner.atlas_texture(), Some(3));
        assert_eq!(runner.projection().len(), 16);
        assert!(runner.light().is_empty());
    }

    #[test]
    fn stale_atlas_is_handed_back() {
        let mut runner = ViewRunner::new(ViewConfig::default());
        let first = runner.mount(800.0, 600.0, 2.0);
        let second = runner.mount(800.0, 600.0, 2.0);
        assert_ne!(first, second);

        assert!(runner.atlas_loaded(first, 11, 512, 512).is_err());
        assert_eq!(runner.take_released_textures(), vec![11]);
        assert!(runner.take_released_textures().is_empty());
    }

    #[test]
    fn unmount_before_ready_never_attaches() {
        let mut runner = ViewRunner::new(ViewConfig::default());
        let token = runner.mount(640.0, 480.0, 1.0);
        runner.unmount();
        assert!(runner.surface_ready(token).is_err());
        assert!(!runner.canvas_attached());
        assert_eq!(runner.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn surface_failure_still_becomes_ready() {
        let mut runner = ViewRunner::new(ViewConfig::default());
        let token = runner.mount(640.0, 480.0, 1.0);
        runner.surface_failed(token, "no webgl").unwrap();
        runner.atlas_failed(token, "404").unwrap();
        assert_eq!(runner.state(), LifecycleState::Ready);
        assert!(!runner.canvas_attached());

        let mut reports: Vec<CellReport> = Vec::new();
        runner.frame(0.016, &mut reports);
        assert_eq!(runner.frames_drawn(), 0);
    }

    #[test]
    fn unmount_with_surface_pending_frees_atlas() {
        let mut runner = ViewRunner::new(ViewConfig::default());
        let token = runner.mount(800.0, 600.0, 1.0);
        runner.atlas_loaded(token, 42, 512, 512).unwrap();
        runner.unmount();
        assert_eq!(runner.take_released_textures(), vec![42]);
    }

    #[test]
    fn strict_rejection_frees_atlas_before_surface() {
        let mut runner = ViewRunner::from_json(r#"{"strictAutotile": true}"#).unwrap();
        let token = runner.mount(800.0, 600.0, 1.0);
        runner.atlas_loaded(token, 9, 64, 64).unwrap();
        runner.surface_ready(token).unwrap();
        assert_eq!(runner.state(), LifecycleState::Ready);
        assert_eq!(runner.atlas_texture(), None);
        assert_eq!(runner.take_released_textures(), vec![9]);

        runner.unmount();
        assert!(runner.take_released_textures().is_empty());
    }

    #[test]
    fn remount_keeps_textures_from_previous_mount() {
        let mut runner = ready();
        runner.mount(800.0, 600.0, 1.0);
        assert_eq!(runner.take_released_textures(), vec![3]);
    }

    #[test]
    fn unmount_releases_atlas_and_detaches() {
        let mut runner = ready();
        runner.unmount();
        assert!(!runner.canvas_attached());
        assert_eq!(runner.take_released_textures(), vec![3]);
        assert_eq!(runner.sprite_count(), 0);
    }

    #[test]
    fn bad_json_is_reported() {
        let mut runner = ready();
        assert!(matches!(runner.build("{", "[]", ""), Err(RenderError::Input(_))));
        assert!(matches!(runner.play("nope"), Err(RenderError::Events(_))));
        assert!(matches!(runner.set_manifest("{"), Err(RenderError::Manifest(_))));
        assert!(ViewRunner::from_json(r#"{"tileSize": "big"}"#).is_err());
    }
}
