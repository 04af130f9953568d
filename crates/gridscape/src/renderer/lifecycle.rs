//! Renderer lifecycle.
//!
//! Initialization is asynchronous on every real host: the surface and the
//! atlas image both arrive later, in either order, possibly after the view
//! was already unmounted. The session models this as a state machine:
//!
//! ```text
//! Idle ──init──▶ Initializing ──(surface + atlas done)──▶ Ready
//!                     │                                     │
//!                     └──────────────teardown───────────────┴──▶ Destroyed
//! ```
//!
//! `init` hands out an [`InitToken`]. The host passes it back with each
//! completion; a completion whose token is stale, or that arrives after
//! teardown, destroys whatever it carries instead of attaching it.

use std::fmt;

use crate::assets::atlas::{AtlasImage, TextureAtlas};
use crate::core::error::RenderError;
use crate::core::scene::SceneGraph;
use crate::core::time::Ticker;

use super::camera::Viewport;
use super::traits::{Container, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Initializing,
    Ready,
    Destroyed,
}

/// Identifies one `init` call. Completions for older calls are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InitToken(u64);

impl InitToken {
    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// What the host must start loading after `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct InitRequest {
    pub token: InitToken,
    /// Surface size in device pixels.
    pub width: u32,
    pub height: u32,
    pub resolution: f32,
    pub atlas_path: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct Pending {
    surface_done: bool,
    atlas_done: bool,
}

/// Borrowed view of the session's parts, for systems that need several at once.
pub struct SessionParts<'a> {
    pub scene: &'a mut SceneGraph,
    pub atlas: &'a mut TextureAtlas,
    pub ticker: &'a mut Ticker<SceneGraph>,
    pub renderer: Option<&'a mut (dyn Renderer + 'static)>,
    pub viewport: Viewport,
}

/// Owns the renderer, its canvas host, the atlas, the scene graph and the
/// shared ticker for one mounted view.
pub struct RenderSession {
    state: LifecycleState,
    generation: u64,
    pending: Pending,
    container: Option<Box<dyn Container>>,
    renderer: Option<Box<dyn Renderer>>,
    attached: bool,
    atlas: TextureAtlas,
    scene: SceneGraph,
    ticker: Ticker<SceneGraph>,
    viewport: Viewport,
}

impl RenderSession {
    /// `tile_width`/`tile_height` are the atlas cell size in source pixels.
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            state: LifecycleState::Idle,
            generation: 0,
            pending: Pending::default(),
            container: None,
            renderer: None,
            attached: false,
            atlas: TextureAtlas::new(tile_width, tile_height),
            scene: SceneGraph::new(),
            ticker: Ticker::new(),
            viewport: Viewport::default(),
        }
    }

    /// Start initializing into `container`. A session that is already live
    /// is torn down first.
    pub fn init(&mut self, container: Box<dyn Container>, atlas_path: &str) -> InitRequest {
        if matches!(self.state, LifecycleState::Initializing | LifecycleState::Ready) {
            log::info!("re-initializing live render session");
            self.teardown();
        }

        let (width, height) = container.size();
        self.viewport = Viewport::new(width, height, container.device_pixel_ratio());
        self.container = Some(container);
        self.generation += 1;
        self.pending = Pending::default();
        self.attached = false;
        self.state = LifecycleState::Initializing;

        let (px_width, px_height) = self.viewport.physical_size();
        log::info!(
            "render init #{} requested: {}x{} @{}x, atlas {atlas_path}",
            self.generation,
            width,
            height,
            self.viewport.resolution
        );
        InitRequest {
            token: InitToken(self.generation),
            width: px_width,
            height: px_height,
            resolution: self.viewport.resolution,
            atlas_path: atlas_path.to_owned(),
        }
    }

    fn accepts(&self, token: InitToken) -> bool {
        self.state == LifecycleState::Initializing && token.0 == self.generation
    }

    /// Surface creation finished.
    ///
    /// A failed surface is logged and the session still becomes ready once
    /// the atlas step is done, just without anything to draw to.
    pub fn complete_surface(
        &mut self,
        token: InitToken,
        result: Result<Box<dyn Renderer>, RenderError>,
    ) -> Result<(), RenderError> {
        if !self.accepts(token) {
            log::warn!("discarding surface for stale init #{}", token.0);
            if let Ok(mut renderer) = result {
                renderer.destroy();
            }
            return Err(RenderError::NotInitializing);
        }

        match result {
            Ok(mut renderer) => {
                let (w, h) = self.viewport.physical_size();
                renderer.resize(w, h);
                log::info!("renderer surface ready: {} ({:?})", renderer.backend(), renderer.tier());
                self.renderer = Some(renderer);
            }
            Err(err) => log::error!("{err}; continuing without a renderer"),
        }
        self.pending.surface_done = true;
        self.finish_if_complete();
        Ok(())
    }

    /// Atlas image load finished. A failed load leaves the atlas empty so
    /// every sprite falls back to primitives.
    ///
    /// On a stale token the image is not kept; the caller still owns its texture.
    pub fn complete_atlas(
        &mut self,
        token: InitToken,
        result: Result<AtlasImage, RenderError>,
    ) -> Result<(), RenderError> {
        if !self.accepts(token) {
            log::warn!("discarding atlas for stale init #{}", token.0);
            return Err(RenderError::NotInitializing);
        }

        match result {
            Ok(image) => {
                log::info!("atlas loaded: {}x{} px", image.width, image.height);
                self.atlas.load(image);
            }
            Err(err) => log::warn!("{err}; drawing primitives only"),
        }
        self.pending.atlas_done = true;
        self.finish_if_complete();
        Ok(())
    }

    fn finish_if_complete(&mut self) {
        if !(self.pending.surface_done && self.pending.atlas_done) {
            return;
        }
        if self.renderer.is_some() {
            if let Some(container) = self.container.as_mut() {
                container.attach_canvas();
                self.attached = true;
            }
        }
        self.state = LifecycleState::Ready;
        log::info!("render session #{} ready", self.generation);
    }

    /// Release everything. Safe in any state and any number of times.
    pub fn teardown(&mut self) {
        match self.state {
            LifecycleState::Idle | LifecycleState::Destroyed => return,
            LifecycleState::Initializing | LifecycleState::Ready => {}
        }

        // Invalidate outstanding tokens before anything else.
        self.generation += 1;
        self.ticker.clear();
        self.scene.reset();

        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.release_atlas();
        if let Some(mut container) = self.container.take() {
            if self.attached {
                container.detach_canvas();
            }
        }
        self.attached = false;
        self.pending = Pending::default();
        self.state = LifecycleState::Destroyed;
        log::info!("render session torn down");
    }

    /// Drop the loaded atlas and hand its texture back to the host. Sprites
    /// fall back to primitives from the next build on.
    pub fn release_atlas(&mut self) {
        let Some(texture) = self.atlas.unload() else {
            return;
        };
        match self.container.as_mut() {
            Some(container) => container.release_texture(texture),
            None => log::warn!("atlas texture {texture:?} unloaded with no host to free it"),
        }
    }

    /// Follow a container resize (CSS pixels).
    pub fn resize(&mut self, width: f32, height: f32) {
        if !matches!(self.state, LifecycleState::Initializing | LifecycleState::Ready) {
            return;
        }
        self.viewport = Viewport::new(width, height, self.viewport.resolution);
        if let Some(renderer) = self.renderer.as_mut() {
            let (w, h) = self.viewport.physical_size();
            renderer.resize(w, h);
        }
    }

    /// Advance every running effect. Nothing ticks unless the session is ready.
    pub fn tick(&mut self, delta: f32) -> usize {
        if self.state != LifecycleState::Ready {
            return 0;
        }
        self.ticker.drive(&mut self.scene, delta)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// Whether the canvas is currently in the container.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn atlas_mut(&mut self) -> &mut TextureAtlas {
        &mut self.atlas
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn ticker(&self) -> &Ticker<SceneGraph> {
        &self.ticker
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn parts(&mut self) -> SessionParts<'_> {
        SessionParts {
            scene: &mut self.scene,
            atlas: &mut self.atlas,
            ticker: &mut self.ticker,
            renderer: self.renderer.as_deref_mut(),
            viewport: self.viewport,
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSession")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("attached", &self.attached)
            .field("renderer", &self.renderer.as_ref().map(|r| r.backend()))
            .field("atlas_loaded", &self.atlas.is_loaded())
            .field("nodes", &self.scene.len())
            .field("effects", &self.ticker.len())
            .finish()
    }
}
