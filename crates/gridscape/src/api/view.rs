//! The view facade: one mounted tactical map.
//!
//! `GridView` ties the render session, the scene builder, the effect player
//! and pointer routing together behind the handful of calls a host makes:
//!
//! ```ignore
//! let mut view = GridView::new(ViewConfig::from_json(cfg)?);
//! let req = view.init(Box::new(host));
//! // ... later, from the host's async callbacks:
//! view.complete_surface(req.token, Ok(renderer))?;
//! view.complete_atlas(req.token, Ok(image))?;
//! view.build(&map, &entities, &targeting);
//! view.play(parse_events(updates)?);
//! // every animation frame:
//! view.tick(1.0);
//! view.render();
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::atlas::AtlasImage;
use crate::assets::manifest::AtlasManifest;
use crate::assets::registry::IconRegistry;
use crate::components::entity::EntityView;
use crate::components::sprite::Color;
use crate::components::tilemap::{TerrainOverlayMap, TileGrid};
use crate::core::error::RenderError;
use crate::input::pointer::{CellHandler, HitArea, PointerRouter};
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::camera::CameraMode;
use crate::renderer::lifecycle::{InitRequest, InitToken, LifecycleState, RenderSession};
use crate::renderer::traits::{Container, DrawTiming, Renderer};
use crate::systems::autotile::Autotiler;
use crate::systems::builder::{BuildInput, BuildSummary, SceneBuilder, TargetingOverlay};
use crate::systems::effects::{parse_events, EffectPlayer, VisualEvent};
use crate::systems::lighting::{LightConfig, LightFilter};
use crate::systems::palette;
use crate::systems::render::{FrameBuilder, FrameSettings};

/// Where the sprite-sheet lives and how it is cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtlasConfig {
    pub path: String,
    /// Cell width in source pixels.
    pub tile_width: u32,
    /// Cell height in source pixels.
    pub tile_height: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            path: "tileset.png".to_owned(),
            tile_width: 32,
            tile_height: 32,
        }
    }
}

/// View configuration. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// On-screen size of one cell, in CSS pixels.
    pub tile_size: f32,
    pub atlas: AtlasConfig,
    /// Tile codes drawn with autotiling (water, mountain, forest).
    pub autotile_ids: Vec<u32>,
    /// Reject the atlas when an autotile range does not fit in it.
    pub strict_autotile: bool,
    pub camera: CameraMode,
    pub fit_padding: f32,
    pub background: Color,
    pub grid_line: Color,
    /// Point-light filter; off when absent.
    pub light: Option<LightConfig>,
    /// Seed for camera-shake jitter.
    pub effect_seed: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tile_size: 40.0,
            atlas: AtlasConfig::default(),
            autotile_ids: vec![194, 226, 258],
            strict_autotile: false,
            camera: CameraMode::Center,
            fit_padding: 32.0,
            background: palette::FLOOR,
            grid_line: palette::GRID_LINE,
            light: None,
            effect_seed: 0x5eed,
        }
    }
}

impl ViewConfig {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(RenderError::Config)
    }
}

/// Map state: tile grid plus its sparse terrain overlays.
///
/// ```json
/// {"grid": [[0, 1], [0, 0]], "elevation": {"1,0": 2}, "terrain": {"0,1": "fire"}}
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MapData {
    pub grid: TileGrid,
    #[serde(flatten)]
    pub overlay: TerrainOverlayMap,
}

impl MapData {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            overlay: TerrainOverlayMap::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(RenderError::Input)
    }
}

/// Parse an entity snapshot list.
pub fn parse_entities(json: &str) -> Result<Vec<EntityView>, RenderError> {
    serde_json::from_str(json).map_err(RenderError::Input)
}

/// Parse the targeting preview. An empty string means no preview.
pub fn parse_targeting(json: &str) -> Result<TargetingOverlay, RenderError> {
    if json.trim().is_empty() {
        return Ok(TargetingOverlay::default());
    }
    serde_json::from_str(json).map_err(RenderError::Input)
}

/// One mounted tactical grid view.
#[derive(Debug)]
pub struct GridView {
    config: ViewConfig,
    session: RenderSession,
    builder: SceneBuilder,
    effects: EffectPlayer,
    router: PointerRouter,
    frame: FrameBuilder,
    light: Option<LightFilter>,
    last_build: Option<BuildSummary>,
}

impl GridView {
    pub fn new(config: ViewConfig) -> Self {
        let mut builder = SceneBuilder::new(config.tile_size, Autotiler::new(config.autotile_ids.iter().copied()))
            .with_camera(config.camera, config.fit_padding);
        builder.grid_line = config.grid_line;
        Self {
            session: RenderSession::new(config.atlas.tile_width, config.atlas.tile_height),
            effects: EffectPlayer::new(config.effect_seed, config.tile_size),
            router: PointerRouter::new(),
            frame: FrameBuilder::new(),
            light: None,
            last_build: None,
            builder,
            config,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Register named icons from an atlas manifest.
    pub fn set_manifest(&mut self, manifest: &AtlasManifest) {
        self.builder.set_icons(IconRegistry::from_manifest(manifest));
    }

    /// Start mounting into `container`. The host creates the surface and
    /// loads the atlas named in the returned request, then reports back
    /// through [`complete_surface`](Self::complete_surface) and
    /// [`complete_atlas`](Self::complete_atlas).
    pub fn init(&mut self, container: Box<dyn Container>) -> InitRequest {
        self.router.reset();
        self.last_build = None;
        let path = self.config.atlas.path.clone();
        let request = self.session.init(container, &path);
        let viewport = self.session.viewport();
        self.light = self
            .config
            .light
            .as_ref()
            .map(|cfg| LightFilter::new(cfg, viewport.width, viewport.height));
        request
    }

    pub fn complete_surface(
        &mut self,
        token: InitToken,
        result: Result<Box<dyn Renderer>, RenderError>,
    ) -> Result<(), RenderError> {
        self.session.complete_surface(token, result)
    }

    /// Hand over the loaded atlas and check the autotile ranges against it.
    ///
    /// In strict mode a sheet that is too small for an autotile range is
    /// dropped again, so the whole map draws as primitives.
    pub fn complete_atlas(
        &mut self,
        token: InitToken,
        result: Result<AtlasImage, RenderError>,
    ) -> Result<(), RenderError> {
        self.session.complete_atlas(token, result)?;
        if !self.session.atlas().is_loaded() {
            return Ok(());
        }
        if let Err(err) = self.session.atlas().validate_autotile(&self.config.autotile_ids) {
            if self.config.strict_autotile {
                log::error!("{err}; atlas rejected");
                self.session.release_atlas();
            } else {
                log::warn!("{err}; autotiled cells may show wrong tiles");
            }
        }
        Ok(())
    }

    /// Rebuild the scene from the given state. Does nothing until the view
    /// is ready.
    pub fn build(
        &mut self,
        map: &MapData,
        entities: &[EntityView],
        targeting: &TargetingOverlay,
    ) -> Option<&BuildSummary> {
        if !self.session.is_ready() {
            log::debug!("build skipped: view is {:?}", self.session.state());
            return None;
        }
        let parts = self.session.parts();
        let summary = self.builder.build(
            parts.scene,
            parts.atlas,
            parts.viewport.size(),
            &BuildInput {
                grid: &map.grid,
                overlay: &map.overlay,
                entities,
                targeting,
            },
        );
        self.last_build = Some(summary);
        self.last_build.as_ref()
    }

    /// [`build`](Self::build) from the JSON the host store hands over.
    pub fn build_json(
        &mut self,
        map: &str,
        entities: &str,
        targeting: &str,
    ) -> Result<Option<&BuildSummary>, RenderError> {
        let map = MapData::from_json(map)?;
        let entities = parse_entities(entities)?;
        let targeting = parse_targeting(targeting)?;
        Ok(self.build(&map, &entities, &targeting))
    }

    pub fn last_build(&self) -> Option<&BuildSummary> {
        self.last_build.as_ref()
    }

    /// Start one animation per event. Returns how many started; nothing
    /// plays before the view is ready.
    pub fn play(&mut self, events: impl IntoIterator<Item = VisualEvent>) -> usize {
        if !self.session.is_ready() {
            log::debug!("effects dropped: view is {:?}", self.session.state());
            return 0;
        }
        let parts = self.session.parts();
        self.effects.play(events, parts.scene, parts.ticker)
    }

    pub fn play_json(&mut self, json: &str) -> Result<usize, RenderError> {
        let events = parse_events(json)?;
        Ok(self.play(events))
    }

    /// Advance running effects by `delta` ticks. Returns how many finished.
    pub fn tick(&mut self, delta: f32) -> usize {
        self.session.tick(delta)
    }

    /// Number of effects still running.
    pub fn active_effects(&self) -> usize {
        self.session.ticker().len()
    }

    /// Route one pointer event to `handler` as cell interactions.
    pub fn handle_input(&mut self, event: InputEvent, handler: &mut dyn CellHandler) {
        let area = if self.session.is_ready() {
            self.last_build.as_ref().map(|b| &b.hit_area)
        } else {
            None
        };
        self.router.handle(event, area, handler);
    }

    /// Route every queued pointer event, in order.
    pub fn drain_input(&mut self, queue: &mut InputQueue, handler: &mut dyn CellHandler) {
        for event in queue.drain() {
            self.handle_input(event, handler);
        }
    }

    /// The interactive grid area of the last build, while ready.
    pub fn hit_area(&self) -> Option<&HitArea> {
        if !self.session.is_ready() {
            return None;
        }
        self.last_build.as_ref().map(|b| &b.hit_area)
    }

    /// Flatten the scene and hand the frame to the renderer.
    /// `None` when not ready or running without a renderer.
    pub fn render(&mut self) -> Option<DrawTiming> {
        if !self.session.is_ready() {
            return None;
        }
        let parts = self.session.parts();
        let renderer = parts.renderer?;
        self.frame.collect(parts.scene);
        let settings = FrameSettings {
            atlas: parts.atlas.image().map(|image| image.texture),
            clear_color: self.config.background,
            viewport: parts.viewport,
            light: self.light.as_ref().map(LightFilter::uniform),
        };
        Some(renderer.draw(&self.frame.frame(settings)))
    }

    pub fn frame(&self) -> &FrameBuilder {
        &self.frame
    }

    /// Follow a container resize, in CSS pixels. The camera is re-derived at
    /// the next build.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.session.resize(width, height);
        if let Some(light) = self.light.as_mut() {
            light.update_dimensions(width, height);
        }
    }

    /// Move the point light, in canvas pixels.
    pub fn update_light(&mut self, x: f32, y: f32, radius: f32) {
        match self.light.as_mut() {
            Some(light) => light.update_light(x, y, radius),
            None => log::debug!("update_light ignored: lighting disabled"),
        }
    }

    pub fn light(&self) -> Option<&LightFilter> {
        self.light.as_ref()
    }

    /// Unmount. Safe to call at any time, any number of times.
    pub fn teardown(&mut self) {
        self.session.teardown();
        self.router.reset();
        self.last_build = None;
    }

    pub fn state(&self) -> LifecycleState {
        self.session.state()
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn tile_size(&self) -> f32 {
        self.config.tile_size
    }

    /// Canvas size in CSS pixels.
    pub fn viewport_size(&self) -> Vec2 {
        self.session.viewport().size()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::api::types::{EntityId, GridPos};
    use crate::components::layer::SceneLayer;
    use crate::core::scene::{NodeKind, NodeTag};
    use crate::input::pointer::CellReport;
    use crate::renderer::lifecycle::tests::{image, Journal, MockHost, MockRenderer};
    use crate::systems::effects::TextStyle;

    struct Harness {
        view: GridView,
        journal: Rc<RefCell<Journal>>,
    }

    fn mounted(config: ViewConfig) -> Harness {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(config);
        let req = view.init(Box::new(MockHost(journal.clone())));
        view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal.clone()))))
            .unwrap();
        view.complete_atlas(req.token, Ok(image())).unwrap();
        assert!(view.is_ready());
        Harness { view, journal }
    }

    fn small_map() -> MapData {
        MapData::from_json(r#"{"grid": [[0, 1], [0, 0]]}"#).unwrap()
    }

    fn tile_nodes(view: &GridView) -> Vec<Vec2> {
        let scene = view.session().scene();
        let Some(bg) = scene.layer(SceneLayer::Background) else {
            return Vec::new();
        };
        scene
            .children(bg)
            .iter()
            .filter_map(|&id| scene.get(id))
            .filter(|n| matches!(n.tag, Some(NodeTag::Tile(_))))
            .map(|n| n.position)
            .collect()
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let config = ViewConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.tile_size, 40.0);
        assert_eq!(config.autotile_ids, vec![194, 226, 258]);

        let config = ViewConfig::from_json(
            r#"{"tileSize": 32, "camera": "fit", "atlas": {"path": "dungeon.png"}, "light": {}}"#,
        )
        .unwrap();
        assert_eq!(config.camera, CameraMode::Fit);
        assert_eq!(config.atlas.path, "dungeon.png");
        assert_eq!(config.atlas.tile_width, 32);
        assert!(config.light.is_some());
        assert!(matches!(ViewConfig::from_json(r#"{"camera": "orbit"}"#), Err(RenderError::Config(_))));
    }

    #[test]
    fn scenario_a_four_tiles() {
        let mut h = mounted(ViewConfig::default());
        h.view.build(&small_map(), &[], &TargetingOverlay::default());
        assert_eq!(
            tile_nodes(&h.view),
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(40.0, 0.0),
                Vec2::new(0.0, 40.0),
                Vec2::new(40.0, 40.0),
            ]
        );
    }

    #[test]
    fn scenario_b_entity_centered_in_cell() {
        let mut h = mounted(ViewConfig::default());
        let map = MapData::new(TileGrid::filled(6, 6, 0));
        h.view.build(&map, &[EntityView::new("gob", GridPos::new(3, 2))], &TargetingOverlay::default());
        let scene = h.view.session().scene();
        let group = scene.find(&NodeTag::Entity(EntityId::new("gob"))).unwrap();
        assert_eq!(scene.get(group).unwrap().position, Vec2::new(140.0, 100.0));
    }

    #[test]
    fn scenario_c_health_bar_fill() {
        let mut h = mounted(ViewConfig::default());
        let map = MapData::new(TileGrid::filled(4, 4, 0));
        let gob = EntityView::new("gob", GridPos::new(1, 1)).with_hp(30.0, 100.0);
        h.view.build(&map, &[gob], &TargetingOverlay::default());

        let scene = h.view.session().scene();
        let bar = scene.find(&NodeTag::HealthBar).unwrap();
        let track = scene.children(bar)[0];
        let fill = scene.find(&NodeTag::HealthFill).unwrap();
        let width = |id| match scene.get(id).map(|n| &n.kind) {
            Some(NodeKind::Rect { size, .. }) => size.x,
            other => panic!("unexpected {other:?}"),
        };
        assert!((width(fill) - 0.3 * width(track)).abs() < 1e-4);
        match &scene.get(fill).unwrap().kind {
            NodeKind::Rect { fill, .. } => assert_eq!(*fill, palette::HEALTH_LOW),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scenario_d_click_reports_cell() {
        let mut h = mounted(ViewConfig::default());
        h.view.build(&MapData::new(TileGrid::filled(5, 5, 0)), &[], &TargetingOverlay::default());

        // Center mode on an 800x600 canvas: the 200x200 grid sits at (300, 200).
        let offset = h.view.last_build().unwrap().camera.offset;
        assert_eq!(offset, Vec2::new(300.0, 200.0));

        let mut reports: Vec<CellReport> = Vec::new();
        h.view.handle_input(
            InputEvent::PointerDown { x: offset.x + 85.0, y: offset.y + 122.0 },
            &mut reports,
        );
        assert_eq!(reports, vec![CellReport::Click(GridPos::new(2, 3))]);
    }

    #[test]
    fn scenario_e_autotiled_water() {
        let mut h = mounted(ViewConfig::default());
        let map = MapData::new(TileGrid::filled(3, 3, 194));
        h.view.build(&map, &[], &TargetingOverlay::default());
        let scene = h.view.session().scene();
        let center = scene.find(&NodeTag::Tile(GridPos::new(1, 1))).unwrap();
        match &scene.get(center).unwrap().kind {
            NodeKind::Sprite { slice, .. } => assert_eq!(slice.index, 209),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn build_before_ready_is_a_no_op() {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(ViewConfig::default());
        assert!(view.build(&small_map(), &[], &TargetingOverlay::default()).is_none());

        let req = view.init(Box::new(MockHost(journal.clone())));
        assert!(view.build(&small_map(), &[], &TargetingOverlay::default()).is_none());
        assert!(tile_nodes(&view).is_empty());
        assert_eq!(view.play([VisualEvent::CameraShake { intensity: 5.0 }]), 0);

        view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal)))).unwrap();
        view.complete_atlas(req.token, Ok(image())).unwrap();
        assert!(view.build(&small_map(), &[], &TargetingOverlay::default()).is_some());
    }

    #[test]
    fn teardown_mid_init_never_attaches() {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(ViewConfig::default());
        let req = view.init(Box::new(MockHost(journal.clone())));
        view.teardown();

        let late = view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal.clone()))));
        assert!(matches!(late, Err(RenderError::NotInitializing)));
        assert!(view.complete_atlas(req.token, Ok(image())).is_err());

        let j = journal.borrow();
        assert_eq!(j.attached, 0);
        assert_eq!(j.destroyed, 1);
        assert_eq!(view.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn render_hands_a_frame_to_the_backend() {
        let mut h = mounted(ViewConfig::default());
        assert!(h.view.render().is_some());
        assert_eq!(h.journal.borrow().frames, 1);

        h.view.build(&MapData::new(TileGrid::filled(3, 3, 194)), &[], &TargetingOverlay::default());
        h.view.render();
        let j = h.journal.borrow();
        assert_eq!(j.frames, 2);
        assert_eq!(j.last_sprites, 9);
    }

    #[test]
    fn effects_play_tick_and_finish() {
        let mut h = mounted(ViewConfig::default());
        h.view.build(&small_map(), &[], &TargetingOverlay::default());
        let started = h
            .view
            .play_json(
                r#"[{"type": "floating_text", "pos": [0, 0], "text": "MISS", "style": "miss"},
                    {"type": "camera_shake"},
                    {"type": "warp"}]"#,
            )
            .unwrap();
        assert_eq!(started, 2);
        assert_eq!(h.view.active_effects(), 2);

        // A rebuild mid-animation keeps the effect running.
        h.view.tick(10.0);
        h.view.build(&small_map(), &[], &TargetingOverlay::default());
        assert_eq!(h.view.active_effects(), 2);

        let mut finished = 0;
        for _ in 0..60 {
            finished += h.view.tick(1.0);
        }
        assert_eq!(finished, 2);
        assert_eq!(h.view.active_effects(), 0);
        let scene = h.view.session().scene();
        assert_eq!(scene.descendant_count(scene.effects_root()), 0);
        assert_eq!(scene.world_jitter(), Vec2::ZERO);
    }

    #[test]
    fn strict_autotile_rejects_small_sheet() {
        let config = ViewConfig { strict_autotile: true, ..ViewConfig::default() };
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(config);
        let req = view.init(Box::new(MockHost(journal.clone())));
        view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal.clone())))).unwrap();
        let small = AtlasImage { width: 160, height: 160, ..image() };
        view.complete_atlas(req.token, Ok(small)).unwrap();

        assert!(view.is_ready());
        assert!(!view.session().atlas().is_loaded());
        assert_eq!(journal.borrow().released, vec![small.texture]);
    }

    #[test]
    fn strict_rejection_before_surface_frees_texture_once() {
        let config = ViewConfig { strict_autotile: true, ..ViewConfig::default() };
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(config);
        let req = view.init(Box::new(MockHost(journal.clone())));
        let small = AtlasImage { width: 64, height: 64, ..image() };
        view.complete_atlas(req.token, Ok(small)).unwrap();
        assert_eq!(journal.borrow().released, vec![small.texture]);

        view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal.clone())))).unwrap();
        assert!(view.is_ready());
        view.teardown();
        assert_eq!(journal.borrow().released, vec![small.texture]);
    }

    #[test]
    fn lenient_autotile_keeps_small_sheet() {
        let journal = Rc::new(RefCell::new(Journal::default()));
        let mut view = GridView::new(ViewConfig::default());
        let req = view.init(Box::new(MockHost(journal.clone())));
        view.complete_surface(req.token, Ok(Box::new(MockRenderer(journal)))).unwrap();
        view.complete_atlas(req.token, Ok(AtlasImage { width: 160, height: 160, ..image() })).unwrap();
        assert!(view.session().atlas().is_loaded());
    }

    #[test]
    fn resize_moves_camera_on_next_build() {
        let mut h = mounted(ViewConfig::default());
        let map = MapData::new(TileGrid::filled(5, 5, 0));
        h.view.build(&map, &[], &TargetingOverlay::default());
        h.view.resize(400.0, 400.0);
        assert_eq!(h.view.viewport_size(), Vec2::new(400.0, 400.0));
        assert_eq!(h.journal.borrow().resized.last(), Some(&(800, 800)));

        let summary = h.view.build(&map, &[], &TargetingOverlay::default()).unwrap();
        assert_eq!(summary.camera.offset, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn light_follows_config() {
        let mut h = mounted(ViewConfig { light: Some(LightConfig::default()), ..ViewConfig::default() });
        h.view.update_light(10.0, 20.0, 150.0);
        assert_eq!(h.view.light().unwrap().light().pos, Vec2::new(10.0, 20.0));
        assert!(h.view.render().is_some());

        let mut plain = mounted(ViewConfig::default());
        plain.view.update_light(1.0, 1.0, 1.0);
        assert!(plain.view.light().is_none());
    }

    #[test]
    fn json_inputs() {
        let mut h = mounted(ViewConfig::default());
        let summary = h
            .view
            .build_json(
                r#"{"grid": [[0, 0, 0], [0, 0, 0]], "elevation": {"1,1": 2}, "terrain": {"2,0": "fire"}}"#,
                r#"[{"id": "hero", "pos": [1, 0], "type": "player", "hp": 8, "maxHp": 10}]"#,
                "",
            )
            .unwrap()
            .unwrap();
        assert!(summary.entity_nodes > 0);
        assert!(matches!(h.view.build_json("{", "[]", ""), Err(RenderError::Input(_))));
        assert!(matches!(
            h.view.build_json(r#"{"grid": [[0], [0, 0]]}"#, "[]", ""),
            Err(RenderError::Input(_))
        ));
    }

    #[test]
    fn queued_input_drains_in_order() {
        let mut h = mounted(ViewConfig::default());
        h.view.build(&MapData::new(TileGrid::filled(5, 5, 0)), &[], &TargetingOverlay::default());
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerMove { x: 310.0, y: 210.0 });
        queue.push(InputEvent::PointerLeave);
        let mut reports: Vec<CellReport> = Vec::new();
        h.view.drain_input(&mut queue, &mut reports);
        assert_eq!(
            reports,
            vec![CellReport::Hover(Some(GridPos::new(0, 0))), CellReport::Hover(None)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn teardown_clears_everything() {
        let mut h = mounted(ViewConfig::default());
        h.view.build(&small_map(), &[], &TargetingOverlay::default());
        h.view.play([VisualEvent::FloatingText {
            pos: GridPos::new(0, 0),
            text: "-3".into(),
            style: TextStyle::Default,
            color: None,
        }]);
        h.view.teardown();
        h.view.teardown();

        assert!(h.view.hit_area().is_none());
        assert_eq!(h.view.active_effects(), 0);
        assert!(h.view.render().is_none());
        let j = h.journal.borrow();
        assert_eq!((j.attached, j.detached, j.destroyed), (1, 1, 1));
        assert_eq!(j.released, vec![image().texture]);
    }
}
