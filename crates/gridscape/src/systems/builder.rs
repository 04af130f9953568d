//! Scene builder: declarative map/entity/targeting state to scene nodes.
//!
//! Every build throws away the three layer containers and creates them
//! again from the inputs. Nothing is diffed, so the scene always matches the
//! latest inputs and repeated builds never accumulate nodes. The effect
//! space next to the layers is left alone.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{EntityId, GridPos};
use crate::assets::atlas::TextureAtlas;
use crate::assets::registry::IconRegistry;
use crate::components::entity::{Decoration, DecorationKind, EntityView};
use crate::components::layer::SceneLayer;
use crate::components::sprite::Color;
use crate::components::tilemap::{TerrainOverlayMap, TileGrid};
use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph, Stroke, WorldTransform};
use crate::input::pointer::HitArea;
use crate::renderer::camera::{self, CameraMode, CameraTransform};
use crate::systems::autotile::Autotiler;
use crate::systems::palette;

/// Optional targeting previews drawn above the entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetingOverlay {
    /// Cell the range is measured from.
    pub origin: Option<GridPos>,
    /// Chebyshev range around `origin`.
    pub range: Option<u32>,
    /// Cell under the cursor, center of the area preview.
    pub hovered: Option<GridPos>,
    /// Chebyshev radius around `hovered`.
    pub aoe_radius: Option<u32>,
}

impl TargetingOverlay {
    /// Cells shaded as reachable: within range of the origin, origin excluded.
    pub fn range_cells(&self, grid: &TileGrid) -> Vec<GridPos> {
        match (self.origin, self.range) {
            (Some(origin), Some(range)) => square(origin, range)
                .filter(|&c| c != origin && grid.contains(c))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Cells shaded as affected: within the radius of the hovered cell, itself included.
    pub fn aoe_cells(&self, grid: &TileGrid) -> Vec<GridPos> {
        match (self.hovered, self.aoe_radius) {
            (Some(center), Some(radius)) => square(center, radius)
                .filter(|&c| grid.contains(c))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Every cell within Chebyshev distance `radius` of `center`, row-major.
fn square(center: GridPos, radius: u32) -> impl Iterator<Item = GridPos> {
    let r = radius.min(i32::MAX as u32) as i32;
    (center.y - r..=center.y + r)
        .flat_map(move |y| (center.x - r..=center.x + r).map(move |x| GridPos::new(x, y)))
}

/// Everything one build reads.
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub grid: &'a TileGrid,
    pub overlay: &'a TerrainOverlayMap,
    pub entities: &'a [EntityView],
    pub targeting: &'a TargetingOverlay,
}

/// Outcome of a build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSummary {
    pub camera: CameraTransform,
    pub hit_area: HitArea,
    pub background_nodes: usize,
    pub entity_nodes: usize,
    pub overlay_nodes: usize,
}

/// Layout knobs of the builder.
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    pub tile_size: f32,
    pub camera_mode: CameraMode,
    pub fit_padding: f32,
    pub grid_line: Color,
    autotiler: Autotiler,
    icons: IconRegistry,
}

impl SceneBuilder {
    pub fn new(tile_size: f32, autotiler: Autotiler) -> Self {
        Self {
            tile_size,
            camera_mode: CameraMode::Center,
            fit_padding: 32.0,
            grid_line: palette::GRID_LINE,
            autotiler,
            icons: IconRegistry::new(),
        }
    }

    pub fn with_camera(mut self, mode: CameraMode, padding: f32) -> Self {
        self.camera_mode = mode;
        self.fit_padding = padding;
        self
    }

    pub fn set_icons(&mut self, icons: IconRegistry) {
        self.icons = icons;
    }

    pub fn icons(&self) -> &IconRegistry {
        &self.icons
    }

    pub fn autotiler(&self) -> &Autotiler {
        &self.autotiler
    }

    /// Replace the layers with a fresh scene for `input` and position the
    /// world for a `viewport`-sized canvas.
    pub fn build(
        &self,
        scene: &mut SceneGraph,
        atlas: &mut TextureAtlas,
        viewport: Vec2,
        input: &BuildInput<'_>,
    ) -> BuildSummary {
        let root = scene.layers_root();
        scene.clear_children(root);

        let background = scene.add(
            root,
            Node::container()
                .with_tag(NodeTag::Layer(SceneLayer::Background))
                .interactive(),
        );
        let entities = scene.add(root, Node::container().with_tag(NodeTag::Layer(SceneLayer::Entities)));
        let overlay = scene.add(root, Node::container().with_tag(NodeTag::Layer(SceneLayer::Overlay)));

        self.build_tiles(scene, atlas, background, input.grid);
        self.build_terrain(scene, background, input.grid, input.overlay);
        self.build_tethers(scene, entities, input.entities);
        for entity in input.entities {
            self.build_entity(scene, atlas, entities, entity);
        }
        self.build_targeting(scene, overlay, input.grid, input.targeting);

        let world_size = input.grid.pixel_size(self.tile_size);
        let cam = camera::fit(world_size, viewport, self.camera_mode, self.fit_padding);
        let world = scene.world();
        if let Some(node) = scene.get_mut(world) {
            node.position = cam.offset;
            node.scale = Vec2::splat(cam.scale);
        }

        // Hit-testing ignores any shake in progress.
        let mut hit_transform = scene
            .world_transform(background)
            .unwrap_or(WorldTransform::IDENTITY);
        hit_transform.translation -= scene.world_jitter();

        let summary = BuildSummary {
            camera: cam,
            hit_area: HitArea {
                transform: hit_transform,
                tile_size: self.tile_size,
                width: input.grid.width(),
                height: input.grid.height(),
            },
            background_nodes: scene.descendant_count(background),
            entity_nodes: scene.descendant_count(entities),
            overlay_nodes: scene.descendant_count(overlay),
        };
        log::debug!(
            "scene built: {}x{} grid, {} entities, nodes bg={} ent={} ovl={}, camera {:?} x{}",
            input.grid.width(),
            input.grid.height(),
            input.entities.len(),
            summary.background_nodes,
            summary.entity_nodes,
            summary.overlay_nodes,
            cam.offset,
            cam.scale
        );
        summary
    }

    fn build_tiles(&self, scene: &mut SceneGraph, atlas: &mut TextureAtlas, layer: NodeId, grid: &TileGrid) {
        let tile = self.tile_size;
        for (pos, code) in grid.iter() {
            let index = self.autotiler.sheet_index(grid, pos.x, pos.y, code);
            let kind = match atlas.slice(index) {
                Some(slice) => NodeKind::Sprite {
                    slice,
                    size: Vec2::splat(tile),
                    anchor: Vec2::ZERO,
                },
                None => NodeKind::Rect {
                    size: Vec2::splat(tile),
                    fill: palette::placeholder(code),
                    stroke: Some(Stroke::new(1.0, self.grid_line)),
                },
            };
            scene.add(
                layer,
                Node::new(kind)
                    .with_position(pos.origin(tile))
                    .with_tag(NodeTag::Tile(pos)),
            );
        }
    }

    fn build_terrain(&self, scene: &mut SceneGraph, layer: NodeId, grid: &TileGrid, overlay: &TerrainOverlayMap) {
        let tile = self.tile_size;
        let cell_rect = |fill: Color| NodeKind::Rect {
            size: Vec2::splat(tile),
            fill,
            stroke: None,
        };

        for (pos, height) in sorted(overlay.elevation.iter(), grid) {
            if *height != 0 {
                let node = Node::new(cell_rect(palette::elevation_color(*height)));
                scene.add(layer, node.with_position(pos.origin(tile)).with_tag(NodeTag::TerrainMarker(pos)));
            }
        }
        for (pos, hazard) in sorted(overlay.hazards.iter(), grid) {
            let node = Node::new(cell_rect(palette::hazard_color(*hazard)));
            scene.add(layer, node.with_position(pos.origin(tile)).with_tag(NodeTag::TerrainMarker(pos)));
        }
        for (pos, _item) in sorted(overlay.items.iter(), grid) {
            let node = Node::new(NodeKind::Circle {
                radius: tile * 0.15,
                fill: palette::ITEM,
                stroke: Some(Stroke::new(1.0, Color::BLACK.with_alpha(0.6))),
            });
            scene.add(layer, node.with_position(pos.center(tile)).with_tag(NodeTag::TerrainMarker(pos)));
        }
    }

    /// One line per linked pair, under every token. Links to entities that
    /// are not in the snapshot are skipped.
    fn build_tethers(&self, scene: &mut SceneGraph, layer: NodeId, entities: &[EntityView]) {
        let tile = self.tile_size;
        let mut drawn: HashSet<(&EntityId, &EntityId)> = HashSet::new();
        for entity in entities {
            let Some(Decoration::Tether { partner }) = entity.decoration(DecorationKind::Tether) else {
                continue;
            };
            let Some(other) = entities.iter().find(|e| &e.id == partner) else {
                log::trace!("tether from {} to missing {}", entity.id, partner);
                continue;
            };
            let key = if entity.id <= other.id {
                (&entity.id, &other.id)
            } else {
                (&other.id, &entity.id)
            };
            if !drawn.insert(key) {
                continue;
            }
            let from = entity.pos.center(tile);
            let node = Node::new(NodeKind::Line {
                to: other.pos.center(tile) - from,
                stroke: Stroke::new(2.0, palette::TETHER.with_alpha(0.7)),
            });
            scene.add(layer, node.with_position(from).with_tag(NodeTag::Tether));
        }
    }

    fn build_entity(&self, scene: &mut SceneGraph, atlas: &mut TextureAtlas, layer: NodeId, entity: &EntityView) {
        let tile = self.tile_size;
        let group = scene.add(
            layer,
            Node::container()
                .with_position(entity.pos.center(tile))
                .with_tag(NodeTag::Entity(entity.id.clone())),
        );

        if let Some(Decoration::Aura { color }) = entity.decoration(DecorationKind::Aura) {
            let aura = Node::new(NodeKind::Circle {
                radius: tile * 0.5,
                fill: color.with_alpha(0.2),
                stroke: Some(Stroke::new(2.0, color.with_alpha(0.6))),
            });
            scene.add(group, aura.with_tag(NodeTag::Decoration));
        }
        if entity.has(DecorationKind::Threat) {
            let ring = Node::new(NodeKind::Ring {
                radius: tile * 0.48,
                stroke: Stroke::new(2.0, palette::THREAT),
            });
            scene.add(group, ring.with_tag(NodeTag::Decoration));
        }

        scene.add(group, Node::new(self.token(atlas, entity)));

        if let Some(fraction) = entity.health_fraction() {
            self.health_bar(scene, group, fraction);
        }
        if entity.has(DecorationKind::StatusDots) {
            self.status_dots(scene, group, &entity.status_tags);
        }
        if entity.has(DecorationKind::Label) && !entity.name.is_empty() {
            let label = Node::new(NodeKind::Text {
                content: entity.name.clone(),
                color: palette::LABEL,
                font_size: 10.0,
                anchor: Vec2::new(0.5, 1.0),
            });
            scene.add(
                group,
                label
                    .with_position(Vec2::new(0.0, -tile * 0.5))
                    .with_tag(NodeTag::Decoration),
            );
        }
    }

    /// Sprite from the atlas, or a category-colored disc when there is no
    /// sprite reference, the icon is unknown, or the atlas is not loaded.
    fn token(&self, atlas: &mut TextureAtlas, entity: &EntityView) -> NodeKind {
        let tile = self.tile_size;
        let slice = entity
            .sprite
            .as_ref()
            .and_then(|sprite| self.icons.resolve(sprite))
            .and_then(|index| atlas.slice(index));
        match slice {
            Some(slice) => {
                let size = if entity.is_boss { 1.2 } else { 0.9 };
                NodeKind::Sprite {
                    slice,
                    size: Vec2::splat(tile * size),
                    anchor: Vec2::splat(0.5),
                }
            }
            None => {
                let radius = if entity.is_boss { 0.5 } else { 0.4 };
                NodeKind::Circle {
                    radius: tile * radius,
                    fill: palette::entity_color(entity.kind),
                    stroke: Some(Stroke::new(2.0, palette::TOKEN_OUTLINE)),
                }
            }
        }
    }

    fn health_bar(&self, scene: &mut SceneGraph, group: NodeId, fraction: f32) {
        let tile = self.tile_size;
        let size = Vec2::new(tile * 0.75, tile * 0.1);
        let bar = scene.add(
            group,
            Node::container()
                .with_position(Vec2::new(-size.x / 2.0, tile * 0.35))
                .with_tag(NodeTag::HealthBar),
        );
        scene.add(
            bar,
            Node::new(NodeKind::Rect {
                size,
                fill: palette::HEALTH_TRACK,
                stroke: None,
            }),
        );
        scene.add(
            bar,
            Node::new(NodeKind::Rect {
                size: Vec2::new(size.x * fraction, size.y),
                fill: palette::health_color(fraction),
                stroke: None,
            })
            .with_tag(NodeTag::HealthFill),
        );
    }

    fn status_dots(&self, scene: &mut SceneGraph, group: NodeId, tags: &[String]) {
        const MAX_DOTS: usize = 5;
        let tile = self.tile_size;
        let spacing = tile * 0.18;
        let shown = tags.len().min(MAX_DOTS);
        let start = -(shown.saturating_sub(1) as f32) * spacing / 2.0;
        for (i, tag) in tags.iter().take(shown).enumerate() {
            let dot = Node::new(NodeKind::Circle {
                radius: tile * 0.07,
                fill: palette::status_color(tag),
                stroke: Some(Stroke::new(1.0, Color::BLACK)),
            });
            scene.add(
                group,
                dot.with_position(Vec2::new(start + i as f32 * spacing, -tile * 0.32))
                    .with_tag(NodeTag::Decoration),
            );
        }
    }

    fn build_targeting(&self, scene: &mut SceneGraph, layer: NodeId, grid: &TileGrid, targeting: &TargetingOverlay) {
        let tile = self.tile_size;
        let shade = |color: Color, alpha: f32| NodeKind::Rect {
            size: Vec2::splat(tile),
            fill: color.with_alpha(alpha),
            stroke: None,
        };
        for cell in targeting.range_cells(grid) {
            let node = Node::new(shade(palette::RANGE, palette::RANGE_ALPHA));
            scene.add(layer, node.with_position(cell.origin(tile)).with_tag(NodeTag::RangeCell(cell)));
        }
        for cell in targeting.aoe_cells(grid) {
            let node = Node::new(shade(palette::AOE, palette::AOE_ALPHA));
            scene.add(layer, node.with_position(cell.origin(tile)).with_tag(NodeTag::AoeCell(cell)));
        }
    }
}

/// Overlay entries inside the grid, in row-major order so paint order is stable.
fn sorted<'a, V>(
    entries: impl Iterator<Item = (&'a GridPos, &'a V)>,
    grid: &TileGrid,
) -> Vec<(GridPos, &'a V)> {
    let mut cells: Vec<(GridPos, &V)> = entries
        .filter(|(pos, _)| grid.contains(**pos))
        .map(|(pos, v)| (*pos, v))
        .collect();
    cells.sort_by_key(|(pos, _)| (pos.y, pos.x));
    cells
}
