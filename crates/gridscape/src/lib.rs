pub mod api;
pub mod assets;
pub mod components;
pub mod core;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::types::{EntityId, GridPos};
pub use api::view::{parse_entities, parse_targeting, AtlasConfig, GridView, MapData, ViewConfig};
pub use assets::atlas::{AtlasImage, TextureAtlas, TextureId, TextureSlice};
pub use assets::manifest::AtlasManifest;
pub use assets::registry::IconRegistry;
pub use components::entity::{Decoration, DecorationKind, EntityKind, EntityView};
pub use components::layer::SceneLayer;
pub use components::sprite::{Color, SpriteRef};
pub use components::tilemap::{HazardKind, TerrainOverlayMap, TileGrid};
pub use crate::core::error::RenderError;
pub use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph};
pub use crate::core::time::{FixedTimestep, TickFlow, TickHandler, Ticker, TICK_SECONDS};
pub use input::pointer::{CellHandler, CellReport, HitArea, PointerRouter};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::camera::{CameraMode, CameraTransform, Viewport};
pub use renderer::instance::{RenderBuffer, SpriteInstance, VectorVertex};
pub use renderer::lifecycle::{InitRequest, InitToken, LifecycleState, RenderSession};
pub use renderer::traits::{Container, DrawOp, DrawTiming, FrameData, RenderTier, Renderer, ShapeCommand, TextInstance};
pub use systems::autotile::{bitmask, resolve_tile_id, Autotiler};
pub use systems::builder::{BuildSummary, SceneBuilder, TargetingOverlay};
pub use systems::effects::{parse_events, EffectPlayer, TextStyle, VisualEvent};
pub use systems::lighting::{LightConfig, LightFilter, LightUniform, PointLight};
pub use systems::render::{FrameBuilder, FrameSettings};

#[cfg(feature = "vectors")]
pub use systems::vector::VectorState;
