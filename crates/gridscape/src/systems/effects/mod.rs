//! Effect player: turns transient visual events into self-terminating
//! animations on the shared ticker.
//!
//! Every effect owns at most one node under the scene's effect space, which
//! survives layer rebuilds. An effect removes its node and reports
//! [`TickFlow::Done`](crate::core::time::TickFlow) when it finishes, or as
//! soon as its node has disappeared (teardown, scene reset).

mod easing;
mod events;
mod floating_text;
mod jump_arc;
mod projectile;
mod pulse;
mod rng;
mod shake;

pub use easing::Easing;
pub use events::{parse_events, TextStyle, VisualEvent};
pub use floating_text::FloatingText;
pub use jump_arc::JumpArc;
pub use projectile::Projectile;
pub use pulse::{ActionPulse, AoePulse};
pub use rng::Rng;
pub use shake::CameraShake;

use glam::Vec2;

use crate::api::types::EntityId;
use crate::core::scene::{NodeTag, SceneGraph};
use crate::core::time::Ticker;

/// Elapsed/duration bookkeeping shared by the timed effects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lifetime {
    elapsed: f32,
    duration: f32,
}

impl Lifetime {
    pub(crate) fn new(duration: f32) -> Self {
        Self { elapsed: 0.0, duration }
    }

    /// Advance by `delta` ticks and return progress in [0, 1].
    pub(crate) fn advance(&mut self, delta: f32) -> f32 {
        self.elapsed += delta;
        self.progress()
    }

    pub(crate) fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub(crate) fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub(crate) fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Spawns one animation per visual event.
#[derive(Debug)]
pub struct EffectPlayer {
    rng: Rng,
    tile_size: f32,
}

impl EffectPlayer {
    pub fn new(seed: u64, tile_size: f32) -> Self {
        Self {
            rng: Rng::new(seed.wrapping_add(7919)),
            tile_size,
        }
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn set_tile_size(&mut self, tile_size: f32) {
        self.tile_size = tile_size;
    }

    /// Start an animation for every event. Returns how many were started;
    /// events that cannot be placed (unknown entity) are skipped.
    pub fn play(
        &mut self,
        events: impl IntoIterator<Item = VisualEvent>,
        scene: &mut SceneGraph,
        ticker: &mut Ticker<SceneGraph>,
    ) -> usize {
        let tile = self.tile_size;
        let mut started = 0;
        for event in events {
            log::trace!("playing {}", event.name());
            match event {
                VisualEvent::FloatingText { pos, text, style, color } => {
                    ticker.register(FloatingText::spawn(scene, pos.center(tile), text, style, color, tile));
                }
                VisualEvent::CameraShake { intensity } => {
                    ticker.register(CameraShake::new(intensity, self.rng.fork()));
                }
                VisualEvent::ActionStartPulse { entity } => {
                    let Some(center) = entity_center(scene, &entity) else {
                        log::warn!("action pulse for unknown entity {}", entity.as_str());
                        continue;
                    };
                    ticker.register(ActionPulse::spawn(scene, center, tile));
                }
                VisualEvent::Projectile { from, to, color } => {
                    ticker.register(Projectile::spawn(scene, from.center(tile), to.center(tile), color, tile));
                }
                VisualEvent::AoePulse { pos, radius, color } => {
                    ticker.register(AoePulse::spawn(scene, pos.center(tile), radius, color, tile));
                }
                VisualEvent::JumpArc { from, to } => {
                    ticker.register(JumpArc::spawn(scene, from.center(tile), to.center(tile), tile));
                }
            }
            started += 1;
        }
        started
    }
}

/// Position of an entity group expressed in effect space.
fn entity_center(scene: &SceneGraph, entity: &EntityId) -> Option<Vec2> {
    let group = scene.find(&NodeTag::Entity(entity.clone()))?;
    let stage = scene.world_transform(group)?.translation;
    let effects = scene.world_transform(scene.effects_root())?;
    Some(effects.inverse_apply(stage))
}
