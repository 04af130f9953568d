//! Ring effects: the pulsing marker on an acting entity and the expanding
//! area ring.

use glam::Vec2;

use super::easing::Easing;
use super::Lifetime;
use crate::components::sprite::Color;
use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph, Stroke};
use crate::core::time::{TickFlow, TickHandler};
use crate::systems::palette;

const RING_WIDTH: f32 = 3.0;

/// Ring around an entity that breathes in and out while it acts.
#[derive(Debug)]
pub struct ActionPulse {
    node: NodeId,
    life: Lifetime,
}

impl ActionPulse {
    pub const DURATION: f32 = 60.0;
    /// Sine frequency in radians per tick.
    pub const FREQUENCY: f32 = 0.2;
    pub const AMPLITUDE: f32 = 0.15;

    /// `center` is in effect-space pixels.
    pub fn spawn(scene: &mut SceneGraph, center: Vec2, tile_size: f32) -> Self {
        let node = Node::new(NodeKind::Ring {
            radius: tile_size * 0.6,
            stroke: Stroke::new(RING_WIDTH, palette::ACTION_RING),
        })
        .with_position(center)
        .with_tag(NodeTag::Effect);
        Self {
            node: scene.add(scene.effects_root(), node),
            life: Lifetime::new(Self::DURATION),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl TickHandler<SceneGraph> for ActionPulse {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        self.life.advance(delta);
        let elapsed = self.life.elapsed();
        let Some(node) = scene.get_mut(self.node) else {
            return TickFlow::Done;
        };
        node.scale = Vec2::splat(1.0 + Self::AMPLITUDE * (elapsed * Self::FREQUENCY).sin());
        if self.life.finished() {
            scene.remove(self.node);
            return TickFlow::Done;
        }
        TickFlow::Continue
    }
}

/// Ring over an area of effect, growing from nothing while fading out.
#[derive(Debug)]
pub struct AoePulse {
    node: NodeId,
    life: Lifetime,
}

impl AoePulse {
    pub const DURATION: f32 = 30.0;

    /// Final ring radius for an area of `radius` cells around the center cell.
    pub fn ring_radius(radius: u32, tile_size: f32) -> f32 {
        (radius as f32 + 0.5) * tile_size
    }

    pub fn spawn(scene: &mut SceneGraph, center: Vec2, radius: u32, color: Option<Color>, tile_size: f32) -> Self {
        let node = Node::new(NodeKind::Ring {
            radius: Self::ring_radius(radius, tile_size),
            stroke: Stroke::new(RING_WIDTH, color.unwrap_or(palette::AOE_PULSE)),
        })
        .with_position(center)
        .with_scale(0.0)
        .with_tag(NodeTag::Effect);
        Self {
            node: scene.add(scene.effects_root(), node),
            life: Lifetime::new(Self::DURATION),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl TickHandler<SceneGraph> for AoePulse {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        let t = self.life.advance(delta);
        let Some(node) = scene.get_mut(self.node) else {
            return TickFlow::Done;
        };
        node.scale = Vec2::splat(Easing::QuadOut.apply(t));
        node.alpha = 1.0 - t;
        if self.life.finished() {
            scene.remove(self.node);
            return TickFlow::Done;
        }
        TickFlow::Continue
    }
}
