//! A dot that travels between two cell centers at constant speed.

use glam::Vec2;

use crate::components::sprite::Color;
use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph};
use crate::core::time::{TickFlow, TickHandler};
use crate::systems::palette;

#[derive(Debug)]
pub struct Projectile {
    node: NodeId,
    target: Vec2,
    /// Pixels per tick.
    speed: f32,
}

impl Projectile {
    /// Travel per tick, as a fraction of a tile.
    pub const TILES_PER_TICK: f32 = 0.25;
    /// Arrival tolerance in pixels.
    pub const EPSILON: f32 = 0.5;

    pub fn spawn(scene: &mut SceneGraph, from: Vec2, to: Vec2, color: Option<Color>, tile_size: f32) -> Self {
        let node = Node::new(NodeKind::Circle {
            radius: (tile_size * 0.1).max(2.0),
            fill: color.unwrap_or(palette::PROJECTILE),
            stroke: None,
        })
        .with_position(from)
        .with_tag(NodeTag::Effect);
        Self {
            node: scene.add(scene.effects_root(), node),
            target: to,
            speed: tile_size * Self::TILES_PER_TICK,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl TickHandler<SceneGraph> for Projectile {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        let Some(node) = scene.get_mut(self.node) else {
            return TickFlow::Done;
        };
        let remaining = self.target - node.position;
        let step = self.speed * delta;
        if remaining.length() <= step.max(Self::EPSILON) {
            node.position = self.target;
            scene.remove(self.node);
            return TickFlow::Done;
        }
        node.position += remaining.normalize() * step;
        TickFlow::Continue
    }
}
