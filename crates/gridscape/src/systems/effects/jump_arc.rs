//! Parabolic trail left by a jump, fading out.

use glam::Vec2;

use super::Lifetime;
use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph, Stroke};
use crate::core::time::{TickFlow, TickHandler};
use crate::systems::palette;

#[derive(Debug)]
pub struct JumpArc {
    node: NodeId,
    life: Lifetime,
}

impl JumpArc {
    pub const DURATION: f32 = 45.0;
    pub const START_ALPHA: f32 = 0.8;

    /// Control point of the quadratic, relative to `from`. The apex sits
    /// above the midpoint by at least one tile.
    pub fn control_point(from: Vec2, to: Vec2, tile_size: f32) -> Vec2 {
        let lift = tile_size.max(from.distance(to) / 2.0);
        (from + to) / 2.0 - Vec2::new(0.0, lift) - from
    }

    pub fn spawn(scene: &mut SceneGraph, from: Vec2, to: Vec2, tile_size: f32) -> Self {
        let node = Node::new(NodeKind::Curve {
            control: Self::control_point(from, to, tile_size),
            to: to - from,
            stroke: Stroke::new(2.0, palette::JUMP_ARC),
        })
        .with_position(from)
        .with_alpha(Self::START_ALPHA)
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

impl TickHandler<SceneGraph> for JumpArc {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        let t = self.life.advance(delta);
        let Some(node) = scene.get_mut(self.node) else {
            return TickFlow::Done;
        };
        node.alpha = Self::START_ALPHA * (1.0 - t);
        if self.life.finished() {
            scene.remove(self.node);
            return TickFlow::Done;
        }
        TickFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apex_is_above_midpoint() {
        let from = Vec2::new(20.0, 100.0);
        let to = Vec2::new(180.0, 100.0);
        let control = from + JumpArc::control_point(from, to, 40.0);
        assert_eq!(control.x, 100.0);
        assert_eq!(control.y, 100.0 - 80.0);

        let short = from + JumpArc::control_point(from, Vec2::new(60.0, 100.0), 40.0);
        assert_eq!(short.y, 60.0);
    }

    #[test]
    fn fades_out_then_removes_itself() {
        let mut scene = SceneGraph::new();
        let mut arc = JumpArc::spawn(&mut scene, Vec2::ZERO, Vec2::new(80.0, 0.0), 40.0);
        let id = arc.node();
        let mut ticks = 1;
        let mut last = JumpArc::START_ALPHA;
        while arc.tick(&mut scene, 1.0) == TickFlow::Continue {
            let alpha = scene.get(id).unwrap().alpha;
            assert!(alpha < last);
            last = alpha;
            ticks += 1;
        }
        assert_eq!(ticks, 45);
        assert!(!scene.contains(id));
    }
}
