//! Combat text that drifts up one tile while fading out.

use glam::Vec2;

use super::events::TextStyle;
use super::Lifetime;
use crate::components::sprite::Color;
use crate::core::scene::{Node, NodeId, NodeKind, NodeTag, SceneGraph};
use crate::core::time::{TickFlow, TickHandler};
use crate::systems::palette;

#[derive(Debug)]
pub struct FloatingText {
    node: NodeId,
    start: Vec2,
    rise: f32,
    life: Lifetime,
}

impl FloatingText {
    pub const DURATION: f32 = 60.0;

    /// Color used when the event carries none.
    pub fn style_color(style: TextStyle) -> Color {
        match style {
            TextStyle::Critical => palette::TEXT_CRITICAL,
            TextStyle::Miss => palette::TEXT_MISS,
            TextStyle::Reaction => palette::TEXT_REACTION,
            TextStyle::Default => palette::TEXT_DEFAULT,
        }
    }

    pub fn font_size(style: TextStyle) -> f32 {
        match style {
            TextStyle::Critical => 20.0,
            _ => 14.0,
        }
    }

    pub fn spawn(
        scene: &mut SceneGraph,
        start: Vec2,
        text: String,
        style: TextStyle,
        color: Option<Color>,
        tile_size: f32,
    ) -> Self {
        let node = Node::new(NodeKind::Text {
            content: text,
            color: color.unwrap_or_else(|| Self::style_color(style)),
            font_size: Self::font_size(style),
            anchor: Vec2::splat(0.5),
        })
        .with_position(start)
        .with_tag(NodeTag::Effect);
        let node = scene.add(scene.effects_root(), node);
        Self {
            node,
            start,
            rise: tile_size,
            life: Lifetime::new(Self::DURATION),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl TickHandler<SceneGraph> for FloatingText {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        let t = self.life.advance(delta);
        let Some(node) = scene.get_mut(self.node) else {
            return TickFlow::Done;
        };
        node.position = self.start - Vec2::new(0.0, self.rise * t);
        node.alpha = 1.0 - t;
        if self.life.finished() {
            scene.remove(self.node);
            return TickFlow::Done;
        }
        TickFlow::Continue
    }
}
