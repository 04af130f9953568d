use crate::assets::atlas::TextureId;
use crate::components::sprite::Color;
use crate::core::scene::{Node, NodeKind, SceneGraph, WorldTransform};
use crate::renderer::camera::Viewport;
use crate::renderer::instance::{RenderBuffer, SpriteInstance, VectorVertex};
use crate::renderer::traits::{DrawOp, FrameData, ShapeCommand, TextInstance};
use crate::systems::lighting::LightUniform;
#[cfg(feature = "vectors")]
use crate::systems::vector::VectorState;

/// Per-frame inputs that do not come from the scene graph.
#[derive(Debug, Clone, Copy)]
pub struct FrameSettings {
    pub atlas: Option<TextureId>,
    pub clear_color: Color,
    pub viewport: Viewport,
    pub light: Option<LightUniform>,
}

/// Flattens the scene graph into draw lists, reusing its buffers across frames.
#[derive(Debug, Default)]
pub struct FrameBuilder {
    sprites: RenderBuffer,
    shapes: Vec<ShapeCommand>,
    texts: Vec<TextInstance>,
    order: Vec<DrawOp>,
    #[cfg(feature = "vectors")]
    vectors: VectorState,
}

fn tint(color: Color, alpha: f32) -> [f32; 4] {
    color.with_alpha(color.a * alpha).to_array()
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk visible nodes in paint order and rebuild every list.
    pub fn collect(&mut self, scene: &SceneGraph) {
        self.sprites.clear();
        self.shapes.clear();
        self.texts.clear();
        self.order.clear();
        #[cfg(feature = "vectors")]
        self.vectors.clear();

        scene.walk(|_, node, transform| {
            if transform.alpha > 0.0 {
                self.emit(node, transform);
            }
        });
    }

    fn emit(&mut self, node: &Node, t: &WorldTransform) {
        let origin = t.translation;
        let alpha = t.alpha;
        match &node.kind {
            NodeKind::Container => {}
            NodeKind::Sprite { slice, size, anchor } => {
                let top_left = t.apply(-*anchor * *size);
                let size = *size * t.scale;
                self.sprites.push(SpriteInstance {
                    x: top_left.x,
                    y: top_left.y,
                    width: size.x,
                    height: size.y,
                    col: slice.col as f32,
                    row: slice.row as f32,
                    alpha,
                    rotation: 0.0,
                });
                let end = self.sprites.instance_count();
                extend_run(&mut self.order, DrawOp::Sprites { start: end - 1, end });
            }
            NodeKind::Rect { size, fill, stroke } => self.push_shape(ShapeCommand::Rect {
                pos: origin,
                size: *size * t.scale,
                fill: tint(*fill, alpha),
                stroke: stroke.map(|s| (s.width * t.scale.x, tint(s.color, alpha))),
            }),
            NodeKind::Circle { radius, fill, stroke } => self.push_shape(ShapeCommand::Circle {
                center: origin,
                radius: radius * t.scale.x,
                fill: tint(*fill, alpha),
                stroke: stroke.map(|s| (s.width * t.scale.x, tint(s.color, alpha))),
            }),
            NodeKind::Ring { radius, stroke } => self.push_shape(ShapeCommand::Ring {
                center: origin,
                radius: radius * t.scale.x,
                width: stroke.width * t.scale.x,
                color: tint(stroke.color, alpha),
            }),
            NodeKind::Line { to, stroke } => self.push_shape(ShapeCommand::Line {
                from: origin,
                to: t.apply(*to),
                width: stroke.width * t.scale.x,
                color: tint(stroke.color, alpha),
            }),
            NodeKind::Curve { control, to, stroke } => self.push_shape(ShapeCommand::Curve {
                from: origin,
                control: t.apply(*control),
                to: t.apply(*to),
                width: stroke.width * t.scale.x,
                color: tint(stroke.color, alpha),
            }),
            NodeKind::Text { content, color, font_size, anchor } => {
                self.texts.push(TextInstance {
                    content: content.clone(),
                    pos: origin,
                    anchor: *anchor,
                    font_size: font_size * t.scale.y,
                    color: tint(*color, alpha),
                });
                let end = self.texts.len() as u32;
                extend_run(&mut self.order, DrawOp::Texts { start: end - 1, end });
            }
        }
    }

    fn push_shape(&mut self, shape: ShapeCommand) {
        #[cfg(feature = "vectors")]
        self.vectors.tessellate(&shape);
        self.shapes.push(shape);
        let end = self.shapes.len() as u32;
        extend_run(&mut self.order, DrawOp::Shapes { start: end - 1, end });
    }

    pub fn sprites(&self) -> &[SpriteInstance] {
        &self.sprites.instances
    }

    pub fn sprite_buffer(&self) -> &RenderBuffer {
        &self.sprites
    }

    pub fn shapes(&self) -> &[ShapeCommand] {
        &self.shapes
    }

    pub fn texts(&self) -> &[TextInstance] {
        &self.texts
    }

    pub fn order(&self) -> &[DrawOp] {
        &self.order
    }

    /// Tessellated shapes. Empty without the `vectors` feature.
    pub fn vertices(&self) -> &[VectorVertex] {
        #[cfg(feature = "vectors")]
        {
            self.vectors.vertices()
        }
        #[cfg(not(feature = "vectors"))]
        {
            &[]
        }
    }

    pub fn frame(&self, settings: FrameSettings) -> FrameData<'_> {
        FrameData {
            sprites: self.sprites(),
            shapes: &self.shapes,
            vertices: self.vertices(),
            texts: &self.texts,
            order: &self.order,
            atlas: settings.atlas,
            clear_color: settings.clear_color.to_array(),
            camera: settings.viewport.uniform(),
            viewport: settings.viewport,
            light: settings.light,
        }
    }
}

/// Append to the trailing run when it is the same list, else start a new run.
fn extend_run(order: &mut Vec<DrawOp>, op: DrawOp) {
    let merged = match (order.last_mut(), op) {
        (Some(DrawOp::Sprites { end, .. }), DrawOp::Sprites { start, end: new_end })
        | (Some(DrawOp::Shapes { end, .. }), DrawOp::Shapes { start, end: new_end })
        | (Some(DrawOp::Texts { end, .. }), DrawOp::Texts { start, end: new_end })
            if *end == start =>
        {
            *end = new_end;
            true
        }
        _ => false,
    };
    if !merged {
        order.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{NodeTag, Stroke};
    use glam::Vec2;

    fn rect(fill: Color) -> Node {
        Node::new(NodeKind::Rect { size: Vec2::splat(40.0), fill, stroke: None })
    }

    #[test]
    fn walk_applies_camera_and_alpha() {
        let mut scene = SceneGraph::new();
        let world = scene.world();
        {
            let w = scene.get_mut(world).unwrap();
            w.position = Vec2::new(100.0, 50.0);
            w.scale = Vec2::splat(0.5);
        }
        let layer = scene.add(scene.layers_root(), Node::container().with_alpha(0.5));
        scene.add(layer, rect(Color::WHITE).with_position(Vec2::new(40.0, 40.0)));

        let mut frame = FrameBuilder::new();
        frame.collect(&scene);
        match frame.shapes()[0] {
            ShapeCommand::Rect { pos, size, fill, .. } => {
                assert_eq!(pos, Vec2::new(120.0, 70.0));
                assert_eq!(size, Vec2::splat(20.0));
                assert_eq!(fill, [1.0, 1.0, 1.0, 0.5]);
            }
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn draw_order_interleaves_runs() {
        let mut scene = SceneGraph::new();
        let layer = scene.add(scene.layers_root(), Node::container());
        scene.add(layer, rect(Color::BLACK));
        scene.add(layer, rect(Color::BLACK));
        scene.add(
            layer,
            Node::new(NodeKind::Text {
                content: "gob".into(),
                color: Color::WHITE,
                font_size: 10.0,
                anchor: Vec2::new(0.5, 1.0),
            }),
        );
        scene.add(
            layer,
            Node::new(NodeKind::Ring { radius: 10.0, stroke: Stroke::new(2.0, Color::WHITE) }),
        );

        let mut frame = FrameBuilder::new();
        frame.collect(&scene);
        assert_eq!(
            frame.order(),
            &[
                DrawOp::Shapes { start: 0, end: 2 },
                DrawOp::Texts { start: 0, end: 1 },
                DrawOp::Shapes { start: 2, end: 3 },
            ]
        );
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let mut scene = SceneGraph::new();
        let layer = scene.add(scene.layers_root(), Node::container());
        let hidden = scene.add(layer, rect(Color::WHITE).with_tag(NodeTag::Decoration));
        scene.get_mut(hidden).unwrap().visible = false;
        scene.add(layer, rect(Color::WHITE).with_alpha(0.0));

        let mut frame = FrameBuilder::new();
        frame.collect(&scene);
        assert!(frame.shapes().is_empty());
        assert!(frame.order().is_empty());
    }

    #[test]
    fn collect_replaces_previous_frame() {
        let mut scene = SceneGraph::new();
        let layer = scene.add(scene.layers_root(), Node::container());
        scene.add(layer, rect(Color::WHITE));

        let mut frame = FrameBuilder::new();
        frame.collect(&scene);
        frame.collect(&scene);
        assert_eq!(frame.shapes().len(), 1);
        assert_eq!(frame.order().len(), 1);
        #[cfg(feature = "vectors")]
        assert_eq!(frame.vertices().len(), 6);
    }

    #[test]
    fn frame_carries_settings() {
        let frame = FrameBuilder::new();
        let data = frame.frame(FrameSettings {
            atlas: Some(TextureId(3)),
            clear_color: Color::hex(0x1a1b26),
            viewport: Viewport::new(640.0, 480.0, 2.0),
            light: None,
        });
        assert_eq!(data.atlas, Some(TextureId(3)));
        assert_eq!(data.viewport.width, 640.0);
        assert_eq!(data.camera, Viewport::new(640.0, 480.0, 2.0).uniform());
    }
}
