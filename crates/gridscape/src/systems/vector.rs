//! Lyon-based tessellation of shape commands.
//!
//! Turns the frame's [`ShapeCommand`]s into a flat colored triangle list so
//! GPU backends can draw every non-textured node in one pipeline.

use glam::Vec2;
use lyon::math::point;
use lyon::path::{Path, Winding};
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use crate::renderer::instance::VectorVertex;
use crate::renderer::traits::ShapeCommand;

const TOLERANCE: f32 = 0.5;

fn vertex(x: f32, y: f32, [r, g, b, a]: [f32; 4]) -> VectorVertex {
    VectorVertex { x, y, r, g, b, a }
}

/// Vertex constructor for lyon fill tessellation.
struct FillVertexCtor {
    color: [f32; 4],
}

impl FillVertexConstructor<VectorVertex> for FillVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> VectorVertex {
        vertex(v.position().x, v.position().y, self.color)
    }
}

/// Vertex constructor for lyon stroke tessellation.
struct StrokeVertexCtor {
    color: [f32; 4],
}

impl StrokeVertexConstructor<VectorVertex> for StrokeVertexCtor {
    fn new_vertex(&mut self, v: StrokeVertex) -> VectorVertex {
        vertex(v.position().x, v.position().y, self.color)
    }
}

/// Holds lyon tessellators and the output triangle list.
/// Cleared each frame and filled from the frame's shape commands.
pub struct VectorState {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<VectorVertex, u32>,
    vertices: Vec<VectorVertex>,
}

impl VectorState {
    pub fn new() -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            vertices: Vec::with_capacity(16384),
        }
    }

    /// Clear the vertex buffer. Called at the start of each frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[VectorVertex] {
        &self.vertices
    }

    /// Tessellate one shape, fill first, then its outline on top.
    pub fn tessellate(&mut self, shape: &ShapeCommand) {
        match *shape {
            ShapeCommand::Rect { pos, size, fill, stroke } => {
                self.fill_rect(pos, size, fill);
                if let Some((width, color)) = stroke {
                    self.stroke_rect(pos, size, width, color);
                }
            }
            ShapeCommand::Circle { center, radius, fill, stroke } => {
                self.fill_circle(center, radius, fill);
                if let Some((width, color)) = stroke {
                    self.stroke_circle(center, radius, width, color);
                }
            }
            ShapeCommand::Ring { center, radius, width, color } => {
                self.stroke_circle(center, radius, width, color)
            }
            ShapeCommand::Line { from, to, width, color } => self.stroke_polyline(&[from, to], width, color),
            ShapeCommand::Curve { from, control, to, width, color } => {
                self.stroke_quadratic(from, control, to, width, color)
            }
        }
    }

    /// Flush indexed geometry to the flat buffer as a triangle list.
    fn flush_geometry(&mut self) {
        let geometry = &mut self.geometry;
        self.vertices
            .extend(geometry.indices.iter().map(|&i| geometry.vertices[i as usize]));
        geometry.vertices.clear();
        geometry.indices.clear();
    }

    fn visible(color: [f32; 4]) -> bool {
        color[3] > 0.0
    }

    /// Tessellate and fill a closed polygon.
    pub fn fill_polygon(&mut self, points: &[Vec2], color: [f32; 4]) {
        if points.len() < 3 || !Self::visible(color) {
            return;
        }
        let path = polyline_path(points, true);
        self.fill_path(&path, color);
    }

    pub fn fill_rect(&mut self, pos: Vec2, size: Vec2, color: [f32; 4]) {
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.fill_polygon(&rect_points(pos, size), color);
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        if radius <= 0.0 || !Self::visible(color) {
            return;
        }
        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, Winding::Positive);
        self.fill_path(&builder.build(), color);
    }

    pub fn fill_path(&mut self, path: &Path, color: [f32; 4]) {
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(TOLERANCE),
            &mut BuffersBuilder::new(&mut self.geometry, FillVertexCtor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(err) => {
                log::debug!("fill tessellation failed: {err:?}");
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }

    /// Tessellate a stroked open polyline.
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: [f32; 4]) {
        if points.len() < 2 || width <= 0.0 || !Self::visible(color) {
            return;
        }
        self.stroke_path(&polyline_path(points, false), width, color);
    }

    pub fn stroke_rect(&mut self, pos: Vec2, size: Vec2, width: f32, color: [f32; 4]) {
        if width <= 0.0 || !Self::visible(color) {
            return;
        }
        self.stroke_path(&polyline_path(&rect_points(pos, size), true), width, color);
    }

    pub fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: [f32; 4]) {
        if radius <= 0.0 || width <= 0.0 || !Self::visible(color) {
            return;
        }
        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, Winding::Positive);
        self.stroke_path(&builder.build(), width, color);
    }

    /// Tessellate a stroked quadratic bezier.
    pub fn stroke_quadratic(&mut self, from: Vec2, control: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
        if width <= 0.0 || !Self::visible(color) {
            return;
        }
        let mut builder = Path::builder();
        builder.begin(point(from.x, from.y));
        builder.quadratic_bezier_to(point(control.x, control.y), point(to.x, to.y));
        builder.end(false);
        self.stroke_path(&builder.build(), width, color);
    }

    pub fn stroke_path(&mut self, path: &Path, width: f32, color: [f32; 4]) {
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(TOLERANCE).with_line_width(width),
            &mut BuffersBuilder::new(&mut self.geometry, StrokeVertexCtor { color }),
        );
        match result {
            Ok(()) => self.flush_geometry(),
            Err(err) => {
                log::debug!("stroke tessellation failed: {err:?}");
                self.geometry.vertices.clear();
                self.geometry.indices.clear();
            }
        }
    }
}

impl Default for VectorState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VectorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorState")
            .field("vertices", &self.vertices.len())
            .finish()
    }
}

fn rect_points(pos: Vec2, size: Vec2) -> [Vec2; 4] {
    [
        pos,
        Vec2::new(pos.x + size.x, pos.y),
        pos + size,
        Vec2::new(pos.x, pos.y + size.y),
    ]
}

fn polyline_path(points: &[Vec2], closed: bool) -> Path {
    let mut builder = Path::builder();
    builder.begin(point(points[0].x, points[0].y));
    for p in &points[1..] {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(closed);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn fill_polygon_triangle() {
        let mut state = VectorState::new();
        state.fill_polygon(&[Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(50.0, 100.0)], RED);
        assert_eq!(state.vertex_count(), 3);
    }

    #[test]
    fn plain_rect_is_two_triangles() {
        let mut state = VectorState::new();
        state.tessellate(&ShapeCommand::Rect {
            pos: Vec2::ZERO,
            size: Vec2::new(40.0, 40.0),
            fill: RED,
            stroke: None,
        });
        assert_eq!(state.vertex_count(), 6);
        assert!(state.vertices().iter().all(|v| v.r == 1.0 && v.a == 1.0));
    }

    #[test]
    fn outlined_shapes_add_stroke_geometry() {
        let mut state = VectorState::new();
        let rect = ShapeCommand::Rect {
            pos: Vec2::ZERO,
            size: Vec2::new(40.0, 40.0),
            fill: RED,
            stroke: Some((1.0, [1.0; 4])),
        };
        state.tessellate(&rect);
        assert!(state.vertex_count() > 6);
        assert_eq!(state.vertex_count() % 3, 0);
    }

    #[test]
    fn every_shape_kind_tessellates() {
        let white = [1.0; 4];
        let shapes = [
            ShapeCommand::Circle { center: Vec2::splat(20.0), radius: 16.0, fill: RED, stroke: None },
            ShapeCommand::Ring { center: Vec2::splat(20.0), radius: 24.0, width: 3.0, color: white },
            ShapeCommand::Line { from: Vec2::ZERO, to: Vec2::new(100.0, 40.0), width: 2.0, color: white },
            ShapeCommand::Curve {
                from: Vec2::ZERO,
                control: Vec2::new(50.0, -60.0),
                to: Vec2::new(100.0, 0.0),
                width: 2.0,
                color: white,
            },
        ];
        for shape in &shapes {
            let mut state = VectorState::new();
            state.tessellate(shape);
            assert!(state.vertex_count() > 0, "{shape:?}");
        }
    }

    #[test]
    fn transparent_or_degenerate_shapes_produce_nothing() {
        let mut state = VectorState::new();
        state.fill_polygon(&[Vec2::ZERO, Vec2::ONE], RED);
        state.fill_rect(Vec2::ZERO, Vec2::new(10.0, 10.0), [1.0, 1.0, 1.0, 0.0]);
        state.fill_circle(Vec2::ZERO, 0.0, RED);
        state.stroke_circle(Vec2::ZERO, 10.0, 0.0, RED);
        assert_eq!(state.vertex_count(), 0);
    }

    #[test]
    fn clear_resets_buffer() {
        let mut state = VectorState::new();
        state.fill_rect(Vec2::ZERO, Vec2::new(100.0, 50.0), RED);
        assert!(state.vertex_count() > 0);
        state.clear();
        assert_eq!(state.vertex_count(), 0);
    }
}
