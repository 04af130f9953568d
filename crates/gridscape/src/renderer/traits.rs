//! Backend contract.
//!
//! The core never talks to a GPU. It produces a [`FrameData`] per frame and
//! hands it to whatever [`Renderer`] the host created (WebGL/WebGPU through
//! JS, Canvas2D, or a software rasterizer in tests).

use glam::Vec2;

use super::camera::{CameraUniform, Viewport};
use super::instance::{SpriteInstance, VectorVertex};
use crate::assets::atlas::TextureId;
use crate::systems::lighting::LightUniform;

/// Render tier indicating GPU capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTier {
    /// HDR with Extended Dynamic Range (Display-P3, extended tone mapping)
    HdrEdr,
    /// HDR within sRGB gamut (rgba16float but no EDR)
    HdrSrgb,
    /// Standard Dynamic Range (bgra8unorm)
    Sdr,
    /// Software fallback (Canvas 2D / CPU rasterization)
    Software,
}

/// Timing information from a draw call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawTiming {
    /// Time spent submitting draw calls (microseconds)
    pub draw_us: u32,
    /// Time spent in GPU rasterization (microseconds, if measurable)
    pub raster_us: u32,
}

/// An untessellated shape in canvas pixels, colors premultiplied by node alpha.
///
/// Backends with a path API draw these directly; GPU backends use the
/// tessellated [`FrameData::vertices`] instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeCommand {
    Rect {
        pos: Vec2,
        size: Vec2,
        fill: [f32; 4],
        stroke: Option<(f32, [f32; 4])>,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: [f32; 4],
        stroke: Option<(f32, [f32; 4])>,
    },
    Ring {
        center: Vec2,
        radius: f32,
        width: f32,
        color: [f32; 4],
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: [f32; 4],
    },
    Curve {
        from: Vec2,
        control: Vec2,
        to: Vec2,
        width: f32,
        color: [f32; 4],
    },
}

/// A text run in canvas pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInstance {
    pub content: String,
    /// Anchor point on the canvas.
    pub pos: Vec2,
    /// Fraction of the text box placed on `pos` (0.5, 1.0 = bottom center).
    pub anchor: Vec2,
    pub font_size: f32,
    pub color: [f32; 4],
}

/// Complete frame data for rendering, in paint order within each list.
///
/// Sprites, shapes and texts are emitted in one scene walk; `order` records
/// how they interleave so a backend can preserve exact layering.
#[derive(Debug, Clone, Copy)]
pub struct FrameData<'a> {
    pub sprites: &'a [SpriteInstance],
    pub shapes: &'a [ShapeCommand],
    /// Tessellated `shapes`, 6 floats per vertex, triangle list.
    pub vertices: &'a [VectorVertex],
    pub texts: &'a [TextInstance],
    pub order: &'a [DrawOp],
    /// Atlas texture the sprites sample, if loaded.
    pub atlas: Option<TextureId>,
    pub clear_color: [f32; 4],
    pub camera: CameraUniform,
    pub viewport: Viewport,
    /// Present when the point-light filter is enabled.
    pub light: Option<LightUniform>,
}

/// One entry of the paint order: which list, and the index range in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
    Sprites { start: u32, end: u32 },
    Shapes { start: u32, end: u32 },
    Texts { start: u32, end: u32 },
}

/// Renderer trait for GPU backends.
///
/// ```ignore
/// struct WebGlRenderer { /* ... */ }
///
/// impl Renderer for WebGlRenderer {
///     fn backend(&self) -> &'static str { "webgl2" }
///     fn tier(&self) -> RenderTier { RenderTier::Sdr }
///     fn draw(&mut self, frame: &FrameData<'_>) -> DrawTiming { /* ... */ }
///     fn resize(&mut self, width: u32, height: u32) { /* ... */ }
///     fn destroy(&mut self) { /* ... */ }
/// }
/// ```
pub trait Renderer {
    /// Backend identifier (e.g., "webgpu", "webgl2", "canvas2d")
    fn backend(&self) -> &'static str;

    /// Current render tier based on hardware capabilities
    fn tier(&self) -> RenderTier;

    /// Draw a complete frame.
    fn draw(&mut self, frame: &FrameData<'_>) -> DrawTiming;

    /// Resize the backing surface, in device pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Free every GPU resource. Called exactly once.
    fn destroy(&mut self);
}

/// The host element the canvas lives in.
pub trait Container {
    /// Size in CSS pixels.
    fn size(&self) -> (f32, f32);

    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Insert the renderer's canvas into the element.
    fn attach_canvas(&mut self);

    /// Remove the canvas again.
    fn detach_canvas(&mut self);

    /// Free an atlas texture the host loaded. The atlas can arrive before
    /// any renderer exists, so the host owns it, not the renderer.
    fn release_texture(&mut self, texture: TextureId);
}
