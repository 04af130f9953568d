use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

/// How the world is placed inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    /// Native scale, centered. The world may overflow the viewport.
    #[default]
    Center,
    /// Shrink to fit (never enlarge), then center.
    Fit,
}

/// Offset and uniform scale applied to the world container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub offset: Vec2,
    pub scale: f32,
}

impl CameraTransform {
    pub const IDENTITY: CameraTransform = CameraTransform {
        offset: Vec2::ZERO,
        scale: 1.0,
    };
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Smallest scale fit mode will produce, so the transform stays invertible
/// for hit-testing even in a degenerate viewport.
const MIN_FIT_SCALE: f32 = 0.01;

/// Place a `world`-sized scene inside a `viewport`.
///
/// `padding` is the total margin (both sides together) fit mode keeps free.
pub fn fit(world: Vec2, viewport: Vec2, mode: CameraMode, padding: f32) -> CameraTransform {
    let scale = match mode {
        CameraMode::Center => 1.0,
        CameraMode::Fit => {
            let sx = if world.x > 0.0 { (viewport.x - padding) / world.x } else { 1.0 };
            let sy = if world.y > 0.0 { (viewport.y - padding) / world.y } else { 1.0 };
            1.0f32.min(sx).min(sy).max(MIN_FIT_SCALE)
        }
    };
    CameraTransform {
        offset: (viewport - world * scale) / 2.0,
        scale,
    }
}

/// Drawable area of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: f32,
    /// Height in CSS pixels.
    pub height: f32,
    /// Device pixels per CSS pixel.
    pub resolution: f32,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
}

impl Viewport {
    pub fn new(width: f32, height: f32, resolution: f32) -> Self {
        Self {
            width,
            height,
            resolution: if resolution > 0.0 { resolution } else { 1.0 },
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Backing-store size in device pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.resolution).round().max(1.0) as u32,
            (self.height * self.resolution).round().max(1.0) as u32,
        )
    }

    /// Orthographic projection, origin top-left, Y down, Z in [0, 1].
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, 0.0, 1.0)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            projection: self.projection_matrix().to_cols_array_2d(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0, 1.0)
    }
}
