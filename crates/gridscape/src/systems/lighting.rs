//! Ambient + single point light filter.
//!
//! The backend runs this as a full-screen pass over the composited frame.
//! For a pixel `p` with texel `c`:
//!
//! ```text
//! att     = clamp(1 - |p - light| / radius, 0, 1)^2
//! out.rgb = c.rgb * (ambient + light_color * att)
//! out.a   = c.a
//! ```
//!
//! [`LightFilter::shade`] is the CPU reference of that pass.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Light settings from the view config. Every field has a default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Light color, warm torch by default.
    pub color: [f32; 3],
    /// Falloff distance in canvas pixels.
    pub radius: f32,
    /// Ambient intensity applied everywhere.
    pub ambient: f32,
    /// Light position in canvas pixels. `None` keeps it at the canvas center.
    pub position: Option<[f32; 2]>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 0.9, 0.6],
            radius: 300.0,
            ambient: 0.2,
            position: None,
        }
    }
}

/// A 2D point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub pos: Vec2,
    pub color: Vec3,
    pub radius: f32,
}

impl PointLight {
    pub fn new(pos: Vec2, color: [f32; 3], radius: f32) -> Self {
        Self {
            pos,
            color: Vec3::from_array(color),
            radius,
        }
    }

    /// Squared linear falloff at a pixel, in [0, 1].
    pub fn attenuation(&self, pixel: Vec2) -> f32 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        let att = (1.0 - pixel.distance(self.pos) / self.radius).clamp(0.0, 1.0);
        att * att
    }
}

/// Uniform block for the light pass. 12 floats, 16-byte aligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    pub light_pos: [f32; 2],
    pub dimensions: [f32; 2],
    pub light_color: [f32; 3],
    pub radius: f32,
    pub ambient: f32,
    pub _pad: [f32; 3],
}

impl LightUniform {
    pub const FLOATS: usize = 12;
}

/// Point-light filter state.
#[derive(Debug, Clone)]
pub struct LightFilter {
    light: PointLight,
    ambient: f32,
    dimensions: Vec2,
    pinned: bool,
}

impl LightFilter {
    pub fn new(config: &LightConfig, width: f32, height: f32) -> Self {
        let dimensions = Vec2::new(width, height);
        let pos = config.position.map_or(dimensions / 2.0, Vec2::from_array);
        Self {
            light: PointLight::new(pos, config.color, config.radius),
            ambient: config.ambient,
            dimensions,
            pinned: config.position.is_some(),
        }
    }

    /// Move the light and change its reach.
    pub fn update_light(&mut self, x: f32, y: f32, radius: f32) {
        self.light.pos = Vec2::new(x, y);
        self.light.radius = radius;
        self.pinned = true;
    }

    /// Track the canvas size. An unpinned light follows the center.
    pub fn update_dimensions(&mut self, width: f32, height: f32) {
        self.dimensions = Vec2::new(width, height);
        if !self.pinned {
            self.light.pos = self.dimensions / 2.0;
        }
    }

    pub fn light(&self) -> &PointLight {
        &self.light
    }

    pub fn ambient(&self) -> f32 {
        self.ambient
    }

    pub fn uniform(&self) -> LightUniform {
        LightUniform {
            light_pos: self.light.pos.to_array(),
            dimensions: self.dimensions.to_array(),
            light_color: self.light.color.to_array(),
            radius: self.light.radius,
            ambient: self.ambient,
            _pad: [0.0; 3],
        }
    }

    /// Lit color of a texel at a canvas pixel.
    pub fn shade(&self, pixel: Vec2, texel: [f32; 4]) -> [f32; 4] {
        let light = Vec3::splat(self.ambient) + self.light.color * self.light.attenuation(pixel);
        let rgb = Vec3::new(texel[0], texel[1], texel[2]) * light;
        [rgb.x, rgb.y, rgb.z, texel[3]]
    }
}
