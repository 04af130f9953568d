//! Camera shake. Jitter lives beside the camera offset on the world node,
//! so zeroing it restores the drawn offset exactly.

use glam::Vec2;

use super::{Lifetime, Rng};
use crate::core::scene::SceneGraph;
use crate::core::time::{TickFlow, TickHandler};

#[derive(Debug)]
pub struct CameraShake {
    intensity: f32,
    rng: Rng,
    life: Lifetime,
}

impl CameraShake {
    pub const DURATION: f32 = 15.0;

    pub fn new(intensity: f32, rng: Rng) -> Self {
        Self {
            intensity: intensity.abs(),
            rng,
            life: Lifetime::new(Self::DURATION),
        }
    }
}

impl TickHandler<SceneGraph> for CameraShake {
    fn tick(&mut self, scene: &mut SceneGraph, delta: f32) -> TickFlow {
        self.life.advance(delta);
        if self.life.finished() {
            scene.set_world_jitter(Vec2::ZERO);
            return TickFlow::Done;
        }
        let jitter = Vec2::new(
            self.rng.symmetric(self.intensity),
            self.rng.symmetric(self.intensity),
        );
        scene.set_world_jitter(jitter);
        TickFlow::Continue
    }
}
