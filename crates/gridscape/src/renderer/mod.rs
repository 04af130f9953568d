pub mod camera;
pub mod instance;
pub mod lifecycle;
pub mod traits;

// Re-export key types for convenient access
pub use traits::{Container, DrawOp, DrawTiming, FrameData, RenderTier, Renderer, ShapeCommand, TextInstance};
