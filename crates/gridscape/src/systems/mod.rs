pub mod autotile;
pub mod builder;
pub mod effects;
pub mod lighting;
pub mod palette;
pub mod render;
#[cfg(feature = "vectors")]
pub mod vector;
