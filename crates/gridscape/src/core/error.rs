use thiserror::Error;

/// Errors surfaced by the fallible edges of the view: parsing inputs,
/// validating assets, and driving the renderer lifecycle.
///
/// Drawing itself never fails. Missing textures degrade to primitives.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("grid row {row} has {found} cells, expected {expected}")]
    InvalidGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid atlas manifest: {0}")]
    Manifest(#[source] serde_json::Error),
    #[error("invalid view config: {0}")]
    Config(#[source] serde_json::Error),
    #[error("invalid scene input: {0}")]
    Input(#[source] serde_json::Error),
    #[error("invalid visual event batch: {0}")]
    Events(#[source] serde_json::Error),
    #[error("renderer surface creation failed: {0}")]
    SurfaceCreation(String),
    #[error("texture atlas unavailable: {0}")]
    AtlasUnavailable(String),
    #[error("autotile base {base} needs slices up to {needed}, atlas holds {available}")]
    AutotileRange {
        base: u32,
        needed: u32,
        available: u32,
    },
    #[error("invalid cell key {0:?}, expected \"x,y\"")]
    InvalidCellKey(String),
    #[error("no initialization in flight")]
    NotInitializing,
}
