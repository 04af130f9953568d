use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::error::RenderError;

/// Describes the sprite-sheet and the symbolic icon names that point into it.
/// Loaded from a JSON file next to the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasManifest {
    /// Relative path to the sheet image (e.g., "tileset.png").
    pub path: String,
    /// Source pixel width of one cell.
    #[serde(default = "default_tile_px")]
    pub tile_width: u32,
    /// Source pixel height of one cell.
    #[serde(default = "default_tile_px")]
    pub tile_height: u32,
    /// Icon name → sheet index.
    #[serde(default)]
    pub icons: HashMap<String, u32>,
}

fn default_tile_px() -> u32 {
    32
}

impl AtlasManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(RenderError::Manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_manifest() {
        let manifest = AtlasManifest::from_json(r#"{ "path": "tileset.png" }"#).unwrap();
        assert_eq!(manifest.tile_width, 32);
        assert_eq!(manifest.tile_height, 32);
        assert!(manifest.icons.is_empty());
    }

    #[test]
    fn parse_icons() {
        let json = r#"{
            "path": "tileset.png",
            "tile_width": 16,
            "tile_height": 16,
            "icons": { "hero": 115, "chest_closed": 402 }
        }"#;
        let manifest = AtlasManifest::from_json(json).unwrap();
        assert_eq!(manifest.tile_width, 16);
        assert_eq!(manifest.icons["chest_closed"], 402);
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        assert!(matches!(
            AtlasManifest::from_json("{ \"icons\": 3 }"),
            Err(RenderError::Manifest(_))
        ));
    }
}
