use std::collections::HashMap;

use crate::assets::manifest::AtlasManifest;
use crate::components::sprite::SpriteRef;

/// Registry of named icons, built from an [`AtlasManifest`].
/// Resolves an entity's [`SpriteRef`] to a sheet index.
#[derive(Debug, Clone, Default)]
pub struct IconRegistry {
    icons: HashMap<String, u32>,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed manifest.
    pub fn from_manifest(manifest: &AtlasManifest) -> Self {
        Self {
            icons: manifest.icons.clone(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, index: u32) {
        self.icons.insert(name.into(), index);
    }

    /// Look up an icon by name.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.icons.get(name).copied()
    }

    /// Sheet index for a sprite reference. `None` for unknown icon names.
    pub fn resolve(&self, sprite: &SpriteRef) -> Option<u32> {
        match sprite {
            SpriteRef::Index(index) => Some(*index),
            SpriteRef::Icon(name) => self.get(name),
        }
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}
