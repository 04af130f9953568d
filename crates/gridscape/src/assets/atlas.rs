//! Sprite-sheet slicing with a per-index cache.
//!
//! The sheet is one texture cut into fixed-size cells, addressed row-major:
//! `col = index % columns`, `row = index / columns`, with
//! `columns = floor(sheet_width / tile_width)`.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::error::RenderError;

/// Opaque handle of a GPU texture owned by the renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// A loaded sprite-sheet, as reported by the backend once the image is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasImage {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Pixel rectangle inside the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A sub-texture of the sheet. One instance per index while the sheet stays loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlice {
    pub index: u32,
    pub texture: TextureId,
    pub col: u32,
    pub row: u32,
    pub rect: SliceRect,
}

/// Lazily slices a loaded sheet and memoizes the slices by index.
#[derive(Debug)]
pub struct TextureAtlas {
    tile_width: u32,
    tile_height: u32,
    image: Option<AtlasImage>,
    slices: HashMap<u32, Rc<TextureSlice>>,
}

impl TextureAtlas {
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_width: tile_width.max(1),
            tile_height: tile_height.max(1),
            image: None,
            slices: HashMap::new(),
        }
    }

    /// Install a (re)loaded sheet. Every previously handed-out slice is dropped
    /// from the cache.
    pub fn load(&mut self, image: AtlasImage) {
        if self.image.is_some() {
            log::info!("atlas reloaded, dropping {} cached slices", self.slices.len());
        }
        self.slices.clear();
        self.image = Some(image);
    }

    /// Forget the sheet and all slices. Returns the texture the backend
    /// should release, if one was loaded.
    pub fn unload(&mut self) -> Option<TextureId> {
        self.slices.clear();
        self.image.take().map(|img| img.texture)
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&AtlasImage> {
        self.image.as_ref()
    }

    /// Cells per sheet row. Zero when nothing is loaded.
    pub fn columns(&self) -> u32 {
        self.image.map_or(0, |img| img.width / self.tile_width)
    }

    /// Total addressable cells.
    pub fn capacity(&self) -> u32 {
        self.image
            .map_or(0, |img| self.columns() * (img.height / self.tile_height))
    }

    pub fn cached_len(&self) -> usize {
        self.slices.len()
    }

    /// Slice for a sheet index.
    ///
    /// `None` while the sheet is not loaded, or when the index falls outside it.
    /// Callers draw a flat primitive instead.
    pub fn slice(&mut self, index: u32) -> Option<Rc<TextureSlice>> {
        let image = self.image?;
        if let Some(slice) = self.slices.get(&index) {
            return Some(Rc::clone(slice));
        }
        if index >= self.capacity() {
            return None;
        }

        let columns = self.columns();
        let col = index % columns;
        let row = index / columns;
        let slice = Rc::new(TextureSlice {
            index,
            texture: image.texture,
            col,
            row,
            rect: SliceRect {
                x: col * self.tile_width,
                y: row * self.tile_height,
                width: self.tile_width,
                height: self.tile_height,
            },
        });
        self.slices.insert(index, Rc::clone(&slice));
        Some(slice)
    }

    /// Check that each autotile base has its 16 contiguous variants inside the sheet.
    pub fn validate_autotile(&self, bases: &[u32]) -> Result<(), RenderError> {
        if !self.is_loaded() {
            return Err(RenderError::AtlasUnavailable("not loaded".into()));
        }
        let available = self.capacity();
        for &base in bases {
            let needed = base + 15;
            if needed >= available {
                return Err(RenderError::AutotileRange {
                    base,
                    needed,
                    available,
                });
            }
        }
        Ok(())
    }
}
