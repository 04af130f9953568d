/// Disposable layers of the scene, in painter's order.
///
/// Layers are rebuilt wholesale on every state change. Effects do not live
/// in any of these; they sit in the persistent effect space above them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum SceneLayer {
    /// Terrain tiles, placeholders and per-cell terrain markers. Hit-testable.
    #[default]
    Background = 0,
    /// Entity groups and the tethers between them.
    Entities = 1,
    /// Range and area-of-effect previews.
    Overlay = 2,
}

impl SceneLayer {
    /// Total number of layers.
    pub const COUNT: usize = 3;

    /// All layers, back to front.
    pub const ALL: [SceneLayer; Self::COUNT] = [
        SceneLayer::Background,
        SceneLayer::Entities,
        SceneLayer::Overlay,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Background),
            1 => Some(Self::Entities),
            2 => Some(Self::Overlay),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
