use serde::{Deserialize, Serialize};

/// RGBA color, components in 0.0 - 1.0.
///
/// Serialized as a `#rrggbb` or `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const WHITE: Self = Self::hex(0xffffff);
    pub const BLACK: Self = Self::hex(0x000000);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let digits = s.strip_prefix('#').unwrap_or(&s);
        let value = u32::from_str_radix(digits, 16).map_err(|_| format!("bad color {s:?}"))?;
        match digits.len() {
            6 => Ok(Self::hex(value)),
            8 => Ok(Self::hex(value >> 8).with_alpha((value & 0xff) as f32 / 255.0)),
            _ => Err(format!("bad color {s:?}")),
        }
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if c.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", byte(c.r), byte(c.g), byte(c.b))
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", byte(c.r), byte(c.g), byte(c.b), byte(c.a))
        }
    }
}

/// How an entity names its sprite: a raw sheet index or a symbolic icon key.
///
/// The store sends icons as strings. `"sheet:115"` means sheet index 115;
/// anything else is looked up in the icon registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SpriteRefRepr", into = "String")]
pub enum SpriteRef {
    Index(u32),
    Icon(String),
}

impl SpriteRef {
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix("sheet:").map(str::parse) {
            Some(Ok(index)) => SpriteRef::Index(index),
            _ => SpriteRef::Icon(s.to_owned()),
        }
    }
}

impl From<SpriteRef> for String {
    fn from(r: SpriteRef) -> Self {
        match r {
            SpriteRef::Index(i) => format!("sheet:{i}"),
            SpriteRef::Icon(key) => key,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpriteRefRepr {
    Index(u32),
    Text(String),
}

impl From<SpriteRefRepr> for SpriteRef {
    fn from(repr: SpriteRefRepr) -> Self {
        match repr {
            SpriteRefRepr::Index(i) => SpriteRef::Index(i),
            SpriteRefRepr::Text(s) => SpriteRef::parse(&s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_literal_splits_channels() {
        let c = Color::hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 0.5).abs() < 0.01);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn colors_parse_from_hex_strings() {
        let c: Color = serde_json::from_str("\"#1a1b26\"").unwrap();
        assert_eq!(c, Color::hex(0x1a1b26));

        let c: Color = serde_json::from_str("\"#ffffff80\"").unwrap();
        assert!((c.a - 0.5).abs() < 0.01);

        assert!(serde_json::from_str::<Color>("\"#12\"").is_err());
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn sheet_prefix_means_index() {
        assert_eq!(SpriteRef::parse("sheet:115"), SpriteRef::Index(115));
        assert_eq!(SpriteRef::parse("goblin"), SpriteRef::Icon("goblin".into()));
        assert_eq!(SpriteRef::parse("sheet:x"), SpriteRef::Icon("sheet:x".into()));
    }

    #[test]
    fn sprite_refs_accept_numbers_and_strings() {
        let r: SpriteRef = serde_json::from_str("42").unwrap();
        assert_eq!(r, SpriteRef::Index(42));
        let r: SpriteRef = serde_json::from_str("\"sheet:7\"").unwrap();
        assert_eq!(r, SpriteRef::Index(7));
    }
}
