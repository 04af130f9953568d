use serde::{Deserialize, Serialize};

use crate::api::types::{EntityId, GridPos};
use crate::components::sprite::{Color, SpriteRef};

/// Category of an entity. Drives the fallback token color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,
    Enemy,
    #[default]
    Npc,
    Object,
}

/// Optional visual indicator attached to an entity.
///
/// The store resolves these once per snapshot. The scene builder draws each
/// kind with one fixed treatment and simply skips kinds that are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decoration {
    /// One dot per status tag, along the token's top edge.
    StatusDots,
    /// Soft ring around the token in the given color.
    Aura { color: Color },
    /// Red ring marking the entity as holding aggro.
    Threat,
    /// Line from this entity to its linked partner.
    Tether { partner: EntityId },
    /// Name text above the token.
    Label,
}

/// Kind of a [`Decoration`], without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationKind {
    StatusDots,
    Aura,
    Threat,
    Tether,
    Label,
}

impl Decoration {
    pub fn kind(&self) -> DecorationKind {
        match self {
            Decoration::StatusDots => DecorationKind::StatusDots,
            Decoration::Aura { .. } => DecorationKind::Aura,
            Decoration::Threat => DecorationKind::Threat,
            Decoration::Tether { .. } => DecorationKind::Tether,
            Decoration::Label => DecorationKind::Label,
        }
    }
}

/// Read-only snapshot of an entity, as supplied for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: EntityKind,
    pub pos: GridPos,
    #[serde(default, rename = "icon")]
    pub sprite: Option<SpriteRef>,
    #[serde(default)]
    pub hp: Option<f32>,
    #[serde(default, rename = "maxHp")]
    pub max_hp: Option<f32>,
    #[serde(default, rename = "tags")]
    pub status_tags: Vec<String>,
    #[serde(default, rename = "isBoss")]
    pub is_boss: bool,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
}

impl EntityView {
    pub fn new(id: impl Into<String>, pos: GridPos) -> Self {
        Self {
            id: EntityId::new(id),
            name: String::new(),
            kind: EntityKind::default(),
            pos,
            sprite: None,
            hp: None,
            max_hp: None,
            status_tags: Vec::new(),
            is_boss: false,
            decorations: Vec::new(),
        }
    }

    // -- Builder pattern --

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_sprite(mut self, sprite: SpriteRef) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_hp(mut self, hp: f32, max_hp: f32) -> Self {
        self.hp = Some(hp);
        self.max_hp = Some(max_hp);
        self
    }

    pub fn with_status(mut self, tag: impl Into<String>) -> Self {
        self.status_tags.push(tag.into());
        self
    }

    pub fn with_boss(mut self, is_boss: bool) -> Self {
        self.is_boss = is_boss;
        self
    }

    pub fn with_decoration(mut self, decoration: Decoration) -> Self {
        self.decorations.push(decoration);
        self
    }

    /// First decoration of the given kind, if any.
    pub fn decoration(&self, kind: DecorationKind) -> Option<&Decoration> {
        self.decorations.iter().find(|d| d.kind() == kind)
    }

    pub fn has(&self, kind: DecorationKind) -> bool {
        self.decoration(kind).is_some()
    }

    /// Health fraction clamped to [0, 1], when both values are present and
    /// `max_hp` is positive.
    pub fn health_fraction(&self) -> Option<f32> {
        match (self.hp, self.max_hp) {
            (Some(hp), Some(max)) if max > 0.0 => Some((hp / max).clamp(0.0, 1.0)),
            _ => None,
        }
    }
}
