//! Fixed colors of the tactical view.

use crate::components::entity::EntityKind;
use crate::components::sprite::Color;
use crate::components::tilemap::HazardKind;

// Placeholder tiles
pub const FLOOR: Color = Color::hex(0x1a1b26);
pub const WALL: Color = Color::hex(0x2a2b36);
pub const GRID_LINE: Color = Color::hex(0x333344);
pub const WALL_CODE: u32 = 1;

pub fn placeholder(code: u32) -> Color {
    if code == WALL_CODE {
        WALL
    } else {
        FLOOR
    }
}

pub fn entity_color(kind: EntityKind) -> Color {
    match kind {
        EntityKind::Player => Color::hex(0x60a5fa),
        EntityKind::Enemy => Color::hex(0xef4444),
        EntityKind::Npc => Color::hex(0x10b981),
        EntityKind::Object => Color::hex(0xf59e0b),
    }
}

// Health bar
pub const HEALTH_TRACK: Color = Color::hex(0x111111);
pub const HEALTH_HIGH: Color = Color::hex(0x22c55e);
pub const HEALTH_MID: Color = Color::hex(0xeab308);
pub const HEALTH_LOW: Color = Color::hex(0xef4444);

/// Fill color for a health fraction: above 60% green, above 30% amber, else red.
pub fn health_color(fraction: f32) -> Color {
    if fraction > 0.6 {
        HEALTH_HIGH
    } else if fraction > 0.3 {
        HEALTH_MID
    } else {
        HEALTH_LOW
    }
}

/// One marker color per hazard category.
pub fn hazard_color(kind: HazardKind) -> Color {
    match kind {
        HazardKind::Fire => Color::hex(0xef4444).with_alpha(0.35),
        HazardKind::Acid => Color::hex(0x84cc16).with_alpha(0.35),
        HazardKind::Ice => Color::hex(0x67e8f9).with_alpha(0.3),
        HazardKind::Poison => Color::hex(0xa855f7).with_alpha(0.35),
        HazardKind::Water => Color::hex(0x3b82f6).with_alpha(0.3),
        HazardKind::Difficult => Color::hex(0x78716c).with_alpha(0.3),
        HazardKind::Unknown => Color::hex(0xf59e0b).with_alpha(0.25),
    }
}

/// Light wash for raised cells, stronger with height.
pub fn elevation_color(height: i32) -> Color {
    let alpha = (height.unsigned_abs() as f32 * 0.08).min(0.4);
    if height >= 0 {
        Color::WHITE.with_alpha(alpha)
    } else {
        Color::BLACK.with_alpha(alpha)
    }
}

pub const ITEM: Color = Color::hex(0xfbbf24);

// Decorations
pub const TOKEN_OUTLINE: Color = Color::WHITE;
pub const THREAT: Color = Color::hex(0xdc2626);
pub const TETHER: Color = Color::hex(0x22d3ee);
pub const LABEL: Color = Color::WHITE;

const STATUS_FALLBACK: [Color; 4] = [
    Color::hex(0xf472b6),
    Color::hex(0x818cf8),
    Color::hex(0x2dd4bf),
    Color::hex(0xfb923c),
];

/// Dot color for a status tag. Unknown tags get a stable color from a small set.
pub fn status_color(tag: &str) -> Color {
    match tag.to_ascii_lowercase().as_str() {
        "burning" | "burn" => Color::hex(0xf97316),
        "poisoned" | "poison" => Color::hex(0x84cc16),
        "stunned" | "stun" => Color::hex(0xfacc15),
        "bleeding" | "bleed" => Color::hex(0xb91c1c),
        "frozen" | "slowed" | "chilled" => Color::hex(0x67e8f9),
        "blessed" | "shielded" => Color::hex(0xfef08a),
        other => {
            // FNV-1a
            let hash = other
                .bytes()
                .fold(0x811c9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x01000193));
            STATUS_FALLBACK[hash as usize % STATUS_FALLBACK.len()]
        }
    }
}

// Targeting overlay
pub const RANGE: Color = Color::hex(0x3b82f6);
pub const RANGE_ALPHA: f32 = 0.2;
pub const AOE: Color = Color::hex(0xf97316);
pub const AOE_ALPHA: f32 = 0.35;

// Effects
pub const TEXT_CRITICAL: Color = Color::hex(0xfacc15);
pub const TEXT_MISS: Color = Color::hex(0x9ca3af);
pub const TEXT_REACTION: Color = Color::hex(0xa855f7);
pub const TEXT_DEFAULT: Color = Color::hex(0xf87171);
pub const ACTION_RING: Color = Color::hex(0xfacc15);
pub const PROJECTILE: Color = Color::hex(0xfde68a);
pub const AOE_PULSE: Color = Color::hex(0xf97316);
pub const JUMP_ARC: Color = Color::WHITE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_thresholds() {
        assert_eq!(health_color(1.0), HEALTH_HIGH);
        assert_eq!(health_color(0.61), HEALTH_HIGH);
        assert_eq!(health_color(0.6), HEALTH_MID);
        assert_eq!(health_color(0.31), HEALTH_MID);
        assert_eq!(health_color(0.3), HEALTH_LOW);
        assert_eq!(health_color(0.0), HEALTH_LOW);
    }

    #[test]
    fn every_hazard_has_its_own_marker() {
        let kinds = [
            HazardKind::Fire,
            HazardKind::Acid,
            HazardKind::Ice,
            HazardKind::Poison,
            HazardKind::Water,
            HazardKind::Difficult,
            HazardKind::Unknown,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(hazard_color(*a), hazard_color(*b), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn status_colors_are_stable() {
        assert_eq!(status_color("Burning"), status_color("burning"));
        assert_eq!(status_color("inspired"), status_color("inspired"));
    }

    #[test]
    fn walls_have_their_own_placeholder() {
        assert_eq!(placeholder(1), WALL);
        assert_eq!(placeholder(0), FLOOR);
        assert_eq!(placeholder(194), FLOOR);
    }
}
