use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::types::{EntityId, GridPos};
use crate::components::sprite::Color;
use crate::core::error::RenderError;

/// Presentation category of floating combat text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Critical,
    Miss,
    Reaction,
    #[default]
    #[serde(other)]
    Default,
}

fn default_intensity() -> f32 {
    5.0
}

fn default_radius() -> u32 {
    1
}

/// A transient visual event. Played once, then discarded.
///
/// On the wire: `{"type": "floating_text", "pos": [3, 2], "text": "-12", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualEvent {
    /// Text rising from a cell while fading.
    FloatingText {
        pos: GridPos,
        text: String,
        #[serde(default)]
        style: TextStyle,
        #[serde(default)]
        color: Option<Color>,
    },
    /// Jitter the whole world by up to `intensity` pixels.
    CameraShake {
        #[serde(default = "default_intensity")]
        intensity: f32,
    },
    /// Pulsing ring around an entity about to act.
    #[serde(alias = "action_start")]
    ActionStartPulse { entity: EntityId },
    /// Dot travelling between two cells.
    Projectile {
        from: GridPos,
        to: GridPos,
        #[serde(default)]
        color: Option<Color>,
    },
    /// Expanding ring over an area, `radius` in cells.
    #[serde(alias = "aoe")]
    AoePulse {
        pos: GridPos,
        #[serde(default = "default_radius")]
        radius: u32,
        #[serde(default)]
        color: Option<Color>,
    },
    /// Fading parabola from a jump's start cell to its landing cell.
    JumpArc { from: GridPos, to: GridPos },
}

impl VisualEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            VisualEvent::FloatingText { .. } => "floating_text",
            VisualEvent::CameraShake { .. } => "camera_shake",
            VisualEvent::ActionStartPulse { .. } => "action_start_pulse",
            VisualEvent::Projectile { .. } => "projectile",
            VisualEvent::AoePulse { .. } => "aoe_pulse",
            VisualEvent::JumpArc { .. } => "jump_arc",
        }
    }
}

/// Parse a batch of events: either a bare array or an object carrying an
/// `updates` array. Entries that are not a known event are skipped with a
/// warning; only a malformed batch is an error.
pub fn parse_events(json: &str) -> Result<Vec<VisualEvent>, RenderError> {
    let value: Value = serde_json::from_str(json).map_err(RenderError::Events)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("updates") {
            Some(Value::Array(items)) => items,
            Some(_) | None => Vec::new(),
        },
        other => {
            return Err(RenderError::Events(serde::de::Error::custom(format!(
                "expected an event array, got {other}"
            ))))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<VisualEvent>(item) {
            Ok(event) => Some(event),
            Err(err) => {
                log::warn!("skipping visual event: {err}");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_kind() {
        let json = r##"[
            {"type": "floating_text", "pos": [1, 2], "text": "CRIT 24", "style": "critical"},
            {"type": "camera_shake"},
            {"type": "action_start", "entity": "gob_1"},
            {"type": "projectile", "from": [0, 0], "to": [4, 0], "color": "#ff0000"},
            {"type": "aoe_pulse", "pos": [3, 3], "radius": 2},
            {"type": "jump_arc", "from": [0, 0], "to": [2, 2]}
        ]"##;
        let events = parse_events(json).unwrap();
        let names: Vec<_> = events.iter().map(VisualEvent::name).collect();
        assert_eq!(
            names,
            ["floating_text", "camera_shake", "action_start_pulse", "projectile", "aoe_pulse", "jump_arc"]
        );
        assert_eq!(events[1], VisualEvent::CameraShake { intensity: 5.0 });
        match &events[0] {
            VisualEvent::FloatingText { style, color, .. } => {
                assert_eq!(*style, TextStyle::Critical);
                assert!(color.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let json = r#"[
            {"type": "teleport", "to": [1, 1]},
            {"type": "projectile", "from": [0, 0]},
            {"type": "camera_shake", "intensity": 8}
        ]"#;
        assert_eq!(parse_events(json).unwrap(), vec![VisualEvent::CameraShake { intensity: 8.0 }]);
    }

    #[test]
    fn accepts_backend_update_envelope() {
        let json = r#"{"updates": [{"type": "aoe_pulse", "pos": [1, 1]}], "log": []}"#;
        let events = parse_events(json).unwrap();
        assert_eq!(
            events,
            vec![VisualEvent::AoePulse { pos: GridPos::new(1, 1), radius: 1, color: None }]
        );
        assert!(parse_events(r#"{"log": []}"#).unwrap().is_empty());
    }

    #[test]
    fn unknown_text_style_falls_back() {
        let json = r#"[{"type": "floating_text", "pos": [0, 0], "text": "ok", "style": "heal"}]"#;
        match &parse_events(json).unwrap()[0] {
            VisualEvent::FloatingText { style, .. } => assert_eq!(*style, TextStyle::Default),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_batch_is_an_error() {
        assert!(matches!(parse_events("not json"), Err(RenderError::Events(_))));
        assert!(matches!(parse_events("42"), Err(RenderError::Events(_))));
    }
}
