//! Color definitions for interactions, graph nodes and civilizations

use crate::snapshot::model::InteractionKind;

/// RGBA color (0.0 to 1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq)]
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

    /// Parse `#rrggbb`, `#rgb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match digits.len() {
            3 => {
                let mut out = [0.0f32; 3];
                for (i, c) in digits.chars().enumerate() {
                    let pair: String = [c, c].iter().collect();
                    out[i] = channel(&pair)?;
                }
                Some(Self::new(out[0], out[1], out[2], 1.0))
            }
            6 | 8 => {
                let r = channel(digits.get(0..2)?)?;
                let g = channel(digits.get(2..4)?)?;
                let b = channel(digits.get(4..6)?)?;
                let a = match digits.get(6..8) {
                    Some(s) => channel(s)?,
                    None => 1.0,
                };
                Some(Self::new(r, g, b, a))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

/// Used when a civilization carries an unparseable color
pub const FALLBACK_CIVILIZATION: Color = Color::new(0.58, 0.64, 0.72, 1.0); // slate

/// Relationship link stroke
pub const LINK_STROKE: &str = "#999999";
pub const LINK_OPACITY: f64 = 0.6;

/// Relationship node radius (canvas units)
pub const NODE_RADIUS: f64 = 5.0;

/// How an interaction arc is stroked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionStyle {
    pub color: &'static str,
    /// SVG dash array, `None` for a solid line
    pub dash: Option<&'static str>,
    pub stroke_width: f64,
    pub opacity: f64,
}

pub fn interaction_color(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Conflict => "#ef4444", // red
        InteractionKind::Trade => "#eab308",    // amber
        InteractionKind::Culture | InteractionKind::Diplomacy => "#3b82f6", // blue
    }
}

pub fn interaction_style(kind: InteractionKind) -> InteractionStyle {
    InteractionStyle {
        color: interaction_color(kind),
        dash: match kind {
            InteractionKind::Conflict => Some("4,4"),
            _ => None,
        },
        stroke_width: 1.5,
        opacity: 0.6,
    }
}

/// Fill for a relationship node by its group
pub fn node_color(group: &str) -> &'static str {
    match group {
        "person" => "#f472b6",
        "nation" => "#60a5fa",
        _ => "#a3e635",
    }
}

/// Parsed civilization color, falling back to slate
pub fn civilization_color(hex: &str) -> Color {
    Color::from_hex(hex).unwrap_or(FALLBACK_CIVILIZATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::new(1.0, 1.0, 1.0, 1.0)));
        assert_eq!(Color::from_hex("#00000000").map(|c| c.a), Some(0.0));
        assert_eq!(Color::from_hex("red"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Color::from_hex("#ef4444").unwrap().to_hex(), "#ef4444");
    }

    #[test]
    fn test_interaction_styles() {
        let conflict = interaction_style(InteractionKind::Conflict);
        assert_eq!(conflict.color, "#ef4444");
        assert_eq!(conflict.dash, Some("4,4"));
        assert_eq!(interaction_style(InteractionKind::Trade).color, "#eab308");
        assert_eq!(interaction_style(InteractionKind::Diplomacy).color, "#3b82f6");
        assert_eq!(interaction_style(InteractionKind::Culture).dash, None);
        assert_eq!(conflict.stroke_width, 1.5);
        assert_eq!(conflict.opacity, 0.6);
    }

    #[test]
    fn test_node_colors() {
        assert_eq!(node_color("person"), "#f472b6");
        assert_eq!(node_color("nation"), "#60a5fa");
        assert_eq!(node_color("organization"), "#a3e635");
    }

    #[test]
    fn test_bad_civilization_color_falls_back() {
        assert_eq!(civilization_color("not a color"), FALLBACK_CIVILIZATION);
    }
}
