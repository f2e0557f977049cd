//! Color resolution for particle configurations.
//!
//! Host configurations arrive with colors in whatever form the authoring
//! surface produced: hex strings, `rgb(...)` functions, structured
//! `{r, g, b}` objects, or unresolved design tokens. Everything funnels
//! through [`Rgb::resolve`], which never fails - unparseable input falls
//! back to [`Rgb::FALLBACK`] (white).

use serde::{Deserialize, Serialize};

/// A resolved, canonical color. The single color representation used by
/// the simulator and renderer; produced only by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Raw color input as it appears in host configuration.
///
/// Untagged so that `"#7fd"`, `{"r":12,"g":200,"b":90}` and `[12,200,90]`
/// all deserialize without ceremony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorInput {
    Text(String),
    Components { r: u8, g: u8, b: u8 },
    Triple([u8; 3]),
}

impl Rgb {
    /// Fallback for unparseable input: `#ffffff`.
    pub const FALLBACK: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Resolve a raw color input to a canonical color.
    ///
    /// Never fails. Design-token strings (`var(--x)`, `$token`,
    /// `{palette.fg}`) and anything else unparseable resolve to the
    /// fallback.
    pub fn resolve(input: &ColorInput) -> Rgb {
        match input {
            ColorInput::Text(s) => Self::parse_str(s).unwrap_or(Rgb::FALLBACK),
            ColorInput::Components { r, g, b } => Rgb::new(*r, *g, *b),
            ColorInput::Triple([r, g, b]) => Rgb::new(*r, *g, *b),
        }
    }

    fn parse_str(s: &str) -> Option<Rgb> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(body) = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Self::parse_rgb_fn(body);
        }
        // Unresolved design tokens and CSS custom properties.
        None
    }

    fn parse_hex(hex: &str) -> Option<Rgb> {
        match hex.len() {
            3 => {
                let mut ch = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    ch[i] = v * 16 + v;
                }
                Some(Rgb::new(ch[0], ch[1], ch[2]))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Rgb::new(r, g, b))
            }
            _ => None,
        }
    }

    fn parse_rgb_fn(body: &str) -> Option<Rgb> {
        let mut parts = body.split(',').map(str::trim);
        let r = parts.next()?.parse::<u8>().ok()?;
        let g = parts.next()?.parse::<u8>().ok()?;
        let b = parts.next()?.parse::<u8>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Rgb::new(r, g, b))
    }

    /// Canonical hex form, e.g. `#ff8800`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// RGBA components in [0, 1] with the given alpha, for vertex data.
    #[inline]
    pub fn to_rgba(&self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha.clamp(0.0, 1.0),
        ]
    }
}

/// Resolve a palette: a non-empty color list is preferred over the single
/// color; an empty configuration yields a one-entry fallback palette.
pub fn resolve_palette(palette: &[ColorInput], single: Option<&ColorInput>) -> Vec<Rgb> {
    if !palette.is_empty() {
        return palette.iter().map(Rgb::resolve).collect();
    }
    vec![single.map(Rgb::resolve).unwrap_or(Rgb::FALLBACK)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ColorInput {
        ColorInput::Text(s.to_string())
    }

    #[test]
    fn test_hex_long_and_short() {
        assert_eq!(Rgb::resolve(&text("#ff8800")), Rgb::new(255, 136, 0));
        assert_eq!(Rgb::resolve(&text("#f80")), Rgb::new(255, 136, 0));
        assert_eq!(Rgb::resolve(&text(" #0000ff ")), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_rgb_function() {
        assert_eq!(Rgb::resolve(&text("rgb(12, 200, 90)")), Rgb::new(12, 200, 90));
        assert_eq!(Rgb::resolve(&text("rgb(0,0,0)")), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_structured_inputs() {
        assert_eq!(
            Rgb::resolve(&ColorInput::Components { r: 1, g: 2, b: 3 }),
            Rgb::new(1, 2, 3)
        );
        assert_eq!(Rgb::resolve(&ColorInput::Triple([9, 8, 7])), Rgb::new(9, 8, 7));
    }

    #[test]
    fn test_tokens_fall_back_to_white() {
        assert_eq!(Rgb::resolve(&text("var(--accent)")), Rgb::FALLBACK);
        assert_eq!(Rgb::resolve(&text("$brand.primary")), Rgb::FALLBACK);
        assert_eq!(Rgb::resolve(&text("{palette.fg}")), Rgb::FALLBACK);
        assert_eq!(Rgb::resolve(&text("#12345")), Rgb::FALLBACK);
        assert_eq!(Rgb::resolve(&text("rgb(300, 0, 0)")), Rgb::FALLBACK);
        assert_eq!(Rgb::resolve(&text("")), Rgb::FALLBACK);
    }

    #[test]
    fn test_hex_round_trip() {
        assert_eq!(Rgb::new(255, 136, 0).to_hex(), "#ff8800");
        assert_eq!(Rgb::resolve(&text("#ff8800")).to_hex(), "#ff8800");
    }

    #[test]
    fn test_palette_prefers_list() {
        let list = [text("#111111"), text("#222222")];
        let single = text("#333333");
        let resolved = resolve_palette(&list, Some(&single));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0], Rgb::new(0x11, 0x11, 0x11));

        let fallback = resolve_palette(&[], None);
        assert_eq!(fallback, vec![Rgb::FALLBACK]);
    }

    #[test]
    fn test_untagged_deserialization() {
        let hex: ColorInput = serde_json::from_str("\"#abcdef\"").unwrap();
        assert_eq!(Rgb::resolve(&hex), Rgb::new(0xab, 0xcd, 0xef));

        let obj: ColorInput = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(Rgb::resolve(&obj), Rgb::new(1, 2, 3));

        let arr: ColorInput = serde_json::from_str("[4,5,6]").unwrap();
        assert_eq!(Rgb::resolve(&arr), Rgb::new(4, 5, 6));
    }
}
