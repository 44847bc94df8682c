//! Theme colors from `assembly.xml`.
//!
//! Manifests write colors as `$AARRGGBB` (the `$` stands in for `#`, which
//! some packaging tools refuse in element text). Both prefixes are accepted;
//! values handed to callers always use `#`.

use std::fmt;
use std::str::FromStr;

/// Replace a leading `$` with `#`. Anything else passes through trimmed.
pub fn normalize_color(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('$') {
        Some(rest) => format!("#{rest}"),
        None => trimmed.to_string(),
    }
}

/// An ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { a: 0xFF, r, g, b }
    }

    /// `(a, r, g, b)` components.
    pub fn argb(&self) -> (u8, u8, u8, u8) {
        (self.a, self.r, self.g, self.b)
    }
}

/// Why a color string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#' or '$'")]
    MissingPrefix,
    #[error("expected 6 or 8 hex digits, got {0}")]
    BadLength(usize),
    #[error("'{0}' is not a hex digit")]
    BadDigit(char),
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize_color(s);
        let hex = normalized
            .strip_prefix('#')
            .ok_or(ColorParseError::MissingPrefix)?;

        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(bad));
        }

        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or_default();

        match hex.len() {
            6 => Ok(Color::rgb(byte(0), byte(2), byte(4))),
            8 => Ok(Color {
                a: byte(0),
                r: byte(2),
                g: byte(4),
                b: byte(6),
            }),
            n => Err(ColorParseError::BadLength(n)),
        }
    }
}

impl fmt::Display for Color {
    /// `#RRGGBB` for opaque colors, `#AARRGGBB` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xFF {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("$FF00FF"), "#FF00FF");
        assert_eq!(normalize_color("#FF00FF"), "#FF00FF");
        assert_eq!(normalize_color("  $ff3366cc "), "#ff3366cc");
    }

    #[test]
    fn test_parse_rgb_and_argb() {
        assert_eq!("$FF00FF".parse::<Color>().unwrap(), Color::rgb(0xFF, 0x00, 0xFF));
        let c: Color = "#80102030".parse().unwrap();
        assert_eq!(c.argb(), (0x80, 0x10, 0x20, 0x30));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("FF00FF".parse::<Color>(), Err(ColorParseError::MissingPrefix));
        assert_eq!("#FF00F".parse::<Color>(), Err(ColorParseError::BadLength(5)));
        assert_eq!("#GG00FF".parse::<Color>(), Err(ColorParseError::BadDigit('G')));
    }

    #[test]
    fn test_display() {
        assert_eq!(Color::rgb(1, 2, 255).to_string(), "#0102FF");
        let c: Color = "$7F000000".parse().unwrap();
        assert_eq!(c.to_string(), "#7F000000");
    }
}
