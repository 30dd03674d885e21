//! Opaque color helpers shared by the tools and the configuration layer.

use image::Rgba;

use crate::error::{SketchError, SketchResult};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Build a fully opaque color from an RGB triple.
pub fn opaque(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Parse a color specification into an opaque RGBA value.
///
/// Accepted forms: `#rgb`, `#rrggbb` and `rgb(r, g, b)`. Anything else is an
/// [`SketchError::InvalidColorSpecification`].
pub fn parse_color(spec: &str) -> SketchResult<Rgba<u8>> {
    let s = spec.trim();
    let invalid = || SketchError::InvalidColorSpecification(spec.to_string());

    if let Some(hex) = s.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        return match hex.len() {
            3 => {
                let mut ch = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    ch[i] = v * 17;
                }
                Ok(opaque(ch[0], ch[1], ch[2]))
            }
            6 => {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
                Ok(opaque(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => Err(invalid()),
        };
    }

    let lower = s.to_ascii_lowercase();
    if let Some(body) = lower.strip_prefix("rgb(").and_then(|b| b.strip_suffix(')')) {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let mut ch = [0u8; 3];
        for (i, p) in parts.iter().enumerate() {
            ch[i] = p.parse::<u8>().map_err(|_| invalid())?;
        }
        return Ok(opaque(ch[0], ch[1], ch[2]));
    }

    Err(invalid())
}

/// Format a color as `#rrggbb` (alpha is dropped).
pub fn to_hex(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}
