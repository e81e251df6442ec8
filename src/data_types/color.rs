//! Color strings carried by timestamp markers.

use crate::error::DataWarning;

/// Color used whenever a marker color is missing or can not be interpreted.
pub const DEFAULT_COLOR: &str = "w";

const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("white", [255, 255, 255, 255]),
    ("black", [0, 0, 0, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 255, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("cyan", [0, 255, 255, 255]),
    ("magenta", [255, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
];

/// Parses the color notations understood by the plot renderer into RGBA.
pub fn parse_color(color: &str) -> Option<[u8; 4]> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex_str(hex);
    }
    let rgba = match color {
        "r" => [255, 0, 0, 255],
        "g" => [0, 255, 0, 255],
        "b" => [0, 0, 255, 255],
        "c" => [0, 255, 255, 255],
        "m" => [255, 0, 255, 255],
        "y" => [255, 255, 0, 255],
        "k" => [0, 0, 0, 255],
        "w" => [255, 255, 255, 255],
        other => {
            let lower = other.to_ascii_lowercase();
            return NAMED_COLORS
                .iter()
                .find(|(name, _)| *name == lower)
                .map(|(_, rgba)| *rgba);
        }
    };
    Some(rgba)
}

fn parse_hex_str(hex: &str) -> Option<[u8; 4]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut out = [0, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some([r, g, b, a])
        }
        _ => None,
    }
}

/// Returns the color unchanged if it can be interpreted, otherwise
/// [`DEFAULT_COLOR`] after emitting an `InvalidValue` warning.
pub fn validated_color(color: &str) -> String {
    if parse_color(color).is_some() {
        color.to_string()
    } else {
        DataWarning::InvalidValue(format!(
            "timestamp marker color '{color}' is replaced with '{DEFAULT_COLOR}' since it can not be used as a color"
        ))
        .emit();
        DEFAULT_COLOR.to_string()
    }
}
