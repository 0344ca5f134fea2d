//! Color normalization.
//!
//! Channel color values arrive as CSS names, `rgb(r, g, b)` strings, or
//! raw packed numbers. All three are normalized to one packed-integer
//! representation `(r << 16) | (g << 8) | b` before registration, so the
//! shader epilogue only ever has to unpack a single format.

/// The CSS color names the grammar accepts. Deliberately the common
/// palette, not the full X11 list.
const CSS_NAMES: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("brown", 0xa52a2a),
    ("pink", 0xffc0cb),
    ("lightgray", 0xd3d3d3),
    ("lightgrey", 0xd3d3d3),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("steelblue", 0x4682b4),
    ("tomato", 0xff6347),
    ("gold", 0xffd700),
    ("teal", 0x008080),
    ("navy", 0x000080),
    ("salmon", 0xfa8072),
    ("olive", 0x808000),
];

/// Pack 8-bit RGB components into the canonical integer form.
#[inline]
pub fn pack(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Unpack the canonical integer form back into RGB components.
#[inline]
pub fn unpack(packed: u32) -> (u8, u8, u8) {
    (
        ((packed >> 16) & 0xff) as u8,
        ((packed >> 8) & 0xff) as u8,
        (packed & 0xff) as u8,
    )
}

/// Normalize a color string (CSS name, `#rrggbb`, or `rgb(r, g, b)`) to
/// the packed form. Returns `None` for anything unrecognized.
pub fn parse(value: &str) -> Option<u32> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 {
            return u32::from_str_radix(hex, 16).ok();
        }
        return None;
    }

    if let Some(body) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let mut parts = body.split(',');
        let r: u8 = parts.next()?.trim().parse().ok()?;
        let g: u8 = parts.next()?.trim().parse().ok()?;
        let b: u8 = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        return Some(pack(r, g, b));
    }

    let lower = value.to_ascii_lowercase();
    CSS_NAMES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|&(_, packed)| packed)
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_roundtrip() {
        let packed = pack(70, 130, 180);
        assert_eq!(packed, 0x4682b4);
        assert_eq!(unpack(packed), (70, 130, 180));
    }

    #[test]
    fn test_parse_css_name() {
        assert_eq!(parse("steelblue"), Some(0x4682b4));
        assert_eq!(parse("RED"), Some(0xff0000));
        assert_eq!(parse("not-a-color"), None);
    }

    #[test]
    fn test_parse_rgb_function() {
        assert_eq!(parse("rgb(255, 0, 128)"), Some(pack(255, 0, 128)));
        assert_eq!(parse("rgb( 1 , 2 , 3 )"), Some(pack(1, 2, 3)));
        assert_eq!(parse("rgb(1, 2)"), None);
        assert_eq!(parse("rgb(1, 2, 3, 4)"), None);
        assert_eq!(parse("rgb(300, 0, 0)"), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse("#4682b4"), Some(0x4682b4));
        assert_eq!(parse("#fff"), None);
    }
}
