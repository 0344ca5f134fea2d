//! The fixed visual-channel set and its validated form.
//!
//! A channel is either a constant `value` or data-bound through an
//! `attribute` + `domain` + scale type — exactly one of the two, never
//! both, never neither. Channels omitted from a track entirely fall back
//! to the documented defaults below (position channels have none: they
//! define geometry and must always be data-bound).

use serde::{Deserialize, Serialize};

use crate::color;

/// Enumerated channel set. `ALL` fixes the order channels are visited in
/// during compilation, which in turn fixes shader declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelId {
    X,
    Y,
    XEnd,
    YEnd,
    Color,
    Size,
    Opacity,
    Shape,
    Width,
    Height,
}

impl ChannelId {
    pub const ALL: [ChannelId; 10] = [
        ChannelId::X,
        ChannelId::Y,
        ChannelId::XEnd,
        ChannelId::YEnd,
        ChannelId::Color,
        ChannelId::Size,
        ChannelId::Opacity,
        ChannelId::Shape,
        ChannelId::Width,
        ChannelId::Height,
    ];

    /// Channel name as it appears in specification documents.
    pub fn name(self) -> &'static str {
        match self {
            ChannelId::X => "x",
            ChannelId::Y => "y",
            ChannelId::XEnd => "xe",
            ChannelId::YEnd => "ye",
            ChannelId::Color => "color",
            ChannelId::Size => "size",
            ChannelId::Opacity => "opacity",
            ChannelId::Shape => "shape",
            ChannelId::Width => "width",
            ChannelId::Height => "height",
        }
    }

    pub fn from_name(name: &str) -> Option<ChannelId> {
        ChannelId::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Channels that feed vertex geometry rather than fragment styling.
    pub fn is_position(self) -> bool {
        matches!(
            self,
            ChannelId::X | ChannelId::Y | ChannelId::XEnd | ChannelId::YEnd
        )
    }

    /// Documented default applied when a channel is omitted entirely.
    /// `None` means the channel is required (x, y) or simply absent when
    /// not given (xe, ye).
    pub fn default_value(self) -> Option<f64> {
        match self {
            ChannelId::X | ChannelId::Y | ChannelId::XEnd | ChannelId::YEnd => None,
            ChannelId::Color => Some(color::pack(70, 130, 180) as f64), // steelblue
            ChannelId::Size => Some(3.0),
            ChannelId::Opacity => Some(1.0),
            ChannelId::Shape => Some(0.0),
            ChannelId::Width => Some(1.0),
            ChannelId::Height => Some(1.0),
        }
    }
}

/// Scale type a data-bound channel maps through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleKind {
    Quantitative,
    Categorical,
    GenomicRange,
}

/// A channel domain: numeric endpoints for quantitative scales, string
/// labels for categorical (category list) and genomic (`"chr1:1"` style
/// locus pair) scales.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    Numeric([f64; 2]),
    Labels(Vec<String>),
}

/// Validated channel: the exactly-one-of invariant made structural.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelDef {
    /// Literal value, registered as a shader uniform.
    Constant(f64),
    /// Data-bound, registered as a per-vertex attribute buffer.
    Field {
        attribute: String,
        domain: Domain,
        scale: ScaleKind,
    },
}

impl ChannelDef {
    pub fn is_constant(&self) -> bool {
        matches!(self, ChannelDef::Constant(_))
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names_roundtrip() {
        for id in ChannelId::ALL {
            assert_eq!(ChannelId::from_name(id.name()), Some(id));
        }
        assert_eq!(ChannelId::from_name("banana"), None);
    }

    #[test]
    fn test_position_channels_have_no_default() {
        assert_eq!(ChannelId::X.default_value(), None);
        assert_eq!(ChannelId::Y.default_value(), None);
        assert!(ChannelId::Size.default_value().is_some());
        assert!(ChannelId::Opacity.default_value().is_some());
    }

    #[test]
    fn test_default_color_is_packed_steelblue() {
        assert_eq!(ChannelId::Color.default_value(), Some(0x4682b4 as f64));
    }

    #[test]
    fn test_domain_deserializes_untagged() {
        let numeric: Domain = serde_json::from_str("[0.0, 10.0]").unwrap();
        assert_eq!(numeric, Domain::Numeric([0.0, 10.0]));

        let genomic: Domain = serde_json::from_str(r#"["chr1:1", "chr2:500"]"#).unwrap();
        assert_eq!(
            genomic,
            Domain::Labels(vec!["chr1:1".into(), "chr2:500".into()])
        );
    }
}
