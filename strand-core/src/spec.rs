//! The declarative specification document and its validation.
//!
//! A [`Specification`] is the raw serde form of the document: tracks of
//! marks, channel objects keyed by name, labels, axis orientations, and
//! margins. [`Specification::validate`] checks the whole document against
//! the channel grammar and produces a [`SpecDef`] — the strongly-typed
//! form the compiler consumes. Validation is atomic: any [`SchemaError`]
//! means nothing downstream was built.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::channel::{ChannelDef, ChannelId, Domain, ScaleKind};
use crate::color;
use crate::error::SchemaError;

/// Mark kind for one track. `interval` is the genomic-span spelling of a
/// rect whose width comes from an x-end channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Point,
    #[serde(alias = "interval")]
    Rect,
    Arc,
}

/// Where an axis is drawn by the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrientation {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// Axis orientation per dimension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSpecs {
    #[serde(default)]
    pub x: AxisOrientation,
    #[serde(default = "AxisSpecs::default_y")]
    pub y: AxisOrientation,
}

impl AxisSpecs {
    fn default_y() -> AxisOrientation {
        AxisOrientation::Left
    }
}

impl Default for AxisSpecs {
    fn default() -> Self {
        Self {
            x: AxisOrientation::Bottom,
            y: AxisOrientation::Left,
        }
    }
}

/// A positioned text label, handed verbatim to the overlay renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Plot margins in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 10.0,
            bottom: 40.0,
            left: 50.0,
        }
    }
}

/// Raw channel object as it appears in the document. Carries both the
/// `value` and `attribute` slots; validation enforces exactly-one-of.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ChannelSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(rename = "colorScheme", default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
}

/// One data-to-marks mapping unit. Channel objects live in a flattened
/// map so an unrecognized channel name is *our* diagnostic (with track
/// index and name) rather than an opaque serde failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub mark: MarkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(flatten)]
    pub channels: BTreeMap<String, ChannelSpec>,
}

/// Top-level specification document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub labels: Vec<LabelSpec>,
    #[serde(default)]
    pub axes: AxisSpecs,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub default_data: Option<String>,
}

impl Specification {
    /// Parse a JSON document without validating the channel grammar.
    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate every track against the channel grammar.
    ///
    /// Checks, per track: recognized channel names; exactly one of
    /// `value`/`attribute` per given channel; x and y present and
    /// data-bound; domains present on data-bound channels and shaped for
    /// their scale type; a data source (track-level or document
    /// `defaultData`); color values normalizable. Succeeds with the full
    /// [`SpecDef`] or fails with the first offense — never partially.
    pub fn validate(&self) -> Result<SpecDef, SchemaError> {
        let mut tracks = Vec::with_capacity(self.tracks.len());
        for (index, track) in self.tracks.iter().enumerate() {
            tracks.push(validate_track(index, track, self.default_data.as_deref())?);
        }
        debug!("validated {} track(s)", tracks.len());
        Ok(SpecDef {
            tracks,
            labels: self.labels.clone(),
            axes: self.axes,
            margins: self.margins,
        })
    }
}

/// Validated track: channels resolved to the [`ChannelDef`] tagged union,
/// in [`ChannelId::ALL`] order.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackDef {
    pub mark: MarkKind,
    pub data: String,
    channels: Vec<(ChannelId, ChannelDef)>,
}

impl TrackDef {
    /// Channels in compilation (shader declaration) order.
    pub fn channels(&self) -> &[(ChannelId, ChannelDef)] {
        &self.channels
    }

    pub fn channel(&self, id: ChannelId) -> Option<&ChannelDef> {
        self.channels
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, def)| def)
    }
}

/// Fully validated specification.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecDef {
    pub tracks: Vec<TrackDef>,
    pub labels: Vec<LabelSpec>,
    pub axes: AxisSpecs,
    pub margins: Margins,
}

fn validate_track(
    index: usize,
    track: &Track,
    default_data: Option<&str>,
) -> Result<TrackDef, SchemaError> {
    // Unknown channel names first, so the diagnostic names the key the
    // author actually wrote.
    for name in track.channels.keys() {
        if ChannelId::from_name(name).is_none() {
            return Err(SchemaError::UnknownChannel {
                track: index,
                channel: name.clone(),
            });
        }
    }

    let data = match track.data.as_deref().or(default_data) {
        Some(d) => d.to_string(),
        None => return Err(SchemaError::MissingData { track: index }),
    };

    let mut channels = Vec::new();
    for id in ChannelId::ALL {
        match track.channels.get(id.name()) {
            Some(spec) => {
                channels.push((id, validate_channel(index, id, spec)?));
            }
            None => {
                if id == ChannelId::X || id == ChannelId::Y {
                    return Err(SchemaError::MissingChannel {
                        track: index,
                        channel: id.name(),
                    });
                }
                // xe/ye are simply absent when not given; styling
                // channels pick up their documented default.
                if let Some(default) = id.default_value() {
                    channels.push((id, ChannelDef::Constant(default)));
                }
            }
        }
    }

    Ok(TrackDef {
        mark: track.mark,
        data,
        channels,
    })
}

fn validate_channel(
    track: usize,
    id: ChannelId,
    spec: &ChannelSpec,
) -> Result<ChannelDef, SchemaError> {
    match (&spec.value, &spec.attribute) {
        (Some(_), Some(_)) | (None, None) => Err(SchemaError::ValueXorAttribute {
            track,
            channel: id.name(),
        }),
        (Some(value), None) => {
            if id.is_position() {
                return Err(SchemaError::ConstantPosition {
                    track,
                    channel: id.name(),
                });
            }
            Ok(ChannelDef::Constant(constant_value(track, id, value)?))
        }
        (None, Some(attribute)) => {
            let domain = spec.domain.clone().ok_or(SchemaError::MissingDomain {
                track,
                channel: id.name(),
            })?;
            let scale = spec.scale.unwrap_or(ScaleKind::Quantitative);
            let shape_ok = match scale {
                ScaleKind::Quantitative => matches!(domain, Domain::Numeric(_)),
                ScaleKind::Categorical | ScaleKind::GenomicRange => {
                    matches!(domain, Domain::Labels(_))
                }
            };
            if !shape_ok {
                return Err(SchemaError::DomainMismatch {
                    track,
                    channel: id.name(),
                });
            }
            Ok(ChannelDef::Field {
                attribute: attribute.clone(),
                domain,
                scale,
            })
        }
    }
}

/// Normalize a literal channel value to a single float. Color channels
/// accept CSS names, `rgb(...)`, `#rrggbb`, or a pre-packed number.
fn constant_value(
    track: usize,
    id: ChannelId,
    value: &serde_json::Value,
) -> Result<f64, SchemaError> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().ok_or(SchemaError::BadValue {
            track,
            channel: id.name(),
        }),
        serde_json::Value::String(s) if id == ChannelId::Color => {
            match color::parse(s) {
                Some(packed) => Ok(packed as f64),
                None => Err(SchemaError::BadColor {
                    track,
                    channel: id.name(),
                    value: s.clone(),
                }),
            }
        }
        _ => Err(SchemaError::BadValue {
            track,
            channel: id.name(),
        }),
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn point_spec(extra: &str) -> String {
        format!(
            r#"{{
                "tracks": [{{
                    "mark": "point",
                    "data": "cells",
                    "x": {{ "attribute": "u", "domain": [0.0, 10.0], "type": "quantitative" }},
                    "y": {{ "attribute": "v", "domain": [0.0, 10.0], "type": "quantitative" }}
                    {extra}
                }}]
            }}"#
        )
    }

    #[test]
    fn test_minimal_point_track_validates() {
        let spec = Specification::from_json(&point_spec("")).unwrap();
        let def = spec.validate().unwrap();
        assert_eq!(def.tracks.len(), 1);

        let track = &def.tracks[0];
        assert_eq!(track.mark, MarkKind::Point);
        assert_eq!(track.data, "cells");
        assert!(matches!(
            track.channel(ChannelId::X),
            Some(ChannelDef::Field { .. })
        ));
        // Omitted styling channels become constants at their defaults.
        assert_eq!(
            track.channel(ChannelId::Opacity),
            Some(&ChannelDef::Constant(1.0))
        );
        // xe was not given and has no default: absent.
        assert_eq!(track.channel(ChannelId::XEnd), None);
    }

    #[test]
    fn test_unknown_channel_is_reported_with_track_and_name() {
        let spec =
            Specification::from_json(&point_spec(r#", "sparkle": { "value": 1 }"#)).unwrap();
        match spec.validate() {
            Err(SchemaError::UnknownChannel { track, channel }) => {
                assert_eq!(track, 0);
                assert_eq!(channel, "sparkle");
            }
            other => panic!("expected UnknownChannel, got {other:?}"),
        }
    }

    #[test]
    fn test_value_and_attribute_together_rejected() {
        let spec = Specification::from_json(&point_spec(
            r#", "size": { "value": 3, "attribute": "s", "domain": [0.0, 1.0] }"#,
        ))
        .unwrap();
        assert!(matches!(
            spec.validate(),
            Err(SchemaError::ValueXorAttribute { track: 0, channel: "size" })
        ));
    }

    #[test]
    fn test_constant_position_rejected() {
        let json = r#"{
            "tracks": [{
                "mark": "point",
                "data": "cells",
                "x": { "value": 5 },
                "y": { "attribute": "v", "domain": [0.0, 1.0] }
            }]
        }"#;
        let spec = Specification::from_json(json).unwrap();
        assert!(matches!(
            spec.validate(),
            Err(SchemaError::ConstantPosition { track: 0, channel: "x" })
        ));
    }

    #[test]
    fn test_missing_x_rejected() {
        let json = r#"{
            "tracks": [{
                "mark": "point",
                "data": "cells",
                "y": { "attribute": "v", "domain": [0.0, 1.0] }
            }]
        }"#;
        let spec = Specification::from_json(json).unwrap();
        assert!(matches!(
            spec.validate(),
            Err(SchemaError::MissingChannel { track: 0, channel: "x" })
        ));
    }

    #[test]
    fn test_default_data_fallback() {
        let json = r#"{
            "defaultData": "shared",
            "tracks": [{
                "mark": "point",
                "x": { "attribute": "u", "domain": [0.0, 1.0] },
                "y": { "attribute": "v", "domain": [0.0, 1.0] }
            }]
        }"#;
        let def = Specification::from_json(json).unwrap().validate().unwrap();
        assert_eq!(def.tracks[0].data, "shared");
    }

    #[test]
    fn test_missing_data_rejected() {
        let json = r#"{
            "tracks": [{
                "mark": "point",
                "x": { "attribute": "u", "domain": [0.0, 1.0] },
                "y": { "attribute": "v", "domain": [0.0, 1.0] }
            }]
        }"#;
        let spec = Specification::from_json(json).unwrap();
        assert!(matches!(
            spec.validate(),
            Err(SchemaError::MissingData { track: 0 })
        ));
    }

    #[test]
    fn test_color_value_normalized_to_packed() {
        let spec = Specification::from_json(&point_spec(
            r#", "color": { "value": "rgb(255, 0, 0)" }"#,
        ))
        .unwrap();
        let def = spec.validate().unwrap();
        assert_eq!(
            def.tracks[0].channel(ChannelId::Color),
            Some(&ChannelDef::Constant(0xff0000 as f64))
        );
    }

    #[test]
    fn test_bad_color_reported() {
        let spec = Specification::from_json(&point_spec(
            r#", "color": { "value": "chartreuse-ish" }"#,
        ))
        .unwrap();
        assert!(matches!(
            spec.validate(),
            Err(SchemaError::BadColor { track: 0, channel: "color", .. })
        ));
    }

    #[test]
    fn test_interval_is_rect_alias() {
        let json = r#"{
            "tracks": [{
                "mark": "interval",
                "data": "peaks",
                "x": { "attribute": "start", "domain": ["chr1:1", "chr1:1000"], "type": "genomicRange" },
                "xe": { "attribute": "end", "domain": ["chr1:1", "chr1:1000"], "type": "genomicRange" },
                "y": { "attribute": "row", "domain": [0.0, 4.0] }
            }]
        }"#;
        let def = Specification::from_json(json).unwrap().validate().unwrap();
        assert_eq!(def.tracks[0].mark, MarkKind::Rect);
        assert!(def.tracks[0].channel(ChannelId::XEnd).is_some());
    }

    #[test]
    fn test_genomic_domain_must_be_labels() {
        let spec = Specification::from_json(&point_spec("")).unwrap();
        // Rewrite x to claim genomicRange over a numeric domain.
        let mut raw = spec.clone();
        let x = raw.tracks[0].channels.get_mut("x").unwrap();
        x.scale = Some(ScaleKind::GenomicRange);
        assert!(matches!(
            raw.validate(),
            Err(SchemaError::DomainMismatch { track: 0, channel: "x" })
        ));
    }
}
