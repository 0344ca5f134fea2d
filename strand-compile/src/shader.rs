//! WGSL shader source assembly.
//!
//! One shader per track: a fixed prologue (position attribute + viewport
//! uniform), per-channel declarations in first-seen order (a uniform
//! struct field for constant channels, a numbered `@location` attribute
//! for data-bound ones), and a fixed epilogue (viewport-to-clip transform
//! in the vertex stage, packed-color unpack feeding the fragment stage).
//!
//! The source is memoized: it is assembled once per track and repeated
//! [`TrackShader::source`] calls return the same cached text.

use std::cell::OnceCell;

use strand_core::ChannelId;

/// How a channel reaches the shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    /// Literal value, one float in the track uniform struct.
    Uniform,
    /// Data-bound, one float per vertex.
    Attribute,
}

/// A track's shader interface plus its lazily assembled WGSL text.
#[derive(Clone, Debug)]
pub struct TrackShader {
    /// Non-position channels in first-seen order.
    slots: Vec<(ChannelId, SlotKind)>,
    source: OnceCell<String>,
}

impl TrackShader {
    pub fn new(slots: Vec<(ChannelId, SlotKind)>) -> Self {
        Self {
            slots,
            source: OnceCell::new(),
        }
    }

    pub fn slots(&self) -> &[(ChannelId, SlotKind)] {
        &self.slots
    }

    /// Uniform channels in declaration order — also the field order of the
    /// track uniform struct the backend fills.
    pub fn uniform_order(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.slots
            .iter()
            .filter(|(_, k)| *k == SlotKind::Uniform)
            .map(|(c, _)| *c)
    }

    /// `@location` index of an attribute channel. Position is always
    /// location 0; the rest are numbered in first-seen order.
    pub fn attribute_location(&self, id: ChannelId) -> Option<u32> {
        self.slots
            .iter()
            .filter(|(_, k)| *k == SlotKind::Attribute)
            .position(|(c, _)| *c == id)
            .map(|i| i as u32 + 1)
    }

    /// The assembled WGSL, built on first call and cached thereafter.
    pub fn source(&self) -> &str {
        self.source.get_or_init(|| assemble(&self.slots))
    }
}

/// Source of a channel's value inside `vs_main`.
fn accessor(slots: &[(ChannelId, SlotKind)], id: ChannelId) -> String {
    match slots.iter().find(|(c, _)| *c == id) {
        Some((_, SlotKind::Uniform)) => format!("track.{}", id.name()),
        Some((_, SlotKind::Attribute)) => format!("in.{}", id.name()),
        None => "0.0".to_string(),
    }
}

fn assemble(slots: &[(ChannelId, SlotKind)]) -> String {
    let mut src = String::with_capacity(2048);

    // ── Prologue: position + viewport ───────────────────────────
    src.push_str(
        "// Generated track shader.\n\
         struct Viewport {\n\
         \x20   corners: vec4<f32>,\n\
         \x20   point_scale: f32,\n\
         \x20   _pad0: f32,\n\
         \x20   _pad1: f32,\n\
         \x20   _pad2: f32,\n\
         };\n\
         @group(0) @binding(0) var<uniform> viewport: Viewport;\n\n",
    );

    // ── Per-channel declarations, first-seen order ──────────────
    let uniforms: Vec<ChannelId> = slots
        .iter()
        .filter(|(_, k)| *k == SlotKind::Uniform)
        .map(|(c, _)| *c)
        .collect();
    if !uniforms.is_empty() {
        src.push_str("struct TrackUniforms {\n");
        for id in &uniforms {
            src.push_str(&format!("    {}: f32,\n", id.name()));
        }
        src.push_str("};\n@group(0) @binding(1) var<uniform> track: TrackUniforms;\n\n");
    }

    src.push_str("struct VertexIn {\n    @location(0) position: vec2<f32>,\n");
    let mut location = 1u32;
    for (id, kind) in slots {
        if *kind == SlotKind::Attribute {
            src.push_str(&format!("    @location({location}) {}: f32,\n", id.name()));
            location += 1;
        }
    }
    src.push_str("};\n\n");

    // ── Epilogue: clip transform + color unpack ─────────────────
    src.push_str(
        "struct VertexOut {\n\
         \x20   @builtin(position) clip: vec4<f32>,\n\
         \x20   @location(0) color: vec4<f32>,\n\
         \x20   @location(1) size: f32,\n\
         };\n\n\
         fn unpack_color(packed: f32) -> vec3<f32> {\n\
         \x20   let c = u32(packed);\n\
         \x20   let r = f32((c >> 16u) & 0xffu);\n\
         \x20   let g = f32((c >> 8u) & 0xffu);\n\
         \x20   let b = f32(c & 0xffu);\n\
         \x20   return vec3<f32>(r, g, b) / 255.0;\n\
         }\n\n\
         @vertex\n\
         fn vs_main(in: VertexIn) -> VertexOut {\n\
         \x20   let c = viewport.corners;\n\
         \x20   let x = (in.position.x - c.x) / (c.y - c.x) * 2.0 - 1.0;\n\
         \x20   let y = (in.position.y - c.z) / (c.w - c.z) * 2.0 - 1.0;\n\
         \x20   var out: VertexOut;\n\
         \x20   out.clip = vec4<f32>(x, y, 0.0, 1.0);\n",
    );
    src.push_str(&format!(
        "    out.color = vec4<f32>(unpack_color({}), {});\n",
        accessor(slots, ChannelId::Color),
        accessor(slots, ChannelId::Opacity),
    ));
    src.push_str(&format!(
        "    out.size = {} * viewport.point_scale;\n",
        accessor(slots, ChannelId::Size),
    ));
    src.push_str(
        "    return out;\n\
         }\n\n\
         @fragment\n\
         fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {\n\
         \x20   return in.color;\n\
         }\n",
    );

    src
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn all_uniform() -> Vec<(ChannelId, SlotKind)> {
        vec![
            (ChannelId::Color, SlotKind::Uniform),
            (ChannelId::Size, SlotKind::Uniform),
            (ChannelId::Opacity, SlotKind::Uniform),
        ]
    }

    #[test]
    fn test_source_is_memoized() {
        let shader = TrackShader::new(all_uniform());
        let first = shader.source().as_ptr();
        let second = shader.source().as_ptr();
        assert_eq!(first, second, "repeated calls must return the cached text");
    }

    #[test]
    fn test_uniform_channels_declared_in_struct() {
        let shader = TrackShader::new(all_uniform());
        let src = shader.source();
        assert!(src.contains("struct TrackUniforms"));
        assert!(src.contains("    color: f32,"));
        assert!(src.contains("unpack_color(track.color)"));
        assert!(!src.contains("@location(1) color"));
    }

    #[test]
    fn test_attribute_channels_get_locations_in_order() {
        let shader = TrackShader::new(vec![
            (ChannelId::Color, SlotKind::Attribute),
            (ChannelId::Size, SlotKind::Uniform),
            (ChannelId::Opacity, SlotKind::Attribute),
        ]);
        assert_eq!(shader.attribute_location(ChannelId::Color), Some(1));
        assert_eq!(shader.attribute_location(ChannelId::Opacity), Some(2));
        assert_eq!(shader.attribute_location(ChannelId::Size), None);

        let src = shader.source();
        assert!(src.contains("@location(1) color: f32,"));
        assert!(src.contains("@location(2) opacity: f32,"));
        assert!(src.contains("unpack_color(in.color)"));
        assert!(src.contains("track.size"));
    }

    #[test]
    fn test_prologue_and_epilogue_fixed() {
        let shader = TrackShader::new(Vec::new());
        let src = shader.source();
        assert!(src.contains("@location(0) position: vec2<f32>"));
        assert!(src.contains("var<uniform> viewport: Viewport"));
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn fs_main"));
        // No uniforms: no track struct at all.
        assert!(!src.contains("TrackUniforms"));
    }
}
