//! Specification → per-track shader + buffer compilation.
//!
//! Each track compiles independently into a [`CompiledTrack`]: memoized
//! WGSL source, a clip-space position buffer, and one
//! [`ChannelBinding`] per non-position channel (constant → uniform,
//! data-bound → per-vertex buffer). Compilation is atomic per track — a
//! failure leaves nothing half-built — and atomic overall: the caller
//! receives either N compiled tracks or an error and no change.
//!
//! All tracks bake positions through one pair of union-extent→clip scales
//! so heterogeneous tracks agree on what a clip coordinate means; the
//! same extent seeds the viewport controller.

use std::sync::Arc;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use strand_core::{ChannelDef, ChannelId, Domain, MarkKind, ScaleKind, Specification, SpecDef, TrackDef};
use strand_scale::{BandScale, Extent, Genome, LinearScale, ScaleError};

use crate::shader::{SlotKind, TrackShader};
use crate::table::{Column, DataSet, DataTable};
use crate::vertex;
use crate::CompileError;

/// Tunable compilation constants. Arc segment count trades visual
/// fidelity against buffer size.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    pub arc_segments: usize,
    /// Perpendicular control-point offset, as a fraction of chord length.
    pub arc_bulge: f64,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            arc_segments: 24,
            arc_bulge: 0.25,
        }
    }
}

/// Draw primitive selected from the mark kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    PointList,
    TriangleList,
    /// Arcs batch as independent segments so one draw call covers many
    /// records without connector artifacts.
    LineList,
}

/// A channel's compiled representation.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelBinding {
    /// Registered as a shader uniform.
    Constant(f32),
    /// Registered as a per-vertex attribute buffer.
    PerVertex(Vec<f32>),
}

/// One track's GPU-ready program: shader text, buffers, uniforms, draw
/// mode. Owned exclusively by the compiler/render-loop pair.
#[derive(Clone, Debug)]
pub struct CompiledTrack {
    shader: TrackShader,
    /// Interleaved x,y clip-space coordinates.
    pub positions: Vec<f32>,
    channels: Vec<(ChannelId, ChannelBinding)>,
    pub draw_mode: DrawMode,
    pub vertex_count: usize,
}

impl CompiledTrack {
    pub fn shader(&self) -> &TrackShader {
        &self.shader
    }

    /// Memoized WGSL source.
    pub fn shader_source(&self) -> &str {
        self.shader.source()
    }

    pub fn binding(&self, id: ChannelId) -> Option<&ChannelBinding> {
        self.channels
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, b)| b)
    }

    /// Uniform values in shader struct field order.
    pub fn uniforms(&self) -> Vec<(ChannelId, f32)> {
        self.shader
            .uniform_order()
            .filter_map(|id| match self.binding(id) {
                Some(ChannelBinding::Constant(v)) => Some((id, *v)),
                _ => None,
            })
            .collect()
    }

    /// Per-vertex attribute buffers in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (ChannelId, &[f32])> {
        self.channels.iter().filter_map(|(id, b)| match b {
            ChannelBinding::PerVertex(buf) => Some((*id, buf.as_slice())),
            ChannelBinding::Constant(_) => None,
        })
    }
}

/// Output of one whole-specification compile.
#[derive(Clone, Debug)]
pub struct Compiled {
    pub tracks: Vec<CompiledTrack>,
    /// Union data extent across tracks, in data units (genome-wide
    /// indices for genomic axes, band ordinals for categorical ones).
    pub extent: Extent,
}

/// The specification compiler. The genome registry is injected at
/// construction so tests can supply synthetic genomes.
pub struct Compiler {
    genome: Arc<Genome>,
    config: CompileConfig,
}

impl Compiler {
    pub fn new(genome: Arc<Genome>, config: CompileConfig) -> Self {
        Self { genome, config }
    }

    /// hg38 genome, default tuning.
    pub fn with_defaults() -> Self {
        Self::new(Genome::hg38(), CompileConfig::default())
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Validate and compile a raw specification document.
    pub fn compile(&self, spec: &Specification, data: &DataSet) -> Result<Compiled, CompileError> {
        let def = spec.validate()?;
        self.compile_def(&def, data)
    }

    /// Compile an already-validated specification.
    pub fn compile_def(&self, def: &SpecDef, data: &DataSet) -> Result<Compiled, CompileError> {
        // Pass 1: union extent across track domains, so every track bakes
        // through the same domain→clip mapping.
        let mut extent = Extent::inverted();
        for (index, track) in def.tracks.iter().enumerate() {
            let x = self.axis_domain(index, track, ChannelId::X, ChannelId::XEnd)?;
            let y = self.axis_domain(index, track, ChannelId::Y, ChannelId::YEnd)?;
            extent = extent.union(&Extent::new(x, y));
        }
        if !extent.is_valid() || extent.width() == 0.0 || extent.height() == 0.0 {
            return Err(CompileError::DegenerateExtent);
        }

        let xsc = LinearScale::to_clip(extent.x).map_err(|source| CompileError::Scale {
            track: 0,
            source,
        })?;
        let ysc = LinearScale::to_clip(extent.y).map_err(|source| CompileError::Scale {
            track: 0,
            source,
        })?;

        // Pass 2: bake each track. Tracks build into a fresh vec; only a
        // fully successful compile is handed back.
        let mut tracks = Vec::with_capacity(def.tracks.len());
        for (index, track) in def.tracks.iter().enumerate() {
            tracks.push(self.compile_track(index, track, data, &xsc, &ysc)?);
        }

        debug!(
            "compiled {} track(s), extent x=[{}, {}] y=[{}, {}]",
            tracks.len(),
            extent.x[0],
            extent.x[1],
            extent.y[0],
            extent.y[1]
        );
        Ok(Compiled { tracks, extent })
    }

    /// A track's data-unit domain on one axis, unioned over the channel
    /// and its end channel when present.
    fn axis_domain(
        &self,
        index: usize,
        track: &TrackDef,
        main: ChannelId,
        end: ChannelId,
    ) -> Result<[f64; 2], CompileError> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for id in [main, end] {
            let Some(def) = track.channel(id) else { continue };
            let ChannelDef::Field { domain, scale, .. } = def else {
                continue;
            };
            let [a, b] = self.domain_bounds(index, domain, *scale)?;
            lo = lo.min(a);
            hi = hi.max(b);
        }
        Ok([lo, hi])
    }

    /// Domain endpoints in data units: numeric as-is, genomic loci as
    /// genome-wide indices, categories as the band span `[0, n]`.
    fn domain_bounds(
        &self,
        track: usize,
        domain: &Domain,
        scale: ScaleKind,
    ) -> Result<[f64; 2], CompileError> {
        match (scale, domain) {
            (ScaleKind::Quantitative, Domain::Numeric([a, b])) => Ok([a.min(*b), a.max(*b)]),
            (ScaleKind::GenomicRange, Domain::Labels(loci)) if loci.len() == 2 => {
                let a = self.abs_index(track, &loci[0])? as f64;
                let b = self.abs_index(track, &loci[1])? as f64;
                Ok([a.min(b), a.max(b)])
            }
            (ScaleKind::Categorical, Domain::Labels(categories)) => {
                Ok([0.0, categories.len() as f64])
            }
            // Validation already rejected mismatched shapes; a genomic
            // domain with the wrong arity lands here.
            _ => Err(CompileError::Scale {
                track,
                source: ScaleError::BadLocus(format!("{domain:?}")),
            }),
        }
    }

    fn abs_index(&self, track: usize, locus: &str) -> Result<u64, CompileError> {
        self.genome
            .abs_index_of(locus)
            .map_err(|source| CompileError::Scale { track, source })
    }

    fn compile_track(
        &self,
        index: usize,
        track: &TrackDef,
        data: &DataSet,
        xsc: &LinearScale,
        ysc: &LinearScale,
    ) -> Result<CompiledTrack, CompileError> {
        let table = data.get(&track.data).ok_or_else(|| CompileError::UnknownTable {
            track: index,
            table: track.data.clone(),
        })?;
        let rows = table.len();

        let x = FieldReader::new(self, index, track, table, ChannelId::X)?
            .ok_or_else(|| CompileError::Scale {
                track: index,
                source: ScaleError::InvalidDomain { lo: 0.0, hi: 0.0 },
            })?;
        let y = FieldReader::new(self, index, track, table, ChannelId::Y)?
            .ok_or_else(|| CompileError::Scale {
                track: index,
                source: ScaleError::InvalidDomain { lo: 0.0, hi: 0.0 },
            })?;
        let xe = FieldReader::new(self, index, track, table, ChannelId::XEnd)?;
        let ye = FieldReader::new(self, index, track, table, ChannelId::YEnd)?;

        // Constant width/height, in data units, for rects without an end
        // channel.
        let width = constant_of(track, ChannelId::Width).unwrap_or(1.0);
        let height = constant_of(track, ChannelId::Height).unwrap_or(1.0);

        let (draw_mode, verts_per_row) = match track.mark {
            MarkKind::Point => (DrawMode::PointList, 1),
            MarkKind::Rect => (DrawMode::TriangleList, 6),
            MarkKind::Arc => (DrawMode::LineList, 2 * self.config.arc_segments),
        };

        let mut positions = Vec::with_capacity(rows * verts_per_row * 2);
        for row in 0..rows {
            let xv = x.value(row)?;
            let yv = y.value(row)?;
            match track.mark {
                MarkKind::Point => {
                    vertex::point(xsc.apply(xv), ysc.apply(yv), &mut positions);
                }
                MarkKind::Rect => {
                    let (x0, x1) = match &xe {
                        Some(xe) => (xv, xe.value(row)?),
                        None => (xv - width / 2.0, xv + width / 2.0),
                    };
                    let (y0, y1) = match &ye {
                        Some(ye) => (yv, ye.value(row)?),
                        None => (yv - height / 2.0, yv + height / 2.0),
                    };
                    vertex::rect(
                        xsc.apply(x0),
                        xsc.apply(x1),
                        ysc.apply(y0),
                        ysc.apply(y1),
                        &mut positions,
                    );
                }
                MarkKind::Arc => {
                    let xev = match &xe {
                        Some(xe) => xe.value(row)?,
                        None => xv,
                    };
                    let yev = match &ye {
                        Some(ye) => ye.value(row)?,
                        None => yv,
                    };
                    vertex::arc(
                        xsc.apply(xv),
                        ysc.apply(yv),
                        xsc.apply(xev),
                        ysc.apply(yev),
                        self.config.arc_segments,
                        self.config.arc_bulge,
                        &mut positions,
                    );
                }
            }
        }
        debug_assert!(positions.len() % 2 == 0);
        let vertex_count = positions.len() / 2;

        // Non-position channels: constants become uniforms, fields become
        // per-vertex buffers with one value per emitted vertex.
        let mut slots = Vec::new();
        let mut channels = Vec::new();
        for (id, def) in track.channels() {
            if id.is_position() {
                continue;
            }
            match def {
                ChannelDef::Constant(v) => {
                    slots.push((*id, SlotKind::Uniform));
                    channels.push((*id, ChannelBinding::Constant(*v as f32)));
                }
                ChannelDef::Field { .. } => {
                    let reader = FieldReader::new(self, index, track, table, *id)?
                        .expect("field channel present by construction");
                    let mut buf = Vec::with_capacity(rows * verts_per_row);
                    for row in 0..rows {
                        vertex::replicate(reader.styled(row)? as f32, verts_per_row, &mut buf);
                    }
                    slots.push((*id, SlotKind::Attribute));
                    channels.push((*id, ChannelBinding::PerVertex(buf)));
                }
            }
        }

        // Attribute/position length invariant. Violating it would
        // desynchronize attributes from positions at draw time.
        for (id, binding) in &channels {
            if let ChannelBinding::PerVertex(buf) = binding {
                if buf.len() != vertex_count {
                    error!(
                        "track {index} channel `{}`: buffer holds {} values for {} vertices",
                        id.name(),
                        buf.len(),
                        vertex_count
                    );
                    return Err(CompileError::BufferDesync {
                        track: index,
                        channel: id.name(),
                        got: buf.len(),
                        want: vertex_count,
                    });
                }
            }
        }

        Ok(CompiledTrack {
            shader: TrackShader::new(slots),
            positions,
            channels,
            draw_mode,
            vertex_count,
        })
    }
}

fn constant_of(track: &TrackDef, id: ChannelId) -> Option<f64> {
    match track.channel(id) {
        Some(ChannelDef::Constant(v)) => Some(*v),
        _ => None,
    }
}

/// Reads one data-bound channel's per-row values in data units, with the
/// column/scale plumbing resolved once up front.
struct FieldReader<'a> {
    track: usize,
    channel: ChannelId,
    column: &'a Column,
    column_name: String,
    kind: ScaleKind,
    band: Option<BandScale>,
    /// domain→[0,1] normalizer for styled (non-position) reads.
    norm: Option<LinearScale>,
    genome: &'a Genome,
}

impl<'a> FieldReader<'a> {
    /// `Ok(None)` when the channel is absent or constant.
    fn new(
        compiler: &'a Compiler,
        track_index: usize,
        track: &TrackDef,
        table: &'a DataTable,
        id: ChannelId,
    ) -> Result<Option<FieldReader<'a>>, CompileError> {
        let Some(ChannelDef::Field {
            attribute,
            domain,
            scale,
        }) = track.channel(id)
        else {
            return Ok(None);
        };

        let column = table.column(attribute).ok_or_else(|| CompileError::UnknownColumn {
            track: track_index,
            table: track.data.clone(),
            column: attribute.clone(),
        })?;

        let band = match (scale, domain) {
            (ScaleKind::Categorical, Domain::Labels(categories)) => Some(
                BandScale::new(categories, [0.0, 1.0]).map_err(|source| CompileError::Scale {
                    track: track_index,
                    source,
                })?,
            ),
            _ => None,
        };

        let norm = match (scale, domain) {
            (ScaleKind::Quantitative, Domain::Numeric(d)) => Some(
                LinearScale::new(*d, [0.0, 1.0]).map_err(|source| CompileError::Scale {
                    track: track_index,
                    source,
                })?,
            ),
            _ => None,
        };

        Ok(Some(FieldReader {
            track: track_index,
            channel: id,
            column,
            column_name: attribute.clone(),
            kind: *scale,
            band,
            norm,
            genome: compiler.genome.as_ref(),
        }))
    }

    /// Row value in data units (genome-wide index for genomic, band
    /// ordinal for categorical, raw number for quantitative).
    fn value(&self, row: usize) -> Result<f64, CompileError> {
        match (self.column, self.kind) {
            (Column::Numeric(v), _) => Ok(v[row]),
            (Column::Text(v), ScaleKind::GenomicRange) => self
                .genome
                .abs_index_of(&v[row])
                .map(|i| i as f64)
                .map_err(|source| CompileError::Scale {
                    track: self.track,
                    source,
                }),
            (Column::Text(v), ScaleKind::Categorical) => self
                .band
                .as_ref()
                .expect("categorical reader has a band scale")
                .ordinal(&v[row])
                .map_err(|source| CompileError::Scale {
                    track: self.track,
                    source,
                }),
            (Column::Text(_), ScaleKind::Quantitative) => Err(CompileError::ColumnType {
                track: self.track,
                channel: self.channel.name(),
                column: self.column_name.clone(),
            }),
        }
    }

    /// Row value for a styling channel: quantitative values normalize to
    /// [0, 1] over their domain; color passes through raw (packed).
    fn styled(&self, row: usize) -> Result<f64, CompileError> {
        let v = self.value(row)?;
        if self.channel == ChannelId::Color {
            return Ok(v);
        }
        match &self.norm {
            Some(norm) => Ok(norm.apply(v)),
            None => Ok(v),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
