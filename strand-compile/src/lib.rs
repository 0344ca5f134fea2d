//! # strand-compile
//!
//! Compiles a validated Strand specification into GPU-ready per-track
//! programs: WGSL shader source, clip-space position buffers, and
//! per-channel uniform/attribute bindings.
//!
//! ## Architecture
//!
//! ```text
//!  Specification (strand-core)
//!       │  validate
//!       ▼
//!  SpecDef + DataSet (columnar tables)
//!       │  Compiler::compile
//!       ▼
//!  CompiledTrack per track      ◀─── shader text + buffers + uniforms
//!       │
//!       ▼
//!  RenderLoop (strand-render)   ◀─── uploads once, draws on dirty
//! ```
//!
//! ## Crate modules
//!
//! - [`table`] — in-memory columnar data tables
//! - [`shader`] — memoized WGSL source assembly
//! - [`vertex`] — per-mark vertex geometry generation
//! - [`compiler`] — track compilation, channel classification, extent

pub mod compiler;
pub mod shader;
pub mod table;
pub mod vertex;

use thiserror::Error;

use strand_core::SchemaError;
use strand_scale::ScaleError;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("track {track}: {source}")]
    Scale { track: usize, source: ScaleError },

    #[error("union data extent is degenerate; tracks must span a nonzero range on both axes")]
    DegenerateExtent,

    #[error("track {track}: data table `{table}` not found")]
    UnknownTable { track: usize, table: String },

    #[error("track {track}: column `{column}` not found in table `{table}`")]
    UnknownColumn {
        track: usize,
        table: String,
        column: String,
    },

    #[error("track {track}: channel `{channel}`: column `{column}` has the wrong type for its scale")]
    ColumnType {
        track: usize,
        channel: &'static str,
        column: String,
    },

    #[error("track {track}: channel `{channel}`: buffer holds {got} values but the track has {want} vertices")]
    BufferDesync {
        track: usize,
        channel: &'static str,
        got: usize,
        want: usize,
    },
}

// Re-exports for convenience
pub use compiler::{
    ChannelBinding, Compiled, CompiledTrack, CompileConfig, Compiler, DrawMode,
};
pub use shader::{SlotKind, TrackShader};
pub use table::{Column, DataSet, DataTable};
