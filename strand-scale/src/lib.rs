//! # strand-scale
//!
//! Coordinate scales for Strand: domain↔clip-space mapping for plain
//! numeric, categorical, and multi-chromosome genomic coordinate systems,
//! plus inverses and tick generation. All three share one affine core so
//! heterogeneous tracks land in the same [-1, 1] clip space.
//!
//! ## Crate modules
//!
//! - [`linear`] — affine scale, inverse, power-of-ten ticks, band scale
//! - [`genome`] — chromosome offset tables, `chr:pos` parsing, genomic scale
//! - [`extent`] — two-axis min/max ranges shared with the viewport

pub mod extent;
pub mod genome;
pub mod linear;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ScaleError {
    #[error("degenerate domain [{lo}, {hi}]: a scale needs two distinct finite endpoints")]
    InvalidDomain { lo: f64, hi: f64 },

    #[error("`{0}` is not of the form `chr<C>:<P>`")]
    BadLocus(String),

    #[error("unknown chromosome `{0}`")]
    UnknownChromosome(String),

    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

/// One axis tick: a position in the scale's domain (data units) plus its
/// rendered label.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

// Re-exports for convenience
pub use extent::Extent;
pub use genome::{Genome, GenomeScale, Locus};
pub use linear::{BandScale, LinearScale};
