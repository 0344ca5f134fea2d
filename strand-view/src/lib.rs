//! # strand-view
//!
//! Interactive viewport state for Strand: the pannable/zoomable visible
//! range bounded by the data extent, the box/lasso selection state
//! machine, and synchronization of both into the external vector
//! overlay (axes, labels, selection shapes).
//!
//! ## Crate modules
//!
//! - [`viewport`] — bounded pan/zoom, GPU viewport + point-size derivation
//! - [`selection`] — box/lasso point collection and mode dispatch
//! - [`overlay`] — the overlay-renderer interface and push-style sync

pub mod overlay;
pub mod selection;
pub mod viewport;

// Re-exports for convenience
pub use overlay::{OverlayRenderer, OverlaySync};
pub use selection::{Selection, SelectionEngine, Tool};
pub use viewport::{Axis, GpuViewport, InteractionConfig, ViewportController};
