//! # strand-core
//!
//! Specification document model for Strand: tracks of data marks with
//! positional and visual channels, validated into a strongly-typed form
//! the compiler consumes.
//!
//! ## Crate modules
//!
//! - [`spec`] — the serde document tree and schema validation
//! - [`channel`] — the fixed channel set, defaults, and the
//!   constant-vs-data-bound tagged union
//! - [`color`] — CSS/`rgb()`/numeric color normalization to one packed form
//! - [`error`] — schema error taxonomy with track/channel context

pub mod channel;
pub mod color;
pub mod error;
pub mod spec;

// Re-exports for convenience
pub use channel::{ChannelDef, ChannelId, Domain, ScaleKind};
pub use error::SchemaError;
pub use spec::{
    AxisOrientation, AxisSpecs, LabelSpec, Margins, MarkKind, SpecDef, Specification, Track,
    TrackDef,
};
