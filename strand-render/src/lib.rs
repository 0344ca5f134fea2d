//! # strand-render
//!
//! Frame driving and GPU execution for Strand. The render loop owns the
//! compiled document, the viewport controller, and a dirty flag; the
//! backend trait keeps the loop testable without a GPU.
//!
//! ```text
//!   ┌─────────────┐   compile    ┌────────────┐   draws    ┌─────────────┐
//!   │ RenderLoop  │─────────────►│ Compiler   │            │RenderBackend│
//!   │ dirty flag  │              └────────────┘            │ (wgpu/test) │
//!   │ generation  │───────────── uniforms + draw calls ───►└─────────────┘
//!   └─────────────┘
//! ```
//!
//! ## Crate modules
//!
//! - [`backend`] — the backend capability trait and the recording test double
//! - [`frame`] — dirty-flag render loop, frame tickets, interaction plumbing
//! - [`gpu`] — the wgpu implementation (offscreen device + track pipelines)

pub mod backend;
pub mod frame;
pub mod gpu;

// Re-exports for convenience
pub use backend::{BackendError, BufferId, ProgramId, RecordingBackend, RenderBackend};
pub use frame::{FrameStats, FrameTicket, RenderError, RenderLoop};
pub use gpu::{GpuError, WgpuBackend};
