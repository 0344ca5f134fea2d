//! Dirty-flag render loop.
//!
//! The loop sits between the compiler and a [`RenderBackend`] and owns
//! the per-frame protocol:
//!
//! ```text
//!   set_specification ──► compile ──► programs + buffers   (once)
//!   pan / zoom        ──► viewport mutation ──► dirty      (per event)
//!   tick              ──► uniforms + draws, iff dirty      (per frame)
//! ```
//!
//! Clean frames cost one flag check. Swapping the specification bumps a
//! generation counter so frames scheduled against the old document are
//! skipped instead of drawing stale buffers.

use log::{debug, info, trace, warn};
use thiserror::Error;

use strand_compile::{Compiled, CompileError, CompiledTrack, Compiler, DataSet};
use strand_core::Specification;
use strand_view::{InteractionConfig, ViewportController};

use crate::backend::{BackendError, BufferId, ProgramId, RenderBackend};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// What a tick did. Skipped ticks (clean, stale, or reentrant) report
/// zero work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub vertices: u64,
}

impl FrameStats {
    pub fn drew(&self) -> bool {
        self.draw_calls > 0
    }
}

/// Ticket for an externally scheduled frame (requestAnimationFrame and
/// kin). Stale tickets — issued before the last specification swap —
/// are skipped at redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

struct TrackSlot {
    compiled: CompiledTrack,
    program: ProgramId,
    buffers: BufferId,
}

pub struct RenderLoop<B: RenderBackend> {
    backend: B,
    compiler: Compiler,
    interaction: InteractionConfig,
    tracks: Vec<TrackSlot>,
    viewport: Option<ViewportController>,
    dirty: bool,
    generation: u64,
    in_frame: bool,
}

impl<B: RenderBackend> RenderLoop<B> {
    pub fn new(backend: B, compiler: Compiler) -> Self {
        Self::with_config(backend, compiler, InteractionConfig::default())
    }

    pub fn with_config(backend: B, compiler: Compiler, interaction: InteractionConfig) -> Self {
        Self {
            backend,
            compiler,
            interaction,
            tracks: Vec::new(),
            viewport: None,
            dirty: false,
            generation: 0,
            in_frame: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The viewport controller, once a specification has compiled.
    pub fn viewport(&self) -> Option<&ViewportController> {
        self.viewport.as_ref()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force a redraw on the next tick (canvas resize, theme change).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Compile a specification, upload its programs and buffers, and
    /// reset the viewport to the new data extent. A compile error leaves
    /// the previous document live; a backend failure during upload leaves
    /// the loop empty until the next successful swap. On success, frames
    /// scheduled before the call are cancelled.
    pub fn set_specification(
        &mut self,
        spec: &Specification,
        data: &DataSet,
    ) -> Result<(), RenderError> {
        let compiled = self.compiler.compile(spec, data)?;
        self.install(compiled)
    }

    fn install(&mut self, compiled: Compiled) -> Result<(), RenderError> {
        // The previous document's GPU resources are released before the
        // new ones go up, so repeated swaps hold one document at a time.
        self.backend.clear()?;
        self.tracks.clear();

        let mut slots = Vec::with_capacity(compiled.tracks.len());
        for track in compiled.tracks {
            let program = self.backend.compile_program(track.shader_source())?;
            let attributes: Vec<_> = track.attributes().collect();
            let buffers = self.backend.upload_buffers(&track.positions, &attributes)?;
            slots.push(TrackSlot {
                compiled: track,
                program,
                buffers,
            });
        }

        self.generation += 1;
        match &mut self.viewport {
            Some(vp) => vp.reset(compiled.extent),
            None => {
                self.viewport = Some(ViewportController::with_config(
                    compiled.extent,
                    self.interaction,
                ))
            }
        }
        self.tracks = slots;
        self.dirty = true;
        info!(
            "specification installed: {} track(s), generation {}",
            self.tracks.len(),
            self.generation
        );
        Ok(())
    }

    /// Issue a ticket tied to the current document.
    pub fn request_frame(&self) -> FrameTicket {
        FrameTicket {
            generation: self.generation,
        }
    }

    /// Redeem a scheduled frame. Tickets issued before the last
    /// specification swap are skipped.
    pub fn tick_scheduled(&mut self, ticket: FrameTicket) -> Result<FrameStats, RenderError> {
        if ticket.generation != self.generation {
            trace!(
                "stale frame skipped: ticket generation {} != {}",
                ticket.generation,
                self.generation
            );
            return Ok(FrameStats::default());
        }
        self.tick()
    }

    /// Draw every track if the scene is dirty; otherwise do nothing.
    pub fn tick(&mut self) -> Result<FrameStats, RenderError> {
        if self.in_frame {
            warn!("tick reentered from within a frame; skipping");
            return Ok(FrameStats::default());
        }
        if !self.dirty {
            return Ok(FrameStats::default());
        }
        let Some(viewport) = &self.viewport else {
            return Ok(FrameStats::default());
        };
        let gpu_viewport = viewport.to_gpu_viewport();

        self.in_frame = true;
        let result: Result<FrameStats, RenderError> = (|| {
            self.backend.begin_frame()?;
            let mut stats = FrameStats::default();
            for slot in &self.tracks {
                let uniforms = slot.compiled.uniforms();
                self.backend
                    .set_uniforms(slot.program, &gpu_viewport, &uniforms)?;
                self.backend.draw(
                    slot.program,
                    slot.buffers,
                    slot.compiled.draw_mode,
                    slot.compiled.vertex_count as u32,
                )?;
                stats.draw_calls += 1;
                stats.vertices += slot.compiled.vertex_count as u64;
            }
            self.backend.end_frame()?;
            Ok(stats)
        })();
        self.in_frame = false;

        let stats: FrameStats = result?;
        self.dirty = false;
        debug!(
            "frame drawn: {} draw call(s), {} vertices",
            stats.draw_calls, stats.vertices
        );
        Ok(stats)
    }

    /// Pan by pixel deltas; marks the scene dirty when the range moved.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64, canvas_px: (f64, f64)) -> bool {
        let Some(vp) = &mut self.viewport else {
            return false;
        };
        let moved = vp.pan(dx_px, dy_px, canvas_px);
        self.dirty |= moved;
        moved
    }

    /// Zoom about a data-space focal point; marks the scene dirty when
    /// the range changed.
    pub fn zoom(&mut self, focal: (f64, f64), delta_normalized: f64) -> bool {
        let Some(vp) = &mut self.viewport else {
            return false;
        };
        let changed = vp.zoom(focal, delta_normalized);
        self.dirty |= changed;
        changed
    }
}

// ===================================================================
// Tests
// ===================================================================
