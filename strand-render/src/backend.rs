//! The rendering-backend capability interface.
//!
//! The core never talks to a GPU API directly; it talks to
//! [`RenderBackend`], selected at construction. One concrete
//! implementation lives in [`crate::gpu`] (wgpu); [`RecordingBackend`]
//! is the test double the render-loop protocol tests drive.

use strand_compile::DrawMode;
use strand_core::ChannelId;
use strand_view::GpuViewport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("shader compilation failed: {0}")]
    Compile(String),
    #[error("unknown program handle {0}")]
    UnknownProgram(u32),
    #[error("unknown buffer handle {0}")]
    UnknownBuffers(u32),
    #[error("track uses {got} uniform channels, backend supports {max}")]
    UniformOverflow { got: usize, max: usize },
    #[error("render target unavailable: {0}")]
    Target(String),
}

/// Opaque handle to a compiled shader program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Opaque handle to one track's uploaded buffer set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// What a rendering backend must be able to do. Compilation and uploads
/// happen once per specification; uniforms and draws happen once per
/// dirty frame.
pub trait RenderBackend {
    fn compile_program(&mut self, source: &str) -> Result<ProgramId, BackendError>;

    /// Upload one track's position buffer plus its per-vertex attribute
    /// buffers.
    fn upload_buffers(
        &mut self,
        positions: &[f32],
        attributes: &[(ChannelId, &[f32])],
    ) -> Result<BufferId, BackendError>;

    /// Rebind the viewport block and the track's constant channels.
    fn set_uniforms(
        &mut self,
        program: ProgramId,
        viewport: &GpuViewport,
        uniforms: &[(ChannelId, f32)],
    ) -> Result<(), BackendError>;

    fn draw(
        &mut self,
        program: ProgramId,
        buffers: BufferId,
        mode: DrawMode,
        vertex_count: u32,
    ) -> Result<(), BackendError>;

    /// Release every program and buffer set. Handles issued before the
    /// call are invalid afterwards; ids restart from zero.
    fn clear(&mut self) -> Result<(), BackendError>;

    /// Frame brackets. Backends that batch draw commands acquire and
    /// present their target here; others ignore them.
    fn begin_frame(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Records every backend call for protocol assertions. The call vectors
/// are history and survive `clear`; the `live_*` counters track resource
/// lifetimes the way a real backend would.
#[derive(Default)]
pub struct RecordingBackend {
    pub programs: Vec<String>,
    /// (position floats, attribute buffer count) per upload.
    pub uploads: Vec<(usize, usize)>,
    pub uniform_sets: Vec<(ProgramId, GpuViewport, Vec<(ChannelId, f32)>)>,
    pub draws: Vec<(ProgramId, BufferId, DrawMode, u32)>,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub live_programs: usize,
    pub live_buffers: usize,
    pub clears: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn compile_program(&mut self, source: &str) -> Result<ProgramId, BackendError> {
        self.programs.push(source.to_string());
        self.live_programs += 1;
        Ok(ProgramId(self.live_programs as u32 - 1))
    }

    fn upload_buffers(
        &mut self,
        positions: &[f32],
        attributes: &[(ChannelId, &[f32])],
    ) -> Result<BufferId, BackendError> {
        self.uploads.push((positions.len(), attributes.len()));
        self.live_buffers += 1;
        Ok(BufferId(self.live_buffers as u32 - 1))
    }

    fn set_uniforms(
        &mut self,
        program: ProgramId,
        viewport: &GpuViewport,
        uniforms: &[(ChannelId, f32)],
    ) -> Result<(), BackendError> {
        self.uniform_sets
            .push((program, *viewport, uniforms.to_vec()));
        Ok(())
    }

    fn draw(
        &mut self,
        program: ProgramId,
        buffers: BufferId,
        mode: DrawMode,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        self.draws.push((program, buffers, mode, vertex_count));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        self.live_programs = 0;
        self.live_buffers = 0;
        self.clears += 1;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), BackendError> {
        self.frames_begun += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.frames_ended += 1;
        Ok(())
    }
}
