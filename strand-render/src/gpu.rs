//! wgpu implementation of [`RenderBackend`].
//!
//! The backend is offscreen: it acquires its own adapter and device and
//! renders into a texture sized at construction, which suits tests,
//! benchmarks, and server-side export alike. A windowed surface path can
//! slot in behind the same trait once a desktop shell exists to drive it.
//!
//! Programs arrive as generated WGSL text; each gets its own shader
//! module, uniform buffers, and bind group. Render pipelines are built
//! lazily per (program, buffer set, topology) and cached, since the
//! vertex layout depends on how many attribute channels a track bound.
//! Draws accumulate between the frame brackets and flush as a single
//! render pass in `end_frame`.

use bytemuck::{Pod, Zeroable};
use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendState,
    Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    Device, FragmentState, FrontFace, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode,
    PrimitiveState, PrimitiveTopology, Queue, RenderPipeline,
    RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor,
    ShaderStages, TextureFormat, TextureUsages, TextureView, VertexAttribute,
    VertexBufferLayout, VertexFormat, VertexState, VertexStepMode,
};

use strand_compile::DrawMode;
use strand_core::ChannelId;
use strand_view::GpuViewport;

use crate::backend::{BackendError, BufferId, ProgramId, RenderBackend};

/// Capacity of the per-track uniform block. Six styling channels exist,
/// so this never overflows for well-formed tracks.
pub const MAX_TRACK_UNIFORMS: usize = 8;

/// Bgra8UnormSrgb is the most universally supported format.
const TARGET_FORMAT: TextureFormat = TextureFormat::Bgra8UnormSrgb;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// GPU layout of the shared `Viewport` uniform block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ViewportRaw {
    corners: [f32; 4],
    point_scale: f32,
    _pad: [f32; 3],
}

impl From<&GpuViewport> for ViewportRaw {
    fn from(vp: &GpuViewport) -> Self {
        Self {
            corners: vp.corners,
            point_scale: vp.point_scale,
            _pad: [0.0; 3],
        }
    }
}

/// GPU layout of the per-track `TrackUniforms` block, padded to capacity.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct TrackUniformsRaw {
    values: [f32; MAX_TRACK_UNIFORMS],
}

struct Program {
    module: ShaderModule,
    layout: BindGroupLayout,
    bind_group: BindGroup,
    viewport_buffer: Buffer,
    uniform_buffer: Buffer,
}

struct TrackBuffers {
    positions: Buffer,
    attributes: Vec<(ChannelId, Buffer)>,
}

struct DrawCmd {
    program: u32,
    buffers: u32,
    mode: DrawMode,
    vertex_count: u32,
}

/// The concrete GPU backend.
pub struct WgpuBackend {
    device: Device,
    queue: Queue,
    target: TextureView,
    target_size: (u32, u32),
    clear_color: wgpu::Color,
    programs: Vec<Program>,
    buffers: Vec<TrackBuffers>,
    pipelines: FxHashMap<(u32, u32, u8), RenderPipeline>,
    pending: Vec<DrawCmd>,
    frame_open: bool,
}

impl WgpuBackend {
    /// Acquire an adapter and device and allocate the render target.
    pub async fn new(target_size: (u32, u32)) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("strand-device"),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let target = Self::make_target(&device, target_size);
        Ok(Self {
            device,
            queue,
            target,
            target_size,
            clear_color: wgpu::Color::WHITE,
            programs: Vec::new(),
            buffers: Vec::new(),
            pipelines: FxHashMap::default(),
            pending: Vec::new(),
            frame_open: false,
        })
    }

    fn make_target(device: &Device, (width, height): (u32, u32)) -> TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("strand_target"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Reallocate the render target. No-op for zero-sized requests.
    pub fn resize_target(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        self.target = Self::make_target(&self.device, size);
        self.target_size = size;
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    fn program(&self, id: ProgramId) -> Result<&Program, BackendError> {
        self.programs
            .get(id.0 as usize)
            .ok_or(BackendError::UnknownProgram(id.0))
    }

    fn track_buffers(&self, id: BufferId) -> Result<&TrackBuffers, BackendError> {
        self.buffers
            .get(id.0 as usize)
            .ok_or(BackendError::UnknownBuffers(id.0))
    }

    fn topology(mode: DrawMode) -> PrimitiveTopology {
        match mode {
            DrawMode::PointList => PrimitiveTopology::PointList,
            DrawMode::TriangleList => PrimitiveTopology::TriangleList,
            DrawMode::LineList => PrimitiveTopology::LineList,
        }
    }

    fn mode_code(mode: DrawMode) -> u8 {
        match mode {
            DrawMode::PointList => 0,
            DrawMode::TriangleList => 1,
            DrawMode::LineList => 2,
        }
    }

    /// Build (or fetch) the render pipeline for one track's draw shape.
    fn ensure_pipeline(
        &mut self,
        program: ProgramId,
        buffers: BufferId,
        mode: DrawMode,
    ) -> Result<(), BackendError> {
        let key = (program.0, buffers.0, Self::mode_code(mode));
        if self.pipelines.contains_key(&key) {
            return Ok(());
        }

        let attr_count = self.track_buffers(buffers)?.attributes.len();
        let prog = self.program(program)?;

        // Slot 0: interleaved x,y positions. Slots 1..: one f32 stream
        // per attribute channel, locations matching the generated WGSL.
        let position_attrs = [VertexAttribute {
            format: VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        }];
        let channel_attrs: Vec<[VertexAttribute; 1]> = (0..attr_count)
            .map(|i| {
                [VertexAttribute {
                    format: VertexFormat::Float32,
                    offset: 0,
                    shader_location: (i + 1) as u32,
                }]
            })
            .collect();

        let mut vertex_layouts = Vec::with_capacity(attr_count + 1);
        vertex_layouts.push(VertexBufferLayout {
            array_stride: 8,
            step_mode: VertexStepMode::Vertex,
            attributes: &position_attrs,
        });
        for attrs in &channel_attrs {
            vertex_layouts.push(VertexBufferLayout {
                array_stride: 4,
                step_mode: VertexStepMode::Vertex,
                attributes: attrs,
            });
        }

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some("track_pipeline_layout"),
                bind_group_layouts: &[&prog.layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("track_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: &prog.module,
                    entry_point: Some("vs_main"),
                    compilation_options: PipelineCompilationOptions::default(),
                    buffers: &vertex_layouts,
                },
                fragment: Some(FragmentState {
                    module: &prog.module,
                    entry_point: Some("fs_main"),
                    compilation_options: PipelineCompilationOptions::default(),
                    targets: &[Some(ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(BlendState::ALPHA_BLENDING),
                        write_mask: ColorWrites::ALL,
                    })],
                }),
                primitive: PrimitiveState {
                    topology: Self::topology(mode),
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: None, // 2D — no backface culling
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        debug!(
            "pipeline built: program {} / buffers {} / {mode:?}, {attr_count} attribute stream(s)",
            program.0, buffers.0
        );
        self.pipelines.insert(key, pipeline);
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    fn compile_program(&mut self, source: &str) -> Result<ProgramId, BackendError> {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some("track_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        // Bindings 0 (viewport) and 1 (track uniforms) are declared even
        // when the shader omits the track block; extra layout entries are
        // legal and keep every program on one layout shape.
        let layout = self
            .device
            .create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("track_bgl"),
                entries: &[
                    BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ShaderStages::VERTEX,
                        ty: BindingType::Buffer {
                            ty: BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ShaderStages::VERTEX,
                        ty: BindingType::Buffer {
                            ty: BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let viewport_buffer =
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("viewport_ub"),
                    contents: bytemuck::bytes_of(&ViewportRaw {
                        corners: [-1.0, 1.0, -1.0, 1.0],
                        point_scale: 1.0,
                        _pad: [0.0; 3],
                    }),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });
        let uniform_buffer =
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("track_ub"),
                    contents: bytemuck::bytes_of(&TrackUniformsRaw {
                        values: [0.0; MAX_TRACK_UNIFORMS],
                    }),
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                });

        let bind_group = self.device.create_bind_group(&BindGroupDescriptor {
            label: Some("track_bg"),
            layout: &layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: viewport_buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        self.programs.push(Program {
            module,
            layout,
            bind_group,
            viewport_buffer,
            uniform_buffer,
        });
        Ok(ProgramId(self.programs.len() as u32 - 1))
    }

    fn upload_buffers(
        &mut self,
        positions: &[f32],
        attributes: &[(ChannelId, &[f32])],
    ) -> Result<BufferId, BackendError> {
        let positions = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("track_positions"),
                contents: bytemuck::cast_slice(positions),
                usage: BufferUsages::VERTEX,
            });
        let attributes = attributes
            .iter()
            .map(|(id, values)| {
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(id.name()),
                        contents: bytemuck::cast_slice(values),
                        usage: BufferUsages::VERTEX,
                    });
                (*id, buffer)
            })
            .collect();

        self.buffers.push(TrackBuffers {
            positions,
            attributes,
        });
        Ok(BufferId(self.buffers.len() as u32 - 1))
    }

    fn set_uniforms(
        &mut self,
        program: ProgramId,
        viewport: &GpuViewport,
        uniforms: &[(ChannelId, f32)],
    ) -> Result<(), BackendError> {
        if uniforms.len() > MAX_TRACK_UNIFORMS {
            return Err(BackendError::UniformOverflow {
                got: uniforms.len(),
                max: MAX_TRACK_UNIFORMS,
            });
        }
        let prog = self.program(program)?;

        self.queue.write_buffer(
            &prog.viewport_buffer,
            0,
            bytemuck::bytes_of(&ViewportRaw::from(viewport)),
        );

        let mut raw = TrackUniformsRaw {
            values: [0.0; MAX_TRACK_UNIFORMS],
        };
        for (slot, (_, value)) in uniforms.iter().enumerate() {
            raw.values[slot] = *value;
        }
        self.queue
            .write_buffer(&prog.uniform_buffer, 0, bytemuck::bytes_of(&raw));
        Ok(())
    }

    fn draw(
        &mut self,
        program: ProgramId,
        buffers: BufferId,
        mode: DrawMode,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        self.ensure_pipeline(program, buffers, mode)?;
        self.pending.push(DrawCmd {
            program: program.0,
            buffers: buffers.0,
            mode,
            vertex_count,
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BackendError> {
        // Dropping the wgpu handles releases the GPU resources.
        self.programs.clear();
        self.buffers.clear();
        self.pipelines.clear();
        self.pending.clear();
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), BackendError> {
        self.pending.clear();
        self.frame_open = true;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        if !self.frame_open {
            return Err(BackendError::Target(
                "end_frame without begin_frame".into(),
            ));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("strand_frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strand_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for cmd in &self.pending {
                let key = (cmd.program, cmd.buffers, Self::mode_code(cmd.mode));
                // ensure_pipeline ran at submission time.
                let pipeline = &self.pipelines[&key];
                let prog = &self.programs[cmd.program as usize];
                let bufs = &self.buffers[cmd.buffers as usize];

                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &prog.bind_group, &[]);
                pass.set_vertex_buffer(0, bufs.positions.slice(..));
                for (slot, (_, buffer)) in bufs.attributes.iter().enumerate() {
                    pass.set_vertex_buffer((slot + 1) as u32, buffer.slice(..));
                }
                pass.draw(0..cmd.vertex_count, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.pending.clear();
        self.frame_open = false;
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offscreen_target_sizing() {
        // Build machines may have no adapter; only assert when one exists.
        let Ok(mut backend) = pollster::block_on(WgpuBackend::new((640, 480))) else {
            return;
        };
        assert_eq!(backend.target_size(), (640, 480));

        backend.resize_target((800, 600));
        assert_eq!(backend.target_size(), (800, 600));

        // Zero-sized requests are ignored.
        backend.resize_target((0, 600));
        assert_eq!(backend.target_size(), (800, 600));
    }

    #[test]
    fn test_end_frame_requires_begin() {
        let Ok(mut backend) = pollster::block_on(WgpuBackend::new((64, 64))) else {
            return;
        };
        assert!(matches!(
            backend.end_frame(),
            Err(BackendError::Target(_))
        ));
        backend.begin_frame().unwrap();
        backend.end_frame().unwrap();
    }
}
