use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Result;
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::gpu::{Gpu, GpuFrame};
use super::pipeline::{PipelineKey, create_render_pipeline};
use super::recorder::{
    FramePlan, FrameRecorder, IndexSource, MAX_PARAMS, MAX_SAMPLERS, ProgramLayout, RecordedDraw,
    UNIFORM_BLOCK_SIZE, VertexSource, ViewPass,
};
use super::{GpuInit, SurfaceErrorAction};
use crate::coords::ViewRect;
use crate::paint::Color;
use crate::render::backend::{
    BufferRange, ClearFlags, DiscardFlags, DynamicIndexBufferHandle, DynamicVertexBufferHandle, GpuBackend,
    IndexBufferHandle, ParamDecl, ProgramHandle, ResetFlags, SamplerDecl, SamplerFlags, TextureHandle,
    UniformHandle, UniformKind, VertexBufferHandle, ViewClear,
};
use crate::render::{GraphicsError, StateFlags, ViewId};

struct StaticVertexBuffer {
    buffer: wgpu::Buffer,
    stride: u64,
}

struct GpuTexture {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

struct GpuProgram {
    label: String,
    module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    texture_layout: Option<wgpu::BindGroupLayout>,
    info: ProgramLayout,
}

/// Growable per-frame upload buffer.
struct TransientBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
}

impl TransientBuffer {
    const MIN_CAPACITY: u64 = 64 * 1024;

    fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            buffer: None,
            capacity: 0,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let required = bytes.len() as u64;
        if self.buffer.is_none() || required > self.capacity {
            let capacity = required.next_power_of_two().max(Self::MIN_CAPACITY);
            log::debug!("{}: growing to {capacity} bytes", self.label);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: capacity,
                usage: self.usage,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
        }

        if let Some(buffer) = self.buffer.as_ref() {
            queue.write_buffer(buffer, 0, bytes);
        }
    }

    fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// [`GpuBackend`] on top of wgpu.
///
/// Submissions are recorded on the CPU and replayed in [`frame`](GpuBackend::frame):
/// one render pass per view, views in ascending id order.
pub struct WgpuBackend {
    gpu: Gpu,
    recorder: FrameRecorder,
    next_handle: u32,
    shut_down: bool,

    vertex_buffers: HashMap<VertexBufferHandle, StaticVertexBuffer>,
    index_buffers: HashMap<IndexBufferHandle, wgpu::Buffer>,
    textures: HashMap<TextureHandle, GpuTexture>,
    uniforms: HashMap<UniformHandle, (String, UniformKind)>,
    programs: HashMap<ProgramHandle, GpuProgram>,

    uniform_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    texture_groups: HashMap<(ProgramHandle, Vec<TextureHandle>), wgpu::BindGroup>,

    transient_vertices: TransientBuffer,
    transient_indices: TransientBuffer,
    transient_uniforms: TransientBuffer,
}

impl WgpuBackend {
    /// Creates the device and surface for `window`, blocking on adapter/device
    /// acquisition.
    pub fn new(window: Arc<Window>, init: &GpuInit) -> Result<Self> {
        let gpu = pollster::block_on(Gpu::new(window, init))?;

        let uniform_layout = gpu.device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blitty draw uniforms layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UNIFORM_BLOCK_SIZE),
                },
                count: None,
            }],
        });

        log::info!(
            "wgpu backend ready: {:?}, {}x{}",
            gpu.surface_format(),
            gpu.size().0,
            gpu.size().1
        );

        Ok(Self {
            gpu,
            recorder: FrameRecorder::new(),
            next_handle: 1,
            shut_down: false,
            vertex_buffers: HashMap::new(),
            index_buffers: HashMap::new(),
            textures: HashMap::new(),
            uniforms: HashMap::new(),
            programs: HashMap::new(),
            uniform_layout,
            pipelines: HashMap::new(),
            texture_groups: HashMap::new(),
            transient_vertices: TransientBuffer::new("blitty transient vertices", wgpu::BufferUsages::VERTEX),
            transient_indices: TransientBuffer::new("blitty transient indices", wgpu::BufferUsages::INDEX),
            transient_uniforms: TransientBuffer::new("blitty draw uniforms", wgpu::BufferUsages::UNIFORM),
        })
    }

    fn alloc(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn device(&self) -> &wgpu::Device {
        self.gpu.device()
    }

    // ── frame helpers ─────────────────────────────────────────────────────

    fn upload(&mut self, plan: &FramePlan) {
        let (device, queue) = (self.gpu.device(), self.gpu.queue());
        self.transient_vertices.upload(device, queue, &plan.vertex_bytes);
        self.transient_indices.upload(device, queue, &plan.index_bytes);
        self.transient_uniforms.upload(device, queue, &plan.uniform_bytes);
    }

    /// Creates missing pipelines and texture bind groups for this frame's draws.
    fn prepare(&mut self, plan: &FramePlan) {
        let format = self.gpu.surface_format();
        let samples = self.gpu.sample_count();

        for draw in &plan.draws {
            let Some(program) = self.programs.get(&draw.program) else {
                continue;
            };

            let key = PipelineKey::new(draw.program, draw.state, format, samples);
            if !self.pipelines.contains_key(&key) {
                log::debug!("creating pipeline for `{}` ({:?})", program.label, key.state);
                let pipeline = create_render_pipeline(
                    self.gpu.device(),
                    &program.label,
                    &program.layout,
                    &program.module,
                    &key,
                );
                self.pipelines.insert(key, pipeline);
            }

            if draw.textures.is_empty() {
                continue;
            }
            let group_key = (draw.program, draw.textures.clone());
            if self.texture_groups.contains_key(&group_key) {
                continue;
            }
            let Some(layout) = program.texture_layout.as_ref() else {
                continue;
            };

            let mut entries = Vec::with_capacity(draw.textures.len() * 2);
            for (i, handle) in draw.textures.iter().enumerate() {
                let Some(tex) = self.textures.get(handle) else {
                    log::warn!("draw references destroyed texture {handle:?}");
                    entries.clear();
                    break;
                };
                entries.push(wgpu::BindGroupEntry {
                    binding: 2 * i as u32,
                    resource: wgpu::BindingResource::TextureView(&tex.view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: 2 * i as u32 + 1,
                    resource: wgpu::BindingResource::Sampler(&tex.sampler),
                });
            }
            if entries.is_empty() {
                continue;
            }

            let group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("blitty textures"),
                layout,
                entries: &entries,
            });
            self.texture_groups.insert(group_key, group);
        }
    }

    fn uniform_bind_group(&self) -> Option<wgpu::BindGroup> {
        let buffer = self.transient_uniforms.buffer()?;
        Some(self.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blitty draw uniforms"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_BLOCK_SIZE),
                }),
            }],
        }))
    }

    fn encode(&self, frame: &mut GpuFrame, plan: &FramePlan, uniforms: Option<&wgpu::BindGroup>) {
        let (w, h) = self.gpu.size();

        let fallback = [ViewPass {
            id: ViewId(0),
            state: Default::default(),
            draws: 0..0,
        }];
        let passes: &[ViewPass] = if plan.passes.is_empty() { &fallback } else { &plan.passes };

        for (i, pass) in passes.iter().enumerate() {
            let first = i == 0;
            let color_view = self.gpu.msaa_view().unwrap_or(&frame.view);
            let resolve_target = self.gpu.msaa_view().map(|_| &frame.view);

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blitty view pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: color_load(first, pass.state.clear, pass.state.rect, w, h),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load(first, pass.state.clear),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let Some(rect) = pass.state.rect.unwrap_or(ViewRect::from_size(w, h)).clamped_to(w, h) else {
                continue;
            };
            rpass.set_viewport(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32, 0.0, 1.0);

            let scissor = pass.state.scissor.and_then(|s| s.clamped_to(w, h)).unwrap_or(rect);
            rpass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);

            let Some(uniforms) = uniforms else {
                continue;
            };
            for draw in &plan.draws[pass.draws.clone()] {
                self.encode_draw(&mut rpass, draw, uniforms);
            }
        }
    }

    fn encode_draw(&self, rpass: &mut wgpu::RenderPass<'_>, draw: &RecordedDraw, uniforms: &wgpu::BindGroup) {
        let key = PipelineKey::new(
            draw.program,
            draw.state,
            self.gpu.surface_format(),
            self.gpu.sample_count(),
        );
        let Some(pipeline) = self.pipelines.get(&key) else {
            return;
        };

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, uniforms, &[draw.uniform_offset]);

        if !draw.textures.is_empty() {
            let Some(group) = self.texture_groups.get(&(draw.program, draw.textures.clone())) else {
                return;
            };
            rpass.set_bind_group(1, group, &[]);
        }

        let vertex_count = match draw.vertex {
            VertexSource::Static { handle, range } => {
                let Some(vb) = self.vertex_buffers.get(&handle) else {
                    return;
                };
                if range.count == 0 {
                    return;
                }
                rpass.set_vertex_buffer(0, vb.buffer.slice(range.start as u64 * vb.stride..));
                range.count
            }
            VertexSource::Transient { offset, count } => {
                let Some(buffer) = self.transient_vertices.buffer() else {
                    return;
                };
                if count == 0 {
                    return;
                }
                rpass.set_vertex_buffer(0, buffer.slice(offset..));
                count
            }
        };

        match draw.index {
            None => rpass.draw(0..vertex_count, 0..1),
            Some(IndexSource::Static { handle, range }) => {
                let Some(ib) = self.index_buffers.get(&handle) else {
                    return;
                };
                rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(range.start..range.start + range.count, 0, 0..1);
            }
            Some(IndexSource::Transient { offset, count }) => {
                let Some(buffer) = self.transient_indices.buffer() else {
                    return;
                };
                if count == 0 {
                    return;
                }
                rpass.set_index_buffer(buffer.slice(offset..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..count, 0, 0..1);
            }
        }
    }
}

impl GpuBackend for WgpuBackend {
    // ── resources ─────────────────────────────────────────────────────────

    fn create_vertex_buffer(&mut self, label: &str, data: &[u8], stride: u32) -> VertexBufferHandle {
        let buffer = self.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let handle = VertexBufferHandle(self.alloc());
        self.vertex_buffers.insert(handle, StaticVertexBuffer { buffer, stride: stride as u64 });
        handle
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.vertex_buffers.remove(&handle);
    }

    fn create_index_buffer(&mut self, label: &str, indices: &[u16]) -> IndexBufferHandle {
        let buffer = self.device().create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let handle = IndexBufferHandle(self.alloc());
        self.index_buffers.insert(handle, buffer);
        handle
    }

    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.index_buffers.remove(&handle);
    }

    fn create_dynamic_vertex_buffer(&mut self, label: &str, vertex_count: u32, stride: u32) -> DynamicVertexBufferHandle {
        let handle = DynamicVertexBufferHandle(self.alloc());
        log::debug!("dynamic vertex buffer `{label}`: {vertex_count} x {stride} bytes");
        self.recorder.add_dynamic_vertex_buffer(handle, vertex_count, stride);
        handle
    }

    fn update_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle, start_vertex: u32, data: &[u8]) {
        self.recorder.update_dynamic_vertex_buffer(handle, start_vertex, data);
    }

    fn destroy_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle) {
        self.recorder.remove_dynamic_vertex_buffer(handle);
    }

    fn create_dynamic_index_buffer(&mut self, label: &str, index_count: u32) -> DynamicIndexBufferHandle {
        let handle = DynamicIndexBufferHandle(self.alloc());
        log::debug!("dynamic index buffer `{label}`: {index_count} indices");
        self.recorder.add_dynamic_index_buffer(handle, index_count);
        handle
    }

    fn update_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, start_index: u32, indices: &[u16]) {
        self.recorder.update_dynamic_index_buffer(handle, start_index, indices);
    }

    fn destroy_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle) {
        self.recorder.remove_dynamic_index_buffer(handle);
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        flags: SamplerFlags,
        rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || expected == 0 {
            return Err(GraphicsError::TextureSize {
                label: label.to_string(),
                expected,
                actual: rgba.len(),
            });
        }

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = self.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device().create_sampler(&sampler_descriptor(label, flags));

        let handle = TextureHandle(self.alloc());
        self.textures.insert(
            handle,
            GpuTexture {
                _texture: texture,
                view,
                sampler,
            },
        );
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_some() {
            self.texture_groups.retain(|(_, textures), _| !textures.contains(&handle));
        }
    }

    fn create_uniform(&mut self, name: &str, kind: UniformKind) -> UniformHandle {
        let handle = UniformHandle(self.alloc());
        self.uniforms.insert(handle, (name.to_string(), kind));
        handle
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        if let Some((name, kind)) = self.uniforms.remove(&handle) {
            log::trace!("uniform `{name}` ({kind:?}) destroyed");
        }
        self.recorder.remove_uniform(handle);
    }

    fn create_program(
        &mut self,
        label: &str,
        wgsl: &str,
        samplers: &[SamplerDecl],
        params: &[ParamDecl],
    ) -> Result<ProgramHandle, GraphicsError> {
        if wgsl.trim().is_empty() {
            return Err(GraphicsError::EmptyShaderSource(label.to_string()));
        }
        let fail = |message: String| GraphicsError::ProgramCreation { label: label.to_string(), message };

        if samplers.len() > MAX_SAMPLERS {
            return Err(fail(format!("{} samplers declared, at most {MAX_SAMPLERS} supported", samplers.len())));
        }
        if params.len() > MAX_PARAMS {
            return Err(fail(format!("{} parameters declared, at most {MAX_PARAMS} supported", params.len())));
        }
        for entry in ["vs_main", "fs_main"] {
            if !wgsl.contains(&format!("fn {entry}")) {
                return Err(fail(format!("missing entry point `{entry}`")));
            }
        }

        let module = self.device().create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(fail(errors.join("; ")));
        }

        let texture_layout = (!samplers.is_empty()).then(|| {
            let entries: Vec<_> = (0..samplers.len() as u32)
                .flat_map(|i| {
                    [
                        wgpu::BindGroupLayoutEntry {
                            binding: 2 * i,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2 * i + 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ]
                })
                .collect();

            self.device().create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            })
        });

        let layout = {
            let mut groups = vec![&self.uniform_layout];
            if let Some(t) = texture_layout.as_ref() {
                groups.push(t);
            }
            self.device().create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &groups,
                immediate_size: 0,
            })
        };

        let handle = ProgramHandle(self.alloc());
        log::debug!("program `{label}` created ({} samplers, {} params)", samplers.len(), params.len());
        self.programs.insert(
            handle,
            GpuProgram {
                label: label.to_string(),
                module,
                layout,
                texture_layout,
                info: ProgramLayout {
                    sampler_count: samplers.len(),
                    params: params.iter().map(|p| p.handle).collect(),
                },
            },
        );
        Ok(handle)
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        if self.programs.remove(&handle).is_some() {
            self.pipelines.retain(|k, _| k.program != handle);
            self.texture_groups.retain(|(p, _), _| *p != handle);
        }
    }

    // ── views ─────────────────────────────────────────────────────────────

    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear) {
        self.recorder.set_view_clear(view, clear);
    }

    fn set_view_rect(&mut self, view: ViewId, rect: ViewRect) {
        self.recorder.set_view_rect(view, rect);
    }

    fn set_view_scissor(&mut self, view: ViewId, rect: ViewRect) {
        self.recorder.set_view_scissor(view, rect);
    }

    fn set_view_transform(&mut self, view: ViewId, view_matrix: Mat4, projection: Mat4) {
        self.recorder.set_view_transform(view, view_matrix, projection);
    }

    fn touch(&mut self, view: ViewId) {
        self.recorder.touch(view);
    }

    // ── submission state ──────────────────────────────────────────────────

    fn set_state(&mut self, state: StateFlags) {
        self.recorder.set_state(state);
    }

    fn set_texture(&mut self, slot: u8, _sampler: UniformHandle, texture: TextureHandle) {
        self.recorder.set_texture(slot, texture);
    }

    fn set_uniform(&mut self, uniform: UniformHandle, value: Vec4) {
        self.recorder.set_uniform(uniform, value);
    }

    fn set_vertex_buffer(&mut self, _stream: u8, handle: VertexBufferHandle, range: BufferRange) {
        self.recorder.set_vertex_buffer(handle, range);
    }

    fn set_dynamic_vertex_buffer(&mut self, _stream: u8, handle: DynamicVertexBufferHandle, range: BufferRange) {
        self.recorder.set_dynamic_vertex_buffer(handle, range);
    }

    fn set_index_buffer(&mut self, handle: IndexBufferHandle, range: BufferRange) {
        self.recorder.set_index_buffer(handle, range);
    }

    fn set_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, range: BufferRange) {
        self.recorder.set_dynamic_index_buffer(handle, range);
    }

    fn submit(&mut self, view: ViewId, program: ProgramHandle, depth: u32, discard: DiscardFlags) {
        match self.programs.get(&program) {
            Some(p) => {
                self.recorder.submit(view, program, &p.info, depth, discard);
            }
            None => {
                log::warn!("submit with unknown program {program:?}");
                self.recorder.discard(discard);
            }
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    fn frame(&mut self) -> Result<(), GraphicsError> {
        if self.shut_down {
            return Err(GraphicsError::ShutDown);
        }

        let plan = self.recorder.finish_frame();

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match self.gpu.handle_surface_error(&err) {
                    SurfaceErrorAction::Fatal => Err(GraphicsError::Surface(err.to_string())),
                    action => {
                        log::debug!("frame skipped: {err} ({action:?})");
                        Ok(())
                    }
                };
            }
        };

        self.upload(&plan);
        self.prepare(&plan);
        let uniforms = self.uniform_bind_group();
        self.encode(&mut frame, &plan, uniforms.as_ref());
        self.gpu.present(frame);
        Ok(())
    }

    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags) {
        self.gpu.resize(width, height);
        self.gpu.set_vsync(flags.contains(ResetFlags::VSYNC));

        let before = self.gpu.sample_count();
        self.gpu.set_sample_count(flags.msaa_samples());
        if self.gpu.sample_count() != before {
            self.pipelines.clear();
        }
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.recorder.clear();
        self.pipelines.clear();
        self.texture_groups.clear();
        self.programs.clear();
        self.textures.clear();
        self.uniforms.clear();
        self.vertex_buffers.clear();
        self.index_buffers.clear();
        log::info!("wgpu backend shut down");
    }
}

fn to_wgpu_color(c: Color) -> wgpu::Color {
    wgpu::Color {
        r: c.r as f64 / 255.0,
        g: c.g as f64 / 255.0,
        b: c.b as f64 / 255.0,
        a: c.a as f64 / 255.0,
    }
}

/// Color load op for a view pass.
///
/// The first pass always clears (to black when the view has no color clear).
/// Later passes clear only when their rect covers the whole backbuffer.
fn color_load(first: bool, clear: Option<ViewClear>, rect: Option<ViewRect>, width: u32, height: u32) -> wgpu::LoadOp<wgpu::Color> {
    let color = clear
        .filter(|c| c.flags.contains(ClearFlags::COLOR))
        .map(|c| to_wgpu_color(c.color));

    if first {
        return wgpu::LoadOp::Clear(color.unwrap_or(wgpu::Color::BLACK));
    }

    let covers = rect.is_none_or(|r| r.x == 0 && r.y == 0 && r.width >= width && r.height >= height);
    match color {
        Some(c) if covers => wgpu::LoadOp::Clear(c),
        _ => wgpu::LoadOp::Load,
    }
}

fn depth_load(first: bool, clear: Option<ViewClear>) -> wgpu::LoadOp<f32> {
    match clear.filter(|c| c.flags.contains(ClearFlags::DEPTH)) {
        Some(c) => wgpu::LoadOp::Clear(c.depth),
        None if first => wgpu::LoadOp::Clear(1.0),
        None => wgpu::LoadOp::Load,
    }
}

fn sampler_descriptor(label: &str, flags: SamplerFlags) -> wgpu::SamplerDescriptor<'_> {
    let address = |clamp: bool| {
        if clamp {
            wgpu::AddressMode::ClampToEdge
        } else {
            wgpu::AddressMode::Repeat
        }
    };
    let filter = |point: bool| {
        if point {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        }
    };

    wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address(flags.contains(SamplerFlags::U_CLAMP)),
        address_mode_v: address(flags.contains(SamplerFlags::V_CLAMP)),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter(flags.contains(SamplerFlags::MAG_POINT)),
        min_filter: filter(flags.contains(SamplerFlags::MIN_POINT)),
        ..Default::default()
    }
}
