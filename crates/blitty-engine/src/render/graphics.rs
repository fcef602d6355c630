use serde::{Deserialize, Serialize};

use super::backend::{
    BufferRange, ClearFlags, DiscardFlags, GpuBackend, ParamDecl, ResetFlags, SamplerDecl,
    UniformKind, ViewClear,
};
use super::buffers::{DynamicIndexBuffer, DynamicVertexBuffer, IndexBuffer, VertexBuffer};
use super::error::GraphicsError;
use super::mesh::{DynamicMesh, Mesh, StaticMesh, quad_indices};
use super::registry::{ResourceKey, ResourceKind, ResourceRegistry};
use super::shader::{Shader, ShaderParameter, ShaderSampler};
use super::state::{PrimitiveType, RenderState};
use super::texture::{Texture2D, TextureFilter, sampler_flags};
use super::vertex::VertexPCT;
use super::view::{RenderView, ViewId};
use crate::content::Pixmap;
use crate::paint::Color;

/// WGSL source of the built-in sprite shader.
pub const BASE_SHADER_WGSL: &str = include_str!("shaders/base.wgsl");

/// Multisampling level requested for the backbuffer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsaaLevel {
    #[default]
    None,
    X2,
    X4,
    X8,
    X16,
}

impl MsaaLevel {
    fn reset_flags(self) -> ResetFlags {
        match self {
            MsaaLevel::None => ResetFlags::empty(),
            MsaaLevel::X2 => ResetFlags::MSAA_X2,
            MsaaLevel::X4 => ResetFlags::MSAA_X4,
            MsaaLevel::X8 => ResetFlags::MSAA_X8,
            MsaaLevel::X16 => ResetFlags::MSAA_X16,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GraphicsSettings {
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub msaa: MsaaLevel,
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            vsync: true,
            msaa: MsaaLevel::None,
        }
    }
}

/// Graphics context.
///
/// Owns the backend, the resource registry and the draw state (current view,
/// render state, draw texture). Backbuffer size, VSync and MSAA changes are
/// applied on the next [`frame`](Self::frame).
pub struct Graphics {
    backend: Box<dyn GpuBackend>,
    registry: ResourceRegistry,

    width: u32,
    height: u32,
    vsync: bool,
    msaa: MsaaLevel,
    reset_flags: ResetFlags,
    flags_changed: bool,

    render_state: RenderState,
    current_view: ViewId,
    draw_texture: Texture2D,
    primitive_texture: Texture2D,
    default_shader: Shader,

    shut_down: bool,
}

impl Graphics {
    /// Creates the context and its default resources (white 1x1 texture, base shader).
    pub fn new(backend: Box<dyn GpuBackend>, settings: GraphicsSettings) -> Result<Self, GraphicsError> {
        let mut registry = ResourceRegistry::new();
        let mut backend = backend;

        let primitive_texture = create_texture_in(
            backend.as_mut(),
            &mut registry,
            "PrimitiveTexture",
            &Pixmap::filled(1, 1, Color::WHITE),
            false,
            TextureFilter::Nearest,
        )?;

        let mut default_shader = create_shader_in(
            backend.as_mut(),
            &mut registry,
            "BaseShader",
            BASE_SHADER_WGSL,
            &["s_texColor"],
            &["u_tint"],
        )?;
        default_shader.require_param("u_tint")?.set_color(Color::WHITE);

        let mut gfx = Self {
            backend,
            registry,
            width: settings.width,
            height: settings.height,
            vsync: settings.vsync,
            msaa: settings.msaa,
            reset_flags: ResetFlags::empty(),
            flags_changed: false,
            render_state: RenderState::default(),
            current_view: ViewId::default(),
            draw_texture: primitive_texture,
            primitive_texture,
            default_shader,
            shut_down: false,
        };
        gfx.update_reset_flags();

        log::info!(
            "graphics initialized ({}x{}, vsync: {}, msaa: {:?})",
            gfx.width,
            gfx.height,
            gfx.vsync,
            gfx.msaa
        );

        Ok(gfx)
    }

    // ── settings ──────────────────────────────────────────────────────────

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        if self.vsync != vsync {
            self.vsync = vsync;
            self.update_reset_flags();
        }
    }

    pub fn msaa(&self) -> MsaaLevel {
        self.msaa
    }

    pub fn set_msaa(&mut self, msaa: MsaaLevel) {
        if self.msaa != msaa {
            self.msaa = msaa;
            self.update_reset_flags();
        }
    }

    pub fn reset_flags(&self) -> ResetFlags {
        self.reset_flags
    }

    pub fn set_backbuffer_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.flags_changed = true;
    }

    fn update_reset_flags(&mut self) {
        let mut flags = self.msaa.reset_flags();
        if self.vsync {
            flags |= ResetFlags::VSYNC;
        }
        self.reset_flags = flags;
        self.flags_changed = true;
    }

    // ── draw state ────────────────────────────────────────────────────────

    pub fn current_view(&self) -> ViewId {
        self.current_view
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    pub fn primitive_texture(&self) -> &Texture2D {
        &self.primitive_texture
    }

    pub fn draw_texture(&self) -> &Texture2D {
        &self.draw_texture
    }

    pub fn default_shader(&self) -> &Shader {
        &self.default_shader
    }

    pub fn default_shader_mut(&mut self) -> &mut Shader {
        &mut self.default_shader
    }

    /// Full-backbuffer 2D view with a black clear.
    pub fn create_default_view(&self) -> RenderView {
        RenderView::ortho_2d(self.width, self.height)
    }

    /// Makes `view` current and configures it on the backend.
    pub fn apply_render_view(&mut self, view: &RenderView) {
        let id = view.id();
        self.current_view = id;
        self.backend.set_view_clear(
            id,
            ViewClear {
                flags: ClearFlags::COLOR | ClearFlags::DEPTH,
                color: view.clear_color,
                depth: 1.0,
                stencil: 0,
            },
        );
        self.backend.set_view_rect(id, view.viewport);
        self.backend.set_view_scissor(id, view.viewport);
        self.backend.set_view_transform(id, view.view, view.projection);
        self.backend.touch(id);
    }

    pub fn apply_render_state(&mut self, state: RenderState) {
        self.render_state = state;
    }

    /// Sets the texture bound to slot 0 by the next draws; `None` selects the
    /// white primitive texture.
    pub fn set_texture(&mut self, texture: Option<&Texture2D>) {
        self.draw_texture = texture.copied().unwrap_or(self.primitive_texture);
    }

    /// Submits `mesh` to the current view with the current state and draw texture.
    ///
    /// Empty meshes are skipped. `None` uses the default shader.
    pub fn draw(
        &mut self,
        mesh: &dyn Mesh,
        shader: Option<&mut Shader>,
        primitive: PrimitiveType,
    ) -> Result<(), GraphicsError> {
        if mesh.vertex_count() == 0 {
            return Ok(());
        }

        let flags = self.render_state.flags().with_primitive(primitive);
        let texture = self.draw_texture;
        let shader = match shader {
            Some(s) => s,
            None => &mut self.default_shader,
        };

        if !shader.samplers().is_empty() {
            shader.set_texture(0, &texture)?;
        }
        shader.apply(self.backend.as_mut())?;
        mesh.submit(self.backend.as_mut());
        self.backend.set_state(flags);
        self.backend
            .submit(self.current_view, shader.program(), 0, DiscardFlags::ALL);
        Ok(())
    }

    /// Ends the frame, then applies pending backbuffer changes.
    pub fn frame(&mut self) -> Result<(), GraphicsError> {
        if self.shut_down {
            return Err(GraphicsError::ShutDown);
        }
        self.backend.frame()?;
        if self.flags_changed {
            self.flags_changed = false;
            log::debug!(
                "resetting backbuffer to {}x{} ({:?})",
                self.width,
                self.height,
                self.reset_flags
            );
            self.backend.reset(self.width, self.height, self.reset_flags);
        }
        Ok(())
    }

    // ── resources ─────────────────────────────────────────────────────────

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn backend_mut(&mut self) -> &mut dyn GpuBackend {
        self.backend.as_mut()
    }

    pub fn create_vertex_buffer(&mut self, id: &str, vertices: &[VertexPCT]) -> VertexBuffer {
        let handle = self
            .backend
            .create_vertex_buffer(id, bytemuck::cast_slice(vertices), VertexPCT::STRIDE);
        let key = self.registry.register(id, ResourceKind::VertexBuffer(handle));
        VertexBuffer { key, handle, vertex_count: vertices.len() as u32 }
    }

    pub fn create_index_buffer(&mut self, id: &str, indices: &[u16]) -> IndexBuffer {
        let handle = self.backend.create_index_buffer(id, indices);
        let key = self.registry.register(id, ResourceKind::IndexBuffer(handle));
        IndexBuffer { key, handle, index_count: indices.len() as u32 }
    }

    pub fn create_dynamic_vertex_buffer(&mut self, id: &str, vertex_count: u32) -> DynamicVertexBuffer {
        let handle = self
            .backend
            .create_dynamic_vertex_buffer(id, vertex_count, VertexPCT::STRIDE);
        let key = self.registry.register(id, ResourceKind::DynamicVertexBuffer(handle));
        DynamicVertexBuffer { key, handle, capacity: vertex_count }
    }

    pub fn update_dynamic_vertex_buffer(
        &mut self,
        buffer: &DynamicVertexBuffer,
        start_vertex: u32,
        vertices: &[VertexPCT],
    ) {
        self.backend
            .update_dynamic_vertex_buffer(buffer.handle, start_vertex, bytemuck::cast_slice(vertices));
    }

    pub fn create_dynamic_index_buffer(&mut self, id: &str, index_count: u32) -> DynamicIndexBuffer {
        let handle = self.backend.create_dynamic_index_buffer(id, index_count);
        let key = self.registry.register(id, ResourceKind::DynamicIndexBuffer(handle));
        DynamicIndexBuffer { key, handle, capacity: index_count }
    }

    pub fn update_dynamic_index_buffer(&mut self, buffer: &DynamicIndexBuffer, start_index: u32, indices: &[u16]) {
        self.backend
            .update_dynamic_index_buffer(buffer.handle, start_index, indices);
    }

    /// Binds a dynamic index range for the next submit.
    pub fn set_dynamic_index_buffer(&mut self, buffer: &DynamicIndexBuffer, range: BufferRange) {
        self.backend.set_dynamic_index_buffer(buffer.handle, range);
    }

    pub fn create_static_mesh(&mut self, id: &str, vertices: &[VertexPCT], indices: Option<&[u16]>) -> StaticMesh {
        let vb = self.create_vertex_buffer(&format!("{id}_vb"), vertices);
        let ib = indices.map(|i| self.create_index_buffer(&format!("{id}_ib"), i));
        StaticMesh::new(vb, ib)
    }

    /// Dynamic mesh holding up to `max_quads` quads, with a shared quad index list.
    pub fn create_dynamic_mesh(&mut self, id: &str, max_quads: u32) -> DynamicMesh {
        let indices = quad_indices(max_quads);
        let quads = indices.len() as u32 / 6;
        let vb = self.create_dynamic_vertex_buffer(&format!("{id}_vb"), quads * 4);
        let ib = self.create_index_buffer(&format!("{id}_ib"), &indices);
        DynamicMesh::new(vb, Some(ib))
    }

    pub fn create_texture(
        &mut self,
        id: &str,
        pixmap: &Pixmap,
        tiled: bool,
        filter: TextureFilter,
    ) -> Result<Texture2D, GraphicsError> {
        create_texture_in(self.backend.as_mut(), &mut self.registry, id, pixmap, tiled, filter)
    }

    /// Compiles a WGSL program with the given sampler slots and vec4 parameters.
    pub fn create_shader(
        &mut self,
        id: &str,
        wgsl: &str,
        samplers: &[&str],
        params: &[&str],
    ) -> Result<Shader, GraphicsError> {
        create_shader_in(self.backend.as_mut(), &mut self.registry, id, wgsl, samplers, params)
    }

    /// Frees one registered resource. Returns `false` if it was already freed.
    pub fn free_resource(&mut self, key: ResourceKey) -> bool {
        self.registry.free(key, self.backend.as_mut())
    }

    /// Releases every registered resource and the backend. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        log::info!("graphics shutdown");
        let freed = self.registry.shutdown_all(self.backend.as_mut());
        log::debug!("released {freed} render resources");
        self.backend.shutdown();
        self.shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn create_texture_in(
    backend: &mut dyn GpuBackend,
    registry: &mut ResourceRegistry,
    id: &str,
    pixmap: &Pixmap,
    tiled: bool,
    filter: TextureFilter,
) -> Result<Texture2D, GraphicsError> {
    let flags = sampler_flags(tiled, filter);
    let handle = backend.create_texture(id, pixmap.width(), pixmap.height(), flags, pixmap.data())?;
    let key = registry.register(id, ResourceKind::Texture(handle));
    Ok(Texture2D::new(key, handle, pixmap.width(), pixmap.height(), flags))
}

fn create_shader_in(
    backend: &mut dyn GpuBackend,
    registry: &mut ResourceRegistry,
    id: &str,
    wgsl: &str,
    samplers: &[&str],
    params: &[&str],
) -> Result<Shader, GraphicsError> {
    if wgsl.trim().is_empty() {
        return Err(GraphicsError::EmptyShaderSource(id.to_owned()));
    }

    let sampler_decls: Vec<SamplerDecl> = samplers
        .iter()
        .map(|name| SamplerDecl {
            name: (*name).to_owned(),
            handle: backend.create_uniform(name, UniformKind::Sampler),
        })
        .collect();
    let param_decls: Vec<ParamDecl> = params
        .iter()
        .map(|name| ParamDecl {
            name: (*name).to_owned(),
            handle: backend.create_uniform(name, UniformKind::Vec4),
        })
        .collect();

    let uniforms: Vec<_> = sampler_decls
        .iter()
        .map(|s| s.handle)
        .chain(param_decls.iter().map(|p| p.handle))
        .collect();

    let program = match backend.create_program(id, wgsl, &sampler_decls, &param_decls) {
        Ok(p) => p,
        Err(e) => {
            for u in uniforms {
                backend.destroy_uniform(u);
            }
            return Err(e);
        }
    };

    let key = registry.register(id, ResourceKind::Shader { program, uniforms });
    let samplers = sampler_decls
        .into_iter()
        .map(|d| ShaderSampler::new(d.name, d.handle))
        .collect();
    let params = param_decls
        .into_iter()
        .map(|d| ShaderParameter::new(d.name, d.handle))
        .collect();
    Ok(Shader::new(key, id, program, samplers, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{Rect, ViewRect};
    use crate::render::quad::Quad;
    use crate::render::state::{BlendMode, StateFlags};
    use crate::render::testing::{Call, CallLog, RecordingBackend};

    fn graphics() -> (Graphics, CallLog) {
        let backend = RecordingBackend::new();
        let log = backend.log();
        let gfx = Graphics::new(Box::new(backend), GraphicsSettings::default()).unwrap();
        log.clear();
        (gfx, log)
    }

    // ── init ──────────────────────────────────────────────────────────────

    #[test]
    fn registers_default_resources() {
        let (gfx, _) = graphics();
        assert_eq!(gfx.registry().ids().collect::<Vec<_>>(), ["PrimitiveTexture", "BaseShader"]);
        assert_eq!(gfx.draw_texture(), gfx.primitive_texture());
        assert_eq!(gfx.default_shader().param("u_tint").unwrap().value(), glam::Vec4::ONE);
    }

    #[test]
    fn program_failure_releases_uniforms() {
        let mut backend = RecordingBackend::new();
        backend.fail_programs = true;
        let log = backend.log();
        let err = Graphics::new(Box::new(backend), GraphicsSettings::default()).err();
        assert!(matches!(err, Some(GraphicsError::ProgramCreation { .. })));
        assert_eq!(log.count(|c| matches!(c, Call::DestroyUniform(_))), 2);
    }

    #[test]
    fn empty_shader_source_rejected() {
        let (mut gfx, log) = graphics();
        let err = gfx.create_shader("empty", "  ", &[], &[]).unwrap_err();
        assert!(matches!(err, GraphicsError::EmptyShaderSource(_)));
        assert!(log.calls().is_empty());
    }

    // ── views ─────────────────────────────────────────────────────────────

    #[test]
    fn apply_render_view_configures_backend() {
        let (mut gfx, log) = graphics();
        let view = gfx.create_default_view().with_clear_color(Color::BLUE);
        gfx.apply_render_view(&view);

        let id = view.id();
        assert_eq!(gfx.current_view(), id);
        let calls = log.calls();
        assert_eq!(
            calls[0],
            Call::ViewClear(
                id,
                ViewClear {
                    flags: ClearFlags::COLOR | ClearFlags::DEPTH,
                    color: Color::BLUE,
                    depth: 1.0,
                    stencil: 0,
                }
            )
        );
        assert_eq!(calls[1], Call::ViewRect(id, ViewRect::from_size(640, 480)));
        assert_eq!(calls[2], Call::ViewScissor(id, ViewRect::from_size(640, 480)));
        assert!(matches!(calls[3], Call::ViewTransform(v, _, _) if v == id));
        assert_eq!(calls[4], Call::Touch(id));
    }

    // ── draw ──────────────────────────────────────────────────────────────

    #[test]
    fn draw_skips_empty_mesh() {
        let (mut gfx, log) = graphics();
        let mesh = gfx.create_dynamic_mesh("m", 4);
        log.clear();
        gfx.draw(&mesh, None, PrimitiveType::Triangles).unwrap();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn draw_binds_texture_state_and_submits() {
        let (mut gfx, log) = graphics();
        let tex = gfx
            .create_texture("t", &Pixmap::new(2, 2), false, TextureFilter::Nearest)
            .unwrap();
        let mut mesh = gfx.create_dynamic_mesh("m", 4);
        mesh.push_quad(&Quad::from_rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
        gfx.apply_render_state(RenderState::new(BlendMode::Add));
        gfx.set_texture(Some(&tex));
        log.clear();

        gfx.draw(&mesh, None, PrimitiveType::Lines).unwrap();

        let calls = log.calls();
        assert!(matches!(calls[0], Call::SetTexture(0, _, h) if h == tex.handle()));
        let state = calls.iter().find_map(|c| match c {
            Call::SetState(s) => Some(*s),
            _ => None,
        });
        let expected = RenderState::new(BlendMode::Add).flags() | StateFlags::PT_LINES;
        assert_eq!(state, Some(expected));
        assert!(matches!(
            calls.last(),
            Some(Call::Submit(_, p, DiscardFlags::ALL)) if *p == gfx.default_shader().program()
        ));
    }

    #[test]
    fn set_texture_none_restores_primitive() {
        let (mut gfx, _) = graphics();
        let tex = gfx
            .create_texture("t", &Pixmap::new(1, 1), true, TextureFilter::Linear)
            .unwrap();
        gfx.set_texture(Some(&tex));
        assert_eq!(gfx.draw_texture(), &tex);
        gfx.set_texture(None);
        assert_eq!(gfx.draw_texture(), gfx.primitive_texture());
    }

    // ── frame / reset ─────────────────────────────────────────────────────

    #[test]
    fn reset_applied_once_after_frame() {
        let (mut gfx, log) = graphics();
        gfx.frame().unwrap();
        assert_eq!(log.calls(), vec![Call::Frame, Call::Reset(640, 480, ResetFlags::VSYNC)]);

        log.clear();
        gfx.frame().unwrap();
        assert_eq!(log.calls(), vec![Call::Frame]);

        log.clear();
        gfx.set_vsync(false);
        gfx.set_msaa(MsaaLevel::X4);
        gfx.set_backbuffer_size(800, 600);
        gfx.frame().unwrap();
        assert_eq!(log.calls(), vec![Call::Frame, Call::Reset(800, 600, ResetFlags::MSAA_X4)]);
    }

    #[test]
    fn unchanged_vsync_does_not_reset() {
        let (mut gfx, log) = graphics();
        gfx.frame().unwrap();
        log.clear();
        gfx.set_vsync(true);
        gfx.frame().unwrap();
        assert_eq!(log.calls(), vec![Call::Frame]);
    }

    // ── shutdown ──────────────────────────────────────────────────────────

    #[test]
    fn shutdown_frees_each_resource_once() {
        let (mut gfx, log) = graphics();
        let vb = gfx.create_vertex_buffer("vb", &[VertexPCT::default(); 3]);
        gfx.create_index_buffer("ib", &[0, 1, 2]);
        assert!(gfx.free_resource(vb.key()));
        assert!(!gfx.free_resource(vb.key()));

        gfx.shutdown();
        gfx.shutdown();

        // vb + ib + primitive texture + program + two uniforms
        assert_eq!(log.destroys(), 6);
        assert_eq!(log.count(|c| *c == Call::Shutdown), 1);
        assert!(matches!(gfx.frame(), Err(GraphicsError::ShutDown)));
    }
}
