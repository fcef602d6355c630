//! Recording backend used by unit tests across the crate.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use super::backend::*;
use super::error::GraphicsError;
use super::state::StateFlags;
use super::view::ViewId;
use crate::coords::ViewRect;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVertexBuffer(VertexBufferHandle, usize),
    DestroyVertexBuffer(VertexBufferHandle),
    CreateIndexBuffer(IndexBufferHandle, Vec<u16>),
    DestroyIndexBuffer(IndexBufferHandle),
    CreateDynamicVertexBuffer(DynamicVertexBufferHandle, u32),
    UpdateDynamicVertexBuffer(DynamicVertexBufferHandle, u32, usize),
    DestroyDynamicVertexBuffer(DynamicVertexBufferHandle),
    CreateDynamicIndexBuffer(DynamicIndexBufferHandle, u32),
    UpdateDynamicIndexBuffer(DynamicIndexBufferHandle, u32, usize),
    DestroyDynamicIndexBuffer(DynamicIndexBufferHandle),
    CreateTexture(TextureHandle, u32, u32, SamplerFlags),
    DestroyTexture(TextureHandle),
    CreateUniform(UniformHandle, String),
    DestroyUniform(UniformHandle),
    CreateProgram(ProgramHandle, String),
    DestroyProgram(ProgramHandle),
    ViewClear(ViewId, ViewClear),
    ViewRect(ViewId, ViewRect),
    ViewScissor(ViewId, ViewRect),
    ViewTransform(ViewId, Mat4, Mat4),
    Touch(ViewId),
    SetState(StateFlags),
    SetTexture(u8, UniformHandle, TextureHandle),
    SetUniform(UniformHandle, Vec4),
    SetVertexBuffer(u8, VertexBufferHandle, BufferRange),
    SetDynamicVertexBuffer(u8, DynamicVertexBufferHandle, BufferRange),
    SetIndexBuffer(IndexBufferHandle, BufferRange),
    SetDynamicIndexBuffer(DynamicIndexBufferHandle, BufferRange),
    Submit(ViewId, ProgramHandle, DiscardFlags),
    Frame,
    Reset(u32, u32, ResetFlags),
    Shutdown,
}

impl Call {
    pub fn is_destroy(&self) -> bool {
        matches!(
            self,
            Call::DestroyVertexBuffer(_)
                | Call::DestroyIndexBuffer(_)
                | Call::DestroyDynamicVertexBuffer(_)
                | Call::DestroyDynamicIndexBuffer(_)
                | Call::DestroyTexture(_)
                | Call::DestroyUniform(_)
                | Call::DestroyProgram(_)
        )
    }
}

/// Shared view of the calls a [`RecordingBackend`] received.
///
/// Clone it before boxing the backend into `Graphics`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn submits(&self) -> usize {
        self.count(|c| matches!(c, Call::Submit(..)))
    }

    pub fn destroys(&self) -> usize {
        self.count(Call::is_destroy)
    }

    /// Vertex counts bound by each submitted draw, in submission order.
    pub fn submitted_vertex_counts(&self) -> Vec<u32> {
        let mut bound = 0;
        let mut out = Vec::new();
        for call in self.0.borrow().iter() {
            match call {
                Call::SetDynamicVertexBuffer(_, _, range) | Call::SetVertexBuffer(_, _, range) => {
                    bound = range.count
                }
                Call::Submit(..) => out.push(bound),
                _ => {}
            }
        }
        out
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Backend that hands out sequential handles and records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: CallLog,
    next_handle: u32,
    pub fail_programs: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl GpuBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, _label: &str, data: &[u8], _stride: u32) -> VertexBufferHandle {
        let h = VertexBufferHandle(self.next());
        self.log.push(Call::CreateVertexBuffer(h, data.len()));
        h
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.log.push(Call::DestroyVertexBuffer(handle));
    }

    fn create_index_buffer(&mut self, _label: &str, indices: &[u16]) -> IndexBufferHandle {
        let h = IndexBufferHandle(self.next());
        self.log.push(Call::CreateIndexBuffer(h, indices.to_vec()));
        h
    }

    fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.log.push(Call::DestroyIndexBuffer(handle));
    }

    fn create_dynamic_vertex_buffer(
        &mut self,
        _label: &str,
        vertex_count: u32,
        _stride: u32,
    ) -> DynamicVertexBufferHandle {
        let h = DynamicVertexBufferHandle(self.next());
        self.log.push(Call::CreateDynamicVertexBuffer(h, vertex_count));
        h
    }

    fn update_dynamic_vertex_buffer(
        &mut self,
        handle: DynamicVertexBufferHandle,
        start_vertex: u32,
        data: &[u8],
    ) {
        self.log.push(Call::UpdateDynamicVertexBuffer(handle, start_vertex, data.len()));
    }

    fn destroy_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle) {
        self.log.push(Call::DestroyDynamicVertexBuffer(handle));
    }

    fn create_dynamic_index_buffer(
        &mut self,
        _label: &str,
        index_count: u32,
    ) -> DynamicIndexBufferHandle {
        let h = DynamicIndexBufferHandle(self.next());
        self.log.push(Call::CreateDynamicIndexBuffer(h, index_count));
        h
    }

    fn update_dynamic_index_buffer(
        &mut self,
        handle: DynamicIndexBufferHandle,
        start_index: u32,
        indices: &[u16],
    ) {
        self.log.push(Call::UpdateDynamicIndexBuffer(handle, start_index, indices.len()));
    }

    fn destroy_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle) {
        self.log.push(Call::DestroyDynamicIndexBuffer(handle));
    }

    fn create_texture(
        &mut self,
        _label: &str,
        width: u32,
        height: u32,
        flags: SamplerFlags,
        _rgba: &[u8],
    ) -> Result<TextureHandle, GraphicsError> {
        let h = TextureHandle(self.next());
        self.log.push(Call::CreateTexture(h, width, height, flags));
        Ok(h)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.log.push(Call::DestroyTexture(handle));
    }

    fn create_uniform(&mut self, name: &str, _kind: UniformKind) -> UniformHandle {
        let h = UniformHandle(self.next());
        self.log.push(Call::CreateUniform(h, name.to_owned()));
        h
    }

    fn destroy_uniform(&mut self, handle: UniformHandle) {
        self.log.push(Call::DestroyUniform(handle));
    }

    fn create_program(
        &mut self,
        label: &str,
        _wgsl: &str,
        _samplers: &[SamplerDecl],
        _params: &[ParamDecl],
    ) -> Result<ProgramHandle, GraphicsError> {
        if self.fail_programs {
            return Err(GraphicsError::ProgramCreation {
                label: label.to_owned(),
                message: "rejected by test backend".to_owned(),
            });
        }
        let h = ProgramHandle(self.next());
        self.log.push(Call::CreateProgram(h, label.to_owned()));
        Ok(h)
    }

    fn destroy_program(&mut self, handle: ProgramHandle) {
        self.log.push(Call::DestroyProgram(handle));
    }

    fn set_view_clear(&mut self, view: ViewId, clear: ViewClear) {
        self.log.push(Call::ViewClear(view, clear));
    }

    fn set_view_rect(&mut self, view: ViewId, rect: ViewRect) {
        self.log.push(Call::ViewRect(view, rect));
    }

    fn set_view_scissor(&mut self, view: ViewId, rect: ViewRect) {
        self.log.push(Call::ViewScissor(view, rect));
    }

    fn set_view_transform(&mut self, view: ViewId, view_matrix: Mat4, projection: Mat4) {
        self.log.push(Call::ViewTransform(view, view_matrix, projection));
    }

    fn touch(&mut self, view: ViewId) {
        self.log.push(Call::Touch(view));
    }

    fn set_state(&mut self, state: StateFlags) {
        self.log.push(Call::SetState(state));
    }

    fn set_texture(&mut self, slot: u8, sampler: UniformHandle, texture: TextureHandle) {
        self.log.push(Call::SetTexture(slot, sampler, texture));
    }

    fn set_uniform(&mut self, uniform: UniformHandle, value: Vec4) {
        self.log.push(Call::SetUniform(uniform, value));
    }

    fn set_vertex_buffer(&mut self, stream: u8, handle: VertexBufferHandle, range: BufferRange) {
        self.log.push(Call::SetVertexBuffer(stream, handle, range));
    }

    fn set_dynamic_vertex_buffer(
        &mut self,
        stream: u8,
        handle: DynamicVertexBufferHandle,
        range: BufferRange,
    ) {
        self.log.push(Call::SetDynamicVertexBuffer(stream, handle, range));
    }

    fn set_index_buffer(&mut self, handle: IndexBufferHandle, range: BufferRange) {
        self.log.push(Call::SetIndexBuffer(handle, range));
    }

    fn set_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, range: BufferRange) {
        self.log.push(Call::SetDynamicIndexBuffer(handle, range));
    }

    fn submit(&mut self, view: ViewId, program: ProgramHandle, _depth: u32, discard: DiscardFlags) {
        self.log.push(Call::Submit(view, program, discard));
    }

    fn frame(&mut self) -> Result<(), GraphicsError> {
        self.log.push(Call::Frame);
        Ok(())
    }

    fn reset(&mut self, width: u32, height: u32, flags: ResetFlags) {
        self.log.push(Call::Reset(width, height, flags));
    }

    fn shutdown(&mut self) {
        self.log.push(Call::Shutdown);
    }
}
