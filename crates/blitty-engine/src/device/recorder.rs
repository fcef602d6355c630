//! CPU half of the wgpu backend.
//!
//! Collects view setup and draw submissions for one frame. Dynamic buffer
//! contents are copied into per-frame arenas at submit time, so a buffer that is
//! refilled several times per frame (as the canvas batcher does) draws each
//! batch with the data it had when it was submitted.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::coords::ViewRect;
use crate::render::backend::{
    BufferRange, DiscardFlags, DynamicIndexBufferHandle, DynamicVertexBufferHandle, IndexBufferHandle,
    ProgramHandle, TextureHandle, UniformHandle, VertexBufferHandle, ViewClear,
};
use crate::render::{StateFlags, ViewId};

/// Vec4 parameters per draw.
pub const MAX_PARAMS: usize = 16;

/// Texture slots per draw.
pub const MAX_SAMPLERS: usize = 8;

/// Dynamic uniform offsets must be multiples of this.
pub const UNIFORM_ALIGN: u64 = 256;

/// Frames a view may go untouched and undrawn before its setup is dropped.
pub const VIEW_IDLE_FRAMES: u64 = 120;

/// Per-draw uniform block, `DrawUniforms` in WGSL.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct DrawUniforms {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub params: [[f32; 4]; MAX_PARAMS],
}

pub const UNIFORM_BLOCK_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;
pub const UNIFORM_STRIDE: u64 = UNIFORM_BLOCK_SIZE.div_ceil(UNIFORM_ALIGN) * UNIFORM_ALIGN;

/// Submission-relevant shape of a compiled program.
#[derive(Debug, Clone, Default)]
pub struct ProgramLayout {
    pub sampler_count: usize,
    pub params: Vec<UniformHandle>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    pub clear: Option<ViewClear>,
    /// `None` covers the whole backbuffer.
    pub rect: Option<ViewRect>,
    pub scissor: Option<ViewRect>,
    pub view: Mat4,
    pub proj: Mat4,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            clear: None,
            rect: None,
            scissor: None,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexSource {
    Static { handle: VertexBufferHandle, range: BufferRange },
    /// Byte offset into the frame's vertex arena.
    Transient { offset: u64, count: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IndexSource {
    Static { handle: IndexBufferHandle, range: BufferRange },
    /// Byte offset into the frame's index arena.
    Transient { offset: u64, count: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub view: ViewId,
    pub program: ProgramHandle,
    pub depth: u32,
    pub state: StateFlags,
    pub textures: Vec<TextureHandle>,
    pub vertex: VertexSource,
    pub index: Option<IndexSource>,
    pub uniform_offset: u32,
}

/// One render pass worth of draws.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPass {
    pub id: ViewId,
    pub state: ViewState,
    pub draws: Range<usize>,
}

/// Everything needed to encode one frame.
#[derive(Debug, Default)]
pub struct FramePlan {
    pub passes: Vec<ViewPass>,
    pub draws: Vec<RecordedDraw>,
    pub vertex_bytes: Vec<u8>,
    pub index_bytes: Vec<u8>,
    pub uniform_bytes: Vec<u8>,
}

#[derive(Debug, Copy, Clone)]
enum BoundVertex {
    Static(VertexBufferHandle, BufferRange),
    Dynamic(DynamicVertexBufferHandle, BufferRange),
}

#[derive(Debug, Copy, Clone)]
enum BoundIndex {
    Static(IndexBufferHandle, BufferRange),
    Dynamic(DynamicIndexBufferHandle, BufferRange),
}

#[derive(Debug, Clone)]
struct Pending {
    state: StateFlags,
    textures: [Option<TextureHandle>; MAX_SAMPLERS],
    vertex: Option<BoundVertex>,
    index: Option<BoundIndex>,
}

impl Default for Pending {
    fn default() -> Self {
        Self {
            state: StateFlags::BASE,
            textures: [None; MAX_SAMPLERS],
            vertex: None,
            index: None,
        }
    }
}

#[derive(Debug)]
struct VertexShadow {
    stride: u32,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct FrameRecorder {
    views: BTreeMap<ViewId, ViewState>,
    view_last_used: HashMap<ViewId, u64>,
    touched: BTreeSet<ViewId>,
    frame: u64,
    pending: Pending,
    uniforms: HashMap<UniformHandle, Vec4>,

    dyn_vertices: HashMap<DynamicVertexBufferHandle, VertexShadow>,
    dyn_indices: HashMap<DynamicIndexBufferHandle, Vec<u16>>,

    draws: Vec<RecordedDraw>,
    vertex_arena: Vec<u8>,
    index_arena: Vec<u8>,
    uniform_arena: Vec<u8>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── dynamic buffer shadows ────────────────────────────────────────────

    pub fn add_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle, vertex_count: u32, stride: u32) {
        let data = vec![0; vertex_count as usize * stride as usize];
        self.dyn_vertices.insert(handle, VertexShadow { stride, data });
    }

    pub fn update_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle, start_vertex: u32, data: &[u8]) {
        let Some(shadow) = self.dyn_vertices.get_mut(&handle) else {
            log::warn!("update of unknown dynamic vertex buffer {handle:?}");
            return;
        };
        let start = start_vertex as usize * shadow.stride as usize;
        let end = start + data.len();
        if end > shadow.data.len() {
            log::warn!(
                "dynamic vertex buffer {handle:?} overflow ({end} > {} bytes); update dropped",
                shadow.data.len()
            );
            return;
        }
        shadow.data[start..end].copy_from_slice(data);
    }

    pub fn remove_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle) {
        self.dyn_vertices.remove(&handle);
    }

    pub fn add_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, index_count: u32) {
        self.dyn_indices.insert(handle, vec![0; index_count as usize]);
    }

    pub fn update_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, start_index: u32, indices: &[u16]) {
        let Some(shadow) = self.dyn_indices.get_mut(&handle) else {
            log::warn!("update of unknown dynamic index buffer {handle:?}");
            return;
        };
        let start = start_index as usize;
        let end = start + indices.len();
        if end > shadow.len() {
            log::warn!("dynamic index buffer {handle:?} overflow ({end} > {}); update dropped", shadow.len());
            return;
        }
        shadow[start..end].copy_from_slice(indices);
    }

    pub fn remove_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle) {
        self.dyn_indices.remove(&handle);
    }

    pub fn remove_uniform(&mut self, handle: UniformHandle) {
        self.uniforms.remove(&handle);
    }

    // ── views ─────────────────────────────────────────────────────────────

    fn view_mut(&mut self, id: ViewId) -> &mut ViewState {
        self.view_last_used.insert(id, self.frame);
        self.views.entry(id).or_default()
    }

    /// Views with retained setup.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn set_view_clear(&mut self, id: ViewId, clear: ViewClear) {
        self.view_mut(id).clear = Some(clear);
    }

    pub fn set_view_rect(&mut self, id: ViewId, rect: ViewRect) {
        self.view_mut(id).rect = Some(rect);
    }

    pub fn set_view_scissor(&mut self, id: ViewId, rect: ViewRect) {
        self.view_mut(id).scissor = Some(rect);
    }

    pub fn set_view_transform(&mut self, id: ViewId, view: Mat4, proj: Mat4) {
        let v = self.view_mut(id);
        v.view = view;
        v.proj = proj;
    }

    pub fn touch(&mut self, id: ViewId) {
        self.view_mut(id);
        self.touched.insert(id);
    }

    // ── submission state ──────────────────────────────────────────────────

    pub fn set_state(&mut self, state: StateFlags) {
        self.pending.state = state;
    }

    pub fn set_texture(&mut self, slot: u8, texture: TextureHandle) {
        match self.pending.textures.get_mut(slot as usize) {
            Some(s) => *s = Some(texture),
            None => log::warn!("texture slot {slot} out of range (max {MAX_SAMPLERS})"),
        }
    }

    pub fn set_uniform(&mut self, uniform: UniformHandle, value: Vec4) {
        self.uniforms.insert(uniform, value);
    }

    pub fn set_vertex_buffer(&mut self, handle: VertexBufferHandle, range: BufferRange) {
        self.pending.vertex = Some(BoundVertex::Static(handle, range));
    }

    pub fn set_dynamic_vertex_buffer(&mut self, handle: DynamicVertexBufferHandle, range: BufferRange) {
        self.pending.vertex = Some(BoundVertex::Dynamic(handle, range));
    }

    pub fn set_index_buffer(&mut self, handle: IndexBufferHandle, range: BufferRange) {
        self.pending.index = Some(BoundIndex::Static(handle, range));
    }

    pub fn set_dynamic_index_buffer(&mut self, handle: DynamicIndexBufferHandle, range: BufferRange) {
        self.pending.index = Some(BoundIndex::Dynamic(handle, range));
    }

    /// Records a draw from the pending state. Returns whether a draw was recorded.
    pub fn submit(
        &mut self,
        view: ViewId,
        program: ProgramHandle,
        layout: &ProgramLayout,
        depth: u32,
        discard: DiscardFlags,
    ) -> bool {
        let recorded = self.record(view, program, layout, depth);
        self.discard(discard);
        recorded
    }

    fn record(&mut self, view: ViewId, program: ProgramHandle, layout: &ProgramLayout, depth: u32) -> bool {
        let Some(bound_vertex) = self.pending.vertex else {
            log::warn!("submit to {view:?} without a vertex buffer; draw dropped");
            return false;
        };

        let mut textures = Vec::with_capacity(layout.sampler_count);
        for slot in 0..layout.sampler_count.min(MAX_SAMPLERS) {
            match self.pending.textures[slot] {
                Some(t) => textures.push(t),
                None => {
                    log::warn!("submit of {program:?} with no texture in slot {slot}; draw dropped");
                    return false;
                }
            }
        }

        let Some(vertex) = self.snapshot_vertices(bound_vertex) else {
            return false;
        };
        let index = match self.pending.index {
            Some(bound) => match self.snapshot_indices(bound) {
                Some(i) => Some(i),
                None => return false,
            },
            None => None,
        };

        let uniform_offset = self.push_uniforms(view, layout);

        self.view_mut(view);
        self.draws.push(RecordedDraw {
            view,
            program,
            depth,
            state: self.pending.state,
            textures,
            vertex,
            index,
            uniform_offset,
        });
        true
    }

    fn snapshot_vertices(&mut self, bound: BoundVertex) -> Option<VertexSource> {
        match bound {
            BoundVertex::Static(handle, range) => Some(VertexSource::Static { handle, range }),
            BoundVertex::Dynamic(handle, range) => {
                let shadow = self.dyn_vertices.get(&handle)?;
                let stride = shadow.stride as usize;
                let start = range.start as usize * stride;
                let end = start + range.count as usize * stride;
                let Some(bytes) = shadow.data.get(start..end) else {
                    log::warn!("vertex range {range:?} outside {handle:?}; draw dropped");
                    return None;
                };
                let offset = self.vertex_arena.len() as u64;
                self.vertex_arena.extend_from_slice(bytes);
                Some(VertexSource::Transient { offset, count: range.count })
            }
        }
    }

    fn snapshot_indices(&mut self, bound: BoundIndex) -> Option<IndexSource> {
        match bound {
            BoundIndex::Static(handle, range) => Some(IndexSource::Static { handle, range }),
            BoundIndex::Dynamic(handle, range) => {
                let shadow = self.dyn_indices.get(&handle)?;
                let start = range.start as usize;
                let Some(indices) = shadow.get(start..start + range.count as usize) else {
                    log::warn!("index range {range:?} outside {handle:?}; draw dropped");
                    return None;
                };
                pad_to_four(&mut self.index_arena);
                let offset = self.index_arena.len() as u64;
                self.index_arena.extend_from_slice(bytemuck::cast_slice(indices));
                Some(IndexSource::Transient { offset, count: range.count })
            }
        }
    }

    fn push_uniforms(&mut self, view: ViewId, layout: &ProgramLayout) -> u32 {
        let vs = self.views.get(&view).copied().unwrap_or_default();

        let mut block = DrawUniforms {
            view: vs.view.to_cols_array_2d(),
            proj: vs.proj.to_cols_array_2d(),
            params: [[0.0; 4]; MAX_PARAMS],
        };
        for (dst, handle) in block.params.iter_mut().zip(&layout.params) {
            *dst = self.uniforms.get(handle).copied().unwrap_or(Vec4::ZERO).to_array();
        }

        let offset = self.uniform_arena.len();
        self.uniform_arena.extend_from_slice(bytemuck::bytes_of(&block));
        self.uniform_arena.resize(offset + UNIFORM_STRIDE as usize, 0);
        offset as u32
    }

    pub fn discard(&mut self, discard: DiscardFlags) {
        if discard.contains(DiscardFlags::STATE) {
            self.pending.state = StateFlags::BASE;
        }
        if discard.contains(DiscardFlags::BINDINGS) {
            self.pending.textures = [None; MAX_SAMPLERS];
        }
        if discard.contains(DiscardFlags::VERTEX_STREAMS) {
            self.pending.vertex = None;
        }
        if discard.contains(DiscardFlags::INDEX_BUFFER) {
            self.pending.index = None;
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Number of draws recorded since the last [`finish_frame`](Self::finish_frame).
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Drains the frame: one pass per touched or drawn view, in ascending id
    /// order; draws within a view ordered by depth, then submission order.
    pub fn finish_frame(&mut self) -> FramePlan {
        let mut draws = std::mem::take(&mut self.draws);
        draws.sort_by_key(|d| (d.view, d.depth));

        let mut ids: BTreeSet<ViewId> = std::mem::take(&mut self.touched);
        ids.extend(draws.iter().map(|d| d.view));
        for &id in &ids {
            self.view_last_used.insert(id, self.frame);
        }

        let mut passes = Vec::with_capacity(ids.len());
        let mut cursor = 0;
        for id in ids {
            let start = cursor;
            while cursor < draws.len() && draws[cursor].view == id {
                cursor += 1;
            }
            passes.push(ViewPass {
                id,
                state: self.views.get(&id).copied().unwrap_or_default(),
                draws: start..cursor,
            });
        }

        self.evict_idle_views();
        self.frame += 1;

        let mut index_bytes = std::mem::take(&mut self.index_arena);
        pad_to_four(&mut index_bytes);

        FramePlan {
            passes,
            draws,
            vertex_bytes: std::mem::take(&mut self.vertex_arena),
            index_bytes,
            uniform_bytes: std::mem::take(&mut self.uniform_arena),
        }
    }

    fn evict_idle_views(&mut self) {
        let frame = self.frame;
        self.view_last_used
            .retain(|_, last| frame - *last < VIEW_IDLE_FRAMES);
        let live = &self.view_last_used;
        let before = self.views.len();
        self.views.retain(|id, _| live.contains_key(id));
        if self.views.len() < before {
            log::debug!("dropped {} idle render views", before - self.views.len());
        }
    }

    /// Forgets everything, e.g. on shutdown.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn pad_to_four(bytes: &mut Vec<u8>) {
    let padded = bytes.len().next_multiple_of(4);
    bytes.resize(padded, 0);
}
