//! Render state bits to wgpu pipeline state.

use crate::render::backend::ProgramHandle;
use crate::render::state::{BlendFactor, CullMode, DepthTest, PrimitiveType, StateFlags};
use crate::render::VertexPCT;

use super::gpu::DEPTH_FORMAT;

/// Everything a render pipeline is specialised on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramHandle,
    pub state: StateFlags,
    pub format: wgpu::TextureFormat,
    pub sample_count: u32,
}

impl PipelineKey {
    pub fn new(program: ProgramHandle, state: StateFlags, format: wgpu::TextureFormat, sample_count: u32) -> Self {
        Self {
            program,
            state: pipeline_bits(state),
            format,
            sample_count,
        }
    }
}

/// Drops bits that do not influence pipeline creation.
fn pipeline_bits(state: StateFlags) -> StateFlags {
    state.difference(StateFlags::MSAA)
}

pub fn blend_factor(f: BlendFactor) -> wgpu::BlendFactor {
    match f {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::InvSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::InvSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::InvDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::InvDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::SrcAlphaSat => wgpu::BlendFactor::SrcAlphaSaturated,
        BlendFactor::Factor => wgpu::BlendFactor::Constant,
        BlendFactor::InvFactor => wgpu::BlendFactor::OneMinusConstant,
    }
}

pub fn blend_state(state: StateFlags) -> Option<wgpu::BlendState> {
    let f = state.blend_factors()?;
    Some(wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: blend_factor(f.src_rgb),
            dst_factor: blend_factor(f.dst_rgb),
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: blend_factor(f.src_alpha),
            dst_factor: blend_factor(f.dst_alpha),
            operation: wgpu::BlendOperation::Add,
        },
    })
}

pub fn color_writes(state: StateFlags) -> wgpu::ColorWrites {
    let mut w = wgpu::ColorWrites::empty();
    w.set(wgpu::ColorWrites::RED, state.contains(StateFlags::WRITE_R));
    w.set(wgpu::ColorWrites::GREEN, state.contains(StateFlags::WRITE_G));
    w.set(wgpu::ColorWrites::BLUE, state.contains(StateFlags::WRITE_B));
    w.set(wgpu::ColorWrites::ALPHA, state.contains(StateFlags::WRITE_A));
    w
}

pub fn depth_compare(test: Option<DepthTest>) -> wgpu::CompareFunction {
    match test {
        None | Some(DepthTest::Always) => wgpu::CompareFunction::Always,
        Some(DepthTest::Less) => wgpu::CompareFunction::Less,
        Some(DepthTest::LessEqual) => wgpu::CompareFunction::LessEqual,
        Some(DepthTest::Equal) => wgpu::CompareFunction::Equal,
        Some(DepthTest::GreaterEqual) => wgpu::CompareFunction::GreaterEqual,
        Some(DepthTest::Greater) => wgpu::CompareFunction::Greater,
        Some(DepthTest::NotEqual) => wgpu::CompareFunction::NotEqual,
        Some(DepthTest::Never) => wgpu::CompareFunction::Never,
    }
}

pub fn depth_stencil(state: StateFlags) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: state.contains(StateFlags::WRITE_Z),
        depth_compare: depth_compare(state.depth_test()),
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

pub fn primitive_state(state: StateFlags) -> wgpu::PrimitiveState {
    let primitive = state.primitive();
    let topology = match primitive {
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveType::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveType::Points => wgpu::PrimitiveTopology::PointList,
    };
    let strip_index_format = matches!(primitive, PrimitiveType::TriangleStrip | PrimitiveType::LineStrip)
        .then_some(wgpu::IndexFormat::Uint16);

    // Front faces are counter-clockwise; culling "clockwise" drops back faces.
    let cull_mode = state.cull().map(|c| match c {
        CullMode::Clockwise => wgpu::Face::Back,
        CullMode::CounterClockwise => wgpu::Face::Front,
    });

    wgpu::PrimitiveState {
        topology,
        strip_index_format,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        unclipped_depth: false,
        polygon_mode: wgpu::PolygonMode::Fill,
        conservative: false,
    }
}

pub fn multisample_state(state: StateFlags, sample_count: u32) -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: sample_count,
        mask: !0,
        alpha_to_coverage_enabled: sample_count > 1 && state.contains(StateFlags::BLEND_ALPHA_TO_COVERAGE),
    }
}

pub fn create_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[VertexPCT::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: blend_state(key.state),
                write_mask: color_writes(key.state),
            })],
            compilation_options: Default::default(),
        }),
        primitive: primitive_state(key.state),
        depth_stencil: Some(depth_stencil(key.state)),
        multisample: multisample_state(key.state, key.sample_count),
        multiview_mask: None,
        cache: None,
    })
}
