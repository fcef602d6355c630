/// Device and surface setup for [`Gpu::new`](super::Gpu::new).
///
/// Backbuffer size, VSync and MSAA change later through
/// [`GpuBackend::reset`](crate::render::GpuBackend::reset); `vsync` here only
/// picks the present mode used until then.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends the instance may use. Defaults to `WGPU_BACKEND` or the primary set.
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub vsync: bool,
    /// Ignored when the surface does not support it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub required_limits: wgpu::Limits,
    pub frame_latency: u32,
}

impl GpuInit {
    pub fn with_vsync(vsync: bool) -> Self {
        Self { vsync, ..Self::default() }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::from_env().unwrap_or(wgpu::Backends::PRIMARY),
            power_preference: wgpu::PowerPreference::HighPerformance,
            vsync: true,
            alpha_mode: None,
            required_limits: wgpu::Limits::default(),
            frame_latency: 2,
        }
    }
}
