use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::window::Window;

use super::surface::{choose_alpha_mode, choose_present_mode, choose_surface_format, classify_surface_error};
use super::{GpuInit, SurfaceErrorAction};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Owns wgpu core objects, the surface configuration and the backbuffer
/// attachments (depth, optional multisampled color).
pub struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    sample_count: u32,
    depth_view: wgpu::TextureView,
    msaa_view: Option<wgpu::TextureView>,
}

/// A single acquired frame. Finish it promptly with [`Gpu::present`].
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl Gpu {
    /// Creates a GPU context bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; callers block on it
    /// with `pollster`.
    pub async fn new(window: Arc<Window>, init: &GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::info!("GPU adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("blitty device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        device.on_uncaptured_error(Arc::new(|e| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps).context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: choose_present_mode(&caps, init.vsync),
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.frame_latency,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height, 1);

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            config,
            sample_count: 1,
            depth_view,
            msaa_view: None,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size (physical pixels).
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Multisampled color target, present when `sample_count > 1`.
    pub fn msaa_view(&self) -> Option<&wgpu::TextureView> {
        self.msaa_view.as_ref()
    }

    /// Reconfigures the surface and attachments.
    ///
    /// wgpu cannot configure a 0x0 surface; such sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (width, height) == self.size() {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.recreate_attachments();
    }

    pub fn set_vsync(&mut self, vsync: bool) {
        let caps = self.surface.get_capabilities(&self.adapter);
        let mode = choose_present_mode(&caps, vsync);
        if mode == self.config.present_mode {
            return;
        }
        log::debug!("present mode -> {mode:?}");
        self.config.present_mode = mode;
        self.surface.configure(&self.device, &self.config);
    }

    /// Applies the largest supported sample count not above `requested`.
    pub fn set_sample_count(&mut self, requested: u32) {
        let color = self.adapter.get_texture_format_features(self.config.format).flags;
        let depth = self.adapter.get_texture_format_features(DEPTH_FORMAT).flags;

        let count = [16, 8, 4, 2]
            .into_iter()
            .filter(|&n| n <= requested)
            .find(|&n| color.sample_count_supported(n) && depth.sample_count_supported(n))
            .unwrap_or(1);

        if count != requested {
            log::warn!("MSAA x{requested} unsupported, using x{count}");
        }
        if count != self.sample_count {
            self.sample_count = count;
            self.recreate_attachments();
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blitty frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn present(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        self.window.pre_present_notify();
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring the
    /// surface when it was lost.
    pub fn handle_surface_error(&mut self, err: &SurfaceError) -> SurfaceErrorAction {
        let action = classify_surface_error(err);
        if action == SurfaceErrorAction::Reconfigured {
            self.surface.configure(&self.device, &self.config);
        }
        action
    }

    fn recreate_attachments(&mut self) {
        let (w, h) = self.size();
        self.depth_view = create_depth_view(&self.device, w, h, self.sample_count);
        self.msaa_view = (self.sample_count > 1)
            .then(|| create_msaa_view(&self.device, self.config.format, w, h, self.sample_count));
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32, samples: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("blitty depth"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: samples,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_msaa_view(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    samples: u32,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("blitty msaa color"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: samples,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
