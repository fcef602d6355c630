//! wgpu device layer.
//!
//! [`Gpu`] owns the instance/adapter/device/queue and the window surface.
//! [`WgpuBackend`] implements the engine's [`GpuBackend`](crate::render::GpuBackend)
//! on top of it: submissions are recorded on the CPU and replayed once per frame.

mod backend;
mod gpu;
mod init;
mod pipeline;
mod recorder;
mod surface;

pub use backend::WgpuBackend;
pub use gpu::{DEPTH_FORMAT, Gpu, GpuFrame};
pub use init::GpuInit;
pub use pipeline::PipelineKey;
pub use surface::SurfaceErrorAction;
