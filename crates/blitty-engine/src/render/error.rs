use thiserror::Error;

/// Errors raised by the render layer.
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("shader `{shader}` has no texture bound to sampler slot {slot}")]
    MissingSamplerTexture { shader: String, slot: usize },

    #[error("sampler slot {slot} is out of range (shader declares {count})")]
    SamplerSlotOutOfRange { slot: usize, count: usize },

    #[error("shader `{0}` has empty source")]
    EmptyShaderSource(String),

    #[error("failed to create program `{label}`: {message}")]
    ProgramCreation { label: String, message: String },

    #[error("texture `{label}` expects {expected} bytes of RGBA8 data, got {actual}")]
    TextureSize { label: String, expected: usize, actual: usize },

    #[error("unknown shader parameter `{0}`")]
    UnknownParameter(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("graphics context is shut down")]
    ShutDown,
}
