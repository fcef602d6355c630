use std::collections::HashMap;

use glam::{Vec2, Vec3, Vec4};

use super::backend::{GpuBackend, ProgramHandle, UniformHandle};
use super::error::GraphicsError;
use super::registry::ResourceKey;
use super::texture::Texture2D;
use crate::paint::Color;

/// A vec4 uniform value owned by a shader.
///
/// Constant parameters are uploaded on the first apply only.
#[derive(Debug, Clone)]
pub struct ShaderParameter {
    name: String,
    handle: UniformHandle,
    value: Vec4,
    pub constant: bool,
    submitted_once: bool,
}

impl ShaderParameter {
    pub(crate) fn new(name: impl Into<String>, handle: UniformHandle) -> Self {
        Self {
            name: name.into(),
            handle,
            value: Vec4::ZERO,
            constant: false,
            submitted_once: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> UniformHandle {
        self.handle
    }

    pub fn value(&self) -> Vec4 {
        self.value
    }

    pub fn submitted_once(&self) -> bool {
        self.submitted_once
    }

    pub fn set_float(&mut self, v: f32) {
        self.value.x = v;
    }

    pub fn set_vec2(&mut self, v: Vec2) {
        self.value.x = v.x;
        self.value.y = v.y;
    }

    pub fn set_vec3(&mut self, v: Vec3) {
        self.value = v.extend(self.value.w);
    }

    pub fn set_vec4(&mut self, v: Vec4) {
        self.value = v;
    }

    pub fn set_color(&mut self, c: Color) {
        self.value = c.to_vec4();
    }
}

/// Sampler slot of a shader and the texture currently assigned to it.
#[derive(Debug, Clone)]
pub struct ShaderSampler {
    name: String,
    handle: UniformHandle,
    texture: Option<Texture2D>,
}

impl ShaderSampler {
    pub(crate) fn new(name: impl Into<String>, handle: UniformHandle) -> Self {
        Self { name: name.into(), handle, texture: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> UniformHandle {
        self.handle
    }

    pub fn texture(&self) -> Option<&Texture2D> {
        self.texture.as_ref()
    }
}

/// Program plus its sampler and parameter bindings.
#[derive(Debug, Clone)]
pub struct Shader {
    pub(crate) key: ResourceKey,
    name: String,
    program: ProgramHandle,
    samplers: Vec<ShaderSampler>,
    params: Vec<ShaderParameter>,
    param_index: HashMap<String, usize>,
    highest_slot: usize,
}

impl Shader {
    pub(crate) fn new(
        key: ResourceKey,
        name: impl Into<String>,
        program: ProgramHandle,
        samplers: Vec<ShaderSampler>,
        params: Vec<ShaderParameter>,
    ) -> Self {
        let param_index = params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        Self {
            key,
            name: name.into(),
            program,
            samplers,
            params,
            param_index,
            highest_slot: 0,
        }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn samplers(&self) -> &[ShaderSampler] {
        &self.samplers
    }

    pub fn params(&self) -> &[ShaderParameter] {
        &self.params
    }

    /// Assigns `texture` to sampler `slot`.
    pub fn set_texture(&mut self, slot: usize, texture: &Texture2D) -> Result<(), GraphicsError> {
        let count = self.samplers.len();
        let sampler = self
            .samplers
            .get_mut(slot)
            .ok_or(GraphicsError::SamplerSlotOutOfRange { slot, count })?;
        sampler.texture = Some(*texture);
        self.highest_slot = self.highest_slot.max(slot);
        Ok(())
    }

    pub fn param(&self, name: &str) -> Option<&ShaderParameter> {
        self.param_index.get(name).map(|&i| &self.params[i])
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut ShaderParameter> {
        self.param_index.get(name).map(|&i| &mut self.params[i])
    }

    /// Like [`param_mut`](Self::param_mut) but fails on unknown names.
    pub fn require_param(&mut self, name: &str) -> Result<&mut ShaderParameter, GraphicsError> {
        self.param_mut(name)
            .ok_or_else(|| GraphicsError::UnknownParameter(name.to_owned()))
    }

    /// Binds textures and uploads parameters for the next submit.
    ///
    /// Every declared sampler must have a texture; otherwise nothing is bound.
    pub fn apply(&mut self, backend: &mut dyn GpuBackend) -> Result<(), GraphicsError> {
        if let Some(slot) = self.samplers.iter().position(|s| s.texture.is_none()) {
            return Err(GraphicsError::MissingSamplerTexture {
                shader: self.name.clone(),
                slot,
            });
        }

        if self.highest_slot == 0 {
            if let Some(s) = self.samplers.first() {
                if let Some(t) = &s.texture {
                    backend.set_texture(0, s.handle, t.handle());
                }
            }
        } else {
            for (slot, s) in self.samplers.iter().enumerate().take(self.highest_slot + 1) {
                if let Some(t) = &s.texture {
                    backend.set_texture(slot as u8, s.handle, t.handle());
                }
            }
        }

        for p in &mut self.params {
            if p.constant {
                if p.submitted_once {
                    continue;
                }
                p.submitted_once = true;
            }
            backend.set_uniform(p.handle, p.value);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::{SamplerFlags, TextureHandle};
    use crate::render::testing::{Call, RecordingBackend};

    fn texture(handle: u32) -> Texture2D {
        Texture2D::new(ResourceKey::default(), TextureHandle(handle), 1, 1, SamplerFlags::empty())
    }

    fn shader(samplers: usize, params: &[&str]) -> Shader {
        let samplers = (0..samplers)
            .map(|i| ShaderSampler::new(format!("s_tex{i}"), UniformHandle(100 + i as u32)))
            .collect();
        let params = params
            .iter()
            .enumerate()
            .map(|(i, n)| ShaderParameter::new(*n, UniformHandle(200 + i as u32)))
            .collect();
        Shader::new(ResourceKey::default(), "test", ProgramHandle(1), samplers, params)
    }

    // ── samplers ──────────────────────────────────────────────────────────

    #[test]
    fn single_sampler_fast_path() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut s = shader(1, &[]);
        s.set_texture(0, &texture(5)).unwrap();
        s.apply(&mut backend).unwrap();
        assert_eq!(log.calls(), vec![Call::SetTexture(0, UniformHandle(100), TextureHandle(5))]);
    }

    #[test]
    fn binds_all_slots_up_to_highest() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut s = shader(3, &[]);
        s.set_texture(2, &texture(7)).unwrap();
        s.set_texture(0, &texture(5)).unwrap();
        s.set_texture(1, &texture(6)).unwrap();
        s.apply(&mut backend).unwrap();
        assert_eq!(
            log.calls(),
            vec![
                Call::SetTexture(0, UniformHandle(100), TextureHandle(5)),
                Call::SetTexture(1, UniformHandle(101), TextureHandle(6)),
                Call::SetTexture(2, UniformHandle(102), TextureHandle(7)),
            ]
        );
    }

    #[test]
    fn missing_texture_is_an_error() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut s = shader(2, &[]);
        s.set_texture(0, &texture(5)).unwrap();
        let err = s.apply(&mut backend).unwrap_err();
        assert!(matches!(err, GraphicsError::MissingSamplerTexture { slot: 1, .. }));
        assert!(log.calls().is_empty());
    }

    #[test]
    fn slot_out_of_range() {
        let mut s = shader(1, &[]);
        let err = s.set_texture(3, &texture(1)).unwrap_err();
        assert!(matches!(err, GraphicsError::SamplerSlotOutOfRange { slot: 3, count: 1 }));
    }

    // ── parameters ────────────────────────────────────────────────────────

    #[test]
    fn constant_params_upload_once() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut s = shader(0, &["u_tint", "u_time"]);
        {
            let tint = s.param_mut("u_tint").unwrap();
            tint.set_color(Color::WHITE);
            tint.constant = true;
        }
        s.param_mut("u_time").unwrap().set_float(2.0);

        s.apply(&mut backend).unwrap();
        s.apply(&mut backend).unwrap();

        let tint_uploads = log.count(|c| matches!(c, Call::SetUniform(UniformHandle(200), _)));
        let time_uploads = log.count(|c| matches!(c, Call::SetUniform(UniformHandle(201), _)));
        assert_eq!(tint_uploads, 1);
        assert_eq!(time_uploads, 2);
        assert!(s.param("u_tint").unwrap().submitted_once());
    }

    #[test]
    fn params_upload_in_index_order() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let mut s = shader(0, &["a", "b"]);
        s.param_mut("b").unwrap().set_vec2(Vec2::new(1.0, 2.0));
        s.apply(&mut backend).unwrap();
        assert_eq!(
            log.calls(),
            vec![
                Call::SetUniform(UniformHandle(200), Vec4::ZERO),
                Call::SetUniform(UniformHandle(201), Vec4::new(1.0, 2.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn partial_setters_keep_trailing_components() {
        let mut s = shader(0, &["p"]);
        let p = s.param_mut("p").unwrap();
        p.set_vec4(Vec4::new(9.0, 9.0, 9.0, 9.0));
        p.set_float(1.0);
        assert_eq!(p.value(), Vec4::new(1.0, 9.0, 9.0, 9.0));
        p.set_vec3(Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(p.value(), Vec4::new(2.0, 3.0, 4.0, 9.0));
        assert!(s.require_param("missing").is_err());
    }
}
