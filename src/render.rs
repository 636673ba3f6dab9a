use std::collections::BTreeMap;

use crate::{error::TripvizResult, shader::ShaderInjection};

/// Geometry kind a base renderer produces. The time-window logic is identical
/// for both; only the shader policy's open-ended flag differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveKind {
    Segment,
    Arc,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
}

pub type Uniforms = BTreeMap<String, UniformValue>;

/// Parameters for one draw call. The layer merges its own uniforms into
/// whatever the caller already computed; nothing else changes per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawParams {
    pub uniforms: Uniforms,
}

impl DrawParams {
    pub fn with_uniform(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.uniforms.insert(name.into(), value);
        self
    }
}

/// Capability contract of a base line/arc renderer owned by the host scene.
///
/// The host owns the GPU device/context; this crate only drives the three
/// extension points below plus resource release. Wrapping happens by
/// composition over this trait, never by inheriting a renderer implementation.
pub trait BaseRenderer {
    fn kind(&self) -> PrimitiveKind;

    /// Shader-assembly hook: splice extra declarations and stage logic into
    /// the base program before it is linked.
    fn inject_shaders(&mut self, injection: &ShaderInjection) -> TripvizResult<()>;

    /// Attribute-registration hook: upload one per-instance array of
    /// `component_size` floats per instance. Upload failure (e.g. GPU memory
    /// exhaustion) must surface here; data is never silently truncated.
    fn register_attribute(
        &mut self,
        name: &str,
        component_size: usize,
        values: Vec<f32>,
    ) -> TripvizResult<()>;

    fn draw(&mut self, params: &DrawParams) -> TripvizResult<()>;

    /// Release buffer handles. Must be idempotent; called at the latest when
    /// the owning layer is dropped.
    fn release(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_uniform_overrides_existing_entry() {
        let params = DrawParams::default()
            .with_uniform("currentTime", UniformValue::Float(1.0))
            .with_uniform("currentTime", UniformValue::Float(2.0));
        assert_eq!(
            params.uniforms.get("currentTime"),
            Some(&UniformValue::Float(2.0))
        );
        assert_eq!(params.uniforms.len(), 1);
    }
}
