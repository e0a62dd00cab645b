//! Lighting system
//!
//! Phong light sources and their upload into the shader light arrays. Slot `i` of
//! `dLights[]` / `pLights[]` receives the `i`-th light handed to [`upload_lights`],
//! so callers control slot assignment through iteration order.

use crate::foundation::math::Vec3;
use crate::render::backend::GraphicsBackend;
use crate::render::shader::ShaderProgram;

/// Directional light (like sunlight)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels in
    pub direction: Vec3,
    /// Ambient colour
    pub ambient: Vec3,
    /// Diffuse colour
    pub diffuse: Vec3,
    /// Specular colour
    pub specular: Vec3,
}

impl DirectionalLight {
    /// Create a directional light
    pub fn new(direction: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            direction,
            ambient,
            diffuse,
            specular,
        }
    }

    /// Write `dLights[slot].*`
    pub fn upload(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram, slot: usize) {
        let field = |name: &str| format!("dLights[{slot}].{name}");
        program.set_vec3(backend, &field("direction"), &self.direction);
        program.set_vec3(backend, &field("ambient"), &self.ambient);
        program.set_vec3(backend, &field("diffuse"), &self.diffuse);
        program.set_vec3(backend, &field("specular"), &self.specular);
    }
}

/// Point light with constant/linear/quadratic attenuation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Ambient colour
    pub ambient: Vec3,
    /// Diffuse colour
    pub diffuse: Vec3,
    /// Specular colour
    pub specular: Vec3,
    /// Constant attenuation term
    pub constant: f32,
    /// Linear attenuation term
    pub linear: f32,
    /// Quadratic attenuation term
    pub quadratic: f32,
}

impl PointLight {
    /// Create a point light
    pub fn new(
        position: Vec3,
        ambient: Vec3,
        diffuse: Vec3,
        specular: Vec3,
        constant: f32,
        linear: f32,
        quadratic: f32,
    ) -> Self {
        Self {
            position,
            ambient,
            diffuse,
            specular,
            constant,
            linear,
            quadratic,
        }
    }

    /// Set all three attenuation terms
    pub fn set_attenuation(&mut self, constant: f32, linear: f32, quadratic: f32) {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
    }

    /// Attenuation factor at `distance`
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }

    /// Write `pLights[slot].*`
    pub fn upload(&self, backend: &mut dyn GraphicsBackend, program: &ShaderProgram, slot: usize) {
        let field = |name: &str| format!("pLights[{slot}].{name}");
        program.set_vec3(backend, &field("position"), &self.position);
        program.set_vec3(backend, &field("ambient"), &self.ambient);
        program.set_vec3(backend, &field("diffuse"), &self.diffuse);
        program.set_vec3(backend, &field("specular"), &self.specular);
        program.set_float(backend, &field("kc"), self.constant);
        program.set_float(backend, &field("kl"), self.linear);
        program.set_float(backend, &field("kq"), self.quadratic);
    }
}

/// Upload every directional light, then every point light, in iteration order
pub fn upload_lights<'a>(
    backend: &mut dyn GraphicsBackend,
    program: &ShaderProgram,
    directional: impl IntoIterator<Item = &'a DirectionalLight>,
    point: impl IntoIterator<Item = &'a PointLight>,
) {
    for (slot, light) in directional.into_iter().enumerate() {
        light.upload(backend, program, slot);
    }
    for (slot, light) in point.into_iter().enumerate() {
        light.upload(backend, program, slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::UniformValue;
    use crate::render::backends::RecordingBackend;
    use crate::render::shader::ShaderSources;

    #[test]
    fn test_point_light_fields_upload() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::compile(&mut backend, ShaderSources::new("vs", "fs")).unwrap();
        let light = PointLight::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::repeat(0.1),
            Vec3::repeat(0.5),
            Vec3::repeat(1.0),
            1.0,
            0.09,
            0.032,
        );

        light.upload(&mut backend, &program, 2);

        let names: Vec<_> = backend
            .uniform_writes(program.id())
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "pLights[2].position",
                "pLights[2].ambient",
                "pLights[2].diffuse",
                "pLights[2].specular",
                "pLights[2].kc",
                "pLights[2].kl",
                "pLights[2].kq",
            ]
        );
        assert_eq!(
            backend.uniform(program.id(), "pLights[2].kq"),
            Some(UniformValue::Float(0.032))
        );
    }

    #[test]
    fn test_directional_before_point() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::compile(&mut backend, ShaderSources::new("vs", "fs")).unwrap();
        let sun = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), Vec3::zeros(), Vec3::zeros(), Vec3::zeros());
        let bulb = PointLight::new(Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), 1.0, 0.0, 0.0);

        upload_lights(&mut backend, &program, [&sun], [&bulb]);

        let writes = backend.uniform_writes(program.id());
        assert_eq!(writes.first().map(|w| w.0), Some("dLights[0].direction"));
        assert_eq!(writes.last().map(|w| w.0), Some("pLights[0].kq"));
    }

    #[test]
    fn test_attenuation() {
        let mut light = PointLight::new(Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), Vec3::zeros(), 1.0, 0.0, 0.0);
        assert_eq!(light.attenuation(10.0), 1.0);
        light.set_attenuation(1.0, 0.5, 0.25);
        assert_eq!(light.attenuation(2.0), 1.0 / 3.0);
    }
}
