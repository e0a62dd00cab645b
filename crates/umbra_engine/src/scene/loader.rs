//! Populate a scene from the configured list files

use crate::config::scene_lists::{
    load_directional_light_list, load_model_list, load_point_light_list,
    load_shader_list as read_shader_list, ModelEntry,
};
use crate::core::config::{SceneFilesConfig, ShaderListConfig};
use crate::render::backend::GraphicsBackend;
use crate::scene::{Scene, SceneResult};

/// What a load pass produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneLoadReport {
    /// Shaders that built
    pub shaders_loaded: usize,
    /// Shaders that failed and were recorded as failed
    pub shaders_failed: Vec<String>,
    /// Models uploaded
    pub models_loaded: usize,
    /// Models whose import or upload failed
    pub models_failed: Vec<String>,
    /// Directional lights added
    pub directional_lights: usize,
    /// Point lights added
    pub point_lights: usize,
}

/// Build every shader named in `names`
///
/// Stage files are resolved through `config`. Failures are logged, recorded in the
/// scene and reported; they never stop the remaining shaders from loading.
pub fn load_shader_list(
    scene: &mut Scene,
    backend: &mut dyn GraphicsBackend,
    names: &[String],
    config: &ShaderListConfig,
    report: &mut SceneLoadReport,
) {
    for name in names {
        let paths = config.resolve(name);
        let result = scene.add_shader_from_files(
            backend,
            name,
            &paths.vertex,
            &paths.fragment,
            paths.geometry.as_deref(),
        );
        match result {
            Ok(()) => report.shaders_loaded += 1,
            Err(_) => report.shaders_failed.push(name.clone()),
        }
    }
}

/// Load, place and assign every model row
///
/// Rows without a shader column are assigned `default_shader`. A model that fails to
/// import is logged and skipped.
pub fn apply_model_entries(
    scene: &mut Scene,
    backend: &mut dyn GraphicsBackend,
    entries: Vec<ModelEntry>,
    default_shader: &str,
    report: &mut SceneLoadReport,
) {
    for entry in entries {
        let model = match scene.add_model(backend, &entry.name, &entry.path) {
            Ok(model) => model,
            Err(e) => {
                log::warn!("Model '{}' skipped: {e}", entry.name);
                report.models_failed.push(entry.name);
                continue;
            }
        };

        model.set_position(entry.position);
        model.set_rotation(entry.rotation_angle, entry.rotation_axis);
        model.set_scale(entry.scale);
        if let Some(tint) = entry.tint {
            model.set_color(tint);
        }
        model.set_capture_cull(entry.capture_cull);

        let shader = entry.shader.as_deref().unwrap_or(default_shader);
        scene.assign_shader(&entry.name, shader);
        report.models_loaded += 1;
    }
}

/// Load shaders, models and lights from the list files
///
/// A list file that is missing or has a malformed row is an error. Individual shaders
/// and models that fail to build are reported and skipped.
pub fn load_scene_files(
    scene: &mut Scene,
    backend: &mut dyn GraphicsBackend,
    files: &SceneFilesConfig,
    shaders: &ShaderListConfig,
) -> SceneResult<SceneLoadReport> {
    let mut report = SceneLoadReport::default();

    let names = read_shader_list(&files.shaders)?;
    load_shader_list(scene, backend, &names, shaders, &mut report);

    let models = load_model_list(&files.models)?;
    apply_model_entries(scene, backend, models, &files.default_shader, &mut report);

    for (name, light) in load_directional_light_list(&files.directional_lights)? {
        scene.add_directional_light(&name, light);
        report.directional_lights += 1;
    }
    for (name, light) in load_point_light_list(&files.point_lights)? {
        scene.add_point_light(&name, light);
        report.point_lights += 1;
    }

    log::info!(
        "Scene loaded: {} shaders ({} failed), {} models ({} failed), {} directional and {} point lights",
        report.shaders_loaded,
        report.shaders_failed.len(),
        report.models_loaded,
        report.models_failed.len(),
        report.directional_lights,
        report.point_lights
    );
    Ok(report)
}
