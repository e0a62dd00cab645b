//! Scene and pipeline scenarios against the recording backend

use std::path::{Path, PathBuf};

use approx::assert_relative_eq;

use super::*;
use crate::core::config::{ApplicationConfig, PresentSource, SceneFilesConfig, ShaderListConfig, ShadowTechnique};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::backend::{ProgramId, UniformValue, Viewport};
use crate::render::backends::RecordingBackend;
use crate::render::SHADOW_TEXTURE_UNIT;

const QUAD_OBJ: &str = "mtllib quad.mtl
v -1 0 -1
v 1 0 -1
v 1 0 1
v -1 0 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 1 0
usemtl painted
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

const QUAD_MTL: &str = "newmtl painted
Kd 1 1 1
map_Kd albedo.png
";

/// Write a two-triangle quad with a diffuse-only material into `dir`
fn write_quad(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("quad.mtl"), QUAD_MTL).unwrap();
    image::RgbImage::from_pixel(2, 2, image::Rgb([180, 120, 60]))
        .save(dir.join("albedo.png"))
        .unwrap();
    let path = dir.join("quad.obj");
    std::fs::write(&path, QUAD_OBJ).unwrap();
    path
}

fn sources() -> ShaderSources {
    ShaderSources::new("#version 330 core\nvoid main() {}", "#version 330 core\nvoid main() {}")
}

fn program_id(scene: &Scene, name: &str) -> ProgramId {
    scene.shader(name).unwrap().id()
}

/// Camera "main", "floor" at scale 5 with the "standard" shader, one directional light
fn floor_scene(backend: &mut RecordingBackend, dir: &Path) -> Scene {
    let obj = write_quad(dir);
    let mut scene = Scene::new();
    scene.add_camera("main", Camera::new());
    scene.add_shader(backend, "standard", sources()).unwrap();
    scene
        .add_model(backend, "floor", &obj)
        .unwrap()
        .set_scale(Vec3::repeat(5.0));
    scene.assign_shader("floor", "standard");
    scene.add_directional_light(
        "sun",
        DirectionalLight::new(
            Vec3::new(-0.2, -1.0, -0.3),
            Vec3::repeat(0.05),
            Vec3::repeat(0.4),
            Vec3::repeat(0.5),
        ),
    );
    scene
}

fn point_light(x: f32) -> PointLight {
    PointLight::new(
        Vec3::new(x, 1.0, 0.0),
        Vec3::repeat(0.05),
        Vec3::repeat(0.8),
        Vec3::repeat(1.0),
        1.0,
        0.09,
        0.032,
    )
}

#[test]
fn test_render_scene_draws_floor_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());
    backend.clear_calls();

    scene.render_scene(&mut backend, 0.016).unwrap();

    let standard = program_id(&scene, "standard");
    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].program, Some(standard));
    assert_eq!(draws[0].index_count, 6);

    let expected = Mat4::new_translation(&Vec3::zeros()) * Mat4::new_nonuniform_scaling(&Vec3::repeat(5.0));
    assert_eq!(backend.uniform(standard, "mat_model"), Some(UniformValue::Mat4(expected)));
    assert_eq!(backend.uniform(standard, "material.shininess"), Some(UniformValue::Float(256.0)));
    assert_eq!(backend.uniform(standard, "has_diffuse"), Some(UniformValue::Int(1)));
    assert_eq!(backend.uniform(standard, "has_specular"), Some(UniformValue::Int(0)));
    assert_eq!(backend.uniform(standard, "texture_diffuse1"), Some(UniformValue::Int(0)));

    scene.clear_all(&mut backend);
}

#[test]
fn test_two_triangle_model_flags() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_quad(dir.path());
    let mut backend = RecordingBackend::new();

    let model = Model::load(&mut backend, &obj).unwrap();
    assert!(model.has_diffuse_texture());
    assert!(!model.has_specular_texture());
    assert_eq!(model.index_count(), 6);
    model.release(&mut backend);
}

#[test]
fn test_model_position_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());

    let model = scene.model_mut("floor").unwrap();
    model.set_position(Vec3::new(1.5, -2.0, 3.25));
    assert_eq!(scene.model("floor").unwrap().position(), Vec3::new(1.5, -2.0, 3.25));

    scene.clear_all(&mut backend);
}

#[test]
fn test_light_slots_follow_insertion_order() {
    let mut backend = RecordingBackend::new();
    let mut scene = Scene::new();
    scene.add_shader(&mut backend, "standard", sources()).unwrap();

    let down = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0), Vec3::zeros(), Vec3::zeros(), Vec3::zeros());
    let side = DirectionalLight::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros(), Vec3::zeros(), Vec3::zeros());
    scene.add_directional_light("zenith", down);
    scene.add_directional_light("alpha", side);
    scene.add_point_light("p2", point_light(2.0));
    scene.add_point_light("p0", point_light(0.0));
    scene.add_point_light("p1", point_light(1.0));

    scene.prepare_lights(&mut backend, "standard").unwrap();

    let standard = program_id(&scene, "standard");
    assert_eq!(
        backend.uniform(standard, "dLights[0].direction"),
        Some(UniformValue::Vec3(down.direction))
    );
    assert_eq!(
        backend.uniform(standard, "dLights[1].direction"),
        Some(UniformValue::Vec3(side.direction))
    );
    for (slot, x) in [2.0, 0.0, 1.0].into_iter().enumerate() {
        assert_eq!(
            backend.uniform(standard, &format!("pLights[{slot}].position")),
            Some(UniformValue::Vec3(Vec3::new(x, 1.0, 0.0)))
        );
    }
    assert_eq!(backend.uniform(standard, "pLights[0].kq"), Some(UniformValue::Float(0.032)));

    scene.clear_all(&mut backend);
}

#[test]
fn test_prepare_shaders_uploads_camera() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());
    scene.update_cameras(0.016);

    scene.prepare_shaders(&mut backend).unwrap();

    let standard = program_id(&scene, "standard");
    let camera = scene.active_camera().unwrap();
    assert_eq!(backend.uniform(standard, "cameraPos"), Some(UniformValue::Vec3(camera.position())));
    assert_eq!(backend.uniform(standard, "mat_view"), Some(UniformValue::Mat4(camera.view())));
    assert_eq!(backend.uniform(standard, "mat_proj"), Some(UniformValue::Mat4(camera.projection())));

    scene.clear_all(&mut backend);
}

#[test]
fn test_first_camera_becomes_active() {
    let mut scene = Scene::new();
    assert!(matches!(scene.active_camera(), Err(SceneError::NoActiveCamera)));

    scene.add_camera("main", Camera::new());
    scene.add_camera("overview", Camera::new().with_position(Vec3::new(0.0, 10.0, 0.0)));
    assert_eq!(scene.active_camera_name(), Some("main"));

    scene.set_active_camera("overview").unwrap();
    assert_relative_eq!(scene.active_camera().unwrap().position().y, 10.0);
    assert!(matches!(
        scene.set_active_camera("missing"),
        Err(SceneError::NotFound { kind: "camera", .. })
    ));
}

#[test]
fn test_failed_shader_skips_its_models() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new().fail_compile_containing("BROKEN");
    let mut scene = floor_scene(&mut backend, dir.path());

    let err = scene
        .add_shader(&mut backend, "glow", ShaderSources::new("BROKEN", "void main() {}"))
        .unwrap_err();
    assert!(matches!(err, SceneError::Shader { ref name, .. } if name == "glow"));
    assert!(scene.is_shader_failed("glow"));
    assert!(scene.shader("glow").is_none());

    let obj = dir.path().join("quad.obj");
    scene.add_model(&mut backend, "lamp", &obj).unwrap();
    scene.assign_shader("lamp", "glow");
    backend.clear_calls();

    scene.render_models(&mut backend).unwrap();

    let draws = backend.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].program, Some(program_id(&scene, "standard")));

    scene.clear_all(&mut backend);
}

#[test]
fn test_missing_entries_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());

    assert!(matches!(
        scene.prepare_lights(&mut backend, "missing"),
        Err(SceneError::NotFound { kind: "shader", .. })
    ));
    assert!(matches!(
        scene.remove_model(&mut backend, "missing"),
        Err(SceneError::NotFound { kind: "model", .. })
    ));

    let obj = dir.path().join("quad.obj");
    scene.add_model(&mut backend, "orphan", &obj).unwrap();
    scene.add_model(&mut backend, "typo", &obj).unwrap();
    scene.assign_shader("typo", "standrad");
    backend.clear_calls();

    let err = scene.render_models(&mut backend).unwrap_err();
    assert!(matches!(err, SceneError::Unassigned { ref model } if model == "orphan"));
    assert_eq!(backend.draws().len(), 1);

    scene.remove_model(&mut backend, "orphan").unwrap();
    let err = scene.render_models(&mut backend).unwrap_err();
    assert!(matches!(err, SceneError::NotFound { kind: "shader", ref name } if name == "standrad"));

    scene.clear_all(&mut backend);
}

#[test]
fn test_replacing_model_releases_previous() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());
    let before = backend.live_objects();

    let obj = dir.path().join("quad.obj");
    scene.add_model(&mut backend, "floor", &obj).unwrap();

    assert_eq!(backend.live_objects(), before);
    assert_eq!(scene.models().count(), 1);
    scene.clear_all(&mut backend);
}

#[test]
fn test_clear_all_releases_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());
    scene.add_point_light("bulb", point_light(0.0));

    scene.clear_all(&mut backend);

    assert!(backend.live_objects().is_empty());
    assert!(scene.models().next().is_none());
    assert!(scene.active_camera_name().is_none());
    assert!(scene.point_lights().next().is_none());
    assert!(scene.directional_light("sun").is_none());
}

// Pipeline

fn pipeline_scene(backend: &mut RecordingBackend, dir: &Path) -> Scene {
    let mut scene = floor_scene(backend, dir);
    for name in ["depth", "quad", "quad_depth", "skybox"] {
        scene.add_shader(backend, name, sources()).unwrap();
    }
    scene
        .add_shader(backend, "depth_cube", sources().with_geometry("void main() {}"))
        .unwrap();
    scene
}

#[test]
fn test_directional_frame_passes() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.model_mut("floor").unwrap().set_capture_cull(CullMode::Reversed);

    let config = ApplicationConfig::default();
    let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 800, 600).unwrap();
    assert_eq!(pipeline.technique(), ShadowTechnique::Directional);
    backend.clear_calls();

    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let depth = program_id(&scene, "depth");
    let standard = program_id(&scene, "standard");
    let quad = program_id(&scene, "quad");
    let draws = backend.draws();
    assert_eq!(draws.len(), 3);

    assert_eq!(draws[0].program, Some(depth));
    assert_eq!(draws[0].cull_mode, CullMode::Reversed);
    assert_ne!(draws[0].framebuffer, None);

    assert_eq!(draws[1].program, Some(standard));
    assert_eq!(draws[1].framebuffer, Some(pipeline.target().framebuffer()));
    assert_eq!(draws[1].cull_mode, CullMode::Default);

    assert_eq!(draws[2].program, Some(quad));
    assert_eq!(draws[2].framebuffer, None);

    assert!(matches!(backend.uniform(depth, "lightSpaceMatrix"), Some(UniformValue::Mat4(_))));
    assert_eq!(
        backend.uniform(standard, "shadowMap"),
        Some(UniformValue::Int(SHADOW_TEXTURE_UNIT as i32))
    );
    assert_eq!(
        backend.uniform(standard, "mat_light"),
        backend.uniform(depth, "lightSpaceMatrix")
    );
    assert_eq!(backend.uniform(quad, "screenTexture"), Some(UniformValue::Int(0)));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
    assert!(backend.live_objects().is_empty());
}

#[test]
fn test_non_casters_skip_shadow_pass() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.model_mut("floor").unwrap().set_casts_shadows(false);

    let pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64).unwrap();
    backend.clear_calls();
    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let depth = program_id(&scene, "depth");
    assert!(backend.draws().iter().all(|d| d.program != Some(depth)));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_pass_assignment_overrides_depth_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.add_shader(&mut backend, "depth_alpha", sources()).unwrap();
    scene.assign_pass_shader("floor", RenderPassKind::DirectionalShadow, "depth_alpha");

    let pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64).unwrap();
    backend.clear_calls();
    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let alpha = program_id(&scene, "depth_alpha");
    assert_eq!(backend.draws()[0].program, Some(alpha));
    assert!(matches!(backend.uniform(alpha, "lightSpaceMatrix"), Some(UniformValue::Mat4(_))));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_missing_pass_shader_falls_back_to_depth() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.assign_pass_shader("floor", RenderPassKind::DirectionalShadow, "depth_gone");

    let pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64).unwrap();
    backend.clear_calls();
    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let depth = program_id(&scene, "depth");
    assert_eq!(backend.draws()[0].program, Some(depth));
    assert_eq!(backend.draws().len(), 3);

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_depth_test_enabled_for_scene_draws() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.add_point_light("bulb", point_light(3.0));
    backend.clear_calls();

    scene.render_scene(&mut backend, 0.016).unwrap();
    assert!(backend.draws()[0].depth_test);

    for technique in [ShadowTechnique::None, ShadowTechnique::Directional, ShadowTechnique::Omnidirectional] {
        let mut config = ApplicationConfig::default();
        config.shadows.technique = technique;
        let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 64, 64).unwrap();

        // The frame before has left depth testing off for the screen quad
        backend.set_depth_test(false);
        backend.clear_calls();
        pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

        let draws = backend.draws();
        let (present, scene_draws) = draws.split_last().unwrap();
        assert!(!scene_draws.is_empty(), "{technique:?}");
        assert!(scene_draws.iter().all(|d| d.depth_test), "{technique:?}");
        assert_eq!(present.framebuffer, None);
        assert!(!present.depth_test);

        pipeline.release(&mut backend);
    }

    scene.clear_all(&mut backend);
}

#[test]
fn test_missing_entry_errors_keep_frames_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    let obj = dir.path().join("quad.obj");
    scene.add_model(&mut backend, "orphan", &obj).unwrap();

    let pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64).unwrap();
    backend.clear_calls();
    let err = pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap_err();
    assert!(err.is_missing_entry());

    let quad = program_id(&scene, "quad");
    assert_eq!(backend.draws().last().unwrap().program, Some(quad));

    assert!(not_found("shader", "standrad").is_missing_entry());
    assert!(!SceneError::NoActiveCamera.is_missing_entry());

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_omnidirectional_frame_uniforms() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    scene.add_point_light("bulb", point_light(3.0));

    let mut config = ApplicationConfig::default();
    config.shadows.technique = ShadowTechnique::Omnidirectional;
    let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 64, 64).unwrap();
    backend.clear_calls();

    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let cube = program_id(&scene, "depth_cube");
    let standard = program_id(&scene, "standard");
    let light = Vec3::new(3.0, 1.0, 0.0);
    assert_eq!(backend.draws()[0].program, Some(cube));
    assert!(matches!(backend.uniform(cube, "mat_shadow[5]"), Some(UniformValue::Mat4(_))));
    assert_eq!(backend.uniform(cube, "lightPos"), Some(UniformValue::Vec3(light)));
    assert_eq!(backend.uniform(standard, "far_plane"), Some(UniformValue::Float(25.0)));
    assert_eq!(backend.uniform(standard, "lightPos"), Some(UniformValue::Vec3(light)));
    assert_eq!(
        backend.uniform(standard, "depthMap"),
        Some(UniformValue::Int(SHADOW_TEXTURE_UNIT as i32))
    );

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_named_point_light_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());

    let mut config = ApplicationConfig::default();
    config.shadows.technique = ShadowTechnique::Omnidirectional;
    config.shadows.point_light = Some("absent".to_string());
    let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 64, 64).unwrap();

    assert!(matches!(
        pipeline.render_frame(&mut backend, &mut scene, 0.016),
        Err(SceneError::NotFound { kind: "point light", .. })
    ));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_missing_depth_shader_disables_shadows() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());
    scene.add_shader(&mut backend, "quad", sources()).unwrap();

    let pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64).unwrap();
    assert_eq!(pipeline.technique(), ShadowTechnique::None);

    backend.clear_calls();
    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();
    assert_eq!(backend.draws().len(), 2);

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_missing_present_shader_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = floor_scene(&mut backend, dir.path());

    assert!(matches!(
        ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 64, 64),
        Err(SceneError::NotFound { kind: "shader", ref name }) if name == "quad"
    ));
    scene.clear_all(&mut backend);
}

#[test]
fn test_shadow_depth_presentation() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());

    let mut config = ApplicationConfig::default();
    config.present.source = PresentSource::ShadowDepth;
    let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 64, 64).unwrap();
    backend.clear_calls();

    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let quad_depth = program_id(&scene, "quad_depth");
    assert_eq!(backend.draws().last().unwrap().program, Some(quad_depth));
    assert_eq!(backend.uniform(quad_depth, "near_plane"), Some(UniformValue::Float(1.0)));
    assert_eq!(backend.uniform(quad_depth, "far_plane"), Some(UniformValue::Float(7.5)));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

#[test]
fn test_skybox_drawn_before_models() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());

    let faces = ["px", "nx", "py", "ny", "pz", "nz"].map(|name| {
        let path = dir.path().join(format!("{name}.png"));
        image::RgbImage::from_pixel(2, 2, image::Rgb([30, 60, 90])).save(&path).unwrap();
        path
    });
    let mut config = ApplicationConfig::default();
    config.skybox.faces = Some(faces);
    let pipeline = ShadowPipeline::new(&mut backend, &config, &scene, 64, 64).unwrap();
    assert!(pipeline.has_skybox());
    backend.clear_calls();

    pipeline.render_frame(&mut backend, &mut scene, 0.016).unwrap();

    let programs: Vec<_> = backend.draws().iter().map(|d| d.program).collect();
    assert_eq!(
        programs,
        vec![
            Some(program_id(&scene, "depth")),
            Some(program_id(&scene, "skybox")),
            Some(program_id(&scene, "standard")),
            Some(program_id(&scene, "quad")),
        ]
    );

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
    assert!(backend.live_objects().is_empty());
}

#[test]
fn test_resize_follows_drawable() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = RecordingBackend::new();
    let mut scene = pipeline_scene(&mut backend, dir.path());
    let mut pipeline = ShadowPipeline::new(&mut backend, &ApplicationConfig::default(), &scene, 800, 600).unwrap();

    pipeline.resize(&mut backend, 1280, 720).unwrap();
    assert_eq!(pipeline.target().size(), (1280, 720));
    assert_eq!(pipeline.viewport(), Viewport::sized(1280, 720));

    pipeline.resize(&mut backend, 0, 0).unwrap();
    assert_eq!(pipeline.target().size(), (1280, 720));

    pipeline.release(&mut backend);
    scene.clear_all(&mut backend);
}

// Loader

#[test]
fn test_load_scene_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_quad(root);

    let shader_dir = root.join("shaders");
    std::fs::create_dir(&shader_dir).unwrap();
    for name in ["standard", "light"] {
        std::fs::write(shader_dir.join(format!("vertex_{name}.glsl")), "void main() {}").unwrap();
        std::fs::write(shader_dir.join(format!("fragment_{name}.glsl")), "void main() {}").unwrap();
    }

    let files = SceneFilesConfig {
        models: root.join("models.tsv"),
        point_lights: root.join("point_lights.tsv"),
        directional_lights: root.join("directional_lights.tsv"),
        shaders: root.join("shaders.txt"),
        default_shader: "standard".to_string(),
    };
    std::fs::write(&files.shaders, "standard\nlight\nmissing\n").unwrap();
    let obj = root.join("quad.obj");
    std::fs::write(
        &files.models,
        format!(
            "name\tpath\tposition\trotation\tscale\n\
             floor\t{obj}\t0 0 0\t0 0 1 0\t5 5 5\n\
             bulb\t{obj}\t0 2 0\t0 0 1 0\t0.1 0.1 0.1\t1 1 1\t\tlight\n\
             ghost\t{root}/nope.obj\t0 0 0\t0 0 1 0\t1 1 1\n",
            obj = obj.display(),
            root = root.display()
        ),
    )
    .unwrap();
    std::fs::write(
        &files.point_lights,
        "name\tposition\tambient\tdiffuse\tspecular\tkc\tkl\tkq\n\
         bulb\t0 2 0\t0.05 0.05 0.05\t0.8 0.8 0.8\t1 1 1\t1.0\t0.09\t0.032\n",
    )
    .unwrap();
    std::fs::write(
        &files.directional_lights,
        "name\tdirection\tambient\tdiffuse\tspecular\n\
         sun\t-0.2 -1 -0.3\t0.05 0.05 0.05\t0.4 0.4 0.4\t0.5 0.5 0.5\n",
    )
    .unwrap();

    let shaders = ShaderListConfig {
        directory: shader_dir,
        ..Default::default()
    };
    let mut backend = RecordingBackend::new();
    let mut scene = Scene::new();
    let report = load_scene_files(&mut scene, &mut backend, &files, &shaders).unwrap();

    assert_eq!(report.shaders_loaded, 2);
    assert_eq!(report.shaders_failed, vec!["missing".to_string()]);
    assert_eq!(report.models_loaded, 2);
    assert_eq!(report.models_failed, vec!["ghost".to_string()]);
    assert_eq!((report.directional_lights, report.point_lights), (1, 1));

    assert!(scene.is_shader_failed("missing"));
    assert_eq!(scene.assigned_shader("floor", RenderPassKind::Lit), Some("standard"));
    assert_eq!(scene.assigned_shader("bulb", RenderPassKind::Lit), Some("light"));
    assert_eq!(scene.model("bulb").unwrap().position(), Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(scene.model("floor").unwrap().scale(), Vec3::repeat(5.0));

    scene.clear_all(&mut backend);
    assert!(backend.live_objects().is_empty());
}

#[test]
fn test_malformed_list_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = SceneFilesConfig {
        models: dir.path().join("models.tsv"),
        point_lights: dir.path().join("point_lights.tsv"),
        directional_lights: dir.path().join("directional_lights.tsv"),
        shaders: dir.path().join("shaders.txt"),
        default_shader: "standard".to_string(),
    };
    std::fs::write(&files.shaders, "").unwrap();
    std::fs::write(&files.models, "header\nfloor\tplane.obj\t0 0\t0 0 1 0\t1 1 1\n").unwrap();

    let mut backend = RecordingBackend::new();
    let mut scene = Scene::new();
    let err = load_scene_files(&mut scene, &mut backend, &files, &ShaderListConfig::default()).unwrap_err();
    assert!(matches!(err, SceneError::Config(ConfigError::Row { line: 2, .. })));
}
