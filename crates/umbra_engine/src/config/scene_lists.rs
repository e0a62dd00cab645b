//! Tab-separated scene list files
//!
//! Scene content is authored as plain text tables, one entity per row:
//!
//! ```text
//! name    path                    position   rotation     scale      [tint]     [cull]     [shader]
//! floor   resources/obj/plane.obj 0 0 0      0 0 1 0      5 5 5
//! room    resources/obj/cube.obj  0 2 0      0 0 1 0      6 3 6      1 1 1      reversed   standard
//! ```
//!
//! Columns are separated by tabs, vector components by spaces. The first line of the
//! model and light lists is a header and is discarded; blank lines are skipped
//! everywhere. The shader list has no header and holds one base name per line.

use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::foundation::math::{utils::parse_floats, Vec3};
use crate::render::backend::CullMode;
use crate::render::lighting::{DirectionalLight, PointLight};

/// One row of the model list
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    /// Unique model name
    pub name: String,
    /// OBJ file to load
    pub path: PathBuf,
    /// World position
    pub position: Vec3,
    /// Rotation angle in degrees
    pub rotation_angle: f32,
    /// Rotation axis
    pub rotation_axis: Vec3,
    /// Per-axis scale
    pub scale: Vec3,
    /// Flat tint, when the optional sixth column is present
    pub tint: Option<Vec3>,
    /// Culling policy during shadow capture, from the optional seventh column
    pub capture_cull: CullMode,
    /// Lit-pass shader, from the optional eighth column
    pub shader: Option<String>,
}

/// A light row: its name and the parsed light
pub type NamedLight<L> = (String, L);

fn columns(line: &str) -> Vec<&str> {
    line.trim_end_matches('\r').split('\t').map(str::trim).collect()
}

fn vec3_column(text: &str, what: &str) -> Result<Vec3, String> {
    match parse_floats(text).as_deref() {
        Some([x, y, z]) => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("{what}: expected three numbers, got '{text}'")),
    }
}

fn float_column(text: &str, what: &str) -> Result<f32, String> {
    text.parse()
        .map_err(|_| format!("{what}: expected a number, got '{text}'"))
}

fn require_columns<'a>(cols: &'a [&'a str], min: usize, kind: &str) -> Result<(), String> {
    if cols.len() < min {
        return Err(format!(
            "{kind} row needs at least {min} tab-separated columns, found {}",
            cols.len()
        ));
    }
    Ok(())
}

/// Parse one model row
pub fn parse_model_row(line: &str) -> Result<ModelEntry, String> {
    let cols = columns(line);
    require_columns(&cols, 5, "model")?;

    let (rotation_angle, rotation_axis) = match parse_floats(cols[3]).as_deref() {
        Some([angle, x, y, z]) => (*angle, Vec3::new(*x, *y, *z)),
        _ => {
            return Err(format!(
                "rotation: expected 'angle x y z', got '{}'",
                cols[3]
            ))
        }
    };

    let tint = match cols.get(5) {
        Some(text) if !text.is_empty() => Some(vec3_column(text, "tint")?),
        _ => None,
    };
    let capture_cull = match cols.get(6) {
        Some(text) => text.parse()?,
        None => CullMode::Default,
    };
    let shader = cols
        .get(7)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string());

    Ok(ModelEntry {
        name: cols[0].to_string(),
        path: PathBuf::from(cols[1]),
        position: vec3_column(cols[2], "position")?,
        rotation_angle,
        rotation_axis,
        scale: vec3_column(cols[4], "scale")?,
        tint,
        capture_cull,
        shader,
    })
}

/// Parse one point-light row
pub fn parse_point_light_row(line: &str) -> Result<NamedLight<PointLight>, String> {
    let cols = columns(line);
    require_columns(&cols, 8, "point light")?;

    let light = PointLight::new(
        vec3_column(cols[1], "position")?,
        vec3_column(cols[2], "ambient")?,
        vec3_column(cols[3], "diffuse")?,
        vec3_column(cols[4], "specular")?,
        float_column(cols[5], "kc")?,
        float_column(cols[6], "kl")?,
        float_column(cols[7], "kq")?,
    );
    Ok((cols[0].to_string(), light))
}

/// Parse one directional-light row
pub fn parse_directional_light_row(line: &str) -> Result<NamedLight<DirectionalLight>, String> {
    let cols = columns(line);
    require_columns(&cols, 5, "directional light")?;

    let light = DirectionalLight::new(
        vec3_column(cols[1], "direction")?,
        vec3_column(cols[2], "ambient")?,
        vec3_column(cols[3], "diffuse")?,
        vec3_column(cols[4], "specular")?,
    );
    Ok((cols[0].to_string(), light))
}

/// Parse a headed table, reporting the first bad row with its line number
fn parse_table<T>(
    text: &str,
    file: &str,
    parse_row: impl Fn(&str) -> Result<T, String>,
) -> Result<Vec<T>, ConfigError> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_row(line).map_err(|message| ConfigError::Row {
                file: file.to_string(),
                line: index + 1,
                message,
            })
        })
        .collect()
}

/// Parse model list text
pub fn parse_model_list(text: &str, file: &str) -> Result<Vec<ModelEntry>, ConfigError> {
    parse_table(text, file, parse_model_row)
}

/// Parse point-light list text
pub fn parse_point_light_list(
    text: &str,
    file: &str,
) -> Result<Vec<NamedLight<PointLight>>, ConfigError> {
    parse_table(text, file, parse_point_light_row)
}

/// Parse directional-light list text
pub fn parse_directional_light_list(
    text: &str,
    file: &str,
) -> Result<Vec<NamedLight<DirectionalLight>>, ConfigError> {
    parse_table(text, file, parse_directional_light_row)
}

/// Parse shader list text: one base name per non-blank line, `#` starts a comment line
pub fn parse_shader_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read(path: &Path) -> Result<(String, String), ConfigError> {
    let text = std::fs::read_to_string(path)?;
    Ok((text, path.display().to_string()))
}

/// Load the model list
pub fn load_model_list(path: impl AsRef<Path>) -> Result<Vec<ModelEntry>, ConfigError> {
    let (text, file) = read(path.as_ref())?;
    parse_model_list(&text, &file)
}

/// Load the point-light list
pub fn load_point_light_list(
    path: impl AsRef<Path>,
) -> Result<Vec<NamedLight<PointLight>>, ConfigError> {
    let (text, file) = read(path.as_ref())?;
    parse_point_light_list(&text, &file)
}

/// Load the directional-light list
pub fn load_directional_light_list(
    path: impl AsRef<Path>,
) -> Result<Vec<NamedLight<DirectionalLight>>, ConfigError> {
    let (text, file) = read(path.as_ref())?;
    parse_directional_light_list(&text, &file)
}

/// Load the shader list
pub fn load_shader_list(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
    let (text, _) = read(path.as_ref())?;
    Ok(parse_shader_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_light_row() {
        let (name, light) =
            parse_point_light_row("L0\t1 2 3\t0.1 0.1 0.1\t0.5 0.5 0.5\t1 1 1\t1.0\t0.09\t0.032")
                .unwrap();

        assert_eq!(name, "L0");
        assert_eq!(light.position, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(light.ambient, Vec3::repeat(0.1));
        assert_relative_eq!(light.diffuse, Vec3::repeat(0.5));
        assert_relative_eq!(light.specular, Vec3::repeat(1.0));
        assert_relative_eq!(light.constant, 1.0);
        assert_relative_eq!(light.linear, 0.09);
        assert_relative_eq!(light.quadratic, 0.032);
    }

    #[test]
    fn test_model_row_with_optional_columns() {
        let entry = parse_model_row(
            "room\tresources/obj/cube.obj\t0 2 0\t30 0 1 0\t6 3 6\t0.8 0.7 0.6\treversed\tlight",
        )
        .unwrap();

        assert_eq!(entry.name, "room");
        assert_eq!(entry.path, PathBuf::from("resources/obj/cube.obj"));
        assert_eq!(entry.rotation_angle, 30.0);
        assert_eq!(entry.rotation_axis, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(entry.scale, Vec3::new(6.0, 3.0, 6.0));
        assert_eq!(entry.tint, Some(Vec3::new(0.8, 0.7, 0.6)));
        assert_eq!(entry.capture_cull, CullMode::Reversed);
        assert_eq!(entry.shader.as_deref(), Some("light"));
    }

    #[test]
    fn test_model_row_minimal() {
        let entry = parse_model_row("floor\tplane.obj\t0 0 0\t0 0 0 0\t5 5 5").unwrap();
        assert_eq!(entry.tint, None);
        assert_eq!(entry.capture_cull, CullMode::Default);
        assert_eq!(entry.shader, None);
    }

    #[test]
    fn test_directional_light_row() {
        let (name, light) =
            parse_directional_light_row("sun\t-0.2 -1 -0.3\t0.05 0.05 0.05\t0.4 0.4 0.4\t0.5 0.5 0.5")
                .unwrap();
        assert_eq!(name, "sun");
        assert_relative_eq!(light.direction, Vec3::new(-0.2, -1.0, -0.3));
    }

    #[test]
    fn test_table_skips_header_and_blank_lines() {
        let text = "name\tdirection\tambient\tdiffuse\tspecular\n\
                    \n\
                    a\t0 -1 0\t0 0 0\t1 1 1\t1 1 1\n\
                    \n\
                    b\t1 0 0\t0 0 0\t1 1 1\t1 1 1\n";
        let lights = parse_directional_light_list(text, "dlights.tsv").unwrap();
        let names: Vec<_> = lights.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_bad_row_reports_line_number() {
        let text = "header\nL0\t1 2 3\t0 0 0\t0 0 0\t0 0 0\t1\t0\t0\nL1\t1 2\t0 0 0\t0 0 0\t0 0 0\t1\t0\t0\n";
        let err = parse_point_light_list(text, "plights.tsv").unwrap_err();
        match err {
            ConfigError::Row { file, line, message } => {
                assert_eq!(file, "plights.tsv");
                assert_eq!(line, 3);
                assert!(message.contains("position"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shader_list() {
        let names = parse_shader_list("standard\n\n# debugging\nlight\r\n  depth  \n");
        assert_eq!(names, vec!["standard", "light", "depth"]);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.tsv");
        std::fs::write(&path, "name\tpath\tposition\trotation\tscale\nfloor\tplane.obj\t0 0 0\t0 0 1 0\t5 5 5\n")
            .unwrap();
        let models = load_model_list(&path).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].scale, Vec3::repeat(5.0));
    }
}
