//! Formatter for project and config files
//!
//! Formatting is a full read followed by a write: older files come out
//! upgraded to the newest version, hand-edited files come out in the
//! canonical layout the editor saves. A file that fails to read is never
//! rewritten.

use crate::record;
use crate::schema::{read_config_table, read_project_table, write_config, write_project, SchemaError};
use crate::validate::FileKind;
use std::path::Path;

/// Format record text as the newest project or config version.
///
/// `path` is only used to recognize `config.lua` files that do not declare
/// a `config_version`.
pub fn format_source(path: Option<&Path>, content: &str) -> Result<String, SchemaError> {
    let table = record::parse(content)?;
    match FileKind::detect(path, &table) {
        FileKind::Project => Ok(write_project(&read_project_table(table)?)),
        FileKind::Config => Ok(write_config(&read_config_table(table)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1_PROJECT: &str = r#"
normalized_absolute_position = { x = 0.5, y = 0.5 }
particle_systems =
{
    {
        num_particles = 16,
        texture = "smoke.png",
        texture_rect = { x = 0, y = 0, w = 32, h = 32 },
        relative_position = { x = 10, y = -4 },
        local_space = true,
        active = true,
        rotation_steps = { { 0, 0 }, { 1, 180 } },
        emission =
        {
            amount = { 1, 2 },
            life = { 1, 3 },
            position_x = { 0, 0 },
            position_y = { 0, 0 },
            velocity_x = { -5, 5 },
            velocity_y = { -20, -10 },
            rotation = { 0, 0 },
            emitter_rotation = false,
            delay = 0.25
        }
    }
}
"#;

    #[test]
    fn test_format_upgrades_project() {
        let formatted = format_source(Some(Path::new("smoke.lua")), V1_PROJECT).unwrap();
        assert!(formatted.starts_with("project_version = 5\n"));
        assert!(formatted.contains("background_image_layer = 0"));
        assert!(formatted.contains("layer = 1,"));
        assert!(formatted.contains("name = \"\","));
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = format_source(None, V1_PROJECT).unwrap();
        let twice = format_source(None, &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_format_config_by_name() {
        let formatted = format_source(Some(Path::new("editor/config.lua")), "width = 800").unwrap();
        assert!(formatted.starts_with("config_version = 11\n"));
        assert!(formatted.contains("width = 800\n"));
    }

    #[test]
    fn test_format_config_by_version_key() {
        let formatted = format_source(Some(Path::new("settings.lua")), "config_version = 1").unwrap();
        assert!(formatted.contains("textures_path = \"textures/\""));
    }

    #[test]
    fn test_format_rejects_broken_file() {
        let err = format_source(None, "particle_systems = { {").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax(_)));

        let err = format_source(None, "project_version = 2\nparticle_systems = {}").unwrap_err();
        assert_eq!(err, SchemaError::NoParticleSystems);
    }
}
