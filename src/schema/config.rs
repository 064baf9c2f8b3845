//! `config.lua` reading and writing
//!
//! Fields that every config version carried are read leniently: an absent
//! field keeps its default. Fields inserted by migrations are mandatory in
//! the strict reader since a migrated table always has them.

use super::migrate::{self, cfg};
use super::SchemaError;
use crate::config::{Config, GuiLimits, GuiStyle, CONFIG_FILE_VERSION};
use crate::record::{self, boolean, integer, number, string, FieldError, FromValue, Record, RecordWriter, Table};

fn read_into<T: FromValue>(record: &Record, name: &str, slot: &mut T) -> Result<(), FieldError> {
    if let Some(value) = record.try_field(name)? {
        *slot = value;
    }
    Ok(())
}

fn read_gui_limits(root: &Record, limits: &mut GuiLimits) -> Result<(), FieldError> {
    let Some(table) = root.try_record(cfg::GUI_LIMITS)? else {
        return Ok(());
    };
    read_into(&table, cfg::MAX_BACKGROUND_IMAGE_SCALE, &mut limits.max_background_image_scale)?;
    read_into(&table, cfg::MAX_RENDERING_LAYER, &mut limits.max_rendering_layer)?;
    read_into(&table, cfg::MAX_NUM_PARTICLES, &mut limits.max_num_particles)?;
    read_into(&table, cfg::SYSTEM_POSITION_RANGE, &mut limits.system_position_range)?;
    read_into(&table, cfg::MIN_PARTICLE_SCALE, &mut limits.min_particle_scale)?;
    read_into(&table, cfg::MAX_PARTICLE_SCALE, &mut limits.max_particle_scale)?;
    read_into(&table, cfg::MIN_PARTICLE_ANGLE, &mut limits.min_particle_angle)?;
    read_into(&table, cfg::MAX_PARTICLE_ANGLE, &mut limits.max_particle_angle)?;
    read_into(&table, cfg::POSITION_RANGE, &mut limits.position_range)?;
    read_into(&table, cfg::VELOCITY_RANGE, &mut limits.velocity_range)?;
    read_into(&table, cfg::MAX_RANDOM_LIFE, &mut limits.max_random_life)?;
    read_into(&table, cfg::RANDOM_POSITION_RANGE, &mut limits.random_position_range)?;
    read_into(&table, cfg::RANDOM_VELOCITY_RANGE, &mut limits.random_velocity_range)?;
    read_into(&table, cfg::MAX_DELAY, &mut limits.max_delay)?;
    Ok(())
}

fn read_gui_style(root: &Record, style: &mut GuiStyle) -> Result<(), FieldError> {
    let Some(table) = root.try_record(cfg::GUI_STYLE)? else {
        return Ok(());
    };
    read_into(&table, cfg::STYLE_INDEX, &mut style.style_index)?;
    read_into(&table, cfg::FRAME_ROUNDING, &mut style.frame_rounding)?;
    read_into(&table, cfg::WINDOW_BORDER, &mut style.window_border)?;
    read_into(&table, cfg::FRAME_BORDER, &mut style.frame_border)?;
    read_into(&table, cfg::POPUP_BORDER, &mut style.popup_border)?;
    read_into(&table, cfg::SCALING, &mut style.scaling)?;
    Ok(())
}

/// Read the declared config version, defaulting to 1
pub fn config_version(table: &Table) -> Result<u32, SchemaError> {
    Ok(Record::root(table).field_or(cfg::VERSION, 1u32)?)
}

/// Read a config from parsed record text, then sanitize it
pub fn read_config_table(table: Table) -> Result<Config, SchemaError> {
    let mut config = read_config_table_unsanitized(table)?;
    config.sanitize();
    Ok(config)
}

/// Read a config from parsed record text without running the sanitizers
pub fn read_config_table_unsanitized(table: Table) -> Result<Config, SchemaError> {
    let version = config_version(&table)?;
    if version > CONFIG_FILE_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            kind: "config",
            found: version,
            max: CONFIG_FILE_VERSION,
        });
    }

    let table = migrate::migrate(table, version, migrate::CONFIG_MIGRATIONS);
    let root = Record::root(&table);
    let mut config = Config::default();

    read_into(&root, cfg::WIDTH, &mut config.width)?;
    read_into(&root, cfg::HEIGHT, &mut config.height)?;
    read_into(&root, cfg::FULLSCREEN, &mut config.fullscreen)?;
    read_into(&root, cfg::RESIZABLE, &mut config.resizable)?;
    read_into(&root, cfg::FRAME_LIMIT, &mut config.frame_limit)?;
    read_into(&root, cfg::BUFFER_MAPPING, &mut config.buffer_mapping)?;
    read_into(&root, cfg::VBO_SIZE, &mut config.vbo_size)?;
    read_into(&root, cfg::IBO_SIZE, &mut config.ibo_size)?;
    read_into(&root, cfg::VSYNC, &mut config.vsync)?;
    read_into(&root, cfg::BATCHING, &mut config.batching)?;
    read_into(&root, cfg::CULLING, &mut config.culling)?;
    read_into(&root, cfg::SAVEFILE_MAXSIZE, &mut config.savefile_maxsize)?;
    read_into(&root, cfg::LOG_MAXSIZE, &mut config.log_maxsize)?;
    config.startup_script_name = root.field(cfg::STARTUP_SCRIPT_NAME)?;
    read_into(&root, cfg::AUTO_EMISSION_ON_START, &mut config.auto_emission_on_start)?;
    config.scripts_path = root.field(cfg::SCRIPTS_PATH)?;
    config.textures_path = root.field(cfg::TEXTURES_PATH)?;
    config.backgrounds_path = root.field(cfg::BACKGROUNDS_PATH)?;

    read_gui_limits(&root, &mut config.gui_limits)?;
    read_gui_style(&root, &mut config.gui_style)?;
    Ok(config)
}

/// Read a `config.lua` file's text
pub fn read_config(source: &str) -> Result<Config, SchemaError> {
    read_config_table(record::parse(source)?)
}

/// Read a `config.lua` file's text without running the sanitizers, so
/// [`Config::validate`] can report what they would change
pub fn read_config_unsanitized(source: &str) -> Result<Config, SchemaError> {
    read_config_table_unsanitized(record::parse(source)?)
}

/// Serialize a config as the current file version.
///
/// Window, buffer and limit sanitizers run on a copy first so that a
/// written file never holds values a later read would have to coerce.
pub fn write_config(config: &Config) -> String {
    let mut config = config.clone();
    config.sanitize_init();
    config.sanitize_gui_limits();

    let mut w = RecordWriter::new();
    w.field(cfg::VERSION, &integer(CONFIG_FILE_VERSION as i64), false);
    w.field(cfg::WIDTH, &integer(config.width as i64), false);
    w.field(cfg::HEIGHT, &integer(config.height as i64), false);
    w.field(cfg::FULLSCREEN, &boolean(config.fullscreen), false);
    w.field(cfg::RESIZABLE, &boolean(config.resizable), false);
    w.field(cfg::FRAME_LIMIT, &integer(config.frame_limit as i64), false);
    w.field(cfg::BUFFER_MAPPING, &boolean(config.buffer_mapping), false);
    w.field(cfg::VBO_SIZE, &config.vbo_size.to_string(), false);
    w.field(cfg::IBO_SIZE, &config.ibo_size.to_string(), false);
    w.field(cfg::VSYNC, &boolean(config.vsync), false);
    w.field(cfg::BATCHING, &boolean(config.batching), false);
    w.field(cfg::CULLING, &boolean(config.culling), false);
    w.field(cfg::SAVEFILE_MAXSIZE, &integer(config.savefile_maxsize as i64), false);
    w.field(cfg::LOG_MAXSIZE, &integer(config.log_maxsize as i64), false);
    w.field(cfg::STARTUP_SCRIPT_NAME, &string(&config.startup_script_name), false);
    w.field(cfg::AUTO_EMISSION_ON_START, &boolean(config.auto_emission_on_start), false);
    w.field(cfg::SCRIPTS_PATH, &string(&config.scripts_path), false);
    w.field(cfg::TEXTURES_PATH, &string(&config.textures_path), false);
    w.field(cfg::BACKGROUNDS_PATH, &string(&config.backgrounds_path), false);
    w.blank();

    let limits = &config.gui_limits;
    w.open(cfg::GUI_LIMITS);
    w.field(cfg::MAX_BACKGROUND_IMAGE_SCALE, &number(limits.max_background_image_scale), true);
    w.field(cfg::MAX_RENDERING_LAYER, &integer(limits.max_rendering_layer as i64), true);
    w.field(cfg::MAX_NUM_PARTICLES, &integer(limits.max_num_particles as i64), true);
    w.field(cfg::SYSTEM_POSITION_RANGE, &number(limits.system_position_range), true);
    w.field(cfg::MIN_PARTICLE_SCALE, &number(limits.min_particle_scale), true);
    w.field(cfg::MAX_PARTICLE_SCALE, &number(limits.max_particle_scale), true);
    w.field(cfg::MIN_PARTICLE_ANGLE, &number(limits.min_particle_angle), true);
    w.field(cfg::MAX_PARTICLE_ANGLE, &number(limits.max_particle_angle), true);
    w.field(cfg::POSITION_RANGE, &number(limits.position_range), true);
    w.field(cfg::VELOCITY_RANGE, &number(limits.velocity_range), true);
    w.field(cfg::MAX_RANDOM_LIFE, &number(limits.max_random_life), true);
    w.field(cfg::RANDOM_POSITION_RANGE, &number(limits.random_position_range), true);
    w.field(cfg::RANDOM_VELOCITY_RANGE, &number(limits.random_velocity_range), true);
    w.field(cfg::MAX_DELAY, &number(limits.max_delay), false);
    w.close("");
    w.blank();

    let style = &config.gui_style;
    w.open(cfg::GUI_STYLE);
    w.field(cfg::STYLE_INDEX, &integer(style.style_index as i64), true);
    w.field(cfg::FRAME_ROUNDING, &number(style.frame_rounding), true);
    w.field(cfg::WINDOW_BORDER, &boolean(style.window_border), true);
    w.field(cfg::FRAME_BORDER, &boolean(style.frame_border), true);
    w.field(cfg::POPUP_BORDER, &boolean(style.popup_border), true);
    w.field(cfg::SCALING, &number(style.scaling), false);
    w.close("");

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        assert_eq!(read_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_v2_file_keeps_known_fields() {
        let config = read_config(
            "config_version = 2\nwidth = 1920\nheight = 1080\nfullscreen = true\nvsync = false\nlog_maxsize = 100000",
        )
        .unwrap();
        assert_eq!(config.width, 1920);
        assert_eq!(config.height, 1080);
        assert!(config.fullscreen);
        // Not part of version 2 files, so the value is ignored
        assert!(config.vsync);
        assert_eq!(config.log_maxsize, 4096);
    }

    #[test]
    fn test_v11_fields_are_read() {
        let config = read_config(
            "config_version = 11\nstartup_script_name = \"boot.lua\"\nscripts_path = \"s/\"\n\
             textures_path = \"t/\"\nbackgrounds_path = \"b/\"\nframe_limit = 60\n\
             gui_limits = {max_delay = 2.5, max_num_particles = 0}\ngui_style = {style_index = 5}",
        )
        .unwrap();
        assert_eq!(config.startup_script_name, "boot.lua");
        assert_eq!(config.textures_path, "t/");
        assert_eq!(config.frame_limit, 60);
        assert_eq!(config.gui_limits.max_delay, 2.5);
        // Sanitized on read
        assert_eq!(config.gui_limits.max_num_particles, 1);
        assert_eq!(config.gui_style.style_index, 2);
    }

    #[test]
    fn test_unsanitized_read_keeps_values() {
        let source = "config_version = 11\nwidth = 100\ngui_style = {scaling = 9}\n\
                      startup_script_name = \"\"\nscripts_path = \"s/\"\n\
                      textures_path = \"t/\"\nbackgrounds_path = \"b/\"";
        let raw = read_config_unsanitized(source).unwrap();
        assert_eq!(raw.width, 100);
        assert_eq!(raw.validate().len(), 2);
        assert_eq!(read_config(source).unwrap().width, 640);
    }

    #[test]
    fn test_unsanitized_read_of_v1_drops_gui_style() {
        let raw = read_config_unsanitized("width = 100\ngui_style = {scaling = 9}").unwrap();
        let issues = raw.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "width");
    }

    #[test]
    fn test_v11_requires_paths() {
        let err = read_config("config_version = 11\nstartup_script_name = \"\"").unwrap_err();
        assert_eq!(err.to_string(), "missing field 'scripts_path'");
    }

    #[test]
    fn test_wrong_type() {
        let err = read_config("width = \"wide\"").unwrap_err();
        assert!(matches!(err, SchemaError::Field(FieldError::WrongType { .. })));
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = read_config("config_version = 12").unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedVersion { kind: "config", found: 12, max: 11 });
    }

    #[test]
    fn test_write_layout() {
        let text = write_config(&Config::default());
        assert!(text.starts_with("config_version = 11\nwidth = 1280\nheight = 720\n"));
        assert!(text.contains("\nbackgrounds_path = \"backgrounds/\"\n\ngui_limits =\n{\n"));
        assert!(text.contains("\tmax_delay = 5.000000\n}\n\ngui_style =\n{\n"));
        assert!(text.ends_with("\tscaling = 1.000000\n}\n"));
    }

    #[test]
    fn test_write_sanitizes_copy() {
        let mut config = Config::default();
        config.width = 100;
        config.gui_limits.min_particle_scale = 4.0;
        let text = write_config(&config);
        assert!(text.contains("width = 640\n"));
        assert!(text.contains("\tmin_particle_scale = 2.000000,\n"));
        assert!(text.contains("\tmax_particle_scale = 4.000000,\n"));
        assert_eq!(config.width, 100);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.startup_script_name = "intro.lua".to_string();
        config.gui_style.scaling = 1.25;
        config.gui_limits.max_rendering_layer = 3;
        let text = write_config(&config);
        let back = read_config(&text).unwrap();
        assert_eq!(back, config);
        assert_eq!(write_config(&back), text);
    }
}
