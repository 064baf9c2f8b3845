//! Schema migrations
//!
//! Each [`Migration`] lifts a raw table from the previous version to `to`.
//! Fields that did not exist before `to` are given the value the older
//! reader implied: a default when the field is mandatory in newer files,
//! or removal when an older reader would have ignored it.
//!
//! Migrations tolerate malformed input. Shape errors are left in place for
//! the strict reader to report with a proper path.

use super::names;
use crate::record::{Table, Value};

/// One version step
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version produced by this step
    pub to: u32,
    /// What this version introduced
    pub summary: &'static str,
    pub apply: fn(Table) -> Table,
}

/// Project file steps, in ascending order
pub const PROJECT_MIGRATIONS: &[Migration] = &[
    Migration { to: 3, summary: "particle system names", apply: project_v3 },
    Migration {
        to: 4,
        summary: "background properties and system render layers",
        apply: project_v4,
    },
    Migration { to: 5, summary: "background image color and rect", apply: project_v5 },
];

/// Config file steps, in ascending order
pub const CONFIG_MIGRATIONS: &[Migration] = &[
    Migration { to: 3, summary: "save file size limit and GUI limits", apply: config_v3 },
    Migration { to: 4, summary: "background scale and rendering layer limits", apply: config_v4 },
    Migration { to: 5, summary: "log size limit", apply: config_v5 },
    Migration { to: 6, summary: "asset search paths", apply: config_v6 },
    Migration { to: 7, summary: "GUI style", apply: config_v7 },
    Migration { to: 8, summary: "resizable window", apply: config_v8 },
    Migration { to: 9, summary: "buffer mapping and vsync", apply: config_v9 },
    Migration { to: 10, summary: "frame limit", apply: config_v10 },
    Migration { to: 11, summary: "startup script", apply: config_v11 },
];

/// Apply every step above `from`, in order
pub fn migrate(table: Table, from: u32, migrations: &[Migration]) -> Table {
    migrations.iter().filter(|m| m.to > from).fold(table, |table, m| (m.apply)(table))
}

/// Steps that would run for a file at version `from`
pub fn pending(from: u32, migrations: &[Migration]) -> impl Iterator<Item = &Migration> {
    migrations.iter().filter(move |m| m.to > from)
}

fn float(v: f32) -> Value {
    Value::Float(v as f64)
}

fn color_table(r: f32, g: f32, b: f32, a: f32) -> Value {
    Value::Table(Table::from_fields([("r", float(r)), ("g", float(g)), ("b", float(b)), ("a", float(a))]))
}

fn for_each_system(table: &mut Table, mut f: impl FnMut(&mut Table)) {
    if let Some(systems) = table.get_table_mut(names::PARTICLE_SYSTEMS) {
        for system in systems.array_mut() {
            if let Value::Table(system) = system {
                f(system);
            }
        }
    }
}

fn project_v3(mut table: Table) -> Table {
    // Names were not read before version 3
    for_each_system(&mut table, |system| {
        system.insert(names::NAME, Value::Str(String::new()));
    });
    table
}

fn project_v4(mut table: Table) -> Table {
    let background = Table::from_fields([
        (names::BACKGROUND_COLOR, color_table(0.0, 0.0, 0.0, 1.0)),
        (names::BACKGROUND_IMAGE, Value::Str(String::new())),
        (
            names::BACKGROUND_IMAGE_POSITION,
            Value::Table(Table::from_fields([("x", float(0.5)), ("y", float(0.5))])),
        ),
        (names::BACKGROUND_IMAGE_SCALE, float(1.0)),
        (names::BACKGROUND_IMAGE_LAYER, Value::Int(0)),
    ]);
    table.insert(names::BACKGROUND_PROPERTIES, Value::Table(background));

    for_each_system(&mut table, |system| {
        system.insert(names::LAYER, Value::Int(1));
    });
    table
}

fn project_v5(mut table: Table) -> Table {
    if let Some(background) = table.get_table_mut(names::BACKGROUND_PROPERTIES) {
        background.insert(names::BACKGROUND_IMAGE_COLOR, color_table(1.0, 1.0, 1.0, 1.0));
        background.insert(
            names::BACKGROUND_IMAGE_RECT,
            Value::Table(Table::from_fields([
                ("x", Value::Int(0)),
                ("y", Value::Int(0)),
                ("w", Value::Int(0)),
                ("h", Value::Int(0)),
            ])),
        );
    }
    table
}

/// Config field names
pub(crate) mod cfg {
    pub const VERSION: &str = "config_version";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const FULLSCREEN: &str = "fullscreen";
    pub const RESIZABLE: &str = "resizable";
    pub const FRAME_LIMIT: &str = "frame_limit";
    pub const BUFFER_MAPPING: &str = "buffer_mapping";
    pub const VBO_SIZE: &str = "vbo_size";
    pub const IBO_SIZE: &str = "ibo_size";
    pub const VSYNC: &str = "vsync";
    pub const BATCHING: &str = "batching";
    pub const CULLING: &str = "culling";
    pub const SAVEFILE_MAXSIZE: &str = "savefile_maxsize";
    pub const LOG_MAXSIZE: &str = "log_maxsize";
    pub const STARTUP_SCRIPT_NAME: &str = "startup_script_name";
    pub const AUTO_EMISSION_ON_START: &str = "auto_emission_on_start";
    pub const SCRIPTS_PATH: &str = "scripts_path";
    pub const TEXTURES_PATH: &str = "textures_path";
    pub const BACKGROUNDS_PATH: &str = "backgrounds_path";

    pub const GUI_LIMITS: &str = "gui_limits";
    pub const MAX_BACKGROUND_IMAGE_SCALE: &str = "max_background_image_scale";
    pub const MAX_RENDERING_LAYER: &str = "max_rendering_layer";
    pub const MAX_NUM_PARTICLES: &str = "max_num_particles";
    pub const SYSTEM_POSITION_RANGE: &str = "system_position_range";
    pub const MIN_PARTICLE_SCALE: &str = "min_particle_scale";
    pub const MAX_PARTICLE_SCALE: &str = "max_particle_scale";
    pub const MIN_PARTICLE_ANGLE: &str = "min_particle_angle";
    pub const MAX_PARTICLE_ANGLE: &str = "max_particle_angle";
    pub const POSITION_RANGE: &str = "position_range";
    pub const VELOCITY_RANGE: &str = "velocity_range";
    pub const MAX_RANDOM_LIFE: &str = "max_random_life";
    pub const RANDOM_POSITION_RANGE: &str = "random_position_range";
    pub const RANDOM_VELOCITY_RANGE: &str = "random_velocity_range";
    pub const MAX_DELAY: &str = "max_delay";

    pub const GUI_STYLE: &str = "gui_style";
    pub const STYLE_INDEX: &str = "style_index";
    pub const FRAME_ROUNDING: &str = "frame_rounding";
    pub const WINDOW_BORDER: &str = "window_border";
    pub const FRAME_BORDER: &str = "frame_border";
    pub const POPUP_BORDER: &str = "popup_border";
    pub const SCALING: &str = "scaling";
}

fn config_v3(mut table: Table) -> Table {
    table.remove(cfg::SAVEFILE_MAXSIZE);
    table.remove(cfg::GUI_LIMITS);
    table
}

fn config_v4(mut table: Table) -> Table {
    if let Some(limits) = table.get_table_mut(cfg::GUI_LIMITS) {
        limits.remove(cfg::MAX_BACKGROUND_IMAGE_SCALE);
        limits.remove(cfg::MAX_RENDERING_LAYER);
    }
    table
}

fn config_v5(mut table: Table) -> Table {
    table.remove(cfg::LOG_MAXSIZE);
    table
}

fn config_v6(mut table: Table) -> Table {
    table.insert(cfg::SCRIPTS_PATH, Value::Str("scripts/".to_string()));
    table.insert(cfg::TEXTURES_PATH, Value::Str("textures/".to_string()));
    table.insert(cfg::BACKGROUNDS_PATH, Value::Str("backgrounds/".to_string()));
    table
}

fn config_v7(mut table: Table) -> Table {
    table.remove(cfg::GUI_STYLE);
    table
}

fn config_v8(mut table: Table) -> Table {
    table.remove(cfg::RESIZABLE);
    table
}

fn config_v9(mut table: Table) -> Table {
    table.remove(cfg::BUFFER_MAPPING);
    table.remove(cfg::VSYNC);
    table
}

fn config_v10(mut table: Table) -> Table {
    table.remove(cfg::FRAME_LIMIT);
    table
}

fn config_v11(mut table: Table) -> Table {
    table.insert(cfg::STARTUP_SCRIPT_NAME, Value::Str(String::new()));
    table.remove(cfg::AUTO_EMISSION_ON_START);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_VERSION;
    use crate::record::parse;

    #[test]
    fn test_migration_lists_are_ordered() {
        for list in [PROJECT_MIGRATIONS, CONFIG_MIGRATIONS] {
            assert!(list.windows(2).all(|w| w[0].to < w[1].to));
        }
        assert_eq!(PROJECT_MIGRATIONS.last().map(|m| m.to), Some(super::super::PROJECT_FILE_VERSION));
        assert_eq!(CONFIG_MIGRATIONS.last().map(|m| m.to), Some(CONFIG_FILE_VERSION));
    }

    #[test]
    fn test_pending_steps() {
        assert_eq!(pending(1, PROJECT_MIGRATIONS).count(), 3);
        assert_eq!(pending(4, PROJECT_MIGRATIONS).count(), 1);
        assert_eq!(pending(5, PROJECT_MIGRATIONS).count(), 0);
        assert_eq!(pending(10, CONFIG_MIGRATIONS).count(), 1);
    }

    #[test]
    fn test_project_v3_overrides_names() {
        let table = parse("particle_systems = { {name = \"ignored\"}, 7 }").unwrap();
        let table = project_v3(table);
        let systems = table.get("particle_systems").and_then(Value::as_table).unwrap();
        let first = systems.array()[0].as_table().unwrap();
        assert_eq!(first.get("name"), Some(&Value::Str(String::new())));
        // Non-table entries are left for the reader to reject
        assert_eq!(systems.array()[1], Value::Int(7));
    }

    #[test]
    fn test_project_v4_adds_background_and_layers() {
        let table = parse("particle_systems = { {} }").unwrap();
        let table = project_v4(table);
        let background = table.get("background_properties").and_then(Value::as_table).unwrap();
        assert_eq!(background.get("background_image_layer"), Some(&Value::Int(0)));
        let systems = table.get("particle_systems").and_then(Value::as_table).unwrap();
        let first = systems.array()[0].as_table().unwrap();
        assert_eq!(first.get("layer"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_project_v5_only_touches_existing_background() {
        let table = project_v5(Table::new());
        assert!(!table.contains("background_properties"));

        let table = project_v5(parse("background_properties = {}").unwrap());
        let background = table.get("background_properties").and_then(Value::as_table).unwrap();
        assert!(background.contains("background_image_color"));
        assert!(background.contains("background_image_rect"));
    }

    #[test]
    fn test_config_migrations_drop_unknown_fields() {
        let table = parse(
            "config_version = 2\nsavefile_maxsize = 99\nvsync = false\nwidth = 800\ngui_limits = {max_delay = 1}",
        )
        .unwrap();
        let table = migrate(table, 2, CONFIG_MIGRATIONS);
        assert!(!table.contains("savefile_maxsize"));
        assert!(!table.contains("vsync"));
        assert!(!table.contains("gui_limits"));
        assert_eq!(table.get("width"), Some(&Value::Int(800)));
        assert_eq!(table.get("textures_path"), Some(&Value::Str("textures/".to_string())));
        assert_eq!(table.get("startup_script_name"), Some(&Value::Str(String::new())));
    }

    #[test]
    fn test_config_v4_strips_new_limits() {
        let table = parse("gui_limits = {max_rendering_layer = 3, max_delay = 2}").unwrap();
        let table = config_v4(table);
        let limits = table.get("gui_limits").and_then(Value::as_table).unwrap();
        assert!(!limits.contains("max_rendering_layer"));
        assert!(limits.contains("max_delay"));
    }
}
