//! Versioned project and config file schema
//!
//! The persisted formats have gone through several revisions. Reading is a
//! three step pipeline:
//!
//! 1. parse the text into a raw [`Table`] tree ([`crate::record::parse`]),
//! 2. fold the migrations in [`migrate`] that lie above the file's version,
//!    each a pure `Table -> Table` function that fills in the fields its
//!    version introduced,
//! 3. read the result with the strict latest-version reader.
//!
//! Any error at any step aborts the whole read; no partial [`State`] is
//! ever returned. Writing always targets the newest version.

pub mod config;
pub mod migrate;
mod reader;
mod writer;

pub use config::{
    read_config, read_config_table, read_config_table_unsanitized, read_config_unsanitized,
    write_config,
};
pub use reader::read_state;
pub use writer::write_state;

use crate::descriptor::BlendingPreset;
use crate::initializer::ParticleInitializer;
use crate::math::{Colorf, Recti, Vector2f};
use crate::record::{self, FieldError, Record, SyntaxError, Table};
use crate::steps::Step;
use serde::Serialize;
use thiserror::Error;

/// Project file version written by [`write_project`]
pub const PROJECT_FILE_VERSION: u32 = 5;

/// Field names used in project files
pub(crate) mod names {
    pub const VERSION: &str = "project_version";
    pub const NORMALIZED_ABS_POSITION: &str = "normalized_absolute_position";
    pub const PARTICLE_SYSTEMS: &str = "particle_systems";

    pub const BACKGROUND_PROPERTIES: &str = "background_properties";
    pub const BACKGROUND_COLOR: &str = "background_color";
    pub const BACKGROUND_IMAGE: &str = "background_image";
    pub const BACKGROUND_IMAGE_POSITION: &str = "background_image_normalized_position";
    pub const BACKGROUND_IMAGE_SCALE: &str = "background_image_scale";
    pub const BACKGROUND_IMAGE_LAYER: &str = "background_image_layer";
    pub const BACKGROUND_IMAGE_COLOR: &str = "background_image_color";
    pub const BACKGROUND_IMAGE_RECT: &str = "background_image_rect";
    pub const BACKGROUND_IMAGE_FLIPPED_X: &str = "background_image_flipped_x";
    pub const BACKGROUND_IMAGE_FLIPPED_Y: &str = "background_image_flipped_y";

    pub const NAME: &str = "name";
    pub const NUM_PARTICLES: &str = "num_particles";
    pub const TEXTURE: &str = "texture";
    pub const TEXTURE_RECT: &str = "texture_rect";
    pub const ANCHOR_POINT: &str = "anchor_point";
    pub const FLIPPED_X: &str = "flipped_x";
    pub const FLIPPED_Y: &str = "flipped_y";
    pub const BLENDING_PRESET: &str = "blending_preset";
    pub const RELATIVE_POSITION: &str = "relative_position";
    pub const LAYER: &str = "layer";
    pub const LOCAL_SPACE: &str = "local_space";
    pub const ACTIVE: &str = "active";

    pub const COLOR_STEPS: &str = "color_steps";
    pub const SIZE_STEPS: &str = "size_steps";
    pub const BASE_SCALE: &str = "base_scale";
    pub const ROTATION_STEPS: &str = "rotation_steps";
    pub const POSITION_STEPS: &str = "position_steps";
    pub const VELOCITY_STEPS: &str = "velocity_steps";

    pub const EMISSION: &str = "emission";
    pub const AMOUNT: &str = "amount";
    pub const LIFE: &str = "life";
    pub const POSITION_X: &str = "position_x";
    pub const POSITION_Y: &str = "position_y";
    pub const VELOCITY_X: &str = "velocity_x";
    pub const VELOCITY_Y: &str = "velocity_y";
    pub const ROTATION: &str = "rotation";
    pub const EMITTER_ROTATION: &str = "emitter_rotation";
    pub const DELAY: &str = "delay";
}

/// Error reading a project or config file
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// The text is not a valid record file
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    /// A mandatory field is absent or a field has the wrong type
    #[error("{0}")]
    Field(#[from] FieldError),
    /// The file was written by a newer version of the tool
    #[error("unsupported {kind} file version {found} (newest supported is {max})")]
    UnsupportedVersion { kind: &'static str, found: u32, max: u32 },
    /// The project declares no particle systems
    #[error("project has no particle systems")]
    NoParticleSystems,
    /// A field has the right type but an unrecognized value
    #[error("invalid value for '{path}': {message}")]
    InvalidValue { path: String, message: String },
}

/// Background of the editing viewport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundState {
    pub color: Colorf,
    /// Image file name, empty for none
    pub image_name: String,
    pub image_normalized_position: Vector2f,
    pub image_scale: f32,
    pub image_layer: i32,
    pub image_color: Colorf,
    pub image_rect: Recti,
    pub image_flipped_x: bool,
    pub image_flipped_y: bool,
}

impl Default for BackgroundState {
    fn default() -> Self {
        Self {
            color: Colorf::BLACK,
            image_name: String::new(),
            image_normalized_position: Vector2f::new(0.5, 0.5),
            image_scale: 1.0,
            image_layer: 0,
            image_color: Colorf::WHITE,
            image_rect: Recti::default(),
            image_flipped_x: false,
            image_flipped_y: false,
        }
    }
}

/// One particle system as persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemState {
    pub name: String,
    pub num_particles: i32,
    pub texture_name: String,
    pub texture_rect: Recti,
    pub anchor_point: Vector2f,
    pub flipped_x: bool,
    pub flipped_y: bool,
    pub blending_preset: BlendingPreset,
    pub position: Vector2f,
    pub layer: i32,
    pub in_local_space: bool,
    pub active: bool,
    pub color_steps: Vec<Step<Colorf>>,
    pub size_base_scale: Vector2f,
    pub size_steps: Vec<Step<Vector2f>>,
    pub rotation_steps: Vec<Step<f32>>,
    pub position_steps: Vec<Step<Vector2f>>,
    pub velocity_steps: Vec<Step<Vector2f>>,
    pub init: ParticleInitializer,
    pub emit_delay: f32,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            name: String::new(),
            num_particles: 64,
            texture_name: String::new(),
            texture_rect: Recti::default(),
            anchor_point: Vector2f::new(0.5, 0.5),
            flipped_x: false,
            flipped_y: false,
            blending_preset: BlendingPreset::Alpha,
            position: Vector2f::ZERO,
            layer: 1,
            in_local_space: false,
            active: true,
            color_steps: Vec::new(),
            size_base_scale: Vector2f::ONE,
            size_steps: Vec::new(),
            rotation_steps: Vec::new(),
            position_steps: Vec::new(),
            velocity_steps: Vec::new(),
            init: ParticleInitializer::default(),
            emit_delay: 0.0,
        }
    }
}

/// A whole project document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    /// Emitter position as a fraction of the viewport size
    pub normalized_abs_position: Vector2f,
    pub background: BackgroundState,
    pub systems: Vec<SystemState>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            normalized_abs_position: Vector2f::new(0.5, 0.5),
            background: BackgroundState::default(),
            systems: Vec::new(),
        }
    }
}

/// Read the declared project version, defaulting to 1
pub fn project_version(table: &Table) -> Result<u32, SchemaError> {
    Ok(Record::root(table).field_or(names::VERSION, 1u32)?)
}

/// Read a project from parsed record text
pub fn read_project_table(table: Table) -> Result<State, SchemaError> {
    let version = project_version(&table)?;
    if version > PROJECT_FILE_VERSION {
        return Err(SchemaError::UnsupportedVersion {
            kind: "project",
            found: version,
            max: PROJECT_FILE_VERSION,
        });
    }

    let table = migrate::migrate(table, version, migrate::PROJECT_MIGRATIONS);
    let state = read_state(&Record::root(&table))?;
    if state.systems.is_empty() {
        return Err(SchemaError::NoParticleSystems);
    }
    Ok(state)
}

/// Read a project file's text
///
/// # Example
///
/// ```
/// use pfxsrc::schema::read_project;
///
/// let source = r#"
/// particle_systems = {
///     {
///         num_particles = 32,
///         texture = "spark.png",
///         texture_rect = {x = 0, y = 0, w = 8, h = 8},
///         relative_position = {x = 0, y = 0},
///         local_space = false,
///         active = true,
///         emission = {
///             amount = {1, 2}, life = {0.5, 1.0},
///             position_x = {0, 0}, position_y = {0, 0},
///             velocity_x = {0, 0}, velocity_y = {0, 0},
///             rotation = {0, 0}, emitter_rotation = true, delay = 0
///         }
///     }
/// }
/// "#;
/// let state = read_project(source).unwrap();
/// assert_eq!(state.systems[0].layer, 1);
/// ```
pub fn read_project(source: &str) -> Result<State, SchemaError> {
    read_project_table(record::parse(source)?)
}

/// Serialize a project as the current file version
pub fn write_project(state: &State) -> String {
    write_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_version_default() {
        let table = record::parse("x = 1").unwrap();
        assert_eq!(project_version(&table), Ok(1));
        let table = record::parse("project_version = 4").unwrap();
        assert_eq!(project_version(&table), Ok(4));
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = read_project("project_version = 6\nparticle_systems = {}").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnsupportedVersion { kind: "project", found: 6, max: 5 }
        );
    }

    #[test]
    fn test_syntax_error_surfaces() {
        let err = read_project("project_version = \n").unwrap_err();
        assert!(matches!(err, SchemaError::Syntax(_)));
        assert!(err.to_string().starts_with("line "));
    }

    #[test]
    fn test_missing_systems_list() {
        let err = read_project("project_version = 3").unwrap_err();
        assert_eq!(err.to_string(), "missing field 'particle_systems'");
    }

    #[test]
    fn test_empty_systems_list() {
        let err = read_project("particle_systems = {}").unwrap_err();
        assert_eq!(err, SchemaError::NoParticleSystems);
    }
}
