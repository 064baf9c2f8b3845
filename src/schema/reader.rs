//! Strict reader for the newest project schema
//!
//! Runs after migrations, so every version-gated field is present and
//! treated as mandatory. Only fields that were always optional in the
//! format (the absolute position, step tables and the descriptor
//! extensions) are read with defaults.

use super::names::*;
use super::{BackgroundState, SchemaError, State, SystemState};
use crate::descriptor::BlendingPreset;
use crate::initializer::ParticleInitializer;
use crate::math::{Colorf, Recti, Vector2f, Vector2i};
use crate::record::{FieldError, FromValue, Record, Table, Value};
use crate::steps::Step;

fn named_f32(table: &Table, name: &str) -> Option<f32> {
    table.get(name).and_then(f32::from_value)
}

fn named_i32(table: &Table, name: &str) -> Option<i32> {
    table.get(name).and_then(i32::from_value)
}

impl FromValue for Vector2f {
    const EXPECTED: &'static str = "a table {x = number, y = number}";

    fn from_value(value: &Value) -> Option<Self> {
        let t = value.as_table()?;
        Some(Vector2f::new(named_f32(t, "x")?, named_f32(t, "y")?))
    }
}

impl FromValue for Colorf {
    const EXPECTED: &'static str = "a table {r = number, g = number, b = number, a = number}";

    fn from_value(value: &Value) -> Option<Self> {
        let t = value.as_table()?;
        Some(Colorf::new(
            named_f32(t, "r")?,
            named_f32(t, "g")?,
            named_f32(t, "b")?,
            named_f32(t, "a")?,
        ))
    }
}

impl FromValue for Recti {
    const EXPECTED: &'static str = "a table {x = integer, y = integer, w = integer, h = integer}";

    fn from_value(value: &Value) -> Option<Self> {
        let t = value.as_table()?;
        Some(Recti::new(
            named_i32(t, "x")?,
            named_i32(t, "y")?,
            named_i32(t, "w")?,
            named_i32(t, "h")?,
        ))
    }
}

/// Positional `{min, max}` float range
struct Range2f(Vector2f);

impl FromValue for Range2f {
    const EXPECTED: &'static str = "a table {min, max} of numbers";

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_table()?.array() {
            [lo, hi] => Some(Range2f(Vector2f::new(f32::from_value(lo)?, f32::from_value(hi)?))),
            _ => None,
        }
    }
}

/// Positional `{min, max}` integer range
struct Range2i(Vector2i);

impl FromValue for Range2i {
    const EXPECTED: &'static str = "a table {min, max} of integers";

    fn from_value(value: &Value) -> Option<Self> {
        match value.as_table()?.array() {
            [lo, hi] => Some(Range2i(Vector2i::new(i32::from_value(lo)?, i32::from_value(hi)?))),
            _ => None,
        }
    }
}

/// A uniform number or a non-uniform `{x, y}` scale
struct Scale(Vector2f);

impl FromValue for Scale {
    const EXPECTED: &'static str = "a number or a table {x = number, y = number}";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Table(_) => Vector2f::from_value(value).map(Scale),
            other => f32::from_value(other).map(|v| Scale(Vector2f::splat(v))),
        }
    }
}

/// Read an optional `{ {age, value}, ... }` step table
fn read_steps<T, W: FromValue>(
    system: &Record,
    name: &str,
    unwrap: impl Fn(W) -> T,
) -> Result<Vec<Step<T>>, FieldError> {
    let mut steps = Vec::new();
    if let Some(table) = system.try_record(name)? {
        for i in 0..table.len() {
            let step = table.element_record(i)?;
            let age: f32 = step.element(0)?;
            let value: W = step.element(1)?;
            steps.push(Step::new(age, unwrap(value)));
        }
    }
    Ok(steps)
}

fn read_background(root: &Record) -> Result<BackgroundState, SchemaError> {
    let bg = root.record(BACKGROUND_PROPERTIES)?;
    Ok(BackgroundState {
        color: bg.field(BACKGROUND_COLOR)?,
        image_name: bg.field(BACKGROUND_IMAGE)?,
        image_normalized_position: bg.field(BACKGROUND_IMAGE_POSITION)?,
        image_scale: bg.field(BACKGROUND_IMAGE_SCALE)?,
        image_layer: bg.field(BACKGROUND_IMAGE_LAYER)?,
        image_color: bg.field(BACKGROUND_IMAGE_COLOR)?,
        image_rect: bg.field(BACKGROUND_IMAGE_RECT)?,
        image_flipped_x: bg.field_or(BACKGROUND_IMAGE_FLIPPED_X, false)?,
        image_flipped_y: bg.field_or(BACKGROUND_IMAGE_FLIPPED_Y, false)?,
    })
}

fn read_blending(system: &Record) -> Result<BlendingPreset, SchemaError> {
    match system.try_field::<String>(BLENDING_PRESET)? {
        None => Ok(BlendingPreset::default()),
        Some(text) => text.parse().map_err(|message| SchemaError::InvalidValue {
            path: if system.path().is_empty() {
                BLENDING_PRESET.to_string()
            } else {
                format!("{}.{}", system.path(), BLENDING_PRESET)
            },
            message,
        }),
    }
}

fn read_emission(system: &Record) -> Result<(ParticleInitializer, f32), SchemaError> {
    let emission = system.record(EMISSION)?;
    let init = ParticleInitializer {
        amount: emission.field::<Range2i>(AMOUNT)?.0,
        life: emission.field::<Range2f>(LIFE)?.0,
        position_x: emission.field::<Range2f>(POSITION_X)?.0,
        position_y: emission.field::<Range2f>(POSITION_Y)?.0,
        velocity_x: emission.field::<Range2f>(VELOCITY_X)?.0,
        velocity_y: emission.field::<Range2f>(VELOCITY_Y)?.0,
        rotation: emission.field::<Range2f>(ROTATION)?.0,
        emitter_rotation: emission.field(EMITTER_ROTATION)?,
    };
    let delay = emission.field(DELAY)?;
    Ok((init, delay))
}

fn read_system(system: &Record) -> Result<SystemState, SchemaError> {
    let color_steps = read_steps(system, COLOR_STEPS, |c: Colorf| c)?;
    let rotation_steps = read_steps(system, ROTATION_STEPS, |a: f32| a)?;
    let position_steps = read_steps(system, POSITION_STEPS, |p: Vector2f| p)?;
    let velocity_steps = read_steps(system, VELOCITY_STEPS, |v: Vector2f| v)?;

    let mut size_base_scale = Vector2f::ONE;
    let size_steps = read_steps(system, SIZE_STEPS, |s: Scale| s.0)?;
    if let Some(size) = system.try_record(SIZE_STEPS)? {
        size_base_scale = size.field::<Scale>(BASE_SCALE)?.0;
    }

    let (init, emit_delay) = read_emission(system)?;

    Ok(SystemState {
        name: system.field(NAME)?,
        num_particles: system.field(NUM_PARTICLES)?,
        texture_name: system.field(TEXTURE)?,
        texture_rect: system.field(TEXTURE_RECT)?,
        anchor_point: system.field_or(ANCHOR_POINT, Vector2f::new(0.5, 0.5))?,
        flipped_x: system.field_or(FLIPPED_X, false)?,
        flipped_y: system.field_or(FLIPPED_Y, false)?,
        blending_preset: read_blending(system)?,
        position: system.field(RELATIVE_POSITION)?,
        layer: system.field(LAYER)?,
        in_local_space: system.field(LOCAL_SPACE)?,
        active: system.field(ACTIVE)?,
        color_steps,
        size_base_scale,
        size_steps,
        rotation_steps,
        position_steps,
        velocity_steps,
        init,
        emit_delay,
    })
}

/// Read a fully migrated project table
pub fn read_state(root: &Record) -> Result<State, SchemaError> {
    let normalized_abs_position = root.field_or(NORMALIZED_ABS_POSITION, Vector2f::new(0.5, 0.5))?;
    let background = read_background(root)?;

    let list = root.record(PARTICLE_SYSTEMS)?;
    let mut systems = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        systems.push(read_system(&list.element_record(i)?)?);
    }

    Ok(State { normalized_abs_position, background, systems })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::parse;

    fn read(source: &str) -> Result<State, SchemaError> {
        let table = parse(source).unwrap();
        read_state(&Record::root(&table))
    }

    const BACKGROUND: &str = "background_properties = {
        background_color = {r = 0.1, g = 0.2, b = 0.3, a = 1},
        background_image = \"sky.png\",
        background_image_normalized_position = {x = 0.25, y = 0.75},
        background_image_scale = 2,
        background_image_layer = 3,
        background_image_color = {r = 1, g = 1, b = 1, a = 0.5},
        background_image_rect = {x = 1, y = 2, w = 30, h = 40}
    }";

    fn system(extra: &str) -> String {
        format!(
            "{}\nparticle_systems = {{ {{
                name = \"s\", num_particles = 10, texture = \"t.png\",
                texture_rect = {{x = 0, y = 0, w = 4, h = 4}},
                relative_position = {{x = 1, y = 2}}, layer = 2,
                local_space = true, active = false,
                {}
                emission = {{
                    amount = {{1, 5}}, life = {{0.5, 1}},
                    position_x = {{-1, 1}}, position_y = {{-2, 2}},
                    velocity_x = {{0, 0}}, velocity_y = {{10, 20}},
                    rotation = {{0, 90}}, emitter_rotation = false, delay = 0.25
                }}
            }} }}",
            BACKGROUND, extra
        )
    }

    #[test]
    fn test_full_system() {
        let state = read(&system("")).unwrap();
        assert_eq!(state.normalized_abs_position, Vector2f::new(0.5, 0.5));
        assert_eq!(state.background.image_name, "sky.png");
        assert_eq!(state.background.image_layer, 3);
        assert_eq!(state.background.image_rect, Recti::new(1, 2, 30, 40));

        let s = &state.systems[0];
        assert_eq!(s.name, "s");
        assert_eq!(s.layer, 2);
        assert!(s.in_local_space);
        assert!(!s.active);
        assert_eq!(s.init.amount, Vector2i::new(1, 5));
        assert_eq!(s.init.velocity_y, Vector2f::new(10.0, 20.0));
        assert!(!s.init.emitter_rotation);
        assert_eq!(s.emit_delay, 0.25);
        assert_eq!(s.size_base_scale, Vector2f::ONE);
        assert!(s.color_steps.is_empty());
        assert_eq!(s.anchor_point, Vector2f::new(0.5, 0.5));
        assert_eq!(s.blending_preset, BlendingPreset::Alpha);
    }

    #[test]
    fn test_steps() {
        let state = read(&system(
            "color_steps = { {0, {r = 1, g = 0, b = 0, a = 1}}, {1, {r = 0, g = 0, b = 1, a = 0}} },
             size_steps = { base_scale = 2, {0, 1}, {1, {x = 0.5, y = 2}} },
             rotation_steps = { {0.5, 45} },
             position_steps = { {0, {x = 1, y = 1}} },
             velocity_steps = { {0, {x = 0, y = -1}} },",
        ))
        .unwrap();
        let s = &state.systems[0];
        assert_eq!(s.color_steps.len(), 2);
        assert_eq!(s.color_steps[1].value, Colorf::new(0.0, 0.0, 1.0, 0.0));
        assert_eq!(s.size_base_scale, Vector2f::splat(2.0));
        assert_eq!(s.size_steps[0].value, Vector2f::ONE);
        assert_eq!(s.size_steps[1].value, Vector2f::new(0.5, 2.0));
        assert_eq!(s.rotation_steps[0], Step::new(0.5, 45.0));
        assert_eq!(s.velocity_steps[0].value, Vector2f::new(0.0, -1.0));
    }

    #[test]
    fn test_extensions() {
        let state = read(&system(
            "anchor_point = {x = 0, y = 1}, flipped_x = true, blending_preset = \"additive\",",
        ))
        .unwrap();
        let s = &state.systems[0];
        assert_eq!(s.anchor_point, Vector2f::new(0.0, 1.0));
        assert!(s.flipped_x);
        assert!(!s.flipped_y);
        assert_eq!(s.blending_preset, BlendingPreset::Additive);
    }

    #[test]
    fn test_unknown_blending_preset() {
        let err = read(&system("blending_preset = \"screen\",")).unwrap_err();
        match err {
            SchemaError::InvalidValue { path, .. } => {
                assert_eq!(path, "particle_systems[1].blending_preset")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_size_steps_require_base_scale() {
        let err = read(&system("size_steps = { {0, 1} },")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing field 'particle_systems[1].size_steps.base_scale'"
        );
    }

    #[test]
    fn test_malformed_step_entry() {
        let err = read(&system("rotation_steps = { {0.5} },")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing field 'particle_systems[1].rotation_steps[1][2]'"
        );
    }

    #[test]
    fn test_wrong_range_shape() {
        let source = system("").replace("amount = {1, 5}", "amount = {1}");
        let err = read(&source).unwrap_err();
        assert!(err.to_string().contains("particle_systems[1].emission.amount"));
    }

    #[test]
    fn test_missing_mandatory_field() {
        let source = system("").replace("local_space = true,", "");
        let err = read(&source).unwrap_err();
        assert_eq!(err.to_string(), "missing field 'particle_systems[1].local_space'");
    }
}
