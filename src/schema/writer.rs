//! Project file emission
//!
//! Descriptor extensions (anchor, flips, blending) are written only when
//! they differ from their defaults, so projects that do not use them keep
//! the classic layout.

use super::names::*;
use super::{BackgroundState, State, SystemState, PROJECT_FILE_VERSION};
use crate::descriptor::BlendingPreset;
use crate::math::{Colorf, Vector2f};
use crate::record::{boolean, color, integer, number, pair_f32, pair_i32, rect, string, vec2, RecordWriter};
use crate::steps::Step;

/// Uniform scales are written as a plain number
fn scale(v: Vector2f) -> String {
    if v.is_uniform() {
        number(v.x)
    } else {
        vec2(v)
    }
}

fn write_background(w: &mut RecordWriter, bg: &BackgroundState) {
    w.open(BACKGROUND_PROPERTIES);
    // The viewport background is always opaque
    let bg_color = Colorf { a: 1.0, ..bg.color };
    w.field(BACKGROUND_COLOR, &color(bg_color), true);
    w.field(BACKGROUND_IMAGE, &string(&bg.image_name), true);
    w.field(BACKGROUND_IMAGE_POSITION, &vec2(bg.image_normalized_position), true);
    w.field(BACKGROUND_IMAGE_SCALE, &number(bg.image_scale), true);
    w.field(BACKGROUND_IMAGE_LAYER, &integer(bg.image_layer as i64), true);
    w.field(BACKGROUND_IMAGE_COLOR, &color(bg.image_color), true);
    if bg.image_flipped_x {
        w.field(BACKGROUND_IMAGE_FLIPPED_X, &boolean(true), true);
    }
    if bg.image_flipped_y {
        w.field(BACKGROUND_IMAGE_FLIPPED_Y, &boolean(true), true);
    }
    w.field(BACKGROUND_IMAGE_RECT, &rect(bg.image_rect), false);
    w.close("");
}

fn write_steps<T: Copy>(
    w: &mut RecordWriter,
    name: &str,
    header: Option<(&str, String)>,
    steps: &[Step<T>],
    value: impl Fn(T) -> String,
) {
    if steps.is_empty() {
        return;
    }
    w.open(name);
    if let Some((field, text)) = header {
        w.field(field, &text, true);
    }
    for (i, step) in steps.iter().enumerate() {
        let more = i + 1 < steps.len();
        w.entry(&format!("{{{}, {}}}", number(step.age), value(step.value)), more);
    }
    w.close(",");
    w.blank();
}

fn write_system(w: &mut RecordWriter, s: &SystemState, last: bool) {
    w.open_anonymous();

    w.field(NAME, &string(&s.name), true);
    w.field(NUM_PARTICLES, &integer(s.num_particles as i64), true);
    w.field(TEXTURE, &string(&s.texture_name), true);
    w.field(TEXTURE_RECT, &rect(s.texture_rect), true);
    if s.anchor_point != Vector2f::new(0.5, 0.5) {
        w.field(ANCHOR_POINT, &vec2(s.anchor_point), true);
    }
    if s.flipped_x {
        w.field(FLIPPED_X, &boolean(true), true);
    }
    if s.flipped_y {
        w.field(FLIPPED_Y, &boolean(true), true);
    }
    if s.blending_preset != BlendingPreset::default() {
        w.field(BLENDING_PRESET, &string(s.blending_preset.as_str()), true);
    }
    w.field(RELATIVE_POSITION, &vec2(s.position), true);
    w.field(LAYER, &integer(s.layer as i64), true);
    w.field(LOCAL_SPACE, &boolean(s.in_local_space), true);
    w.field(ACTIVE, &boolean(s.active), true);
    w.blank();

    write_steps(w, COLOR_STEPS, None, &s.color_steps, color);
    write_steps(w, SIZE_STEPS, Some((BASE_SCALE, scale(s.size_base_scale))), &s.size_steps, scale);
    write_steps(w, ROTATION_STEPS, None, &s.rotation_steps, number);
    write_steps(w, POSITION_STEPS, None, &s.position_steps, vec2);
    write_steps(w, VELOCITY_STEPS, None, &s.velocity_steps, vec2);

    let init = &s.init;
    w.open(EMISSION);
    w.field(AMOUNT, &pair_i32(init.amount), true);
    w.field(LIFE, &pair_f32(init.life), true);
    w.field(POSITION_X, &pair_f32(init.position_x), true);
    w.field(POSITION_Y, &pair_f32(init.position_y), true);
    w.field(VELOCITY_X, &pair_f32(init.velocity_x), true);
    w.field(VELOCITY_Y, &pair_f32(init.velocity_y), true);
    w.field(ROTATION, &pair_f32(init.rotation), true);
    w.field(EMITTER_ROTATION, &boolean(init.emitter_rotation), true);
    w.field(DELAY, &number(s.emit_delay), false);
    w.close("");

    w.close(if last { "" } else { ",\n" });
}

/// Serialize a whole project as the current file version
pub fn write_state(state: &State) -> String {
    let mut w = RecordWriter::new();
    w.field(VERSION, &integer(PROJECT_FILE_VERSION as i64), false);
    w.field(NORMALIZED_ABS_POSITION, &vec2(state.normalized_abs_position), false);
    w.blank();

    write_background(&mut w, &state.background);
    w.blank();

    w.open(PARTICLE_SYSTEMS);
    for (i, system) in state.systems.iter().enumerate() {
        write_system(&mut w, system, i + 1 == state.systems.len());
    }
    w.close("");

    w.finish()
}
