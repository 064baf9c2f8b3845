//! Show and plot command implementations (terminal display)

use std::path::Path;
use std::process::ExitCode;

use crate::affector::{Affectors, Channel};
use crate::project::build_affectors;
use crate::record;
use crate::schema::{migrate, project_version, read_project_table, SchemaError, State, SystemState};
use crate::telemetry::{self, ErrorEntry};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Read a project, returning its declared version with the state
fn load_project(command: &str, file: &Path) -> Result<(u32, State), ExitCode> {
    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {}", file.display(), e);
            return Err(ExitCode::from(EXIT_INVALID_ARGS));
        }
    };

    let parsed = record::parse(&content).map_err(SchemaError::from).and_then(|table| {
        let version = project_version(&table)?;
        Ok((version, read_project_table(table)?))
    });

    parsed.map_err(|e| {
        eprintln!("Error: Cannot load '{}': {}", file.display(), e);
        telemetry::log_error(
            &ErrorEntry::from_schema_error(command, &e).with_file(file.display().to_string()),
        );
        ExitCode::from(EXIT_ERROR)
    })
}

fn step_counts(affectors: &Affectors) -> serde_json::Value {
    let mut counts = serde_json::Map::new();
    for channel in Channel::ALL {
        counts.insert(channel.to_string(), serde_json::json!(affectors.step_count(channel)));
    }
    serde_json::Value::Object(counts)
}

fn system_json(index: usize, system: &SystemState) -> serde_json::Value {
    serde_json::json!({
        "index": index,
        "name": system.name,
        "texture": system.texture_name,
        "num_particles": system.num_particles,
        "layer": system.layer,
        "active": system.active,
        "local_space": system.in_local_space,
        "blending_preset": system.blending_preset.as_str(),
        "steps": step_counts(&build_affectors(system)),
        "emission": system.init,
        "delay": system.emit_delay,
    })
}

/// Execute the show command - summarize a project's particle systems
pub fn run_show(file: &Path, json: bool) -> ExitCode {
    let (version, state) = match load_project("show", file) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let upgrades: Vec<&str> =
        migrate::pending(version, migrate::PROJECT_MIGRATIONS).map(|m| m.summary).collect();

    if json {
        let systems: Vec<_> =
            state.systems.iter().enumerate().map(|(i, s)| system_json(i, s)).collect();
        let output = serde_json::json!({
            "file": file.display().to_string(),
            "version": version,
            "pending_upgrades": upgrades,
            "absolute_position": state.normalized_abs_position,
            "background": state.background,
            "systems": systems,
        });
        return match serde_json::to_string_pretty(&output) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: Cannot serialize summary: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    println!("{} (project version {})", file.display(), version);
    for upgrade in &upgrades {
        println!("  upgrade on save: {}", upgrade);
    }

    let bg = &state.background;
    if bg.image_name.is_empty() {
        println!("Background: no image");
    } else {
        println!(
            "Background: \"{}\" at ({:.2}, {:.2}), scale {}, layer {}",
            bg.image_name,
            bg.image_normalized_position.x,
            bg.image_normalized_position.y,
            bg.image_scale,
            bg.image_layer
        );
    }

    println!("Particle systems: {}", state.systems.len());
    for (i, s) in state.systems.iter().enumerate() {
        let name = if s.name.is_empty() { "(unnamed)" } else { s.name.as_str() };
        println!();
        println!("  #{} {}", i, name);
        println!(
            "    texture \"{}\", {} particles, layer {}, {}{}",
            s.texture_name,
            s.num_particles,
            s.layer,
            if s.active { "active" } else { "inactive" },
            if s.in_local_space { ", local space" } else { "" }
        );

        let affectors = build_affectors(s);
        let counts: Vec<String> = Channel::ALL
            .iter()
            .map(|c| format!("{} {}", c, affectors.step_count(*c)))
            .collect();
        println!("    steps: {}", counts.join(", "));

        let init = &s.init;
        println!(
            "    emission: amount {}..{}, life {}..{}, delay {}",
            init.amount.x, init.amount.y, init.life.x, init.life.y, s.emit_delay
        );
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the plot command - sample one channel at evenly spaced ages
pub fn run_plot(file: &Path, system: usize, channel: Channel, points: usize) -> ExitCode {
    if points < 2 {
        eprintln!("Error: --points must be at least 2");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let (_, state) = match load_project("plot", file) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let Some(descriptor) = state.systems.get(system) else {
        eprintln!(
            "Error: Particle system #{} does not exist (project has {})",
            system,
            state.systems.len()
        );
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let affectors = build_affectors(descriptor);
    println!("# system #{} channel {} ({} steps)", system, channel, affectors.step_count(channel));
    for i in 0..points {
        let age = i as f32 / (points - 1) as f32;
        println!("{:.6} {}", age, affectors.sample(channel, age));
    }

    ExitCode::from(EXIT_SUCCESS)
}
