//! Pfxsrc - particle effect authoring core
//!
//! This library provides functionality to:
//! - Describe particle systems as keyframed affectors over particle age
//! - Read project files of every released version and write the newest one
//! - Load, check and save the editor configuration
//! - Drive an editing session: systems, textures, emission and the event log

pub mod affector;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod editor;
pub mod emission;
pub mod fmt;
pub mod initializer;
pub mod math;
pub mod project;
pub mod record;
pub mod schema;
pub mod steps;
pub mod telemetry;
pub mod texture;
pub mod validate;
