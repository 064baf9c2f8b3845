//! Configuration schema types for `config.lua`
//!
//! Defines the editor configuration, its defaults and the sanitizers that
//! coerce out-of-range values into the currently valid range.

use serde::{Deserialize, Serialize};

/// Current config file version written by [`crate::schema::write_config`]
pub const CONFIG_FILE_VERSION: u32 = 11;

fn default_width() -> i32 {
    1280
}

fn default_height() -> i32 {
    720
}

fn default_vbo_size() -> u64 {
    256 * 1024
}

fn default_ibo_size() -> u64 {
    32 * 1024
}

fn default_savefile_maxsize() -> u32 {
    8 * 1024
}

fn default_log_maxsize() -> u32 {
    4 * 1024
}

fn default_true() -> bool {
    true
}

fn default_scripts_path() -> String {
    "scripts/".to_string()
}

fn default_textures_path() -> String {
    "textures/".to_string()
}

fn default_backgrounds_path() -> String {
    "backgrounds/".to_string()
}

/// Numeric limits for editing widgets and initializer sanitation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiLimits {
    pub max_background_image_scale: f32,
    pub max_rendering_layer: i32,
    pub max_num_particles: i32,
    pub system_position_range: f32,
    pub min_particle_scale: f32,
    pub max_particle_scale: f32,
    pub min_particle_angle: f32,
    pub max_particle_angle: f32,
    pub position_range: f32,
    pub velocity_range: f32,
    pub max_random_life: f32,
    pub random_position_range: f32,
    pub random_velocity_range: f32,
    pub max_delay: f32,
}

impl Default for GuiLimits {
    fn default() -> Self {
        Self {
            max_background_image_scale: 5.0,
            max_rendering_layer: 16,
            max_num_particles: 256,
            system_position_range: 200.0,
            min_particle_scale: 0.0,
            max_particle_scale: 2.0,
            min_particle_angle: -360.0,
            max_particle_angle: 360.0,
            position_range: 5.0,
            velocity_range: 5.0,
            max_random_life: 5.0,
            random_position_range: 100.0,
            random_velocity_range: 200.0,
            max_delay: 5.0,
        }
    }
}

/// Widget style parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiStyle {
    /// 0 = dark, 1 = light, 2 = classic
    pub style_index: i32,
    pub frame_rounding: f32,
    pub window_border: bool,
    pub frame_border: bool,
    pub popup_border: bool,
    pub scaling: f32,
}

impl Default for GuiStyle {
    fn default() -> Self {
        Self {
            style_index: 0,
            frame_rounding: 0.0,
            window_border: true,
            frame_border: true,
            popup_border: true,
            scaling: 1.0,
        }
    }
}

/// Root editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub resizable: bool,
    /// Frames per second cap, 0 for unlimited
    #[serde(default)]
    pub frame_limit: u32,
    #[serde(default)]
    pub buffer_mapping: bool,
    #[serde(default = "default_vbo_size")]
    pub vbo_size: u64,
    #[serde(default = "default_ibo_size")]
    pub ibo_size: u64,
    #[serde(default = "default_true")]
    pub vsync: bool,
    #[serde(default = "default_true")]
    pub batching: bool,
    #[serde(default = "default_true")]
    pub culling: bool,
    /// Size above which a saved project triggers a warning
    #[serde(default = "default_savefile_maxsize")]
    pub savefile_maxsize: u32,
    /// Capacity of the in-memory event log, in bytes
    #[serde(default = "default_log_maxsize")]
    pub log_maxsize: u32,
    #[serde(default)]
    pub startup_script_name: String,
    #[serde(default)]
    pub auto_emission_on_start: bool,
    #[serde(default = "default_scripts_path")]
    pub scripts_path: String,
    #[serde(default = "default_textures_path")]
    pub textures_path: String,
    #[serde(default = "default_backgrounds_path")]
    pub backgrounds_path: String,
    #[serde(default)]
    pub gui_limits: GuiLimits,
    #[serde(default)]
    pub gui_style: GuiStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fullscreen: false,
            resizable: false,
            frame_limit: 0,
            buffer_mapping: false,
            vbo_size: default_vbo_size(),
            ibo_size: default_ibo_size(),
            vsync: true,
            batching: true,
            culling: true,
            savefile_maxsize: default_savefile_maxsize(),
            log_maxsize: default_log_maxsize(),
            startup_script_name: String::new(),
            auto_emission_on_start: false,
            scripts_path: default_scripts_path(),
            textures_path: default_textures_path(),
            backgrounds_path: default_backgrounds_path(),
            gui_limits: GuiLimits::default(),
            gui_style: GuiStyle::default(),
        }
    }
}

/// A config value that is outside its valid range
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Path to the field (e.g., "gui_limits.max_delay")
    pub field: String,
    /// What the sanitizer will do about it
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config.lua: '{}' {}", self.field, self.message)
    }
}

impl Config {
    /// Report every value the sanitizers would change.
    ///
    /// Loading never fails on these; they are coerced. This is for
    /// `pfx config show` and `pfx validate` diagnostics.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ConfigValidationError { field: field.to_string(), message });
        };

        if self.width < 640 {
            push("width", "must be at least 640".to_string());
        }
        if self.height < 480 {
            push("height", "must be at least 480".to_string());
        }
        if self.frame_limit > 240 {
            push("frame_limit", "must be at most 240".to_string());
        }
        if self.vbo_size < default_vbo_size() {
            push("vbo_size", format!("must be at least {}", default_vbo_size()));
        }
        if self.ibo_size < default_ibo_size() {
            push("ibo_size", format!("must be at least {}", default_ibo_size()));
        }
        if self.savefile_maxsize < default_savefile_maxsize() {
            push("savefile_maxsize", format!("must be at least {}", default_savefile_maxsize()));
        }
        if self.log_maxsize < default_log_maxsize() {
            push("log_maxsize", format!("must be at least {}", default_log_maxsize()));
        }

        let limits = &self.gui_limits;
        if !(0..=65535).contains(&limits.max_rendering_layer) {
            push("gui_limits.max_rendering_layer", "must be in 0..=65535".to_string());
        }
        if limits.max_num_particles <= 0 {
            push("gui_limits.max_num_particles", "must be a positive integer".to_string());
        }
        if limits.min_particle_scale < 0.0 {
            push("gui_limits.min_particle_scale", "must not be negative".to_string());
        }
        if limits.max_particle_scale < 0.0 {
            push("gui_limits.max_particle_scale", "must not be negative".to_string());
        }
        if limits.min_particle_scale.abs() > limits.max_particle_scale.abs() {
            push("gui_limits.min_particle_scale", "must not exceed max_particle_scale".to_string());
        }
        if limits.max_random_life < 0.0 {
            push("gui_limits.max_random_life", "must not be negative".to_string());
        }
        if limits.max_delay < 0.0 {
            push("gui_limits.max_delay", "must not be negative".to_string());
        }

        let style = &self.gui_style;
        if !(0..=2).contains(&style.style_index) {
            push("gui_style.style_index", "must be in 0..=2".to_string());
        }
        if !(0.0..=12.0).contains(&style.frame_rounding) {
            push("gui_style.frame_rounding", "must be in 0..=12".to_string());
        }
        if !(0.5..=2.0).contains(&style.scaling) {
            push("gui_style.scaling", "must be in 0.5..=2".to_string());
        }

        errors
    }

    /// Clamp window, buffer and file size settings to their minimums
    pub fn sanitize_init(&mut self) {
        self.width = self.width.max(640);
        self.height = self.height.max(480);
        self.frame_limit = self.frame_limit.min(240);
        self.vbo_size = self.vbo_size.max(default_vbo_size());
        self.ibo_size = self.ibo_size.max(default_ibo_size());
        self.savefile_maxsize = self.savefile_maxsize.max(default_savefile_maxsize());
        self.log_maxsize = self.log_maxsize.max(default_log_maxsize());
    }

    /// Restore the ordering and sign invariants of the GUI limits
    pub fn sanitize_gui_limits(&mut self) {
        let limits = &mut self.gui_limits;
        limits.max_rendering_layer = limits.max_rendering_layer.clamp(0, 65535);

        if limits.max_num_particles == 0 {
            limits.max_num_particles = 1;
        } else if limits.max_num_particles < 0 {
            limits.max_num_particles = limits.max_num_particles.saturating_neg();
        }

        limits.min_particle_scale = limits.min_particle_scale.abs();
        limits.max_particle_scale = limits.max_particle_scale.abs();
        limits.max_random_life = limits.max_random_life.abs();
        limits.max_delay = limits.max_delay.abs();

        if limits.min_particle_scale > limits.max_particle_scale {
            std::mem::swap(&mut limits.min_particle_scale, &mut limits.max_particle_scale);
        }
    }

    /// Clamp style parameters to the ranges the widget layer supports
    pub fn sanitize_gui_style(&mut self) {
        let style = &mut self.gui_style;
        style.style_index = style.style_index.clamp(0, 2);
        style.frame_rounding = style.frame_rounding.clamp(0.0, 12.0);
        style.scaling = style.scaling.clamp(0.5, 2.0);
    }

    /// Run every sanitizer
    pub fn sanitize(&mut self) {
        self.sanitize_init();
        self.sanitize_gui_limits();
        self.sanitize_gui_style();
    }
}
