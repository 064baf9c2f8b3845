//! Editable project
//!
//! A [`Project`] is the in-memory counterpart of a project file: the
//! texture table, the particle system descriptors and the background. The
//! file stores positions normalized to the viewport, the project keeps
//! them in pixels. [`Project::to_state`] and [`Project::from_state`]
//! convert between the two.

use crate::affector::Affectors;
use crate::descriptor::ParticleSystemDescriptor;
use crate::math::{Colorf, Recti, Vector2f};
use crate::schema::{BackgroundState, State, SystemState};
use crate::steps::StepSequence;
use crate::texture::{ResourceError, TextureHandle, TextureLoader, TextureTable};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure of a project edit
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ProjectError {
    /// New systems need a texture to draw with
    #[error("Cannot create a particle system without a loaded texture")]
    NoTextures,
    /// The texture is still referenced
    #[error("Cannot destroy texture #{index}: used by particle system(s) {}", format_indices(.users))]
    TextureInUse { index: usize, users: Vec<usize> },
    #[error("{kind} index #{index} is out of range (count is {len})")]
    IndexOutOfRange { kind: &'static str, index: usize, len: usize },
}

fn format_indices(indices: &[usize]) -> String {
    indices.iter().map(|i| format!("#{}", i)).collect::<Vec<_>>().join(", ")
}

/// Affectors holding a stored system's step tables as read
pub fn build_affectors(s: &SystemState) -> Affectors {
    let mut affectors = Affectors::default();
    affectors.color.steps = StepSequence::from_steps(s.color_steps.clone());
    affectors.size.steps = StepSequence::from_steps(s.size_steps.clone());
    affectors.size.base_scale = s.size_base_scale;
    affectors.rotation.steps = StepSequence::from_steps(s.rotation_steps.clone());
    affectors.position.steps = StepSequence::from_steps(s.position_steps.clone());
    affectors.velocity.steps = StepSequence::from_steps(s.velocity_steps.clone());
    affectors
}

/// Where texture and background image names are looked up
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPaths {
    pub textures: PathBuf,
    pub backgrounds: PathBuf,
}

impl Default for SearchPaths {
    fn default() -> Self {
        Self { textures: PathBuf::from("textures/"), backgrounds: PathBuf::from("backgrounds/") }
    }
}

impl SearchPaths {
    /// The name as given, then under `dir`
    fn candidates(name: &str, dir: &Path) -> Vec<PathBuf> {
        vec![PathBuf::from(name), dir.join(name)]
    }
}

/// Viewport background, with the image position in pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub color: Colorf,
    pub image_name: String,
    /// Dimensions of the loaded image, `None` when absent or unreadable
    pub image_size: Option<(u32, u32)>,
    pub image_position: Vector2f,
    pub image_scale: f32,
    pub image_layer: i32,
    pub image_color: Colorf,
    pub image_rect: Recti,
    pub image_flipped_x: bool,
    pub image_flipped_y: bool,
}

impl Default for Background {
    fn default() -> Self {
        Self::from_state(&BackgroundState::default(), Vector2f::ZERO)
    }
}

impl Background {
    fn from_state(bg: &BackgroundState, viewport: Vector2f) -> Self {
        Self {
            color: bg.color,
            image_name: bg.image_name.clone(),
            image_size: None,
            image_position: bg.image_normalized_position.mul(viewport),
            image_scale: bg.image_scale,
            image_layer: bg.image_layer,
            image_color: bg.image_color,
            image_rect: bg.image_rect,
            image_flipped_x: bg.image_flipped_x,
            image_flipped_y: bg.image_flipped_y,
        }
    }

    fn to_state(&self, viewport: Vector2f) -> BackgroundState {
        BackgroundState {
            color: self.color,
            image_name: self.image_name.clone(),
            image_normalized_position: self.image_position.div(viewport),
            image_scale: self.image_scale,
            image_layer: self.image_layer,
            image_color: self.image_color,
            image_rect: self.image_rect,
            image_flipped_x: self.image_flipped_x,
            image_flipped_y: self.image_flipped_y,
        }
    }
}

/// Textures, particle systems and background of one editing session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub textures: TextureTable,
    pub systems: Vec<ParticleSystemDescriptor>,
    /// Emitter origin in pixels; systems are placed relative to it
    pub absolute_position: Vector2f,
    pub background: Background,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty project with the default emitter origin and background image
    /// position placed in a `viewport` of the given size
    pub fn for_viewport(viewport: Vector2f) -> Self {
        let defaults = State::default();
        Self {
            absolute_position: defaults.normalized_abs_position.mul(viewport),
            background: Background::from_state(&defaults.background, viewport),
            ..Self::default()
        }
    }

    fn check_system(&self, index: usize) -> Result<(), ProjectError> {
        if index < self.systems.len() {
            Ok(())
        } else {
            Err(ProjectError::IndexOutOfRange {
                kind: "particle system",
                index,
                len: self.systems.len(),
            })
        }
    }

    /// Append a system drawing the whole of the first texture.
    /// Returns its index.
    pub fn new_system(&mut self) -> Result<usize, ProjectError> {
        let texture = self.textures.get(TextureHandle(0)).ok_or(ProjectError::NoTextures)?;
        let system = ParticleSystemDescriptor::new(TextureHandle(0), texture.width, texture.height);
        self.systems.push(system);
        Ok(self.systems.len() - 1)
    }

    /// Append a deep copy of system `index`. Returns the new index.
    pub fn clone_system(&mut self, index: usize) -> Result<usize, ProjectError> {
        self.check_system(index)?;
        let copy = self.systems[index].duplicate();
        self.systems.push(copy);
        Ok(self.systems.len() - 1)
    }

    /// Remove system `index`; later systems shift down
    pub fn delete_system(&mut self, index: usize) -> Result<ParticleSystemDescriptor, ProjectError> {
        self.check_system(index)?;
        Ok(self.systems.remove(index))
    }

    /// Load a texture by name.
    ///
    /// A name already in the table returns the existing handle. An
    /// unreadable texture still gets a placeholder entry.
    pub fn load_texture(
        &mut self,
        loader: &dyn TextureLoader,
        name: &str,
        paths: &SearchPaths,
    ) -> (TextureHandle, Option<ResourceError>) {
        if let Some(handle) = self.textures.find(name) {
            return (handle, None);
        }
        self.textures.load(loader, name, &SearchPaths::candidates(name, &paths.textures))
    }

    /// Indices of the systems that draw with texture `index`
    pub fn texture_users(&self, index: usize) -> Vec<usize> {
        self.systems
            .iter()
            .enumerate()
            .filter(|(_, s)| s.texture.index() == index)
            .map(|(i, _)| i)
            .collect()
    }

    /// Remove an unreferenced texture and renumber handles above it
    pub fn delete_texture(&mut self, index: usize) -> Result<(), ProjectError> {
        if index >= self.textures.len() {
            return Err(ProjectError::IndexOutOfRange {
                kind: "texture",
                index,
                len: self.textures.len(),
            });
        }
        let users = self.texture_users(index);
        if !users.is_empty() {
            return Err(ProjectError::TextureInUse { index, users });
        }

        self.textures.remove(TextureHandle(index));
        for system in &mut self.systems {
            if system.texture.index() > index {
                system.texture = TextureHandle(system.texture.index() - 1);
            }
        }
        Ok(())
    }

    /// Capture the project for saving, normalizing positions by `viewport`
    pub fn to_state(&self, viewport: Vector2f) -> State {
        let systems = self
            .systems
            .iter()
            .map(|s| SystemState {
                name: s.name.clone(),
                num_particles: s.num_particles,
                texture_name: self
                    .textures
                    .get(s.texture)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
                texture_rect: s.texture_rect,
                anchor_point: s.anchor_point,
                flipped_x: s.flipped_x,
                flipped_y: s.flipped_y,
                blending_preset: s.blending_preset,
                position: s.position,
                layer: s.layer,
                in_local_space: s.in_local_space,
                active: s.active,
                color_steps: s.affectors.color.steps.steps().to_vec(),
                size_base_scale: s.affectors.size.base_scale,
                size_steps: s.affectors.size.steps.steps().to_vec(),
                rotation_steps: s.affectors.rotation.steps.steps().to_vec(),
                position_steps: s.affectors.position.steps.steps().to_vec(),
                velocity_steps: s.affectors.velocity.steps.steps().to_vec(),
                init: s.init.clone(),
                emit_delay: s.emit_delay,
            })
            .collect();

        State {
            normalized_abs_position: self.absolute_position.div(viewport),
            background: self.background.to_state(viewport),
            systems,
        }
    }

    /// Build a project from a loaded file.
    ///
    /// Textures are loaded once per distinct name. Resource failures do not
    /// abort the load; they are returned so the caller can log them.
    pub fn from_state(
        state: &State,
        loader: &dyn TextureLoader,
        paths: &SearchPaths,
        viewport: Vector2f,
    ) -> (Project, Vec<ResourceError>) {
        let mut project = Project {
            absolute_position: state.normalized_abs_position.mul(viewport),
            background: Background::from_state(&state.background, viewport),
            ..Project::default()
        };
        let mut errors = Vec::new();

        for s in &state.systems {
            let (texture, err) = project.load_texture(loader, &s.texture_name, paths);
            errors.extend(err);

            let affectors = build_affectors(s);

            project.systems.push(ParticleSystemDescriptor {
                name: s.name.clone(),
                num_particles: s.num_particles,
                texture,
                texture_rect: s.texture_rect,
                anchor_point: s.anchor_point,
                flipped_x: s.flipped_x,
                flipped_y: s.flipped_y,
                blending_preset: s.blending_preset,
                position: s.position,
                layer: s.layer,
                in_local_space: s.in_local_space,
                active: s.active,
                affectors,
                init: s.init.clone(),
                emit_delay: s.emit_delay,
                last_emission: None,
            });
        }

        let name = &state.background.image_name;
        if !name.is_empty() {
            match load_dimensions(loader, name, &paths.backgrounds) {
                Ok(size) => project.background.image_size = Some(size),
                Err(err) => errors.push(err),
            }
        }

        (project, errors)
    }
}

fn load_dimensions(
    loader: &dyn TextureLoader,
    name: &str,
    dir: &Path,
) -> Result<(u32, u32), ResourceError> {
    let mut last_error = None;
    for path in SearchPaths::candidates(name, dir) {
        match loader.dimensions(&path) {
            Ok(size) => return Ok(size),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| ResourceError::NotFound(name.to_string())))
}
