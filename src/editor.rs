//! Editing session
//!
//! [`Editor`] owns everything one editor window works on: the sanitized
//! config, the [`Project`], the event log and the recent file list. It
//! performs the project operations and file I/O and logs what happened
//! in the event log.

use crate::config::loader::atomic_write;
use crate::config::Config;
use crate::emission::{emit, EmittedParticle, Rng};
use crate::math::Vector2f;
use crate::project::{Project, ProjectError, SearchPaths};
use crate::schema::{read_project, write_project, SchemaError};
use crate::telemetry::EventLog;
use crate::texture::{TextureHandle, TextureLoader};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Number of entries kept in the recent files list
pub const MAX_RECENT_FILES: usize = 6;

/// Error of an editor operation
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EditorError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
    /// Saving would replace a file and the policy forbids it
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Project(#[from] ProjectError),
}

/// What [`Editor::save`] does when the destination exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    Refuse,
    Overwrite,
}

/// Most recently used files, newest last, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentFiles {
    entries: VecDeque<PathBuf>,
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use of `path`, moving it to the newest position
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.entries.retain(|p| *p != path);
        if self.entries.len() == MAX_RECENT_FILES {
            self.entries.pop_front();
        }
        self.entries.push_back(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(PathBuf::as_path)
    }

    pub fn newest(&self) -> Option<&Path> {
        self.entries.back().map(PathBuf::as_path)
    }
}

/// Particles to spawn for one system this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionRequest {
    pub system: usize,
    pub particles: Vec<EmittedParticle>,
}

/// Outcome of a successful save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub bytes: usize,
    /// The file is larger than the configured `savefile_maxsize`
    pub oversized: bool,
}

/// One editing session
pub struct Editor {
    pub config: Config,
    pub project: Project,
    pub log: EventLog,
    pub recent_files: RecentFiles,
    /// Size of the viewport positions are normalized against
    pub viewport: Vector2f,
    loader: Box<dyn TextureLoader>,
    rng: Rng,
}

impl Editor {
    /// Start a session with an empty project.
    ///
    /// The viewport defaults to the configured window size.
    pub fn new(config: Config, loader: Box<dyn TextureLoader>) -> Self {
        let viewport = Vector2f::new(config.width as f32, config.height as f32);
        Self {
            log: EventLog::new(config.log_maxsize as usize),
            config,
            project: Project::for_viewport(viewport),
            recent_files: RecentFiles::new(),
            viewport,
            loader,
            rng: Rng::new(0x5eed),
        }
    }

    /// Reseed the emission random source
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::new(seed);
        self
    }

    pub fn search_paths(&self) -> SearchPaths {
        SearchPaths {
            textures: PathBuf::from(&self.config.textures_path),
            backgrounds: PathBuf::from(&self.config.backgrounds_path),
        }
    }

    /// Load a project file, replacing the current project.
    ///
    /// The current project is untouched unless the whole file reads
    /// successfully. Unreadable textures are logged and replaced by
    /// placeholders.
    pub fn load(&mut self, path: &Path) -> Result<(), EditorError> {
        let result = fs::read_to_string(path)
            .map_err(|source| EditorError::Io { path: path.to_path_buf(), source })
            .and_then(|text| {
                read_project(&text)
                    .map_err(|source| EditorError::Schema { path: path.to_path_buf(), source })
            });
        let state = match result {
            Ok(state) => state,
            Err(err) => {
                self.log.error(format!("Cannot load project file \"{}\": {}", path.display(), err));
                return Err(err);
            }
        };

        let paths = self.search_paths();
        let (project, errors) = Project::from_state(&state, self.loader.as_ref(), &paths, self.viewport);
        for err in errors {
            self.log.warning(err.to_string());
        }
        self.project = project;
        self.recent_files.push(path);
        self.log.info(format!("Loaded project file \"{}\"", path.display()));
        Ok(())
    }

    /// Save the project as the current file version
    pub fn save(&mut self, path: &Path, policy: OverwritePolicy) -> Result<SaveReport, EditorError> {
        if policy == OverwritePolicy::Refuse && path.exists() {
            return Err(EditorError::AlreadyExists(path.to_path_buf()));
        }

        let text = write_project(&self.project.to_state(self.viewport));
        let oversized = text.len() > self.config.savefile_maxsize as usize;
        if oversized {
            self.log.warning(format!(
                "Project file \"{}\" is {} bytes, larger than the configured maximum of {}",
                path.display(),
                text.len(),
                self.config.savefile_maxsize
            ));
        }

        if let Err(source) = atomic_write(path, text.as_bytes()) {
            self.log.error(format!("Cannot save project file \"{}\": {}", path.display(), source));
            return Err(EditorError::Io { path: path.to_path_buf(), source });
        }

        self.recent_files.push(path);
        self.log.info(format!("Saved project file \"{}\"", path.display()));
        Ok(SaveReport { bytes: text.len(), oversized })
    }

    pub fn new_system(&mut self) -> Result<usize, EditorError> {
        let index = self.project.new_system()?;
        self.log.info(format!("Created a new particle system at index #{}", index));
        Ok(index)
    }

    pub fn clone_system(&mut self, index: usize) -> Result<usize, EditorError> {
        let clone = self.project.clone_system(index)?;
        self.log.info(format!("Cloned particle system at index #{} to index #{}", index, clone));
        Ok(clone)
    }

    pub fn delete_system(&mut self, index: usize) -> Result<(), EditorError> {
        self.project.delete_system(index)?;
        self.log.info(format!("Destroyed particle system at index #{}", index));
        Ok(())
    }

    /// Load a texture into the project. Failures leave a placeholder and
    /// are only logged.
    pub fn load_texture(&mut self, name: &str) -> TextureHandle {
        let paths = self.search_paths();
        let (handle, err) = self.project.load_texture(self.loader.as_ref(), name, &paths);
        match err {
            None => self.log.info(format!("Loaded texture \"{}\" at index #{}", name, handle.index())),
            Some(err) => {
                self.log.warning(format!("Cannot load texture \"{}\"", name));
                self.log.warning(err.to_string());
            }
        }
        handle
    }

    pub fn delete_texture(&mut self, index: usize) -> Result<(), EditorError> {
        match self.project.delete_texture(index) {
            Ok(()) => {
                self.log.info(format!("Destroyed texture at index #{}", index));
                Ok(())
            }
            Err(err) => {
                self.log.warning(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Sample a burst for every system whose emission is due at `now`
    pub fn emit_particles(&mut self, now: Instant) -> Vec<EmissionRequest> {
        let mut requests = Vec::new();
        for (index, system) in self.project.systems.iter_mut().enumerate() {
            if !system.can_emit(now) {
                continue;
            }
            system.mark_emitted(now);
            requests.push(EmissionRequest { system: index, particles: emit(&system.init, &mut self.rng) });
        }
        requests
    }

    /// Per-frame repair of emission ranges and step ages
    pub fn sanitize_all(&mut self) {
        let limits = &self.config.gui_limits;
        for system in &mut self.project.systems {
            system.sanitize(limits);
        }
    }
}
