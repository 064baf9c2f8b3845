//! Shared texture table
//!
//! Textures live in a dense arena owned by the project. Particle systems
//! refer to them through [`TextureHandle`] indices, never by reference, so
//! the "is this texture still used" check is a plain scan and deletion is a
//! compaction of the arena.
//!
//! Decoding pixels and uploading them to the GPU is the renderer's job.
//! The core only needs a texture's dimensions, obtained through the
//! [`TextureLoader`] trait.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to read a texture or background image
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    /// File could not be found in any search location
    #[error("Cannot find image \"{0}\"")]
    NotFound(String),
    /// File exists but could not be decoded
    #[error("Cannot load image \"{path}\": {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Index of a texture in the project's texture table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureHandle(pub usize);

impl TextureHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load state of a texture entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TextureStatus {
    Loaded,
    /// Placeholder kept so systems that name the texture still resolve
    Missing(String),
}

/// A texture known to the project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Texture {
    /// Name as written in the project file
    pub name: String,
    /// Resolved path on disk, if one was found
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub status: TextureStatus,
}

impl Texture {
    pub fn is_loaded(&self) -> bool {
        self.status == TextureStatus::Loaded
    }
}

/// Source of texture dimensions
pub trait TextureLoader {
    /// Return `(width, height)` of the image at `path`
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), ResourceError>;
}

/// Reads dimensions from image headers on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTextureLoader;

impl TextureLoader for ImageTextureLoader {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), ResourceError> {
        if !path.is_file() {
            return Err(ResourceError::NotFound(path.display().to_string()));
        }
        image::image_dimensions(path)
            .map_err(|source| ResourceError::Image { path: path.to_path_buf(), source })
    }
}

/// In-memory loader keyed by file name, for tests and headless tools
#[derive(Debug, Default, Clone)]
pub struct StaticTextureLoader {
    sizes: HashMap<String, (u32, u32)>,
}

impl StaticTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, width: u32, height: u32) -> Self {
        self.sizes.insert(name.into(), (width, height));
        self
    }
}

impl TextureLoader for StaticTextureLoader {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), ResourceError> {
        let key = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.sizes
            .get(key)
            .copied()
            .ok_or_else(|| ResourceError::NotFound(path.display().to_string()))
    }
}

/// Dense arena of textures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextureTable {
    entries: Vec<Texture>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.entries.get(handle.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &Texture)> {
        self.entries.iter().enumerate().map(|(i, t)| (TextureHandle(i), t))
    }

    /// Find a texture by its project-file name
    pub fn find(&self, name: &str) -> Option<TextureHandle> {
        self.entries.iter().position(|t| t.name == name).map(TextureHandle)
    }

    /// Append a texture and return its handle
    pub fn push(&mut self, texture: Texture) -> TextureHandle {
        self.entries.push(texture);
        TextureHandle(self.entries.len() - 1)
    }

    /// Load `name` from the first candidate path that the loader accepts.
    ///
    /// On failure a [`TextureStatus::Missing`] placeholder is still inserted
    /// and the error is returned alongside its handle, so callers can log
    /// it and keep going.
    pub fn load(
        &mut self,
        loader: &dyn TextureLoader,
        name: &str,
        candidates: &[PathBuf],
    ) -> (TextureHandle, Option<ResourceError>) {
        let mut last_error = None;
        for path in candidates {
            match loader.dimensions(path) {
                Ok((width, height)) => {
                    let handle = self.push(Texture {
                        name: name.to_string(),
                        path: Some(path.clone()),
                        width,
                        height,
                        status: TextureStatus::Loaded,
                    });
                    return (handle, None);
                }
                Err(err) => last_error = Some(err),
            }
        }

        let error = last_error.unwrap_or_else(|| ResourceError::NotFound(name.to_string()));
        let handle = self.push(Texture {
            name: name.to_string(),
            path: None,
            width: 0,
            height: 0,
            status: TextureStatus::Missing(error.to_string()),
        });
        (handle, Some(error))
    }

    /// Remove the texture at `handle`, shifting later entries down by one.
    ///
    /// The caller must have verified that nothing references `handle` and
    /// must renumber handles above it.
    pub(crate) fn remove(&mut self, handle: TextureHandle) -> Option<Texture> {
        if handle.0 < self.entries.len() {
            Some(self.entries.remove(handle.0))
        } else {
            None
        }
    }
}
