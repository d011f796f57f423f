//! Resource management.
//!
//! [`ResourceManager`] is the single place where asset names turn into
//! loaded data. It fronts one [`AssetCache`] per asset kind, each rooted at a
//! sub-directory of the assets root:
//!
//! | kind      | directory  | key                              |
//! |-----------|------------|----------------------------------|
//! | image     | `images/`  | file name                        |
//! | sprite    | `images/`  | file name, x, y, width, height   |
//! | font      | `fonts/`   | file name, point size            |
//! | document  | root       | sub-path, file name              |
//!
//! Every lookup returns a [`Resource`]. A failed load never raises: it is
//! logged and the caller receives [`Resource::Missing`].

pub mod cache;
pub mod loaders;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;
use tilequest_data::{FONTS_DIR, IMAGES_DIR};

pub use cache::{AssetCache, AssetLoader, CacheStats};
pub use loaders::{DocumentLoader, Font, FontLoader, Image, ImageLoader, Sprite, SpriteLoader};

/// Point size used when a font is requested by name only.
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Reasons an asset could not be produced.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("unable to read '{}': {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("'{}' is empty", .path.display())]
    Empty { path: PathBuf },
    #[error("invalid JSON in '{}': {source}", .path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("invalid TOML in '{}': {source}", .path.display())]
    Toml { path: PathBuf, source: toml::de::Error },
    #[error("'{}' is not a JSON or TOML document", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("sprite sheet '{name}' cannot provide a {width}x{height} sprite at {x},{y}")]
    InvalidSprite {
        name: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("sprite sheet '{name}' could not be loaded")]
    MissingSheet { name: String },
}

/// A loaded asset handle, or the sentinel standing in for one that failed to load.
#[derive(Debug)]
pub enum Resource<T> {
    Loaded(Rc<T>),
    Missing,
}

impl<T> Resource<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Resource::Loaded(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resource::Missing)
    }

    /// Borrow the asset, if it loaded.
    pub fn get(&self) -> Option<&T> {
        match self {
            Resource::Loaded(asset) => Some(asset),
            Resource::Missing => None,
        }
    }

    /// Clone out the shared handle, if it loaded.
    pub fn handle(&self) -> Option<Rc<T>> {
        match self {
            Resource::Loaded(asset) => Some(Rc::clone(asset)),
            Resource::Missing => None,
        }
    }

    /// True when both are the very same loaded instance.
    pub fn ptr_eq(&self, other: &Resource<T>) -> bool {
        match (self, other) {
            (Resource::Loaded(a), Resource::Loaded(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        match self {
            Resource::Loaded(asset) => Resource::Loaded(Rc::clone(asset)),
            Resource::Missing => Resource::Missing,
        }
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Resource::Missing
    }
}

/// Cache-backed provider of images, sprites, fonts and documents.
///
/// Single-threaded by construction: handles are `Rc`, and the manager is
/// passed around by `&mut`.
#[derive(Debug)]
pub struct ResourceManager {
    root: PathBuf,
    images: AssetCache<ImageLoader>,
    sprites: AssetCache<SpriteLoader>,
    fonts: AssetCache<FontLoader>,
    documents: AssetCache<DocumentLoader>,
}

impl ResourceManager {
    /// Create a manager rooted at `assets_dir`.
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        let root = assets_dir.into();
        let images_dir = root.join(IMAGES_DIR);
        Self {
            images: AssetCache::new(&images_dir, ImageLoader),
            sprites: AssetCache::new(&images_dir, SpriteLoader::new(&images_dir)),
            fonts: AssetCache::new(root.join(FONTS_DIR), FontLoader),
            documents: AssetCache::new(&root, DocumentLoader),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get_image(&mut self, name: &str) -> Resource<Image> {
        self.images.get(&name.to_string())
    }

    pub fn get_sprite(&mut self, name: &str, x: u32, y: u32, width: u32, height: u32) -> Resource<Sprite> {
        self.sprites.get(&(name.to_string(), x, y, width, height))
    }

    pub fn get_font(&mut self, name: &str, size: u32) -> Resource<Font> {
        self.fonts.get(&(name.to_string(), size))
    }

    /// Fetch a parsed document from `sub_path/name` under the assets root.
    pub fn get_json(&mut self, sub_path: &str, name: &str) -> Resource<Value> {
        self.documents.get(&(sub_path.to_string(), name.to_string()))
    }

    pub fn image_stats(&self) -> CacheStats {
        self.images.stats()
    }

    pub fn sprite_stats(&self) -> CacheStats {
        self.sprites.stats()
    }

    pub fn font_stats(&self) -> CacheStats {
        self.fonts.stats()
    }

    pub fn document_stats(&self) -> CacheStats {
        self.documents.stats()
    }

    /// Forget every entry whose asset has been freed. Returns how many were dropped.
    pub fn purge(&mut self) -> usize {
        self.images.purge() + self.sprites.purge() + self.fonts.purge() + self.documents.purge()
    }
}
