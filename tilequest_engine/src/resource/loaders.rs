//! Filesystem loaders for each asset kind.
//!
//! Decoding pixels and glyphs belongs to whatever renders the game, so image
//! and font loaders hand back the raw file bytes. Documents are parsed into a
//! `serde_json::Value` tree regardless of their on-disk format.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;

use super::cache::{AssetCache, AssetLoader};
use super::{Resource, ResourceError};

/// An encoded image file.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// An encoded font file at a requested point size.
#[derive(Clone, PartialEq, Eq)]
pub struct Font {
    pub name: String,
    pub size: u32,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A rectangular region of a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub sheet: Rc<Image>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn read_asset(path: PathBuf) -> Result<Vec<u8>, ResourceError> {
    let bytes = fs::read(&path).map_err(|source| ResourceError::Io {
        path: path.clone(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(ResourceError::Empty { path });
    }
    Ok(bytes)
}

#[derive(Debug, Default)]
pub struct ImageLoader;

impl AssetLoader for ImageLoader {
    type Key = String;
    type Asset = Image;

    fn load(&mut self, dir: &Path, name: &String) -> Result<Image, ResourceError> {
        let bytes = read_asset(dir.join(name))?;
        Ok(Image {
            name: name.clone(),
            bytes,
        })
    }
}

#[derive(Debug, Default)]
pub struct FontLoader;

impl AssetLoader for FontLoader {
    type Key = (String, u32);
    type Asset = Font;

    fn load(&mut self, dir: &Path, (name, size): &(String, u32)) -> Result<Font, ResourceError> {
        let bytes = read_asset(dir.join(name))?;
        Ok(Font {
            name: name.clone(),
            size: *size,
            bytes,
        })
    }
}

/// Cuts sprites out of sheets. Sheets are shared through an inner image cache,
/// so many sprites from one sheet read the file once.
#[derive(Debug)]
pub struct SpriteLoader {
    sheets: AssetCache<ImageLoader>,
}

impl SpriteLoader {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            sheets: AssetCache::new(images_dir, ImageLoader),
        }
    }
}

/// (sheet name, x offset, y offset, width, height)
pub type SpriteKey = (String, u32, u32, u32, u32);

impl AssetLoader for SpriteLoader {
    type Key = SpriteKey;
    type Asset = Sprite;

    fn load(&mut self, _dir: &Path, key: &SpriteKey) -> Result<Sprite, ResourceError> {
        let (name, x, y, width, height) = key.clone();
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidSprite {
                name,
                x,
                y,
                width,
                height,
            });
        }
        match self.sheets.get(&name) {
            Resource::Loaded(sheet) => Ok(Sprite {
                sheet,
                x,
                y,
                width,
                height,
            }),
            Resource::Missing => Err(ResourceError::MissingSheet { name }),
        }
    }
}

/// Parses JSON and TOML documents into a JSON value tree.
#[derive(Debug, Default)]
pub struct DocumentLoader;

impl AssetLoader for DocumentLoader {
    type Key = (String, String);
    type Asset = Value;

    fn load(&mut self, dir: &Path, (sub_path, name): &(String, String)) -> Result<Value, ResourceError> {
        let path = dir.join(sub_path).join(name);
        let text = fs::read_to_string(&path).map_err(|source| ResourceError::Io {
            path: path.clone(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&text).map_err(|source| ResourceError::Json { path, source }),
            Some("toml") => toml::from_str(&text).map_err(|source| ResourceError::Toml { path, source }),
            _ => Err(ResourceError::UnsupportedFormat { path }),
        }
    }
}
