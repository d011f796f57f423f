//! Resource fields on components.
//!
//! A component declares a resource field with an [`AssetRef`]. The field is
//! deserialized from the arguments the document gives for it (an image file
//! name, a font name and size, ...) and starts out unresolved. During loading
//! the component hands each field to the [`Resolver`], which asks the
//! [`ResourceManager`] for the handle. A failed lookup leaves the sentinel in
//! place and records a warning; it never aborts the load.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::resource::{DEFAULT_FONT_SIZE, Font, Image, Resource, ResourceManager, Sprite};

/// A category of resource field: what the document supplies and what it resolves to.
pub trait AssetKind {
    type Args: DeserializeOwned + Clone + Debug;
    type Handle: Debug;
}

/// Image fields: the document gives a file name.
#[derive(Debug, Clone, Copy)]
pub struct ImageAsset;

impl AssetKind for ImageAsset {
    type Args = String;
    type Handle = Image;
}

/// Sprite fields: the document gives `[sheet, x, y]`; the component supplies the size.
#[derive(Debug, Clone, Copy)]
pub struct SpriteAsset;

impl AssetKind for SpriteAsset {
    type Args = (String, u32, u32);
    type Handle = Sprite;
}

/// Font fields: the document gives a file name, or `[name, size]`.
#[derive(Debug, Clone, Copy)]
pub struct FontAsset;

impl AssetKind for FontAsset {
    type Args = FontSpec;
    type Handle = Font;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FontSpec {
    Named(String),
    Sized(String, u32),
}

impl FontSpec {
    pub fn name(&self) -> &str {
        match self {
            FontSpec::Named(name) | FontSpec::Sized(name, _) => name,
        }
    }

    pub fn size(&self) -> u32 {
        match self {
            FontSpec::Named(_) => DEFAULT_FONT_SIZE,
            FontSpec::Sized(_, size) => *size,
        }
    }
}

/// Sub-document fields: the document gives the name of another document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentAsset;

impl AssetKind for DocumentAsset {
    type Args = String;
    type Handle = Value;
}

/// A resource field: its arguments as written in the document, plus the handle once resolved.
pub struct AssetRef<K: AssetKind> {
    args: K::Args,
    handle: Resource<K::Handle>,
}

impl<K: AssetKind> AssetRef<K> {
    pub fn new(args: K::Args) -> Self {
        Self {
            args,
            handle: Resource::Missing,
        }
    }

    /// The arguments this field was declared with.
    pub fn args(&self) -> &K::Args {
        &self.args
    }

    pub fn resource(&self) -> &Resource<K::Handle> {
        &self.handle
    }

    /// Borrow the resolved asset, if it loaded.
    pub fn get(&self) -> Option<&K::Handle> {
        self.handle.get()
    }

    pub fn is_missing(&self) -> bool {
        self.handle.is_missing()
    }
}

impl<K: AssetKind> Clone for AssetRef<K> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<K: AssetKind> Debug for AssetRef<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRef")
            .field("args", &self.args)
            .field("loaded", &self.handle.is_loaded())
            .finish()
    }
}

impl<'de, K: AssetKind> Deserialize<'de> for AssetRef<K> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        K::Args::deserialize(deserializer).map(AssetRef::new)
    }
}

/// Resolves a component's resource fields through the manager, collecting diagnostics.
pub struct Resolver<'a> {
    manager: &'a mut ResourceManager,
    kind: &'static str,
    warnings: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(manager: &'a mut ResourceManager, kind: &'static str) -> Self {
        Self {
            manager,
            kind,
            warnings: Vec::new(),
        }
    }

    pub fn image(&mut self, field: &str, asset: &mut AssetRef<ImageAsset>) {
        asset.handle = self.manager.get_image(&asset.args);
        self.check(field, asset);
    }

    /// Resolve every image in a mapping, e.g. a tile legend.
    pub fn images<T: Display>(&mut self, field: &str, assets: &mut BTreeMap<T, AssetRef<ImageAsset>>) {
        for (key, asset) in assets.iter_mut() {
            asset.handle = self.manager.get_image(&asset.args);
            self.check(&format!("{field}[{key}]"), asset);
        }
    }

    pub fn sprite(&mut self, field: &str, asset: &mut AssetRef<SpriteAsset>, (width, height): (u32, u32)) {
        let (sheet, x, y) = &asset.args;
        asset.handle = self.manager.get_sprite(sheet, *x, *y, width, height);
        self.check(field, asset);
    }

    pub fn font(&mut self, field: &str, asset: &mut AssetRef<FontAsset>) {
        asset.handle = self.manager.get_font(asset.args.name(), asset.args.size());
        self.check(field, asset);
    }

    /// Resolve a document field; `sub_path` is where documents of that kind live.
    pub fn document(&mut self, field: &str, sub_path: &str, asset: &mut AssetRef<DocumentAsset>) {
        asset.handle = self.manager.get_json(sub_path, &asset.args);
        self.check(field, asset);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn check<K: AssetKind>(&mut self, field: &str, asset: &AssetRef<K>) {
        if asset.is_missing() {
            let message = format!(
                "failed to load {:?} for {field} attribute in {}",
                asset.args, self.kind
            );
            warn!("{message}");
            self.warnings.push(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn font_spec_accepts_name_or_pair() -> Result<()> {
        let named: AssetRef<FontAsset> = serde_json::from_value(json!("mono.ttf"))?;
        let sized: AssetRef<FontAsset> = serde_json::from_value(json!(["mono.ttf", 30]))?;
        assert_eq!(named.args().size(), DEFAULT_FONT_SIZE);
        assert_eq!(sized.args().size(), 30);
        assert_eq!(sized.args().name(), "mono.ttf");
        Ok(())
    }

    #[test]
    fn deserialized_refs_start_unresolved() -> Result<()> {
        let image: AssetRef<ImageAsset> = serde_json::from_value(json!("grass.png"))?;
        assert!(image.is_missing());
        assert_eq!(image.args(), "grass.png");
        Ok(())
    }

    #[test]
    fn mapping_failures_name_the_key() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("images"))?;
        fs::write(dir.path().join("images/grass.png"), b"g")?;
        let mut manager = ResourceManager::new(dir.path());

        let mut legend: BTreeMap<u32, AssetRef<ImageAsset>> =
            serde_json::from_value(json!({"0": "grass.png", "1": "lava.png"}))?;
        let mut resolver = Resolver::new(&mut manager, "Map");
        resolver.images("legend", &mut legend);

        assert!(legend[&0].get().is_some());
        assert!(legend[&1].is_missing());
        let warnings = resolver.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("legend[1]"));
        assert!(warnings[0].contains("Map"));
        Ok(())
    }
}
