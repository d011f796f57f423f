//! Declarative component loading.
//!
//! Every domain entity (map, level, player, config, ...) is a [`Component`]:
//! a typed struct built from a structured document. Loading follows a fixed
//! pipeline:
//!
//! 1. structural check against the component's [`Schema`],
//! 2. per-field cleaners, in the order the component declares them,
//! 3. the cross-field [`Component::clean`] hook,
//! 4. typed assignment (serde deserialization of the raw document),
//! 5. resource field resolution through the [`Resolver`],
//! 6. the [`Component::post_process`] hook.
//!
//! Steps 1-4 and 6 are fatal: the result carries a [`LoadError`] and no
//! component. Step 5 is not: missing assets become sentinels and warnings.
//!
//! Loading never panics and never returns early with `Err`; it always
//! produces a [`Loaded`] so the caller decides how to surface a failure.

pub mod resolver;

use std::fmt;
use std::rc::Rc;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tilequest_data::{Schema, validate_document};

use crate::resource::{Resource, ResourceManager};

pub use resolver::{AssetKind, AssetRef, DocumentAsset, FontAsset, FontSpec, ImageAsset, Resolver, SpriteAsset};

/// Why a component failed to load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Schema(#[from] tilequest_data::ValidationError),
    #[error("{0}")]
    Field(String),
    #[error("{0}")]
    Clean(String),
    #[error("{kind} data could not be assigned: {source}")]
    Malformed {
        kind: &'static str,
        source: serde_json::Error,
    },
    #[error("no {kind} document at '{path}/{location}'")]
    MissingDocument {
        kind: &'static str,
        path: &'static str,
        location: String,
    },
    #[error("{kind} has no location to load from")]
    NoLocation { kind: &'static str },
    #[error("{0}")]
    PostProcess(String),
    #[error("{field}: {source}")]
    Nested {
        field: &'static str,
        source: Box<LoadError>,
    },
}

/// A validator's verdict against a piece of raw data.
///
/// A rejection may explain itself. When it does not, the framework supplies
/// a default message naming the field (or the whole document).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rejection(Option<String>);

impl Rejection {
    /// Reject with a specific message.
    pub fn because(message: impl Into<String>) -> Self {
        Rejection(Some(message.into()))
    }

    pub fn message(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_deref().unwrap_or("rejected"))
    }
}

pub type CleanResult = Result<(), Rejection>;

/// A validator for one top-level field of a component's raw data.
#[derive(Debug, Clone, Copy)]
pub struct FieldCleaner {
    pub field: &'static str,
    pub check: fn(&Value) -> CleanResult,
}

impl FieldCleaner {
    pub const fn new(field: &'static str, check: fn(&Value) -> CleanResult) -> Self {
        Self { field, check }
    }
}

/// An entity built from structured data.
pub trait Component: DeserializeOwned {
    /// Name used in diagnostics.
    const KIND: &'static str;

    /// Field validators, run in declaration order after the schema check.
    const CLEANERS: &'static [FieldCleaner] = &[];

    /// Options a caller supplies for post-processing (widths, seeds, ...).
    type Context;

    /// Required key structure of the raw data, if any.
    fn schema() -> Option<Schema> {
        None
    }

    /// Cross-field validation over the whole raw document.
    ///
    /// # Errors
    /// - a [`Rejection`] when the fields are individually fine but inconsistent together
    fn clean(_raw: &Value) -> CleanResult {
        Ok(())
    }

    /// Resolve resource fields. Failures are recorded by the resolver, not returned.
    fn resolve(&mut self, _resolver: &mut Resolver<'_>) {}

    /// Final domain-specific derivation once fields are assigned and resolved.
    ///
    /// # Errors
    /// - when derived state cannot be built; the load then fails
    fn post_process(&mut self, _manager: &mut ResourceManager, _ctx: &mut Self::Context) -> Result<(), LoadError> {
        Ok(())
    }
}

/// A component that knows where its own data lives.
pub trait LoadableComponent: Component {
    /// Sub-path (under the assets root) holding documents of this kind.
    const PATH: &'static str;

    /// Document loaded when no location is given.
    const LOCATION: Option<&'static str> = None;
}

/// Run the validation steps of the pipeline over raw data.
///
/// # Errors
/// - the first failure, in order: schema, field cleaners, cross-field clean
pub fn check<C: Component>(raw: &Value) -> Result<(), LoadError> {
    if let Some(schema) = C::schema() {
        validate_document(raw, &schema)?;
    }

    let absent = Value::Object(Map::new());
    for cleaner in C::CLEANERS {
        let value = raw.get(cleaner.field).unwrap_or(&absent);
        if let Err(rejection) = (cleaner.check)(value) {
            let message = rejection
                .0
                .unwrap_or_else(|| format!("{} was not valid", cleaner.field));
            return Err(LoadError::Field(message));
        }
    }

    if let Err(rejection) = C::clean(raw) {
        let message = rejection
            .0
            .unwrap_or_else(|| "raw data did not validate".to_string());
        return Err(LoadError::Clean(message));
    }
    Ok(())
}

/// The outcome of loading a component: always produced, possibly invalid.
#[derive(Debug)]
pub struct Loaded<C> {
    raw_data: Rc<Value>,
    component: Option<C>,
    error: Option<LoadError>,
    warnings: Vec<String>,
}

impl<C: Component> Loaded<C> {
    /// Build a component from in-memory data.
    pub fn from_data(manager: &mut ResourceManager, data: Value, ctx: &mut C::Context) -> Self {
        Self::from_shared(manager, Rc::new(data), ctx)
    }

    /// Build a component from a shared document (e.g. one held by the resource cache).
    pub fn from_shared(manager: &mut ResourceManager, raw_data: Rc<Value>, ctx: &mut C::Context) -> Self {
        if let Err(error) = check::<C>(&raw_data) {
            return Self::failed(raw_data, error);
        }

        let mut component = match C::deserialize(raw_data.as_ref()) {
            Ok(component) => component,
            Err(source) => {
                return Self::failed(raw_data, LoadError::Malformed { kind: C::KIND, source });
            },
        };

        let mut resolver = Resolver::new(manager, C::KIND);
        component.resolve(&mut resolver);
        let warnings = resolver.into_warnings();

        if let Err(error) = component.post_process(manager, ctx) {
            let mut failed = Self::failed(raw_data, error);
            failed.warnings = warnings;
            return failed;
        }

        info!("{} loaded ({} unresolved resources)", C::KIND, warnings.len());
        Self {
            raw_data,
            component: Some(component),
            error: None,
            warnings,
        }
    }

    fn failed(raw_data: Rc<Value>, error: LoadError) -> Self {
        warn!("{} failed to load: {error}", C::KIND);
        Self {
            raw_data,
            component: None,
            error: Some(error),
            warnings: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// The error description; empty when the component is valid.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// Resource resolution diagnostics (non-fatal).
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn raw_data(&self) -> &Value {
        &self.raw_data
    }

    pub fn component(&self) -> Option<&C> {
        self.component.as_ref()
    }

    pub fn component_mut(&mut self) -> Option<&mut C> {
        self.component.as_mut()
    }

    /// Convert into the component, or the error that prevented it.
    ///
    /// # Errors
    /// - the load error recorded while building the component
    pub fn into_result(self) -> Result<C, LoadError> {
        match (self.component, self.error) {
            (Some(component), None) => Ok(component),
            (_, Some(error)) => Err(error),
            (None, None) => Err(LoadError::PostProcess(format!("{} was never built", C::KIND))),
        }
    }
}

impl<C: LoadableComponent> Loaded<C> {
    /// Fetch `location` from the component's path and build from it.
    pub fn from_location(manager: &mut ResourceManager, location: &str, ctx: &mut C::Context) -> Self {
        match manager.get_json(C::PATH, location) {
            Resource::Loaded(document) => Self::from_shared(manager, document, ctx),
            Resource::Missing => Self::failed(
                Rc::new(Value::Null),
                LoadError::MissingDocument {
                    kind: C::KIND,
                    path: C::PATH,
                    location: location.to_string(),
                },
            ),
        }
    }

    /// Load from the component's declared default location.
    pub fn from_default_location(manager: &mut ResourceManager, ctx: &mut C::Context) -> Self {
        match C::LOCATION {
            Some(location) => Self::from_location(manager, location, ctx),
            None => Self::failed(Rc::new(Value::Null), LoadError::NoLocation { kind: C::KIND }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde::Deserialize;
    use serde_json::json;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// A badge with an icon, a label font, and a sprite cut from a sheet.
    #[derive(Debug, Deserialize)]
    struct Badge {
        label: String,
        level: u32,
        icon: AssetRef<ImageAsset>,
        font: AssetRef<FontAsset>,
        frame: AssetRef<SpriteAsset>,
        #[serde(skip)]
        shout: String,
    }

    fn clean_level(value: &Value) -> CleanResult {
        match value.as_u64() {
            Some(1..=9) => Ok(()),
            _ => Err(Rejection::default()),
        }
    }

    fn clean_label(value: &Value) -> CleanResult {
        match value.as_str() {
            Some(label) if !label.trim().is_empty() => Ok(()),
            _ => Err(Rejection::because("a badge needs a label")),
        }
    }

    impl Component for Badge {
        const KIND: &'static str = "Badge";
        const CLEANERS: &'static [FieldCleaner] =
            &[FieldCleaner::new("level", clean_level), FieldCleaner::new("label", clean_label)];
        type Context = usize;

        fn schema() -> Option<Schema> {
            Some(Schema::keys(["label", "level", "icon", "font", "frame"]))
        }

        fn clean(raw: &Value) -> CleanResult {
            if raw["label"] == raw["icon"] {
                return Err(Rejection::default());
            }
            Ok(())
        }

        fn resolve(&mut self, resolver: &mut Resolver<'_>) {
            resolver.image("icon", &mut self.icon);
            resolver.font("font", &mut self.font);
            resolver.sprite("frame", &mut self.frame, (8, 8));
        }

        fn post_process(&mut self, _manager: &mut ResourceManager, calls: &mut usize) -> Result<(), LoadError> {
            *calls += 1;
            self.shout = self.label.to_uppercase();
            Ok(())
        }
    }

    impl LoadableComponent for Badge {
        const PATH: &'static str = "badges";
        const LOCATION: Option<&'static str> = Some("gold.json");
    }

    fn assets() -> Result<TempDir> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("images"))?;
        fs::create_dir_all(dir.path().join("fonts"))?;
        fs::create_dir_all(dir.path().join("badges"))?;
        fs::write(dir.path().join("images/star.png"), b"star")?;
        fs::write(dir.path().join("images/frames.png"), b"frames")?;
        fs::write(dir.path().join("fonts/mono.ttf"), b"mono")?;
        fs::write(dir.path().join("badges/gold.json"), badge().to_string())?;
        Ok(dir)
    }

    fn badge() -> Value {
        json!({
            "label": "gold",
            "level": 3,
            "icon": "star.png",
            "font": ["mono.ttf", 20],
            "frame": ["frames.png", 8, 0],
        })
    }

    #[test]
    fn valid_data_builds_resolves_and_post_processes() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut calls = 0;
        let loaded = Loaded::<Badge>::from_data(&mut manager, badge(), &mut calls);

        assert!(loaded.is_valid());
        assert_eq!(loaded.error_message(), "");
        assert!(loaded.warnings().is_empty());
        let badge = loaded.component().unwrap();
        assert_eq!(badge.shout, "GOLD");
        assert_eq!(badge.icon.get().map(|image| image.bytes.as_slice()), Some(&b"star"[..]));
        assert_eq!(badge.font.get().map(|font| font.size), Some(20));
        assert_eq!(badge.frame.get().map(|sprite| (sprite.x, sprite.width)), Some((8, 8)));
        assert_eq!(calls, 1);
        Ok(())
    }

    #[test]
    fn schema_failure_wins_and_skips_everything_else() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut calls = 0;
        let mut data = badge();
        data.as_object_mut().unwrap().remove("frame");
        data["level"] = json!(42);
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut calls);

        assert!(matches!(loaded.error(), Some(LoadError::Schema(_))));
        assert!(loaded.error_message().contains("schema"));
        assert!(loaded.component().is_none());
        assert_eq!(calls, 0);
        assert_eq!(manager.image_stats().loads, 0);
        Ok(())
    }

    #[test]
    fn first_failing_cleaner_sets_default_message() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut data = badge();
        data["level"] = json!(42);
        data["label"] = json!("");
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut 0);
        assert_eq!(loaded.error_message(), "level was not valid");
        Ok(())
    }

    #[test]
    fn cleaner_message_is_kept() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut data = badge();
        data["label"] = json!("  ");
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut 0);
        assert!(matches!(loaded.error(), Some(LoadError::Field(_))));
        assert_eq!(loaded.error_message(), "a badge needs a label");
        Ok(())
    }

    #[test]
    fn cross_field_clean_runs_last() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut data = badge();
        data["label"] = json!("star.png");
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut 0);
        assert!(matches!(loaded.error(), Some(LoadError::Clean(_))));
        assert_eq!(loaded.error_message(), "raw data did not validate");
        Ok(())
    }

    #[test]
    fn type_mismatch_is_malformed() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut data = badge();
        data["icon"] = json!(7);
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut 0);
        assert!(matches!(loaded.error(), Some(LoadError::Malformed { kind: "Badge", .. })));
        Ok(())
    }

    #[test]
    fn missing_assets_degrade_to_sentinels() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let mut data = badge();
        data["icon"] = json!("gone.png");
        data["font"] = json!("gone.ttf");
        let mut calls = 0;
        let loaded = Loaded::<Badge>::from_data(&mut manager, data, &mut calls);

        assert!(loaded.is_valid());
        assert_eq!(loaded.warnings().len(), 2);
        let badge = loaded.component().unwrap();
        assert!(badge.icon.is_missing());
        assert!(badge.font.is_missing());
        assert!(badge.frame.get().is_some());
        assert_eq!(calls, 1);
        Ok(())
    }

    #[test]
    fn loads_from_default_location_through_the_cache() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let first = Loaded::<Badge>::from_default_location(&mut manager, &mut 0);
        let second = Loaded::<Badge>::from_location(&mut manager, "gold.json", &mut 0);
        assert!(first.is_valid() && second.is_valid());
        assert!(std::ptr::eq(first.raw_data(), second.raw_data()));
        assert_eq!(manager.document_stats().loads, 1);
        Ok(())
    }

    #[test]
    fn missing_location_is_reported() -> Result<()> {
        let dir = assets()?;
        let mut manager = ResourceManager::new(dir.path());
        let loaded = Loaded::<Badge>::from_location(&mut manager, "silver.json", &mut 0);
        assert!(matches!(loaded.error(), Some(LoadError::MissingDocument { .. })));
        assert!(loaded.into_result().is_err());
        Ok(())
    }
}
