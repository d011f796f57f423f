use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable that overrides assets root detection.
pub const ASSETS_ENV: &str = "TILEQUEST_ASSETS";

/// Cached path to the directory containing images, fonts, maps and config documents.
static ASSETS_ROOT: LazyLock<PathBuf> = LazyLock::new(detect_assets_root);

/// The resolved assets root.
pub fn assets_root() -> &'static Path {
    &ASSETS_ROOT
}

/// Construct a path relative to the resolved assets root.
pub fn asset_path(relative: impl AsRef<Path>) -> PathBuf {
    ASSETS_ROOT.join(relative)
}

/// Resolve the most likely location of the assets directory.
fn detect_assets_root() -> PathBuf {
    if let Some(dir) = env::var_os(ASSETS_ENV) {
        return PathBuf::from(dir);
    }

    // Common layouts: workspace root and flattened `assets/`.
    let mut candidates = vec![PathBuf::from("tilequest_engine/assets"), PathBuf::from("assets")];

    if let Ok(exe_path) = env::current_exe()
        && let Some(dir) = exe_path.parent()
    {
        candidates.push(dir.join("tilequest_engine/assets"));
        candidates.push(dir.join("assets"));

        if let Some(parent) = dir.parent() {
            candidates.push(parent.join("tilequest_engine/assets"));
            candidates.push(parent.join("assets"));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir())
        .unwrap_or_else(|| PathBuf::from("tilequest_engine/assets"))
}
