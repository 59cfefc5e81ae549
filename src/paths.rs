//! Where xmlconverge looks for its manifest
//!
//! The manifest is the first of:
//! 1. the `--manifest` flag
//! 2. `$XMLCONVERGE_MANIFEST`
//! 3. `manifest.toml` in the config directory
//!
//! The config directory is `$XMLCONVERGE_CONFIG_DIR`, else
//! `$XDG_CONFIG_HOME/xmlconverge`, else the platform location
//! (`%APPDATA%\xmlconverge` on Windows, `~/.config/xmlconverge` elsewhere).

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

pub const ENV_MANIFEST: &str = "XMLCONVERGE_MANIFEST";

pub const ENV_CONFIG_DIR: &str = "XMLCONVERGE_CONFIG_DIR";

pub const MANIFEST_FILE: &str = "manifest.toml";

const APP_DIR: &str = "xmlconverge";

/// Expanded value of an environment variable holding a path
fn from_env(var: &str) -> Option<PathBuf> {
    let value = std::env::var(var).ok()?;
    let path = expand(&value);
    log::debug!("{var} -> {}", path.display());
    Some(path)
}

pub fn config_dir() -> Result<PathBuf> {
    if let Some(dir) = from_env(ENV_CONFIG_DIR) {
        return Ok(dir);
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join(APP_DIR));
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join(APP_DIR));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join(APP_DIR))
}

/// Locate the manifest to load
pub fn manifest_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }
    if let Some(path) = from_env(ENV_MANIFEST) {
        return Ok(path);
    }
    let path = config_dir()?.join(MANIFEST_FILE);
    log::debug!("Using manifest {}", path.display());
    Ok(path)
}

/// Expand `~` and `$VARS` in a path
///
/// Variables that are not set are kept as written.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Resolve a path declared in a manifest
///
/// Relative paths are taken from the directory holding the manifest. The
/// result is normalized, so every spelling of one file resolves to the
/// same path and lands in the same target group.
pub fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let expanded = expand(path);
    if expanded.is_absolute() {
        normalize(&expanded)
    } else {
        normalize(&base_dir.join(expanded))
    }
}

/// Drop `.` components and fold `..` into the preceding component
///
/// Purely lexical: symlinks are not followed. `..` at the root stays at
/// the root, and leading `..` of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
