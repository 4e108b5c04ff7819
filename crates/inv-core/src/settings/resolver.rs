//! Layered settings resolution

use std::path::PathBuf;

use inv_fs::{DocumentStore, InventoryFile, NormalizedPath};
use tracing::debug;

use super::{Settings, SettingsLayer};
use crate::Result;

const APP_DIR: &str = "inventory-manager";

/// Resolves [`Settings`] by merging defaults, the global config and a
/// local config.
#[derive(Debug, Clone)]
pub struct SettingsResolver {
    /// Directory searched for `inventory.toml`
    local_dir: NormalizedPath,

    /// Explicit local config file; replaces the `inventory.toml` lookup
    config_file: Option<NormalizedPath>,

    /// Override for the global config directory (used for testing).
    /// When `None`, `dirs::config_dir()` is used.
    global_config_dir_override: Option<PathBuf>,
}

impl SettingsResolver {
    /// Resolver reading `inventory.toml` from `local_dir`.
    ///
    /// The global config lives in the platform config directory:
    /// - Linux: `~/.config/inventory-manager/config.toml`
    /// - macOS: `~/Library/Application Support/inventory-manager/config.toml`
    /// - Windows: `%APPDATA%\inventory-manager\config.toml`
    pub fn new(local_dir: NormalizedPath) -> Self {
        Self {
            local_dir,
            config_file: None,
            global_config_dir_override: None,
        }
    }

    /// Resolver with a custom global config directory.
    pub fn with_global_config_dir(local_dir: NormalizedPath, global_config_dir: PathBuf) -> Self {
        Self {
            local_dir,
            config_file: None,
            global_config_dir_override: Some(global_config_dir),
        }
    }

    /// Use `path` as the local layer. Unlike `inventory.toml`, it must exist.
    pub fn with_config_file(mut self, path: NormalizedPath) -> Self {
        self.config_file = Some(path);
        self
    }

    fn global_config_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.global_config_dir_override {
            return Some(dir.clone());
        }
        dirs::config_dir().map(|d| d.join(APP_DIR))
    }

    /// Files that [`resolve`](Self::resolve) would read, in order.
    pub fn sources(&self) -> Vec<NormalizedPath> {
        let mut sources = Vec::new();
        if let Some(dir) = self.global_config_dir() {
            let global = NormalizedPath::new(dir.join("config.toml"));
            if global.is_file() {
                sources.push(global);
            }
        }
        match &self.config_file {
            Some(explicit) => sources.push(explicit.clone()),
            None => {
                let local = self.local_dir.join(InventoryFile::Settings.as_str());
                if local.is_file() {
                    sources.push(local);
                }
            }
        }
        sources
    }

    /// Merge all layers and validate the result.
    ///
    /// Missing optional layers are skipped. Invalid TOML, unknown keys or
    /// out-of-range values produce an error.
    pub fn resolve(&self) -> Result<Settings> {
        let store = DocumentStore::new();
        let mut merged = SettingsLayer::default();

        for source in self.sources() {
            debug!(path = %source, "loading settings layer");
            let layer: SettingsLayer = store.load(&source)?;
            merged.merge(layer);
        }

        let mut settings = Settings::default();
        settings.apply(merged);
        settings.validate()?;
        debug!(?settings, "settings resolved");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::dedupe::SurvivorPolicyKind;
    use tempfile::TempDir;

    fn write(dir: &std::path::Path, name: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn defaults_without_any_file() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let resolver =
            SettingsResolver::with_global_config_dir(NormalizedPath::new(local.path()), global.path().into());
        assert!(resolver.sources().is_empty());
        assert_eq!(resolver.resolve().unwrap(), Settings::default());
    }

    #[test]
    fn local_overrides_global() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        write(global.path(), "config.toml", "workers = 2\ninclude_all_files = true\n");
        write(local.path(), "inventory.toml", "workers = 3\n");

        let settings =
            SettingsResolver::with_global_config_dir(NormalizedPath::new(local.path()), global.path().into())
                .resolve()
                .unwrap();
        assert_eq!(settings.workers, 3);
        assert!(settings.include_all_files);
    }

    #[test]
    fn explicit_config_replaces_local_file() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        write(local.path(), "inventory.toml", "workers = 3\n");
        write(local.path(), "other.toml", "survivor_policy = \"camera-name\"\n");

        let settings =
            SettingsResolver::with_global_config_dir(NormalizedPath::new(local.path()), global.path().into())
                .with_config_file(NormalizedPath::new(local.path().join("other.toml")))
                .resolve()
                .unwrap();
        assert_eq!(settings.workers, 0);
        assert_eq!(settings.survivor_policy, SurvivorPolicyKind::CameraName);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let result =
            SettingsResolver::with_global_config_dir(NormalizedPath::new(local.path()), global.path().into())
                .with_config_file(NormalizedPath::new(local.path().join("absent.toml")))
                .resolve();
        assert!(matches!(result, Err(Error::Fs(_))));
    }

    #[test]
    fn invalid_values_are_reported() {
        let local = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        write(local.path(), "inventory.toml", "approve_add = [\"jpg\"]\n");
        let result =
            SettingsResolver::with_global_config_dir(NormalizedPath::new(local.path()), global.path().into())
                .resolve();
        assert!(matches!(result, Err(Error::InvalidSettings { .. })));
    }
}
