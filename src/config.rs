//! Configuration access for the handoff.
//!
//! The engine exposes settings as named string console variables, where an
//! empty string means "use the default". [`ConfigSource`] mirrors that: every
//! lookup returns a string and the resolver treats an empty one as unset.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Console variable holding the DaVinci Resolve executable override.
pub const EXECUTABLE_PATH_KEY: &str = "pfm_davinci_resolve_executable_path";
/// Console variable holding the DaVinci Resolve (Fusion) script directory override.
pub const SCRIPT_PATH_KEY: &str = "pfm_davinci_resolve_script_path";

/// Relative location of the support scripts shipped with the addon.
pub const SUPPORT_ASSETS_SUBDIR: &str = "addons/davinci/assets/davinci";

/// Read access to named string settings.
pub trait ConfigSource {
    /// Returns the value for `key`, or an empty string when it is not set.
    fn get_string(&self, key: &str) -> String;
}

impl<C: ConfigSource + ?Sized> ConfigSource for &C {
    fn get_string(&self, key: &str) -> String {
        (**self).get_string(key)
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get_string(&self, key: &str) -> String {
        self.get(key).cloned().unwrap_or_default()
    }
}

/// Reads settings from environment variables named after the upper-cased key,
/// e.g. `PFM_DAVINCI_RESOLVE_EXECUTABLE_PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl ConfigSource for EnvConfig {
    fn get_string(&self, key: &str) -> String {
        std::env::var(key.to_uppercase()).unwrap_or_default()
    }
}

/// Tries each source in order and returns the first non-empty value.
#[derive(Default)]
pub struct LayeredConfig<'a> {
    layers: Vec<Box<dyn ConfigSource + 'a>>,
}

impl<'a> LayeredConfig<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn with(mut self, source: impl ConfigSource + 'a) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredConfig<'_> {
    fn get_string(&self, key: &str) -> String {
        self.layers
            .iter()
            .map(|layer| layer.get_string(key))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }
}

/// Settings for one handoff, loadable from a JSON file.
///
/// Missing fields fall back to the defaults for the current working
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffSettings {
    /// Engine installation directory, embedded in the generated script.
    pub program_dir: PathBuf,
    /// Directory receiving the temporary JSON payloads.
    pub temp_dir: PathBuf,
    /// Support scripts copied into the Fusion script directory before import.
    pub support_assets_dir: Option<PathBuf>,
    /// Executable override; empty means platform default.
    pub executable_path: String,
    /// Fusion script directory override; empty means platform default.
    pub script_path: String,
}

impl HandoffSettings {
    /// Defaults rooted at `program_dir`. The support assets directory is only
    /// set when it exists.
    pub fn for_program_dir(program_dir: impl Into<PathBuf>) -> Self {
        let program_dir = program_dir.into();
        let assets = program_dir.join(SUPPORT_ASSETS_SUBDIR);
        Self {
            temp_dir: program_dir.join("temp"),
            support_assets_dir: assets.is_dir().then_some(assets),
            program_dir,
            executable_path: String::new(),
            script_path: String::new(),
        }
    }

    /// Defaults rooted at the process working directory.
    pub fn from_working_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        Ok(Self::for_program_dir(cwd))
    }

    /// Load settings from a JSON file. Relative `temp_dir` and
    /// `support_assets_dir` entries are taken relative to `program_dir`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let mut settings: HandoffSettings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;

        if settings.temp_dir.is_relative() {
            settings.temp_dir = settings.program_dir.join(&settings.temp_dir);
        }
        if let Some(assets) = settings.support_assets_dir.take() {
            settings.support_assets_dir = Some(if assets.is_relative() {
                settings.program_dir.join(assets)
            } else {
                assets
            });
        }
        Ok(settings)
    }
}

impl Default for HandoffSettings {
    fn default() -> Self {
        Self::for_program_dir(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl ConfigSource for HandoffSettings {
    fn get_string(&self, key: &str) -> String {
        match key {
            EXECUTABLE_PATH_KEY => self.executable_path.clone(),
            SCRIPT_PATH_KEY => self.script_path.clone(),
            _ => String::new(),
        }
    }
}
