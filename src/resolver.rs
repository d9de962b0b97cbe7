//! Locates the DaVinci Resolve executable and its Fusion script directory.
//!
//! # Platform-Specific Behavior
//!
//! ## Windows
//! - Executable under `Program Files/Blackmagic Design/DaVinci Resolve`
//! - Scripts under `ProgramData/Blackmagic Design/DaVinci Resolve/Fusion`
//!
//! ## Linux
//! - Executable at `/opt/resolve/bin/resolve`
//! - Scripts in the user's `~/.local/share/DaVinciResolve/Fusion`, falling back
//!   to the system-wide `/opt/resolve/Fusion` and `/home/resolve/Fusion`
//!
//! ## macOS
//! - Executable inside the `DaVinci Resolve.app` bundle
//! - Scripts under `Library/Application Support`, user location first
//!
//! Console variable overrides always win and are used verbatim.

use crate::config::{ConfigSource, EXECUTABLE_PATH_KEY, SCRIPT_PATH_KEY};
use std::path::PathBuf;
use tracing::debug;

/// A lazily evaluated script directory candidate.
///
/// The provider returns `None` when it cannot produce a path at all (e.g. the
/// environment variable it depends on is unset).
pub struct PathCandidate {
    label: &'static str,
    provider: Box<dyn Fn() -> Option<PathBuf>>,
    require_existing: bool,
}

impl PathCandidate {
    /// A candidate that is only accepted if it exists on disk.
    pub fn existing(label: &'static str, provider: impl Fn() -> Option<PathBuf> + 'static) -> Self {
        Self {
            label,
            provider: Box::new(provider),
            require_existing: true,
        }
    }

    /// A candidate accepted whether or not it exists yet.
    pub fn fallback(label: &'static str, provider: impl Fn() -> Option<PathBuf> + 'static) -> Self {
        Self {
            label,
            provider: Box::new(provider),
            require_existing: false,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn evaluate(&self) -> Option<PathBuf> {
        let path = (self.provider)()?;
        if self.require_existing && !path.exists() {
            debug!("Script directory candidate {} ({:?}) does not exist", self.label, path);
            return None;
        }
        Some(path)
    }
}

/// Paths needed to launch DaVinci Resolve and drop an import script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub executable: Option<PathBuf>,
    pub script_dir: Option<PathBuf>,
}

fn env_dir(var: &str, relative: &str) -> Option<PathBuf> {
    let base = std::env::var_os(var)?;
    if base.is_empty() {
        return None;
    }
    Some(PathBuf::from(base).join(relative))
}

/// Default executable location for the current platform.
pub fn default_executable_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        Some(PathBuf::from("C:/Program Files/Blackmagic Design/DaVinci Resolve/Resolve.exe"))
    }

    #[cfg(target_os = "macos")]
    {
        Some(PathBuf::from(
            "/Applications/DaVinci Resolve/DaVinci Resolve.app/Contents/MacOS/Resolve",
        ))
    }

    #[cfg(target_os = "linux")]
    {
        Some(PathBuf::from("/opt/resolve/bin/resolve"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        None
    }
}

/// Ordered script directory candidates for the current platform.
pub fn default_script_dir_candidates() -> Vec<PathCandidate> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "windows")]
    {
        candidates.push(PathCandidate::existing("programdata", || {
            env_dir("PROGRAMDATA", "Blackmagic Design/DaVinci Resolve/Fusion")
        }));
        candidates.push(PathCandidate::fallback("default", || {
            Some(PathBuf::from("C:/ProgramData/Blackmagic Design/DaVinci Resolve/Fusion"))
        }));
    }

    #[cfg(target_os = "macos")]
    {
        candidates.push(PathCandidate::existing("user", || {
            env_dir(
                "HOME",
                "Library/Application Support/Blackmagic Design/DaVinci Resolve/Fusion",
            )
        }));
        candidates.push(PathCandidate::existing("system", || {
            Some(PathBuf::from(
                "/Library/Application Support/Blackmagic Design/DaVinci Resolve/Fusion",
            ))
        }));
    }

    #[cfg(target_os = "linux")]
    {
        candidates.push(PathCandidate::existing("user", || {
            env_dir("HOME", ".local/share/DaVinciResolve/Fusion")
        }));
        candidates.push(PathCandidate::existing("opt", || {
            Some(PathBuf::from("/opt/resolve/Fusion"))
        }));
        candidates.push(PathCandidate::existing("resolve-home", || {
            Some(PathBuf::from("/home/resolve/Fusion"))
        }));
    }

    candidates
}

/// Returns the non-empty override for `key`, taken verbatim.
fn override_path(config: &dyn ConfigSource, key: &str) -> Option<PathBuf> {
    let value = config.get_string(key);
    if value.is_empty() {
        return None;
    }
    debug!("Using {} override: {}", key, value);
    Some(PathBuf::from(value))
}

/// Resolve the executable, preferring the console variable override.
pub fn resolve_executable(config: &dyn ConfigSource) -> Option<PathBuf> {
    override_path(config, EXECUTABLE_PATH_KEY).or_else(default_executable_path)
}

/// Resolve the Fusion script directory. Candidates are evaluated in order and
/// evaluation stops at the first accepted one.
pub fn resolve_script_dir(config: &dyn ConfigSource, candidates: &[PathCandidate]) -> Option<PathBuf> {
    if let Some(path) = override_path(config, SCRIPT_PATH_KEY) {
        return Some(path);
    }
    let found = candidates.iter().find_map(|candidate| {
        candidate.evaluate().map(|path| {
            debug!("Using script directory candidate {}: {:?}", candidate.label(), path);
            path
        })
    });
    if found.is_none() {
        debug!("No DaVinci Resolve script directory candidate matched");
    }
    found
}

pub fn resolve_paths(config: &dyn ConfigSource, candidates: &[PathCandidate]) -> ResolvedPaths {
    ResolvedPaths {
        executable: resolve_executable(config),
        script_dir: resolve_script_dir(config, candidates),
    }
}

/// Whether the resolved DaVinci Resolve executable exists right now.
pub fn is_installed(config: &dyn ConfigSource) -> bool {
    resolve_executable(config).is_some_and(|path| path.exists())
}
