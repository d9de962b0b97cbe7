//! The handoff pipeline.
//!
//! Steps run in a fixed order and stop at the first failure:
//! - Resolve: executable and Fusion script directory
//! - Install: copy the bundled support scripts (optional)
//! - Locate and load: find the project file, read its asset data and parse
//!   the audio map
//! - Launch: start DaVinci Resolve
//! - Write: temp JSON payloads, then the import script
//!
//! Nothing is rolled back; files written before a failure stay in place.

use crate::config::{ConfigSource, HandoffSettings};
use crate::handoff::{GenerateRequest, Handoff, HandoffError, HandoffResult, Result};
use crate::launcher::{Launcher, SystemLauncher};
use crate::project::{
    locate_project_file, parse_audio_map, write_temp_payloads, JsonProjectLoader, ProjectLoader,
};
use crate::resolver::{default_script_dir_candidates, resolve_paths, PathCandidate};
use crate::script::{import_script_path, write_import_script, ImportScript};
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Everything a handoff needs from its surroundings.
pub struct Pipeline<'a> {
    config: &'a dyn ConfigSource,
    settings: &'a HandoffSettings,
    candidates: Vec<PathCandidate>,
    launcher: Box<dyn Launcher + 'a>,
    loader: Box<dyn ProjectLoader + 'a>,
}

impl<'a> Pipeline<'a> {
    /// A pipeline using the platform defaults, a real process launcher and
    /// the JSON project loader.
    pub fn new(config: &'a dyn ConfigSource, settings: &'a HandoffSettings) -> Self {
        Self {
            config,
            settings,
            candidates: default_script_dir_candidates(),
            launcher: Box::new(SystemLauncher),
            loader: Box::new(JsonProjectLoader),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<PathCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_launcher(mut self, launcher: impl Launcher + 'a) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    pub fn with_loader(mut self, loader: impl ProjectLoader + 'a) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Run the handoff and collapse the outcome to a result code.
    pub fn run(&self, request: &GenerateRequest) -> HandoffResult {
        match self.generate_project(request) {
            Ok(handoff) => {
                info!("Project handed off to DaVinci Resolve via {:?}", handoff.script_file);
                HandoffResult::Success
            }
            Err(e) => {
                error!("DaVinci Resolve handoff failed: {}", e);
                e.result()
            }
        }
    }

    /// Run the handoff, returning the files it produced.
    pub fn generate_project(&self, request: &GenerateRequest) -> Result<Handoff> {
        let paths = resolve_paths(self.config, &self.candidates);

        match (&self.settings.support_assets_dir, &paths.script_dir) {
            (Some(assets), Some(script_dir)) => install_support_files(assets, script_dir)?,
            (Some(_), None) => warn!("Skipping support file installation: no script directory"),
            (None, _) => {}
        }

        let search_roots = [
            self.settings.program_dir.clone(),
            std::env::current_dir().unwrap_or_default(),
        ];
        let project_file = locate_project_file(&request.project_file, &search_roots)?;
        let asset_data = self.loader.load_asset_data(&project_file)?;
        info!("Loaded project {:?}", project_file);
        let audio_map = request
            .audio_map
            .as_deref()
            .map(parse_audio_map)
            .transpose()?;

        let executable = paths.executable.ok_or(HandoffError::ExecutableUnresolved)?;
        self.launcher
            .launch(&executable)
            .map_err(|source| HandoffError::Launch {
                path: executable.clone(),
                source,
            })?;

        let payloads = write_temp_payloads(
            &self.settings.temp_dir,
            &asset_data,
            audio_map.as_ref(),
        )?;

        let script_dir = paths.script_dir.ok_or(HandoffError::ScriptDirUnresolved)?;
        let script = ImportScript {
            program_dir: self.settings.program_dir.clone(),
            project_file: project_file.clone(),
            json_payload: payloads.project.clone(),
            audio_map_payload: payloads.audio_map.clone(),
            script_file: import_script_path(&script_dir),
        };
        write_import_script(&script)?;

        Ok(Handoff {
            executable,
            project_file,
            json_payload: payloads.project,
            audio_map_payload: payloads.audio_map,
            script_file: script.script_file,
        })
    }
}

/// Copy the bundled support scripts into the Fusion script directory,
/// overwriting existing files.
pub fn install_support_files(assets_dir: &Path, script_dir: &Path) -> Result<()> {
    copy_directory_recursive(assets_dir, script_dir).map_err(|cause| {
        HandoffError::SupportFiles {
            source_dir: assets_dir.to_path_buf(),
            target_dir: script_dir.to_path_buf(),
            cause,
        }
    })?;
    info!("Installed support files from {:?} into {:?}", assets_dir, script_dir);
    Ok(())
}

/// Recursively copy a directory.
fn copy_directory_recursive(source: &Path, dest: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {:?}", dest))?;

    let entries =
        fs::read_dir(source).with_context(|| format!("Failed to read directory: {:?}", source))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if path.is_dir() {
            copy_directory_recursive(&path, &dest_path)?;
        } else {
            fs::copy(&path, &dest_path)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest_path))?;
        }
    }

    Ok(())
}
