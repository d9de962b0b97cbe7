//! Value types shared by every step of the handoff.
//!
//! `HandoffResult` is the closed set of outcomes the engine sees. `HandoffError`
//! is the richer error used inside the crate; each variant collapses to exactly
//! one result code at the binding boundary.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Outcome of a `generate_project` call, as exposed to the engine.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandoffResult {
    Success = 0,
    FailedToInstallSupportFiles = 1,
    FailedToLocateTimelineFile = 2,
    FailedToLoadProject = 3,
    FailedToLaunchDaVinci = 4,
    FailedToWriteTempData = 5,
    FailedToWriteImportScript = 6,
}

impl HandoffResult {
    /// Every result, in code order.
    pub const ALL: [HandoffResult; 7] = [
        HandoffResult::Success,
        HandoffResult::FailedToInstallSupportFiles,
        HandoffResult::FailedToLocateTimelineFile,
        HandoffResult::FailedToLoadProject,
        HandoffResult::FailedToLaunchDaVinci,
        HandoffResult::FailedToWriteTempData,
        HandoffResult::FailedToWriteImportScript,
    ];

    /// Number of result codes (exported to Lua as `RESULT_COUNT`).
    pub const COUNT: u32 = Self::ALL.len() as u32;

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn is_success(self) -> bool {
        self == HandoffResult::Success
    }

    /// Stable identifier, returned by `davinci.result_to_string`.
    pub fn name(self) -> &'static str {
        match self {
            HandoffResult::Success => "Success",
            HandoffResult::FailedToInstallSupportFiles => "FailedToInstallSupportFiles",
            HandoffResult::FailedToLocateTimelineFile => "FailedToLocateTimelineFile",
            HandoffResult::FailedToLoadProject => "FailedToLoadProject",
            HandoffResult::FailedToLaunchDaVinci => "FailedToLaunchDaVinci",
            HandoffResult::FailedToWriteTempData => "FailedToWriteTempData",
            HandoffResult::FailedToWriteImportScript => "FailedToWriteImportScript",
        }
    }

    /// Name of the integer constant registered in the `davinci` Lua library.
    pub fn lua_constant(self) -> &'static str {
        match self {
            HandoffResult::Success => "RESULT_SUCCESS",
            HandoffResult::FailedToInstallSupportFiles => "RESULT_FAILED_TO_INSTALL_SUPPORT_FILES",
            HandoffResult::FailedToLocateTimelineFile => "RESULT_FAILED_TO_LOCATE_TIMELINE_FILE",
            HandoffResult::FailedToLoadProject => "RESULT_FAILED_TO_LOAD_PROJECT",
            HandoffResult::FailedToLaunchDaVinci => "RESULT_FAILED_TO_LAUNCH_DAVINCI",
            HandoffResult::FailedToWriteTempData => "RESULT_FAILED_TO_WRITE_TEMP_DATA",
            HandoffResult::FailedToWriteImportScript => "RESULT_FAILED_TO_WRITE_DAVINCI_IMPORT_SCRIPT",
        }
    }

    /// Human-readable sentence for UIs and the CLI.
    pub fn description(self) -> &'static str {
        match self {
            HandoffResult::Success => "The project was handed off to DaVinci Resolve",
            HandoffResult::FailedToInstallSupportFiles => {
                "Failed to copy the PFM support scripts into the DaVinci Resolve script directory"
            }
            HandoffResult::FailedToLocateTimelineFile => "The project file could not be found",
            HandoffResult::FailedToLoadProject => "The project file could not be loaded",
            HandoffResult::FailedToLaunchDaVinci => "DaVinci Resolve could not be started",
            HandoffResult::FailedToWriteTempData => "Failed to write the temporary project data",
            HandoffResult::FailedToWriteImportScript => {
                "Failed to write the import script into the DaVinci Resolve script directory"
            }
        }
    }
}

/// Maps a raw code back to its name; unknown codes yield `"Unknown"`.
pub fn result_to_string(code: u32) -> &'static str {
    HandoffResult::from_code(code).map_or("Unknown", HandoffResult::name)
}

impl std::fmt::Display for HandoffResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while running the handoff pipeline.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to install support files from {source_dir:?} into {target_dir:?}: {cause:#}")]
    SupportFiles {
        source_dir: PathBuf,
        target_dir: PathBuf,
        cause: anyhow::Error,
    },

    #[error("project file not found: {0:?}")]
    ProjectNotFound(PathBuf),

    #[error("failed to read project file {path:?}: {source}")]
    ProjectRead { path: PathBuf, source: io::Error },

    #[error("failed to decode project file {path:?}: {source}")]
    ProjectDecode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no DaVinci Resolve executable is known for this platform")]
    ExecutableUnresolved,

    #[error("failed to launch {path:?}: {source}")]
    Launch { path: PathBuf, source: io::Error },

    #[error("failed to write temporary data {path:?}: {source}")]
    TempWrite { path: PathBuf, source: io::Error },

    #[error("audio map is not valid JSON: {0}")]
    AudioMap(serde_json::Error),

    #[error("failed to encode project data: {0}")]
    Encode(serde_json::Error),

    #[error("DaVinci Resolve script directory could not be determined")]
    ScriptDirUnresolved,

    #[error("failed to write import script {path:?}: {source}")]
    ScriptWrite { path: PathBuf, source: io::Error },
}

impl HandoffError {
    /// The result code reported to the engine for this error.
    pub fn result(&self) -> HandoffResult {
        match self {
            HandoffError::SupportFiles { .. } => HandoffResult::FailedToInstallSupportFiles,
            HandoffError::ProjectNotFound(_) => HandoffResult::FailedToLocateTimelineFile,
            HandoffError::ProjectRead { .. } | HandoffError::ProjectDecode { .. } => {
                HandoffResult::FailedToLoadProject
            }
            HandoffError::ExecutableUnresolved | HandoffError::Launch { .. } => {
                HandoffResult::FailedToLaunchDaVinci
            }
            HandoffError::TempWrite { .. } | HandoffError::AudioMap(_) | HandoffError::Encode(_) => {
                HandoffResult::FailedToWriteTempData
            }
            HandoffError::ScriptDirUnresolved | HandoffError::ScriptWrite { .. } => {
                HandoffResult::FailedToWriteImportScript
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HandoffError>;

/// Input of a single handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Project file as given by the caller; may be relative.
    pub project_file: PathBuf,
    /// Optional audio track mapping, as JSON text.
    pub audio_map: Option<String>,
}

impl GenerateRequest {
    pub fn new(project_file: impl Into<PathBuf>) -> Self {
        Self {
            project_file: project_file.into(),
            audio_map: None,
        }
    }

    pub fn with_audio_map(mut self, audio_map: impl Into<String>) -> Self {
        self.audio_map = Some(audio_map.into());
        self
    }
}

/// Files touched by a successful handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub executable: PathBuf,
    pub project_file: PathBuf,
    pub json_payload: PathBuf,
    pub audio_map_payload: Option<PathBuf>,
    pub script_file: PathBuf,
}
