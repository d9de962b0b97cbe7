//! Project data handed to DaVinci Resolve.
//!
//! The project file is located, its asset data is loaded and re-encoded as
//! JSON, and the JSON is written to the temp directory where the import
//! script picks it up.

use crate::handoff::{HandoffError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the project payload inside the temp directory.
pub const PROJECT_JSON_FILE: &str = "davinci_target_project.json";
/// File name of the optional audio map payload inside the temp directory.
pub const AUDIO_MAP_JSON_FILE: &str = "davinci_target_project_audio_map.json";

/// Loads the asset data of a serialized project.
pub trait ProjectLoader {
    fn load_asset_data(&self, path: &Path) -> Result<Value>;
}

impl<L: ProjectLoader + ?Sized> ProjectLoader for &L {
    fn load_asset_data(&self, path: &Path) -> Result<Value> {
        (**self).load_asset_data(path)
    }
}

/// Reads projects stored as JSON documents.
///
/// The `assetData` member is the payload when present; otherwise the whole
/// document is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProjectLoader;

impl ProjectLoader for JsonProjectLoader {
    fn load_asset_data(&self, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|source| HandoffError::ProjectRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document: Value =
            serde_json::from_str(&content).map_err(|source| HandoffError::ProjectDecode {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(asset_data) = document.get_mut("assetData") {
            return Ok(asset_data.take());
        }
        Ok(document)
    }
}

/// Find the project file and return its absolute path.
///
/// Absolute paths are checked as given. Relative paths are tried against each
/// search root in order.
pub fn locate_project_file(path: &Path, search_roots: &[PathBuf]) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = if path.is_absolute() {
        vec![path.to_path_buf()]
    } else {
        search_roots.iter().map(|root| root.join(path)).collect()
    };

    for candidate in candidates {
        if candidate.is_file() {
            let absolute = fs::canonicalize(&candidate).unwrap_or(candidate);
            debug!("Located project file {:?} at {:?}", path, absolute);
            return Ok(absolute);
        }
    }
    Err(HandoffError::ProjectNotFound(path.to_path_buf()))
}

/// Payload files written for one handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPayloads {
    pub project: PathBuf,
    pub audio_map: Option<PathBuf>,
}

/// Parse the audio track mapping handed in by the caller.
pub fn parse_audio_map(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(HandoffError::AudioMap)
}

/// Write the project JSON and, if given, the audio map JSON into `temp_dir`.
pub fn write_temp_payloads(
    temp_dir: &Path,
    asset_data: &Value,
    audio_map: Option<&Value>,
) -> Result<TempPayloads> {
    fs::create_dir_all(temp_dir).map_err(|source| HandoffError::TempWrite {
        path: temp_dir.to_path_buf(),
        source,
    })?;

    let project = temp_dir.join(PROJECT_JSON_FILE);
    write_json(&project, asset_data)?;

    let audio_map = match audio_map {
        Some(map) => {
            let path = temp_dir.join(AUDIO_MAP_JSON_FILE);
            write_json(&path, map)?;
            Some(path)
        }
        None => None,
    };

    Ok(TempPayloads { project, audio_map })
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(HandoffError::Encode)?;
    fs::write(path, content).map_err(|source| HandoffError::TempWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::HandoffResult;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn asset_data_member_is_extracted() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("project.pfmp.json");
        fs::write(
            &file,
            json!({ "version": 1, "assetData": { "session": { "name": "demo" } } }).to_string(),
        )
        .unwrap();

        let data = JsonProjectLoader.load_asset_data(&file).unwrap();
        assert_eq!(data, json!({ "session": { "name": "demo" } }));
    }

    #[test]
    fn whole_document_without_asset_data() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("project.json");
        fs::write(&file, r#"{"session": {}}"#).unwrap();

        let data = JsonProjectLoader.load_asset_data(&file).unwrap();
        assert_eq!(data, json!({ "session": {} }));
    }

    #[test]
    fn corrupt_project_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("broken.json");
        fs::write(&file, "\u{0}\u{1}binary").unwrap();

        let err = JsonProjectLoader.load_asset_data(&file).unwrap_err();
        assert_eq!(err.result(), HandoffResult::FailedToLoadProject);
    }

    #[test]
    fn relative_paths_use_search_roots_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("projects")).unwrap();
        fs::write(second.path().join("projects/a.json"), "{}").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = locate_project_file(Path::new("projects/a.json"), &roots).unwrap();
        assert!(found.is_absolute());
        assert_eq!(
            found,
            fs::canonicalize(second.path().join("projects/a.json")).unwrap()
        );
    }

    #[test]
    fn missing_project_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = locate_project_file(&dir.path().join("nope.json"), &[]).unwrap_err();
        assert_eq!(err.result(), HandoffResult::FailedToLocateTimelineFile);
    }

    #[test]
    fn payloads_are_written_to_temp_dir() {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("temp");
        let audio_map = parse_audio_map(r#"{"track1": "dialog"}"#).unwrap();
        let payloads = write_temp_payloads(&temp, &json!({ "a": 1 }), Some(&audio_map)).unwrap();

        assert_eq!(payloads.project, temp.join(PROJECT_JSON_FILE));
        assert_eq!(payloads.audio_map, Some(temp.join(AUDIO_MAP_JSON_FILE)));
        let written: Value =
            serde_json::from_str(&fs::read_to_string(&payloads.project).unwrap()).unwrap();
        assert_eq!(written, json!({ "a": 1 }));
    }

    #[test]
    fn invalid_audio_map_is_rejected() {
        let err = parse_audio_map("not json").unwrap_err();
        assert_eq!(err.result(), HandoffResult::FailedToWriteTempData);
    }
}
