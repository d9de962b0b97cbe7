//! The Lua import script run inside DaVinci Resolve.
//!
//! The script is dropped into `Scripts/Utility` so it shows up under
//! Workspace -> Scripts. It hands the payload paths to `pfm.import_project`
//! from the `pragma` bridging library and deletes itself and the payloads
//! afterwards.
//! The user starts it from there; startup `.scriptlib` files run before
//! Resolve is ready to import.

use crate::handoff::{HandoffError, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Location of the import script relative to the Fusion script directory.
pub const IMPORT_SCRIPT_RELATIVE_PATH: &str = "Scripts/Utility/Import PFM Project.lua";

/// Everything the import script refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportScript {
    pub program_dir: PathBuf,
    pub project_file: PathBuf,
    pub json_payload: PathBuf,
    pub audio_map_payload: Option<PathBuf>,
    /// Where the script itself lives; used for self-removal.
    pub script_file: PathBuf,
}

impl ImportScript {
    pub fn render(&self) -> String {
        let program_dir = lua_string(&self.program_dir);
        let json_payload = lua_string(&self.json_payload);
        let audio_map = self
            .audio_map_payload
            .as_deref()
            .map(lua_string)
            .unwrap_or_else(|| "nil".to_string());

        let mut lua = String::new();
        let _ = writeln!(
            lua,
            "-- Generated by pr-davinci at {}",
            chrono::Local::now().to_rfc3339()
        );
        lua.push_str("require(\"pragma\")\n\n");
        let _ = writeln!(lua, "local pragmaInstallPath = {program_dir}");
        let _ = writeln!(lua, "local projectFile = {}", lua_string(&self.project_file));
        let _ = writeln!(lua, "local jsonProjectFilePath = {json_payload}");
        let _ = writeln!(lua, "local jsonAudioMapFilePath = {audio_map}");
        lua.push_str("print(\"pragmaInstallPath: \", pragmaInstallPath)\n");
        lua.push_str("print(\"projectFile: \", projectFile)\n");
        lua.push_str("print(\"jsonProjectFilePath: \", jsonProjectFilePath)\n");
        lua.push_str(
            "local res, errMsg = pfm.import_project(pragmaInstallPath, jsonProjectFilePath, jsonAudioMapFilePath)\n",
        );
        lua.push_str("if(res == false) then\n");
        lua.push_str("\tprint(\"Failed to import PFM project: \", errMsg)\n");
        lua.push_str("end\n");
        let _ = writeln!(lua, "os.remove({})", lua_string(&self.script_file));
        let _ = writeln!(lua, "os.remove({json_payload})");
        if self.audio_map_payload.is_some() {
            let _ = writeln!(lua, "os.remove({audio_map})");
        }
        lua
    }
}

/// Path of the import script inside `script_dir`.
pub fn import_script_path(script_dir: &Path) -> PathBuf {
    script_dir.join(IMPORT_SCRIPT_RELATIVE_PATH)
}

/// Write the import script. An existing script is overwritten.
pub fn write_import_script(script: &ImportScript) -> Result<()> {
    let path = &script.script_file;
    let to_error = |source: std::io::Error| HandoffError::ScriptWrite {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, script.render()).map_err(to_error)?;

    info!("Wrote DaVinci Resolve import script {:?}", path);
    Ok(())
}

/// Quote a path as a double-quoted Lua string literal.
fn lua_string(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
