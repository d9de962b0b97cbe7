use pr_davinci::config::{EXECUTABLE_PATH_KEY, SCRIPT_PATH_KEY};
use pr_davinci::project::{AUDIO_MAP_JSON_FILE, PROJECT_JSON_FILE};
use pr_davinci::script::IMPORT_SCRIPT_RELATIVE_PATH;
use pr_davinci::{
    GenerateRequest, HandoffResult, HandoffSettings, Launcher, PathCandidate, Pipeline,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Default)]
struct RecordingLauncher {
    launched: RefCell<Vec<PathBuf>>,
}

impl Launcher for RecordingLauncher {
    fn launch(&self, executable: &Path) -> io::Result<()> {
        self.launched.borrow_mut().push(executable.to_path_buf());
        Ok(())
    }
}

struct FailingLauncher;

impl Launcher for FailingLauncher {
    fn launch(&self, _executable: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "sandboxed"))
    }
}

struct Fixture {
    _root: TempDir,
    program_dir: PathBuf,
    fusion_dir: PathBuf,
    project_file: PathBuf,
    config: HashMap<String, String>,
}

impl Fixture {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let program_dir = root.path().join("pragma");
        let fusion_dir = root.path().join("Fusion");
        fs::create_dir_all(program_dir.join("projects")).unwrap();
        fs::create_dir_all(&fusion_dir).unwrap();

        let project_file = program_dir.join("projects/demo.pfmp");
        fs::write(
            &project_file,
            json!({ "assetData": { "session": { "name": "demo" } } }).to_string(),
        )
        .unwrap();

        let mut config = HashMap::new();
        config.insert(
            EXECUTABLE_PATH_KEY.to_string(),
            root.path().join("resolve").to_string_lossy().into_owned(),
        );
        config.insert(
            SCRIPT_PATH_KEY.to_string(),
            fusion_dir.to_string_lossy().into_owned(),
        );

        Self {
            _root: root,
            program_dir,
            fusion_dir,
            project_file,
            config,
        }
    }

    fn settings(&self) -> HandoffSettings {
        HandoffSettings::for_program_dir(&self.program_dir)
    }

    fn script_file(&self) -> PathBuf {
        self.fusion_dir.join(IMPORT_SCRIPT_RELATIVE_PATH)
    }

    fn temp_json(&self) -> PathBuf {
        self.program_dir.join("temp").join(PROJECT_JSON_FILE)
    }
}

#[test]
fn successful_handoff_writes_script_and_payload() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let handoff = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .generate_project(&GenerateRequest::new(&fixture.project_file))
        .unwrap();

    assert_eq!(launcher.launched.borrow().len(), 1);
    assert_eq!(handoff.script_file, fixture.script_file());
    assert_eq!(handoff.json_payload, fixture.temp_json());
    assert_eq!(handoff.audio_map_payload, None);

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.temp_json()).unwrap()).unwrap();
    assert_eq!(payload, json!({ "session": { "name": "demo" } }));

    let script = fs::read_to_string(fixture.script_file()).unwrap();
    assert!(script.contains(&*handoff.project_file.to_string_lossy()));
    assert!(script.contains(&*fixture.temp_json().to_string_lossy()));
    assert!(script.contains("pfm.import_project("));
}

#[test]
fn relative_project_path_is_resolved_against_program_dir() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new("projects/demo.pfmp"));

    assert_eq!(result, HandoffResult::Success);
    let script = fs::read_to_string(fixture.script_file()).unwrap();
    assert!(script.contains("projects/demo.pfmp"));
}

#[test]
fn audio_map_is_written_and_referenced() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();
    let request = GenerateRequest::new(&fixture.project_file)
        .with_audio_map(r#"{ "A1": "dialog", "A2": "music" }"#);

    let handoff = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .generate_project(&request)
        .unwrap();

    let audio_map = fixture.program_dir.join("temp").join(AUDIO_MAP_JSON_FILE);
    assert_eq!(handoff.audio_map_payload, Some(audio_map.clone()));
    let script = fs::read_to_string(fixture.script_file()).unwrap();
    assert!(script.contains(&*audio_map.to_string_lossy()));
}

#[test]
fn missing_project_writes_nothing() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new(fixture.program_dir.join("projects/missing.pfmp")));

    assert_eq!(result, HandoffResult::FailedToLocateTimelineFile);
    assert!(launcher.launched.borrow().is_empty());
    assert!(!fixture.script_file().exists());
    assert!(!fixture.temp_json().exists());
}

#[test]
fn unreadable_project_fails_to_load() {
    let fixture = Fixture::new();
    fs::write(&fixture.project_file, "not a project").unwrap();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new(&fixture.project_file));

    assert_eq!(result, HandoffResult::FailedToLoadProject);
    assert!(launcher.launched.borrow().is_empty());
    assert!(!fixture.script_file().exists());
}

#[test]
fn launch_failure_stops_before_writing() {
    let fixture = Fixture::new();
    let settings = fixture.settings();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(FailingLauncher)
        .run(&GenerateRequest::new(&fixture.project_file));

    assert_eq!(result, HandoffResult::FailedToLaunchDaVinci);
    assert!(!fixture.temp_json().exists());
    assert!(!fixture.script_file().exists());
}

#[test]
fn invalid_audio_map_fails_before_launch() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new(&fixture.project_file).with_audio_map("not json"));

    assert_eq!(result, HandoffResult::FailedToWriteTempData);
    assert!(launcher.launched.borrow().is_empty());
    assert!(!fixture.temp_json().exists());
    assert!(!fixture.script_file().exists());
}

#[test]
fn unresolved_script_dir_fails_to_write_script() {
    let mut fixture = Fixture::new();
    fixture.config.remove(SCRIPT_PATH_KEY);
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();
    let missing = fixture.program_dir.join("no-fusion-here");

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .with_candidates(vec![PathCandidate::existing("missing", move || {
            Some(missing.clone())
        })])
        .run(&GenerateRequest::new(&fixture.project_file));

    assert_eq!(result, HandoffResult::FailedToWriteImportScript);
    // Temp data is left in place; there is no rollback.
    assert!(fixture.temp_json().exists());
}

#[test]
fn support_files_are_installed_before_the_handoff() {
    let fixture = Fixture::new();
    let assets = fixture.program_dir.join("addons/davinci/assets/davinci");
    fs::create_dir_all(assets.join("Modules/Lua")).unwrap();
    fs::write(assets.join("Modules/Lua/pragma.lua"), "return {}").unwrap();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new(&fixture.project_file));

    assert_eq!(result, HandoffResult::Success);
    assert!(fixture.fusion_dir.join("Modules/Lua/pragma.lua").exists());
}

#[test]
fn failed_support_file_install_is_terminal() {
    let fixture = Fixture::new();
    let mut settings = fixture.settings();
    settings.support_assets_dir = Some(fixture.program_dir.join("no-assets"));
    let launcher = RecordingLauncher::default();

    let result = Pipeline::new(&fixture.config, &settings)
        .with_launcher(&launcher)
        .run(&GenerateRequest::new(&fixture.project_file));

    assert_eq!(result, HandoffResult::FailedToInstallSupportFiles);
    assert!(launcher.launched.borrow().is_empty());
}

#[test]
fn repeated_handoffs_overwrite_the_script() {
    let fixture = Fixture::new();
    let settings = fixture.settings();
    let launcher = RecordingLauncher::default();
    let pipeline = Pipeline::new(&fixture.config, &settings).with_launcher(&launcher);

    let other = fixture.program_dir.join("projects/other.pfmp");
    fs::write(&other, "{}").unwrap();

    assert!(pipeline.run(&GenerateRequest::new(&fixture.project_file)).is_success());
    assert!(pipeline.run(&GenerateRequest::new(&other)).is_success());

    let script = fs::read_to_string(fixture.script_file()).unwrap();
    assert!(script.contains("other.pfmp"));
    assert!(!script.contains("demo.pfmp"));
    assert_eq!(launcher.launched.borrow().len(), 2);
}
