//! pr_davinci
//!
//! Engine module that hands a PFM project off to DaVinci Resolve.
//!
//! # Architecture
//!
//! The library is loaded by the engine as a shared module and drives a single
//! pipeline:
//! - **Resolve**: find the Resolve executable and its Fusion script directory
//! - **Launch**: start Resolve as a detached process
//! - **Load**: read the project and re-encode its asset data as JSON
//! - **Write**: drop `Scripts/Utility/Import PFM Project.lua`, which imports
//!   the JSON through the `pragma` bridging library and then removes itself
//!
//! # Modules
//!
//! ## Handoff (`handoff`, `operations`)
//! - `HandoffResult` - Result codes returned to the engine
//! - `Pipeline::generate_project()` - Run all steps, returning the files written
//! - `install_support_files()` - Copy the bundled bridging scripts into Resolve
//!
//! ## Surroundings (`config`, `resolver`, `launcher`, `project`, `script`)
//! - `ConfigSource` - Console variable style settings access
//! - `resolve_paths()` / `is_installed()` - Platform defaults and overrides
//! - `Launcher` - Fire-and-forget process start
//! - `ProjectLoader` - Project asset data as JSON
//! - `ImportScript` - The generated Lua script
//!
//! ## Engine Boundary (`bindings`, `ffi`)
//! - `davinci` Lua library: `generate_project`, `is_installed`,
//!   `result_to_string` and `RESULT_*` constants
//! - `pragma_attach` / `pragma_detach` / `pragma_initialize_lua` /
//!   `pragma_terminate_lua` entry points (`host-module` feature)

#[cfg(all(feature = "host-module", feature = "vendored-lua"))]
compile_error!("`host-module` needs `--no-default-features`: the engine supplies Lua");

pub mod bindings;
pub mod config;
#[cfg(any(feature = "host-module", test))]
pub mod ffi;
pub mod handoff;
pub mod launcher;
pub mod operations;
pub mod project;
pub mod resolver;
pub mod script;

pub use config::{ConfigSource, EnvConfig, HandoffSettings, LayeredConfig};
pub use handoff::{result_to_string, GenerateRequest, Handoff, HandoffError, HandoffResult};
pub use launcher::{Launcher, SystemLauncher};
pub use operations::{install_support_files, Pipeline};
pub use project::{JsonProjectLoader, ProjectLoader};
pub use resolver::{is_installed, resolve_paths, PathCandidate, ResolvedPaths};
