//! The `davinci` Lua library exposed to the engine's scripting environment.
//!
//! ```lua
//! if davinci.is_installed() then
//!     local res = davinci.generate_project("projects/demo.pfmp")
//!     if res ~= davinci.RESULT_SUCCESS then
//!         print("Handoff failed: " .. davinci.result_to_string(res))
//!     end
//! end
//! ```
//!
//! Settings are read from the engine's console variables through
//! `console.get_convar_string`, with environment variables as a fallback.
//! Pipeline failures are returned as result codes, never raised as Lua errors.

use crate::config::{ConfigSource, EnvConfig, HandoffSettings, LayeredConfig};
use crate::handoff::{result_to_string, GenerateRequest, HandoffResult};
use crate::launcher::{Launcher, SystemLauncher};
use crate::operations::Pipeline;
use crate::resolver::{default_script_dir_candidates, is_installed, PathCandidate};
use mlua::{Function, Lua, Table, Value};
use std::rc::Rc;
use tracing::debug;

/// Name of the global table holding the library.
pub const LIBRARY_NAME: &str = "davinci";

/// Reads console variables from the engine's `console` Lua library.
pub struct LuaConVars<'lua> {
    lua: &'lua Lua,
}

impl<'lua> LuaConVars<'lua> {
    pub fn new(lua: &'lua Lua) -> Self {
        Self { lua }
    }

    fn lookup(&self, key: &str) -> mlua::Result<String> {
        let Some(console) = self.lua.globals().get::<Option<Table>>("console")? else {
            return Ok(String::new());
        };
        let Some(get) = console.get::<Option<Function>>("get_convar_string")? else {
            return Ok(String::new());
        };
        Ok(get.call::<Option<String>>(key)?.unwrap_or_default())
    }
}

impl ConfigSource for LuaConVars<'_> {
    fn get_string(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|e| {
            debug!("Failed to read console variable {}: {}", key, e);
            String::new()
        })
    }
}

fn host_config(lua: &Lua) -> LayeredConfig<'_> {
    LayeredConfig::new()
        .with(LuaConVars::new(lua))
        .with(EnvConfig)
}

/// Builder for the `davinci` library.
pub struct DavinciLibrary {
    settings: Rc<HandoffSettings>,
    launcher: Rc<dyn Launcher>,
    candidates: Rc<dyn Fn() -> Vec<PathCandidate>>,
}

impl DavinciLibrary {
    pub fn new(settings: HandoffSettings) -> Self {
        Self {
            settings: Rc::new(settings),
            launcher: Rc::new(SystemLauncher),
            candidates: Rc::new(default_script_dir_candidates),
        }
    }

    pub fn with_launcher(mut self, launcher: impl Launcher + 'static) -> Self {
        self.launcher = Rc::new(launcher);
        self
    }

    pub fn with_candidates(mut self, candidates: impl Fn() -> Vec<PathCandidate> + 'static) -> Self {
        self.candidates = Rc::new(candidates);
        self
    }

    /// Register the library and its result constants as the global
    /// `davinci` table.
    pub fn register(self, lua: &Lua) -> mlua::Result<()> {
        let library = lua.create_table()?;

        let DavinciLibrary {
            settings,
            launcher,
            candidates,
        } = self;
        library.set(
            "generate_project",
            lua.create_function(
                move |lua, (project_file, audio_map): (String, Option<String>)| {
                    let mut request = GenerateRequest::new(project_file);
                    request.audio_map = audio_map;

                    let config = host_config(lua);
                    let result = Pipeline::new(&config, &settings)
                        .with_candidates((*candidates)())
                        .with_launcher(&*launcher)
                        .run(&request);
                    Ok(result.code())
                },
            )?,
        )?;

        library.set(
            "is_installed",
            lua.create_function(|lua, ()| Ok(is_installed(&host_config(lua))))?,
        )?;

        library.set(
            "result_to_string",
            lua.create_function(|_, code: i64| {
                Ok(u32::try_from(code).map_or("Unknown", result_to_string))
            })?,
        )?;

        for result in HandoffResult::ALL {
            library.set(result.lua_constant(), result.code())?;
        }
        library.set("RESULT_COUNT", HandoffResult::COUNT)?;

        lua.globals().set(LIBRARY_NAME, library)?;
        debug!("Registered Lua library {}", LIBRARY_NAME);
        Ok(())
    }
}

/// Remove the library from the global table.
pub fn unregister(lua: &Lua) -> mlua::Result<()> {
    lua.globals().set(LIBRARY_NAME, Value::Nil)
}
