//! Engine module entry points.
//!
//! The engine loads the module as a shared library and calls four C-compatible
//! functions over its lifetime:
//!
//! - `pragma_attach` after the library has been loaded
//! - `pragma_initialize_lua` for every Lua state that should see the bindings
//! - `pragma_terminate_lua` when such a state is about to be closed
//! - `pragma_detach` before the library is unloaded
//!
//! The entry points are only built with the `host-module` feature, which takes
//! the Lua symbols from the engine that owns the states passed in.
//!
//! # Memory Management
//!
//! - Lua states are owned by the engine; they are never closed here
//! - The error buffer passed to `pragma_attach` is owned by the caller and
//!   receives a null-terminated UTF-8 message, truncated to fit

use crate::bindings::{unregister, DavinciLibrary};
use crate::config::HandoffSettings;
use mlua::ffi::lua_State;
use mlua::Lua;
use std::io;
use std::os::raw::c_char;
use std::ptr;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Called after the module has been loaded.
/// Returns false and fills `err_buf` when the module cannot be used.
#[no_mangle]
pub extern "C" fn pragma_attach(err_buf: *mut c_char, err_len: usize) -> bool {
    // The engine may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(log_writer)
        .try_init();

    match HandoffSettings::from_working_dir() {
        Ok(settings) => {
            info!(
                "Custom module \"pr_davinci\" has been loaded (program directory {:?})",
                settings.program_dir
            );
            true
        }
        Err(e) => {
            write_error(err_buf, err_len, &format!("{:#}", e));
            false
        }
    }
}

/// Called when the module is about to be unloaded.
#[no_mangle]
pub extern "C" fn pragma_detach() {
    info!("Custom module \"pr_davinci\" is about to be unloaded");
}

/// Registers the `davinci` library in the given Lua state.
#[no_mangle]
pub extern "C" fn pragma_initialize_lua(state: *mut lua_State) {
    if state.is_null() {
        return;
    }

    let settings = match HandoffSettings::from_working_dir() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to initialize DaVinci Resolve bindings: {:#}", e);
            return;
        }
    };

    unsafe {
        let lua = Lua::init_from_ptr(state);
        if let Err(e) = DavinciLibrary::new(settings).register(&lua) {
            error!("Failed to register the davinci Lua library: {}", e);
        }
    }
}

/// Called when the Lua state is about to be closed.
#[no_mangle]
pub extern "C" fn pragma_terminate_lua(state: *mut lua_State) {
    if state.is_null() {
        return;
    }

    unsafe {
        let lua = Lua::init_from_ptr(state);
        if let Err(e) = unregister(&lua) {
            error!("Failed to unregister the davinci Lua library: {}", e);
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// The host console owns stdout.
fn log_writer() -> io::Stderr {
    io::stderr()
}

fn write_error(buf: *mut c_char, len: usize, message: &str) {
    if buf.is_null() || len == 0 {
        return;
    }

    let bytes = message.as_bytes();
    let count = bytes.len().min(len - 1);
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr().cast::<c_char>(), buf, count);
        *buf.add(count) = 0;
    }
}
