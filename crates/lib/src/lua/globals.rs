//! Global Lua values and the `mill` table.
//!
//! This module registers the `mill` global table which provides:
//! - `mill.os` - Operating system name (e.g., "linux", "macos", "windows")
//! - `mill.arch` - CPU architecture (e.g., "x86_64", "aarch64")
//! - `mill.dir` - Directory of the build file being loaded (set by the loader)
//! - `mill.project{}` - Name the project and its default target
//! - `mill.target{}` - Define a target

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use super::target::register_mill_target;
use crate::load::BuildDecl;

/// Register the `mill` global table in the Lua runtime.
pub fn register_globals(lua: &Lua, decl: Rc<RefCell<BuildDecl>>) -> LuaResult<()> {
  let mill = lua.create_table()?;

  mill.set("os", std::env::consts::OS)?;
  mill.set("arch", std::env::consts::ARCH)?;

  register_mill_project(lua, &mill, decl.clone())?;
  register_mill_target(lua, &mill, decl)?;

  lua.globals().set("mill", mill)?;

  Ok(())
}

/// Register `mill.project { name = "...", default = "..." }`.
///
/// Both fields are optional. Calling it again overrides earlier values.
fn register_mill_project(lua: &Lua, mill_table: &LuaTable, decl: Rc<RefCell<BuildDecl>>) -> LuaResult<()> {
  let project_fn = lua.create_function(move |_, spec_table: LuaTable| {
    let name: Option<String> = spec_table.get("name")?;
    let default: Option<String> = spec_table.get("default")?;

    let mut decl = decl.borrow_mut();
    if let Some(name) = name {
      decl.name = Some(name);
    }
    if let Some(default) = default {
      decl.default = Some(default);
    }
    Ok(())
  })?;

  mill_table.set("project", project_fn)?;
  Ok(())
}
