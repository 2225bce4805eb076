use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use crate::load::BuildDecl;
use crate::lua::globals;

/// Create a new Lua runtime with the `mill` global registered.
///
/// Declarations made by the build file are collected into `decl`.
pub fn create_runtime(decl: Rc<RefCell<BuildDecl>>) -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua, decl)?;
  Ok(lua)
}

/// Load and execute a Lua file at the given path.
///
/// Sets the `mill.dir` global to the directory of the loaded file and adds
/// that directory to `package.path` so build files can `require` helpers
/// placed next to them.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<()> {
  let canonical_path = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let dir = canonical_path
    .parent()
    .unwrap_or(Path::new(""))
    .to_string_lossy()
    .to_string();

  let mill_globals = lua.globals().get::<LuaTable>("mill")?;
  mill_globals.set("dir", dir.as_str())?;

  let package = lua.globals().get::<LuaTable>("package")?;
  let package_path = package.get::<String>("path")?;
  package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua;{package_path}"))?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical_path.display()))
    .exec()
}
