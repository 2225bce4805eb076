//! Lua bindings for `mill.target{}`.
//!
//! This module provides:
//! - `StepRecorder` as LuaUserData with methods like `cmd` and `copy`
//! - `register_mill_target()` to register the `mill.target` function

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::{debug, warn};

use crate::action::{CmdOpts, CopyOpts, Step, StepRecorder};
use crate::load::{BuildDecl, TargetDecl};

impl LuaUserData for StepRecorder {
  fn add_fields<F: LuaUserDataFields<Self>>(fields: &mut F) {
    fields.add_field_method_get("name", |_, this| Ok(this.name().to_string()));
  }

  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method_mut("cmd", |_, this, opts: LuaValue| {
      this.cmd(parse_cmd_opts(opts)?);
      Ok(())
    });

    methods.add_method_mut("echo", |_, this, message: String| {
      this.record(Step::Echo { message });
      Ok(())
    });

    methods.add_method_mut("mkdir", |_, this, path: String| {
      this.record(Step::Mkdir { path });
      Ok(())
    });

    methods.add_method_mut("copy", |_, this, opts: LuaTable| {
      this.record(Step::Copy(parse_copy_opts(&opts)?));
      Ok(())
    });

    methods.add_method_mut("delete", |_, this, path: String| {
      this.record(Step::Delete { path });
      Ok(())
    });

    methods.add_method_mut("sleep", |_, this, ms: u64| {
      this.record(Step::Sleep { ms });
      Ok(())
    });

    methods.add_method_mut("fail", |_, this, message: String| {
      this.record(Step::Fail { message });
      Ok(())
    });
  }
}

fn parse_cmd_opts(opts: LuaValue) -> LuaResult<CmdOpts> {
  match opts {
    LuaValue::String(s) => {
      let cmd = s.to_str()?.to_string();
      Ok(CmdOpts::new(&cmd))
    }
    LuaValue::Table(table) => {
      let cmd: String = table.get("cmd")?;
      let cwd: Option<String> = table.get("cwd")?;
      let env: Option<LuaTable> = table.get("env")?;

      let mut opts = CmdOpts::new(&cmd);
      if let Some(cwd) = cwd {
        opts = opts.with_cwd(&cwd);
      }

      if let Some(env_table) = env {
        let mut env_map = BTreeMap::new();
        for pair in env_table.pairs::<String, String>() {
          let (key, value) = pair?;
          env_map.insert(key, value);
        }
        opts = opts.with_env(env_map);
      }
      Ok(opts)
    }
    _ => Err(LuaError::external("cmd() expects a string or table with 'cmd' field")),
  }
}

fn parse_copy_opts(table: &LuaTable) -> LuaResult<CopyOpts> {
  let from: String = table
    .get("from")
    .map_err(|_| LuaError::external("copy() requires a 'from' field"))?;
  let to: String = table
    .get("to")
    .map_err(|_| LuaError::external("copy() requires a 'to' field"))?;

  let mut opts = CopyOpts::new(&from, &to);
  opts.include = table.get::<Option<Vec<String>>>("include")?.unwrap_or_default();
  opts.exclude = table.get::<Option<Vec<String>>>("exclude")?.unwrap_or_default();
  Ok(opts)
}

/// Register the `mill.target` function on the mill table.
///
/// The `mill.target{}` function:
/// 1. Parses the target declaration (name, depends, parallel, apply)
/// 2. Calls `apply(ctx)` with a fresh `StepRecorder`, if given
/// 3. Takes the recorded steps back out of the userdata
/// 4. Adds the target to the build declaration, replacing any earlier target
///    of the same name
/// 5. Returns the target name so it can be used in other `depends` lists
pub fn register_mill_target(lua: &Lua, mill_table: &LuaTable, decl: Rc<RefCell<BuildDecl>>) -> LuaResult<()> {
  let target_fn = lua.create_function(move |lua, spec_table: LuaTable| {
    let name: String = spec_table
      .get("name")
      .map_err(|_| LuaError::external("target declaration requires 'name' field"))?;

    let depends: Vec<String> = spec_table
      .get::<Option<Vec<String>>>("depends")
      .map_err(|_| LuaError::external(format!("target '{}': 'depends' must be a list of names", name)))?
      .unwrap_or_default();

    let parallel: bool = spec_table.get::<Option<bool>>("parallel")?.unwrap_or(false);
    let apply_fn: Option<LuaFunction> = spec_table.get("apply")?;

    let (steps, line) = match apply_fn {
      Some(apply_fn) => {
        let line = apply_fn.info().line_defined.map(|l| l as u32);

        let ctx_userdata = lua.create_userdata(StepRecorder::new(&name))?;
        apply_fn.call::<()>(&ctx_userdata)?;

        let recorder: StepRecorder = ctx_userdata.take()?;
        (recorder.into_steps(), line)
      }
      None => (Vec::new(), None),
    };

    debug!(target = %name, steps = steps.len(), parallel, "declared target");

    let target = TargetDecl {
      name: name.clone(),
      depends,
      parallel,
      line,
      steps,
    };

    if decl.borrow_mut().insert_target(target).is_some() {
      warn!(target = %name, "target declared twice, keeping the later declaration");
    }

    Ok(name)
  })?;

  mill_table.set("target", target_fn)?;
  Ok(())
}
