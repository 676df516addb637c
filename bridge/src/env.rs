//! Closure environments on native procs.
//!
//! A bridged proc carries its callback index in a one-slot environment. The
//! environment is written once; later captures fail instead of replacing it.

use orb_core::{ArenaScope, ObjId, Value, ValueType, Vm, VmResult};
use tracing::trace;

fn expect_proc(vm: &mut Vm, proc: Value) -> VmResult<ObjId> {
    if proc.is_nil() {
        return Err(vm.type_error("RProc is empty."));
    }
    match proc {
        Value::Obj(id) if vm.type_of(proc) == ValueType::Proc => Ok(id),
        other => {
            let desc = vm.inspect(other);
            Err(vm.type_error(format!("{desc} is not a Proc")))
        }
    }
}

pub fn attach_env(vm: &mut Vm, proc: Value, value: Value) -> VmResult<()> {
    attach_env_values(vm, proc, &[value])
}

pub fn attach_env_values(vm: &mut Vm, proc: Value, values: &[Value]) -> VmResult<()> {
    let id = expect_proc(vm, proc)?;
    if values.is_empty() {
        return Err(vm.argument_error("environment needs at least one value"));
    }
    if env_len(vm, proc) > 0 {
        return Err(vm.type_error("Expected empty RProc environment."));
    }
    let mut scope = ArenaScope::new(vm);
    let env = scope.env_new(values);
    scope.proc_set_env_raw(id, env);
    trace!(target: "orb::bridge::env", proc = %id, len = values.len(), "environment attached");
    Ok(())
}

/// Reads slot `idx` of a native proc's environment.
pub fn env_get(vm: &mut Vm, proc: Value, idx: i64) -> VmResult<Value> {
    match proc {
        Value::Obj(id) if vm.type_of(proc) == ValueType::Proc => vm.proc_env_get(id, idx),
        _ => Err(vm.type_error("Can't get cfunc env from non-cfunc proc.")),
    }
}

/// Overwrites slot `idx`. Environments are unshared, so only `proc` sees it.
pub fn env_set(vm: &mut Vm, proc: Value, idx: i64, value: Value) -> VmResult<()> {
    match proc {
        Value::Obj(id) if vm.type_of(proc) == ValueType::Proc => vm.proc_env_set(id, idx, value),
        _ => Err(vm.type_error("Can't get cfunc env from non-cfunc proc.")),
    }
}

pub fn has_env(vm: &Vm, proc: Value) -> bool {
    env_len(vm, proc) > 0
}

pub fn env_len(vm: &Vm, proc: Value) -> usize {
    proc.as_obj()
        .and_then(|id| vm.proc_env(id))
        .and_then(|env| vm.env_values(env))
        .map_or(0, <[Value]>::len)
}
