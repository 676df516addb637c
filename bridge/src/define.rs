use orb_core::{ArenaScope, Aspec, Method, ObjId, Value, Vm, VmResult};
use tracing::debug;

use crate::callback;
use crate::env;
use crate::registry;
use crate::trampoline::{method_trampoline, proc_trampoline, trampoline_for};

/// Installs callback `function` as method `name` of `target_class`.
///
/// The trampoline follows the registered callable's form; an index with no
/// slot yet gets the bound form and fails at call time. The arena mark is
/// restored on every path, so bulk registration does not grow it.
pub fn define_callable_method(
    vm: &mut Vm,
    target_class: ObjId,
    name: &str,
    function: usize,
    aspec: Aspec,
) -> VmResult<ObjId> {
    let instance = registry::current_index(vm);
    let trampoline = callback::lookup(instance, function)
        .map(|slot| trampoline_for(&slot.callable))
        .unwrap_or(method_trampoline);

    let mut scope = ArenaScope::new(vm);
    let proc = scope.proc_new_cfunc(trampoline);
    env::attach_env(&mut scope, Value::Obj(proc), Value::Int(function as i64))?;
    let mid = scope.intern(name);
    scope.define_method_raw(
        target_class,
        mid,
        Method {
            proc,
            noarg: aspec.is_none(),
        },
    )?;
    debug!(target: "orb::bridge::define", instance, function, name, noarg = aspec.is_none(), "callable method defined");
    Ok(proc)
}

/// Same as [`define_callable_method`] on the singleton class, so the method
/// is called as `ClassName.name`.
pub fn define_callable_class_method(
    vm: &mut Vm,
    class: ObjId,
    name: &str,
    function: usize,
    aspec: Aspec,
) -> VmResult<ObjId> {
    let sclass = vm.singleton_class(Value::Obj(class))?;
    define_callable_method(vm, sclass, name, function, aspec)
}

pub fn define_callable_singleton_method(
    vm: &mut Vm,
    object: Value,
    name: &str,
    function: usize,
    aspec: Aspec,
) -> VmResult<ObjId> {
    let sclass = vm.singleton_class(object)?;
    define_callable_method(vm, sclass, name, function, aspec)
}

/// Defines both the module-level and the instance-level method.
pub fn define_callable_module_function(
    vm: &mut Vm,
    module: ObjId,
    name: &str,
    function: usize,
    aspec: Aspec,
) -> VmResult<ObjId> {
    define_callable_class_method(vm, module, name, function, aspec)?;
    define_callable_method(vm, module, name, function, aspec)
}

/// Anonymous proc for handing back to VM code. Like
/// [`define_callable_method`], the trampoline follows the registered
/// callable's form. The proc stays on the arena until the caller restores
/// past it.
pub fn proc_new_callable(vm: &mut Vm, function: usize) -> VmResult<Value> {
    let instance = registry::current_index(vm);
    let trampoline = callback::lookup(instance, function)
        .map(|slot| trampoline_for(&slot.callable))
        .unwrap_or(proc_trampoline);
    let proc = {
        let mut scope = ArenaScope::new(vm);
        let proc = scope.proc_new_cfunc(trampoline);
        env::attach_env(&mut scope, Value::Obj(proc), Value::Int(function as i64))?;
        proc
    };
    vm.gc_protect(proc);
    Ok(Value::Obj(proc))
}
