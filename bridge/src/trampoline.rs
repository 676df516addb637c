//! Native entry points installed in bridged procs.
//!
//! Both trampolines read the callback index from slot 0 of the running
//! proc's environment, route through the host callback table of the calling
//! instance, and raise the result when it is the live exception.

use orb_core::{NativeFn, Value, Vm, VmResult};

use crate::callback::{self, HostCallable};
use crate::{exception, registry};

/// Bound form: forwards `(instance, receiver, function)`.
pub fn method_trampoline(vm: &mut Vm, receiver: Value) -> VmResult<Value> {
    let function = function_index(vm)?;
    let instance = registry::current_index(vm);
    let mark = vm.gc_arena_save();
    let ret = callback::host_method_callback(vm, instance, receiver, function);
    finish(vm, mark, ret)
}

/// Free form: forwards the receiver plus all arguments as one array.
pub fn proc_trampoline(vm: &mut Vm, receiver: Value) -> VmResult<Value> {
    let function = function_index(vm)?;
    let instance = registry::current_index(vm);
    let mark = vm.gc_arena_save();
    let argv = vm.get_args();
    let args = vm.ary_new_from(&argv);
    let ret = callback::host_proc_callback(vm, instance, receiver, function, args);
    finish(vm, mark, ret)
}

pub fn trampoline_for(callable: &HostCallable) -> NativeFn {
    match callable {
        HostCallable::Method(_) => method_trampoline,
        HostCallable::Proc(_) => proc_trampoline,
    }
}

fn finish(vm: &mut Vm, mark: usize, ret: Value) -> VmResult<Value> {
    vm.gc_arena_restore(mark);
    if let Some(id) = ret.as_obj() {
        vm.gc_protect(id);
    }
    exception::raise_if_live(vm, ret)
}

fn function_index(vm: &mut Vm) -> VmResult<usize> {
    match vm.proc_cfunc_env_get(0)? {
        Value::Int(i) if i >= 0 => Ok(i as usize),
        other => {
            let desc = vm.inspect(other);
            Err(vm.type_error(format!("callback index must be a non-negative Integer, got {desc}")))
        }
    }
}
