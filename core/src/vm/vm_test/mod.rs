pub(super) use crate::{
    aspec::Aspec,
    config::VmConfig,
    error::VmResult,
    object::{Method, PROC_CFUNC, PROC_ENVSET},
    value::{ObjId, Value, ValueType},
    vm::{ArenaScope, ITER_CONTINUE, ITER_DELETE, ITER_STOP, Vm},
};

/// Installs `func` as a native method on `class`.
pub(super) fn def(vm: &mut Vm, class: ObjId, name: &str, func: crate::object::NativeFn, aspec: Aspec) {
    let proc = vm.proc_new_cfunc(func);
    let mid = vm.intern(name);
    vm.define_method_raw(
        class,
        mid,
        Method {
            proc,
            noarg: aspec.is_none(),
        },
    )
    .unwrap();
}

mod class;
mod collections;
mod dispatch;
mod exception;
mod gc;
