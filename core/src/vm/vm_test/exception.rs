use super::*;

fn fail(vm: &mut Vm, _self: Value) -> VmResult<Value> {
    Err(vm.runtime_error("boom"))
}

fn nested(vm: &mut Vm, recv: Value) -> VmResult<Value> {
    vm.funcall(recv, "fail", &[])
}

#[test]
fn raise_sets_current_exception() {
    let mut vm = Vm::open();
    let class = vm.builtins().argument_error;
    let err = vm.raise(class, "bad value");
    assert_eq!(err.to_string(), "ArgumentError: bad value");
    assert_eq!(vm.current_exception(), Some(err.value()));
    assert_eq!(vm.exc_message(err.value()), "bad value");
    vm.exc_clear();
    assert!(vm.current_exception().is_none());
}

#[test]
fn exc_new_does_not_raise() {
    let mut vm = Vm::open();
    let class = vm.builtins().standard_error;
    let exc = vm.exc_new(class, "quiet");
    assert_eq!(vm.type_of(exc), ValueType::Exception);
    assert!(vm.current_exception().is_none());
}

#[test]
fn raising_a_non_exception_is_type_error() {
    let mut vm = Vm::open();
    let err = vm.exc_raise(Value::Int(1));
    assert!(err.is_a("TypeError"));
}

#[test]
fn protect_catches_nested_raise_and_restores_depth() {
    let mut vm = Vm::open();
    let object = vm.builtins().object;
    def(&mut vm, object, "fail", fail, Aspec::none());
    def(&mut vm, object, "nested", nested, Aspec::none());
    let top = vm.top_self();

    let result = vm.protect(|vm| {
        assert_eq!(vm.protect_depth(), 1);
        vm.funcall(top, "nested", &[])
    });
    let err = result.unwrap_err();
    assert!(err.is_a("RuntimeError"));
    assert_eq!(err.message(), "boom");
    assert_eq!(vm.call_depth(), 0);
    assert_eq!(vm.protect_depth(), 0);
    assert!(vm.current_exception().is_none());
    assert_eq!(vm.exc_message(err.value()), "boom");
}

#[test]
fn protect_passes_values_through() {
    let mut vm = Vm::open();
    let out = vm.protect(|_| Ok(Value::Int(7))).unwrap();
    assert_eq!(out, Value::Int(7));
}

#[test]
fn vm_exception_converts_into_anyhow() {
    let mut vm = Vm::open();
    let err: anyhow::Error = vm.type_error("wrong").into();
    assert_eq!(err.to_string(), "TypeError: wrong");
    assert!(err.downcast_ref::<crate::error::VmException>().is_some());
}
