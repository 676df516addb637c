use std::sync::Arc;

use super::*;

fn sum_args(vm: &mut Vm, _self: Value) -> VmResult<Value> {
    let mut total = 0;
    for i in 0..vm.get_argc() {
        total += vm.get_arg(i).as_int().unwrap_or(0);
    }
    Ok(Value::Int(total))
}

fn recurse(vm: &mut Vm, recv: Value) -> VmResult<Value> {
    vm.funcall(recv, "recurse", &[])
}

#[test]
fn funcall_passes_arguments_to_native_method() {
    let mut vm = Vm::open();
    let object = vm.builtins().object;
    def(&mut vm, object, "sum", sum_args, Aspec::any());
    let top = vm.top_self();
    let out = vm
        .funcall(top, "sum", &[Value::Int(1), Value::Int(2), Value::Int(39)])
        .unwrap();
    assert_eq!(out, Value::Int(42));
    assert_eq!(vm.call_depth(), 0);
}

#[test]
fn unknown_method_raises_no_method_error() {
    let mut vm = Vm::open();
    let err = vm.funcall(Value::Int(1), "frobnicate", &[]).unwrap_err();
    assert!(err.is_a("NoMethodError"));
    assert_eq!(err.message(), "undefined method 'frobnicate' for Integer");
    assert_eq!(vm.current_exception(), Some(err.value()));
}

#[test]
fn noarg_method_rejects_arguments() {
    let mut vm = Vm::open();
    let object = vm.builtins().object;
    def(&mut vm, object, "plain", sum_args, Aspec::none());
    let top = vm.top_self();
    assert_eq!(vm.funcall(top, "plain", &[]).unwrap(), Value::Int(0));
    let err = vm.funcall(top, "plain", &[Value::Int(1), Value::Int(2)]).unwrap_err();
    assert!(err.is_a("ArgumentError"));
    assert_eq!(err.message(), "wrong number of arguments (given 2, expected 0)");
}

#[test]
fn too_many_arguments_is_argument_error() {
    let mut vm = Vm::open_with(VmConfig::default().with_funcall_argc_max(2));
    let object = vm.builtins().object;
    def(&mut vm, object, "sum", sum_args, Aspec::any());
    let top = vm.top_self();
    let err = vm.funcall(top, "sum", &[Value::Int(1); 3]).unwrap_err();
    assert!(err.is_a("ArgumentError"));
    assert_eq!(err.message(), "Too long arguments. (limit=2)");
}

#[test]
fn deep_recursion_is_system_stack_error() {
    let mut vm = Vm::open_with(VmConfig::default().with_max_call_depth(32));
    let object = vm.builtins().object;
    def(&mut vm, object, "recurse", recurse, Aspec::none());
    let top = vm.top_self();
    let err = vm.funcall(top, "recurse", &[]).unwrap_err();
    assert!(err.is_a("SystemStackError"));
    assert_eq!(vm.call_depth(), 0);
}

#[test]
fn block_and_mid_are_visible_to_native_method() {
    fn yield_twice(vm: &mut Vm, recv: Value) -> VmResult<Value> {
        let block = vm.get_args_block();
        let mid = vm.get_mid().map(|m| vm.sym_name(m).to_string());
        assert_eq!(mid.as_deref(), Some("each_twice"));
        vm.call_proc(block, recv, &[Value::Int(1)])?;
        vm.call_proc(block, recv, &[Value::Int(2)])
    }

    let mut vm = Vm::open();
    let object = vm.builtins().object;
    def(&mut vm, object, "each_twice", yield_twice, Aspec::block());
    let seen = vm.ary_new();
    let block = vm.proc_new_lexical(Arc::new(move |vm: &mut Vm, _self: Value, args: &[Value]| -> VmResult<Value> {
        vm.ary_push(seen, args[0])?;
        Ok(args[0])
    }));
    let top = vm.top_self();
    let out = vm
        .funcall_with_block(top, "each_twice", &[], Value::Obj(block))
        .unwrap();
    assert_eq!(out, Value::Int(2));
    assert_eq!(vm.ary_values(seen).unwrap(), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn call_proc_rejects_non_proc() {
    let mut vm = Vm::open();
    let top = vm.top_self();
    let err = vm.call_proc(Value::Int(4), top, &[]).unwrap_err();
    assert!(err.is_a("TypeError"));
}

#[test]
fn cfunc_env_is_read_from_the_running_proc() {
    fn read_env(vm: &mut Vm, _self: Value) -> VmResult<Value> {
        vm.proc_cfunc_env_get(1)
    }

    let mut vm = Vm::open();
    let proc = vm.proc_new_cfunc_with_env(read_env, &[Value::Int(10), Value::Int(20)]);
    let flags = vm.proc_flags(proc).unwrap();
    assert_ne!(flags & PROC_CFUNC, 0);
    assert_ne!(flags & PROC_ENVSET, 0);
    let top = vm.top_self();
    assert_eq!(vm.call_proc(Value::Obj(proc), top, &[]).unwrap(), Value::Int(20));

    let err = vm.proc_env_get(proc, 2).unwrap_err();
    assert!(err.is_a("IndexError"));
    assert_eq!(err.message(), "Env index out of range: 2 (expected: 0 <= index < 2)");
}

#[test]
fn env_get_on_lexical_proc_is_type_error() {
    let mut vm = Vm::open();
    let lexical = vm.proc_new_lexical(Arc::new(|_vm: &mut Vm, _self: Value, _args: &[Value]| -> VmResult<Value> {
        Ok(Value::Nil)
    }));
    let err = vm.proc_env_get(lexical, 0).unwrap_err();
    assert_eq!(err.message(), "Can't get cfunc env from non-cfunc proc.");

    let bare = vm.proc_new_cfunc(sum_args);
    let err = vm.proc_env_get(bare, 0).unwrap_err();
    assert_eq!(err.message(), "Can't get cfunc env from cfunc Proc without REnv.");
}
