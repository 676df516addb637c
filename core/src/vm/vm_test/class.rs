use super::*;

#[test]
fn boot_defines_exception_hierarchy() {
    let vm = Vm::open();
    let b = *vm.builtins();
    assert_eq!(vm.superclass(b.standard_error), Some(b.exception));
    assert_eq!(vm.superclass(b.key_error), Some(b.index_error));
    assert_eq!(vm.superclass(b.no_method_error), Some(b.name_error));
    assert_eq!(vm.class_get("TypeError"), Some(b.type_error));
    assert_eq!(vm.class_name(b.frozen_error), "FrozenError");
    assert_eq!(vm.type_of(Value::Obj(b.kernel)), ValueType::Module);
    assert_eq!(vm.real_class_of(Value::Obj(b.object)), b.class);
    assert_eq!(vm.type_of(Value::Obj(vm.class_of(Value::Obj(b.object)))), ValueType::SClass);
}

#[test]
fn define_class_is_idempotent_and_checks_superclass() {
    let mut vm = Vm::open();
    let base = vm.define_class("Base", None).unwrap();
    let child = vm.define_class("Child", Some(base)).unwrap();
    assert_eq!(vm.define_class("Child", Some(base)).unwrap(), child);
    let object = vm.builtins().object;
    let err = vm.define_class("Child", Some(object)).unwrap_err();
    assert!(err.is_a("TypeError"));
    assert!(err.message().contains("superclass mismatch"));

    vm.define_module("Tools").unwrap();
    let err = vm.define_class("Tools", None).unwrap_err();
    assert_eq!(err.message(), "Tools is not a class");
}

#[test]
fn nested_class_resolves_through_outer() {
    let mut vm = Vm::open();
    let outer = vm.define_module("Outer").unwrap();
    let inner = vm.define_class_under(outer, "Inner", None).unwrap();
    assert_eq!(vm.const_get(outer, "Inner").unwrap(), Value::Obj(inner));
    assert!(!vm.const_defined(vm.builtins().object, "Inner"));
    let err = vm.const_get(outer, "Missing").unwrap_err();
    assert!(err.is_a("NameError"));
}

#[test]
fn singleton_class_overrides_instance_lookup() {
    fn greet(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Int(1))
    }
    fn special(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Int(2))
    }

    let mut vm = Vm::open();
    let class = vm.define_class("Greeter", None).unwrap();
    def(&mut vm, class, "greet", greet, Aspec::none());
    let a = vm.obj_new(class).unwrap();
    let b = vm.obj_new(class).unwrap();
    let sclass = vm.singleton_class(a).unwrap();
    assert_eq!(vm.singleton_class(a).unwrap(), sclass);
    def(&mut vm, sclass, "greet", special, Aspec::none());

    assert_eq!(vm.funcall(a, "greet", &[]).unwrap(), Value::Int(2));
    assert_eq!(vm.funcall(b, "greet", &[]).unwrap(), Value::Int(1));
    assert_eq!(vm.real_class_of(a), class);
    assert!(vm.is_kind_of(a, class));
    assert_eq!(vm.type_of(Value::Obj(sclass)), ValueType::SClass);
}

#[test]
fn class_singleton_inherits_parent_singleton() {
    fn build(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Bool(true))
    }

    let mut vm = Vm::open();
    let base = vm.define_class("Factory", None).unwrap();
    let child = vm.define_class("SubFactory", Some(base)).unwrap();
    let base_meta = vm.singleton_class(Value::Obj(base)).unwrap();
    def(&mut vm, base_meta, "build", build, Aspec::none());
    assert_eq!(vm.funcall(Value::Obj(child), "build", &[]).unwrap(), Value::Bool(true));
}

#[test]
fn singleton_class_of_immediate_is_type_error() {
    let mut vm = Vm::open();
    let err = vm.singleton_class(Value::Int(3)).unwrap_err();
    assert!(err.is_a("TypeError"));
    assert_eq!(err.message(), "can't define singleton");
}

#[test]
fn undef_and_alias() {
    fn one(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Int(1))
    }

    let mut vm = Vm::open();
    let class = vm.define_class("Aliased", None).unwrap();
    def(&mut vm, class, "one", one, Aspec::none());
    let first = vm.intern("first");
    let one_sym = vm.intern("one");
    vm.alias_method(class, first, one_sym).unwrap();
    let obj = vm.obj_new(class).unwrap();
    assert!(vm.respond_to(obj, "first"));
    vm.undef_method(class, one_sym).unwrap();
    assert!(!vm.respond_to(obj, "one"));
    assert_eq!(vm.funcall(obj, "first", &[]).unwrap(), Value::Int(1));
    assert!(vm.undef_method(class, one_sym).unwrap_err().is_a("NameError"));
}

#[test]
fn frozen_class_rejects_methods_and_ivars() {
    fn noop(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Nil)
    }

    let mut vm = Vm::open();
    let class = vm.define_class("Sealed", None).unwrap();
    let obj = vm.obj_new(class).unwrap();
    vm.iv_set(obj, "@x", Value::Int(5)).unwrap();
    assert_eq!(vm.iv_get(obj, "@x"), Value::Int(5));
    vm.freeze(obj);
    assert!(vm.iv_set(obj, "@x", Value::Int(6)).unwrap_err().is_a("FrozenError"));

    vm.freeze(Value::Obj(class));
    let proc = vm.proc_new_cfunc(noop);
    let mid = vm.intern("noop");
    let err = vm
        .define_method_raw(class, mid, Method { proc, noarg: true })
        .unwrap_err();
    assert_eq!(err.message(), "can't modify frozen Class");
}
