#[cfg(test)]
mod tests {
    use anyhow::{Context, anyhow};
    use orb_core::{Aspec, Value, Vm};

    use crate::exception::{self, RaiseError, raise_error};
    use crate::state::State;

    fn raised(vm: &mut Vm, err: anyhow::Error) -> (String, String) {
        let value = raise_error(vm, &err);
        assert_eq!(vm.current_exception(), Some(value));
        let class = vm.class_name(vm.real_class_of(value));
        (class, vm.exc_message(value))
    }

    #[test]
    fn live_exception_from_callback_is_raised() {
        let mut state = State::open();
        let object = state.object_class();
        state
            .define_method(
                object,
                "boom",
                |vm, _ctx| exception::raise_runtime_error(vm, "boom"),
                Aspec::none(),
            )
            .unwrap();
        let top = state.top_self();
        let err = state.funcall(top, "boom", &[]).unwrap_err();
        assert!(err.is_a("RuntimeError"));
        assert_eq!(err.message(), "boom");
        assert_eq!(state.vm().current_exception(), None);
    }

    #[test]
    fn lookalike_exception_is_a_plain_return_value() {
        let mut state = State::open();
        let object = state.object_class();
        state
            .define_method(
                object,
                "make_error",
                |vm, _ctx| {
                    let class = vm.builtins().runtime_error;
                    vm.exc_new(class, "not raised")
                },
                Aspec::none(),
            )
            .unwrap();
        let top = state.top_self();
        let out = state.funcall(top, "make_error", &[]).unwrap();
        let vm = state.vm();
        assert_eq!(vm.class_name(vm.real_class_of(out)), "RuntimeError");
        assert_eq!(vm.exc_message(out), "not raised");
    }

    #[test]
    fn nested_raise_propagates_through_callback() {
        let mut state = State::open();
        let object = state.object_class();
        state
            .define_method(
                object,
                "outer",
                |vm, ctx| match vm.funcall(ctx.receiver, "missing_method", &[]) {
                    Ok(v) => v,
                    Err(err) => err.value(),
                },
                Aspec::none(),
            )
            .unwrap();
        let top = state.top_self();
        let err = state.funcall(top, "outer", &[]).unwrap_err();
        assert!(err.is_a("NoMethodError"));
        assert_eq!(state.vm().call_depth(), 0);
    }

    #[test]
    fn protect_unwinds_depth_and_clears_exception() {
        let mut vm = Vm::open();
        let before = vm.call_depth();
        let result = exception::protect(&mut vm, |vm| {
            let class = vm.builtins().argument_error;
            Err(vm.raise(class, "inside"))
        });
        let err = result.unwrap_err();
        assert!(err.is_a("ArgumentError"));
        assert_eq!(vm.call_depth(), before);
        assert_eq!(vm.protect_depth(), 0);
        assert_eq!(vm.current_exception(), None);
    }

    #[test]
    fn call_returns_ok_for_normal_methods() {
        let mut vm = Vm::open();
        let out = exception::call(&mut vm, Value::Int(1), "nope", &[]);
        assert!(out.unwrap_err().is_a("NoMethodError"));
    }

    #[test]
    fn raise_outside_exception_hierarchy_falls_back() {
        let mut vm = Vm::open();
        let object = vm.builtins().object;
        let value = exception::raise(&mut vm, object, "odd");
        assert_eq!(vm.class_name(vm.real_class_of(value)), "Exception");
        assert_eq!(vm.exc_message(value), "odd");
    }

    #[test]
    fn raise_error_uses_typed_error() {
        let mut vm = Vm::open();
        let (class, msg) = raised(&mut vm, anyhow!(RaiseError::key("missing")));
        assert_eq!((class.as_str(), msg.as_str()), ("KeyError", "missing"));
    }

    #[test]
    fn raise_error_finds_typed_error_under_context() {
        let mut vm = Vm::open();
        let err = Err::<(), _>(RaiseError::index("too far"))
            .context("while reading")
            .unwrap_err();
        let (class, msg) = raised(&mut vm, err);
        assert_eq!((class.as_str(), msg.as_str()), ("IndexError", "too far"));
    }

    #[test]
    fn raise_error_resolves_named_class() {
        let mut vm = Vm::open();
        let (class, _) = raised(&mut vm, anyhow!(RaiseError::named("FrozenError", "cold")));
        assert_eq!(class, "FrozenError");
        let (class, _) = raised(&mut vm, anyhow!(RaiseError::named("NoSuchError", "x")));
        assert_eq!(class, "StandardError");
    }

    #[test]
    fn raise_error_maps_vm_exception() {
        let mut vm = Vm::open();
        let vm_err = vm.range_error("1..2 out of range");
        vm.exc_clear();
        let (class, msg) = raised(&mut vm, anyhow::Error::new(vm_err));
        assert_eq!((class.as_str(), msg.as_str()), ("RangeError", "1..2 out of range"));
    }

    #[test]
    fn raise_error_reads_class_prefix() {
        let mut vm = Vm::open();
        let (class, msg) = raised(&mut vm, anyhow!("TypeError: not a number"));
        assert_eq!((class.as_str(), msg.as_str()), ("TypeError", "not a number"));

        let (class, msg) = raised(&mut vm, anyhow!("Object: hello"));
        assert_eq!((class.as_str(), msg.as_str()), ("StandardError", "Object: hello"));

        let (class, msg) = raised(&mut vm, anyhow!("plain failure"));
        assert_eq!((class.as_str(), msg.as_str()), ("StandardError", "plain failure"));
    }

    #[test]
    fn fallible_method_surfaces_error_class() {
        let mut state = State::open();
        let object = state.object_class();
        state
            .define_method_fallible(
                object,
                "checked",
                |vm, _ctx| {
                    let n = vm.get_arg(0).as_int().ok_or_else(|| RaiseError::type_error("need Integer"))?;
                    Ok(Value::Int(n * 2))
                },
                Aspec::req(1),
            )
            .unwrap();
        let top = state.top_self();
        assert_eq!(state.funcall(top, "checked", &[Value::Int(4)]).unwrap(), Value::Int(8));
        let err = state.funcall(top, "checked", &[Value::Nil]).unwrap_err();
        assert!(err.is_a("TypeError"));
        assert_eq!(err.message(), "need Integer");
    }
}
