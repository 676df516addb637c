use super::*;

#[test]
fn arena_scope_restores_mark() {
    let mut vm = Vm::open();
    let before = vm.arena_len();
    {
        let mut scope = ArenaScope::new(&mut vm);
        for _ in 0..10 {
            scope.ary_new();
        }
        assert_eq!(scope.arena_len(), before + 10);
    }
    assert_eq!(vm.arena_len(), before);
}

#[test]
fn unreachable_objects_are_collected() {
    let mut vm = Vm::open();
    let mark = vm.gc_arena_save();
    let kept = vm.str_new("kept");
    let dropped = vm.str_new("dropped");
    vm.gc_arena_restore(mark);
    vm.gv_set("$kept", kept);
    let freed = vm.full_gc();
    assert!(freed >= 1);
    assert!(vm.is_dead(dropped.as_obj().unwrap()));
    assert!(!vm.is_dead(kept.as_obj().unwrap()));
}

#[test]
fn disabled_gc_keeps_everything() {
    let mut vm = Vm::open();
    let mark = vm.gc_arena_save();
    let garbage = vm.ary_new();
    vm.gc_arena_restore(mark);
    let runs = vm.gc_collections();
    assert!(!vm.gc_disable());
    assert_eq!(vm.full_gc(), 0);
    assert!(!vm.is_dead(garbage.as_obj().unwrap()));
    assert_eq!(vm.gc_collections(), runs);
    assert!(vm.gc_enable());
    vm.full_gc();
    assert!(vm.is_dead(garbage.as_obj().unwrap()));
    assert_eq!(vm.gc_collections(), runs + 1);
}

#[test]
fn methods_survive_collection() {
    fn answer(_vm: &mut Vm, _self: Value) -> VmResult<Value> {
        Ok(Value::Int(42))
    }

    let mut vm = Vm::open();
    let mark = vm.gc_arena_save();
    let class = vm.define_class("Survivor", None).unwrap();
    def(&mut vm, class, "answer", answer, Aspec::none());
    vm.gc_arena_restore(mark);
    vm.full_gc();
    let obj = vm.obj_new(class).unwrap();
    assert_eq!(vm.funcall(obj, "answer", &[]).unwrap(), Value::Int(42));
}

#[test]
fn each_objects_stops_on_nonzero_status() {
    fn count(_vm: &mut Vm, _obj: ObjId, ctx: *mut std::ffi::c_void) -> i32 {
        let seen = unsafe { &mut *(ctx as *mut usize) };
        *seen += 1;
        if *seen == 3 { ITER_STOP } else { ITER_CONTINUE }
    }

    let mut vm = Vm::open();
    let mut seen = 0usize;
    vm.objspace_each_objects(count, &mut seen as *mut usize as *mut _);
    assert_eq!(seen, 3);
}
