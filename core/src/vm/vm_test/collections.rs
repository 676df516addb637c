use std::ffi::c_void;

use super::*;

#[test]
fn array_index_wraps_and_pads() {
    let mut vm = Vm::open();
    let ary = vm.ary_new_from(&[Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(vm.ary_ref(ary, -1).unwrap(), Value::Int(3));
    assert_eq!(vm.ary_ref(ary, 3).unwrap(), Value::Nil);
    assert_eq!(vm.ary_ref(ary, -4).unwrap(), Value::Nil);
    vm.ary_set(ary, 5, Value::Int(6)).unwrap();
    assert_eq!(vm.ary_len(ary).unwrap(), 6);
    assert_eq!(vm.ary_ref(ary, 4).unwrap(), Value::Nil);
    let err = vm.ary_set(ary, -7, Value::Nil).unwrap_err();
    assert!(err.is_a("IndexError"));
}

#[test]
fn wrong_type_is_type_error() {
    let mut vm = Vm::open();
    let s = vm.str_new("text");
    let err = vm.ary_len(s).unwrap_err();
    assert!(err.is_a("TypeError"));
    assert_eq!(err.message(), "\"text\" cannot be converted to Array");
}

#[test]
fn hash_string_keys_are_copied_and_frozen() {
    let mut vm = Vm::open();
    let hash = vm.hash_new();
    let key = vm.str_new("name");
    vm.hash_set(hash, key, Value::Int(1)).unwrap();
    vm.str_cat(key, "-changed").unwrap();
    let lookup = vm.str_new("name");
    assert_eq!(vm.hash_get(hash, lookup).unwrap(), Some(Value::Int(1)));
    let stored = vm.hash_keys(hash).unwrap()[0];
    assert_ne!(stored, key);
    assert!(vm.is_frozen(stored));
}

#[test]
fn hash_keeps_insertion_order_across_delete() {
    let mut vm = Vm::open();
    let hash = vm.hash_new();
    for i in 0..4 {
        vm.hash_set(hash, Value::Int(i), Value::Int(i * 10)).unwrap();
    }
    assert_eq!(vm.hash_delete(hash, Value::Int(1)).unwrap(), Some(Value::Int(10)));
    assert_eq!(vm.hash_delete(hash, Value::Int(9)).unwrap(), None);
    assert_eq!(vm.hash_keys(hash).unwrap(), vec![Value::Int(0), Value::Int(2), Value::Int(3)]);
    assert_eq!(vm.hash_get(hash, Value::Int(3)).unwrap(), Some(Value::Int(30)));
}

fn delete_even(_vm: &mut Vm, key: Value, _value: Value, ctx: *mut c_void) -> i32 {
    let visited = unsafe { &mut *(ctx as *mut Vec<i64>) };
    let k = key.as_int().unwrap_or(-1);
    visited.push(k);
    if k == 4 {
        ITER_STOP
    } else if k % 2 == 0 {
        ITER_DELETE
    } else {
        ITER_CONTINUE
    }
}

#[test]
fn hash_foreach_honours_stop_and_delete() {
    let mut vm = Vm::open();
    let hash = vm.hash_new();
    for i in 0..6 {
        vm.hash_set(hash, Value::Int(i), Value::Nil).unwrap();
    }
    let mut visited: Vec<i64> = Vec::new();
    vm.hash_foreach(hash, delete_even, &mut visited as *mut Vec<i64> as *mut c_void)
        .unwrap();
    assert_eq!(visited, vec![0, 1, 2, 3, 4]);
    assert_eq!(
        vm.hash_keys(hash).unwrap(),
        vec![Value::Int(1), Value::Int(3), Value::Int(4), Value::Int(5)]
    );
}

#[test]
fn range_beg_len_resolves_bounds() {
    let mut vm = Vm::open();
    let r = vm.range_new(Value::Int(1), Value::Int(-1), false);
    assert_eq!(vm.range_beg_len(r, 5, true).unwrap(), (1, 4));
    let r = vm.range_new(Value::Int(0), Value::Int(10), true);
    assert_eq!(vm.range_beg_len(r, 5, true).unwrap(), (0, 5));
    let r = vm.range_new(Value::Int(-9), Value::Int(2), false);
    let err = vm.range_beg_len(r, 5, true).unwrap_err();
    assert!(err.is_a("RangeError"));
    assert_eq!(err.message(), "-9..2 out of range");
    let r = vm.range_new(Value::Int(7), Value::Int(8), false);
    assert!(vm.range_beg_len(r, 5, true).is_err());
    let s = vm.str_new("x");
    assert!(vm.range_beg_len(s, 5, true).unwrap_err().is_a("TypeError"));
}

#[test]
fn array_set_far_past_end_is_index_error() {
    let mut vm = Vm::open();
    let ary = vm.ary_new();
    let err = vm.ary_set(ary, i64::MAX, Value::Nil).unwrap_err();
    assert!(err.is_a("IndexError"));
    assert_eq!(err.message(), "index 9223372036854775807 too big");
    assert_eq!(vm.ary_len(ary).unwrap(), 0);
}

#[test]
fn array_growth_respects_configured_limit() {
    let mut vm = Vm::open_with(VmConfig::default().with_max_array_len(2));
    let ary = vm.ary_new();
    vm.ary_push(ary, Value::Int(1)).unwrap();
    vm.ary_set(ary, 1, Value::Int(2)).unwrap();
    assert!(vm.ary_set(ary, 2, Value::Int(3)).unwrap_err().is_a("IndexError"));
    assert!(vm.ary_push(ary, Value::Int(3)).unwrap_err().is_a("ArgumentError"));
    assert_eq!(vm.ary_len(ary).unwrap(), 2);
}

#[test]
fn endless_range_covers_the_tail() {
    let mut vm = Vm::open();
    let r = vm.range_new(Value::Int(0), Value::Nil, false);
    assert_eq!(vm.range_beg_len(r, 3, false).unwrap(), (0, 3));
    assert_eq!(vm.range_beg_len(r, 3, true).unwrap(), (0, 3));
    let r = vm.range_new(Value::Int(1), Value::Nil, true);
    assert_eq!(vm.range_beg_len(r, 3, false).unwrap(), (1, 2));
}

#[test]
fn beginless_range_starts_at_zero() {
    let mut vm = Vm::open();
    let r = vm.range_new(Value::Nil, Value::Int(1), false);
    assert_eq!(vm.range_beg_len(r, 5, true).unwrap(), (0, 2));
    let r = vm.range_new(Value::Nil, Value::Int(1), true);
    assert_eq!(vm.range_beg_len(r, 5, true).unwrap(), (0, 1));
}

#[test]
fn range_bounds_near_integer_limits() {
    let mut vm = Vm::open();
    let r = vm.range_new(Value::Int(0), Value::Int(i64::MAX), false);
    assert!(vm.range_beg_len(r, 3, false).unwrap_err().is_a("RangeError"));
    assert_eq!(vm.range_beg_len(r, 3, true).unwrap(), (0, 3));
    let r = vm.range_new(Value::Int(i64::MIN), Value::Int(0), false);
    assert!(vm.range_beg_len(r, 3, true).unwrap_err().is_a("RangeError"));
}
