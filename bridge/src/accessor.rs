//! Typed handles over VM heap objects.
//!
//! Each handle is a checked [`ObjId`]: construction verifies the runtime type
//! once, and every operation still goes through the VM so a handle that
//! outlived its object fails with a VM exception instead of reading garbage.

use orb_core::object::{PROC_CFUNC, PROC_NOARG, PROC_STRICT};
use orb_core::{ObjId, Value, ValueType, Vm, VmResult};

use crate::{env, iter};

macro_rules! value_handle {
    ($name:ident, $ty:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(ObjId);

        impl $name {
            pub fn from_value(vm: &mut Vm, value: Value) -> VmResult<Self> {
                vm.expect_type(value, $ty).map($name)
            }

            pub fn id(self) -> ObjId {
                self.0
            }

            pub fn value(self) -> Value {
                Value::Obj(self.0)
            }
        }

        impl From<$name> for Value {
            fn from(handle: $name) -> Value {
                handle.value()
            }
        }
    };
}

value_handle!(RArray, ValueType::Array);
value_handle!(RString, ValueType::String);
value_handle!(RHash, ValueType::Hash);
value_handle!(RRange, ValueType::Range);
value_handle!(RProc, ValueType::Proc);
value_handle!(RException, ValueType::Exception);

impl RArray {
    pub fn new(vm: &mut Vm) -> Self {
        Self::from_values(vm, &[])
    }

    pub fn from_values(vm: &mut Vm, values: &[Value]) -> Self {
        match vm.ary_new_from(values) {
            Value::Obj(id) => RArray(id),
            _ => unreachable!("ary_new_from allocates"),
        }
    }

    pub fn len(self, vm: &mut Vm) -> VmResult<usize> {
        vm.ary_len(self.value())
    }

    pub fn is_empty(self, vm: &mut Vm) -> VmResult<bool> {
        Ok(self.len(vm)? == 0)
    }

    /// Negative indices count from the end; out of range reads `nil`.
    pub fn item(self, vm: &mut Vm, index: i64) -> VmResult<Value> {
        vm.ary_ref(self.value(), index)
    }

    pub fn item_or(self, vm: &mut Vm, index: i64, default: Value) -> VmResult<Value> {
        let len = self.len(vm)? as i64;
        if index >= len || index < -len {
            return Ok(default);
        }
        self.item(vm, index)
    }

    pub fn set(self, vm: &mut Vm, index: i64, value: Value) -> VmResult<()> {
        vm.ary_set(self.value(), index, value)
    }

    pub fn push(self, vm: &mut Vm, value: Value) -> VmResult<()> {
        vm.ary_push(self.value(), value)
    }

    pub fn to_vec(self, vm: &mut Vm) -> VmResult<Vec<Value>> {
        vm.ary_values(self.value())
    }
}

impl RString {
    pub fn new(vm: &mut Vm, s: &str) -> Self {
        match vm.str_new(s) {
            Value::Obj(id) => RString(id),
            _ => unreachable!("str_new allocates"),
        }
    }

    pub fn len(self, vm: &mut Vm) -> VmResult<usize> {
        vm.str_len(self.value())
    }

    pub fn is_empty(self, vm: &mut Vm) -> VmResult<bool> {
        Ok(self.len(vm)? == 0)
    }

    pub fn as_bytes(self, vm: &mut Vm) -> VmResult<Vec<u8>> {
        vm.str_bytes(self.value())
    }

    pub fn to_string_lossy(self, vm: &mut Vm) -> VmResult<String> {
        vm.str_to_string(self.value())
    }

    pub fn push_str(self, vm: &mut Vm, tail: &str) -> VmResult<()> {
        vm.str_cat(self.value(), tail)
    }
}

impl RHash {
    pub fn new(vm: &mut Vm) -> Self {
        match vm.hash_new() {
            Value::Obj(id) => RHash(id),
            _ => unreachable!("hash_new allocates"),
        }
    }

    pub fn len(self, vm: &mut Vm) -> VmResult<usize> {
        vm.hash_len(self.value())
    }

    pub fn is_empty(self, vm: &mut Vm) -> VmResult<bool> {
        Ok(self.len(vm)? == 0)
    }

    pub fn get(self, vm: &mut Vm, key: Value) -> VmResult<Option<Value>> {
        vm.hash_get(self.value(), key)
    }

    /// Like [`RHash::get`] but a missing key raises `KeyError`.
    pub fn fetch(self, vm: &mut Vm, key: Value) -> VmResult<Value> {
        match self.get(vm, key)? {
            Some(value) => Ok(value),
            None => {
                let class = vm.builtins().key_error;
                let msg = format!("key not found: {}", vm.inspect(key));
                Err(vm.raise(class, &msg))
            }
        }
    }

    pub fn set(self, vm: &mut Vm, key: Value, value: Value) -> VmResult<()> {
        vm.hash_set(self.value(), key, value)
    }

    pub fn delete(self, vm: &mut Vm, key: Value) -> VmResult<Option<Value>> {
        vm.hash_delete(self.value(), key)
    }

    pub fn has_key(self, vm: &mut Vm, key: Value) -> VmResult<bool> {
        Ok(self.get(vm, key)?.is_some())
    }

    pub fn keys(self, vm: &mut Vm) -> VmResult<Vec<Value>> {
        vm.hash_keys(self.value())
    }

    pub fn values(self, vm: &mut Vm) -> VmResult<Vec<Value>> {
        vm.hash_values(self.value())
    }

    pub fn clear(self, vm: &mut Vm) -> VmResult<()> {
        vm.hash_clear(self.value())
    }

    /// Iterates through the hash iteration trampoline.
    pub fn for_each<F>(self, vm: &mut Vm, f: F) -> VmResult<()>
    where
        F: FnMut(&mut Vm, Value, Value) -> i32,
    {
        iter::hash_foreach(vm, self.value(), f)
    }
}

impl RRange {
    pub fn new(vm: &mut Vm, begin: Value, end: Value, exclusive: bool) -> Self {
        match vm.range_new(begin, end, exclusive) {
            Value::Obj(id) => RRange(id),
            _ => unreachable!("range_new allocates"),
        }
    }

    pub fn begin(self, vm: &mut Vm) -> VmResult<Value> {
        Ok(vm.range_data(self.value())?.begin)
    }

    pub fn end(self, vm: &mut Vm) -> VmResult<Value> {
        Ok(vm.range_data(self.value())?.end)
    }

    pub fn is_exclusive(self, vm: &mut Vm) -> VmResult<bool> {
        Ok(vm.range_data(self.value())?.exclusive)
    }

    /// `(begin, length)` against a sequence of `len` elements.
    pub fn beg_len(self, vm: &mut Vm, len: i64, trunc: bool) -> VmResult<(i64, i64)> {
        vm.range_beg_len(self.value(), len, trunc)
    }
}

impl RProc {
    pub fn flags(self, vm: &Vm) -> u32 {
        vm.proc_flags(self.0).unwrap_or(0)
    }

    pub fn is_cfunc(self, vm: &Vm) -> bool {
        self.flags(vm) & PROC_CFUNC != 0
    }

    pub fn is_strict(self, vm: &Vm) -> bool {
        self.flags(vm) & PROC_STRICT != 0
    }

    pub fn is_noarg(self, vm: &Vm) -> bool {
        self.flags(vm) & PROC_NOARG != 0
    }

    pub fn has_env(self, vm: &Vm) -> bool {
        env::has_env(vm, self.value())
    }

    pub fn env_len(self, vm: &Vm) -> usize {
        env::env_len(vm, self.value())
    }

    pub fn env_get(self, vm: &mut Vm, idx: i64) -> VmResult<Value> {
        env::env_get(vm, self.value(), idx)
    }

    pub fn call(self, vm: &mut Vm, self_value: Value, args: &[Value]) -> VmResult<Value> {
        vm.call_proc(self.value(), self_value, args)
    }
}

impl RException {
    pub fn class_name(self, vm: &Vm) -> String {
        vm.class_name(vm.real_class_of(self.value()))
    }

    pub fn message(self, vm: &Vm) -> String {
        vm.exc_message(self.value())
    }
}
