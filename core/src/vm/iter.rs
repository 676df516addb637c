use std::ffi::c_void;

use super::Vm;
use crate::error::VmResult;
use crate::value::{ObjId, Value, ValueType};

pub const ITER_CONTINUE: i32 = 0;
pub const ITER_STOP: i32 = 1;
/// Hash iteration only: remove the current entry and continue.
pub const ITER_DELETE: i32 = 2;

/// Per-entry callback of [`Vm::hash_foreach`]. `ctx` is passed through
/// untouched.
pub type HashForeachFn = fn(&mut Vm, Value, Value, *mut c_void) -> i32;

/// Per-object callback of [`Vm::objspace_each_objects`].
pub type EachObjectFn = fn(&mut Vm, ObjId, *mut c_void) -> i32;

impl Vm {
    /// Visits entries in insertion order. Collection is suspended for the
    /// duration of the walk.
    pub fn hash_foreach(&mut self, hash: Value, func: HashForeachFn, ctx: *mut c_void) -> VmResult<()> {
        self.expect_type(hash, ValueType::Hash)?;
        let deleting_allowed = !self.is_frozen(hash);
        self.heap.begin_iteration();
        let mut pos = 0;
        while let Some((key, value)) = self.hash_entry_at(hash, pos) {
            match func(self, key, value, ctx) {
                ITER_CONTINUE => pos += 1,
                ITER_DELETE if deleting_allowed => self.hash_remove_at(hash, pos),
                ITER_DELETE => pos += 1,
                _ => break,
            }
        }
        self.heap.end_iteration();
        Ok(())
    }

    /// Visits every live heap object. A non-zero status stops the walk.
    pub fn objspace_each_objects(&mut self, func: EachObjectFn, ctx: *mut c_void) {
        let ids = self.heap.live_ids();
        self.heap.begin_iteration();
        for id in ids {
            if self.heap.is_dead(id) {
                continue;
            }
            if func(self, id, ctx) != ITER_CONTINUE {
                break;
            }
        }
        self.heap.end_iteration();
    }
}
