use std::ops::{Deref, DerefMut};

use super::Vm;
use crate::value::ObjId;

/// Restores the GC arena to the mark taken at construction when dropped.
///
/// Objects allocated inside the scope stay protected until the scope ends;
/// anything that must outlive it has to be stored somewhere reachable.
pub struct ArenaScope<'a> {
    vm: &'a mut Vm,
    mark: usize,
}

impl<'a> ArenaScope<'a> {
    pub fn new(vm: &'a mut Vm) -> Self {
        let mark = vm.gc_arena_save();
        Self { vm, mark }
    }

    pub fn mark(&self) -> usize {
        self.mark
    }
}

impl Deref for ArenaScope<'_> {
    type Target = Vm;

    fn deref(&self) -> &Vm {
        self.vm
    }
}

impl DerefMut for ArenaScope<'_> {
    fn deref_mut(&mut self) -> &mut Vm {
        self.vm
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.vm.gc_arena_restore(self.mark);
    }
}

impl Vm {
    pub fn gc_arena_save(&self) -> usize {
        self.heap.arena_save()
    }

    pub fn gc_arena_restore(&mut self, mark: usize) {
        self.heap.arena_restore(mark);
    }

    /// Protects `id` until the arena is restored below this point.
    pub fn gc_protect(&mut self, id: ObjId) {
        self.heap.arena_push(id);
    }

    pub fn arena_len(&self) -> usize {
        self.heap.arena_len()
    }

    /// Runs a full collection and returns the number of freed objects.
    /// Returns 0 while the GC is disabled or an iteration is in progress.
    pub fn full_gc(&mut self) -> usize {
        let roots = self.gc_roots();
        self.heap.collect(roots).unwrap_or(0)
    }

    pub fn live_object_count(&self) -> usize {
        self.heap.live_count()
    }

    pub fn gc_collections(&self) -> u64 {
        self.heap.collections()
    }

    pub fn is_dead(&self, id: ObjId) -> bool {
        self.heap.is_dead(id)
    }

    /// Returns whether the GC was already disabled.
    pub fn gc_disable(&mut self) -> bool {
        self.heap.set_disabled(true)
    }

    pub fn gc_enable(&mut self) -> bool {
        self.heap.set_disabled(false)
    }
}
