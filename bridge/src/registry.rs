use std::collections::BTreeSet;
use std::sync::Mutex;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use orb_core::{Vm, VmHandle};
use tracing::{debug, trace};

/// Once this many indices have been handed out, freed ones are reused.
pub const REUSE_THRESHOLD: usize = 500;

// handle -> instance index
static INSTANCES: Lazy<DashMap<VmHandle, usize>> = Lazy::new(DashMap::new);

static ALLOCATOR: Lazy<Mutex<IndexAllocator>> = Lazy::new(|| Mutex::new(IndexAllocator::new()));

pub(crate) struct IndexAllocator {
    next: usize,
    freed: BTreeSet<usize>,
}

impl IndexAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: 1,
            freed: BTreeSet::new(),
        }
    }

    pub(crate) fn allocate(&mut self) -> usize {
        if self.next - 1 > REUSE_THRESHOLD {
            if let Some(index) = self.freed.pop_first() {
                return index;
            }
        }
        let index = self.next;
        self.next += 1;
        index
    }

    pub(crate) fn release(&mut self, index: usize) {
        if index != 0 && index < self.next {
            self.freed.insert(index);
        }
    }
}

/// Assigns `vm` an instance index, or returns the one it already has.
pub fn register_instance(vm: &Vm) -> usize {
    let handle = vm.handle();
    if let Some(index) = INSTANCES.get(&handle) {
        return *index;
    }
    let mut alloc = ALLOCATOR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let index = *INSTANCES.entry(handle).or_insert_with(|| alloc.allocate());
    debug!(target: "orb::bridge::registry", ?handle, index, "instance registered");
    index
}

/// Index of `vm`, 0 when it was never registered.
pub fn current_index(vm: &Vm) -> usize {
    lookup(vm.handle())
}

/// Same as [`current_index`] for a raw handle value.
pub fn current_index_raw(raw: usize) -> usize {
    lookup(VmHandle::from_raw(raw))
}

fn lookup(handle: VmHandle) -> usize {
    let index = INSTANCES.get(&handle).map(|i| *i).unwrap_or(0);
    trace!(target: "orb::bridge::registry", ?handle, index, "instance lookup");
    index
}

/// Forgets `vm` and returns its former index for reuse.
pub fn unregister_instance(vm: &Vm) -> Option<usize> {
    let (handle, index) = INSTANCES.remove(&vm.handle())?;
    ALLOCATOR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .release(index);
    debug!(target: "orb::bridge::registry", ?handle, index, "instance unregistered");
    Some(index)
}

pub fn live_instances() -> usize {
    INSTANCES.len()
}
