//! Object heap with a GC root arena and a stop-the-world mark-and-sweep.
//!
//! Every allocation is pushed onto the arena so that freshly created objects
//! survive a collection before they are stored anywhere reachable. Callers
//! that allocate in bulk save the arena mark first and restore it afterwards
//! (see [`crate::vm::ArenaScope`]).

use tracing::debug;

use crate::object::HeapObject;
use crate::value::ObjId;

#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Option<HeapObject>>,
    free: Vec<u32>,
    arena: Vec<ObjId>,
    live: usize,
    disabled: bool,
    iterating: usize,
    collections: u64,
}

impl Heap {
    pub fn with_arena_capacity(capacity: usize) -> Self {
        Self {
            arena: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn alloc(&mut self, obj: HeapObject) -> ObjId {
        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(obj);
                ObjId(slot)
            }
            None => {
                self.slots.push(Some(obj));
                ObjId((self.slots.len() - 1) as u32)
            }
        };
        self.live += 1;
        self.arena.push(id);
        id
    }

    #[inline]
    pub fn get(&self, id: ObjId) -> Option<&HeapObject> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut HeapObject> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    #[inline]
    pub fn is_dead(&self, id: ObjId) -> bool {
        self.get(id).is_none()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn collections(&self) -> u64 {
        self.collections
    }

    pub fn arena_save(&self) -> usize {
        self.arena.len()
    }

    pub fn arena_restore(&mut self, mark: usize) {
        self.arena.truncate(mark);
    }

    pub fn arena_push(&mut self, id: ObjId) {
        self.arena.push(id);
    }

    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    pub fn set_disabled(&mut self, disabled: bool) -> bool {
        std::mem::replace(&mut self.disabled, disabled)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub(crate) fn begin_iteration(&mut self) {
        self.iterating += 1;
    }

    pub(crate) fn end_iteration(&mut self) {
        self.iterating = self.iterating.saturating_sub(1);
    }

    /// Ids of all live objects in slot order.
    pub fn live_ids(&self) -> Vec<ObjId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ObjId(i as u32))
            .collect()
    }

    /// Marks everything reachable from `roots` and the arena, then frees the
    /// rest. Returns the number of objects freed, or `None` when collection is
    /// currently not allowed.
    pub fn collect(&mut self, roots: Vec<ObjId>) -> Option<usize> {
        if self.disabled || self.iterating > 0 {
            return None;
        }
        let mut work = roots;
        work.extend_from_slice(&self.arena);
        let mut children = Vec::new();
        while let Some(id) = work.pop() {
            let Some(obj) = self.get_mut(id) else {
                continue;
            };
            if obj.marked {
                continue;
            }
            obj.marked = true;
            children.clear();
            obj.children(&mut children);
            work.extend_from_slice(&children);
        }

        let mut freed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Some(obj) if obj.marked => obj.marked = false,
                Some(_) => {
                    *slot = None;
                    self.free.push(i as u32);
                    freed += 1;
                }
                None => {}
            }
        }
        // Lowest slots are handed out first.
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        self.free.dedup();
        self.live -= freed;
        self.collections += 1;
        debug!(target: "orb::gc", freed, live = self.live, "collection finished");
        Some(freed)
    }
}
