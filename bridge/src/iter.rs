use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;

use orb_core::vm::{ITER_STOP, Vm};
use orb_core::{ObjId, Value, VmResult};
use tracing::warn;

type HashHook<'a> = dyn FnMut(&mut Vm, Value, Value) -> i32 + 'a;
type ObjectHook<'a> = dyn FnMut(&mut Vm, ObjId) -> i32 + 'a;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
    Hash,
    Object,
}

thread_local! {
    // ctx address -> kind of the hook living there
    static LIVE_HOOKS: RefCell<HashMap<usize, HookKind>> = RefCell::new(HashMap::new());
}

struct HookGuard {
    ctx: usize,
}

impl HookGuard {
    fn install(ctx: *mut c_void, kind: HookKind) -> Self {
        let ctx = ctx as usize;
        LIVE_HOOKS.with(|hooks| hooks.borrow_mut().insert(ctx, kind));
        Self { ctx }
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        LIVE_HOOKS.with(|hooks| hooks.borrow_mut().remove(&self.ctx));
    }
}

fn hook_is_live(ctx: *mut c_void, kind: HookKind) -> bool {
    LIVE_HOOKS.with(|hooks| hooks.borrow().get(&(ctx as usize)) == Some(&kind))
}

/// VM-side signature for hash iteration; forwards verbatim.
pub fn hash_iteration_trampoline(vm: &mut Vm, key: Value, value: Value, ctx: *mut c_void) -> i32 {
    host_hash_callback(vm, key, value, ctx)
}

/// VM-side signature for heap traversal; forwards verbatim.
pub fn heap_traversal_trampoline(vm: &mut Vm, obj: ObjId, ctx: *mut c_void) -> i32 {
    host_each_object_callback(vm, obj, ctx)
}

pub fn host_hash_callback(vm: &mut Vm, key: Value, value: Value, ctx: *mut c_void) -> i32 {
    if !hook_is_live(ctx, HookKind::Hash) {
        warn!(target: "orb::bridge::iter", ctx = ctx as usize, "unknown hash iteration context");
        return ITER_STOP;
    }
    // SAFETY: live contexts were installed by `hash_foreach` and point at a
    // `&mut HashHook` that outlives its guard.
    let hook = unsafe { &mut *(ctx as *mut &mut HashHook<'_>) };
    hook(vm, key, value)
}

pub fn host_each_object_callback(vm: &mut Vm, obj: ObjId, ctx: *mut c_void) -> i32 {
    if !hook_is_live(ctx, HookKind::Object) {
        warn!(target: "orb::bridge::iter", ctx = ctx as usize, "unknown heap traversal context");
        return ITER_STOP;
    }
    // SAFETY: see `host_hash_callback`.
    let hook = unsafe { &mut *(ctx as *mut &mut ObjectHook<'_>) };
    hook(vm, obj)
}

/// Walks `hash` with `f`. Status codes are those of [`Vm::hash_foreach`].
pub fn hash_foreach<F>(vm: &mut Vm, hash: Value, mut f: F) -> VmResult<()>
where
    F: FnMut(&mut Vm, Value, Value) -> i32,
{
    let mut hook: &mut HashHook<'_> = &mut f;
    let ctx = &mut hook as *mut &mut HashHook<'_> as *mut c_void;
    let _guard = HookGuard::install(ctx, HookKind::Hash);
    vm.hash_foreach(hash, hash_iteration_trampoline, ctx)
}

/// Walks every live heap object with `f`; a non-zero status stops.
pub fn each_object<F>(vm: &mut Vm, mut f: F)
where
    F: FnMut(&mut Vm, ObjId) -> i32,
{
    let mut hook: &mut ObjectHook<'_> = &mut f;
    let ctx = &mut hook as *mut &mut ObjectHook<'_> as *mut c_void;
    let _guard = HookGuard::install(ctx, HookKind::Object);
    vm.objspace_each_objects(heap_traversal_trampoline, ctx);
}
