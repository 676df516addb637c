//! VM runtime model
//!
//! Object heap, classes and method tables, procs, exceptions and dispatch.
//! There is no parser or interpreter loop: script-level code is represented by
//! lexical procs and by host code calling [`Vm::funcall`].

mod boot;
mod class;
mod collections;
mod dispatch;
mod iter;
mod objspace;
mod procs;
mod raise;

pub use dispatch::CallInfo;
pub use iter::{EachObjectFn, HashForeachFn, ITER_CONTINUE, ITER_DELETE, ITER_STOP};
pub use objspace::ArenaScope;

use crate::config::VmConfig;
use crate::gc::Heap;
use crate::handle::VmHandle;
use crate::object::HeapObject;
use crate::symbol::SymbolTable;
use crate::util::fast_map::{SymMap, sym_map};
use crate::value::{ObjId, Sym, Value, ValueType};

/// Ids of the classes created at boot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtins {
    pub basic_object: ObjId,
    pub object: ObjId,
    pub module: ObjId,
    pub class: ObjId,
    pub kernel: ObjId,
    pub nil_class: ObjId,
    pub true_class: ObjId,
    pub false_class: ObjId,
    pub integer: ObjId,
    pub float: ObjId,
    pub symbol: ObjId,
    pub string: ObjId,
    pub array: ObjId,
    pub hash: ObjId,
    pub range: ObjId,
    pub proc: ObjId,
    pub exception: ObjId,
    pub standard_error: ObjId,
    pub runtime_error: ObjId,
    pub type_error: ObjId,
    pub argument_error: ObjId,
    pub index_error: ObjId,
    pub range_error: ObjId,
    pub key_error: ObjId,
    pub name_error: ObjId,
    pub no_method_error: ObjId,
    pub frozen_error: ObjId,
    pub not_implemented_error: ObjId,
    pub local_jump_error: ObjId,
    pub script_error: ObjId,
    pub system_stack_error: ObjId,
}

impl Builtins {
    fn roots(&self) -> [ObjId; 31] {
        [
            self.basic_object,
            self.object,
            self.module,
            self.class,
            self.kernel,
            self.nil_class,
            self.true_class,
            self.false_class,
            self.integer,
            self.float,
            self.symbol,
            self.string,
            self.array,
            self.hash,
            self.range,
            self.proc,
            self.exception,
            self.standard_error,
            self.runtime_error,
            self.type_error,
            self.argument_error,
            self.index_error,
            self.range_error,
            self.key_error,
            self.name_error,
            self.no_method_error,
            self.frozen_error,
            self.not_implemented_error,
            self.local_jump_error,
            self.script_error,
            self.system_stack_error,
        ]
    }
}

/// One embedded VM instance. Not shareable across threads.
pub struct Vm {
    handle: VmHandle,
    config: VmConfig,
    pub(crate) heap: Heap,
    symbols: SymbolTable,
    builtins: Builtins,
    top_self: ObjId,
    globals: SymMap<Value>,
    exc: Option<ObjId>,
    call_stack: Vec<CallInfo>,
    protect_depth: usize,
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("handle", &self.handle)
            .field("live_objects", &self.heap.live_count())
            .field("call_depth", &self.call_stack.len())
            .finish()
    }
}

impl Vm {
    pub fn open() -> Self {
        Self::open_with(VmConfig::default())
    }

    pub fn open_with(config: VmConfig) -> Self {
        let mut vm = Self {
            handle: VmHandle::next(),
            heap: Heap::with_arena_capacity(config.arena_capacity),
            config,
            symbols: SymbolTable::new(),
            builtins: Builtins::default(),
            top_self: ObjId::default(),
            globals: sym_map(),
            exc: None,
            call_stack: Vec::new(),
            protect_depth: 0,
        };
        vm.boot();
        vm
    }

    #[inline]
    pub fn handle(&self) -> VmHandle {
        self.handle
    }

    #[inline]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    #[inline]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The top-level `main` object.
    #[inline]
    pub fn top_self(&self) -> Value {
        Value::Obj(self.top_self)
    }

    pub fn intern(&mut self, name: &str) -> Sym {
        self.symbols.intern(name)
    }

    pub fn sym_name(&self, sym: Sym) -> &str {
        self.symbols.name(sym)
    }

    #[inline]
    pub fn obj(&self, id: ObjId) -> Option<&HeapObject> {
        self.heap.get(id)
    }

    #[inline]
    pub fn obj_mut(&mut self, id: ObjId) -> Option<&mut HeapObject> {
        self.heap.get_mut(id)
    }

    pub(crate) fn alloc(&mut self, obj: HeapObject) -> ObjId {
        self.heap.alloc(obj)
    }

    pub fn type_of(&self, value: Value) -> ValueType {
        match value {
            Value::Nil | Value::Bool(false) => ValueType::False,
            Value::Bool(true) => ValueType::True,
            Value::Int(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Sym(_) => ValueType::Symbol,
            Value::Undef => ValueType::Undef,
            Value::Obj(id) => self
                .heap
                .get(id)
                .map(HeapObject::value_type)
                .unwrap_or(ValueType::Undef),
        }
    }

    pub fn gv_set(&mut self, name: &str, value: Value) {
        let sym = self.intern(name);
        self.globals.insert(sym, value);
    }

    pub fn gv_get(&mut self, name: &str) -> Value {
        let sym = self.intern(name);
        self.globals.get(&sym).copied().unwrap_or(Value::Nil)
    }

    fn gc_roots(&self) -> Vec<ObjId> {
        let mut roots: Vec<ObjId> = self.builtins.roots().to_vec();
        roots.push(self.top_self);
        roots.extend(self.globals.values().filter_map(Value::as_obj));
        roots.extend(self.exc);
        for ci in &self.call_stack {
            ci.push_roots(&mut roots);
        }
        roots
    }
}

#[cfg(test)]
mod vm_test;
