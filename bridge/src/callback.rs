//! Host-side callback tables.
//!
//! The VM only ever sees an integer function index. Each registered instance
//! owns a [`CallbackTable`] in a process-wide map, and the two host entry
//! points below resolve `(instance, function)` pairs against it.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use orb_core::{Aspec, Value, Vm};
use tracing::{trace, warn};

use crate::exception;

/// What a host callable gets to see about the call that reached it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallContext {
    pub instance: usize,
    pub receiver: Value,
    pub function: usize,
}

pub type MethodFn = Arc<dyn Fn(&mut Vm, &CallContext) -> Value + Send + Sync>;
pub type ProcFn = Arc<dyn Fn(&mut Vm, &CallContext, Value) -> Value + Send + Sync>;

/// A host function reachable from the VM.
///
/// `Method` callables are bound: they read their arguments from the running
/// call frame. `Proc` callables receive every argument packed into one array.
#[derive(Clone)]
pub enum HostCallable {
    Method(MethodFn),
    Proc(ProcFn),
}

impl HostCallable {
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&mut Vm, &CallContext) -> Value + Send + Sync + 'static,
    {
        HostCallable::Method(Arc::new(f))
    }

    pub fn proc<F>(f: F) -> Self
    where
        F: Fn(&mut Vm, &CallContext, Value) -> Value + Send + Sync + 'static,
    {
        HostCallable::Proc(Arc::new(f))
    }

    /// Adapts a fallible closure; an `Err` becomes a live VM exception.
    pub fn method_fallible<F>(f: F) -> Self
    where
        F: Fn(&mut Vm, &CallContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        HostCallable::method(move |vm, ctx| match f(vm, ctx) {
            Ok(value) => value,
            Err(err) => exception::raise_error(vm, &err),
        })
    }

    pub fn proc_fallible<F>(f: F) -> Self
    where
        F: Fn(&mut Vm, &CallContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        HostCallable::proc(move |vm, ctx, args| match f(vm, ctx, args) {
            Ok(value) => value,
            Err(err) => exception::raise_error(vm, &err),
        })
    }

    pub fn binds_self(&self) -> bool {
        matches!(self, HostCallable::Method(_))
    }
}

impl std::fmt::Debug for HostCallable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostCallable::Method(_) => f.write_str("HostCallable::Method"),
            HostCallable::Proc(_) => f.write_str("HostCallable::Proc"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CallbackSlot {
    pub index: usize,
    pub aspec: Aspec,
    pub binds_self: bool,
    pub callable: HostCallable,
}

#[derive(Debug, Default)]
pub struct CallbackTable {
    slots: Vec<Option<CallbackSlot>>,
}

impl CallbackTable {
    pub fn register(&mut self, callable: HostCallable, aspec: Aspec) -> usize {
        let index = self.slots.len();
        self.slots.push(Some(CallbackSlot {
            index,
            aspec,
            binds_self: callable.binds_self(),
            callable,
        }));
        index
    }

    pub fn get(&self, function: usize) -> Option<&CallbackSlot> {
        self.slots.get(function).and_then(Option::as_ref)
    }

    /// Indices are never reused, so VM procs holding a removed index fail
    /// cleanly instead of reaching another callable.
    pub fn remove(&mut self, function: usize) -> Option<CallbackSlot> {
        self.slots.get_mut(function).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// instance index -> callback table
static TABLES: Lazy<DashMap<usize, CallbackTable>> = Lazy::new(DashMap::new);

pub fn register_callback(instance: usize, callable: HostCallable, aspec: Aspec) -> usize {
    let function = TABLES.entry(instance).or_default().register(callable, aspec);
    trace!(target: "orb::bridge::callback", instance, function, "callback registered");
    function
}

/// Clones the slot out so the table is not locked while the callable runs.
pub fn lookup(instance: usize, function: usize) -> Option<CallbackSlot> {
    TABLES.get(&instance)?.get(function).cloned()
}

pub fn unregister_callback(instance: usize, function: usize) -> bool {
    TABLES
        .get_mut(&instance)
        .and_then(|mut table| table.remove(function))
        .is_some()
}

pub fn callback_count(instance: usize) -> usize {
    TABLES.get(&instance).map_or(0, |t| t.len())
}

pub fn drop_table(instance: usize) {
    if let Some((_, table)) = TABLES.remove(&instance) {
        trace!(target: "orb::bridge::callback", instance, callbacks = table.len(), "callback table dropped");
    }
}

/// Host entry point for bound methods.
///
/// Returns the callable's result, or a live exception when the slot is
/// missing or has the wrong shape.
pub fn host_method_callback(vm: &mut Vm, instance: usize, receiver: Value, function: usize) -> Value {
    let ctx = CallContext {
        instance,
        receiver,
        function,
    };
    match lookup(instance, function) {
        Some(CallbackSlot {
            callable: HostCallable::Method(f),
            ..
        }) => f(vm, &ctx),
        Some(_) => wrong_kind(vm, function, "bound method"),
        None => missing(vm, instance, function),
    }
}

/// Host entry point for free callables. `args` is a VM array.
pub fn host_proc_callback(vm: &mut Vm, instance: usize, receiver: Value, function: usize, args: Value) -> Value {
    let ctx = CallContext {
        instance,
        receiver,
        function,
    };
    let slot = match lookup(instance, function) {
        Some(slot) => slot,
        None => return missing(vm, instance, function),
    };
    let HostCallable::Proc(f) = &slot.callable else {
        return wrong_kind(vm, function, "free callable");
    };
    let aspec = slot.aspec;
    if aspec.required() > 0 {
        let argc = match vm.ary_len(args) {
            Ok(n) => n,
            Err(err) => return err.value(),
        };
        if !aspec.accepts(argc) {
            let msg = format!(
                "wrong number of arguments (given {argc}, expected {})",
                aspec.required()
            );
            return exception::raise_argument_error(vm, &msg);
        }
    }
    f(vm, &ctx, args)
}

fn callable_name(vm: &Vm, function: usize) -> String {
    vm.get_mid()
        .map(|mid| vm.sym_name(mid).to_string())
        .unwrap_or_else(|| format!("#{function}"))
}

fn missing(vm: &mut Vm, instance: usize, function: usize) -> Value {
    let name = callable_name(vm, function);
    warn!(target: "orb::bridge::callback", instance, function, name = %name, "callback slot missing");
    exception::raise_runtime_error(vm, &format!("Function '{name}' reference not found."))
}

fn wrong_kind(vm: &mut Vm, function: usize, expected: &str) -> Value {
    let name = callable_name(vm, function);
    exception::raise_type_error(vm, &format!("Function '{name}' is not a {expected}."))
}
