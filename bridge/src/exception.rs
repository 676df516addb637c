use std::fmt;

use orb_core::{ObjId, Value, ValueType, Vm, VmException};
use tracing::debug;

/// Raises `ret` when it is the VM's current exception, otherwise returns it.
///
/// Only the live exception object counts. An exception value that merely has
/// the right type is an ordinary return value.
pub fn raise_if_live(vm: &mut Vm, ret: Value) -> Result<Value, VmException> {
    if vm.type_of(ret) == ValueType::Exception && vm.current_exception() == Some(ret) {
        debug!(target: "orb::bridge::exception", "host callback returned the live exception");
        return Err(vm.exc_raise(ret));
    }
    Ok(ret)
}

/// Builds an exception of `class`, makes it current and returns it so a host
/// callback can hand it back to the trampoline.
///
/// Classes outside the `Exception` hierarchy fall back to `Exception`.
pub fn raise(vm: &mut Vm, class: ObjId, message: &str) -> Value {
    let exception = vm.builtins().exception;
    let class = if descends_from(vm, class, exception) {
        class
    } else {
        exception
    };
    vm.raise(class, message).value()
}

fn descends_from(vm: &Vm, class: ObjId, ancestor: ObjId) -> bool {
    let mut cursor = Some(class);
    while let Some(c) = cursor {
        if c == ancestor {
            return true;
        }
        cursor = vm.superclass(c);
    }
    false
}

pub fn raise_type_error(vm: &mut Vm, message: &str) -> Value {
    let class = vm.builtins().type_error;
    raise(vm, class, message)
}

pub fn raise_argument_error(vm: &mut Vm, message: &str) -> Value {
    let class = vm.builtins().argument_error;
    raise(vm, class, message)
}

pub fn raise_index_error(vm: &mut Vm, message: &str) -> Value {
    let class = vm.builtins().index_error;
    raise(vm, class, message)
}

pub fn raise_runtime_error(vm: &mut Vm, message: &str) -> Value {
    let class = vm.builtins().runtime_error;
    raise(vm, class, message)
}

/// Exception class a host error maps onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaiseKind {
    Standard,
    Runtime,
    Type,
    Argument,
    Index,
    Key,
    Range,
    Name,
    NoMethod,
    Frozen,
    NotImplemented,
    /// Any exception class constant, looked up by name at raise time.
    Named(String),
}

impl RaiseKind {
    fn class(&self, vm: &Vm) -> Option<ObjId> {
        let b = vm.builtins();
        Some(match self {
            RaiseKind::Standard => b.standard_error,
            RaiseKind::Runtime => b.runtime_error,
            RaiseKind::Type => b.type_error,
            RaiseKind::Argument => b.argument_error,
            RaiseKind::Index => b.index_error,
            RaiseKind::Key => b.key_error,
            RaiseKind::Range => b.range_error,
            RaiseKind::Name => b.name_error,
            RaiseKind::NoMethod => b.no_method_error,
            RaiseKind::Frozen => b.frozen_error,
            RaiseKind::NotImplemented => b.not_implemented_error,
            RaiseKind::Named(name) => return vm.class_get(name),
        })
    }
}

/// Host error carrying the VM exception class it should surface as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaiseError {
    pub kind: RaiseKind,
    pub message: String,
}

impl RaiseError {
    pub fn new(kind: RaiseKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Runtime, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Type, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Argument, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Index, message)
    }

    pub fn key(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Key, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Range, message)
    }

    pub fn name(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Name, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(RaiseKind::NotImplemented, message)
    }

    pub fn named(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RaiseKind::Named(class_name.into()), message)
    }
}

impl fmt::Display for RaiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RaiseError {}

/// Turns a host error into a live VM exception.
///
/// The class comes from a [`RaiseError`] or [`VmException`] in the chain,
/// then from a `"ClassName: message"` prefix naming an exception class, and
/// is `StandardError` otherwise.
pub fn raise_error(vm: &mut Vm, err: &anyhow::Error) -> Value {
    let standard = vm.builtins().standard_error;
    let exception = vm.builtins().exception;

    for cause in err.chain() {
        if let Some(raise_err) = cause.downcast_ref::<RaiseError>() {
            let class = raise_err.kind.class(vm).unwrap_or(standard);
            return raise(vm, class, &raise_err.message);
        }
        if let Some(vm_err) = cause.downcast_ref::<VmException>() {
            let class = vm.class_get(vm_err.class_name()).unwrap_or(standard);
            return raise(vm, class, vm_err.message());
        }
    }

    let text = err.to_string();
    if let Some((prefix, rest)) = text.split_once(": ") {
        if let Some(class) = vm.class_get(prefix) {
            if descends_from(vm, class, exception) {
                return raise(vm, class, rest);
            }
        }
    }
    raise(vm, standard, &text)
}

/// Runs `f` and turns any VM raise inside it into an `Err` return.
pub fn protect(vm: &mut Vm, f: impl FnOnce(&mut Vm) -> Result<Value, VmException>) -> Result<Value, VmException> {
    vm.protect(f)
}

/// Calls `name` on `recv` from host code, catching VM exceptions.
pub fn call(vm: &mut Vm, recv: Value, name: &str, args: &[Value]) -> Result<Value, VmException> {
    protect(vm, |vm| vm.funcall(recv, name, args))
}
