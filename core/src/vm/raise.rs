use tracing::debug;

use super::Vm;
use crate::error::{VmException, VmResult};
use crate::object::{ExceptionData, HeapObject, ObjBody};
use crate::value::{ObjId, Value, ValueType};

impl Vm {
    /// Allocates an exception of `class` without raising it.
    pub fn exc_new(&mut self, class: ObjId, message: &str) -> Value {
        let body = ObjBody::Exception(ExceptionData {
            message: message.to_string(),
        });
        Value::Obj(self.alloc(HeapObject::new(class, body)))
    }

    /// Makes `value` the current exception and returns the unwind payload.
    ///
    /// Non-exception values are replaced by a `TypeError`.
    pub fn exc_raise(&mut self, value: Value) -> VmException {
        let value = if self.type_of(value) == ValueType::Exception {
            value
        } else {
            let class = self.builtins.type_error;
            self.exc_new(class, "exception class/object expected")
        };
        self.exc = value.as_obj();
        let class_name = self.class_name(self.real_class_of(value));
        let message = self.exc_message(value);
        debug!(target: "orb::vm::raise", class = %class_name, message = %message, "exception raised");
        VmException::new(value, class_name, message)
    }

    pub fn raise(&mut self, class: ObjId, message: &str) -> VmException {
        let exc = self.exc_new(class, message);
        self.exc_raise(exc)
    }

    pub fn current_exception(&self) -> Option<Value> {
        self.exc.map(Value::Obj)
    }

    pub fn exc_clear(&mut self) {
        self.exc = None;
    }

    pub fn exc_message(&self, value: Value) -> String {
        match value.as_obj().and_then(|id| self.heap.get(id)).map(|o| &o.body) {
            Some(ObjBody::Exception(data)) => data.message.clone(),
            _ => String::new(),
        }
    }

    /// Runs `f`, catching any raise inside it.
    ///
    /// On error the call stack is unwound to the depth at entry and the
    /// current exception slot is cleared. The exception object travels in the
    /// returned [`VmException`].
    pub fn protect<T>(&mut self, f: impl FnOnce(&mut Vm) -> VmResult<T>) -> VmResult<T> {
        let depth = self.call_stack.len();
        self.protect_depth += 1;
        let result = f(self);
        self.protect_depth -= 1;
        if let Err(exc) = &result {
            self.call_stack.truncate(depth);
            self.exc = None;
            if let Some(id) = exc.value().as_obj() {
                self.heap.arena_push(id);
            }
        }
        result
    }

    /// Number of `protect` frames currently active.
    pub fn protect_depth(&self) -> usize {
        self.protect_depth
    }

    pub fn type_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.type_error;
        self.raise(class, message.as_ref())
    }

    pub fn argument_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.argument_error;
        self.raise(class, message.as_ref())
    }

    pub fn index_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.index_error;
        self.raise(class, message.as_ref())
    }

    pub fn range_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.range_error;
        self.raise(class, message.as_ref())
    }

    pub fn runtime_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.runtime_error;
        self.raise(class, message.as_ref())
    }

    pub fn name_error(&mut self, message: impl AsRef<str>) -> VmException {
        let class = self.builtins.name_error;
        self.raise(class, message.as_ref())
    }

    pub fn frozen_error(&mut self, value: Value) -> VmException {
        let class = self.builtins.frozen_error;
        let msg = format!("can't modify frozen {}", self.class_name(self.real_class_of(value)));
        self.raise(class, &msg)
    }
}
