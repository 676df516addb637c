use std::fmt;

use crate::value::Value;

/// Unwind payload of a VM-level raise.
///
/// Carries the exception object itself plus a snapshot of its class name and
/// message, so the error stays printable after the VM is gone.
#[derive(Debug, Clone)]
pub struct VmException {
    value: Value,
    class_name: String,
    message: String,
}

pub type VmResult<T> = Result<T, VmException>;

impl VmException {
    pub(crate) fn new(value: Value, class_name: String, message: String) -> Self {
        Self {
            value,
            class_name,
            message,
        }
    }

    /// The exception object. Only valid for the VM that raised it.
    pub fn value(&self) -> Value {
        self.value
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_a(&self, class_name: &str) -> bool {
        self.class_name == class_name
    }
}

impl fmt::Display for VmException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.class_name)
        } else {
            write!(f, "{}: {}", self.class_name, self.message)
        }
    }
}

impl std::error::Error for VmException {}
