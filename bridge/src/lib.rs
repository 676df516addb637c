//! Host callback bridge for the orb VM.
//!
//! Host closures are registered per VM instance and reached from VM code
//! through two native trampolines. The VM side only ever stores an integer
//! callback index in the proc's environment.

pub mod accessor;
pub mod callback;
pub mod convert;
pub mod define;
pub mod env;
pub mod exception;
pub mod iter;
pub mod registry;
pub mod state;
pub mod trampoline;

pub use accessor::{RArray, RException, RHash, RProc, RRange, RString};
pub use callback::{CallContext, CallbackSlot, HostCallable};
pub use convert::{FromValue, IntoValue};
pub use exception::{RaiseError, RaiseKind};
pub use orb_core::{Aspec, ObjId, Value, Vm, VmConfig, VmException, VmResult};
pub use state::State;

#[cfg(test)]
mod exception_test;
