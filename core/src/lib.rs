pub mod aspec;
pub mod config;
pub mod error;
pub mod gc;
pub mod handle;
pub mod object;
pub mod symbol;
pub mod util;
pub mod value;
pub mod vm;

pub use aspec::Aspec;
pub use config::VmConfig;
pub use error::{VmException, VmResult};
pub use handle::VmHandle;
pub use object::{LexicalFn, Method, NativeFn};
pub use value::{ObjId, Sym, Value, ValueType};
pub use vm::{ArenaScope, Vm};
