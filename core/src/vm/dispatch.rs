use tracing::trace;

use super::Vm;
use crate::error::VmResult;
use crate::object::{ObjBody, ProcBody};
use crate::value::{ObjId, Sym, Value, ValueType};

/// One activation record on the VM call stack.
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub mid: Option<Sym>,
    pub proc: ObjId,
    pub receiver: Value,
    pub argv: Vec<Value>,
    pub block: Value,
}

impl CallInfo {
    pub(super) fn push_roots(&self, roots: &mut Vec<ObjId>) {
        roots.push(self.proc);
        roots.extend(self.receiver.as_obj());
        roots.extend(self.block.as_obj());
        roots.extend(self.argv.iter().filter_map(Value::as_obj));
    }
}

impl Vm {
    pub fn funcall(&mut self, recv: Value, name: &str, args: &[Value]) -> VmResult<Value> {
        let mid = self.intern(name);
        self.funcall_sym(recv, mid, args, Value::Nil)
    }

    pub fn funcall_with_block(&mut self, recv: Value, name: &str, args: &[Value], block: Value) -> VmResult<Value> {
        let mid = self.intern(name);
        self.funcall_sym(recv, mid, args, block)
    }

    pub fn funcall_sym(&mut self, recv: Value, mid: Sym, args: &[Value], block: Value) -> VmResult<Value> {
        let limit = self.config.funcall_argc_max;
        if args.len() > limit {
            return Err(self.argument_error(format!("Too long arguments. (limit={limit})")));
        }
        let class = self.class_of(recv);
        let Some(method) = self.find_method(class, mid) else {
            let msg = format!(
                "undefined method '{}' for {}",
                self.sym_name(mid),
                self.class_name(self.real_class_of(recv))
            );
            let class = self.builtins.no_method_error;
            return Err(self.raise(class, &msg));
        };
        if method.noarg && !args.is_empty() {
            return Err(self.argument_error(format!(
                "wrong number of arguments (given {}, expected 0)",
                args.len()
            )));
        }
        let argv = if method.noarg { Vec::new() } else { args.to_vec() };
        self.invoke(method.proc, Some(mid), recv, argv, block)
    }

    /// Calls `proc` with `self_value` as receiver.
    pub fn call_proc(&mut self, proc: Value, self_value: Value, args: &[Value]) -> VmResult<Value> {
        let id = match proc {
            Value::Obj(id) if self.type_of(proc) == ValueType::Proc => id,
            other => {
                let desc = self.inspect(other);
                return Err(self.type_error(format!("{desc} is not a Proc")));
            }
        };
        self.invoke(id, None, self_value, args.to_vec(), Value::Nil)
    }

    fn invoke(&mut self, proc: ObjId, mid: Option<Sym>, receiver: Value, argv: Vec<Value>, block: Value) -> VmResult<Value> {
        let depth = self.call_stack.len();
        if depth >= self.config.max_call_depth {
            let class = self.builtins.system_stack_error;
            return Err(self.raise(class, "stack level too deep"));
        }
        let body = match self.heap.get(proc).map(|o| &o.body) {
            Some(ObjBody::Proc(data)) => data.body.clone(),
            _ => return Err(self.type_error("method body is not a Proc")),
        };
        trace!(target: "orb::vm::dispatch", depth, mid = mid.map(|m| m.id()), "call");
        self.call_stack.push(CallInfo {
            mid,
            proc,
            receiver,
            argv,
            block,
        });
        let result = match body {
            ProcBody::Native(func) => func(self, receiver),
            ProcBody::Lexical(closure) => {
                let args = self.get_args();
                closure(self, receiver, &args)
            }
        };
        self.call_stack.truncate(depth);
        result
    }

    fn current_call(&self) -> Option<&CallInfo> {
        self.call_stack.last()
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// The proc of the innermost active call.
    pub fn current_proc(&self) -> Option<ObjId> {
        self.current_call().map(|ci| ci.proc)
    }

    pub fn get_mid(&self) -> Option<Sym> {
        self.current_call().and_then(|ci| ci.mid)
    }

    pub fn get_args(&self) -> Vec<Value> {
        self.current_call().map(|ci| ci.argv.clone()).unwrap_or_default()
    }

    pub fn get_argc(&self) -> usize {
        self.current_call().map_or(0, |ci| ci.argv.len())
    }

    /// Argument `i` of the current call, `nil` when absent.
    pub fn get_arg(&self, i: usize) -> Value {
        self.current_call()
            .and_then(|ci| ci.argv.get(i).copied())
            .unwrap_or(Value::Nil)
    }

    pub fn get_args_block(&self) -> Value {
        self.current_call().map_or(Value::Nil, |ci| ci.block)
    }
}
