use super::Vm;
use crate::error::VmResult;
use crate::object::{EnvData, HeapObject, LexicalFn, NativeFn, ObjBody, PROC_CFUNC, PROC_ENVSET, PROC_STRICT, ProcBody, ProcData};
use crate::value::{ObjId, Value};

impl Vm {
    pub fn proc_new_cfunc(&mut self, func: NativeFn) -> ObjId {
        let data = ProcData {
            body: ProcBody::Native(func),
            flags: PROC_CFUNC,
            env: None,
            target_class: None,
        };
        let class = self.builtins.proc;
        self.alloc(HeapObject::new(class, ObjBody::Proc(data)))
    }

    /// Native proc whose environment is `values`, stored unshared.
    pub fn proc_new_cfunc_with_env(&mut self, func: NativeFn, values: &[Value]) -> ObjId {
        let proc = self.proc_new_cfunc(func);
        let env = self.env_new(values);
        self.proc_set_env_raw(proc, env);
        proc
    }

    /// Proc standing in for a script block.
    pub fn proc_new_lexical(&mut self, body: LexicalFn) -> ObjId {
        let data = ProcData {
            body: ProcBody::Lexical(body),
            flags: PROC_STRICT,
            env: None,
            target_class: None,
        };
        let class = self.builtins.proc;
        self.alloc(HeapObject::new(class, ObjBody::Proc(data)))
    }

    pub fn env_new(&mut self, values: &[Value]) -> ObjId {
        let class = self.builtins.object;
        let env = EnvData {
            values: values.to_vec(),
            shared: false,
        };
        self.alloc(HeapObject::new(class, ObjBody::Env(env)))
    }

    pub(crate) fn proc_data(&self, proc: ObjId) -> Option<&ProcData> {
        match self.heap.get(proc).map(|o| &o.body) {
            Some(ObjBody::Proc(data)) => Some(data),
            _ => None,
        }
    }

    pub fn proc_flags(&self, proc: ObjId) -> Option<u32> {
        self.proc_data(proc).map(|d| d.flags)
    }

    pub fn proc_is_cfunc(&self, proc: ObjId) -> bool {
        self.proc_data(proc).is_some_and(|d| d.is_cfunc())
    }

    pub fn proc_env(&self, proc: ObjId) -> Option<ObjId> {
        self.proc_data(proc).and_then(|d| d.env)
    }

    pub fn env_values(&self, env: ObjId) -> Option<&[Value]> {
        match self.heap.get(env).map(|o| &o.body) {
            Some(ObjBody::Env(data)) => Some(&data.values),
            _ => None,
        }
    }

    pub fn env_is_shared(&self, env: ObjId) -> Option<bool> {
        match self.heap.get(env).map(|o| &o.body) {
            Some(ObjBody::Env(data)) => Some(data.shared),
            _ => None,
        }
    }

    pub(crate) fn env_values_mut(&mut self, env: ObjId) -> Option<&mut Vec<Value>> {
        match self.heap.get_mut(env).map(|o| &mut o.body) {
            Some(ObjBody::Env(data)) => Some(&mut data.values),
            _ => None,
        }
    }

    /// Installs `env` on `proc` and sets `ENVSET`. Performs no checks.
    pub fn proc_set_env_raw(&mut self, proc: ObjId, env: ObjId) {
        if let Some(ObjBody::Proc(data)) = self.heap.get_mut(proc).map(|o| &mut o.body) {
            data.env = Some(env);
            data.flags |= PROC_ENVSET;
        }
    }

    /// Reads slot `idx` of a native proc's environment.
    pub fn proc_env_get(&mut self, proc: ObjId, idx: i64) -> VmResult<Value> {
        let env = self.checked_cfunc_env(proc)?;
        let pos = self.checked_env_index(env, idx)?;
        Ok(self.env_values(env).map(|v| v[pos]).unwrap_or(Value::Nil))
    }

    /// Writes slot `idx` of a native proc's environment.
    pub fn proc_env_set(&mut self, proc: ObjId, idx: i64, value: Value) -> VmResult<()> {
        let env = self.checked_cfunc_env(proc)?;
        let pos = self.checked_env_index(env, idx)?;
        if let Some(values) = self.env_values_mut(env) {
            values[pos] = value;
        }
        Ok(())
    }

    /// Environment lookup for the native proc currently executing.
    pub fn proc_cfunc_env_get(&mut self, idx: i64) -> VmResult<Value> {
        match self.current_proc() {
            Some(proc) => self.proc_env_get(proc, idx),
            None => Err(self.type_error("Can't get cfunc env from non-cfunc proc.")),
        }
    }

    fn checked_cfunc_env(&mut self, proc: ObjId) -> VmResult<ObjId> {
        if !self.proc_is_cfunc(proc) {
            return Err(self.type_error("Can't get cfunc env from non-cfunc proc."));
        }
        match self.proc_env(proc) {
            Some(env) => Ok(env),
            None => Err(self.type_error("Can't get cfunc env from cfunc Proc without REnv.")),
        }
    }

    fn checked_env_index(&mut self, env: ObjId, idx: i64) -> VmResult<usize> {
        let len = self.env_values(env).map_or(0, <[Value]>::len);
        if idx < 0 || idx as usize >= len {
            return Err(self.index_error(format!(
                "Env index out of range: {idx} (expected: 0 <= index < {len})"
            )));
        }
        Ok(idx as usize)
    }
}
