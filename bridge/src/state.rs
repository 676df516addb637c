use orb_core::{Aspec, ObjId, Value, Vm, VmConfig, VmException, VmResult};
use tracing::debug;

use crate::callback::{self, CallContext, HostCallable};
use crate::{define, exception, registry};

/// A registered VM plus its callback table.
///
/// Opening registers the VM as a bridge instance; dropping unregisters it and
/// releases every callable defined through this state.
pub struct State {
    vm: Box<Vm>,
    index: usize,
}

impl State {
    pub fn open() -> Self {
        Self::open_with(VmConfig::default())
    }

    pub fn open_with(config: VmConfig) -> Self {
        let vm = Box::new(Vm::open_with(config));
        let index = registry::register_instance(&vm);
        debug!(target: "orb::bridge::state", index, "state opened");
        Self { vm, index }
    }

    /// Instance index of a VM known only by its raw handle.
    pub fn from_vm_raw(raw: usize) -> usize {
        registry::current_index_raw(raw)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    pub fn top_self(&self) -> Value {
        self.vm.top_self()
    }

    pub fn object_class(&self) -> ObjId {
        self.vm.builtins().object
    }

    pub fn define_class(&mut self, name: &str, superclass: Option<ObjId>) -> VmResult<ObjId> {
        self.vm.define_class(name, superclass)
    }

    pub fn define_module(&mut self, name: &str) -> VmResult<ObjId> {
        self.vm.define_module(name)
    }

    pub fn register(&self, callable: HostCallable, aspec: Aspec) -> usize {
        callback::register_callback(self.index, callable, aspec)
    }

    pub fn define_method<F>(&mut self, class: ObjId, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::method(f), aspec);
        define::define_callable_method(&mut self.vm, class, name, function, aspec)?;
        Ok(function)
    }

    /// Host errors become VM exceptions, see [`exception::raise_error`].
    pub fn define_method_fallible<F>(&mut self, class: ObjId, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::method_fallible(f), aspec);
        define::define_callable_method(&mut self.vm, class, name, function, aspec)?;
        Ok(function)
    }

    pub fn define_class_method<F>(&mut self, class: ObjId, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::method(f), aspec);
        define::define_callable_class_method(&mut self.vm, class, name, function, aspec)?;
        Ok(function)
    }

    pub fn define_module_function<F>(&mut self, module: ObjId, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::method(f), aspec);
        define::define_callable_module_function(&mut self.vm, module, name, function, aspec)?;
        Ok(function)
    }

    pub fn define_singleton_method<F>(&mut self, object: Value, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::method(f), aspec);
        define::define_callable_singleton_method(&mut self.vm, object, name, function, aspec)?;
        Ok(function)
    }

    /// Free-form method: `f` receives all arguments as one array.
    pub fn define_func<F>(&mut self, class: ObjId, name: &str, f: F, aspec: Aspec) -> VmResult<usize>
    where
        F: Fn(&mut Vm, &CallContext, Value) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::proc(f), aspec);
        define::define_callable_method(&mut self.vm, class, name, function, aspec)?;
        Ok(function)
    }

    pub fn proc_new<F>(&mut self, f: F) -> VmResult<Value>
    where
        F: Fn(&mut Vm, &CallContext, Value) -> Value + Send + Sync + 'static,
    {
        let function = self.register(HostCallable::proc(f), Aspec::any());
        define::proc_new_callable(&mut self.vm, function)
    }

    /// Calls into the VM; a raise comes back as `Err`.
    pub fn funcall(&mut self, recv: Value, name: &str, args: &[Value]) -> Result<Value, VmException> {
        exception::call(&mut self.vm, recv, name, args)
    }

    pub fn raise(&mut self, class: ObjId, message: &str) -> Value {
        exception::raise(&mut self.vm, class, message)
    }
}

impl Drop for State {
    fn drop(&mut self) {
        callback::drop_table(self.index);
        registry::unregister_instance(&self.vm);
        debug!(target: "orb::bridge::state", index = self.index, "state closed");
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("index", &self.index)
            .field("vm", &self.vm)
            .finish()
    }
}
