use tracing::trace;

use super::Vm;
use crate::error::VmResult;
use crate::object::{ClassData, ClassKind, HeapObject, Method, ObjBody, PROC_NOARG, PROC_SCOPE};
use crate::value::{ObjId, Sym, Value, ValueType};

impl Vm {
    pub(super) fn new_class_object(&mut self, name: &str, superclass: Option<ObjId>, kind: ClassKind) -> ObjId {
        let sym = (!name.is_empty()).then(|| self.intern(name));
        let meta = match kind {
            ClassKind::Module => self.builtins.module,
            _ => self.builtins.class,
        };
        self.alloc(HeapObject::new(meta, ObjBody::Class(ClassData::new(sym, superclass, kind))))
    }

    pub(super) fn set_const_raw(&mut self, outer: ObjId, sym: Sym, value: Value) {
        if let Some(ObjBody::Class(data)) = self.heap.get_mut(outer).map(|o| &mut o.body) {
            data.consts.insert(sym, value);
        }
    }

    pub(crate) fn class_data(&self, id: ObjId) -> Option<&ClassData> {
        match self.heap.get(id).map(|o| &o.body) {
            Some(ObjBody::Class(data)) => Some(data),
            _ => None,
        }
    }

    fn class_data_mut(&mut self, id: ObjId) -> Option<&mut ClassData> {
        match self.heap.get_mut(id).map(|o| &mut o.body) {
            Some(ObjBody::Class(data)) => Some(data),
            _ => None,
        }
    }

    /// Raises `TypeError` unless `value` is a class, module or singleton class.
    pub fn expect_class(&mut self, value: Value) -> VmResult<ObjId> {
        match value {
            Value::Obj(id) if self.type_of(value).is_class_like() => Ok(id),
            other => {
                let desc = self.inspect(other);
                Err(self.type_error(format!("{desc} is not a class/module")))
            }
        }
    }

    pub fn define_class(&mut self, name: &str, superclass: Option<ObjId>) -> VmResult<ObjId> {
        let outer = self.builtins.object;
        self.define_class_under(outer, name, superclass)
    }

    pub fn define_class_under(&mut self, outer: ObjId, name: &str, superclass: Option<ObjId>) -> VmResult<ObjId> {
        let sym = self.intern(name);
        let existing = self.class_data(outer).and_then(|d| d.consts.get(&sym).copied());
        if let Some(value) = existing {
            if self.type_of(value) != ValueType::Class {
                return Err(self.type_error(format!("{name} is not a class")));
            }
            let id = self.expect_class(value)?;
            if let Some(sup) = superclass {
                if self.superclass(id) != Some(sup) {
                    return Err(self.type_error(format!("superclass mismatch for class {name}")));
                }
            }
            return Ok(id);
        }
        let sup = superclass.unwrap_or(self.builtins.object);
        if self.type_of(Value::Obj(sup)) != ValueType::Class {
            return Err(self.type_error("superclass must be a Class"));
        }
        let id = self.new_class_object(name, Some(sup), ClassKind::Class);
        self.singleton_class(Value::Obj(id))?;
        self.set_const_raw(outer, sym, Value::Obj(id));
        trace!(target: "orb::vm::class", name, "class defined");
        Ok(id)
    }

    pub fn define_module(&mut self, name: &str) -> VmResult<ObjId> {
        let outer = self.builtins.object;
        self.define_module_under(outer, name)
    }

    pub fn define_module_under(&mut self, outer: ObjId, name: &str) -> VmResult<ObjId> {
        let sym = self.intern(name);
        let existing = self.class_data(outer).and_then(|d| d.consts.get(&sym).copied());
        if let Some(value) = existing {
            if self.type_of(value) != ValueType::Module {
                return Err(self.type_error(format!("{name} is not a module")));
            }
            return self.expect_class(value);
        }
        let id = self.new_class_object(name, None, ClassKind::Module);
        self.set_const_raw(outer, sym, Value::Obj(id));
        Ok(id)
    }

    /// Looks up a top-level class or module by name.
    pub fn class_get(&self, name: &str) -> Option<ObjId> {
        let sym = self.symbols.check(name)?;
        let value = self.class_data(self.builtins.object)?.consts.get(&sym).copied()?;
        self.type_of(value).is_class_like().then(|| value.as_obj()).flatten()
    }

    /// The class used for method lookup, including singleton classes.
    pub fn class_of(&self, value: Value) -> ObjId {
        let b = &self.builtins;
        match value {
            Value::Nil => b.nil_class,
            Value::Bool(true) => b.true_class,
            Value::Bool(false) => b.false_class,
            Value::Int(_) => b.integer,
            Value::Float(_) => b.float,
            Value::Sym(_) => b.symbol,
            Value::Undef => b.object,
            Value::Obj(id) => self.heap.get(id).map(|o| o.class).unwrap_or(b.object),
        }
    }

    /// Like [`Vm::class_of`] but skips singleton classes.
    pub fn real_class_of(&self, value: Value) -> ObjId {
        let mut class = self.class_of(value);
        while let Some(data) = self.class_data(class) {
            match (data.kind, data.superclass) {
                (ClassKind::Singleton { .. }, Some(sup)) => class = sup,
                _ => break,
            }
        }
        class
    }

    pub fn singleton_class(&mut self, value: Value) -> VmResult<ObjId> {
        let id = match value {
            Value::Obj(id) if !self.heap.is_dead(id) => id,
            _ => return Err(self.type_error("can't define singleton")),
        };
        let current = self.class_of(value);
        if let Some(ClassKind::Singleton { attached }) = self.class_data(current).map(|d| d.kind) {
            if attached == value {
                return Ok(current);
            }
        }
        let sup = match self.class_data(id).map(|d| (d.kind, d.superclass)) {
            Some((ClassKind::Class, Some(parent))) => self.singleton_class(Value::Obj(parent))?,
            _ => current,
        };
        let meta = self.builtins.class;
        let data = ClassData::new(None, Some(sup), ClassKind::Singleton { attached: value });
        let sclass = self.alloc(HeapObject::new(meta, ObjBody::Class(data)));
        if let Some(obj) = self.heap.get_mut(id) {
            obj.class = sclass;
        }
        Ok(sclass)
    }

    pub fn superclass(&self, class: ObjId) -> Option<ObjId> {
        self.class_data(class).and_then(|d| d.superclass)
    }

    pub fn class_name(&self, class: ObjId) -> String {
        match self.class_data(class) {
            Some(ClassData { name: Some(sym), .. }) => self.sym_name(*sym).to_string(),
            Some(ClassData {
                kind: ClassKind::Singleton { attached },
                ..
            }) => format!("#<Class:{}>", self.inspect(*attached)),
            _ => format!("#<Class:{class}>"),
        }
    }

    pub fn is_kind_of(&self, value: Value, class: ObjId) -> bool {
        let mut cursor = Some(self.class_of(value));
        while let Some(c) = cursor {
            if c == class {
                return true;
            }
            cursor = self.superclass(c);
        }
        false
    }

    pub fn define_method_raw(&mut self, class: ObjId, mid: Sym, method: Method) -> VmResult<()> {
        self.expect_class(Value::Obj(class))?;
        self.check_frozen(Value::Obj(class))?;
        if let Some(ObjBody::Proc(data)) = self.heap.get_mut(method.proc).map(|o| &mut o.body) {
            if data.target_class.is_none() {
                data.target_class = Some(class);
                data.flags |= PROC_SCOPE;
            }
            if method.noarg {
                data.flags |= PROC_NOARG;
            }
        }
        if let Some(data) = self.class_data_mut(class) {
            data.methods.insert(mid, method);
        }
        trace!(target: "orb::vm::class", method = self.sym_name(mid), noarg = method.noarg, "method installed");
        Ok(())
    }

    pub fn undef_method(&mut self, class: ObjId, mid: Sym) -> VmResult<()> {
        self.check_frozen(Value::Obj(class))?;
        let removed = self.class_data_mut(class).and_then(|d| d.methods.remove(&mid));
        if removed.is_none() {
            let msg = format!(
                "undefined method '{}' for class '{}'",
                self.sym_name(mid),
                self.class_name(class)
            );
            return Err(self.name_error(msg));
        }
        Ok(())
    }

    /// Walks the superclass chain starting at `class`.
    pub fn find_method(&self, class: ObjId, mid: Sym) -> Option<Method> {
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            let data = self.class_data(c)?;
            if let Some(m) = data.methods.get(&mid) {
                return Some(*m);
            }
            cursor = data.superclass;
        }
        None
    }

    pub fn respond_to(&self, value: Value, name: &str) -> bool {
        let Some(mid) = self.symbols.check(name) else {
            return false;
        };
        self.find_method(self.class_of(value), mid).is_some()
    }

    pub fn alias_method(&mut self, class: ObjId, new_name: Sym, old_name: Sym) -> VmResult<()> {
        match self.find_method(class, old_name) {
            Some(method) => self.define_method_raw(class, new_name, method),
            None => {
                let msg = format!(
                    "undefined method '{}' for class '{}'",
                    self.sym_name(old_name),
                    self.class_name(class)
                );
                Err(self.name_error(msg))
            }
        }
    }

    pub fn const_set(&mut self, class: ObjId, name: &str, value: Value) -> VmResult<()> {
        self.expect_class(Value::Obj(class))?;
        self.check_frozen(Value::Obj(class))?;
        let sym = self.intern(name);
        self.set_const_raw(class, sym, value);
        Ok(())
    }

    /// Resolves `name` in `class`, its ancestors, then `Object`.
    pub fn const_get(&mut self, class: ObjId, name: &str) -> VmResult<Value> {
        if let Some(value) = self.lookup_const(class, name) {
            return Ok(value);
        }
        Err(self.name_error(format!("uninitialized constant {name}")))
    }

    pub fn const_defined(&self, class: ObjId, name: &str) -> bool {
        self.lookup_const(class, name).is_some()
    }

    fn lookup_const(&self, class: ObjId, name: &str) -> Option<Value> {
        let sym = self.symbols.check(name)?;
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            let data = self.class_data(c)?;
            if let Some(v) = data.consts.get(&sym) {
                return Some(*v);
            }
            cursor = data.superclass;
        }
        self.class_data(self.builtins.object)?.consts.get(&sym).copied()
    }

    pub fn iv_set(&mut self, target: Value, name: &str, value: Value) -> VmResult<()> {
        let Value::Obj(id) = target else {
            return Err(self.argument_error("cannot set instance variable"));
        };
        self.check_frozen(target)?;
        let sym = self.intern(name);
        if let Some(obj) = self.heap.get_mut(id) {
            obj.ivars.insert(sym, value);
        }
        Ok(())
    }

    pub fn iv_get(&self, target: Value, name: &str) -> Value {
        let (Value::Obj(id), Some(sym)) = (target, self.symbols.check(name)) else {
            return Value::Nil;
        };
        self.heap
            .get(id)
            .and_then(|o| o.ivars.get(&sym).copied())
            .unwrap_or(Value::Nil)
    }
}
