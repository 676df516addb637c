use tracing::trace;

use super::Vm;
use crate::object::{ClassData, ClassKind, HeapObject, ObjBody};
use crate::value::{ObjId, Value, ValueType};

impl Vm {
    pub(super) fn boot(&mut self) {
        let basic_object = self.boot_class("BasicObject", None);
        let object = self.boot_class("Object", Some(basic_object));
        let module = self.boot_class("Module", Some(object));
        let class = self.boot_class("Class", Some(module));
        for id in [basic_object, object, module, class] {
            if let Some(obj) = self.heap.get_mut(id) {
                obj.class = class;
            }
        }
        self.builtins.basic_object = basic_object;
        self.builtins.object = object;
        self.builtins.module = module;
        self.builtins.class = class;
        for (name, id) in [
            ("BasicObject", basic_object),
            ("Object", object),
            ("Module", module),
            ("Class", class),
        ] {
            let sym = self.intern(name);
            self.set_const_raw(object, sym, Value::Obj(id));
        }

        let kernel = self.boot_class_under_object("Kernel", None, ClassKind::Module);
        self.builtins.kernel = kernel;

        let c = |vm: &mut Vm, name: &str, sup: ObjId| vm.boot_class_under_object(name, Some(sup), ClassKind::Class);
        self.builtins.nil_class = c(self, "NilClass", object);
        self.builtins.true_class = c(self, "TrueClass", object);
        self.builtins.false_class = c(self, "FalseClass", object);
        self.builtins.integer = c(self, "Integer", object);
        self.builtins.float = c(self, "Float", object);
        self.builtins.symbol = c(self, "Symbol", object);
        self.builtins.string = c(self, "String", object);
        self.builtins.array = c(self, "Array", object);
        self.builtins.hash = c(self, "Hash", object);
        self.builtins.range = c(self, "Range", object);
        self.builtins.proc = c(self, "Proc", object);

        let exception = c(self, "Exception", object);
        self.builtins.exception = exception;
        let standard_error = c(self, "StandardError", exception);
        self.builtins.standard_error = standard_error;
        let runtime_error = c(self, "RuntimeError", standard_error);
        self.builtins.runtime_error = runtime_error;
        self.builtins.type_error = c(self, "TypeError", standard_error);
        self.builtins.argument_error = c(self, "ArgumentError", standard_error);
        let index_error = c(self, "IndexError", standard_error);
        self.builtins.index_error = index_error;
        self.builtins.key_error = c(self, "KeyError", index_error);
        self.builtins.range_error = c(self, "RangeError", standard_error);
        let name_error = c(self, "NameError", standard_error);
        self.builtins.name_error = name_error;
        self.builtins.no_method_error = c(self, "NoMethodError", name_error);
        self.builtins.frozen_error = c(self, "FrozenError", runtime_error);
        self.builtins.local_jump_error = c(self, "LocalJumpError", standard_error);
        let script_error = c(self, "ScriptError", exception);
        self.builtins.script_error = script_error;
        self.builtins.not_implemented_error = c(self, "NotImplementedError", script_error);
        self.builtins.system_stack_error = c(self, "SystemStackError", exception);

        for id in self.builtins.roots() {
            if self.type_of(Value::Obj(id)) == ValueType::Class {
                // Cannot fail for a live class.
                let _ = self.singleton_class(Value::Obj(id));
            }
        }

        self.top_self = self.alloc(HeapObject::new(object, ObjBody::Object));
        // Boot objects are rooted through builtins, the arena starts empty.
        self.heap.arena_restore(0);
        trace!(target: "orb::vm::boot", handle = ?self.handle, live = self.heap.live_count(), "vm booted");
    }

    fn boot_class(&mut self, name: &str, superclass: Option<ObjId>) -> ObjId {
        let sym = self.intern(name);
        let data = ClassData::new(Some(sym), superclass, ClassKind::Class);
        self.alloc(HeapObject::new(ObjId::default(), ObjBody::Class(data)))
    }

    fn boot_class_under_object(&mut self, name: &str, superclass: Option<ObjId>, kind: ClassKind) -> ObjId {
        let outer = self.builtins.object;
        let id = self.new_class_object(name, superclass, kind);
        let sym = self.intern(name);
        self.set_const_raw(outer, sym, Value::Obj(id));
        id
    }
}
