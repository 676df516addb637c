use std::fmt;
use std::sync::Arc;

use crate::error::VmResult;
use crate::util::fast_map::{FastHashMap, SymMap, sym_map};
use crate::value::{ObjId, Sym, Value, ValueType};
use crate::vm::Vm;

pub const FLAG_FROZEN: u32 = 1 << 0;

pub const PROC_CFUNC: u32 = 128;
pub const PROC_STRICT: u32 = 256;
pub const PROC_ENVSET: u32 = 1024;
pub const PROC_SCOPE: u32 = 2048;
pub const PROC_NOARG: u32 = 4096;

/// Entry point of a native proc. Receives the VM and `self`; arguments are
/// read from the current call frame.
pub type NativeFn = fn(&mut Vm, Value) -> VmResult<Value>;

/// Body of a proc created from script-level code.
pub type LexicalFn = Arc<dyn Fn(&mut Vm, Value, &[Value]) -> VmResult<Value> + Send + Sync>;

#[derive(Clone)]
pub enum ProcBody {
    Native(NativeFn),
    Lexical(LexicalFn),
}

impl fmt::Debug for ProcBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcBody::Native(func) => write!(f, "Native({:p})", *func as *const ()),
            ProcBody::Lexical(_) => f.write_str("Lexical(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcData {
    pub body: ProcBody,
    pub flags: u32,
    pub env: Option<ObjId>,
    pub target_class: Option<ObjId>,
}

impl ProcData {
    #[inline]
    pub fn is_cfunc(&self) -> bool {
        self.flags & PROC_CFUNC != 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvData {
    pub values: Vec<Value>,
    pub shared: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Method {
    pub proc: ObjId,
    pub noarg: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassKind {
    Class,
    Module,
    Singleton { attached: Value },
}

#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: Option<Sym>,
    pub superclass: Option<ObjId>,
    pub kind: ClassKind,
    pub methods: SymMap<Method>,
    pub consts: SymMap<Value>,
}

impl ClassData {
    pub fn new(name: Option<Sym>, superclass: Option<ObjId>, kind: ClassKind) -> Self {
        Self {
            name,
            superclass,
            kind,
            methods: sym_map(),
            consts: sym_map(),
        }
    }
}

/// Hash key identity. Strings compare by content, other heap objects by
/// identity, floats by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Nil,
    Bool(bool),
    Int(i64),
    Float(u64),
    Sym(Sym),
    Str(Vec<u8>),
    Obj(ObjId),
    Undef,
}

/// Insertion-ordered hash table. `keys` holds the identity of each entry in
/// the same order as `entries`.
#[derive(Debug, Clone, Default)]
pub struct HashData {
    pub entries: Vec<(Value, Value)>,
    keys: Vec<HashKey>,
    index: FastHashMap<HashKey, usize>,
}

impl HashData {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, key: &HashKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn insert(&mut self, hkey: HashKey, key: Value, value: Value) {
        match self.index.get(&hkey).copied() {
            Some(pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(hkey.clone(), self.entries.len());
                self.keys.push(hkey);
                self.entries.push((key, value));
            }
        }
    }

    pub fn remove_at(&mut self, pos: usize) -> (Value, Value) {
        let removed = self.entries.remove(pos);
        self.keys.remove(pos);
        self.index.clear();
        for (i, key) in self.keys.iter().enumerate() {
            self.index.insert(key.clone(), i);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.keys.clear();
        self.index.clear();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RangeData {
    pub begin: Value,
    pub end: Value,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExceptionData {
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum ObjBody {
    Object,
    Class(ClassData),
    Proc(ProcData),
    Array(Vec<Value>),
    Hash(HashData),
    String(Vec<u8>),
    Range(RangeData),
    Exception(ExceptionData),
    Env(EnvData),
    IStruct(i64),
}

#[derive(Debug, Clone)]
pub struct HeapObject {
    pub class: ObjId,
    pub flags: u32,
    pub ivars: SymMap<Value>,
    pub body: ObjBody,
    pub(crate) marked: bool,
}

impl HeapObject {
    pub fn new(class: ObjId, body: ObjBody) -> Self {
        Self {
            class,
            flags: 0,
            ivars: sym_map(),
            body,
            marked: false,
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.flags & FLAG_FROZEN != 0
    }

    pub fn value_type(&self) -> ValueType {
        match &self.body {
            ObjBody::Object => ValueType::Object,
            ObjBody::Class(data) => match data.kind {
                ClassKind::Class => ValueType::Class,
                ClassKind::Module => ValueType::Module,
                ClassKind::Singleton { .. } => ValueType::SClass,
            },
            ObjBody::Proc(_) => ValueType::Proc,
            ObjBody::Array(_) => ValueType::Array,
            ObjBody::Hash(_) => ValueType::Hash,
            ObjBody::String(_) => ValueType::String,
            ObjBody::Range(_) => ValueType::Range,
            ObjBody::Exception(_) => ValueType::Exception,
            ObjBody::Env(_) => ValueType::Env,
            ObjBody::IStruct(_) => ValueType::IStruct,
        }
    }

    /// Pushes every heap reference held by this object onto `out`.
    pub(crate) fn children(&self, out: &mut Vec<ObjId>) {
        out.push(self.class);
        push_values(out, self.ivars.values());
        match &self.body {
            ObjBody::Object | ObjBody::String(_) | ObjBody::Exception(_) | ObjBody::IStruct(_) => {}
            ObjBody::Class(data) => {
                out.extend(data.superclass);
                out.extend(data.methods.values().map(|m| m.proc));
                push_values(out, data.consts.values());
                if let ClassKind::Singleton { attached } = data.kind {
                    push_values(out, std::iter::once(&attached));
                }
            }
            ObjBody::Proc(data) => {
                out.extend(data.env);
                out.extend(data.target_class);
            }
            ObjBody::Array(items) => push_values(out, items.iter()),
            ObjBody::Hash(hash) => {
                for (k, v) in &hash.entries {
                    push_values(out, [k, v]);
                }
            }
            ObjBody::Range(range) => push_values(out, [&range.begin, &range.end]),
            ObjBody::Env(env) => push_values(out, env.values.iter()),
        }
    }
}

fn push_values<'a>(out: &mut Vec<ObjId>, values: impl IntoIterator<Item = &'a Value>) {
    out.extend(values.into_iter().filter_map(Value::as_obj));
}
