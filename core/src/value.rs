use std::fmt;

/// Slot index of an object in the VM heap.
///
/// Ids are only meaningful for the `Vm` that allocated them. A freed slot may
/// be handed out again, so an id kept across a collection can name a
/// different object afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjId(pub(crate) u32);

impl ObjId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}

/// Interned symbol id, see [`crate::symbol::SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(pub(crate) u32);

impl Sym {
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }
}

/// A VM value. Immediates are stored inline, everything else lives in the heap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Sym(Sym),
    Obj(ObjId),
    Undef,
}

impl Value {
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Ruby truthiness: only `nil` and `false` are falsy.
    #[inline]
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_obj(&self) -> Option<ObjId> {
        match self {
            Value::Obj(id) => Some(*id),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sym(&self) -> Option<Sym> {
        match self {
            Value::Sym(s) => Some(*s),
            _ => None,
        }
    }

    /// Immediates never carry heap identity and are not subject to GC.
    #[inline]
    pub fn is_immediate(&self) -> bool {
        !matches!(self, Value::Obj(_))
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjId> for Value {
    #[inline]
    fn from(id: ObjId) -> Self {
        Value::Obj(id)
    }
}

impl From<Sym> for Value {
    #[inline]
    fn from(sym: Sym) -> Self {
        Value::Sym(sym)
    }
}

/// Runtime type tag of a value, the equivalent of the VM's `vtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    False,
    True,
    Integer,
    Float,
    Symbol,
    Undef,
    Object,
    Class,
    Module,
    SClass,
    Proc,
    Array,
    Hash,
    String,
    Range,
    Exception,
    Env,
    IStruct,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::False => "False",
            ValueType::True => "True",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Symbol => "Symbol",
            ValueType::Undef => "Undef",
            ValueType::Object => "Object",
            ValueType::Class => "Class",
            ValueType::Module => "Module",
            ValueType::SClass => "SClass",
            ValueType::Proc => "Proc",
            ValueType::Array => "Array",
            ValueType::Hash => "Hash",
            ValueType::String => "String",
            ValueType::Range => "Range",
            ValueType::Exception => "Exception",
            ValueType::Env => "Env",
            ValueType::IStruct => "IStruct",
        }
    }

    /// Class-like tags accept method definitions.
    #[inline]
    pub fn is_class_like(self) -> bool {
        matches!(self, ValueType::Class | ValueType::Module | ValueType::SClass)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
