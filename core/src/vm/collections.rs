use super::Vm;
use crate::error::VmResult;
use crate::object::{FLAG_FROZEN, HashData, HashKey, HeapObject, ObjBody, RangeData};
use crate::value::{ObjId, Value, ValueType};

impl Vm {
    pub fn obj_new(&mut self, class: ObjId) -> VmResult<Value> {
        if self.type_of(Value::Obj(class)) != ValueType::Class {
            return Err(self.type_error("allocator needs a Class"));
        }
        Ok(Value::Obj(self.alloc(HeapObject::new(class, ObjBody::Object))))
    }

    /// Object of `class` carrying one inline integer.
    pub fn istruct_new(&mut self, class: ObjId, word: i64) -> Value {
        Value::Obj(self.alloc(HeapObject::new(class, ObjBody::IStruct(word))))
    }

    pub fn istruct_get(&self, value: Value) -> Option<i64> {
        match self.body(value) {
            Some(ObjBody::IStruct(word)) => Some(*word),
            _ => None,
        }
    }

    pub fn freeze(&mut self, value: Value) {
        if let Some(obj) = value.as_obj().and_then(|id| self.heap.get_mut(id)) {
            obj.flags |= FLAG_FROZEN;
        }
    }

    /// Immediates are always frozen.
    pub fn is_frozen(&self, value: Value) -> bool {
        match value {
            Value::Obj(id) => self.heap.get(id).is_none_or(HeapObject::is_frozen),
            _ => true,
        }
    }

    pub fn check_frozen(&mut self, value: Value) -> VmResult<()> {
        if value.as_obj().is_some() && self.is_frozen(value) {
            return Err(self.frozen_error(value));
        }
        Ok(())
    }

    fn body(&self, value: Value) -> Option<&ObjBody> {
        value.as_obj().and_then(|id| self.heap.get(id)).map(|o| &o.body)
    }

    fn body_mut(&mut self, value: Value) -> Option<&mut ObjBody> {
        value.as_obj().and_then(|id| self.heap.get_mut(id)).map(|o| &mut o.body)
    }

    /// Raises `TypeError` unless `value` has type `expected`.
    pub fn expect_type(&mut self, value: Value, expected: ValueType) -> VmResult<ObjId> {
        match value.as_obj() {
            Some(id) if self.type_of(value) == expected => Ok(id),
            _ => {
                let desc = self.inspect(value);
                Err(self.type_error(format!("{desc} cannot be converted to {expected}")))
            }
        }
    }

    // Arrays

    pub fn ary_new(&mut self) -> Value {
        self.ary_new_from(&[])
    }

    pub fn ary_new_from(&mut self, values: &[Value]) -> Value {
        let class = self.builtins.array;
        Value::Obj(self.alloc(HeapObject::new(class, ObjBody::Array(values.to_vec()))))
    }

    pub fn ary_len(&mut self, ary: Value) -> VmResult<usize> {
        self.expect_type(ary, ValueType::Array)?;
        match self.body(ary) {
            Some(ObjBody::Array(items)) => Ok(items.len()),
            _ => Ok(0),
        }
    }

    /// Element at `index`; negative indices count from the end and any
    /// out-of-range index reads as `nil`.
    pub fn ary_ref(&mut self, ary: Value, index: i64) -> VmResult<Value> {
        self.expect_type(ary, ValueType::Array)?;
        let Some(ObjBody::Array(items)) = self.body(ary) else {
            return Ok(Value::Nil);
        };
        let len = items.len() as i64;
        let pos = if index < 0 { index + len } else { index };
        if pos < 0 || pos >= len {
            return Ok(Value::Nil);
        }
        Ok(items[pos as usize])
    }

    /// Stores at `index`, padding with `nil` when writing past the end.
    /// Growing beyond `max_array_len` raises `IndexError`.
    pub fn ary_set(&mut self, ary: Value, index: i64, value: Value) -> VmResult<()> {
        self.expect_type(ary, ValueType::Array)?;
        self.check_frozen(ary)?;
        let len = self.ary_len(ary)? as i64;
        let pos = if index < 0 { index + len } else { index };
        if pos < 0 {
            return Err(self.index_error(format!(
                "index {index} too small for array; minimum: -{len}"
            )));
        }
        if pos >= self.config.max_array_len as i64 {
            return Err(self.index_error(format!("index {index} too big")));
        }
        if let Some(ObjBody::Array(items)) = self.body_mut(ary) {
            let pos = pos as usize;
            if pos >= items.len() {
                items.resize(pos + 1, Value::Nil);
            }
            items[pos] = value;
        }
        Ok(())
    }

    pub fn ary_push(&mut self, ary: Value, value: Value) -> VmResult<()> {
        self.expect_type(ary, ValueType::Array)?;
        self.check_frozen(ary)?;
        if self.ary_len(ary)? >= self.config.max_array_len {
            return Err(self.argument_error("array size too big"));
        }
        if let Some(ObjBody::Array(items)) = self.body_mut(ary) {
            items.push(value);
        }
        Ok(())
    }

    pub fn ary_values(&mut self, ary: Value) -> VmResult<Vec<Value>> {
        self.expect_type(ary, ValueType::Array)?;
        match self.body(ary) {
            Some(ObjBody::Array(items)) => Ok(items.clone()),
            _ => Ok(Vec::new()),
        }
    }

    // Strings

    pub fn str_new(&mut self, s: &str) -> Value {
        self.str_new_bytes(s.as_bytes())
    }

    pub fn str_new_bytes(&mut self, bytes: &[u8]) -> Value {
        let class = self.builtins.string;
        Value::Obj(self.alloc(HeapObject::new(class, ObjBody::String(bytes.to_vec()))))
    }

    pub fn str_bytes(&mut self, s: Value) -> VmResult<Vec<u8>> {
        self.expect_type(s, ValueType::String)?;
        match self.body(s) {
            Some(ObjBody::String(bytes)) => Ok(bytes.clone()),
            _ => Ok(Vec::new()),
        }
    }

    pub fn str_to_string(&mut self, s: Value) -> VmResult<String> {
        let bytes = self.str_bytes(s)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn str_len(&mut self, s: Value) -> VmResult<usize> {
        self.expect_type(s, ValueType::String)?;
        match self.body(s) {
            Some(ObjBody::String(bytes)) => Ok(bytes.len()),
            _ => Ok(0),
        }
    }

    pub fn str_cat(&mut self, s: Value, tail: &str) -> VmResult<()> {
        self.expect_type(s, ValueType::String)?;
        self.check_frozen(s)?;
        if let Some(ObjBody::String(bytes)) = self.body_mut(s) {
            bytes.extend_from_slice(tail.as_bytes());
        }
        Ok(())
    }

    // Hashes

    pub fn hash_new(&mut self) -> Value {
        let class = self.builtins.hash;
        Value::Obj(self.alloc(HeapObject::new(class, ObjBody::Hash(HashData::default()))))
    }

    pub fn hash_key(&self, key: Value) -> HashKey {
        match key {
            Value::Nil => HashKey::Nil,
            Value::Bool(b) => HashKey::Bool(b),
            Value::Int(i) => HashKey::Int(i),
            Value::Float(f) => HashKey::Float(f.to_bits()),
            Value::Sym(s) => HashKey::Sym(s),
            Value::Undef => HashKey::Undef,
            Value::Obj(id) => match self.heap.get(id).map(|o| &o.body) {
                Some(ObjBody::String(bytes)) => HashKey::Str(bytes.clone()),
                _ => HashKey::Obj(id),
            },
        }
    }

    fn hash_data(&mut self, hash: Value) -> VmResult<&mut HashData> {
        self.expect_type(hash, ValueType::Hash)?;
        match self.body_mut(hash) {
            Some(ObjBody::Hash(data)) => Ok(data),
            _ => unreachable!("type checked above"),
        }
    }

    /// Unfrozen string keys are copied and frozen before insertion.
    pub fn hash_set(&mut self, hash: Value, key: Value, value: Value) -> VmResult<()> {
        self.expect_type(hash, ValueType::Hash)?;
        self.check_frozen(hash)?;
        let key = if self.type_of(key) == ValueType::String && !self.is_frozen(key) {
            let bytes = self.str_bytes(key)?;
            let copy = self.str_new_bytes(&bytes);
            self.freeze(copy);
            copy
        } else {
            key
        };
        let hkey = self.hash_key(key);
        self.hash_data(hash)?.insert(hkey, key, value);
        Ok(())
    }

    pub fn hash_get(&mut self, hash: Value, key: Value) -> VmResult<Option<Value>> {
        let hkey = self.hash_key(key);
        let data = self.hash_data(hash)?;
        Ok(data.position(&hkey).map(|pos| data.entries[pos].1))
    }

    pub fn hash_delete(&mut self, hash: Value, key: Value) -> VmResult<Option<Value>> {
        self.expect_type(hash, ValueType::Hash)?;
        self.check_frozen(hash)?;
        let hkey = self.hash_key(key);
        let data = self.hash_data(hash)?;
        Ok(data.position(&hkey).map(|pos| data.remove_at(pos).1))
    }

    pub fn hash_len(&mut self, hash: Value) -> VmResult<usize> {
        Ok(self.hash_data(hash)?.len())
    }

    pub fn hash_entries(&mut self, hash: Value) -> VmResult<Vec<(Value, Value)>> {
        Ok(self.hash_data(hash)?.entries.clone())
    }

    pub fn hash_keys(&mut self, hash: Value) -> VmResult<Vec<Value>> {
        Ok(self.hash_data(hash)?.entries.iter().map(|(k, _)| *k).collect())
    }

    pub fn hash_values(&mut self, hash: Value) -> VmResult<Vec<Value>> {
        Ok(self.hash_data(hash)?.entries.iter().map(|(_, v)| *v).collect())
    }

    pub fn hash_clear(&mut self, hash: Value) -> VmResult<()> {
        self.expect_type(hash, ValueType::Hash)?;
        self.check_frozen(hash)?;
        self.hash_data(hash)?.clear();
        Ok(())
    }

    pub(super) fn hash_entry_at(&self, hash: Value, pos: usize) -> Option<(Value, Value)> {
        match self.body(hash) {
            Some(ObjBody::Hash(data)) => data.entries.get(pos).copied(),
            _ => None,
        }
    }

    pub(super) fn hash_remove_at(&mut self, hash: Value, pos: usize) {
        if let Some(ObjBody::Hash(data)) = self.body_mut(hash) {
            if pos < data.len() {
                data.remove_at(pos);
            }
        }
    }

    // Ranges

    pub fn range_new(&mut self, begin: Value, end: Value, exclusive: bool) -> Value {
        let class = self.builtins.range;
        let body = ObjBody::Range(RangeData { begin, end, exclusive });
        Value::Obj(self.alloc(HeapObject::new(class, body)))
    }

    pub fn range_data(&mut self, range: Value) -> VmResult<RangeData> {
        self.expect_type(range, ValueType::Range)?;
        match self.body(range) {
            Some(ObjBody::Range(data)) => Ok(*data),
            _ => unreachable!("type checked above"),
        }
    }

    /// Resolves `range` against a sequence of `len` elements into
    /// `(begin, length)`. With `trunc` the end is clamped to `len`.
    ///
    /// A `nil` begin reads as 0; a `nil` end reads as the inclusive last
    /// element whatever the range's own exclusive flag says.
    pub fn range_beg_len(&mut self, range: Value, len: i64, trunc: bool) -> VmResult<(i64, i64)> {
        let data = self.range_data(range)?;
        let (exclusive, end) = match data.end {
            Value::Nil => (false, Some(-1)),
            other => (data.exclusive, other.as_int()),
        };
        let beg = match data.begin {
            Value::Nil => Some(0),
            other => other.as_int(),
        };
        let (Some(mut beg), Some(mut end)) = (beg, end) else {
            return Err(self.type_error("no implicit conversion into Integer"));
        };
        let out_of_range = |vm: &mut Vm| -> VmResult<(i64, i64)> {
            let desc = vm.inspect(range);
            Err(vm.range_error(format!("{desc} out of range")))
        };
        if beg < 0 {
            match beg.checked_add(len) {
                Some(b) if b >= 0 => beg = b,
                _ => return out_of_range(self),
            }
        }
        if trunc {
            if beg > len {
                return out_of_range(self);
            }
            if end > len {
                end = len;
            }
        }
        if end < 0 {
            end = end.saturating_add(len);
        }
        if !exclusive && (!trunc || end < len) {
            let Some(e) = end.checked_add(1) else {
                return out_of_range(self);
            };
            end = e;
        }
        Ok((beg, end.saturating_sub(beg).max(0)))
    }

    /// Short human-readable rendering used in error messages.
    pub fn inspect(&self, value: Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Sym(s) => format!(":{}", self.sym_name(s)),
            Value::Undef => "undef".to_string(),
            Value::Obj(id) => match self.heap.get(id).map(|o| &o.body) {
                None => format!("#<dead {id}>"),
                Some(ObjBody::String(bytes)) => format!("{:?}", String::from_utf8_lossy(bytes)),
                Some(ObjBody::Class(_)) => self.class_name(id),
                Some(ObjBody::Range(r)) => {
                    let dots = if r.exclusive { "..." } else { ".." };
                    format!("{}{dots}{}", self.inspect(r.begin), self.inspect(r.end))
                }
                Some(ObjBody::Array(items)) => {
                    let parts: Vec<String> = items.iter().map(|v| self.inspect(*v)).collect();
                    format!("[{}]", parts.join(", "))
                }
                Some(_) => format!("#<{}:{id}>", self.class_name(self.real_class_of(value))),
            },
        }
    }
}
