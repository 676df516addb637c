use anyhow::{anyhow, bail};
use orb_core::{Value, ValueType, Vm};

/// Host value that can be materialised inside a VM.
pub trait IntoValue {
    fn into_value(self, vm: &mut Vm) -> Value;
}

/// Host value that can be read back out of a VM.
pub trait FromValue: Sized {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self>;
}

fn type_mismatch(vm: &Vm, expected: &str, value: Value) -> anyhow::Error {
    anyhow!("expected {expected}, got {}", vm.class_name(vm.real_class_of(value)))
}

impl IntoValue for Value {
    fn into_value(self, _vm: &mut Vm) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Nil
    }
}

impl IntoValue for bool {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Int(self as i64)
    }
}

impl IntoValue for usize {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Int(self as i64)
    }
}

impl IntoValue for f64 {
    fn into_value(self, _vm: &mut Vm) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for &str {
    fn into_value(self, vm: &mut Vm) -> Value {
        vm.str_new(self)
    }
}

impl IntoValue for String {
    fn into_value(self, vm: &mut Vm) -> Value {
        vm.str_new(&self)
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self, vm: &mut Vm) -> Value {
        match self {
            Some(v) => v.into_value(vm),
            None => Value::Nil,
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self, vm: &mut Vm) -> Value {
        let items: Vec<Value> = self.into_iter().map(|v| v.into_value(vm)).collect();
        vm.ary_new_from(&items)
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self, vm: &mut Vm) -> Value {
        match self {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => vm.str_new(&s),
            serde_json::Value::Array(items) => items.into_value(vm),
            serde_json::Value::Object(map) => {
                let hash = vm.hash_new();
                for (k, v) in map {
                    let key = vm.str_new(&k);
                    let value = v.into_value(vm);
                    // Fresh hash and string key: neither can be frozen.
                    let _ = vm.hash_set(hash, key, value);
                }
                hash
            }
        }
    }
}

impl FromValue for Value {
    fn from_value(_vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(_vm: &mut Vm, _value: Value) -> anyhow::Result<Self> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(type_mismatch(vm, "boolean", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        value.as_int().ok_or_else(|| type_mismatch(vm, "Integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        let i = i64::from_value(vm, value)?;
        i32::try_from(i).map_err(|_| anyhow!("integer {i} out of range for i32"))
    }
}

impl FromValue for usize {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        let i = i64::from_value(vm, value)?;
        usize::try_from(i).map_err(|_| anyhow!("integer {i} out of range for usize"))
    }
}

impl FromValue for f64 {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        value.as_float().ok_or_else(|| type_mismatch(vm, "Float", value))
    }
}

impl FromValue for String {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        match vm.type_of(value) {
            ValueType::String => Ok(vm.str_to_string(value)?),
            ValueType::Symbol => Ok(value.as_sym().map(|s| vm.sym_name(s).to_string()).unwrap_or_default()),
            _ => Err(type_mismatch(vm, "String", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        if value.is_nil() {
            return Ok(None);
        }
        T::from_value(vm, value).map(Some)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        if vm.type_of(value) != ValueType::Array {
            return Err(type_mismatch(vm, "Array", value));
        }
        let items = vm.ary_values(value)?;
        items.into_iter().map(|v| T::from_value(vm, v)).collect()
    }
}

impl FromValue for serde_json::Value {
    fn from_value(vm: &mut Vm, value: Value) -> anyhow::Result<Self> {
        Ok(match value {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| anyhow!("float {f} has no JSON representation"))?,
            Value::Sym(s) => serde_json::Value::String(vm.sym_name(s).to_string()),
            Value::Undef => bail!("undef has no JSON representation"),
            Value::Obj(_) => match vm.type_of(value) {
                ValueType::String => serde_json::Value::String(vm.str_to_string(value)?),
                ValueType::Array => serde_json::Value::Array(Vec::<serde_json::Value>::from_value(vm, value)?),
                ValueType::Hash => {
                    let mut map = serde_json::Map::new();
                    for (k, v) in vm.hash_entries(value)? {
                        let key = match vm.type_of(k) {
                            ValueType::String | ValueType::Symbol => String::from_value(vm, k)?,
                            ValueType::Integer => k.as_int().unwrap_or_default().to_string(),
                            other => bail!("hash key of type {other} cannot be a JSON object key"),
                        };
                        map.insert(key, serde_json::Value::from_value(vm, v)?);
                    }
                    serde_json::Value::Object(map)
                }
                other => bail!("{other} cannot be converted to JSON"),
            },
        })
    }
}
