use std::sync::Arc;

use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};
use crate::value::Sym;

/// Symbol interner. Symbols are never freed for the lifetime of the VM.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    names: Vec<Arc<str>>,
    lookup: FastHashMap<Arc<str>, Sym>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            names: Vec::with_capacity(256),
            lookup: fast_hash_map_with_capacity(256),
        }
    }

    pub fn intern(&mut self, name: &str) -> Sym {
        if let Some(sym) = self.lookup.get(name) {
            return *sym;
        }
        let sym = Sym(self.names.len() as u32);
        let name: Arc<str> = Arc::from(name);
        self.names.push(name.clone());
        self.lookup.insert(name, sym);
        sym
    }

    /// Looks a name up without interning it.
    pub fn check(&self, name: &str) -> Option<Sym> {
        self.lookup.get(name).copied()
    }

    pub fn name(&self, sym: Sym) -> &str {
        self.names.get(sym.0 as usize).map(|n| n.as_ref()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
