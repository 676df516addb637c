use serde::Deserialize;

/// Tunables applied when a [`crate::vm::Vm`] is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Initial reservation of the GC root arena.
    pub arena_capacity: usize,
    /// Nested calls deeper than this raise `SystemStackError`.
    pub max_call_depth: usize,
    /// Upper bound on positional arguments accepted by `funcall`.
    pub funcall_argc_max: usize,
    /// Arrays never grow past this many elements.
    pub max_array_len: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 100,
            max_call_depth: 512,
            funcall_argc_max: 16,
            max_array_len: 131_072,
        }
    }
}

impl VmConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        toml::from_str::<VmConfig>(input).map_err(|e| anyhow::anyhow!(e))
    }

    pub fn with_arena_capacity(mut self, capacity: usize) -> Self {
        self.arena_capacity = capacity;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    pub fn with_funcall_argc_max(mut self, argc: usize) -> Self {
        self.funcall_argc_max = argc;
        self
    }

    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }
}
