//! Bit-packed calling-convention descriptor for native methods.
//!
//! Layout (most significant first): required count `<<18`, optional count
//! `<<13`, rest flag bit 12, post count `<<7`, keyword count `<<2`,
//! keyword-dict flag bit 1, block flag bit 0. Counts are 5 bits wide.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Aspec(u32);

impl Aspec {
    /// Takes no arguments. Methods registered with this descriptor are
    /// marked no-arg.
    pub const fn none() -> Self {
        Aspec(0)
    }

    pub const fn req(n: u32) -> Self {
        Aspec((n & 0x1f) << 18)
    }

    pub const fn opt(n: u32) -> Self {
        Aspec((n & 0x1f) << 13)
    }

    pub const fn arg(req: u32, opt: u32) -> Self {
        Aspec(Self::req(req).0 | Self::opt(opt).0)
    }

    pub const fn rest() -> Self {
        Aspec(1 << 12)
    }

    pub const fn post(n: u32) -> Self {
        Aspec((n & 0x1f) << 7)
    }

    pub const fn key(n: u32, kdict: bool) -> Self {
        Aspec(((n & 0x1f) << 2) | if kdict { 1 << 1 } else { 0 })
    }

    pub const fn block() -> Self {
        Aspec(1)
    }

    /// Any number of arguments.
    pub const fn any() -> Self {
        Self::rest()
    }

    pub const fn from_bits(bits: u32) -> Self {
        Aspec(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn with(self, other: Aspec) -> Self {
        Aspec(self.0 | other.0)
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    pub const fn required(self) -> u32 {
        (self.0 >> 18) & 0x1f
    }

    pub const fn optional(self) -> u32 {
        (self.0 >> 13) & 0x1f
    }

    pub const fn has_rest(self) -> bool {
        self.0 & (1 << 12) != 0
    }

    pub const fn post_count(self) -> u32 {
        (self.0 >> 7) & 0x1f
    }

    pub const fn key_count(self) -> u32 {
        (self.0 >> 2) & 0x1f
    }

    pub const fn has_kdict(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    pub const fn has_block(self) -> bool {
        self.0 & 1 != 0
    }

    /// Whether `argc` positional arguments satisfy this descriptor.
    pub fn accepts(self, argc: usize) -> bool {
        let min = (self.required() + self.post_count()) as usize;
        if argc < min {
            return false;
        }
        self.has_rest() || argc <= min + self.optional() as usize
    }
}

impl std::ops::BitOr for Aspec {
    type Output = Aspec;

    fn bitor(self, rhs: Aspec) -> Aspec {
        self.with(rhs)
    }
}

impl fmt::Debug for Aspec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aspec")
            .field("req", &self.required())
            .field("opt", &self.optional())
            .field("rest", &self.has_rest())
            .field("post", &self.post_count())
            .field("key", &self.key_count())
            .field("block", &self.has_block())
            .finish()
    }
}
