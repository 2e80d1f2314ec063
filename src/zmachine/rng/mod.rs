//! Random numbers for the `random` opcode
use core::fmt;

pub mod chacha_rng;

/// Generator injected into a [ZMachine](crate::zmachine::ZMachine)
pub trait ZRng {
    /// Name for debug output
    fn type_name(&self) -> &str;

    /// Switch to a predictable sequence for `seed`, or back to entropy when `seed` is 0
    fn seed(&mut self, seed: u16);

    /// Next value in `1..=range`; a `range` of 0 is treated as 1
    fn random(&mut self, range: u16) -> u16;
}

impl fmt::Debug for dyn ZRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
