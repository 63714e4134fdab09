//! Control and Status Registers.
//!
//! Part of the "Zicsr" extension. Only a counter and a scratch register are modelled; every other
//! CSR address reads as zero and ignores writes.

/// General 12-bit value representing a CSR specifier. Note that this can hold any 12-bit value,
/// even if the value represents an unsupported or non-existent CSR.
pub type CsrSpecifier = u16;

pub mod specifier {
    //! Specifiers of the modelled CSRs.

    use super::CsrSpecifier;

    /// Machine scratch register.
    pub const MSCRATCH: CsrSpecifier = 0x340;
    /// Machine cycle counter.
    pub const MCYCLE: CsrSpecifier = 0xB00;
    /// Timer, aliased to [`MCYCLE`].
    pub const MTIME: CsrSpecifier = 0xB01;
    /// Machine instructions-retired counter, aliased to [`MCYCLE`].
    pub const MINSTRET: CsrSpecifier = 0xB02;
}

/// The read-modify-write operation a CSR instruction performs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteOp {
    /// Replace the CSR with the given value (`csrrw`, `csrrwi`).
    Write,
    /// Set the bits of the given mask (`csrrs`, `csrrsi`).
    Set,
    /// Clear the bits of the given mask (`csrrc`, `csrrci`).
    Clear,
}

/// Control and Status Registers for a single hart.
///
/// A single free-running counter serves as cycle counter, timer, and instructions-retired
/// counter, since every step retires exactly one instruction in exactly one cycle.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct CsRegisters {
    mcycle: u32,
    mscratch: u32,
}

impl CsRegisters {
    /// Creates a fresh collection of registers initialized to their reset values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force all Control and Status registers to their reset state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read the value of a CSR by its specifier, performing any side effects of the read.
    ///
    /// None of the modelled CSRs have read side effects at this point, so this is equivalent to
    /// [`read_pure`](Self::read_pure).
    pub fn read(&mut self, specifier: CsrSpecifier) -> u32 {
        self.read_pure(specifier)
    }

    /// Read the value of a CSR by its specifier without any side effects.
    pub fn read_pure(&self, specifier: CsrSpecifier) -> u32 {
        match specifier {
            specifier::MCYCLE | specifier::MTIME | specifier::MINSTRET => self.mcycle,
            specifier::MSCRATCH => self.mscratch,
            _ => 0,
        }
    }

    /// Perform a write to a CSR, combining `value` with its current value according to `op`.
    ///
    /// Writes to unsupported CSRs, as well as to the read-only aliases of the counter, are
    /// silently dropped.
    pub fn write(&mut self, specifier: CsrSpecifier, value: u32, op: WriteOp) {
        let value = match op {
            WriteOp::Write => value,
            WriteOp::Set => self.read_pure(specifier) | value,
            WriteOp::Clear => self.read_pure(specifier) & !value,
        };
        match specifier {
            specifier::MCYCLE => self.mcycle = value,
            specifier::MSCRATCH => self.mscratch = value,
            _ => {}
        }
    }

    /// Advance the counter by one. Must be called exactly once per executed instruction.
    pub fn step(&mut self) {
        self.mcycle = self.mcycle.wrapping_add(1);
    }

    /// Returns the current value of the cycle counter.
    pub fn cycle(&self) -> u32 {
        self.mcycle
    }
}

#[cfg(test)]
mod tests {
    use super::specifier::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_counter_aliases() {
        let mut csrs = CsRegisters::new();
        for _ in 0..5 {
            csrs.step();
        }
        assert_eq!(5, csrs.read(MCYCLE));
        assert_eq!(5, csrs.read(MTIME));
        assert_eq!(5, csrs.read(MINSTRET));
        assert_eq!(5, csrs.cycle());
    }

    #[test]
    fn test_unsupported_reads_zero_and_ignores_writes() {
        let mut csrs = CsRegisters::new();
        csrs.write(0x305, 0xFFFF_FFFF, WriteOp::Write);
        assert_eq!(0, csrs.read(0x305));
        assert_eq!(CsRegisters::new(), csrs);
    }

    #[test]
    fn test_write_ops() {
        let mut csrs = CsRegisters::new();
        csrs.write(MSCRATCH, 0b1010, WriteOp::Write);
        assert_eq!(0b1010, csrs.read(MSCRATCH));
        csrs.write(MSCRATCH, 0b0101, WriteOp::Set);
        assert_eq!(0b1111, csrs.read(MSCRATCH));
        csrs.write(MSCRATCH, 0b0110, WriteOp::Clear);
        assert_eq!(0b1001, csrs.read(MSCRATCH));
    }

    #[test]
    fn test_counter_write_and_aliases_read_only() {
        let mut csrs = CsRegisters::new();
        csrs.write(MCYCLE, 100, WriteOp::Write);
        csrs.step();
        assert_eq!(101, csrs.read(MINSTRET));
        csrs.write(MTIME, 0, WriteOp::Write);
        csrs.write(MINSTRET, 0, WriteOp::Clear);
        assert_eq!(101, csrs.read(MCYCLE));
    }

    #[test]
    fn test_counter_wraps() {
        let mut csrs = CsRegisters::new();
        csrs.write(MCYCLE, u32::MAX, WriteOp::Write);
        csrs.step();
        assert_eq!(0, csrs.cycle());
    }

    proptest! {
        #[test]
        fn counter_counts_steps(n in 0u32..2000) {
            let mut csrs = CsRegisters::new();
            for _ in 0..n {
                csrs.step();
            }
            prop_assert_eq!(n, csrs.read(MCYCLE));
            prop_assert_eq!(n, csrs.read_pure(MINSTRET));
        }
    }
}
