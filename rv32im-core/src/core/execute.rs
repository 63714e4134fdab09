use super::{ExecutionResult, Writeback};
use crate::bus::{BusError, Memory};
use crate::csr::{CsRegisters, CsrSpecifier, WriteOp};
use crate::immediate::sext;
use crate::instruction::CsrSource;
use crate::registers::{Registers, Specifier};

/// Executes single instructions against the state of a hart as it was at the start of the step.
///
/// Register and `pc` updates are never applied directly; they are returned as a [`Writeback`] for
/// the caller to commit. Memory and CSR accesses take effect immediately.
#[derive(Debug)]
pub(super) struct Executor<'a, M: Memory + ?Sized> {
    pub registers: &'a Registers,
    pub cs_registers: &'a mut CsRegisters,
    pub memory: &'a mut M,
}

impl<'a, M: Memory + ?Sized> Executor<'a, M> {
    /// Executes an `addi` instruction.
    ///
    /// Corresponds to the assembly instruction `addi dest src immediate`.
    ///
    /// > ADDI adds the sign-extended 12-bit immediate to register rs1. Arithmetic overflow is
    /// > ignored and the result is simply the low XLEN bits of the result. ADDI rd, rs1, 0 is used
    /// > to implement the MV rd, rs1 assembler pseudoinstruction.
    pub fn addi(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| s.wrapping_add(imm))
    }

    /// Executes a `slti` instruction.
    ///
    /// Corresponds to the assembly instruction `slti dest src immediate`.
    ///
    /// > SLTI (set less than immediate) places the value 1 in register rd if register rs1 is less
    /// > than the sign-extended immediate when both are treated as signed numbers, else 0 is
    /// > written to rd.
    pub fn slti(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| ((s as i32) < (imm as i32)) as u32)
    }

    /// Executes a `sltiu` instruction.
    ///
    /// Corresponds to the assembly instruction `sltiu dest src immediate`.
    ///
    /// > SLTIU is similar but compares the values as unsigned numbers (i.e., the immediate is
    /// > first sign-extended to XLEN bits then treated as an unsigned number).
    pub fn sltiu(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| (s < imm) as u32)
    }

    /// Executes an `andi` instruction.
    ///
    /// > ANDI, ORI, XORI are logical operations that perform bitwise AND, OR, and XOR on register
    /// > rs1 and the sign-extended 12-bit immediate and place the result in rd.
    pub fn andi(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| s & imm)
    }

    /// Executes an `ori` instruction. See [`andi`](Self::andi).
    pub fn ori(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| s | imm)
    }

    /// Executes a `xori` instruction. See [`andi`](Self::andi).
    pub fn xori(&mut self, dest: Specifier, src: Specifier, immediate: u32) -> ExecutionResult {
        self.reg_imm_op(dest, src, immediate, |s, imm| s ^ imm)
    }

    /// Executes a `slli` instruction.
    ///
    /// > SLLI is a logical left shift (zeros are shifted into the lower bits).
    pub fn slli(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s << shamt)
    }

    /// Executes a `srli` instruction.
    ///
    /// > SRLI is a logical right shift (zeros are shifted into the upper bits).
    pub fn srli(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s >> shamt)
    }

    /// Executes a `srai` instruction.
    ///
    /// > SRAI is an arithmetic right shift (the original sign bit is copied into the vacated upper
    /// > bits).
    pub fn srai(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| {
            ((s as i32) >> shamt) as u32
        })
    }

    /// Executes a `lui` instruction.
    ///
    /// > LUI places the U-immediate value in the top 20 bits of the destination register rd,
    /// > filling in the lowest 12 bits with zeros.
    pub fn lui(&mut self, dest: Specifier, immediate: u32) -> ExecutionResult {
        Ok(Writeback::register(dest, immediate & !0xFFF))
    }

    /// Executes an `auipc` instruction.
    ///
    /// > AUIPC forms a 32-bit offset from the 20-bit U-immediate, filling in the lowest 12 bits
    /// > with zeros, adds this offset to the address of the AUIPC instruction, then places the
    /// > result in register rd.
    pub fn auipc(&mut self, dest: Specifier, immediate: u32) -> ExecutionResult {
        let result = self.registers.pc().wrapping_add(immediate & !0xFFF);
        Ok(Writeback::register(dest, result))
    }

    pub fn add(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_add(s2))
    }

    pub fn sub(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_sub(s2))
    }

    /// Executes a `slt` instruction.
    ///
    /// > SLT and SLTU perform signed and unsigned compares respectively, writing 1 to rd if
    /// > rs1 < rs2, 0 otherwise.
    pub fn slt(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32) < (s2 as i32)) as u32
        })
    }

    /// Executes a `sltu` instruction. See [`slt`](Self::slt).
    pub fn sltu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 < s2) as u32)
    }

    pub fn and(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 & s2)
    }

    pub fn or(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 | s2)
    }

    pub fn xor(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 ^ s2)
    }

    /// Executes a `sll` instruction.
    ///
    /// > SLL, SRL, and SRA perform logical left, logical right, and arithmetic right shifts on the
    /// > value in register rs1 by the shift amount held in the lower 5 bits of register rs2.
    pub fn sll(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 << (s2 & 0x1F))
    }

    /// Executes a `srl` instruction. See [`sll`](Self::sll).
    pub fn srl(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 >> (s2 & 0x1F))
    }

    /// Executes a `sra` instruction. See [`sll`](Self::sll).
    pub fn sra(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32) >> (s2 & 0x1F)) as u32
        })
    }

    /// Executes a `mul` instruction.
    ///
    /// > MUL performs an XLEN-bit×XLEN-bit multiplication of rs1 by rs2 and places the lower XLEN
    /// > bits in the destination register.
    pub fn mul(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_mul(s2))
    }

    /// Executes a `mulh` instruction.
    ///
    /// > MULH, MULHU, and MULHSU perform the same multiplication but return the upper XLEN bits
    /// > of the full 2×XLEN-bit product, for signed×signed, unsigned×unsigned, and
    /// > signed rs1×unsigned rs2 multiplication, respectively.
    pub fn mulh(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, mulh)
    }

    /// Executes a `mulhsu` instruction. See [`mulh`](Self::mulh).
    pub fn mulhsu(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    ) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, mulhsu)
    }

    /// Executes a `mulhu` instruction. See [`mulh`](Self::mulh).
    pub fn mulhu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, mulhu)
    }

    /// Executes a `div` instruction.
    ///
    /// > DIV and DIVU perform an XLEN bits by XLEN bits signed and unsigned integer division of
    /// > rs1 by rs2, rounding towards zero.
    pub fn div(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, div)
    }

    /// Executes a `divu` instruction. See [`div`](Self::div).
    pub fn divu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, divu)
    }

    /// Executes a `rem` instruction.
    ///
    /// > REM and REMU provide the remainder of the corresponding division operation. For REM, the
    /// > sign of a nonzero result equals the sign of the dividend.
    pub fn rem(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, rem)
    }

    /// Executes a `remu` instruction. See [`rem`](Self::rem).
    pub fn remu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        self.reg_reg_op(dest, src1, src2, remu)
    }

    /// Executes a `jal` instruction.
    ///
    /// Stores the address of the next instruction in `dest` and jumps `offset` bytes relative to
    /// the current `pc`. The target is not checked for alignment.
    pub fn jal(&mut self, dest: Specifier, offset: u32) -> ExecutionResult {
        let target = self.registers.pc().wrapping_add(offset);
        self.jump_op(dest, target)
    }

    /// Executes a `jalr` instruction.
    ///
    /// > The target address is obtained by adding the sign-extended 12-bit I-immediate to the
    /// > register rs1, then setting the least-significant bit of the result to zero.
    pub fn jalr(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        let target = self.registers.x(base).wrapping_add(offset) & !1;
        self.jump_op(dest, target)
    }

    pub fn beq(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| s1 == s2)
    }

    pub fn bne(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| s1 != s2)
    }

    pub fn blt(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| (s1 as i32) < (s2 as i32))
    }

    pub fn bltu(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| s1 < s2)
    }

    pub fn bge(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| (s1 as i32) >= (s2 as i32))
    }

    pub fn bgeu(&mut self, src1: Specifier, src2: Specifier, offset: u32) -> ExecutionResult {
        self.cond_branch(src1, src2, offset, |s1, s2| s1 >= s2)
    }

    pub fn lb(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.load_op(dest, base, offset, |memory, address| {
            memory.read_u8(address).map(|value| sext(value as u32, 7))
        })
    }

    pub fn lbu(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.load_op(dest, base, offset, |memory, address| {
            memory.read_u8(address).map(u32::from)
        })
    }

    pub fn lh(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.load_op(dest, base, offset, |memory, address| {
            memory.read_u16(address).map(|value| sext(value as u32, 15))
        })
    }

    pub fn lhu(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.load_op(dest, base, offset, |memory, address| {
            memory.read_u16(address).map(u32::from)
        })
    }

    pub fn lw(&mut self, dest: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.load_op(dest, base, offset, |memory, address| memory.read_u32(address))
    }

    pub fn sb(&mut self, src: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.store_op(src, base, offset, |memory, address, value| {
            memory.write_u8(address, value as u8)
        })
    }

    pub fn sh(&mut self, src: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.store_op(src, base, offset, |memory, address, value| {
            memory.write_u16(address, value as u16)
        })
    }

    pub fn sw(&mut self, src: Specifier, base: Specifier, offset: u32) -> ExecutionResult {
        self.store_op(src, base, offset, |memory, address, value| {
            memory.write_u32(address, value)
        })
    }

    /// Executes one of the six Zicsr instructions.
    ///
    /// The CSR is only read (and `dest` written) if `op` is not a plain write or `dest` is not
    /// `x0`. The CSR is only written if `op` is not a plain write or the `rs1` field of `source`
    /// is nonzero.
    pub fn csr(
        &mut self,
        op: WriteOp,
        dest: Specifier,
        source: CsrSource,
        csr: CsrSpecifier,
    ) -> ExecutionResult {
        let mut writeback = Writeback::default();
        if op != WriteOp::Write || dest != Specifier::X0 {
            writeback.register = Some((dest, self.cs_registers.read(csr)));
        }
        if op != WriteOp::Write || !source.is_zero_field() {
            let value = match source {
                CsrSource::Register(src) => self.registers.x(src),
                CsrSource::Immediate(uimm) => uimm,
            };
            self.cs_registers.write(csr, value, op);
        }
        Ok(writeback)
    }

    #[inline]
    fn reg_imm_op<F>(
        &mut self,
        dest: Specifier,
        src: Specifier,
        immediate: u32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, u32) -> u32,
    {
        Ok(Writeback::register(dest, op(self.registers.x(src), immediate)))
    }

    #[inline]
    fn reg_shamt_op<F>(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, u32) -> u32,
    {
        // Decoding guarantees a 5-bit shift amount
        debug_assert!(shift_amount_u5 <= 31);
        Ok(Writeback::register(
            dest,
            op(self.registers.x(src), shift_amount_u5 & 0x1F),
        ))
    }

    #[inline]
    fn reg_reg_op<F>(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, u32) -> u32,
    {
        let result = op(self.registers.x(src1), self.registers.x(src2));
        Ok(Writeback::register(dest, result))
    }

    fn jump_op(&mut self, dest: Specifier, target: u32) -> ExecutionResult {
        Ok(Writeback {
            register: Some((dest, self.registers.pc().wrapping_add(4))),
            pc: Some(target),
        })
    }

    // Takes the branch if `predicate` returns `true`.
    fn cond_branch<P>(
        &mut self,
        src1: Specifier,
        src2: Specifier,
        offset: u32,
        predicate: P,
    ) -> ExecutionResult
    where
        P: FnOnce(u32, u32) -> bool,
    {
        if predicate(self.registers.x(src1), self.registers.x(src2)) {
            Ok(Writeback::jump(self.registers.pc().wrapping_add(offset)))
        } else {
            Ok(Writeback::default())
        }
    }

    #[inline]
    fn load_op<F>(&mut self, dest: Specifier, base: Specifier, offset: u32, op: F) -> ExecutionResult
    where
        F: FnOnce(&mut M, u32) -> Result<u32, BusError>,
    {
        let address = self.registers.x(base).wrapping_add(offset);
        let value = op(&mut *self.memory, address)?;
        Ok(Writeback::register(dest, value))
    }

    #[inline]
    fn store_op<F>(&mut self, src: Specifier, base: Specifier, offset: u32, op: F) -> ExecutionResult
    where
        F: FnOnce(&mut M, u32, u32) -> Result<(), BusError>,
    {
        let address = self.registers.x(base).wrapping_add(offset);
        op(&mut *self.memory, address, self.registers.x(src))?;
        Ok(Writeback::default())
    }
}

/// Upper half of the signed×signed product.
fn mulh(s1: u32, s2: u32) -> u32 {
    ((s1 as i32 as i64 * s2 as i32 as i64) >> 32) as u32
}

/// Upper half of the signed×unsigned product.
fn mulhsu(s1: u32, s2: u32) -> u32 {
    ((s1 as i32 as i64).wrapping_mul(s2 as i64) >> 32) as u32
}

/// Upper half of the unsigned×unsigned product.
fn mulhu(s1: u32, s2: u32) -> u32 {
    ((s1 as u64 * s2 as u64) >> 32) as u32
}

/// Signed division, rounding towards zero.
///
/// Division by zero yields all ones, and `i32::MIN / -1` yields the dividend.
fn div(dividend: u32, divisor: u32) -> u32 {
    match divisor as i32 {
        0 => u32::MAX,
        // Also covers the overflow case, since `i32::MIN.wrapping_neg() == i32::MIN`
        -1 => dividend.wrapping_neg(),
        divisor => ((dividend as i32) / divisor) as u32,
    }
}

/// Unsigned division. Division by zero yields all ones.
fn divu(dividend: u32, divisor: u32) -> u32 {
    dividend.checked_div(divisor).unwrap_or(u32::MAX)
}

/// Signed remainder, with the sign of the dividend.
///
/// The remainder of a division by zero is the dividend, and `i32::MIN % -1` is `0`.
fn rem(dividend: u32, divisor: u32) -> u32 {
    match divisor as i32 {
        0 => dividend,
        -1 => 0,
        divisor => ((dividend as i32) % divisor) as u32,
    }
}

/// Unsigned remainder. The remainder of a division by zero is the dividend.
fn remu(dividend: u32, divisor: u32) -> u32 {
    dividend.checked_rem(divisor).unwrap_or(dividend)
}
