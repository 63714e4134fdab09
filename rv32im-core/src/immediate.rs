//! Immediate operand extraction for the I, S, U, B, and J instruction formats.
//!
//! All functions return the immediate as an unsigned word holding its two's complement
//! representation, so it can be combined with register values using wrapping arithmetic.

use crate::registers::XLEN;

/// Sign-extend `bits`, treating bit `sign_bit` as the sign bit.
///
/// All bits above `sign_bit` are replaced by copies of it. This is a no-op when `sign_bit` is the
/// most significant bit of the word (or beyond).
pub fn sext(bits: u32, sign_bit: u32) -> u32 {
    if sign_bit >= XLEN - 1 {
        return bits;
    }
    let unused = XLEN - 1 - sign_bit;
    (((bits << unused) as i32) >> unused) as u32
}

/// Returns the 12-bit I-immediate (`inst[31:20]`) sign-extended to 32 bits.
pub fn imm_i(raw_instruction: u32) -> u32 {
    sext(raw_instruction >> 20, 11)
}

/// Returns the 12-bit S-immediate (`inst[31:25] ++ inst[11:7]`) sign-extended to 32 bits.
pub fn imm_s(raw_instruction: u32) -> u32 {
    let imm_11_5 = (raw_instruction >> 25) & 0x7F;
    let imm_4_0 = (raw_instruction >> 7) & 0x1F;
    sext(imm_11_5 << 5 | imm_4_0, 11)
}

/// Returns the U-immediate: `inst[31:12]` in the upper 20 bits, lower 12 bits zero.
pub fn imm_u(raw_instruction: u32) -> u32 {
    raw_instruction & 0xFFFF_F000
}

/// Returns the 13-bit B-immediate sign-extended to 32 bits. Bit 0 is always zero.
pub fn imm_b(raw_instruction: u32) -> u32 {
    let imm_12 = (raw_instruction >> 31) & 0x1;
    let imm_11 = (raw_instruction >> 7) & 0x1;
    let imm_10_5 = (raw_instruction >> 25) & 0x3F;
    let imm_4_1 = (raw_instruction >> 8) & 0xF;
    sext(imm_12 << 12 | imm_11 << 11 | imm_10_5 << 5 | imm_4_1 << 1, 12)
}

/// Returns the 21-bit J-immediate sign-extended to 32 bits. Bit 0 is always zero.
pub fn imm_j(raw_instruction: u32) -> u32 {
    let imm_20 = (raw_instruction >> 31) & 0x1;
    let imm_19_12 = (raw_instruction >> 12) & 0xFF;
    let imm_11 = (raw_instruction >> 20) & 0x1;
    let imm_10_1 = (raw_instruction >> 21) & 0x3FF;
    sext(imm_20 << 20 | imm_19_12 << 12 | imm_11 << 11 | imm_10_1 << 1, 20)
}
