//! Minimal instruction encoder for building test programs.

use crate::bus::Memory;
use crate::resources::ram::Ram;

pub const LOAD: u32 = 0b00_000_11;
pub const OP_IMM: u32 = 0b00_100_11;
pub const AUIPC: u32 = 0b00_101_11;
pub const STORE: u32 = 0b01_000_11;
pub const OP: u32 = 0b01_100_11;
pub const LUI: u32 = 0b01_101_11;
pub const BRANCH: u32 = 0b11_000_11;
pub const JALR: u32 = 0b11_001_11;
pub const JAL: u32 = 0b11_011_11;
pub const SYSTEM: u32 = 0b11_100_11;

pub fn r_type(opcode: u32, funct3: u32, funct7: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    funct7 << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

pub fn i_type(opcode: u32, funct3: u32, rd: u32, rs1: u32, imm: i32) -> u32 {
    (imm as u32 & 0xFFF) << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | opcode
}

pub fn s_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    (imm >> 5 & 0x7F) << 25 | rs2 << 20 | rs1 << 15 | funct3 << 12 | (imm & 0x1F) << 7 | STORE
}

pub fn b_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    (imm >> 12 & 0x1) << 31
        | (imm >> 5 & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | funct3 << 12
        | (imm >> 1 & 0xF) << 8
        | (imm >> 11 & 0x1) << 7
        | BRANCH
}

pub fn u_type(opcode: u32, rd: u32, imm: u32) -> u32 {
    imm & 0xFFFF_F000 | rd << 7 | opcode
}

pub fn j_type(rd: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    (imm >> 20 & 0x1) << 31
        | (imm >> 1 & 0x3FF) << 21
        | (imm >> 11 & 0x1) << 20
        | (imm >> 12 & 0xFF) << 12
        | rd << 7
        | JAL
}

pub fn csr_type(funct3: u32, rd: u32, rs1: u32, csr: u32) -> u32 {
    csr << 20 | rs1 << 15 | funct3 << 12 | rd << 7 | SYSTEM
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(OP_IMM, 0b000, rd, rs1, imm)
}

pub fn lui(rd: u32, imm: u32) -> u32 {
    u_type(LUI, rd, imm)
}

pub fn lw(rd: u32, base: u32, offset: i32) -> u32 {
    i_type(LOAD, 0b010, rd, base, offset)
}

pub fn sw(src: u32, base: u32, offset: i32) -> u32 {
    s_type(0b010, base, src, offset)
}

pub fn beq(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b000, rs1, rs2, offset)
}

pub fn csrrw(rd: u32, rs1: u32, csr: u32) -> u32 {
    csr_type(0b001, rd, rs1, csr)
}

pub fn csrrs(rd: u32, rs1: u32, csr: u32) -> u32 {
    csr_type(0b010, rd, rs1, csr)
}

/// Returns a RAM of `size` bytes holding `program` at `base`.
pub fn ram_with_program(size: usize, base: u32, program: &[u32]) -> Ram {
    let mut ram = Ram::new(size).unwrap();
    for (i, &instruction) in program.iter().enumerate() {
        ram.write_u32(base + 4 * i as u32, instruction).unwrap();
    }
    ram
}

#[test]
fn test_encoder_round_trips_through_immediates() {
    use crate::immediate::{imm_b, imm_i, imm_j, imm_s, imm_u};
    assert_eq!(-5_i32 as u32, imm_i(addi(1, 2, -5)));
    assert_eq!(-100_i32 as u32, imm_s(sw(1, 2, -100)));
    assert_eq!(-4096_i32 as u32, imm_b(beq(1, 2, -4096)));
    assert_eq!(4094, imm_b(beq(1, 2, 4094)));
    assert_eq!(-2_i32 as u32, imm_j(j_type(1, -2)));
    assert_eq!(0x000F_FFFE, imm_j(j_type(1, 0x000F_FFFE)));
    assert_eq!(0xABCD_E000, imm_u(lui(1, 0xABCD_E123)));
}
