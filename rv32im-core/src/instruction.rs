use crate::csr::{CsrSpecifier, WriteOp};
use crate::immediate::{imm_b, imm_i, imm_j, imm_s, imm_u};
use crate::registers::Specifier;
use bitvec::field::BitField;
use bitvec::order::Lsb0;
use bitvec::view::BitView;
use std::ops::Range;
use thiserror::Error;

/// Data structure that can hold any supported RV32IM instruction in its decoded form.
///
/// Immediates are stored sign-extended to 32 bits, as unsigned words.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    OpImm {
        op: RegImmOp,
        dest: Specifier,
        src: Specifier,
        immediate: u32,
    },
    OpShiftImm {
        op: RegShiftImmOp,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    },
    Auipc {
        dest: Specifier,
        immediate: u32,
    },
    Lui {
        dest: Specifier,
        immediate: u32,
    },
    Op {
        op: RegRegOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    },
    Jal {
        dest: Specifier,
        offset: u32,
    },
    Jalr {
        dest: Specifier,
        base: Specifier,
        offset: u32,
    },
    Branch {
        condition: BranchCondition,
        src1: Specifier,
        src2: Specifier,
        offset: u32,
    },
    Load {
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        offset: u32,
    },
    Store {
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        offset: u32,
    },
    Csr {
        op: WriteOp,
        dest: Specifier,
        source: CsrSource,
        csr: CsrSpecifier,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegImmOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegShiftImmOp {
    Slli,
    Srli,
    Srai,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegRegOp {
    Add,
    Slt,
    Sltu,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sub,
    Sra,
    // "M" extension
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BranchCondition {
    Beq,
    Bne,
    Blt,
    Bltu,
    Bge,
    Bgeu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadWidth {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StoreWidth {
    Sb,
    Sh,
    Sw,
}

/// Where a CSR instruction takes its write operand from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CsrSource {
    /// `csrrw`, `csrrs`, `csrrc`: the value of a register.
    Register(Specifier),
    /// `csrrwi`, `csrrsi`, `csrrci`: the 5-bit `rs1` field, zero-extended.
    Immediate(u32),
}

impl CsrSource {
    /// Returns `true` if the `rs1` field of the instruction was zero, i.e. the source is either
    /// register `x0` or the immediate `0`.
    pub fn is_zero_field(self) -> bool {
        match self {
            Self::Register(src) => src == Specifier::X0,
            Self::Immediate(uimm) => uimm == 0,
        }
    }
}

impl Instruction {
    pub fn decode(raw_instruction: u32) -> Result<Self, DecodeError> {
        let illegal = || DecodeError::IllegalInstruction {
            funct3: funct3(raw_instruction),
            funct7: funct7(raw_instruction),
        };
        match opcode(raw_instruction)? {
            Opcode::OpImm => match i_funct(raw_instruction) {
                Some(op) => Ok(Self::OpImm {
                    op,
                    dest: rd(raw_instruction),
                    src: rs1(raw_instruction),
                    immediate: imm_i(raw_instruction),
                }),
                None => match i_shfunct(raw_instruction) {
                    Some(op) => Ok(Self::OpShiftImm {
                        op,
                        dest: rd(raw_instruction),
                        src: rs1(raw_instruction),
                        // The rs2 field doubles as shift amount
                        shift_amount_u5: u32::from(rs2(raw_instruction)),
                    }),
                    None => Err(illegal()),
                },
            },
            Opcode::Auipc => Ok(Self::Auipc {
                dest: rd(raw_instruction),
                immediate: imm_u(raw_instruction),
            }),
            Opcode::Lui => Ok(Self::Lui {
                dest: rd(raw_instruction),
                immediate: imm_u(raw_instruction),
            }),
            Opcode::Op => match r_funct(raw_instruction) {
                Some(op) => Ok(Self::Op {
                    op,
                    dest: rd(raw_instruction),
                    src1: rs1(raw_instruction),
                    src2: rs2(raw_instruction),
                }),
                None => Err(illegal()),
            },
            Opcode::Jal => Ok(Self::Jal {
                dest: rd(raw_instruction),
                offset: imm_j(raw_instruction),
            }),
            Opcode::Jalr => Ok(Self::Jalr {
                dest: rd(raw_instruction),
                base: rs1(raw_instruction),
                offset: imm_i(raw_instruction),
            }),
            Opcode::Branch => match b_funct(raw_instruction) {
                Some(condition) => Ok(Self::Branch {
                    condition,
                    src1: rs1(raw_instruction),
                    src2: rs2(raw_instruction),
                    offset: imm_b(raw_instruction),
                }),
                None => Err(illegal()),
            },
            Opcode::Load => match i_width(raw_instruction) {
                Some(width) => Ok(Self::Load {
                    width,
                    dest: rd(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: imm_i(raw_instruction),
                }),
                None => Err(illegal()),
            },
            Opcode::Store => match s_width(raw_instruction) {
                Some(width) => Ok(Self::Store {
                    width,
                    src: rs2(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: imm_s(raw_instruction),
                }),
                None => Err(illegal()),
            },
            Opcode::System => match csr_funct(raw_instruction) {
                Some((op, immediate_source)) => {
                    let rs1 = rs1(raw_instruction);
                    let source = if immediate_source {
                        CsrSource::Immediate(u32::from(rs1))
                    } else {
                        CsrSource::Register(rs1)
                    };
                    Ok(Self::Csr {
                        op,
                        dest: rd(raw_instruction),
                        source,
                        csr: csr(raw_instruction),
                    })
                }
                None => Err(illegal()),
            },
        }
    }
}

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// The opcode class (`inst[6:2]`) is not part of RV32IM, or is not modelled (e.g. `MISC-MEM`).
    #[error("instruction has unsupported opcode class {0:#07b}")]
    UnsupportedOpcode(u8),
    /// The opcode class is supported, but the function fields do not name an instruction.
    #[error("illegal instruction (funct3 {funct3:#05b}, funct7 {funct7:#09b})")]
    IllegalInstruction { funct3: u8, funct7: u8 },
}

/// Extract the bit field `bits` (little-endian bit indices) from an instruction.
fn field(raw_instruction: u32, bits: Range<usize>) -> u32 {
    raw_instruction.view_bits::<Lsb0>()[bits].load_le::<u32>()
}

/// Returns the opcode class of the instruction, based on `inst[6:2]`.
///
/// The two low bits of the opcode are not inspected.
#[allow(clippy::unusual_byte_groupings)]
fn opcode(raw_instruction: u32) -> Result<Opcode, DecodeError> {
    let class = field(raw_instruction, 2..7) as u8;
    match class {
        0b00_000 => Ok(Opcode::Load),
        0b00_100 => Ok(Opcode::OpImm),
        0b00_101 => Ok(Opcode::Auipc),
        0b01_000 => Ok(Opcode::Store),
        0b01_100 => Ok(Opcode::Op),
        0b01_101 => Ok(Opcode::Lui),
        0b11_000 => Ok(Opcode::Branch),
        0b11_001 => Ok(Opcode::Jalr),
        0b11_011 => Ok(Opcode::Jal),
        0b11_100 => Ok(Opcode::System),
        // MISC-MEM (fence) and everything outside RV32IM
        _ => Err(DecodeError::UnsupportedOpcode(class)),
    }
}

/// Returns the 5-bit *rd* value for R-type, I-type, U-type, J-type instructions.
fn rd(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(field(raw_instruction, 7..12) as u8)
}

/// Returns the 5-bit *rs1* value for R-type, I-type, S-type, B-type instructions.
fn rs1(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(field(raw_instruction, 15..20) as u8)
}

/// Returns the 5-bit *rs2* value for R-type, S-type, B-type instructions.
fn rs2(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(field(raw_instruction, 20..25) as u8)
}

/// Returns the 3-bit *funct3* value for R-type, I-type, S-type, B-type instructions.
fn funct3(raw_instruction: u32) -> u8 {
    field(raw_instruction, 12..15) as u8
}

/// Returns the 7-bit *funct7* value for R-type instructions.
fn funct7(raw_instruction: u32) -> u8 {
    field(raw_instruction, 25..32) as u8
}

/// Returns the 12-bit CSR specifier of a SYSTEM instruction.
fn csr(raw_instruction: u32) -> CsrSpecifier {
    field(raw_instruction, 20..32) as CsrSpecifier
}

fn i_funct(raw_instruction: u32) -> Option<RegImmOp> {
    match funct3(raw_instruction) {
        0b000 => Some(RegImmOp::Addi),
        0b010 => Some(RegImmOp::Slti),
        0b011 => Some(RegImmOp::Sltiu),
        0b100 => Some(RegImmOp::Xori),
        0b110 => Some(RegImmOp::Ori),
        0b111 => Some(RegImmOp::Andi),
        _ => None,
    }
}

fn i_shfunct(raw_instruction: u32) -> Option<RegShiftImmOp> {
    match (funct7(raw_instruction), funct3(raw_instruction)) {
        (0b0000000, 0b001) => Some(RegShiftImmOp::Slli),
        (0b0000000, 0b101) => Some(RegShiftImmOp::Srli),
        (0b0100000, 0b101) => Some(RegShiftImmOp::Srai),
        _ => None,
    }
}

fn i_width(raw_instruction: u32) -> Option<LoadWidth> {
    match funct3(raw_instruction) {
        0b000 => Some(LoadWidth::Lb),
        0b001 => Some(LoadWidth::Lh),
        0b010 => Some(LoadWidth::Lw),
        0b100 => Some(LoadWidth::Lbu),
        0b101 => Some(LoadWidth::Lhu),
        _ => None,
    }
}

fn s_width(raw_instruction: u32) -> Option<StoreWidth> {
    match funct3(raw_instruction) {
        0b000 => Some(StoreWidth::Sb),
        0b001 => Some(StoreWidth::Sh),
        0b010 => Some(StoreWidth::Sw),
        _ => None,
    }
}

fn r_funct(raw_instruction: u32) -> Option<RegRegOp> {
    match (funct7(raw_instruction), funct3(raw_instruction)) {
        (0b0000000, 0b000) => Some(RegRegOp::Add),
        (0b0000000, 0b001) => Some(RegRegOp::Sll),
        (0b0000000, 0b010) => Some(RegRegOp::Slt),
        (0b0000000, 0b011) => Some(RegRegOp::Sltu),
        (0b0000000, 0b100) => Some(RegRegOp::Xor),
        (0b0000000, 0b101) => Some(RegRegOp::Srl),
        (0b0000000, 0b110) => Some(RegRegOp::Or),
        (0b0000000, 0b111) => Some(RegRegOp::And),
        (0b0100000, 0b000) => Some(RegRegOp::Sub),
        (0b0100000, 0b101) => Some(RegRegOp::Sra),
        (0b0000001, 0b000) => Some(RegRegOp::Mul),
        (0b0000001, 0b001) => Some(RegRegOp::Mulh),
        (0b0000001, 0b010) => Some(RegRegOp::Mulhsu),
        (0b0000001, 0b011) => Some(RegRegOp::Mulhu),
        (0b0000001, 0b100) => Some(RegRegOp::Div),
        (0b0000001, 0b101) => Some(RegRegOp::Divu),
        (0b0000001, 0b110) => Some(RegRegOp::Rem),
        (0b0000001, 0b111) => Some(RegRegOp::Remu),
        _ => None,
    }
}

fn b_funct(raw_instruction: u32) -> Option<BranchCondition> {
    match funct3(raw_instruction) {
        0b000 => Some(BranchCondition::Beq),
        0b001 => Some(BranchCondition::Bne),
        0b100 => Some(BranchCondition::Blt),
        0b101 => Some(BranchCondition::Bge),
        0b110 => Some(BranchCondition::Bltu),
        0b111 => Some(BranchCondition::Bgeu),
        _ => None,
    }
}

/// Returns the write operation of a CSR instruction, and whether its source is an immediate.
fn csr_funct(raw_instruction: u32) -> Option<(WriteOp, bool)> {
    match funct3(raw_instruction) {
        0b001 => Some((WriteOp::Write, false)),
        0b010 => Some((WriteOp::Set, false)),
        0b011 => Some((WriteOp::Clear, false)),
        0b101 => Some((WriteOp::Write, true)),
        0b110 => Some((WriteOp::Set, true)),
        0b111 => Some((WriteOp::Clear, true)),
        _ => None,
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Opcode {
    OpImm,
    Auipc,
    Lui,
    Op,
    Jal,
    Jalr,
    Branch,
    Load,
    Store,
    System,
}
