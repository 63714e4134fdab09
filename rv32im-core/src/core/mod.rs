//! Provides a simulatable RV32IM core implementation.

mod execute;

use crate::bus::{BusError, Memory};
use crate::csr::CsRegisters;
use crate::instruction::{
    BranchCondition, DecodeError, Instruction, LoadWidth, RegImmOp, RegRegOp, RegShiftImmOp,
    StoreWidth,
};
use crate::registers::{Registers, Specifier};
use execute::Executor;
use log::{trace, warn};

/// Address the `pc` is reset to when no other reset vector is configured.
pub const DEFAULT_RESET_VECTOR: u32 = 0xC0;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Address to which the core's PC register is reset.
    pub reset_vector: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_vector: DEFAULT_RESET_VECTOR,
        }
    }
}

/// RISC-V core implementing the RV32IM ISA with the Zicsr counters.
///
/// The core has a single hart, runs in a single flat address space, and has no privilege levels,
/// traps, or interrupts. Every [`step`](Self::step) retires exactly one instruction, or treats an
/// undecodable one as a no-op.
#[derive(Debug, Clone)]
pub struct Core {
    config: Config,
    registers: Registers,
    cs_registers: CsRegisters,
    invalid_instructions: u64,
}

impl Core {
    pub fn new(config: Config) -> Self {
        let registers = Registers::new(config.reset_vector);
        Self {
            config,
            registers,
            cs_registers: CsRegisters::new(),
            invalid_instructions: 0,
        }
    }

    /// Force this core to its reset state.
    pub fn reset(&mut self) {
        self.registers = Registers::new(self.config.reset_vector);
        self.cs_registers.reset();
        self.invalid_instructions = 0;
    }

    /// Provide a read-only view of this core's configuration.
    ///
    /// It is not possible to modify the configuration after creation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn cs_registers(&self) -> &CsRegisters {
        &self.cs_registers
    }

    pub fn cs_registers_mut(&mut self) -> &mut CsRegisters {
        &mut self.cs_registers
    }

    /// Number of undecodable instructions that were skipped since the last reset.
    pub fn invalid_instructions(&self) -> u64 {
        self.invalid_instructions
    }

    /// Fetch, decode, and execute a single instruction, then commit its results.
    ///
    /// Commit order is: `pc` (to the jump target, or else `pc + 4`), then the destination
    /// register (discarded for `x0`), then the cycle counter is incremented. An instruction that
    /// cannot be decoded is logged, counted, and otherwise treated as a no-op.
    ///
    /// If the fetch or a load/store fails, the error is returned and no register, `pc`, or counter
    /// update is committed. This includes [`BusError::Exit`], which a device raises to request
    /// the simulation to stop.
    pub fn step<M: Memory + ?Sized>(&mut self, memory: &mut M) -> Result<StepOutcome, BusError> {
        let pc = self.registers.pc();
        let raw_instruction = memory.read_u32(pc)?;
        trace!("fetched {raw_instruction:#010x} at {pc:#010x}");

        let (writeback, outcome) = match Instruction::decode(raw_instruction) {
            Ok(instruction) => (
                self.execute_instruction(memory, instruction)?,
                StepOutcome::Retired,
            ),
            Err(error) => {
                warn!(
                    raw_instruction = raw_instruction,
                    pc = pc;
                    "invalid instruction {raw_instruction:#010x} at {pc:#010x}: {error}"
                );
                self.invalid_instructions += 1;
                let outcome = StepOutcome::Invalid {
                    raw_instruction,
                    pc,
                    error,
                };
                (Writeback::default(), outcome)
            }
        };

        self.commit(writeback);
        self.cs_registers.step();
        Ok(outcome)
    }

    /// Execute a decoded instruction without committing its register and `pc` updates.
    ///
    /// Memory and CSR side effects are applied immediately. The returned [`Writeback`] holds the
    /// pending updates, computed from the state before execution.
    pub fn execute_instruction<M: Memory + ?Sized>(
        &mut self,
        memory: &mut M,
        instruction: Instruction,
    ) -> ExecutionResult {
        let mut executor = Executor {
            registers: &self.registers,
            cs_registers: &mut self.cs_registers,
            memory,
        };
        match instruction {
            Instruction::OpImm {
                op,
                dest,
                src,
                immediate,
            } => {
                let op = match op {
                    RegImmOp::Addi => Executor::addi,
                    RegImmOp::Slti => Executor::slti,
                    RegImmOp::Sltiu => Executor::sltiu,
                    RegImmOp::Xori => Executor::xori,
                    RegImmOp::Ori => Executor::ori,
                    RegImmOp::Andi => Executor::andi,
                };
                op(&mut executor, dest, src, immediate)
            }
            Instruction::OpShiftImm {
                op,
                dest,
                src,
                shift_amount_u5,
            } => {
                let op = match op {
                    RegShiftImmOp::Slli => Executor::slli,
                    RegShiftImmOp::Srli => Executor::srli,
                    RegShiftImmOp::Srai => Executor::srai,
                };
                op(&mut executor, dest, src, shift_amount_u5)
            }
            Instruction::Auipc { dest, immediate } => executor.auipc(dest, immediate),
            Instruction::Lui { dest, immediate } => executor.lui(dest, immediate),
            Instruction::Op {
                op,
                dest,
                src1,
                src2,
            } => {
                let op = match op {
                    RegRegOp::Add => Executor::add,
                    RegRegOp::Slt => Executor::slt,
                    RegRegOp::Sltu => Executor::sltu,
                    RegRegOp::And => Executor::and,
                    RegRegOp::Or => Executor::or,
                    RegRegOp::Xor => Executor::xor,
                    RegRegOp::Sll => Executor::sll,
                    RegRegOp::Srl => Executor::srl,
                    RegRegOp::Sub => Executor::sub,
                    RegRegOp::Sra => Executor::sra,
                    RegRegOp::Mul => Executor::mul,
                    RegRegOp::Mulh => Executor::mulh,
                    RegRegOp::Mulhsu => Executor::mulhsu,
                    RegRegOp::Mulhu => Executor::mulhu,
                    RegRegOp::Div => Executor::div,
                    RegRegOp::Divu => Executor::divu,
                    RegRegOp::Rem => Executor::rem,
                    RegRegOp::Remu => Executor::remu,
                };
                op(&mut executor, dest, src1, src2)
            }
            Instruction::Jal { dest, offset } => executor.jal(dest, offset),
            Instruction::Jalr { dest, base, offset } => executor.jalr(dest, base, offset),
            Instruction::Branch {
                condition,
                src1,
                src2,
                offset,
            } => {
                let op = match condition {
                    BranchCondition::Beq => Executor::beq,
                    BranchCondition::Bne => Executor::bne,
                    BranchCondition::Blt => Executor::blt,
                    BranchCondition::Bltu => Executor::bltu,
                    BranchCondition::Bge => Executor::bge,
                    BranchCondition::Bgeu => Executor::bgeu,
                };
                op(&mut executor, src1, src2, offset)
            }
            Instruction::Load {
                width,
                dest,
                base,
                offset,
            } => {
                let op = match width {
                    LoadWidth::Lb => Executor::lb,
                    LoadWidth::Lh => Executor::lh,
                    LoadWidth::Lw => Executor::lw,
                    LoadWidth::Lbu => Executor::lbu,
                    LoadWidth::Lhu => Executor::lhu,
                };
                op(&mut executor, dest, base, offset)
            }
            Instruction::Store {
                width,
                src,
                base,
                offset,
            } => {
                let op = match width {
                    StoreWidth::Sb => Executor::sb,
                    StoreWidth::Sh => Executor::sh,
                    StoreWidth::Sw => Executor::sw,
                };
                op(&mut executor, src, base, offset)
            }
            Instruction::Csr {
                op,
                dest,
                source,
                csr,
            } => executor.csr(op, dest, source, csr),
        }
    }

    fn commit(&mut self, writeback: Writeback) {
        let next_pc = writeback
            .pc
            .unwrap_or_else(|| self.registers.pc().wrapping_add(4));
        *self.registers.pc_mut() = next_pc;
        if let Some((dest, value)) = writeback.register {
            // `set_x` ignores writes to x0
            self.registers.set_x(dest, value);
        }
    }
}

/// What a successful [`Core::step`] did.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    /// An instruction was executed and retired.
    Retired,
    /// The fetched word could not be decoded and was skipped.
    Invalid {
        raw_instruction: u32,
        pc: u32,
        error: DecodeError,
    },
}

/// Register and `pc` updates produced by executing an instruction, still to be committed.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Writeback {
    /// Destination register and the value to write to it.
    pub register: Option<(Specifier, u32)>,
    /// Next `pc`, if the instruction does not simply continue with the next one.
    pub pc: Option<u32>,
}

impl Writeback {
    pub fn register(dest: Specifier, value: u32) -> Self {
        Self {
            register: Some((dest, value)),
            pc: None,
        }
    }

    pub fn jump(target: u32) -> Self {
        Self {
            register: None,
            pc: Some(target),
        }
    }
}

pub type ExecutionResult = Result<Writeback, BusError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::specifier::{MCYCLE, MSCRATCH};
    use crate::csr::WriteOp;
    use crate::resources::ram::Ram;
    use crate::test_utils::*;

    const BASE: u32 = 0x100;

    fn x(index: u8) -> Specifier {
        Specifier::from_u5(index)
    }

    fn setup(program: &[u32]) -> (Core, Ram) {
        let core = Core::new(Config { reset_vector: BASE });
        (core, ram_with_program(0x1000, BASE, program))
    }

    fn run(core: &mut Core, ram: &mut Ram, steps: usize) {
        for _ in 0..steps {
            core.step(ram).unwrap();
        }
    }

    #[test]
    fn test_default_reset_vector() {
        let core = Core::new(Config::default());
        assert_eq!(DEFAULT_RESET_VECTOR, core.registers().pc());
        assert_eq!(0xC0, core.registers().pc());
    }

    #[test]
    fn test_addi_chain() {
        let (mut core, mut ram) = setup(&[addi(1, 0, 5), addi(2, 1, 10)]);
        run(&mut core, &mut ram, 2);
        assert_eq!(5, core.registers().x(x(1)));
        assert_eq!(15, core.registers().x(x(2)));
        assert_eq!(BASE + 8, core.registers().pc());
        assert_eq!(2, core.cs_registers().read_pure(MCYCLE));
    }

    #[test]
    fn test_branch_always_taken_on_x0() {
        let (mut core, mut ram) = setup(&[beq(0, 0, 8)]);
        assert_eq!(Ok(StepOutcome::Retired), core.step(&mut ram));
        assert_eq!(BASE + 8, core.registers().pc());
    }

    #[test]
    fn test_branch_not_taken() {
        let (mut core, mut ram) = setup(&[addi(1, 0, 1), beq(0, 1, -4)]);
        run(&mut core, &mut ram, 2);
        assert_eq!(BASE + 8, core.registers().pc());
    }

    #[test]
    fn test_store_load_round_trip() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, 0x400),
            lui(2, 0xDEAD_B000),
            addi(2, 2, 0xEF),
            sw(2, 1, 0),
            lw(3, 1, 0),
        ]);
        run(&mut core, &mut ram, 5);
        assert_eq!(0xDEAD_B0EF, core.registers().x(x(2)));
        assert_eq!(core.registers().x(x(2)), core.registers().x(x(3)));
        assert_eq!(0xDEAD_B0EF, ram.read_u32(0x400).unwrap());
    }

    #[test]
    fn test_invalid_instruction_is_skipped() {
        let raw = 0xFFFF_FFFF;
        let (mut core, mut ram) = setup(&[raw]);
        let before = core.registers().clone();
        let outcome = core.step(&mut ram).unwrap();
        assert_eq!(
            StepOutcome::Invalid {
                raw_instruction: raw,
                pc: BASE,
                error: DecodeError::UnsupportedOpcode(0b11_111),
            },
            outcome
        );
        assert_eq!(BASE + 4, core.registers().pc());
        for specifier in Specifier::iter_all() {
            assert_eq!(before.x(specifier), core.registers().x(specifier));
        }
        assert_eq!(1, core.cs_registers().cycle());
        assert_eq!(1, core.invalid_instructions());
    }

    #[test]
    fn test_csrrw_from_x0_does_not_write() {
        let mscratch = MSCRATCH as u32;
        let (mut core, mut ram) = setup(&[csrrw(0, 0, mscratch), csrrs(5, 0, mscratch)]);
        core.cs_registers_mut().write(MSCRATCH, 0x1234_5678, WriteOp::Write);
        run(&mut core, &mut ram, 2);
        assert_eq!(0x1234_5678, core.registers().x(x(5)));
        assert_eq!(0x1234_5678, core.cs_registers().read_pure(MSCRATCH));
    }

    #[test]
    fn test_csrrw_swaps() {
        let (mut core, mut ram) = setup(&[addi(1, 0, 42), csrrw(2, 1, MSCRATCH as u32)]);
        core.cs_registers_mut().write(MSCRATCH, 7, WriteOp::Write);
        run(&mut core, &mut ram, 2);
        assert_eq!(7, core.registers().x(x(2)));
        assert_eq!(42, core.cs_registers().read_pure(MSCRATCH));
    }

    #[test]
    fn test_csr_reads_counter_before_increment() {
        let nop = addi(0, 0, 0);
        let (mut core, mut ram) = setup(&[nop, nop, csrrs(1, 0, MCYCLE as u32)]);
        run(&mut core, &mut ram, 3);
        assert_eq!(2, core.registers().x(x(1)));
        assert_eq!(3, core.cs_registers().cycle());
    }

    #[test]
    fn test_csrrw_to_counter_then_step() {
        // The counter increments after an explicit write in the same step
        let (mut core, mut ram) = setup(&[addi(1, 0, 100), csrrw(0, 1, MCYCLE as u32)]);
        run(&mut core, &mut ram, 2);
        assert_eq!(101, core.cs_registers().cycle());
    }

    #[test]
    fn test_x0_stays_zero() {
        let (mut core, mut ram) = setup(&[addi(0, 0, 5), lui(0, 0x1000)]);
        run(&mut core, &mut ram, 2);
        assert_eq!(0, core.registers().x(Specifier::X0));
    }

    #[test]
    fn test_jal_links_and_jumps() {
        let (mut core, mut ram) = setup(&[j_type(1, 16)]);
        run(&mut core, &mut ram, 1);
        assert_eq!(BASE + 4, core.registers().x(x(1)));
        assert_eq!(BASE + 16, core.registers().pc());
    }

    #[test]
    fn test_jalr_clears_low_bit_and_uses_old_base() {
        // jalr x1, 0x21(x1) with x1 as both base and link register
        let (mut core, mut ram) = setup(&[
            addi(1, 0, BASE as i32),
            i_type(JALR, 0b000, 1, 1, 0x21),
        ]);
        run(&mut core, &mut ram, 2);
        assert_eq!(BASE + 0x20, core.registers().pc());
        assert_eq!(BASE + 8, core.registers().x(x(1)));
    }

    #[test]
    fn test_auipc() {
        let (mut core, mut ram) = setup(&[addi(0, 0, 0), u_type(AUIPC, 4, 0x0000_2000)]);
        run(&mut core, &mut ram, 2);
        assert_eq!(BASE + 4 + 0x2000, core.registers().x(x(4)));
    }

    #[test]
    fn test_sub_word_loads_extend() {
        let (mut core, mut ram) = setup(&[
            i_type(LOAD, 0b000, 1, 0, 0x400),
            i_type(LOAD, 0b100, 2, 0, 0x400),
            i_type(LOAD, 0b001, 3, 0, 0x400),
            i_type(LOAD, 0b101, 4, 0, 0x400),
        ]);
        ram.write_u16(0x400, 0x8081).unwrap();
        run(&mut core, &mut ram, 4);
        assert_eq!(0xFFFF_FF81, core.registers().x(x(1)));
        assert_eq!(0x81, core.registers().x(x(2)));
        assert_eq!(0xFFFF_8081, core.registers().x(x(3)));
        assert_eq!(0x8081, core.registers().x(x(4)));
    }

    #[test]
    fn test_sub_word_stores() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, -1),
            s_type(0b000, 0, 1, 0x400),
            s_type(0b001, 0, 1, 0x404),
        ]);
        run(&mut core, &mut ram, 3);
        assert_eq!(0x0000_00FF, ram.read_u32(0x400).unwrap());
        assert_eq!(0x0000_FFFF, ram.read_u32(0x404).unwrap());
    }

    #[test]
    fn test_shifts_use_low_five_bits() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, -16),
            addi(2, 0, 33),
            r_type(OP, 0b101, 0b0100000, 3, 1, 2),
            r_type(OP, 0b101, 0b0000000, 4, 1, 2),
            r_type(OP, 0b001, 0b0000000, 5, 1, 2),
        ]);
        run(&mut core, &mut ram, 5);
        assert_eq!(-8_i32 as u32, core.registers().x(x(3)));
        assert_eq!(0x7FFF_FFF8, core.registers().x(x(4)));
        assert_eq!(-32_i32 as u32, core.registers().x(x(5)));
    }

    #[test]
    fn test_division_by_zero_program() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, 42),
            r_type(OP, 0b100, 0b0000001, 2, 1, 0),
            r_type(OP, 0b110, 0b0000001, 3, 1, 0),
        ]);
        run(&mut core, &mut ram, 3);
        assert_eq!(u32::MAX, core.registers().x(x(2)));
        assert_eq!(42, core.registers().x(x(3)));
    }

    #[test]
    fn test_signed_compare() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, -1),
            i_type(OP_IMM, 0b010, 2, 1, 0),
            i_type(OP_IMM, 0b011, 3, 1, 0),
            r_type(OP, 0b011, 0b0000000, 4, 0, 1),
        ]);
        run(&mut core, &mut ram, 4);
        assert_eq!(1, core.registers().x(x(2)));
        assert_eq!(0, core.registers().x(x(3)));
        assert_eq!(1, core.registers().x(x(4)));
    }

    #[test]
    fn test_branch_conditions() {
        // x1 = -1 and x2 = 1 order differently when compared signed and unsigned
        let cases = [
            ("beq", 0b000, false),
            ("bne", 0b001, true),
            ("blt", 0b100, true),
            ("bge", 0b101, false),
            ("bltu", 0b110, false),
            ("bgeu", 0b111, true),
        ];
        for (name, funct3, taken) in cases {
            let (mut core, mut ram) =
                setup(&[addi(1, 0, -1), addi(2, 0, 1), b_type(funct3, 1, 2, 16)]);
            run(&mut core, &mut ram, 3);
            let expected = if taken { BASE + 8 + 16 } else { BASE + 12 };
            assert_eq!(expected, core.registers().pc(), "{name}");
        }
    }

    #[test]
    fn test_backward_branch() {
        let (mut core, mut ram) =
            setup(&[addi(1, 0, -1), addi(2, 0, 1), b_type(0b111, 1, 2, -8)]);
        run(&mut core, &mut ram, 3);
        assert_eq!(BASE, core.registers().pc());
    }

    #[test]
    fn test_shift_immediates() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, -16),
            i_type(OP_IMM, 0b001, 2, 1, 4),
            i_type(OP_IMM, 0b101, 3, 1, 4),
            i_type(OP_IMM, 0b101, 4, 1, 0x400 | 4),
            i_type(OP_IMM, 0b001, 5, 1, 0),
        ]);
        run(&mut core, &mut ram, 5);
        assert_eq!(0xFFFF_FF00, core.registers().x(x(2)));
        assert_eq!(0x0FFF_FFFF, core.registers().x(x(3)));
        assert_eq!(u32::MAX, core.registers().x(x(4)));
        assert_eq!(-16_i32 as u32, core.registers().x(x(5)));
    }

    #[test]
    fn test_logical_immediates() {
        let (mut core, mut ram) = setup(&[
            addi(1, 0, 0xF0),
            i_type(OP_IMM, 0b100, 2, 1, 0xFF),
            i_type(OP_IMM, 0b100, 3, 1, -1),
            i_type(OP_IMM, 0b110, 4, 1, 0x70F),
            i_type(OP_IMM, 0b111, 5, 1, 0x3C),
            i_type(OP_IMM, 0b111, 6, 1, -16),
        ]);
        run(&mut core, &mut ram, 6);
        assert_eq!(0x0F, core.registers().x(x(2)));
        assert_eq!(0xFFFF_FF0F, core.registers().x(x(3)));
        assert_eq!(0x7FF, core.registers().x(x(4)));
        assert_eq!(0x30, core.registers().x(x(5)));
        assert_eq!(0xF0, core.registers().x(x(6)));
    }

    #[test]
    fn test_csr_immediate_forms() {
        let mscratch = MSCRATCH as u32;
        let (mut core, mut ram) = setup(&[
            // csrrwi x1, mscratch, 0: reads, but a zero uimm does not write
            csr_type(0b101, 1, 0, mscratch),
            // csrrwi x0, mscratch, 5
            csr_type(0b101, 0, 5, mscratch),
            // csrrsi x2, mscratch, 0b1010
            csr_type(0b110, 2, 0b1010, mscratch),
            // csrrci x3, mscratch, 0b0011
            csr_type(0b111, 3, 0b0011, mscratch),
            // csrrsi x4, mscratch, 0 still reads
            csr_type(0b110, 4, 0, mscratch),
        ]);
        core.cs_registers_mut().write(MSCRATCH, 0xF0, WriteOp::Write);

        run(&mut core, &mut ram, 1);
        assert_eq!(0xF0, core.registers().x(x(1)));
        assert_eq!(0xF0, core.cs_registers().read_pure(MSCRATCH));

        run(&mut core, &mut ram, 4);
        assert_eq!(5, core.registers().x(x(2)));
        assert_eq!(0xF, core.registers().x(x(3)));
        assert_eq!(0xC, core.registers().x(x(4)));
        assert_eq!(0xC, core.cs_registers().read_pure(MSCRATCH));
    }

    #[test]
    fn test_csr_set_and_clear_registers() {
        let mscratch = MSCRATCH as u32;
        let (mut core, mut ram) = setup(&[
            addi(1, 0, 0b0110),
            // csrrc x2, mscratch, x1
            csr_type(0b011, 2, 1, mscratch),
            // csrrs x3, mscratch, x0 reads without changing the value
            csrrs(3, 0, mscratch),
            // csrrc x4, mscratch, x0
            csr_type(0b011, 4, 0, mscratch),
            // csrrs x0, mscratch, x1
            csrrs(0, 1, mscratch),
        ]);
        core.cs_registers_mut().write(MSCRATCH, 0b1111, WriteOp::Write);
        run(&mut core, &mut ram, 5);
        assert_eq!(0b1111, core.registers().x(x(2)));
        assert_eq!(0b1001, core.registers().x(x(3)));
        assert_eq!(0b1001, core.registers().x(x(4)));
        assert_eq!(0b1111, core.cs_registers().read_pure(MSCRATCH));
    }

    #[test]
    fn test_fetch_fault_commits_nothing() {
        let mut core = Core::new(Config {
            reset_vector: 0x2000,
        });
        let mut ram = Ram::new(0x1000).unwrap();
        assert_eq!(
            Err(BusError::AccessFault {
                address: 0x2000,
                size: 4
            }),
            core.step(&mut ram)
        );
        assert_eq!(0x2000, core.registers().pc());
        assert_eq!(0, core.cs_registers().cycle());
    }

    #[test]
    fn test_load_fault_commits_nothing() {
        let (mut core, mut ram) = setup(&[lw(1, 0, -4)]);
        assert!(core.step(&mut ram).is_err());
        assert_eq!(BASE, core.registers().pc());
        assert_eq!(0, core.registers().x(x(1)));
        assert_eq!(0, core.cs_registers().cycle());
    }

    #[test]
    fn test_reset() {
        let (mut core, mut ram) = setup(&[addi(1, 0, 5), 0xFFFF_FFFF]);
        run(&mut core, &mut ram, 2);
        assert_eq!(1, core.invalid_instructions());
        core.reset();
        assert_eq!(BASE, core.registers().pc());
        assert_eq!(0, core.registers().x(x(1)));
        assert_eq!(0, core.cs_registers().cycle());
        assert_eq!(0, core.invalid_instructions());
    }
}
