//! Drives a [`Core`] against a [`SystemBus`] until the guest exits or a step budget runs out.

use crate::bus::{Bus, BusError};
use crate::core::{Core, StepOutcome};
use crate::system_bus::SystemBus;
use log::{debug, info};
use std::fmt::Write;
use thiserror::Error;

/// Number of bytes per line of a memory dump.
const DUMP_BYTES_PER_LINE: u32 = 16;

#[derive(Debug)]
pub struct Simulator {
    core: Core,
    bus: SystemBus,
}

impl Simulator {
    pub fn new(core: Core, bus: SystemBus) -> Self {
        Self { core, bus }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn bus_mut(&mut self) -> &mut SystemBus {
        &mut self.bus
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> Result<StepOutcome, BusError> {
        self.core.step(&mut self.bus)
    }

    /// Step the core at most `max_steps` times.
    ///
    /// The run ends early when a device requests an exit. The step performing that request counts
    /// towards [`RunSummary::steps`], even though its own results are not committed.
    pub fn run(&mut self, max_steps: u64) -> Result<RunSummary, SimulationError> {
        let mut steps = 0;
        while steps < max_steps {
            let pc = self.core.registers().pc();
            match self.step() {
                Ok(_) => steps += 1,
                Err(BusError::Exit { code }) => {
                    steps += 1;
                    info!("guest exited with code {code} after {steps} steps");
                    return Ok(RunSummary {
                        steps,
                        halt: Halt::Exited { code },
                    });
                }
                Err(source) => {
                    return Err(SimulationError {
                        pc,
                        steps,
                        source,
                    })
                }
            }
        }
        debug!("step limit of {max_steps} reached");
        Ok(RunSummary {
            steps,
            halt: Halt::StepLimit,
        })
    }

    /// Format the bytes in `[start, end)` as hexadecimal, sixteen per line.
    ///
    /// Bytes are read without side effects. The output always ends with an empty line, matching
    /// the traditional testbench dump format.
    pub fn dump(&self, start: u32, end: u32) -> Result<String, BusError> {
        let mut out = String::new();
        let mut buf = [0u8; 1];
        for (i, address) in (start..end).enumerate() {
            self.bus.read_pure(&mut buf, address)?;
            let separator = if i as u32 % DUMP_BYTES_PER_LINE == DUMP_BYTES_PER_LINE - 1 {
                '\n'
            } else {
                ' '
            };
            // Writing to a `String` cannot fail
            let _ = write!(out, "{:02x}{separator}", buf[0]);
        }
        out.push('\n');
        Ok(out)
    }
}

/// Result of a [`Simulator::run`] that was not aborted by a fault.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RunSummary {
    /// Number of steps taken, including a final step that requested an exit.
    pub steps: u64,
    pub halt: Halt,
}

/// Why a [`Simulator::run`] stopped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Halt {
    /// The guest wrote `code` to the exit register.
    Exited { code: u32 },
    /// The step budget was exhausted.
    StepLimit,
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("bus fault at pc {pc:#010x} after {steps} steps")]
pub struct SimulationError {
    /// Address of the instruction that faulted.
    pub pc: u32,
    /// Number of steps completed before the fault.
    pub steps: u64,
    #[source]
    pub source: BusError,
}
