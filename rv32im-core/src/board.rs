//! Provides the testbench board: RAM at address zero and a testbench I/O block.

use crate::address_map::AddressMapError;
use crate::address_range::InvalidBoundsError;
use crate::core::{self as rv_core, Core, DEFAULT_RESET_VECTOR};
use crate::resources::ram::{LoadError, Ram};
use crate::resources::testbench_io::{self, TestbenchIo};
use crate::simulator::Simulator;
use crate::system_bus::SystemBus;
use crate::AddressRange;
use log::debug;
use std::io::Write;
use thiserror::Error;

/// Start of RAM in the physical address space.
pub const RAM_BASE: u32 = 0x0000_0000;
/// Start of the testbench I/O block in the physical address space.
pub const IO_BASE: u32 = 0x8000_0000;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Size of RAM in bytes.
    pub ram_size: usize,
    /// Address to which the core's PC register is reset.
    pub reset_vector: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram_size: 16 << 20,
            reset_vector: DEFAULT_RESET_VECTOR,
        }
    }
}

/// Board under construction, holding RAM so program images can be loaded before the simulation
/// starts.
///
/// ```text
/// [0x0000_0000, ram_size - 1]           RAM
/// [0x8000_0000, 0x8000_000B]            testbench I/O
/// ```
#[derive(Debug)]
pub struct Board {
    config: Config,
    ram: Ram,
}

impl Board {
    /// Allocate the board's RAM.
    ///
    /// RAM must be non-empty and end below [`IO_BASE`], otherwise nothing is allocated.
    pub fn new(config: Config) -> Result<Self, BoardError> {
        let invalid = BoardError::InvalidRamSize {
            size: config.ram_size,
        };
        if config.ram_size > (IO_BASE - RAM_BASE) as usize {
            return Err(invalid);
        }
        let ram = Ram::new(config.ram_size).ok_or(invalid)?;
        debug!("created board with {} bytes of RAM", ram.len());
        Ok(Self { config, ram })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    /// Change the address the core starts executing from, e.g. to the entry point of a loaded
    /// program.
    pub fn set_reset_vector(&mut self, reset_vector: u32) {
        self.config.reset_vector = reset_vector;
    }

    /// Copy `image` into RAM at physical address `address`.
    ///
    /// The whole image must fit in RAM.
    pub fn load(&mut self, address: u32, image: &[u8]) -> Result<(), LoadError> {
        let offset = address
            .checked_sub(RAM_BASE)
            .filter(|&offset| (offset as usize) < self.ram.len())
            .ok_or(LoadError::Unmapped { address })?;
        self.ram.load(offset, image)
    }

    /// Wire up the system bus and a core reset to the configured reset vector.
    ///
    /// Console output of the testbench I/O block goes to `output`.
    pub fn into_simulator<W: Write + 'static>(self, output: W) -> Result<Simulator, BoardError> {
        let ram_size = u32::try_from(self.ram.len()).map_err(|_| BoardError::InvalidRamSize {
            size: self.ram.len(),
        })?;
        let ram_range = AddressRange::with_size(RAM_BASE, ram_size)?;
        let io_range = AddressRange::with_size(IO_BASE, testbench_io::SIZE)?;

        let mut bus = SystemBus::new();
        bus.attach(ram_range, Box::new(self.ram))?;
        bus.attach(io_range, Box::new(TestbenchIo::new(output)))?;

        let core = Core::new(rv_core::Config {
            reset_vector: self.config.reset_vector,
        });
        Ok(Simulator::new(core, bus))
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum BoardError {
    #[error("invalid RAM size of {size} bytes")]
    InvalidRamSize { size: usize },
    #[error("invalid memory layout: {0}")]
    Layout(#[from] AddressMapError),
    #[error("invalid memory region: {0}")]
    Bounds(#[from] InvalidBoundsError),
}
