//! Instruction-accurate RV32IM functional model.
//!
//! The [`core::Core`] executes one instruction per [`step`](core::Core::step) against anything
//! implementing [`bus::Memory`]. The remaining modules provide a composed address space
//! ([`system_bus::SystemBus`]), the resources attached to it, and the testbench
//! [`board::Board`] and [`simulator::Simulator`] that drive the core as a program loader.

#[macro_use]
extern crate static_assertions;

pub mod address_map;
pub mod address_range;
pub mod board;
pub mod bus;
pub mod core;
pub mod csr;
pub mod immediate;
pub mod instruction;
pub mod registers;
pub mod resources;
pub mod simulator;
pub mod system_bus;

#[cfg(test)]
mod test_utils;

/// Re-export of [`AddressRange`] for convenience.
pub use address_range::AddressRange;
