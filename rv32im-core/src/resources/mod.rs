//! Provides the memory resources attached to the testbench: RAM and the testbench I/O block.

pub mod ram;
pub mod testbench_io;
