//! Memory-mapped testbench I/O: console output and a simulation exit register.
//!
//! Guest software accesses the block through a struct of three word registers:
//!
//! | offset | name        | on write                                             |
//! |--------|-------------|------------------------------------------------------|
//! | `0x0`  | `PRINT`     | emit the low byte as a character                     |
//! | `0x4`  | `EXIT`      | stop the simulation with the written status code     |
//! | `0x8`  | `PRINT_U32` | emit the value as eight hex digits and a newline     |
//!
//! All registers read as zero.

use crate::bus::{Bus, BusError, BusResult};
use log::{info, warn};
use std::fmt;
use std::io::Write;

/// Offset of the character output register.
pub const PRINT: u32 = 0x0;
/// Offset of the exit register.
pub const EXIT: u32 = 0x4;
/// Offset of the hexadecimal word output register.
pub const PRINT_U32: u32 = 0x8;

/// Size of the register block in bytes.
pub const SIZE: u32 = 12;

/// Testbench I/O device writing console output to `W`.
pub struct TestbenchIo<W: Write> {
    output: W,
}

impl<W: Write> fmt::Debug for TestbenchIo<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestbenchIo").finish_non_exhaustive()
    }
}

impl<W: Write> TestbenchIo<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Returns the register offset an access targets, or `None` if it straddles registers or
    /// falls outside the block.
    fn register(address: u32, size: usize) -> Option<u32> {
        let offset_in_register = (address % 4) as usize;
        (address < SIZE && size <= 4 && offset_in_register + size <= 4).then_some(address & !0b11)
    }

    fn emit(&mut self, bytes: &[u8]) {
        // Output failures are logged and otherwise ignored
        if let Err(err) = self.output.write_all(bytes).and_then(|()| self.output.flush()) {
            warn!("testbench output failed: {err}");
        }
    }
}

impl<W: Write> Bus for TestbenchIo<W> {
    fn read(&mut self, buf: &mut [u8], address: u32) -> BusResult {
        self.read_pure(buf, address)
    }

    fn read_pure(&self, buf: &mut [u8], address: u32) -> BusResult {
        Self::register(address, buf.len()).ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        buf.fill(0);
        Ok(())
    }

    fn write(&mut self, address: u32, buf: &[u8]) -> BusResult {
        let register = Self::register(address, buf.len()).ok_or(BusError::AccessFault {
            address,
            size: buf.len(),
        })?;
        // Sub-word writes place their bytes at their lane within the register.
        let mut bytes = [0u8; 4];
        let lane = (address % 4) as usize;
        bytes[lane..lane + buf.len()].copy_from_slice(buf);
        let value = u32::from_le_bytes(bytes);

        match register {
            PRINT => self.emit(&[value as u8]),
            EXIT => {
                info!("exit requested with code {value}");
                return Err(BusError::Exit { code: value });
            }
            PRINT_U32 => self.emit(format!("{value:08x}\n").as_bytes()),
            _ => unreachable!(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Memory;

    #[test]
    fn test_print() {
        let mut io = TestbenchIo::new(Vec::new());
        for c in b"hi\n" {
            io.write_u32(PRINT, *c as u32).unwrap();
        }
        io.write_u8(PRINT, b'!').unwrap();
        assert_eq!(b"hi\n!", io.output().as_slice());
    }

    #[test]
    fn test_print_u32() {
        let mut io = TestbenchIo::new(Vec::new());
        io.write_u32(PRINT_U32, 0xC0FFEE).unwrap();
        assert_eq!("00c0ffee\n", String::from_utf8(io.into_output()).unwrap());
    }

    #[test]
    fn test_exit() {
        let mut io = TestbenchIo::new(Vec::new());
        assert_eq!(Err(BusError::Exit { code: 42 }), io.write_u32(EXIT, 42));
        assert_eq!(Err(BusError::Exit { code: 0 }), io.write_u8(EXIT, 0));
    }

    #[test]
    fn test_reads_are_zero() {
        let mut io = TestbenchIo::new(Vec::new());
        assert_eq!(0, io.read_u32(PRINT).unwrap());
        assert_eq!(0, io.read_u16(EXIT + 2).unwrap());
        assert_eq!(0, io.read_u8(PRINT_U32 + 3).unwrap());
    }

    #[test]
    fn test_rejected_accesses() {
        let mut io = TestbenchIo::new(Vec::new());
        assert!(io.read_u32(2).is_err());
        assert!(io.write_u32(SIZE, 0).is_err());
        assert!(io.write_u16(3, 0).is_err());
        assert!(io.output().is_empty());
    }
}
