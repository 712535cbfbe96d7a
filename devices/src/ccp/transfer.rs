// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Data movement between the address spaces a request descriptor can name.
//!
//! Every engine drives one [`XferCtx`] per request: a source cursor and a
//! destination cursor, each dispatching on the descriptor's memory-type
//! code. The context owns no device state; it borrows the device for each
//! pass so engines can interleave reads, computation, and writes.

use std::io;

use ccp_sys::mem_word_type;
use ccp_sys::CCP_LSB_SIZE;
use ccp_sys::CCP_MEMTYPE_LOCAL;
use ccp_sys::CCP_MEMTYPE_SB;
use ccp_sys::CCP_MEMTYPE_SYSTEM;

use super::CcpDevice;
use super::ExecuteError;
use super::Result;

/// Memory types a descriptor can reference.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemType {
    /// Host physical memory. Not modeled; accesses fail.
    System,
    /// The on-chip Local Storage Buffer.
    Sb,
    /// PSP-visible address space, routed through the I/O manager.
    Local,
}

impl MemType {
    pub(crate) fn from_word(word: u16) -> Result<MemType> {
        match mem_word_type(word) {
            CCP_MEMTYPE_SYSTEM => Ok(MemType::System),
            CCP_MEMTYPE_SB => Ok(MemType::Sb),
            CCP_MEMTYPE_LOCAL => Ok(MemType::Local),
            other => Err(ExecuteError::InvalidMemType(other)),
        }
    }
}

fn lsb_range(addr: u64, len: usize) -> Result<std::ops::Range<usize>> {
    match addr.checked_add(len as u64) {
        Some(end) if addr < CCP_LSB_SIZE as u64 && end <= CCP_LSB_SIZE as u64 => {
            Ok(addr as usize..addr as usize + len)
        }
        _ => Err(ExecuteError::LsbOutOfRange { addr, len }),
    }
}

impl CcpDevice {
    /// Reads `buf.len()` bytes from `addr` in the given memory type.
    pub(crate) fn mem_read(&mut self, mem: MemType, addr: u64, buf: &mut [u8]) -> Result<()> {
        match mem {
            MemType::System => Err(ExecuteError::SystemMemory),
            MemType::Local => self.io.psp_read(addr, buf).map_err(ExecuteError::Io),
            MemType::Sb => {
                let range = lsb_range(addr, buf.len())?;
                buf.copy_from_slice(&self.lsb[range]);
                Ok(())
            }
        }
    }

    /// Writes `buf` to `addr` in the given memory type. Successful LOCAL
    /// writes feed the `cb_written_last` counter firmware reads back
    /// through the secondary MMIO window.
    pub(crate) fn mem_write(&mut self, mem: MemType, addr: u64, buf: &[u8]) -> Result<()> {
        match mem {
            MemType::System => Err(ExecuteError::SystemMemory),
            MemType::Local => {
                self.io.psp_write(addr, buf).map_err(ExecuteError::Io)?;
                self.cb_written_last = self.cb_written_last.wrapping_add(buf.len() as u32);
                Ok(())
            }
            MemType::Sb => {
                let range = lsb_range(addr, buf.len())?;
                self.lsb[range].copy_from_slice(buf);
                Ok(())
            }
        }
    }
}

/// A transfer in flight: paired source and destination cursors with
/// remaining-byte budgets.
///
/// In reverse mode the destination address is pre-biased by the write
/// budget and each write lands below the cursor with its bytes in reverse
/// order, so a full pass leaves the byte-reversed image of the written
/// stream in `[dst, dst + budget)`.
pub(crate) struct XferCtx {
    src_mem: MemType,
    src_addr: u64,
    cb_read: u64,
    dst_mem: MemType,
    dst_addr: u64,
    cb_write: u64,
    reverse: bool,
}

impl XferCtx {
    pub fn new(
        dev: &mut CcpDevice,
        src_mem: MemType,
        src_addr: u64,
        cb_read: u64,
        dst_mem: MemType,
        dst_addr: u64,
        cb_write: u64,
        reverse: bool,
    ) -> XferCtx {
        // The counter covers one transfer at a time.
        dev.cb_written_last = 0;
        let dst_addr = if reverse {
            dst_addr.wrapping_add(cb_write)
        } else {
            dst_addr
        };
        XferCtx {
            src_mem,
            src_addr,
            cb_read,
            dst_mem,
            dst_addr,
            cb_write,
            reverse,
        }
    }

    /// Reads up to `buf.len()` bytes, bounded by the remaining budget, and
    /// returns how many were read. Zero means the source is exhausted.
    pub fn read(&mut self, dev: &mut CcpDevice, buf: &mut [u8]) -> Result<usize> {
        let n = (buf.len() as u64).min(self.cb_read) as usize;
        if n == 0 {
            return Ok(0);
        }
        dev.mem_read(self.src_mem, self.src_addr, &mut buf[..n])?;
        self.src_addr += n as u64;
        self.cb_read -= n as u64;
        Ok(n)
    }

    /// Reads exactly `buf.len()` bytes or fails.
    pub fn read_exact(&mut self, dev: &mut CcpDevice, buf: &mut [u8]) -> Result<()> {
        let n = self.read(dev, buf)?;
        if n != buf.len() {
            return Err(ExecuteError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "transfer source exhausted",
            )));
        }
        Ok(())
    }

    /// Writes all of `buf` toward the destination cursor.
    pub fn write(&mut self, dev: &mut CcpDevice, buf: &[u8]) -> Result<()> {
        if (buf.len() as u64) > self.cb_write {
            return Err(ExecuteError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                "transfer write exceeds destination budget",
            )));
        }
        if self.reverse {
            let reversed: Vec<u8> = buf.iter().rev().copied().collect();
            self.dst_addr -= buf.len() as u64;
            dev.mem_write(self.dst_mem, self.dst_addr, &reversed)?;
        } else {
            dev.mem_write(self.dst_mem, self.dst_addr, buf)?;
            self.dst_addr += buf.len() as u64;
        }
        self.cb_write -= buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::test_device;
    use super::*;

    #[test]
    fn lsb_bounds() {
        let (mut dev, _mem, _irq) = test_device();
        let mut buf = [0u8; 32];

        assert!(dev.mem_read(MemType::Sb, 0, &mut buf).is_ok());
        assert!(dev.mem_read(MemType::Sb, 4064, &mut buf).is_ok());
        // One byte past the end.
        assert!(matches!(
            dev.mem_read(MemType::Sb, 4065, &mut buf),
            Err(ExecuteError::LsbOutOfRange { .. })
        ));
        // Start at the boundary, even for a zero-length access.
        assert!(matches!(
            dev.mem_read(MemType::Sb, 4096, &mut [0u8; 0]),
            Err(ExecuteError::LsbOutOfRange { .. })
        ));
        assert!(matches!(
            dev.mem_write(MemType::Sb, u64::MAX, &buf),
            Err(ExecuteError::LsbOutOfRange { .. })
        ));
    }

    #[test]
    fn system_memory_unsupported() {
        let (mut dev, _mem, _irq) = test_device();
        let mut buf = [0u8; 4];
        assert!(matches!(
            dev.mem_read(MemType::System, 0, &mut buf),
            Err(ExecuteError::SystemMemory)
        ));
        assert!(matches!(
            dev.mem_write(MemType::System, 0, &buf),
            Err(ExecuteError::SystemMemory)
        ));
    }

    #[test]
    fn local_writes_count_bytes() {
        let (mut dev, mem, _irq) = test_device();
        let mut ctx = XferCtx::new(
            &mut dev,
            MemType::Local,
            0x1000,
            8,
            MemType::Local,
            0x2000,
            8,
            false,
        );
        mem.lock()[0x1000..0x1008].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut buf = [0u8; 8];
        ctx.read_exact(&mut dev, &mut buf).unwrap();
        ctx.write(&mut dev, &buf).unwrap();
        assert_eq!(dev.cb_written_last(), 8);
        assert_eq!(&mem.lock()[0x2000..0x2008], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn reverse_write_lands_reversed() {
        let (mut dev, mem, _irq) = test_device();
        let data: Vec<u8> = (0u8..32).collect();
        let mut ctx = XferCtx::new(
            &mut dev,
            MemType::Local,
            0x1000,
            0,
            MemType::Local,
            0x2000,
            32,
            true,
        );
        // Split the pass to show chunks still compose into one reversal.
        ctx.write(&mut dev, &data[..10]).unwrap();
        ctx.write(&mut dev, &data[10..]).unwrap();
        let expect: Vec<u8> = (0u8..32).rev().collect();
        assert_eq!(&mem.lock()[0x2000..0x2020], expect.as_slice());
    }

    #[test]
    fn write_budget_is_enforced() {
        let (mut dev, _mem, _irq) = test_device();
        let mut ctx = XferCtx::new(
            &mut dev,
            MemType::Local,
            0,
            0,
            MemType::Local,
            0x2000,
            4,
            false,
        );
        assert!(ctx.write(&mut dev, &[0u8; 5]).is_err());
        assert!(ctx.write(&mut dev, &[0u8; 4]).is_ok());
    }

    #[test]
    fn partial_read_returns_count() {
        let (mut dev, _mem, _irq) = test_device();
        let mut ctx = XferCtx::new(
            &mut dev,
            MemType::Local,
            0x1000,
            6,
            MemType::Local,
            0x2000,
            0,
            false,
        );
        let mut buf = [0u8; 16];
        assert_eq!(ctx.read(&mut dev, &mut buf).unwrap(), 6);
        assert_eq!(ctx.read(&mut dev, &mut buf).unwrap(), 0);
    }
}
