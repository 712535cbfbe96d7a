// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! AMD PSP Cryptographic Co-Processor version 5.
//!
//! Firmware queues 32-byte request descriptors in PSP memory, advances a
//! queue's tail pointer through the register file, and sets RUN. Draining
//! is deferred: descriptors execute on the next queue-register read, or on
//! a register write that leaves interrupts enabled, never on the RUN write
//! itself. Firmware stack frames depend on the start path returning before
//! DMA lands.
//!
//! The device owns two request queues, the 4 KiB Local Storage Buffer, and
//! at most one in-flight SHA, AES, and zlib session. Everything external
//! (PSP memory, the interrupt controller, the optional real-hardware
//! proxy) is reached through the collaborator traits below.

mod aes;
mod ecc;
mod passthrough;
mod queue;
mod request;
mod rsa;
mod sha;
mod transfer;
mod zlib;

use std::io;
use std::sync::Arc;

use log::debug;
use log::warn;
use remain::sorted;
use thiserror::Error;

use ccp_sys::CCP5_MISC_CB_WRITTEN_LAST;
use ccp_sys::CCP5_MISC_STATUS;
use ccp_sys::CCP5_MISC_STATUS_READY;
use ccp_sys::CCP5_NUM_QUEUES;
use ccp_sys::CCP5_Q_BASE;
use ccp_sys::CCP5_Q_CONTROL;
use ccp_sys::CCP5_Q_CONTROL_RUN;
use ccp_sys::CCP5_Q_HEAD_LO;
use ccp_sys::CCP5_Q_INTERRUPT_STATUS;
use ccp_sys::CCP5_Q_INT_ENABLE;
use ccp_sys::CCP5_Q_STATUS;
use ccp_sys::CCP5_Q_STRIDE;
use ccp_sys::CCP5_Q_TAIL_LO;
use ccp_sys::CCP_IRQ_DEV_ID;
use ccp_sys::CCP_IRQ_PRIO;
use ccp_sys::CCP_LSB_SIZE;

use crate::bus::BusAccessInfo;
use crate::bus::BusDevice;

use self::aes::AesSession;
use self::queue::CcpQueue;
use self::sha::ShaSession;
use self::zlib::ZlibSession;

pub use self::transfer::MemType;

/// Transfers stage through buffers of this size, which is also the zlib
/// output granularity.
pub(crate) const XFER_CHUNK_SIZE: usize = 4096;

/// Errors a queued request can fail with. Every kind collapses to the
/// ERROR outcome code in the queue status register.
#[sorted]
#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("input length not a multiple of the cipher block size")]
    BlockMisaligned,
    #[error("inflate failed: {0}")]
    Inflate(#[from] flate2::DecompressError),
    #[error("invalid memory type code {0}")]
    InvalidMemType(u16),
    #[error("memory access failed: {0}")]
    Io(io::Error),
    #[error("local storage access out of range: address {addr:#x} length {len:#x}")]
    LsbOutOfRange { addr: u64, len: usize },
    #[error("unsupported parameter combination: {0}")]
    NotImplemented(&'static str),
    #[error("proxy request failed: {0}")]
    Proxy(anyhow::Error),
    #[error("system memory is not modeled")]
    SystemMemory,
    #[error("unknown engine code {0:#x}")]
    UnknownEngine(u8),
}

pub(crate) type Result<T> = std::result::Result<T, ExecuteError>;

/// PSP-visible address space, owned by the I/O manager.
pub trait PspIo: Send {
    fn psp_read(&mut self, addr: u64, buf: &mut [u8]) -> io::Result<()>;
    fn psp_write(&mut self, addr: u64, buf: &[u8]) -> io::Result<()>;
}

/// The interrupt line to the PSP interrupt controller.
pub trait IrqLine: Send {
    fn set(&mut self, prio: u32, dev_id: u32, level: bool);
}

/// Forwarder to a real CCP for AES requests whose key never leaves
/// hardware. Returns the hardware status code.
pub trait CcpProxy: Send {
    fn aes_do(
        &mut self,
        dw0: u32,
        src: &[u8],
        dst: &mut [u8],
        key_addr: u64,
        iv: &[u8],
    ) -> anyhow::Result<u32>;
}

pub struct CcpDevice {
    io: Box<dyn PspIo>,
    irq: Box<dyn IrqLine>,
    proxy: Option<Box<dyn CcpProxy>>,
    queues: [CcpQueue; CCP5_NUM_QUEUES],
    lsb: Box<[u8; CCP_LSB_SIZE]>,
    sha: Option<ShaSession>,
    aes: Option<AesSession>,
    zlib: Option<ZlibSession>,
    cb_written_last: u32,
    irq_level: bool,
}

impl CcpDevice {
    pub fn new(
        io: Box<dyn PspIo>,
        irq: Box<dyn IrqLine>,
        proxy: Option<Box<dyn CcpProxy>>,
    ) -> CcpDevice {
        CcpDevice {
            io,
            irq,
            proxy,
            queues: [CcpQueue::new(), CcpQueue::new()],
            lsb: Box::new([0u8; CCP_LSB_SIZE]),
            sha: None,
            aes: None,
            zlib: None,
            cb_written_last: 0,
            irq_level: false,
        }
    }

    /// Returns the device to power-on state.
    pub fn reset(&mut self) {
        self.queues = [CcpQueue::new(), CcpQueue::new()];
        self.lsb.fill(0);
        self.drop_sessions();
        self.cb_written_last = 0;
        if self.irq_level {
            self.irq_level = false;
            self.irq.set(CCP_IRQ_PRIO, CCP_IRQ_DEV_ID, false);
        }
    }

    /// Local Storage Buffer contents, for debugger front-ends.
    pub fn lsb(&self) -> &[u8] {
        &self.lsb[..]
    }

    /// Mutable LSB access: debuggers, and test setup seeding key material.
    pub fn lsb_mut(&mut self) -> &mut [u8] {
        &mut self.lsb[..]
    }

    /// Bytes written into PSP-local memory by the most recent transfer.
    pub fn cb_written_last(&self) -> u32 {
        self.cb_written_last
    }

    pub(crate) fn drop_sessions(&mut self) {
        self.sha = None;
        self.aes = None;
        self.zlib = None;
    }

    fn update_irq(&mut self) {
        let level = self.queues.iter().any(|q| q.ien & q.ists != 0);
        if level != self.irq_level {
            self.irq_level = level;
            self.irq.set(CCP_IRQ_PRIO, CCP_IRQ_DEV_ID, level);
        }
    }

    fn queue_reg(offset: u64) -> Option<(usize, u32)> {
        let offset = u32::try_from(offset).ok()?;
        if offset < CCP5_Q_BASE {
            return None;
        }
        let idx = ((offset - CCP5_Q_BASE) / CCP5_Q_STRIDE) as usize;
        if idx >= CCP5_NUM_QUEUES {
            return None;
        }
        Some((idx, (offset - CCP5_Q_BASE) % CCP5_Q_STRIDE))
    }

    /// 32-bit read from the primary register region.
    pub fn mmio_read(&mut self, offset: u64, data: &mut [u8]) {
        if data.len() != 4 {
            warn!("ccp: unsupported read width {} at {:#x}", data.len(), offset);
            return;
        }
        let value = match Self::queue_reg(offset) {
            // Global registers read as zero in this model.
            None => 0,
            Some((idx, reg)) => {
                // Reads are one of the two deferred-execution triggers.
                self.drain_queue(idx);
                let q = &self.queues[idx];
                match reg {
                    CCP5_Q_CONTROL => q.ctrl,
                    CCP5_Q_TAIL_LO => q.tail,
                    CCP5_Q_HEAD_LO => q.head,
                    CCP5_Q_INT_ENABLE => q.ien,
                    CCP5_Q_INTERRUPT_STATUS => q.ists,
                    CCP5_Q_STATUS => q.status,
                    _ => {
                        debug!("ccp: read of unknown queue register {:#x}", reg);
                        0
                    }
                }
            }
        };
        data.copy_from_slice(&value.to_le_bytes());
        self.update_irq();
    }

    /// 32-bit write to the primary register region.
    pub fn mmio_write(&mut self, offset: u64, data: &[u8]) {
        let value = match data.try_into().map(u32::from_le_bytes) {
            Ok(v) => v,
            Err(_) => {
                warn!("ccp: unsupported write width {} at {:#x}", data.len(), offset);
                return;
            }
        };
        let Some((idx, reg)) = Self::queue_reg(offset) else {
            debug!("ccp: ignoring global register write at {:#x}", offset);
            return;
        };
        let q = &mut self.queues[idx];
        match reg {
            CCP5_Q_CONTROL => {
                // RUN is edge-latched and never reads back as set.
                q.enabled = value & CCP5_Q_CONTROL_RUN != 0;
                q.ctrl = value & !CCP5_Q_CONTROL_RUN;
            }
            CCP5_Q_TAIL_LO => q.tail = value,
            CCP5_Q_HEAD_LO => q.head = value,
            CCP5_Q_INT_ENABLE => q.ien = value,
            // Write-1-to-clear.
            CCP5_Q_INTERRUPT_STATUS => q.ists &= !value,
            CCP5_Q_STATUS => q.status = value,
            _ => debug!("ccp: write of unknown queue register {:#x}", reg),
        }
        // The second deferred-execution trigger: a write whose effect
        // leaves at least one interrupt enabled. The CONTROL write is
        // excluded so setting RUN never drains synchronously, even when
        // IEN is still enabled from an earlier run; firmware stack frames
        // depend on the start path returning before any DMA lands.
        if reg != CCP5_Q_CONTROL && self.queues[idx].ien != 0 {
            self.drain_queue(idx);
        }
        self.update_irq();
    }

    /// 32-bit read from the secondary register region.
    pub fn mmio2_read(&mut self, offset: u64, data: &mut [u8]) {
        if data.len() != 4 {
            warn!("ccp: unsupported read width {} at {:#x}", data.len(), offset);
            return;
        }
        let value = match u32::try_from(offset) {
            Ok(CCP5_MISC_CB_WRITTEN_LAST) => self.cb_written_last,
            Ok(CCP5_MISC_STATUS) => CCP5_MISC_STATUS_READY,
            _ => 0,
        };
        data.copy_from_slice(&value.to_le_bytes());
    }

    /// The secondary region is read-only; writes are dropped.
    pub fn mmio2_write(&mut self, offset: u64, data: &[u8]) {
        if data.len() != 4 {
            warn!("ccp: unsupported write width {} at {:#x}", data.len(), offset);
            return;
        }
        debug!("ccp: ignoring write to read-only region at {:#x}", offset);
    }
}

/// Primary MMIO window of a shared CCP device.
pub struct CcpMmio {
    dev: Arc<sync::Mutex<CcpDevice>>,
}

impl CcpMmio {
    pub fn new(dev: Arc<sync::Mutex<CcpDevice>>) -> CcpMmio {
        CcpMmio { dev }
    }
}

impl BusDevice for CcpMmio {
    fn debug_label(&self) -> String {
        "CCP".to_owned()
    }

    fn read(&mut self, info: BusAccessInfo, data: &mut [u8]) {
        self.dev.lock().mmio_read(info.offset, data)
    }

    fn write(&mut self, info: BusAccessInfo, data: &[u8]) {
        self.dev.lock().mmio_write(info.offset, data)
    }
}

/// Secondary MMIO window of a shared CCP device.
pub struct CcpMiscMmio {
    dev: Arc<sync::Mutex<CcpDevice>>,
}

impl CcpMiscMmio {
    pub fn new(dev: Arc<sync::Mutex<CcpDevice>>) -> CcpMiscMmio {
        CcpMiscMmio { dev }
    }
}

impl BusDevice for CcpMiscMmio {
    fn debug_label(&self) -> String {
        "CCP misc".to_owned()
    }

    fn read(&mut self, info: BusAccessInfo, data: &mut [u8]) {
        self.dev.lock().mmio2_read(info.offset, data)
    }

    fn write(&mut self, info: BusAccessInfo, data: &[u8]) {
        self.dev.lock().mmio2_write(info.offset, data)
    }
}


#[cfg(test)]
mod tests {
    use zerocopy::AsBytes;

    use ccp_sys::Ccp5Desc;
    use ccp_sys::CCP5_DESC_SIZE;
    use ccp_sys::CCP5_DW0_ENGINE_SHIFT;
    use ccp_sys::CCP5_INT_COMPLETION;
    use ccp_sys::CCP5_INT_ERROR;
    use ccp_sys::CCP5_INT_QUEUE_EMPTY;
    use ccp_sys::CCP5_INT_QUEUE_STOPPED;
    use ccp_sys::CCP5_Q_CONTROL_HALT;
    use ccp_sys::CCP5_STATUS_ERROR;
    use ccp_sys::CCP5_STATUS_MASK;
    use ccp_sys::CCP5_STATUS_SUCCESS;
    use ccp_sys::CCP_ENGINE_PASSTHRU;
    use ccp_sys::CCP_MEMTYPE_LOCAL;

    use super::test_utils::test_device;
    use super::*;

    const Q0: u64 = CCP5_Q_BASE as u64;
    const CTRL: u64 = Q0 + CCP5_Q_CONTROL as u64;
    const TAIL: u64 = Q0 + CCP5_Q_TAIL_LO as u64;
    const HEAD: u64 = Q0 + CCP5_Q_HEAD_LO as u64;
    const IEN: u64 = Q0 + CCP5_Q_INT_ENABLE as u64;
    const ISTS: u64 = Q0 + CCP5_Q_INTERRUPT_STATUS as u64;
    const STATUS: u64 = Q0 + CCP5_Q_STATUS as u64;

    fn write32(dev: &mut CcpDevice, offset: u64, value: u32) {
        dev.mmio_write(offset, &value.to_le_bytes());
    }

    fn read32(dev: &mut CcpDevice, offset: u64) -> u32 {
        let mut data = [0u8; 4];
        dev.mmio_read(offset, &mut data);
        u32::from_le_bytes(data)
    }

    fn copy_desc(src: u64, dst: u64, len: u32) -> Ccp5Desc {
        Ccp5Desc {
            dw0: (CCP_ENGINE_PASSTHRU as u32) << CCP5_DW0_ENGINE_SHIFT,
            length: len,
            src_lo: src as u32,
            dw3: (CCP_MEMTYPE_LOCAL as u32) << 16,
            dw4: dst as u32,
            dw5: (CCP_MEMTYPE_LOCAL as u32) << 16,
            key_lo: 0,
            dw7: 0,
        }
    }

    fn seed_desc(mem: &sync::Mutex<Vec<u8>>, ring: usize, index: usize, desc: &Ccp5Desc) {
        let at = ring + index * CCP5_DESC_SIZE;
        mem.lock()[at..at + CCP5_DESC_SIZE].copy_from_slice(desc.as_bytes());
    }

    #[test]
    fn run_write_does_not_execute() {
        let (mut dev, mem, _irq) = test_device();
        mem.lock()[0x2000..0x2004].copy_from_slice(&[1, 2, 3, 4]);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);

        // Nothing may have executed yet.
        assert_eq!(&mem.lock()[0x3000..0x3004], &[0, 0, 0, 0]);
        assert_eq!(dev.queues[0].head, 0x100);

        // The next register read drains the queue.
        assert_eq!(read32(&mut dev, HEAD), 0x120);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[1, 2, 3, 4]);
    }

    #[test]
    fn run_write_with_interrupts_already_enabled_does_not_execute() {
        let (mut dev, mem, _irq) = test_device();
        mem.lock()[0x2000..0x2004].copy_from_slice(&[4, 3, 2, 1]);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));

        // IEN is still enabled from an earlier run when firmware restarts
        // the queue, so the RUN write is the last register touched.
        write32(&mut dev, IEN, CCP5_INT_COMPLETION);
        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);

        // The RUN write itself must not have drained the queue.
        assert_eq!(&mem.lock()[0x3000..0x3004], &[0, 0, 0, 0]);
        assert_eq!(dev.queues[0].head, 0x100);

        assert_eq!(read32(&mut dev, HEAD), 0x120);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[4, 3, 2, 1]);
    }

    #[test]
    fn interrupt_enable_write_triggers_drain() {
        let (mut dev, mem, irq) = test_device();
        mem.lock()[0x2000..0x2004].copy_from_slice(&[9, 9, 9, 9]);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[0, 0, 0, 0]);

        write32(&mut dev, IEN, CCP5_INT_COMPLETION);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[9, 9, 9, 9]);
        assert_eq!(irq.lock().as_slice(), &[true]);
    }

    #[test]
    fn drains_in_order_and_halts() {
        let (mut dev, mem, irq) = test_device();
        // Three copies where each source is the previous destination, so
        // order matters.
        mem.lock()[0x2000..0x2004].copy_from_slice(&[7, 7, 7, 7]);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));
        seed_desc(&mem, 0x100, 1, &copy_desc(0x3000, 0x3100, 4));
        seed_desc(&mem, 0x100, 2, &copy_desc(0x3100, 0x3200, 4));

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x100 + 3 * CCP5_DESC_SIZE as u32);
        write32(&mut dev, CTRL, 1);
        write32(&mut dev, IEN, CCP5_INT_COMPLETION);

        assert_eq!(&mem.lock()[0x3200..0x3204], &[7, 7, 7, 7]);
        let ctrl = read32(&mut dev, CTRL);
        assert_ne!(ctrl & CCP5_Q_CONTROL_HALT, 0);
        // RUN must never read back.
        assert_eq!(ctrl & CCP5_Q_CONTROL_RUN, 0);
        assert_eq!(read32(&mut dev, HEAD), 0x100 + 3 * CCP5_DESC_SIZE as u32);
        assert_eq!(read32(&mut dev, STATUS) & CCP5_STATUS_MASK, CCP5_STATUS_SUCCESS);
        let ists = read32(&mut dev, ISTS);
        assert_ne!(ists & CCP5_INT_COMPLETION, 0);
        assert_ne!(ists & CCP5_INT_QUEUE_STOPPED, 0);
        assert_ne!(ists & CCP5_INT_QUEUE_EMPTY, 0);
        assert_eq!(irq.lock().last(), Some(&true));
    }

    #[test]
    fn failed_descriptor_faults_queue() {
        let (mut dev, mem, irq) = test_device();
        // Engine code 0xf does not exist.
        let bad = Ccp5Desc {
            dw0: 0xf << CCP5_DW0_ENGINE_SHIFT,
            ..Default::default()
        };
        seed_desc(&mem, 0x100, 0, &bad);
        seed_desc(&mem, 0x100, 1, &copy_desc(0x2000, 0x3000, 4));

        // A live hash session must not survive the fault.
        dev.sha = Some(super::sha::tests_session());

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x140);
        write32(&mut dev, CTRL, 1);
        write32(&mut dev, IEN, CCP5_INT_ERROR);

        assert_eq!(read32(&mut dev, STATUS) & CCP5_STATUS_MASK, CCP5_STATUS_ERROR);
        // Head stays on the failed descriptor; the one after never ran.
        assert_eq!(read32(&mut dev, HEAD), 0x100);
        assert_ne!(read32(&mut dev, ISTS) & CCP5_INT_ERROR, 0);
        assert_eq!(irq.lock().last(), Some(&true));
        assert!(dev.sha.is_none());
        // The queue needs a fresh RUN before it will drain again.
        assert!(!dev.queues[0].enabled);
    }

    #[test]
    fn ists_is_write_one_to_clear() {
        let (mut dev, _mem, _irq) = test_device();
        dev.queues[0].ists = CCP5_INT_COMPLETION | CCP5_INT_QUEUE_STOPPED;
        write32(&mut dev, ISTS, CCP5_INT_COMPLETION);
        assert_eq!(dev.queues[0].ists, CCP5_INT_QUEUE_STOPPED);
    }

    #[test]
    fn irq_deasserts_when_status_cleared() {
        let (mut dev, mem, irq) = test_device();
        mem.lock()[0x2000..0x2004].copy_from_slice(&[1, 1, 1, 1]);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);
        write32(&mut dev, IEN, CCP5_INT_COMPLETION);
        assert_eq!(irq.lock().last(), Some(&true));

        // Stop the queue, then acknowledge every status bit.
        write32(&mut dev, CTRL, 0);
        write32(&mut dev, ISTS, 0xf);
        assert_eq!(irq.lock().last(), Some(&false));
    }

    #[test]
    fn odd_access_widths_rejected() {
        let (mut dev, _mem, _irq) = test_device();
        let mut two = [0xaau8; 2];
        dev.mmio_read(CTRL, &mut two);
        // Untouched on a rejected read.
        assert_eq!(two, [0xaa, 0xaa]);
        dev.mmio_write(TAIL, &[1u8; 8]);
        assert_eq!(dev.queues[0].tail, 0);
    }

    #[test]
    fn global_registers_read_zero() {
        let (mut dev, _mem, _irq) = test_device();
        assert_eq!(read32(&mut dev, 0x0), 0);
        assert_eq!(read32(&mut dev, 0x8), 0);
        write32(&mut dev, 0x8, 0xffff_ffff);
        assert_eq!(read32(&mut dev, 0x8), 0);
    }

    #[test]
    fn second_queue_is_independent() {
        let (mut dev, mem, _irq) = test_device();
        mem.lock()[0x2000..0x2004].copy_from_slice(&[5, 5, 5, 5]);
        seed_desc(&mem, 0x200, 0, &copy_desc(0x2000, 0x3000, 4));

        let q1 = Q0 + CCP5_Q_STRIDE as u64;
        write32(&mut dev, q1 + CCP5_Q_HEAD_LO as u64, 0x200);
        write32(&mut dev, q1 + CCP5_Q_TAIL_LO as u64, 0x220);
        write32(&mut dev, q1 + CCP5_Q_CONTROL as u64, 1);

        // Accessing queue 0 must not drain queue 1.
        assert_eq!(read32(&mut dev, HEAD), 0);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[0, 0, 0, 0]);

        assert_eq!(read32(&mut dev, q1 + CCP5_Q_HEAD_LO as u64), 0x220);
        assert_eq!(&mem.lock()[0x3000..0x3004], &[5, 5, 5, 5]);
    }

    #[test]
    fn secondary_region_reports_written_bytes() {
        let (mut dev, mem, _irq) = test_device();
        mem.lock()[0x2000..0x2010].fill(3);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 16));

        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);
        let _ = read32(&mut dev, HEAD);

        let mut data = [0u8; 4];
        dev.mmio2_read(CCP5_MISC_CB_WRITTEN_LAST as u64, &mut data);
        assert_eq!(u32::from_le_bytes(data), 16);
        dev.mmio2_read(CCP5_MISC_STATUS as u64, &mut data);
        assert_eq!(u32::from_le_bytes(data), CCP5_MISC_STATUS_READY);
        dev.mmio2_read(0x0, &mut data);
        assert_eq!(u32::from_le_bytes(data), 0);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let (mut dev, mem, irq) = test_device();
        mem.lock()[0x2000..0x2004].fill(1);
        seed_desc(&mem, 0x100, 0, &copy_desc(0x2000, 0x3000, 4));
        write32(&mut dev, HEAD, 0x100);
        write32(&mut dev, TAIL, 0x120);
        write32(&mut dev, CTRL, 1);
        write32(&mut dev, IEN, CCP5_INT_COMPLETION);
        assert_eq!(irq.lock().last(), Some(&true));

        dev.reset();
        assert_eq!(irq.lock().last(), Some(&false));
        assert_eq!(dev.queues[0].head, 0);
        assert_eq!(dev.cb_written_last(), 0);
        assert!(dev.lsb().iter().all(|&b| b == 0));
    }
}
