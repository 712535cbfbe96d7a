// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Per-queue state and the descriptor drain loop.

use log::debug;
use log::error;
use zerocopy::FromBytes;

use ccp_sys::Ccp5Desc;
use ccp_sys::CCP5_DESC_SIZE;
use ccp_sys::CCP5_INT_COMPLETION;
use ccp_sys::CCP5_INT_ERROR;
use ccp_sys::CCP5_INT_QUEUE_EMPTY;
use ccp_sys::CCP5_INT_QUEUE_STOPPED;
use ccp_sys::CCP5_Q_CONTROL_HALT;
use ccp_sys::CCP5_STATUS_ERROR;
use ccp_sys::CCP5_STATUS_MASK;
use ccp_sys::CCP5_STATUS_SUCCESS;

use super::request::CcpEngine;
use super::request::CcpRequest;
use super::CcpDevice;
use super::ExecuteError;
use super::Result;

/// Register state of one request queue.
///
/// `enabled` latches the last RUN bit written to the control register; the
/// bit itself never reads back.
#[derive(Default)]
pub(crate) struct CcpQueue {
    pub ctrl: u32,
    pub head: u32,
    pub tail: u32,
    pub status: u32,
    pub ien: u32,
    pub ists: u32,
    pub enabled: bool,
}

impl CcpQueue {
    pub fn new() -> CcpQueue {
        CcpQueue {
            // An idle queue shows HALT from power-on.
            ctrl: CCP5_Q_CONTROL_HALT,
            ..Default::default()
        }
    }

    fn set_status(&mut self, code: u32) {
        self.status = (self.status & !CCP5_STATUS_MASK) | (code & CCP5_STATUS_MASK);
    }
}

impl CcpDevice {
    /// Processes descriptors from head to tail if the queue has seen RUN.
    ///
    /// Never called from the RUN write itself: draining is deferred to the
    /// next queue-register read, or to a write that leaves interrupts
    /// enabled. Firmware depends on the start path returning before any
    /// DMA lands.
    pub(crate) fn drain_queue(&mut self, idx: usize) {
        if !self.queues[idx].enabled {
            return;
        }
        self.queues[idx].ctrl &= !CCP5_Q_CONTROL_HALT;

        while self.queues[idx].head != self.queues[idx].tail {
            let head = self.queues[idx].head;
            match self.run_descriptor(head as u64) {
                Ok(()) => {
                    let q = &mut self.queues[idx];
                    q.set_status(CCP5_STATUS_SUCCESS);
                    q.ists |= CCP5_INT_COMPLETION;
                    // Descriptors lie linearly; the ring never wraps.
                    q.head = head.wrapping_add(CCP5_DESC_SIZE as u32);
                }
                Err(e) => {
                    error!("ccp: queue {} request at {:#x} failed: {}", idx, head, e);
                    self.drop_sessions();
                    let q = &mut self.queues[idx];
                    q.set_status(CCP5_STATUS_ERROR);
                    q.ists |= CCP5_INT_ERROR;
                    // Fault the queue: leave head on the failed descriptor
                    // and require a fresh RUN to resume.
                    q.enabled = false;
                    break;
                }
            }
        }

        let q = &mut self.queues[idx];
        q.ctrl |= CCP5_Q_CONTROL_HALT;
        q.ists |= CCP5_INT_QUEUE_STOPPED;
        if q.head == q.tail {
            q.ists |= CCP5_INT_QUEUE_EMPTY;
        }
        self.update_irq();
    }

    fn run_descriptor(&mut self, addr: u64) -> Result<()> {
        let mut raw = [0u8; CCP5_DESC_SIZE];
        self.io.psp_read(addr, &mut raw).map_err(ExecuteError::Io)?;
        let desc = Ccp5Desc::read_from(&raw[..]).unwrap_or_default();
        let req = CcpRequest::decode(&desc)?;
        debug!(
            "ccp: engine {:?} function {:#x} cb {:#x} init {} eom {}",
            req.engine, req.function, req.cb_src, req.init, req.eom
        );
        self.dispatch(&req)
    }

    fn dispatch(&mut self, req: &CcpRequest) -> Result<()> {
        match req.engine {
            CcpEngine::Passthru => super::passthrough::execute(self, req),
            CcpEngine::Sha => super::sha::execute(self, req),
            CcpEngine::Aes => super::aes::execute(self, req),
            CcpEngine::Rsa => super::rsa::execute(self, req),
            CcpEngine::Ecc => super::ecc::execute(self, req),
            CcpEngine::Zlib => super::zlib::execute(self, req),
            CcpEngine::XtsAes128 => Err(ExecuteError::NotImplemented("xts-aes engine")),
            CcpEngine::Des3 => Err(ExecuteError::NotImplemented("des3 engine")),
        }
    }
}
