// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! PASSTHROUGH engine: data movement with optional transforms.
//!
//! Firmware leans on two shapes only: the straight copy, and the 256-bit
//! byteswap it chains after SHA/RSA operations. Everything else the
//! hardware advertises (bitwise AND/OR/XOR/MASK, reflection, 32-bit swap)
//! is rejected.

use ccp_sys::pt_bitwise;
use ccp_sys::pt_byteswap;
use ccp_sys::pt_reflect;
use ccp_sys::CCP_PT_BITWISE_NOOP;
use ccp_sys::CCP_PT_BYTESWAP_256BIT;
use ccp_sys::CCP_PT_BYTESWAP_NOOP;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::ExecuteError;
use super::Result;
use super::XFER_CHUNK_SIZE;

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    if pt_bitwise(req.function) != CCP_PT_BITWISE_NOOP || pt_reflect(req.function) != 0 {
        return Err(ExecuteError::NotImplemented("passthrough bitwise/reflect"));
    }

    match pt_byteswap(req.function) {
        CCP_PT_BYTESWAP_NOOP => copy(dev, req),
        CCP_PT_BYTESWAP_256BIT if req.cb_src == 32 => byteswap256(dev, req),
        _ => Err(ExecuteError::NotImplemented("passthrough byteswap")),
    }
}

fn copy(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        req.cb_src as u64,
        req.dst_mem,
        req.dst_addr,
        req.cb_src as u64,
        false,
    );
    let mut buf = [0u8; XFER_CHUNK_SIZE];
    loop {
        let n = ctx.read(dev, &mut buf)?;
        if n == 0 {
            return Ok(());
        }
        ctx.write(dev, &buf[..n])?;
    }
}

fn byteswap256(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        32,
        req.dst_mem,
        req.dst_addr,
        32,
        true,
    );
    let mut buf = [0u8; 32];
    ctx.read_exact(dev, &mut buf)?;
    ctx.write(dev, &buf)
}
