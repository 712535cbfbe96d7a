// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! RSA engine: raw modular exponentiation at 2048 and 4096 bits.
//!
//! The key region holds the exponent, the source region the modulus
//! followed by the message, all little-endian. The hardware computes
//! `m^e mod n` with no padding and returns the result big-endian; the
//! reverse-mode write below flips it so firmware reads little-endian.

use std::io;

use rsa::BigUint;

use ccp_sys::rsa_mode;
use ccp_sys::rsa_size;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::ExecuteError;
use super::Result;

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    if rsa_mode(req.function) != 0 {
        return Err(ExecuteError::NotImplemented("rsa mode"));
    }
    let size = rsa_size(req.function) as usize;
    if size != 256 && size != 512 {
        return Err(ExecuteError::NotImplemented("rsa key size"));
    }
    if req.cb_src as usize != 2 * size {
        return Err(ExecuteError::NotImplemented("rsa source length"));
    }

    let mut exponent = vec![0u8; size];
    dev.mem_read(req.key_mem, req.key_addr, &mut exponent)?;

    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        (2 * size) as u64,
        req.dst_mem,
        req.dst_addr,
        size as u64,
        true,
    );
    let mut modulus = vec![0u8; size];
    ctx.read_exact(dev, &mut modulus)?;
    let mut message = vec![0u8; size];
    ctx.read_exact(dev, &mut message)?;

    let n = BigUint::from_bytes_le(&modulus);
    if n == BigUint::from(0u32) {
        return Err(ExecuteError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "rsa modulus is zero",
        )));
    }
    let e = BigUint::from_bytes_le(&exponent);
    let m = BigUint::from_bytes_le(&message);

    let result = m.modpow(&e, &n);
    let bytes = result.to_bytes_be();
    let mut out = vec![0u8; size - bytes.len()];
    out.extend_from_slice(&bytes);
    ctx.write(dev, &out)
}
