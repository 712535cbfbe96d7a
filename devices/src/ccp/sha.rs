// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! SHA engine: multi-part SHA-256/SHA-384 digests.
//!
//! A message may span any number of descriptors; the device holds one hash
//! context between them and finalizes on the `eom` descriptor. The final
//! digest goes to the LSB slot named by the source memory-type word, byte
//! reversed: firmware always follows up with a 256-bit byteswap
//! PASSTHROUGH, and reversing here lets that read back the natural order.

use log::warn;
use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;

use ccp_sys::sha_type;
use ccp_sys::CCP_SHA_TYPE_256;
use ccp_sys::CCP_SHA_TYPE_384;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::ExecuteError;
use super::MemType;
use super::Result;
use super::XFER_CHUNK_SIZE;

/// An in-flight hash context.
pub(crate) enum ShaSession {
    Sha256(Sha256),
    Sha384(Sha384),
}

impl ShaSession {
    fn new(sha_type: u16) -> Result<ShaSession> {
        match sha_type {
            CCP_SHA_TYPE_256 => Ok(ShaSession::Sha256(Sha256::new())),
            CCP_SHA_TYPE_384 => Ok(ShaSession::Sha384(Sha384::new())),
            _ => Err(ExecuteError::NotImplemented("sha type")),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            ShaSession::Sha256(h) => h.update(data),
            ShaSession::Sha384(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            ShaSession::Sha256(h) => h.finalize().to_vec(),
            ShaSession::Sha384(h) => h.finalize().to_vec(),
        }
    }

    fn digest_len(&self) -> usize {
        match self {
            ShaSession::Sha256(_) => 32,
            ShaSession::Sha384(_) => 48,
        }
    }
}

/// Seam for tests that need a live context on the device.
#[cfg(test)]
pub(crate) fn tests_session() -> ShaSession {
    ShaSession::Sha256(Sha256::new())
}

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    let requested = sha_type(req.function);

    // A context starts iff none exists. The descriptor's `init` flag is
    // advisory: hardware-observed behavior keeps a live context even when
    // the flag asks for a restart, and the initial state firmware placed in
    // the LSB is ignored in favor of the canonical IV.
    let requested_len = match requested {
        CCP_SHA_TYPE_256 => Some(32),
        CCP_SHA_TYPE_384 => Some(48),
        _ => None,
    };
    let mut session = match dev.sha.take() {
        Some(s) => s,
        None => ShaSession::new(requested)?,
    };
    if requested_len != Some(session.digest_len()) {
        warn!(
            "ccp: sha type {} requested mid-message; keeping live context",
            requested
        );
    }

    let digest_len = session.digest_len();
    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        req.cb_src as u64,
        MemType::Sb,
        req.lsb_slot_addr(),
        digest_len as u64,
        true,
    );

    let mut buf = [0u8; XFER_CHUNK_SIZE];
    loop {
        let n = ctx.read(dev, &mut buf)?;
        if n == 0 {
            break;
        }
        session.update(&buf[..n]);
    }

    if req.eom {
        let digest = session.finalize();
        ctx.write(dev, &digest)?;
    } else {
        dev.sha = Some(session);
    }
    Ok(())
}
