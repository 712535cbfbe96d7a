// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Decoding of the 32-byte request descriptor into a dispatchable form.

use ccp_sys::desc_engine;
use ccp_sys::desc_eom;
use ccp_sys::desc_function;
use ccp_sys::desc_init;
use ccp_sys::mem_word_lsb_ctx;
use ccp_sys::Ccp5Desc;
use ccp_sys::CCP_ENGINE_AES;
use ccp_sys::CCP_ENGINE_DES3;
use ccp_sys::CCP_ENGINE_ECC;
use ccp_sys::CCP_ENGINE_PASSTHRU;
use ccp_sys::CCP_ENGINE_RSA;
use ccp_sys::CCP_ENGINE_SHA;
use ccp_sys::CCP_ENGINE_XTS_AES_128;
use ccp_sys::CCP_ENGINE_ZLIB_DECOMPRESS;
use ccp_sys::CCP_LSB_SLOT_SIZE;

use super::ExecuteError;
use super::MemType;
use super::Result;

/// The functional unit a descriptor targets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum CcpEngine {
    Aes,
    XtsAes128,
    Des3,
    Sha,
    Rsa,
    Passthru,
    Zlib,
    Ecc,
}

/// A decoded request descriptor.
///
/// For SHA requests the destination union carries the running message bit
/// count instead of an address; `dst_addr`/`dst_mem` are then unused and
/// the digest destination is the LSB slot named by `lsb_ctx`.
#[derive(Debug)]
pub(crate) struct CcpRequest {
    pub dw0: u32,
    pub engine: CcpEngine,
    pub function: u16,
    pub init: bool,
    pub eom: bool,
    pub cb_src: u32,
    pub src_addr: u64,
    pub src_mem: MemType,
    pub lsb_ctx: u8,
    pub dst_addr: u64,
    pub dst_mem: MemType,
    pub sha_bits: u64,
    pub key_addr: u64,
    pub key_mem: MemType,
}

fn addr48(lo: u32, hi16: u32) -> u64 {
    (lo as u64) | (((hi16 & 0xffff) as u64) << 32)
}

impl CcpRequest {
    pub fn decode(desc: &Ccp5Desc) -> Result<CcpRequest> {
        let engine = match desc_engine(desc.dw0) {
            CCP_ENGINE_AES => CcpEngine::Aes,
            CCP_ENGINE_XTS_AES_128 => CcpEngine::XtsAes128,
            CCP_ENGINE_DES3 => CcpEngine::Des3,
            CCP_ENGINE_SHA => CcpEngine::Sha,
            CCP_ENGINE_RSA => CcpEngine::Rsa,
            CCP_ENGINE_PASSTHRU => CcpEngine::Passthru,
            CCP_ENGINE_ZLIB_DECOMPRESS => CcpEngine::Zlib,
            CCP_ENGINE_ECC => CcpEngine::Ecc,
            other => return Err(ExecuteError::UnknownEngine(other)),
        };

        let src_word = (desc.dw3 >> 16) as u16;
        let key_word = (desc.dw7 >> 16) as u16;

        let (dst_addr, dst_mem, sha_bits) = if engine == CcpEngine::Sha {
            // SHA reuses the destination dwords for the message bit count.
            let bits = (desc.dw4 as u64) | ((desc.dw5 as u64) << 32);
            (0, MemType::Sb, bits)
        } else {
            let dst_word = (desc.dw5 >> 16) as u16;
            (
                addr48(desc.dw4, desc.dw5),
                MemType::from_word(dst_word)?,
                0,
            )
        };

        Ok(CcpRequest {
            dw0: desc.dw0,
            engine,
            function: desc_function(desc.dw0),
            init: desc_init(desc.dw0),
            eom: desc_eom(desc.dw0),
            cb_src: desc.length,
            src_addr: addr48(desc.src_lo, desc.dw3),
            src_mem: MemType::from_word(src_word)?,
            lsb_ctx: mem_word_lsb_ctx(src_word),
            dst_addr,
            dst_mem,
            sha_bits,
            key_addr: addr48(desc.key_lo, desc.dw7),
            key_mem: MemType::from_word(key_word)?,
        })
    }

    /// Byte address of the LSB slot named by the source memory-type word.
    pub fn lsb_slot_addr(&self) -> u64 {
        self.lsb_ctx as u64 * CCP_LSB_SLOT_SIZE as u64
    }
}
