// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! AES engine: ECB and CBC with 128- or 256-bit keys.
//!
//! Keys and IVs sit big-endian in their memory regions and are byte
//! reversed on load. A message may span descriptors; the session carries
//! the CBC chain value and any partial block across them.
//!
//! Keys below `CCP_LSB_PROTECTED_END` in the LSB exist only on real
//! hardware. Those requests are forwarded whole to the configured proxy;
//! without a proxy the request still runs locally against whatever the
//! emulated LSB holds so firmware can make progress, but the output cannot
//! verify.

use aes::cipher::BlockDecrypt;
use aes::cipher::BlockEncrypt;
use aes::cipher::KeyInit;
use aes::Aes128;
use aes::Aes256;
use aes::Block;
use anyhow::anyhow;
use log::error;
use log::warn;

use ccp_sys::aes_encrypt;
use ccp_sys::aes_mode;
use ccp_sys::aes_size;
use ccp_sys::aes_type;
use ccp_sys::CCP5_STATUS_MASK;
use ccp_sys::CCP5_STATUS_SUCCESS;
use ccp_sys::CCP_AES_MODE_CBC;
use ccp_sys::CCP_AES_MODE_ECB;
use ccp_sys::CCP_AES_TYPE_128;
use ccp_sys::CCP_AES_TYPE_256;
use ccp_sys::CCP_LSB_PROTECTED_END;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::ExecuteError;
use super::MemType;
use super::Result;

/// The hardware streams cipher data through the engine in runs of at most
/// 512 bytes.
const AES_RUN_SIZE: usize = 512;

const AES_BLOCK_SIZE: usize = 16;

enum AesCipher {
    Aes128(Aes128),
    Aes256(Aes256),
}

impl AesCipher {
    fn encrypt_block(&self, block: &mut Block) {
        match self {
            AesCipher::Aes128(c) => c.encrypt_block(block),
            AesCipher::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt_block(&self, block: &mut Block) {
        match self {
            AesCipher::Aes128(c) => c.decrypt_block(block),
            AesCipher::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// An in-flight cipher session.
pub(crate) struct AesSession {
    cipher: AesCipher,
    mode: u16,
    encrypt: bool,
    iv: [u8; AES_BLOCK_SIZE],
    pending: Vec<u8>,
}

impl AesSession {
    /// Ciphers complete blocks of `data` in place. `data.len()` must be a
    /// multiple of the block size.
    fn process(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_exact_mut(AES_BLOCK_SIZE) {
            let mut block = Block::clone_from_slice(chunk);
            if self.mode == CCP_AES_MODE_CBC {
                if self.encrypt {
                    for (b, v) in block.iter_mut().zip(self.iv.iter()) {
                        *b ^= v;
                    }
                    self.cipher.encrypt_block(&mut block);
                    self.iv.copy_from_slice(&block);
                } else {
                    let mut ciphertext = [0u8; AES_BLOCK_SIZE];
                    ciphertext.copy_from_slice(chunk);
                    self.cipher.decrypt_block(&mut block);
                    for (b, v) in block.iter_mut().zip(self.iv.iter()) {
                        *b ^= v;
                    }
                    self.iv = ciphertext;
                }
            } else if self.encrypt {
                self.cipher.encrypt_block(&mut block);
            } else {
                self.cipher.decrypt_block(&mut block);
            }
            chunk.copy_from_slice(&block);
        }
    }
}

fn new_session(
    dev: &mut CcpDevice,
    req: &CcpRequest,
    mode: u16,
    encrypt: bool,
    key_len: usize,
) -> Result<AesSession> {
    let mut key = vec![0u8; key_len];
    dev.mem_read(req.key_mem, req.key_addr, &mut key)?;
    key.reverse();
    let cipher = match key_len {
        16 => AesCipher::Aes128(
            Aes128::new_from_slice(&key)
                .map_err(|_| ExecuteError::NotImplemented("aes key length"))?,
        ),
        _ => AesCipher::Aes256(
            Aes256::new_from_slice(&key)
                .map_err(|_| ExecuteError::NotImplemented("aes key length"))?,
        ),
    };
    let mut iv = [0u8; AES_BLOCK_SIZE];
    if mode == CCP_AES_MODE_CBC {
        dev.mem_read(MemType::Sb, req.lsb_slot_addr(), &mut iv)?;
        iv.reverse();
    }
    Ok(AesSession {
        cipher,
        mode,
        encrypt,
        iv,
        pending: Vec::new(),
    })
}

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    if aes_size(req.function) != 0 {
        return Err(ExecuteError::NotImplemented("aes size field"));
    }
    let mode = aes_mode(req.function);
    if mode != CCP_AES_MODE_ECB && mode != CCP_AES_MODE_CBC {
        return Err(ExecuteError::NotImplemented("aes mode"));
    }
    let key_len = match aes_type(req.function) {
        CCP_AES_TYPE_128 => 16,
        CCP_AES_TYPE_256 => 32,
        _ => return Err(ExecuteError::NotImplemented("aes key size")),
    };
    let encrypt = aes_encrypt(req.function);

    if req.key_mem == MemType::Sb && req.key_addr < CCP_LSB_PROTECTED_END {
        if dev.proxy.is_some() {
            return forward(dev, req, mode);
        }
        error!(
            "ccp: protected key at LSB {:#x} but no hardware proxy is configured; \
             executing locally, output will not verify",
            req.key_addr
        );
    }

    let mut session = match dev.aes.take() {
        Some(s) => s,
        None => new_session(dev, req, mode, encrypt, key_len)?,
    };
    if session.mode != mode || session.encrypt != encrypt {
        warn!("ccp: aes parameters changed mid-message; keeping live session");
    }

    let budget = req.cb_src as u64 + session.pending.len() as u64;
    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        req.cb_src as u64,
        req.dst_mem,
        req.dst_addr,
        budget,
        false,
    );

    let mut buf = [0u8; AES_RUN_SIZE];
    loop {
        let n = ctx.read(dev, &mut buf)?;
        if n == 0 {
            break;
        }
        session.pending.extend_from_slice(&buf[..n]);
        let whole = session.pending.len() / AES_BLOCK_SIZE * AES_BLOCK_SIZE;
        if whole > 0 {
            let mut run: Vec<u8> = session.pending.drain(..whole).collect();
            session.process(&mut run);
            ctx.write(dev, &run)?;
        }
    }

    if req.eom {
        if !session.pending.is_empty() {
            return Err(ExecuteError::BlockMisaligned);
        }
    } else {
        dev.aes = Some(session);
    }
    Ok(())
}

/// Forwards a protected-key request to the real CCP behind the proxy.
fn forward(dev: &mut CcpDevice, req: &CcpRequest, mode: u16) -> Result<()> {
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
    let mut src = vec![0u8; req.cb_src as usize];
    ctx.read_exact(dev, &mut src)?;

    let mut iv = [0u8; AES_BLOCK_SIZE];
    let iv_len = if mode == CCP_AES_MODE_CBC {
        dev.mem_read(MemType::Sb, req.lsb_slot_addr(), &mut iv)?;
        AES_BLOCK_SIZE
    } else {
        0
    };

    let mut out = vec![0u8; src.len()];
    let status = match dev.proxy.as_mut() {
        Some(proxy) => proxy
            .aes_do(req.dw0, &src, &mut out, req.key_addr, &iv[..iv_len])
            .map_err(ExecuteError::Proxy)?,
        None => return Err(ExecuteError::Proxy(anyhow!("proxy not configured"))),
    };
    if status & CCP5_STATUS_MASK != CCP5_STATUS_SUCCESS {
        return Err(ExecuteError::Proxy(anyhow!(
            "proxy returned status {status:#x}"
        )));
    }
    ctx.write(dev, &out)
}
