// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Register and descriptor ABI of the AMD CCP version 5.
//!
//! Everything here mirrors the hardware layout; the device model in the
//! `devices` crate interprets it. Constants are kept flat in the manner of
//! the other `*_sys` crates so firmware-facing code can name exactly the
//! bits it touches.

use zerocopy::AsBytes;
use zerocopy::FromBytes;
use zerocopy::FromZeroes;

/// One queue request descriptor as it lies in PSP memory, eight
/// little-endian dwords.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, FromZeroes, FromBytes, AsBytes)]
pub struct Ccp5Desc {
    pub dw0: u32,
    /// Source byte count.
    pub length: u32,
    pub src_lo: u32,
    /// Bits 0..16: src_hi. Bits 16..32: source memory-type word.
    pub dw3: u32,
    /// dst_lo, or the low half of the running SHA bit count.
    pub dw4: u32,
    /// Bits 0..16: dst_hi, bits 16..32: destination memory-type word, or
    /// the high half of the SHA bit count.
    pub dw5: u32,
    pub key_lo: u32,
    /// Bits 0..16: key_hi. Bits 16..32: key memory-type word.
    pub dw7: u32,
}

pub const CCP5_DESC_SIZE: usize = 32;

// dw0 layout.
pub const CCP5_DW0_SOC: u32 = 1 << 0;
pub const CCP5_DW0_IOC: u32 = 1 << 1;
pub const CCP5_DW0_INIT: u32 = 1 << 3;
pub const CCP5_DW0_EOM: u32 = 1 << 4;
pub const CCP5_DW0_FUNCTION_SHIFT: u32 = 5;
pub const CCP5_DW0_FUNCTION_MASK: u32 = 0x7fff;
pub const CCP5_DW0_ENGINE_SHIFT: u32 = 20;
pub const CCP5_DW0_ENGINE_MASK: u32 = 0xf;
pub const CCP5_DW0_PROT: u32 = 1 << 24;

pub fn desc_engine(dw0: u32) -> u8 {
    ((dw0 >> CCP5_DW0_ENGINE_SHIFT) & CCP5_DW0_ENGINE_MASK) as u8
}

pub fn desc_function(dw0: u32) -> u16 {
    ((dw0 >> CCP5_DW0_FUNCTION_SHIFT) & CCP5_DW0_FUNCTION_MASK) as u16
}

pub fn desc_init(dw0: u32) -> bool {
    dw0 & CCP5_DW0_INIT != 0
}

pub fn desc_eom(dw0: u32) -> bool {
    dw0 & CCP5_DW0_EOM != 0
}

// Memory-type word, found in the upper halves of dw3/dw5/dw7.
pub const CCP_MEMTYPE_MASK: u16 = 0x3;
pub const CCP_MEMTYPE_SYSTEM: u16 = 0;
pub const CCP_MEMTYPE_SB: u16 = 1;
pub const CCP_MEMTYPE_LOCAL: u16 = 2;
pub const CCP_LSB_CTX_SHIFT: u16 = 2;
pub const CCP_LSB_CTX_MASK: u16 = 0x7f;
pub const CCP_MEM_FIXED: u16 = 1 << 15;

pub fn mem_word_type(word: u16) -> u16 {
    word & CCP_MEMTYPE_MASK
}

pub fn mem_word_lsb_ctx(word: u16) -> u8 {
    ((word >> CCP_LSB_CTX_SHIFT) & CCP_LSB_CTX_MASK) as u8
}

pub fn mem_word_fixed(word: u16) -> bool {
    word & CCP_MEM_FIXED != 0
}

// Engine codes, dw0 bits 20..24.
pub const CCP_ENGINE_AES: u8 = 0;
pub const CCP_ENGINE_XTS_AES_128: u8 = 1;
pub const CCP_ENGINE_DES3: u8 = 2;
pub const CCP_ENGINE_SHA: u8 = 3;
pub const CCP_ENGINE_RSA: u8 = 4;
pub const CCP_ENGINE_PASSTHRU: u8 = 5;
pub const CCP_ENGINE_ZLIB_DECOMPRESS: u8 = 6;
pub const CCP_ENGINE_ECC: u8 = 7;

// PASSTHRU function field.
pub const CCP_PT_BYTESWAP_NOOP: u16 = 0;
pub const CCP_PT_BYTESWAP_32BIT: u16 = 1;
pub const CCP_PT_BYTESWAP_256BIT: u16 = 2;
pub const CCP_PT_BITWISE_NOOP: u16 = 0;
pub const CCP_PT_BITWISE_AND: u16 = 1;
pub const CCP_PT_BITWISE_OR: u16 = 2;
pub const CCP_PT_BITWISE_XOR: u16 = 3;
pub const CCP_PT_BITWISE_MASK: u16 = 4;

pub fn pt_byteswap(function: u16) -> u16 {
    function & 0x3
}

pub fn pt_bitwise(function: u16) -> u16 {
    (function >> 2) & 0x7
}

pub fn pt_reflect(function: u16) -> u16 {
    (function >> 5) & 0x3
}

// SHA function field.
pub const CCP_SHA_TYPE_1: u16 = 1;
pub const CCP_SHA_TYPE_224: u16 = 2;
pub const CCP_SHA_TYPE_256: u16 = 3;
pub const CCP_SHA_TYPE_384: u16 = 4;
pub const CCP_SHA_TYPE_512: u16 = 5;

pub fn sha_type(function: u16) -> u16 {
    (function >> 10) & 0xf
}

// AES function field.
pub const CCP_AES_TYPE_128: u16 = 0;
pub const CCP_AES_TYPE_192: u16 = 1;
pub const CCP_AES_TYPE_256: u16 = 2;
pub const CCP_AES_MODE_ECB: u16 = 0;
pub const CCP_AES_MODE_CBC: u16 = 1;
pub const CCP_AES_MODE_OFB: u16 = 2;
pub const CCP_AES_MODE_CFB: u16 = 3;
pub const CCP_AES_MODE_CTR: u16 = 4;
pub const CCP_AES_MODE_CMAC: u16 = 5;

pub fn aes_size(function: u16) -> u16 {
    function & 0x7f
}

pub fn aes_encrypt(function: u16) -> bool {
    function & (1 << 7) != 0
}

pub fn aes_mode(function: u16) -> u16 {
    (function >> 8) & 0x1f
}

pub fn aes_type(function: u16) -> u16 {
    (function >> 13) & 0x3
}

// RSA function field.
pub fn rsa_mode(function: u16) -> u16 {
    function & 0x7
}

pub fn rsa_size(function: u16) -> u16 {
    (function >> 3) & 0xfff
}

// ECC function field.
pub const CCP_ECC_OP_MUL_FIELD: u16 = 1;
pub const CCP_ECC_OP_ADD_FIELD: u16 = 2;
pub const CCP_ECC_OP_INV_FIELD: u16 = 3;
pub const CCP_ECC_OP_MUL_CURVE: u16 = 4;
pub const CCP_ECC_OP_MUL_ADD_CURVE: u16 = 5;
/// ECC operands are 576-bit little-endian numbers.
pub const CCP_ECC_OPERAND_SIZE: usize = 72;
pub const CCP_ECC_MAX_BITS: u16 = 576;

pub fn ecc_bits(function: u16) -> u16 {
    function & 0x3ff
}

pub fn ecc_op(function: u16) -> u16 {
    (function >> 12) & 0x7
}

// Local Storage Buffer geometry.
pub const CCP_LSB_SIZE: usize = 4096;
pub const CCP_LSB_SLOT_SIZE: usize = 32;
pub const CCP_LSB_SLOT_COUNT: usize = 128;
/// SB key addresses below this boundary belong to protected keys that never
/// leave real hardware.
pub const CCP_LSB_PROTECTED_END: u64 = 0xa0;

// Primary MMIO region: two queue register blocks.
pub const CCP5_Q_BASE: u32 = 0x1000;
pub const CCP5_Q_STRIDE: u32 = 0x1000;
pub const CCP5_NUM_QUEUES: usize = 2;

// Per-queue register offsets within a queue block.
pub const CCP5_Q_CONTROL: u32 = 0x00;
pub const CCP5_Q_TAIL_LO: u32 = 0x04;
pub const CCP5_Q_HEAD_LO: u32 = 0x08;
pub const CCP5_Q_INT_ENABLE: u32 = 0x0c;
pub const CCP5_Q_INTERRUPT_STATUS: u32 = 0x10;
pub const CCP5_Q_STATUS: u32 = 0x100;

// Queue control register bits.
pub const CCP5_Q_CONTROL_RUN: u32 = 1 << 0;
pub const CCP5_Q_CONTROL_HALT: u32 = 1 << 1;
pub const CCP5_Q_CONTROL_SIZE_SHIFT: u32 = 3;
pub const CCP5_Q_CONTROL_SIZE_MASK: u32 = 0x1f;

// Interrupt enable/status bits.
pub const CCP5_INT_COMPLETION: u32 = 1 << 0;
pub const CCP5_INT_ERROR: u32 = 1 << 1;
pub const CCP5_INT_QUEUE_STOPPED: u32 = 1 << 2;
pub const CCP5_INT_QUEUE_EMPTY: u32 = 1 << 3;

// Queue status register: outcome code in the low six bits.
pub const CCP5_STATUS_MASK: u32 = 0x3f;
pub const CCP5_STATUS_SUCCESS: u32 = 0;
pub const CCP5_STATUS_ERROR: u32 = 1;

// Secondary MMIO region offsets.
pub const CCP5_MISC_CB_WRITTEN_LAST: u32 = 0x28;
pub const CCP5_MISC_STATUS: u32 = 0x38;
pub const CCP5_MISC_STATUS_READY: u32 = 0x1;

// Interrupt line identity on the PSP interrupt controller.
pub const CCP_IRQ_PRIO: u32 = 0;
pub const CCP_IRQ_DEV_ID: u32 = 0x15;
