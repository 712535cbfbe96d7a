// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! ECC engine: prime-field and curve arithmetic on 576-bit operands.
//!
//! The request block starts with the field prime; the engine only accepts
//! the NIST P-384 prime and runs every curve operation on P-384
//! (`a = p - 3`). The curve-coefficient slot in the block is read and
//! discarded. Operands and results are 72-byte little-endian numbers; a
//! curve result is X then Y, and the point at infinity encodes as all
//! zeroes.

use once_cell::sync::Lazy;
use rsa::BigUint;

use ccp_sys::ecc_bits;
use ccp_sys::ecc_op;
use ccp_sys::CCP_ECC_MAX_BITS;
use ccp_sys::CCP_ECC_OPERAND_SIZE;
use ccp_sys::CCP_ECC_OP_ADD_FIELD;
use ccp_sys::CCP_ECC_OP_INV_FIELD;
use ccp_sys::CCP_ECC_OP_MUL_ADD_CURVE;
use ccp_sys::CCP_ECC_OP_MUL_CURVE;
use ccp_sys::CCP_ECC_OP_MUL_FIELD;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::ExecuteError;
use super::Result;

struct CurveP384 {
    p: BigUint,
    a: BigUint,
}

static P384: Lazy<CurveP384> = Lazy::new(|| {
    let one = BigUint::from(1u32);
    // 2^384 - 2^128 - 2^96 + 2^32 - 1
    let p = (&one << 384usize) - (&one << 128usize) - (&one << 96usize) + (&one << 32usize) - &one;
    let a = &p - BigUint::from(3u32);
    CurveP384 { p, a }
});

/// An affine point; `None` is the point at infinity.
type Point = Option<(BigUint, BigUint)>;

fn mod_add(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    (a + b) % p
}

fn mod_sub(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    // Operands are already reduced; lift `a` above `b` before subtracting.
    ((a + p) - b) % p
}

fn mod_mul(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    (a * b) % p
}

/// Inverse by Fermat: `v^(p-2) mod p`. Zero maps to zero, which is also
/// what the hardware hands back for the degenerate input.
fn mod_inv(v: &BigUint, p: &BigUint) -> BigUint {
    v.modpow(&(p - BigUint::from(2u32)), p)
}

fn point_double(pt: &Point, curve: &CurveP384) -> Point {
    let (x, y) = match pt {
        Some(p) => p,
        None => return None,
    };
    if *y == BigUint::from(0u32) {
        return None;
    }
    let p = &curve.p;
    // lambda = (3x^2 + a) / 2y
    let num = mod_add(&mod_mul(&BigUint::from(3u32), &mod_mul(x, x, p), p), &curve.a, p);
    let den = mod_inv(&mod_mul(&BigUint::from(2u32), y, p), p);
    let lambda = mod_mul(&num, &den, p);
    let x3 = mod_sub(&mod_sub(&mod_mul(&lambda, &lambda, p), x, p), x, p);
    let y3 = mod_sub(&mod_mul(&lambda, &mod_sub(x, &x3, p), p), y, p);
    Some((x3, y3))
}

fn point_add(lhs: &Point, rhs: &Point, curve: &CurveP384) -> Point {
    let (x1, y1) = match lhs {
        Some(p) => p,
        None => return rhs.clone(),
    };
    let (x2, y2) = match rhs {
        Some(p) => p,
        None => return lhs.clone(),
    };
    let p = &curve.p;
    if x1 == x2 {
        if mod_add(y1, y2, p) == BigUint::from(0u32) {
            return None;
        }
        return point_double(lhs, curve);
    }
    let lambda = mod_mul(&mod_sub(y2, y1, p), &mod_inv(&mod_sub(x2, x1, p), p), p);
    let x3 = mod_sub(&mod_sub(&mod_mul(&lambda, &lambda, p), x1, p), x2, p);
    let y3 = mod_sub(&mod_mul(&lambda, &mod_sub(x1, &x3, p), p), y1, p);
    Some((x3, y3))
}

/// Left-to-right double-and-add over the raw scalar bits; no reduction
/// modulo the group order, so `order * G` walks itself to infinity just as
/// the hardware does.
fn point_mul(k: &BigUint, pt: &Point, curve: &CurveP384) -> Point {
    let bytes = k.to_bytes_le();
    let mut acc: Point = None;
    for i in (0..bytes.len() * 8).rev() {
        acc = point_double(&acc, curve);
        if bytes[i / 8] >> (i % 8) & 1 == 1 {
            acc = point_add(&acc, pt, curve);
        }
    }
    acc
}

fn operand(block: &[u8], index: usize) -> BigUint {
    BigUint::from_bytes_le(&block[index * CCP_ECC_OPERAND_SIZE..(index + 1) * CCP_ECC_OPERAND_SIZE])
}

fn point_operand(block: &[u8], index: usize, p: &BigUint) -> Point {
    Some((operand(block, index) % p, operand(block, index + 1) % p))
}

fn push_operand(out: &mut Vec<u8>, value: &BigUint) {
    let mut bytes = value.to_bytes_le();
    bytes.resize(CCP_ECC_OPERAND_SIZE, 0);
    out.extend_from_slice(&bytes);
}

fn push_point(out: &mut Vec<u8>, pt: &Point) {
    match pt {
        Some((x, y)) => {
            push_operand(out, x);
            push_operand(out, y);
        }
        None => out.resize(out.len() + 2 * CCP_ECC_OPERAND_SIZE, 0),
    }
}

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    if ecc_bits(req.function) > CCP_ECC_MAX_BITS {
        return Err(ExecuteError::NotImplemented("ecc operand bit count"));
    }
    let op = ecc_op(req.function);
    // Request block: prime, then operands. Curve ops carry the (ignored)
    // curve coefficient between the prime and the scalar.
    let (operands, out_len) = match op {
        CCP_ECC_OP_MUL_FIELD | CCP_ECC_OP_ADD_FIELD | CCP_ECC_OP_INV_FIELD => {
            (3, CCP_ECC_OPERAND_SIZE)
        }
        CCP_ECC_OP_MUL_CURVE => (5, 2 * CCP_ECC_OPERAND_SIZE),
        CCP_ECC_OP_MUL_ADD_CURVE => (8, 2 * CCP_ECC_OPERAND_SIZE),
        _ => return Err(ExecuteError::NotImplemented("ecc operation")),
    };

    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        req.cb_src as u64,
        req.dst_mem,
        req.dst_addr,
        out_len as u64,
        false,
    );
    let mut block = vec![0u8; operands * CCP_ECC_OPERAND_SIZE];
    ctx.read_exact(dev, &mut block)?;

    let curve = &*P384;
    if operand(&block, 0) != curve.p {
        return Err(ExecuteError::NotImplemented("ecc prime"));
    }

    let mut out = Vec::with_capacity(out_len);
    match op {
        CCP_ECC_OP_MUL_FIELD => {
            let r = mod_mul(&operand(&block, 1), &operand(&block, 2), &curve.p);
            push_operand(&mut out, &r);
        }
        CCP_ECC_OP_ADD_FIELD => {
            let r = mod_add(&operand(&block, 1), &operand(&block, 2), &curve.p);
            push_operand(&mut out, &r);
        }
        CCP_ECC_OP_INV_FIELD => {
            let r = mod_inv(&(operand(&block, 1) % &curve.p), &curve.p);
            push_operand(&mut out, &r);
        }
        CCP_ECC_OP_MUL_CURVE => {
            let pt = point_operand(&block, 3, &curve.p);
            let r = point_mul(&operand(&block, 2), &pt, curve);
            push_point(&mut out, &r);
        }
        CCP_ECC_OP_MUL_ADD_CURVE => {
            let p1 = point_operand(&block, 3, &curve.p);
            let p2 = point_operand(&block, 6, &curve.p);
            let r1 = point_mul(&operand(&block, 2), &p1, curve);
            let r2 = point_mul(&operand(&block, 5), &p2, curve);
            let r = point_add(&r1, &r2, curve);
            push_point(&mut out, &r);
        }
        _ => return Err(ExecuteError::NotImplemented("ecc operation")),
    }
    ctx.write(dev, &out)
}
