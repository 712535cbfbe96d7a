// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! ZLIB decompression engine.
//!
//! Inflate state lives on the device between descriptors. Input streams
//! through a 4 KiB staging buffer; decompressed bytes accumulate in a
//! 4 KiB output buffer that flushes to the destination whenever it fills
//! and once more at end-of-message. Firmware learns the decompressed size
//! from the `cb_written_last` register afterwards.

use flate2::Decompress;
use flate2::FlushDecompress;
use flate2::Status;

use super::request::CcpRequest;
use super::transfer::XferCtx;
use super::CcpDevice;
use super::Result;
use super::XFER_CHUNK_SIZE;

pub(crate) struct ZlibSession {
    inflate: Decompress,
    out: Box<[u8; XFER_CHUNK_SIZE]>,
    out_len: usize,
    finished: bool,
}

impl ZlibSession {
    fn new() -> ZlibSession {
        ZlibSession {
            // Standard zlib wrapper, default window.
            inflate: Decompress::new(true),
            out: Box::new([0u8; XFER_CHUNK_SIZE]),
            out_len: 0,
            finished: false,
        }
    }
}

fn flush(dev: &mut CcpDevice, ctx: &mut XferCtx, session: &mut ZlibSession) -> Result<()> {
    if session.out_len > 0 {
        ctx.write(dev, &session.out[..session.out_len])?;
        session.out_len = 0;
    }
    Ok(())
}

pub(crate) fn execute(dev: &mut CcpDevice, req: &CcpRequest) -> Result<()> {
    let mut session = match dev.zlib.take() {
        Some(s) if !req.init => s,
        _ => ZlibSession::new(),
    };

    let mut ctx = XferCtx::new(
        dev,
        req.src_mem,
        req.src_addr,
        req.cb_src as u64,
        req.dst_mem,
        req.dst_addr,
        u64::MAX,
        false,
    );

    let mut staging = [0u8; XFER_CHUNK_SIZE];
    loop {
        let n = ctx.read(dev, &mut staging)?;
        if n == 0 {
            break;
        }
        let mut consumed = 0;
        while consumed < n && !session.finished {
            if session.out_len == session.out.len() {
                flush(dev, &mut ctx, &mut session)?;
            }
            let in_before = session.inflate.total_in();
            let out_before = session.inflate.total_out();
            let status = session.inflate.decompress(
                &staging[consumed..n],
                &mut session.out[session.out_len..],
                FlushDecompress::None,
            )?;
            let in_used = (session.inflate.total_in() - in_before) as usize;
            let out_made = (session.inflate.total_out() - out_before) as usize;
            consumed += in_used;
            session.out_len += out_made;

            match status {
                Status::StreamEnd => session.finished = true,
                Status::Ok => {}
                Status::BufError => {
                    if in_used == 0 && out_made == 0 && session.out_len < session.out.len() {
                        // The inflater wants input beyond this staging pass.
                        break;
                    }
                }
            }
        }
    }

    if req.eom {
        flush(dev, &mut ctx, &mut session)?;
    } else {
        dev.zlib = Some(session);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use super::super::test_utils::test_device;
    use super::super::test_utils::zlib_request;
    use super::super::ExecuteError;
    use super::*;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn inflate_single_request() {
        let (mut dev, mem, _irq) = test_device();
        let payload: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
        let compressed = deflate(&payload);
        mem.lock()[0x2000..0x2000 + compressed.len()].copy_from_slice(&compressed);

        let req = zlib_request(0x2000, compressed.len() as u32, 0x8000, true, true);
        execute(&mut dev, &req).unwrap();

        assert_eq!(&mem.lock()[0x8000..0x8000 + payload.len()], payload.as_slice());
        // Firmware reads the decompressed size from the counter.
        assert_eq!(dev.cb_written_last(), payload.len() as u32);
        assert!(dev.zlib.is_none());
    }

    #[test]
    fn inflate_split_across_requests() {
        let (mut dev, mem, _irq) = test_device();
        let payload: Vec<u8> = b"the quick brown fox jumps over the lazy dog"
            .iter()
            .cycle()
            .take(5000)
            .copied()
            .collect();
        let compressed = deflate(&payload);
        mem.lock()[0x2000..0x2000 + compressed.len()].copy_from_slice(&compressed);

        let cut = compressed.len() / 2;
        let req = zlib_request(0x2000, cut as u32, 0x8000, true, false);
        execute(&mut dev, &req).unwrap();
        assert!(dev.zlib.is_some());
        let written_so_far = dev.cb_written_last() as usize;

        let req = zlib_request(
            0x2000 + cut as u64,
            (compressed.len() - cut) as u32,
            0x8000 + written_so_far as u64,
            false,
            true,
        );
        execute(&mut dev, &req).unwrap();
        assert!(dev.zlib.is_none());
        assert_eq!(&mem.lock()[0x8000..0x8000 + payload.len()], payload.as_slice());
    }

    #[test]
    fn corrupt_stream_faults() {
        let (mut dev, mem, _irq) = test_device();
        mem.lock()[0x2000..0x2010].copy_from_slice(&[0xff; 16]);

        let req = zlib_request(0x2000, 16, 0x8000, true, true);
        assert!(matches!(
            execute(&mut dev, &req),
            Err(ExecuteError::Inflate(_))
        ));
    }

    #[test]
    fn trailing_input_after_stream_end_is_ignored() {
        let (mut dev, mem, _irq) = test_device();
        let payload = b"tail-tolerant".to_vec();
        let mut compressed = deflate(&payload);
        compressed.extend_from_slice(&[0xaa; 32]);
        mem.lock()[0x2000..0x2000 + compressed.len()].copy_from_slice(&compressed);

        let req = zlib_request(0x2000, compressed.len() as u32, 0x8000, true, true);
        execute(&mut dev, &req).unwrap();
        assert_eq!(&mem.lock()[0x8000..0x8000 + payload.len()], payload.as_slice());
        assert_eq!(dev.cb_written_last(), payload.len() as u32);
    }
}
