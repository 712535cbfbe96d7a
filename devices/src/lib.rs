// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Emulated PSP hardware devices.

mod bus;
pub mod ccp;

pub use self::bus::BusAccessInfo;
pub use self::bus::BusDevice;
pub use self::ccp::CcpDevice;
pub use self::ccp::CcpMiscMmio;
pub use self::ccp::CcpMmio;
pub use self::ccp::CcpProxy;
pub use self::ccp::ExecuteError;
pub use self::ccp::IrqLine;
pub use self::ccp::MemType;
pub use self::ccp::PspIo;
