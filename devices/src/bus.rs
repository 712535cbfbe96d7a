// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Handles routing to devices in an address space.

/// Information about how a device was accessed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct BusAccessInfo {
    /// Offset from base address that the device was accessed at.
    pub offset: u64,
    /// Absolute address of the device access.
    pub address: u64,
}

// Implement `Display` for `BusAccessInfo`.
impl std::fmt::Display for BusAccessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Trait for devices that respond to reads or writes in an arbitrary address
/// space.
///
/// The device does not care where it exists in address space as each method
/// is only passed an offset into its allocated portion of address space.
pub trait BusDevice: Send {
    /// Returns a label suitable for debug output.
    fn debug_label(&self) -> String;

    /// Reads at `offset` from this device.
    fn read(&mut self, offset: BusAccessInfo, data: &mut [u8]);

    /// Writes at `offset` into this device.
    fn write(&mut self, offset: BusAccessInfo, data: &[u8]);
}
