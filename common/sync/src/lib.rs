// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Sync primitive wrappers that hide lock poisoning.
//!
//! A poisoned lock means another thread panicked while holding it; there is
//! no sensible way for device code to continue past that, so `lock` panics
//! instead of returning a `Result` every caller would have to unwrap.

use std::sync::Mutex as StdMutex;
use std::sync::MutexGuard;
use std::sync::TryLockError;

#[derive(Default, Debug)]
pub struct Mutex<T: ?Sized> {
    lock: StdMutex<T>,
}

impl<T> Mutex<T> {
    pub fn new(value: T) -> Mutex<T> {
        Mutex {
            lock: StdMutex::new(value),
        }
    }

    pub fn into_inner(self) -> T {
        match self.lock.into_inner() {
            Ok(value) => value,
            Err(_) => panic!("mutex is poisoned"),
        }
    }
}

impl<T: ?Sized> Mutex<T> {
    pub fn lock(&self) -> MutexGuard<T> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("mutex is poisoned"),
        }
    }

    pub fn try_lock(&self) -> Option<MutexGuard<T>> {
        match self.lock.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(_)) => panic!("mutex is poisoned"),
        }
    }
}
