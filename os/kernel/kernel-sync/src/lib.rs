//! # Kernel synchronization primitives
//!
//! A data-owning [`Mutex`] parameterized over a raw lock. [`TicketMutex`]
//! pairs it with a FIFO-fair ticket lock, for critical sections whose
//! holders may stay inside for a long time (page migration, bulk bitmap
//! scans) so that waiters are served in arrival order.
//!
//! The protected value is only reachable through the [`MutexGuard`], so
//! code that manipulates shared state takes `&mut T` from the guard and
//! cannot outlive the lock.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod mutex;
mod raw_ticket;

pub use mutex::{Mutex, MutexGuard};
pub use raw_ticket::RawTicket;

pub type TicketMutex<T> = Mutex<T, RawTicket>;

impl<T> TicketMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawTicket::new(), value)
    }
}

/// Acquire side of a raw lock.
pub trait RawLock {
    fn raw_lock(&self);
    fn raw_try_lock(&self) -> bool;
}

/// Release side of a raw lock.
pub trait RawUnlock {
    /// # Safety
    /// The caller must currently hold the lock.
    unsafe fn raw_unlock(&self);
}
