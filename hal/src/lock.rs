//! # Bus Lock
//!
//! The mailbox registers are one shared hardware resource. Every mailbox,
//! every caller and every thread goes through a single lock, otherwise one
//! caller's arguments can end up paired with another caller's message ID.
//!
//! The lock is a dependency of the mailbox engine rather than a global, so a
//! host can share one [`BusLock`] between several engines and tests can swap
//! in [`NoopBusLock`].
//!
//! Release is tied to [`BusGuard`] being dropped, which covers every early
//! return path in the engine.

use core::hint::spin_loop;

use spin::Mutex;

// =============================================================================
// GUARD
// =============================================================================

/// Proof of bus ownership; the bus is released when this is dropped
#[must_use = "the bus is released as soon as the guard is dropped"]
pub struct BusGuard<'a> {
    _inner: GuardInner<'a>,
}

enum GuardInner<'a> {
    Spin(spin::MutexGuard<'a, ()>),
    #[cfg(feature = "std")]
    Std(std::sync::MutexGuard<'a, ()>),
    Noop,
}

impl core::fmt::Debug for BusGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self._inner {
            GuardInner::Spin(_) => "spin",
            #[cfg(feature = "std")]
            GuardInner::Std(_) => "std",
            GuardInner::Noop => "noop",
        };
        f.debug_struct("BusGuard").field("kind", &kind).finish()
    }
}

// =============================================================================
// LOCK TRAIT
// =============================================================================

/// Process-wide mailbox serialization
pub trait BusLock: Send + Sync {
    /// Try to take the bus, giving up after `timeout` units
    ///
    /// The unit depends on the implementation; see each type. `None` means
    /// the lock could not be acquired in time.
    fn try_lock_for(&self, timeout: u32) -> Option<BusGuard<'_>>;
}

static_assertions::assert_obj_safe!(BusLock);

// =============================================================================
// SPIN LOCK
// =============================================================================

/// Busy-wait iterations per timeout unit
const SPINS_PER_UNIT: u32 = 1000;

/// `no_std` bus lock built on `spin::Mutex`
///
/// One timeout unit is [`SPINS_PER_UNIT`] pause instructions, roughly a
/// microsecond on current parts.
#[derive(Debug, Default)]
pub struct SpinBusLock {
    inner: Mutex<()>,
}

impl SpinBusLock {
    /// Create an unlocked bus lock
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(()),
        }
    }
}

impl BusLock for SpinBusLock {
    fn try_lock_for(&self, timeout: u32) -> Option<BusGuard<'_>> {
        let mut waited = 0u32;
        loop {
            if let Some(guard) = self.inner.try_lock() {
                return Some(BusGuard {
                    _inner: GuardInner::Spin(guard),
                });
            }
            if waited >= timeout {
                log::debug!("bus lock: gave up after {} units", timeout);
                return None;
            }
            for _ in 0..SPINS_PER_UNIT {
                spin_loop();
            }
            waited += 1;
        }
    }
}

// =============================================================================
// NOOP LOCK
// =============================================================================

/// Lock that always succeeds immediately
///
/// For single-threaded tests and for hosts that already serialize access
/// at a higher level.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBusLock;

impl BusLock for NoopBusLock {
    fn try_lock_for(&self, _timeout: u32) -> Option<BusGuard<'_>> {
        Some(BusGuard {
            _inner: GuardInner::Noop,
        })
    }
}

// =============================================================================
// STD LOCK
// =============================================================================

/// Bus lock backed by `std::sync::Mutex`; one timeout unit is a millisecond
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct StdBusLock {
    inner: std::sync::Mutex<()>,
}

#[cfg(feature = "std")]
impl StdBusLock {
    /// Create an unlocked bus lock
    pub const fn new() -> Self {
        Self {
            inner: std::sync::Mutex::new(()),
        }
    }
}

#[cfg(feature = "std")]
impl BusLock for StdBusLock {
    fn try_lock_for(&self, timeout: u32) -> Option<BusGuard<'_>> {
        use std::sync::TryLockError;
        use std::time::{Duration, Instant};

        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout));
        loop {
            match self.inner.try_lock() {
                Ok(guard) => {
                    return Some(BusGuard {
                        _inner: GuardInner::Std(guard),
                    })
                },
                // A panicking holder leaves no partial mailbox state we care about
                Err(TryLockError::Poisoned(poisoned)) => {
                    log::warn!("bus lock: recovering from a poisoned holder");
                    return Some(BusGuard {
                        _inner: GuardInner::Std(poisoned.into_inner()),
                    })
                },
                Err(TryLockError::WouldBlock) => {},
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

static_assertions::assert_impl_all!(SpinBusLock: Send, Sync);
static_assertions::assert_impl_all!(NoopBusLock: Send, Sync);
