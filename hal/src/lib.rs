//! # ZenSMU Hardware Abstraction Layer
//!
//! Register transport and bus locking for talking to the AMD System
//! Management Unit.
//!
//! Everything above this crate speaks in terms of 32-bit configuration bus
//! (SMN) addresses. How those addresses are reached is the transport's
//! business: direct port I/O on bare metal, a kernel bridge on a hosted OS,
//! or an in-process register file in tests.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        zensmu-hal                           │
//! │  ┌─────────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │    Transport    │  │   BusLock   │  │      Arch       │  │
//! │  │ (SMN, PCI cfg,  │  │ (Spin, Std, │  │ (CPUID, RDMSR,  │  │
//! │  │  MSR, CPUID)    │  │  Noop)      │  │  port I/O)      │  │
//! │  └─────────────────┘  └─────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `x86_64`: [`arch::x86_64::PortIoTransport`], direct hardware access
//! - `sim`: [`sim::SimTransport`], a simulated SMU for tests
//! - `std`: [`lock::StdBusLock`], an OS mutex with millisecond waits

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod arch;
pub mod error;
pub mod lock;
pub mod transport;

#[cfg(any(feature = "sim", test))]
pub mod sim;

// Re-exports for convenience
pub use error::{IoError, IoResult};
pub use lock::{BusGuard, BusLock, NoopBusLock, SpinBusLock};
pub use transport::{CpuidResult, RegisterTransport, SmnWindow};

#[cfg(feature = "std")]
pub use lock::StdBusLock;

#[cfg(any(feature = "sim", test))]
pub use sim::SimTransport;
