//! # x86_64 Register Access
//!
//! Bare-metal backend for the register transport.
//!
//! ## Module Organization
//!
//! - [`core`]: CPUID and model-specific registers
//!   - [`core::cpuid`]: leaf/subleaf execution
//!   - [`core::msr`]: RDMSR
//! - [`pci`]: PCI configuration mechanism #1 and [`PortIoTransport`]
//!
//! ## Safety
//!
//! RDMSR and port I/O need ring 0 (or IOPL 3 for the ports). Constructing
//! a [`PortIoTransport`] is `unsafe` for that reason; once constructed, its
//! trait methods are safe to call.

pub mod core;
pub mod pci;

pub use pci::PortIoTransport;
