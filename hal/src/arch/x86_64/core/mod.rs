//! # x86_64 Core Registers
//!
//! CPUID and model-specific register access used for processor
//! identification.

pub mod cpuid;
pub mod msr;

pub use cpuid::cpuid_count;
pub use msr::rdmsr;
