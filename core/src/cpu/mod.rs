//! # CPU Identity & Topology
//!
//! Runs once at startup. Identity comes from CPUID plus the microcode patch
//! level MSR; topology additionally needs fuse registers on the SMN.
//!
//! ```text
//! CPUID 0x1 ──► family / model / stepping ─┐
//! CPUID 0x8000_0001 ──► package type ──────┼──► CodeName ──► PlatformConfig
//!                                          │
//! SMN fuses ──► CCD map ──► CCD / CCX / cores-per-CCX
//! ```

pub mod identity;
pub mod topology;

pub use identity::{identify, CodeName, CpuIdentity, Family, PackageType};
pub use topology::{derive_topology, Topology};
