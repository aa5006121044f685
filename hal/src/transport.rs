//! # Register Transport
//!
//! The contract every backend satisfies, whether it pokes real hardware or
//! a simulated register file.
//!
//! ## Address spaces
//!
//! ```text
//! read32/write32          SMN (System Management Network) addresses, e.g.
//!                         the mailbox registers at 0x03B1_05xx
//! read_pci_config/...     PCI configuration space: (bus/dev/fn address, offset)
//! read_msr                model-specific registers of the calling core
//! read_cpuid              CPUID leaves of the calling core
//! ```
//!
//! SMN is reached through an index/data register pair in the configuration
//! space of the host bridge. [`SmnWindow`] names that pair.

use crate::error::IoResult;

// =============================================================================
// CPUID RESULT
// =============================================================================

/// Raw register output of one CPUID invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuidResult {
    /// EAX
    pub eax: u32,
    /// EBX
    pub ebx: u32,
    /// ECX
    pub ecx: u32,
    /// EDX
    pub edx: u32,
}

impl CpuidResult {
    /// Build from the four output registers
    pub const fn new(eax: u32, ebx: u32, ecx: u32, edx: u32) -> Self {
        Self { eax, ebx, ecx, edx }
    }
}

// =============================================================================
// SMN WINDOW
// =============================================================================

/// PCI configuration index/data pair that maps the SMN address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmnWindow {
    /// PCI address of the host bridge (bus 0, device 0, function 0)
    pub pci_address: u32,
    /// Config offset the SMN address is written to
    pub index_offset: u32,
    /// Config offset the SMN data is read from / written to
    pub data_offset: u32,
}

impl SmnWindow {
    /// Host bridge window used by every Zen generation so far
    pub const DEFAULT: Self = Self {
        pci_address: 0x0000_0000,
        index_offset: 0x60,
        data_offset: 0x64,
    };
}

impl Default for SmnWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Raw register access used by the SMU core
///
/// Implementations must be safe to share between threads; serialization of
/// mailbox traffic is the job of [`crate::BusLock`], not of the transport.
pub trait RegisterTransport: Send + Sync {
    /// Read a 32-bit value at an SMN address
    fn read32(&self, addr: u32) -> IoResult<u32>;

    /// Write a 32-bit value at an SMN address
    fn write32(&self, addr: u32, value: u32) -> IoResult<()>;

    /// Read a dword of PCI configuration space
    fn read_pci_config(&self, pci_address: u32, offset: u32) -> IoResult<u32>;

    /// Write a dword of PCI configuration space
    fn write_pci_config(&self, pci_address: u32, offset: u32, value: u32) -> IoResult<()>;

    /// Read a model-specific register, returning `(eax, edx)`
    fn read_msr(&self, index: u32) -> IoResult<(u32, u32)>;

    /// Execute CPUID for `leaf`/`subleaf`
    fn read_cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult;
}

static_assertions::assert_obj_safe!(RegisterTransport);
