//! # PCI Configuration Mechanism #1
//!
//! Configuration space access through the legacy `0xCF8`/`0xCFC` port pair,
//! and the SMN index/data window layered on top of it.
//!
//! ```text
//! CONFIG_ADDRESS (0xCF8)
//! ┌───┬──────────┬──────┬────────┬──────────┬──────────┬────┐
//! │ E │ reserved │ bus  │ device │ function │ register │ 00 │
//! │31 │  30..24  │23..16│ 15..11 │  10..8   │   7..2   │1..0│
//! └───┴──────────┴──────┴────────┴──────────┴──────────┴────┘
//! ```
//!
//! PCI addresses in this crate use the packed `bus << 8 | dev << 3 | fn`
//! form, so the CONFIG_ADDRESS value is `E | pci_address << 8 | offset`.

use ::core::arch::asm;

use spin::Mutex;

use super::core::{cpuid_count, rdmsr};
use crate::error::IoResult;
use crate::transport::{CpuidResult, RegisterTransport, SmnWindow};

// =============================================================================
// Constants
// =============================================================================

/// CONFIG_ADDRESS port
const CONFIG_ADDRESS: u16 = 0xCF8;
/// CONFIG_DATA port
const CONFIG_DATA: u16 = 0xCFC;
/// Enable bit of CONFIG_ADDRESS
const CONFIG_ENABLE: u32 = 1 << 31;

// =============================================================================
// Port I/O
// =============================================================================

#[inline]
unsafe fn outl(port: u16, value: u32) {
    unsafe {
        asm!(
            "out dx, eax",
            in("dx") port,
            in("eax") value,
            options(nostack, nomem, preserves_flags),
        );
    }
}

#[inline]
unsafe fn inl(port: u16) -> u32 {
    let value: u32;
    unsafe {
        asm!(
            "in eax, dx",
            in("dx") port,
            out("eax") value,
            options(nostack, nomem, preserves_flags),
        );
    }
    value
}

/// Build the CONFIG_ADDRESS value for a packed PCI address and offset
#[inline]
pub const fn config_address(pci_address: u32, offset: u32) -> u32 {
    CONFIG_ENABLE | ((pci_address & 0xFFFF) << 8) | (offset & 0xFC)
}

// =============================================================================
// Port I/O Transport
// =============================================================================

/// Register transport that drives the hardware directly
///
/// Both the CF8/CFC pair and the SMN index/data pair are two-step accesses,
/// so every access holds an internal lock for its full sequence.
#[derive(Debug)]
pub struct PortIoTransport {
    window: SmnWindow,
    ports: Mutex<()>,
}

impl PortIoTransport {
    /// Create a transport using `window` for SMN access
    ///
    /// # Safety
    /// The caller must run in ring 0 (or with IOPL 3 and be certain no
    /// other agent uses CF8/CFC concurrently), and RDMSR must be permitted.
    pub unsafe fn new(window: SmnWindow) -> Self {
        log::debug!(
            "port io: SMN window at pci {:#x}, index {:#x}, data {:#x}",
            window.pci_address,
            window.index_offset,
            window.data_offset
        );
        Self {
            window,
            ports: Mutex::new(()),
        }
    }

    /// SMN window in use
    pub fn window(&self) -> SmnWindow {
        self.window
    }

    fn config_read(&self, pci_address: u32, offset: u32) -> u32 {
        // SAFETY: privilege guaranteed by the constructor contract
        unsafe {
            outl(CONFIG_ADDRESS, config_address(pci_address, offset));
            inl(CONFIG_DATA)
        }
    }

    fn config_write(&self, pci_address: u32, offset: u32, value: u32) {
        // SAFETY: privilege guaranteed by the constructor contract
        unsafe {
            outl(CONFIG_ADDRESS, config_address(pci_address, offset));
            outl(CONFIG_DATA, value);
        }
    }
}

impl RegisterTransport for PortIoTransport {
    fn read32(&self, addr: u32) -> IoResult<u32> {
        let w = self.window;
        let _ports = self.ports.lock();
        self.config_write(w.pci_address, w.index_offset, addr);
        Ok(self.config_read(w.pci_address, w.data_offset))
    }

    fn write32(&self, addr: u32, value: u32) -> IoResult<()> {
        let w = self.window;
        let _ports = self.ports.lock();
        self.config_write(w.pci_address, w.index_offset, addr);
        self.config_write(w.pci_address, w.data_offset, value);
        Ok(())
    }

    fn read_pci_config(&self, pci_address: u32, offset: u32) -> IoResult<u32> {
        let _ports = self.ports.lock();
        Ok(self.config_read(pci_address, offset))
    }

    fn write_pci_config(&self, pci_address: u32, offset: u32, value: u32) -> IoResult<()> {
        let _ports = self.ports.lock();
        self.config_write(pci_address, offset, value);
        Ok(())
    }

    fn read_msr(&self, index: u32) -> IoResult<(u32, u32)> {
        // SAFETY: privilege guaranteed by the constructor contract
        Ok(unsafe { rdmsr(index) })
    }

    fn read_cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult {
        cpuid_count(leaf, subleaf)
    }
}
