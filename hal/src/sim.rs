//! # Simulated Transport
//!
//! An in-process register file with a programmable SMU behind it.
//!
//! Mailboxes are registered with a firmware handler. Writing a mailbox's
//! message register runs the handler on the argument block, writes the
//! arguments back and stores the returned status in the response register,
//! which is what the real firmware does between "message written" and
//! "response non-zero".
//!
//! ```rust,ignore
//! let sim = SimTransport::new().with_mailbox(
//!     SimMailbox::new(0x03B1_0524, 0x03B1_0570, 0x03B1_0A40, 6, |cmd, args| {
//!         if cmd == 0x1 { args[0] += 1; 0x1 } else { 0xFE }
//!     }),
//! );
//! ```
//!
//! Faults can be injected per address, and every SMN access plus every
//! dispatched command is journaled for later assertions.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use spin::Mutex;

use crate::error::{IoError, IoResult};
use crate::transport::{CpuidResult, RegisterTransport, SmnWindow};

// =============================================================================
// TYPES
// =============================================================================

/// Firmware model: `(command id, argument block) -> response status`
pub type FirmwareHandler = Box<dyn FnMut(u32, &mut [u32]) -> u32 + Send>;

/// One simulated mailbox
pub struct SimMailbox {
    msg: u32,
    rsp: u32,
    arg: u32,
    slots: usize,
    handler: FirmwareHandler,
}

impl SimMailbox {
    /// Mailbox at the given register addresses with `slots` argument words
    pub fn new<F>(msg: u32, rsp: u32, arg: u32, slots: usize, handler: F) -> Self
    where
        F: FnMut(u32, &mut [u32]) -> u32 + Send + 'static,
    {
        Self {
            msg,
            rsp,
            arg,
            slots,
            handler: Box::new(handler),
        }
    }
}

impl core::fmt::Debug for SimMailbox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimMailbox")
            .field("msg", &self.msg)
            .field("rsp", &self.rsp)
            .field("arg", &self.arg)
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Journaled SMN access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `read32(addr)`
    Read(u32),
    /// `write32(addr, value)`
    Write(u32, u32),
}

/// A command that reached a simulated mailbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Message register the command was written to
    pub msg_addr: u32,
    /// Command ID
    pub id: u32,
    /// Argument block as seen by the firmware
    pub args: Vec<u32>,
    /// Status the firmware answered with
    pub status: u32,
}

/// Remaining injected failures; `u32::MAX` never runs out
type FaultBudget = BTreeMap<u32, u32>;

#[derive(Default)]
struct SimState {
    regs: BTreeMap<u32, u32>,
    pci: BTreeMap<(u32, u32), u32>,
    msrs: BTreeMap<u32, (u32, u32)>,
    cpuid: BTreeMap<(u32, u32), CpuidResult>,
    mailboxes: Vec<SimMailbox>,
    read_faults: FaultBudget,
    write_faults: FaultBudget,
    journal: Vec<Access>,
    dispatched: Vec<Dispatch>,
    smn_index: u32,
}

fn take_fault(budget: &mut FaultBudget, addr: u32) -> bool {
    match budget.get_mut(&addr) {
        Some(0) | None => false,
        Some(n) if *n == u32::MAX => true,
        Some(n) => {
            *n -= 1;
            true
        },
    }
}

impl SimState {
    fn smn_read(&mut self, addr: u32) -> IoResult<u32> {
        self.journal.push(Access::Read(addr));
        if take_fault(&mut self.read_faults, addr) {
            return Err(IoError::Device(addr));
        }
        Ok(self.regs.get(&addr).copied().unwrap_or(0))
    }

    fn smn_write(&mut self, addr: u32, value: u32) -> IoResult<()> {
        self.journal.push(Access::Write(addr, value));
        if take_fault(&mut self.write_faults, addr) {
            return Err(IoError::Device(addr));
        }
        self.regs.insert(addr, value);

        if let Some(idx) = self.mailboxes.iter().position(|m| m.msg == addr) {
            self.run_firmware(idx, value);
        }
        Ok(())
    }

    fn run_firmware(&mut self, idx: usize, id: u32) {
        let (msg, rsp, arg, slots) = {
            let m = &self.mailboxes[idx];
            (m.msg, m.rsp, m.arg, m.slots)
        };

        let mut args: Vec<u32> = (0..slots)
            .map(|i| {
                let a = arg.wrapping_add(4 * i as u32);
                self.regs.get(&a).copied().unwrap_or(0)
            })
            .collect();
        let seen = args.clone();

        let status = (self.mailboxes[idx].handler)(id, &mut args);

        for (i, value) in args.iter().enumerate() {
            self.regs.insert(arg.wrapping_add(4 * i as u32), *value);
        }
        self.regs.insert(rsp, status);
        self.dispatched.push(Dispatch {
            msg_addr: msg,
            id,
            args: seen,
            status,
        });
    }
}

// =============================================================================
// SIM TRANSPORT
// =============================================================================

/// Simulated register transport
pub struct SimTransport {
    window: SmnWindow,
    state: Mutex<SimState>,
}

impl core::fmt::Debug for SimTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimTransport")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Default for SimTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTransport {
    /// Empty register file; every SMN register reads 0
    pub fn new() -> Self {
        Self {
            window: SmnWindow::DEFAULT,
            state: Mutex::new(SimState::default()),
        }
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Preset an SMN register
    pub fn with_register(self, addr: u32, value: u32) -> Self {
        self.set_register(addr, value);
        self
    }

    /// Preset a CPUID leaf/subleaf
    pub fn with_cpuid(self, leaf: u32, subleaf: u32, result: CpuidResult) -> Self {
        self.state.lock().cpuid.insert((leaf, subleaf), result);
        self
    }

    /// Preset an MSR
    pub fn with_msr(self, index: u32, eax: u32, edx: u32) -> Self {
        self.state.lock().msrs.insert(index, (eax, edx));
        self
    }

    /// Preset a PCI configuration dword
    pub fn with_pci_config(self, pci_address: u32, offset: u32, value: u32) -> Self {
        self.state.lock().pci.insert((pci_address, offset), value);
        self
    }

    /// Attach a firmware mailbox; its response register starts out idle (OK)
    pub fn with_mailbox(self, mailbox: SimMailbox) -> Self {
        {
            let mut state = self.state.lock();
            state.regs.insert(mailbox.rsp, 0x1);
            state.mailboxes.push(mailbox);
        }
        self
    }

    // -------------------------------------------------------------------------
    // Runtime control
    // -------------------------------------------------------------------------

    /// Overwrite an SMN register without journaling
    pub fn set_register(&self, addr: u32, value: u32) {
        self.state.lock().regs.insert(addr, value);
    }

    /// Current SMN register value without journaling
    pub fn register(&self, addr: u32) -> u32 {
        self.state.lock().regs.get(&addr).copied().unwrap_or(0)
    }

    /// Fail the next `count` reads of `addr` (`u32::MAX`: forever)
    pub fn fail_reads(&self, addr: u32, count: u32) {
        self.state.lock().read_faults.insert(addr, count);
    }

    /// Fail the next `count` writes of `addr` (`u32::MAX`: forever)
    pub fn fail_writes(&self, addr: u32, count: u32) {
        self.state.lock().write_faults.insert(addr, count);
    }

    /// SMN accesses since creation or the last [`Self::clear_journal`]
    pub fn journal(&self) -> Vec<Access> {
        self.state.lock().journal.clone()
    }

    /// Commands the firmware model has handled, in order
    pub fn dispatched(&self) -> Vec<Dispatch> {
        self.state.lock().dispatched.clone()
    }

    /// Forget journaled accesses and dispatched commands
    pub fn clear_journal(&self) {
        let mut state = self.state.lock();
        state.journal.clear();
        state.dispatched.clear();
    }
}

impl RegisterTransport for SimTransport {
    fn read32(&self, addr: u32) -> IoResult<u32> {
        self.state.lock().smn_read(addr)
    }

    fn write32(&self, addr: u32, value: u32) -> IoResult<()> {
        self.state.lock().smn_write(addr, value)
    }

    fn read_pci_config(&self, pci_address: u32, offset: u32) -> IoResult<u32> {
        let mut state = self.state.lock();
        let w = self.window;
        if pci_address == w.pci_address && offset == w.data_offset {
            let index = state.smn_index;
            return state.smn_read(index);
        }
        Ok(state.pci.get(&(pci_address, offset)).copied().unwrap_or(0xFFFF_FFFF))
    }

    fn write_pci_config(&self, pci_address: u32, offset: u32, value: u32) -> IoResult<()> {
        let mut state = self.state.lock();
        let w = self.window;
        if pci_address == w.pci_address && offset == w.index_offset {
            state.smn_index = value;
            return Ok(());
        }
        if pci_address == w.pci_address && offset == w.data_offset {
            let index = state.smn_index;
            return state.smn_write(index, value);
        }
        state.pci.insert((pci_address, offset), value);
        Ok(())
    }

    fn read_msr(&self, index: u32) -> IoResult<(u32, u32)> {
        self.state
            .lock()
            .msrs
            .get(&index)
            .copied()
            .ok_or(IoError::Unmapped(index))
    }

    fn read_cpuid(&self, leaf: u32, subleaf: u32) -> CpuidResult {
        let state = self.state.lock();
        state
            .cpuid
            .get(&(leaf, subleaf))
            .or_else(|| state.cpuid.get(&(leaf, 0)))
            .copied()
            .unwrap_or_default()
    }
}
