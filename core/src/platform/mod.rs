//! # Platform Configuration
//!
//! Per-silicon mailbox layouts and command ID tables.
//!
//! ```text
//! PlatformConfig
//! ├── smu_type        address / transfer conventions
//! ├── smn_window      PCI index/data pair for read_dword
//! ├── Rsmu  MailboxConfig { msg, rsp, arg, slots, CommandTable }
//! ├── Mp1   MailboxConfig { ... }
//! └── Hsmp  MailboxConfig { ... }
//! ```
//!
//! A mailbox with any zero address, or a command whose ID is zero, is how a
//! platform says "not on this silicon". The mailbox engine refuses both
//! before touching hardware.

pub mod registry;

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use zensmu_hal::SmnWindow;

pub use registry::config_for;

// =============================================================================
// MAILBOX KIND
// =============================================================================

/// Logical mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailboxKind {
    /// General-purpose mailbox (RSMU)
    Rsmu,
    /// Power-management mailbox (MP1)
    Mp1,
    /// Host system management port (HSMP)
    Hsmp,
}

impl MailboxKind {
    /// Every kind, in table order
    pub const ALL: [MailboxKind; 3] = [Self::Rsmu, Self::Mp1, Self::Hsmp];

    const fn index(self) -> usize {
        self as usize
    }

    const fn flag(self) -> MailboxSet {
        match self {
            Self::Rsmu => MailboxSet::RSMU,
            Self::Mp1 => MailboxSet::MP1,
            Self::Hsmp => MailboxSet::HSMP,
        }
    }
}

impl fmt::Display for MailboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsmu => write!(f, "RSMU"),
            Self::Mp1 => write!(f, "MP1"),
            Self::Hsmp => write!(f, "HSMP"),
        }
    }
}

bitflags! {
    /// Mailboxes a platform implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MailboxSet: u8 {
        /// General-purpose mailbox
        const RSMU = 1 << 0;
        /// Power-management mailbox
        const MP1 = 1 << 1;
        /// Host system management port
        const HSMP = 1 << 2;
    }
}

// =============================================================================
// SMU TYPE
// =============================================================================

/// Platform family tag; selects argument and address conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmuType {
    /// Zen desktop / server
    Cpu0,
    /// Zen+ desktop / workstation
    Cpu1,
    /// Zen 2 / Zen 3 desktop
    Cpu2,
    /// Zen 2 / Zen 3 server and workstation
    Cpu3,
    /// Zen 4 and later
    Cpu4,
    /// Raven-class APUs
    Apu0,
    /// Renoir-class APUs
    Apu1,
    /// Van Gogh / Rembrandt and later APUs
    Apu2,
    /// No known layout
    Unsupported,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Logical SMU operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Command {
    TestMessage,
    GetSmuVersion,
    GetTableVersion,
    TransferTableToDram,
    GetDramBaseAddress,
    EnableOcMode,
    DisableOcMode,
    SetOverclockFrequencyAllCores,
    SetOverclockFrequencyPerCore,
    SetOverclockCpuVid,
    SetPptLimit,
    SetTdcLimit,
    SetEdcLimit,
    SetHtcLimit,
    SetPboScalar,
    GetPboScalar,
    SetPsmMarginSingleCore,
    SetPsmMarginAllCores,
    GetPsmMarginSingleCore,
    IsOverclockable,
}

impl Command {
    /// Number of commands
    pub const COUNT: usize = Command::IsOverclockable as usize + 1;
}

/// Command ID table of one mailbox; 0 means "not implemented"
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CommandTable {
    ids: [u32; Command::COUNT],
}

impl CommandTable {
    /// Table with every command unimplemented
    pub const EMPTY: Self = Self {
        ids: [0; Command::COUNT],
    };

    /// Table with only the IDs every mailbox shares
    pub const fn base() -> Self {
        Self::EMPTY
            .with(Command::TestMessage, 0x1)
            .with(Command::GetSmuVersion, 0x2)
    }

    /// Copy of this table with `cmd` set to `id`
    pub const fn with(mut self, cmd: Command, id: u32) -> Self {
        self.ids[cmd as usize] = id;
        self
    }

    /// Copy of this table with every pair applied in order
    pub const fn with_all(mut self, ids: &[(Command, u32)]) -> Self {
        let mut i = 0;
        while i < ids.len() {
            self.ids[ids[i].0 as usize] = ids[i].1;
            i += 1;
        }
        self
    }

    /// ID of `cmd`, 0 when unimplemented
    pub const fn get(&self, cmd: Command) -> u32 {
        self.ids[cmd as usize]
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let implemented = self.ids.iter().filter(|id| **id != 0).count();
        f.debug_struct("CommandTable")
            .field("implemented", &implemented)
            .finish()
    }
}

// =============================================================================
// MAILBOX CONFIG
// =============================================================================

/// Register layout and command table of one mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxConfig {
    /// Which mailbox this is
    pub kind: MailboxKind,
    /// Message register
    pub msg_addr: u32,
    /// Response register
    pub rsp_addr: u32,
    /// First argument register
    pub arg_addr: u32,
    /// Argument registers, 4 bytes apart
    pub arg_slots: usize,
    /// Command IDs
    pub commands: CommandTable,
}

impl MailboxConfig {
    /// Argument block width of RSMU and MP1 mailboxes
    pub const DEFAULT_ARG_SLOTS: usize = 6;

    /// Mailbox with no registers; never dispatched
    pub const fn unsupported(kind: MailboxKind) -> Self {
        Self {
            kind,
            msg_addr: 0,
            rsp_addr: 0,
            arg_addr: 0,
            arg_slots: Self::DEFAULT_ARG_SLOTS,
            commands: CommandTable::EMPTY,
        }
    }

    /// Mailbox at the given registers with the shared base commands
    pub const fn new(kind: MailboxKind, msg_addr: u32, rsp_addr: u32, arg_addr: u32) -> Self {
        Self {
            kind,
            msg_addr,
            rsp_addr,
            arg_addr,
            arg_slots: Self::DEFAULT_ARG_SLOTS,
            commands: CommandTable::base(),
        }
    }

    /// All three registers are mapped
    pub const fn is_valid(&self) -> bool {
        self.msg_addr != 0 && self.rsp_addr != 0 && self.arg_addr != 0
    }

    /// ID of `cmd` on this mailbox, 0 when unimplemented
    pub const fn command_id(&self, cmd: Command) -> u32 {
        self.commands.get(cmd)
    }

    /// `cmd` can be dispatched on this mailbox
    pub const fn supports(&self, cmd: Command) -> bool {
        self.is_valid() && self.command_id(cmd) != 0
    }
}

// =============================================================================
// OVERRIDES
// =============================================================================

/// One change applied on top of a base platform record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    /// Replace the platform type tag
    Type(SmuType),
    /// Move a mailbox to new registers, keeping its commands
    Registers {
        /// Mailbox to move
        kind: MailboxKind,
        /// Message register
        msg: u32,
        /// Response register
        rsp: u32,
        /// First argument register
        arg: u32,
    },
    /// Change one command ID
    Id(MailboxKind, Command, u32),
    /// Change the argument block width
    Slots(MailboxKind, usize),
    /// Remove a mailbox
    Drop(MailboxKind),
}

// =============================================================================
// PLATFORM CONFIG
// =============================================================================

/// Everything the command layer needs to know about the running silicon
#[derive(Debug)]
pub struct PlatformConfig {
    smu_type: SmuType,
    smn_window: SmnWindow,
    mailboxes: [MailboxConfig; 3],
    firmware_version: AtomicU32,
    table_version: AtomicU32,
}

impl Clone for PlatformConfig {
    fn clone(&self) -> Self {
        Self {
            smu_type: self.smu_type,
            smn_window: self.smn_window,
            mailboxes: self.mailboxes,
            firmware_version: AtomicU32::new(self.firmware_version()),
            table_version: AtomicU32::new(self.table_version()),
        }
    }
}

impl PlatformConfig {
    /// Platform with the given mailboxes
    pub const fn new(
        smu_type: SmuType,
        rsmu: MailboxConfig,
        mp1: MailboxConfig,
        hsmp: MailboxConfig,
    ) -> Self {
        Self {
            smu_type,
            smn_window: SmnWindow::DEFAULT,
            mailboxes: [rsmu, mp1, hsmp],
            firmware_version: AtomicU32::new(0),
            table_version: AtomicU32::new(0),
        }
    }

    /// Platform whose every mailbox is invalid
    pub const fn unsupported() -> Self {
        Self::new(
            SmuType::Unsupported,
            MailboxConfig::unsupported(MailboxKind::Rsmu),
            MailboxConfig::unsupported(MailboxKind::Mp1),
            MailboxConfig::unsupported(MailboxKind::Hsmp),
        )
    }

    /// Apply overrides in order
    pub fn with_overrides(mut self, overrides: &[Override]) -> Self {
        for o in overrides {
            match *o {
                Override::Type(t) => self.smu_type = t,
                Override::Registers { kind, msg, rsp, arg } => {
                    let m = &mut self.mailboxes[kind.index()];
                    m.msg_addr = msg;
                    m.rsp_addr = rsp;
                    m.arg_addr = arg;
                },
                Override::Id(kind, cmd, id) => {
                    let m = &mut self.mailboxes[kind.index()];
                    m.commands = m.commands.with(cmd, id);
                },
                Override::Slots(kind, slots) => self.mailboxes[kind.index()].arg_slots = slots,
                Override::Drop(kind) => {
                    self.mailboxes[kind.index()] = MailboxConfig::unsupported(kind);
                },
            }
        }
        self
    }

    /// Use a different SMN window
    pub fn with_smn_window(mut self, window: SmnWindow) -> Self {
        self.smn_window = window;
        self
    }

    /// Platform type tag
    pub fn smu_type(&self) -> SmuType {
        self.smu_type
    }

    /// SMN window used by `read_dword`
    pub fn smn_window(&self) -> SmnWindow {
        self.smn_window
    }

    /// Mailbox of the given kind (possibly invalid)
    pub fn mailbox(&self, kind: MailboxKind) -> &MailboxConfig {
        &self.mailboxes[kind.index()]
    }

    /// Mailboxes with mapped registers
    pub fn supported(&self) -> MailboxSet {
        MailboxKind::ALL
            .iter()
            .filter(|k| self.mailbox(**k).is_valid())
            .fold(MailboxSet::empty(), |set, k| set | k.flag())
    }

    /// Last firmware version read, 0 before the first successful query
    pub fn firmware_version(&self) -> u32 {
        self.firmware_version.load(Ordering::Relaxed)
    }

    /// Last PM table version read, 0 before the first successful query
    pub fn table_version(&self) -> u32 {
        self.table_version.load(Ordering::Relaxed)
    }

    pub(crate) fn store_firmware_version(&self, raw: u32) {
        self.firmware_version.store(raw, Ordering::Relaxed);
    }

    pub(crate) fn store_table_version(&self, raw: u32) {
        self.table_version.store(raw, Ordering::Relaxed);
    }
}

static_assertions::assert_impl_all!(PlatformConfig: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlatformConfig {
        PlatformConfig::new(
            SmuType::Cpu2,
            MailboxConfig::new(MailboxKind::Rsmu, 0x10, 0x14, 0x18),
            MailboxConfig::unsupported(MailboxKind::Mp1),
            MailboxConfig::unsupported(MailboxKind::Hsmp),
        )
    }

    #[test]
    fn test_base_table() {
        let t = CommandTable::base();
        assert_eq!(t.get(Command::TestMessage), 0x1);
        assert_eq!(t.get(Command::GetSmuVersion), 0x2);
        assert_eq!(t.get(Command::GetPboScalar), 0);
    }

    #[test]
    fn test_with_all_applies_in_order() {
        let t = CommandTable::EMPTY.with_all(&[
            (Command::SetPptLimit, 0x53),
            (Command::SetPptLimit, 0x56),
        ]);
        assert_eq!(t.get(Command::SetPptLimit), 0x56);
    }

    #[test]
    fn test_validity() {
        let m = MailboxConfig::new(MailboxKind::Rsmu, 0x10, 0x14, 0x18);
        assert!(m.is_valid());
        assert!(m.supports(Command::TestMessage));
        assert!(!m.supports(Command::SetPboScalar));

        let u = MailboxConfig::unsupported(MailboxKind::Mp1);
        assert!(!u.is_valid());
        assert!(!u.supports(Command::TestMessage));

        let partial = MailboxConfig { rsp_addr: 0, ..m };
        assert!(!partial.is_valid());
    }

    #[test]
    fn test_overrides() {
        let p = sample().with_overrides(&[
            Override::Type(SmuType::Cpu3),
            Override::Id(MailboxKind::Rsmu, Command::SetPboScalar, 0x58),
            Override::Slots(MailboxKind::Rsmu, 8),
            Override::Registers {
                kind: MailboxKind::Mp1,
                msg: 0x20,
                rsp: 0x24,
                arg: 0x28,
            },
        ]);
        assert_eq!(p.smu_type(), SmuType::Cpu3);
        assert_eq!(p.mailbox(MailboxKind::Rsmu).command_id(Command::SetPboScalar), 0x58);
        assert_eq!(p.mailbox(MailboxKind::Rsmu).arg_slots, 8);
        assert!(p.mailbox(MailboxKind::Mp1).is_valid());
        assert_eq!(p.supported(), MailboxSet::RSMU | MailboxSet::MP1);

        let p = p.with_overrides(&[Override::Drop(MailboxKind::Rsmu)]);
        assert_eq!(p.supported(), MailboxSet::MP1);
    }

    #[test]
    fn test_version_cache() {
        let p = sample();
        assert_eq!(p.firmware_version(), 0);
        p.store_firmware_version(0x0038_4C00);
        p.store_table_version(0x0038_0805);
        let q = p.clone();
        assert_eq!(q.firmware_version(), 0x0038_4C00);
        assert_eq!(q.table_version(), 0x0038_0805);
    }

    #[test]
    fn test_unsupported_platform() {
        let p = PlatformConfig::unsupported();
        assert_eq!(p.supported(), MailboxSet::empty());
        assert_eq!(p.smu_type(), SmuType::Unsupported);
    }
}
