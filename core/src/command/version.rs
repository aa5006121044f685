//! Firmware and PM table version queries.

use core::fmt;

use super::{Smu, SmuCommand};
use crate::error::CmdResult;
use crate::platform::{Command, MailboxKind};

// =============================================================================
// FIRMWARE VERSION
// =============================================================================

/// Packed SMU firmware version
///
/// ```text
/// ┌─────────┬───────┬───────┬───────┐
/// │ program │ major │ minor │ patch │
/// │ 31..24  │ 23..16│ 15..8 │  7..0 │
/// └─────────┴───────┴───────┴───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareVersion {
    /// Raw version word
    pub raw: u32,
}

impl FirmwareVersion {
    /// Wrap a raw version word
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    /// Firmware program (0 on most desktop parts)
    pub const fn program(&self) -> u8 {
        (self.raw >> 24) as u8
    }

    /// Major version
    pub const fn major(&self) -> u8 {
        (self.raw >> 16) as u8
    }

    /// Minor version
    pub const fn minor(&self) -> u8 {
        (self.raw >> 8) as u8
    }

    /// Patch level
    pub const fn patch(&self) -> u8 {
        self.raw as u8
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.program() != 0 {
            write!(f, "{}.", self.program())?;
        }
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Read the SMU firmware version
#[derive(Debug, Clone, Copy, Default)]
pub struct GetFirmwareVersion;

impl SmuCommand for GetFirmwareVersion {
    type Output = FirmwareVersion;

    fn execute(&self, smu: &Smu) -> CmdResult<FirmwareVersion> {
        let r = smu.send_preferred(
            MailboxKind::Rsmu,
            MailboxKind::Mp1,
            Command::GetSmuVersion,
            &[1],
        );
        let raw = r.arg(0).ok_or(r.status)?;
        smu.platform().store_firmware_version(raw);

        let version = FirmwareVersion::from_raw(raw);
        log::info!("smu: firmware {}", version);
        Ok(version)
    }
}

/// Read the PM table version
#[derive(Debug, Clone, Copy, Default)]
pub struct GetTableVersion;

impl SmuCommand for GetTableVersion {
    type Output = u32;

    fn execute(&self, smu: &Smu) -> CmdResult<u32> {
        let r = smu.send(MailboxKind::Rsmu, Command::GetTableVersion, &[]);
        let raw = r.arg(0).ok_or(r.status)?;
        if raw == 0 {
            log::warn!("smu: firmware reported PM table version 0");
        }
        smu.platform().store_table_version(raw);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CodeName;
    use crate::error::SmuStatus;
    use crate::testing::Bench;

    fn version_firmware(_: MailboxKind, cmd: u32, args: &mut [u32]) -> u32 {
        match cmd {
            0x2 => {
                args[0] = 0x0038_4C00;
                0x1
            },
            0x8 => {
                args[0] = 0x0038_0805;
                0x1
            },
            _ => 0xFE,
        }
    }

    #[test]
    fn test_version_decode() {
        let v = FirmwareVersion::from_raw(0x0038_4C00);
        assert_eq!((v.major(), v.minor(), v.patch()), (56, 76, 0));
        assert_eq!(std::format!("{}", v), "56.76.0");

        let v = FirmwareVersion::from_raw(0x0542_0A03);
        assert_eq!(v.program(), 5);
        assert_eq!(std::format!("{}", v), "5.66.10.3");
    }

    #[test]
    fn test_firmware_version_is_idempotent() {
        let bench = Bench::new(CodeName::Matisse, version_firmware);
        let a = bench.smu.firmware_version().unwrap();
        let b = bench.smu.firmware_version().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.raw, 0x0038_4C00);
        assert_eq!(bench.smu.platform().firmware_version(), 0x0038_4C00);
    }

    #[test]
    fn test_table_version_is_cached() {
        let bench = Bench::new(CodeName::Matisse, version_firmware);
        assert_eq!(bench.smu.platform().table_version(), 0);
        assert_eq!(bench.smu.table_version(), Ok(0x0038_0805));
        assert_eq!(bench.smu.platform().table_version(), 0x0038_0805);
    }

    #[test]
    fn test_failure_leaves_cache_alone() {
        let bench = Bench::new(CodeName::Matisse, |_, _, _| 0xFD);
        assert_eq!(bench.smu.firmware_version(), Err(SmuStatus::CmdRejectedPrereq));
        assert_eq!(bench.smu.platform().firmware_version(), 0);
    }

    #[test]
    fn test_zero_table_version_is_returned() {
        let bench = Bench::new(CodeName::Matisse, |_, cmd, args| {
            if cmd == 0x8 {
                args[0] = 0;
            }
            0x1
        });
        assert_eq!(bench.smu.table_version(), Ok(0));
        assert_eq!(bench.smu.platform().table_version(), 0);
    }

    #[test]
    fn test_zen1_has_no_table_version() {
        let bench = Bench::new(CodeName::SummitRidge, version_firmware);
        assert_eq!(bench.smu.table_version(), Err(SmuStatus::UnknownCommand));
    }
}
