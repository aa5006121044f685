//! # PM Table Commands
//!
//! The firmware keeps its power-management table in DRAM. These commands
//! locate it and ask for a refresh; parsing the table is out of scope.
//!
//! ## Base address conventions
//!
//! ```text
//! Cpu0, Cpu1      probe (id - 1) ─► fetch (id) ─► confirm (id + 1)
//!                 only the fetch result is kept; all three must succeed
//! Apu0            (id [3], id + 1 [3]) ─► low
//!                 (id [5], id + 1 [5]) ─► high
//! Apu1, Apu2      one call, arg1:arg0
//! Cpu2..Cpu4      one call, arg0
//! ```
//!
//! The multi-step forms run as separate locked exchanges. Another caller
//! can interleave between the steps.

use super::{Smu, SmuCommand};
use crate::error::{CmdResult, SmuStatus};
use crate::platform::{Command, MailboxKind, SmuType};

// =============================================================================
// TRANSFER
// =============================================================================

/// Ask the firmware to copy its PM table to DRAM
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferTableToDram;

impl TransferTableToDram {
    /// Argument block that starts a transfer on `smu_type`
    pub const fn args(smu_type: SmuType) -> [u32; 2] {
        match smu_type {
            SmuType::Apu1 => [3, 0],
            _ => [1, 1],
        }
    }
}

impl SmuCommand for TransferTableToDram {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        let args = Self::args(smu.platform().smu_type());
        smu.send(MailboxKind::Rsmu, Command::TransferTableToDram, &args)
            .status
            .check()
    }
}

// =============================================================================
// DRAM BASE ADDRESS
// =============================================================================

/// Physical address of the PM table
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDramBaseAddress;

impl GetDramBaseAddress {
    fn single(smu: &Smu, id: u32, args: &[u32]) -> CmdResult<u32> {
        let r = smu.send_raw(MailboxKind::Rsmu, id, args);
        r.arg(0).ok_or(r.status)
    }

    fn handshake(smu: &Smu, id: u32) -> CmdResult<u64> {
        let probe = id.checked_sub(1).ok_or(SmuStatus::UnknownCommand)?;
        let confirm = id.checked_add(1).ok_or(SmuStatus::UnknownCommand)?;

        Self::single(smu, probe, &[0])?;
        let address = Self::single(smu, id, &[0])?;
        Self::single(smu, confirm, &[0])?;
        Ok(u64::from(address))
    }

    fn selector_pair(smu: &Smu, id: u32, selector: u32) -> CmdResult<u32> {
        let read = id.checked_add(1).ok_or(SmuStatus::UnknownCommand)?;
        Self::single(smu, id, &[selector])?;
        Self::single(smu, read, &[selector])
    }
}

impl SmuCommand for GetDramBaseAddress {
    type Output = u64;

    fn execute(&self, smu: &Smu) -> CmdResult<u64> {
        let id = smu
            .platform()
            .mailbox(MailboxKind::Rsmu)
            .command_id(Command::GetDramBaseAddress);
        if id == 0 {
            return Err(SmuStatus::UnknownCommand);
        }

        let address = match smu.platform().smu_type() {
            SmuType::Cpu0 | SmuType::Cpu1 => Self::handshake(smu, id)?,
            SmuType::Apu0 => {
                let low = Self::selector_pair(smu, id, 3)?;
                let high = Self::selector_pair(smu, id, 5)?;
                (u64::from(high) << 32) | u64::from(low)
            },
            SmuType::Apu1 | SmuType::Apu2 => {
                let r = smu.send_raw(MailboxKind::Rsmu, id, &[0]);
                r.arg_u64(0, 1).ok_or(r.status)?
            },
            SmuType::Cpu2 | SmuType::Cpu3 | SmuType::Cpu4 => {
                u64::from(Self::single(smu, id, &[0])?)
            },
            SmuType::Unsupported => return Err(SmuStatus::UnknownCommand),
        };

        log::debug!("smu: PM table at {:#x}", address);
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CodeName;
    use crate::testing::Bench;
    use std::vec;

    #[test]
    fn test_transfer_args_by_type() {
        assert_eq!(TransferTableToDram::args(SmuType::Apu1), [3, 0]);
        assert_eq!(TransferTableToDram::args(SmuType::Cpu2), [1, 1]);
        assert_eq!(TransferTableToDram::args(SmuType::Apu2), [1, 1]);
    }

    #[test]
    fn test_transfer_sends_platform_args() {
        let bench = Bench::new(CodeName::Renoir, |_, _, _| 0x1);
        assert_eq!(bench.smu.transfer_table_to_dram(), Ok(()));
        assert_eq!(bench.commands(), [(MailboxKind::Rsmu, 0x65)]);
        let d = bench.sim.dispatched();
        assert_eq!(&d[0].args[..2], &[3, 0]);
    }

    #[test]
    fn test_transfer_status_passes_through() {
        let bench = Bench::new(CodeName::Vermeer, |_, _, _| 0xFC);
        assert_eq!(bench.smu.transfer_table_to_dram(), Err(SmuStatus::CmdRejectedBusy));
    }

    #[test]
    fn test_single_call_address() {
        let bench = Bench::new(CodeName::Vermeer, |_, cmd, args| {
            if cmd == 0x06 {
                args[0] = 0xD000_0000;
                args[1] = 0xFFFF_FFFF;
            }
            0x1
        });
        assert_eq!(bench.smu.dram_base_address(), Ok(0xD000_0000));
    }

    #[test]
    fn test_two_word_address() {
        let bench = Bench::new(CodeName::Cezanne, |_, cmd, args| {
            if cmd == 0x66 {
                args[0] = 0xBEE0_0000;
                args[1] = 0x1;
            }
            0x1
        });
        assert_eq!(bench.smu.dram_base_address(), Ok(0x1_BEE0_0000));
        assert_eq!(bench.commands().len(), 1);
    }

    #[test]
    fn test_handshake_keeps_fetch_result() {
        let bench = Bench::new(CodeName::SummitRidge, |_, cmd, args| {
            args[0] = match cmd {
                0x0B => 0x1111,
                0x0C => 0xC000_0000,
                0x0D => 0x2222,
                _ => 0,
            };
            0x1
        });
        assert_eq!(bench.smu.dram_base_address(), Ok(0xC000_0000));
        assert_eq!(
            bench.commands(),
            vec![
                (MailboxKind::Rsmu, 0x0B),
                (MailboxKind::Rsmu, 0x0C),
                (MailboxKind::Rsmu, 0x0D)
            ]
        );
    }

    #[test]
    fn test_handshake_confirm_must_succeed() {
        let bench = Bench::new(CodeName::PinnacleRidge, |_, cmd, args| {
            args[0] = 0xC000_0000;
            if cmd == 0x0D {
                0xFF
            } else {
                0x1
            }
        });
        assert_eq!(bench.smu.dram_base_address(), Err(SmuStatus::Failed));
    }

    #[test]
    fn test_handshake_stops_after_failed_probe() {
        let bench = Bench::new(CodeName::SummitRidge, |_, cmd, _| if cmd == 0x0B { 0xFD } else { 0x1 });
        assert_eq!(bench.smu.dram_base_address(), Err(SmuStatus::CmdRejectedPrereq));
        assert_eq!(bench.commands().len(), 1);
    }

    #[test]
    fn test_selector_pairs() {
        let bench = Bench::new(CodeName::Picasso, |_, cmd, args| {
            if cmd == 0x0C {
                args[0] = if args[0] == 3 { 0x8000_0000 } else { 0x2 };
            }
            0x1
        });
        assert_eq!(bench.smu.dram_base_address(), Ok(0x2_8000_0000));
        assert_eq!(bench.first_args(), vec![3, 3, 5, 5]);
    }

    #[test]
    fn test_unsupported_platform() {
        let bench = Bench::new(CodeName::Unsupported, |_, _, _| 0x1);
        assert_eq!(bench.smu.dram_base_address(), Err(SmuStatus::UnknownCommand));
        assert!(bench.sim.journal().is_empty());
    }
}
