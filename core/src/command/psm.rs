//! Curve Optimizer (PSM) margins.
//!
//! Margins travel as 16-bit two's complement words, see
//! [`encode_margin`]. Per-core commands carry the core selector in the top
//! twelve bits of the same word.

use super::encoding::{core_arg, decode_margin, encode_margin, CORE_MASK_BITS};
use super::{Smu, SmuCommand};
use crate::error::CmdResult;
use crate::platform::{Command, MailboxKind};

/// PSM margin of one core
#[derive(Debug, Clone, Copy)]
pub struct GetPsmMargin {
    /// Core selector
    pub core_mask: u32,
}

impl SmuCommand for GetPsmMargin {
    type Output = i32;

    fn execute(&self, smu: &Smu) -> CmdResult<i32> {
        let r = smu.send(
            MailboxKind::Rsmu,
            Command::GetPsmMarginSingleCore,
            &[self.core_mask & CORE_MASK_BITS],
        );
        r.arg(0).map(decode_margin).ok_or(r.status)
    }
}

/// Set the PSM margin of one core
#[derive(Debug, Clone, Copy)]
pub struct SetPsmMargin {
    /// Core selector
    pub core_mask: u32,
    /// Signed margin
    pub margin: i32,
}

impl SmuCommand for SetPsmMargin {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        let arg = core_arg(self.core_mask, encode_margin(self.margin));
        smu.send_preferred(
            MailboxKind::Mp1,
            MailboxKind::Rsmu,
            Command::SetPsmMarginSingleCore,
            &[arg],
        )
        .status
        .check()
    }
}

/// Set the PSM margin of every core
#[derive(Debug, Clone, Copy)]
pub struct SetPsmMarginAllCores(pub i32);

impl SmuCommand for SetPsmMarginAllCores {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        smu.send_preferred(
            MailboxKind::Mp1,
            MailboxKind::Rsmu,
            Command::SetPsmMarginAllCores,
            &[encode_margin(self.0)],
        )
        .status
        .check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CodeName;
    use crate::error::SmuStatus;
    use crate::testing::Bench;
    use std::vec;

    #[test]
    fn test_set_all_cores_prefers_mp1() {
        let bench = Bench::new(CodeName::Vermeer, |_, _, _| 0x1);
        assert_eq!(bench.smu.set_psm_margin_all_cores(-15), Ok(()));
        assert_eq!(bench.commands(), vec![(MailboxKind::Mp1, 0x36)]);
        assert_eq!(bench.first_args(), vec![0xFFF1]);
    }

    #[test]
    fn test_set_single_core_packs_mask() {
        let bench = Bench::new(CodeName::Vermeer, |_, _, _| 0x1);
        let mask = 0x0210_0000;
        assert_eq!(bench.smu.set_psm_margin(mask, -30), Ok(()));
        assert_eq!(bench.commands(), vec![(MailboxKind::Mp1, 0x35)]);
        assert_eq!(bench.first_args(), vec![mask | 0xFFE2]);
    }

    #[test]
    fn test_zen4_uses_rsmu() {
        let bench = Bench::new(CodeName::GraniteRidge, |_, _, _| 0x1);
        bench.smu.set_psm_margin_all_cores(5).unwrap();
        bench.smu.set_psm_margin(0, 5).unwrap();
        assert_eq!(
            bench.commands(),
            vec![(MailboxKind::Rsmu, 0x07), (MailboxKind::Rsmu, 0x06)]
        );
    }

    #[test]
    fn test_get_decodes_negative() {
        let bench = Bench::new(CodeName::Vermeer, |_, cmd, args| {
            if cmd == 0x7C {
                args[0] = (-20i32) as u32;
            }
            0x1
        });
        let mask = 0x0010_0000;
        assert_eq!(bench.smu.psm_margin(mask | 0x1234), Ok(-20));
        assert_eq!(bench.commands(), vec![(MailboxKind::Rsmu, 0x7C)]);
        assert_eq!(bench.first_args(), vec![mask]);
    }

    #[test]
    fn test_get_reads_sixteen_bit_answer() {
        let bench = Bench::new(CodeName::Cezanne, |_, _, args| {
            args[0] = 0xFFF6;
            0x1
        });
        assert_eq!(bench.smu.psm_margin(0), Ok(-10));
    }

    #[test]
    fn test_matisse_has_no_psm() {
        let bench = Bench::new(CodeName::Matisse, |_, _, _| 0x1);
        assert_eq!(bench.smu.set_psm_margin_all_cores(0), Err(SmuStatus::UnknownCommand));
        assert_eq!(bench.smu.psm_margin(0), Err(SmuStatus::UnknownCommand));
        assert!(bench.sim.journal().is_empty());
    }

    #[test]
    fn test_failure_passes_through() {
        let bench = Bench::new(CodeName::Vermeer, |_, _, args| {
            args[0] = 7;
            0xFD
        });
        assert_eq!(bench.smu.psm_margin(0), Err(SmuStatus::CmdRejectedPrereq));
    }
}
