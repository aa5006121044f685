//! # Platform Registry
//!
//! Codename → [`PlatformConfig`]. Pure data.
//!
//! Register addresses and command IDs are fixed by the firmware and
//! reproduced as documented by the community SMU projects; do not derive or
//! "fix" them. Generations that only move a handful of IDs are built from the
//! previous generation's record plus an [`Override`] list.
//!
//! ```text
//! zen1 ──► zen1 + Cpu1                  (Pinnacle Ridge, Colfax)
//! zen2 ──► zen2 + Cpu3                  (Rome, Castle Peak)
//!      └─► zen3 ──► zen3 + Cpu3         (Milan, Chagall)
//! zen4                                  (Raphael .. Granite Ridge)
//! apu0                                  (Raven .. FireFlight)
//! apu1 ──► apu1 + Cezanne PSM
//!      └─► apu2                         (Van Gogh .. Strix Halo)
//! ```

use super::{
    Command, CommandTable, MailboxConfig, MailboxKind, Override, PlatformConfig, SmuType,
};
use crate::cpu::CodeName;

use Command::*;
use MailboxKind::{Hsmp, Mp1, Rsmu};

// =============================================================================
// ZEN / ZEN+
// =============================================================================

const ZEN1_RSMU: &[(Command, u32)] = &[
    (TransferTableToDram, 0x0A),
    (GetDramBaseAddress, 0x0C),
    (EnableOcMode, 0x63),
    (DisableOcMode, 0x64),
    (SetOverclockFrequencyAllCores, 0x68),
    (SetOverclockFrequencyPerCore, 0x69),
    (SetOverclockCpuVid, 0x6A),
];

fn zen1() -> PlatformConfig {
    let mut rsmu = MailboxConfig::new(Rsmu, 0x03B1_051C, 0x03B1_0568, 0x03B1_0590);
    rsmu.commands = rsmu.commands.with_all(ZEN1_RSMU);

    let mp1 = MailboxConfig::new(Mp1, 0x03B1_0528, 0x03B1_0564, 0x03B1_0598);

    PlatformConfig::new(SmuType::Cpu0, rsmu, mp1, MailboxConfig::unsupported(Hsmp))
}

// =============================================================================
// ZEN 2 / ZEN 3
// =============================================================================

const ZEN2_RSMU: &[(Command, u32)] = &[
    (TransferTableToDram, 0x05),
    (GetDramBaseAddress, 0x06),
    (GetTableVersion, 0x08),
    (SetPptLimit, 0x53),
    (SetTdcLimit, 0x54),
    (SetEdcLimit, 0x55),
    (SetHtcLimit, 0x56),
    (SetPboScalar, 0x58),
    (EnableOcMode, 0x5A),
    (DisableOcMode, 0x5B),
    (SetOverclockFrequencyAllCores, 0x5C),
    (SetOverclockFrequencyPerCore, 0x5D),
    (SetOverclockCpuVid, 0x61),
    (GetPboScalar, 0x6C),
];

const ZEN2_MP1: &[(Command, u32)] = &[
    (EnableOcMode, 0x24),
    (DisableOcMode, 0x25),
    (SetOverclockFrequencyAllCores, 0x26),
    (SetOverclockFrequencyPerCore, 0x27),
    (SetOverclockCpuVid, 0x28),
    (SetPboScalar, 0x2F),
    (SetTdcLimit, 0x3B),
    (SetEdcLimit, 0x3C),
    (SetPptLimit, 0x3D),
    (SetHtcLimit, 0x3E),
];

/// HSMP argument block width
const HSMP_ARG_SLOTS: usize = 8;

fn zen2() -> PlatformConfig {
    let mut rsmu = MailboxConfig::new(Rsmu, 0x03B1_0524, 0x03B1_0570, 0x03B1_0A40);
    rsmu.commands = rsmu.commands.with_all(ZEN2_RSMU);

    let mut mp1 = MailboxConfig::new(Mp1, 0x03B1_0530, 0x03B1_057C, 0x03B1_09C4);
    mp1.commands = mp1.commands.with_all(ZEN2_MP1);

    let mut hsmp = MailboxConfig::new(Hsmp, 0x03B1_0534, 0x03B1_0980, 0x03B1_09E0);
    hsmp.arg_slots = HSMP_ARG_SLOTS;

    PlatformConfig::new(SmuType::Cpu2, rsmu, mp1, hsmp)
}

const ZEN3: &[Override] = &[
    Override::Id(Rsmu, SetPsmMarginSingleCore, 0x0A),
    Override::Id(Rsmu, SetPsmMarginAllCores, 0x0B),
    Override::Id(Rsmu, GetPsmMarginSingleCore, 0x7C),
    Override::Id(Mp1, SetPsmMarginSingleCore, 0x35),
    Override::Id(Mp1, SetPsmMarginAllCores, 0x36),
];

fn zen3() -> PlatformConfig {
    zen2().with_overrides(ZEN3)
}

// =============================================================================
// ZEN 4 / ZEN 5
// =============================================================================

const ZEN4_RSMU: &[(Command, u32)] = &[
    (TransferTableToDram, 0x03),
    (GetDramBaseAddress, 0x04),
    (GetTableVersion, 0x05),
    (SetPsmMarginSingleCore, 0x06),
    (SetPsmMarginAllCores, 0x07),
    (SetPptLimit, 0x56),
    (SetTdcLimit, 0x57),
    (SetEdcLimit, 0x58),
    (SetHtcLimit, 0x59),
    (SetPboScalar, 0x5B),
    (EnableOcMode, 0x5D),
    (DisableOcMode, 0x5E),
    (SetOverclockFrequencyAllCores, 0x5F),
    (SetOverclockFrequencyPerCore, 0x60),
    (SetOverclockCpuVid, 0x61),
    (GetPboScalar, 0x6D),
    (GetPsmMarginSingleCore, 0xD5),
];

const ZEN4_MP1: &[(Command, u32)] = &[
    (SetTdcLimit, 0x3C),
    (SetEdcLimit, 0x3D),
    (SetPptLimit, 0x3E),
    (SetHtcLimit, 0x3F),
];

fn zen4() -> PlatformConfig {
    let mut rsmu = MailboxConfig::new(Rsmu, 0x03B1_0524, 0x03B1_0570, 0x03B1_0A40);
    rsmu.commands = rsmu.commands.with_all(ZEN4_RSMU);

    let mut mp1 = MailboxConfig::new(Mp1, 0x03B1_0530, 0x03B1_057C, 0x03B1_09C4);
    mp1.commands = mp1.commands.with_all(ZEN4_MP1);

    let mut hsmp = MailboxConfig::new(Hsmp, 0x03B1_0534, 0x03B1_0980, 0x03B1_09E0);
    hsmp.arg_slots = HSMP_ARG_SLOTS;

    PlatformConfig::new(SmuType::Cpu4, rsmu, mp1, hsmp)
}

// =============================================================================
// APUS
// =============================================================================

const APU0_RSMU: &[(Command, u32)] = &[
    (GetDramBaseAddress, 0x0B),
    (GetTableVersion, 0x0C),
    (TransferTableToDram, 0x3D),
    (EnableOcMode, 0x69),
    (DisableOcMode, 0x6A),
    (SetOverclockFrequencyAllCores, 0x7D),
    (SetOverclockFrequencyPerCore, 0x7E),
    (SetOverclockCpuVid, 0x7F),
];

const APU1_RSMU: &[(Command, u32)] = &[
    (GetTableVersion, 0x06),
    (EnableOcMode, 0x17),
    (DisableOcMode, 0x18),
    (SetOverclockFrequencyAllCores, 0x19),
    (SetOverclockFrequencyPerCore, 0x1A),
    (SetOverclockCpuVid, 0x1B),
    (TransferTableToDram, 0x65),
    (GetDramBaseAddress, 0x66),
];

fn apu_mailboxes(rsmu_ids: &[(Command, u32)]) -> (MailboxConfig, MailboxConfig) {
    let mut rsmu = MailboxConfig::new(Rsmu, 0x03B1_0A20, 0x03B1_0A80, 0x03B1_0A88);
    rsmu.commands = CommandTable::base().with_all(rsmu_ids);
    let mp1 = MailboxConfig::new(Mp1, 0x03B1_0528, 0x03B1_0564, 0x03B1_0998);
    (rsmu, mp1)
}

fn apu0() -> PlatformConfig {
    let (rsmu, mp1) = apu_mailboxes(APU0_RSMU);
    PlatformConfig::new(SmuType::Apu0, rsmu, mp1, MailboxConfig::unsupported(Hsmp))
}

fn apu1() -> PlatformConfig {
    let (rsmu, mp1) = apu_mailboxes(APU1_RSMU);
    PlatformConfig::new(SmuType::Apu1, rsmu, mp1, MailboxConfig::unsupported(Hsmp))
}

const CEZANNE: &[Override] = &[
    Override::Id(Rsmu, SetPsmMarginAllCores, 0xB1),
    Override::Id(Rsmu, GetPsmMarginSingleCore, 0xC3),
    Override::Id(Mp1, SetPsmMarginSingleCore, 0x54),
    Override::Id(Mp1, SetPsmMarginAllCores, 0x55),
];

const APU2: &[Override] = &[
    Override::Type(SmuType::Apu2),
    Override::Registers {
        kind: Mp1,
        msg: 0x03B1_0528,
        rsp: 0x03B1_0578,
        arg: 0x03B1_0998,
    },
    Override::Id(Rsmu, SetPsmMarginAllCores, 0x5D),
    Override::Id(Mp1, SetPsmMarginSingleCore, 0x4B),
    Override::Id(Mp1, SetPsmMarginAllCores, 0x4C),
];

fn apu2() -> PlatformConfig {
    apu1().with_overrides(APU2)
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Platform record for `codename`
///
/// Total: [`CodeName::Unsupported`] gets a record whose every mailbox is
/// invalid, so any command against it fails with `UnknownCommand`.
pub fn config_for(codename: CodeName) -> PlatformConfig {
    use CodeName as C;

    let config = match codename {
        C::SummitRidge | C::Threadripper | C::Naples => zen1(),
        C::PinnacleRidge | C::Colfax => zen1().with_overrides(&[Override::Type(SmuType::Cpu1)]),

        C::Matisse => zen2(),
        C::Rome | C::CastlePeak => zen2().with_overrides(&[Override::Type(SmuType::Cpu3)]),
        C::Vermeer => zen3(),
        C::Milan | C::Chagall => zen3().with_overrides(&[Override::Type(SmuType::Cpu3)]),

        C::Raphael
        | C::DragonRange
        | C::GraniteRidge
        | C::Genoa
        | C::StormPeak
        | C::Bergamo => zen4(),

        C::RavenRidge | C::Picasso | C::Dali | C::FireFlight => apu0(),
        C::Renoir | C::Lucienne => apu1(),
        C::Cezanne => apu1().with_overrides(CEZANNE),
        C::VanGogh
        | C::Rembrandt
        | C::Phoenix
        | C::Phoenix2
        | C::HawkPoint
        | C::Mendocino
        | C::Mero
        | C::StrixPoint
        | C::StrixHalo
        | C::KrackanPoint => apu2(),

        C::Unsupported => PlatformConfig::unsupported(),
    };

    log::debug!(
        "platform: {:?} -> {:?}, mailboxes {:?}",
        codename,
        config.smu_type(),
        config.supported()
    );
    config
}
