//! # Command Layer
//!
//! One type per SMU operation. Each command picks its mailbox, packs its
//! arguments, runs one or more exchanges through the [`MailboxEngine`] and
//! decodes a typed result.
//!
//! ```text
//! SetPsmMargin { mask, margin }
//!        │ encode
//!        ▼
//! Smu::send_preferred(Mp1 → Rsmu, SetPsmMarginSingleCore, [arg])
//!        │ command ID from PlatformConfig
//!        ▼
//! MailboxEngine::send(mailbox, request) ──► CommandResult
//!        │ decode
//!        ▼
//! CmdResult<()>
//! ```
//!
//! Some operations exist on two mailboxes depending on the generation. Those
//! use the preferred mailbox when it implements the command and fall back to
//! the alternate otherwise.
//!
//! Any status other than `Ok` is returned unchanged; nothing is decoded from
//! a failed exchange.

pub mod diag;
pub mod encoding;
pub mod oc;
pub mod power;
pub mod psm;
pub mod table;
pub mod version;

use crate::error::CmdResult;
use crate::mailbox::{CommandRequest, CommandResult, MailboxEngine};
use crate::platform::{Command, MailboxKind, PlatformConfig};

pub use diag::SendTestMessage;
pub use oc::{
    EnableOcMode, GetOcMode, GetPboScalar, IsOverclockable, SetOcMode,
    SetOverclockFrequencyAllCores, SetOverclockFrequencyPerCore, SetOverclockVid, SetPboScalar,
};
pub use power::{PowerLimit, SetPowerLimit};
pub use psm::{GetPsmMargin, SetPsmMargin, SetPsmMarginAllCores};
pub use table::{GetDramBaseAddress, TransferTableToDram};
pub use version::{FirmwareVersion, GetFirmwareVersion, GetTableVersion};

// =============================================================================
// COMMAND TRAIT
// =============================================================================

/// A typed SMU operation
pub trait SmuCommand {
    /// Decoded result
    type Output;

    /// Run against `smu`
    fn execute(&self, smu: &Smu) -> CmdResult<Self::Output>;
}

// =============================================================================
// SMU
// =============================================================================

/// Mailbox engine bound to one platform
#[derive(Debug, Clone)]
pub struct Smu {
    engine: MailboxEngine,
    platform: PlatformConfig,
}

impl Smu {
    /// Bind `engine` to `platform`
    pub fn new(engine: MailboxEngine, platform: PlatformConfig) -> Self {
        Self { engine, platform }
    }

    /// Mailbox engine
    pub fn engine(&self) -> &MailboxEngine {
        &self.engine
    }

    /// Platform configuration
    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    /// Run a command
    pub fn execute<C: SmuCommand>(&self, command: &C) -> CmdResult<C::Output> {
        command.execute(self)
    }

    // -------------------------------------------------------------------------
    // Dispatch helpers
    // -------------------------------------------------------------------------

    /// Send `cmd` on mailbox `kind`
    pub fn send(&self, kind: MailboxKind, cmd: Command, args: &[u32]) -> CommandResult {
        let id = self.platform.mailbox(kind).command_id(cmd);
        self.send_raw(kind, id, args)
    }

    /// Send a raw command ID on mailbox `kind`
    pub fn send_raw(&self, kind: MailboxKind, id: u32, args: &[u32]) -> CommandResult {
        let mailbox = self.platform.mailbox(kind);
        self.engine.send(mailbox, &CommandRequest::with_args(id, args))
    }

    /// Mailbox `cmd` goes to: `preferred` if it implements it, else `fallback`
    pub fn route(
        &self,
        preferred: MailboxKind,
        fallback: MailboxKind,
        cmd: Command,
    ) -> MailboxKind {
        if self.platform.mailbox(preferred).supports(cmd) {
            preferred
        } else {
            fallback
        }
    }

    /// Send `cmd` on `preferred`, or on `fallback` where `preferred` lacks it
    pub fn send_preferred(
        &self,
        preferred: MailboxKind,
        fallback: MailboxKind,
        cmd: Command,
        args: &[u32],
    ) -> CommandResult {
        self.send(self.route(preferred, fallback, cmd), cmd, args)
    }

    // -------------------------------------------------------------------------
    // Convenience
    // -------------------------------------------------------------------------

    /// Firmware version; also cached in the platform config
    pub fn firmware_version(&self) -> CmdResult<FirmwareVersion> {
        self.execute(&GetFirmwareVersion)
    }

    /// PM table version; also cached in the platform config
    pub fn table_version(&self) -> CmdResult<u32> {
        self.execute(&GetTableVersion)
    }

    /// Ask the firmware to copy the PM table to DRAM
    pub fn transfer_table_to_dram(&self) -> CmdResult<()> {
        self.execute(&TransferTableToDram)
    }

    /// Physical address of the PM table
    pub fn dram_base_address(&self) -> CmdResult<u64> {
        self.execute(&GetDramBaseAddress)
    }

    /// Enter (`true`) or leave manual overclock mode
    pub fn set_oc_mode(&self, enabled: bool) -> CmdResult<()> {
        self.execute(&SetOcMode(enabled))
    }

    /// `true` when manual overclock mode is active
    pub fn oc_mode(&self) -> CmdResult<bool> {
        self.execute(&GetOcMode)
    }

    /// Fixed frequency (MHz) for every core
    pub fn set_oc_frequency_all_cores(&self, mhz: u32) -> CmdResult<()> {
        self.execute(&SetOverclockFrequencyAllCores(mhz))
    }

    /// Fixed frequency (MHz) for the core addressed by `core_mask`
    pub fn set_oc_frequency_per_core(&self, core_mask: u32, mhz: u32) -> CmdResult<()> {
        self.execute(&SetOverclockFrequencyPerCore { core_mask, mhz })
    }

    /// Fixed core VID
    pub fn set_oc_vid(&self, vid: u8) -> CmdResult<()> {
        self.execute(&SetOverclockVid(vid))
    }

    /// PBO scalar
    pub fn pbo_scalar(&self) -> CmdResult<f32> {
        self.execute(&GetPboScalar)
    }

    /// Set the PBO scalar
    pub fn set_pbo_scalar(&self, scalar: f32) -> CmdResult<()> {
        self.execute(&SetPboScalar(scalar))
    }

    /// PSM margin of one core
    pub fn psm_margin(&self, core_mask: u32) -> CmdResult<i32> {
        self.execute(&GetPsmMargin { core_mask })
    }

    /// Set the PSM margin of one core
    pub fn set_psm_margin(&self, core_mask: u32, margin: i32) -> CmdResult<()> {
        self.execute(&SetPsmMargin { core_mask, margin })
    }

    /// Set the PSM margin of every core
    pub fn set_psm_margin_all_cores(&self, margin: i32) -> CmdResult<()> {
        self.execute(&SetPsmMarginAllCores(margin))
    }

    /// Set a power, current or thermal limit
    pub fn set_power_limit(&self, limit: PowerLimit, value: u32) -> CmdResult<()> {
        self.execute(&SetPowerLimit { limit, value })
    }

    /// Package power tracking limit, in watts
    pub fn set_ppt_limit(&self, watts: u32) -> CmdResult<()> {
        self.set_power_limit(PowerLimit::Ppt, watts)
    }

    /// Thermal design current limit, in amps
    pub fn set_tdc_limit(&self, amps: u32) -> CmdResult<()> {
        self.set_power_limit(PowerLimit::Tdc, amps)
    }

    /// Electrical design current limit, in amps
    pub fn set_edc_limit(&self, amps: u32) -> CmdResult<()> {
        self.set_power_limit(PowerLimit::Edc, amps)
    }

    /// Hardware thermal control limit, in degrees Celsius
    pub fn set_htc_limit(&self, celsius: u32) -> CmdResult<()> {
        self.set_power_limit(PowerLimit::Htc, celsius)
    }

    /// Whether the part allows overclocking
    ///
    /// Reserved: no platform assigns this query a command ID, so it answers
    /// `UnknownCommand` without touching a mailbox.
    pub fn is_overclockable(&self) -> CmdResult<bool> {
        self.execute(&IsOverclockable)
    }

    /// Round-trip a test message; returns the firmware's echo
    pub fn send_test_message(&self, arg: u32) -> CmdResult<u32> {
        self.execute(&SendTestMessage::new(arg))
    }
}

static_assertions::assert_impl_all!(Smu: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CodeName;
    use crate::error::SmuStatus;
    use crate::testing::Bench;

    #[test]
    fn test_route_prefers_implemented_mailbox() {
        let bench = Bench::new(CodeName::Vermeer, |_, _, _| 0x1);
        let smu = &bench.smu;
        assert_eq!(
            smu.route(MailboxKind::Mp1, MailboxKind::Rsmu, Command::SetPsmMarginAllCores),
            MailboxKind::Mp1
        );
        // Zen 4 MP1 has no OC commands
        let bench = Bench::new(CodeName::Raphael, |_, _, _| 0x1);
        assert_eq!(
            bench
                .smu
                .route(MailboxKind::Mp1, MailboxKind::Rsmu, Command::EnableOcMode),
            MailboxKind::Rsmu
        );
    }

    #[test]
    fn test_unimplemented_command_is_refused() {
        let bench = Bench::new(CodeName::Matisse, |_, _, _| 0x1);
        let r = bench.smu.send(MailboxKind::Rsmu, Command::IsOverclockable, &[]);
        assert_eq!(r.status, SmuStatus::UnknownCommand);
        assert!(bench.sim.journal().is_empty());
    }

    #[test]
    fn test_send_uses_platform_ids() {
        let bench = Bench::new(CodeName::Matisse, |_, _, _| 0x1);
        bench.smu.send(MailboxKind::Rsmu, Command::GetPboScalar, &[]);
        assert_eq!(bench.commands(), [(MailboxKind::Rsmu, 0x6C)]);
    }
}
