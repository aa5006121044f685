//! # Overclocking Commands
//!
//! Manual OC mode, fixed frequency and VID, and the PBO scalar.
//!
//! Writes go to RSMU when the platform implements them there and to MP1
//! otherwise. Reads only exist on RSMU.
//!
//! ```text
//! SetOcMode(false)
//!   DisableOcMode ──✗──► status
//!        │ Ok
//!   SetPboScalar(1.0) ──► status
//! ```
//!
//! Leaving OC mode does not restore the boost multiplier on its own, hence
//! the second write.

use super::encoding::{core_arg, scalar_to_wire, FREQUENCY_BITS};
use super::{Smu, SmuCommand};
use crate::error::{CmdResult, SmuStatus};
use crate::platform::{Command, MailboxKind};

/// Scalar written back when leaving OC mode
const DEFAULT_PBO_SCALAR: f32 = 1.0;

fn send_write(smu: &Smu, cmd: Command, args: &[u32]) -> CmdResult<()> {
    smu.send_preferred(MailboxKind::Rsmu, MailboxKind::Mp1, cmd, args)
        .status
        .check()
}

// =============================================================================
// OC MODE
// =============================================================================

/// Enter manual overclock mode
#[derive(Debug, Clone, Copy, Default)]
pub struct EnableOcMode;

impl SmuCommand for EnableOcMode {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        send_write(smu, Command::EnableOcMode, &[])
    }
}

/// Enter (`true`) or leave (`false`) manual overclock mode
///
/// Leaving also resets the PBO scalar to 1.0, but only once the firmware
/// has accepted the disable.
#[derive(Debug, Clone, Copy)]
pub struct SetOcMode(pub bool);

impl SmuCommand for SetOcMode {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        if self.0 {
            return EnableOcMode.execute(smu);
        }
        send_write(smu, Command::DisableOcMode, &[])?;
        SetPboScalar(DEFAULT_PBO_SCALAR).execute(smu)
    }
}

/// Whether manual overclock mode is active
///
/// The firmware reports a PBO scalar of exactly 0.0 while OC mode is on.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOcMode;

impl SmuCommand for GetOcMode {
    type Output = bool;

    fn execute(&self, smu: &Smu) -> CmdResult<bool> {
        let scalar = GetPboScalar.execute(smu)?;
        Ok(scalar == 0.0)
    }
}

/// Whether the part allows overclocking
///
/// No known firmware implements this query, so every current platform
/// answers `UnknownCommand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsOverclockable;

impl SmuCommand for IsOverclockable {
    type Output = bool;

    fn execute(&self, smu: &Smu) -> CmdResult<bool> {
        let r = smu.send_preferred(
            MailboxKind::Rsmu,
            MailboxKind::Mp1,
            Command::IsOverclockable,
            &[],
        );
        let word = r.arg(0).ok_or(r.status)?;
        Ok(word & 1 != 0)
    }
}

// =============================================================================
// FREQUENCY / VID
// =============================================================================

/// Fixed frequency for every core, in MHz
#[derive(Debug, Clone, Copy)]
pub struct SetOverclockFrequencyAllCores(pub u32);

impl SmuCommand for SetOverclockFrequencyAllCores {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        send_write(smu, Command::SetOverclockFrequencyAllCores, &[self.0 & FREQUENCY_BITS])
    }
}

/// Fixed frequency for one core, in MHz
#[derive(Debug, Clone, Copy)]
pub struct SetOverclockFrequencyPerCore {
    /// Core selector, see `Topology::core_mask`
    pub core_mask: u32,
    /// Frequency in MHz
    pub mhz: u32,
}

impl SmuCommand for SetOverclockFrequencyPerCore {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        let arg = core_arg(self.core_mask, self.mhz & FREQUENCY_BITS);
        send_write(smu, Command::SetOverclockFrequencyPerCore, &[arg])
    }
}

/// Fixed core VID
#[derive(Debug, Clone, Copy)]
pub struct SetOverclockVid(pub u8);

impl SmuCommand for SetOverclockVid {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        send_write(smu, Command::SetOverclockCpuVid, &[u32::from(self.0)])
    }
}

// =============================================================================
// PBO SCALAR
// =============================================================================

/// Current PBO scalar
#[derive(Debug, Clone, Copy, Default)]
pub struct GetPboScalar;

impl SmuCommand for GetPboScalar {
    type Output = f32;

    fn execute(&self, smu: &Smu) -> CmdResult<f32> {
        let r = smu.send(MailboxKind::Rsmu, Command::GetPboScalar, &[]);
        r.arg_f32(0).ok_or(r.status)
    }
}

/// Set the PBO scalar; sent in hundredths
#[derive(Debug, Clone, Copy)]
pub struct SetPboScalar(pub f32);

impl SmuCommand for SetPboScalar {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        if !self.0.is_finite() || self.0 < 0.0 {
            log::warn!("smu: refusing PBO scalar {}", self.0);
            return Err(SmuStatus::Failed);
        }
        send_write(smu, Command::SetPboScalar, &[scalar_to_wire(self.0)])
    }
}
