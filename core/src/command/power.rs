//! Power, current and thermal limits.

use core::fmt;

use super::{Smu, SmuCommand};
use crate::error::CmdResult;
use crate::platform::{Command, MailboxKind};

/// Limit a [`SetPowerLimit`] changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerLimit {
    /// Package power tracking, watts
    Ppt,
    /// Thermal design current, amps
    Tdc,
    /// Electrical design current, amps
    Edc,
    /// Hardware thermal control, degrees Celsius
    Htc,
}

impl PowerLimit {
    /// Every limit
    pub const ALL: [PowerLimit; 4] = [Self::Ppt, Self::Tdc, Self::Edc, Self::Htc];

    /// Logical command that sets this limit
    pub const fn command(self) -> Command {
        match self {
            Self::Ppt => Command::SetPptLimit,
            Self::Tdc => Command::SetTdcLimit,
            Self::Edc => Command::SetEdcLimit,
            Self::Htc => Command::SetHtcLimit,
        }
    }

    /// Wire multiplier; every limit travels in thousandths of its unit
    pub const fn scale(self) -> u32 {
        1000
    }
}

impl fmt::Display for PowerLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ppt => write!(f, "PPT"),
            Self::Tdc => write!(f, "TDC"),
            Self::Edc => write!(f, "EDC"),
            Self::Htc => write!(f, "HTC"),
        }
    }
}

/// Set one limit; MP1 first, RSMU where MP1 lacks it
#[derive(Debug, Clone, Copy)]
pub struct SetPowerLimit {
    /// Which limit
    pub limit: PowerLimit,
    /// Value in the limit's unit
    pub value: u32,
}

impl SmuCommand for SetPowerLimit {
    type Output = ();

    fn execute(&self, smu: &Smu) -> CmdResult<()> {
        let wire = self.value.saturating_mul(self.limit.scale());
        log::debug!("smu: {} limit {} -> {:#x}", self.limit, self.value, wire);
        smu.send_preferred(
            MailboxKind::Mp1,
            MailboxKind::Rsmu,
            self.limit.command(),
            &[wire],
        )
        .status
        .check()
    }
}
