//! # ZenSMU Error Handling
//!
//! Two very different failure domains live here:
//!
//! - [`SmuStatus`]: the outcome of one mailbox exchange. Firmware-native
//!   codes pass through verbatim; the engine adds its own codes for failures
//!   that never reached the firmware (unsupported command, timeouts, bus
//!   errors). Command code always gets one of these back, never a panic.
//! - [`IdentifyError`] / [`InitError`]: initialization failures. These are
//!   fatal; there is no degraded mode.

use core::fmt;

use zensmu_hal::IoError;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Result of a typed SMU command
///
/// `Err` never holds [`SmuStatus::Ok`].
pub type CmdResult<T> = core::result::Result<T, SmuStatus>;

// =============================================================================
// SMU STATUS
// =============================================================================

/// Outcome of a mailbox exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmuStatus {
    // =========================================================================
    // Firmware-native
    // =========================================================================
    /// Command completed
    Ok,
    /// Firmware reported failure, or the response was not a valid status byte
    Failed,
    /// Firmware does not know this command ID
    UnknownCmd,
    /// Firmware refused the command: a prerequisite is not met
    CmdRejectedPrereq,
    /// Firmware refused the command: busy
    CmdRejectedBusy,

    // =========================================================================
    // Engine-internal
    // =========================================================================
    /// Mailbox or command ID is not defined on this platform; nothing was sent
    UnknownCommand,
    /// The bus lock could not be taken in time
    TimeoutMutexLock,
    /// The mailbox never became ready to accept a message
    TimeoutMailboxReady,
    /// The firmware never answered the message
    TimeoutMailboxMsgWrite,
    /// A register access failed
    PciFailed,
}

impl SmuStatus {
    /// Raw response value for `Ok`
    pub const RAW_OK: u32 = 0x01;
    /// Raw response value for `Failed`
    pub const RAW_FAILED: u32 = 0xFF;
    /// Raw response value for `UnknownCmd`
    pub const RAW_UNKNOWN_CMD: u32 = 0xFE;
    /// Raw response value for `CmdRejectedPrereq`
    pub const RAW_REJECTED_PREREQ: u32 = 0xFD;
    /// Raw response value for `CmdRejectedBusy`
    pub const RAW_REJECTED_BUSY: u32 = 0xFC;

    /// Classify a raw response register value
    ///
    /// Anything wider than a byte, or a byte with no assigned meaning, is
    /// reported as [`SmuStatus::Failed`].
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            Self::RAW_OK => Self::Ok,
            Self::RAW_FAILED => Self::Failed,
            Self::RAW_UNKNOWN_CMD => Self::UnknownCmd,
            Self::RAW_REJECTED_PREREQ => Self::CmdRejectedPrereq,
            Self::RAW_REJECTED_BUSY => Self::CmdRejectedBusy,
            _ => Self::Failed,
        }
    }

    /// Firmware-native code, if this status came from the firmware
    pub const fn raw(self) -> Option<u8> {
        match self {
            Self::Ok => Some(Self::RAW_OK as u8),
            Self::Failed => Some(Self::RAW_FAILED as u8),
            Self::UnknownCmd => Some(Self::RAW_UNKNOWN_CMD as u8),
            Self::CmdRejectedPrereq => Some(Self::RAW_REJECTED_PREREQ as u8),
            Self::CmdRejectedBusy => Some(Self::RAW_REJECTED_BUSY as u8),
            _ => None,
        }
    }

    /// `true` for [`SmuStatus::Ok`]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `true` for the three timeout kinds
    pub const fn is_timeout(self) -> bool {
        matches!(
            self,
            Self::TimeoutMutexLock | Self::TimeoutMailboxReady | Self::TimeoutMailboxMsgWrite
        )
    }

    /// `Ok(())` for [`SmuStatus::Ok`], `Err(self)` otherwise
    pub const fn check(self) -> CmdResult<()> {
        match self {
            Self::Ok => Ok(()),
            other => Err(other),
        }
    }
}

impl fmt::Display for SmuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Firmware
            Self::Ok => write!(f, "ok"),
            Self::Failed => write!(f, "command failed"),
            Self::UnknownCmd => write!(f, "firmware does not know this command"),
            Self::CmdRejectedPrereq => write!(f, "command rejected: prerequisite not met"),
            Self::CmdRejectedBusy => write!(f, "command rejected: busy"),

            // Engine
            Self::UnknownCommand => write!(f, "command not supported on this platform"),
            Self::TimeoutMutexLock => write!(f, "timed out waiting for the bus lock"),
            Self::TimeoutMailboxReady => write!(f, "timed out waiting for the mailbox"),
            Self::TimeoutMailboxMsgWrite => write!(f, "timed out waiting for a response"),
            Self::PciFailed => write!(f, "register access failed"),
        }
    }
}

// =============================================================================
// INITIALIZATION ERRORS
// =============================================================================

/// CPU identification or topology failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyError {
    /// A required register could not be read
    UnreadableRegister {
        /// Which register
        what: &'static str,
        /// Transport failure, if the transport reported one
        cause: Option<IoError>,
    },
    /// The registers read fine but describe no usable core layout
    NoTopology,
}

impl IdentifyError {
    pub(crate) const fn unreadable(what: &'static str, cause: IoError) -> Self {
        Self::UnreadableRegister {
            what,
            cause: Some(cause),
        }
    }

    pub(crate) const fn missing(what: &'static str) -> Self {
        Self::UnreadableRegister { what, cause: None }
    }
}

impl fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableRegister {
                what,
                cause: Some(cause),
            } => write!(f, "cannot read {}: {}", what, cause),
            Self::UnreadableRegister { what, cause: None } => {
                write!(f, "cannot read {}: not implemented by this processor", what)
            },
            Self::NoTopology => write!(f, "processor reports no usable core topology"),
        }
    }
}

/// `Processor` construction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InitError {
    /// Identity or topology derivation failed
    Identify(IdentifyError),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identify(e) => write!(f, "processor identification failed: {}", e),
        }
    }
}

impl From<IdentifyError> for InitError {
    fn from(e: IdentifyError) -> Self {
        InitError::Identify(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_codes_classify() {
        assert_eq!(SmuStatus::from_raw(0x01), SmuStatus::Ok);
        assert_eq!(SmuStatus::from_raw(0xFF), SmuStatus::Failed);
        assert_eq!(SmuStatus::from_raw(0xFE), SmuStatus::UnknownCmd);
        assert_eq!(SmuStatus::from_raw(0xFD), SmuStatus::CmdRejectedPrereq);
        assert_eq!(SmuStatus::from_raw(0xFC), SmuStatus::CmdRejectedBusy);
    }

    #[test]
    fn test_oversized_and_unassigned_values_fail() {
        assert_eq!(SmuStatus::from_raw(0x101), SmuStatus::Failed);
        assert_eq!(SmuStatus::from_raw(0xDEAD_BEEF), SmuStatus::Failed);
        assert_eq!(SmuStatus::from_raw(0x42), SmuStatus::Failed);
    }

    #[test]
    fn test_raw_only_for_firmware_codes() {
        assert_eq!(SmuStatus::CmdRejectedBusy.raw(), Some(0xFC));
        assert_eq!(SmuStatus::PciFailed.raw(), None);
        assert_eq!(SmuStatus::UnknownCommand.raw(), None);
    }

    #[test]
    fn test_check() {
        assert_eq!(SmuStatus::Ok.check(), Ok(()));
        assert_eq!(
            SmuStatus::TimeoutMailboxReady.check(),
            Err(SmuStatus::TimeoutMailboxReady)
        );
        assert!(SmuStatus::TimeoutMutexLock.is_timeout());
        assert!(!SmuStatus::PciFailed.is_timeout());
    }

    #[test]
    fn test_init_error_wraps_identify() {
        let e: InitError = IdentifyError::NoTopology.into();
        assert_eq!(e, InitError::Identify(IdentifyError::NoTopology));
    }
}
