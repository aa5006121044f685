//! # Transport Errors
//!
//! Failure kinds a register transport can report.
//!
//! These never escape the mailbox engine as-is: during steady-state use the
//! engine folds them into `PciFailed` or a timeout status. They only surface
//! directly during identification, where any unreadable register is fatal.

use core::fmt;

/// Transport result type alias
pub type IoResult<T> = core::result::Result<T, IoError>;

/// Register transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IoError {
    /// Caller lacks the privilege to touch the bus (not ring 0, no IOPL)
    NotPermitted,
    /// Nothing answers at this address
    Unmapped(u32),
    /// The backing driver reported a failure code
    Device(u32),
    /// The transport cannot perform this kind of access at all
    Unsupported,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPermitted => write!(f, "register access not permitted"),
            Self::Unmapped(addr) => write!(f, "no register at {:#010x}", addr),
            Self::Device(code) => write!(f, "transport driver error {:#x}", code),
            Self::Unsupported => write!(f, "access not supported by transport"),
        }
    }
}
