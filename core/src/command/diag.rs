//! Mailbox liveness check.

use super::{Smu, SmuCommand};
use crate::error::{CmdResult, SmuStatus};
use crate::platform::{Command, MailboxKind};

/// Send a test message; a healthy firmware echoes `arg + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendTestMessage {
    /// Mailbox to probe; `None` picks RSMU, then MP1
    pub mailbox: Option<MailboxKind>,
    /// Value to echo
    pub arg: u32,
}

impl SendTestMessage {
    /// Probe the general-purpose mailbox
    pub const fn new(arg: u32) -> Self {
        Self { mailbox: None, arg }
    }

    /// Probe a specific mailbox
    pub const fn on(mailbox: MailboxKind, arg: u32) -> Self {
        Self {
            mailbox: Some(mailbox),
            arg,
        }
    }
}

impl SmuCommand for SendTestMessage {
    type Output = u32;

    fn execute(&self, smu: &Smu) -> CmdResult<u32> {
        let kind = self
            .mailbox
            .unwrap_or_else(|| smu.route(MailboxKind::Rsmu, MailboxKind::Mp1, Command::TestMessage));

        let r = smu.send(kind, Command::TestMessage, &[self.arg]);
        let echo = r.arg(0).ok_or(r.status)?;
        if echo != self.arg.wrapping_add(1) {
            log::warn!("smu: {} test message {:#x} echoed {:#x}", kind, self.arg, echo);
            return Err(SmuStatus::Failed);
        }
        Ok(echo)
    }
}
