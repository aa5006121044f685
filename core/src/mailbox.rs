//! # Mailbox Protocol Engine
//!
//! One command, one mailbox, one locked exchange.
//!
//! ```text
//!  validate ──✗──► UnknownCommand          (no register touched)
//!     │
//!  lock ─────✗──► TimeoutMutexLock
//!     │
//!  poll RSP != 0 ──✗──► TimeoutMailboxReady
//!     │
//!  RSP = 0, ARG[i] = args, MSG = id ──✗──► PciFailed
//!     │
//!  poll RSP != 0 ──✗──► TimeoutMailboxMsgWrite
//!     │
//!  status = RSP ──► Ok: read ARG[i] back
//!     │
//!  unlock (guard drop, every path)
//! ```
//!
//! The firmware raises no interrupt, so both waits are bounded spin-polls.
//! A failed read inside a poll only costs one retry. Commands are never
//! retried: a non-`Ok` status goes straight back to the caller.

use alloc::sync::Arc;
use core::hint::spin_loop;

use zensmu_hal::{BusLock, RegisterTransport};

use crate::error::{CmdResult, SmuStatus};
use crate::platform::MailboxConfig;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Widest argument block any mailbox uses
pub const MAX_ARGS: usize = 8;

static_assertions::const_assert!(MAX_ARGS >= MailboxConfig::DEFAULT_ARG_SLOTS);

/// Argument register stride
const ARG_STRIDE: u32 = 4;

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Calibrated wait budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bus lock wait, in the lock's time unit
    pub lock_timeout: u32,
    /// Response register polls per wait
    pub retries: u32,
}

impl EngineConfig {
    /// Budgets matched to observed firmware latency
    pub const DEFAULT: Self = Self {
        lock_timeout: 5000,
        retries: 8192,
    };
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// REQUEST / RESULT
// =============================================================================

/// One command to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command ID
    pub id: u32,
    /// Argument words; only the mailbox's slot count is sent
    pub args: [u32; MAX_ARGS],
}

impl CommandRequest {
    /// Request with all arguments zero
    pub const fn new(id: u32) -> Self {
        Self {
            id,
            args: [0; MAX_ARGS],
        }
    }

    /// Request with leading arguments from `args`; extra words are dropped
    pub fn with_args(id: u32, args: &[u32]) -> Self {
        let mut req = Self::new(id);
        for (slot, value) in req.args.iter_mut().zip(args) {
            *slot = *value;
        }
        req
    }
}

/// Outcome of one exchange
///
/// Arguments are only meaningful when `status` is `Ok`; the engine zeroes
/// them otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    /// Exchange status
    pub status: SmuStatus,
    /// Argument words as left by the firmware
    pub args: [u32; MAX_ARGS],
}

impl CommandResult {
    /// Result with no usable arguments
    pub const fn failed(status: SmuStatus) -> Self {
        Self {
            status,
            args: [0; MAX_ARGS],
        }
    }

    /// `true` when the firmware answered `Ok`
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Argument word `index`, if the exchange succeeded
    pub fn arg(&self, index: usize) -> Option<u32> {
        if self.is_ok() {
            self.args.get(index).copied()
        } else {
            None
        }
    }

    /// Argument word `index` reinterpreted bit-for-bit as `f32`
    pub fn arg_f32(&self, index: usize) -> Option<f32> {
        self.arg(index).map(f32::from_bits)
    }

    /// Two argument words joined as `hi << 32 | lo`
    pub fn arg_u64(&self, lo: usize, hi: usize) -> Option<u64> {
        let lo = self.arg(lo)?;
        let hi = self.arg(hi)?;
        Some((u64::from(hi) << 32) | u64::from(lo))
    }

    /// Argument block on `Ok`, the status otherwise
    pub fn into_result(self) -> CmdResult<[u32; MAX_ARGS]> {
        self.status.check().map(|()| self.args)
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Locked request/response exchange over the register transport
#[derive(Clone)]
pub struct MailboxEngine {
    transport: Arc<dyn RegisterTransport>,
    lock: Arc<dyn BusLock>,
    config: EngineConfig,
}

impl core::fmt::Debug for MailboxEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MailboxEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MailboxEngine {
    /// Engine with the default wait budgets
    pub fn new(transport: Arc<dyn RegisterTransport>, lock: Arc<dyn BusLock>) -> Self {
        Self::with_config(transport, lock, EngineConfig::DEFAULT)
    }

    /// Engine with explicit wait budgets
    pub fn with_config(
        transport: Arc<dyn RegisterTransport>,
        lock: Arc<dyn BusLock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            transport,
            lock,
            config,
        }
    }

    /// Register transport
    pub fn transport(&self) -> &Arc<dyn RegisterTransport> {
        &self.transport
    }

    /// Bus lock shared by every mailbox
    pub fn lock(&self) -> &Arc<dyn BusLock> {
        &self.lock
    }

    /// Wait budgets
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Send `request` over `mailbox` and wait for the answer
    pub fn send(&self, mailbox: &MailboxConfig, request: &CommandRequest) -> CommandResult {
        if !mailbox.is_valid() || request.id == 0 {
            return CommandResult::failed(SmuStatus::UnknownCommand);
        }

        let Some(_bus) = self.lock.try_lock_for(self.config.lock_timeout) else {
            log::warn!("smu: {} cmd {:#x}: bus lock timeout", mailbox.kind, request.id);
            return CommandResult::failed(SmuStatus::TimeoutMutexLock);
        };

        let result = match self.exchange(mailbox, request) {
            Ok(args) => CommandResult {
                status: SmuStatus::Ok,
                args,
            },
            Err(status) => CommandResult::failed(status),
        };

        log::debug!(
            "smu: {} cmd {:#x} args {:x?} -> {:?}",
            mailbox.kind,
            request.id,
            &request.args[..slot_count(mailbox)],
            result.status
        );
        result
    }

    fn exchange(
        &self,
        mailbox: &MailboxConfig,
        request: &CommandRequest,
    ) -> CmdResult<[u32; MAX_ARGS]> {
        let t = &*self.transport;

        if !self.wait_for_response(mailbox.rsp_addr) {
            return Err(SmuStatus::TimeoutMailboxReady);
        }

        t.write32(mailbox.rsp_addr, 0).map_err(|_| SmuStatus::PciFailed)?;

        for (i, value) in request.args.iter().take(slot_count(mailbox)).enumerate() {
            if let Some(addr) = arg_address(mailbox, i) {
                t.write32(addr, *value).map_err(|_| SmuStatus::PciFailed)?;
            }
        }

        t.write32(mailbox.msg_addr, request.id)
            .map_err(|_| SmuStatus::PciFailed)?;

        if !self.wait_for_response(mailbox.rsp_addr) {
            return Err(SmuStatus::TimeoutMailboxMsgWrite);
        }

        let raw = t.read32(mailbox.rsp_addr).map_err(|_| SmuStatus::PciFailed)?;
        if raw > 0xFF {
            log::warn!(
                "smu: {} cmd {:#x}: response {:#x} is not a status byte",
                mailbox.kind,
                request.id,
                raw
            );
        }
        SmuStatus::from_raw(raw).check()?;

        let mut args = [0u32; MAX_ARGS];
        for (i, slot) in args.iter_mut().take(slot_count(mailbox)).enumerate() {
            if let Some(addr) = arg_address(mailbox, i) {
                *slot = t.read32(addr).map_err(|_| SmuStatus::PciFailed)?;
            }
        }
        Ok(args)
    }

    /// Poll the response register until it is non-zero
    fn wait_for_response(&self, rsp_addr: u32) -> bool {
        for _ in 0..self.config.retries {
            match self.transport.read32(rsp_addr) {
                Ok(value) if value != 0 => return true,
                _ => spin_loop(),
            }
        }
        false
    }
}

fn slot_count(mailbox: &MailboxConfig) -> usize {
    mailbox.arg_slots.min(MAX_ARGS)
}

/// Address of argument slot `index`; `None` if it would leave the 32-bit space
fn arg_address(mailbox: &MailboxConfig, index: usize) -> Option<u32> {
    let offset = u32::try_from(index).ok()?.checked_mul(ARG_STRIDE)?;
    mailbox.arg_addr.checked_add(offset)
}

static_assertions::assert_impl_all!(MailboxEngine: Send, Sync);
