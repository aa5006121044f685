//! # ZenSMU Core
//!
//! Talks to the System Management Unit of AMD Zen processors through its
//! register mailboxes: identifies the CPU, selects the matching mailbox
//! layout and command IDs, and exposes typed commands on top of a locked
//! request/response engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Processor                             │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌───────────────────┐  │
//! │  │     cpu      │  │     platform     │  │      command      │  │
//! │  │ identity,    │─►│ CodeName →       │─►│ SmuCommand, Smu   │  │
//! │  │ topology     │  │ PlatformConfig   │  │ (OC, PSM, power,  │  │
//! │  └──────────────┘  └──────────────────┘  │  table, version)  │  │
//! │                                          └─────────┬─────────┘  │
//! │                                          ┌─────────▼─────────┐  │
//! │                                          │      mailbox      │  │
//! │                                          │  MailboxEngine    │  │
//! │                                          └─────────┬─────────┘  │
//! └────────────────────────────────────────────────────┼────────────┘
//!                                                      │
//!                        zensmu-hal: RegisterTransport + BusLock
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let processor = Processor::new(transport, Arc::new(SpinBusLock::new()))?;
//! let smu = processor.smu();
//! smu.set_psm_margin_all_cores(-10)?;
//! let version = smu.firmware_version()?;
//! ```
//!
//! ## Features
//!
//! - `std`: enables `zensmu_hal::StdBusLock`

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod command;
pub mod cpu;
pub mod error;
pub mod mailbox;
pub mod platform;
pub mod processor;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use command::{Smu, SmuCommand};
pub use cpu::{CodeName, CpuIdentity, Topology};
pub use error::{CmdResult, IdentifyError, InitError, SmuStatus};
pub use mailbox::{CommandRequest, CommandResult, EngineConfig, MailboxEngine};
pub use platform::{config_for, MailboxConfig, MailboxKind, PlatformConfig, SmuType};
pub use processor::Processor;
