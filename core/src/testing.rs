//! Test bench: a simulated SMU behind every mailbox of a platform.

use alloc::sync::Arc;
use std::sync::Mutex;
use std::vec::Vec;

use zensmu_hal::sim::{SimMailbox, SimTransport};
use zensmu_hal::NoopBusLock;

use crate::command::Smu;
use crate::cpu::CodeName;
use crate::mailbox::{EngineConfig, MailboxEngine};
use crate::platform::{config_for, MailboxKind, PlatformConfig};

/// Short waits so timeout paths finish quickly
pub(crate) const FAST: EngineConfig = EngineConfig {
    lock_timeout: 10,
    retries: 64,
};

pub(crate) struct Bench {
    pub sim: Arc<SimTransport>,
    pub smu: Smu,
}

impl Bench {
    /// Platform of `codename`, every mailbox answered by `firmware`
    pub fn new<F>(codename: CodeName, firmware: F) -> Self
    where
        F: FnMut(MailboxKind, u32, &mut [u32]) -> u32 + Send + 'static,
    {
        Self::with_platform(config_for(codename), firmware)
    }

    pub fn with_platform<F>(platform: PlatformConfig, firmware: F) -> Self
    where
        F: FnMut(MailboxKind, u32, &mut [u32]) -> u32 + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(firmware));
        let mut sim = SimTransport::new();
        for kind in MailboxKind::ALL {
            let m = *platform.mailbox(kind);
            if !m.is_valid() {
                continue;
            }
            let fw = shared.clone();
            sim = sim.with_mailbox(SimMailbox::new(
                m.msg_addr,
                m.rsp_addr,
                m.arg_addr,
                m.arg_slots,
                move |cmd, args| {
                    let mut firmware = fw.lock().unwrap();
                    (*firmware)(kind, cmd, args)
                },
            ));
        }

        let sim = Arc::new(sim);
        let engine = MailboxEngine::with_config(sim.clone(), Arc::new(NoopBusLock), FAST);
        Self {
            sim,
            smu: Smu::new(engine, platform),
        }
    }

    fn kind_of(&self, msg_addr: u32) -> MailboxKind {
        MailboxKind::ALL
            .into_iter()
            .find(|k| self.smu.platform().mailbox(*k).msg_addr == msg_addr)
            .unwrap()
    }

    /// `(mailbox, command ID)` of every dispatched command, in order
    pub fn commands(&self) -> Vec<(MailboxKind, u32)> {
        self.sim
            .dispatched()
            .iter()
            .map(|d| (self.kind_of(d.msg_addr), d.id))
            .collect()
    }

    /// First argument word of every dispatched command, in order
    pub fn first_args(&self) -> Vec<u32> {
        self.sim.dispatched().iter().map(|d| d.args[0]).collect()
    }
}
