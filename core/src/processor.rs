//! # Processor
//!
//! Entry point: identify the CPU, derive its topology, pick the platform
//! record and bind a mailbox engine to it.
//!
//! ```text
//! Processor::new(transport, lock)
//!   ├── identify()         CPUID, MSR 0x8B        ──✗──► InitError
//!   ├── derive_topology()  CPUID, CCD/core fuses  ──✗──► InitError
//!   ├── config_for(codename)                      (total)
//!   └── Smu::new(MailboxEngine, PlatformConfig)
//! ```
//!
//! An unrecognized CPU is not an error: it gets the unsupported platform
//! record and every command answers `UnknownCommand`.

use alloc::sync::Arc;

use zensmu_hal::{BusLock, RegisterTransport};

use crate::command::Smu;
use crate::cpu::{derive_topology, identify, CpuIdentity, Topology};
use crate::error::InitError;
use crate::mailbox::{EngineConfig, MailboxEngine};
use crate::platform::{config_for, PlatformConfig};

/// An identified processor and its SMU
#[derive(Debug, Clone)]
pub struct Processor {
    identity: CpuIdentity,
    topology: Topology,
    smu: Smu,
}

impl Processor {
    /// Identify the processor behind `transport` with default wait budgets
    pub fn new(
        transport: Arc<dyn RegisterTransport>,
        lock: Arc<dyn BusLock>,
    ) -> Result<Self, InitError> {
        Self::with_config(transport, lock, EngineConfig::DEFAULT)
    }

    /// Identify the processor behind `transport`
    pub fn with_config(
        transport: Arc<dyn RegisterTransport>,
        lock: Arc<dyn BusLock>,
        config: EngineConfig,
    ) -> Result<Self, InitError> {
        let identity = identify(&*transport).map_err(|e| {
            log::error!("processor: identification failed: {}", e);
            InitError::from(e)
        })?;
        let topology = derive_topology(&*transport, &identity).map_err(|e| {
            log::error!("processor: topology derivation failed: {}", e);
            InitError::from(e)
        })?;

        let platform = config_for(identity.codename);
        if !identity.codename.is_supported() {
            log::warn!(
                "processor: {} (signature {:#x}) is not supported, SMU commands disabled",
                identity.brand,
                identity.signature
            );
        }

        log::info!(
            "processor: {:?} on {:?}, mailboxes {:?}",
            identity.codename,
            platform.smu_type(),
            platform.supported()
        );

        let engine = MailboxEngine::with_config(transport, lock, config);
        Ok(Self {
            identity,
            topology,
            smu: Smu::new(engine, platform),
        })
    }

    /// CPU identity
    pub fn identity(&self) -> &CpuIdentity {
        &self.identity
    }

    /// Core layout
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Platform record
    pub fn platform(&self) -> &PlatformConfig {
        self.smu.platform()
    }

    /// SMU command interface
    pub fn smu(&self) -> &Smu {
        &self.smu
    }

    /// PSM core mask of `core` on `ccx` of `ccd`
    pub fn make_core_mask(&self, core: u32, ccd: u32, ccx: u32) -> u32 {
        self.topology.core_mask(core, ccd, ccx)
    }

    /// Read an SMN register through the platform's PCI index/data window
    ///
    /// Bypasses the mailboxes but still takes the bus lock, since the window
    /// is shared with the transport. Returns 0 on any failure.
    pub fn read_dword(&self, addr: u32) -> u32 {
        let engine = self.smu.engine();
        let Some(_bus) = engine.lock().try_lock_for(engine.config().lock_timeout) else {
            log::warn!("processor: read {:#x}: bus lock timeout", addr);
            return 0;
        };

        let window = self.platform().smn_window();
        let t = engine.transport();
        let value = t
            .write_pci_config(window.pci_address, window.index_offset, addr)
            .and_then(|()| t.read_pci_config(window.pci_address, window.data_offset));

        match value {
            Ok(v) => v,
            Err(e) => {
                log::warn!("processor: read {:#x}: {}", addr, e);
                0
            },
        }
    }
}

static_assertions::assert_impl_all!(Processor: Send, Sync);
