//! # Core Topology
//!
//! Core, CCD and CCX counts. Thread and logical core counts come from CPUID;
//! the CCD layout comes from fuse registers on the SMN.
//!
//! ```text
//! fuse1 (0x5D218, +0x40 on most 17h parts)
//! ┌────────────┬────────────────┬──────────┐
//! │ CCD down   │ CCD enable map │   ...    │
//! │  31..30    │     29..22     │  21..0   │
//! └────────────┴────────────────┴──────────┘
//! fuse2 (0x5D21C, same adjustment): CCD down bits 2..7 in 5..0
//!
//! core fuse of CCD n: (0x3008_1800 + offset) | n << 25
//!   bits 7..0: disabled cores of that CCD
//! ```

use alloc::vec::Vec;

use zensmu_hal::RegisterTransport;

use super::identity::{CpuIdentity, Family};
use crate::error::IdentifyError;

// =============================================================================
// FUSE ADDRESSES
// =============================================================================

const FUSE1: u32 = 0x0005_D218;
const FUSE2: u32 = 0x0005_D21C;
/// Fuse relocation on 17h parts other than models 31h and 71h
const FUSE_17H_SHIFT: u32 = 0x40;

const CORE_FUSE_BASE: u32 = 0x3008_1800;
const CORE_FUSE_OFFSET_ZEN: u32 = 0x238;
const CORE_FUSE_OFFSET_ZEN3: u32 = 0x598;

const MAX_CCDS: u32 = 8;

const LEAF_SIGNATURE: u32 = 0x0000_0001;
const LEAF_EXT_MAX: u32 = 0x8000_0000;
const LEAF_EXT_TOPOLOGY: u32 = 0x8000_001E;

// =============================================================================
// TOPOLOGY
// =============================================================================

/// Derived core layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Logical processors reported by CPUID
    pub logical_cores: u32,
    /// SMT threads per core; 0 when the processor does not report it
    pub threads_per_core: u32,
    /// Physical cores
    pub physical_cores: u32,
    /// Enabled CCDs
    pub ccds: u32,
    /// CCXs
    pub ccxs: u32,
    /// Cores per CCX
    pub cores_per_ccx: u32,
    /// Enabled CCDs, one bit each
    pub ccd_enable_map: u32,
    /// Disabled CCDs, one bit each
    pub ccd_disable_map: u32,
    /// Core-disable fuse (low 8 bits) of each enabled, not fused-down CCD, in CCD order
    pub core_disable_maps: Vec<u32>,
}

impl Topology {
    /// CCXs on each CCD
    pub fn ccx_per_ccd(&self) -> u32 {
        if self.ccds == 0 {
            self.ccxs
        } else {
            (self.ccxs / self.ccds).max(1)
        }
    }

    /// Core mask addressing one core, as used by the per-core commands
    ///
    /// ```text
    /// [31..28] ccd  [27..24] ccx on that ccd  [23..20] core on that ccx
    /// ```
    pub fn core_mask(&self, core: u32, ccd: u32, ccx: u32) -> u32 {
        let ccx_in_ccd = ccx.checked_rem(self.ccx_per_ccd()).unwrap_or(0);
        let core_in_ccx = core.checked_rem(self.cores_per_ccx).unwrap_or(0);
        ((((ccd << 4) | (ccx_in_ccd & 0xF)) << 4) | (core_in_ccx & 0xF)) << 20
    }
}

// =============================================================================
// DERIVATION
// =============================================================================

fn fuse_addresses(identity: &CpuIdentity) -> (u32, u32, u32) {
    match identity.family {
        Family::Zen3 | Family::Zen5 => (FUSE1, FUSE2, CORE_FUSE_OFFSET_ZEN3),
        Family::Zen if identity.model != 0x71 && identity.model != 0x31 => (
            FUSE1 + FUSE_17H_SHIFT,
            FUSE2 + FUSE_17H_SHIFT,
            CORE_FUSE_OFFSET_ZEN,
        ),
        _ => (FUSE1, FUSE2, CORE_FUSE_OFFSET_ZEN),
    }
}

fn read_fuse(
    transport: &dyn RegisterTransport,
    addr: u32,
    what: &'static str,
) -> Result<u32, IdentifyError> {
    transport
        .read32(addr)
        .map_err(|e| IdentifyError::unreadable(what, e))
}

/// Derive the core layout of an identified processor
///
/// Every fuse read is required; a failure aborts with no partial result.
pub fn derive_topology(
    transport: &dyn RegisterTransport,
    identity: &CpuIdentity,
) -> Result<Topology, IdentifyError> {
    let logical_cores = (transport.read_cpuid(LEAF_SIGNATURE, 0).ebx >> 16) & 0xFF;
    if logical_cores == 0 {
        return Err(IdentifyError::NoTopology);
    }

    let threads_per_core = if transport.read_cpuid(LEAF_EXT_MAX, 0).eax < LEAF_EXT_TOPOLOGY {
        0
    } else {
        ((transport.read_cpuid(LEAF_EXT_TOPOLOGY, 0).ebx >> 8) & 0xF) + 1
    };

    let physical_cores = if threads_per_core > 0 {
        logical_cores / threads_per_core
    } else {
        logical_cores
    };

    let (fuse1, fuse2, offset) = fuse_addresses(identity);
    let ccds_present = read_fuse(transport, fuse1, "CCD fuse")?;
    let ccds_down = read_fuse(transport, fuse2, "CCD down fuse")?;

    let ccd_enable_map = (ccds_present >> 22) & 0xFF;
    let ccd_disable_map = ((ccds_present >> 30) & 0x3) | ((ccds_down & 0x3F) << 2);
    let ccds = ccd_enable_map.count_ones();

    // Core fuses are only read on CCDs that are enabled and not fused down;
    // a die with no such CCD still has its core fuse at CCD 0
    let readable = ccd_enable_map & !ccd_disable_map;
    let ccd_list: Vec<u32> = if readable == 0 {
        alloc::vec![0]
    } else {
        (0..MAX_CCDS).filter(|ccd| readable & (1 << ccd) != 0).collect()
    };

    let mut core_disable_maps = Vec::with_capacity(ccd_list.len());
    for ccd in &ccd_list {
        let addr = (CORE_FUSE_BASE + offset) | (ccd << 25);
        let fuse = read_fuse(transport, addr, "core disable fuse")?;
        core_disable_maps.push(fuse & 0xFF);
    }

    let first_disabled = core_disable_maps.first().copied().unwrap_or(0);
    let cores_per_ccx = (8 - first_disabled.count_ones()) / 2;
    let ccxs = if physical_cores == cores_per_ccx {
        1
    } else {
        ccds * 2
    };

    let topology = Topology {
        logical_cores,
        threads_per_core,
        physical_cores,
        ccds,
        ccxs,
        cores_per_ccx,
        ccd_enable_map,
        ccd_disable_map,
        core_disable_maps,
    };

    log::info!(
        "topology: {} cores / {} threads, {} CCD, {} CCX, {} cores per CCX",
        topology.physical_cores,
        topology.logical_cores,
        topology.ccds,
        topology.ccxs,
        topology.cores_per_ccx
    );
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use zensmu_hal::sim::SimTransport;
    use zensmu_hal::CpuidResult;

    fn identity(signature: u32) -> CpuIdentity {
        CpuIdentity::from_raw(String::new(), String::new(), signature, 0x2000_0000, 0)
    }

    fn sim(logical: u32, smt: bool) -> SimTransport {
        let ext_ebx = if smt { 1 << 8 } else { 0 };
        SimTransport::new()
            .with_cpuid(0x1, 0, CpuidResult::new(0, logical << 16, 0, 0))
            .with_cpuid(0x8000_0000, 0, CpuidResult::new(0x8000_0023, 0, 0, 0))
            .with_cpuid(0x8000_001E, 0, CpuidResult::new(0, ext_ebx, 0, 0))
    }

    #[test]
    fn test_two_ccds_full_cores() {
        // Zen 3: fuses are not relocated
        let id = identity(0x00A2_0F10);
        let sim = sim(32, true).with_register(FUSE1, 0b11 << 22);

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.ccds, 2);
        assert_eq!(t.cores_per_ccx, 4);
        assert_eq!(t.physical_cores, 16);
        assert_eq!(t.threads_per_core, 2);
        assert_eq!(t.ccxs, 4);
        assert_eq!(t.core_disable_maps, alloc::vec![0, 0]);
    }

    #[test]
    fn test_core_fuse_is_read_per_ccd() {
        let id = identity(0x00A2_0F10);
        let base = CORE_FUSE_BASE + CORE_FUSE_OFFSET_ZEN3;
        let sim = sim(24, true)
            .with_register(FUSE1, 0b101 << 22)
            .with_register(base, 0b1100_0011)
            .with_register(base | (2 << 25), 0b0000_0011);

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.ccds, 2);
        assert_eq!(t.core_disable_maps, alloc::vec![0b1100_0011, 0b11]);
        assert_eq!(t.cores_per_ccx, 2);
    }

    #[test]
    fn test_17h_fuse_relocation() {
        // Zen+ desktop (model 08h): fuses moved by 0x40
        let id = identity(0x0080_0F82);
        let sim = sim(8, false).with_register(FUSE1 + FUSE_17H_SHIFT, 1 << 22);

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.ccds, 1);
        assert_eq!(t.threads_per_core, 1);
        assert_eq!(t.physical_cores, 8);
        assert_eq!(t.cores_per_ccx, 4);
        assert_eq!(t.ccxs, 2);
    }

    #[test]
    fn test_17h_model_71_not_relocated() {
        let id = identity(0x0087_0F10);
        assert_eq!(id.model, 0x71);
        assert_eq!(fuse_addresses(&id), (FUSE1, FUSE2, CORE_FUSE_OFFSET_ZEN));
    }

    #[test]
    fn test_down_fuse_masks_ccds() {
        let id = identity(0x00A2_0F10);
        let sim = sim(16, true)
            .with_register(FUSE1, 0b1111 << 22)
            .with_register(FUSE2, 0b11);

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.ccd_disable_map, 0b1100);
        // the count follows the enable map; down CCDs only skip their fuse read
        assert_eq!(t.ccds, 4);
        assert_eq!(t.core_disable_maps.len(), 2);
        assert_eq!(t.ccxs, 8);
    }

    #[test]
    fn test_empty_enable_map_has_no_ccds() {
        let id = identity(0x00A5_0F00);
        let sim = sim(12, true);

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.ccd_enable_map, 0);
        assert_eq!(t.ccds, 0);
        // the CCD 0 core fuse is still consulted
        assert_eq!(t.core_disable_maps, alloc::vec![0]);
        assert_eq!(t.cores_per_ccx, 4);
    }

    #[test]
    fn test_missing_smt_leaf_is_single_threaded() {
        let id = identity(0x00A5_0F00);
        let sim = SimTransport::new()
            .with_cpuid(0x1, 0, CpuidResult::new(0, 4 << 16, 0, 0))
            .with_cpuid(0x8000_0000, 0, CpuidResult::new(0x8000_0008, 0, 0, 0));

        let t = derive_topology(&sim, &id).unwrap();
        assert_eq!(t.threads_per_core, 0);
        assert_eq!(t.physical_cores, 4);
        // 4 physical cores in one 4-core CCX
        assert_eq!(t.ccxs, 1);
    }

    #[test]
    fn test_fuse_read_failure_is_fatal() {
        let id = identity(0x00A2_0F10);
        let sim = sim(16, true);
        sim.fail_reads(FUSE1, u32::MAX);
        assert!(matches!(
            derive_topology(&sim, &id),
            Err(IdentifyError::UnreadableRegister { .. })
        ));
    }

    #[test]
    fn test_core_fuse_failure_is_fatal() {
        let id = identity(0x00A2_0F10);
        let sim = sim(16, true).with_register(FUSE1, 1 << 22);
        sim.fail_reads(CORE_FUSE_BASE + CORE_FUSE_OFFSET_ZEN3, 1);
        assert!(derive_topology(&sim, &id).is_err());
    }

    #[test]
    fn test_no_logical_cores() {
        let id = identity(0x00A2_0F10);
        assert_eq!(
            derive_topology(&SimTransport::new(), &id),
            Err(IdentifyError::NoTopology)
        );
    }

    #[test]
    fn test_core_mask() {
        let id = identity(0x00A2_0F10);
        let sim = sim(32, true).with_register(FUSE1, 0b11 << 22);
        let t = derive_topology(&sim, &id).unwrap();

        assert_eq!(t.ccx_per_ccd(), 2);
        assert_eq!(t.core_mask(0, 0, 0), 0);
        // ccd 1, ccx 1 of that ccd, core 3
        assert_eq!(t.core_mask(3, 1, 1), (((1 << 4) | 1) << 4 | 3) << 20);
        // indices wrap into the local range
        assert_eq!(t.core_mask(7, 1, 3), t.core_mask(3, 1, 1));
    }
}
