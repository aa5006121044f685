//! # CPU Identity
//!
//! Decodes CPUID into family/model and resolves the silicon codename.
//!
//! ## CPUID leaf 1 EAX
//!
//! ```text
//! ┌──────┬────────┬────────┬──────┬────────┬───────┬──────────┐
//! │ rsvd │ ExtFam │ ExtMod │ rsvd │ Family │ Model │ Stepping │
//! │31..28│ 27..20 │ 19..16 │15..12│ 11..8  │ 7..4  │   3..0   │
//! └──────┴────────┴────────┴──────┴────────┴───────┴──────────┘
//! ```
//!
//! The codename lookup is keyed on the whole EAX value (stepping included)
//! and the package type, because a few steppings ship as both a desktop and
//! a workstation part.

use alloc::string::String;
use core::fmt;

use zensmu_hal::{CpuidResult, RegisterTransport};

use crate::error::IdentifyError;

// =============================================================================
// CPUID LEAVES / MSRS
// =============================================================================

const LEAF_VENDOR: u32 = 0x0000_0000;
const LEAF_SIGNATURE: u32 = 0x0000_0001;
const LEAF_EXT_MAX: u32 = 0x8000_0000;
const LEAF_EXT_SIGNATURE: u32 = 0x8000_0001;
const LEAF_BRAND_FIRST: u32 = 0x8000_0002;
const LEAF_BRAND_LAST: u32 = 0x8000_0004;

const MSR_PATCH_LEVEL: u32 = 0x0000_008B;

// =============================================================================
// FAMILY
// =============================================================================

/// CPU family, as far as the SMU tooling cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// 17h: Zen, Zen+, Zen 2
    Zen,
    /// 19h: Zen 3, Zen 4
    Zen3,
    /// 1Ah: Zen 5
    Zen5,
    /// Anything else
    Other(u32),
}

impl Family {
    /// Family from its combined (base + extended) value
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            0x17 => Self::Zen,
            0x19 => Self::Zen3,
            0x1A => Self::Zen5,
            other => Self::Other(other),
        }
    }

    /// Combined family value
    pub const fn raw(self) -> u32 {
        match self {
            Self::Zen => 0x17,
            Self::Zen3 => 0x19,
            Self::Zen5 => 0x1A,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}h", self.raw())
    }
}

// =============================================================================
// PACKAGE TYPE
// =============================================================================

/// Package type from CPUID `0x8000_0001` EBX\[31:28\]
///
/// The encoding is reused across generations (0 is FP5 on Raven but AM5 on
/// Raphael), so it is kept as a raw value with a few named points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackageType(pub u8);

impl PackageType {
    /// Mobile BGA on Zen/Zen 2, AM5 on Zen 4
    pub const FP: Self = Self(0);
    /// FL1 (Dragon Range)
    pub const FL1: Self = Self(1);
    /// AM4 desktop socket
    pub const AM4: Self = Self(2);
    /// SP3 server socket
    pub const SP3: Self = Self(4);
    /// TR4 / sTRX4 / sWRX8 workstation sockets
    pub const TR4: Self = Self(7);

    /// Decode from the raw EBX of leaf `0x8000_0001`
    pub const fn from_ebx(ebx: u32) -> Self {
        Self((ebx >> 28) as u8)
    }

    /// HEDT / workstation package
    pub const fn is_workstation(self) -> bool {
        self.0 == Self::TR4.0
    }
}

// =============================================================================
// CODENAME
// =============================================================================

/// Silicon design variants with a known SMU layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum CodeName {
    Unsupported,
    // Zen / Zen+
    SummitRidge,
    Threadripper,
    Naples,
    PinnacleRidge,
    Colfax,
    RavenRidge,
    Picasso,
    Dali,
    FireFlight,
    // Zen 2
    Matisse,
    CastlePeak,
    Rome,
    Renoir,
    Lucienne,
    VanGogh,
    Mendocino,
    Mero,
    // Zen 3
    Vermeer,
    Milan,
    Chagall,
    Cezanne,
    Rembrandt,
    // Zen 4
    Raphael,
    DragonRange,
    Phoenix,
    Phoenix2,
    HawkPoint,
    Genoa,
    StormPeak,
    Bergamo,
    // Zen 5
    GraniteRidge,
    StrixPoint,
    StrixHalo,
    KrackanPoint,
}

impl CodeName {
    /// Every codename, `Unsupported` first
    pub const ALL: [CodeName; 35] = [
        Self::Unsupported,
        Self::SummitRidge,
        Self::Threadripper,
        Self::Naples,
        Self::PinnacleRidge,
        Self::Colfax,
        Self::RavenRidge,
        Self::Picasso,
        Self::Dali,
        Self::FireFlight,
        Self::Matisse,
        Self::CastlePeak,
        Self::Rome,
        Self::Renoir,
        Self::Lucienne,
        Self::VanGogh,
        Self::Mendocino,
        Self::Mero,
        Self::Vermeer,
        Self::Milan,
        Self::Chagall,
        Self::Cezanne,
        Self::Rembrandt,
        Self::Raphael,
        Self::DragonRange,
        Self::Phoenix,
        Self::Phoenix2,
        Self::HawkPoint,
        Self::Genoa,
        Self::StormPeak,
        Self::Bergamo,
        Self::GraniteRidge,
        Self::StrixPoint,
        Self::StrixHalo,
        Self::KrackanPoint,
    ];

    /// Resolve `(CPUID leaf 1 EAX, package type)` to a codename
    ///
    /// Unknown signatures resolve to [`CodeName::Unsupported`].
    pub const fn resolve(signature: u32, package: PackageType) -> Self {
        let ws = package.is_workstation();
        match signature {
            // Zen / Zen+
            0x0080_0F11 => {
                if ws {
                    Self::Threadripper
                } else {
                    Self::SummitRidge
                }
            },
            0x0080_0F12 => Self::Naples,
            0x0080_0F82 => {
                if ws {
                    Self::Colfax
                } else {
                    Self::PinnacleRidge
                }
            },
            0x0081_0F10 | 0x0081_0F11 => Self::RavenRidge,
            0x0081_0F80 | 0x0081_0F81 => Self::Picasso,
            0x0082_0F01 => Self::Dali,
            0x0085_0F00 => Self::FireFlight,

            // Zen 2
            0x0083_0F00 | 0x0083_0F10 => {
                if ws {
                    Self::CastlePeak
                } else {
                    Self::Rome
                }
            },
            0x0087_0F00 | 0x0087_0F10 => Self::Matisse,
            0x0086_0F00 | 0x0086_0F01 => Self::Renoir,
            0x0086_0F81 => Self::Lucienne,
            0x0089_0F00 | 0x0089_0F02 => Self::VanGogh,
            0x0089_0F80 => Self::Mero,
            0x008A_0F00 => Self::Mendocino,

            // Zen 3
            0x00A0_0F00 | 0x00A0_0F10 | 0x00A0_0F11 => Self::Milan,
            0x00A0_0F80 | 0x00A0_0F82 => Self::Chagall,
            0x00A2_0F00 | 0x00A2_0F10 | 0x00A2_0F12 => Self::Vermeer,
            0x00A4_0F00 | 0x00A4_0F40 | 0x00A4_0F41 => Self::Rembrandt,
            0x00A5_0F00 => Self::Cezanne,

            // Zen 4
            0x00A6_0F00 | 0x00A6_0F11 | 0x00A6_0F12 => {
                if package.0 == PackageType::FL1.0 {
                    Self::DragonRange
                } else {
                    Self::Raphael
                }
            },
            0x00A7_0F00 | 0x00A7_0F40 | 0x00A7_0F41 => Self::Phoenix,
            0x00A7_0F52 => Self::HawkPoint,
            0x00A7_0F80 => Self::Phoenix2,
            0x00A1_0F11 | 0x00A1_0F12 => Self::Genoa,
            0x00A1_0F80 | 0x00A1_0F81 => Self::StormPeak,
            0x00AA_0F01 | 0x00AA_0F02 => Self::Bergamo,

            // Zen 5
            0x00B4_0F40 => Self::GraniteRidge,
            0x00B2_0F40 => Self::StrixPoint,
            0x00B6_0F00 => Self::KrackanPoint,
            0x00B7_0F00 => Self::StrixHalo,

            _ => Self::Unsupported,
        }
    }

    /// `false` only for [`CodeName::Unsupported`]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

// =============================================================================
// CPU IDENTITY
// =============================================================================

/// Processor identity, computed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuIdentity {
    /// Vendor string ("AuthenticAMD")
    pub vendor: String,
    /// Marketing name, trimmed
    pub brand: String,
    /// Raw CPUID leaf 1 EAX
    pub signature: u32,
    /// Combined family
    pub family: Family,
    /// Base model nibble
    pub base_model: u32,
    /// Full model (extended model nibble and base model)
    pub model: u32,
    /// Stepping
    pub stepping: u32,
    /// Package type
    pub package_type: PackageType,
    /// Resolved codename
    pub codename: CodeName,
    /// Microcode patch level
    pub patch_level: u32,
}

impl CpuIdentity {
    /// Decode an identity from raw register values
    pub fn from_raw(
        vendor: String,
        brand: String,
        signature: u32,
        ext_ebx: u32,
        patch_level: u32,
    ) -> Self {
        let family = ((signature & 0xF00) >> 8) + ((signature & 0x0FF0_0000) >> 20);
        let base_model = (signature & 0xF0) >> 4;
        let model = ((signature & 0xF_0000) >> 12) + base_model;
        let package_type = PackageType::from_ebx(ext_ebx);

        Self {
            vendor,
            brand,
            signature,
            family: Family::from_raw(family),
            base_model,
            model,
            stepping: signature & 0xF,
            package_type,
            codename: CodeName::resolve(signature, package_type),
            patch_level,
        }
    }
}

// =============================================================================
// IDENTIFY
// =============================================================================

fn register_string(out: &mut String, regs: &[u32]) {
    for reg in regs {
        for byte in reg.to_le_bytes() {
            if byte != 0 {
                out.push(char::from(byte));
            }
        }
    }
}

/// Identify the processor behind `transport`
///
/// Fails only when a required register is unavailable; an unrecognized
/// processor yields [`CodeName::Unsupported`].
pub fn identify(transport: &dyn RegisterTransport) -> Result<CpuIdentity, IdentifyError> {
    let leaf0 = transport.read_cpuid(LEAF_VENDOR, 0);
    if leaf0.eax < LEAF_SIGNATURE {
        return Err(IdentifyError::missing("CPUID leaf 0x1"));
    }
    let mut vendor = String::new();
    register_string(&mut vendor, &[leaf0.ebx, leaf0.edx, leaf0.ecx]);

    let ext_max = transport.read_cpuid(LEAF_EXT_MAX, 0).eax;
    if ext_max < LEAF_BRAND_LAST {
        return Err(IdentifyError::missing("CPUID leaf 0x8000_0004"));
    }

    let signature = transport.read_cpuid(LEAF_SIGNATURE, 0).eax;
    let ext_ebx = transport.read_cpuid(LEAF_EXT_SIGNATURE, 0).ebx;

    let mut brand = String::new();
    for leaf in LEAF_BRAND_FIRST..=LEAF_BRAND_LAST {
        let CpuidResult { eax, ebx, ecx, edx } = transport.read_cpuid(leaf, 0);
        register_string(&mut brand, &[eax, ebx, ecx, edx]);
    }
    let brand = String::from(brand.trim());

    let (patch_level, _) = transport
        .read_msr(MSR_PATCH_LEVEL)
        .map_err(|e| IdentifyError::unreadable("microcode patch level", e))?;

    let identity = CpuIdentity::from_raw(vendor, brand, signature, ext_ebx, patch_level);
    log::info!(
        "cpu: {} family {} model {:#x} stepping {} pkg {} -> {:?} (patch {:#x})",
        identity.brand,
        identity.family,
        identity.model,
        identity.stepping,
        identity.package_type.0,
        identity.codename,
        identity.patch_level
    );
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zensmu_hal::sim::SimTransport;

    fn pack(s: &[u8; 16]) -> CpuidResult {
        let w = |i: usize| u32::from_le_bytes([s[i], s[i + 1], s[i + 2], s[i + 3]]);
        CpuidResult::new(w(0), w(4), w(8), w(12))
    }

    fn vermeer_sim() -> SimTransport {
        // "AuthenticAMD" is EBX, EDX, ECX
        let ebx = u32::from_le_bytes(*b"Auth");
        let edx = u32::from_le_bytes(*b"enti");
        let ecx = u32::from_le_bytes(*b"cAMD");
        SimTransport::new()
            .with_cpuid(0x0, 0, CpuidResult::new(0x10, ebx, ecx, edx))
            .with_cpuid(0x1, 0, CpuidResult::new(0x00A2_0F10, 0x0010_0800, 0, 0))
            .with_cpuid(0x8000_0000, 0, CpuidResult::new(0x8000_0023, 0, 0, 0))
            .with_cpuid(0x8000_0001, 0, CpuidResult::new(0, 0x2000_0000, 0, 0))
            .with_cpuid(0x8000_0002, 0, pack(b"AMD Ryzen 7 5800"))
            .with_cpuid(0x8000_0003, 0, pack(b"X 8-Core Process"))
            .with_cpuid(0x8000_0004, 0, pack(b"or      \0\0\0\0\0\0\0\0"))
            .with_msr(0x8B, 0x0A20_1210, 0)
    }

    #[test]
    fn test_identify_vermeer() {
        let sim = vermeer_sim();
        let id = identify(&sim).unwrap();
        assert_eq!(id.vendor, "AuthenticAMD");
        assert_eq!(id.brand, "AMD Ryzen 7 5800X 8-Core Processor");
        assert_eq!(id.family, Family::Zen3);
        assert_eq!(id.model, 0x21);
        assert_eq!(id.base_model, 0x1);
        assert_eq!(id.stepping, 0);
        assert_eq!(id.package_type, PackageType::AM4);
        assert_eq!(id.codename, CodeName::Vermeer);
        assert_eq!(id.patch_level, 0x0A20_1210);
    }

    #[test]
    fn test_patch_level_is_required() {
        let sim = SimTransport::new()
            .with_cpuid(0x0, 0, CpuidResult::new(0x10, 0, 0, 0))
            .with_cpuid(0x8000_0000, 0, CpuidResult::new(0x8000_001F, 0, 0, 0));
        assert!(matches!(
            identify(&sim),
            Err(IdentifyError::UnreadableRegister { cause: Some(_), .. })
        ));
    }

    #[test]
    fn test_missing_extended_leaves() {
        let sim = SimTransport::new().with_cpuid(0x0, 0, CpuidResult::new(0x10, 0, 0, 0));
        assert!(matches!(
            identify(&sim),
            Err(IdentifyError::UnreadableRegister { cause: None, .. })
        ));
    }

    #[test]
    fn test_family_decode() {
        let id = CpuIdentity::from_raw(String::new(), String::new(), 0x0080_0F11, 0, 0);
        assert_eq!(id.family, Family::Zen);
        assert_eq!(id.model, 0x01);

        let id = CpuIdentity::from_raw(String::new(), String::new(), 0x00B4_0F40, 0, 0);
        assert_eq!(id.family, Family::Zen5);
        assert_eq!(id.model, 0x44);

        assert_eq!(Family::from_raw(0x15), Family::Other(0x15));
        assert_eq!(Family::Other(0x15).raw(), 0x15);
    }

    #[test]
    fn test_package_type_disambiguates() {
        let tr4 = PackageType::TR4;
        let am4 = PackageType::AM4;
        assert_eq!(CodeName::resolve(0x0080_0F11, tr4), CodeName::Threadripper);
        assert_eq!(CodeName::resolve(0x0080_0F11, am4), CodeName::SummitRidge);
        assert_eq!(CodeName::resolve(0x0080_0F82, tr4), CodeName::Colfax);
        assert_eq!(CodeName::resolve(0x0083_0F10, tr4), CodeName::CastlePeak);
        assert_eq!(CodeName::resolve(0x0083_0F10, PackageType::SP3), CodeName::Rome);
        assert_eq!(
            CodeName::resolve(0x00A6_0F12, PackageType::FL1),
            CodeName::DragonRange
        );
        assert_eq!(CodeName::resolve(0x00A6_0F12, PackageType::FP), CodeName::Raphael);
    }

    #[test]
    fn test_unknown_signature_is_inert() {
        let c = CodeName::resolve(0x0060_0F12, PackageType::AM4);
        assert_eq!(c, CodeName::Unsupported);
        assert!(!c.is_supported());
    }

    #[test]
    fn test_package_from_ebx() {
        assert_eq!(PackageType::from_ebx(0x7000_0000), PackageType::TR4);
        assert!(PackageType::from_ebx(0x7FFF_FFFF).is_workstation());
    }
}
