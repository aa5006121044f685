//! # CPUID
//!
//! Thin wrapper over the compiler intrinsic. RBX is reserved by LLVM, so
//! inline `cpuid` with an `ebx` output does not assemble; the intrinsic
//! handles the save/restore.

use crate::transport::CpuidResult;

/// Execute CPUID with an explicit subleaf
#[inline]
pub fn cpuid_count(leaf: u32, subleaf: u32) -> CpuidResult {
    // SAFETY: every x86_64 processor implements CPUID
    let r = unsafe { ::core::arch::x86_64::__cpuid_count(leaf, subleaf) };
    CpuidResult::new(r.eax, r.ebx, r.ecx, r.edx)
}
