//! # Model-Specific Registers
//!
//! Raw RDMSR. MSR numbers live with the code that reads them.
//!
//! ## Safety
//!
//! MSR access requires ring 0 privilege. Reading an MSR the core does not
//! implement raises #GP. Nothing here writes MSRs.

use ::core::arch::asm;

// =============================================================================
// RAW MSR ACCESS
// =============================================================================

/// Read a Model-Specific Register, returning `(eax, edx)`
///
/// # Safety
/// - Must be in ring 0
/// - MSR must exist (otherwise #GP)
#[inline]
pub unsafe fn rdmsr(msr: u32) -> (u32, u32) {
    let (low, high): (u32, u32);
    unsafe {
        asm!(
            "rdmsr",
            in("ecx") msr,
            out("eax") low,
            out("edx") high,
            options(nomem, nostack, preserves_flags)
        );
    }
    (low, high)
}
