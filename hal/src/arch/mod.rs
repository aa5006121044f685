//! # Architecture Support
//!
//! Direct hardware access for the architectures the SMU lives on.
//! Only x86_64 parts carry an SMU, so there is exactly one backend; on
//! every other target this module is empty and hosts must supply their own
//! [`crate::RegisterTransport`].

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", feature = "x86_64"))] {
        pub mod x86_64;
    }
}
