//! Hart-level architecture support.
//!
//! `csr` and `privilege` are plain logic over [`csr::CsrAccess`] and build
//! everywhere; `riscv` holds the instructions and only builds for RISC-V.

pub mod csr;
pub mod privilege;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod riscv;
