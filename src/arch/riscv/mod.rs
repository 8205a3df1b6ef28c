//! RISC-V specifics: CSR instructions, reset entry and trap vectors.

pub mod asm;
pub mod cpu;
pub mod start;
pub mod trap;

pub use asm::Hart;
