//! Device drivers and the register bus they sit on.

pub mod mmio;
pub mod plic;
pub mod uart;

#[cfg(test)]
pub mod sim;

pub use plic::{Claim, Plic, PlicContext, PlicError};
pub use uart::Uart;
