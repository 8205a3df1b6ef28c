//! QEMU's `virt` machine.

use crate::arch::csr::Privilege;
use crate::arch::privilege::BootPlan;
use crate::hardware::plic::{Mode, Plic};
use crate::hardware::uart::Uart;

// Platform Interrupt Controller location
pub const PLIC_BASE_ADDR: usize = 0x0c00_0000;

pub const UART0_BASE_ADDR: usize = 0x1000_0000;
/// Registers are one byte apart.
pub const UART0_REG_SHIFT: u32 = 0;
pub const UART0_IRQ: usize = 10;
pub const UART0_PRIORITY: u32 = 1;

/// Handler slots in the trap dispatcher.
pub const MAX_HANDLERS: usize = 8;

/// The privilege `main` runs at.
pub const BOOT_PRIVILEGE: Privilege = Privilege::Supervisor;
/// The PLIC context mode matching [`BOOT_PRIVILEGE`].
pub const BOOT_MODE: Mode = Mode::Supervisor;

pub static UART0: Uart = unsafe { Uart::new(UART0_BASE_ADDR, UART0_REG_SHIFT) };
pub static PLIC: Plic = unsafe { Plic::new(PLIC_BASE_ADDR) };

pub const fn boot_plan(entry: usize, machine_vector: usize, supervisor_vector: usize) -> BootPlan {
    match BOOT_PRIVILEGE {
        Privilege::Machine => BootPlan::machine(entry, machine_vector),
        _ => BootPlan::supervisor(entry, machine_vector, supervisor_vector),
    }
}
