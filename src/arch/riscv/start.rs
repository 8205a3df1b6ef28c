//! Reset entry.

use super::asm::Hart;
use super::cpu;
use super::trap::{halt, machine_trap_vector, supervisor_trap_vector};
use crate::arch::csr::{Csr, CsrAccess};
use crate::arch::privilege;
use crate::console::{ByteSink, SinkWriter};
use crate::platform;
use core::fmt::Write;

// Hart 0 takes the boot stack; everyone else parks.
core::arch::global_asm!(
    ".section .text.init",
    ".global _start",
    "_start:",
    "csrr t0, mhartid",
    "bnez t0, 2f",
    "la sp, boot_stack_top",
    "call start",
    "2:",
    "wfi",
    "j 2b",
    ".section .bss.stack",
    ".align 4",
    "boot_stack:",
    ".space 16384",
    "boot_stack_top:",
);

// _start jumps here in machine mode on the boot stack.
#[no_mangle]
unsafe extern "C" fn start() -> ! {
    let hart = Hart;

    // Keep the hart id in tp, for cpu::hart_id().
    cpu::set_hart_id(hart.read(Csr::Mhartid));

    let plan = platform::boot_plan(
        crate::main as usize,
        machine_trap_vector as usize,
        supervisor_trap_vector as usize,
    );
    match privilege::enter(&hart, &plan) {
        Ok(never) => match never {},
        Err(e) => {
            // The console is not up yet; go straight to the UART.
            let mut uart = &platform::UART0;
            uart.write_bytes(b"boot: ");
            let _ = writeln!(SinkWriter(&mut uart), "{}", e);
            halt()
        }
    }
}
